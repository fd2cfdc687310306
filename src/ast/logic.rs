use super::Combinator;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogicOperator {
    And,
    Or,
}

impl LogicOperator {
    pub fn sql(&self) -> &'static str {
        match self {
            LogicOperator::And => " AND ",
            LogicOperator::Or => " OR ",
        }
    }
}

impl From<Combinator> for LogicOperator {
    fn from(combinator: Combinator) -> Self {
        match combinator {
            Combinator::Or => LogicOperator::Or,
            Combinator::Default | Combinator::And => LogicOperator::And,
        }
    }
}

/// A node of a filter expression. Terms refer to parameters by declaration
/// order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogicCondition {
    Term(usize),
    /// Same-key group: clauses are AND-joined, terms within a clause OR-joined.
    Group(Vec<Vec<usize>>),
}

impl LogicCondition {
    pub fn terms(&self) -> Vec<usize> {
        match self {
            LogicCondition::Term(index) => vec![*index],
            LogicCondition::Group(clauses) => clauses.iter().flatten().copied().collect(),
        }
    }

    fn to_tree(&self) -> LogicTree {
        match self {
            LogicCondition::Term(index) => LogicTree::Term(*index),
            LogicCondition::Group(clauses) => LogicTree::and(
                clauses
                    .iter()
                    .map(|clause| LogicTree::or(clause.iter().map(|i| LogicTree::Term(*i)).collect()))
                    .collect(),
            ),
        }
    }
}

/// A condition and the operator joining it to the previous one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Link {
    pub operator: LogicOperator,
    pub condition: LogicCondition,
}

/// Flat sequence of conditions, read with AND binding tighter than OR.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Expression {
    pub links: Vec<Link>,
}

impl Expression {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, operator: LogicOperator, condition: LogicCondition) {
        self.links.push(Link {
            operator,
            condition,
        });
    }

    pub fn is_empty(&self) -> bool {
        self.links.is_empty()
    }

    /// Declaration indices of every term, in rendering order.
    pub fn terms(&self) -> Vec<usize> {
        self.links
            .iter()
            .flat_map(|link| link.condition.terms())
            .collect()
    }

    /// Nests the flat sequence into an explicit tree, splitting OR-separated
    /// runs of AND-joined conditions.
    pub fn to_tree(&self) -> LogicTree {
        let mut alternatives = Vec::new();
        let mut run = Vec::new();

        for (position, link) in self.links.iter().enumerate() {
            if position > 0 && link.operator == LogicOperator::Or {
                alternatives.push(LogicTree::and(std::mem::take(&mut run)));
            }
            run.push(link.condition.to_tree());
        }
        if !run.is_empty() {
            alternatives.push(LogicTree::and(run));
        }

        LogicTree::or(alternatives)
    }
}

/// Precedence-resolved form of an [`Expression`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogicTree {
    Term(usize),
    And(Vec<LogicTree>),
    Or(Vec<LogicTree>),
}

impl LogicTree {
    /// Builds a conjunction, collapsing single children. Empty means true.
    pub fn and(mut children: Vec<LogicTree>) -> Self {
        if children.len() == 1 {
            children.remove(0)
        } else {
            LogicTree::And(children)
        }
    }

    /// Builds a disjunction, collapsing single children. An empty
    /// disjunction is treated as true by evaluators, like an empty filter.
    pub fn or(mut children: Vec<LogicTree>) -> Self {
        if children.len() == 1 {
            children.remove(0)
        } else if children.is_empty() {
            LogicTree::And(Vec::new())
        } else {
            LogicTree::Or(children)
        }
    }
}
