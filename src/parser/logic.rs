use std::collections::BTreeMap;

use crate::ast::{
    Combinator, Expression, FilterExpression, FilterParameter, LogicCondition, LogicOperator,
    Operator, SortExpression, SortParameter,
};

/// Groups resolved filter parameters into primary and secondary expressions.
///
/// Traversal parameters go to the secondary expression, everything else to
/// the primary one. Within each, Default-combinator parameters are grouped by
/// key, groups ordered by key. A group's members are ordered by operator token
/// and then declaration order; consecutive `=` members are OR-joined and any
/// other member starts a new AND-joined clause. Parameters with an explicit
/// `&&` or `||` follow in declaration order, each joined to what precedes it
/// by its own combinator.
///
/// ```
/// use dynamic_filter_sort::{Engine, LogicCondition, TypeSchema, TypeTag};
///
/// let engine = Engine::builder()
///     .register(TypeSchema::new("Item").field("id", TypeTag::Number))
///     .build()
///     .unwrap();
///
/// let filter = engine.parse_filter("id=2,id=5,id>1,id<=5", "Item").unwrap();
/// assert_eq!(
///     filter.primary.links[0].condition,
///     LogicCondition::Group(vec![vec![3], vec![0, 1], vec![2]])
/// );
/// ```
pub fn group_filter(type_name: &str, parameters: Vec<FilterParameter>) -> FilterExpression {
    let (primary, secondary) = {
        let (traversal, direct): (Vec<&FilterParameter>, Vec<&FilterParameter>) =
            parameters.iter().partition(|p| p.is_traversal());
        (build_expression(&direct), build_expression(&traversal))
    };

    FilterExpression {
        type_name: type_name.to_string(),
        parameters,
        primary,
        secondary,
    }
}

fn build_expression(parameters: &[&FilterParameter]) -> Expression {
    let mut groups: BTreeMap<String, Vec<&FilterParameter>> = BTreeMap::new();
    let mut explicit = Vec::new();

    for param in parameters {
        match param.combinator {
            Combinator::Default => groups
                .entry(param.key.to_lowercase())
                .or_default()
                .push(*param),
            Combinator::And | Combinator::Or => explicit.push(*param),
        }
    }

    let mut expression = Expression::new();

    for (_, mut members) in groups {
        members.sort_by(|a, b| {
            a.operator
                .token()
                .cmp(b.operator.token())
                .then(a.declaration_order.cmp(&b.declaration_order))
        });
        expression.push(LogicOperator::And, LogicCondition::Group(clauses(&members)));
    }

    explicit.sort_by_key(|p| p.declaration_order);
    for param in explicit {
        expression.push(
            LogicOperator::from(param.combinator),
            LogicCondition::Term(param.declaration_order),
        );
    }

    expression
}

fn clauses(members: &[&FilterParameter]) -> Vec<Vec<usize>> {
    let mut clauses: Vec<Vec<usize>> = Vec::new();
    let mut previous: Option<Operator> = None;

    for member in members {
        let joins_previous = previous == Some(Operator::EqualTo) && member.operator == Operator::EqualTo;
        match clauses.last_mut() {
            Some(clause) if joins_previous => clause.push(member.declaration_order),
            _ => clauses.push(vec![member.declaration_order]),
        }
        previous = Some(member.operator);
    }

    clauses
}

/// Splits sort parameters into store-evaluable and in-process keys, keeping
/// declaration order within each.
pub fn group_sort(type_name: &str, parameters: Vec<SortParameter>) -> SortExpression {
    let (secondary, primary): (Vec<usize>, Vec<usize>) = parameters
        .iter()
        .map(|p| p.declaration_order)
        .partition(|index| parameters[*index].is_traversal());

    SortExpression {
        type_name: type_name.to_string(),
        parameters,
        primary,
        secondary,
    }
}
