use serde::Serialize;

use crate::ast::*;
use crate::config::PlaceholderStyle;
use crate::datetime::format_iso;
use crate::error::SqlError;
use crate::schema_cache::ColumnMap;

/// A value bound to a placeholder of a parameterized fragment.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BoundParam {
    /// Placeholder as written in the fragment, e.g. `@tbl3` or `$1`.
    pub name: String,
    pub value: serde_json::Value,
}

/// Compiled WHERE and ORDER BY bodies, without their keywords.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SqlFragment {
    pub where_clause: String,
    pub order_by: String,
    /// In declaration order. Empty in literal mode.
    pub params: Vec<BoundParam>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub limit: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub offset: Option<usize>,
}

impl SqlFragment {
    pub fn is_empty(&self) -> bool {
        self.where_clause.is_empty() && self.order_by.is_empty()
    }

    /// Statement tail: ` WHERE ... ORDER BY ... LIMIT ... OFFSET ...`,
    /// omitting empty parts.
    pub fn to_sql(&self) -> String {
        let mut sql = String::new();
        if !self.where_clause.is_empty() {
            sql.push_str(" WHERE ");
            sql.push_str(&self.where_clause);
        }
        if !self.order_by.is_empty() {
            sql.push_str(" ORDER BY ");
            sql.push_str(&self.order_by);
        }
        if let Some(limit) = self.limit {
            sql.push_str(&format!(" LIMIT {}", limit));
        }
        if let Some(offset) = self.offset {
            sql.push_str(&format!(" OFFSET {}", offset));
        }
        sql
    }

    /// The same fragment restricted to one page.
    pub fn paged(&self, offset: usize, count: usize) -> Self {
        Self {
            limit: Some(count),
            offset: Some(offset),
            ..self.clone()
        }
    }

    /// The same fragment without LIMIT or OFFSET.
    pub fn unpaged(&self) -> Self {
        Self {
            limit: None,
            offset: None,
            ..self.clone()
        }
    }

    pub fn with_limit_offset(&self, count: usize, offset: usize) -> String {
        self.paged(offset, count).to_sql()
    }

    pub fn param_values(&self) -> Vec<&serde_json::Value> {
        self.params.iter().map(|param| &param.value).collect()
    }
}

/// How values appear in the fragment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenderMode {
    /// Lower-cased, quoted literals inline. For display and debugging.
    Literal,
    Parameterized(PlaceholderStyle),
}

/// Renders parsed expressions for PostgreSQL.
pub struct QueryBuilder<'a> {
    columns: &'a ColumnMap,
    alias: Option<&'a str>,
    mode: RenderMode,
    params: Vec<BoundParam>,
    /// Declaration orders of bound terms, ascending.
    bound: Vec<usize>,
}

impl<'a> QueryBuilder<'a> {
    pub fn new(columns: &'a ColumnMap) -> Self {
        Self {
            columns,
            alias: None,
            mode: RenderMode::Literal,
            params: Vec::new(),
            bound: Vec::new(),
        }
    }

    /// Qualifies columns and names placeholders with `alias`.
    pub fn with_alias(mut self, alias: Option<&'a str>) -> Self {
        self.alias = alias.map(str::trim).filter(|alias| !alias.is_empty());
        self
    }

    pub fn with_mode(mut self, mode: RenderMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn build(
        mut self,
        filter: &FilterExpression,
        sort: &SortExpression,
    ) -> Result<SqlFragment, SqlError> {
        let where_clause = self.build_where_clause(filter)?;
        let order_by = self.build_order_clause(sort)?;

        Ok(SqlFragment {
            where_clause,
            order_by,
            params: self.params,
            limit: None,
            offset: None,
        })
    }

    /// Renders both halves of `filter`, AND-joined. Traversal terms become
    /// JSON navigation into their blob column.
    pub fn build_where_clause(&mut self, filter: &FilterExpression) -> Result<String, SqlError> {
        self.bind_params(filter);

        let halves: Vec<&Expression> = [&filter.primary, &filter.secondary]
            .into_iter()
            .filter(|expression| !expression.is_empty())
            .collect();
        let nested = halves.len() > 1;

        let clauses = halves
            .into_iter()
            .map(|expression| {
                let sql = self.build_expression(expression, &filter.parameters)?;
                let has_or = expression
                    .links
                    .iter()
                    .skip(1)
                    .any(|link| link.operator == LogicOperator::Or);
                Ok(if nested && has_or {
                    format!("({})", sql)
                } else {
                    sql
                })
            })
            .collect::<Result<Vec<String>, SqlError>>()?;

        Ok(clauses.join(LogicOperator::And.sql()))
    }

    fn bind_params(&mut self, filter: &FilterExpression) {
        self.params.clear();
        self.bound.clear();
        if self.mode == RenderMode::Literal {
            return;
        }

        let mut orders: Vec<usize> = filter
            .primary
            .terms()
            .into_iter()
            .chain(filter.secondary.terms())
            .collect();
        orders.sort_unstable();
        orders.dedup();

        for order in orders {
            let Some(param) = filter.parameters.get(order) else {
                continue;
            };
            if param.value.is_null() {
                continue;
            }
            self.bound.push(order);
            let value = bound_value(param);
            let name = self.placeholder(order);
            self.params.push(BoundParam { name, value });
        }
    }

    fn placeholder(&self, order: usize) -> String {
        match self.mode {
            RenderMode::Parameterized(PlaceholderStyle::Positional) => {
                let position = self.bound.binary_search(&order).unwrap_or_else(|at| at);
                format!("${}", position + 1)
            }
            _ => format!("@{}{}", self.alias.unwrap_or("p"), order),
        }
    }

    fn build_expression(
        &self,
        expression: &Expression,
        parameters: &[FilterParameter],
    ) -> Result<String, SqlError> {
        let mut sql = String::new();
        for (position, link) in expression.links.iter().enumerate() {
            if position > 0 {
                sql.push_str(link.operator.sql());
            }
            sql.push_str(&self.build_condition(&link.condition, parameters)?);
        }
        Ok(sql)
    }

    /// A lone term renders bare. A larger group renders as
    /// `((a) AND (b OR c))`.
    fn build_condition(
        &self,
        condition: &LogicCondition,
        parameters: &[FilterParameter],
    ) -> Result<String, SqlError> {
        let render = |index: usize| {
            parameters
                .get(index)
                .ok_or_else(|| SqlError::ColumnMappingNotFound(format!("term {}", index)))
                .and_then(|param| self.build_single_filter(param))
        };

        match condition {
            LogicCondition::Term(index) => render(*index),
            LogicCondition::Group(clauses) => {
                if let [single] = condition.terms().as_slice() {
                    return render(*single);
                }
                let rendered = clauses
                    .iter()
                    .map(|clause| {
                        let terms = clause
                            .iter()
                            .map(|index| render(*index))
                            .collect::<Result<Vec<_>, _>>()?;
                        Ok(format!("({})", terms.join(LogicOperator::Or.sql())))
                    })
                    .collect::<Result<Vec<_>, SqlError>>()?;
                Ok(format!("({})", rendered.join(LogicOperator::And.sql())))
            }
        }
    }

    fn build_single_filter(&self, param: &FilterParameter) -> Result<String, SqlError> {
        let column = self.column_sql(&param.property)?;
        let json_path = param.property.json_path();
        let tag = param.property.value_type.underlying();

        let target = if json_path.is_empty() {
            column.clone()
        } else {
            json_navigation(&column, &json_path)
        };

        if param.value.is_null() {
            let not = if param.operator == Operator::NotEqual { "NOT " } else { "" };
            return Ok(format!("{} IS {}NULL", target, not));
        }

        if param.comparison.is_partial() {
            let target = if json_path.is_empty() {
                format!("LOWER({}::text)", column)
            } else {
                target
            };
            return Ok(format!(
                "{}{}{}",
                target,
                like_operator(param.operator),
                self.pattern_sql(param)
            ));
        }

        let op = operator_sql(param.operator);

        if !json_path.is_empty() {
            return Ok(match numeric_value(param) {
                Some(number) => format!(
                    "{}::numeric{}{}",
                    target,
                    op,
                    self.value_sql(param, || format_number(number))
                ),
                None => format!(
                    "{}{}{}",
                    target,
                    op,
                    self.value_sql(param, || quote(&param.value.to_folded_string()))
                ),
            });
        }

        let value = self.value_sql(param, || literal(&param.value));
        Ok(match (tag, &param.value) {
            (_, Value::List(_)) => {
                let overlap = format!("{} && {}", column, value);
                if param.operator == Operator::NotEqual {
                    format!("NOT ({})", overlap)
                } else {
                    overlap
                }
            }
            (TypeTag::Uuid, _) => format!("LOWER({}::text){}{}", column, op, value),
            (TypeTag::Text | TypeTag::Char | TypeTag::Enum { .. }, _) => {
                format!("LOWER({}){}{}", column, op, value)
            }
            (_, Value::Json(_)) => format!("{}::jsonb{}{}::jsonb", column, op, value),
            _ => format!("{}{}{}", column, op, value),
        })
    }

    /// Placeholder in parameterized mode, otherwise the given literal.
    fn value_sql(&self, param: &FilterParameter, literal: impl FnOnce() -> String) -> String {
        match self.mode {
            RenderMode::Literal => literal(),
            RenderMode::Parameterized(_) => self.placeholder(param.declaration_order),
        }
    }

    /// Wildcards stay outside the bound value.
    fn pattern_sql(&self, param: &FilterParameter) -> String {
        let (leading, trailing) = match param.comparison {
            ComparisonKind::StartsWith => (false, true),
            ComparisonKind::EndsWith => (true, false),
            ComparisonKind::Contains => (true, true),
            ComparisonKind::Full => (false, false),
        };

        match self.mode {
            RenderMode::Literal => {
                let wildcard = |on: bool| if on { "%" } else { "" };
                quote(&format!(
                    "{}{}{}",
                    wildcard(leading),
                    param.value.to_folded_string(),
                    wildcard(trailing)
                ))
            }
            RenderMode::Parameterized(_) => {
                let mut parts = Vec::with_capacity(3);
                if leading {
                    parts.push("'%'".to_string());
                }
                parts.push(self.placeholder(param.declaration_order));
                if trailing {
                    parts.push("'%'".to_string());
                }
                format!("CONCAT({})", parts.join(","))
            }
        }
    }

    fn column_sql(&self, property: &PropertyInfo) -> Result<String, SqlError> {
        let root = property.root_key();
        let column = self
            .columns
            .get(root)
            .ok_or_else(|| SqlError::ColumnMappingNotFound(root.to_string()))?;

        Ok(match self.alias {
            Some(alias) => format!("{}.{}", alias, column),
            None => column.to_string(),
        })
    }

    /// Renders `column DIRECTION` pairs in declaration order. Only `asc` and
    /// `desc` are accepted here.
    pub fn build_order_clause(&self, sort: &SortExpression) -> Result<String, SqlError> {
        let mut indices: Vec<usize> = sort.primary.iter().chain(&sort.secondary).copied().collect();
        indices.sort_unstable();

        let terms = indices
            .into_iter()
            .filter_map(|index| sort.parameters.get(index))
            .map(|param| {
                if !param.is_short_form() {
                    return Err(SqlError::InvalidSortOrder(format!(
                        "{}={}",
                        param.raw_key, param.raw_value
                    )));
                }

                let column = self.column_sql(&param.property)?;
                let json_path = param.property.json_path();
                let target = if json_path.is_empty() {
                    column
                } else {
                    json_navigation(&column, &json_path)
                };

                let direction = match param.value {
                    SortDirection::Ascending => "ASC",
                    SortDirection::Descending => "DESC",
                };
                Ok(format!("{} {}", target, direction))
            })
            .collect::<Result<Vec<_>, SqlError>>()?;

        Ok(terms.join(", "))
    }
}

/// `(lower(col::text)::jsonb->'a'->>'b')`: the blob is lower-cased, then
/// navigated with the last hop extracting text.
fn json_navigation(column: &str, path: &[&str]) -> String {
    let mut sql = format!("(lower({}::text)::jsonb", column);
    for (position, key) in path.iter().enumerate() {
        sql.push_str(if position + 1 == path.len() { "->>" } else { "->" });
        sql.push_str(&quote(&key.to_lowercase()));
    }
    sql.push(')');
    sql
}

fn quote(text: &str) -> String {
    format!("'{}'", text.replace('\'', "''"))
}

fn literal(value: &Value) -> String {
    match value {
        Value::Null => "NULL".to_string(),
        Value::Text(s) | Value::Enum(s) => quote(&s.to_lowercase()),
        Value::Number(n) => format_number(*n),
        Value::Boolean(b) => b.to_string(),
        Value::Uuid(u) => quote(&u.hyphenated().to_string()),
        Value::DateTime(dt) => quote(&format_iso(dt)),
        Value::Json(json) => quote(&json.to_string()),
        Value::List(items) => format!(
            "ARRAY[{}]",
            items.iter().map(literal).collect::<Vec<_>>().join(",")
        ),
    }
}

fn operator_sql(operator: Operator) -> &'static str {
    match operator {
        Operator::NotEqual => "<>",
        other => other.token(),
    }
}

fn like_operator(operator: Operator) -> &'static str {
    if operator == Operator::NotEqual {
        " NOT ILIKE "
    } else {
        " ILIKE "
    }
}

/// The bound value takes the type of the expression it is compared with.
/// JSON navigation yields text, or `numeric` for relational comparisons.
fn bound_value(param: &FilterParameter) -> serde_json::Value {
    if param.comparison.is_partial() {
        return serde_json::Value::String(param.value.to_folded_string());
    }
    if param.property.json_path().is_empty() {
        return param.value.to_json();
    }
    numeric_value(param)
        .and_then(serde_json::Number::from_f64)
        .map(serde_json::Value::Number)
        .unwrap_or_else(|| serde_json::Value::String(param.value.to_folded_string()))
}

/// Relational comparisons on blob keys compare numerically when the literal
/// is a number.
fn numeric_value(param: &FilterParameter) -> Option<f64> {
    if param.operator.is_equality() {
        return None;
    }
    match &param.value {
        Value::Number(n) => Some(*n),
        Value::Text(s) => s.trim().parse::<f64>().ok().filter(|n| n.is_finite()),
        _ => None,
    }
}
