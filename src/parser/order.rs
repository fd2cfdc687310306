use super::lexer::{split_terms, Term};
use super::property::PropertyResolver;
use crate::ast::{Combinator, ComparisonKind, Operator, SortDirection, SortParameter, TypeSchema};
use crate::error::ParseError;

fn parse_direction(value: &str) -> Option<SortDirection> {
    match value.trim().to_lowercase().as_str() {
        "asc" | "ascending" => Some(SortDirection::Ascending),
        "desc" | "descending" => Some(SortDirection::Descending),
        _ => None,
    }
}

/// Parses a sort string into resolved sort parameters.
///
/// # Syntax
///
/// - Single key: `name=ASC` or `name=DESC` (case-insensitive)
/// - Multiple keys: `id=DESC,name=ASC`
/// - Nested keys: `owner.lastName=asc`, `fields.data.color=desc`
/// - `ascending` and `descending` are accepted; the relational compiler
///   rejects them
///
/// # Examples
///
/// ```
/// use dynamic_filter_sort::{Engine, SortDirection, TypeSchema, TypeTag};
///
/// let engine = Engine::builder()
///     .register(
///         TypeSchema::new("Person")
///             .field("id", TypeTag::Number)
///             .field("name", TypeTag::Text),
///     )
///     .build()
///     .unwrap();
///
/// let sort = engine.parse_sort("id=DESC,name=asc", "Person").unwrap();
/// assert_eq!(sort.parameters.len(), 2);
/// assert_eq!(sort.parameters[0].value, SortDirection::Descending);
///
/// assert!(engine.parse_sort("name=UP", "Person").is_err());
/// ```
///
/// # Errors
///
/// Returns `ParseError` if:
/// - A term uses an operator other than `=` or a combinator (`InvalidOperator`)
/// - A direction is not asc/desc (`InvalidSortOrder`)
/// - A key does not resolve (`InvalidPropertyName`)
pub fn parse_order(
    input: &str,
    root: &TypeSchema,
    resolver: &PropertyResolver<'_>,
    delimiters: &[&str],
) -> Result<Vec<SortParameter>, ParseError> {
    split_terms(input, delimiters)?
        .iter()
        .enumerate()
        .map(|(order, term)| parse_order_term(term, order, root, resolver))
        .collect()
}

/// Parses and resolves a single lexed sort term.
pub fn parse_order_term(
    term: &Term<'_>,
    declaration_order: usize,
    root: &TypeSchema,
    resolver: &PropertyResolver<'_>,
) -> Result<SortParameter, ParseError> {
    let (combinator, raw_key) = Combinator::from_prefix(term.key.trim());
    if raw_key.is_empty() || term.value.trim().is_empty() {
        return Err(ParseError::MissingValue(term.text.to_string()));
    }

    if combinator != Combinator::Default || term.operator != Operator::EqualTo.token() {
        return Err(ParseError::InvalidOperator(term.text.to_string()));
    }

    let direction = parse_direction(term.value)
        .ok_or_else(|| ParseError::InvalidSortOrder(term.text.to_string()))?;

    let property = resolver.resolve(root, raw_key)?;

    Ok(SortParameter {
        key: property.path_key.clone(),
        raw_key: raw_key.to_string(),
        raw_value: term.value.to_string(),
        operator: Operator::EqualTo,
        combinator,
        comparison: ComparisonKind::Full,
        declaration_order,
        value: direction,
        property,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{fixture_cache, DELIMITERS};

    fn parse(input: &str) -> Result<Vec<SortParameter>, ParseError> {
        let cache = fixture_cache();
        let resolver = PropertyResolver::new(&cache, &DELIMITERS, ".");
        let root = cache.get("Person").unwrap().clone();
        parse_order(input, &root, &resolver, &DELIMITERS)
    }

    #[test]
    fn test_parse_order_directions() {
        let params = parse("ID=ASC,firstName=desc,lastName=Ascending,age=DESCENDING").unwrap();
        let directions: Vec<SortDirection> = params.iter().map(|p| p.value).collect();
        assert_eq!(
            directions,
            vec![
                SortDirection::Ascending,
                SortDirection::Descending,
                SortDirection::Ascending,
                SortDirection::Descending,
            ]
        );
        assert!(params[0].is_short_form());
        assert!(!params[2].is_short_form());
        assert_eq!(params[0].key, "id");
    }

    #[test]
    fn test_parse_order_invalid_direction() {
        assert!(matches!(parse("firstName=UP"), Err(ParseError::InvalidSortOrder(_))));
    }

    #[test]
    fn test_parse_order_requires_equality() {
        assert!(matches!(parse("firstName>ASC"), Err(ParseError::InvalidOperator(_))));
        assert!(matches!(parse("firstName!=DESC"), Err(ParseError::InvalidOperator(_))));
        assert!(matches!(parse("||firstName=DESC"), Err(ParseError::InvalidOperator(_))));
    }

    #[test]
    fn test_parse_order_traversal() {
        let params = parse("id=asc,fields.data.color=desc").unwrap();
        assert!(!params[0].is_traversal());
        assert!(params[1].is_traversal());
    }

    #[test]
    fn test_parse_order_empty() {
        assert!(parse("").unwrap().is_empty());
    }

    #[test]
    fn test_parse_order_unknown_property() {
        assert!(matches!(parse("nickname=asc"), Err(ParseError::InvalidPropertyName { .. })));
    }
}
