use super::lexer::{split_terms, Term};
use super::property::PropertyResolver;
use crate::ast::{
    Combinator, ComparisonKind, FilterParameter, Operator, PropertyInfo, TypeSchema, TypeTag,
    Value,
};
use crate::coerce;
use crate::datetime::DatePattern;
use crate::error::ParseError;

/// Parses a filter string into resolved, typed parameters in declaration
/// order.
///
/// # Syntax
///
/// - Basic: `key=value`, with operators `=`, `!=`, `>`, `>=`, `<`, `<=`
/// - Combinators: `&&key=value` (AND) or `||key=value` (OR); no marker means
///   AND, with same-key equality terms OR-grouped
/// - Partial matches: `name=smith%` (starts with), `name=%smith` (ends with),
///   `name=%smith%` (contains)
/// - Nested keys: `owner.lastName=smith`, `owner->groups->>42.name=admins`
/// - Reserved literals: `null` on nullable fields, `string.empty` on text
///
/// # Examples
///
/// ```
/// use dynamic_filter_sort::{Engine, TypeSchema, TypeTag, ComparisonKind};
///
/// let engine = Engine::builder()
///     .register(TypeSchema::new("Person").field("lastName", TypeTag::Text))
///     .build()
///     .unwrap();
///
/// let filter = engine.parse_filter("lastName=smith%", "Person").unwrap();
/// assert_eq!(filter.parameters[0].comparison, ComparisonKind::StartsWith);
/// ```
///
/// # Errors
///
/// Returns `ParseError` if:
/// - No term can be found (`MalformedParameterList`)
/// - A term lacks its key or value (`MissingValue`)
/// - The operator is not recognized (`InvalidOperator`)
/// - A key does not resolve (`InvalidPropertyName`)
/// - A partial match or relational operator is misapplied (`InvalidFilterType`)
/// - The value does not convert (`CannotConvert`, `InvalidDateTimeFormat`)
pub fn parse_filter(
    input: &str,
    root: &TypeSchema,
    resolver: &PropertyResolver<'_>,
    delimiters: &[&str],
) -> Result<Vec<FilterParameter>, ParseError> {
    split_terms(input, delimiters)?
        .iter()
        .enumerate()
        .map(|(order, term)| parse_filter_term(term, order, root, resolver))
        .collect()
}

/// Parses and resolves a single lexed filter term.
pub fn parse_filter_term(
    term: &Term<'_>,
    declaration_order: usize,
    root: &TypeSchema,
    resolver: &PropertyResolver<'_>,
) -> Result<FilterParameter, ParseError> {
    let (combinator, raw_key) = Combinator::from_prefix(term.key.trim());
    if raw_key.is_empty() || term.value.is_empty() {
        return Err(ParseError::MissingValue(term.text.to_string()));
    }

    let operator = Operator::from_token(term.operator)
        .ok_or_else(|| ParseError::InvalidOperator(term.text.to_string()))?;

    let (comparison, stripped) = ComparisonKind::detect(term.value);
    if stripped.is_empty() {
        return Err(ParseError::MissingValue(term.text.to_string()));
    }

    let property = resolver.resolve(root, raw_key)?;
    check_filter_type(&property, operator, comparison)?;
    let value = coerce_value(&property, operator, comparison, stripped)?;

    Ok(FilterParameter {
        key: property.path_key.clone(),
        raw_key: raw_key.to_string(),
        raw_value: term.value.to_string(),
        operator,
        combinator,
        comparison,
        declaration_order,
        value,
        property,
    })
}

fn check_filter_type(
    property: &PropertyInfo,
    operator: Operator,
    comparison: ComparisonKind,
) -> Result<(), ParseError> {
    let tag = property.value_type.underlying();

    if comparison.is_partial() {
        if !operator.is_equality() {
            return Err(ParseError::filter_type(
                &property.path_key,
                format!("partial match cannot be combined with {}", operator.token()),
            ));
        }
        if matches!(
            tag,
            TypeTag::Boolean
                | TypeTag::Enum { .. }
                | TypeTag::List(_)
                | TypeTag::Map { .. }
                | TypeTag::Object(_)
        ) {
            return Err(ParseError::filter_type(
                &property.path_key,
                format!("partial match is not supported on {}", tag),
            ));
        }
    }

    if !operator.is_equality() && !property.value_type.is_ordered() {
        return Err(ParseError::filter_type(
            &property.path_key,
            format!("{} is not supported on {}", operator.token(), tag),
        ));
    }

    Ok(())
}

fn coerce_value(
    property: &PropertyInfo,
    operator: Operator,
    comparison: ComparisonKind,
    stripped: &str,
) -> Result<Value, ParseError> {
    let tag = &property.value_type;

    if comparison.is_partial() {
        if matches!(tag.underlying(), TypeTag::DateTime) {
            DatePattern::decompose(stripped, comparison)?;
        }
        return Ok(Value::Text(stripped.to_string()));
    }

    let value = coerce::convert(stripped, tag).map_err(|err| match tag.underlying() {
        TypeTag::DateTime => ParseError::InvalidDateTimeFormat(stripped.to_string()),
        _ => ParseError::CannotConvert {
            field: property.path_key.clone(),
            value: err.value,
            target: err.target,
        },
    })?;

    if value.is_null() && !operator.is_equality() {
        return Err(ParseError::filter_type(
            &property.path_key,
            "null can only be compared with = or !=",
        ));
    }

    Ok(value)
}
