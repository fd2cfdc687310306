use super::common::key_operator;
use crate::error::ParseError;

/// One `key OP value` substring of a parameter string.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Term<'a> {
    /// The whole term, for error messages.
    pub text: &'a str,
    pub key: &'a str,
    pub operator: &'a str,
    pub value: &'a str,
    /// Byte offset of the term in the input.
    pub offset: usize,
}

struct Match<'a> {
    start: usize,
    end: usize,
    key: &'a str,
    operator: &'a str,
}

/// Splits a parameter string into terms.
///
/// Every position where a key is immediately followed by an operator starts a
/// new term. A term's value runs up to the next such position, minus one
/// separator comma, so values may contain commas and stray operator
/// characters:
///
/// ```
/// use dynamic_filter_sort::parser::split_terms;
///
/// let terms = split_terms("name=Attorney General, Office Of,code=AG", &["."]).unwrap();
/// assert_eq!(terms.len(), 2);
/// assert_eq!(terms[0].value, "Attorney General, Office Of");
/// assert_eq!(terms[1].value, "AG");
/// ```
///
/// # Errors
///
/// `MalformedParameterList` when a non-blank input holds no key/operator pair
/// or starts with text that belongs to no term.
pub fn split_terms<'a>(input: &'a str, delimiters: &[&str]) -> Result<Vec<Term<'a>>, ParseError> {
    if input.trim().is_empty() {
        return Ok(Vec::new());
    }

    let matches = find_matches(input, delimiters);
    let first = matches
        .first()
        .ok_or_else(|| ParseError::MalformedParameterList(input.to_string()))?;

    let prefix = &input[..first.start];
    if prefix.chars().any(|c| !c.is_whitespace() && c != ',') {
        return Err(ParseError::MalformedParameterList(input.to_string()));
    }

    let terms = matches
        .iter()
        .enumerate()
        .map(|(index, m)| {
            let end = matches
                .get(index + 1)
                .map(|next| next.start)
                .unwrap_or(input.len());
            let mut value = &input[m.end..end];
            if index + 1 < matches.len() {
                value = value.strip_suffix(',').unwrap_or(value);
            }
            Term {
                text: input[m.start..end].trim_end_matches(','),
                key: m.key,
                operator: m.operator,
                value,
                offset: m.start,
            }
        })
        .collect();

    Ok(terms)
}

fn find_matches<'a>(input: &'a str, delimiters: &[&str]) -> Vec<Match<'a>> {
    let mut parser = key_operator(delimiters);
    let mut matches = Vec::new();
    let mut position = 0;

    while position < input.len() {
        let rest = &input[position..];
        match parser(rest) {
            Ok((remaining, (key, operator))) => {
                let end = input.len() - remaining.len();
                matches.push(Match {
                    start: position,
                    end,
                    key,
                    operator,
                });
                position = end;
            }
            Err(_) => {
                position += rest.chars().next().map(char::len_utf8).unwrap_or(1);
            }
        }
    }

    matches
}
