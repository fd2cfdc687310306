use nom::{
    branch::alt,
    bytes::complete::{tag, take_while1},
    combinator::{recognize, verify},
    error::{Error as NomError, ErrorKind},
    multi::many1,
    sequence::pair,
    IResult,
};

/// Characters allowed in a key outside of multi-character delimiters.
/// `&` and `|` are included so combinator prefixes stay attached to the key.
pub fn is_key_char(c: char) -> bool {
    c.is_alphanumeric() || matches!(c, '_' | '.' | '&' | '|')
}

pub fn is_operator_char(c: char) -> bool {
    matches!(c, '<' | '>' | '!' | '=')
}

/// Operator tokens, longest first.
pub const OPERATOR_TOKENS: [&str; 6] = ["!=", ">=", "<=", "=", ">", "<"];

/// Matches the first of `delimiters` found at the start of the input.
/// Callers pass them longest-first.
pub fn delimiter<'a, 'd>(
    delimiters: &'d [&'d str],
) -> impl FnMut(&'a str) -> IResult<&'a str, &'a str> + 'd {
    move |i: &'a str| {
        for d in delimiters {
            if let Ok(result) = tag::<_, _, NomError<&str>>(*d)(i) {
                return Ok(result);
            }
        }
        Err(nom::Err::Error(NomError::new(i, ErrorKind::Tag)))
    }
}

/// A key: runs of key characters and delimiters, e.g. `owner->groups.42`.
pub fn key<'a: 'd, 'd>(
    delimiters: &'d [&'d str],
) -> impl FnMut(&'a str) -> IResult<&'a str, &'a str> + 'd {
    recognize(many1(alt((delimiter(delimiters), take_while1(is_key_char)))))
}

/// The full run of operator characters, provided it opens with a valid
/// token. A run such as `=>` is still taken whole and rejected later as an
/// invalid operator, while a lone `!` is not an operator at all.
pub fn operator(i: &str) -> IResult<&str, &str> {
    verify(take_while1(is_operator_char), |run: &str| {
        OPERATOR_TOKENS.iter().any(|token| run.starts_with(token))
    })(i)
}

/// `key` immediately followed by an operator run.
pub fn key_operator<'a: 'd, 'd>(
    delimiters: &'d [&'d str],
) -> impl FnMut(&'a str) -> IResult<&'a str, (&'a str, &'a str)> + 'd {
    pair(key(delimiters), operator)
}

/// Splits a key path on the given delimiters (longest-first), dropping empty
/// segments.
pub fn split_path<'a>(path: &'a str, delimiters: &[&str]) -> Vec<&'a str> {
    let mut segments = Vec::new();
    let mut start = 0;
    let mut i = 0;

    while i < path.len() {
        match delimiters
            .iter()
            .find(|d| path[i..].starts_with(**d))
        {
            Some(d) => {
                segments.push(&path[start..i]);
                i += d.len();
                start = i;
            }
            None => {
                i += path[i..].chars().next().map(char::len_utf8).unwrap_or(1);
            }
        }
    }
    segments.push(&path[start..]);

    segments
        .into_iter()
        .map(str::trim)
        .filter(|segment| !segment.is_empty())
        .collect()
}
