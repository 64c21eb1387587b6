//! Free-text input parsing for parcel sequences.
//!
//! The lenient reader is what the web text box uses: comma-separated
//! tokens, each taken for its leading integer, with anything unreadable
//! dropped instead of reported as an error.

use serde::{Deserialize, Serialize};

use crate::{MaxSubError, Parcel};

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParsedInput {
    pub parcels: Vec<Parcel>,
    /// Non-empty tokens that were dropped, in input order.
    pub rejected: Vec<String>,
}

impl ParsedInput {
    pub fn is_clean(&self) -> bool {
        self.rejected.is_empty()
    }
}

/// Parse comma-separated parcels, silently skipping tokens that do not start
/// with an integer. `"12px"` reads as 12 and `"3.7"` as 3.
pub fn parse_parcels(text: &str) -> ParsedInput {
    let mut out = ParsedInput::default();
    for token in tokens(text) {
        match leading_integer(token) {
            Some(value) => out.parcels.push(value),
            None => out.rejected.push(token.to_string()),
        }
    }
    out
}

/// Parse comma-separated parcels, failing on the first token that is not a
/// complete integer.
pub fn parse_parcels_strict(text: &str) -> Result<Vec<Parcel>, MaxSubError> {
    tokens(text)
        .enumerate()
        .map(|(index, token)| {
            token
                .parse::<Parcel>()
                .map_err(|_| MaxSubError::InvalidToken {
                    index,
                    token: token.to_string(),
                })
        })
        .collect()
}

pub fn format_parcels(seq: &[Parcel]) -> String {
    seq.iter()
        .map(|v| v.to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

fn tokens(text: &str) -> impl Iterator<Item = &str> {
    text.split(',').map(str::trim).filter(|t| !t.is_empty())
}

fn leading_integer(token: &str) -> Option<Parcel> {
    let (negative, digits) = match token.as_bytes().first()? {
        b'-' => (true, &token[1..]),
        b'+' => (false, &token[1..]),
        _ => (false, token),
    };
    let len = digits
        .bytes()
        .take_while(u8::is_ascii_digit)
        .count();
    if len == 0 {
        return None;
    }
    let magnitude: i64 = digits[..len].parse().ok()?;
    let value = if negative { -magnitude } else { magnitude };
    Parcel::try_from(value).ok()
}
