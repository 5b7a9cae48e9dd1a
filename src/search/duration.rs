//! Parser for the `Assessment Length:` constraint in refined queries.
//!
//! Grammar, matched at the first occurrence that satisfies it:
//!
//! ```text
//! constraint := "Assessment Length:" WS* op? DIGITS ( "-" DIGITS )?
//! op         := "<=" | ">="
//! ```
//!
//! No whitespace is allowed between the operator and the digits, nor
//! around the dash. An occurrence without a valid operand is skipped and
//! scanning continues with the next occurrence. Numbers too large for
//! `u32` saturate to `u32::MAX`.
//!
//! | Operand | Filter |
//! |---------|--------|
//! | `<=N` (any trailing `-M` ignored) | `AtMost(N)` |
//! | `>=N` (any trailing `-M` ignored) | `AtLeast(N)` |
//! | `N-M` | `Range { min: N, max: M }` |
//! | `N` | `Exact(N)` |

use super::filter::DurationFilter;

/// Literal that introduces the duration field.
pub const ASSESSMENT_LENGTH_LABEL: &str = "Assessment Length:";

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Operator {
    AtMost,
    AtLeast,
    Bare,
}

/// Parses the first valid duration constraint out of `text`.
pub fn parse_duration_filter(text: &str) -> DurationFilter {
    text.match_indices(ASSESSMENT_LENGTH_LABEL)
        .find_map(|(idx, label)| parse_operand(&text[idx + label.len()..]))
        .unwrap_or(DurationFilter::None)
}

/// Parses the operand following one label occurrence.
fn parse_operand(rest: &str) -> Option<DurationFilter> {
    let rest = rest.trim_start_matches(char::is_whitespace);

    let (operator, rest) = if let Some(r) = rest.strip_prefix("<=") {
        (Operator::AtMost, r)
    } else if let Some(r) = rest.strip_prefix(">=") {
        (Operator::AtLeast, r)
    } else {
        (Operator::Bare, rest)
    };

    let (first, rest) = take_number(rest)?;

    match operator {
        Operator::AtMost => Some(DurationFilter::AtMost(first)),
        Operator::AtLeast => Some(DurationFilter::AtLeast(first)),
        Operator::Bare => match rest.strip_prefix('-') {
            Some(after_dash) if starts_with_digit(after_dash) => {
                let (second, _) = take_number(after_dash)?;
                Some(DurationFilter::Range {
                    min: first,
                    max: second,
                })
            }
            _ => Some(DurationFilter::Exact(first)),
        },
    }
}

/// Consumes a maximal run of ASCII digits.
///
/// Returns `None` if the run is empty. Runs too large for `u32` saturate
/// to `u32::MAX` so the constraint stays active.
fn take_number(s: &str) -> Option<(u32, &str)> {
    let end = s
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(s.len());
    if end == 0 {
        return None;
    }
    // Only overflow can fail on a nonempty digit run.
    let value = s[..end].parse::<u32>().unwrap_or(u32::MAX);
    Some((value, &s[end..]))
}

fn starts_with_digit(s: &str) -> bool {
    s.as_bytes().first().is_some_and(u8::is_ascii_digit)
}
