//! Month-granularity period arithmetic.
//!
//! Periods are `YYYYMM` strings. `YYYY-MM-DD` input is also accepted and
//! truncated to its month, so both upstream date conventions resolve to the
//! same canonical form.

use chrono::{Datelike, NaiveDate};

use healthpull_shared::{HealthPullError, Result};

/// A parsed year-month pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
struct YearMonth {
    year: i32,
    month: u32,
}

impl YearMonth {
    fn next(self) -> Self {
        if self.month == 12 {
            Self {
                year: self.year + 1,
                month: 1,
            }
        } else {
            Self {
                year: self.year,
                month: self.month + 1,
            }
        }
    }

    fn format(self) -> String {
        format!("{:04}{:02}", self.year, self.month)
    }
}

/// Parse a period string in `YYYYMM` or `YYYY-MM-DD` form.
fn parse_period(input: &str) -> Result<YearMonth> {
    if input.len() == 10 {
        // Full date: truncate to its month.
        let date = NaiveDate::parse_from_str(input, "%Y-%m-%d").map_err(|e| {
            HealthPullError::config(format!("malformed period '{input}': {e}"))
        })?;
        return Ok(YearMonth {
            year: date.year(),
            month: date.month(),
        });
    }

    if input.len() != 6 || !input.bytes().all(|b| b.is_ascii_digit()) {
        return Err(HealthPullError::config(format!(
            "malformed period '{input}': expected YYYYMM or YYYY-MM-DD"
        )));
    }

    let year: i32 = input[0..4]
        .parse()
        .map_err(|_| HealthPullError::config(format!("malformed period '{input}': bad year")))?;
    let month: u32 = input[4..6]
        .parse()
        .map_err(|_| HealthPullError::config(format!("malformed period '{input}': bad month")))?;

    if !(1..=12).contains(&month) {
        return Err(HealthPullError::config(format!(
            "malformed period '{input}': month {month} out of range"
        )));
    }

    Ok(YearMonth { year, month })
}

/// Expand an inclusive `[start, end]` range into the ordered sequence of
/// `YYYYMM` strings covering every month boundary between them.
///
/// The end period is always included; a single-month range yields one entry.
pub fn period_range(start: &str, end: &str) -> Result<Vec<String>> {
    let start = parse_period(start)?;
    let end = parse_period(end)?;

    if start > end {
        return Err(HealthPullError::config(format!(
            "start period {} is after end period {}",
            start.format(),
            end.format()
        )));
    }

    let mut periods = Vec::new();
    let mut current = start;
    while current <= end {
        periods.push(current.format());
        current = current.next();
    }

    Ok(periods)
}
