//! Field-level coercion helpers shared by every raw source.
//!
//! Every parser treats an empty (or whitespace-only) cell as missing and
//! returns `Ok(None)`; text that is present but cannot be coerced is an error
//! the loader turns into a row exclusion.

use std::sync::OnceLock;

use anyhow::{Result, anyhow, bail};
use chrono::{NaiveDate, NaiveTime};
use regex::Regex;

const DATE_FORMATS: &[&str] = &["%d/%m/%Y", "%Y-%m-%d", "%m/%d/%Y", "%Y/%m/%d"];
const SHORT_YEAR_FORMAT: &str = "%d/%m/%y";
const DAYS_PER_YEAR: f64 = 365.25;

fn whitespace_run() -> &'static Regex {
    static WHITESPACE: OnceLock<Regex> = OnceLock::new();
    WHITESPACE.get_or_init(|| Regex::new(r"\s+").expect("static whitespace pattern"))
}

fn present(value: &str) -> Option<&str> {
    let trimmed = value.trim();
    (!trimmed.is_empty()).then_some(trimmed)
}

/// Canonical form of a team or player name: trimmed, inner whitespace runs
/// collapsed to a single space.
pub fn canonical_name(value: &str) -> Option<String> {
    present(value).map(|trimmed| whitespace_run().replace_all(trimmed, " ").into_owned())
}

pub fn canonical_text(value: &str) -> Option<String> {
    present(value).map(str::to_string)
}

pub fn parse_naive_date(value: &str) -> Result<NaiveDate> {
    let trimmed = value.trim();
    // chrono reads `%Y` greedily, so `05/08/22` would otherwise land in year 22.
    let short_year = trimmed.contains('/')
        && trimmed
            .rsplit('/')
            .next()
            .is_some_and(|year| year.len() == 2);
    if short_year {
        return NaiveDate::parse_from_str(trimmed, SHORT_YEAR_FORMAT)
            .map_err(|_| anyhow!("'{value}' is not a recognised date"));
    }
    for fmt in DATE_FORMATS {
        if let Ok(parsed) = NaiveDate::parse_from_str(trimmed, fmt) {
            return Ok(parsed);
        }
    }
    Err(anyhow!("'{value}' is not a recognised date"))
}

pub fn parse_optional_date(value: &str) -> Result<Option<NaiveDate>> {
    present(value).map(parse_naive_date).transpose()
}

/// Accepts `H:MM` or `H:MM:SS` kick-off times.
pub fn parse_naive_time(value: &str) -> Result<NaiveTime> {
    let trimmed = value.trim();
    let parts = trimmed.split(':').collect::<Vec<_>>();
    let numbers = parts
        .iter()
        .map(|part| part.trim().parse::<u32>())
        .collect::<std::result::Result<Vec<_>, _>>()
        .map_err(|_| anyhow!("'{value}' is not a recognised time"))?;
    let parsed = match numbers.as_slice() {
        [hour, minute] => NaiveTime::from_hms_opt(*hour, *minute, 0),
        [hour, minute, second] => NaiveTime::from_hms_opt(*hour, *minute, *second),
        _ => None,
    };
    parsed.ok_or_else(|| anyhow!("'{value}' is not a recognised time"))
}

pub fn parse_optional_time(value: &str) -> Result<Option<NaiveTime>> {
    present(value).map(parse_naive_time).transpose()
}

/// Integer counts. Float text such as `3.0` is truncated toward zero, which is
/// how the upstream exports round-trip integer columns.
pub fn parse_count(value: &str) -> Result<Option<i32>> {
    let Some(trimmed) = present(value) else {
        return Ok(None);
    };
    if let Ok(parsed) = trimmed.parse::<i32>() {
        return Ok(Some(parsed));
    }
    let parsed: f64 = trimmed
        .parse()
        .map_err(|_| anyhow!("'{value}' is not numeric"))?;
    if !parsed.is_finite() || parsed.abs() > i32::MAX as f64 {
        bail!("'{value}' is out of range for a count");
    }
    Ok(Some(parsed.trunc() as i32))
}

/// Decimal measurements. A trailing `%` is tolerated for possession columns.
pub fn parse_measure(value: &str) -> Result<Option<f64>> {
    let Some(trimmed) = present(value) else {
        return Ok(None);
    };
    let numeric = trimmed.strip_suffix('%').unwrap_or(trimmed).trim();
    let parsed: f64 = numeric
        .parse()
        .map_err(|_| anyhow!("'{value}' is not numeric"))?;
    if !parsed.is_finite() {
        bail!("'{value}' is not a finite number");
    }
    Ok(Some(parsed))
}

/// Player age as plain years (`27`, `27.5`) or the `years-days` form (`27-143`).
pub fn parse_age(value: &str) -> Result<Option<f64>> {
    let Some(trimmed) = present(value) else {
        return Ok(None);
    };
    if let Some((years, days)) = trimmed.split_once('-') {
        let years: u32 = years
            .trim()
            .parse()
            .map_err(|_| anyhow!("'{value}' is not an age"))?;
        let days: u32 = days
            .trim()
            .parse()
            .map_err(|_| anyhow!("'{value}' is not an age"))?;
        let age = f64::from(years) + f64::from(days) / DAYS_PER_YEAR;
        return Ok(Some((age * 100.0).round() / 100.0));
    }
    parse_measure(trimmed)
}
