//! Field-level checks shared by the services.

use std::sync::LazyLock;

use chrono::{Datelike, NaiveDate};
use musclegram_common::{AppError, AppResult};
use musclegram_db::entities::ExerciseSet;
use regex::Regex;
use validator::ValidationError;

#[allow(clippy::unwrap_used)]
static USERNAME_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z0-9_]{1,32}$").unwrap());

#[allow(clippy::unwrap_used)]
static PERIOD_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^(\d{4})-(\d{2})$").unwrap());

/// Usernames are ASCII letters, digits and underscores.
pub fn validate_username(username: &str) -> Result<(), ValidationError> {
    if USERNAME_RE.is_match(username) {
        Ok(())
    } else {
        Err(ValidationError::new("username_format"))
    }
}

/// Periods are calendar months written `YYYY-MM`.
pub fn validate_period(period: &str) -> Result<(), ValidationError> {
    parse_period(period)
        .map(|_| ())
        .ok_or_else(|| ValidationError::new("period_format"))
}

/// First day of the month named by `period`.
#[must_use]
pub fn parse_period(period: &str) -> Option<NaiveDate> {
    let caps = PERIOD_RE.captures(period)?;
    let year = caps[1].parse().ok()?;
    let month = caps[2].parse().ok()?;
    NaiveDate::from_ymd_opt(year, month, 1)
}

/// Number of days in the month starting at `first`.
#[must_use]
pub fn days_in_month(first: NaiveDate) -> u32 {
    let next = if first.month() == 12 {
        NaiveDate::from_ymd_opt(first.year() + 1, 1, 1)
    } else {
        NaiveDate::from_ymd_opt(first.year(), first.month() + 1, 1)
    };
    next.map_or(31, |next| (next - first).num_days() as u32)
}

/// Parse a weight or reps string as a finite, non-negative number.
pub fn parse_amount(field: &str, raw: &str) -> AppResult<f64> {
    let value: f64 = raw.trim().parse().map_err(|_| {
        AppError::InvalidArgument(format!("{field} must be a number, got {raw:?}"))
    })?;
    if !value.is_finite() {
        return Err(AppError::InvalidArgument(format!(
            "{field} must be finite, got {raw:?}"
        )));
    }
    if value < 0.0 {
        return Err(AppError::InvalidArgument(format!(
            "{field} must not be negative, got {raw:?}"
        )));
    }
    Ok(value)
}

/// Check every set of an exercise.
pub fn check_sets(sets: &[ExerciseSet]) -> AppResult<()> {
    if sets.is_empty() {
        return Err(AppError::Validation(
            "exercise must have at least one set".to_string(),
        ));
    }
    for (i, set) in sets.iter().enumerate() {
        parse_amount(&format!("sets[{i}].weight"), &set.weight)?;
        parse_amount(&format!("sets[{i}].reps"), &set.reps)?;
    }
    Ok(())
}
