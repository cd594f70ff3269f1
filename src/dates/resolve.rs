use chrono::{DateTime, TimeDelta, Utc};
use serde::Serialize;

use super::error::DateError;
use super::parse::relative_date_parse;

/// Sentinel meaning "no bound"
pub const ALL_TIME: &str = "all";

const DEFAULT_LOOKBACK_DAYS: i64 = 7;

/// Absolute bounds of the analysis window, `date_from <= date_to`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ResolvedWindow {
    date_from: DateTime<Utc>,
    date_to: DateTime<Utc>,
}

impl ResolvedWindow {
    pub fn new(date_from: DateTime<Utc>, date_to: DateTime<Utc>) -> Result<Self, DateError> {
        if date_from > date_to {
            return Err(DateError::InvertedRange {
                from: date_from,
                to: date_to,
            });
        }
        Ok(Self { date_from, date_to })
    }

    pub fn date_from(&self) -> DateTime<Utc> {
        self.date_from
    }

    pub fn date_to(&self) -> DateTime<Utc> {
        self.date_to
    }
}

/// Resolves date expressions against a fixed anchor time
#[derive(Debug, Clone, Copy)]
pub struct DateResolver {
    now: DateTime<Utc>,
    lookback: TimeDelta,
}

impl DateResolver {
    pub fn new(now: DateTime<Utc>) -> Self {
        Self {
            now,
            lookback: TimeDelta::days(DEFAULT_LOOKBACK_DAYS),
        }
    }

    /// Window length used when no lower bound is given
    pub fn with_lookback(mut self, lookback: TimeDelta) -> Self {
        self.lookback = lookback;
        self
    }

    /// Lower bound: missing, empty or `"all"` fall back to `now - lookback`
    pub fn resolve_from(&self, expr: Option<&str>) -> Result<DateTime<Utc>, DateError> {
        match expr {
            None => self.default_from(),
            Some(e) if e.is_empty() || e == ALL_TIME => self.default_from(),
            Some(e) => relative_date_parse(e, self.now, false),
        }
    }

    /// Upper bound: missing or empty means `now`; `"all"` is rejected.
    ///
    /// Bare dates resolve to the end of their day.
    pub fn resolve_to(&self, expr: Option<&str>) -> Result<DateTime<Utc>, DateError> {
        match expr {
            None => Ok(self.now),
            Some(e) if e.is_empty() => Ok(self.now),
            Some(ALL_TIME) => Err(DateError::AllTimeEnd),
            Some(e) => relative_date_parse(e, self.now, true),
        }
    }

    pub fn resolve_window(
        &self,
        date_from: Option<&str>,
        date_to: Option<&str>,
    ) -> Result<ResolvedWindow, DateError> {
        let from = self.resolve_from(date_from)?;
        let to = self.resolve_to(date_to)?;
        ResolvedWindow::new(from, to)
    }

    fn default_from(&self) -> Result<DateTime<Utc>, DateError> {
        self.now
            .checked_sub_signed(self.lookback)
            .ok_or_else(|| DateError::OutOfRange(ALL_TIME.to_string()))
    }
}

/// Resolve a lower bound with the default seven-day lookback
pub fn resolve_from(expr: Option<&str>, now: DateTime<Utc>) -> Result<DateTime<Utc>, DateError> {
    DateResolver::new(now).resolve_from(expr)
}

/// Resolve an upper bound
pub fn resolve_to(expr: Option<&str>, now: DateTime<Utc>) -> Result<DateTime<Utc>, DateError> {
    DateResolver::new(now).resolve_to(expr)
}
