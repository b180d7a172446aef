//! Target-date resolution for analytics requests.

use std::sync::LazyLock;

use chrono::{Days, Local, NaiveDate};
use regex::Regex;

static RELATIVE_DAY: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\b(yesterday|today)\b").expect("valid relative-day regex"));

/// Source of "today" for the router.
pub trait Clock: Send + Sync {
    fn today(&self) -> NaiveDate;
}

/// Host-local calendar date.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn today(&self) -> NaiveDate {
        Local::now().date_naive()
    }
}

/// Always answers the same date. Used by tests and offline replays.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub NaiveDate);

impl Clock for FixedClock {
    fn today(&self) -> NaiveDate {
        self.0
    }
}

/// Resolve the analytics target date from a free-text message.
///
/// The first whole-word `yesterday`/`today` (any case) decides; only
/// `yesterday` moves the date. Total over all inputs.
pub fn resolve_target_date(message: &str, today: NaiveDate) -> NaiveDate {
    let says_yesterday = RELATIVE_DAY
        .captures(message)
        .and_then(|caps| caps.get(1))
        .is_some_and(|m| m.as_str().eq_ignore_ascii_case("yesterday"));

    if says_yesterday {
        today.checked_sub_days(Days::new(1)).unwrap_or(today)
    } else {
        today
    }
}
