//! Utility functions for building substitution contexts.
//!
//! This module provides helpers used by the alarms to fill placeholders that do not
//! come from an event, such as the current time in the startup announcement.

use chrono::NaiveDateTime;

use crate::alarm::EventContext;

/// Builds the time placeholders of `time`.
///
/// # Returns
///
/// A context with:
/// - `24h_time`: 24 hour clock with seconds, e.g. `14:30:16`
/// - `12h_time`: 12 hour clock with seconds and lowercase suffix, e.g. `02:30:16pm`
///
/// # Examples
///
/// ```
/// # use chrono::NaiveDate;
/// # use pokefeed::utils::time_context;
/// let time = NaiveDate::from_ymd_opt(2026, 10, 19).unwrap().and_hms_opt(14, 30, 16).unwrap();
/// let context = time_context(&time);
/// assert_eq!(context.get("24h_time"), Some("14:30:16"));
/// ```
pub fn time_context(time: &NaiveDateTime) -> EventContext {
    EventContext::new()
        .with("24h_time", time.format("%H:%M:%S").to_string())
        .with("12h_time", time.format("%I:%M:%S%P").to_string())
}
