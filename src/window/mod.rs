//! Date window planning
//!
//! The listing endpoint only accepts bounded date spans, so a crawl is cut
//! into consecutive windows of at most three calendar months. Dates are always
//! written in the portal's fixed-width `DD-MM-YYYY` form.

mod planner;
mod range;

pub use planner::{advance_months, next_window, WindowPlanner};
pub use range::DateWindow;

use chrono::NaiveDate;

/// Date format used by the portal, the config file and output directory names
pub const DATE_FORMAT: &str = "%d-%m-%Y";

/// Maximum span of one window, in calendar months
pub const WINDOW_MONTHS: u32 = 3;

/// Parses a fixed-width `DD-MM-YYYY` date
///
/// Returns `None` for anything that would not format back to the exact same
/// string (e.g. `1-1-2024`), so the literal input can be reused as a
/// directory name without canonicalization.
pub fn parse_date(input: &str) -> Option<NaiveDate> {
    let date = NaiveDate::parse_from_str(input, DATE_FORMAT).ok()?;
    (format_date(date) == input).then_some(date)
}

/// Formats a date as `DD-MM-YYYY`
pub fn format_date(date: NaiveDate) -> String {
    date.format(DATE_FORMAT).to_string()
}
