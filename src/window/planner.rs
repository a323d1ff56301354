//! Successive window computation
//!
//! Windows are contiguous and strictly increasing: each one starts the day
//! after the previous one ended and never extends past the ceiling date.

use crate::window::{DateWindow, WINDOW_MONTHS};
use chrono::{Months, NaiveDate};

/// Adds calendar months to a date
///
/// Day-of-month overflow is clamped to the last day of the target month, so
/// 31-01-2024 plus three months is 30-04-2024, never a day in May.
pub fn advance_months(date: NaiveDate, months: u32) -> Option<NaiveDate> {
    date.checked_add_months(Months::new(months))
}

/// Computes the window following one that ended on `previous_end`
///
/// The next window is `[previous_end + 1 day, min(start + 3 months - 1 day, ceiling)]`.
///
/// # Returns
///
/// * `Some(DateWindow)` - The next window to crawl
/// * `None` - The ceiling has been reached, nothing is left to crawl
pub fn next_window(previous_end: NaiveDate, ceiling: NaiveDate) -> Option<DateWindow> {
    let start = previous_end.succ_opt()?;
    if start > ceiling {
        return None;
    }

    let span_end = advance_months(start, WINDOW_MONTHS)?.pred_opt()?;
    DateWindow::new(start, span_end.min(ceiling))
}

/// Iterator over the windows of one crawl
///
/// Yields the caller-supplied window first. When `extend` is set it keeps
/// yielding [`next_window`] results until the ceiling is reached.
#[derive(Debug, Clone)]
pub struct WindowPlanner {
    next: Option<DateWindow>,
    ceiling: NaiveDate,
    extend: bool,
}

impl WindowPlanner {
    /// Creates a planner starting at `initial`
    ///
    /// # Arguments
    ///
    /// * `initial` - The window from the configuration
    /// * `ceiling` - The last date that may be crawled (normally today)
    /// * `extend` - Whether to continue past `initial` up to the ceiling
    pub fn new(initial: DateWindow, ceiling: NaiveDate, extend: bool) -> Self {
        Self {
            next: Some(initial),
            ceiling,
            extend,
        }
    }
}

impl Iterator for WindowPlanner {
    type Item = DateWindow;

    fn next(&mut self) -> Option<Self::Item> {
        let current = self.next.take()?;
        if self.extend {
            self.next = next_window(current.end(), self.ceiling);
        }
        Some(current)
    }
}
