use crate::window::format_date;
use chrono::NaiveDate;
use std::fmt;

/// An inclusive calendar span submitted to the listing endpoint as one unit
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DateWindow {
    start: NaiveDate,
    end: NaiveDate,
}

impl DateWindow {
    /// Creates a window, or `None` when `start > end`
    pub fn new(start: NaiveDate, end: NaiveDate) -> Option<Self> {
        (start <= end).then_some(Self { start, end })
    }

    /// First day of the window (inclusive)
    pub fn start(&self) -> NaiveDate {
        self.start
    }

    /// Last day of the window (inclusive)
    pub fn end(&self) -> NaiveDate {
        self.end
    }

    /// `DD-MM-YYYY` form of the first day, as sent in `fromDate`
    pub fn start_label(&self) -> String {
        format_date(self.start)
    }

    /// `DD-MM-YYYY` form of the last day, as sent in `toDate`
    pub fn end_label(&self) -> String {
        format_date(self.end)
    }

    /// Name of the output directory holding this window's documents
    pub fn dir_name(&self) -> String {
        format!("{}_to_{}", self.start_label(), self.end_label())
    }

    /// Number of days covered, both ends included
    pub fn days(&self) -> i64 {
        (self.end - self.start).num_days() + 1
    }
}

impl fmt::Display for DateWindow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} to {}", self.start_label(), self.end_label())
    }
}
