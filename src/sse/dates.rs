//! Calendar-year segmentation of query date ranges
//!
//! The bulletin API silently truncates queries spanning more than one
//! calendar year, so every request is confined to a single year.

use crate::sse::{SseApi, SseError};
use chrono::{Datelike, NaiveDate};
use std::fmt;

/// Inclusive date interval used for one listing query
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateRange {
    pub fn start_str(&self) -> String {
        self.start.format(SseApi::DATE_FORMAT).to_string()
    }

    pub fn end_str(&self) -> String {
        self.end.format(SseApi::DATE_FORMAT).to_string()
    }
}

impl fmt::Display for DateRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} to {}", self.start_str(), self.end_str())
    }
}

/// Split `[start, end]` (both inclusive) into ranges that never cross a year boundary
pub fn split_yearly(start: NaiveDate, end: NaiveDate) -> Result<Vec<DateRange>, SseError> {
    if start > end {
        return Err(SseError::InvalidRange { start, end });
    }

    let mut ranges = Vec::new();
    let mut current = start;

    loop {
        let year_end = NaiveDate::from_ymd_opt(current.year(), 12, 31).unwrap_or(NaiveDate::MAX);
        let range_end = year_end.min(end);
        ranges.push(DateRange {
            start: current,
            end: range_end,
        });

        match range_end.succ_opt() {
            Some(next) if next <= end => current = next,
            _ => break,
        }
    }

    Ok(ranges)
}
