//! Timeline events and their total order

use crate::date::PatentDate;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Date literal carried by the "current status" event
pub const STATUS_SENTINEL: &str = "STATUS";

/// One entry of a patent's reconstructed event history
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TimelineEvent {
    /// ISO date string, free text, or [`STATUS_SENTINEL`]
    pub date: String,

    /// Human-readable description of the event
    pub title: String,
}

/// Sort position of a timeline event
///
/// Dated events come first in calendar order, then events whose date could
/// not be read, then the status sentinel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum EventOrder {
    /// Well-formed calendar date
    Dated(NaiveDate),
    /// Unparseable date
    Undated,
    /// The `STATUS` sentinel
    Terminal,
}

impl TimelineEvent {
    /// Create an event from a date string and a title
    pub fn new(date: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            date: date.into(),
            title: title.into(),
        }
    }

    /// Create the status sentinel event
    pub fn status(title: impl Into<String>) -> Self {
        Self::new(STATUS_SENTINEL, title)
    }

    /// Whether this is the status sentinel
    pub fn is_sentinel(&self) -> bool {
        self.date == STATUS_SENTINEL
    }

    /// Position of this event in the timeline order
    pub fn order(&self) -> EventOrder {
        if self.is_sentinel() {
            return EventOrder::Terminal;
        }
        match PatentDate::parse(&self.date) {
            PatentDate::Known(date) => EventOrder::Dated(date),
            PatentDate::Unknown => EventOrder::Undated,
        }
    }
}
