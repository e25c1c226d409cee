// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2026 Vallés Puig, Ramon

//! Error type shared by every module of the kernel.

use std::fmt;

use thiserror::Error;

use crate::instant::Instant;

/// Calendar component rejected by [`Instant::from_calendar`](crate::Instant::from_calendar).
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum CalendarField {
    Year,
    Month,
    Day,
    Hour,
    Minute,
    Second,
}

impl fmt::Display for CalendarField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            CalendarField::Year => "year",
            CalendarField::Month => "month",
            CalendarField::Day => "day",
            CalendarField::Hour => "hour",
            CalendarField::Minute => "minute",
            CalendarField::Second => "second",
        };
        f.write_str(name)
    }
}

/// Failures surfaced by the time and frame kernel.
///
/// The type is `Clone` so a failure captured while loading a data set can be
/// handed back, unchanged, to every later caller that needs the same data.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum KernelError {
    /// Leap-second or Earth-orientation data is missing, malformed, or cannot
    /// answer the query.
    #[error("{dataset} unavailable{}: {reason}", at_date(.date))]
    DataUnavailable {
        dataset: &'static str,
        date: Option<Instant>,
        reason: String,
    },

    /// A calendar component lies outside its valid range.
    #[error("invalid calendar {field}: {value}")]
    InvalidCalendarField { field: CalendarField, value: f64 },

    /// The two frames do not belong to the same tree.
    #[error("frames {from} and {to} do not share a root")]
    UnrelatedFrames { from: String, to: String },

    /// The frame graph would become inconsistent (cycle, duplicate name,
    /// unknown parent).
    #[error("frame configuration error for {frame}: {reason}")]
    Configuration { frame: String, reason: String },
}

impl KernelError {
    pub(crate) fn data(
        dataset: &'static str,
        date: Option<Instant>,
        reason: impl Into<String>,
    ) -> Self {
        KernelError::DataUnavailable {
            dataset,
            date,
            reason: reason.into(),
        }
    }

    pub(crate) fn config(frame: impl Into<String>, reason: impl Into<String>) -> Self {
        KernelError::Configuration {
            frame: frame.into(),
            reason: reason.into(),
        }
    }
}

fn at_date(date: &Option<Instant>) -> String {
    match date {
        Some(date) => format!(" at {date}"),
        None => String::new(),
    }
}

pub type Result<T> = std::result::Result<T, KernelError>;
