//! Page windows for index-based pagination.
//!
//! The remote API addresses rows by 1-based inclusive index ranges. A day
//! is walked as `[1..size]`, `[size+1..2*size]`, and so on.

use crate::{DayKey, TypeError};
use std::fmt;

/// One bounded request for a single day.
///
/// Immutable once built; a fresh value is constructed for every attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PageRequest {
    day: DayKey,
    start_index: u32,
    end_index: u32,
}

impl PageRequest {
    /// Create a request for an explicit index range.
    ///
    /// # Errors
    ///
    /// Returns [`TypeError::InvalidWindow`] if `start_index` is zero or
    /// `end_index` is before `start_index`.
    pub fn new(day: DayKey, start_index: u32, end_index: u32) -> Result<Self, TypeError> {
        if start_index < 1 || end_index < start_index {
            return Err(TypeError::InvalidWindow {
                start: start_index,
                end: end_index,
            });
        }
        Ok(Self {
            day,
            start_index,
            end_index,
        })
    }

    /// The `page`-th (0-based) window of width `page_size`.
    ///
    /// # Errors
    ///
    /// Returns [`TypeError::InvalidWindow`] if `page_size` is zero or the
    /// window would overflow `u32`.
    pub fn window(day: DayKey, page: u32, page_size: u32) -> Result<Self, TypeError> {
        let overflow = TypeError::InvalidWindow {
            start: page.saturating_mul(page_size).saturating_add(1),
            end: u32::MAX,
        };
        let end = page
            .checked_add(1)
            .and_then(|p| p.checked_mul(page_size))
            .ok_or_else(|| overflow.clone())?;
        let start = end.checked_sub(page_size).ok_or(overflow)? + 1;
        Self::new(day, start, end)
    }

    pub fn day(&self) -> DayKey {
        self.day
    }

    pub fn start_index(&self) -> u32 {
        self.start_index
    }

    pub fn end_index(&self) -> u32 {
        self.end_index
    }

    /// Number of rows this window can hold.
    pub fn width(&self) -> u32 {
        self.end_index - self.start_index + 1
    }
}

impl fmt::Display for PageRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}-{}", self.day, self.start_index, self.end_index)
    }
}
