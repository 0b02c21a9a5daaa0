//! Skip/take bounds for list endpoints.

use serde::{Deserialize, Serialize};

use crate::error::ServiceError;

/// Page size used when a caller asks for nothing in particular, and the
/// ceiling applied to deep pages.
pub const DEFAULT_TAKE: u64 = 100;

/// Largest accepted page size after clamping.
pub const MAX_TAKE: u64 = 100;

/// Offsets beyond this force the page size down to [`DEFAULT_TAKE`].
pub const DEEP_SKIP: u64 = 100;

/// A requested window into a listing.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pagination {
    #[serde(default)]
    pub skip: u64,
    #[serde(default)]
    pub take: u64,
}

impl Pagination {
    pub fn new(skip: u64, take: u64) -> Self {
        Self { skip, take }
    }

    /// Applies the listing defaults.
    ///
    /// `(0, 0)` becomes a default-sized first page and any offset past
    /// [`DEEP_SKIP`] is served with a [`DEFAULT_TAKE`] page. The offset itself
    /// is never changed.
    pub fn clamped(self) -> Self {
        let mut take = self.take;
        if self.skip > DEEP_SKIP || (self.take == 0 && self.skip == 0) {
            take = DEFAULT_TAKE;
        }
        Self {
            skip: self.skip,
            take,
        }
    }

    /// Clamps and validates the window, ready to hand to a store.
    pub fn bounds(self) -> Result<Self, ServiceError> {
        let clamped = self.clamped();
        if clamped.take > MAX_TAKE {
            return Err(ServiceError::invalid(format!(
                "take must be at most {MAX_TAKE}, got {}",
                clamped.take
            )));
        }
        if i64::try_from(clamped.skip).is_err() {
            return Err(ServiceError::invalid(format!(
                "skip is out of range: {}",
                clamped.skip
            )));
        }
        Ok(clamped)
    }

    /// Offset as a SQL parameter.
    pub fn offset(&self) -> i64 {
        i64::try_from(self.skip).unwrap_or(i64::MAX)
    }

    /// Limit as a SQL parameter.
    pub fn limit(&self) -> i64 {
        i64::try_from(self.take).unwrap_or(i64::MAX)
    }

    /// Applies the window to an in-memory sequence.
    pub fn window<I: IntoIterator>(&self, items: I) -> impl Iterator<Item = I::Item> {
        let skip = usize::try_from(self.skip).unwrap_or(usize::MAX);
        let take = usize::try_from(self.take).unwrap_or(usize::MAX);
        items.into_iter().skip(skip).take(take)
    }
}
