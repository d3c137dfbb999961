//! Page range resolution against the manifest's page count.
//!
//! User bounds are 1-based and untrusted. Each bound that falls outside the
//! manifest is silently replaced by the corresponding end of the full range;
//! nothing here ever fails.

use std::ops::Range;

/// Raw page bounds as entered by the user (1-based, inclusive).
///
/// Missing bounds behave like `0`, which is out of range and therefore
/// widens to the full manifest.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RangeRequest {
    /// First page to include.
    pub start: Option<i64>,
    /// Last page to include.
    pub stop: Option<i64>,
}

impl RangeRequest {
    /// Requests the whole manifest.
    #[must_use]
    pub fn full() -> Self {
        Self::default()
    }

    /// Requests pages `start..=stop` (1-based).
    #[must_use]
    pub fn new(start: Option<i64>, stop: Option<i64>) -> Self {
        Self { start, stop }
    }
}

/// Clamped, 0-based, inclusive page interval.
///
/// Stored half-open so that an empty manifest and an inverted request both
/// become zero iterations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResolvedRange {
    start_index: usize,
    end: usize,
}

impl ResolvedRange {
    /// First 0-based index to process.
    #[must_use]
    pub fn start_index(&self) -> usize {
        self.start_index
    }

    /// Last 0-based index to process, or `None` for an empty manifest.
    #[must_use]
    pub fn stop_index(&self) -> Option<usize> {
        self.end.checked_sub(1)
    }

    /// Indices in ascending order. Empty when `start_index > stop_index`.
    #[must_use]
    pub fn indices(&self) -> Range<usize> {
        self.start_index..self.end
    }

    /// Number of pages that will be processed.
    #[must_use]
    pub fn len(&self) -> usize {
        self.end.saturating_sub(self.start_index)
    }

    /// Whether no page will be processed.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Last index that will actually be processed.
    #[must_use]
    pub fn last_processed(&self) -> Option<usize> {
        if self.is_empty() {
            None
        } else {
            self.stop_index()
        }
    }
}

/// Resolves a user range against `page_count`.
#[must_use]
pub fn resolve(page_count: usize, request: RangeRequest) -> ResolvedRange {
    let Some(last) = page_count.checked_sub(1) else {
        return ResolvedRange {
            start_index: 0,
            end: 0,
        };
    };

    let to_index = |bound: Option<i64>| {
        bound
            .unwrap_or(0)
            .checked_sub(1)
            .and_then(|value| usize::try_from(value).ok())
            .filter(|&index| index <= last)
    };

    let start_index = to_index(request.start).unwrap_or(0);
    let stop_index = to_index(request.stop).unwrap_or(last);

    ResolvedRange {
        start_index,
        end: stop_index + 1,
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_converts_one_based_bounds() {
        let range = resolve(5, RangeRequest::new(Some(2), Some(4)));
        assert_eq!(range.start_index(), 1);
        assert_eq!(range.stop_index(), Some(3));
        assert_eq!(range.indices().collect::<Vec<_>>(), vec![1, 2, 3]);
    }

    #[test]
    fn test_resolve_clamps_zero_and_overflow_to_full_range() {
        let range = resolve(10, RangeRequest::new(Some(0), Some(999)));
        assert_eq!(range.start_index(), 0);
        assert_eq!(range.stop_index(), Some(9));
        assert_eq!(range.len(), 10);
    }

    #[test]
    fn test_resolve_missing_bounds_is_full_range() {
        let range = resolve(3, RangeRequest::full());
        assert_eq!(range.indices().collect::<Vec<_>>(), vec![0, 1, 2]);
    }

    #[test]
    fn test_resolve_negative_bounds_reset_independently() {
        let range = resolve(6, RangeRequest::new(Some(-4), Some(3)));
        assert_eq!(range.start_index(), 0);
        assert_eq!(range.stop_index(), Some(2));

        let range = resolve(6, RangeRequest::new(Some(4), Some(-1)));
        assert_eq!(range.start_index(), 3);
        assert_eq!(range.stop_index(), Some(5));
    }

    #[test]
    fn test_resolve_extreme_values_do_not_overflow() {
        let range = resolve(4, RangeRequest::new(Some(i64::MIN), Some(i64::MAX)));
        assert_eq!(range.start_index(), 0);
        assert_eq!(range.stop_index(), Some(3));
    }

    #[test]
    fn test_resolve_inverted_range_is_empty() {
        let range = resolve(8, RangeRequest::new(Some(6), Some(2)));
        assert_eq!(range.start_index(), 5);
        assert_eq!(range.stop_index(), Some(1));
        assert!(range.is_empty());
        assert_eq!(range.indices().count(), 0);
        assert_eq!(range.last_processed(), None);
    }

    #[test]
    fn test_resolve_zero_pages_is_empty() {
        let range = resolve(0, RangeRequest::new(Some(1), Some(1)));
        assert!(range.is_empty());
        assert_eq!(range.stop_index(), None);
        assert_eq!(range.indices().count(), 0);
    }

    #[test]
    fn test_resolve_single_page() {
        let range = resolve(1, RangeRequest::new(Some(1), Some(1)));
        assert_eq!(range.indices().collect::<Vec<_>>(), vec![0]);
        assert_eq!(range.last_processed(), Some(0));
    }

    #[test]
    fn test_resolve_bounds_always_within_page_count() {
        let bounds = [
            None,
            Some(i64::MIN),
            Some(-1),
            Some(0),
            Some(1),
            Some(2),
            Some(7),
            Some(8),
            Some(9),
            Some(i64::MAX),
        ];
        for page_count in 1..=8_usize {
            for start in bounds {
                for stop in bounds {
                    let range = resolve(page_count, RangeRequest::new(start, stop));
                    assert!(range.start_index() < page_count);
                    let stop_index = range.stop_index().unwrap();
                    assert!(stop_index < page_count);
                }
            }
        }
    }
}
