//! Shared skip/limit window math for list endpoints.
//!
//! Every listing reports `totalPages = ceil(total / limit)` and
//! `hasMore = skip + returned < total`. Exact-match searches bypass the window
//! and report a single page.

/// Computed window facts for one page of a listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageWindow {
    pub current_page: u64,
    pub total_pages: u64,
    pub total: u64,
    pub has_more: bool,
}

/// Normalizes caller-supplied paging input: pages and limits below 1 are
/// clamped to 1.
pub fn clamp(page: u64, limit: u64) -> (u64, u64) {
    (page.max(1), limit.max(1))
}

/// Zero-based offset for a (page, limit) pair.
pub fn skip(page: u64, limit: u64) -> u64 {
    (page - 1) * limit
}

/// Window facts for a paginated listing.
pub fn window(page: u64, limit: u64, total: u64, returned: usize) -> PageWindow {
    PageWindow {
        current_page: page,
        total_pages: total.div_ceil(limit),
        total,
        has_more: skip(page, limit) + (returned as u64) < total,
    }
}

/// Window facts for an exact-match search that bypasses pagination: everything
/// fits on one page.
pub fn single_page(page: u64, total: u64, returned: usize) -> PageWindow {
    PageWindow {
        current_page: page,
        total_pages: 1,
        total,
        has_more: returned as u64 != total,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn exact_multiple_of_limit() {
        let w = window(3, 10, 30, 10);
        assert_eq!(w.total_pages, 3);
        assert!(!w.has_more);
    }

    #[test]
    fn partial_last_page() {
        let w = window(3, 10, 25, 5);
        assert_eq!(w.total_pages, 3);
        assert!(!w.has_more);
    }

    #[test]
    fn middle_page_has_more() {
        let w = window(2, 10, 25, 10);
        assert_eq!(w.total_pages, 3);
        assert!(w.has_more);
    }

    #[test]
    fn out_of_range_page_is_empty_but_counts_stay_correct() {
        let w = window(9, 10, 25, 0);
        assert_eq!(w.total_pages, 3);
        assert!(!w.has_more);
    }

    #[test]
    fn empty_listing() {
        let w = window(1, 10, 0, 0);
        assert_eq!(w.total_pages, 0);
        assert!(!w.has_more);
    }

    #[test]
    fn bypassed_search_is_one_page() {
        let w = single_page(4, 7, 7);
        assert_eq!(w.current_page, 4);
        assert_eq!(w.total_pages, 1);
        assert!(!w.has_more);
    }

    #[test]
    fn zero_page_and_limit_are_clamped() {
        assert_eq!(clamp(0, 0), (1, 1));
        assert_eq!(clamp(3, 25), (3, 25));
    }

    proptest! {
        #[test]
        fn total_pages_is_ceiling_division(total in 0u64..10_000, limit in 1u64..100) {
            let w = window(1, limit, total, 0);
            let expected = (total as f64 / limit as f64).ceil() as u64;
            prop_assert_eq!(w.total_pages, expected);
        }

        #[test]
        fn has_more_matches_definition(
            page in 1u64..50,
            limit in 1u64..50,
            total in 0u64..2_000,
        ) {
            let skipped = skip(page, limit);
            let returned = total.saturating_sub(skipped).min(limit);
            let w = window(page, limit, total, returned as usize);
            prop_assert_eq!(w.has_more, skipped + returned < total);
        }
    }
}
