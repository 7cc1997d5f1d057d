//! Request planning for one search
//!
//! A search for `count` results is split into `ceil(count / per_page)` provider
//! requests of `per_page = min(count, max_results_per_page)` each.

use crate::providers::PaginationType;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PaginationPlan {
    pagination_type: PaginationType,
    per_page: usize,
    requests: usize,
    page: usize,
}

impl PaginationPlan {
    /// `page` and `count` are 1-based and already validated to be at least 1;
    /// `max_per_page` is at least 1 for every resolved provider.
    #[must_use]
    pub fn new(
        pagination_type: PaginationType,
        max_per_page: usize,
        page: usize,
        count: usize,
    ) -> Self {
        let page = page.max(1);
        let per_page = count.min(max_per_page).max(1);
        Self {
            pagination_type,
            per_page,
            requests: count.div_ceil(per_page),
            page,
        }
    }

    /// Results requested from the provider on every request
    #[must_use]
    pub fn per_page(&self) -> usize {
        self.per_page
    }

    /// Upper bound on provider requests
    #[must_use]
    pub fn requests(&self) -> usize {
        self.requests
    }

    /// Result offset of request `index`, saturating at `usize::MAX`
    #[must_use]
    pub fn offset(&self, index: usize) -> usize {
        (self.page - 1)
            .saturating_add(index)
            .saturating_mul(self.per_page)
    }

    /// Value of the pagination parameter for request `index`
    #[must_use]
    pub fn value(&self, index: usize) -> usize {
        match self.pagination_type {
            PaginationType::Page => self.page.saturating_add(index),
            PaginationType::Offset => self.offset(index),
        }
    }

    /// Pagination parameter values for every planned request, in order
    pub fn values(&self) -> impl Iterator<Item = usize> + '_ {
        (0..self.requests).map(|index| self.value(index))
    }
}
