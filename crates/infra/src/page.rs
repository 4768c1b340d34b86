//! Offset pagination shared by the list endpoints.

use serde::Serialize;

/// Page request. Out-of-range values are clamped rather than rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageParams {
    pub page: i64,
    pub limit: i64,
}

impl PageParams {
    pub const DEFAULT_LIMIT: i64 = 10;
    const MAX_LIMIT: i64 = 100;

    pub fn new(page: Option<i64>, limit: Option<i64>) -> Self {
        Self {
            page: page.unwrap_or(1).max(1),
            limit: limit
                .unwrap_or(Self::DEFAULT_LIMIT)
                .clamp(1, Self::MAX_LIMIT),
        }
    }

    pub fn offset(&self) -> i64 {
        (self.page - 1) * self.limit
    }
}

impl Default for PageParams {
    fn default() -> Self {
        Self::new(None, None)
    }
}

/// One page of results plus the totals the envelope reports.
#[derive(Debug, Clone, Serialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub total: i64,
    pub pages: i64,
    pub page: i64,
}

impl<T> Page<T> {
    pub fn new(items: Vec<T>, total: i64, params: PageParams) -> Self {
        Self {
            items,
            total,
            pages: (total + params.limit - 1) / params.limit,
            page: params.page,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_and_clamping() {
        let params = PageParams::default();
        assert_eq!(params.page, 1);
        assert_eq!(params.limit, PageParams::DEFAULT_LIMIT);
        assert_eq!(params.offset(), 0);

        let params = PageParams::new(Some(0), Some(1000));
        assert_eq!(params.page, 1);
        assert_eq!(params.limit, 100);

        let params = PageParams::new(Some(3), Some(10));
        assert_eq!(params.offset(), 20);
    }

    #[test]
    fn page_count_rounds_up() {
        let page = Page::new(vec![1, 2, 3], 31, PageParams::new(Some(1), Some(10)));
        assert_eq!(page.pages, 4);
        assert_eq!(page.total, 31);
    }
}
