use serde::Serialize;

/// Number of products shown on a listing page.
pub const DEFAULT_ITEMS_PER_PAGE: usize = 10;

/// Highest page number a listing honours; larger requests are capped to it.
pub const MAX_PAGE: usize = i32::MAX as usize;

/// Page selection applied to a list query.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pagination {
    /// 1-based page number; zero is treated as the first page and values
    /// above [`MAX_PAGE`] as [`MAX_PAGE`].
    pub page: usize,
    pub per_page: usize,
}

impl Pagination {
    /// Effective 1-based page number.
    pub fn page(&self) -> usize {
        self.page.clamp(1, MAX_PAGE)
    }

    /// Number of rows skipped before this page starts.
    pub fn offset(&self) -> usize {
        (self.page() - 1).saturating_mul(self.per_page)
    }
}

/// A bounded slice of a listing plus the metadata needed to render page links.
#[derive(Debug, Clone, Serialize)]
pub struct Paginated<T> {
    pub items: Vec<T>,
    pub page: usize,
    pub per_page: usize,
    pub total: usize,
    pub total_pages: usize,
}

impl<T> Paginated<T> {
    pub fn new(items: Vec<T>, pagination: Pagination, total: usize) -> Self {
        let per_page = pagination.per_page.max(1);
        Self {
            items,
            page: pagination.page(),
            per_page,
            total,
            total_pages: total.div_ceil(per_page),
        }
    }

    /// Convert every item while keeping the page metadata.
    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Paginated<U> {
        Paginated {
            items: self.items.into_iter().map(f).collect(),
            page: self.page,
            per_page: self.per_page,
            total: self.total,
            total_pages: self.total_pages,
        }
    }

    pub fn has_previous(&self) -> bool {
        self.page > 1
    }

    pub fn has_next(&self) -> bool {
        self.page < self.total_pages
    }
}
