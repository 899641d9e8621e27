use serde::{Deserialize, Serialize};

pub const DEFAULT_ITEMS_PER_PAGE: usize = 20;
pub const MAX_ITEMS_PER_PAGE: usize = 100;

/// `?page=&per_page=` parameters shared by list endpoints.
#[derive(Debug, Clone, Copy, Default, Deserialize, PartialEq, Eq)]
pub struct PageQuery {
    pub page: Option<usize>,
    pub per_page: Option<usize>,
}

impl PageQuery {
    pub fn new(page: Option<usize>, per_page: Option<usize>) -> Self {
        Self { page, per_page }
    }

    /// One-based page number; zero and missing values select the first page.
    pub fn page(&self) -> usize {
        self.page.filter(|page| *page > 0).unwrap_or(1)
    }

    pub fn per_page(&self) -> usize {
        self.per_page
            .filter(|per_page| *per_page > 0)
            .unwrap_or(DEFAULT_ITEMS_PER_PAGE)
            .min(MAX_ITEMS_PER_PAGE)
    }
}

#[derive(Debug, Serialize)]
pub struct Paginated<T> {
    pub items: Vec<T>,
    pub total: usize,
    pub page: usize,
    pub per_page: usize,
    pub total_pages: usize,
}

impl<T> Paginated<T> {
    pub fn new(items: Vec<T>, total: usize, page: usize, per_page: usize) -> Self {
        let per_page = per_page.max(1);
        Self {
            items,
            total,
            page: page.max(1),
            per_page,
            total_pages: total.div_ceil(per_page),
        }
    }

    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Paginated<U> {
        Paginated {
            items: self.items.into_iter().map(f).collect(),
            total: self.total,
            page: self.page,
            per_page: self.per_page,
            total_pages: self.total_pages,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn page_query_normalizes_values() {
        let query = PageQuery::new(Some(0), Some(1000));
        assert_eq!(query.page(), 1);
        assert_eq!(query.per_page(), MAX_ITEMS_PER_PAGE);

        let query = PageQuery::default();
        assert_eq!(query.per_page(), DEFAULT_ITEMS_PER_PAGE);
    }

    #[test]
    fn total_pages_rounds_up() {
        let page = Paginated::new(vec![1, 2], 41, 3, 20);
        assert_eq!(page.total_pages, 3);
        assert_eq!(Paginated::<u8>::new(vec![], 0, 1, 20).total_pages, 0);
    }
}
