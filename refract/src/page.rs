//! Paging and sorting inputs plus the page envelope returned by list queries.

use serde::Serialize;

/// Direction of one sort key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum SortOrder {
    Asc,
    Desc,
}

impl SortOrder {
    pub(crate) fn into_order(self) -> sea_orm::sea_query::Order {
        match self {
            SortOrder::Asc => sea_orm::sea_query::Order::Asc,
            SortOrder::Desc => sea_orm::sea_query::Order::Desc,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct SortSpec {
    pub path: String,
    pub order: SortOrder,
}

/// Ordered list of sort keys, applied in declaration order.
#[derive(Debug, Clone, Default, Serialize)]
pub struct Sort {
    orders: Vec<SortSpec>,
}

impl Sort {
    pub fn unsorted() -> Self {
        Self::default()
    }

    pub fn by(path: impl Into<String>, order: SortOrder) -> Self {
        Self {
            orders: vec![SortSpec {
                path: path.into(),
                order,
            }],
        }
    }

    pub fn and(mut self, path: impl Into<String>, order: SortOrder) -> Self {
        self.orders.push(SortSpec {
            path: path.into(),
            order,
        });
        self
    }

    pub fn is_sorted(&self) -> bool {
        !self.orders.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &SortSpec> {
        self.orders.iter()
    }
}

/// Zero-based page number and a positive page size.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PageBounds {
    pub number: u64,
    pub size: u64,
}

impl PageBounds {
    pub fn offset(self) -> u64 {
        self.number * self.size
    }
}

/// A page request: optional bounds plus a sort.
#[derive(Debug, Clone, Default, Serialize)]
pub struct PageRequest {
    bounds: Option<PageBounds>,
    sort: Sort,
}

impl PageRequest {
    pub fn of(number: u64, size: u64) -> Self {
        Self {
            bounds: Some(PageBounds { number, size }),
            sort: Sort::unsorted(),
        }
    }

    pub fn unpaged() -> Self {
        Self::default()
    }

    pub fn sorted_by(mut self, sort: Sort) -> Self {
        self.sort = sort;
        self
    }

    pub fn is_paged(&self) -> bool {
        self.bounds.is_some()
    }

    pub fn bounds(&self) -> Option<PageBounds> {
        self.bounds
    }

    pub fn sort(&self) -> &Sort {
        &self.sort
    }
}

/// One page of results with the total element count across all pages.
#[derive(Debug, Clone, Serialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub total_elements: u64,
    pub page_number: u64,
    pub page_size: u64,
}

impl<T> Page<T> {
    pub fn new(items: Vec<T>, bounds: PageBounds, total_elements: u64) -> Self {
        Self {
            items,
            total_elements,
            page_number: bounds.number,
            page_size: bounds.size,
        }
    }

    /// An unpaged result is its own single page.
    pub fn unpaged(items: Vec<T>) -> Self {
        let total = items.len() as u64;
        Self {
            page_size: total.max(1),
            total_elements: total,
            page_number: 0,
            items,
        }
    }

    pub fn total_pages(&self) -> u64 {
        if self.page_size == 0 {
            0
        } else {
            self.total_elements.div_ceil(self.page_size)
        }
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

/// Deduce the total element count from the fetched page alone when possible,
/// avoiding a separate count query: a short page anchored at a known offset
/// pins the total at `offset + fetched`.
pub(crate) fn deduced_total(bounds: PageBounds, fetched: usize) -> Option<u64> {
    let fetched = fetched as u64;
    if fetched < bounds.size && (bounds.offset() == 0 || fetched > 0) {
        Some(bounds.offset() + fetched)
    } else {
        None
    }
}
