use habitline_types::api::Pagination;

pub const MAX_LIMIT: u32 = 100;

/// Clamped page/limit pair from query parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Paging {
    pub page: u32,
    pub limit: u32,
}

impl Paging {
    pub fn new(page: Option<u32>, limit: Option<u32>, default_limit: u32) -> Self {
        Self {
            page: page.unwrap_or(1).max(1),
            limit: limit.unwrap_or(default_limit).clamp(1, MAX_LIMIT),
        }
    }

    pub fn offset(&self) -> i64 {
        i64::from(self.page - 1) * i64::from(self.limit)
    }

    pub fn pagination(&self, count: usize, total_count: u64) -> Pagination {
        Pagination::new(self.page, self.limit, count, total_count)
    }
}
