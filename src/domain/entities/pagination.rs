use std::collections::HashMap;

use serde::Serialize;

/// Page request after defaults and the page-size cap were applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub page: u32,
    pub limit: u32,
}

impl PageRequest {
    /// Reads `page` and `limit` from query parameters. Anything that is not a
    /// positive integer falls back to the default.
    pub fn from_query(
        query: &HashMap<String, String>,
        default_limit: u32,
        max_limit: u32,
    ) -> Self {
        let page = positive_param(query, "page").unwrap_or(1);
        let limit = positive_param(query, "limit")
            .unwrap_or(default_limit)
            .min(max_limit);

        PageRequest { page, limit }
    }

    /// Rows to skip for a 1-based page.
    pub fn offset(&self) -> i64 {
        let page = self.page.saturating_sub(1);
        (page as i64) * (self.limit as i64)
    }
}

fn positive_param(query: &HashMap<String, String>, key: &str) -> Option<u32> {
    query
        .get(key)
        .and_then(|v| v.trim().parse::<u32>().ok())
        .filter(|v| *v > 0)
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct Pagination {
    pub page: u32,
    pub limit: u32,
    pub total: i64,
    #[serde(rename = "totalPages")]
    pub total_pages: i64,
}

impl Pagination {
    pub fn new(request: PageRequest, total: i64) -> Self {
        Pagination {
            page: request.page,
            limit: request.limit,
            total,
            total_pages: total_pages(total, request.limit),
        }
    }
}

/// `ceil(total / limit)`
pub fn total_pages(total: i64, limit: u32) -> i64 {
    if limit == 0 || total <= 0 {
        return 0;
    }
    let limit = limit as i64;
    (total + limit - 1) / limit
}
