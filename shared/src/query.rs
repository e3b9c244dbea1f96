//! List query parameters and pagination envelope
//!
//! Raw query-string input is untrusted. [`QuerySpec::normalize`] is the only
//! path from raw parameters to something the data layer accepts: malformed
//! optional fields degrade to their defaults instead of failing, so a listing
//! request is always servable.

use serde::{Deserialize, Serialize};

/// Maximum page size accepted from callers
pub const MAX_LIMIT: u32 = 100;

/// Raw, untrusted list parameters as they arrive on the query string.
///
/// Every field is plain text; coercion and validation happen in
/// [`QuerySpec::normalize`].
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ListParams {
    pub page: Option<String>,
    pub limit: Option<String>,
    pub sort: Option<String>,
    pub order: Option<String>,
    pub q: Option<String>,
    #[serde(rename = "minPrice")]
    pub min_price: Option<String>,
    #[serde(rename = "maxPrice")]
    pub max_price: Option<String>,
}

/// Fetch mode a query (and its cache entry) runs under
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PageMode {
    /// Classic page/limit listing
    Paged,
    /// Client-side accumulation of successive pages into one growing list
    Infinite,
}

impl PageMode {
    /// Default page size for this mode
    pub fn default_limit(self) -> u32 {
        match self {
            PageMode::Paged => 12,
            PageMode::Infinite => 20,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            PageMode::Paged => "paged",
            PageMode::Infinite => "infinite",
        }
    }
}

/// Sortable columns. Closed set: raw input never reaches the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SortField {
    Id,
    Name,
    Price,
    DiscountedPrice,
    Sku,
    CreatedAt,
    UpdatedAt,
}

impl SortField {
    /// Parse a wire name; anything outside the set is rejected
    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "id" => Some(Self::Id),
            "name" => Some(Self::Name),
            "price" => Some(Self::Price),
            "discountedPrice" => Some(Self::DiscountedPrice),
            "sku" => Some(Self::Sku),
            "createdAt" => Some(Self::CreatedAt),
            "updatedAt" => Some(Self::UpdatedAt),
            _ => None,
        }
    }

    /// Wire name (query-string value)
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Id => "id",
            Self::Name => "name",
            Self::Price => "price",
            Self::DiscountedPrice => "discountedPrice",
            Self::Sku => "sku",
            Self::CreatedAt => "createdAt",
            Self::UpdatedAt => "updatedAt",
        }
    }
}

/// Sort direction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SortOrder {
    Asc,
    Desc,
}

impl SortOrder {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.to_ascii_uppercase().as_str() {
            "ASC" => Some(Self::Asc),
            "DESC" => Some(Self::Desc),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Asc => "ASC",
            Self::Desc => "DESC",
        }
    }
}

/// Normalized, validated list query
///
/// Invariants: `page >= 1`, `limit` within `[1, MAX_LIMIT]`, `sort` drawn from
/// the [`SortField`] enum, `search` non-blank when present.
#[derive(Debug, Clone, PartialEq)]
pub struct QuerySpec {
    pub mode: PageMode,
    pub page: u32,
    pub limit: u32,
    pub sort: SortField,
    pub order: SortOrder,
    pub search: Option<String>,
    pub min_price: Option<f64>,
    pub max_price: Option<f64>,
}

impl QuerySpec {
    /// Normalize raw parameters into a validated spec. Never fails.
    pub fn normalize(raw: &ListParams, mode: PageMode) -> Self {
        let page = raw
            .page
            .as_deref()
            .and_then(|p| p.trim().parse::<i64>().ok())
            .filter(|p| *p >= 1)
            .map(|p| p.min(u32::MAX as i64) as u32)
            .unwrap_or(1);

        let limit = raw
            .limit
            .as_deref()
            .and_then(|l| l.trim().parse::<i64>().ok())
            .map(|l| l.clamp(1, MAX_LIMIT as i64) as u32)
            .unwrap_or_else(|| mode.default_limit());

        let sort = raw
            .sort
            .as_deref()
            .and_then(SortField::parse)
            .unwrap_or(SortField::CreatedAt);

        let order = raw
            .order
            .as_deref()
            .and_then(SortOrder::parse)
            .unwrap_or(SortOrder::Desc);

        let search = raw
            .q
            .as_deref()
            .map(str::trim)
            .filter(|q| !q.is_empty())
            .map(str::to_string);

        // Non-numeric bounds are silently ignored, not rejected
        let min_price = parse_price(raw.min_price.as_deref());
        let max_price = parse_price(raw.max_price.as_deref());

        Self {
            mode,
            page,
            limit,
            sort,
            order,
            search,
            min_price,
            max_price,
        }
    }

    /// Create a spec for classic paged listing with defaults
    pub fn paged() -> Self {
        Self::with_mode(PageMode::Paged)
    }

    /// Create a spec for infinite accumulation with defaults
    pub fn infinite() -> Self {
        Self::with_mode(PageMode::Infinite)
    }

    fn with_mode(mode: PageMode) -> Self {
        Self {
            mode,
            page: 1,
            limit: mode.default_limit(),
            sort: SortField::CreatedAt,
            order: SortOrder::Desc,
            search: None,
            min_price: None,
            max_price: None,
        }
    }

    /// Set the page (floored to 1)
    pub fn page(mut self, page: u32) -> Self {
        self.page = page.max(1);
        self
    }

    /// Set the page size (clamped to `[1, MAX_LIMIT]`)
    pub fn limit(mut self, limit: u32) -> Self {
        self.limit = limit.clamp(1, MAX_LIMIT);
        self
    }

    /// Set sort field and direction
    pub fn order_by(mut self, sort: SortField, order: SortOrder) -> Self {
        self.sort = sort;
        self.order = order;
        self
    }

    /// Set the search term (blank input clears it)
    pub fn search(mut self, term: impl Into<String>) -> Self {
        let term = term.into();
        let term = term.trim();
        self.search = if term.is_empty() {
            None
        } else {
            Some(term.to_string())
        };
        self
    }

    /// Set inclusive price bounds
    pub fn price_range(mut self, min: Option<f64>, max: Option<f64>) -> Self {
        self.min_price = min.filter(|p| p.is_finite());
        self.max_price = max.filter(|p| p.is_finite());
        self
    }

    /// Deterministic cache key for this spec.
    ///
    /// Infinite mode excludes `page`: all accumulated pages of one query
    /// share a single cache entry.
    pub fn signature(&self) -> String {
        let mut sig = format!("{}?", self.mode.as_str());
        if self.mode == PageMode::Paged {
            sig.push_str(&format!("page={}&", self.page));
        }
        sig.push_str(&format!(
            "limit={}&sort={}&order={}",
            self.limit,
            self.sort.as_str(),
            self.order.as_str()
        ));
        if let Some(q) = &self.search {
            sig.push_str(&format!("&q={}", q));
        }
        if let Some(min) = self.min_price {
            sig.push_str(&format!("&minPrice={}", min));
        }
        if let Some(max) = self.max_price {
            sig.push_str(&format!("&maxPrice={}", max));
        }
        sig
    }
}

fn parse_price(raw: Option<&str>) -> Option<f64> {
    raw.and_then(|p| p.trim().parse::<f64>().ok())
        .filter(|p| p.is_finite())
}

/// One page of results plus total-count metadata
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaginatedResponse<T> {
    /// Data in sort order
    pub data: Vec<T>,
    /// Count of all matching records, not just this page
    pub total: u64,
    /// 1-based page number
    pub page: u32,
    /// Page size the query ran with
    pub limit: u32,
}

impl<T> PaginatedResponse<T> {
    pub fn new(data: Vec<T>, total: u64, page: u32, limit: u32) -> Self {
        Self {
            data,
            total,
            page,
            limit,
        }
    }

    /// Total pages for this result set
    pub fn total_pages(&self) -> u32 {
        if self.limit == 0 {
            return 1;
        }
        self.total.div_ceil(self.limit as u64) as u32
    }

    /// Whether a page after this one exists
    pub fn has_more(&self) -> bool {
        self.page < self.total_pages()
    }
}
