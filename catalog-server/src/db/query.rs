//! Query Composer
//!
//! Translates a validated [`QuerySpec`] into SQL fragments for the products
//! table. All filter values are carried as bind parameters; the ORDER BY
//! column is derived from the [`SortField`] enum only, so raw caller input is
//! never interpolated into SQL.

use shared::query::{QuerySpec, SortField, SortOrder};

/// A value bound into the composed query, in placeholder order
#[derive(Debug, Clone, PartialEq)]
pub enum BindValue {
    Text(String),
    Real(f64),
}

/// Composed SQL fragments for one product listing query
#[derive(Debug, Clone)]
pub struct ProductQuery {
    where_sql: String,
    binds: Vec<BindValue>,
    order_sql: String,
    limit: i64,
    offset: i64,
}

impl ProductQuery {
    /// Compose the conjunctive predicate, ordering and page window.
    ///
    /// The search term expands to one OR-group over name/description/sku,
    /// ANDed with the price bounds.
    pub fn from_spec(spec: &QuerySpec) -> Self {
        let mut conditions: Vec<&str> = Vec::new();
        let mut binds = Vec::new();

        if let Some(q) = &spec.search {
            conditions.push("(name LIKE ? OR description LIKE ? OR sku LIKE ?)");
            let pattern = format!("%{q}%");
            binds.push(BindValue::Text(pattern.clone()));
            binds.push(BindValue::Text(pattern.clone()));
            binds.push(BindValue::Text(pattern));
        }
        if let Some(min) = spec.min_price {
            conditions.push("price >= ?");
            binds.push(BindValue::Real(min));
        }
        if let Some(max) = spec.max_price {
            conditions.push("price <= ?");
            binds.push(BindValue::Real(max));
        }

        let where_sql = if conditions.is_empty() {
            String::new()
        } else {
            format!(" WHERE {}", conditions.join(" AND "))
        };

        let order_sql = format!(
            " ORDER BY {} {}",
            sort_column(spec.sort),
            spec.order.as_str()
        );

        Self {
            where_sql,
            binds,
            order_sql,
            limit: spec.limit as i64,
            offset: (spec.page as i64 - 1) * spec.limit as i64,
        }
    }

    /// SELECT statement for the page window. The trailing placeholders are
    /// LIMIT and OFFSET, bound after [`Self::binds`].
    pub fn select_sql(&self, columns: &str) -> String {
        format!(
            "SELECT {} FROM products{}{} LIMIT ? OFFSET ?",
            columns, self.where_sql, self.order_sql
        )
    }

    /// COUNT statement over the same predicates, without the page window
    pub fn count_sql(&self) -> String {
        format!("SELECT COUNT(*) FROM products{}", self.where_sql)
    }

    /// Filter bind values, in placeholder order
    pub fn binds(&self) -> &[BindValue] {
        &self.binds
    }

    pub fn limit(&self) -> i64 {
        self.limit
    }

    pub fn offset(&self) -> i64 {
        self.offset
    }
}

fn sort_column(field: SortField) -> &'static str {
    match field {
        SortField::Id => "id",
        SortField::Name => "name",
        SortField::Price => "price",
        SortField::DiscountedPrice => "discounted_price",
        SortField::Sku => "sku",
        SortField::CreatedAt => "created_at",
        SortField::UpdatedAt => "updated_at",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared::query::{ListParams, PageMode};

    #[test]
    fn test_no_filters() {
        let spec = QuerySpec::paged();
        let query = ProductQuery::from_spec(&spec);

        assert_eq!(
            query.select_sql("*"),
            "SELECT * FROM products ORDER BY created_at DESC LIMIT ? OFFSET ?"
        );
        assert_eq!(query.count_sql(), "SELECT COUNT(*) FROM products");
        assert!(query.binds().is_empty());
        assert_eq!(query.limit(), 12);
        assert_eq!(query.offset(), 0);
    }

    #[test]
    fn test_search_is_one_or_group() {
        let spec = QuerySpec::paged().search("milk");
        let query = ProductQuery::from_spec(&spec);

        assert_eq!(
            query.count_sql(),
            "SELECT COUNT(*) FROM products WHERE (name LIKE ? OR description LIKE ? OR sku LIKE ?)"
        );
        assert_eq!(
            query.binds(),
            &[
                BindValue::Text("%milk%".into()),
                BindValue::Text("%milk%".into()),
                BindValue::Text("%milk%".into()),
            ]
        );
    }

    #[test]
    fn test_all_predicates_are_anded() {
        let spec = QuerySpec::paged()
            .search("milk")
            .price_range(Some(1.5), Some(10.0));
        let query = ProductQuery::from_spec(&spec);

        assert_eq!(
            query.count_sql(),
            "SELECT COUNT(*) FROM products WHERE (name LIKE ? OR description LIKE ? OR sku LIKE ?) AND price >= ? AND price <= ?"
        );
        assert_eq!(query.binds().len(), 5);
        assert_eq!(query.binds()[3], BindValue::Real(1.5));
        assert_eq!(query.binds()[4], BindValue::Real(10.0));
    }

    #[test]
    fn test_offset_math() {
        let spec = QuerySpec::paged().page(3).limit(10);
        let query = ProductQuery::from_spec(&spec);
        assert_eq!(query.limit(), 10);
        assert_eq!(query.offset(), 20);
    }

    #[test]
    fn test_hostile_sort_never_reaches_sql() {
        let mut raw = ListParams::default();
        raw.sort = Some("created_at; DROP TABLE products".into());
        let spec = QuerySpec::normalize(&raw, PageMode::Paged);
        let query = ProductQuery::from_spec(&spec);

        assert_eq!(
            query.select_sql("id"),
            "SELECT id FROM products ORDER BY created_at DESC LIMIT ? OFFSET ?"
        );
    }

    #[test]
    fn test_search_term_is_bound_not_interpolated() {
        let spec = QuerySpec::paged().search("'; DROP TABLE products; --");
        let query = ProductQuery::from_spec(&spec);

        assert!(!query.select_sql("*").contains("DROP"));
        assert_eq!(
            query.binds()[0],
            BindValue::Text("%'; DROP TABLE products; --%".into())
        );
    }
}
