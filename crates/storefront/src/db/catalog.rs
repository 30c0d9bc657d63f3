//! Catalog repository: categories, products and customizable areas.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use sqlx::PgPool;

use printloom_core::{
    AreaId, CategoryId, CustomizableArea, CustomizationKind, Price, ProductId,
};

use super::{PgStore, RepositoryError};
use crate::models::{Category, CategoryRef, Product, ProductDraft, ProductFilter};
use crate::services::CatalogStore;

const PRODUCT_COLUMNS: &str = r"
    SELECT p.id, p.name, p.slug, p.description, p.base_price, p.images, p.created_at,
           c.id AS category_id, c.name AS category_name, c.slug AS category_slug
    FROM products p
    JOIN categories c ON c.id = p.category_id
";

const FILTER_CLAUSE: &str = r"
    WHERE ($1::text IS NULL OR c.slug = $1)
      AND ($2::text IS NULL OR p.name ILIKE $2 OR p.description ILIKE $2)
      AND ($3::numeric IS NULL OR p.base_price >= $3)
      AND ($4::numeric IS NULL OR p.base_price <= $4)
";

#[derive(sqlx::FromRow)]
struct CategoryRow {
    id: CategoryId,
    name: String,
    slug: String,
    description: Option<String>,
    image_url: Option<String>,
}

impl From<CategoryRow> for Category {
    fn from(row: CategoryRow) -> Self {
        Self {
            id: row.id,
            name: row.name,
            slug: row.slug,
            description: row.description,
            image_url: row.image_url,
        }
    }
}

#[derive(sqlx::FromRow)]
struct ProductRow {
    id: ProductId,
    name: String,
    slug: String,
    description: Option<String>,
    base_price: Price,
    images: Vec<String>,
    created_at: DateTime<Utc>,
    category_id: CategoryId,
    category_name: String,
    category_slug: String,
}

#[derive(sqlx::FromRow)]
struct AreaRow {
    id: AreaId,
    product_id: ProductId,
    name: String,
    kind: CustomizationKind,
    extra_charge: Option<Price>,
}

impl From<AreaRow> for CustomizableArea {
    fn from(row: AreaRow) -> Self {
        Self {
            id: row.id,
            product_id: row.product_id,
            name: row.name,
            kind: row.kind,
            extra_charge: row.extra_charge,
        }
    }
}

/// Escape `%`, `_` and `\` and wrap in wildcards for an `ILIKE` substring match.
fn like_pattern(term: &str) -> String {
    let mut pattern = String::with_capacity(term.len() + 2);
    pattern.push('%');
    for ch in term.chars() {
        if matches!(ch, '%' | '_' | '\\') {
            pattern.push('\\');
        }
        pattern.push(ch);
    }
    pattern.push('%');
    pattern
}

/// Repository for catalog database operations.
pub struct CatalogRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> CatalogRepository<'a> {
    /// Create a new catalog repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// All categories, by name.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn categories(&self) -> Result<Vec<Category>, RepositoryError> {
        let rows = sqlx::query_as::<_, CategoryRow>(
            "SELECT id, name, slug, description, image_url FROM categories ORDER BY name",
        )
        .fetch_all(self.pool)
        .await?;
        Ok(rows.into_iter().map(Category::from).collect())
    }

    /// Get a category by ID.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn category(&self, id: CategoryId) -> Result<Option<Category>, RepositoryError> {
        let row = sqlx::query_as::<_, CategoryRow>(
            "SELECT id, name, slug, description, image_url FROM categories WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(self.pool)
        .await?;
        Ok(row.map(Category::from))
    }

    /// Get a product (with its areas) by ID.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn product(&self, id: ProductId) -> Result<Option<Product>, RepositoryError> {
        let row = sqlx::query_as::<_, ProductRow>(&format!("{PRODUCT_COLUMNS} WHERE p.id = $1"))
            .bind(id)
            .fetch_optional(self.pool)
            .await?;
        self.with_areas(row.into_iter().collect())
            .await
            .map(|mut products| products.pop())
    }

    /// Get several products by ID, keyed by ID. Missing IDs are skipped.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn products(
        &self,
        ids: &[ProductId],
    ) -> Result<HashMap<ProductId, Product>, RepositoryError> {
        if ids.is_empty() {
            return Ok(HashMap::new());
        }
        let rows = sqlx::query_as::<_, ProductRow>(&format!("{PRODUCT_COLUMNS} WHERE p.id = ANY($1)"))
            .bind(ids)
            .fetch_all(self.pool)
            .await?;
        Ok(self
            .with_areas(rows)
            .await?
            .into_iter()
            .map(|product| (product.id, product))
            .collect())
    }

    /// Get a product by its category slug and product slug.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn product_by_slugs(
        &self,
        category_slug: &str,
        product_slug: &str,
    ) -> Result<Option<Product>, RepositoryError> {
        let row = sqlx::query_as::<_, ProductRow>(&format!(
            "{PRODUCT_COLUMNS} WHERE c.slug = $1 AND p.slug = $2"
        ))
        .bind(category_slug)
        .bind(product_slug)
        .fetch_optional(self.pool)
        .await?;
        self.with_areas(row.into_iter().collect())
            .await
            .map(|mut products| products.pop())
    }

    /// One page of products matching `filter` in the filter's sort order,
    /// plus the total number of matches.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn search(
        &self,
        filter: &ProductFilter,
    ) -> Result<(Vec<Product>, u64), RepositoryError> {
        let search = filter.search.as_deref().map(like_pattern);
        let limit = i64::from(filter.limit);
        let offset = i64::try_from(filter.offset())
            .map_err(|_| RepositoryError::Conflict("page is out of range".to_owned()))?;

        let total: i64 = sqlx::query_scalar(&format!(
            "SELECT COUNT(*) FROM products p JOIN categories c ON c.id = p.category_id {FILTER_CLAUSE}"
        ))
        .bind(filter.category.as_deref())
        .bind(search.as_deref())
        .bind(filter.min_price)
        .bind(filter.max_price)
        .fetch_one(self.pool)
        .await?;

        let rows = sqlx::query_as::<_, ProductRow>(&format!(
            "{PRODUCT_COLUMNS} {FILTER_CLAUSE} ORDER BY {} LIMIT $5 OFFSET $6",
            filter.sort.order_by()
        ))
        .bind(filter.category.as_deref())
        .bind(search.as_deref())
        .bind(filter.min_price)
        .bind(filter.max_price)
        .bind(limit)
        .bind(offset)
        .fetch_all(self.pool)
        .await?;

        let total = u64::try_from(total)
            .map_err(|_| RepositoryError::DataCorruption(format!("negative count: {total}")))?;
        Ok((self.with_areas(rows).await?, total))
    }

    /// Insert a product and its areas in one transaction.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the slug is taken.
    /// Returns `RepositoryError::Database` for other database errors.
    pub async fn insert(&self, draft: &ProductDraft) -> Result<Product, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        sqlx::query(
            r"
            INSERT INTO products (id, category_id, name, slug, description, base_price, images)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            ",
        )
        .bind(draft.id)
        .bind(draft.category_id)
        .bind(&draft.name)
        .bind(&draft.slug)
        .bind(draft.description.as_deref())
        .bind(draft.base_price)
        .bind(&draft.images)
        .execute(&mut *tx)
        .await
        .map_err(|e| RepositoryError::unique_violation(e, "product slug"))?;

        for (position, area) in (0_i32..).zip(&draft.areas) {
            sqlx::query(
                r"
                INSERT INTO customizable_areas (id, product_id, name, kind, extra_charge, position)
                VALUES ($1, $2, $3, $4, $5, $6)
                ",
            )
            .bind(area.id)
            .bind(draft.id)
            .bind(&area.name)
            .bind(area.kind)
            .bind(area.extra_charge)
            .bind(position)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;

        self.product(draft.id).await?.ok_or(RepositoryError::NotFound)
    }

    /// Attach customizable areas to product rows, keeping row order.
    async fn with_areas(&self, rows: Vec<ProductRow>) -> Result<Vec<Product>, RepositoryError> {
        if rows.is_empty() {
            return Ok(Vec::new());
        }

        let ids: Vec<ProductId> = rows.iter().map(|r| r.id).collect();
        let area_rows = sqlx::query_as::<_, AreaRow>(
            r"
            SELECT id, product_id, name, kind, extra_charge
            FROM customizable_areas
            WHERE product_id = ANY($1)
            ORDER BY position, name
            ",
        )
        .bind(&ids)
        .fetch_all(self.pool)
        .await?;

        let mut areas: HashMap<ProductId, Vec<CustomizableArea>> = HashMap::new();
        for row in area_rows {
            areas.entry(row.product_id).or_default().push(row.into());
        }

        Ok(rows
            .into_iter()
            .map(|row| Product {
                customizable_areas: areas.remove(&row.id).unwrap_or_default(),
                id: row.id,
                name: row.name,
                slug: row.slug,
                description: row.description,
                base_price: row.base_price,
                images: row.images,
                category: CategoryRef {
                    id: row.category_id,
                    name: row.category_name,
                    slug: row.category_slug,
                },
                created_at: row.created_at,
            })
            .collect())
    }
}

impl CatalogStore for PgStore {
    async fn categories(&self) -> Result<Vec<Category>, RepositoryError> {
        CatalogRepository::new(self.pool()).categories().await
    }

    async fn category(&self, id: CategoryId) -> Result<Option<Category>, RepositoryError> {
        CatalogRepository::new(self.pool()).category(id).await
    }

    async fn product(&self, id: ProductId) -> Result<Option<Product>, RepositoryError> {
        CatalogRepository::new(self.pool()).product(id).await
    }

    async fn product_by_slugs(
        &self,
        category_slug: &str,
        product_slug: &str,
    ) -> Result<Option<Product>, RepositoryError> {
        CatalogRepository::new(self.pool())
            .product_by_slugs(category_slug, product_slug)
            .await
    }

    async fn search_products(
        &self,
        filter: &ProductFilter,
    ) -> Result<(Vec<Product>, u64), RepositoryError> {
        CatalogRepository::new(self.pool()).search(filter).await
    }

    async fn insert_product(&self, draft: &ProductDraft) -> Result<Product, RepositoryError> {
        CatalogRepository::new(self.pool()).insert(draft).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_like_pattern_escapes_wildcards() {
        assert_eq!(like_pattern("mug"), "%mug%");
        assert_eq!(like_pattern("50%_off"), "%50\\%\\_off%");
        assert_eq!(like_pattern("a\\b"), "%a\\\\b%");
    }
}
