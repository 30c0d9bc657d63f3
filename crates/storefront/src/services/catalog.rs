//! Catalog browsing and product administration.

use tracing::instrument;

use super::error::CommerceError;
use super::store::CatalogStore;
use crate::db::RepositoryError;
use crate::models::{
    Category, CurrentUser, NewProduct, Pagination, Product, ProductFilter, ProductPage,
    ProductQuery,
};

/// Catalog operations.
pub struct CatalogService<'a, S> {
    store: &'a S,
}

impl<'a, S: CatalogStore> CatalogService<'a, S> {
    #[must_use]
    pub const fn new(store: &'a S) -> Self {
        Self { store }
    }

    /// All categories.
    ///
    /// # Errors
    ///
    /// Returns `CommerceError::Repository` if storage fails.
    pub async fn list_categories(&self) -> Result<Vec<Category>, CommerceError> {
        Ok(self.store.categories().await?)
    }

    /// One page of products in the requested order (newest first by default).
    ///
    /// # Errors
    ///
    /// Returns `CommerceError::InvalidInput` for bad pagination or price bounds.
    #[instrument(skip(self))]
    pub async fn list_products(&self, query: ProductQuery) -> Result<ProductPage, CommerceError> {
        let filter = ProductFilter::try_from(query).map_err(CommerceError::InvalidInput)?;
        let (products, total) = self.store.search_products(&filter).await?;
        Ok(ProductPage {
            products,
            pagination: Pagination::new(filter.page, filter.limit, total),
        })
    }

    /// A product addressed by its category slug and its own slug.
    ///
    /// # Errors
    ///
    /// Returns `CommerceError::NotFound` if no such product exists.
    pub async fn get_product(
        &self,
        category_slug: &str,
        product_slug: &str,
    ) -> Result<Product, CommerceError> {
        self.store
            .product_by_slugs(category_slug, product_slug)
            .await?
            .ok_or(CommerceError::NotFound("product"))
    }

    /// Create a product with its customizable areas.
    ///
    /// # Errors
    ///
    /// Returns `CommerceError::Forbidden` unless the requester is an admin.
    /// Returns `CommerceError::InvalidInput` if a field is invalid or the
    /// slug is taken.
    /// Returns `CommerceError::NotFound` if the category does not exist.
    #[instrument(skip(self, requester, input), fields(user_id = %requester.id, slug = %input.slug))]
    pub async fn create_product(
        &self,
        requester: &CurrentUser,
        input: NewProduct,
    ) -> Result<Product, CommerceError> {
        if !requester.is_admin() {
            return Err(CommerceError::Forbidden("catalog"));
        }

        let draft = input.validate().map_err(CommerceError::InvalidInput)?;
        if self.store.category(draft.category_id).await?.is_none() {
            return Err(CommerceError::NotFound("category"));
        }

        let product = self
            .store
            .insert_product(&draft)
            .await
            .map_err(|e| match e {
                RepositoryError::Conflict(_) => {
                    CommerceError::InvalidInput(format!("slug `{}` is already in use", draft.slug))
                }
                other => CommerceError::Repository(other),
            })?;

        tracing::info!(product_id = %product.id, "product created");
        Ok(product)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use printloom_core::{CategoryId, CustomizationKind, Price, UserRole};
    use rust_decimal::Decimal;

    use super::*;
    use crate::models::NewArea;
    use crate::services::memory::{MemoryStore, fixtures};

    fn admin() -> CurrentUser {
        let mut user = fixtures::user();
        user.role = UserRole::Admin;
        user
    }

    fn request(category_id: CategoryId, slug: &str) -> NewProduct {
        NewProduct {
            name: "Poster".to_string(),
            slug: slug.to_string(),
            description: None,
            base_price: Decimal::new(1500, 2),
            category_id,
            images: Vec::new(),
            customizable_areas: vec![NewArea {
                name: "Artwork".to_string(),
                kind: CustomizationKind::Image,
                extra_charge: Some(Decimal::new(500, 2)),
            }],
        }
    }

    #[tokio::test]
    async fn test_admin_creates_product() {
        let store = MemoryStore::new();
        let category = fixtures::category(&store, "posters");
        let service = CatalogService::new(&store);

        let product = service
            .create_product(&admin(), request(category, "city-poster"))
            .await
            .unwrap();
        assert_eq!(product.base_price, Price::from_cents(1500));
        assert_eq!(product.customizable_areas.len(), 1);

        let found = service.get_product("posters", "city-poster").await.unwrap();
        assert_eq!(found.id, product.id);
    }

    #[tokio::test]
    async fn test_create_product_rules() {
        let store = MemoryStore::new();
        let category = fixtures::category(&store, "posters");
        let service = CatalogService::new(&store);

        let not_admin = service
            .create_product(&fixtures::user(), request(category, "city-poster"))
            .await;
        assert!(matches!(not_admin, Err(CommerceError::Forbidden(_))));

        let no_category = service
            .create_product(&admin(), request(CategoryId::generate(), "city-poster"))
            .await;
        assert!(matches!(no_category, Err(CommerceError::NotFound("category"))));

        service
            .create_product(&admin(), request(category, "city-poster"))
            .await
            .unwrap();
        let duplicate = service
            .create_product(&admin(), request(category, "city-poster"))
            .await;
        assert!(matches!(duplicate, Err(CommerceError::InvalidInput(_))));
    }

    #[tokio::test]
    async fn test_list_products_paginates_and_filters() {
        let store = MemoryStore::new();
        fixtures::tee(&store);
        fixtures::mug(&store);

        let service = CatalogService::new(&store);
        let page = service
            .list_products(ProductQuery {
                limit: Some(1),
                ..ProductQuery::default()
            })
            .await
            .unwrap();
        assert_eq!(page.products.len(), 1);
        assert_eq!(page.pagination.total, 2);
        assert!(page.pagination.has_more);

        let mugs = service
            .list_products(ProductQuery {
                search: Some("MUG".to_string()),
                ..ProductQuery::default()
            })
            .await
            .unwrap();
        assert_eq!(mugs.pagination.total, 1);

        let bad = service
            .list_products(ProductQuery {
                page: Some(0),
                ..ProductQuery::default()
            })
            .await;
        assert!(matches!(bad, Err(CommerceError::InvalidInput(_))));
    }

    async fn names_sorted_by(service: &CatalogService<'_, MemoryStore>, sort: &str) -> Vec<String> {
        service
            .list_products(ProductQuery {
                sort: Some(sort.to_string()),
                ..ProductQuery::default()
            })
            .await
            .unwrap()
            .products
            .into_iter()
            .map(|p| p.name)
            .collect()
    }

    #[tokio::test]
    async fn test_list_products_sort_orders() {
        let store = MemoryStore::new();
        fixtures::tee(&store);
        fixtures::mug(&store);
        let posters = fixtures::category(&store, "posters");
        let service = CatalogService::new(&store);
        service
            .create_product(&admin(), request(posters, "city-poster"))
            .await
            .unwrap();

        assert_eq!(
            names_sorted_by(&service, "newest").await,
            ["Poster", "Ceramic Mug", "Padalustro T-Shirt"]
        );
        assert_eq!(
            names_sorted_by(&service, "price-asc").await,
            ["Ceramic Mug", "Poster", "Padalustro T-Shirt"]
        );
        assert_eq!(
            names_sorted_by(&service, "price-desc").await,
            ["Padalustro T-Shirt", "Poster", "Ceramic Mug"]
        );
        assert_eq!(
            names_sorted_by(&service, "name-asc").await,
            ["Ceramic Mug", "Padalustro T-Shirt", "Poster"]
        );
        assert_eq!(
            names_sorted_by(&service, "bestselling").await,
            names_sorted_by(&service, "newest").await
        );
    }

    #[tokio::test]
    async fn test_unknown_product_is_not_found() {
        let store = MemoryStore::new();
        let result = CatalogService::new(&store)
            .get_product("mugs", "nope")
            .await;
        assert!(matches!(result, Err(CommerceError::NotFound("product"))));
    }
}
