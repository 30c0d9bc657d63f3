//! Cart repository.
//!
//! Uniqueness of a cart per user and of an item per (cart, product,
//! customization set) is enforced by unique indexes, so concurrent requests
//! from the same user converge on one cart and one row per combination.

use sqlx::PgPool;
use sqlx::types::Json;

use printloom_core::{CartId, CartItemId, CustomizationSet, ProductId, UserId};

use super::catalog::CatalogRepository;
use super::{PgStore, RepositoryError, quantity_from_db, quantity_to_db};
use crate::models::{Cart, CartLine, OwnedCartLine};
use crate::services::CartStore;

#[derive(sqlx::FromRow)]
struct CartRow {
    id: CartId,
    user_id: UserId,
}

impl From<CartRow> for Cart {
    fn from(row: CartRow) -> Self {
        Self {
            id: row.id,
            user_id: row.user_id,
        }
    }
}

#[derive(sqlx::FromRow)]
struct CartItemRow {
    id: CartItemId,
    cart_id: CartId,
    owner: UserId,
    product_id: ProductId,
    quantity: i32,
    customizations: Json<CustomizationSet>,
}

const ITEM_COLUMNS: &str = r"
    SELECT ci.id, ci.cart_id, c.user_id AS owner, ci.product_id, ci.quantity, ci.customizations
    FROM cart_items ci
    JOIN carts c ON c.id = ci.cart_id
";

/// Repository for cart database operations.
pub struct CartRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> CartRepository<'a> {
    /// Create a new cart repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Get the user's cart, creating it if needed.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn ensure(&self, user_id: UserId) -> Result<Cart, RepositoryError> {
        // The no-op update makes RETURNING yield the existing row on conflict.
        let row = sqlx::query_as::<_, CartRow>(
            r"
            INSERT INTO carts (id, user_id)
            VALUES ($1, $2)
            ON CONFLICT (user_id) DO UPDATE SET updated_at = carts.updated_at
            RETURNING id, user_id
            ",
        )
        .bind(CartId::generate())
        .bind(user_id)
        .fetch_one(self.pool)
        .await?;
        Ok(row.into())
    }

    /// Get a cart by ID.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn find(&self, id: CartId) -> Result<Option<Cart>, RepositoryError> {
        let row = sqlx::query_as::<_, CartRow>("SELECT id, user_id FROM carts WHERE id = $1")
            .bind(id)
            .fetch_optional(self.pool)
            .await?;
        Ok(row.map(Cart::from))
    }

    /// All items of a cart joined with their products, oldest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    /// Returns `RepositoryError::DataCorruption` if a stored row is invalid.
    pub async fn lines(&self, cart_id: CartId) -> Result<Vec<CartLine>, RepositoryError> {
        let rows = sqlx::query_as::<_, CartItemRow>(&format!(
            "{ITEM_COLUMNS} WHERE ci.cart_id = $1 ORDER BY ci.created_at, ci.id"
        ))
        .bind(cart_id)
        .fetch_all(self.pool)
        .await?;

        Ok(self
            .hydrate(rows)
            .await?
            .into_iter()
            .map(|owned| owned.line)
            .collect())
    }

    /// Get one item with its product and the owner of its cart.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn find_line(
        &self,
        item_id: CartItemId,
    ) -> Result<Option<OwnedCartLine>, RepositoryError> {
        let row = sqlx::query_as::<_, CartItemRow>(&format!("{ITEM_COLUMNS} WHERE ci.id = $1"))
            .bind(item_id)
            .fetch_optional(self.pool)
            .await?;
        Ok(self.hydrate(row.into_iter().collect()).await?.pop())
    }

    /// Add an item, or bump the quantity of the identical item already in the cart.
    ///
    /// Returns `None` without touching the row when the summed quantity
    /// would exceed `max_quantity`.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn add_or_merge(
        &self,
        cart_id: CartId,
        product_id: ProductId,
        quantity: u32,
        max_quantity: u32,
        customizations: &CustomizationSet,
    ) -> Result<Option<CartItemId>, RepositoryError> {
        let id = sqlx::query_scalar::<_, CartItemId>(
            r"
            INSERT INTO cart_items (id, cart_id, product_id, quantity, customizations, customization_key)
            VALUES ($1, $2, $3, $4, $5, $6)
            ON CONFLICT (cart_id, product_id, customization_key)
            DO UPDATE SET quantity = cart_items.quantity + EXCLUDED.quantity
            WHERE cart_items.quantity + EXCLUDED.quantity <= $7
            RETURNING id
            ",
        )
        .bind(CartItemId::generate())
        .bind(cart_id)
        .bind(product_id)
        .bind(quantity_to_db(quantity)?)
        .bind(Json(customizations))
        .bind(customizations.canonical_key())
        .bind(quantity_to_db(max_quantity)?)
        .fetch_optional(self.pool)
        .await?;
        Ok(id)
    }

    /// Set an item's quantity.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the item no longer exists.
    pub async fn set_quantity(
        &self,
        item_id: CartItemId,
        quantity: u32,
    ) -> Result<(), RepositoryError> {
        let result = sqlx::query("UPDATE cart_items SET quantity = $2 WHERE id = $1")
            .bind(item_id)
            .bind(quantity_to_db(quantity)?)
            .execute(self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }

    /// Delete an item. Returns whether a row was removed.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn delete(&self, item_id: CartItemId) -> Result<bool, RepositoryError> {
        let result = sqlx::query("DELETE FROM cart_items WHERE id = $1")
            .bind(item_id)
            .execute(self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn hydrate(&self, rows: Vec<CartItemRow>) -> Result<Vec<OwnedCartLine>, RepositoryError> {
        let mut product_ids: Vec<ProductId> = rows.iter().map(|r| r.product_id).collect();
        product_ids.sort_unstable();
        product_ids.dedup();
        let products = CatalogRepository::new(self.pool)
            .products(&product_ids)
            .await?;

        rows.into_iter()
            .map(|row| {
                let product = products.get(&row.product_id).cloned().ok_or_else(|| {
                    RepositoryError::DataCorruption(format!(
                        "cart item {} references missing product {}",
                        row.id, row.product_id
                    ))
                })?;
                Ok(OwnedCartLine {
                    owner: row.owner,
                    line: CartLine {
                        id: row.id,
                        cart_id: row.cart_id,
                        quantity: quantity_from_db(row.quantity)?,
                        customizations: row.customizations.0,
                        product,
                    },
                })
            })
            .collect()
    }
}

impl CartStore for PgStore {
    async fn ensure_cart(&self, user_id: UserId) -> Result<Cart, RepositoryError> {
        CartRepository::new(self.pool()).ensure(user_id).await
    }

    async fn find_cart(&self, id: CartId) -> Result<Option<Cart>, RepositoryError> {
        CartRepository::new(self.pool()).find(id).await
    }

    async fn cart_lines(&self, cart_id: CartId) -> Result<Vec<CartLine>, RepositoryError> {
        CartRepository::new(self.pool()).lines(cart_id).await
    }

    async fn find_line(
        &self,
        item_id: CartItemId,
    ) -> Result<Option<OwnedCartLine>, RepositoryError> {
        CartRepository::new(self.pool()).find_line(item_id).await
    }

    async fn add_or_merge_item(
        &self,
        cart_id: CartId,
        product_id: ProductId,
        quantity: u32,
        max_quantity: u32,
        customizations: &CustomizationSet,
    ) -> Result<Option<CartItemId>, RepositoryError> {
        CartRepository::new(self.pool())
            .add_or_merge(cart_id, product_id, quantity, max_quantity, customizations)
            .await
    }

    async fn set_item_quantity(
        &self,
        item_id: CartItemId,
        quantity: u32,
    ) -> Result<(), RepositoryError> {
        CartRepository::new(self.pool())
            .set_quantity(item_id, quantity)
            .await
    }

    async fn delete_item(&self, item_id: CartItemId) -> Result<bool, RepositoryError> {
        CartRepository::new(self.pool()).delete(item_id).await
    }
}
