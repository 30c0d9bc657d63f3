//! Order repository.

use chrono::{DateTime, Utc};
use sqlx::PgPool;
use sqlx::types::Json;

use printloom_core::{
    CartId, CartItemId, CustomizationSet, OrderId, OrderItemId, OrderStatus, OrderTotals, Price,
    ProductId, ShippingInfo, UserId,
};

use super::{PgStore, RepositoryError, quantity_from_db, quantity_to_db};
use crate::models::{NewOrder, Order, OrderItem, OrderSummary};
use crate::services::OrderStore;

#[derive(sqlx::FromRow)]
struct OrderRow {
    id: OrderId,
    user_id: UserId,
    status: OrderStatus,
    subtotal: Price,
    tax: Price,
    shipping: Price,
    total: Price,
    shipping_info: Option<Json<ShippingInfo>>,
    created_at: DateTime<Utc>,
}

#[derive(sqlx::FromRow)]
struct OrderItemRow {
    id: OrderItemId,
    product_id: ProductId,
    product_name: String,
    quantity: i32,
    price: Price,
    customizations: Json<CustomizationSet>,
}

impl TryFrom<OrderItemRow> for OrderItem {
    type Error = RepositoryError;

    fn try_from(row: OrderItemRow) -> Result<Self, Self::Error> {
        Ok(Self {
            id: row.id,
            product_id: row.product_id,
            product_name: row.product_name,
            quantity: quantity_from_db(row.quantity)?,
            price: row.price,
            customizations: row.customizations.0,
        })
    }
}

#[derive(sqlx::FromRow)]
struct OrderSummaryRow {
    id: OrderId,
    status: OrderStatus,
    total: Price,
    item_count: i64,
    created_at: DateTime<Utc>,
}

/// Repository for order database operations.
pub struct OrderRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> OrderRepository<'a> {
    /// Create a new order repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Write an order and its items and empty the source cart, atomically.
    ///
    /// The cart row is locked for the duration of the transaction. The items
    /// deleted from the cart must be exactly the ones that were priced;
    /// otherwise nothing is written.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the cart is gone or no longer
    /// belongs to the user.
    /// Returns `RepositoryError::Conflict` if the cart changed after pricing.
    /// Returns `RepositoryError::Database` for other database errors.
    pub async fn place(&self, order: &NewOrder) -> Result<Order, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let locked = sqlx::query_scalar::<_, CartId>(
            "SELECT id FROM carts WHERE id = $1 AND user_id = $2 FOR UPDATE",
        )
        .bind(order.cart_id)
        .bind(order.user_id)
        .fetch_optional(&mut *tx)
        .await?;
        if locked.is_none() {
            return Err(RepositoryError::NotFound);
        }

        let created_at = sqlx::query_scalar::<_, DateTime<Utc>>(
            r"
            INSERT INTO orders (id, user_id, status, subtotal, tax, shipping, total, shipping_info)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING created_at
            ",
        )
        .bind(order.id)
        .bind(order.user_id)
        .bind(OrderStatus::Pending)
        .bind(order.totals.subtotal)
        .bind(order.totals.tax)
        .bind(order.totals.shipping)
        .bind(order.totals.total)
        .bind(Json(&order.shipping_info))
        .fetch_one(&mut *tx)
        .await?;

        for (position, item) in (0_i32..).zip(&order.items) {
            sqlx::query(
                r"
                INSERT INTO order_items
                    (id, order_id, product_id, product_name, quantity, price, customizations, position)
                VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
                ",
            )
            .bind(item.id)
            .bind(order.id)
            .bind(item.product_id)
            .bind(&item.product_name)
            .bind(quantity_to_db(item.quantity)?)
            .bind(item.price)
            .bind(Json(&item.customizations))
            .bind(position)
            .execute(&mut *tx)
            .await?;
        }

        let deleted = sqlx::query_as::<_, (CartItemId, i32)>(
            "DELETE FROM cart_items WHERE cart_id = $1 RETURNING id, quantity",
        )
        .bind(order.cart_id)
        .fetch_all(&mut *tx)
        .await?;

        let mut deleted = deleted
            .into_iter()
            .map(|(id, quantity)| Ok((id, quantity_from_db(quantity)?)))
            .collect::<Result<Vec<_>, RepositoryError>>()?;
        deleted.sort_unstable();
        if deleted != order.consumed_items() {
            tracing::warn!(
                cart_id = %order.cart_id,
                expected = order.items.len(),
                found = deleted.len(),
                "cart changed during checkout, rolling back"
            );
            return Err(RepositoryError::Conflict(
                "cart changed during checkout".to_owned(),
            ));
        }

        tx.commit().await?;

        Ok(Order {
            id: order.id,
            user_id: order.user_id,
            status: OrderStatus::Pending,
            totals: order.totals,
            shipping_info: Some(order.shipping_info.clone()),
            created_at,
            items: order
                .items
                .iter()
                .map(|item| OrderItem {
                    id: item.id,
                    product_id: item.product_id,
                    product_name: item.product_name.clone(),
                    quantity: item.quantity,
                    price: item.price,
                    customizations: item.customizations.clone(),
                })
                .collect(),
        })
    }

    /// Get an order with its items.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn find(&self, id: OrderId) -> Result<Option<Order>, RepositoryError> {
        let Some(row) = sqlx::query_as::<_, OrderRow>(
            r"
            SELECT id, user_id, status, subtotal, tax, shipping, total, shipping_info, created_at
            FROM orders
            WHERE id = $1
            ",
        )
        .bind(id)
        .fetch_optional(self.pool)
        .await?
        else {
            return Ok(None);
        };

        let items = sqlx::query_as::<_, OrderItemRow>(
            r"
            SELECT id, product_id, product_name, quantity, price, customizations
            FROM order_items
            WHERE order_id = $1
            ORDER BY position
            ",
        )
        .bind(id)
        .fetch_all(self.pool)
        .await?
        .into_iter()
        .map(OrderItem::try_from)
        .collect::<Result<Vec<_>, _>>()?;

        Ok(Some(Order {
            id: row.id,
            user_id: row.user_id,
            status: row.status,
            totals: OrderTotals {
                subtotal: row.subtotal,
                tax: row.tax,
                shipping: row.shipping,
                total: row.total,
            },
            shipping_info: row.shipping_info.map(|json| json.0),
            created_at: row.created_at,
            items,
        }))
    }

    /// A user's orders, newest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn for_user(&self, user_id: UserId) -> Result<Vec<OrderSummary>, RepositoryError> {
        let rows = sqlx::query_as::<_, OrderSummaryRow>(
            r"
            SELECT o.id, o.status, o.total, o.created_at, COUNT(oi.id) AS item_count
            FROM orders o
            LEFT JOIN order_items oi ON oi.order_id = o.id
            WHERE o.user_id = $1
            GROUP BY o.id
            ORDER BY o.created_at DESC
            ",
        )
        .bind(user_id)
        .fetch_all(self.pool)
        .await?;

        rows.into_iter()
            .map(|row| {
                Ok(OrderSummary {
                    id: row.id,
                    status: row.status,
                    total: row.total,
                    item_count: u32::try_from(row.item_count).map_err(|_| {
                        RepositoryError::DataCorruption(format!(
                            "invalid item count: {}",
                            row.item_count
                        ))
                    })?,
                    created_at: row.created_at,
                })
            })
            .collect()
    }
}

impl OrderStore for PgStore {
    async fn place_order(&self, order: &NewOrder) -> Result<Order, RepositoryError> {
        OrderRepository::new(self.pool()).place(order).await
    }

    async fn find_order(&self, id: OrderId) -> Result<Option<Order>, RepositoryError> {
        OrderRepository::new(self.pool()).find(id).await
    }

    async fn orders_for_user(&self, user_id: UserId) -> Result<Vec<OrderSummary>, RepositoryError> {
        OrderRepository::new(self.pool()).for_user(user_id).await
    }
}
