//! Cart aggregate.
//!
//! Every operation acts on the caller's own cart. Item-level operations look
//! the item up first and refuse to touch items in someone else's cart.

use tracing::instrument;

use printloom_core::{CartItemId, CustomizationSet, OrderTotals, ProductId, TaxPolicy, pricing};

use super::error::CommerceError;
use super::store::{CartStore, CatalogStore};
use crate::models::{Cart, CartLine, CartSummary, CartView, CurrentUser, ItemUpdate, OwnedCartLine};

/// Largest quantity a cart item may hold, whether set directly or reached by merging.
pub const MAX_QUANTITY: u32 = 9999;

/// Cart operations for the current user.
pub struct CartService<'a, S> {
    store: &'a S,
}

impl<'a, S> CartService<'a, S>
where
    S: CartStore + CatalogStore,
{
    #[must_use]
    pub const fn new(store: &'a S) -> Self {
        Self { store }
    }

    /// Get the user's cart, creating it on first access.
    ///
    /// # Errors
    ///
    /// Returns `CommerceError::Repository` if storage fails.
    pub async fn get_or_create_cart(&self, user: &CurrentUser) -> Result<Cart, CommerceError> {
        Ok(self.store.ensure_cart(user.id).await?)
    }

    /// Add a product to the cart, merging with an identical item.
    ///
    /// Two items are identical when they share the product and the
    /// canonical customization set; the quantities are then summed.
    ///
    /// # Errors
    ///
    /// Returns `CommerceError::InvalidInput` if `quantity` is out of range, or
    /// if merging would push the existing item past [`MAX_QUANTITY`].
    /// Returns `CommerceError::NotFound` if the product does not exist.
    /// Returns `CommerceError::InvalidCustomization` if a customization does
    /// not fit the product.
    #[instrument(skip(self, user, customizations), fields(user_id = %user.id))]
    pub async fn add_item(
        &self,
        user: &CurrentUser,
        product_id: ProductId,
        quantity: u32,
        customizations: CustomizationSet,
    ) -> Result<CartItemId, CommerceError> {
        check_quantity(quantity, 1)?;

        let product = self
            .store
            .product(product_id)
            .await?
            .ok_or(CommerceError::NotFound("product"))?;
        pricing::unit_price(product.base_price, &product.customizable_areas, &customizations)?;

        let cart = self.store.ensure_cart(user.id).await?;
        let item_id = self
            .store
            .add_or_merge_item(cart.id, product_id, quantity, MAX_QUANTITY, &customizations)
            .await?
            .ok_or_else(|| {
                CommerceError::InvalidInput(format!(
                    "quantity in cart must be at most {MAX_QUANTITY}"
                ))
            })?;

        tracing::info!(cart_id = %cart.id, item_id = %item_id, quantity, "item added to cart");
        Ok(item_id)
    }

    /// Set an item's quantity. Zero removes the item.
    ///
    /// # Errors
    ///
    /// Returns `CommerceError::InvalidInput` if `quantity` is too large.
    /// Returns `CommerceError::NotFound` if the item does not exist.
    /// Returns `CommerceError::Forbidden` if the item is in another user's cart.
    #[instrument(skip(self, user), fields(user_id = %user.id))]
    pub async fn update_item_quantity(
        &self,
        user: &CurrentUser,
        item_id: CartItemId,
        quantity: u32,
    ) -> Result<ItemUpdate, CommerceError> {
        check_quantity(quantity, 0)?;
        let owned = self.owned_line(user, item_id).await?;

        if quantity == 0 {
            self.remove(item_id).await?;
            return Ok(ItemUpdate::Removed { id: item_id });
        }

        self.store
            .set_item_quantity(item_id, quantity)
            .await
            .map_err(|e| not_found_as("cart item", e))?;

        let price = owned.line.unit_price()?;
        Ok(ItemUpdate::Updated {
            id: item_id,
            quantity,
            price,
            total: pricing::line_total(price, quantity),
        })
    }

    /// Remove an item from the cart.
    ///
    /// # Errors
    ///
    /// Returns `CommerceError::NotFound` if the item does not exist.
    /// Returns `CommerceError::Forbidden` if the item is in another user's cart.
    #[instrument(skip(self, user), fields(user_id = %user.id))]
    pub async fn remove_item(
        &self,
        user: &CurrentUser,
        item_id: CartItemId,
    ) -> Result<(), CommerceError> {
        self.owned_line(user, item_id).await?;
        self.remove(item_id).await
    }

    /// The user's cart with every line priced.
    ///
    /// Creates the cart if the user has none yet.
    ///
    /// # Errors
    ///
    /// Returns `CommerceError::InvalidCustomization` if a stored item no
    /// longer fits its product.
    pub async fn read_cart(&self, user: &CurrentUser) -> Result<CartView, CommerceError> {
        let cart = self.store.ensure_cart(user.id).await?;
        let lines = self.store.cart_lines(cart.id).await?;
        cart_view(&cart, &lines)
    }

    /// The cart plus the totals checkout would charge for it.
    ///
    /// # Errors
    ///
    /// See [`CartService::read_cart`].
    pub async fn cart_summary(
        &self,
        user: &CurrentUser,
        policy: &TaxPolicy,
    ) -> Result<CartSummary, CommerceError> {
        let cart = self.read_cart(user).await?;
        let totals = OrderTotals::compute(cart.total, policy);
        Ok(CartSummary { cart, totals })
    }

    async fn owned_line(
        &self,
        user: &CurrentUser,
        item_id: CartItemId,
    ) -> Result<OwnedCartLine, CommerceError> {
        let owned = self
            .store
            .find_line(item_id)
            .await?
            .ok_or(CommerceError::NotFound("cart item"))?;
        if owned.owner != user.id {
            tracing::warn!(item_id = %item_id, "cart item belongs to another user");
            return Err(CommerceError::Forbidden("cart item"));
        }
        Ok(owned)
    }

    async fn remove(&self, item_id: CartItemId) -> Result<(), CommerceError> {
        if self.store.delete_item(item_id).await? {
            Ok(())
        } else {
            Err(CommerceError::NotFound("cart item"))
        }
    }
}

/// Price every line of a cart.
///
/// # Errors
///
/// Returns `CommerceError::InvalidCustomization` if a line no longer fits
/// its product.
pub fn cart_view(cart: &Cart, lines: &[CartLine]) -> Result<CartView, CommerceError> {
    let items = lines
        .iter()
        .map(CartLine::view)
        .collect::<Result<Vec<_>, _>>()?;
    Ok(CartView::new(cart.id, items))
}

fn check_quantity(quantity: u32, min: u32) -> Result<(), CommerceError> {
    if quantity < min {
        return Err(CommerceError::InvalidInput(format!(
            "quantity must be at least {min}"
        )));
    }
    if quantity > MAX_QUANTITY {
        return Err(CommerceError::InvalidInput(format!(
            "quantity must be at most {MAX_QUANTITY}"
        )));
    }
    Ok(())
}

fn not_found_as(what: &'static str, err: crate::db::RepositoryError) -> CommerceError {
    match err {
        crate::db::RepositoryError::NotFound => CommerceError::NotFound(what),
        other => CommerceError::Repository(other),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use printloom_core::{Customization, Price};

    use super::*;
    use crate::services::memory::{MemoryStore, fixtures};

    #[tokio::test]
    async fn test_read_cart_creates_empty_cart_once() {
        let store = MemoryStore::new();
        let user = fixtures::user();
        let service = CartService::new(&store);

        let first = service.read_cart(&user).await.unwrap();
        let second = service.read_cart(&user).await.unwrap();

        assert_eq!(first.id, second.id);
        assert!(first.items.is_empty());
        assert_eq!(first.total, Price::ZERO);
        assert_eq!(first.item_count, 0);
    }

    #[tokio::test]
    async fn test_same_customizations_in_any_order_merge() {
        let store = MemoryStore::new();
        let (product, text_area, color_area) = fixtures::tee(&store);
        let user = fixtures::user();
        let service = CartService::new(&store);

        let first = CustomizationSet::new(vec![
            Customization::Text {
                area_id: text_area,
                value: "Hi".to_string(),
            },
            Customization::Color {
                area_id: color_area,
                value: "#000000".to_string(),
            },
        ])
        .unwrap();
        let reordered = CustomizationSet::new(vec![
            Customization::Color {
                area_id: color_area,
                value: "#000000".to_string(),
            },
            Customization::Text {
                area_id: text_area,
                value: "Hi".to_string(),
            },
        ])
        .unwrap();

        let a = service.add_item(&user, product, 1, first).await.unwrap();
        let b = service.add_item(&user, product, 2, reordered).await.unwrap();
        assert_eq!(a, b);

        let cart = service.read_cart(&user).await.unwrap();
        assert_eq!(cart.item_count, 1);
        assert_eq!(cart.items[0].quantity, 3);
        assert_eq!(cart.items[0].unit_price, Price::from_cents(2249));
        assert_eq!(cart.items[0].line_total, Price::from_cents(6747));
        assert_eq!(cart.total_quantity, 3);
    }

    #[tokio::test]
    async fn test_blank_customization_merges_with_plain_item() {
        let store = MemoryStore::new();
        let (product, text_area, _) = fixtures::tee(&store);
        let user = fixtures::user();
        let service = CartService::new(&store);

        let blank = CustomizationSet::new(vec![Customization::Text {
            area_id: text_area,
            value: "  ".to_string(),
        }])
        .unwrap();

        service
            .add_item(&user, product, 1, CustomizationSet::empty())
            .await
            .unwrap();
        service.add_item(&user, product, 1, blank).await.unwrap();

        let cart = service.read_cart(&user).await.unwrap();
        assert_eq!(cart.item_count, 1);
        assert_eq!(cart.items[0].quantity, 2);
        assert_eq!(cart.items[0].unit_price, Price::from_cents(1999));
    }

    #[tokio::test]
    async fn test_different_customizations_stay_separate() {
        let store = MemoryStore::new();
        let (product, text_area, _) = fixtures::tee(&store);
        let user = fixtures::user();
        let service = CartService::new(&store);

        let hi = CustomizationSet::new(vec![Customization::Text {
            area_id: text_area,
            value: "Hi".to_string(),
        }])
        .unwrap();

        service
            .add_item(&user, product, 1, CustomizationSet::empty())
            .await
            .unwrap();
        service.add_item(&user, product, 1, hi).await.unwrap();

        let cart = service.read_cart(&user).await.unwrap();
        assert_eq!(cart.item_count, 2);
        assert_eq!(cart.total, Price::from_cents(1999 + 2249));
    }

    #[tokio::test]
    async fn test_add_item_validation() {
        let store = MemoryStore::new();
        let (product, _, color_area) = fixtures::tee(&store);
        let user = fixtures::user();
        let service = CartService::new(&store);

        let zero = service
            .add_item(&user, product, 0, CustomizationSet::empty())
            .await;
        assert!(matches!(zero, Err(CommerceError::InvalidInput(_))));

        let too_many = service
            .add_item(&user, product, MAX_QUANTITY + 1, CustomizationSet::empty())
            .await;
        assert!(matches!(too_many, Err(CommerceError::InvalidInput(_))));

        let missing = service
            .add_item(&user, ProductId::generate(), 1, CustomizationSet::empty())
            .await;
        assert!(matches!(missing, Err(CommerceError::NotFound("product"))));

        // Text value sent for a color area.
        let mismatched = CustomizationSet::new(vec![Customization::Text {
            area_id: color_area,
            value: "Hi".to_string(),
        }])
        .unwrap();
        let wrong_kind = service.add_item(&user, product, 1, mismatched).await;
        assert!(matches!(
            wrong_kind,
            Err(CommerceError::InvalidCustomization(_))
        ));

        assert!(service.read_cart(&user).await.unwrap().items.is_empty());
    }

    #[tokio::test]
    async fn test_merge_cannot_exceed_max_quantity() {
        let store = MemoryStore::new();
        let (product, _, _) = fixtures::tee(&store);
        let user = fixtures::user();
        let service = CartService::new(&store);

        let item = service
            .add_item(&user, product, MAX_QUANTITY, CustomizationSet::empty())
            .await
            .unwrap();

        let overflow = service
            .add_item(&user, product, 1, CustomizationSet::empty())
            .await;
        assert!(matches!(overflow, Err(CommerceError::InvalidInput(_))));

        let cart = service.read_cart(&user).await.unwrap();
        assert_eq!(cart.item_count, 1);
        assert_eq!(cart.items[0].id, item);
        assert_eq!(cart.items[0].quantity, MAX_QUANTITY);
    }

    #[tokio::test]
    async fn test_merge_up_to_max_quantity_is_allowed() {
        let store = MemoryStore::new();
        let (product, _, _) = fixtures::tee(&store);
        let user = fixtures::user();
        let service = CartService::new(&store);

        service
            .add_item(&user, product, MAX_QUANTITY - 1, CustomizationSet::empty())
            .await
            .unwrap();
        service
            .add_item(&user, product, 1, CustomizationSet::empty())
            .await
            .unwrap();

        let cart = service.read_cart(&user).await.unwrap();
        assert_eq!(cart.items[0].quantity, MAX_QUANTITY);
    }

    #[tokio::test]
    async fn test_update_to_zero_removes_line() {
        let store = MemoryStore::new();
        let (tee, _, _) = fixtures::tee(&store);
        let mug = fixtures::mug(&store);
        let user = fixtures::user();
        let service = CartService::new(&store);

        let tee_item = service
            .add_item(&user, tee, 2, CustomizationSet::empty())
            .await
            .unwrap();
        service
            .add_item(&user, mug, 1, CustomizationSet::empty())
            .await
            .unwrap();
        let before = service.read_cart(&user).await.unwrap();

        let update = service
            .update_item_quantity(&user, tee_item, 0)
            .await
            .unwrap();
        assert_eq!(update, ItemUpdate::Removed { id: tee_item });

        let after = service.read_cart(&user).await.unwrap();
        assert_eq!(after.item_count, before.item_count - 1);
        assert_eq!(
            after.total.amount(),
            before.total.amount() - Price::from_cents(3998).amount()
        );
    }

    #[tokio::test]
    async fn test_update_quantity_reprices_line() {
        let store = MemoryStore::new();
        let (tee, _, _) = fixtures::tee(&store);
        let user = fixtures::user();
        let service = CartService::new(&store);

        let item = service
            .add_item(&user, tee, 1, CustomizationSet::empty())
            .await
            .unwrap();
        let update = service.update_item_quantity(&user, item, 4).await.unwrap();

        assert_eq!(
            update,
            ItemUpdate::Updated {
                id: item,
                quantity: 4,
                price: Price::from_cents(1999),
                total: Price::from_cents(7996),
            }
        );
    }

    #[tokio::test]
    async fn test_other_users_items_are_forbidden() {
        let store = MemoryStore::new();
        let (tee, _, _) = fixtures::tee(&store);
        let owner = fixtures::user();
        let intruder = fixtures::user();
        let service = CartService::new(&store);

        let item = service
            .add_item(&owner, tee, 1, CustomizationSet::empty())
            .await
            .unwrap();

        let update = service.update_item_quantity(&intruder, item, 3).await;
        assert!(matches!(update, Err(CommerceError::Forbidden(_))));
        let remove = service.remove_item(&intruder, item).await;
        assert!(matches!(remove, Err(CommerceError::Forbidden(_))));

        let cart = service.read_cart(&owner).await.unwrap();
        assert_eq!(cart.items[0].quantity, 1);
    }

    #[tokio::test]
    async fn test_missing_item_is_not_found() {
        let store = MemoryStore::new();
        let user = fixtures::user();
        let service = CartService::new(&store);

        let missing = CartItemId::generate();
        assert!(matches!(
            service.update_item_quantity(&user, missing, 1).await,
            Err(CommerceError::NotFound(_))
        ));
        assert!(matches!(
            service.remove_item(&user, missing).await,
            Err(CommerceError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_cart_summary_applies_tax_and_shipping() {
        let store = MemoryStore::new();
        let (tee, text_area, color_area) = fixtures::tee(&store);
        let user = fixtures::user();
        let service = CartService::new(&store);

        let set = CustomizationSet::new(vec![
            Customization::Text {
                area_id: text_area,
                value: "Hi".to_string(),
            },
            Customization::Color {
                area_id: color_area,
                value: "#000000".to_string(),
            },
        ])
        .unwrap();
        service.add_item(&user, tee, 2, set).await.unwrap();

        let summary = service
            .cart_summary(&user, &TaxPolicy::default())
            .await
            .unwrap();
        assert_eq!(summary.totals.subtotal, Price::from_cents(4498));
        assert_eq!(summary.totals.tax, Price::from_cents(315));
        assert_eq!(summary.totals.shipping, Price::from_cents(599));
        assert_eq!(summary.totals.total, Price::from_cents(5412));
    }
}
