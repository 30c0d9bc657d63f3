//! In-memory store for service tests.
//!
//! Mirrors the Postgres semantics the services rely on: one cart per user,
//! merge-on-insert for identical items, and an all-or-nothing `place_order`
//! that refuses to run when the cart no longer matches what was priced.

#![allow(clippy::unwrap_used)]

use std::sync::Mutex;

use chrono::{DateTime, Duration, Utc};

use printloom_core::{
    CartId, CartItemId, CategoryId, CustomizationSet, OrderId, OrderStatus, ProductId, UserId,
};

use super::store::{CartStore, CatalogStore, OrderStore};
use crate::db::RepositoryError;
use crate::models::{
    Cart, CartLine, Category, CategoryRef, NewOrder, Order, OrderItem, OrderSummary,
    OwnedCartLine, Product, ProductDraft, ProductFilter, ProductSort,
};

#[derive(Debug, Clone)]
struct StoredItem {
    id: CartItemId,
    cart_id: CartId,
    product_id: ProductId,
    quantity: u32,
    customizations: CustomizationSet,
}

#[derive(Debug, Default)]
struct State {
    categories: Vec<Category>,
    products: Vec<Product>,
    carts: Vec<Cart>,
    items: Vec<StoredItem>,
    orders: Vec<Order>,
    ticks: i64,
    writes: usize,
    fail_writes: bool,
    bump_before_order: bool,
}

impl State {
    /// A strictly increasing timestamp so "newest first" is deterministic.
    fn now(&mut self) -> DateTime<Utc> {
        self.ticks += 1;
        DateTime::<Utc>::UNIX_EPOCH + Duration::seconds(self.ticks)
    }

    fn write(&mut self) -> Result<(), RepositoryError> {
        if self.fail_writes {
            return Err(RepositoryError::Database(sqlx::Error::PoolTimedOut));
        }
        self.writes += 1;
        Ok(())
    }

    fn line(&self, item: &StoredItem) -> Result<CartLine, RepositoryError> {
        let product = self
            .products
            .iter()
            .find(|p| p.id == item.product_id)
            .cloned()
            .ok_or_else(|| RepositoryError::DataCorruption("missing product".to_string()))?;
        Ok(CartLine {
            id: item.id,
            cart_id: item.cart_id,
            quantity: item.quantity,
            customizations: item.customizations.clone(),
            product,
        })
    }
}

#[derive(Debug, Default)]
pub struct MemoryStore {
    state: Mutex<State>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent write fail until switched off.
    pub fn fail_writes(&self, fail: bool) {
        self.state.lock().unwrap().fail_writes = fail;
    }

    /// Simulate a concurrent add landing between pricing and the order write.
    pub fn bump_quantities_before_next_order(&self) {
        self.state.lock().unwrap().bump_before_order = true;
    }

    /// Drop the shipping snapshot of an order, as on legacy rows.
    pub fn clear_shipping(&self, order_id: OrderId) {
        let mut state = self.state.lock().unwrap();
        if let Some(order) = state.orders.iter_mut().find(|o| o.id == order_id) {
            order.shipping_info = None;
        }
    }

    pub fn order_count(&self) -> usize {
        self.state.lock().unwrap().orders.len()
    }

    pub fn write_count(&self) -> usize {
        self.state.lock().unwrap().writes
    }

    pub fn insert_category(&self, name: &str, slug: &str) -> CategoryId {
        let mut state = self.state.lock().unwrap();
        if let Some(existing) = state.categories.iter().find(|c| c.slug == slug) {
            return existing.id;
        }
        let id = CategoryId::generate();
        state.categories.push(Category {
            id,
            name: name.to_string(),
            slug: slug.to_string(),
            description: None,
            image_url: None,
        });
        id
    }

    fn insert(&self, draft: &ProductDraft) -> Result<Product, RepositoryError> {
        let mut state = self.state.lock().unwrap();
        if state.products.iter().any(|p| p.slug == draft.slug) {
            return Err(RepositoryError::Conflict(
                "product slug already exists".to_string(),
            ));
        }
        let category = state
            .categories
            .iter()
            .find(|c| c.id == draft.category_id)
            .map(|c| CategoryRef {
                id: c.id,
                name: c.name.clone(),
                slug: c.slug.clone(),
            })
            .ok_or(RepositoryError::NotFound)?;
        state.write()?;
        let created_at = state.now();
        let product = Product {
            id: draft.id,
            name: draft.name.clone(),
            slug: draft.slug.clone(),
            description: draft.description.clone(),
            base_price: draft.base_price,
            images: draft.images.clone(),
            category,
            customizable_areas: draft.areas.clone(),
            created_at,
        };
        state.products.push(product.clone());
        Ok(product)
    }
}

impl CatalogStore for MemoryStore {
    async fn categories(&self) -> Result<Vec<Category>, RepositoryError> {
        let mut categories = self.state.lock().unwrap().categories.clone();
        categories.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(categories)
    }

    async fn category(&self, id: CategoryId) -> Result<Option<Category>, RepositoryError> {
        let state = self.state.lock().unwrap();
        Ok(state.categories.iter().find(|c| c.id == id).cloned())
    }

    async fn product(&self, id: ProductId) -> Result<Option<Product>, RepositoryError> {
        let state = self.state.lock().unwrap();
        Ok(state.products.iter().find(|p| p.id == id).cloned())
    }

    async fn product_by_slugs(
        &self,
        category_slug: &str,
        product_slug: &str,
    ) -> Result<Option<Product>, RepositoryError> {
        let state = self.state.lock().unwrap();
        Ok(state
            .products
            .iter()
            .find(|p| p.category.slug == category_slug && p.slug == product_slug)
            .cloned())
    }

    async fn search_products(
        &self,
        filter: &ProductFilter,
    ) -> Result<(Vec<Product>, u64), RepositoryError> {
        let state = self.state.lock().unwrap();
        let search = filter.search.as_ref().map(|s| s.to_lowercase());
        let mut matches: Vec<Product> = state
            .products
            .iter()
            .filter(|p| filter.category.as_ref().is_none_or(|c| &p.category.slug == c))
            .filter(|p| {
                search.as_ref().is_none_or(|term| {
                    p.name.to_lowercase().contains(term)
                        || p
                            .description
                            .as_ref()
                            .is_some_and(|d| d.to_lowercase().contains(term))
                })
            })
            .filter(|p| filter.min_price.is_none_or(|min| p.base_price.amount() >= min))
            .filter(|p| filter.max_price.is_none_or(|max| p.base_price.amount() <= max))
            .cloned()
            .collect();
        match filter.sort {
            ProductSort::Newest => matches.sort_by(|a, b| b.created_at.cmp(&a.created_at)),
            ProductSort::PriceAsc => matches.sort_by_key(|p| p.base_price),
            ProductSort::PriceDesc => matches.sort_by(|a, b| b.base_price.cmp(&a.base_price)),
            ProductSort::NameAsc => matches.sort_by(|a, b| a.name.cmp(&b.name)),
        }

        let total = matches.len() as u64;
        let page = matches
            .into_iter()
            .skip(usize::try_from(filter.offset()).unwrap())
            .take(filter.limit as usize)
            .collect();
        Ok((page, total))
    }

    async fn insert_product(&self, draft: &ProductDraft) -> Result<Product, RepositoryError> {
        self.insert(draft)
    }
}

impl CartStore for MemoryStore {
    async fn ensure_cart(&self, user_id: UserId) -> Result<Cart, RepositoryError> {
        let mut state = self.state.lock().unwrap();
        if let Some(cart) = state.carts.iter().find(|c| c.user_id == user_id) {
            return Ok(*cart);
        }
        state.write()?;
        let cart = Cart {
            id: CartId::generate(),
            user_id,
        };
        state.carts.push(cart);
        Ok(cart)
    }

    async fn find_cart(&self, id: CartId) -> Result<Option<Cart>, RepositoryError> {
        let state = self.state.lock().unwrap();
        Ok(state.carts.iter().find(|c| c.id == id).copied())
    }

    async fn cart_lines(&self, cart_id: CartId) -> Result<Vec<CartLine>, RepositoryError> {
        let state = self.state.lock().unwrap();
        state
            .items
            .iter()
            .filter(|item| item.cart_id == cart_id)
            .map(|item| state.line(item))
            .collect()
    }

    async fn find_line(
        &self,
        item_id: CartItemId,
    ) -> Result<Option<OwnedCartLine>, RepositoryError> {
        let state = self.state.lock().unwrap();
        let Some(item) = state.items.iter().find(|item| item.id == item_id) else {
            return Ok(None);
        };
        let owner = state
            .carts
            .iter()
            .find(|c| c.id == item.cart_id)
            .map(|c| c.user_id)
            .ok_or_else(|| RepositoryError::DataCorruption("orphan cart item".to_string()))?;
        Ok(Some(OwnedCartLine {
            owner,
            line: state.line(item)?,
        }))
    }

    async fn add_or_merge_item(
        &self,
        cart_id: CartId,
        product_id: ProductId,
        quantity: u32,
        max_quantity: u32,
        customizations: &CustomizationSet,
    ) -> Result<Option<CartItemId>, RepositoryError> {
        let mut state = self.state.lock().unwrap();
        state.write()?;
        if let Some(item) = state.items.iter_mut().find(|item| {
            item.cart_id == cart_id
                && item.product_id == product_id
                && item.customizations.canonical_key() == customizations.canonical_key()
        }) {
            let merged = item.quantity + quantity;
            if merged > max_quantity {
                return Ok(None);
            }
            item.quantity = merged;
            return Ok(Some(item.id));
        }
        let id = CartItemId::generate();
        state.items.push(StoredItem {
            id,
            cart_id,
            product_id,
            quantity,
            customizations: customizations.clone(),
        });
        Ok(Some(id))
    }

    async fn set_item_quantity(
        &self,
        item_id: CartItemId,
        quantity: u32,
    ) -> Result<(), RepositoryError> {
        let mut state = self.state.lock().unwrap();
        state.write()?;
        let item = state
            .items
            .iter_mut()
            .find(|item| item.id == item_id)
            .ok_or(RepositoryError::NotFound)?;
        item.quantity = quantity;
        Ok(())
    }

    async fn delete_item(&self, item_id: CartItemId) -> Result<bool, RepositoryError> {
        let mut state = self.state.lock().unwrap();
        state.write()?;
        let before = state.items.len();
        state.items.retain(|item| item.id != item_id);
        Ok(state.items.len() < before)
    }
}

impl OrderStore for MemoryStore {
    async fn place_order(&self, order: &NewOrder) -> Result<Order, RepositoryError> {
        let mut state = self.state.lock().unwrap();
        state.write()?;

        if !state
            .carts
            .iter()
            .any(|c| c.id == order.cart_id && c.user_id == order.user_id)
        {
            return Err(RepositoryError::NotFound);
        }

        if std::mem::take(&mut state.bump_before_order) {
            for item in state.items.iter_mut().filter(|i| i.cart_id == order.cart_id) {
                item.quantity += 1;
            }
        }

        let mut present: Vec<(CartItemId, u32)> = state
            .items
            .iter()
            .filter(|i| i.cart_id == order.cart_id)
            .map(|i| (i.id, i.quantity))
            .collect();
        present.sort_unstable();
        if present != order.consumed_items() {
            return Err(RepositoryError::Conflict(
                "cart changed during checkout".to_string(),
            ));
        }

        let created_at = state.now();
        let placed = Order {
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
        };
        state.items.retain(|i| i.cart_id != order.cart_id);
        state.orders.push(placed.clone());
        Ok(placed)
    }

    async fn find_order(&self, id: OrderId) -> Result<Option<Order>, RepositoryError> {
        let state = self.state.lock().unwrap();
        Ok(state.orders.iter().find(|o| o.id == id).cloned())
    }

    async fn orders_for_user(&self, user_id: UserId) -> Result<Vec<OrderSummary>, RepositoryError> {
        let state = self.state.lock().unwrap();
        let mut orders: Vec<OrderSummary> = state
            .orders
            .iter()
            .filter(|o| o.user_id == user_id)
            .map(|o| OrderSummary {
                id: o.id,
                status: o.status,
                total: o.totals.total,
                item_count: u32::try_from(o.items.len()).unwrap(),
                created_at: o.created_at,
            })
            .collect();
        orders.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(orders)
    }
}

/// Ready-made users, products and checkout details.
pub mod fixtures {
    use printloom_core::{
        AreaId, CategoryId, CustomizableArea, CustomizationKind, Email, PaymentDetails, Price,
        ProductId, ShippingInfo, UserId, UserRole,
    };

    use super::MemoryStore;
    use crate::models::{CurrentUser, ProductDraft};

    /// A fresh shopper with a unique ID.
    pub fn user() -> CurrentUser {
        CurrentUser {
            id: UserId::generate(),
            email: Email::parse("shopper@example.com").unwrap(),
            name: "Shopper".to_string(),
            role: UserRole::User,
        }
    }

    pub fn category(store: &MemoryStore, slug: &str) -> CategoryId {
        store.insert_category(slug, slug)
    }

    fn area(product_id: ProductId, name: &str, kind: CustomizationKind, cents: i64) -> CustomizableArea {
        CustomizableArea {
            id: AreaId::generate(),
            product_id,
            name: name.to_string(),
            kind,
            extra_charge: Some(Price::from_cents(cents)),
        }
    }

    /// A 19.99 tee with a +2.50 text area and a free color area.
    ///
    /// Returns the product, text area and color area IDs.
    pub fn tee(store: &MemoryStore) -> (ProductId, AreaId, AreaId) {
        let category_id = category(store, "t-shirts");
        let id = ProductId::generate();
        let text = area(id, "Front text", CustomizationKind::Text, 250);
        let color = area(id, "Shirt color", CustomizationKind::Color, 0);
        let (text_id, color_id) = (text.id, color.id);
        store
            .insert(&ProductDraft {
                id,
                name: "Padalustro T-Shirt".to_string(),
                slug: format!("padalustro-t-shirt-{id}"),
                description: Some("Soft cotton tee".to_string()),
                base_price: Price::from_cents(1999),
                category_id,
                images: vec!["/images/tee.png".to_string()],
                areas: vec![text, color],
            })
            .unwrap();
        (id, text_id, color_id)
    }

    /// A plain 12.00 mug.
    pub fn mug(store: &MemoryStore) -> ProductId {
        let category_id = category(store, "mugs");
        let id = ProductId::generate();
        store
            .insert(&ProductDraft {
                id,
                name: "Ceramic Mug".to_string(),
                slug: format!("ceramic-mug-{id}"),
                description: None,
                base_price: Price::from_cents(1200),
                category_id,
                images: Vec::new(),
                areas: Vec::new(),
            })
            .unwrap();
        id
    }

    /// A plain product in the `prints` category at `cents`.
    pub fn priced(store: &MemoryStore, name: &str, cents: i64) -> ProductId {
        let category_id = category(store, "prints");
        let id = ProductId::generate();
        store
            .insert(&ProductDraft {
                id,
                name: name.to_string(),
                slug: format!("print-{id}"),
                description: None,
                base_price: Price::from_cents(cents),
                category_id,
                images: Vec::new(),
                areas: Vec::new(),
            })
            .unwrap();
        id
    }

    pub fn shipping() -> ShippingInfo {
        ShippingInfo {
            full_name: "Ada Lovelace".to_string(),
            email: "ada@example.com".to_string(),
            address: "12 Analytical Row".to_string(),
            city: "London".to_string(),
            state: "Greater London".to_string(),
            zip_code: "N1 9GU".to_string(),
            country: "UK".to_string(),
            phone: "+44 20 7946 0000".to_string(),
        }
    }

    pub fn payment(card_number: &str) -> PaymentDetails {
        PaymentDetails {
            card_number: card_number.to_string(),
            card_holder: "Ada Lovelace".to_string(),
            expiry_date: "12/29".to_string(),
            cvv: "123".to_string(),
        }
    }
}
