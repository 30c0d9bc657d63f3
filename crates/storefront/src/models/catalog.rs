//! Catalog types: categories, products and listing queries.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use printloom_core::pricing::MAX_CATALOG_PRICE;
use printloom_core::{
    AreaId, CategoryId, CustomizableArea, CustomizationKind, Price, ProductId,
};

/// Default page size for product listings.
pub const DEFAULT_PAGE_SIZE: u32 = 10;
/// Largest page size a client may request.
pub const MAX_PAGE_SIZE: u32 = 100;

/// A product category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Category {
    pub id: CategoryId,
    pub name: String,
    pub slug: String,
    pub description: Option<String>,
    pub image_url: Option<String>,
}

/// The category fields embedded in product and cart responses.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryRef {
    pub id: CategoryId,
    pub name: String,
    pub slug: String,
}

/// A product with its customizable areas.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    pub slug: String,
    pub description: Option<String>,
    pub base_price: Price,
    pub images: Vec<String>,
    pub category: CategoryRef,
    pub customizable_areas: Vec<CustomizableArea>,
    pub created_at: DateTime<Utc>,
}

/// Raw listing query string: `?page=1&limit=10&category=mugs&search=cat&minPrice=5&sort=price-asc`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductQuery {
    pub page: Option<u32>,
    pub limit: Option<u32>,
    pub category: Option<String>,
    pub search: Option<String>,
    pub min_price: Option<Decimal>,
    pub max_price: Option<Decimal>,
    pub sort: Option<String>,
}

/// Listing order.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ProductSort {
    #[default]
    Newest,
    PriceAsc,
    PriceDesc,
    NameAsc,
}

impl ProductSort {
    /// Parse a `sort` query value. Unknown or missing values mean newest first.
    #[must_use]
    pub fn parse(value: Option<&str>) -> Self {
        match value.map(str::trim) {
            Some("price-asc") => Self::PriceAsc,
            Some("price-desc") => Self::PriceDesc,
            Some("name-asc") => Self::NameAsc,
            _ => Self::Newest,
        }
    }

    /// `ORDER BY` clause over the `p` products alias. Ties break on id so
    /// pages never overlap.
    #[must_use]
    pub const fn order_by(self) -> &'static str {
        match self {
            Self::Newest => "p.created_at DESC, p.id",
            Self::PriceAsc => "p.base_price ASC, p.id",
            Self::PriceDesc => "p.base_price DESC, p.id",
            Self::NameAsc => "p.name ASC, p.id",
        }
    }
}

/// A validated listing query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProductFilter {
    pub page: u32,
    pub limit: u32,
    pub category: Option<String>,
    pub search: Option<String>,
    pub min_price: Option<Decimal>,
    pub max_price: Option<Decimal>,
    pub sort: ProductSort,
}

impl ProductFilter {
    /// Rows to skip for the requested page.
    #[must_use]
    pub fn offset(&self) -> u64 {
        u64::from(self.page.saturating_sub(1)) * u64::from(self.limit)
    }
}

impl TryFrom<ProductQuery> for ProductFilter {
    type Error = String;

    fn try_from(query: ProductQuery) -> Result<Self, Self::Error> {
        let page = query.page.unwrap_or(1);
        if page < 1 {
            return Err("page must be at least 1".to_string());
        }
        let limit = query.limit.unwrap_or(DEFAULT_PAGE_SIZE);
        if !(1..=MAX_PAGE_SIZE).contains(&limit) {
            return Err(format!("limit must be between 1 and {MAX_PAGE_SIZE}"));
        }
        if let (Some(min), Some(max)) = (query.min_price, query.max_price)
            && min > max
        {
            return Err("minPrice cannot exceed maxPrice".to_string());
        }

        let non_blank = |s: Option<String>| {
            s.map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
        };

        Ok(Self {
            page,
            limit,
            category: non_blank(query.category),
            search: non_blank(query.search),
            min_price: query.min_price,
            max_price: query.max_price,
            sort: ProductSort::parse(query.sort.as_deref()),
        })
    }
}

/// Pagination metadata returned with a listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Pagination {
    pub page: u32,
    pub limit: u32,
    pub total: u64,
    pub total_pages: u64,
    pub has_more: bool,
}

impl Pagination {
    #[must_use]
    pub fn new(page: u32, limit: u32, total: u64) -> Self {
        let total_pages = total.div_ceil(u64::from(limit.max(1)));
        Self {
            page,
            limit,
            total,
            total_pages,
            has_more: u64::from(page) < total_pages,
        }
    }
}

/// One page of products.
#[derive(Debug, Clone, Serialize)]
pub struct ProductPage {
    pub products: Vec<Product>,
    pub pagination: Pagination,
}

/// A customizable area in a product creation request.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewArea {
    pub name: String,
    #[serde(rename = "type")]
    pub kind: CustomizationKind,
    pub extra_charge: Option<Decimal>,
}

/// Product creation request.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewProduct {
    pub name: String,
    pub slug: String,
    pub description: Option<String>,
    pub base_price: Decimal,
    pub category_id: CategoryId,
    #[serde(default)]
    pub images: Vec<String>,
    #[serde(default)]
    pub customizable_areas: Vec<NewArea>,
}

/// A validated product ready to insert.
#[derive(Debug, Clone)]
pub struct ProductDraft {
    pub id: ProductId,
    pub name: String,
    pub slug: String,
    pub description: Option<String>,
    pub base_price: Price,
    pub category_id: CategoryId,
    pub images: Vec<String>,
    pub areas: Vec<CustomizableArea>,
}

impl NewProduct {
    /// Validate the request and assign IDs.
    ///
    /// # Errors
    ///
    /// Returns a client-facing message naming the first invalid field.
    pub fn validate(self) -> Result<ProductDraft, String> {
        let name = self.name.trim().to_string();
        if name.chars().count() < 2 {
            return Err("name must be at least 2 characters".to_string());
        }
        let slug = self.slug.trim().to_string();
        if slug.chars().count() < 2 {
            return Err("slug must be at least 2 characters".to_string());
        }
        if self.base_price <= Decimal::ZERO {
            return Err("basePrice must be positive".to_string());
        }
        if self.base_price > MAX_CATALOG_PRICE {
            return Err(format!("basePrice cannot exceed {MAX_CATALOG_PRICE}"));
        }
        let base_price = Price::new(self.base_price).map_err(|e| e.to_string())?.rounded();

        let id = ProductId::generate();
        let areas = self
            .customizable_areas
            .into_iter()
            .map(|area| {
                let name = area.name.trim().to_string();
                if name.is_empty() {
                    return Err("customizable area name is required".to_string());
                }
                if area.extra_charge.is_some_and(|c| c > MAX_CATALOG_PRICE) {
                    return Err(format!("area {name}: extraCharge cannot exceed {MAX_CATALOG_PRICE}"));
                }
                let extra_charge = area
                    .extra_charge
                    .map(|c| Price::new(c).map(Price::rounded))
                    .transpose()
                    .map_err(|e| format!("area {name}: {e}"))?;
                Ok(CustomizableArea {
                    id: AreaId::generate(),
                    product_id: id,
                    name,
                    kind: area.kind,
                    extra_charge,
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(ProductDraft {
            id,
            name,
            slug,
            description: self
                .description
                .map(|d| d.trim().to_string())
                .filter(|d| !d.is_empty()),
            base_price,
            category_id: self.category_id,
            images: self.images,
            areas,
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_filter_defaults() {
        let filter = ProductFilter::try_from(ProductQuery::default()).unwrap();
        assert_eq!(filter.page, 1);
        assert_eq!(filter.limit, DEFAULT_PAGE_SIZE);
        assert_eq!(filter.offset(), 0);
        assert_eq!(filter.sort, ProductSort::Newest);
    }

    #[test]
    fn test_sort_parsing_falls_back_to_newest() {
        assert_eq!(ProductSort::parse(Some("price-asc")), ProductSort::PriceAsc);
        assert_eq!(ProductSort::parse(Some("price-desc")), ProductSort::PriceDesc);
        assert_eq!(ProductSort::parse(Some("name-asc")), ProductSort::NameAsc);
        assert_eq!(ProductSort::parse(Some("newest")), ProductSort::Newest);
        assert_eq!(ProductSort::parse(Some("popular")), ProductSort::Newest);
        assert_eq!(ProductSort::parse(Some("1; DROP TABLE products")), ProductSort::Newest);
        assert_eq!(ProductSort::parse(None), ProductSort::Newest);
    }

    #[test]
    fn test_filter_rejects_bad_pagination() {
        let zero_page = ProductQuery {
            page: Some(0),
            ..ProductQuery::default()
        };
        assert!(ProductFilter::try_from(zero_page).is_err());

        let huge_limit = ProductQuery {
            limit: Some(101),
            ..ProductQuery::default()
        };
        assert!(ProductFilter::try_from(huge_limit).is_err());
    }

    #[test]
    fn test_filter_offset_and_blank_search() {
        let filter = ProductFilter::try_from(ProductQuery {
            page: Some(3),
            limit: Some(20),
            search: Some("   ".to_string()),
            ..ProductQuery::default()
        })
        .unwrap();
        assert_eq!(filter.offset(), 40);
        assert_eq!(filter.search, None);
    }

    #[test]
    fn test_pagination_math() {
        let p = Pagination::new(1, 10, 25);
        assert_eq!(p.total_pages, 3);
        assert!(p.has_more);

        let last = Pagination::new(3, 10, 25);
        assert!(!last.has_more);

        let empty = Pagination::new(1, 10, 0);
        assert_eq!(empty.total_pages, 0);
        assert!(!empty.has_more);
    }

    fn new_product() -> NewProduct {
        NewProduct {
            name: "Padalustro T-Shirt".to_string(),
            slug: "padalustro-t-shirt".to_string(),
            description: Some("Soft cotton tee".to_string()),
            base_price: "19.99".parse().unwrap(),
            category_id: CategoryId::generate(),
            images: vec!["/images/tee.png".to_string()],
            customizable_areas: vec![NewArea {
                name: "Front text".to_string(),
                kind: CustomizationKind::Text,
                extra_charge: Some("2.50".parse().unwrap()),
            }],
        }
    }

    #[test]
    fn test_new_product_validates() {
        let draft = new_product().validate().unwrap();
        assert_eq!(draft.areas.len(), 1);
        assert_eq!(draft.areas[0].product_id, draft.id);
        assert_eq!(draft.base_price, Price::from_cents(1999));
    }

    #[test]
    fn test_new_product_rejects_bad_fields() {
        let mut short = new_product();
        short.name = "T".to_string();
        assert!(short.validate().is_err());

        let mut free = new_product();
        free.base_price = Decimal::ZERO;
        assert!(free.validate().is_err());

        let mut negative_charge = new_product();
        negative_charge.customizable_areas[0].extra_charge = Some("-1".parse().unwrap());
        assert!(negative_charge.validate().is_err());
    }

    #[test]
    fn test_new_product_price_ceiling() {
        let mut at_limit = new_product();
        at_limit.base_price = MAX_CATALOG_PRICE;
        at_limit.customizable_areas[0].extra_charge = Some(MAX_CATALOG_PRICE);
        assert!(at_limit.validate().is_ok());

        let mut pricey = new_product();
        pricey.base_price = "100000.00".parse().unwrap();
        assert!(pricey.validate().is_err());

        let mut pricey_area = new_product();
        pricey_area.customizable_areas[0].extra_charge = Some("100000.00".parse().unwrap());
        assert!(pricey_area.validate().is_err());
    }
}
