//! Seed the catalog with demo categories and products.
//!
//! Running it twice is harmless: categories are upserted by slug and
//! products whose slug already exists are skipped.

use rust_decimal::Decimal;
use sqlx::PgPool;
use tracing::info;

use printloom_core::{CategoryId, CustomizationKind};
use printloom_storefront::db::{PgStore, RepositoryError};
use printloom_storefront::models::{NewArea, NewProduct};
use printloom_storefront::services::CatalogStore;

use super::{ConnectError, connect};

/// Errors that can occur while seeding.
#[derive(Debug, thiserror::Error)]
pub enum SeedError {
    #[error(transparent)]
    Connect(#[from] ConnectError),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Repository error: {0}")]
    Repository(#[from] RepositoryError),

    #[error("Invalid seed product {slug}: {message}")]
    InvalidProduct { slug: &'static str, message: String },
}

struct SeedCategory {
    name: &'static str,
    slug: &'static str,
    description: &'static str,
    image_url: &'static str,
}

struct SeedProduct {
    name: &'static str,
    slug: &'static str,
    description: &'static str,
    /// Price in cents.
    base_price: i64,
    category: &'static str,
    images: &'static [&'static str],
    areas: &'static [(&'static str, CustomizationKind, i64)],
}

const CATEGORIES: &[SeedCategory] = &[
    SeedCategory {
        name: "T-Shirts",
        slug: "t-shirts",
        description: "Customizable t-shirts for all occasions",
        image_url: "/images/categories/t-shirts.jpg",
    },
    SeedCategory {
        name: "Mugs",
        slug: "mugs",
        description: "Personalized mugs for your morning coffee",
        image_url: "/images/categories/mugs.jpg",
    },
    SeedCategory {
        name: "Posters",
        slug: "posters",
        description: "Custom posters to decorate your space",
        image_url: "/images/categories/posters.jpg",
    },
];

const PRODUCTS: &[SeedProduct] = &[
    SeedProduct {
        name: "Padalustro T-Shirt",
        slug: "padalustro-t-shirt",
        description: "A comfortable Padalustro t-shirt that you can customize with your own designs",
        base_price: 1999,
        category: "t-shirts",
        images: &[
            "/images/products/Padalustro-t-shirt-1.jpg",
            "/images/products/Padalustro-t-shirt-2.jpg",
        ],
        areas: &[
            ("Text", CustomizationKind::Text, 250),
            ("Shirt Color", CustomizationKind::Color, 0),
        ],
    },
    SeedProduct {
        name: "Classic T-Shirt",
        slug: "classic-t-shirt",
        description: "An everyday cotton tee ready for your text",
        base_price: 1799,
        category: "t-shirts",
        images: &["/images/products/classic-t-shirt-1.png"],
        areas: &[("Text", CustomizationKind::Text, 250)],
    },
    SeedProduct {
        name: "Premium Mug",
        slug: "premium-mug",
        description: "High-quality ceramic mug perfect for personalization",
        base_price: 1499,
        category: "mugs",
        images: &[
            "/images/products/premium-mug-1.png",
            "/images/products/premium-mug-2.png",
        ],
        areas: &[
            ("Front Image", CustomizationKind::Image, 300),
            ("Custom Text", CustomizationKind::Text, 150),
            ("Mug Color", CustomizationKind::Color, 0),
        ],
    },
    SeedProduct {
        name: "Art Poster",
        slug: "art-poster",
        description: "Premium quality poster paper for your custom designs",
        base_price: 2499,
        category: "posters",
        images: &["/images/products/art-poster.jpg"],
        areas: &[
            ("Main Image", CustomizationKind::Image, 750),
            ("Caption", CustomizationKind::Text, 200),
        ],
    },
];

/// Seed categories and products.
///
/// # Errors
///
/// Returns an error if the database is unreachable or an insert fails.
pub async fn catalog() -> Result<(), SeedError> {
    let pool = connect().await?;

    let mut category_ids = Vec::with_capacity(CATEGORIES.len());
    for category in CATEGORIES {
        let id = upsert_category(&pool, category).await?;
        category_ids.push((category.slug, id));
    }
    info!(count = category_ids.len(), "Categories ready");

    let store = PgStore::new(pool);
    let mut inserted = 0_usize;
    let mut skipped = 0_usize;

    for product in PRODUCTS {
        let Some(&(_, category_id)) = category_ids
            .iter()
            .find(|(slug, _)| *slug == product.category)
        else {
            return Err(SeedError::InvalidProduct {
                slug: product.slug,
                message: format!("unknown category {}", product.category),
            });
        };

        let draft = new_product(product, category_id)
            .validate()
            .map_err(|message| SeedError::InvalidProduct {
                slug: product.slug,
                message,
            })?;

        match store.insert_product(&draft).await {
            Ok(created) => {
                info!(slug = %created.slug, id = %created.id, "Product created");
                inserted += 1;
            }
            Err(RepositoryError::Conflict(_)) => {
                info!(slug = product.slug, "Product exists, skipping");
                skipped += 1;
            }
            Err(e) => return Err(e.into()),
        }
    }

    info!("Seeding complete!");
    info!("  Products inserted: {inserted}");
    info!("  Products skipped (already exist): {skipped}");
    Ok(())
}

async fn upsert_category(pool: &PgPool, category: &SeedCategory) -> Result<CategoryId, sqlx::Error> {
    sqlx::query_scalar::<_, CategoryId>(
        r"
        INSERT INTO categories (id, name, slug, description, image_url)
        VALUES ($1, $2, $3, $4, $5)
        ON CONFLICT (slug) DO UPDATE SET slug = EXCLUDED.slug
        RETURNING id
        ",
    )
    .bind(CategoryId::generate())
    .bind(category.name)
    .bind(category.slug)
    .bind(category.description)
    .bind(category.image_url)
    .fetch_one(pool)
    .await
}

fn new_product(product: &SeedProduct, category_id: CategoryId) -> NewProduct {
    NewProduct {
        name: product.name.to_string(),
        slug: product.slug.to_string(),
        description: Some(product.description.to_string()),
        base_price: Decimal::new(product.base_price, 2),
        category_id,
        images: product.images.iter().map(ToString::to_string).collect(),
        customizable_areas: product
            .areas
            .iter()
            .map(|&(name, kind, cents)| NewArea {
                name: name.to_string(),
                kind,
                extra_charge: Some(Decimal::new(cents, 2)),
            })
            .collect(),
    }
}
