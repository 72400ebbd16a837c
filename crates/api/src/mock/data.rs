//! Fixture dataset backing the mock provider.
//!
//! Products, categories, brands, customer accounts and the coupon
//! registry. The dataset is read-only at runtime; reads clone from it
//! and synthesized fields (rating, stock) are derived, never stored.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;

use dermastore_core::{
    Address, Brand, Category, CategoryRef, CategoryTree, Price, Product, ProductFlags,
    ProductImage, Rating, StockInfo, User, slugify,
};

/// Currency every mock price is denominated in.
pub const CURRENCY: &str = "ZAR";

/// The static catalog.
#[derive(Debug, Clone)]
pub struct Catalog {
    pub products: Vec<Product>,
    pub tree: CategoryTree,
    pub brands: Vec<Brand>,
}

/// A registered mock account. Plaintext password comparison, explicitly
/// not production-representative.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct CustomerRecord {
    pub password: String,
    pub user: User,
}

/// A coupon in the fixed registry.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Coupon {
    pub code: String,
    pub label: String,
    pub kind: CouponKind,
}

/// How a coupon discounts the subtotal.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum CouponKind {
    /// Percentage of the subtotal, 0 to 100.
    Percent(Decimal),
    /// Fixed amount, capped at the subtotal.
    Fixed(Decimal),
}

/// The default coupon registry.
#[must_use]
pub fn default_coupons() -> Vec<Coupon> {
    vec![
        Coupon {
            code: "SAVE10".to_owned(),
            label: "10% off your order".to_owned(),
            kind: CouponKind::Percent(Decimal::new(10, 0)),
        },
        Coupon {
            code: "SAVE50".to_owned(),
            label: "R50 off your order".to_owned(),
            kind: CouponKind::Fixed(Decimal::new(50, 0)),
        },
        Coupon {
            code: "WELCOME15".to_owned(),
            label: "15% off your first order".to_owned(),
            kind: CouponKind::Percent(Decimal::new(15, 0)),
        },
    ]
}

/// The default account table.
#[must_use]
pub fn fixture_customers() -> Vec<CustomerRecord> {
    vec![
        CustomerRecord {
            password: "password123".to_owned(),
            user: User {
                id: "user-1".to_owned(),
                email: "thandi@example.com".to_owned(),
                first_name: "Thandi".to_owned(),
                last_name: "Nkosi".to_owned(),
                addresses: vec![Address {
                    id: Some("addr-1".to_owned()),
                    first_name: "Thandi".to_owned(),
                    last_name: "Nkosi".to_owned(),
                    street: vec!["12 Kloof Street".to_owned()],
                    city: "Cape Town".to_owned(),
                    region: Some("Western Cape".to_owned()),
                    postcode: "8001".to_owned(),
                    country_code: "ZA".to_owned(),
                    phone: Some("+27 21 555 0100".to_owned()),
                    is_default_shipping: true,
                    is_default_billing: true,
                }],
                created_at: day(0),
            },
        },
        CustomerRecord {
            password: "hunter2hunter2".to_owned(),
            user: User {
                id: "user-2".to_owned(),
                email: "sipho@example.com".to_owned(),
                first_name: "Sipho".to_owned(),
                last_name: "Dlamini".to_owned(),
                addresses: Vec::new(),
                created_at: day(30),
            },
        },
    ]
}

/// Builds the static catalog.
#[must_use]
pub fn fixture_catalog() -> Catalog {
    let tree = fixture_tree();
    let brands = fixture_brands();
    let products = fixture_products(&tree, &brands);
    Catalog {
        products,
        tree,
        brands,
    }
}

fn fixture_tree() -> CategoryTree {
    let nodes = vec![
        category("cat-1", "skincare", "Skincare", None, 0, &["skincare"]),
        category(
            "cat-2",
            "cleansers",
            "Cleansers",
            Some("cat-1"),
            1,
            &["skincare", "cleansers"],
        ),
        category(
            "cat-3",
            "serums",
            "Serums",
            Some("cat-1"),
            1,
            &["skincare", "serums"],
        ),
        category(
            "cat-4",
            "moisturizers",
            "Moisturizers",
            Some("cat-1"),
            1,
            &["skincare", "moisturizers"],
        ),
        category(
            "cat-5",
            "sun-care",
            "Sun Care",
            Some("cat-1"),
            1,
            &["skincare", "sun-care"],
        ),
    ];
    CategoryTree::from_nodes(nodes)
}

fn fixture_brands() -> Vec<Brand> {
    ["CeraVe", "La Roche-Posay", "The Ordinary", "Eucerin", "Neutrogena"]
        .iter()
        .map(|name| Brand::from_name(name))
        .collect()
}

#[allow(clippy::too_many_lines)]
fn fixture_products(tree: &CategoryTree, brands: &[Brand]) -> Vec<Product> {
    let brand = |name: &str| {
        brands
            .iter()
            .find(|b| b.name == name)
            .cloned()
            .unwrap_or_else(Brand::unknown)
    };
    let cat = |slug: &str| -> Vec<CategoryRef> {
        tree.get_by_slug(slug)
            .map(|c| vec![c.to_ref()])
            .unwrap_or_default()
    };

    vec![
        product(ProductSpec {
            id: "prod-1",
            sku: "CV-FC-473",
            name: "CeraVe Foaming Cleanser 473ml",
            description: "Gel-based foaming cleanser with ceramides and niacinamide for normal to oily skin.",
            brand: brand("CeraVe"),
            categories: cat("cleansers"),
            price_cents: 24_999,
            compare_at_cents: None,
            is_new: false,
            is_best_seller: true,
            created: day(10),
        }),
        product(ProductSpec {
            id: "prod-2",
            sku: "LRP-EC-400",
            name: "La Roche-Posay Effaclar Gel 400ml",
            description: "Purifying foaming gel for oily, sensitive skin.",
            brand: brand("La Roche-Posay"),
            categories: cat("cleansers"),
            price_cents: 34_999,
            compare_at_cents: Some(41_999),
            is_new: false,
            is_best_seller: false,
            created: day(40),
        }),
        product(ProductSpec {
            id: "prod-3",
            sku: "TO-NIA-30",
            name: "The Ordinary Niacinamide 10% + Zinc 1%",
            description: "High-strength vitamin and mineral blemish formula.",
            brand: brand("The Ordinary"),
            categories: cat("serums"),
            price_cents: 18_999,
            compare_at_cents: None,
            is_new: false,
            is_best_seller: true,
            created: day(70),
        }),
        product(ProductSpec {
            id: "prod-4",
            sku: "TO-HA-30",
            name: "The Ordinary Hyaluronic Acid 2% + B5",
            description: "Hydrating serum with multiple molecular weights of hyaluronic acid.",
            brand: brand("The Ordinary"),
            categories: cat("serums"),
            price_cents: 21_999,
            compare_at_cents: None,
            is_new: true,
            is_best_seller: false,
            created: day(320),
        }),
        product(ProductSpec {
            id: "prod-5",
            sku: "LRP-VC-30",
            name: "La Roche-Posay Pure Vitamin C10 Serum",
            description: "Anti-ageing serum with 10% pure vitamin C and salicylic acid.",
            brand: brand("La Roche-Posay"),
            categories: cat("serums"),
            price_cents: 54_999,
            compare_at_cents: Some(62_999),
            is_new: false,
            is_best_seller: false,
            created: day(100),
        }),
        product(ProductSpec {
            id: "prod-6",
            sku: "CV-ML-473",
            name: "CeraVe Moisturising Lotion 473ml",
            description: "Lightweight daily moisturiser with three essential ceramides.",
            brand: brand("CeraVe"),
            categories: cat("moisturizers"),
            price_cents: 27_999,
            compare_at_cents: None,
            is_new: false,
            is_best_seller: true,
            created: day(130),
        }),
        product(ProductSpec {
            id: "prod-7",
            sku: "EU-UR-450",
            name: "Eucerin UreaRepair Plus Lotion 10%",
            description: "Intensive lotion for very dry, rough skin.",
            brand: brand("Eucerin"),
            categories: cat("moisturizers"),
            price_cents: 29_999,
            compare_at_cents: None,
            is_new: false,
            is_best_seller: false,
            created: day(160),
        }),
        product(ProductSpec {
            id: "prod-8",
            sku: "LRP-AN-50",
            name: "La Roche-Posay Anthelios UVMune SPF50+",
            description: "Invisible fluid sunscreen with ultra-broad spectrum protection.",
            brand: brand("La Roche-Posay"),
            categories: cat("sun-care"),
            price_cents: 39_999,
            compare_at_cents: None,
            is_new: true,
            is_best_seller: true,
            created: day(340),
        }),
        product(ProductSpec {
            id: "prod-9",
            sku: "NG-UH-88",
            name: "Neutrogena Ultra Sheer SPF50 88ml",
            description: "Dry-touch sunscreen lotion, non-comedogenic.",
            brand: brand("Neutrogena"),
            categories: cat("sun-care"),
            price_cents: 19_999,
            compare_at_cents: Some(24_999),
            is_new: false,
            is_best_seller: false,
            created: day(190),
        }),
        product(ProductSpec {
            id: "prod-10",
            sku: "EU-HY-50",
            name: "Eucerin Hyaluron-Filler Day Cream",
            description: "Anti-wrinkle day cream with hyaluronic acid and SPF15.",
            brand: brand("Eucerin"),
            categories: cat("moisturizers"),
            price_cents: 9_999,
            compare_at_cents: None,
            is_new: false,
            is_best_seller: false,
            created: day(220),
        }),
    ]
}

struct ProductSpec {
    id: &'static str,
    sku: &'static str,
    name: &'static str,
    description: &'static str,
    brand: Brand,
    categories: Vec<CategoryRef>,
    price_cents: i64,
    compare_at_cents: Option<i64>,
    is_new: bool,
    is_best_seller: bool,
    created: Option<DateTime<Utc>>,
}

fn product(spec: ProductSpec) -> Product {
    let slug = slugify(spec.name);
    let mut price = Price::new(Decimal::new(spec.price_cents, 2), CURRENCY);
    if let Some(compare) = spec.compare_at_cents {
        price = price.with_compare_at(Decimal::new(compare, 2));
    }
    Product {
        id: spec.id.to_owned(),
        sku: spec.sku.to_owned(),
        slug: slug.clone(),
        name: spec.name.to_owned(),
        description: spec.description.to_owned(),
        short_description: None,
        price,
        images: vec![
            ProductImage {
                id: format!("{}-img-1", spec.id),
                url: format!("https://cdn.dermastore.example/{slug}/main.jpg"),
                alt: Some(spec.name.to_owned()),
                is_default: true,
            },
            ProductImage {
                id: format!("{}-img-2", spec.id),
                url: format!("https://cdn.dermastore.example/{slug}/texture.jpg"),
                alt: None,
                is_default: false,
            },
        ],
        brand: spec.brand,
        categories: spec.categories,
        flags: ProductFlags {
            is_new: spec.is_new,
            is_best_seller: spec.is_best_seller,
        },
        attributes: Vec::new(),
        stock: StockInfo {
            in_stock: true,
            quantity: None,
        },
        rating: None,
        created_at: spec.created,
    }
}

fn category(
    id: &str,
    slug: &str,
    name: &str,
    parent: Option<&str>,
    level: u32,
    path: &[&str],
) -> Category {
    Category {
        id: id.to_owned(),
        slug: slug.to_owned(),
        name: name.to_owned(),
        description: None,
        level,
        path: path.iter().map(|s| (*s).to_owned()).collect(),
        parent_id: parent.map(str::to_owned),
        children: Vec::new(),
        product_count: None,
    }
}

fn day(offset: i64) -> Option<DateTime<Utc>> {
    // Fixture epoch: 2024-01-01T00:00:00Z
    DateTime::from_timestamp(1_704_067_200 + offset * 86_400, 0)
}

/// FNV-1a hash of a stable identifier, used to seed synthesized fields.
#[must_use]
pub fn stable_hash(input: &str) -> u64 {
    let mut hash = 0xcbf2_9ce4_8422_2325_u64;
    for byte in input.bytes() {
        hash ^= u64::from(byte);
        hash = hash.wrapping_mul(0x0000_0100_0000_01b3);
    }
    hash
}

/// Fills in the synthesized rating and stock for a product.
///
/// Derived from a hash of the product id, so repeated reads agree.
#[must_use]
pub fn synthesize(mut product: Product) -> Product {
    let hash = stable_hash(&product.id);
    #[allow(clippy::cast_precision_loss)]
    let average = 3.0 + (hash % 20) as f32 / 10.0;
    #[allow(clippy::cast_possible_truncation)]
    let count = 10 + (hash / 20 % 240) as u32;
    #[allow(clippy::cast_possible_truncation)]
    let quantity = 5 + (hash / 4800 % 95) as u32;

    product.rating = Some(Rating { average, count });
    product.stock = StockInfo {
        in_stock: true,
        quantity: Some(quantity),
    };
    product
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn catalog_slugs_are_unique() {
        let catalog = fixture_catalog();
        let mut slugs: Vec<_> = catalog.products.iter().map(|p| p.slug.clone()).collect();
        slugs.sort();
        slugs.dedup();
        assert_eq!(slugs.len(), catalog.products.len());
    }

    #[test]
    fn every_product_has_exactly_one_default_image() {
        for product in fixture_catalog().products {
            let defaults = product.images.iter().filter(|i| i.is_default).count();
            assert_eq!(defaults, 1, "product {}", product.id);
        }
    }

    #[test]
    fn compare_at_prices_are_markdowns() {
        for product in fixture_catalog().products {
            if let Some(compare) = product.price.compare_at_amount {
                assert!(compare > product.price.amount, "product {}", product.id);
            }
        }
    }

    #[test]
    fn synthesized_fields_are_deterministic() {
        let catalog = fixture_catalog();
        let a = synthesize(catalog.products[0].clone());
        let b = synthesize(catalog.products[0].clone());
        assert_eq!(a.rating, b.rating);
        assert_eq!(a.stock, b.stock);
        let rating = a.rating.unwrap();
        assert!((3.0..=5.0).contains(&rating.average));
    }

    #[test]
    fn category_paths_are_consistent() {
        let catalog = fixture_catalog();
        for node in catalog.tree.iter() {
            assert!(node.path_is_consistent(), "category {}", node.id);
        }
    }
}
