//! Flattened view models for listing surfaces.
//!
//! Grids and carousels need a handful of display-ready fields, not the
//! full product graph. `ProductCard` pre-renders those so templates do
//! no money formatting or image selection of their own.

use serde::{Deserialize, Serialize};

use dermastore_core::{Page, Product};

/// A product reduced to what a listing tile renders.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProductCard {
    pub id: String,
    pub slug: String,
    pub name: String,
    pub brand: String,
    /// URL of the default image, when the product has any image.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_alt: Option<String>,
    /// Display-ready price, e.g. `R 349.99`.
    pub price: String,
    /// Display-ready struck-through price when the product is on sale.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub compare_at_price: Option<String>,
    pub on_sale: bool,
    pub is_new: bool,
    pub is_best_seller: bool,
    pub in_stock: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rating: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub review_count: Option<u32>,
}

impl From<&Product> for ProductCard {
    fn from(product: &Product) -> Self {
        let image = product.default_image();
        Self {
            id: product.id.clone(),
            slug: product.slug.clone(),
            name: product.name.clone(),
            brand: product.brand.name.clone(),
            image: image.map(|i| i.url.clone()),
            image_alt: image.and_then(|i| i.alt.clone()),
            price: product.price.formatted.clone(),
            compare_at_price: if product.on_sale() {
                product.price.compare_at_formatted.clone()
            } else {
                None
            },
            on_sale: product.on_sale(),
            is_new: product.flags.is_new,
            is_best_seller: product.flags.is_best_seller,
            in_stock: product.stock.in_stock,
            rating: product.rating.as_ref().map(|r| r.average),
            review_count: product.rating.as_ref().map(|r| r.count),
        }
    }
}

/// Maps a product page to cards, keeping the pagination metadata.
#[must_use]
pub fn to_card_page(page: &Page<Product>) -> Page<ProductCard> {
    Page {
        items: page.items.iter().map(ProductCard::from).collect(),
        page: page.page,
        page_size: page.page_size,
        total_items: page.total_items,
        total_pages: page.total_pages,
    }
}
