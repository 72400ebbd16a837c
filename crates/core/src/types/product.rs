//! Products and their owned value objects.

use serde::{Deserialize, Serialize};

use super::catalog::{Brand, CategoryRef};
use super::price::Price;

/// A catalog product in the unified model.
///
/// `id` is the backend-internal identifier, `slug` the routable key and
/// `sku` the merchandising code. The three are distinct identities and
/// are never interchanged.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    pub id: String,
    pub sku: String,
    pub slug: String,
    pub name: String,
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub short_description: Option<String>,
    pub price: Price,
    /// Ordered gallery. When non-empty, exactly one entry has
    /// `is_default == true`.
    pub images: Vec<ProductImage>,
    pub brand: Brand,
    pub categories: Vec<CategoryRef>,
    /// Flags normalized once at the mapping boundary.
    #[serde(default)]
    pub flags: ProductFlags,
    /// Remaining free-form attributes, verbatim from the backend.
    #[serde(default)]
    pub attributes: Vec<ProductAttribute>,
    pub stock: StockInfo,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rating: Option<Rating>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<chrono::DateTime<chrono::Utc>>,
}

impl Product {
    /// The default gallery image, if any.
    #[must_use]
    pub fn default_image(&self) -> Option<&ProductImage> {
        self.images
            .iter()
            .find(|image| image.is_default)
            .or_else(|| self.images.first())
    }

    /// Whether the product is currently sold below its reference price.
    #[must_use]
    pub const fn on_sale(&self) -> bool {
        self.price.is_discounted()
    }
}

/// One gallery image.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductImage {
    pub id: String,
    pub url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alt: Option<String>,
    #[serde(default)]
    pub is_default: bool,
}

/// Boolean merchandising flags.
///
/// Backends encode these as string-valued attribute entries; mapping
/// parses them exactly once so readers never see raw `"true"`/`"1"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ProductFlags {
    #[serde(default)]
    pub is_new: bool,
    #[serde(default)]
    pub is_best_seller: bool,
}

/// A free-form backend attribute.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductAttribute {
    pub name: String,
    pub code: String,
    pub value: String,
}

/// Availability of a product.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StockInfo {
    pub in_stock: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quantity: Option<u32>,
}

/// Aggregated review rating on a 0 to 5 scale.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rating {
    pub average: f32,
    pub count: u32,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn image(id: &str, is_default: bool) -> ProductImage {
        ProductImage {
            id: id.to_owned(),
            url: format!("https://cdn.example.com/{id}.jpg"),
            alt: None,
            is_default,
        }
    }

    #[test]
    fn default_image_prefers_flagged_entry() {
        let images = vec![image("a", false), image("b", true), image("c", false)];
        let found = images.iter().find(|i| i.is_default).map(|i| i.id.clone());
        assert_eq!(found.as_deref(), Some("b"));
    }

    #[test]
    fn flags_default_to_false() {
        let flags = ProductFlags::default();
        assert!(!flags.is_new);
        assert!(!flags.is_best_seller);
    }
}
