//! Product and listing conversions.

use dermastore_core::{
    Brand, CategoryRef, Page, Price, Product, ProductAttribute, ProductFlags, ProductImage,
    Rating, StockInfo,
};

use crate::magento::wire::{WireProduct, WireProducts};

use super::{decimal, money, parse_timestamp};

/// Attribute codes recognized as the brand, in lookup order.
const BRAND_ATTRIBUTE_CODES: &[&str] = &["brand", "manufacturer"];

/// Converts one product node. Total: missing fields become defaults.
#[must_use]
pub fn convert_product(node: &WireProduct) -> Product {
    let id = node.uid.clone().unwrap_or_default();
    let attributes = convert_attributes(node);

    Product {
        sku: node.sku.clone().unwrap_or_default(),
        slug: node.url_key.clone().unwrap_or_default(),
        name: node.name.clone().unwrap_or_default(),
        description: node
            .description
            .as_ref()
            .and_then(|d| d.html.clone())
            .unwrap_or_default(),
        short_description: node.short_description.as_ref().and_then(|d| d.html.clone()),
        price: convert_price(node),
        images: convert_images(node, &id),
        brand: convert_brand(&attributes),
        categories: convert_categories(node),
        flags: convert_flags(&attributes),
        attributes,
        stock: convert_stock(node),
        rating: convert_rating(node),
        created_at: parse_timestamp(node.created_at.as_deref()),
        id,
    }
}

/// Converts a listing page, trusting the upstream pagination metadata.
///
/// `page`/`page_size` are the requested values, used when the response
/// omits its `page_info`.
#[must_use]
pub fn convert_product_page(node: &WireProducts, page: u32, page_size: u32) -> Page<Product> {
    let items: Vec<Product> = node
        .items
        .iter()
        .flatten()
        .flatten()
        .map(convert_product)
        .collect();

    let info = node.page_info.as_ref();
    #[allow(clippy::cast_possible_truncation)]
    let total = node.total_count.unwrap_or(items.len() as u32);
    Page::new(
        items,
        info.and_then(|i| i.current_page).unwrap_or(page).max(1),
        info.and_then(|i| i.page_size).unwrap_or(page_size).max(1),
        total,
    )
}

/// Price from the minimum-price node.
///
/// A sale is inferred only when a discount sub-object is present AND
/// the final price is strictly below the regular price.
fn convert_price(node: &WireProduct) -> Price {
    let minimum = node
        .price_range
        .as_ref()
        .and_then(|r| r.minimum_price.as_ref());
    let Some(minimum) = minimum else {
        return money(None);
    };

    let regular = money(minimum.regular_price.as_ref());
    let final_price = match minimum.final_price.as_ref() {
        Some(_) => money(minimum.final_price.as_ref()),
        None => regular.clone(),
    };

    let discounted = minimum.discount.as_ref().is_some_and(|d| {
        decimal(d.amount_off) > rust_decimal::Decimal::ZERO
            || decimal(d.percent_off) > rust_decimal::Decimal::ZERO
    });
    if discounted && final_price.amount < regular.amount {
        final_price.with_compare_at(regular.amount)
    } else {
        final_price
    }
}

/// Gallery from `media_gallery`, falling back to the single thumbnail.
///
/// Exactly one image is flagged default when the list is non-empty:
/// position 0 (or the first entry) wins.
fn convert_images(node: &WireProduct, product_id: &str) -> Vec<ProductImage> {
    let mut entries: Vec<_> = node
        .media_gallery
        .iter()
        .flatten()
        .filter(|m| !m.disabled.unwrap_or(false))
        .filter(|m| m.url.is_some())
        .cloned()
        .collect();
    entries.sort_by_key(|m| m.position.unwrap_or(i64::MAX));

    let mut images: Vec<ProductImage> = entries
        .into_iter()
        .enumerate()
        .map(|(index, entry)| ProductImage {
            id: format!("{product_id}-img-{index}"),
            url: entry.url.unwrap_or_default(),
            alt: entry.label,
            is_default: entry.position == Some(0),
        })
        .collect();

    if images.is_empty() {
        if let Some(url) = node.thumbnail.as_ref().and_then(|t| t.url.clone()) {
            images.push(ProductImage {
                id: format!("{product_id}-img-0"),
                url,
                alt: node.thumbnail.as_ref().and_then(|t| t.label.clone()),
                is_default: true,
            });
        }
    }

    // Exactly one default: first flagged entry wins, else the first.
    let first_default = images.iter().position(|i| i.is_default).unwrap_or(0);
    for (index, image) in images.iter_mut().enumerate() {
        image.is_default = index == first_default;
    }
    images
}

fn convert_attributes(node: &WireProduct) -> Vec<ProductAttribute> {
    node.custom_attributes
        .iter()
        .flatten()
        .filter_map(|attr| {
            let code = attr.code.clone()?;
            Some(ProductAttribute {
                name: code.clone(),
                code,
                value: attr.value.clone().unwrap_or_default(),
            })
        })
        .collect()
}

/// Brand from the `brand`/`manufacturer` attribute, else the sentinel.
fn convert_brand(attributes: &[ProductAttribute]) -> Brand {
    BRAND_ATTRIBUTE_CODES
        .iter()
        .find_map(|code| {
            attributes
                .iter()
                .find(|a| a.code == *code && !a.value.is_empty())
        })
        .map_or_else(Brand::unknown, |attr| Brand::from_name(&attr.value))
}

/// Normalizes string-encoded flags once, at this boundary.
fn convert_flags(attributes: &[ProductAttribute]) -> ProductFlags {
    let truthy = |code: &str| {
        attributes
            .iter()
            .find(|a| a.code == code)
            .is_some_and(|a| a.value == "1" || a.value.eq_ignore_ascii_case("true"))
    };
    ProductFlags {
        is_new: truthy("is_new"),
        is_best_seller: truthy("best_seller"),
    }
}

fn convert_categories(node: &WireProduct) -> Vec<CategoryRef> {
    node.categories
        .iter()
        .flatten()
        .map(|c| CategoryRef {
            id: c.uid.clone().unwrap_or_default(),
            slug: c
                .url_key
                .clone()
                .or_else(|| {
                    c.url_path
                        .as_deref()
                        .and_then(|p| p.rsplit('/').next())
                        .map(str::to_owned)
                })
                .unwrap_or_default(),
            name: c.name.clone().unwrap_or_default(),
        })
        .collect()
}

fn convert_stock(node: &WireProduct) -> StockInfo {
    StockInfo {
        in_stock: node.stock_status.as_deref() != Some("OUT_OF_STOCK"),
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        quantity: node
            .only_x_left_in_stock
            .filter(|q| *q >= 0.0)
            .map(|q| q as u32),
    }
}

/// Magento's `rating_summary` is 0-100; the domain scale is 0-5.
fn convert_rating(node: &WireProduct) -> Option<Rating> {
    let summary = node.rating_summary?;
    let count = node.review_count.unwrap_or(0);
    if count == 0 && summary <= 0.0 {
        return None;
    }
    #[allow(clippy::cast_possible_truncation)]
    Some(Rating {
        average: (summary / 20.0) as f32,
        count,
    })
}
