//! Category tree conversion.

use std::collections::HashMap;

use dermastore_core::{Category, CategoryTree};

use crate::magento::wire::{CategoriesData, WireCategory};

/// Builds the domain tree from the flat category listing.
///
/// Magento's numeric `path` uses entity ids that do not line up with
/// GraphQL uids, so parent links are derived from `url_path` prefixes
/// instead: the parent of `skincare/serums` is `skincare`. Nodes whose
/// prefix is absent become roots.
#[must_use]
pub fn convert_category_tree(data: &CategoriesData) -> CategoryTree {
    let nodes: Vec<Category> = data
        .categories
        .iter()
        .flat_map(|list| list.items.iter())
        .flatten()
        .flatten()
        .filter_map(convert_category)
        .collect();

    let by_path: HashMap<String, String> = nodes
        .iter()
        .map(|node| (node.path.join("/"), node.id.clone()))
        .collect();

    let linked: Vec<Category> = nodes
        .into_iter()
        .map(|mut node| {
            if node.path.len() > 1 {
                let parent_path = node.path[..node.path.len() - 1].join("/");
                node.parent_id = by_path.get(&parent_path).cloned();
            }
            node
        })
        .collect();

    CategoryTree::from_nodes(linked)
}

/// Converts one category node; nodes without an id or slug are dropped.
fn convert_category(node: &WireCategory) -> Option<Category> {
    let id = node.uid.clone()?;
    let path: Vec<String> = node
        .url_path
        .as_deref()
        .map(|p| p.split('/').map(str::to_owned).collect())
        .unwrap_or_default();
    let slug = node
        .url_key
        .clone()
        .or_else(|| path.last().cloned())
        .filter(|s| !s.is_empty())?;

    // Re-derive the depth from the slug path so the level/path
    // invariant holds regardless of Magento's root offset.
    let path = if path.is_empty() { vec![slug.clone()] } else { path };
    #[allow(clippy::cast_possible_truncation)]
    let level = (path.len() - 1) as u32;

    Some(Category {
        id,
        slug,
        name: node.name.clone().unwrap_or_default(),
        description: node.description.clone(),
        level,
        path,
        parent_id: None,
        children: Vec::new(),
        product_count: node.product_count,
    })
}
