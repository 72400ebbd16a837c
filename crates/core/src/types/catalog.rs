//! Categories, the category tree and brands.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// A product brand.
///
/// Backends without a native brand entity synthesize brands from
/// product attributes; [`Brand::unknown`] is the sentinel used when no
/// attribute is present.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Brand {
    pub id: String,
    pub slug: String,
    pub name: String,
}

impl Brand {
    /// Sentinel brand for products with no brand attribute.
    #[must_use]
    pub fn unknown() -> Self {
        Self {
            id: "unknown".to_owned(),
            slug: "unknown".to_owned(),
            name: "Unknown".to_owned(),
        }
    }

    /// Derives a brand from a display name, slugifying it for the id.
    #[must_use]
    pub fn from_name(name: &str) -> Self {
        let slug = slugify(name);
        Self {
            id: slug.clone(),
            slug,
            name: name.to_owned(),
        }
    }
}

/// A lightweight category reference carried on products.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryRef {
    pub id: String,
    pub slug: String,
    pub name: String,
}

/// A category node.
///
/// Invariants: `path` lists slugs from the root down to this node, so
/// `path.len() == level + 1` and `path.last() == slug`. `children`
/// holds child ids resolved through the owning [`CategoryTree`] rather
/// than nested nodes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    pub id: String,
    pub slug: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub level: u32,
    pub path: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<String>,
    #[serde(default)]
    pub children: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub product_count: Option<u32>,
}

impl Category {
    /// Whether `level` and `path` agree.
    #[must_use]
    pub fn path_is_consistent(&self) -> bool {
        self.path.len() == self.level as usize + 1
            && self.path.last().is_some_and(|last| *last == self.slug)
    }

    /// A [`CategoryRef`] pointing at this node.
    #[must_use]
    pub fn to_ref(&self) -> CategoryRef {
        CategoryRef {
            id: self.id.clone(),
            slug: self.slug.clone(),
            name: self.name.clone(),
        }
    }
}

/// A flat arena of categories keyed by id.
///
/// Hierarchy is expressed through `parent_id` and `children` id lists,
/// never through nested ownership, so arbitrary (even cyclic) backend
/// data cannot create ownership problems.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryTree {
    roots: Vec<String>,
    nodes: HashMap<String, Category>,
}

impl CategoryTree {
    /// Builds a tree from a flat node list.
    ///
    /// `children` lists are recomputed from `parent_id` links; nodes
    /// whose parent is absent from the list become roots. Sibling order
    /// follows the input order.
    #[must_use]
    pub fn from_nodes(nodes: Vec<Category>) -> Self {
        let ids: Vec<String> = nodes.iter().map(|n| n.id.clone()).collect();
        let mut map: HashMap<String, Category> = nodes
            .into_iter()
            .map(|mut node| {
                node.children.clear();
                (node.id.clone(), node)
            })
            .collect();

        let mut roots = Vec::new();
        for id in &ids {
            let parent = map.get(id).and_then(|n| n.parent_id.clone());
            match parent {
                Some(parent_id) if map.contains_key(&parent_id) && parent_id != *id => {
                    if let Some(parent_node) = map.get_mut(&parent_id) {
                        parent_node.children.push(id.clone());
                    }
                }
                _ => roots.push(id.clone()),
            }
        }

        Self { roots, nodes: map }
    }

    #[must_use]
    pub fn get(&self, id: &str) -> Option<&Category> {
        self.nodes.get(id)
    }

    #[must_use]
    pub fn get_by_slug(&self, slug: &str) -> Option<&Category> {
        self.nodes.values().find(|node| node.slug == slug)
    }

    /// Root nodes in insertion order.
    pub fn roots(&self) -> impl Iterator<Item = &Category> {
        self.roots.iter().filter_map(|id| self.nodes.get(id))
    }

    /// Direct children of a node, in insertion order.
    pub fn children_of<'a>(&'a self, id: &str) -> impl Iterator<Item = &'a Category> {
        self.nodes
            .get(id)
            .map(|node| node.children.as_slice())
            .unwrap_or_default()
            .iter()
            .filter_map(|child_id| self.nodes.get(child_id))
    }

    /// All nodes, in no particular order.
    pub fn iter(&self) -> impl Iterator<Item = &Category> {
        self.nodes.values()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}

/// Lowercases and hyphenates a display name into a url-safe slug.
#[must_use]
pub fn slugify(name: &str) -> String {
    let mut slug = String::with_capacity(name.len());
    let mut last_was_hyphen = true;
    for ch in name.chars() {
        if ch.is_ascii_alphanumeric() {
            slug.push(ch.to_ascii_lowercase());
            last_was_hyphen = false;
        } else if !last_was_hyphen {
            slug.push('-');
            last_was_hyphen = true;
        }
    }
    while slug.ends_with('-') {
        slug.pop();
    }
    slug
}

#[cfg(test)]
mod tests {
    use super::*;

    fn node(id: &str, slug: &str, parent: Option<&str>, level: u32, path: &[&str]) -> Category {
        Category {
            id: id.to_owned(),
            slug: slug.to_owned(),
            name: slug.to_owned(),
            description: None,
            level,
            path: path.iter().map(|s| (*s).to_owned()).collect(),
            parent_id: parent.map(str::to_owned),
            children: Vec::new(),
            product_count: None,
        }
    }

    #[test]
    fn tree_links_children_from_parent_ids() {
        let tree = CategoryTree::from_nodes(vec![
            node("1", "skincare", None, 0, &["skincare"]),
            node("2", "cleansers", Some("1"), 1, &["skincare", "cleansers"]),
            node("3", "serums", Some("1"), 1, &["skincare", "serums"]),
        ]);

        let roots: Vec<_> = tree.roots().map(|c| c.id.as_str()).collect();
        assert_eq!(roots, ["1"]);

        let children: Vec<_> = tree.children_of("1").map(|c| c.slug.as_str()).collect();
        assert_eq!(children, ["cleansers", "serums"]);
    }

    #[test]
    fn orphaned_nodes_become_roots() {
        let tree = CategoryTree::from_nodes(vec![node(
            "9",
            "dangling",
            Some("missing"),
            1,
            &["x", "dangling"],
        )]);
        assert_eq!(tree.roots().count(), 1);
    }

    #[test]
    fn path_consistency_check() {
        let good = node("2", "cleansers", Some("1"), 1, &["skincare", "cleansers"]);
        assert!(good.path_is_consistent());

        let bad_level = node("2", "cleansers", Some("1"), 2, &["skincare", "cleansers"]);
        assert!(!bad_level.path_is_consistent());

        let bad_tail = node("2", "cleansers", Some("1"), 1, &["skincare", "serums"]);
        assert!(!bad_tail.path_is_consistent());
    }

    #[test]
    fn slugify_normalizes_names() {
        assert_eq!(slugify("La Roche-Posay"), "la-roche-posay");
        assert_eq!(slugify("  CeraVe  "), "cerave");
        assert_eq!(slugify("Vitamin C 10%"), "vitamin-c-10");
    }

    #[test]
    fn unknown_brand_sentinel() {
        let brand = Brand::unknown();
        assert_eq!(brand.name, "Unknown");
        assert_eq!(brand.slug, "unknown");
    }
}
