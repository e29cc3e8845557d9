use std::collections::{HashMap, HashSet};

use crate::config::{CategorySpec, TaxonomyConfig};

/// One category in the target tree. `path` is root-relative and unique
/// across the tree; `frozen` subtrees never receive content and are never
/// offered as classification targets.
#[derive(Debug, Clone)]
pub struct TaxonomyNode {
    pub name: String,
    pub path: String,
    pub keywords: Vec<String>,
    pub frozen: bool,
    children: Vec<usize>,
}

impl TaxonomyNode {
    pub fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }
}

/// The category tree. Nodes live in an arena with children referenced by
/// slot, plus a flat path lookup built once at construction; immutable
/// afterwards.
#[derive(Debug, Clone, Default)]
pub struct Taxonomy {
    nodes: Vec<TaxonomyNode>,
    roots: Vec<usize>,
    index: HashMap<String, usize>,
}

impl Taxonomy {
    pub fn from_config(config: &TaxonomyConfig) -> Self {
        let mut taxonomy = Taxonomy::default();
        for spec in &config.categories {
            let slot = taxonomy.add_node(spec, "");
            taxonomy.roots.push(slot);
        }
        taxonomy
    }

    fn add_node(&mut self, spec: &CategorySpec, parent_path: &str) -> usize {
        let path = format!("{}/{}", parent_path, spec.name);
        let slot = self.nodes.len();
        self.nodes.push(TaxonomyNode {
            name: spec.name.clone(),
            path: path.clone(),
            keywords: spec.keywords.clone(),
            frozen: spec.frozen,
            children: Vec::new(),
        });
        // First occurrence wins the lookup slot; validate() reports the clash.
        self.index.entry(path.clone()).or_insert(slot);

        let mut children = Vec::with_capacity(spec.children.len());
        for child_spec in &spec.children {
            children.push(self.add_node(child_spec, &path));
        }
        self.nodes[slot].children = children;
        slot
    }

    pub fn find_node(&self, path: &str) -> Option<&TaxonomyNode> {
        self.index.get(path).map(|&slot| &self.nodes[slot])
    }

    /// Every category path, in definition order.
    pub fn all_paths(&self) -> Vec<String> {
        self.nodes.iter().map(|n| n.path.clone()).collect()
    }

    pub fn all_leaf_paths(&self) -> Vec<String> {
        self.nodes
            .iter()
            .filter(|n| n.is_leaf())
            .map(|n| n.path.clone())
            .collect()
    }

    pub fn roots(&self) -> impl Iterator<Item = &TaxonomyNode> {
        self.roots.iter().map(|&slot| &self.nodes[slot])
    }

    pub fn children<'a>(&'a self, node: &'a TaxonomyNode) -> impl Iterator<Item = &'a TaxonomyNode> {
        node.children.iter().map(|&slot| &self.nodes[slot])
    }

    pub fn is_empty(&self) -> bool {
        self.roots.is_empty()
    }

    /// Depth-first pre-order traversal, skipping frozen subtrees entirely.
    pub fn walk(&self) -> Vec<&TaxonomyNode> {
        let mut out = Vec::new();
        let mut stack: Vec<usize> = self.roots.iter().rev().copied().collect();
        while let Some(slot) = stack.pop() {
            let node = &self.nodes[slot];
            if node.frozen {
                continue;
            }
            out.push(node);
            for &child in node.children.iter().rev() {
                stack.push(child);
            }
        }
        out
    }

    /// Structural validation. Errors here are fatal before any remote call.
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();
        let mut seen = HashSet::new();
        for node in &self.nodes {
            if !seen.insert(node.path.as_str()) {
                errors.push(format!("duplicate category path: {}", node.path));
            }
        }
        if self.roots.is_empty() {
            errors.push("taxonomy has no categories".to_string());
        }
        errors
    }
}
