//! Tree-shaped schemas of document groups.
//!
//! A document model is a tree of elements and attributes addressed by dotted paths from the
//! root, e.g. `Catalogs.Catalog.Items.Item.@ItemID`. Attribute names carry a leading `@`.

use fedquery_ast::symbol::has_dotted_suffix;
use fedquery_common::data_type::DataTypeName;
use indexmap::IndexMap;
use serde::Serialize;
use smol_str::SmolStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum NodeKind {
    Element,
    Attribute,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DocumentNode {
    pub name: SmolStr,
    /// Dotted path from the root, the root's own name included.
    pub path: SmolStr,
    pub data_type: DataTypeName,
    pub kind: NodeKind,
    pub parent: Option<usize>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DocumentModel {
    nodes: Vec<DocumentNode>,
}

/// Outcome of looking a name up in a [`DocumentModel`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeLookup {
    Found(usize),
    NotFound,
    /// Several nodes end with the name and none matches it exactly.
    Ambiguous(Vec<SmolStr>),
}

impl DocumentModel {
    pub fn new(root: impl Into<SmolStr>) -> Self {
        let root = root.into();
        Self {
            nodes: vec![DocumentNode {
                path: root.clone(),
                name: root,
                data_type: DataTypeName::Xml,
                kind: NodeKind::Element,
                parent: None,
            }],
        }
    }

    #[inline]
    pub fn root(&self) -> &DocumentNode {
        &self.nodes[0]
    }

    #[inline]
    pub fn node(&self, index: usize) -> Option<&DocumentNode> {
        self.nodes.get(index)
    }

    #[inline]
    pub fn nodes(&self) -> &[DocumentNode] {
        &self.nodes
    }

    pub fn add_element(&mut self, parent: usize, name: &str, data_type: DataTypeName) -> usize {
        self.add_node(parent, SmolStr::new(name), data_type, NodeKind::Element)
    }

    pub fn add_attribute(&mut self, parent: usize, name: &str, data_type: DataTypeName) -> usize {
        let name = if name.starts_with('@') {
            SmolStr::new(name)
        } else {
            SmolStr::new(format!("@{name}"))
        };
        self.add_node(parent, name, data_type, NodeKind::Attribute)
    }

    fn add_node(
        &mut self,
        parent: usize,
        name: SmolStr,
        data_type: DataTypeName,
        kind: NodeKind,
    ) -> usize {
        let parent = parent.min(self.nodes.len() - 1);
        let path = SmolStr::new(format!("{}.{}", self.nodes[parent].path, name));
        self.nodes.push(DocumentNode {
            name,
            path,
            data_type,
            kind,
            parent: Some(parent),
        });
        self.nodes.len() - 1
    }

    /// Finds the node a possibly partial path names.
    ///
    /// A full path wins over suffix matches; otherwise the name must be the dotted suffix of
    /// exactly one path.
    pub fn lookup(&self, name: &str) -> NodeLookup {
        if let Some(index) = self
            .nodes
            .iter()
            .position(|node| node.path.eq_ignore_ascii_case(name))
        {
            return NodeLookup::Found(index);
        }
        let matches: Vec<usize> = self
            .nodes
            .iter()
            .enumerate()
            .filter(|(_, node)| has_dotted_suffix(&node.path, name))
            .map(|(index, _)| index)
            .collect();
        match matches.as_slice() {
            [] => NodeLookup::NotFound,
            [index] => NodeLookup::Found(*index),
            _ => NodeLookup::Ambiguous(
                matches
                    .iter()
                    .map(|index| self.nodes[*index].path.clone())
                    .collect(),
            ),
        }
    }

    #[inline]
    pub fn children(&self, index: usize) -> impl Iterator<Item = (usize, &DocumentNode)> {
        self.nodes
            .iter()
            .enumerate()
            .filter(move |(_, node)| node.parent == Some(index))
    }

    #[inline]
    pub fn is_leaf(&self, index: usize) -> bool {
        self.children(index).next().is_none()
    }

    /// Pseudo-groups used to correlate sub-commands with a document: one per element that has
    /// leaf children, keyed by the element's path, holding those leaves in document order.
    pub fn element_groups(&self) -> IndexMap<SmolStr, Vec<usize>> {
        let mut groups: IndexMap<SmolStr, Vec<usize>> = IndexMap::new();
        for (index, node) in self.nodes.iter().enumerate() {
            let Some(parent) = node.parent else {
                continue;
            };
            if self.is_leaf(index) {
                groups
                    .entry(self.nodes[parent].path.clone())
                    .or_default()
                    .push(index);
            }
        }
        groups
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn catalog_document() -> DocumentModel {
        let mut model = DocumentModel::new("Catalogs");
        let catalog = model.add_element(0, "Catalog", DataTypeName::String);
        let items = model.add_element(catalog, "Items", DataTypeName::String);
        let item = model.add_element(items, "Item", DataTypeName::String);
        model.add_attribute(item, "ItemID", DataTypeName::String);
        model.add_element(item, "Name", DataTypeName::String);
        model.add_element(item, "Quantity", DataTypeName::Integer);
        model.add_element(catalog, "Name", DataTypeName::String);
        model
    }

    #[test]
    fn test_paths() {
        let model = catalog_document();
        let paths: Vec<_> = model.nodes().iter().map(|n| n.path.as_str()).collect();
        insta::assert_debug_snapshot!(paths, @r#"
        [
            "Catalogs",
            "Catalogs.Catalog",
            "Catalogs.Catalog.Items",
            "Catalogs.Catalog.Items.Item",
            "Catalogs.Catalog.Items.Item.@ItemID",
            "Catalogs.Catalog.Items.Item.Name",
            "Catalogs.Catalog.Items.Item.Quantity",
            "Catalogs.Catalog.Name",
        ]
        "#);
    }

    #[test]
    fn test_suffix_lookup() {
        let model = catalog_document();
        assert_eq!(model.lookup("Quantity"), NodeLookup::Found(6));
        assert_eq!(model.lookup("item.quantity"), NodeLookup::Found(6));
        assert_eq!(model.lookup("@ItemID"), NodeLookup::Found(4));
        assert_eq!(model.lookup("Catalogs.Catalog"), NodeLookup::Found(1));
        assert!(matches!(model.lookup("Name"), NodeLookup::Ambiguous(paths) if paths.len() == 2));
        assert_eq!(model.lookup("Catalog.Name"), NodeLookup::Found(7));
        assert_eq!(model.lookup("Price"), NodeLookup::NotFound);
    }

    #[test]
    fn test_element_groups() {
        let model = catalog_document();
        let groups = model.element_groups();
        assert_eq!(groups.get("Catalogs.Catalog.Items.Item"), Some(&vec![4, 5, 6]));
        assert_eq!(groups.get("Catalogs.Catalog"), Some(&vec![7]));
        assert_eq!(groups.len(), 2);
    }
}
