use std::sync::Arc;

use fedquery_ast::command::Query;
use fedquery_ast::{ElementSymbol, GroupSymbol};
use fedquery_catalog::MetadataAdapter;
use fedquery_catalog::document::{DocumentModel, NodeLookup};
use fedquery_catalog::metadata::ColumnMetadata;
use fedquery_catalog::temp::{TempGroup, TempGroupKind};
use fedquery_common::constants::DOCUMENT_ROOT_NAME;
use fedquery_common::types::ElementMetadataId;
use tracing::trace;

use super::Resolver;
use crate::error::{ResolveError, ResolveResult};
use crate::scope::GroupContext;
use crate::symbol;

/// A document group together with its tree model, consulted before any relational scope when
/// elements of a document query are bound.
#[derive(Debug, Clone)]
pub(crate) struct DocumentScope {
    group: GroupSymbol,
    model: Arc<DocumentModel>,
}

impl DocumentScope {
    pub(crate) fn new(group: GroupSymbol, adapter: &MetadataAdapter<'_>) -> ResolveResult<Self> {
        let model = match group.metadata_id().and_then(|id| id.as_physical()) {
            Some(id) => adapter.catalog().document_model(id)?,
            None => None,
        };
        let model = model.ok_or_else(|| ResolveError::InvalidDefinition {
            group: group.name.to_string(),
            reason: "the group has no document model".to_string(),
        })?;
        Ok(Self { group, model })
    }

    #[inline]
    pub(crate) fn model(&self) -> &DocumentModel {
        &self.model
    }

    /// The element selecting the whole document.
    pub(crate) fn root_element(&self) -> ResolveResult<ElementSymbol> {
        let mut root = ElementSymbol::new(DOCUMENT_ROOT_NAME);
        self.resolve_element(&mut root)?;
        Ok(root)
    }

    /// Binds `element` to a node of the document. Returns `false` when no node matches, leaving
    /// the element to the relational scopes.
    pub(crate) fn resolve_element(&self, element: &mut ElementSymbol) -> ResolveResult<bool> {
        let path = self.strip_group_prefix(&element.name);
        let index = if path.eq_ignore_ascii_case(DOCUMENT_ROOT_NAME) {
            0
        } else {
            match self.lookup(path) {
                NodeLookup::Found(index) => index,
                NodeLookup::NotFound => return Ok(false),
                NodeLookup::Ambiguous(candidates) => {
                    return Err(ResolveError::AmbiguousElement {
                        name: element.name.to_string(),
                        candidates: candidates.iter().map(ToString::to_string).collect(),
                    });
                }
            }
        };
        let Some(node) = self.model.node(index) else {
            return Ok(false);
        };
        let Some(group_id) = self.group.metadata_id().cloned() else {
            return Ok(false);
        };
        let (path, data_type) = (node.path.clone(), node.data_type);
        element.bind(
            self.group.clone(),
            ElementMetadataId::new(group_id, path, index),
            data_type,
        );
        Ok(true)
    }

    /// Looks `path` up as written, then as an attribute.
    fn lookup(&self, path: &str) -> NodeLookup {
        match self.model.lookup(path) {
            NodeLookup::NotFound => {}
            found => return found,
        }
        let attribute = match path.rsplit_once('.') {
            Some((_, short)) if short.starts_with('@') => return NodeLookup::NotFound,
            Some((qualifier, short)) => format!("{qualifier}.@{short}"),
            None if path.starts_with('@') => return NodeLookup::NotFound,
            None => format!("@{path}"),
        };
        self.model.lookup(&attribute)
    }

    /// Drops the longest leading group name, or dotted suffix of it, that qualifies `name`.
    fn strip_group_prefix<'n>(&self, name: &'n str) -> &'n str {
        let group = self.group.name.as_str();
        let mut prefixes = vec![group];
        if !self.group.is_aliased() {
            prefixes.extend(group.match_indices('.').map(|(dot, _)| &group[dot + 1..]));
        }
        prefixes
            .into_iter()
            .find_map(|prefix| {
                let split = prefix.len();
                let matches = name.len() > split
                    && name.is_char_boundary(split)
                    && name[..split].eq_ignore_ascii_case(prefix)
                    && name[split..].starts_with('.');
                matches.then(|| &name[split + 1..])
            })
            .unwrap_or(name)
    }
}

impl Resolver<'_> {
    /// Resolves a query over a document group.
    ///
    /// Element names bind against the document tree first. Sub-commands resolve on their own
    /// and correlate through one pseudo-group per element holding leaf nodes.
    pub(super) fn resolve_document_query(
        &self,
        query: &mut Query,
        document: &DocumentScope,
        adapter: &MetadataAdapter<'_>,
        external: &GroupContext<'_>,
    ) -> ResolveResult<()> {
        let context = "a document query";
        if query.group_by.is_some() {
            return Err(ResolveError::DisallowedClause {
                clause: "GROUP BY",
                context,
            });
        }
        if query.having.is_some() {
            return Err(ResolveError::DisallowedClause {
                clause: "HAVING",
                context,
            });
        }
        if query.into.is_some() {
            return Err(ResolveError::DisallowedClause {
                clause: "INTO",
                context,
            });
        }

        let mut correlated = adapter.child();
        let mut groups = vec![document.group.clone()];
        let model = document.model();
        for (path, leaves) in model.element_groups() {
            let columns = leaves
                .iter()
                .filter_map(|index| model.node(*index))
                .map(|node| ColumnMetadata::new(node.name.clone(), node.data_type))
                .collect();
            let id = correlated
                .temp_mut()
                .upsert(TempGroup::new(path.clone(), TempGroupKind::Document, columns));
            groups.push(symbol::bound_group(&path, id));
        }
        trace!(
            group = %document.group.name,
            pseudo_groups = groups.len() - 1,
            "document scope prepared"
        );
        let scope = external.child(groups);

        if let Some(criteria) = &mut query.criteria {
            self.resolve_criteria_in(criteria, &correlated, &scope, Some(document))?;
        }
        self.resolve_select(&mut query.select, &correlated, &scope, Some(document))?;
        if let Some(order_by) = &mut query.order_by {
            let projected = query.select.projected_symbols();
            let unrelated = query.select.distinct.then_some("with SELECT DISTINCT");
            self.resolve_order_by(
                order_by,
                &projected,
                unrelated,
                &correlated,
                &scope,
                Some(document),
            )?;
        }
        if let Some(limit) = &mut query.limit {
            self.resolve_limit(limit, &correlated, &scope)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use fedquery_ast::command::GroupBy;
    use fedquery_ast::criteria::{CompareOp, SubquerySetCriteria};
    use fedquery_ast::expression::MultipleElementSymbol;
    use fedquery_ast::render::Render;
    use fedquery_ast::{Command, Criteria, Expression};
    use fedquery_catalog::memory::MemoryCatalog;
    use fedquery_common::data_type::DataTypeName;
    use insta::assert_snapshot;

    use super::*;
    use crate::options::ResolverOptions;

    fn catalog() -> MemoryCatalog {
        let mut model = DocumentModel::new("Catalogs");
        let catalog = model.add_element(0, "Catalog", DataTypeName::String);
        let items = model.add_element(catalog, "Items", DataTypeName::String);
        let item = model.add_element(items, "Item", DataTypeName::String);
        model.add_attribute(item, "ItemID", DataTypeName::String);
        model.add_element(item, "Name", DataTypeName::String);
        model.add_element(item, "Quantity", DataTypeName::Integer);
        model.add_element(catalog, "Name", DataTypeName::String);

        let mut catalog = MemoryCatalog::new();
        catalog.add_document_group("xmltest.doc1", model).unwrap();
        catalog
            .add_physical_group(
                "pm1.g1",
                vec![
                    ColumnMetadata::new("e1", DataTypeName::String),
                    ColumnMetadata::new("e2", DataTypeName::Integer),
                ],
            )
            .unwrap();
        catalog
    }

    fn query(select: Vec<Expression>, from: &[&str], criteria: Option<Criteria>) -> Query {
        let mut query = Query::new(select, from.iter().map(|g| GroupSymbol::new(*g)).collect());
        query.criteria = criteria;
        query
    }

    fn wildcard() -> Expression {
        Expression::Wildcard(MultipleElementSymbol::all())
    }

    fn resolve(query: Query) -> ResolveResult<Query> {
        let catalog = catalog();
        let options = ResolverOptions::default();
        let mut adapter = MetadataAdapter::new(&catalog);
        let mut command = Command::Query(query);
        Resolver::new(&options).resolve(&mut command, &mut adapter)?;
        Ok(command.into_query().unwrap())
    }

    #[test]
    fn test_whole_document() {
        let resolved = resolve(query(vec![wildcard()], &["doc1"], None)).unwrap();
        assert_snapshot!(resolved.render(), @"SELECT xmltest.doc1.Catalogs FROM xmltest.doc1");

        let resolved = resolve(query(vec![Expression::element("doc1.xml")], &["doc1"], None)).unwrap();
        let root = resolved.select.symbols[0].as_element().unwrap();
        assert_eq!(root.data_type(), Some(DataTypeName::Xml));
        assert_eq!(root.metadata_id().unwrap().position, 0);
    }

    #[test]
    fn test_suffix_and_attribute_lookup() {
        let resolved = resolve(query(
            vec![Expression::element("Item.Name"), Expression::element("ItemID")],
            &["xmltest.doc1"],
            Some(Criteria::compare(
                Expression::element("Quantity"),
                CompareOp::Gt,
                Expression::constant("5"),
            )),
        ))
        .unwrap();
        let names: Vec<_> = resolved
            .select
            .projected_symbols()
            .iter()
            .map(|symbol| symbol.render())
            .collect();
        assert_eq!(
            names,
            [
                "xmltest.doc1.Catalogs.Catalog.Items.Item.Name",
                "xmltest.doc1.Catalogs.Catalog.Items.Item.@ItemID",
            ]
        );
        let criteria = resolved.criteria.unwrap().into_compare().unwrap();
        assert_eq!(criteria.right.data_type(), Some(DataTypeName::Integer));

        let err = resolve(query(vec![Expression::element("Name")], &["doc1"], None)).unwrap_err();
        assert!(matches!(err, ResolveError::AmbiguousElement { candidates, .. } if candidates.len() == 2));

        let err = resolve(query(vec![Expression::element("Price")], &["doc1"], None)).unwrap_err();
        assert!(matches!(err, ResolveError::ElementNotFound(_)));
    }

    #[test]
    fn test_disallowed_clauses() {
        let mut grouped = query(vec![Expression::element("Quantity")], &["doc1"], None);
        grouped.group_by = Some(GroupBy {
            symbols: vec![Expression::element("Quantity")],
        });
        assert!(matches!(
            resolve(grouped),
            Err(ResolveError::DisallowedClause { clause: "GROUP BY", .. })
        ));

        assert!(matches!(
            resolve(query(vec![wildcard()], &["doc1", "pm1.g1"], None)),
            Err(ResolveError::DisallowedClause { .. })
        ));
    }

    #[test]
    fn test_subquery_correlates_with_element_groups() {
        let subquery = query(
            vec![Expression::element("e1")],
            &["pm1.g1"],
            Some(Criteria::compare(
                Expression::element("e2"),
                CompareOp::Eq,
                Expression::element("Item.Quantity"),
            )),
        );
        let resolved = resolve(query(
            vec![wildcard()],
            &["doc1"],
            Some(Criteria::SubquerySet(SubquerySetCriteria {
                expression: Expression::element("Item.Name"),
                command: Box::new(Command::Query(subquery)),
                negated: false,
            })),
        ))
        .unwrap();

        let criteria = resolved.criteria.unwrap().into_subquery_set().unwrap();
        let inner = criteria.command.into_query().unwrap();
        let correlated = inner.criteria.unwrap().into_compare().unwrap();
        let element = correlated.right.as_element().unwrap();
        assert!(element.is_external);
        assert_eq!(element.name, "Catalogs.Catalog.Items.Item.Quantity");
        assert_eq!(element.data_type(), Some(DataTypeName::Integer));
    }
}
