use fedquery_ast::command::SetQuery;
use fedquery_ast::Command;
use fedquery_catalog::MetadataAdapter;
use tracing::debug;

use super::Resolver;
use crate::error::{ResolveError, ResolveResult};
use crate::reconcile;
use crate::scope::GroupContext;

impl Resolver<'_> {
    pub(super) fn resolve_set_query(
        &self,
        set_query: &mut SetQuery,
        adapter: &mut MetadataAdapter<'_>,
        external: &GroupContext<'_>,
    ) -> ResolveResult<()> {
        for branch in [&mut *set_query.left, &mut *set_query.right] {
            if matches!(branch, Command::Query(query) if query.into.is_some()) {
                return Err(ResolveError::DisallowedClause {
                    clause: "INTO",
                    context: "a set query branch",
                });
            }
            self.resolve_subcommand(branch, adapter, external)?;
        }
        let catalog = adapter.catalog();
        let context = set_query.op.keyword();
        let types = reconcile::common_types(
            &set_query.left.projected_symbols(),
            &set_query.right.projected_symbols(),
            catalog,
            self.options.resolve_null_literals,
            context,
        )?;
        debug!(op = context, types = ?types, "set query column types reconciled");
        reconcile::apply_projected_types(&mut set_query.left, &types, catalog)?;
        reconcile::apply_projected_types(&mut set_query.right, &types, catalog)?;
        set_query.projected_types = types;

        let projected = set_query.left.projected_symbols();
        if let Some(order_by) = &mut set_query.order_by {
            let unrelated = Some("in a set query");
            self.resolve_order_by(order_by, &projected, unrelated, adapter, external, None)?;
        }
        if let Some(limit) = &mut set_query.limit {
            self.resolve_limit(limit, adapter, external)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use fedquery_ast::command::{OrderByItem, Query, SetOperation};
    use fedquery_ast::render::Render;
    use fedquery_ast::{Expression, GroupSymbol};
    use fedquery_catalog::memory::MemoryCatalog;
    use fedquery_catalog::metadata::ColumnMetadata;
    use fedquery_common::data_type::DataTypeName;
    use insta::assert_snapshot;

    use super::*;
    use crate::options::ResolverOptions;

    fn catalog() -> MemoryCatalog {
        let mut catalog = MemoryCatalog::new();
        catalog
            .add_physical_group("g1", vec![ColumnMetadata::new("e1", DataTypeName::Integer)])
            .unwrap();
        catalog
            .add_physical_group(
                "g2",
                vec![
                    ColumnMetadata::new("e2", DataTypeName::String),
                    ColumnMetadata::new("e3", DataTypeName::Long),
                ],
            )
            .unwrap();
        catalog
    }

    fn select(symbol: Expression, group: &str) -> Command {
        Command::Query(Query::new(vec![symbol], vec![GroupSymbol::new(group)]))
    }

    fn resolve(command: &mut Command, options: &ResolverOptions) -> ResolveResult<()> {
        let catalog = catalog();
        let mut adapter = MetadataAdapter::new(&catalog);
        Resolver::new(options).resolve(command, &mut adapter).map(drop)
    }

    #[test]
    fn test_branches_take_the_common_type() {
        let mut command = Command::SetQuery(SetQuery::new(
            SetOperation::Union,
            false,
            select(Expression::element("e1"), "g1"),
            select(Expression::element("e3"), "g2"),
        ));
        resolve(&mut command, &ResolverOptions::default()).unwrap();
        assert_snapshot!(
            command.render(),
            @"SELECT convert(g1.e1, long) AS e1 FROM g1 UNION SELECT g2.e3 FROM g2"
        );
        assert_eq!(command.as_set_query().unwrap().projected_types, [DataTypeName::Long]);
    }

    #[test]
    fn test_null_columns() {
        let union = || {
            Command::SetQuery(SetQuery::new(
                SetOperation::Union,
                true,
                select(Expression::null(), "g1"),
                select(Expression::null(), "g2"),
            ))
        };
        let mut command = union();
        resolve(&mut command, &ResolverOptions::default()).unwrap();
        assert_eq!(command.as_set_query().unwrap().projected_types, [DataTypeName::Null]);

        let options = ResolverOptions {
            resolve_null_literals: true,
            ..ResolverOptions::default()
        };
        let mut command = union();
        resolve(&mut command, &options).unwrap();
        assert_eq!(
            command.projected_symbols()[0].data_type(),
            Some(DataTypeName::String)
        );
    }

    #[test]
    fn test_arity_and_order_by() {
        let mut command = Command::SetQuery(SetQuery::new(
            SetOperation::Except,
            false,
            select(Expression::element("e1"), "g1"),
            Command::Query(Query::new(
                vec![Expression::element("e2"), Expression::element("e3")],
                vec![GroupSymbol::new("g2")],
            )),
        ));
        assert!(matches!(
            resolve(&mut command, &ResolverOptions::default()),
            Err(ResolveError::ArityMismatch { .. })
        ));

        let mut set_query = SetQuery::new(
            SetOperation::Union,
            false,
            select(Expression::element("e1"), "g1"),
            select(Expression::element("e3"), "g2"),
        );
        set_query.order_by = Some(fedquery_ast::command::OrderBy {
            items: vec![OrderByItem::new(Expression::element("e1"))],
        });
        let mut command = Command::SetQuery(set_query);
        resolve(&mut command, &ResolverOptions::default()).unwrap();
        let order_by = command.as_set_query().unwrap().order_by.as_ref().unwrap();
        assert_eq!(order_by.items[0].position, Some(0));
    }
}
