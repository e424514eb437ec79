use fedquery_ast::command::DynamicCommand;
use fedquery_ast::{ElementSymbol, Expression};
use fedquery_catalog::MetadataAdapter;
use fedquery_catalog::metadata::ColumnMetadata;
use fedquery_catalog::temp::{TempGroup, TempGroupKind};
use fedquery_common::constants::DVARS_GROUP;
use fedquery_common::data_type::DataTypeName;

use super::{Resolver, column_type};
use crate::error::{ResolveError, ResolveResult};
use crate::scope::GroupContext;
use crate::symbol;

impl Resolver<'_> {
    /// Resolves `EXECUTE IMMEDIATE`. The SQL text itself is only known when the command runs;
    /// what resolves now is the expression producing it, its declared columns, its `USING`
    /// bindings and its `INTO` target.
    pub(super) fn resolve_dynamic(
        &self,
        dynamic: &mut DynamicCommand,
        adapter: &mut MetadataAdapter<'_>,
        external: &GroupContext<'_>,
    ) -> ResolveResult<()> {
        self.resolve_expression(&mut dynamic.sql, adapter, external)?;
        self.converter(adapter)
            .convert(&mut dynamic.sql, DataTypeName::String)?;

        for (index, column) in dynamic.as_columns.iter().enumerate() {
            let name = column.short_name();
            if dynamic.as_columns[..index]
                .iter()
                .any(|earlier| earlier.short_name().eq_ignore_ascii_case(name))
            {
                return Err(ResolveError::DuplicateSymbol {
                    symbol: name.to_string(),
                    context: "EXECUTE IMMEDIATE ... AS".to_string(),
                });
            }
        }

        if !dynamic.using.is_empty() {
            let mut columns: Vec<ColumnMetadata> = Vec::with_capacity(dynamic.using.len());
            for clause in &mut dynamic.using {
                self.resolve_expression(&mut clause.value, adapter, external)?;
                let name = clause.symbol.short_name();
                if columns.iter().any(|c| c.name.eq_ignore_ascii_case(name)) {
                    return Err(ResolveError::DuplicateSymbol {
                        symbol: name.to_string(),
                        context: "EXECUTE IMMEDIATE ... USING".to_string(),
                    });
                }
                columns.push(ColumnMetadata::new(name, column_type(clause.value.data_type())));
            }
            let mut local = adapter.child();
            let id = local
                .temp_mut()
                .upsert(TempGroup::new(DVARS_GROUP, TempGroupKind::Parameters, columns));
            let scope = GroupContext::new(vec![symbol::bound_group(DVARS_GROUP, id)]);
            for clause in &mut dynamic.using {
                clause.symbol = ElementSymbol::new(clause.symbol.short_name());
                symbol::resolve_element(&mut clause.symbol, &local, &scope)?;
            }
        }

        if let Some(into) = &mut dynamic.into {
            if dynamic.as_columns.is_empty() {
                return Err(ResolveError::DisallowedClause {
                    clause: "INTO",
                    context: "a dynamic command without an AS column list",
                });
            }
            let projected: Vec<Expression> = dynamic
                .as_columns
                .iter()
                .cloned()
                .map(Expression::Element)
                .collect();
            self.resolve_into_target(into, &projected, adapter)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use fedquery_ast::command::SetClause;
    use fedquery_ast::render::Render;
    use fedquery_ast::{Command, GroupSymbol};
    use fedquery_catalog::memory::MemoryCatalog;
    use insta::assert_snapshot;

    use super::*;
    use crate::options::ResolverOptions;

    fn catalog() -> MemoryCatalog {
        let mut catalog = MemoryCatalog::new();
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

    fn dynamic(columns: &[(&str, DataTypeName)], into: Option<&str>) -> DynamicCommand {
        let mut dynamic = DynamicCommand::new(Expression::constant("select e1, e2 from pm1.g1"));
        dynamic.as_columns = columns
            .iter()
            .map(|(name, ty)| ElementSymbol::typed(*name, *ty))
            .collect();
        dynamic.into = into.map(GroupSymbol::new);
        dynamic
    }

    #[test]
    fn test_into_defines_temp_table() {
        let catalog = catalog();
        let options = ResolverOptions::default();
        let mut adapter = MetadataAdapter::new(&catalog);
        let mut command = Command::Dynamic(dynamic(
            &[("a", DataTypeName::String), ("b", DataTypeName::Integer)],
            Some("#t"),
        ));
        Resolver::new(&options).resolve(&mut command, &mut adapter).unwrap();
        assert_snapshot!(
            command.render(),
            @"EXECUTE IMMEDIATE 'select e1, e2 from pm1.g1' AS a string, b integer INTO #t"
        );
        let temp = adapter.temp().get("#t").unwrap();
        assert_eq!(temp.columns[1].data_type, DataTypeName::Integer);
    }

    #[test]
    fn test_using_binds_dvars() {
        let catalog = catalog();
        let options = ResolverOptions::default();
        let mut adapter = MetadataAdapter::new(&catalog);
        let mut statement = dynamic(&[], None);
        statement.sql = Expression::function(
            "concat",
            vec![
                Expression::constant("select * from pm1.g1 where e2 = "),
                Expression::constant(5),
            ],
        );
        statement.using = vec![SetClause::new("x", Expression::constant(5))];
        let mut command = Command::Dynamic(statement);
        Resolver::new(&options).resolve(&mut command, &mut adapter).unwrap();

        let dynamic = command.as_dynamic().unwrap();
        assert_eq!(dynamic.sql.data_type(), Some(DataTypeName::String));
        assert_eq!(dynamic.using[0].symbol.name, "DVARS.x");
        assert_eq!(dynamic.using[0].symbol.data_type(), Some(DataTypeName::Integer));
        assert!(adapter.temp().get(DVARS_GROUP).is_none());
    }

    #[test]
    fn test_invalid_clauses() {
        let catalog = catalog();
        let options = ResolverOptions::default();
        let resolver = Resolver::new(&options);

        let mut adapter = MetadataAdapter::new(&catalog);
        let mut command = Command::Dynamic(dynamic(&[], Some("#t")));
        assert!(matches!(
            resolver.resolve(&mut command, &mut adapter),
            Err(ResolveError::DisallowedClause { clause: "INTO", .. })
        ));

        let mut command = Command::Dynamic(dynamic(
            &[("a", DataTypeName::String), ("A", DataTypeName::Integer)],
            None,
        ));
        assert!(matches!(
            resolver.resolve(&mut command, &mut adapter),
            Err(ResolveError::DuplicateSymbol { .. })
        ));

        let mut command = Command::Dynamic(dynamic(&[("a", DataTypeName::Integer)], Some("g1")));
        assert!(matches!(
            resolver.resolve(&mut command, &mut adapter),
            Err(ResolveError::ArityMismatch { expected: 2, actual: 1, .. })
        ));
    }
}
