use fedquery_ast::command::{CreateTempTable, DropTempTable};
use fedquery_catalog::MetadataAdapter;
use fedquery_catalog::metadata::ColumnMetadata;
use fedquery_catalog::temp::{TempGroup, TempGroupKind};
use smol_str::SmolStr;
use tracing::debug;

use super::Resolver;
use crate::error::{ResolveError, ResolveResult};

impl Resolver<'_> {
    pub(super) fn resolve_create_temp_table(
        &self,
        create: &mut CreateTempTable,
        adapter: &mut MetadataAdapter<'_>,
    ) -> ResolveResult<()> {
        let name = create.table.name.clone();
        let invalid = |reason: &str| ResolveError::InvalidTempTable {
            name: name.to_string(),
            reason: reason.to_string(),
        };
        if name.contains('.') {
            return Err(invalid("temp table names cannot be qualified"));
        }
        let catalog = adapter.catalog();
        if catalog.get_group(&name)?.is_some() || catalog.get_procedure(&name)?.is_some() {
            return Err(invalid("the name is already used by the catalog"));
        }
        if adapter.temp().get(&name).is_some() {
            return Err(invalid("a temp group with this name is already in scope"));
        }

        let mut columns: Vec<ColumnMetadata> = Vec::with_capacity(create.columns.len());
        for definition in &create.columns {
            if columns
                .iter()
                .any(|c| c.name.eq_ignore_ascii_case(&definition.name))
            {
                return Err(ResolveError::DuplicateSymbol {
                    symbol: definition.name.to_string(),
                    context: format!("CREATE LOCAL TEMPORARY TABLE {name}"),
                });
            }
            let mut column = ColumnMetadata::new(definition.name.clone(), definition.data_type);
            if !definition.nullable {
                column = column.not_null();
            }
            if definition.auto_increment {
                column = column.auto_increment();
            }
            columns.push(column);
        }

        let mut primary_key: Vec<SmolStr> = Vec::with_capacity(create.primary_key.len());
        for key in &create.primary_key {
            let column = columns
                .iter_mut()
                .find(|c| c.name.eq_ignore_ascii_case(key))
                .ok_or_else(|| ResolveError::ElementNotFound(key.to_string()))?;
            if primary_key.contains(&column.name) {
                return Err(ResolveError::DuplicateSymbol {
                    symbol: key.to_string(),
                    context: format!("the primary key of {name}"),
                });
            }
            column.nullable = false;
            primary_key.push(column.name.clone());
        }

        let group =
            TempGroup::new(name.clone(), TempGroupKind::TempTable, columns).with_primary_key(primary_key);
        let id = adapter.temp_mut().insert(group)?;
        create.table.set_metadata_id(id);
        debug!(table = %name, columns = create.columns.len(), "temp table created");
        Ok(())
    }

    pub(super) fn resolve_drop_temp_table(
        &self,
        drop: &mut DropTempTable,
        adapter: &MetadataAdapter<'_>,
    ) -> ResolveResult<()> {
        let name = drop.table.lookup_name();
        let temp = adapter
            .temp()
            .get(name)
            .ok_or_else(|| ResolveError::GroupNotFound(name.to_string()))?;
        if temp.kind != TempGroupKind::TempTable {
            return Err(ResolveError::InvalidTempTable {
                name: name.to_string(),
                reason: "only temp tables can be dropped".to_string(),
            });
        }
        let id = temp.id();
        drop.table.name = temp.name.clone();
        drop.table.set_metadata_id(id);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use fedquery_ast::command::ColumnDefinition;
    use fedquery_ast::render::Render;
    use fedquery_ast::{Command, GroupSymbol};
    use fedquery_catalog::memory::MemoryCatalog;
    use fedquery_common::data_type::DataTypeName;
    use insta::assert_snapshot;

    use super::*;
    use crate::options::ResolverOptions;

    fn catalog() -> MemoryCatalog {
        let mut catalog = MemoryCatalog::new();
        catalog
            .add_physical_group("pm1.g1", vec![ColumnMetadata::new("e1", DataTypeName::String)])
            .unwrap();
        catalog
    }

    fn create(name: &str, columns: &[&str], primary_key: &[&str]) -> Command {
        Command::Create(CreateTempTable {
            table: GroupSymbol::new(name),
            columns: columns
                .iter()
                .map(|c| ColumnDefinition::new(*c, DataTypeName::Integer))
                .collect(),
            primary_key: primary_key.iter().map(|k| (*k).into()).collect(),
        })
    }

    #[test]
    fn test_create_and_drop() {
        let catalog = catalog();
        let options = ResolverOptions::default();
        let resolver = Resolver::new(&options);
        let mut adapter = MetadataAdapter::new(&catalog);

        let mut command = create("#t", &["a", "b"], &["A"]);
        resolver.resolve(&mut command, &mut adapter).unwrap();
        assert_snapshot!(
            command.render(),
            @"CREATE LOCAL TEMPORARY TABLE #t (a integer, b integer, PRIMARY KEY(A))"
        );
        let temp = adapter.temp().get("#T").unwrap();
        assert_eq!(temp.primary_key, ["a"]);
        assert!(!temp.columns[0].nullable);
        assert!(temp.columns[1].nullable);

        let mut command = create("#t", &["c"], &[]);
        assert!(matches!(
            resolver.resolve(&mut command, &mut adapter),
            Err(ResolveError::InvalidTempTable { .. })
        ));

        let mut command = Command::Drop(DropTempTable {
            table: GroupSymbol::new("#T"),
        });
        resolver.resolve(&mut command, &mut adapter).unwrap();
        assert_snapshot!(command.render(), @"DROP TABLE #t");
    }

    #[test]
    fn test_invalid_definitions() {
        let catalog = catalog();
        let options = ResolverOptions::default();
        let resolver = Resolver::new(&options);
        let mut adapter = MetadataAdapter::new(&catalog);

        for command in [
            create("pm1.t", &["a"], &[]),
            create("pm1.g1", &["a"], &[]),
        ] {
            let mut command = command;
            assert!(matches!(
                resolver.resolve(&mut command, &mut adapter),
                Err(ResolveError::InvalidTempTable { .. })
            ));
        }

        let mut command = create("#t", &["a", "A"], &[]);
        assert!(matches!(
            resolver.resolve(&mut command, &mut adapter),
            Err(ResolveError::DuplicateSymbol { .. })
        ));

        let mut command = create("#t", &["a"], &["b"]);
        assert!(matches!(
            resolver.resolve(&mut command, &mut adapter),
            Err(ResolveError::ElementNotFound(_))
        ));

        let mut command = Command::Drop(DropTempTable {
            table: GroupSymbol::new("g1"),
        });
        assert!(matches!(
            resolver.resolve(&mut command, &mut adapter),
            Err(ResolveError::GroupNotFound(_))
        ));
    }
}
