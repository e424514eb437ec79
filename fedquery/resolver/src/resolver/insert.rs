use fedquery_ast::command::Insert;
use fedquery_ast::render::Render;
use fedquery_ast::{Command, ElementSymbol, Expression};
use fedquery_catalog::MetadataAdapter;
use fedquery_catalog::metadata::ColumnMetadata;
use fedquery_catalog::temp::{TempGroup, TempGroupKind};
use tracing::debug;

use super::{Resolver, column_type, temp_columns};
use crate::error::{ResolveError, ResolveResult};
use crate::scope::GroupContext;
use crate::symbol;

impl Resolver<'_> {
    pub(super) fn resolve_insert(
        &self,
        insert: &mut Insert,
        adapter: &mut MetadataAdapter<'_>,
        external: &GroupContext<'_>,
    ) -> ResolveResult<()> {
        if let Some(query) = &mut insert.query {
            if matches!(&**query, Command::Query(select) if select.into.is_some()) {
                return Err(ResolveError::DisallowedClause {
                    clause: "INTO",
                    context: "the query of an INSERT",
                });
            }
            self.resolve_subcommand(query, adapter, external)?;
        }
        for value in &mut insert.values {
            self.resolve_expression(value, adapter, external)?;
        }
        let context = format!("INSERT INTO {}", insert.group.name);

        if !symbol::try_resolve_group(&mut insert.group, adapter)? {
            if !self.options.is_implicit_temp(insert.group.lookup_name()) {
                return Err(ResolveError::GroupNotFound(
                    insert.group.lookup_name().to_string(),
                ));
            }
            let columns = implicit_temp_columns(insert, &context)?;
            debug!(group = %insert.group.name, columns = columns.len(), "implicit temp table");
            let id = adapter.temp_mut().insert(TempGroup::new(
                insert.group.name.clone(),
                TempGroupKind::TempTable,
                columns,
            ))?;
            insert.group.set_metadata_id(id);
        }
        let id = insert
            .group
            .metadata_id()
            .cloned()
            .ok_or_else(|| ResolveError::GroupNotFound(insert.group.name.to_string()))?;

        if insert.variables.is_empty() {
            insert.variables = adapter
                .columns(&id)?
                .into_iter()
                .filter(|(_, column)| column.updatable)
                .map(|(element_id, column)| {
                    let mut variable = ElementSymbol::new(column.name.clone());
                    variable.bind(insert.group.clone(), element_id, column.data_type);
                    variable
                })
                .collect();
        } else {
            let target = GroupContext::new(vec![insert.group.clone()]);
            for index in 0..insert.variables.len() {
                symbol::resolve_element(&mut insert.variables[index], adapter, &target)?;
                let variable = &insert.variables[index];
                if insert.variables[..index]
                    .iter()
                    .any(|earlier| earlier.metadata_id() == variable.metadata_id())
                {
                    return Err(ResolveError::DuplicateSymbol {
                        symbol: variable.name.to_string(),
                        context,
                    });
                }
            }
        }

        match &insert.query {
            Some(query) => {
                let projected = query.projected_symbols();
                check_arity(&context, insert.variables.len(), projected.len())?;
                let catalog = adapter.catalog();
                for (variable, symbol) in insert.variables.iter().zip(&projected) {
                    let (Some(from), Some(to)) = (symbol.data_type(), variable.data_type()) else {
                        continue;
                    };
                    if from != to && !catalog.is_implicit_conversion(from, to) {
                        return Err(ResolveError::NoImplicitConversion {
                            expression: symbol.render(),
                            from,
                            to,
                        });
                    }
                }
            }
            None => {
                check_arity(&context, insert.variables.len(), insert.values.len())?;
                let converter = self.converter(adapter);
                for (variable, value) in insert.variables.iter().zip(&mut insert.values) {
                    if let Some(ty) = variable.data_type() {
                        converter.convert(value, ty)?;
                    }
                }
            }
        }
        Ok(())
    }
}

fn check_arity(context: &str, expected: usize, actual: usize) -> ResolveResult<()> {
    if expected == actual {
        Ok(())
    } else {
        Err(ResolveError::ArityMismatch {
            context: context.to_string(),
            expected,
            actual,
        })
    }
}

/// Columns of a temp table defined by inserting into it: named by the column list or, for an
/// insert from a query without one, by the projected symbols. Types come from the inserted
/// values.
fn implicit_temp_columns(insert: &Insert, context: &str) -> ResolveResult<Vec<ColumnMetadata>> {
    let sources: Vec<Expression> = match &insert.query {
        Some(query) if insert.variables.is_empty() => {
            return temp_columns(&query.projected_symbols(), context);
        }
        Some(query) => query.projected_symbols(),
        None if insert.variables.is_empty() => {
            return Err(ResolveError::InvalidTempTable {
                name: insert.group.name.to_string(),
                reason: "a column list is required to define it from values".to_string(),
            });
        }
        None => insert.values.clone(),
    };
    check_arity(context, insert.variables.len(), sources.len())?;
    let mut columns: Vec<ColumnMetadata> = Vec::with_capacity(sources.len());
    for (variable, source) in insert.variables.iter().zip(&sources) {
        let name = variable.short_name();
        if columns.iter().any(|c| c.name.eq_ignore_ascii_case(name)) {
            return Err(ResolveError::DuplicateSymbol {
                symbol: name.to_string(),
                context: context.to_string(),
            });
        }
        columns.push(ColumnMetadata::new(name, column_type(source.data_type())));
    }
    Ok(columns)
}

#[cfg(test)]
mod tests {
    use fedquery_ast::GroupSymbol;
    use fedquery_ast::command::Query;
    use fedquery_catalog::memory::MemoryCatalog;
    use fedquery_common::data_type::DataTypeName;
    use insta::assert_snapshot;

    use super::*;
    use crate::options::ResolverOptions;
    use crate::resolver::Resolution;

    fn catalog() -> MemoryCatalog {
        let mut catalog = MemoryCatalog::new();
        catalog
            .add_physical_group(
                "pm1.g1",
                vec![
                    ColumnMetadata::new("e1", DataTypeName::Integer),
                    ColumnMetadata::new("e2", DataTypeName::String),
                    ColumnMetadata::new("e3", DataTypeName::Long).read_only(),
                ],
            )
            .unwrap();
        catalog
    }

    fn resolve(command: &mut Command, catalog: &MemoryCatalog) -> ResolveResult<Resolution> {
        let options = ResolverOptions::default();
        let mut adapter = MetadataAdapter::new(catalog);
        Resolver::new(&options).resolve(command, &mut adapter)
    }

    #[test]
    fn test_default_column_list() {
        let catalog = catalog();
        let mut command = Command::Insert(Insert::values(
            GroupSymbol::new("g1"),
            Vec::new(),
            vec![Expression::constant(5), Expression::constant("abc")],
        ));
        let resolution = resolve(&mut command, &catalog).unwrap();
        assert_snapshot!(
            command.render(),
            @"INSERT INTO pm1.g1 (pm1.g1.e1, pm1.g1.e2) VALUES (5, 'abc')"
        );
        let keys: Vec<_> = resolution.variable_values.keys().map(|k| k.as_str()).collect();
        assert_eq!(keys, ["CHANGING.e1", "INPUTS.e1", "CHANGING.e2", "INPUTS.e2"]);
    }

    #[test]
    fn test_values_are_converted() {
        let catalog = catalog();
        let mut command = Command::Insert(Insert::values(
            GroupSymbol::new("g1"),
            vec![ElementSymbol::new("e2"), ElementSymbol::new("e1")],
            vec![Expression::constant(1), Expression::positional_reference(0)],
        ));
        resolve(&mut command, &catalog).unwrap();
        let insert = command.as_insert().unwrap();
        assert_eq!(insert.values[0].data_type(), Some(DataTypeName::String));
        assert_eq!(insert.values[1].data_type(), Some(DataTypeName::Integer));
    }

    #[test]
    fn test_arity_and_duplicates() {
        let catalog = catalog();
        let mut command = Command::Insert(Insert::values(
            GroupSymbol::new("g1"),
            Vec::new(),
            vec![
                Expression::constant(5),
                Expression::constant("abc"),
                Expression::constant(1),
            ],
        ));
        assert!(matches!(
            resolve(&mut command, &catalog),
            Err(ResolveError::ArityMismatch { expected: 2, actual: 3, .. })
        ));

        let mut command = Command::Insert(Insert::values(
            GroupSymbol::new("g1"),
            vec![ElementSymbol::new("e1"), ElementSymbol::new("g1.E1")],
            vec![Expression::constant(1), Expression::constant(2)],
        ));
        assert!(matches!(
            resolve(&mut command, &catalog),
            Err(ResolveError::DuplicateSymbol { .. })
        ));
    }

    #[test]
    fn test_implicit_temp_table() {
        let catalog = catalog();
        let options = ResolverOptions::default();
        let mut adapter = MetadataAdapter::new(&catalog);
        let resolver = Resolver::new(&options);

        let mut command = Command::Insert(Insert::values(
            GroupSymbol::new("#t"),
            vec![ElementSymbol::new("a"), ElementSymbol::new("b")],
            vec![Expression::constant(1), Expression::null()],
        ));
        resolver.resolve(&mut command, &mut adapter).unwrap();
        let temp = adapter.temp().get("#t").unwrap();
        let types: Vec<_> = temp.columns.iter().map(|c| c.data_type).collect();
        assert_eq!(types, [DataTypeName::Integer, DataTypeName::String]);

        let mut command = Command::Insert(Insert::query(
            GroupSymbol::new("#u"),
            Vec::new(),
            Command::Query(Query::new(
                vec![Expression::element("e3")],
                vec![GroupSymbol::new("g1")],
            )),
        ));
        resolver.resolve(&mut command, &mut adapter).unwrap();
        assert_eq!(
            adapter.temp().get("#u").unwrap().columns[0].data_type,
            DataTypeName::Long
        );

        let mut command = Command::Insert(Insert::values(
            GroupSymbol::new("#v"),
            Vec::new(),
            vec![Expression::constant(1)],
        ));
        assert!(matches!(
            resolver.resolve(&mut command, &mut adapter),
            Err(ResolveError::InvalidTempTable { .. })
        ));
    }

    #[test]
    fn test_query_source_types() {
        let catalog = catalog();
        let mut command = Command::Insert(Insert::query(
            GroupSymbol::new("g1"),
            vec![ElementSymbol::new("e1")],
            Command::Query(Query::new(
                vec![Expression::element("e2")],
                vec![GroupSymbol::new("g1")],
            )),
        ));
        assert!(matches!(
            resolve(&mut command, &catalog),
            Err(ResolveError::NoImplicitConversion { .. })
        ));
    }
}
