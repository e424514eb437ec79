use fedquery_ast::command::{Delete, Update};
use fedquery_catalog::MetadataAdapter;

use super::Resolver;
use crate::error::{ResolveError, ResolveResult};
use crate::scope::GroupContext;
use crate::symbol;

impl Resolver<'_> {
    pub(super) fn resolve_update(
        &self,
        update: &mut Update,
        adapter: &MetadataAdapter<'_>,
        external: &GroupContext<'_>,
    ) -> ResolveResult<()> {
        symbol::resolve_group(&mut update.group, adapter)?;
        let target = GroupContext::new(vec![update.group.clone()]);
        let scope = external.child(vec![update.group.clone()]);
        let converter = self.converter(adapter);

        for index in 0..update.changes.len() {
            let change = &mut update.changes[index];
            symbol::resolve_element(&mut change.symbol, adapter, &target)?;
            self.resolve_expression(&mut change.value, adapter, &scope)?;
            if let Some(ty) = change.symbol.data_type() {
                converter.convert(&mut change.value, ty)?;
            }
            let symbol = &update.changes[index].symbol;
            if update.changes[..index]
                .iter()
                .any(|earlier| earlier.symbol.metadata_id() == symbol.metadata_id())
            {
                return Err(ResolveError::DuplicateSymbol {
                    symbol: symbol.name.to_string(),
                    context: format!("UPDATE {}", update.group.name),
                });
            }
        }
        if let Some(criteria) = &mut update.criteria {
            self.resolve_criteria(criteria, adapter, &scope)?;
        }
        Ok(())
    }

    pub(super) fn resolve_delete(
        &self,
        delete: &mut Delete,
        adapter: &MetadataAdapter<'_>,
        external: &GroupContext<'_>,
    ) -> ResolveResult<()> {
        symbol::resolve_group(&mut delete.group, adapter)?;
        if let Some(criteria) = &mut delete.criteria {
            let scope = external.child(vec![delete.group.clone()]);
            self.resolve_criteria(criteria, adapter, &scope)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use fedquery_ast::command::SetClause;
    use fedquery_ast::criteria::CompareOp;
    use fedquery_ast::render::Render;
    use fedquery_ast::{Command, Criteria, Expression, GroupSymbol};
    use fedquery_catalog::memory::MemoryCatalog;
    use fedquery_catalog::metadata::ColumnMetadata;
    use fedquery_common::data_type::DataTypeName;
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
                    ColumnMetadata::new("e3", DataTypeName::Boolean),
                ],
            )
            .unwrap();
        catalog
            .add_physical_group("pm1.g2", vec![ColumnMetadata::new("e1", DataTypeName::String)])
            .unwrap();
        catalog
    }

    fn resolve(command: &mut Command) -> ResolveResult<()> {
        let catalog = catalog();
        let options = ResolverOptions::default();
        let mut adapter = MetadataAdapter::new(&catalog);
        Resolver::new(&options).resolve(command, &mut adapter).map(drop)
    }

    fn update(changes: Vec<SetClause>, criteria: Option<Criteria>) -> Command {
        Command::Update(Update {
            group: GroupSymbol::new("g1"),
            changes,
            criteria,
        })
    }

    #[test]
    fn test_update() {
        let mut command = update(
            vec![
                SetClause::new("e2", Expression::constant("5")),
                SetClause::new("e3", Expression::positional_reference(0)),
            ],
            Some(Criteria::compare(
                Expression::element("e1"),
                CompareOp::Eq,
                Expression::constant("a"),
            )),
        );
        resolve(&mut command).unwrap();
        assert_snapshot!(
            command.render(),
            @"UPDATE pm1.g1 SET pm1.g1.e2 = 5, pm1.g1.e3 = ? WHERE pm1.g1.e1 = 'a'"
        );
        let changes = &command.as_update().unwrap().changes;
        assert_eq!(changes[1].value.data_type(), Some(DataTypeName::Boolean));
    }

    #[test]
    fn test_set_symbols_resolve_against_the_target() {
        let mut command = update(
            vec![SetClause::new("g2.e1", Expression::constant("x"))],
            None,
        );
        assert!(matches!(
            resolve(&mut command),
            Err(ResolveError::ElementNotFound(_))
        ));

        let mut command = update(
            vec![
                SetClause::new("e2", Expression::constant(1)),
                SetClause::new("pm1.g1.E2", Expression::constant(2)),
            ],
            None,
        );
        assert!(matches!(
            resolve(&mut command),
            Err(ResolveError::DuplicateSymbol { .. })
        ));
    }

    #[test]
    fn test_delete() {
        let mut command = Command::Delete(Delete {
            group: GroupSymbol::new("g2"),
            criteria: Some(Criteria::compare(
                Expression::element("e1"),
                CompareOp::Ne,
                Expression::null(),
            )),
        });
        resolve(&mut command).unwrap();
        assert_snapshot!(command.render(), @"DELETE FROM pm1.g2 WHERE pm1.g2.e1 <> null");

        let mut command = Command::Delete(Delete {
            group: GroupSymbol::new("g3"),
            criteria: None,
        });
        assert!(matches!(
            resolve(&mut command),
            Err(ResolveError::GroupNotFound(_))
        ));
    }
}
