//! Reconciliation of the projected column types of set operation branches.
//!
//! Each column of a set operation takes the common type of that column in both branches. The
//! type is then pushed down into every branch, recursively through nested set operations, so
//! that each branch projects exactly the reconciled types.

use fedquery_ast::command::{Command, OrderBy, Query};
use fedquery_ast::Expression;
use fedquery_catalog::provider::CatalogProvider;
use fedquery_common::data_type::DataTypeName;

use crate::convert::Converter;
use crate::error::{ResolveError, ResolveResult};

/// Computes the column types of a set operation whose branches project `left` and `right`.
///
/// A column of untyped `NULL` literals in both branches becomes `string` when
/// `resolve_null_literals` is set and stays `null` otherwise.
pub fn common_types(
    left: &[Expression],
    right: &[Expression],
    catalog: &dyn CatalogProvider,
    resolve_null_literals: bool,
    context: &str,
) -> ResolveResult<Vec<DataTypeName>> {
    if left.len() != right.len() {
        return Err(ResolveError::ArityMismatch {
            context: format!("the right branch of {context}"),
            expected: left.len(),
            actual: right.len(),
        });
    }
    left.iter()
        .zip(right)
        .enumerate()
        .map(|(index, (left, right))| {
            let left = left.data_type().unwrap_or(DataTypeName::Null);
            let right = right.data_type().unwrap_or(DataTypeName::Null);
            let common = if left == right {
                left
            } else {
                catalog
                    .common_type(&[left, right])
                    .ok_or_else(|| ResolveError::NoCommonType {
                        context: format!("column {} of {context}", index + 1),
                        types: vec![left, right],
                    })?
            };
            Ok(match common {
                DataTypeName::Null if resolve_null_literals => DataTypeName::String,
                common => common,
            })
        })
        .collect()
}

/// Makes `command` project `types`, converting the projected symbols whose type differs.
///
/// A branch whose own ORDER BY sorts by a column that would change type is rejected: its
/// ordering was defined on the unconverted values.
pub fn apply_projected_types(
    command: &mut Command,
    types: &[DataTypeName],
    catalog: &dyn CatalogProvider,
) -> ResolveResult<()> {
    match command {
        Command::Query(query) => apply_to_query(query, types, catalog),
        Command::SetQuery(set_query) => {
            let current: Vec<DataTypeName> = if set_query.projected_types.is_empty() {
                projected_types(&set_query.left.projected_symbols())
            } else {
                set_query.projected_types.clone()
            };
            check_order_by(set_query.order_by.as_ref(), &current, types)?;
            apply_projected_types(&mut set_query.left, types, catalog)?;
            apply_projected_types(&mut set_query.right, types, catalog)?;
            set_query.projected_types = types.to_vec();
            Ok(())
        }
        _ => Ok(()),
    }
}

fn apply_to_query(
    query: &mut Query,
    types: &[DataTypeName],
    catalog: &dyn CatalogProvider,
) -> ResolveResult<()> {
    let projected = query.select.projected_symbols();
    let current = projected_types(&projected);
    let retyped = retyped_positions(&current, types);
    if retyped.is_empty() {
        return Ok(());
    }
    check_order_by(query.order_by.as_ref(), &current, types)?;
    if query
        .select
        .symbols
        .iter()
        .any(|symbol| matches!(symbol, Expression::Wildcard(_)))
    {
        query.select.symbols = projected;
    }
    let converter = Converter::new(catalog, false);
    for position in retyped {
        let target = types[position];
        let symbol = &mut query.select.symbols[position];
        match symbol {
            Expression::Element(element) => {
                let name = element.short_name().to_owned();
                let mut converted = Expression::Element(element.clone());
                converter.convert(&mut converted, target)?;
                *symbol = Expression::alias(name, converted);
            }
            Expression::ExpressionSymbol(named) => converter.convert(&mut named.expression, target)?,
            Expression::Alias(alias) => converter.convert(&mut alias.symbol, target)?,
            other => converter.convert(other, target)?,
        }
    }
    Ok(())
}

fn projected_types(projected: &[Expression]) -> Vec<DataTypeName> {
    projected
        .iter()
        .map(|symbol| symbol.data_type().unwrap_or(DataTypeName::Null))
        .collect()
}

fn retyped_positions(current: &[DataTypeName], types: &[DataTypeName]) -> Vec<usize> {
    current
        .iter()
        .zip(types)
        .enumerate()
        .filter(|(_, (from, to))| from != to)
        .map(|(position, _)| position)
        .collect()
}

/// Rejects an ORDER BY that sorts by a column whose type changes from `current` to `types`.
fn check_order_by(
    order_by: Option<&OrderBy>,
    current: &[DataTypeName],
    types: &[DataTypeName],
) -> ResolveResult<()> {
    let Some(order_by) = order_by else {
        return Ok(());
    };
    let retyped = retyped_positions(current, types);
    for item in &order_by.items {
        if let Some(position) = item.position.filter(|p| retyped.contains(p)) {
            return Err(ResolveError::OrderByRetype {
                position: position + 1,
                from: current[position],
                to: types[position],
            });
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use fedquery_ast::command::{OrderByItem, SetOperation, SetQuery};
    use fedquery_ast::render::Render;
    use fedquery_ast::{ElementSymbol, GroupSymbol};
    use fedquery_catalog::memory::MemoryCatalog;
    use insta::assert_snapshot;

    use super::*;

    fn typed(name: &str, data_type: DataTypeName) -> Expression {
        Expression::Element(ElementSymbol::typed(name, data_type))
    }

    #[test]
    fn test_common_types() {
        let catalog = MemoryCatalog::new();
        let left = [typed("a", DataTypeName::Integer), Expression::null()];
        let right = [typed("b", DataTypeName::Long), Expression::null()];
        assert_eq!(
            common_types(&left, &right, &catalog, false, "UNION").unwrap(),
            [DataTypeName::Long, DataTypeName::Null]
        );
        assert_eq!(
            common_types(&left, &right, &catalog, true, "UNION").unwrap(),
            [DataTypeName::Long, DataTypeName::String]
        );
        assert!(matches!(
            common_types(&left, &right[..1], &catalog, false, "UNION"),
            Err(ResolveError::ArityMismatch { expected: 2, actual: 1, .. })
        ));
    }

    #[test]
    fn test_apply_converts_and_aliases() {
        let catalog = MemoryCatalog::new();
        let mut command = Command::Query(Query::new(
            vec![
                typed("g.a", DataTypeName::Integer),
                Expression::alias("b", typed("g.b", DataTypeName::String)),
            ],
            vec![GroupSymbol::new("g")],
        ));
        apply_projected_types(
            &mut command,
            &[DataTypeName::Long, DataTypeName::String],
            &catalog,
        )
        .unwrap();
        assert_snapshot!(command.render(), @"SELECT convert(g.a, long) AS a, g.b AS b FROM g");
    }

    #[test]
    fn test_nested_set_queries_record_types() {
        let catalog = MemoryCatalog::new();
        let branch = |ty| Command::Query(Query::new(vec![typed("g.a", ty)], vec![GroupSymbol::new("g")]));
        let mut command = Command::SetQuery(SetQuery::new(
            SetOperation::Union,
            true,
            branch(DataTypeName::Short),
            branch(DataTypeName::Integer),
        ));
        apply_projected_types(&mut command, &[DataTypeName::Integer], &catalog).unwrap();
        let set_query = command.as_set_query().unwrap();
        assert_eq!(set_query.projected_types, [DataTypeName::Integer]);
        assert_eq!(
            set_query.left.projected_symbols()[0].data_type(),
            Some(DataTypeName::Integer)
        );
    }

    #[test]
    fn test_ordered_nested_set_query_is_not_retyped() {
        let catalog = MemoryCatalog::new();
        let branch = || {
            Command::Query(Query::new(
                vec![typed("g.a", DataTypeName::Integer)],
                vec![GroupSymbol::new("g")],
            ))
        };
        let mut set_query = SetQuery::new(SetOperation::Union, false, branch(), branch());
        set_query.projected_types = vec![DataTypeName::Integer];
        let mut item = OrderByItem::new(typed("g.a", DataTypeName::Integer));
        item.position = Some(0);
        set_query.order_by = Some(OrderBy { items: vec![item] });
        let mut command = Command::SetQuery(set_query);
        let err = apply_projected_types(&mut command, &[DataTypeName::Double], &catalog).unwrap_err();
        assert!(matches!(
            err,
            ResolveError::OrderByRetype {
                position: 1,
                from: DataTypeName::Integer,
                to: DataTypeName::Double,
            }
        ));
        // the branches are left as they were
        let set_query = command.as_set_query().unwrap();
        assert_eq!(
            set_query.left.projected_symbols()[0].data_type(),
            Some(DataTypeName::Integer)
        );
    }

    #[test]
    fn test_ordered_branch_is_not_retyped() {
        let catalog = MemoryCatalog::new();
        let mut item = OrderByItem::new(typed("g.a", DataTypeName::Integer));
        item.position = Some(0);
        let mut command = Command::Query(
            Query::new(vec![typed("g.a", DataTypeName::Integer)], vec![GroupSymbol::new("g")])
                .with_order_by(vec![item]),
        );
        let err = apply_projected_types(&mut command, &[DataTypeName::String], &catalog).unwrap_err();
        assert_snapshot!(
            err,
            @"order by of a set query branch uses column 1, which would change from integer to string"
        );
    }
}
