use fedquery_ast::command::{FromClause, FromList, Limit, OrderBy, Query, Select};
use fedquery_ast::expression::ExpressionSymbol;
use fedquery_ast::render::Render;
use fedquery_ast::{ElementSymbol, Expression, GroupSymbol};
use fedquery_catalog::MetadataAdapter;
use fedquery_catalog::temp::{TempGroup, TempGroupKind};
use fedquery_common::constants::EXPRESSION_SYMBOL_PREFIX;
use fedquery_common::data_type::DataTypeName;
use tracing::trace;

use super::{DocumentScope, Resolver, temp_columns};
use crate::error::{ResolveError, ResolveResult};
use crate::scope::GroupContext;
use crate::symbol;

impl Resolver<'_> {
    /// Resolves FROM first, then WHERE, GROUP BY, HAVING and the projection against the FROM
    /// groups, then ORDER BY and LIMIT, and finally the INTO target.
    pub(super) fn resolve_query(
        &self,
        query: &mut Query,
        adapter: &mut MetadataAdapter<'_>,
        external: &GroupContext<'_>,
    ) -> ResolveResult<()> {
        {
            let mut local = adapter.child();
            let groups = match &mut query.from {
                Some(from) => self.resolve_from(from, &mut local, external)?,
                None => Vec::new(),
            };
            match groups.iter().find(|group| group.is_document) {
                Some(_) if groups.len() > 1 => {
                    return Err(ResolveError::DisallowedClause {
                        clause: "a document group joined with other groups",
                        context: "a FROM clause",
                    });
                }
                Some(document) => {
                    trace!(group = %document.name, "resolving document query");
                    let document = DocumentScope::new(document.clone(), &local)?;
                    self.resolve_document_query(query, &document, &local, external)?;
                }
                None => {
                    let scope = external.child(groups);
                    self.resolve_query_body(query, &local, &scope)?;
                }
            }
        }
        if let Some(into) = &mut query.into {
            let projected = query.select.projected_symbols();
            self.resolve_into_target(&mut into.group, &projected, adapter)?;
        }
        Ok(())
    }

    fn resolve_query_body(
        &self,
        query: &mut Query,
        adapter: &MetadataAdapter<'_>,
        scope: &GroupContext<'_>,
    ) -> ResolveResult<()> {
        if let Some(criteria) = &mut query.criteria {
            self.resolve_criteria(criteria, adapter, scope)?;
        }
        if let Some(group_by) = &mut query.group_by {
            for symbol in &mut group_by.symbols {
                self.resolve_expression(symbol, adapter, scope)?;
            }
        }
        if let Some(having) = &mut query.having {
            self.resolve_criteria(having, adapter, scope)?;
        }
        self.resolve_select(&mut query.select, adapter, scope, None)?;
        if let Some(order_by) = &mut query.order_by {
            let projected = query.select.projected_symbols();
            let unrelated = query.select.distinct.then_some("with SELECT DISTINCT");
            self.resolve_order_by(order_by, &projected, unrelated, adapter, scope, None)?;
        }
        if let Some(limit) = &mut query.limit {
            self.resolve_limit(limit, adapter, scope)?;
        }
        Ok(())
    }

    fn resolve_from(
        &self,
        from: &mut FromList,
        adapter: &mut MetadataAdapter<'_>,
        external: &GroupContext<'_>,
    ) -> ResolveResult<Vec<GroupSymbol>> {
        let mut groups = Vec::new();
        for clause in &mut from.clauses {
            self.resolve_from_clause(clause, adapter, external, &mut groups)?;
        }
        Ok(groups)
    }

    /// Resolves one FROM clause, appending the groups it introduces to `groups`.
    fn resolve_from_clause(
        &self,
        clause: &mut FromClause,
        adapter: &mut MetadataAdapter<'_>,
        external: &GroupContext<'_>,
        groups: &mut Vec<GroupSymbol>,
    ) -> ResolveResult<()> {
        match clause {
            FromClause::Unary(unary) => {
                resolve_from_group(&mut unary.group, adapter)?;
                push_group(groups, unary.group.clone())
            }
            FromClause::Subquery(subquery) => {
                let lateral;
                let scope = if subquery.lateral {
                    lateral = external.child(groups.clone());
                    &lateral
                } else {
                    external
                };
                self.resolve_subcommand(&mut subquery.command, adapter, scope)?;
                let projected = subquery.command.projected_symbols();
                let columns = temp_columns(&projected, &subquery.group.name)?;
                let id = adapter.temp_mut().upsert(TempGroup::new(
                    subquery.group.name.clone(),
                    TempGroupKind::Derived,
                    columns,
                ));
                subquery.group.set_metadata_id(id);
                push_group(groups, subquery.group.clone())
            }
            FromClause::Join(join) => {
                let start = groups.len();
                self.resolve_from_clause(&mut join.left, adapter, external, groups)?;
                self.resolve_from_clause(&mut join.right, adapter, external, groups)?;
                let scope = external.child(groups[start..].to_vec());
                for criteria in &mut join.criteria {
                    self.resolve_criteria(criteria, adapter, &scope)?;
                }
                Ok(())
            }
        }
    }

    /// Resolves the projection. Against a document a wildcard selects the document root.
    pub(super) fn resolve_select(
        &self,
        select: &mut Select,
        adapter: &MetadataAdapter<'_>,
        scope: &GroupContext<'_>,
        document: Option<&DocumentScope>,
    ) -> ResolveResult<()> {
        for symbol in &mut select.symbols {
            match (symbol, document) {
                (symbol @ Expression::Wildcard(_), Some(document)) => {
                    *symbol = Expression::Element(document.root_element()?);
                }
                (Expression::Wildcard(wildcard), None) => {
                    symbol::expand_wildcard(wildcard, scope.groups(), adapter)?;
                }
                (symbol, document) => self.resolve_expression_in(symbol, adapter, scope, document)?,
            }
        }
        for (position, symbol) in select.symbols.iter_mut().enumerate() {
            if symbol.output_name().is_none() && !matches!(symbol, Expression::Wildcard(_)) {
                let expression = std::mem::replace(symbol, Expression::null());
                *symbol = Expression::ExpressionSymbol(ExpressionSymbol {
                    name: format!("{EXPRESSION_SYMBOL_PREFIX}{}", position + 1).into(),
                    expression: Box::new(expression),
                });
            }
        }
        Ok(())
    }

    /// Binds ORDER BY items to projected symbols by position or output name. Any other item is
    /// an unrelated sort key, resolved against the FROM groups unless `unrelated` names the
    /// context forbidding it.
    pub(super) fn resolve_order_by(
        &self,
        order_by: &mut OrderBy,
        projected: &[Expression],
        unrelated: Option<&'static str>,
        adapter: &MetadataAdapter<'_>,
        scope: &GroupContext<'_>,
        document: Option<&DocumentScope>,
    ) -> ResolveResult<()> {
        for item in &mut order_by.items {
            let position = match &item.expression {
                Expression::Constant(constant) if constant.data_type.is_integral() => {
                    let position = constant.value.as_i128().unwrap_or_default();
                    if position < 1 || position > projected.len() as i128 {
                        return Err(ResolveError::InvalidOrderBy(format!(
                            "position {position} is not between 1 and {}",
                            projected.len()
                        )));
                    }
                    Some(position as usize - 1)
                }
                Expression::Element(element) if !element.is_resolved() => {
                    find_output(element, projected)?
                }
                _ => None,
            };
            if let Some(position) = position {
                item.position = Some(position);
                item.expression = projected[position].clone();
                continue;
            }
            self.resolve_expression_in(&mut item.expression, adapter, scope, document)?;
            if let Some(position) = projected
                .iter()
                .position(|symbol| symbol.unwrap_symbol() == &item.expression)
            {
                item.position = Some(position);
                continue;
            }
            if let Some(context) = unrelated {
                return Err(ResolveError::InvalidOrderBy(format!(
                    "{} is not projected, which is required {context}",
                    item.expression.render()
                )));
            }
            item.unrelated = true;
        }
        Ok(())
    }

    pub(super) fn resolve_limit(
        &self,
        limit: &mut Limit,
        adapter: &MetadataAdapter<'_>,
        scope: &GroupContext<'_>,
    ) -> ResolveResult<()> {
        let converter = self.converter(adapter);
        for bound in [limit.offset.as_mut(), limit.row_limit.as_mut()]
            .into_iter()
            .flatten()
        {
            self.resolve_expression(bound, adapter, scope)?;
            match bound.data_type() {
                None | Some(DataTypeName::Null) => converter.convert(bound, DataTypeName::Integer)?,
                Some(ty) if ty.is_integral() => {}
                Some(ty) => {
                    return Err(ResolveError::InvalidLimit(format!(
                        "{} has type {ty}, expected an integral type",
                        bound.render()
                    )));
                }
            }
            if let Expression::Constant(constant) = bound {
                if constant.value.as_i128().is_some_and(|value| value < 0) {
                    return Err(ResolveError::InvalidLimit(format!(
                        "{} is negative",
                        bound.render()
                    )));
                }
            }
        }
        Ok(())
    }
}

/// Binds a FROM group. A name that is not a group but a procedure with a result set denotes
/// the procedure's relational form: its result columns followed by its input parameters.
fn resolve_from_group(group: &mut GroupSymbol, adapter: &mut MetadataAdapter<'_>) -> ResolveResult<()> {
    if symbol::try_resolve_group(group, adapter)? {
        return Ok(());
    }
    let Some(procedure) = symbol::find_procedure(group.lookup_name(), adapter.catalog())? else {
        return Err(ResolveError::GroupNotFound(group.lookup_name().to_string()));
    };
    if procedure.result_columns.is_empty() {
        return Err(ResolveError::GroupNotFound(group.lookup_name().to_string()));
    }
    let id = super::exec::procedure_group(&procedure, adapter);
    if group.is_aliased() {
        group.definition = Some(procedure.name.clone());
    } else {
        group.name = procedure.name.clone();
    }
    group.is_procedure = true;
    group.set_metadata_id(id);
    Ok(())
}

fn push_group(groups: &mut Vec<GroupSymbol>, group: GroupSymbol) -> ResolveResult<()> {
    if groups
        .iter()
        .any(|existing| existing.name.eq_ignore_ascii_case(&group.name))
    {
        return Err(ResolveError::DuplicateGroup(group.name.to_string()));
    }
    groups.push(group);
    Ok(())
}

/// Finds the projected symbol an ORDER BY name refers to.
fn find_output(element: &ElementSymbol, projected: &[Expression]) -> ResolveResult<Option<usize>> {
    let short_name = element.short_name();
    let qualifier = element.qualifier();
    let matches: Vec<usize> = projected
        .iter()
        .enumerate()
        .filter(|(_, symbol)| {
            symbol
                .output_name()
                .is_some_and(|name| name.eq_ignore_ascii_case(short_name))
        })
        .filter(|(_, symbol)| match (qualifier, symbol) {
            (None, _) => true,
            (Some(qualifier), Expression::Element(projected)) => projected
                .group
                .as_deref()
                .is_some_and(|group| group.matches_qualifier(qualifier)),
            (Some(_), _) => false,
        })
        .map(|(position, _)| position)
        .collect();
    match matches.as_slice() {
        [] => Ok(None),
        [first, rest @ ..] if rest.iter().all(|other| projected[*other] == projected[*first]) => {
            Ok(Some(*first))
        }
        _ => Err(ResolveError::InvalidOrderBy(format!(
            "{} matches more than one projected symbol",
            element.name
        ))),
    }
}

#[cfg(test)]
mod tests {
    use fedquery_ast::command::{Command, FromClause, JoinType, OrderByItem, SubqueryFromClause};
    use fedquery_ast::criteria::{CompareOp, Criteria};
    use fedquery_ast::expression::MultipleElementSymbol;
    use fedquery_catalog::memory::MemoryCatalog;
    use fedquery_catalog::metadata::{ColumnMetadata, ProcedureMetadata};
    use fedquery_common::types::ProcedureId;
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
            .add_physical_group(
                "pm1.g2",
                vec![
                    ColumnMetadata::new("e1", DataTypeName::String),
                    ColumnMetadata::new("e3", DataTypeName::Double),
                ],
            )
            .unwrap();
        catalog
            .add_procedure(
                ProcedureMetadata::new(ProcedureId::MIN, "pm1.sq1")
                    .with_parameter(fedquery_catalog::metadata::ProcedureParameter::input(
                        "in1",
                        DataTypeName::Integer,
                    ))
                    .with_result_column(ColumnMetadata::new("r1", DataTypeName::String)),
            )
            .unwrap();
        catalog
    }

    fn resolve(command: &mut Command, catalog: &MemoryCatalog) -> ResolveResult<()> {
        let options = ResolverOptions::default();
        let mut adapter = MetadataAdapter::new(catalog);
        Resolver::new(&options).resolve(command, &mut adapter).map(drop)
    }

    fn query(symbols: Vec<Expression>, groups: &[&str]) -> Query {
        Query::new(symbols, groups.iter().map(|g| GroupSymbol::new(*g)).collect())
    }

    #[test]
    fn test_wildcard_and_expression_names() {
        let catalog = catalog();
        let mut command = Command::Query(query(
            vec![
                Expression::Wildcard(MultipleElementSymbol::all()),
                Expression::function(
                    "+",
                    vec![Expression::element("e2"), Expression::constant(1)],
                ),
            ],
            &["g1"],
        ));
        resolve(&mut command, &catalog).unwrap();
        assert_snapshot!(
            command.render(),
            @"SELECT *, (pm1.g1.e2 + 1) FROM pm1.g1"
        );
        let types: Vec<_> = command
            .projected_symbols()
            .iter()
            .map(Expression::data_type)
            .collect();
        assert_eq!(
            types,
            [
                Some(DataTypeName::String),
                Some(DataTypeName::Integer),
                Some(DataTypeName::Integer)
            ]
        );
    }

    #[test]
    fn test_duplicate_from_group() {
        let catalog = catalog();
        let mut command = Command::Query(query(vec![Expression::element("e2")], &["g1", "pm1.g1"]));
        assert!(matches!(
            resolve(&mut command, &catalog),
            Err(ResolveError::DuplicateGroup(_))
        ));
    }

    #[test]
    fn test_join_criteria_see_only_joined_groups() {
        let catalog = catalog();
        let join = FromClause::join(
            FromClause::group(GroupSymbol::aliased("a", "g1")),
            JoinType::Inner,
            FromClause::group(GroupSymbol::aliased("b", "g2")),
            vec![Criteria::compare(
                Expression::element("a.e1"),
                CompareOp::Eq,
                Expression::element("b.e1"),
            )],
        );
        let mut select = query(vec![Expression::element("e3")], &[]);
        select.from = Some(FromList {
            clauses: vec![join],
        });
        let mut command = Command::Query(select);
        resolve(&mut command, &catalog).unwrap();
        assert_snapshot!(
            command.render(),
            @"SELECT b.e3 FROM pm1.g1 AS a INNER JOIN pm1.g2 AS b ON a.e1 = b.e1"
        );
    }

    #[test]
    fn test_derived_table_and_procedure_relational() {
        let catalog = catalog();
        let inner = Command::Query(query(vec![Expression::element("e2")], &["g1"]));
        let mut outer = query(vec![Expression::element("x.e2")], &[]);
        outer.from = Some(FromList {
            clauses: vec![FromClause::Subquery(SubqueryFromClause {
                group: GroupSymbol::new("x"),
                command: Box::new(inner),
                lateral: false,
            })],
        });
        let mut command = Command::Query(outer);
        resolve(&mut command, &catalog).unwrap();
        assert_eq!(
            command.projected_symbols()[0].data_type(),
            Some(DataTypeName::Integer)
        );

        let mut command = Command::Query(
            query(vec![Expression::element("r1")], &["sq1"]).with_criteria(Criteria::compare(
                Expression::element("in1"),
                CompareOp::Eq,
                Expression::constant(5),
            )),
        );
        resolve(&mut command, &catalog).unwrap();
        assert_snapshot!(command.render(), @"SELECT pm1.sq1.r1 FROM pm1.sq1 WHERE pm1.sq1.in1 = 5");
    }

    #[test]
    fn test_order_by_position_and_name() {
        let catalog = catalog();
        let mut command = Command::Query(
            query(
                vec![Expression::element("e1"), Expression::element("e2")],
                &["g1"],
            )
            .with_order_by(vec![
                OrderByItem::new(Expression::constant(2)).descending(),
                OrderByItem::new(Expression::element("E1")),
            ]),
        );
        resolve(&mut command, &catalog).unwrap();
        let order_by = command.as_query().unwrap().order_by.as_ref().unwrap();
        let positions: Vec<_> = order_by.items.iter().map(|item| item.position).collect();
        assert_eq!(positions, [Some(1), Some(0)]);
        assert!(order_by.items.iter().all(|item| !item.unrelated));

        let mut command = Command::Query(
            query(vec![Expression::element("e1")], &["g1"])
                .with_order_by(vec![OrderByItem::new(Expression::constant(3))]),
        );
        assert!(matches!(
            resolve(&mut command, &catalog),
            Err(ResolveError::InvalidOrderBy(_))
        ));
    }

    #[test]
    fn test_unrelated_order_by() {
        let catalog = catalog();
        let mut command = Command::Query(
            query(vec![Expression::element("e1")], &["g1"])
                .with_order_by(vec![OrderByItem::new(Expression::element("e2"))]),
        );
        resolve(&mut command, &catalog).unwrap();
        let order_by = command.as_query().unwrap().order_by.as_ref().unwrap();
        assert!(order_by.items[0].unrelated);

        let mut distinct = query(vec![Expression::element("e1")], &["g1"])
            .with_order_by(vec![OrderByItem::new(Expression::element("e2"))]);
        distinct.select.distinct = true;
        let mut command = Command::Query(distinct);
        assert!(matches!(
            resolve(&mut command, &catalog),
            Err(ResolveError::InvalidOrderBy(_))
        ));
    }

    #[test]
    fn test_limit_bounds() {
        let catalog = catalog();
        let mut limited = query(vec![Expression::element("e1")], &["g1"]);
        limited.limit = Some(Limit {
            offset: Some(Expression::positional_reference(0)),
            row_limit: Some(Expression::constant(10)),
        });
        let mut command = Command::Query(limited);
        resolve(&mut command, &catalog).unwrap();
        let limit = command.as_query().unwrap().limit.as_ref().unwrap();
        assert_eq!(
            limit.offset.as_ref().and_then(Expression::data_type),
            Some(DataTypeName::Integer)
        );

        let mut negative = query(vec![Expression::element("e1")], &["g1"]);
        negative.limit = Some(Limit {
            offset: None,
            row_limit: Some(Expression::constant(-1)),
        });
        assert!(matches!(
            resolve(&mut Command::Query(negative), &catalog),
            Err(ResolveError::InvalidLimit(_))
        ));

        let mut text = query(vec![Expression::element("e1")], &["g1"]);
        text.limit = Some(Limit {
            offset: None,
            row_limit: Some(Expression::element("e1")),
        });
        assert!(matches!(
            resolve(&mut Command::Query(text), &catalog),
            Err(ResolveError::InvalidLimit(_))
        ));
    }

    #[test]
    fn test_select_into_implicit_temp() {
        let catalog = catalog();
        let options = ResolverOptions::default();
        let resolver = Resolver::new(&options);
        let mut adapter = MetadataAdapter::new(&catalog);
        let mut into = query(
            vec![Expression::element("e1"), Expression::element("e2")],
            &["g1"],
        );
        into.into = Some(fedquery_ast::command::IntoClause {
            group: GroupSymbol::new("#t"),
        });
        let mut command = Command::Query(into);
        resolver.resolve(&mut command, &mut adapter).unwrap();
        let temp = adapter.temp().get("#T").unwrap();
        assert_eq!(temp.kind, TempGroupKind::TempTable);
        assert_eq!(temp.columns[1].data_type, DataTypeName::Integer);

        let mut again = Command::Query(query(vec![Expression::element("e2")], &["#t"]));
        resolver.resolve(&mut again, &mut adapter).unwrap();
        assert_snapshot!(again.render(), @"SELECT #t.e2 FROM #t");

        let mut missing = query(vec![Expression::element("e1")], &["g1"]);
        missing.into = Some(fedquery_ast::command::IntoClause {
            group: GroupSymbol::new("t2"),
        });
        assert!(matches!(
            resolver.resolve(&mut Command::Query(missing), &mut adapter),
            Err(ResolveError::GroupNotFound(_))
        ));
    }
}
