use anyhow::Result;
use fedquery::ast::command::{
    FromClause, FromList, OrderBy, OrderByItem, Query, SetOperation, SetQuery,
};
use fedquery::ast::criteria::{CompareOp, ExistsCriteria};
use fedquery::ast::expression::MultipleElementSymbol;
use fedquery::ast::render::{Render, render};
use fedquery::ast::{Command, Criteria, Expression, GroupSymbol};
use fedquery::common::data_type::DataTypeName;
use fedquery::{Error, ResolveError, ResolverOptions};
use fedquery_test::{resolver, resolver_with};
use insta::assert_snapshot;

fn select(symbols: Vec<Expression>, groups: &[&str]) -> Query {
    Query::new(symbols, groups.iter().map(|g| GroupSymbol::new(*g)).collect())
}

fn projected(command: &Command) -> Vec<String> {
    command
        .projected_symbols()
        .iter()
        .map(Render::render)
        .collect()
}

#[test]
fn test_render_placeholders_and_literals() {
    assert_eq!(render::<Expression>(None), "<undefined>");
    assert_eq!(render::<Criteria>(None), "<undefined>");
    assert_eq!(render::<Command>(None), "<undefined>");
    assert_eq!(render::<GroupSymbol>(None), "<undefined>");
    assert_eq!(Expression::constant("O'Leary").render(), "'O''Leary'");
    assert_eq!(Expression::null().render(), "null");
    let criteria = Criteria::compare(
        Expression::element("m.g.c1"),
        CompareOp::Eq,
        Expression::constant("abc"),
    );
    assert_eq!(criteria.render(), "m.g.c1 = 'abc'");
}

#[test]
fn test_wildcard_expands_in_from_order() -> Result<()> {
    let resolver = resolver();
    let mut command = Command::Query(select(
        vec![Expression::Wildcard(MultipleElementSymbol::all())],
        &["pm1.g2", "pm1.g1"],
    ));
    resolver.resolve(&mut command)?;
    assert_eq!(
        projected(&command),
        [
            "pm1.g2.e1",
            "pm1.g2.e2",
            "pm1.g1.e1",
            "pm1.g1.e2",
            "pm1.g1.e3",
            "pm1.g1.e4",
        ]
    );

    let mut command = Command::Query(select(
        vec![Expression::Wildcard(MultipleElementSymbol::of_group("g1"))],
        &["pm1.g2", "pm1.g1"],
    ));
    resolver.resolve(&mut command)?;
    assert_eq!(projected(&command).len(), 4);
    Ok(())
}

#[test]
fn test_partial_names_and_ambiguity() -> Result<()> {
    let resolver = resolver();
    let mut command = Command::Query(select(vec![Expression::element("e3")], &["g1"]));
    resolver.resolve(&mut command)?;
    assert_snapshot!(command.render(), @"SELECT pm1.g1.e3 FROM pm1.g1");

    let mut command = Command::Query(select(vec![Expression::element("e1")], &["pm1.g1", "pm1.g2"]));
    let err = resolver.resolve(&mut command).unwrap_err();
    assert!(matches!(
        err,
        Error::Resolve(ResolveError::AmbiguousElement { .. })
    ));

    let mut command = Command::Query(select(vec![Expression::element("e1")], &["pm1.missing"]));
    let err = resolver.resolve(&mut command).unwrap_err();
    assert_snapshot!(err, @r#"group "pm1.missing" not found"#);
    Ok(())
}

#[test]
fn test_string_literal_coercion_follows_options() -> Result<()> {
    let comparison = || {
        Command::Query(
            select(vec![Expression::element("e1")], &["pm1.g1"]).with_criteria(
                Criteria::compare(
                    Expression::element("e2"),
                    CompareOp::Eq,
                    Expression::constant("5"),
                ),
            ),
        )
    };

    let mut command = comparison();
    resolver().resolve(&mut command)?;
    assert_snapshot!(command.render(), @"SELECT pm1.g1.e1 FROM pm1.g1 WHERE pm1.g1.e2 = 5");

    let options = ResolverOptions {
        coerce_string_literals: false,
        ..ResolverOptions::default()
    };
    let mut command = comparison();
    resolver_with(options).resolve(&mut command)?;
    assert_snapshot!(
        command.render(),
        @"SELECT pm1.g1.e1 FROM pm1.g1 WHERE convert(pm1.g1.e2, string) = '5'"
    );
    Ok(())
}

#[test]
fn test_union_takes_the_common_type() -> Result<()> {
    let resolver = resolver();
    let mut command = Command::SetQuery(SetQuery::new(
        SetOperation::Union,
        false,
        Command::Query(select(vec![Expression::element("e1")], &["pm1.g1"])),
        Command::Query(select(vec![Expression::element("e1")], &["pm1.g2"])),
    ));
    resolver.resolve(&mut command)?;
    let set_query = command.as_set_query().unwrap();
    assert_eq!(set_query.projected_types, [DataTypeName::String]);
    assert_eq!(
        set_query.right.projected_symbols()[0].data_type(),
        Some(DataTypeName::String)
    );

    let mut command = Command::SetQuery(SetQuery::new(
        SetOperation::Union,
        true,
        Command::Query(select(vec![Expression::element("e1")], &["pm1.g3"])),
        Command::Query(select(vec![Expression::element("e2")], &["pm1.g3"])),
    ));
    let err = resolver.resolve(&mut command).unwrap_err();
    assert!(matches!(
        err,
        Error::Resolve(ResolveError::NoCommonType { .. })
    ));
    Ok(())
}

#[test]
fn test_view_columns() -> Result<()> {
    let mut command = Command::Query(
        select(vec![Expression::element("v1")], &["vm1.g1"]).with_criteria(Criteria::compare(
            Expression::element("v2"),
            CompareOp::Gt,
            Expression::constant(1),
        )),
    );
    resolver().resolve(&mut command)?;
    assert_snapshot!(command.render(), @"SELECT vm1.g1.v1 FROM vm1.g1 WHERE vm1.g1.v2 > 1");
    Ok(())
}

#[test]
fn test_ordered_nested_union_is_not_retyped() {
    let mut inner = SetQuery::new(
        SetOperation::Union,
        false,
        Command::Query(select(vec![Expression::element("e2")], &["pm1.g1"])),
        Command::Query(select(vec![Expression::element("e1")], &["pm1.g2"])),
    );
    inner.order_by = Some(OrderBy {
        items: vec![OrderByItem::new(Expression::constant(1))],
    });
    let mut command = Command::SetQuery(SetQuery::new(
        SetOperation::Union,
        false,
        Command::SetQuery(inner),
        Command::Query(select(vec![Expression::element("e4")], &["pm1.g1"])),
    ));
    let err = resolver().resolve(&mut command).unwrap_err();
    assert_snapshot!(
        err,
        @"order by of a set query branch uses column 1, which would change from integer to double"
    );
}

#[test]
fn test_nested_set_query_rendering() -> Result<()> {
    let union = SetQuery::new(
        SetOperation::Union,
        false,
        Command::Query(select(vec![Expression::element("e2")], &["pm1.g1"])),
        Command::Query(select(vec![Expression::element("e1")], &["pm1.g2"])),
    );
    let mut command = Command::SetQuery(SetQuery::new(
        SetOperation::Intersect,
        false,
        Command::SetQuery(union),
        Command::Query(select(vec![Expression::element("e1")], &["pm1.g3"])),
    ));
    resolver().resolve(&mut command)?;
    assert_snapshot!(
        command.render(),
        @"(SELECT pm1.g1.e2 FROM pm1.g1 UNION SELECT pm1.g2.e1 FROM pm1.g2) INTERSECT SELECT pm1.g3.e1 FROM pm1.g3"
    );
    Ok(())
}

fn derived(alias: &str, symbol: Expression, group: &str) -> FromList {
    FromList {
        clauses: vec![FromClause::subquery(
            alias,
            Command::Query(select(vec![symbol], &[group])),
        )],
    }
}

#[test]
fn test_correlated_name_through_a_hidden_derived_table() -> Result<()> {
    // SELECT x.a FROM (SELECT e1 AS a FROM pm1.g1) AS x
    // WHERE EXISTS (SELECT 1 FROM (SELECT e2 AS b FROM pm1.g2) AS x WHERE b = a)
    let mut inner = select(vec![Expression::constant(1)], &[]);
    inner.from = Some(derived(
        "x",
        Expression::alias("b", Expression::element("e2")),
        "pm1.g2",
    ));
    inner.criteria = Some(Criteria::compare(
        Expression::element("b"),
        CompareOp::Eq,
        Expression::element("a"),
    ));
    let mut outer = select(vec![Expression::element("x.a")], &[]);
    outer.from = Some(derived(
        "x",
        Expression::alias("a", Expression::element("e1")),
        "pm1.g1",
    ));
    outer.criteria = Some(Criteria::Exists(ExistsCriteria {
        command: Box::new(Command::Query(inner)),
        negated: false,
    }));
    let mut command = Command::Query(outer);
    resolver().resolve(&mut command)?;

    let outer = command.as_query().unwrap();
    let outer_x = outer.from_groups()[0].metadata_id().cloned();
    let Some(Criteria::Exists(exists)) = &outer.criteria else {
        panic!("expected EXISTS");
    };
    let inner = exists.command.as_query().unwrap();
    let inner_x = inner.from_groups()[0].metadata_id().cloned();
    assert_ne!(outer_x, inner_x);

    let comparison = inner.criteria.as_ref().unwrap().as_compare().unwrap();
    let a = comparison.right.as_element().unwrap();
    assert!(a.is_external);
    assert_eq!(a.data_type(), Some(DataTypeName::String));
    assert_eq!(a.metadata_id().map(|id| id.group.clone()), outer_x);
    let b = comparison.left.as_element().unwrap();
    assert!(!b.is_external);
    assert_eq!(b.metadata_id().map(|id| id.group.clone()), inner_x);
    Ok(())
}
