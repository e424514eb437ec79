use std::sync::Arc;

use anyhow::Result;
use fedquery::ast::command::{ColumnDefinition, CreateTempTable, DropTempTable, Insert, Query};
use fedquery::ast::criteria::CompareOp;
use fedquery::ast::expression::MultipleElementSymbol;
use fedquery::ast::render::Render;
use fedquery::ast::{Command, Criteria, ElementSymbol, Expression, GroupSymbol};
use fedquery::common::data_type::DataTypeName;
use fedquery::{Error, QueryResolver, ResolveError};
use fedquery_test::{catalog, resolver};
use insta::assert_snapshot;

fn create(name: &str) -> Command {
    Command::Create(CreateTempTable {
        table: GroupSymbol::new(name),
        columns: vec![
            ColumnDefinition::new("id", DataTypeName::Integer),
            ColumnDefinition::new("label", DataTypeName::String),
        ],
        primary_key: Vec::new(),
    })
}

fn select_from(group: &str) -> Command {
    Command::Query(Query::new(
        vec![Expression::Wildcard(MultipleElementSymbol::all())],
        vec![GroupSymbol::new(group)],
    ))
}

#[test]
fn test_temp_tables_live_for_the_session() -> Result<()> {
    let resolver = resolver();
    let mut session = resolver.session();

    let outcome = session.resolve(&mut create("#orders"))?;
    assert_eq!(outcome.temp_groups, ["#orders"]);

    // implicitly defined by INSERT INTO with a column list
    let mut insert = Command::Insert(Insert::values(
        GroupSymbol::new("#totals"),
        vec![ElementSymbol::new("total")],
        vec![Expression::constant(1.5)],
    ));
    let outcome = session.resolve(&mut insert)?;
    assert_eq!(outcome.temp_groups, ["#totals"]);

    let mut query = select_from("#orders");
    session.resolve(&mut query)?;
    let types: Vec<_> = query
        .projected_symbols()
        .iter()
        .map(Expression::data_type)
        .collect();
    assert_eq!(
        types,
        [Some(DataTypeName::Integer), Some(DataTypeName::String)]
    );
    assert_eq!(session.temp_tables(), ["#orders", "#totals"]);

    let err = session.resolve(&mut create("#ORDERS")).unwrap_err();
    assert!(matches!(err, Error::Resolve(_)));

    // each standalone resolution starts without temp tables
    let err = resolver.resolve(&mut select_from("#orders")).unwrap_err();
    assert!(matches!(
        err,
        Error::Resolve(ResolveError::GroupNotFound(_))
    ));
    Ok(())
}

#[test]
fn test_drop_needs_an_existing_table() -> Result<()> {
    let resolver = resolver();
    let mut session = resolver.session();
    session.resolve(&mut create("#t"))?;
    let mut drop = Command::Drop(DropTempTable {
        table: GroupSymbol::new("#t"),
    });
    session.resolve(&mut drop)?;
    assert_snapshot!(drop.render(), @"DROP TABLE #t");

    let mut drop = Command::Drop(DropTempTable {
        table: GroupSymbol::new("#missing"),
    });
    assert!(session.resolve(&mut drop).is_err());
    Ok(())
}

#[test]
fn test_document_query() -> Result<()> {
    let resolver = resolver();
    let mut command = select_from("xmltest.doc1");
    resolver.resolve(&mut command)?;
    assert_snapshot!(command.render(), @"SELECT xmltest.doc1.Catalogs FROM xmltest.doc1");

    let mut command = Command::Query(
        Query::new(
            vec![Expression::element("Item.Name")],
            vec![GroupSymbol::new("doc1")],
        )
        .with_criteria(Criteria::compare(
            Expression::element("Quantity"),
            CompareOp::Gt,
            Expression::constant("5"),
        )),
    );
    resolver.resolve(&mut command)?;
    let criteria = command.as_query().unwrap().criteria.as_ref().unwrap();
    let comparison = criteria.as_compare().unwrap();
    assert_eq!(comparison.right.data_type(), Some(DataTypeName::Integer));
    Ok(())
}

#[test]
fn test_batch_resolves_independently() {
    let resolver = resolver();
    let mut commands = vec![
        select_from("pm1.g1"),
        create("#t"),
        select_from("#t"),
        select_from("vm1.g1"),
    ];
    let results = resolver.resolve_batch(&mut commands);
    assert_eq!(results.len(), 4);
    assert!(results[0].is_ok());
    assert_eq!(results[1].as_ref().unwrap().temp_groups, ["#t"]);
    // batch members do not share temp tables
    assert!(results[2].is_err());
    assert!(results[3].is_ok());
    assert_eq!(commands[3].projected_symbols().len(), 2);
}

#[test]
fn test_options_from_json() -> Result<()> {
    let options = r#"{"implicit_temp_prefix": "tmp_", "coerce_string_literals": false}"#;
    let resolver = QueryResolver::with_json_options(Arc::new(catalog()), options)?;
    assert!(!resolver.options().coerce_string_literals);

    let mut insert = Command::Insert(Insert::values(
        GroupSymbol::new("tmp_scratch"),
        vec![ElementSymbol::new("a")],
        vec![Expression::constant(1)],
    ));
    let outcome = resolver.resolve(&mut insert)?;
    assert_eq!(outcome.temp_groups, ["tmp_scratch"]);

    let options = r#"{"coerce_string_literals": 1}"#;
    let err = QueryResolver::with_json_options(Arc::new(catalog()), options).unwrap_err();
    assert_snapshot!(err, @"invalid resolver options");
    Ok(())
}
