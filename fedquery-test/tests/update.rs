use anyhow::Result;
use fedquery::ast::command::{Insert, SetClause, SpParameter, StoredProcedure, Update};
use fedquery::ast::criteria::{CompareOp, CriteriaSelector, SelectorKind, TranslateCriteria};
use fedquery::ast::procedure::{Block, CreateProcedureCommand, Statement, TriggerEvent};
use fedquery::ast::render::Render;
use fedquery::ast::{Command, Criteria, ElementSymbol, Expression, GroupSymbol};
use fedquery::{Error, ResolveError};
use fedquery_test::resolver;
use insta::assert_snapshot;

#[test]
fn test_insert_values_take_column_types() -> Result<()> {
    let mut command = Command::Insert(Insert::values(
        GroupSymbol::new("g1"),
        vec![ElementSymbol::new("e1"), ElementSymbol::new("e2")],
        vec![Expression::constant(1), Expression::constant("2")],
    ));
    let outcome = resolver().resolve(&mut command)?;
    assert_snapshot!(
        command.render(),
        @"INSERT INTO pm1.g1 (pm1.g1.e1, pm1.g1.e2) VALUES ('1', 2)"
    );
    let keys: Vec<_> = outcome.variable_values.keys().map(|k| k.as_str()).collect();
    assert_eq!(keys, ["CHANGING.e1", "INPUTS.e1", "CHANGING.e2", "INPUTS.e2"]);
    Ok(())
}

#[test]
fn test_insert_rejections() {
    let resolver = resolver();
    let mut command = Command::Insert(Insert::values(
        GroupSymbol::new("pm1.g2"),
        Vec::new(),
        vec![
            Expression::constant(1),
            Expression::constant("a"),
            Expression::constant(2),
        ],
    ));
    assert!(matches!(
        resolver.resolve(&mut command),
        Err(Error::Resolve(ResolveError::ArityMismatch {
            expected: 2,
            actual: 3,
            ..
        }))
    ));

    let mut command = Command::Insert(Insert::values(
        GroupSymbol::new("pm1.g3"),
        vec![ElementSymbol::new("e2")],
        vec![Expression::constant(1)],
    ));
    assert!(matches!(
        resolver.resolve(&mut command),
        Err(Error::Resolve(ResolveError::NoImplicitConversion { .. }))
    ));
}

#[test]
fn test_exec_fills_defaults() -> Result<()> {
    let mut command = Command::StoredProcedure(StoredProcedure::new(
        "sq1",
        vec![SpParameter::positional(Expression::constant(5))],
    ));
    resolver().resolve(&mut command)?;
    let sp = command.as_stored_procedure().unwrap();
    assert_eq!(sp.parameters.len(), 2);
    assert!(sp.parameters[1].uses_default);
    assert_eq!(sp.result_columns.len(), 1);
    assert_eq!(command.projected_symbols()[0].output_name(), Some("r1"));
    Ok(())
}

fn user_criteria() -> Criteria {
    Criteria::and(vec![
        Criteria::compare(
            Expression::element("vm1.g1.v1"),
            CompareOp::Eq,
            Expression::constant("a"),
        ),
        Criteria::compare(
            Expression::element("vm1.g1.v2"),
            CompareOp::Gt,
            Expression::constant(5),
        ),
    ])
}

#[test]
fn test_update_procedure_translates_user_criteria() -> Result<()> {
    let translate = Criteria::Translate(TranslateCriteria {
        selector: CriteriaSelector::new(
            SelectorKind::Compare(CompareOp::Eq),
            vec![ElementSymbol::new("v1")],
        ),
        translations: Vec::new(),
    });
    let update = Update {
        group: GroupSymbol::new("pm1.g1"),
        changes: vec![SetClause::new("e2", Expression::element("INPUTS.v2"))],
        criteria: Some(translate),
    };
    let mut command = Command::Procedure(CreateProcedureCommand::update(
        GroupSymbol::new("vm1.g1"),
        TriggerEvent::Update,
        Block::new(vec![Statement::command(Command::Update(update))]),
    ));
    let resolver = resolver();
    let outcome = resolver.resolve(&mut command)?;
    assert_eq!(outcome.compensation_map["vm1.g1.v1"].render(), "pm1.g1.e1");

    let procedure = command.as_procedure().unwrap();
    let statement = procedure.block.statements[0].as_command().unwrap();
    let update = statement.command.as_update().unwrap();
    let Some(Criteria::Translate(translate)) = &update.criteria else {
        panic!("expected a TRANSLATE CRITERIA predicate");
    };

    let translated = resolver
        .translate_criteria(translate, &outcome.compensation_map, &user_criteria())
        .unwrap();
    assert_snapshot!(translated.render(), @"pm1.g1.e1 = 'a'");

    // nothing selected
    let only_null_checks = TranslateCriteria {
        selector: CriteriaSelector::new(SelectorKind::IsNull, Vec::new()),
        translations: Vec::new(),
    };
    assert!(resolver
        .translate_criteria(&only_null_checks, &outcome.compensation_map, &user_criteria())
        .is_none());
    Ok(())
}
