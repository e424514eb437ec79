use std::sync::Arc;

use divan::Bencher;
use fedquery::ast::command::Query;
use fedquery::ast::criteria::CompareOp;
use fedquery::ast::{Command, Criteria, Expression, GroupSymbol};
use fedquery::catalog::memory::MemoryCatalog;
use fedquery::catalog::metadata::ColumnMetadata;
use fedquery::common::data_type::DataTypeName;
use fedquery::{QueryResolver, ResolverOptions};

fn main() {
    divan::main();
}

fn resolver(columns: usize) -> QueryResolver {
    let mut catalog = MemoryCatalog::new();
    for group in 0..8 {
        let columns = (0..columns)
            .map(|i| ColumnMetadata::new(format!("e{i}"), DataTypeName::Integer))
            .collect();
        catalog
            .add_physical_group(&format!("pm1.g{group}"), columns)
            .unwrap();
    }
    QueryResolver::new(Arc::new(catalog), ResolverOptions::default())
}

fn query() -> Command {
    let criteria = Criteria::and(vec![
        Criteria::compare(
            Expression::element("g0.e1"),
            CompareOp::Eq,
            Expression::element("g1.e1"),
        ),
        Criteria::compare(
            Expression::element("g1.e2"),
            CompareOp::Gt,
            Expression::constant("5"),
        ),
    ]);
    Command::Query(
        Query::new(
            vec![
                Expression::element("g0.e0"),
                Expression::function(
                    "+",
                    vec![Expression::element("g1.e3"), Expression::constant(1)],
                ),
            ],
            vec![GroupSymbol::new("g0"), GroupSymbol::new("g1")],
        )
        .with_criteria(criteria),
    )
}

#[divan::bench(args = [8, 64, 256])]
fn resolve_join(bencher: Bencher, columns: usize) {
    let resolver = resolver(columns);
    bencher
        .with_inputs(query)
        .bench_local_refs(|command| resolver.resolve(command).unwrap());
}

#[divan::bench(args = [16, 256])]
fn resolve_batch(bencher: Bencher, commands: usize) {
    let resolver = resolver(16);
    bencher
        .with_inputs(|| (0..commands).map(|_| query()).collect::<Vec<_>>())
        .bench_local_refs(|commands| resolver.resolve_batch(commands));
}
