//! Fixtures shared by the system tests under `tests/`.

use std::sync::Arc;

use fedquery::ast::command::Query;
use fedquery::ast::{Command, Expression, GroupSymbol};
use fedquery::catalog::document::DocumentModel;
use fedquery::catalog::memory::MemoryCatalog;
use fedquery::catalog::metadata::{ColumnMetadata, ProcedureMetadata, ProcedureParameter};
use fedquery::common::data_type::DataTypeName;
use fedquery::common::function::{FunctionDescriptor, PushDown};
use fedquery::common::types::ProcedureId;
use fedquery::{QueryResolver, ResolverOptions};
use tracing_subscriber::EnvFilter;

/// Installs a test subscriber honouring `RUST_LOG`. Later calls are no-ops.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// A small federated schema:
///
/// - `pm1.g1 (e1 string, e2 integer, e3 boolean, e4 double)`
/// - `pm1.g2 (e1 integer, e2 string)`
/// - `pm1.g3 (e1 integer, e2 blob)`
/// - `vm1.g1 (v1 string, v2 integer)`, defined as `SELECT e1, e2 FROM pm1.g1`
/// - `xmltest.doc1`, a catalog document with items
/// - `pm1.sq1 (in1 integer, in2 string = 'x') -> (r1 string)`
/// - `source_hash(string)`, a function only sources can evaluate
pub fn catalog() -> MemoryCatalog {
    let mut catalog = MemoryCatalog::new();
    let groups = [
        (
            "pm1.g1",
            vec![
                ("e1", DataTypeName::String),
                ("e2", DataTypeName::Integer),
                ("e3", DataTypeName::Boolean),
                ("e4", DataTypeName::Double),
            ],
        ),
        (
            "pm1.g2",
            vec![("e1", DataTypeName::Integer), ("e2", DataTypeName::String)],
        ),
        (
            "pm1.g3",
            vec![("e1", DataTypeName::Integer), ("e2", DataTypeName::Blob)],
        ),
    ];
    for (name, columns) in groups {
        let columns = columns
            .into_iter()
            .map(|(column, ty)| ColumnMetadata::new(column, ty))
            .collect();
        catalog
            .add_physical_group(name, columns)
            .expect("fixture groups are distinct");
    }

    catalog
        .add_virtual_group(
            "vm1.g1",
            vec![
                ColumnMetadata::new("v1", DataTypeName::String),
                ColumnMetadata::new("v2", DataTypeName::Integer),
            ],
            Command::Query(Query::new(
                vec![Expression::element("e1"), Expression::element("e2")],
                vec![GroupSymbol::new("pm1.g1")],
            )),
        )
        .expect("fixture groups are distinct");

    catalog
        .add_document_group("xmltest.doc1", catalog_document())
        .expect("fixture groups are distinct");

    catalog
        .add_procedure(
            ProcedureMetadata::new(ProcedureId::MIN, "pm1.sq1")
                .with_parameter(ProcedureParameter::input("in1", DataTypeName::Integer).required())
                .with_parameter(
                    ProcedureParameter::input("in2", DataTypeName::String).with_default("x".into()),
                )
                .with_result_column(ColumnMetadata::new("r1", DataTypeName::String)),
        )
        .expect("fixture procedures are distinct");

    catalog.register_function(
        FunctionDescriptor::new("source_hash", [DataTypeName::String], DataTypeName::Integer)
            .with_pushdown(PushDown::MustPushdown),
    );
    catalog
}

fn catalog_document() -> DocumentModel {
    let mut model = DocumentModel::new("Catalogs");
    let catalog = model.add_element(0, "Catalog", DataTypeName::String);
    let items = model.add_element(catalog, "Items", DataTypeName::String);
    let item = model.add_element(items, "Item", DataTypeName::String);
    model.add_attribute(item, "ItemID", DataTypeName::String);
    model.add_element(item, "Name", DataTypeName::String);
    model.add_element(item, "Quantity", DataTypeName::Integer);
    model
}

pub fn resolver() -> QueryResolver {
    resolver_with(ResolverOptions::default())
}

pub fn resolver_with(options: ResolverOptions) -> QueryResolver {
    init_tracing();
    QueryResolver::new(Arc::new(catalog()), options)
}
