mod document;
mod dynamic;
mod exec;
mod insert;
mod procedure;
mod query;
mod set_query;
mod temp_table;
mod update;

use std::sync::Arc;

use fedquery_ast::criteria::{HasCriteria, TranslateCriteria};
use fedquery_ast::render::Render;
use fedquery_ast::visit_mut::{self, VisitorMut};
use fedquery_ast::{Command, Criteria, ElementSymbol, Expression, GroupSymbol};
use fedquery_catalog::MetadataAdapter;
use fedquery_catalog::metadata::ColumnMetadata;
use fedquery_catalog::temp::{TempGroup, TempGroupKind};
use fedquery_common::constants::{CHANGING_GROUP, INPUTS_GROUP};
use fedquery_common::data_type::DataTypeName;
use indexmap::IndexMap;
use serde::Serialize;
use smol_str::SmolStr;
use tracing::{debug, trace};

pub(crate) use self::document::DocumentScope;
pub use self::procedure::SelectorScope;
use crate::convert::Converter;
use crate::error::{ResolveError, ResolveResult};
use crate::expr::ExpressionResolver;
use crate::options::ResolverOptions;
use crate::scope::GroupContext;
use crate::symbol;

/// Resolves commands with a fixed set of options.
///
/// A resolver holds no per-command state apart from the selector scope of the update procedure
/// whose body it is resolving, so one value can resolve any number of commands.
#[derive(Debug, Clone)]
pub struct Resolver<'c> {
    options: &'c ResolverOptions,
    selectors: Option<Arc<SelectorScope>>,
}

/// What resolving a command produces besides the rewritten command itself.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Resolution {
    /// For inserts and updates: `CHANGING.<column>` flags and `INPUTS.<column>` values, keyed by
    /// name, as consumed by the update procedure of a virtual target.
    pub variable_values: IndexMap<SmolStr, Expression>,
    /// For update procedure bodies: virtual element name to the view definition expression
    /// that computes it.
    pub compensation_map: IndexMap<SmolStr, Expression>,
}

impl<'c> Resolver<'c> {
    pub fn new(options: &'c ResolverOptions) -> Self {
        Self {
            options,
            selectors: None,
        }
    }

    #[inline]
    pub fn options(&self) -> &'c ResolverOptions {
        self.options
    }

    /// Resolves `command` in place.
    ///
    /// Temp groups the command defines at top level stay in `adapter`, so that a caller can
    /// resolve a sequence of commands sharing them.
    pub fn resolve(
        &self,
        command: &mut Command,
        adapter: &mut MetadataAdapter<'_>,
    ) -> ResolveResult<Resolution> {
        debug!(command = command.kind_name(), "resolving command");
        let external = GroupContext::new(Vec::new());
        let mut resolution = Resolution::default();
        match command {
            Command::Procedure(procedure) => {
                if let Some(selectors) = self.resolve_procedure(procedure, adapter, &external)? {
                    resolution.compensation_map = selectors.symbol_map.clone();
                }
            }
            _ => self.resolve_command(command, adapter, &external)?,
        }
        resolution.variable_values = variable_values(command, adapter)?;
        debug!(
            command = command.kind_name(),
            variables = resolution.variable_values.len(),
            "command resolved"
        );
        Ok(resolution)
    }

    pub(crate) fn resolve_command(
        &self,
        command: &mut Command,
        adapter: &mut MetadataAdapter<'_>,
        external: &GroupContext<'_>,
    ) -> ResolveResult<()> {
        trace!(command = command.kind_name(), "resolve command");
        match command {
            Command::Query(query) => self.resolve_query(query, adapter, external),
            Command::SetQuery(set_query) => self.resolve_set_query(set_query, adapter, external),
            Command::Insert(insert) => self.resolve_insert(insert, adapter, external),
            Command::Update(update) => self.resolve_update(update, adapter, external),
            Command::Delete(delete) => self.resolve_delete(delete, adapter, external),
            Command::StoredProcedure(sp) => self.resolve_stored_procedure(sp, adapter, external),
            Command::Dynamic(dynamic) => self.resolve_dynamic(dynamic, adapter, external),
            Command::Create(create) => self.resolve_create_temp_table(create, adapter),
            Command::Drop(drop) => self.resolve_drop_temp_table(drop, adapter),
            Command::Procedure(procedure) => self
                .resolve_procedure(procedure, adapter, external)
                .map(drop),
            Command::TriggerAction(action) => self.resolve_trigger_action(action, adapter, external),
        }
    }

    /// Resolves a command nested in another one. Temp groups it defines are dropped with its
    /// scope.
    pub(crate) fn resolve_subcommand(
        &self,
        command: &mut Command,
        adapter: &MetadataAdapter<'_>,
        external: &GroupContext<'_>,
    ) -> ResolveResult<()> {
        let mut child = adapter.child();
        self.resolve_command(command, &mut child, external)
    }

    #[inline]
    pub(crate) fn converter<'a>(&self, adapter: &MetadataAdapter<'a>) -> Converter<'a> {
        Converter::new(adapter.catalog(), self.options.coerce_string_literals)
    }

    #[inline]
    pub(crate) fn resolve_expression(
        &self,
        expression: &mut Expression,
        adapter: &MetadataAdapter<'_>,
        scope: &GroupContext<'_>,
    ) -> ResolveResult<()> {
        self.resolve_expression_in(expression, adapter, scope, None)
    }

    pub(crate) fn resolve_expression_in(
        &self,
        expression: &mut Expression,
        adapter: &MetadataAdapter<'_>,
        scope: &GroupContext<'_>,
        document: Option<&DocumentScope>,
    ) -> ResolveResult<()> {
        let mut resolver = ExpressionResolver::new(self, adapter, scope, document);
        visit_mut::post_order(expression, &mut resolver);
        resolver.finish()
    }

    #[inline]
    pub(crate) fn resolve_criteria(
        &self,
        criteria: &mut Criteria,
        adapter: &MetadataAdapter<'_>,
        scope: &GroupContext<'_>,
    ) -> ResolveResult<()> {
        self.resolve_criteria_in(criteria, adapter, scope, None)
    }

    pub(crate) fn resolve_criteria_in(
        &self,
        criteria: &mut Criteria,
        adapter: &MetadataAdapter<'_>,
        scope: &GroupContext<'_>,
        document: Option<&DocumentScope>,
    ) -> ResolveResult<()> {
        let mut binder = SelectorBinder {
            selectors: self.selectors.as_deref(),
            error: None,
        };
        visit_mut::pre_order(criteria, &mut binder);
        if let Some(err) = binder.error {
            return Err(err);
        }
        let mut resolver = ExpressionResolver::new(self, adapter, scope, document);
        visit_mut::post_order(criteria, &mut resolver);
        resolver.finish()
    }

    /// Binds the target of `SELECT ... INTO` or `EXECUTE IMMEDIATE ... INTO`.
    ///
    /// An existing group must accept the projected columns. A missing group whose name carries
    /// the implicit temp prefix is defined from them.
    pub(crate) fn resolve_into_target(
        &self,
        group: &mut GroupSymbol,
        projected: &[Expression],
        adapter: &mut MetadataAdapter<'_>,
    ) -> ResolveResult<()> {
        if symbol::try_resolve_group(group, adapter)? {
            let id = group
                .metadata_id()
                .cloned()
                .ok_or_else(|| ResolveError::GroupNotFound(group.name.to_string()))?;
            let columns = adapter.columns(&id)?;
            if columns.len() != projected.len() {
                return Err(ResolveError::ArityMismatch {
                    context: format!("INTO {}", group.name),
                    expected: columns.len(),
                    actual: projected.len(),
                });
            }
            let catalog = adapter.catalog();
            for ((_, column), symbol) in columns.iter().zip(projected) {
                let Some(from) = symbol.data_type() else {
                    continue;
                };
                if from != column.data_type && !catalog.is_implicit_conversion(from, column.data_type) {
                    return Err(ResolveError::NoImplicitConversion {
                        expression: symbol.render(),
                        from,
                        to: column.data_type,
                    });
                }
            }
            return Ok(());
        }
        if !self.options.is_implicit_temp(group.lookup_name()) {
            return Err(ResolveError::GroupNotFound(group.lookup_name().to_string()));
        }
        let columns = temp_columns(projected, &format!("INTO {}", group.name))?;
        let id = adapter
            .temp_mut()
            .insert(TempGroup::new(group.name.clone(), TempGroupKind::TempTable, columns))?;
        group.set_metadata_id(id);
        Ok(())
    }
}

/// Columns of a temp group defined by a projection, named after the projected symbols.
pub(crate) fn temp_columns(
    projected: &[Expression],
    context: &str,
) -> ResolveResult<Vec<ColumnMetadata>> {
    let mut columns: Vec<ColumnMetadata> = Vec::with_capacity(projected.len());
    for symbol in projected {
        let name = symbol
            .output_name()
            .ok_or_else(|| ResolveError::InvalidTempTable {
                name: context.to_string(),
                reason: format!("{} has no name", symbol.render()),
            })?;
        if columns.iter().any(|c| c.name.eq_ignore_ascii_case(name)) {
            return Err(ResolveError::DuplicateSymbol {
                symbol: name.to_string(),
                context: context.to_string(),
            });
        }
        columns.push(ColumnMetadata::new(name, column_type(symbol.data_type())));
    }
    Ok(columns)
}

/// Type of a temp column defined by a symbol of the given type.
#[inline]
pub(crate) fn column_type(data_type: Option<DataTypeName>) -> DataTypeName {
    match data_type {
        None => DataTypeName::Object,
        Some(DataTypeName::Null) => DataTypeName::String,
        Some(ty) => ty,
    }
}

fn variable_values(
    command: &Command,
    adapter: &MetadataAdapter<'_>,
) -> ResolveResult<IndexMap<SmolStr, Expression>> {
    let mut values = IndexMap::new();
    match command {
        Command::Insert(insert) if insert.query.is_none() => {
            for (variable, value) in insert.variables.iter().zip(&insert.values) {
                let column = variable.short_name();
                values.insert(
                    SmolStr::new(format!("{CHANGING_GROUP}.{column}")),
                    Expression::constant(true),
                );
                values.insert(SmolStr::new(format!("{INPUTS_GROUP}.{column}")), value.clone());
            }
        }
        Command::Update(update) => {
            let Some(id) = update.group.metadata_id() else {
                return Ok(values);
            };
            for (_, column) in adapter.columns(id)? {
                if !column.updatable {
                    continue;
                }
                let change = update
                    .changes
                    .iter()
                    .find(|change| change.symbol.short_name().eq_ignore_ascii_case(&column.name));
                values.insert(
                    SmolStr::new(format!("{CHANGING_GROUP}.{}", column.name)),
                    Expression::constant(change.is_some()),
                );
                if let Some(change) = change {
                    values.insert(
                        SmolStr::new(format!("{INPUTS_GROUP}.{}", column.name)),
                        change.value.clone(),
                    );
                }
            }
        }
        _ => {}
    }
    Ok(values)
}

/// Binds the elements named by `HAS` and `TRANSLATE` criteria to the virtual group of the
/// update procedure being resolved.
struct SelectorBinder<'s> {
    selectors: Option<&'s SelectorScope>,
    error: Option<ResolveError>,
}

impl SelectorBinder<'_> {
    fn scope(&self) -> ResolveResult<&SelectorScope> {
        self.selectors.ok_or(ResolveError::DisallowedClause {
            clause: "HAS/TRANSLATE CRITERIA",
            context: "a command outside an update procedure",
        })
    }

    fn bind_all(&self, elements: &mut [ElementSymbol]) -> ResolveResult<()> {
        let scope = self.scope()?;
        for element in elements {
            scope.bind(element)?;
        }
        Ok(())
    }

    fn bind_translate(&self, node: &mut TranslateCriteria) -> ResolveResult<()> {
        self.bind_all(&mut node.selector.elements)?;
        let scope = self.scope()?;
        for translation in &mut node.translations {
            let Expression::Element(element) = &mut translation.left else {
                return Err(ResolveError::InvalidCriteria(format!(
                    "translation target {} is not an element",
                    translation.left.render()
                )));
            };
            scope.bind(element)?;
        }
        Ok(())
    }

    fn record(&mut self, result: ResolveResult<()>) {
        if let Err(err) = result {
            self.error.get_or_insert(err);
        }
    }
}

impl VisitorMut for SelectorBinder<'_> {
    fn should_abort(&self) -> bool {
        self.error.is_some()
    }

    fn visit_has_criteria(&mut self, node: &mut HasCriteria) {
        let result = self.bind_all(&mut node.selector.elements);
        self.record(result);
    }

    fn visit_translate_criteria(&mut self, node: &mut TranslateCriteria) {
        let result = self.bind_translate(node);
        self.record(result);
    }
}
