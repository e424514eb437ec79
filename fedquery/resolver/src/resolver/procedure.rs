//! Resolution of procedural bodies: virtual procedures, update procedures of virtual groups and
//! trigger actions.
//!
//! Every block resolves against a child of its enclosing metadata, so variables it declares and
//! temp tables its statements create are visible to the rest of the block and to nested blocks,
//! but not to the enclosing ones. A loop cursor gets a level of its own.

use std::sync::Arc;

use fedquery_ast::procedure::{
    Block, BranchKind, BranchStatement, CreateProcedureCommand, DeclareStatement, ProcedureKind,
    Statement, TriggerAction, TriggerEvent,
};
use fedquery_ast::{ElementSymbol, Expression, GroupSymbol, Ident};
use fedquery_catalog::MetadataAdapter;
use fedquery_catalog::error::CatalogError;
use fedquery_catalog::metadata::{ColumnMetadata, GroupKind};
use fedquery_catalog::temp::{TempGroup, TempGroupKind};
use fedquery_common::constants::{
    CHANGING_GROUP, EXCEPTION_CHAIN_COLUMN, EXCEPTION_ERRORCODE_COLUMN, EXCEPTION_MESSAGE_COLUMN,
    EXCEPTION_OBJECT_COLUMN, EXCEPTION_STATE_COLUMN, INPUTS_GROUP, NEW_GROUP, OLD_GROUP,
    ROWCOUNT_VARIABLE, VARIABLES_GROUP,
};
use fedquery_common::data_type::DataTypeName;
use fedquery_common::types::GroupMetadataId;
use indexmap::IndexMap;
use smol_str::SmolStr;
use tracing::{debug, trace};

use super::{Resolver, column_type};
use crate::error::{ResolveError, ResolveResult};
use crate::scope::GroupContext;
use crate::symbol;

/// The elements `HAS` and `TRANSLATE` criteria may name inside an update procedure: the columns
/// of its virtual group, each mapped to the view definition expression computing it.
#[derive(Debug, Clone)]
pub struct SelectorScope {
    pub group: GroupSymbol,
    pub columns: Vec<ElementSymbol>,
    /// Canonical element name to the defining expression.
    pub symbol_map: IndexMap<SmolStr, Expression>,
}

impl SelectorScope {
    fn new(
        group: &GroupSymbol,
        adapter: &MetadataAdapter<'_>,
        resolver: &Resolver<'_>,
    ) -> ResolveResult<Self> {
        let invalid = |reason: String| ResolveError::InvalidDefinition {
            group: group.name.to_string(),
            reason,
        };
        let id = group
            .metadata_id()
            .cloned()
            .ok_or_else(|| ResolveError::GroupNotFound(group.name.to_string()))?;
        let catalog = adapter.catalog();
        let mut definition = id
            .as_physical()
            .map(|id| catalog.view_definition(id))
            .transpose()?
            .flatten()
            .ok_or_else(|| invalid("it has no view definition".to_string()))?;
        let mut view_adapter = MetadataAdapter::new(catalog);
        Resolver::new(resolver.options)
            .resolve_command(&mut definition, &mut view_adapter, &GroupContext::new(Vec::new()))
            .map_err(|err| invalid(err.to_string()))?;

        let projected = definition.projected_symbols();
        let columns = adapter.columns(&id)?;
        if projected.len() != columns.len() {
            return Err(invalid(format!(
                "its definition projects {} columns for {} declared",
                projected.len(),
                columns.len()
            )));
        }
        let mut elements = Vec::with_capacity(columns.len());
        let mut symbol_map = IndexMap::with_capacity(columns.len());
        for ((element_id, column), symbol) in columns.into_iter().zip(projected) {
            let mut element = ElementSymbol::new(column.name.clone());
            element.bind(group.clone(), element_id, column.data_type);
            symbol_map.insert(element.name.clone(), symbol.unwrap_symbol().clone());
            elements.push(element);
        }
        Ok(Self {
            group: group.clone(),
            columns: elements,
            symbol_map,
        })
    }

    /// Binds an element named by a selector to the virtual group column it denotes.
    pub fn bind(&self, element: &mut ElementSymbol) -> ResolveResult<()> {
        if element
            .qualifier()
            .is_some_and(|qualifier| !self.group.matches_qualifier(qualifier))
        {
            return Err(ResolveError::ElementNotFound(element.name.to_string()));
        }
        let short_name = element.short_name();
        let column = self
            .columns
            .iter()
            .find(|column| column.short_name().eq_ignore_ascii_case(short_name))
            .ok_or_else(|| ResolveError::ElementNotFound(element.name.to_string()))?;
        *element = column.clone();
        Ok(())
    }
}

struct Label {
    name: Option<Ident>,
    is_loop: bool,
}

/// State threaded through the statements of one procedural body.
#[derive(Default)]
struct BodyState {
    labels: Vec<Label>,
    /// Columns of the last statement returning results.
    result_columns: Vec<ElementSymbol>,
}

impl BodyState {
    fn enter(&mut self, label: Option<&Ident>, is_loop: bool) -> ResolveResult<()> {
        if let Some(label) = label {
            if self
                .labels
                .iter()
                .filter_map(|l| l.name.as_ref())
                .any(|existing| existing.eq_ignore_ascii_case(label))
            {
                return Err(ResolveError::DuplicateLabel(label.to_string()));
            }
        }
        self.labels.push(Label {
            name: label.cloned(),
            is_loop,
        });
        Ok(())
    }

    fn exit(&mut self) {
        self.labels.pop();
    }

    fn check_branch(&self, branch: &BranchStatement) -> ResolveResult<()> {
        let keyword = branch.kind.keyword();
        match &branch.label {
            Some(label) => {
                let target = self
                    .labels
                    .iter()
                    .rev()
                    .find(|l| l.name.as_ref().is_some_and(|name| name.eq_ignore_ascii_case(label)))
                    .ok_or_else(|| ResolveError::UnknownLabel(label.to_string()))?;
                if branch.kind != BranchKind::Leave && !target.is_loop {
                    return Err(ResolveError::InvalidBranch(format!(
                        "{keyword} {label} must name a loop"
                    )));
                }
            }
            None if branch.kind == BranchKind::Leave => {
                return Err(ResolveError::InvalidBranch(format!("{keyword} requires a label")));
            }
            None => {
                if !self.labels.iter().any(|l| l.is_loop) {
                    return Err(ResolveError::InvalidBranch(format!(
                        "{keyword} is only allowed inside a loop"
                    )));
                }
            }
        }
        Ok(())
    }
}

impl Resolver<'_> {
    /// Resolves a procedure body. For an update procedure, returns the selector scope its
    /// `HAS` and `TRANSLATE` criteria were resolved against.
    pub(super) fn resolve_procedure(
        &self,
        procedure: &mut CreateProcedureCommand,
        adapter: &mut MetadataAdapter<'_>,
        external: &GroupContext<'_>,
    ) -> ResolveResult<Option<Arc<SelectorScope>>> {
        let mut root = adapter.child();
        let mut groups = Vec::new();
        let mut selectors = None;
        match &mut procedure.kind {
            ProcedureKind::Stored { name } => {
                let metadata = symbol::find_procedure(name, root.catalog())?
                    .ok_or_else(|| ResolveError::ProcedureNotFound(name.to_string()))?;
                *name = metadata.name.clone();
                let parameters: Vec<ColumnMetadata> = metadata
                    .call_parameters()
                    .map(|p| ColumnMetadata::new(p.name.clone(), p.data_type))
                    .collect();
                if !parameters.is_empty() {
                    groups.push(pseudo_group(&mut root, &metadata.name, parameters));
                }
                debug!(procedure = %metadata.name, "resolving virtual procedure");
            }
            ProcedureKind::Update {
                virtual_group,
                event,
            } => {
                let columns = resolve_view(virtual_group, &root)?;
                if *event != TriggerEvent::Delete {
                    let changing = changing_columns(&columns);
                    groups.push(pseudo_group(&mut root, INPUTS_GROUP, columns));
                    groups.push(pseudo_group(&mut root, CHANGING_GROUP, changing));
                }
                let scope = SelectorScope::new(virtual_group, &root, self)?;
                debug!(
                    group = %virtual_group.name,
                    event = event.keyword(),
                    columns = scope.columns.len(),
                    "resolving update procedure"
                );
                selectors = Some(Arc::new(scope));
            }
        }
        groups.push(variables_group(&mut root)?);

        let resolver = Resolver {
            options: self.options,
            selectors: selectors.clone(),
        };
        let scope = external.child(groups);
        let mut state = BodyState::default();
        resolver.resolve_block(&mut procedure.block, &root, &scope, &mut state)?;
        procedure.result_columns = state.result_columns;
        Ok(selectors)
    }

    pub(super) fn resolve_trigger_action(
        &self,
        action: &mut TriggerAction,
        adapter: &MetadataAdapter<'_>,
        external: &GroupContext<'_>,
    ) -> ResolveResult<()> {
        let columns = resolve_view(&mut action.view, adapter)?;
        let mut root = adapter.child();
        let mut groups = Vec::new();
        if matches!(action.event, TriggerEvent::Insert | TriggerEvent::Update) {
            groups.push(pseudo_group(&mut root, NEW_GROUP, columns.clone()));
        }
        if matches!(action.event, TriggerEvent::Update | TriggerEvent::Delete) {
            groups.push(pseudo_group(&mut root, OLD_GROUP, columns.clone()));
        }
        if action.event == TriggerEvent::Update {
            groups.push(pseudo_group(&mut root, CHANGING_GROUP, changing_columns(&columns)));
        }
        groups.push(variables_group(&mut root)?);
        debug!(view = %action.view.name, event = action.event.keyword(), "resolving trigger action");

        let scope = external.child(groups);
        let mut state = BodyState::default();
        self.resolve_block(&mut action.block, &root, &scope, &mut state)
    }

    fn resolve_block(
        &self,
        block: &mut Block,
        adapter: &MetadataAdapter<'_>,
        scope: &GroupContext<'_>,
        state: &mut BodyState,
    ) -> ResolveResult<()> {
        trace!(label = ?block.label, statements = block.statements.len(), "enter block");
        state.enter(block.label.as_ref(), false)?;
        let mut local = adapter.child();
        self.resolve_statements(&mut block.statements, &mut local, scope, state)?;
        if let Some(name) = &block.exception_group {
            let mut handler = local.child();
            let id = handler.temp_mut().insert(TempGroup::new(
                name.clone(),
                TempGroupKind::Exception,
                exception_columns(),
            ))?;
            let handler_scope = scope.child(vec![symbol::bound_group(name, id)]);
            self.resolve_statements(
                &mut block.exception_statements,
                &mut handler,
                &handler_scope,
                state,
            )?;
        }
        state.exit();
        trace!(label = ?block.label, "exit block");
        Ok(())
    }

    fn resolve_statements(
        &self,
        statements: &mut [Statement],
        adapter: &mut MetadataAdapter<'_>,
        scope: &GroupContext<'_>,
        state: &mut BodyState,
    ) -> ResolveResult<()> {
        for statement in statements {
            self.resolve_statement(statement, adapter, scope, state)?;
        }
        Ok(())
    }

    fn resolve_statement(
        &self,
        statement: &mut Statement,
        adapter: &mut MetadataAdapter<'_>,
        scope: &GroupContext<'_>,
        state: &mut BodyState,
    ) -> ResolveResult<()> {
        match statement {
            Statement::Declare(declare) => self.resolve_declare(declare, adapter, scope),
            Statement::Assignment(assignment) => {
                self.resolve_expression(&mut assignment.value, adapter, scope)?;
                symbol::resolve_element(&mut assignment.variable, adapter, scope)?;
                if !symbol::is_assignable(&assignment.variable, adapter) {
                    return Err(ResolveError::NotAssignable(assignment.variable.name.to_string()));
                }
                if let Some(ty) = assignment.variable.data_type() {
                    self.converter(adapter).convert(&mut assignment.value, ty)?;
                }
                Ok(())
            }
            Statement::Command(statement) => {
                let command = &mut *statement.command;
                self.resolve_command(command, adapter, scope)?;
                if command.returns_results() {
                    state.result_columns = command
                        .projected_symbols()
                        .iter()
                        .map(|symbol| {
                            ElementSymbol::typed(
                                symbol.output_name().unwrap_or_default(),
                                column_type(symbol.data_type()),
                            )
                        })
                        .collect();
                }
                Ok(())
            }
            Statement::If(statement) => {
                self.resolve_criteria(&mut statement.condition, adapter, scope)?;
                self.resolve_block(&mut statement.then_block, adapter, scope, state)?;
                if let Some(else_block) = &mut statement.else_block {
                    self.resolve_block(else_block, adapter, scope, state)?;
                }
                Ok(())
            }
            Statement::Loop(statement) => {
                self.resolve_subcommand(&mut statement.command, adapter, scope)?;
                if !statement.command.returns_results() {
                    return Err(ResolveError::InvalidSubquery(format!(
                        "LOOP ON cursor {} needs a command returning results",
                        statement.cursor
                    )));
                }
                if adapter
                    .temp()
                    .get(&statement.cursor)
                    .is_some_and(|group| group.kind == TempGroupKind::Cursor)
                {
                    return Err(ResolveError::DuplicateGroup(statement.cursor.to_string()));
                }
                let columns =
                    super::temp_columns(&statement.command.projected_symbols(), &statement.cursor)?;
                let mut cursor = adapter.child();
                let id = cursor.temp_mut().insert(TempGroup::new(
                    statement.cursor.clone(),
                    TempGroupKind::Cursor,
                    columns,
                ))?;
                let cursor_scope = scope.child(vec![symbol::bound_group(&statement.cursor, id)]);
                state.enter(statement.label.as_ref(), true)?;
                self.resolve_block(&mut statement.block, &cursor, &cursor_scope, state)?;
                state.exit();
                Ok(())
            }
            Statement::While(statement) => {
                self.resolve_criteria(&mut statement.condition, adapter, scope)?;
                state.enter(statement.label.as_ref(), true)?;
                self.resolve_block(&mut statement.block, adapter, scope, state)?;
                state.exit();
                Ok(())
            }
            Statement::Block(block) => self.resolve_block(block, adapter, scope, state),
            Statement::Raise(statement) => {
                self.resolve_expression(&mut statement.expression, adapter, scope)
            }
            Statement::Return(statement) => match &mut statement.expression {
                Some(expression) => self.resolve_expression(expression, adapter, scope),
                None => Ok(()),
            },
            Statement::Branch(branch) => state.check_branch(branch),
        }
    }

    /// The initial value resolves before the variable is declared, so it cannot refer to the
    /// variable itself.
    fn resolve_declare(
        &self,
        declare: &mut DeclareStatement,
        adapter: &mut MetadataAdapter<'_>,
        scope: &GroupContext<'_>,
    ) -> ResolveResult<()> {
        if let Some(value) = &mut declare.value {
            self.resolve_expression(value, adapter, scope)?;
        }
        if declare
            .variable
            .qualifier()
            .is_some_and(|qualifier| !qualifier.eq_ignore_ascii_case(VARIABLES_GROUP))
        {
            return Err(ResolveError::NotAssignable(declare.variable.name.to_string()));
        }
        let name = declare.variable.short_name().to_owned();
        let id = adapter
            .temp_mut()
            .add_variable(&name, declare.data_type)
            .map_err(|err| match err {
                CatalogError::DuplicateColumn { .. } => ResolveError::DuplicateVariable(name.clone()),
                other => other.into(),
            })?;
        let group = symbol::bound_group(VARIABLES_GROUP, id.group.clone());
        declare.variable.bind(group, id, declare.data_type);
        declare.variable.is_external = true;
        if let Some(value) = &mut declare.value {
            self.converter(adapter).convert(value, declare.data_type)?;
        }
        trace!(variable = %declare.variable.name, "variable declared");
        Ok(())
    }
}

/// Binds the virtual group an update procedure or trigger is defined on, returning its columns.
fn resolve_view(
    group: &mut GroupSymbol,
    adapter: &MetadataAdapter<'_>,
) -> ResolveResult<Vec<ColumnMetadata>> {
    symbol::resolve_group(group, adapter)?;
    let Some(id) = group.metadata_id().and_then(GroupMetadataId::as_physical) else {
        return Err(ResolveError::NotVirtual(group.name.to_string()));
    };
    let metadata = adapter.catalog().get_group_by_id(id)?;
    if metadata.kind != GroupKind::Virtual {
        return Err(ResolveError::NotVirtual(group.name.to_string()));
    }
    Ok(metadata.columns.clone())
}

fn pseudo_group(adapter: &mut MetadataAdapter<'_>, name: &str, columns: Vec<ColumnMetadata>) -> GroupSymbol {
    let id = adapter
        .temp_mut()
        .upsert(TempGroup::new(name, TempGroupKind::Parameters, columns));
    symbol::bound_group(name, id)
}

fn changing_columns(columns: &[ColumnMetadata]) -> Vec<ColumnMetadata> {
    columns
        .iter()
        .map(|c| ColumnMetadata::new(c.name.clone(), DataTypeName::Boolean))
        .collect()
}

/// Declares `ROWCOUNT` and returns the `VARIABLES` group every block of the body resolves with.
fn variables_group(adapter: &mut MetadataAdapter<'_>) -> ResolveResult<GroupSymbol> {
    let id = adapter
        .temp_mut()
        .add_variable(ROWCOUNT_VARIABLE, DataTypeName::Integer)?;
    Ok(symbol::bound_group(VARIABLES_GROUP, id.group))
}

fn exception_columns() -> Vec<ColumnMetadata> {
    vec![
        ColumnMetadata::new(EXCEPTION_STATE_COLUMN, DataTypeName::String),
        ColumnMetadata::new(EXCEPTION_ERRORCODE_COLUMN, DataTypeName::Integer),
        ColumnMetadata::new(EXCEPTION_MESSAGE_COLUMN, DataTypeName::String),
        ColumnMetadata::new(EXCEPTION_OBJECT_COLUMN, DataTypeName::Object),
        ColumnMetadata::new(EXCEPTION_CHAIN_COLUMN, DataTypeName::Object),
    ]
}
