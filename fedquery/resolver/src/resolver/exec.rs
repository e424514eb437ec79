use fedquery_ast::command::{ParameterDirection, SpParameter, StoredProcedure};
use fedquery_ast::expression::Constant;
use fedquery_ast::render::Render;
use fedquery_ast::{ElementSymbol, Expression};
use fedquery_catalog::MetadataAdapter;
use fedquery_catalog::metadata::{ColumnMetadata, ProcedureMetadata, ProcedureParameter};
use fedquery_catalog::temp::{TempGroup, TempGroupKind};
use fedquery_common::types::GroupMetadataId;
use tracing::trace;

use super::Resolver;
use crate::error::{ResolveError, ResolveResult};
use crate::scope::GroupContext;
use crate::symbol;

impl Resolver<'_> {
    pub(super) fn resolve_stored_procedure(
        &self,
        sp: &mut StoredProcedure,
        adapter: &mut MetadataAdapter<'_>,
        external: &GroupContext<'_>,
    ) -> ResolveResult<()> {
        let procedure = symbol::find_procedure(&sp.name, adapter.catalog())?
            .ok_or_else(|| ResolveError::ProcedureNotFound(sp.name.to_string()))?;
        sp.name = procedure.name.clone();
        sp.procedure_id = Some(procedure.id);

        let formals: Vec<&ProcedureParameter> = procedure.call_parameters().collect();
        let slots = bind_arguments(sp, &procedure.name, &formals)?;
        let converter = self.converter(adapter);
        let mut parameters = Vec::with_capacity(formals.len());
        for (position, (formal, slot)) in formals.iter().zip(slots).enumerate() {
            let mut parameter = match slot {
                Some(parameter) => parameter,
                None => missing_argument(formal, &procedure.name)?,
            };
            parameter.name = Some(formal.name.clone());
            parameter.direction = formal.direction;
            parameter.data_type = Some(formal.data_type);
            parameter.index = position + 1;
            if let Some(expression) = &mut parameter.expression {
                if !parameter.uses_default {
                    self.resolve_expression(expression, adapter, external)?;
                }
                if formal.direction.is_output() {
                    check_assignable(expression, adapter)?;
                } else {
                    converter.convert(expression, formal.data_type)?;
                }
            }
            parameters.push(parameter);
        }
        sp.parameters = parameters;

        if let Some(target) = &mut sp.return_target {
            let returned = procedure.return_parameter().ok_or_else(|| {
                ResolveError::InvalidProcedureCall {
                    procedure: procedure.name.to_string(),
                    reason: "it does not return a value".to_string(),
                }
            })?;
            symbol::resolve_element(target, adapter, external)?;
            if !symbol::is_assignable(target, adapter) {
                return Err(ResolveError::NotAssignable(target.name.to_string()));
            }
            if let Some(ty) = target.data_type() {
                if ty != returned.data_type
                    && !adapter.catalog().is_implicit_conversion(returned.data_type, ty)
                {
                    return Err(ResolveError::NoImplicitConversion {
                        expression: sp.render(),
                        from: returned.data_type,
                        to: ty,
                    });
                }
            }
        }

        if !procedure.result_columns.is_empty() {
            // the relational form only lives as long as the call
            let mut call = adapter.child();
            let id = procedure_group(&procedure, &mut call);
            let mut group = symbol::bound_group(&procedure.name, id.clone());
            group.is_procedure = true;
            sp.result_columns = call
                .columns(&id)?
                .into_iter()
                .take(procedure.result_columns.len())
                .map(|(element_id, column)| {
                    let mut element = ElementSymbol::new(column.name.clone());
                    element.bind(group.clone(), element_id, column.data_type);
                    element
                })
                .collect();
            sp.result_group = Some(group);
        }
        trace!(procedure = %sp.name, parameters = sp.parameters.len(), "procedure call resolved");
        Ok(())
    }
}

/// Defines the relational form of a procedure in the current scope: its result columns followed
/// by its input parameters.
pub(super) fn procedure_group(
    procedure: &ProcedureMetadata,
    adapter: &mut MetadataAdapter<'_>,
) -> GroupMetadataId {
    let mut columns = procedure.result_columns.clone();
    columns.extend(
        procedure
            .call_parameters()
            .filter(|parameter| parameter.direction.is_input())
            .map(|parameter| ColumnMetadata::new(parameter.name.clone(), parameter.data_type)),
    );
    adapter.temp_mut().upsert(
        TempGroup::new(procedure.name.clone(), TempGroupKind::ProcedureRelational, columns)
            .with_procedure(procedure.id),
    )
}

/// Places the call's arguments at the positions of the formal parameters they bind to.
fn bind_arguments(
    sp: &mut StoredProcedure,
    procedure: &str,
    formals: &[&ProcedureParameter],
) -> ResolveResult<Vec<Option<SpParameter>>> {
    let invalid = |reason: String| ResolveError::InvalidProcedureCall {
        procedure: procedure.to_string(),
        reason,
    };
    let supplied = std::mem::take(&mut sp.parameters);
    let mut slots: Vec<Option<SpParameter>> = vec![None; formals.len()];
    if sp.named_parameters {
        for parameter in supplied {
            let name = parameter
                .name
                .clone()
                .ok_or_else(|| invalid("positional and named arguments are mixed".to_string()))?;
            let index = formals
                .iter()
                .position(|formal| formal.name.eq_ignore_ascii_case(&name))
                .ok_or_else(|| invalid(format!("it has no parameter named {name}")))?;
            if slots[index].is_some() {
                return Err(invalid(format!("parameter {name} is passed more than once")));
            }
            slots[index] = Some(parameter);
        }
    } else {
        if supplied.len() > formals.len() {
            return Err(ResolveError::ArityMismatch {
                context: format!("EXEC {procedure}"),
                expected: formals.len(),
                actual: supplied.len(),
            });
        }
        for (slot, parameter) in slots.iter_mut().zip(supplied) {
            *slot = Some(parameter);
        }
    }
    Ok(slots)
}

/// The parameter standing for an omitted argument.
fn missing_argument(formal: &ProcedureParameter, procedure: &str) -> ResolveResult<SpParameter> {
    if formal.direction == ParameterDirection::Out {
        return Ok(SpParameter {
            name: None,
            expression: None,
            direction: formal.direction,
            data_type: None,
            index: 0,
            uses_default: false,
        });
    }
    if !formal.is_optional() {
        return Err(ResolveError::InvalidProcedureCall {
            procedure: procedure.to_string(),
            reason: format!("required parameter {} is missing", formal.name),
        });
    }
    let value = match &formal.default {
        Some(value) => Constant::new(value.clone()),
        None => Constant::typed_null(formal.data_type),
    };
    let mut parameter = SpParameter::positional(Expression::Constant(value));
    parameter.uses_default = true;
    Ok(parameter)
}

fn check_assignable(expression: &Expression, adapter: &MetadataAdapter<'_>) -> ResolveResult<()> {
    match expression {
        Expression::Element(element) if symbol::is_assignable(element, adapter) => Ok(()),
        other => Err(ResolveError::NotAssignable(other.render())),
    }
}
