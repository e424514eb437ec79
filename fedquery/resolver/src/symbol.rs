//! Binding of group and element names to metadata.

use std::sync::Arc;

use fedquery_ast::expression::MultipleElementSymbol;
use fedquery_ast::{ElementSymbol, GroupSymbol};
use fedquery_catalog::MetadataAdapter;
use fedquery_catalog::adapter::{FoundGroup, GroupLookup};
use fedquery_catalog::metadata::ProcedureMetadata;
use fedquery_catalog::provider::CatalogProvider;
use fedquery_catalog::temp::TempGroupKind;
use fedquery_common::constants::{CHANGING_GROUP, DVARS_GROUP, INPUTS_GROUP, NEW_GROUP, OLD_GROUP};
use fedquery_common::types::GroupMetadataId;
use tracing::trace;

use crate::error::{ResolveError, ResolveResult};
use crate::scope::GroupContext;

/// Binds a group symbol to the group its name denotes.
pub(crate) fn resolve_group(group: &mut GroupSymbol, adapter: &MetadataAdapter<'_>) -> ResolveResult<()> {
    if try_resolve_group(group, adapter)? {
        Ok(())
    } else {
        Err(ResolveError::GroupNotFound(group.lookup_name().to_string()))
    }
}

/// Like [`resolve_group`], but reports a missing group as `false` so that the caller can fall
/// back to another interpretation of the name.
pub(crate) fn try_resolve_group(
    group: &mut GroupSymbol,
    adapter: &MetadataAdapter<'_>,
) -> ResolveResult<bool> {
    if group.is_resolved() {
        return Ok(true);
    }
    let name = group.lookup_name().to_string();
    match adapter.find_group(&name)? {
        GroupLookup::Found(found) => {
            bind_group(group, &found);
            trace!(group = %group.name, id = %found.id(), "group resolved");
            Ok(true)
        }
        GroupLookup::NotFound => Ok(false),
        GroupLookup::Ambiguous(candidates) => Err(ResolveError::AmbiguousGroup {
            name,
            candidates: candidates.into_iter().map(Into::into).collect(),
        }),
    }
}

pub(crate) fn bind_group(group: &mut GroupSymbol, found: &FoundGroup<'_>) {
    if group.is_aliased() {
        group.definition = Some(found.name().clone());
    } else {
        group.name = found.name().clone();
    }
    group.is_document = found.is_document();
    if let FoundGroup::Temp(temp) = found {
        group.is_procedure = temp.kind == TempGroupKind::ProcedureRelational;
    }
    group.set_metadata_id(found.id());
}

/// A group symbol bound to `id`, for groups the resolver defines itself.
pub(crate) fn bound_group(name: &str, id: GroupMetadataId) -> GroupSymbol {
    let mut group = GroupSymbol::new(name);
    group.set_metadata_id(id);
    group
}

/// Binds an element to a column of a group in scope.
///
/// Levels are searched innermost first and the first level with a match wins; several matches
/// at that level make the name ambiguous. An element found below the innermost level is marked
/// external.
pub(crate) fn resolve_element(
    element: &mut ElementSymbol,
    adapter: &MetadataAdapter<'_>,
    scope: &GroupContext<'_>,
) -> ResolveResult<()> {
    if element.is_resolved() {
        return Ok(());
    }
    let qualifier = element.qualifier().map(str::to_owned);
    let short_name = element.short_name().to_owned();
    for (depth, level) in scope.levels().enumerate() {
        let mut matches = Vec::new();
        for group in level.groups() {
            if group.is_document {
                continue;
            }
            if qualifier
                .as_deref()
                .is_some_and(|qualifier| !group.matches_qualifier(qualifier))
            {
                continue;
            }
            let Some(id) = group.metadata_id() else {
                continue;
            };
            if let Some((element_id, column)) = adapter.find_column(id, &short_name)? {
                matches.push((group, element_id, column));
            }
        }
        match matches.len() {
            0 => continue,
            1 => {
                let (group, element_id, column) = matches.remove(0);
                let pseudo = is_procedural_group(group, adapter);
                element.bind(group.clone(), element_id, column.data_type);
                element.is_external = depth > 0 || pseudo;
                return Ok(());
            }
            _ => {
                return Err(ResolveError::AmbiguousElement {
                    name: element.name.to_string(),
                    candidates: matches
                        .iter()
                        .map(|(group, _, column)| format!("{}.{}", group.name, column.name))
                        .collect(),
                });
            }
        }
    }
    Err(ResolveError::ElementNotFound(element.name.to_string()))
}

fn is_procedural_group(group: &GroupSymbol, adapter: &MetadataAdapter<'_>) -> bool {
    let Some(GroupMetadataId::Temp(key, serial)) = group.metadata_id() else {
        return false;
    };
    adapter.temp().get_by_id(key, *serial).is_some_and(|temp| {
        matches!(
            temp.kind,
            TempGroupKind::Variables
                | TempGroupKind::Parameters
                | TempGroupKind::Cursor
                | TempGroupKind::Exception
        )
    })
}

/// Returns `true` if values may be assigned to a resolved element: declared variables and the
/// parameters of the procedure being defined.
pub(crate) fn is_assignable(element: &ElementSymbol, adapter: &MetadataAdapter<'_>) -> bool {
    let Some(GroupMetadataId::Temp(key, serial)) = element.metadata_id().map(|id| &id.group) else {
        return false;
    };
    let Some(temp) = adapter.temp().get_by_id(key, *serial) else {
        return false;
    };
    match temp.kind {
        TempGroupKind::Variables => true,
        TempGroupKind::Parameters => ![INPUTS_GROUP, CHANGING_GROUP, NEW_GROUP, OLD_GROUP, DVARS_GROUP]
            .iter()
            .any(|reserved| temp.name.eq_ignore_ascii_case(reserved)),
        _ => false,
    }
}

/// Expands `*` or `group.*` to the selectable columns of the matching groups, in group order
/// and, within a group, in declaration order.
pub(crate) fn expand_wildcard(
    wildcard: &mut MultipleElementSymbol,
    groups: &[GroupSymbol],
    adapter: &MetadataAdapter<'_>,
) -> ResolveResult<()> {
    let targets: Vec<&GroupSymbol> = groups.iter().filter(|g| wildcard.is_for(g)).collect();
    if let Some(qualifier) = &wildcard.group {
        match targets.len() {
            0 => return Err(ResolveError::GroupNotFound(qualifier.to_string())),
            1 => {}
            _ => {
                return Err(ResolveError::AmbiguousGroup {
                    name: qualifier.to_string(),
                    candidates: targets.iter().map(|g| g.name.to_string()).collect(),
                });
            }
        }
    }
    let mut elements = Vec::new();
    for group in targets {
        let Some(id) = group.metadata_id() else {
            continue;
        };
        for (element_id, column) in adapter.columns(id)? {
            if !column.selectable {
                continue;
            }
            let mut element = ElementSymbol::new(column.name.clone());
            element.bind(group.clone(), element_id, column.data_type);
            elements.push(element);
        }
    }
    wildcard.elements = Some(elements);
    Ok(())
}

/// Finds a procedure by its full name or a unique dotted suffix of it.
pub(crate) fn find_procedure(
    name: &str,
    catalog: &dyn CatalogProvider,
) -> ResolveResult<Option<Arc<ProcedureMetadata>>> {
    if let Some(procedure) = catalog.get_procedure(name)? {
        return Ok(Some(procedure));
    }
    let mut candidates = catalog.find_procedures(name)?;
    match candidates.len() {
        0 => Ok(None),
        1 => Ok(Some(candidates.remove(0))),
        _ => Err(ResolveError::AmbiguousProcedure {
            name: name.to_string(),
            candidates: candidates.iter().map(|p| p.name.to_string()).collect(),
        }),
    }
}
