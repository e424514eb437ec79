//! Groups that exist only while a command is being resolved.
//!
//! Stores form a chain: a nested scope gets a child store that reads through to its parent and
//! records only its own definitions, so nothing defined in a nested scope leaks outward.
//!
//! Every definition takes a serial from the root of the chain. A group id carries it, so a symbol
//! bound in an outer scope keeps naming that scope's group when a nested scope defines another
//! group with the same name.

use std::sync::atomic::{AtomicU32, Ordering};

use fedquery_common::constants::VARIABLES_GROUP;
use fedquery_common::data_type::DataTypeName;
use fedquery_common::types::{ElementMetadataId, GroupMetadataId, ProcedureId, name_key};
use indexmap::IndexMap;
use serde::Serialize;
use smol_str::SmolStr;
use tracing::trace;

use crate::error::{CatalogError, CatalogResult};
use crate::metadata::ColumnMetadata;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum TempGroupKind {
    /// A derived table.
    Derived,
    /// `CREATE LOCAL TEMPORARY TABLE`, or a table defined implicitly by `INTO` or `INSERT INTO`.
    TempTable,
    /// A procedure call used as a table: result columns followed by input parameters.
    ProcedureRelational,
    /// Declared procedure variables.
    Variables,
    /// The row variable of a `LOOP ON` cursor.
    Cursor,
    /// `DVARS` bindings of a dynamic command, `INPUTS`, `CHANGING`, `NEW` and `OLD`.
    Parameters,
    /// The group bound by a block's `EXCEPTION` clause.
    Exception,
    /// An element of a document model, used to correlate sub-commands.
    Document,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TempGroup {
    pub name: SmolStr,
    pub kind: TempGroupKind,
    pub columns: Vec<ColumnMetadata>,
    pub primary_key: Vec<SmolStr>,
    /// The procedure behind a procedure relational group.
    pub procedure: Option<ProcedureId>,
    /// Assigned by the store on definition.
    serial: u32,
}

impl TempGroup {
    pub fn new(name: impl Into<SmolStr>, kind: TempGroupKind, columns: Vec<ColumnMetadata>) -> Self {
        Self {
            name: name.into(),
            kind,
            columns,
            primary_key: Vec::new(),
            procedure: None,
            serial: 0,
        }
    }

    #[inline]
    pub fn with_primary_key(mut self, primary_key: Vec<SmolStr>) -> Self {
        self.primary_key = primary_key;
        self
    }

    #[inline]
    pub fn with_procedure(mut self, procedure: ProcedureId) -> Self {
        self.procedure = Some(procedure);
        self
    }

    #[inline]
    pub fn id(&self) -> GroupMetadataId {
        GroupMetadataId::Temp(name_key(&self.name), self.serial)
    }

    pub fn column(&self, name: &str) -> Option<(usize, &ColumnMetadata)> {
        self.columns
            .iter()
            .enumerate()
            .find(|(_, column)| column.name.eq_ignore_ascii_case(name))
    }

    /// An overlay group continues in the parent store: a nested block adds variables to those
    /// of the enclosing blocks instead of hiding them.
    #[inline]
    pub fn is_overlay(&self) -> bool {
        self.kind == TempGroupKind::Variables
    }
}

#[derive(Debug, Default)]
pub struct TempMetadataStore<'p> {
    parent: Option<&'p TempMetadataStore<'p>>,
    groups: IndexMap<SmolStr, TempGroup>,
    /// Last serial handed out. Only the root's counter is used.
    serial: AtomicU32,
}

impl TempMetadataStore<'static> {
    pub fn new() -> Self {
        Self::default()
    }
}

impl<'p> TempMetadataStore<'p> {
    /// A store for a nested scope.
    pub fn child(&self) -> TempMetadataStore<'_> {
        TempMetadataStore {
            parent: Some(self),
            groups: IndexMap::new(),
            serial: AtomicU32::new(0),
        }
    }

    fn next_serial(&self) -> u32 {
        let mut root = self;
        while let Some(parent) = root.parent {
            root = parent;
        }
        root.serial.fetch_add(1, Ordering::Relaxed) + 1
    }

    /// This store followed by its ancestors, innermost first.
    pub fn levels(&self) -> impl Iterator<Item = &TempMetadataStore<'p>> {
        std::iter::successors(Some(self), |store| store.parent)
    }

    /// Finds a group by name, searching enclosing scopes outward.
    pub fn get(&self, name: &str) -> Option<&TempGroup> {
        let key = name_key(name);
        self.levels().find_map(|store| store.groups.get(&key))
    }

    #[inline]
    pub fn contains_local(&self, name: &str) -> bool {
        self.groups.contains_key(&name_key(name))
    }

    /// Groups defined at this level, in definition order.
    pub fn local_groups(&self) -> impl Iterator<Item = &TempGroup> {
        self.groups.values()
    }

    /// Finds the group a bound id names, even where a nested scope hides its name.
    pub fn get_by_id(&self, key: &str, serial: u32) -> Option<&TempGroup> {
        self.levels()
            .find_map(|store| store.groups.get(key).filter(|group| group.serial == serial))
    }

    /// The levels a bound group reads from. An overlay group reads from the innermost level, so
    /// a nested block sees its own variables through the group bound by the enclosing block.
    /// Any other group reads from the level that defined it outward.
    fn levels_from<'s, 'k>(
        &'s self,
        key: &'k str,
        serial: u32,
    ) -> impl Iterator<Item = &'s TempMetadataStore<'p>> + use<'s, 'k, 'p> {
        let overlay = self
            .get_by_id(key, serial)
            .is_some_and(TempGroup::is_overlay);
        self.levels().skip_while(move |store| {
            !overlay
                && store
                    .groups
                    .get(key)
                    .is_none_or(|group| group.serial != serial)
        })
    }

    /// Defines a group at this level. A group of the same name in an enclosing scope is hidden.
    pub fn insert(&mut self, mut group: TempGroup) -> CatalogResult<GroupMetadataId> {
        let key = name_key(&group.name);
        if self.groups.contains_key(&key) {
            return Err(CatalogError::TempGroupAlreadyExists(group.name.to_string()));
        }
        group.serial = self.next_serial();
        trace!(
            name = %group.name,
            kind = ?group.kind,
            serial = group.serial,
            columns = group.columns.len(),
            "temp group defined"
        );
        let id = group.id();
        self.groups.insert(key, group);
        Ok(id)
    }

    /// Defines or redefines a group at this level.
    pub fn upsert(&mut self, mut group: TempGroup) -> GroupMetadataId {
        group.serial = self.next_serial();
        let id = group.id();
        self.groups.insert(name_key(&group.name), group);
        id
    }

    /// Finds a column of the group named `group`, reading through overlay groups.
    pub fn find_column(
        &self,
        group: &str,
        column: &str,
    ) -> Option<(ElementMetadataId, &ColumnMetadata)> {
        let key = name_key(group);
        column_in(self.levels(), &key, column)
    }

    /// Finds a column of the group a bound id names.
    pub fn find_bound_column(
        &self,
        key: &str,
        serial: u32,
        column: &str,
    ) -> Option<(ElementMetadataId, &ColumnMetadata)> {
        column_in(self.levels_from(key, serial), key, column)
    }

    /// Columns of the group named `group`. Overlay groups list outer scopes' columns first.
    pub fn columns(&self, group: &str) -> Vec<(ElementMetadataId, &ColumnMetadata)> {
        let key = name_key(group);
        columns_in(self.levels(), &key)
    }

    /// Columns of the group a bound id names.
    pub fn bound_columns(&self, key: &str, serial: u32) -> Vec<(ElementMetadataId, &ColumnMetadata)> {
        columns_in(self.levels_from(key, serial), key)
    }

    /// Declares a variable in this level's `VARIABLES` group.
    ///
    /// Redeclaring a variable of the same block is an error; hiding one of an enclosing block is
    /// not.
    pub fn add_variable(
        &mut self,
        name: &str,
        data_type: DataTypeName,
    ) -> CatalogResult<ElementMetadataId> {
        let serial = self.next_serial();
        let variables = self.groups.entry(name_key(VARIABLES_GROUP)).or_insert_with(|| {
            let mut group = TempGroup::new(VARIABLES_GROUP, TempGroupKind::Variables, Vec::new());
            group.serial = serial;
            group
        });
        if variables.column(name).is_some() {
            return Err(CatalogError::DuplicateColumn {
                group: VARIABLES_GROUP.to_string(),
                column: name.to_string(),
            });
        }
        variables.columns.push(ColumnMetadata::new(name, data_type));
        let position = variables.columns.len() - 1;
        Ok(ElementMetadataId::new(variables.id(), name, position))
    }

    /// Removes and returns this level's groups of the given kinds, keeping the rest.
    pub fn take_groups(&mut self, kinds: &[TempGroupKind]) -> Vec<TempGroup> {
        let (taken, kept): (IndexMap<_, _>, IndexMap<_, _>) = std::mem::take(&mut self.groups)
            .into_iter()
            .partition(|(_, group)| kinds.contains(&group.kind));
        self.groups = kept;
        taken.into_values().collect()
    }
}

fn column_in<'s, 'p: 's>(
    levels: impl Iterator<Item = &'s TempMetadataStore<'p>>,
    key: &str,
    column: &str,
) -> Option<(ElementMetadataId, &'s ColumnMetadata)> {
    for store in levels {
        let Some(found) = store.groups.get(key) else {
            continue;
        };
        if let Some((position, metadata)) = found.column(column) {
            return Some((
                ElementMetadataId::new(found.id(), metadata.name.clone(), position),
                metadata,
            ));
        }
        if !found.is_overlay() {
            return None;
        }
    }
    None
}

fn columns_in<'s, 'p: 's>(
    levels: impl Iterator<Item = &'s TempMetadataStore<'p>>,
    key: &str,
) -> Vec<(ElementMetadataId, &'s ColumnMetadata)> {
    let mut found_levels = Vec::new();
    for store in levels {
        if let Some(found) = store.groups.get(key) {
            found_levels.push(found);
            if !found.is_overlay() {
                break;
            }
        }
    }
    found_levels
        .into_iter()
        .rev()
        .flat_map(|found| {
            found.columns.iter().enumerate().map(|(position, metadata)| {
                (
                    ElementMetadataId::new(found.id(), metadata.name.clone(), position),
                    metadata,
                )
            })
        })
        .collect()
}
