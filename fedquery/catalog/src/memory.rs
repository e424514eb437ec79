//! A catalog held entirely in memory, built up front and read-only afterwards.

use std::collections::HashMap;
use std::sync::Arc;

use fedquery_ast::Command;
use fedquery_ast::symbol::has_dotted_suffix;
use fedquery_common::function::FunctionDescriptor;
use fedquery_common::types::{GroupId, ProcedureId, name_key};
use indexmap::IndexMap;
use indexmap::map::Entry;
use smol_str::SmolStr;

use crate::document::DocumentModel;
use crate::error::{CatalogError, CatalogResult};
use crate::function::FunctionLibrary;
use crate::metadata::{ColumnMetadata, GroupKind, GroupMetadata, ProcedureMetadata};
use crate::provider::CatalogProvider;

#[derive(Debug)]
pub struct MemoryCatalog {
    groups: IndexMap<SmolStr, Arc<GroupMetadata>>,
    group_ids: HashMap<GroupId, SmolStr>,
    procedures: IndexMap<SmolStr, Arc<ProcedureMetadata>>,
    procedure_ids: HashMap<ProcedureId, SmolStr>,
    views: HashMap<GroupId, Command>,
    procedure_bodies: HashMap<ProcedureId, Command>,
    documents: HashMap<GroupId, Arc<DocumentModel>>,
    functions: FunctionLibrary,
    next_group_id: u32,
    next_procedure_id: u32,
}

impl Default for MemoryCatalog {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryCatalog {
    pub fn new() -> Self {
        Self {
            groups: IndexMap::new(),
            group_ids: HashMap::new(),
            procedures: IndexMap::new(),
            procedure_ids: HashMap::new(),
            views: HashMap::new(),
            procedure_bodies: HashMap::new(),
            documents: HashMap::new(),
            functions: FunctionLibrary::builtin().clone(),
            next_group_id: 0,
            next_procedure_id: 0,
        }
    }

    pub fn add_group(
        &mut self,
        name: &str,
        kind: GroupKind,
        columns: Vec<ColumnMetadata>,
    ) -> CatalogResult<GroupId> {
        for (i, column) in columns.iter().enumerate() {
            if columns[..i]
                .iter()
                .any(|other| other.name.eq_ignore_ascii_case(&column.name))
            {
                return Err(CatalogError::DuplicateColumn {
                    group: name.to_string(),
                    column: column.name.to_string(),
                });
            }
        }
        let id = GroupId::MIN.saturating_add(self.next_group_id);
        match self.groups.entry(name_key(name)) {
            Entry::Occupied(_) => Err(CatalogError::GroupAlreadyExists(name.to_string())),
            Entry::Vacant(e) => {
                self.group_ids.insert(id, e.key().clone());
                e.insert(Arc::new(GroupMetadata::new(id, name, kind, columns)));
                self.next_group_id += 1;
                Ok(id)
            }
        }
    }

    #[inline]
    pub fn add_physical_group(
        &mut self,
        name: &str,
        columns: Vec<ColumnMetadata>,
    ) -> CatalogResult<GroupId> {
        self.add_group(name, GroupKind::Physical, columns)
    }

    /// Adds a view defined by `definition`.
    pub fn add_virtual_group(
        &mut self,
        name: &str,
        columns: Vec<ColumnMetadata>,
        definition: Command,
    ) -> CatalogResult<GroupId> {
        let id = self.add_group(name, GroupKind::Virtual, columns)?;
        self.views.insert(id, definition);
        Ok(id)
    }

    pub fn add_document_group(&mut self, name: &str, model: DocumentModel) -> CatalogResult<GroupId> {
        let id = self.add_group(name, GroupKind::Document, Vec::new())?;
        self.documents.insert(id, Arc::new(model));
        Ok(id)
    }

    /// Adds a procedure. The id set on `metadata` is replaced by a freshly allocated one.
    pub fn add_procedure(&mut self, mut metadata: ProcedureMetadata) -> CatalogResult<ProcedureId> {
        let id = ProcedureId::MIN.saturating_add(self.next_procedure_id);
        match self.procedures.entry(name_key(&metadata.name)) {
            Entry::Occupied(_) => Err(CatalogError::ProcedureAlreadyExists(
                metadata.name.to_string(),
            )),
            Entry::Vacant(e) => {
                metadata.id = id;
                self.procedure_ids.insert(id, e.key().clone());
                e.insert(Arc::new(metadata));
                self.next_procedure_id += 1;
                Ok(id)
            }
        }
    }

    pub fn add_virtual_procedure(
        &mut self,
        metadata: ProcedureMetadata,
        body: Command,
    ) -> CatalogResult<ProcedureId> {
        let id = self.add_procedure(metadata.virtual_procedure())?;
        self.procedure_bodies.insert(id, body);
        Ok(id)
    }

    #[inline]
    pub fn register_function(&mut self, descriptor: FunctionDescriptor) {
        self.functions.register(descriptor);
    }
}

fn matches_partial(key: &str, partial: &str) -> bool {
    key.eq_ignore_ascii_case(partial) || has_dotted_suffix(key, partial)
}

impl CatalogProvider for MemoryCatalog {
    fn get_group(&self, name: &str) -> CatalogResult<Option<Arc<GroupMetadata>>> {
        Ok(self.groups.get(&name_key(name)).cloned())
    }

    fn find_groups(&self, partial: &str) -> CatalogResult<Vec<Arc<GroupMetadata>>> {
        Ok(self
            .groups
            .iter()
            .filter(|(key, _)| matches_partial(key, partial))
            .map(|(_, group)| group.clone())
            .collect())
    }

    fn get_group_by_id(&self, id: GroupId) -> CatalogResult<Arc<GroupMetadata>> {
        self.group_ids
            .get(&id)
            .and_then(|key| self.groups.get(key))
            .cloned()
            .ok_or(CatalogError::GroupNotFound(id))
    }

    fn get_procedure(&self, name: &str) -> CatalogResult<Option<Arc<ProcedureMetadata>>> {
        Ok(self.procedures.get(&name_key(name)).cloned())
    }

    fn find_procedures(&self, partial: &str) -> CatalogResult<Vec<Arc<ProcedureMetadata>>> {
        Ok(self
            .procedures
            .iter()
            .filter(|(key, _)| matches_partial(key, partial))
            .map(|(_, procedure)| procedure.clone())
            .collect())
    }

    fn get_procedure_by_id(&self, id: ProcedureId) -> CatalogResult<Arc<ProcedureMetadata>> {
        self.procedure_ids
            .get(&id)
            .and_then(|key| self.procedures.get(key))
            .cloned()
            .ok_or(CatalogError::ProcedureNotFound(id))
    }

    fn view_definition(&self, id: GroupId) -> CatalogResult<Option<Command>> {
        Ok(self.views.get(&id).cloned())
    }

    fn procedure_definition(&self, id: ProcedureId) -> CatalogResult<Option<Command>> {
        Ok(self.procedure_bodies.get(&id).cloned())
    }

    fn document_model(&self, id: GroupId) -> CatalogResult<Option<Arc<DocumentModel>>> {
        Ok(self.documents.get(&id).cloned())
    }

    fn functions(&self) -> &FunctionLibrary {
        &self.functions
    }
}
