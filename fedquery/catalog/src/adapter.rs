//! The permanent catalog and the temp store of the current scope behind one lookup surface.

use std::sync::Arc;

use fedquery_common::types::{ElementMetadataId, GroupMetadataId};
use smol_str::SmolStr;

use crate::error::CatalogResult;
use crate::metadata::{ColumnMetadata, GroupKind, GroupMetadata};
use crate::provider::CatalogProvider;
use crate::temp::{TempGroup, TempMetadataStore};

/// A group found by name, either in the catalog or in the temp store.
#[derive(Debug, Clone)]
pub enum FoundGroup<'t> {
    Temp(&'t TempGroup),
    Catalog(Arc<GroupMetadata>),
}

impl FoundGroup<'_> {
    pub fn id(&self) -> GroupMetadataId {
        match self {
            FoundGroup::Temp(group) => group.id(),
            FoundGroup::Catalog(group) => GroupMetadataId::Physical(group.id),
        }
    }

    /// Canonical name of the group.
    pub fn name(&self) -> &SmolStr {
        match self {
            FoundGroup::Temp(group) => &group.name,
            FoundGroup::Catalog(group) => &group.name,
        }
    }

    pub fn columns(&self) -> &[ColumnMetadata] {
        match self {
            FoundGroup::Temp(group) => &group.columns,
            FoundGroup::Catalog(group) => &group.columns,
        }
    }

    #[inline]
    pub fn is_document(&self) -> bool {
        matches!(self, FoundGroup::Catalog(group) if group.kind == GroupKind::Document)
    }
}

#[derive(Debug, Clone)]
pub enum GroupLookup<'t> {
    Found(FoundGroup<'t>),
    NotFound,
    /// Canonical names of every candidate.
    Ambiguous(Vec<SmolStr>),
}

#[derive(Debug)]
pub struct MetadataAdapter<'a> {
    catalog: &'a dyn CatalogProvider,
    temp: TempMetadataStore<'a>,
}

impl<'a> MetadataAdapter<'a> {
    pub fn new(catalog: &'a dyn CatalogProvider) -> Self {
        Self {
            catalog,
            temp: TempMetadataStore::default(),
        }
    }

    /// An adapter for a nested scope, sharing the catalog and reading through this temp store.
    pub fn child(&self) -> MetadataAdapter<'_> {
        MetadataAdapter {
            catalog: self.catalog,
            temp: self.temp.child(),
        }
    }

    #[inline]
    pub fn catalog(&self) -> &'a dyn CatalogProvider {
        self.catalog
    }

    #[inline]
    pub fn temp(&self) -> &TempMetadataStore<'a> {
        &self.temp
    }

    #[inline]
    pub fn temp_mut(&mut self) -> &mut TempMetadataStore<'a> {
        &mut self.temp
    }

    #[inline]
    pub fn into_temp(self) -> TempMetadataStore<'a> {
        self.temp
    }

    /// Finds a group by name: temp groups first, then catalog groups by full name, then catalog
    /// groups whose name ends with `.name`.
    pub fn find_group(&self, name: &str) -> CatalogResult<GroupLookup<'_>> {
        if let Some(group) = self.temp.get(name) {
            return Ok(GroupLookup::Found(FoundGroup::Temp(group)));
        }
        if let Some(group) = self.catalog.get_group(name)? {
            return Ok(GroupLookup::Found(FoundGroup::Catalog(group)));
        }
        let mut candidates = self.catalog.find_groups(name)?;
        Ok(match candidates.len() {
            0 => GroupLookup::NotFound,
            1 => GroupLookup::Found(FoundGroup::Catalog(candidates.remove(0))),
            _ => GroupLookup::Ambiguous(candidates.iter().map(|g| g.name.clone()).collect()),
        })
    }

    /// Retrieves the group a symbol is already bound to.
    pub fn group(&self, id: &GroupMetadataId) -> CatalogResult<Option<FoundGroup<'_>>> {
        Ok(match id {
            GroupMetadataId::Physical(id) => {
                Some(FoundGroup::Catalog(self.catalog.get_group_by_id(*id)?))
            }
            GroupMetadataId::Temp(key, serial) => {
                self.temp.get_by_id(key, *serial).map(FoundGroup::Temp)
            }
        })
    }

    /// Finds a column of a bound group.
    pub fn find_column(
        &self,
        group: &GroupMetadataId,
        column: &str,
    ) -> CatalogResult<Option<(ElementMetadataId, ColumnMetadata)>> {
        Ok(match group {
            GroupMetadataId::Physical(id) => {
                let metadata = self.catalog.get_group_by_id(*id)?;
                metadata.column(column).map(|(position, found)| {
                    (
                        ElementMetadataId::new(group.clone(), found.name.clone(), position),
                        found.clone(),
                    )
                })
            }
            GroupMetadataId::Temp(key, serial) => self
                .temp
                .find_bound_column(key, *serial, column)
                .map(|(id, found)| (id, found.clone())),
        })
    }

    /// Columns of a bound group in declaration order.
    pub fn columns(
        &self,
        group: &GroupMetadataId,
    ) -> CatalogResult<Vec<(ElementMetadataId, ColumnMetadata)>> {
        Ok(match group {
            GroupMetadataId::Physical(id) => self
                .catalog
                .get_group_by_id(*id)?
                .columns
                .iter()
                .enumerate()
                .map(|(position, column)| {
                    (
                        ElementMetadataId::new(group.clone(), column.name.clone(), position),
                        column.clone(),
                    )
                })
                .collect(),
            GroupMetadataId::Temp(key, serial) => self
                .temp
                .bound_columns(key, *serial)
                .into_iter()
                .map(|(id, column)| (id, column.clone()))
                .collect(),
        })
    }
}
