use fedquery_ast::criteria::TranslateCriteria;
use fedquery_ast::{Command, Criteria, Expression};
use fedquery_catalog::temp::TempGroupKind;
use fedquery_catalog::{CatalogRef, MetadataAdapter};
use fedquery_resolver::translate::CriteriaTranslator;
use fedquery_resolver::{Resolution, Resolver, ResolverOptions};
use indexmap::IndexMap;
use rayon::prelude::*;
use serde::Serialize;
use smol_str::SmolStr;
use tracing::debug;

use crate::error::Result;

/// Resolves commands against one catalog with one set of options.
///
/// The catalog is only read, so a resolver can be shared by any number of threads.
#[derive(Debug, Clone)]
pub struct QueryResolver {
    catalog: CatalogRef,
    options: ResolverOptions,
}

/// What resolving a command produces besides the rewritten command.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ResolveOutcome {
    /// Values an insert or update passes to the update procedure of its target.
    pub variable_values: IndexMap<SmolStr, Expression>,
    /// Virtual element name to defining expression, for update procedure bodies.
    pub compensation_map: IndexMap<SmolStr, Expression>,
    /// Temp tables the command defines, in definition order.
    pub temp_groups: Vec<SmolStr>,
}

impl ResolveOutcome {
    fn new(resolution: Resolution, temp_groups: Vec<SmolStr>) -> Self {
        Self {
            variable_values: resolution.variable_values,
            compensation_map: resolution.compensation_map,
            temp_groups,
        }
    }
}

impl QueryResolver {
    pub fn new(catalog: CatalogRef, options: ResolverOptions) -> Self {
        Self { catalog, options }
    }

    /// A resolver with options read from JSON. Missing fields take their defaults.
    pub fn with_json_options(catalog: CatalogRef, options: &str) -> Result<Self> {
        Ok(Self::new(catalog, ResolverOptions::from_json(options)?))
    }

    #[inline]
    pub fn options(&self) -> &ResolverOptions {
        &self.options
    }

    #[inline]
    pub fn catalog(&self) -> &CatalogRef {
        &self.catalog
    }

    /// Resolves one command on its own. Temp tables it defines are discarded afterwards.
    pub fn resolve(&self, command: &mut Command) -> Result<ResolveOutcome> {
        self.session().resolve(command)
    }

    /// A session in which temp tables defined by one command are visible to the next.
    pub fn session(&self) -> Session<'_> {
        Session {
            resolver: Resolver::new(&self.options),
            adapter: MetadataAdapter::new(self.catalog.as_ref()),
        }
    }

    /// Resolves independent commands in parallel. Results are in input order.
    pub fn resolve_batch(&self, commands: &mut [Command]) -> Vec<Result<ResolveOutcome>> {
        debug!(commands = commands.len(), "resolving batch");
        commands
            .par_iter_mut()
            .map(|command| self.resolve(command))
            .collect()
    }

    /// The part of `criteria` picked out by a resolved `TRANSLATE CRITERIA` predicate, rewritten
    /// over the definition of the virtual group through `compensation_map`.
    pub fn translate_criteria(
        &self,
        translate: &TranslateCriteria,
        compensation_map: &IndexMap<SmolStr, Expression>,
        criteria: &Criteria,
    ) -> Option<Criteria> {
        CriteriaTranslator::for_criteria(translate, compensation_map).translate(criteria)
    }
}

/// A sequence of commands resolved in one temp scope.
pub struct Session<'r> {
    resolver: Resolver<'r>,
    adapter: MetadataAdapter<'r>,
}

impl Session<'_> {
    pub fn resolve(&mut self, command: &mut Command) -> Result<ResolveOutcome> {
        let before = self.temp_tables();
        let resolution = self.resolver.resolve(command, &mut self.adapter)?;
        let temp_groups = self
            .temp_tables()
            .into_iter()
            .filter(|name| !before.contains(name))
            .collect();
        Ok(ResolveOutcome::new(resolution, temp_groups))
    }

    /// Names of the temp tables defined so far.
    pub fn temp_tables(&self) -> Vec<SmolStr> {
        self.adapter
            .temp()
            .local_groups()
            .filter(|group| group.kind == TempGroupKind::TempTable)
            .map(|group| group.name.clone())
            .collect()
    }
}
