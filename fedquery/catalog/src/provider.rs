use std::fmt::Debug;
use std::sync::Arc;

use auto_impl::auto_impl;
use fedquery_ast::Command;
use fedquery_common::data_type::{self, DataTypeName};
use fedquery_common::types::{GroupId, ProcedureId};

use crate::document::DocumentModel;
use crate::error::CatalogResult;
use crate::function::FunctionLibrary;
use crate::metadata::{GroupMetadata, ProcedureMetadata};

pub type CatalogRef = Arc<dyn CatalogProvider>;

/// The permanent, read-only metadata a resolution consults.
///
/// Names are matched case-insensitively. Implementations are shared between threads resolving
/// independent commands.
#[auto_impl(&, Box, Arc)]
pub trait CatalogProvider: Debug + Send + Sync {
    /// Retrieves a group by its fully qualified name.
    fn get_group(&self, name: &str) -> CatalogResult<Option<Arc<GroupMetadata>>>;

    /// Returns every group whose fully qualified name is `partial` or ends with `.partial`.
    fn find_groups(&self, partial: &str) -> CatalogResult<Vec<Arc<GroupMetadata>>>;

    fn get_group_by_id(&self, id: GroupId) -> CatalogResult<Arc<GroupMetadata>>;

    /// Retrieves a procedure by its fully qualified name.
    fn get_procedure(&self, name: &str) -> CatalogResult<Option<Arc<ProcedureMetadata>>>;

    /// Returns every procedure whose fully qualified name is `partial` or ends with `.partial`.
    fn find_procedures(&self, partial: &str) -> CatalogResult<Vec<Arc<ProcedureMetadata>>>;

    fn get_procedure_by_id(&self, id: ProcedureId) -> CatalogResult<Arc<ProcedureMetadata>>;

    /// The defining query of a virtual group.
    fn view_definition(&self, id: GroupId) -> CatalogResult<Option<Command>>;

    /// The procedural body of a virtual procedure.
    fn procedure_definition(&self, id: ProcedureId) -> CatalogResult<Option<Command>>;

    /// The tree schema of a document group.
    fn document_model(&self, id: GroupId) -> CatalogResult<Option<Arc<DocumentModel>>>;

    fn functions(&self) -> &FunctionLibrary {
        FunctionLibrary::builtin()
    }

    fn is_implicit_conversion(&self, from: DataTypeName, to: DataTypeName) -> bool {
        data_type::is_implicit_conversion(from, to)
    }

    fn common_type(&self, types: &[DataTypeName]) -> Option<DataTypeName> {
        data_type::common_type(types.iter().copied())
    }
}
