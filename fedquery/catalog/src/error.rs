use fedquery_common::types::{GroupId, ProcedureId};
use miette::Diagnostic;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error, Diagnostic)]
pub enum CatalogError {
    #[error("group {0} not found")]
    #[diagnostic(code(fedquery::catalog::group_not_found))]
    GroupNotFound(GroupId),

    #[error("procedure {0} not found")]
    #[diagnostic(code(fedquery::catalog::procedure_not_found))]
    ProcedureNotFound(ProcedureId),

    #[error("group {0:?} already exists")]
    GroupAlreadyExists(String),

    #[error("procedure {0:?} already exists")]
    ProcedureAlreadyExists(String),

    #[error("temp group {0:?} already exists")]
    TempGroupAlreadyExists(String),

    #[error("column {column:?} is defined twice in {group:?}")]
    DuplicateColumn { group: String, column: String },

    #[error("failed to read the definition of {group:?}: {reason}")]
    #[diagnostic(code(fedquery::catalog::definition))]
    Definition { group: String, reason: String },
}

pub type CatalogResult<T> = std::result::Result<T, CatalogError>;
