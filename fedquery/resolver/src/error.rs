use fedquery_catalog::error::CatalogError;
use fedquery_catalog::function::LookupError;
use fedquery_common::data_type::DataTypeName;
use fedquery_common::error::NotImplemented;
use itertools::Itertools;
use miette::Diagnostic;
use serde::Serialize;
use thiserror::Error;

#[derive(Debug, Error, Diagnostic)]
pub enum ResolveError {
    #[error(transparent)]
    #[diagnostic(transparent)]
    Catalog(#[from] CatalogError),

    #[error("group {0:?} not found")]
    #[diagnostic(code(fedquery::resolve::group_not_found))]
    GroupNotFound(String),

    #[error("group {name:?} is ambiguous, candidates: {}", .candidates.join(", "))]
    #[diagnostic(code(fedquery::resolve::ambiguous_group))]
    AmbiguousGroup {
        name: String,
        candidates: Vec<String>,
    },

    #[error("element {0:?} not found")]
    #[diagnostic(code(fedquery::resolve::element_not_found))]
    ElementNotFound(String),

    #[error("element {name:?} is ambiguous, candidates: {}", .candidates.join(", "))]
    #[diagnostic(code(fedquery::resolve::ambiguous_element))]
    AmbiguousElement {
        name: String,
        candidates: Vec<String>,
    },

    #[error("procedure {0:?} not found")]
    #[diagnostic(code(fedquery::resolve::procedure_not_found))]
    ProcedureNotFound(String),

    #[error("procedure {name:?} is ambiguous, candidates: {}", .candidates.join(", "))]
    AmbiguousProcedure {
        name: String,
        candidates: Vec<String>,
    },

    #[error(transparent)]
    #[diagnostic(code(fedquery::resolve::function))]
    Function(#[from] LookupError),

    #[error("unknown type {0:?}")]
    UnknownType(String),

    #[error("{expression} of type {from} cannot be implicitly converted to {to}")]
    #[diagnostic(code(fedquery::resolve::no_implicit_conversion))]
    NoImplicitConversion {
        expression: String,
        from: DataTypeName,
        to: DataTypeName,
    },

    #[error("{expression} of type {from} cannot be converted to {to}")]
    NoExplicitConversion {
        expression: String,
        from: DataTypeName,
        to: DataTypeName,
    },

    #[error("no common type for {context}: {}", .types.iter().join(", "))]
    #[diagnostic(code(fedquery::resolve::no_common_type))]
    NoCommonType {
        context: String,
        types: Vec<DataTypeName>,
    },

    #[error("{context} expects {expected} values, found {actual}")]
    #[diagnostic(code(fedquery::resolve::arity_mismatch))]
    ArityMismatch {
        context: String,
        expected: usize,
        actual: usize,
    },

    #[error("group {0:?} is specified more than once")]
    DuplicateGroup(String),

    #[error("symbol {symbol:?} is specified more than once in {context}")]
    DuplicateSymbol { symbol: String, context: String },

    #[error("variable {0:?} is already declared in this block")]
    DuplicateVariable(String),

    #[error("invalid temp table {name:?}: {reason}")]
    InvalidTempTable { name: String, reason: String },

    #[error("invalid call of {procedure:?}: {reason}")]
    InvalidProcedureCall { procedure: String, reason: String },

    #[error("{0:?} cannot be assigned to")]
    NotAssignable(String),

    #[error("label {0:?} is not defined in an enclosing block or loop")]
    UnknownLabel(String),

    #[error("label {0:?} is already used by an enclosing block or loop")]
    DuplicateLabel(String),

    #[error("{0}")]
    InvalidBranch(String),

    #[error("{clause} is not allowed in {context}")]
    DisallowedClause {
        clause: &'static str,
        context: &'static str,
    },

    #[error("invalid limit: {0}")]
    InvalidLimit(String),

    #[error("invalid order by: {0}")]
    InvalidOrderBy(String),

    #[error(
        "order by of a set query branch uses column {position}, which would change from {from} \
         to {to}"
    )]
    #[diagnostic(help("move the ORDER BY to the set query itself"))]
    OrderByRetype {
        position: usize,
        from: DataTypeName,
        to: DataTypeName,
    },

    #[error("invalid aggregate: {0}")]
    InvalidAggregate(String),

    #[error("invalid subquery: {0}")]
    InvalidSubquery(String),

    #[error("invalid criteria: {0}")]
    InvalidCriteria(String),

    #[error("group {0:?} is not a virtual group")]
    NotVirtual(String),

    #[error("definition of {group:?} is invalid: {reason}")]
    #[diagnostic(code(fedquery::resolve::invalid_definition))]
    InvalidDefinition { group: String, reason: String },

    #[error(transparent)]
    #[diagnostic(transparent)]
    NotImplemented(#[from] NotImplemented),
}

pub type ResolveResult<T> = std::result::Result<T, ResolveError>;

/// Broad classes of resolution failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum ErrorKind {
    /// The catalog could not produce metadata it refers to.
    Metadata,
    /// The command does not resolve: unknown or ambiguous names, type or arity mismatches,
    /// invalid definitions.
    Resolver,
    /// Unexpected internal failure, such as an unreadable stored definition.
    Component,
}

/// A name that did not resolve, with a description of why.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UnresolvedSymbol {
    pub symbol: String,
    pub description: String,
}

impl ResolveError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            ResolveError::Catalog(
                CatalogError::GroupNotFound(_) | CatalogError::ProcedureNotFound(_),
            ) => ErrorKind::Metadata,
            ResolveError::Catalog(CatalogError::Definition { .. })
            | ResolveError::InvalidDefinition { .. }
            | ResolveError::NotImplemented(_) => ErrorKind::Component,
            _ => ErrorKind::Resolver,
        }
    }

    /// Names that failed to resolve, empty for failures other than name resolution.
    pub fn unresolved_symbols(&self) -> Vec<UnresolvedSymbol> {
        let symbol = match self {
            ResolveError::GroupNotFound(name)
            | ResolveError::ElementNotFound(name)
            | ResolveError::ProcedureNotFound(name)
            | ResolveError::AmbiguousGroup { name, .. }
            | ResolveError::AmbiguousElement { name, .. }
            | ResolveError::AmbiguousProcedure { name, .. } => name.clone(),
            _ => return Vec::new(),
        };
        vec![UnresolvedSymbol {
            symbol,
            description: self.to_string(),
        }]
    }
}

#[cfg(test)]
mod tests {
    use fedquery_common::types::GroupId;

    use super::*;

    #[test]
    fn test_kinds() {
        let missing = GroupId::MIN;
        assert_eq!(
            ResolveError::Catalog(CatalogError::GroupNotFound(missing)).kind(),
            ErrorKind::Metadata
        );
        assert_eq!(
            ResolveError::ElementNotFound("e9".into()).kind(),
            ErrorKind::Resolver
        );
        let definition = ResolveError::InvalidDefinition {
            group: "vm1.g1".into(),
            reason: "no definition".into(),
        };
        assert_eq!(definition.kind(), ErrorKind::Component);
    }

    #[test]
    fn test_unresolved_symbols() {
        let err = ResolveError::AmbiguousGroup {
            name: "g1".into(),
            candidates: vec!["pm1.g1".into(), "pm2.g1".into()],
        };
        let unresolved = err.unresolved_symbols();
        assert_eq!(unresolved.len(), 1);
        assert_eq!(unresolved[0].symbol, "g1");
        assert_eq!(
            unresolved[0].description,
            "group \"g1\" is ambiguous, candidates: pm1.g1, pm2.g1"
        );
        assert!(
            ResolveError::InvalidLimit("negative".into())
                .unresolved_symbols()
                .is_empty()
        );
    }

    #[test]
    fn test_messages() {
        let err = ResolveError::NoCommonType {
            context: "column 1 of UNION".into(),
            types: vec![DataTypeName::Integer, DataTypeName::Blob],
        };
        assert_eq!(err.to_string(), "no common type for column 1 of UNION: integer, blob");
    }
}
