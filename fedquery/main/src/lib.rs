//! Semantic resolution for a federated SQL engine.
//!
//! A [`QueryResolver`] binds parsed commands to a shared catalog: every group and element gets its
//! metadata id and type, implicit constructs are expanded and scoping is validated. Commands that
//! share temp tables resolve through a [`Session`]; independent commands can be resolved in
//! parallel with [`QueryResolver::resolve_batch`].

pub mod error;
pub mod resolver;

pub use fedquery_ast as ast;
pub use fedquery_catalog as catalog;
pub use fedquery_common as common;
pub use fedquery_resolver::{ResolveError, ResolverOptions, evaluate, reconcile, translate};

pub use crate::error::{Error, Result};
pub use crate::resolver::{QueryResolver, ResolveOutcome, Session};
