//! Semantic resolution of parsed commands.
//!
//! [`Resolver::resolve`] binds every group and element of a command to catalog or temp metadata,
//! assigns and reconciles types, expands wildcards and implicit temp groups, and validates
//! scoping and arity. The command is rewritten in place.

mod convert;
mod error;
mod expr;
mod options;
mod resolver;
mod scope;
mod symbol;

pub mod evaluate;
pub mod reconcile;
pub mod translate;

pub use error::{ErrorKind, ResolveError, ResolveResult, UnresolvedSymbol};
pub use options::ResolverOptions;
pub use resolver::{Resolution, Resolver, SelectorScope};
pub use scope::GroupContext;
