//! Object model of resolvable commands, the traversal framework over it and the canonical
//! string renderer.

#[macro_use(apply)]
extern crate macro_rules_attribute;

mod macros;

pub mod collect;
pub mod command;
pub mod criteria;
pub mod expression;
pub mod procedure;
pub mod render;
pub mod reserved;
pub mod rewrite;
pub mod symbol;
pub mod visit;
pub mod visit_mut;

/// Identifiers are stored as written; comparisons between them ignore ASCII case.
pub type Ident = smol_str::SmolStr;

pub use command::Command;
pub use criteria::Criteria;
pub use expression::Expression;
pub use symbol::{ElementSymbol, GroupSymbol};
