//! Read-only traversal.
//!
//! Pre-order visits a node before its children, post-order after them. After every callback
//! the navigator polls [`Visitor::should_abort`] and stops descending once it reports `true`;
//! siblings not yet visited are skipped.

use crate::macros::make_visitor;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Order {
    Pre,
    Post,
}

make_visitor!(Visitor, Navigator, Visit);
