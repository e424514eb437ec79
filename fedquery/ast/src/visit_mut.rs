//! Traversal handing out mutable references, used to rewrite nodes in place.

use crate::macros::make_visitor;

make_visitor!(VisitorMut, NavigatorMut, VisitMut, mut);
