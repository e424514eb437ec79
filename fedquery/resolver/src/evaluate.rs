//! Evaluatability classification.
//!
//! Every expression or predicate needs some minimum runtime context before it can be evaluated:
//! nothing at all ([`EvaluationLevel::Planning`]), a row or variable context
//! ([`EvaluationLevel::Processing`]), or a remote source ([`EvaluationLevel::PushDown`]). A node's
//! level is the highest level demanded anywhere below it, nested commands included.

use fedquery_ast::criteria::{ExistsCriteria, SubqueryCompareCriteria, SubquerySetCriteria};
use fedquery_ast::expression::{
    AggregateSymbol, Constant, Function, Reference, ReferenceKind, ScalarSubquery,
};
use fedquery_ast::symbol::ElementSymbol;
use fedquery_ast::visit::{self, Visit, Visitor};
use fedquery_common::function::{Determinism, PushDown};
use serde::Serialize;
use tracing::trace;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub enum EvaluationLevel {
    /// Foldable without any runtime context.
    Planning,
    /// Needs bound parameters, correlated values or the current row.
    Processing,
    /// Must reach a source intact.
    PushDown,
}

/// Outcome of a classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct Classification {
    /// The highest level in the tree. A must-pushdown function anywhere below makes it
    /// [`EvaluationLevel::PushDown`] even when the traversal stopped early at its ceiling.
    pub level: EvaluationLevel,
    /// A correlated reference was seen.
    pub correlated: bool,
    /// A nondeterministic function call was seen.
    pub nondeterministic: bool,
}

/// Raises the running level as nodes demand more context and aborts the traversal once it
/// exceeds the ceiling.
#[derive(Debug, Clone)]
pub struct EvaluatabilityVisitor {
    ceiling: EvaluationLevel,
    level: EvaluationLevel,
    correlated: bool,
    nondeterministic: bool,
}

impl EvaluatabilityVisitor {
    pub fn new(ceiling: EvaluationLevel) -> Self {
        Self {
            ceiling,
            level: EvaluationLevel::Planning,
            correlated: false,
            nondeterministic: false,
        }
    }

    #[inline]
    pub fn level(&self) -> EvaluationLevel {
        self.level
    }

    pub fn classification(&self) -> Classification {
        Classification {
            level: self.level,
            correlated: self.correlated,
            nondeterministic: self.nondeterministic,
        }
    }

    #[inline]
    fn demand(&mut self, level: EvaluationLevel) {
        self.level = self.level.max(level);
    }
}

impl Visitor for EvaluatabilityVisitor {
    fn should_abort(&self) -> bool {
        self.level > self.ceiling
    }

    fn visit_function(&mut self, node: &Function) {
        let Some(descriptor) = &node.descriptor else {
            self.demand(EvaluationLevel::Processing);
            return;
        };
        if descriptor.pushdown == PushDown::MustPushdown {
            self.demand(EvaluationLevel::PushDown);
        } else if descriptor.determinism == Determinism::Nondeterministic {
            self.nondeterministic = true;
            self.demand(EvaluationLevel::Processing);
        }
    }

    fn visit_element_symbol(&mut self, node: &ElementSymbol) {
        if node.is_external {
            self.correlated = true;
        }
        self.demand(EvaluationLevel::Processing);
    }

    fn visit_reference(&mut self, node: &Reference) {
        if node.correlated || matches!(node.kind, ReferenceKind::Named(_)) {
            self.correlated = true;
        }
        self.demand(EvaluationLevel::Processing);
    }

    fn visit_constant(&mut self, node: &Constant) {
        if node.multi_valued {
            self.demand(EvaluationLevel::Processing);
        }
    }

    fn visit_aggregate_symbol(&mut self, _: &AggregateSymbol) {
        self.demand(EvaluationLevel::Processing);
    }

    // Subqueries run in the engine at the earliest; their contents are classified as the
    // traversal descends into them.
    fn visit_scalar_subquery(&mut self, _: &ScalarSubquery) {
        self.demand(EvaluationLevel::Processing);
    }

    fn visit_subquery_set_criteria(&mut self, _: &SubquerySetCriteria) {
        self.demand(EvaluationLevel::Processing);
    }

    fn visit_subquery_compare_criteria(&mut self, _: &SubqueryCompareCriteria) {
        self.demand(EvaluationLevel::Processing);
    }

    fn visit_exists_criteria(&mut self, _: &ExistsCriteria) {
        self.demand(EvaluationLevel::Processing);
    }
}

/// Looks for a must-pushdown function call, nested commands included.
#[derive(Debug, Default)]
struct MustPushdownFinder {
    found: bool,
}

impl Visitor for MustPushdownFinder {
    fn should_abort(&self) -> bool {
        self.found
    }

    fn visit_function(&mut self, node: &Function) {
        if node
            .descriptor
            .as_ref()
            .is_some_and(|descriptor| descriptor.pushdown == PushDown::MustPushdown)
        {
            self.found = true;
        }
    }
}

/// Classifies `node`, stopping as soon as the running level exceeds `ceiling`.
///
/// The correlation and determinism flags only cover the nodes seen before stopping.
pub fn classify<N: Visit + ?Sized>(node: &N, ceiling: EvaluationLevel) -> Classification {
    let mut visitor = EvaluatabilityVisitor::new(ceiling);
    visit::deep_pre_order(node, &mut visitor);
    let mut classification = visitor.classification();
    if classification.level > ceiling && classification.level < EvaluationLevel::PushDown {
        let mut finder = MustPushdownFinder::default();
        visit::deep_pre_order(node, &mut finder);
        if finder.found {
            classification.level = EvaluationLevel::PushDown;
        }
    }
    trace!(?ceiling, ?classification, "classified");
    classification
}

/// The minimum level at which `node` can be evaluated.
#[inline]
pub fn evaluation_level<N: Visit + ?Sized>(node: &N) -> EvaluationLevel {
    classify(node, EvaluationLevel::PushDown).level
}

/// Returns `true` if `node` can be evaluated at `level` or earlier.
#[inline]
pub fn is_evaluatable<N: Visit + ?Sized>(node: &N, level: EvaluationLevel) -> bool {
    classify(node, level).level <= level
}

/// Returns `true` if `node` needs more than planning-time context.
#[inline]
pub fn requires_processing<N: Visit + ?Sized>(node: &N) -> bool {
    !is_evaluatable(node, EvaluationLevel::Planning)
}

/// Returns `true` if `node` may be replaced by its value during planning.
pub fn can_fold<N: Visit + ?Sized>(node: &N) -> bool {
    let classification = classify(node, EvaluationLevel::Planning);
    classification.level == EvaluationLevel::Planning
        && !classification.correlated
        && !classification.nondeterministic
}

#[cfg(test)]
mod tests {
    use fedquery_ast::command::{Command, Query};
    use fedquery_ast::criteria::{CompareOp, Criteria};
    use fedquery_ast::expression::{AggregateFunction, Expression};
    use fedquery_ast::symbol::GroupSymbol;
    use fedquery_common::data_type::DataTypeName;
    use fedquery_common::function::FunctionDescriptor;

    use super::*;

    fn call(name: &str, args: Vec<Expression>, descriptor: FunctionDescriptor) -> Expression {
        let mut function = Function::new(name, args);
        function.data_type = Some(descriptor.return_type);
        function.descriptor = Some(descriptor);
        Expression::Function(function)
    }

    fn concat(args: Vec<Expression>) -> Expression {
        let descriptor = FunctionDescriptor::new(
            "concat",
            [DataTypeName::String, DataTypeName::String],
            DataTypeName::String,
        );
        call("concat", args, descriptor)
    }

    fn correlated(name: &str) -> Expression {
        let mut element = ElementSymbol::new(name);
        element.is_external = true;
        Expression::Reference(Reference::correlated(element))
    }

    #[test]
    fn test_levels() {
        let constant = concat(vec![Expression::constant("a"), Expression::constant("b")]);
        assert_eq!(evaluation_level(&constant), EvaluationLevel::Planning);
        assert!(can_fold(&constant));

        let parameter = concat(vec![Expression::constant("a"), Expression::positional_reference(0)]);
        assert_eq!(evaluation_level(&parameter), EvaluationLevel::Processing);
        assert!(requires_processing(&parameter));
        assert!(is_evaluatable(&parameter, EvaluationLevel::Processing));
        assert!(!can_fold(&parameter));

        let count = Expression::Aggregate(AggregateSymbol::new(AggregateFunction::Count, None));
        assert_eq!(evaluation_level(&count), EvaluationLevel::Processing);
    }

    #[test]
    fn test_must_pushdown_ignores_ceiling() {
        let descriptor =
            FunctionDescriptor::new("source_hash", [DataTypeName::String], DataTypeName::Integer)
                .with_pushdown(PushDown::MustPushdown);
        let expression = call("source_hash", vec![Expression::constant("a")], descriptor);
        for ceiling in [
            EvaluationLevel::Planning,
            EvaluationLevel::Processing,
            EvaluationLevel::PushDown,
        ] {
            assert_eq!(classify(&expression, ceiling).level, EvaluationLevel::PushDown);
        }
        assert!(!is_evaluatable(&expression, EvaluationLevel::Processing));
    }

    #[test]
    fn test_must_pushdown_after_early_stop() {
        let descriptor =
            FunctionDescriptor::new("source_hash", [DataTypeName::String], DataTypeName::Integer)
                .with_pushdown(PushDown::MustPushdown);
        let hashed = call("source_hash", vec![Expression::constant("a")], descriptor);
        // the element stops a planning-level traversal before the call is reached
        let expression = concat(vec![Expression::element("e1"), hashed]);
        let classification = classify(&expression, EvaluationLevel::Planning);
        assert_eq!(classification.level, EvaluationLevel::PushDown);
        assert!(!is_evaluatable(&expression, EvaluationLevel::Processing));
        assert!(requires_processing(&expression));
    }

    #[test]
    fn test_correlated_reference() {
        let criteria = Criteria::compare(
            Expression::constant(1),
            CompareOp::Eq,
            correlated("pm1.g1.e2"),
        );
        let classification = classify(&criteria, EvaluationLevel::PushDown);
        assert!(classification.level >= EvaluationLevel::Processing);
        assert!(classification.correlated);
        assert!(!can_fold(&criteria));
    }

    #[test]
    fn test_nested_commands_are_classified() {
        let inner = Query::new(
            vec![concat(vec![Expression::constant("a"), correlated("pm1.g1.e1")])],
            vec![GroupSymbol::new("pm1.g2")],
        );
        let expression = Expression::ScalarSubquery(ScalarSubquery::new(Command::Query(inner)));
        let classification = classify(&expression, EvaluationLevel::PushDown);
        assert_eq!(classification.level, EvaluationLevel::Processing);
        assert!(classification.correlated);

        let nondeterministic = call(
            "rand",
            Vec::new(),
            FunctionDescriptor::new("rand", [], DataTypeName::Double)
                .with_determinism(Determinism::Nondeterministic),
        );
        assert!(!can_fold(&nondeterministic));
    }

    /// Counts the constants an [`EvaluatabilityVisitor`] is shown.
    struct Counting {
        inner: EvaluatabilityVisitor,
        constants: usize,
    }

    impl Visitor for Counting {
        fn should_abort(&self) -> bool {
            self.inner.should_abort()
        }

        fn visit_function(&mut self, node: &Function) {
            self.inner.visit_function(node);
        }

        fn visit_reference(&mut self, node: &Reference) {
            self.inner.visit_reference(node);
        }

        fn visit_constant(&mut self, node: &Constant) {
            self.constants += 1;
            self.inner.visit_constant(node);
        }
    }

    #[test]
    fn test_abort_skips_later_siblings() {
        let expression = concat(vec![
            Expression::positional_reference(0),
            Expression::constant("poison"),
        ]);

        let mut counting = Counting {
            inner: EvaluatabilityVisitor::new(EvaluationLevel::Planning),
            constants: 0,
        };
        visit::deep_pre_order(&expression, &mut counting);
        assert_eq!(counting.inner.level(), EvaluationLevel::Processing);
        assert_eq!(counting.constants, 0);

        let mut counting = Counting {
            inner: EvaluatabilityVisitor::new(EvaluationLevel::Processing),
            constants: 0,
        };
        visit::deep_pre_order(&expression, &mut counting);
        assert_eq!(counting.constants, 1);
    }

    #[test]
    fn test_classification_is_repeatable() {
        let criteria = Criteria::and(vec![
            Criteria::compare(
                Expression::element("pm1.g1.e1"),
                CompareOp::Eq,
                Expression::constant(1),
            ),
            Criteria::compare(
                concat(vec![Expression::constant("a"), Expression::constant("b")]),
                CompareOp::Ne,
                Expression::positional_reference(1),
            ),
        ]);
        for ceiling in [
            EvaluationLevel::Planning,
            EvaluationLevel::Processing,
            EvaluationLevel::PushDown,
        ] {
            assert_eq!(classify(&criteria, ceiling), classify(&criteria, ceiling));
        }
    }
}
