//! In-place substitution of expressions.

use crate::command::{
    DynamicCommand, GroupBy, Insert, Limit, OrderByItem, Select, SetClause, SpParameter,
};
use crate::criteria::{
    BetweenCriteria, CompareCriteria, IsNullCriteria, MatchCriteria, SetCriteria,
    SubqueryCompareCriteria, SubquerySetCriteria,
};
use crate::expression::{
    AggregateSymbol, AliasSymbol, CaseExpression, Expression, ExpressionSymbol, Function,
    SearchedCaseExpression,
};
use crate::procedure::{AssignmentStatement, DeclareStatement, RaiseStatement, ReturnStatement};
use crate::visit_mut::{self, VisitMut, VisitorMut};

/// Offers every expression slot to a mapping function, children before their parents. A slot the
/// function returns a replacement for is overwritten; the replacement is not traversed again.
struct ExpressionMapper<F> {
    f: F,
}

impl<F> ExpressionMapper<F>
where
    F: FnMut(&Expression) -> Option<Expression>,
{
    #[inline]
    fn apply(&mut self, slot: &mut Expression) {
        if let Some(replacement) = (self.f)(slot) {
            *slot = replacement;
        }
    }

    fn apply_all(&mut self, slots: &mut [Expression]) {
        for slot in slots {
            self.apply(slot);
        }
    }
}

impl<F> VisitorMut for ExpressionMapper<F>
where
    F: FnMut(&Expression) -> Option<Expression>,
{
    fn visit_select(&mut self, node: &mut Select) {
        self.apply_all(&mut node.symbols);
    }

    fn visit_group_by(&mut self, node: &mut GroupBy) {
        self.apply_all(&mut node.symbols);
    }

    fn visit_order_by_item(&mut self, node: &mut OrderByItem) {
        self.apply(&mut node.expression);
    }

    fn visit_limit(&mut self, node: &mut Limit) {
        if let Some(offset) = &mut node.offset {
            self.apply(offset);
        }
        if let Some(row_limit) = &mut node.row_limit {
            self.apply(row_limit);
        }
    }

    fn visit_insert(&mut self, node: &mut Insert) {
        self.apply_all(&mut node.values);
    }

    fn visit_set_clause(&mut self, node: &mut SetClause) {
        self.apply(&mut node.value);
    }

    fn visit_sp_parameter(&mut self, node: &mut SpParameter) {
        if let Some(expression) = &mut node.expression {
            self.apply(expression);
        }
    }

    fn visit_dynamic_command(&mut self, node: &mut DynamicCommand) {
        self.apply(&mut node.sql);
    }

    fn visit_declare_statement(&mut self, node: &mut DeclareStatement) {
        if let Some(value) = &mut node.value {
            self.apply(value);
        }
    }

    fn visit_assignment_statement(&mut self, node: &mut AssignmentStatement) {
        self.apply(&mut node.value);
    }

    fn visit_raise_statement(&mut self, node: &mut RaiseStatement) {
        self.apply(&mut node.expression);
    }

    fn visit_return_statement(&mut self, node: &mut ReturnStatement) {
        if let Some(expression) = &mut node.expression {
            self.apply(expression);
        }
    }

    fn visit_function(&mut self, node: &mut Function) {
        self.apply_all(&mut node.args);
    }

    fn visit_aggregate_symbol(&mut self, node: &mut AggregateSymbol) {
        if let Some(arg) = &mut node.arg {
            self.apply(arg);
        }
    }

    fn visit_case_expression(&mut self, node: &mut CaseExpression) {
        self.apply(&mut node.operand);
        self.apply_all(&mut node.whens);
        self.apply_all(&mut node.thens);
        if let Some(else_expression) = &mut node.else_expression {
            self.apply(else_expression);
        }
    }

    fn visit_searched_case_expression(&mut self, node: &mut SearchedCaseExpression) {
        self.apply_all(&mut node.thens);
        if let Some(else_expression) = &mut node.else_expression {
            self.apply(else_expression);
        }
    }

    fn visit_expression_symbol(&mut self, node: &mut ExpressionSymbol) {
        self.apply(&mut node.expression);
    }

    fn visit_alias_symbol(&mut self, node: &mut AliasSymbol) {
        self.apply(&mut node.symbol);
    }

    fn visit_compare_criteria(&mut self, node: &mut CompareCriteria) {
        self.apply(&mut node.left);
        self.apply(&mut node.right);
    }

    fn visit_between_criteria(&mut self, node: &mut BetweenCriteria) {
        self.apply(&mut node.expression);
        self.apply(&mut node.lower);
        self.apply(&mut node.upper);
    }

    fn visit_is_null_criteria(&mut self, node: &mut IsNullCriteria) {
        self.apply(&mut node.expression);
    }

    fn visit_match_criteria(&mut self, node: &mut MatchCriteria) {
        self.apply(&mut node.left);
        self.apply(&mut node.right);
    }

    fn visit_set_criteria(&mut self, node: &mut SetCriteria) {
        self.apply(&mut node.expression);
        self.apply_all(&mut node.values);
    }

    fn visit_subquery_set_criteria(&mut self, node: &mut SubquerySetCriteria) {
        self.apply(&mut node.expression);
    }

    fn visit_subquery_compare_criteria(&mut self, node: &mut SubqueryCompareCriteria) {
        self.apply(&mut node.left);
    }
}

/// Replaces expressions below `node` for which `f` returns a replacement, not descending into
/// nested commands.
pub fn map_expressions<N, F>(node: &mut N, f: F)
where
    N: VisitMut + ?Sized,
    F: FnMut(&Expression) -> Option<Expression>,
{
    let mut mapper = ExpressionMapper { f };
    visit_mut::post_order(node, &mut mapper);
}

/// Like [`map_expressions`], also offering `expression` itself last.
pub fn map_expression<F>(expression: &mut Expression, f: F)
where
    F: FnMut(&Expression) -> Option<Expression>,
{
    let mut mapper = ExpressionMapper { f };
    visit_mut::post_order(expression, &mut mapper);
    mapper.apply(expression);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::criteria::{CompareOp, Criteria};
    use crate::render::Render;

    fn rename(expression: &Expression) -> Option<Expression> {
        match expression {
            Expression::Element(element) if element.short_name() == "e1" => {
                Some(Expression::element("v.x"))
            }
            _ => None,
        }
    }

    #[test]
    fn test_map_nested_slots() {
        let mut criteria = Criteria::compare(
            Expression::function("+", vec![Expression::element("e1"), Expression::constant(1)]),
            CompareOp::Gt,
            Expression::element("e1"),
        );
        map_expressions(&mut criteria, rename);
        assert_eq!(criteria.render(), "(v.x + 1) > v.x");
    }

    #[test]
    fn test_map_root_expression() {
        let mut expression = Expression::element("g.e1");
        map_expression(&mut expression, rename);
        assert_eq!(expression, Expression::element("v.x"));

        let mut untouched = Expression::element("e2");
        map_expression(&mut untouched, rename);
        assert_eq!(untouched, Expression::element("e2"));
    }
}
