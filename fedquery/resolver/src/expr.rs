//! Resolution of expressions and criteria within one scope.
//!
//! [`ExpressionResolver`] runs in post-order, so every node sees resolved and typed children.
//! Nested commands are treated as leaves by the navigator and resolved independently when
//! their owning node is visited.

use fedquery_ast::command::Command;
use fedquery_ast::criteria::{
    BetweenCriteria, CompareCriteria, ExistsCriteria, MatchCriteria, SetCriteria,
    SubqueryCompareCriteria, SubquerySetCriteria,
};
use fedquery_ast::expression::{
    AggregateFunction, AggregateSymbol, CaseExpression, Function, Reference, ReferenceKind,
    ScalarSubquery, SearchedCaseExpression,
};
use fedquery_ast::render::Render;
use fedquery_ast::visit_mut::VisitorMut;
use fedquery_ast::{ElementSymbol, Expression};
use fedquery_catalog::MetadataAdapter;
use fedquery_common::constants::{CAST_FUNCTION, CONVERT_FUNCTION};
use fedquery_common::data_type::{DataTypeName, is_explicit_conversion};
use fedquery_common::function::FunctionDescriptor;
use fedquery_common::value::ScalarValue;

use crate::convert::Converter;
use crate::error::{ResolveError, ResolveResult};
use crate::resolver::{DocumentScope, Resolver};
use crate::scope::GroupContext;
use crate::symbol;

pub(crate) struct ExpressionResolver<'r> {
    resolver: &'r Resolver<'r>,
    adapter: &'r MetadataAdapter<'r>,
    scope: &'r GroupContext<'r>,
    document: Option<&'r DocumentScope>,
    error: Option<ResolveError>,
}

impl<'r> ExpressionResolver<'r> {
    pub(crate) fn new(
        resolver: &'r Resolver<'r>,
        adapter: &'r MetadataAdapter<'r>,
        scope: &'r GroupContext<'r>,
        document: Option<&'r DocumentScope>,
    ) -> Self {
        Self {
            resolver,
            adapter,
            scope,
            document,
            error: None,
        }
    }

    /// The first error raised during the traversal.
    pub(crate) fn finish(self) -> ResolveResult<()> {
        self.error.map_or(Ok(()), Err)
    }

    fn record(&mut self, result: ResolveResult<()>) {
        if let Err(err) = result {
            self.error.get_or_insert(err);
        }
    }

    #[inline]
    fn converter(&self) -> Converter<'r> {
        self.resolver.converter(self.adapter)
    }

    fn resolve_element(&self, element: &mut ElementSymbol) -> ResolveResult<()> {
        if element.is_resolved() {
            return Ok(());
        }
        if let Some(document) = self.document {
            if document.resolve_element(element)? {
                return Ok(());
            }
        }
        symbol::resolve_element(element, self.adapter, self.scope)
    }

    fn resolve_function(&self, function: &mut Function) -> ResolveResult<()> {
        if function.descriptor.is_some() {
            return Ok(());
        }
        if function.name.eq_ignore_ascii_case(CONVERT_FUNCTION)
            || function.name.eq_ignore_ascii_case(CAST_FUNCTION)
        {
            return self.resolve_conversion(function);
        }
        let arg_types: Vec<Option<DataTypeName>> = function
            .args
            .iter()
            .map(|arg| {
                if arg.is_null_constant() || arg.is_untyped_reference() {
                    None
                } else {
                    arg.data_type()
                }
            })
            .collect();
        let matched = self
            .adapter
            .catalog()
            .functions()
            .lookup(&function.name, &arg_types)?;
        let converter = self.converter();
        for (index, arg) in function.args.iter_mut().enumerate() {
            let target = match matched.conversions.get(index).copied().flatten() {
                Some(target) => Some(target),
                None if arg_types[index].is_none() => matched.descriptor.arg_type(index),
                None => None,
            };
            if let Some(target) = target {
                converter.convert(arg, target)?;
            }
        }
        function.data_type = Some(matched.descriptor.return_type);
        function.descriptor = Some(matched.descriptor);
        Ok(())
    }

    /// `convert(value, type)` and `cast(value AS type)` name their target type in a literal.
    fn resolve_conversion(&self, function: &mut Function) -> ResolveResult<()> {
        let arity = function.args.len();
        let [value, Expression::Constant(target)] = function.args.as_mut_slice() else {
            return Err(ResolveError::ArityMismatch {
                context: function.name.to_string(),
                expected: 2,
                actual: arity,
            });
        };
        let ScalarValue::String(Some(type_name)) = &target.value else {
            return Err(ResolveError::UnknownType(target.value.to_string()));
        };
        let target_type = DataTypeName::from_name(type_name)
            .ok_or_else(|| ResolveError::UnknownType(type_name.clone()))?;
        if value.is_untyped_reference() {
            self.converter().convert(value, target_type)?;
        }
        let source = value.data_type().unwrap_or(target_type);
        if !is_explicit_conversion(source, target_type) {
            return Err(ResolveError::NoExplicitConversion {
                expression: value.render(),
                from: source,
                to: target_type,
            });
        }
        function.descriptor = Some(FunctionDescriptor::new(
            function.name.clone(),
            [source, DataTypeName::String],
            target_type,
        ));
        function.data_type = Some(target_type);
        Ok(())
    }

    fn resolve_aggregate(&self, aggregate: &mut AggregateSymbol) -> ResolveResult<()> {
        use DataTypeName::*;

        let function = aggregate.function;
        let arg_type = aggregate.arg.as_deref().and_then(Expression::data_type);
        let data_type = match (function, arg_type) {
            (AggregateFunction::Count, _) => Integer,
            (_, None) => {
                return Err(ResolveError::InvalidAggregate(format!(
                    "{} requires a typed argument",
                    function.name()
                )));
            }
            (AggregateFunction::Sum, Some(ty)) if ty.is_integral() && ty != BigInteger => Long,
            (AggregateFunction::Sum, Some(Float | Double))
            | (AggregateFunction::Avg, Some(Float | Double)) => Double,
            (AggregateFunction::Avg, Some(ty)) if ty.is_integral() => Double,
            (AggregateFunction::Sum | AggregateFunction::Avg, Some(BigInteger | BigDecimal)) => {
                BigDecimal
            }
            (AggregateFunction::Sum | AggregateFunction::Avg, Some(ty)) => {
                return Err(ResolveError::InvalidAggregate(format!(
                    "{} is not defined for {ty}",
                    function.name()
                )));
            }
            (AggregateFunction::Min | AggregateFunction::Max, Some(ty)) => ty,
        };
        aggregate.data_type = Some(data_type);
        Ok(())
    }

    fn resolve_case(&self, case: &mut CaseExpression) -> ResolveResult<()> {
        let converter = self.converter();
        let operands = std::iter::once(&mut *case.operand)
            .chain(case.whens.iter_mut())
            .collect();
        converter.unify(operands, "CASE operand")?;
        let results = case
            .thens
            .iter_mut()
            .chain(case.else_expression.as_deref_mut())
            .collect();
        case.data_type = converter.unify(results, "CASE result")?;
        Ok(())
    }

    fn resolve_searched_case(&self, case: &mut SearchedCaseExpression) -> ResolveResult<()> {
        let results = case
            .thens
            .iter_mut()
            .chain(case.else_expression.as_deref_mut())
            .collect();
        case.data_type = self.converter().unify(results, "CASE result")?;
        Ok(())
    }

    /// Resolves a nested command against the current scope and returns the type of its only
    /// projected column.
    fn resolve_single_column(
        &self,
        command: &mut Command,
        context: &str,
    ) -> ResolveResult<Option<DataTypeName>> {
        self.resolver
            .resolve_subcommand(command, self.adapter, self.scope)?;
        match command.projected_symbols().as_slice() {
            [single] => Ok(single.data_type()),
            projected => Err(ResolveError::InvalidSubquery(format!(
                "{context} must project exactly one column, found {}",
                projected.len()
            ))),
        }
    }

    fn unify_with_subquery(
        &self,
        left: &mut Expression,
        projected: Option<DataTypeName>,
        context: &str,
    ) -> ResolveResult<()> {
        let Some(projected) = projected else {
            return Ok(());
        };
        let converter = self.converter();
        let target = match left.data_type() {
            Some(ty) if !left.is_null_constant() => converter.common_type(&[ty, projected], context)?,
            _ => projected,
        };
        converter.convert(left, target)
    }

    fn resolve_match(&self, criteria: &mut MatchCriteria) -> ResolveResult<()> {
        let converter = self.converter();
        for operand in [&mut criteria.left, &mut criteria.right] {
            match operand.data_type() {
                Some(DataTypeName::String | DataTypeName::Char | DataTypeName::Clob) => {}
                _ => converter.convert(operand, DataTypeName::String)?,
            }
        }
        Ok(())
    }
}

impl VisitorMut for ExpressionResolver<'_> {
    fn should_abort(&self) -> bool {
        self.error.is_some()
    }

    fn visit_element_symbol(&mut self, node: &mut ElementSymbol) {
        let result = self.resolve_element(node);
        self.record(result);
    }

    fn visit_function(&mut self, node: &mut Function) {
        let result = self.resolve_function(node);
        self.record(result);
    }

    fn visit_aggregate_symbol(&mut self, node: &mut AggregateSymbol) {
        let result = self.resolve_aggregate(node);
        self.record(result);
    }

    fn visit_case_expression(&mut self, node: &mut CaseExpression) {
        let result = self.resolve_case(node);
        self.record(result);
    }

    fn visit_searched_case_expression(&mut self, node: &mut SearchedCaseExpression) {
        let result = self.resolve_searched_case(node);
        self.record(result);
    }

    fn visit_reference(&mut self, node: &mut Reference) {
        if let ReferenceKind::Named(element) = &node.kind {
            node.data_type = element.data_type();
            node.correlated |= element.is_external;
        }
    }

    fn visit_scalar_subquery(&mut self, node: &mut ScalarSubquery) {
        let result = self
            .resolve_single_column(&mut node.command, "a scalar subquery")
            .map(|ty| node.data_type = ty);
        self.record(result);
    }

    fn visit_compare_criteria(&mut self, node: &mut CompareCriteria) {
        let result = self
            .converter()
            .unify(vec![&mut node.left, &mut node.right], "comparison")
            .map(drop);
        self.record(result);
    }

    fn visit_between_criteria(&mut self, node: &mut BetweenCriteria) {
        let operands = vec![&mut node.expression, &mut node.lower, &mut node.upper];
        let result = self.converter().unify(operands, "BETWEEN").map(drop);
        self.record(result);
    }

    fn visit_match_criteria(&mut self, node: &mut MatchCriteria) {
        let result = self.resolve_match(node);
        self.record(result);
    }

    fn visit_set_criteria(&mut self, node: &mut SetCriteria) {
        let operands = std::iter::once(&mut node.expression)
            .chain(node.values.iter_mut())
            .collect();
        let result = self.converter().unify(operands, "IN").map(drop);
        self.record(result);
    }

    fn visit_subquery_set_criteria(&mut self, node: &mut SubquerySetCriteria) {
        let result = self
            .resolve_single_column(&mut node.command, "an IN subquery")
            .and_then(|ty| self.unify_with_subquery(&mut node.expression, ty, "IN subquery"));
        self.record(result);
    }

    fn visit_subquery_compare_criteria(&mut self, node: &mut SubqueryCompareCriteria) {
        let result = self
            .resolve_single_column(&mut node.command, "a quantified subquery")
            .and_then(|ty| self.unify_with_subquery(&mut node.left, ty, "quantified comparison"));
        self.record(result);
    }

    fn visit_exists_criteria(&mut self, node: &mut ExistsCriteria) {
        let result = self
            .resolver
            .resolve_subcommand(&mut node.command, self.adapter, self.scope);
        self.record(result);
    }
}
