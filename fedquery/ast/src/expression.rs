//! Scalar expressions.

use enum_as_inner::EnumAsInner;
use fedquery_common::constants::CONVERT_FUNCTION;
use fedquery_common::data_type::DataTypeName;
use fedquery_common::function::FunctionDescriptor;
use fedquery_common::value::ScalarValue;

use crate::command::Command;
use crate::criteria::Criteria;
use crate::macros::{base, ext};
use crate::symbol::{ElementSymbol, GroupSymbol};
use crate::Ident;

#[apply(base)]
#[derive(EnumAsInner)]
pub enum Expression {
    Element(ElementSymbol),
    Constant(Constant),
    Function(Function),
    Aggregate(AggregateSymbol),
    Case(CaseExpression),
    SearchedCase(SearchedCaseExpression),
    Reference(Reference),
    ScalarSubquery(ScalarSubquery),
    /// A named expression in a projection.
    ExpressionSymbol(ExpressionSymbol),
    /// A projected symbol renamed with `AS`.
    Alias(AliasSymbol),
    /// `*` or `group.*`.
    Wildcard(MultipleElementSymbol),
}

impl Expression {
    #[inline]
    pub fn element(name: impl Into<Ident>) -> Self {
        Expression::Element(ElementSymbol::new(name))
    }

    #[inline]
    pub fn constant(value: impl Into<ScalarValue>) -> Self {
        Expression::Constant(Constant::new(value.into()))
    }

    #[inline]
    pub fn null() -> Self {
        Expression::Constant(Constant::null())
    }

    #[inline]
    pub fn function(name: impl Into<Ident>, args: Vec<Expression>) -> Self {
        Expression::Function(Function::new(name, args))
    }

    #[inline]
    pub fn alias(name: impl Into<Ident>, symbol: Expression) -> Self {
        Expression::Alias(AliasSymbol {
            name: name.into(),
            symbol: Box::new(symbol),
        })
    }

    #[inline]
    pub fn positional_reference(index: usize) -> Self {
        Expression::Reference(Reference::positional(index))
    }

    /// The resolved type. `None` until resolved, and for untyped bind parameters.
    pub fn data_type(&self) -> Option<DataTypeName> {
        match self {
            Expression::Element(e) => e.data_type(),
            Expression::Constant(c) => Some(c.data_type),
            Expression::Function(f) => f.data_type,
            Expression::Aggregate(a) => a.data_type,
            Expression::Case(c) => c.data_type,
            Expression::SearchedCase(c) => c.data_type,
            Expression::Reference(r) => r.data_type,
            Expression::ScalarSubquery(s) => s.data_type,
            Expression::ExpressionSymbol(s) => s.expression.data_type(),
            Expression::Alias(a) => a.symbol.data_type(),
            Expression::Wildcard(_) => None,
        }
    }

    /// The name a projected symbol is known by.
    pub fn output_name(&self) -> Option<&str> {
        match self {
            Expression::Element(e) => Some(e.short_name()),
            Expression::ExpressionSymbol(s) => Some(&s.name),
            Expression::Alias(a) => Some(&a.name),
            _ => None,
        }
    }

    /// Strips aliases and expression-symbol wrappers.
    pub fn unwrap_symbol(&self) -> &Expression {
        match self {
            Expression::Alias(a) => a.symbol.unwrap_symbol(),
            Expression::ExpressionSymbol(s) => s.expression.unwrap_symbol(),
            other => other,
        }
    }

    #[inline]
    pub fn is_null_constant(&self) -> bool {
        matches!(self, Expression::Constant(c) if c.value.is_null() && !c.multi_valued)
    }

    /// Returns `true` for a bind parameter that has not received a type.
    #[inline]
    pub fn is_untyped_reference(&self) -> bool {
        matches!(self, Expression::Reference(r) if r.data_type.is_none())
    }
}

impl From<ElementSymbol> for Expression {
    #[inline]
    fn from(value: ElementSymbol) -> Self {
        Expression::Element(value)
    }
}

impl From<Constant> for Expression {
    #[inline]
    fn from(value: Constant) -> Self {
        Expression::Constant(value)
    }
}

#[apply(base)]
pub struct Constant {
    pub value: ScalarValue,
    pub data_type: DataTypeName,
    /// Stands for a list of values bound at execution time.
    pub multi_valued: bool,
}

impl Constant {
    pub fn new(value: ScalarValue) -> Self {
        Self {
            data_type: value.data_type(),
            value,
            multi_valued: false,
        }
    }

    #[inline]
    pub fn null() -> Self {
        Self::new(ScalarValue::Null)
    }

    /// A null literal of the given type.
    #[inline]
    pub fn typed_null(data_type: DataTypeName) -> Self {
        Self {
            value: ScalarValue::null_of(data_type),
            data_type,
            multi_valued: false,
        }
    }

    pub fn multi_valued(data_type: DataTypeName) -> Self {
        Self {
            value: ScalarValue::Null,
            data_type,
            multi_valued: true,
        }
    }
}

/// A scalar function call. Operators are functions named by their symbol, e.g. `+` or `||`.
#[apply(base)]
pub struct Function {
    pub name: Ident,
    pub args: Vec<Expression>,
    /// The overload the call bound to.
    pub descriptor: Option<FunctionDescriptor>,
    /// Set on conversions inserted during resolution.
    pub implicit: bool,
    pub data_type: Option<DataTypeName>,
}

impl Function {
    pub fn new(name: impl Into<Ident>, args: Vec<Expression>) -> Self {
        Self {
            name: name.into(),
            args,
            descriptor: None,
            implicit: false,
            data_type: None,
        }
    }

    /// An implicit `convert(expression, target)`.
    pub fn implicit_conversion(
        expression: Expression,
        target: DataTypeName,
        descriptor: FunctionDescriptor,
    ) -> Self {
        Self {
            name: CONVERT_FUNCTION.into(),
            args: vec![
                expression,
                Expression::Constant(Constant::new(ScalarValue::from(target.name()))),
            ],
            descriptor: Some(descriptor),
            implicit: true,
            data_type: Some(target),
        }
    }
}

#[apply(ext)]
pub enum AggregateFunction {
    Count,
    Sum,
    Avg,
    Min,
    Max,
}

impl AggregateFunction {
    pub fn name(self) -> &'static str {
        match self {
            AggregateFunction::Count => "COUNT",
            AggregateFunction::Sum => "SUM",
            AggregateFunction::Avg => "AVG",
            AggregateFunction::Min => "MIN",
            AggregateFunction::Max => "MAX",
        }
    }
}

#[apply(base)]
pub struct AggregateSymbol {
    pub function: AggregateFunction,
    pub distinct: bool,
    /// `None` for `COUNT(*)`.
    pub arg: Option<Box<Expression>>,
    pub data_type: Option<DataTypeName>,
}

impl AggregateSymbol {
    pub fn new(function: AggregateFunction, arg: Option<Expression>) -> Self {
        Self {
            function,
            distinct: false,
            arg: arg.map(Box::new),
            data_type: None,
        }
    }
}

/// `CASE operand WHEN value THEN result ... ELSE result END`
#[apply(base)]
pub struct CaseExpression {
    pub operand: Box<Expression>,
    pub whens: Vec<Expression>,
    pub thens: Vec<Expression>,
    pub else_expression: Option<Box<Expression>>,
    pub data_type: Option<DataTypeName>,
}

/// `CASE WHEN criteria THEN result ... ELSE result END`
#[apply(base)]
pub struct SearchedCaseExpression {
    pub whens: Vec<Criteria>,
    pub thens: Vec<Expression>,
    pub else_expression: Option<Box<Expression>>,
    pub data_type: Option<DataTypeName>,
}

#[apply(base)]
pub enum ReferenceKind {
    /// A `?` bind parameter, zero-based.
    Positional(usize),
    /// A reference to an element of an enclosing scope.
    Named(ElementSymbol),
}

#[apply(base)]
pub struct Reference {
    pub kind: ReferenceKind,
    pub correlated: bool,
    pub data_type: Option<DataTypeName>,
}

impl Reference {
    #[inline]
    pub fn positional(index: usize) -> Self {
        Self {
            kind: ReferenceKind::Positional(index),
            correlated: false,
            data_type: None,
        }
    }

    #[inline]
    pub fn named(element: ElementSymbol) -> Self {
        Self {
            kind: ReferenceKind::Named(element),
            correlated: false,
            data_type: None,
        }
    }

    #[inline]
    pub fn correlated(element: ElementSymbol) -> Self {
        Self {
            correlated: true,
            ..Self::named(element)
        }
    }
}

#[apply(base)]
pub struct ScalarSubquery {
    pub command: Box<Command>,
    pub data_type: Option<DataTypeName>,
}

impl ScalarSubquery {
    pub fn new(command: Command) -> Self {
        Self {
            command: Box::new(command),
            data_type: None,
        }
    }
}

#[apply(base)]
pub struct ExpressionSymbol {
    pub name: Ident,
    pub expression: Box<Expression>,
}

#[apply(base)]
pub struct AliasSymbol {
    pub name: Ident,
    pub symbol: Box<Expression>,
}

/// `*` or `group.*`, holding the expanded elements once resolved.
#[apply(base)]
pub struct MultipleElementSymbol {
    pub group: Option<Ident>,
    pub elements: Option<Vec<ElementSymbol>>,
}

impl MultipleElementSymbol {
    #[inline]
    pub fn all() -> Self {
        Self {
            group: None,
            elements: None,
        }
    }

    #[inline]
    pub fn of_group(group: impl Into<Ident>) -> Self {
        Self {
            group: Some(group.into()),
            elements: None,
        }
    }

    /// Returns `true` if the wildcard is qualified by `group`.
    pub fn is_for(&self, group: &GroupSymbol) -> bool {
        self.group
            .as_deref()
            .is_none_or(|qualifier| group.matches_qualifier(qualifier))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_output_names() {
        let element = Expression::element("pm1.g1.e1");
        assert_eq!(element.output_name(), Some("e1"));
        let alias = Expression::alias("x", Expression::constant(1));
        assert_eq!(alias.output_name(), Some("x"));
        assert_eq!(alias.unwrap_symbol(), &Expression::constant(1));
        assert_eq!(Expression::constant(1).output_name(), None);
    }

    #[test]
    fn test_constant_types() {
        assert_eq!(Expression::constant("a").data_type(), Some(DataTypeName::String));
        assert_eq!(Expression::null().data_type(), Some(DataTypeName::Null));
        assert!(Expression::null().is_null_constant());
        assert!(!Expression::Constant(Constant::multi_valued(DataTypeName::Integer))
            .is_null_constant());
        assert!(Expression::positional_reference(0).is_untyped_reference());
    }
}
