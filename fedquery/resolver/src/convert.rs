//! Implicit conversion of resolved expressions to a required type.

use fedquery_ast::expression::{Constant, Function};
use fedquery_ast::render::Render;
use fedquery_ast::Expression;
use fedquery_catalog::function::FunctionLibrary;
use fedquery_catalog::provider::CatalogProvider;
use fedquery_common::data_type::DataTypeName;

use crate::error::{ResolveError, ResolveResult};

pub(crate) struct Converter<'a> {
    catalog: &'a dyn CatalogProvider,
    coerce_string_literals: bool,
}

impl<'a> Converter<'a> {
    pub(crate) fn new(catalog: &'a dyn CatalogProvider, coerce_string_literals: bool) -> Self {
        Self {
            catalog,
            coerce_string_literals,
        }
    }

    /// Makes `expression` produce values of type `target`.
    ///
    /// Untyped bind parameters and null literals take the type directly, other literals are
    /// converted in place when possible, and everything else is wrapped in an implicit
    /// `convert`.
    pub(crate) fn convert(&self, expression: &mut Expression, target: DataTypeName) -> ResolveResult<()> {
        if let Expression::Reference(reference) = expression {
            if reference.data_type.is_none() {
                reference.data_type = Some(target);
                return Ok(());
            }
        }
        let Some(source) = expression.data_type() else {
            return Ok(());
        };
        if source == target {
            return Ok(());
        }
        if let Expression::Constant(constant) = expression {
            if self.convert_literal(constant, target) {
                return Ok(());
            }
        }
        if self.catalog.is_implicit_conversion(source, target) {
            let inner = std::mem::replace(expression, Expression::null());
            *expression = Expression::Function(Function::implicit_conversion(
                inner,
                target,
                FunctionLibrary::conversion_descriptor(source, target),
            ));
            return Ok(());
        }
        Err(ResolveError::NoImplicitConversion {
            expression: expression.render(),
            from: source,
            to: target,
        })
    }

    /// Returns `true` if the literal could take `target` without a conversion function.
    fn can_convert_literal(&self, constant: &Constant, target: DataTypeName) -> bool {
        if constant.multi_valued {
            return self.catalog.is_implicit_conversion(constant.data_type, target);
        }
        if constant.value.is_null() {
            return true;
        }
        self.literal_conversion_allowed(constant.data_type, target)
            && constant.value.convert_to(target).is_ok()
    }

    fn literal_conversion_allowed(&self, source: DataTypeName, target: DataTypeName) -> bool {
        self.catalog.is_implicit_conversion(source, target)
            || (self.coerce_string_literals && source.is_string_like())
            || (source.is_numeric() && target.is_numeric())
    }

    fn convert_literal(&self, constant: &mut Constant, target: DataTypeName) -> bool {
        if constant.multi_valued {
            if self.catalog.is_implicit_conversion(constant.data_type, target) {
                constant.data_type = target;
                return true;
            }
            return false;
        }
        if constant.value.is_null() {
            *constant = Constant::typed_null(target);
            return true;
        }
        if !self.literal_conversion_allowed(constant.data_type, target) {
            return false;
        }
        match constant.value.convert_to(target) {
            Ok(value) => {
                constant.value = value;
                constant.data_type = target;
                true
            }
            Err(_) => false,
        }
    }

    /// Converts `expressions` to their common type and returns it.
    ///
    /// Literals adapt to the other operands when they can; a literal that cannot joins the
    /// common type computation. Returns `None` when no operand has a type yet.
    pub(crate) fn unify(
        &self,
        mut expressions: Vec<&mut Expression>,
        context: &str,
    ) -> ResolveResult<Option<DataTypeName>> {
        let operand_types: Vec<DataTypeName> = expressions
            .iter()
            .filter(|e| is_typed(e))
            .filter(|e| !matches!(e, Expression::Constant(_)))
            .filter_map(|e| e.data_type())
            .collect();
        let mut target = if operand_types.is_empty() {
            let literal_types: Vec<DataTypeName> = expressions
                .iter()
                .filter(|e| is_typed(e))
                .filter_map(|e| e.data_type())
                .collect();
            if literal_types.is_empty() {
                return Ok(expressions
                    .iter()
                    .any(|e| e.is_null_constant())
                    .then_some(DataTypeName::Null));
            }
            self.common_type(&literal_types, context)?
        } else {
            self.common_type(&operand_types, context)?
        };
        for expression in &expressions {
            if let Expression::Constant(constant) = &**expression {
                if !self.can_convert_literal(constant, target) {
                    target = self.common_type(&[target, constant.data_type], context)?;
                }
            }
        }
        for expression in &mut expressions {
            self.convert(expression, target)?;
        }
        Ok(Some(target))
    }

    pub(crate) fn common_type(&self, types: &[DataTypeName], context: &str) -> ResolveResult<DataTypeName> {
        self.catalog
            .common_type(types)
            .ok_or_else(|| ResolveError::NoCommonType {
                context: context.to_string(),
                types: types.to_vec(),
            })
    }
}

fn is_typed(expression: &Expression) -> bool {
    !expression.is_untyped_reference() && !expression.is_null_constant()
}

#[cfg(test)]
mod tests {
    use fedquery_ast::ElementSymbol;
    use fedquery_catalog::memory::MemoryCatalog;
    use insta::assert_snapshot;

    use super::*;

    fn element(name: &str, data_type: DataTypeName) -> Expression {
        Expression::Element(ElementSymbol::typed(name, data_type))
    }

    #[test]
    fn test_literals_adapt_to_operands() {
        let catalog = MemoryCatalog::new();
        let converter = Converter::new(&catalog, true);
        let mut column = element("e1", DataTypeName::Short);
        let mut literal = Expression::constant(5);
        let ty = converter
            .unify(vec![&mut column, &mut literal], "comparison")
            .unwrap();
        assert_eq!(ty, Some(DataTypeName::Short));
        assert_eq!(literal.data_type(), Some(DataTypeName::Short));
        assert_eq!(column, element("e1", DataTypeName::Short));
    }

    #[test]
    fn test_unconvertible_literal_widens() {
        let catalog = MemoryCatalog::new();
        let converter = Converter::new(&catalog, true);
        let mut column = element("e1", DataTypeName::Integer);
        let mut literal = Expression::constant("abc");
        let ty = converter
            .unify(vec![&mut column, &mut literal], "comparison")
            .unwrap();
        assert_eq!(ty, Some(DataTypeName::String));
        assert_snapshot!(column.render(), @"convert(e1, string)");
    }

    #[test]
    fn test_string_literal_coercion() {
        let catalog = MemoryCatalog::new();
        let mut literal = Expression::constant("42");
        Converter::new(&catalog, true)
            .convert(&mut literal, DataTypeName::Integer)
            .unwrap();
        assert_eq!(literal, Expression::constant(42));

        let mut literal = Expression::constant("42");
        let err = Converter::new(&catalog, false)
            .convert(&mut literal, DataTypeName::Integer)
            .unwrap_err();
        assert_snapshot!(err, @"'42' of type string cannot be implicitly converted to integer");
    }

    #[test]
    fn test_nulls_and_references_take_the_type() {
        let catalog = MemoryCatalog::new();
        let converter = Converter::new(&catalog, true);
        let mut null = Expression::null();
        let mut reference = Expression::positional_reference(0);
        let ty = converter
            .unify(vec![&mut null, &mut reference], "comparison")
            .unwrap();
        assert_eq!(ty, Some(DataTypeName::Null));

        let mut column = element("e1", DataTypeName::Date);
        converter
            .unify(vec![&mut column, &mut null, &mut reference], "comparison")
            .unwrap();
        assert_eq!(null.data_type(), Some(DataTypeName::Date));
        assert_eq!(reference.data_type(), Some(DataTypeName::Date));
    }

    #[test]
    fn test_no_common_type() {
        let catalog = MemoryCatalog::new();
        let converter = Converter::new(&catalog, true);
        let mut left = element("e1", DataTypeName::Integer);
        let mut right = element("e2", DataTypeName::Blob);
        let err = converter
            .unify(vec![&mut left, &mut right], "comparison")
            .unwrap_err();
        assert!(matches!(err, ResolveError::NoCommonType { .. }));
    }
}
