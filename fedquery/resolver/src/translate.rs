//! Translation of criteria on a virtual group into criteria on its definition.
//!
//! Inside an update procedure, `TRANSLATE CRITERIA` stands for the part of the user command's
//! criteria picked out by a selector, rewritten so that it can run against the groups the view is
//! defined over.

use fedquery_ast::collect;
use fedquery_ast::criteria::{CompareOp, Criteria, CriteriaSelector, TranslateCriteria};
use fedquery_ast::expression::{Expression, ReferenceKind};
use fedquery_ast::rewrite;
use fedquery_ast::symbol::ElementSymbol;
use fedquery_common::constants::INPUTS_GROUP;
use indexmap::IndexMap;
use smol_str::SmolStr;
use tracing::debug;

/// Rewrites the predicates of a user command picked out by a selector.
#[derive(Debug, Clone)]
pub struct CriteriaTranslator<'a> {
    selector: &'a CriteriaSelector,
    /// Explicit substitutions keyed by element name, consulted first.
    translations: IndexMap<SmolStr, Expression>,
    /// Substitutions for every column of the virtual group.
    symbol_map: &'a IndexMap<SmolStr, Expression>,
}

impl<'a> CriteriaTranslator<'a> {
    pub fn new(
        selector: &'a CriteriaSelector,
        translations: &[(ElementSymbol, Expression)],
        symbol_map: &'a IndexMap<SmolStr, Expression>,
    ) -> Self {
        let translations = translations
            .iter()
            .map(|(element, expression)| (element.name.to_lowercase().into(), expression.clone()))
            .collect();
        Self {
            selector,
            translations,
            symbol_map,
        }
    }

    /// A translator for a resolved `TRANSLATE CRITERIA` predicate. Only `element = expression`
    /// entries of its `WITH` list contribute substitutions.
    pub fn for_criteria(
        criteria: &'a TranslateCriteria,
        symbol_map: &'a IndexMap<SmolStr, Expression>,
    ) -> Self {
        let translations: Vec<(ElementSymbol, Expression)> = criteria
            .translations
            .iter()
            .filter(|translation| translation.op == CompareOp::Eq)
            .filter_map(|translation| match &translation.left {
                Expression::Element(element) => Some((element.clone(), translation.right.clone())),
                _ => None,
            })
            .collect();
        Self::new(&criteria.selector, &translations, symbol_map)
    }

    /// Translates the selected conjuncts of `criteria`, combined with `AND`. Returns `None` when
    /// no conjunct is selected.
    pub fn translate(&self, criteria: &Criteria) -> Option<Criteria> {
        let parts = criteria.clone().separate();
        let total = parts.len();
        let translated: Vec<Criteria> = parts
            .into_iter()
            .filter(|part| self.selects(part))
            .map(|mut part| {
                self.substitute(&mut part);
                part
            })
            .collect();
        debug!(selected = translated.len(), total, "criteria translated");
        Criteria::conjoin(translated)
    }

    fn selects(&self, criteria: &Criteria) -> bool {
        if !self.selector.selects(criteria) {
            return false;
        }
        if self.selector.elements.is_empty() {
            return true;
        }
        collect::elements(criteria).iter().any(|element| {
            self.selector
                .elements
                .iter()
                .any(|selected| same_element(selected, element))
        })
    }

    fn substitute(&self, criteria: &mut Criteria) {
        rewrite::map_expressions(criteria, |expression| match expression {
            Expression::Element(element) => {
                let key = element.name.to_lowercase();
                self.translations.get(key.as_str()).cloned().or_else(|| {
                    self.symbol_map
                        .iter()
                        .find(|(name, _)| name.eq_ignore_ascii_case(&element.name))
                        .map(|(_, expression)| expression.clone())
                })
            }
            Expression::Reference(reference) => {
                let name = match &reference.kind {
                    ReferenceKind::Positional(index) => format!("param{}", index + 1),
                    ReferenceKind::Named(element) => element.short_name().to_string(),
                };
                let mut input = ElementSymbol::new(format!("{INPUTS_GROUP}.{name}"));
                if let Some(ty) = reference.data_type {
                    input.set_data_type(ty);
                }
                Some(Expression::Element(input))
            }
            _ => None,
        });
    }
}

fn same_element(left: &ElementSymbol, right: &ElementSymbol) -> bool {
    match (left.metadata_id(), right.metadata_id()) {
        (Some(left), Some(right)) => left == right,
        _ => left.name.eq_ignore_ascii_case(&right.name),
    }
}

#[cfg(test)]
mod tests {
    use fedquery_ast::criteria::{CompareCriteria, SelectorKind};
    use fedquery_ast::render::Render;
    use insta::assert_snapshot;

    use super::*;

    fn symbol_map() -> IndexMap<SmolStr, Expression> {
        IndexMap::from([
            ("vm1.g1.v1".into(), Expression::element("pm1.g1.e1")),
            ("vm1.g1.v2".into(), Expression::element("pm1.g1.e2")),
        ])
    }

    fn user_criteria() -> Criteria {
        Criteria::and(vec![
            Criteria::compare(
                Expression::element("vm1.g1.v1"),
                CompareOp::Eq,
                Expression::constant("a"),
            ),
            Criteria::compare(
                Expression::element("vm1.g1.v2"),
                CompareOp::Gt,
                Expression::positional_reference(0),
            ),
        ])
    }

    #[test]
    fn test_translate_everything() {
        let selector = CriteriaSelector::new(SelectorKind::Any, Vec::new());
        let map = symbol_map();
        let translator = CriteriaTranslator::new(&selector, &[], &map);
        let translated = translator.translate(&user_criteria()).unwrap();
        assert_snapshot!(
            translated.render(),
            @"pm1.g1.e1 = 'a' AND pm1.g1.e2 > INPUTS.param1"
        );
    }

    #[test]
    fn test_selector_picks_conjuncts() {
        let map = symbol_map();
        let selector = CriteriaSelector::new(SelectorKind::Compare(CompareOp::Gt), Vec::new());
        let translated = CriteriaTranslator::new(&selector, &[], &map)
            .translate(&user_criteria())
            .unwrap();
        assert_snapshot!(translated.render(), @"pm1.g1.e2 > INPUTS.param1");

        let selector = CriteriaSelector::new(
            SelectorKind::Any,
            vec![ElementSymbol::new("VM1.G1.V1")],
        );
        let translated = CriteriaTranslator::new(&selector, &[], &map)
            .translate(&user_criteria())
            .unwrap();
        assert_snapshot!(translated.render(), @"pm1.g1.e1 = 'a'");

        let selector = CriteriaSelector::new(SelectorKind::IsNull, Vec::new());
        assert!(CriteriaTranslator::new(&selector, &[], &map)
            .translate(&user_criteria())
            .is_none());
    }

    #[test]
    fn test_explicit_translations_win() {
        let map = symbol_map();
        let criteria = TranslateCriteria {
            selector: CriteriaSelector::new(SelectorKind::Compare(CompareOp::Eq), Vec::new()),
            translations: vec![CompareCriteria {
                left: Expression::element("vm1.g1.v1"),
                op: CompareOp::Eq,
                right: Expression::function("upper", vec![Expression::element("pm1.g1.e1")]),
            }],
        };
        let translated = CriteriaTranslator::for_criteria(&criteria, &map)
            .translate(&user_criteria())
            .unwrap();
        assert_snapshot!(translated.render(), @"upper(pm1.g1.e1) = 'a'");
    }
}
