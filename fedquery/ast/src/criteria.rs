//! Boolean predicates.

use enum_as_inner::EnumAsInner;

use crate::command::Command;
use crate::expression::Expression;
use crate::macros::{base, ext};
use crate::symbol::ElementSymbol;

#[apply(base)]
#[derive(EnumAsInner)]
pub enum Criteria {
    Compare(CompareCriteria),
    Between(BetweenCriteria),
    IsNull(IsNullCriteria),
    Match(MatchCriteria),
    Set(SetCriteria),
    SubquerySet(SubquerySetCriteria),
    Compound(CompoundCriteria),
    Not(NotCriteria),
    Exists(ExistsCriteria),
    SubqueryCompare(SubqueryCompareCriteria),
    /// `HAS [op] CRITERIA [ON (elements)]`, valid inside update procedures.
    Has(HasCriteria),
    /// `TRANSLATE [op] CRITERIA [ON (elements)] [WITH (translations)]`.
    Translate(TranslateCriteria),
}

impl Criteria {
    pub fn compare(left: Expression, op: CompareOp, right: Expression) -> Self {
        Criteria::Compare(CompareCriteria { left, op, right })
    }

    pub fn and(criteria: Vec<Criteria>) -> Self {
        Criteria::Compound(CompoundCriteria {
            op: LogicalOp::And,
            criteria,
        })
    }

    pub fn or(criteria: Vec<Criteria>) -> Self {
        Criteria::Compound(CompoundCriteria {
            op: LogicalOp::Or,
            criteria,
        })
    }

    /// Combines predicates with `AND`, flattening nested conjunctions.
    ///
    /// Returns `None` for an empty input and the predicate itself for a single one.
    pub fn conjoin<I>(criteria: I) -> Option<Criteria>
    where
        I: IntoIterator<Item = Criteria>,
    {
        let mut parts = Vec::new();
        for criteria in criteria {
            match criteria {
                Criteria::Compound(CompoundCriteria {
                    op: LogicalOp::And,
                    criteria,
                }) => parts.extend(criteria),
                other => parts.push(other),
            }
        }
        match parts.len() {
            0 => None,
            1 => parts.pop(),
            _ => Some(Criteria::and(parts)),
        }
    }

    /// Splits a predicate into its top-level conjuncts.
    pub fn separate(self) -> Vec<Criteria> {
        match self {
            Criteria::Compound(CompoundCriteria {
                op: LogicalOp::And,
                criteria,
            }) => criteria.into_iter().flat_map(Criteria::separate).collect(),
            other => vec![other],
        }
    }
}

#[apply(ext)]
pub enum CompareOp {
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
}

impl CompareOp {
    #[inline]
    pub fn symbol(self) -> &'static str {
        match self {
            CompareOp::Eq => "=",
            CompareOp::Ne => "<>",
            CompareOp::Lt => "<",
            CompareOp::Le => "<=",
            CompareOp::Gt => ">",
            CompareOp::Ge => ">=",
        }
    }
}

#[apply(base)]
pub struct CompareCriteria {
    pub left: Expression,
    pub op: CompareOp,
    pub right: Expression,
}

#[apply(base)]
pub struct BetweenCriteria {
    pub expression: Expression,
    pub lower: Expression,
    pub upper: Expression,
    pub negated: bool,
}

#[apply(base)]
pub struct IsNullCriteria {
    pub expression: Expression,
    pub negated: bool,
}

#[apply(ext)]
pub enum MatchMode {
    Like,
    SimilarTo,
    Regex,
}

#[apply(base)]
pub struct MatchCriteria {
    pub left: Expression,
    pub right: Expression,
    pub escape: Option<char>,
    pub negated: bool,
    pub mode: MatchMode,
}

/// `expression IN (values)`
#[apply(base)]
pub struct SetCriteria {
    pub expression: Expression,
    pub values: Vec<Expression>,
    pub negated: bool,
}

/// `expression IN (subquery)`
#[apply(base)]
pub struct SubquerySetCriteria {
    pub expression: Expression,
    pub command: Box<Command>,
    pub negated: bool,
}

#[apply(ext)]
pub enum LogicalOp {
    And,
    Or,
}

#[apply(base)]
pub struct CompoundCriteria {
    pub op: LogicalOp,
    pub criteria: Vec<Criteria>,
}

#[apply(base)]
pub struct NotCriteria {
    pub criteria: Box<Criteria>,
}

#[apply(base)]
pub struct ExistsCriteria {
    pub command: Box<Command>,
    pub negated: bool,
}

#[apply(ext)]
pub enum Quantifier {
    Some,
    Any,
    All,
}

/// `left op {SOME|ANY|ALL} (subquery)`
#[apply(base)]
pub struct SubqueryCompareCriteria {
    pub left: Expression,
    pub op: CompareOp,
    pub quantifier: Quantifier,
    pub command: Box<Command>,
}

/// Which predicates a [`CriteriaSelector`] picks out.
#[apply(ext)]
pub enum SelectorKind {
    Any,
    Compare(CompareOp),
    Like,
    In,
    IsNull,
    Between,
}

#[apply(base)]
pub struct CriteriaSelector {
    pub kind: SelectorKind,
    /// Virtual-group elements a predicate must reference to be selected; empty selects any.
    pub elements: Vec<ElementSymbol>,
}

impl CriteriaSelector {
    pub fn new(kind: SelectorKind, elements: Vec<ElementSymbol>) -> Self {
        Self { kind, elements }
    }

    /// Returns `true` if a predicate of the given shape is picked out by this selector.
    pub fn selects(&self, criteria: &Criteria) -> bool {
        match (self.kind, criteria) {
            (SelectorKind::Any, _) => true,
            (SelectorKind::Compare(op), Criteria::Compare(c)) => c.op == op,
            (SelectorKind::Like, Criteria::Match(_))
            | (SelectorKind::In, Criteria::Set(_) | Criteria::SubquerySet(_))
            | (SelectorKind::IsNull, Criteria::IsNull(_))
            | (SelectorKind::Between, Criteria::Between(_)) => true,
            _ => false,
        }
    }
}

#[apply(base)]
pub struct HasCriteria {
    pub selector: CriteriaSelector,
}

#[apply(base)]
pub struct TranslateCriteria {
    pub selector: CriteriaSelector,
    /// Explicit `virtual element = expression` substitutions.
    pub translations: Vec<CompareCriteria>,
}
