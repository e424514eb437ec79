use fedquery_ast::GroupSymbol;

/// The groups in scope at one level of nesting, linked to the scopes enclosing it.
///
/// Element names are looked up innermost level first; a name found at an enclosing level
/// refers to that level's group (a correlated reference).
#[derive(Debug, Default)]
pub struct GroupContext<'p> {
    parent: Option<&'p GroupContext<'p>>,
    groups: Vec<GroupSymbol>,
}

impl GroupContext<'static> {
    pub fn new(groups: Vec<GroupSymbol>) -> Self {
        Self {
            parent: None,
            groups,
        }
    }
}

impl<'p> GroupContext<'p> {
    /// A nested scope holding `groups`.
    pub fn child(&self, groups: Vec<GroupSymbol>) -> GroupContext<'_> {
        GroupContext {
            parent: Some(self),
            groups,
        }
    }

    #[inline]
    pub fn groups(&self) -> &[GroupSymbol] {
        &self.groups
    }

    /// This scope followed by the enclosing ones, innermost first.
    pub fn levels(&self) -> impl Iterator<Item = &GroupContext<'p>> {
        std::iter::successors(Some(self), |scope| scope.parent)
    }

    /// Every group in scope, innermost first.
    pub fn all_groups(&self) -> impl Iterator<Item = &GroupSymbol> {
        self.levels().flat_map(|scope| scope.groups.iter())
    }
}
