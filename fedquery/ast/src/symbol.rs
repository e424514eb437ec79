//! Group and element symbols.

use fedquery_common::data_type::DataTypeName;
use fedquery_common::types::{ElementMetadataId, GroupMetadataId};

use crate::Ident;
use crate::macros::base;

/// A reference to a table-like group: a physical or virtual table, a temp table, a
/// procedure's result set or a procedural pseudo-group such as `VARIABLES`.
#[apply(base)]
pub struct GroupSymbol {
    /// Name the group is referred to by within its command: the alias if aliased, otherwise the
    /// group's name (canonical once resolved).
    pub name: Ident,
    /// Name of the aliased group, present only when `name` is an alias.
    pub definition: Option<Ident>,
    metadata_id: Option<GroupMetadataId>,
    pub is_temp: bool,
    pub is_procedure: bool,
    pub is_document: bool,
}

impl GroupSymbol {
    pub fn new(name: impl Into<Ident>) -> Self {
        Self {
            name: name.into(),
            definition: None,
            metadata_id: None,
            is_temp: false,
            is_procedure: false,
            is_document: false,
        }
    }

    pub fn aliased(alias: impl Into<Ident>, definition: impl Into<Ident>) -> Self {
        Self {
            definition: Some(definition.into()),
            ..Self::new(alias)
        }
    }

    /// The name to look up in metadata.
    #[inline]
    pub fn lookup_name(&self) -> &str {
        self.definition.as_deref().unwrap_or(self.name.as_str())
    }

    #[inline]
    pub fn is_aliased(&self) -> bool {
        self.definition.is_some()
    }

    #[inline]
    pub fn metadata_id(&self) -> Option<&GroupMetadataId> {
        self.metadata_id.as_ref()
    }

    #[inline]
    pub fn is_resolved(&self) -> bool {
        self.metadata_id.is_some()
    }

    /// Binds the symbol to metadata. A bound symbol keeps its first binding.
    ///
    /// Returns `false` if the symbol was already bound to different metadata.
    pub fn set_metadata_id(&mut self, id: GroupMetadataId) -> bool {
        match &self.metadata_id {
            Some(existing) => *existing == id,
            None => {
                self.is_temp = id.is_temp() || self.is_temp;
                self.metadata_id = Some(id);
                true
            }
        }
    }

    /// Returns `true` if an element qualifier refers to this group.
    ///
    /// An aliased group only answers to its alias. Otherwise the qualifier may be the full name
    /// or any dot-separated suffix of it.
    pub fn matches_qualifier(&self, qualifier: &str) -> bool {
        if self.name.eq_ignore_ascii_case(qualifier) {
            return true;
        }
        !self.is_aliased() && has_dotted_suffix(&self.name, qualifier)
    }
}

/// Returns `true` if `name` ends with `.suffix`, ignoring case.
pub fn has_dotted_suffix(name: &str, suffix: &str) -> bool {
    if name.len() <= suffix.len() {
        return false;
    }
    let split = name.len() - suffix.len();
    name.is_char_boundary(split)
        && name[split..].eq_ignore_ascii_case(suffix)
        && name[..split].ends_with('.')
}

/// A reference to a column, variable or parameter.
#[apply(base)]
pub struct ElementSymbol {
    /// Name as written, possibly qualified. Canonicalized to `group.column` once resolved.
    pub name: Ident,
    /// The group the element belongs to, set on resolution.
    pub group: Option<Box<GroupSymbol>>,
    metadata_id: Option<ElementMetadataId>,
    data_type: Option<DataTypeName>,
    /// Set when the element resolved against an enclosing scope or a procedural pseudo-group.
    pub is_external: bool,
}

impl ElementSymbol {
    pub fn new(name: impl Into<Ident>) -> Self {
        Self {
            name: name.into(),
            group: None,
            metadata_id: None,
            data_type: None,
            is_external: false,
        }
    }

    /// Creates an element carrying a declared type but no binding, as in `AS` column lists.
    pub fn typed(name: impl Into<Ident>, data_type: DataTypeName) -> Self {
        Self {
            data_type: Some(data_type),
            ..Self::new(name)
        }
    }

    /// The part of the name after the last dot.
    #[inline]
    pub fn short_name(&self) -> &str {
        self.name.rsplit_once('.').map_or(self.name.as_str(), |(_, short)| short)
    }

    /// The part of the name before the last dot, if any.
    #[inline]
    pub fn qualifier(&self) -> Option<&str> {
        self.name.rsplit_once('.').map(|(qualifier, _)| qualifier)
    }

    #[inline]
    pub fn metadata_id(&self) -> Option<&ElementMetadataId> {
        self.metadata_id.as_ref()
    }

    #[inline]
    pub fn data_type(&self) -> Option<DataTypeName> {
        self.data_type
    }

    #[inline]
    pub fn is_resolved(&self) -> bool {
        self.metadata_id.is_some()
    }

    /// Sets the type of an element that is typed without being bound to metadata.
    #[inline]
    pub fn set_data_type(&mut self, data_type: DataTypeName) {
        self.data_type = Some(data_type);
    }

    /// Binds the element to a column of `group`, canonicalizing its name to `group.column`.
    pub fn bind(&mut self, group: GroupSymbol, id: ElementMetadataId, data_type: DataTypeName) {
        self.name = Ident::new(format!("{}.{}", group.name, id.name));
        self.group = Some(Box::new(group));
        self.metadata_id = Some(id);
        self.data_type = Some(data_type);
    }

    #[inline]
    pub fn group_name(&self) -> Option<&str> {
        self.group.as_deref().map(|group| group.name.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_qualifier_matching() {
        let group = GroupSymbol::new("pm1.g1");
        assert!(group.matches_qualifier("pm1.g1"));
        assert!(group.matches_qualifier("G1"));
        assert!(!group.matches_qualifier("m1.g1"));
        let aliased = GroupSymbol::aliased("x", "pm1.g1");
        assert!(aliased.matches_qualifier("X"));
        assert!(!aliased.matches_qualifier("g1"));
    }

    #[test]
    fn test_metadata_id_is_set_once() {
        let mut group = GroupSymbol::new("#t");
        assert!(group.set_metadata_id(GroupMetadataId::Temp("#T".into(), 1)));
        assert!(group.is_temp);
        assert!(group.set_metadata_id(GroupMetadataId::Temp("#T".into(), 1)));
        assert!(!group.set_metadata_id(GroupMetadataId::Temp("#T".into(), 2)));
        assert_eq!(group.metadata_id(), Some(&GroupMetadataId::Temp("#T".into(), 1)));
    }

    #[test]
    fn test_element_names() {
        let element = ElementSymbol::new("pm1.g1.e1");
        assert_eq!(element.short_name(), "e1");
        assert_eq!(element.qualifier(), Some("pm1.g1"));
        assert_eq!(ElementSymbol::new("e1").qualifier(), None);
    }
}
