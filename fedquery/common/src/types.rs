use std::fmt;
use std::num::NonZeroU32;

use serde::{Deserialize, Serialize};
use smol_str::SmolStr;

/// Identifier of a physical or virtual group in the catalog.
///
/// # Examples
/// [`NonZeroU32`] is used so that `Option<GroupId>` stays 4 bytes wide:
/// ```
/// use std::mem::size_of;
///
/// use fedquery_common::types::GroupId;
///
/// assert_eq!(size_of::<Option<GroupId>>(), size_of::<GroupId>());
/// ```
pub type GroupId = NonZeroU32;

/// Identifier of a stored procedure in the catalog.
pub type ProcedureId = NonZeroU32;

/// Identity of the metadata a group symbol resolved to.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GroupMetadataId {
    Physical(GroupId),
    /// A group defined only for the duration of a resolution: its upper-cased name and the serial
    /// its temp store assigned when the group was defined.
    Temp(SmolStr, u32),
}

impl GroupMetadataId {
    #[inline]
    pub fn is_temp(&self) -> bool {
        matches!(self, GroupMetadataId::Temp(..))
    }

    #[inline]
    pub fn as_physical(&self) -> Option<GroupId> {
        match self {
            GroupMetadataId::Physical(id) => Some(*id),
            GroupMetadataId::Temp(..) => None,
        }
    }
}

impl fmt::Display for GroupMetadataId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GroupMetadataId::Physical(id) => write!(f, "group#{id}"),
            GroupMetadataId::Temp(key, serial) => write!(f, "temp:{key}#{serial}"),
        }
    }
}

/// Identity of the metadata an element symbol resolved to.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ElementMetadataId {
    pub group: GroupMetadataId,
    /// Canonical short name of the column.
    pub name: SmolStr,
    /// Zero-based position of the column within its group.
    pub position: usize,
}

impl ElementMetadataId {
    #[inline]
    pub fn new(group: GroupMetadataId, name: impl Into<SmolStr>, position: usize) -> Self {
        Self {
            group,
            name: name.into(),
            position,
        }
    }
}

/// Upper-cased key used for case-insensitive name lookups.
#[inline]
pub fn name_key(name: &str) -> SmolStr {
    SmolStr::new(name.to_ascii_uppercase())
}
