use fedquery_common::constants::DEFAULT_IMPLICIT_TEMP_PREFIX;
use serde::{Deserialize, Serialize};

/// Settings of a resolution, passed explicitly to every [`Resolver`](crate::Resolver).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ResolverOptions {
    /// Types projected untyped `NULL` literals of set operations as `string`.
    pub resolve_null_literals: bool,
    /// Names starting with this prefix may define temp groups implicitly through `INTO` or
    /// `INSERT INTO`.
    pub implicit_temp_prefix: String,
    /// Lets a string literal compared with a non-string expression be converted during
    /// resolution when its text parses as the other type.
    pub coerce_string_literals: bool,
}

impl Default for ResolverOptions {
    fn default() -> Self {
        Self {
            resolve_null_literals: false,
            implicit_temp_prefix: DEFAULT_IMPLICIT_TEMP_PREFIX.to_string(),
            coerce_string_literals: true,
        }
    }
}

impl ResolverOptions {
    pub fn from_json(text: &str) -> serde_json::Result<Self> {
        serde_json::from_str(text)
    }

    #[inline]
    pub fn is_implicit_temp(&self, name: &str) -> bool {
        !self.implicit_temp_prefix.is_empty() && name.starts_with(&self.implicit_temp_prefix)
    }
}
