use std::fmt;

use miette::Diagnostic;
use thiserror::Error;

/// Raised when a recognized construct is not supported yet.
#[derive(Debug, Clone, PartialEq, Eq, Error, Diagnostic)]
#[error("not implemented: {feature}{issue}")]
#[diagnostic(code(fedquery::not_implemented))]
pub struct NotImplemented {
    feature: String,
    issue: IssueRef,
}

impl NotImplemented {
    pub fn new(feature: impl Into<String>, issue: IssueRef) -> Self {
        Self {
            feature: feature.into(),
            issue,
        }
    }

    #[inline]
    pub fn feature(&self) -> &str {
        &self.feature
    }
}

/// Optional tracking issue attached to a [`NotImplemented`] error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct IssueRef(Option<u32>);

impl From<Option<u32>> for IssueRef {
    #[inline]
    fn from(value: Option<u32>) -> Self {
        Self(value)
    }
}

impl fmt::Display for IssueRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0 {
            Some(issue) => write!(f, " (see issue #{issue})"),
            None => Ok(()),
        }
    }
}

/// Failure converting a [`ScalarValue`](crate::value::ScalarValue) to another type.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConversionError {
    #[error("cannot convert {from} to {to}")]
    Incompatible {
        from: crate::data_type::DataTypeName,
        to: crate::data_type::DataTypeName,
    },

    #[error("value {value} is out of range for {to}")]
    Overflow {
        value: String,
        to: crate::data_type::DataTypeName,
    },

    #[error("cannot parse '{text}' as {to}")]
    Parse {
        text: String,
        to: crate::data_type::DataTypeName,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_implemented_message() {
        let err = NotImplemented::new("xquery", Some(42).into());
        assert_eq!(err.to_string(), "not implemented: xquery (see issue #42)");
        let err = NotImplemented::new("xquery", None.into());
        assert_eq!(err.to_string(), "not implemented: xquery");
    }
}
