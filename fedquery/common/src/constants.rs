/// Rendered in place of an absent node.
pub const UNDEFINED: &str = "<undefined>";

/// Pseudo-group holding the variables declared in a procedure block.
pub const VARIABLES_GROUP: &str = "VARIABLES";
/// Pseudo-group holding the new values of an update procedure.
pub const INPUTS_GROUP: &str = "INPUTS";
/// Pseudo-group of boolean flags telling which columns an update changes.
pub const CHANGING_GROUP: &str = "CHANGING";
pub const NEW_GROUP: &str = "NEW";
pub const OLD_GROUP: &str = "OLD";
/// Pseudo-group holding the `USING` bindings of a dynamic command.
pub const DVARS_GROUP: &str = "DVARS";

/// Implicitly declared procedure variable holding the last update count.
pub const ROWCOUNT_VARIABLE: &str = "ROWCOUNT";

pub const DEFAULT_IMPLICIT_TEMP_PREFIX: &str = "#";

/// Selecting this name from a document model selects the whole document.
pub const DOCUMENT_ROOT_NAME: &str = "xml";

/// Prefix of names synthesized for unnamed projected expressions.
pub const EXPRESSION_SYMBOL_PREFIX: &str = "expr";

pub const CONVERT_FUNCTION: &str = "convert";
pub const CAST_FUNCTION: &str = "cast";

/// Columns of the group bound by a block's `EXCEPTION` clause.
pub const EXCEPTION_STATE_COLUMN: &str = "STATE";
pub const EXCEPTION_ERRORCODE_COLUMN: &str = "ERRORCODE";
pub const EXCEPTION_MESSAGE_COLUMN: &str = "MESSAGE";
pub const EXCEPTION_OBJECT_COLUMN: &str = "EXCEPTION";
pub const EXCEPTION_CHAIN_COLUMN: &str = "CHAIN";
