//! Words that must be quoted when used as identifiers.

use std::collections::HashSet;
use std::sync::LazyLock;

static RESERVED_WORDS: LazyLock<HashSet<&'static str>> = LazyLock::new(|| {
    [
        "ALL", "ALTER", "AND", "ANY", "AS", "ASC", "ATOMIC", "BEGIN", "BETWEEN", "BIGDECIMAL",
        "BIGINT", "BIGINTEGER", "BLOB", "BOOLEAN", "BOTH", "BREAK", "BY", "BYTE", "CALL", "CASE",
        "CAST", "CHAR", "CHARACTER", "CHECK", "CLOB", "COLUMN", "CONSTRAINT", "CONTINUE",
        "CONVERT", "CREATE", "CRITERIA", "CROSS", "CURRENT", "DATE", "DECIMAL", "DECLARE",
        "DEFAULT", "DELETE", "DESC", "DISTINCT", "DOUBLE", "DROP", "EACH", "ELSE", "END",
        "ERROR", "ESCAPE", "EXCEPT", "EXEC", "EXECUTE", "EXISTS", "FALSE", "FETCH", "FLOAT",
        "FOR", "FOREIGN", "FROM", "FULL", "FUNCTION", "GROUP", "HAS", "HAVING", "IF",
        "IMMEDIATE", "IN", "INNER", "INOUT", "INSERT", "INTEGER", "INTERSECT", "INTO", "IS",
        "JOIN", "LATERAL", "LEADING", "LEAVE", "LEFT", "LIKE", "LIKE_REGEX", "LIMIT", "LOCAL",
        "LONG", "LOOP", "MAKEDEP", "MAKENOTDEP", "NOCACHE", "NOT", "NULL", "OBJECT", "OF",
        "OFFSET", "ON", "ONLY", "OPTION", "OR", "ORDER", "OUT", "OUTER", "PRIMARY", "PROCEDURE",
        "RAISE", "REAL", "REFERENCES", "RETURN", "RETURNS", "RIGHT", "ROW", "ROWS", "SELECT",
        "SET", "SHORT", "SIMILAR", "SMALLINT", "SOME", "STRING", "TABLE", "TEMPORARY", "THEN",
        "TIME", "TIMESTAMP", "TINYINT", "TO", "TRANSLATE", "TRIGGER", "TRUE", "UNION",
        "UNIQUE", "UNKNOWN", "UPDATE", "USING", "VALUES", "VARCHAR", "VIRTUAL", "WHEN",
        "WHERE", "WHILE", "WITH",
    ]
    .into_iter()
    .collect()
});

/// Returns `true` if `word` is reserved, ignoring case.
pub fn is_reserved_word(word: &str) -> bool {
    RESERVED_WORDS.contains(word.to_ascii_uppercase().as_str())
}

/// Returns `true` if an identifier segment cannot be written bare.
pub fn needs_quoting(segment: &str) -> bool {
    let Some(first) = segment.chars().next() else {
        return true;
    };
    if !(first.is_ascii_alphabetic() || matches!(first, '_' | '#' | '@')) {
        return true;
    }
    if segment
        .chars()
        .any(|c| !(c.is_ascii_alphanumeric() || matches!(c, '_' | '#' | '@')))
    {
        return true;
    }
    is_reserved_word(segment)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reserved_words() {
        assert!(is_reserved_word("select"));
        assert!(is_reserved_word("Group"));
        assert!(!is_reserved_word("g1"));
    }

    #[test]
    fn test_needs_quoting() {
        assert!(needs_quoting("from"));
        assert!(needs_quoting("a b"));
        assert!(needs_quoting("1abc"));
        assert!(!needs_quoting("#temp"));
        assert!(!needs_quoting("@id"));
        assert!(!needs_quoting("e1"));
    }
}
