//! Column types recovered from `CREATE TABLE` text.
//!
//! The would-create statement for a dataset is the cheapest source of a
//! storage type for a column the explicit mapping does not cover. This module
//! reads the column definitions back out of that text.

use std::collections::BTreeMap;
use std::sync::OnceLock;

use regex::Regex;

/// Column name to type declaration, as written in the DDL.
pub type ColumnDefinitions = BTreeMap<String, String>;

/// Leading keywords of table-level constraints, which are not columns.
const CONSTRAINT_KEYWORDS: &[&str] = &["PRIMARY", "CONSTRAINT", "UNIQUE", "FOREIGN", "CHECK"];

fn definition_regex() -> &'static Regex {
    static DEFINITION: OnceLock<Regex> = OnceLock::new();
    DEFINITION.get_or_init(|| {
        Regex::new(r#"(?s)^\s*(?:\[((?:[^\]]|\]\])+)\]|"((?:[^"]|"")+)"|(\w+))\s+(\S.*?)\s*$"#)
            .expect("column definition pattern is valid")
    })
}

/// Extracts column types from a `CREATE TABLE` statement.
///
/// Only the block between the first `(` and the last `)` is read. Definitions
/// are split on top-level commas. Each definition must be an identifier
/// (`[bracketed]`, `"quoted"` or a bare word) followed by type text; anything
/// else is skipped, as are table-level constraints. Returns an empty map when
/// there is no parenthesized block.
#[must_use]
pub fn parse_create_table(sql: &str) -> ColumnDefinitions {
    let mut definitions = ColumnDefinitions::new();

    let (Some(open), Some(close)) = (find_unquoted(sql, '('), sql.rfind(')')) else {
        return definitions;
    };
    if close <= open {
        return definitions;
    }

    for definition in split_top_level(&sql[open + 1..close]) {
        let Some(caps) = definition_regex().captures(definition) else {
            continue;
        };
        let name = match (caps.get(1), caps.get(2), caps.get(3)) {
            (Some(bracketed), _, _) => bracketed.as_str().replace("]]", "]"),
            (_, Some(quoted), _) => quoted.as_str().replace("\"\"", "\""),
            (_, _, Some(bare)) if !is_constraint(bare.as_str()) => bare.as_str().to_string(),
            _ => continue,
        };
        let type_text = caps.get(4).map_or("", |m| m.as_str());
        definitions.insert(name, type_text.to_string());
    }

    definitions
}

fn is_constraint(word: &str) -> bool {
    CONSTRAINT_KEYWORDS
        .iter()
        .any(|keyword| keyword.eq_ignore_ascii_case(word))
}

/// Tracks whether a scan is inside a `[bracketed]` or `"quoted"` identifier.
#[derive(Default)]
struct QuoteState {
    closing: Option<char>,
}

impl QuoteState {
    /// Feeds one character; returns true if it is outside any identifier.
    fn outside(&mut self, ch: char) -> bool {
        match self.closing {
            Some(quote) => {
                if ch == quote {
                    self.closing = None;
                }
                false
            }
            None => match ch {
                '[' => {
                    self.closing = Some(']');
                    false
                }
                '"' => {
                    self.closing = Some('"');
                    false
                }
                _ => true,
            },
        }
    }
}

/// Byte offset of the first `target` outside quoted identifiers.
fn find_unquoted(sql: &str, target: char) -> Option<usize> {
    let mut quotes = QuoteState::default();
    sql.char_indices()
        .find(|&(_, ch)| quotes.outside(ch) && ch == target)
        .map(|(index, _)| index)
}

/// Splits on commas outside nested parentheses and quoted identifiers.
fn split_top_level(body: &str) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut depth = 0_usize;
    let mut quotes = QuoteState::default();
    let mut start = 0;

    for (index, ch) in body.char_indices() {
        if !quotes.outside(ch) {
            continue;
        }
        match ch {
            '(' => depth += 1,
            ')' => depth = depth.saturating_sub(1),
            ',' if depth == 0 => {
                parts.push(&body[start..index]);
                start = index + 1;
            }
            _ => {}
        }
    }
    parts.push(&body[start..]);
    parts
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_bracketed_columns() {
        let sql = "CREATE TABLE [quotes] (\n  [id] BIGINT,\n  [name] NVARCHAR(MAX),\n  [price] FLOAT\n)";
        let parsed = parse_create_table(sql);
        assert_eq!(parsed.len(), 3);
        assert_eq!(parsed["id"], "BIGINT");
        assert_eq!(parsed["name"], "NVARCHAR(MAX)");
        assert_eq!(parsed["price"], "FLOAT");
    }

    #[test]
    fn test_parse_quoted_and_bare_columns() {
        let sql = "CREATE TABLE \"quotes\" (\n  \"first name\" TEXT,\n  id INTEGER NOT NULL\n)";
        let parsed = parse_create_table(sql);
        assert_eq!(parsed["first name"], "TEXT");
        assert_eq!(parsed["id"], "INTEGER NOT NULL");
    }

    #[test]
    fn test_nested_commas_do_not_split() {
        let parsed = parse_create_table("CREATE TABLE t (amount DECIMAL(10, 2), note TEXT)");
        assert_eq!(parsed["amount"], "DECIMAL(10, 2)");
        assert_eq!(parsed["note"], "TEXT");
    }

    #[test]
    fn test_commas_inside_identifiers_do_not_split() {
        let parsed = parse_create_table("CREATE TABLE t ([a,b] TEXT, \"c,d\" REAL)");
        assert_eq!(parsed["a,b"], "TEXT");
        assert_eq!(parsed["c,d"], "REAL");
    }

    #[test]
    fn test_escaped_quotes_in_identifiers() {
        let parsed = parse_create_table("CREATE TABLE t ([a]]b] TEXT, \"c\"\"d\" REAL)");
        assert_eq!(parsed["a]b"], "TEXT");
        assert_eq!(parsed["c\"d"], "REAL");
    }

    #[test]
    fn test_untyped_definition_is_skipped() {
        let parsed = parse_create_table("CREATE TABLE t (\n  \"id\" INTEGER,\n  \"pending\"\n)");
        assert_eq!(parsed.len(), 1);
        assert!(!parsed.contains_key("pending"));
    }

    #[test]
    fn test_table_constraints_are_skipped() {
        let parsed = parse_create_table(
            "CREATE TABLE t (id INTEGER, name TEXT, PRIMARY KEY (id), CONSTRAINT uq UNIQUE (name))",
        );
        assert_eq!(parsed.len(), 2);
        assert!(!parsed.contains_key("PRIMARY"));
        assert!(!parsed.contains_key("CONSTRAINT"));
    }

    #[test]
    fn test_parentheses_in_table_name() {
        let sql = "CREATE TABLE \"prices (usd)\" (\n  \"id\" INTEGER,\n  \"volume\" INTEGER\n)";
        let parsed = parse_create_table(sql);
        assert_eq!(parsed.len(), 2);
        assert_eq!(parsed["volume"], "INTEGER");

        let parsed = parse_create_table("CREATE TABLE [a (b)] ([c] BIGINT)");
        assert_eq!(parsed["c"], "BIGINT");
    }

    #[test]
    fn test_no_parenthesis_block() {
        assert!(parse_create_table("CREATE TABLE t").is_empty());
        assert!(parse_create_table("").is_empty());
        assert!(parse_create_table(") backwards (").is_empty());
    }
}
