//! INI reader.
//!
//! `[section]` headers become nested tables (`[a.b]` nests twice), keys
//! before the first header land at the root. Lines starting with `;` or `#`
//! are comments, and so is a `;` or `#` after whitespace outside quotes.
//! Quoted values stay strings; bare values are coerced.

use serde_json::Value;
use std::path::Path;

use super::{ReadError, Reader, into_document, read_to_string, split_assignment, unquote};
use crate::format::Format;
use crate::value::{coerce_scalar, empty_tree, insert_path};

#[derive(Debug, Clone, Copy, Default)]
pub struct IniReader;

impl Reader for IniReader {
    fn read(&self, path: &Path) -> Result<Option<Value>, ReadError> {
        let contents = read_to_string(path)?;
        let tree = parse_ini(&contents).map_err(|(line, message)| {
            ReadError::parse(Format::Ini, path, format!("line {}: {}", line, message))
        })?;
        into_document(Format::Ini, path, tree)
    }
}

fn parse_ini(contents: &str) -> Result<Value, (usize, String)> {
    let mut tree = empty_tree();
    let mut section: Option<String> = None;

    for (idx, raw) in contents.lines().enumerate() {
        let line = raw.trim();
        if line.is_empty() || line.starts_with(';') || line.starts_with('#') {
            continue;
        }

        if let Some(rest) = line.strip_prefix('[') {
            let name = rest
                .strip_suffix(']')
                .ok_or_else(|| (idx + 1, format!("unterminated section header '{}'", line)))?
                .trim();
            if name.is_empty() {
                return Err((idx + 1, "empty section name".to_string()));
            }
            section = Some(name.to_string());
            continue;
        }

        let (key, raw_value) = split_assignment(line)
            .ok_or_else(|| (idx + 1, format!("expected 'key = value', got '{}'", line)))?;
        let raw_value = strip_inline_comment(raw_value);
        let value = match unquote(raw_value) {
            Some(s) => Value::String(s.to_string()),
            None => coerce_scalar(raw_value),
        };
        let path = match &section {
            Some(section) => format!("{}.{}", section, key),
            None => key.to_string(),
        };
        insert_path(&mut tree, &path, value);
    }

    Ok(tree)
}

/// Cut a trailing `; comment` or `# comment` off a value.
fn strip_inline_comment(value: &str) -> &str {
    let mut quote: Option<char> = None;
    let mut prev_is_space = false;
    for (idx, ch) in value.char_indices() {
        match quote {
            Some(open) if ch == open => quote = None,
            Some(_) => {}
            None if ch == '"' || ch == '\'' => quote = Some(ch),
            None if (ch == ';' || ch == '#') && prev_is_space => {
                return value[..idx].trim_end();
            }
            None => {}
        }
        prev_is_space = ch.is_whitespace();
    }
    value
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_sections_become_tables() {
        let tree = parse_ini(
            r#"
; global
name = demo

[database]
host = localhost
port = 5432
ssl = true

[server.tls]
cert = "/etc/cert.pem"
"#,
        )
        .unwrap();

        assert_eq!(
            tree,
            json!({
                "name": "demo",
                "database": {"host": "localhost", "port": 5432, "ssl": true},
                "server": {"tls": {"cert": "/etc/cert.pem"}}
            })
        );
    }

    #[test]
    fn test_quoted_numbers_stay_strings() {
        let tree = parse_ini("zip = \"01234\"").unwrap();
        assert_eq!(tree, json!({"zip": "01234"}));
    }

    #[test]
    fn test_inline_comments_are_stripped() {
        let tree = parse_ini(
            "port = 80 ; http\nhost = example.com # primary\ntag = \"a ; b\" ; quoted\nurl = http://x#frag\n",
        )
        .unwrap();
        assert_eq!(
            tree,
            json!({"port": 80, "host": "example.com", "tag": "a ; b", "url": "http://x#frag"})
        );
    }

    #[test]
    fn test_unterminated_header_reports_line() {
        let err = parse_ini("a = 1\n[broken\n").unwrap_err();
        assert_eq!(err.0, 2);
    }

    #[test]
    fn test_line_without_assignment_is_error() {
        let err = parse_ini("[s]\njunk\n").unwrap_err();
        assert_eq!(err.0, 2);
        assert!(err.1.contains("junk"));
    }
}
