//! Front matter extraction.
//!
//! A content file may open with a YAML block fenced by `---` lines:
//!
//! ```text
//! ---
//! title: Hello
//! tags: [a, b]
//! ---
//! # Body starts here
//! ```
//!
//! The closing fence may also be `...`. Everything after the closing fence
//! line is the body, byte for byte. Files that do not open with a fence have
//! empty metadata and the whole file as body.

use serde_json::{Map, Value};
use thiserror::Error;

/// Parsed front matter mapping.
pub type Metadata = Map<String, Value>;

const FENCE: &str = "---";
const CLOSING_FENCES: [&str; 2] = ["---", "..."];
const BOM: char = '\u{feff}';

/// Errors raised for a malformed front matter block.
#[derive(Debug, Error)]
pub enum FrontMatterError {
    #[error("front matter block is never closed (expected a `---` line)")]
    Unterminated,

    #[error("invalid front matter: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("front matter must be a mapping, found {0}")]
    NotMapping(&'static str),
}

/// A content file split into metadata and body.
#[derive(Debug)]
pub struct FrontMatter<'a> {
    pub metadata: Metadata,
    pub body: &'a str,
}

/// Split `content` into its front matter mapping and body.
pub fn extract(content: &str) -> Result<FrontMatter<'_>, FrontMatterError> {
    let unmarked = content.strip_prefix(BOM).unwrap_or(content);
    let offset = content.len() - unmarked.len();

    let mut lines = split_lines(unmarked);
    let Some((_, first)) = lines.next() else {
        return Ok(no_block(content));
    };
    if trim_line(first) != FENCE {
        return Ok(no_block(content));
    }

    let yaml_start = first.len();
    for (start, line) in lines {
        if CLOSING_FENCES.contains(&trim_line(line)) {
            let yaml = &unmarked[yaml_start..start];
            let body = &content[offset + start + line.len()..];
            return Ok(FrontMatter {
                metadata: parse_yaml(yaml)?,
                body,
            });
        }
    }

    Err(FrontMatterError::Unterminated)
}

fn no_block(content: &str) -> FrontMatter<'_> {
    FrontMatter {
        metadata: Metadata::new(),
        body: content,
    }
}

/// Lines with their terminators, paired with their byte offset.
fn split_lines(s: &str) -> impl Iterator<Item = (usize, &str)> {
    s.split_inclusive('\n').scan(0, |pos, line| {
        let start = *pos;
        *pos += line.len();
        Some((start, line))
    })
}

fn trim_line(line: &str) -> &str {
    line.trim_end_matches(['\n', '\r', ' ', '\t'])
}

fn parse_yaml(yaml: &str) -> Result<Metadata, FrontMatterError> {
    if yaml.trim().is_empty() {
        return Ok(Metadata::new());
    }

    match serde_yaml::from_str::<Value>(yaml)? {
        Value::Object(map) => Ok(map),
        // A block holding only comments
        Value::Null => Ok(Metadata::new()),
        Value::Bool(_) => Err(FrontMatterError::NotMapping("a boolean")),
        Value::Number(_) => Err(FrontMatterError::NotMapping("a number")),
        Value::String(_) => Err(FrontMatterError::NotMapping("a string")),
        Value::Array(_) => Err(FrontMatterError::NotMapping("a list")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_no_block() {
        let content = "# Hello\n\nWorld\n";
        let fm = extract(content).unwrap();
        assert!(fm.metadata.is_empty());
        assert_eq!(fm.body, content);
    }

    #[test]
    fn test_empty_file() {
        let fm = extract("").unwrap();
        assert!(fm.metadata.is_empty());
        assert_eq!(fm.body, "");
    }

    #[test]
    fn test_block_removed_byte_for_byte() {
        let content = "---\ntitle: Hi\nlayout: page.html\ndate: 2020-01-01\n---\n# Hello\n\n  indented\n";
        let fm = extract(content).unwrap();

        assert_eq!(fm.metadata["title"], json!("Hi"));
        assert_eq!(fm.metadata["layout"], json!("page.html"));
        assert_eq!(fm.metadata["date"], json!("2020-01-01"));
        assert_eq!(fm.body, "# Hello\n\n  indented\n");
    }

    #[test]
    fn test_crlf_and_dots_fence() {
        let content = "---\r\ntags:\r\n  - a\r\n  - b\r\n...\r\nbody";
        let fm = extract(content).unwrap();
        assert_eq!(fm.metadata["tags"], json!(["a", "b"]));
        assert_eq!(fm.body, "body");
    }

    #[test]
    fn test_bom_is_skipped() {
        let content = "\u{feff}---\ntitle: Bom\n---\nbody";
        let fm = extract(content).unwrap();
        assert_eq!(fm.metadata["title"], json!("Bom"));
        assert_eq!(fm.body, "body");
    }

    #[test]
    fn test_empty_block() {
        let fm = extract("---\n---\nbody").unwrap();
        assert!(fm.metadata.is_empty());
        assert_eq!(fm.body, "body");
    }

    #[test]
    fn test_block_at_end_of_file() {
        let fm = extract("---\ntitle: Only\n---").unwrap();
        assert_eq!(fm.metadata["title"], json!("Only"));
        assert_eq!(fm.body, "");
    }

    #[test]
    fn test_fence_must_open_the_file() {
        let content = "intro\n---\ntitle: x\n---\n";
        let fm = extract(content).unwrap();
        assert!(fm.metadata.is_empty());
        assert_eq!(fm.body, content);
    }

    #[test]
    fn test_unterminated_block() {
        let err = extract("---\ntitle: Hi\n# Hello\n").unwrap_err();
        assert!(matches!(err, FrontMatterError::Unterminated));
    }

    #[test]
    fn test_malformed_yaml() {
        let err = extract("---\ntitle: [unclosed\n---\nbody").unwrap_err();
        assert!(matches!(err, FrontMatterError::Yaml(_)));
    }

    #[test]
    fn test_non_mapping_block() {
        let err = extract("---\n- a\n- b\n---\nbody").unwrap_err();
        assert!(matches!(err, FrontMatterError::NotMapping("a list")));
    }

    #[test]
    fn test_nested_values() {
        let fm = extract("---\nauthor:\n  name: Ann\n  links: [x]\n---\n").unwrap();
        assert_eq!(fm.metadata["author"]["name"], json!("Ann"));
        assert_eq!(fm.metadata["author"]["links"], json!(["x"]));
    }
}
