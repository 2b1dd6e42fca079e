//! Reading and writing of hierarchical YAML translation documents.
//!
//! Parsing keeps mapping key order exactly as written; rendering emits block
//! style only, without line wrapping or a leading `---` marker.

use polyloc_core::{Error, NodeMap, Result, TranslationNode};
use regex::Regex;
use serde_yaml::{Mapping, Value};
use std::path::Path;
use std::sync::OnceLock;

/// Read `path` and parse it into a node tree.
pub fn parse_file(path: &Path) -> Result<TranslationNode> {
    let text = std::fs::read_to_string(path).map_err(|e| Error::io(path, e))?;
    parse_document(path, &text)
}

/// Parse one document's text. `path` is only used for error reporting.
pub fn parse_document(path: &Path, text: &str) -> Result<TranslationNode> {
    if is_blank_document(text) {
        return Ok(TranslationNode::Scalar(Value::Null));
    }
    let to_parse_error = |e: serde_yaml::Error| {
        let message = e.to_string();
        let line = e
            .location()
            .map(|loc| loc.line())
            .or_else(|| line_from_message(&message));
        Error::Parse {
            path: path.to_path_buf(),
            line,
            message,
        }
    };
    let mut value: Value = serde_yaml::from_str(text).map_err(to_parse_error)?;
    // resolve `<<: *anchor` merge keys
    value.apply_merge().map_err(to_parse_error)?;
    Ok(from_value(value, path))
}

/// Only whitespace and comments: nothing for the YAML parser to produce.
fn is_blank_document(text: &str) -> bool {
    text.lines().all(|l| {
        let t = l.trim();
        t.is_empty() || t.starts_with('#')
    })
}

/// Best-effort `line N` extraction from a parser diagnostic.
pub fn line_from_message(message: &str) -> Option<usize> {
    static LINE_RE: OnceLock<Regex> = OnceLock::new();
    let re = LINE_RE.get_or_init(|| Regex::new(r"\bline (\d+)").unwrap());
    re.captures(message)
        .and_then(|c| c.get(1))
        .and_then(|m| m.as_str().parse().ok())
}

fn from_value(value: Value, path: &Path) -> TranslationNode {
    match value {
        Value::Mapping(mapping) => {
            let mut map = NodeMap::with_capacity(mapping.len());
            for (k, v) in mapping {
                match key_to_string(&k) {
                    Some(key) => {
                        map.insert(key, from_value(v, path));
                    }
                    None => {
                        tracing::warn!(
                            event = "complex_key_skipped",
                            path = %path.display(),
                            "mapping key is not a scalar, entry skipped"
                        );
                    }
                }
            }
            TranslationNode::Map(map)
        }
        other => TranslationNode::Scalar(other),
    }
}

fn key_to_string(key: &Value) -> Option<String> {
    match key {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Null => Some("null".to_string()),
        Value::Tagged(t) => key_to_string(&t.value),
        Value::Sequence(_) | Value::Mapping(_) => None,
    }
}

fn to_value(node: &TranslationNode) -> Value {
    match node {
        TranslationNode::Scalar(v) => v.clone(),
        TranslationNode::Map(map) => Value::Mapping(map_to_mapping(map)),
    }
}

fn map_to_mapping(map: &NodeMap) -> Mapping {
    let mut out = Mapping::with_capacity(map.len());
    for (k, v) in map {
        out.insert(Value::String(k.clone()), to_value(v));
    }
    out
}

/// Serialize `tree` wrapped under a single top-level `lang` key.
pub fn render_language_document(lang: &str, tree: &NodeMap) -> Result<String> {
    let mut top = Mapping::with_capacity(1);
    top.insert(
        Value::String(lang.to_string()),
        Value::Mapping(map_to_mapping(tree)),
    );
    let text = serde_yaml::to_string(&Value::Mapping(top))?;
    let text = text.strip_prefix("---\n").unwrap_or(&text);
    Ok(quote_yaml11_booleans(text))
}

/// Plain words that YAML 1.1 readers load as booleans.
const YAML11_BOOL_WORDS: &str = "y|Y|yes|Yes|YES|n|N|no|No|NO|on|On|ON|off|Off|OFF";

/// Single-quote plain keys and values that YAML 1.1 would read as booleans.
/// The serializer follows YAML 1.2, where `yes` or `no` are plain strings.
/// Lines inside literal and folded block scalars are left alone.
fn quote_yaml11_booleans(text: &str) -> String {
    static KEY_RE: OnceLock<Regex> = OnceLock::new();
    static VALUE_RE: OnceLock<Regex> = OnceLock::new();
    static BLOCK_RE: OnceLock<Regex> = OnceLock::new();
    let key_re = KEY_RE.get_or_init(|| {
        Regex::new(&format!(r"^(\s*(?:- )*)({YAML11_BOOL_WORDS}):( .*)?$")).unwrap()
    });
    let value_re = VALUE_RE.get_or_init(|| {
        Regex::new(&format!(r"^(\s*(?:- )+|.*?: )({YAML11_BOOL_WORDS})$")).unwrap()
    });
    let block_re =
        BLOCK_RE.get_or_init(|| Regex::new(r"(?:^\s*(?:- )+|: )[|>][0-9]*[+-]?$").unwrap());

    let mut out = String::with_capacity(text.len());
    let mut block_parent: Option<usize> = None;
    for line in text.lines() {
        let indent = line.len() - line.trim_start_matches(' ').len();
        if let Some(parent) = block_parent {
            if line.trim().is_empty() || indent > parent {
                out.push_str(line);
                out.push('\n');
                continue;
            }
            block_parent = None;
        }
        let line = key_re.replace(line, "${1}'${2}':${3}");
        let line = value_re.replace(&line, "${1}'${2}'");
        if block_re.is_match(&line) {
            block_parent = Some(indent);
        }
        out.push_str(&line);
        out.push('\n');
    }
    out
}
