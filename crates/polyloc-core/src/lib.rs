use std::fmt;
use std::path::PathBuf;

use indexmap::IndexMap;
use thiserror::Error;

/// Workspace-wide result alias.
pub type Result<T> = std::result::Result<T, Error>;

/// Ordered mapping used for every grouping level. Insertion order is the
/// order keys were first seen and is kept through to the emitted files.
pub type NodeMap = IndexMap<String, TranslationNode>;

/// One node of a parsed source document or of an output tree.
#[derive(Debug, Clone, PartialEq)]
pub enum TranslationNode {
    /// Any non-mapping value: strings, numbers, booleans, null, sequences.
    Scalar(serde_yaml::Value),
    Map(NodeMap),
}

impl TranslationNode {
    pub fn string(s: impl Into<String>) -> Self {
        TranslationNode::Scalar(serde_yaml::Value::String(s.into()))
    }

    pub fn is_map(&self) -> bool {
        matches!(self, TranslationNode::Map(_))
    }

    pub fn as_map(&self) -> Option<&NodeMap> {
        match self {
            TranslationNode::Map(m) => Some(m),
            TranslationNode::Scalar(_) => None,
        }
    }

    /// Borrow the scalar as text when it is a plain string.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            TranslationNode::Scalar(v) => v.as_str(),
            TranslationNode::Map(_) => None,
        }
    }
}

/// Configured, ordered set of language codes. Passed to the engine at
/// construction; there is no global list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SupportedLanguages(Vec<String>);

impl SupportedLanguages {
    pub fn new<I, S>(codes: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut out: Vec<String> = Vec::new();
        for code in codes {
            let code = code.into().trim().to_string();
            if code.is_empty() {
                return Err(Error::Config("language code must not be blank".into()));
            }
            if !out.contains(&code) {
                out.push(code);
            }
        }
        if out.is_empty() {
            return Err(Error::Config("at least one language is required".into()));
        }
        Ok(Self(out))
    }

    pub fn contains(&self, code: &str) -> bool {
        self.0.iter().any(|c| c == code)
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl Default for SupportedLanguages {
    fn default() -> Self {
        Self(vec!["en".to_string(), "ja".to_string()])
    }
}

/// How a parsed document contributes to the output trees.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Classification {
    /// First top-level key is a supported language; the subtree under it is
    /// merged into that language only.
    LanguageRooted(String),
    /// Language codes appear as keys at leaf groupings anywhere in the tree.
    MultiLingual,
}

/// A discovered file after parsing and classification. Lives only until it
/// has been merged.
#[derive(Debug, Clone)]
pub struct SourceDocument {
    pub path: PathBuf,
    pub root: TranslationNode,
    pub classification: Classification,
}

/// Dotted key path inside a tree, used in warnings and reports.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct KeyPath(pub Vec<String>);

impl KeyPath {
    pub fn child(&self, key: &str) -> KeyPath {
        let mut v = self.0.clone();
        v.push(key.to_string());
        KeyPath(v)
    }

    pub fn segments(&self) -> &[String] {
        &self.0
    }
}

impl fmt::Display for KeyPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0.join("."))
    }
}

/// A single failed output write.
#[derive(Debug)]
pub struct WriteFailure {
    pub lang: String,
    pub path: PathBuf,
    pub error: String,
}

#[derive(Debug, Error)]
pub enum Error {
    /// Malformed source document. Fatal for the whole run.
    #[error("failed to parse {}{}: {message}", .path.display(), .line.map(|l| format!(" (line {l})")).unwrap_or_default())]
    Parse {
        path: PathBuf,
        line: Option<usize>,
        message: String,
    },
    #[error("{}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to render output: {0}")]
    Render(#[from] serde_yaml::Error),
    #[error("{} output file(s) could not be written", .failures.len())]
    Write { failures: Vec<WriteFailure> },
    #[error("invalid filter pattern `{pattern}`: {message}")]
    Filter { pattern: String, message: String },
    #[error("configuration: {0}")]
    Config(String),
}

impl Error {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Error::Io {
            path: path.into(),
            source,
        }
    }

    pub fn is_parse(&self) -> bool {
        matches!(self, Error::Parse { .. })
    }
}
