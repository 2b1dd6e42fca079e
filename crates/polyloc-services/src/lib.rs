//! Orchestration layer: walk a source tree, fold every document into one
//! tree per language and write the per-language files.
//! Exposes stable entry points for the CLI and for host applications.

pub mod classify;
pub mod diagnostics;
pub mod emit;
pub mod merge;
pub mod walk;

use indexmap::IndexMap;
use polyloc_config::Settings;
use polyloc_core::{KeyPath, SourceDocument, SupportedLanguages};
use std::fmt;
use std::path::{Path, PathBuf};

pub use emit::Emitted;
pub use merge::{MergeEngine, OutputTrees, Truncation};
pub use polyloc_core::{Error, Result};

/// Run phases, logged at debug level as the run advances.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Idle,
    Walking,
    ParsingMerging,
    Aborted,
    Emitting,
    Done,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Phase::Idle => "idle",
            Phase::Walking => "walking",
            Phase::ParsingMerging => "parsing-merging",
            Phase::Aborted => "aborted",
            Phase::Emitting => "emitting",
            Phase::Done => "done",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedDocument {
    pub path: PathBuf,
    pub reason: String,
}

/// What a completed run did.
#[derive(Debug, Clone, Default)]
pub struct RunReport {
    pub discovered: usize,
    pub merged: usize,
    pub skipped: Vec<SkippedDocument>,
    /// Per document, key paths whose descent ended at a scalar, with the
    /// languages affected.
    pub truncated: Vec<(PathBuf, KeyPath, Vec<String>)>,
    pub written: Vec<Emitted>,
    pub filter: Option<String>,
}

pub struct Generator {
    root: PathBuf,
    extension: String,
    engine: MergeEngine,
}

impl Generator {
    pub fn new(settings: &Settings) -> Result<Self> {
        let languages = SupportedLanguages::new(settings.languages.iter().cloned())?;
        Ok(Self {
            root: settings.root.clone(),
            extension: settings.extension.clone(),
            engine: MergeEngine::new(languages),
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn languages(&self) -> &SupportedLanguages {
        self.engine.languages()
    }

    /// Walk, parse and merge without writing anything. Any parse error
    /// aborts before a single tree is returned.
    pub fn build(&self, filter: Option<&str>) -> Result<(OutputTrees, RunReport)> {
        let mut report = RunReport {
            filter: filter.map(str::to_string),
            ..RunReport::default()
        };

        enter(Phase::Walking);
        let re = filter.map(walk::compile_filter).transpose()?;
        self.check_root()?;
        let sources =
            walk::collect_sources(&self.root, &self.extension, self.languages(), re.as_ref());
        report.discovered = sources.len();
        tracing::debug!(event = "sources_collected", root = %self.root.display(), count = sources.len());

        enter(Phase::ParsingMerging);
        let mut trees = OutputTrees::new(self.languages());
        for path in sources {
            let root = match polyloc_parsers_yaml::parse_file(&path) {
                Ok(root) => root,
                Err(e) => {
                    tracing::debug!(event = "parse_failed", path = %path.display(), error = %e);
                    enter(Phase::Aborted);
                    return Err(e);
                }
            };
            let Some(classification) = classify::classify(&root, self.languages()) else {
                tracing::warn!(event = "document_skipped", path = %path.display(), "document root is not a mapping");
                report.skipped.push(SkippedDocument {
                    path,
                    reason: "document root is not a mapping".into(),
                });
                continue;
            };
            tracing::debug!(event = "merging", path = %path.display(), classification = ?classification);
            let doc = SourceDocument {
                path,
                root,
                classification,
            };
            let outcome = self.engine.merge_document(&doc, &mut trees);
            if !outcome.ignored_keys.is_empty() {
                tracing::warn!(
                    event = "top_level_keys_ignored",
                    path = %doc.path.display(),
                    keys = ?outcome.ignored_keys,
                    "language-rooted document has more than one top-level key"
                );
            }
            let mut by_path: IndexMap<KeyPath, Vec<String>> = IndexMap::new();
            for t in outcome.truncated {
                by_path.entry(t.path).or_default().push(t.lang);
            }
            for (key_path, langs) in by_path {
                tracing::warn!(
                    event = "scalar_ignored",
                    path = %doc.path.display(),
                    key = %key_path,
                    languages = ?langs,
                    "scalar without a language key, subtree ignored"
                );
                report.truncated.push((doc.path.clone(), key_path, langs));
            }
            report.merged += 1;
        }
        Ok((trees, report))
    }

    /// The source root must already be a directory; a run never creates it.
    fn check_root(&self) -> Result<()> {
        match std::fs::metadata(&self.root) {
            Ok(meta) if meta.is_dir() => Ok(()),
            Ok(_) => Err(Error::Config(format!(
                "source root {} is not a directory",
                self.root.display()
            ))),
            Err(e) => Err(Error::Config(format!(
                "source root {} is not a readable directory: {e}",
                self.root.display()
            ))),
        }
    }

    /// Full run: build every tree, then rewrite every language file.
    pub fn run(&self, filter: Option<&str>) -> Result<RunReport> {
        enter(Phase::Idle);
        let (trees, mut report) = self.build(filter)?;

        if let Some(pattern) = filter {
            tracing::warn!(
                event = "filtered_run",
                filter = pattern,
                "output files are regenerated only from documents matching the filter; \
                 translations from other documents are dropped until the next full run"
            );
        }

        enter(Phase::Emitting);
        let (written, failures) = emit::emit_all(&self.root, &self.extension, &trees);
        report.written = written;
        if !failures.is_empty() {
            return Err(Error::Write { failures });
        }
        enter(Phase::Done);
        tracing::info!(
            event = "run_done",
            discovered = report.discovered,
            merged = report.merged,
            skipped = report.skipped.len(),
            written = report.written.len()
        );
        Ok(report)
    }
}

fn enter(phase: Phase) {
    tracing::debug!(event = "phase", phase = %phase);
}

/// Argument-free entry point for host applications: load `polyloc.toml`
/// and regenerate every language file. Safe to call repeatedly.
pub fn generate() -> Result<RunReport> {
    let settings = polyloc_config::load_config()
        .map_err(|e| Error::Config(e.to_string()))?
        .resolve();
    Generator::new(&settings)?.run(None)
}

/// Like [`generate`], but prints the diagnostic and exits the process with
/// status 1 on failure.
pub fn generate_or_abort() -> RunReport {
    match generate() {
        Ok(report) => report,
        Err(e) => {
            diagnostics::report(&e);
            std::process::exit(1);
        }
    }
}
