use crate::merge::OutputTrees;
use crate::{Error, Result};
use polyloc_core::{NodeMap, WriteFailure};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

/// A successfully written language file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Emitted {
    pub lang: String,
    pub path: PathBuf,
    pub bytes: usize,
}

/// `<root>/<lang>.<ext>`
pub fn output_path(root: &Path, lang: &str, extension: &str) -> PathBuf {
    root.join(format!("{lang}.{extension}"))
}

/// Replace `path` with `contents` through a temporary file in the same
/// directory, so readers never observe a half-written file.
pub fn write_atomic(path: &Path, contents: &str) -> Result<()> {
    let dir = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    fs::create_dir_all(dir).map_err(|e| Error::io(dir, e))?;
    let mut tmp = tempfile::NamedTempFile::new_in(dir).map_err(|e| Error::io(dir, e))?;
    tmp.write_all(contents.as_bytes())
        .and_then(|_| tmp.flush())
        .map_err(|e| Error::io(tmp.path(), e))?;
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        fs::set_permissions(tmp.path(), fs::Permissions::from_mode(0o644))
            .map_err(|e| Error::io(tmp.path(), e))?;
    }
    tmp.persist(path).map_err(|e| Error::io(path, e.error))?;
    Ok(())
}

fn emit_one(root: &Path, extension: &str, lang: &str, tree: &NodeMap) -> Result<Emitted> {
    let text = polyloc_parsers_yaml::render_language_document(lang, tree)?;
    let path = output_path(root, lang, extension);
    write_atomic(&path, &text)?;
    Ok(Emitted {
        lang: lang.to_string(),
        path,
        bytes: text.len(),
    })
}

/// Write every language file. Each write stands alone: a failure is
/// recorded and the remaining languages are still written.
pub fn emit_all(
    root: &Path,
    extension: &str,
    trees: &OutputTrees,
) -> (Vec<Emitted>, Vec<WriteFailure>) {
    let mut written = Vec::new();
    let mut failures = Vec::new();
    for (lang, tree) in trees.iter() {
        match emit_one(root, extension, lang, tree) {
            Ok(e) => {
                tracing::debug!(event = "emitted", lang = lang, path = %e.path.display(), bytes = e.bytes);
                written.push(e);
            }
            Err(err) => {
                let path = output_path(root, lang, extension);
                tracing::error!(event = "emit_failed", lang = lang, path = %path.display(), error = %err);
                failures.push(WriteFailure {
                    lang: lang.to_string(),
                    path,
                    error: err.to_string(),
                });
            }
        }
    }
    (written, failures)
}
