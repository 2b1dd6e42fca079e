use crate::{Error, Result};
use polyloc_core::SupportedLanguages;
use regex::Regex;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Compile a user-supplied path filter.
pub fn compile_filter(pattern: &str) -> Result<Regex> {
    Regex::new(pattern).map_err(|e| Error::Filter {
        pattern: pattern.to_string(),
        message: e.to_string(),
    })
}

/// `<lang>.<ext>` for every configured language: the generated output names.
fn is_output_name(name: &str, extension: &str, languages: &SupportedLanguages) -> bool {
    languages.iter().any(|lang| {
        name.strip_prefix(lang)
            .and_then(|rest| rest.strip_prefix('.'))
            .is_some_and(|ext| ext.eq_ignore_ascii_case(extension))
    })
}

fn has_extension(path: &Path, extension: &str) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case(extension))
}

/// Enumerate source documents under `root`.
///
/// Entries are visited sorted by file name within each directory, so the
/// merge order (and with it last-write-wins) is stable between runs.
pub fn collect_sources(
    root: &Path,
    extension: &str,
    languages: &SupportedLanguages,
    filter: Option<&Regex>,
) -> Vec<PathBuf> {
    let mut out = Vec::new();
    for entry in WalkDir::new(root).sort_by_file_name() {
        let entry = match entry {
            Ok(e) => e,
            Err(e) => {
                tracing::warn!(event = "walk_entry_skipped", error = %e);
                continue;
            }
        };
        if !entry.file_type().is_file() || !has_extension(entry.path(), extension) {
            continue;
        }
        let name = entry.file_name().to_string_lossy();
        if is_output_name(&name, extension, languages) {
            continue;
        }
        if let Some(re) = filter {
            let normalized = entry.path().to_string_lossy().replace('\\', "/");
            if !re.is_match(&normalized) {
                tracing::debug!(event = "filtered_out", path = %entry.path().display());
                continue;
            }
        }
        out.push(entry.into_path());
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    fn touch(root: &Path, rel: &str) {
        let p = root.join(rel);
        fs::create_dir_all(p.parent().unwrap()).unwrap();
        fs::write(p, "k: v\n").unwrap();
    }

    fn rel_names(root: &Path, paths: &[PathBuf]) -> Vec<String> {
        paths
            .iter()
            .map(|p| {
                p.strip_prefix(root)
                    .unwrap()
                    .to_string_lossy()
                    .replace('\\', "/")
            })
            .collect()
    }

    #[test]
    fn collects_nested_sources_and_skips_outputs() {
        let dir = tempdir().unwrap();
        let root = dir.path();
        touch(root, "en.yml");
        touch(root, "ja.yml");
        touch(root, "profile.yml");
        touch(root, "admin/users.yml");
        touch(root, "admin/en.yml");
        touch(root, "admin/notes.txt");
        touch(root, "fr.yml");

        let found = collect_sources(root, "yml", &SupportedLanguages::default(), None);
        assert_eq!(
            rel_names(root, &found),
            vec!["admin/users.yml", "fr.yml", "profile.yml"]
        );
    }

    #[test]
    fn filter_keeps_only_matching_paths() {
        let dir = tempdir().unwrap();
        let root = dir.path();
        touch(root, "profile.yml");
        touch(root, "admin/users.yml");
        touch(root, "admin/roles.yml");

        let re = compile_filter("admin/").unwrap();
        let found = collect_sources(root, "yml", &SupportedLanguages::default(), Some(&re));
        assert_eq!(
            rel_names(root, &found),
            vec!["admin/roles.yml", "admin/users.yml"]
        );
    }

    #[test]
    fn extension_match_is_case_insensitive() {
        let dir = tempdir().unwrap();
        touch(dir.path(), "upper.YML");
        touch(dir.path(), "other.yaml");
        let found = collect_sources(dir.path(), "yml", &SupportedLanguages::default(), None);
        assert_eq!(rel_names(dir.path(), &found), vec!["upper.YML"]);
    }

    #[test]
    fn invalid_filter_is_rejected() {
        let err = compile_filter("admin/(").unwrap_err();
        assert!(matches!(err, Error::Filter { .. }));
    }
}
