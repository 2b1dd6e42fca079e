use polyloc_core::{Classification, SupportedLanguages, TranslationNode};

/// Decide how a document contributes to the output trees.
///
/// Returns `None` when the root is not a map; such documents are skipped.
/// A map whose first key is a supported language code is language-rooted,
/// anything else is multi-lingual.
pub fn classify(root: &TranslationNode, languages: &SupportedLanguages) -> Option<Classification> {
    let map = root.as_map()?;
    match map.keys().next() {
        Some(first) if languages.contains(first) => {
            Some(Classification::LanguageRooted(first.clone()))
        }
        _ => Some(Classification::MultiLingual),
    }
}
