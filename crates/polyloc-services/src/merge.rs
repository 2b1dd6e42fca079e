//! Folding classified documents into one output tree per language.
//!
//! Both descents run on an explicit work stack instead of recursion, so
//! nesting depth in source files is bounded only by memory. Input trees are
//! only ever borrowed immutably, which makes the per-language walks over the
//! same document independent of each other.

use indexmap::IndexMap;
use polyloc_core::{
    Classification, KeyPath, NodeMap, SourceDocument, SupportedLanguages, TranslationNode,
};

/// One tree per supported language, owned by a single run.
#[derive(Debug, Clone, PartialEq)]
pub struct OutputTrees(IndexMap<String, NodeMap>);

impl OutputTrees {
    /// Empty tree for every language, in configured order.
    pub fn new(languages: &SupportedLanguages) -> Self {
        Self(
            languages
                .iter()
                .map(|lang| (lang.to_string(), NodeMap::new()))
                .collect(),
        )
    }

    pub fn get(&self, lang: &str) -> Option<&NodeMap> {
        self.0.get(lang)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &NodeMap)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v))
    }

    fn tree_mut(&mut self, lang: &str) -> &mut NodeMap {
        self.0.entry(lang.to_string()).or_default()
    }
}

/// A scalar met where a grouping node or translation leaf was expected.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Truncation {
    pub path: KeyPath,
    pub lang: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MergeOutcome {
    pub truncated: Vec<Truncation>,
    /// Top-level keys of a language-rooted document after the first one.
    pub ignored_keys: Vec<String>,
}

pub struct MergeEngine {
    languages: SupportedLanguages,
}

impl MergeEngine {
    pub fn new(languages: SupportedLanguages) -> Self {
        Self { languages }
    }

    pub fn languages(&self) -> &SupportedLanguages {
        &self.languages
    }

    /// Merge one classified document into `out`. Later calls win on
    /// colliding key paths.
    pub fn merge_document(&self, doc: &SourceDocument, out: &mut OutputTrees) -> MergeOutcome {
        let mut outcome = MergeOutcome::default();
        let Some(root) = doc.root.as_map() else {
            return outcome;
        };
        match &doc.classification {
            Classification::LanguageRooted(lang) => {
                match root.get(lang) {
                    Some(TranslationNode::Map(subtree)) => {
                        self.merge_language_rooted(subtree, out.tree_mut(lang));
                    }
                    _ => outcome.truncated.push(Truncation {
                        path: KeyPath::default().child(lang),
                        lang: lang.clone(),
                    }),
                }
                outcome.ignored_keys = root.keys().skip(1).cloned().collect();
            }
            Classification::MultiLingual => {
                for lang in self.languages.iter() {
                    let truncated = self.merge_multilingual(root, lang, out.tree_mut(lang));
                    outcome
                        .truncated
                        .extend(truncated.into_iter().map(|path| Truncation {
                            path,
                            lang: lang.to_string(),
                        }));
                }
            }
        }
        outcome
    }

    /// Deep-merge an already language-scoped subtree: maps merge key by key,
    /// scalars overwrite.
    pub fn merge_language_rooted(&self, subtree: &NodeMap, out: &mut NodeMap) {
        let mut stack: Vec<(&NodeMap, KeyPath)> = vec![(subtree, KeyPath::default())];
        while let Some((node, path)) = stack.pop() {
            let ctx = map_at(out, path.segments());
            let mut groups = Vec::new();
            for (key, child) in node {
                match child {
                    TranslationNode::Map(m) => {
                        ensure_map(ctx, key);
                        groups.push((m, path.child(key)));
                    }
                    TranslationNode::Scalar(_) => {
                        ctx.insert(key.clone(), child.clone());
                    }
                }
            }
            // reversed so siblings are descended in document order
            stack.extend(groups.into_iter().rev());
        }
    }

    /// Extract language `lang` from a multi-lingual tree into `out`.
    ///
    /// Grouping maps are only created in `out` when something below them
    /// carries `lang`, so a subtree written for other languages never
    /// displaces an existing value. Returns the key paths of scalars that
    /// ended a descent without a language key.
    pub fn merge_multilingual(&self, root: &NodeMap, lang: &str, out: &mut NodeMap) -> Vec<KeyPath> {
        let mut truncated = Vec::new();
        // (node, path, live): a frame is live when its subtree writes for `lang`
        let mut stack: Vec<(&NodeMap, KeyPath, bool)> = vec![(root, KeyPath::default(), true)];
        while let Some((node, path, live)) = stack.pop() {
            let mut ctx = if live {
                Some(map_at(out, path.segments()))
            } else {
                None
            };
            let mut groups = Vec::new();
            for (key, child) in node {
                match child {
                    TranslationNode::Map(m) => match m.get(lang) {
                        Some(value) => {
                            if let Some(ctx) = ctx.as_deref_mut() {
                                ctx.insert(key.clone(), value.clone());
                            }
                        }
                        None => {
                            let child_live = live && contributes(m, lang);
                            if child_live {
                                if let Some(ctx) = ctx.as_deref_mut() {
                                    ensure_map(ctx, key);
                                }
                            }
                            groups.push((m, path.child(key), child_live));
                        }
                    },
                    TranslationNode::Scalar(_) => truncated.push(path.child(key)),
                }
            }
            stack.extend(groups.into_iter().rev());
        }
        truncated
    }
}

/// Whether any map below `group` is a translation leaf for `lang`.
fn contributes(group: &NodeMap, lang: &str) -> bool {
    let mut stack = vec![group];
    while let Some(map) = stack.pop() {
        for child in map.values() {
            if let TranslationNode::Map(m) = child {
                if m.contains_key(lang) {
                    return true;
                }
                stack.push(m);
            }
        }
    }
    false
}

/// `map[key]` as a map, replacing a scalar already stored there.
fn ensure_map<'a>(map: &'a mut NodeMap, key: &str) -> &'a mut NodeMap {
    let slot = map
        .entry(key.to_string())
        .or_insert_with(|| TranslationNode::Map(NodeMap::new()));
    if !slot.is_map() {
        *slot = TranslationNode::Map(NodeMap::new());
    }
    match slot {
        TranslationNode::Map(m) => m,
        TranslationNode::Scalar(_) => unreachable!("slot was just replaced with a map"),
    }
}

fn map_at<'a>(mut map: &'a mut NodeMap, path: &[String]) -> &'a mut NodeMap {
    for key in path {
        map = ensure_map(map, key);
    }
    map
}

#[cfg(test)]
mod tests {
    use super::*;
    use polyloc_parsers_yaml::parse_document;
    use std::path::PathBuf;

    fn doc(text: &str) -> SourceDocument {
        let path = PathBuf::from("test.yml");
        let root = parse_document(&path, text).unwrap();
        let classification =
            crate::classify::classify(&root, &SupportedLanguages::default()).unwrap();
        SourceDocument {
            path,
            root,
            classification,
        }
    }

    fn engine() -> MergeEngine {
        MergeEngine::new(SupportedLanguages::default())
    }

    fn merged(texts: &[&str]) -> OutputTrees {
        let engine = engine();
        let mut out = OutputTrees::new(engine.languages());
        for t in texts {
            engine.merge_document(&doc(t), &mut out);
        }
        out
    }

    fn lookup<'a>(tree: &'a NodeMap, path: &str) -> Option<&'a TranslationNode> {
        let mut parts = path.split('.');
        let mut node = tree.get(parts.next()?)?;
        for p in parts {
            node = node.as_map()?.get(p)?;
        }
        Some(node)
    }

    #[test]
    fn splits_multilingual_leaves_per_language() {
        let out = merged(&["title:\n  en: Profile\n  ja: プロフィール\n"]);
        let en = out.get("en").unwrap();
        let ja = out.get("ja").unwrap();
        assert_eq!(lookup(en, "title").and_then(|n| n.as_str()), Some("Profile"));
        assert_eq!(lookup(ja, "title").and_then(|n| n.as_str()), Some("プロフィール"));
    }

    #[test]
    fn language_rooted_matches_multilingual() {
        let rooted = merged(&["en:\n  greeting: Hi\n"]);
        let multi = merged(&["greeting:\n  en: Hi\n"]);
        assert_eq!(rooted.get("en"), multi.get("en"));
    }

    #[test]
    fn nested_round_trip_equivalence() {
        let rooted = merged(&["ja:\n  users:\n    form:\n      name: 名前\n"]);
        let multi = merged(&["users:\n  form:\n    name:\n      ja: 名前\n"]);
        assert_eq!(rooted.get("ja"), multi.get("ja"));
    }

    #[test]
    fn preserves_key_order() {
        let out = merged(&["c:\n  en: C\na:\n  en: A\nb:\n  en: B\n"]);
        let keys: Vec<_> = out.get("en").unwrap().keys().cloned().collect();
        assert_eq!(keys, vec!["c", "a", "b"]);
    }

    #[test]
    fn nested_order_is_document_order() {
        let out = merged(&["g:\n  z:\n    en: Z\n  y:\n    inner:\n      en: I\n  x:\n    en: X\n"]);
        let g = lookup(out.get("en").unwrap(), "g").unwrap().as_map().unwrap();
        let keys: Vec<_> = g.keys().cloned().collect();
        assert_eq!(keys, vec!["z", "y", "x"]);
    }

    #[test]
    fn later_document_wins_on_collision() {
        let out = merged(&[
            "common:\n  label:\n    en: First\n",
            "en:\n  common:\n    label: Second\n",
        ]);
        assert_eq!(
            lookup(out.get("en").unwrap(), "common.label").and_then(|n| n.as_str()),
            Some("Second")
        );

        let out = merged(&[
            "en:\n  common:\n    label: Second\n",
            "common:\n  label:\n    en: First\n",
        ]);
        assert_eq!(
            lookup(out.get("en").unwrap(), "common.label").and_then(|n| n.as_str()),
            Some("First")
        );
    }

    #[test]
    fn disjoint_documents_merge_into_shared_groups() {
        let out = merged(&[
            "common:\n  save:\n    en: Save\n",
            "common:\n  cancel:\n    en: Cancel\n",
        ]);
        let common = lookup(out.get("en").unwrap(), "common").unwrap().as_map().unwrap();
        let keys: Vec<_> = common.keys().cloned().collect();
        assert_eq!(keys, vec!["save", "cancel"]);
    }

    #[test]
    fn leaf_value_may_be_a_map() {
        let out = merged(&["items:\n  en:\n    one: 1 item\n    other: \"%{count} items\"\n"]);
        let items = lookup(out.get("en").unwrap(), "items").unwrap().as_map().unwrap();
        assert_eq!(items.get("other").and_then(|n| n.as_str()), Some("%{count} items"));
    }

    #[test]
    fn scalar_without_language_is_reported_not_merged() {
        let engine = engine();
        let mut out = OutputTrees::new(engine.languages());
        let outcome = engine.merge_document(&doc("loose: value\ngroup:\n  en: G\n"), &mut out);
        assert!(out.get("en").unwrap().get("loose").is_none());
        let paths: Vec<_> = outcome
            .truncated
            .iter()
            .map(|t| (t.path.to_string(), t.lang.as_str()))
            .collect();
        assert_eq!(
            paths,
            vec![
                ("loose".to_string(), "en"),
                ("loose".to_string(), "ja"),
                ("group.en".to_string(), "ja"),
            ]
        );
    }

    #[test]
    fn grouping_replaces_earlier_scalar() {
        let out = merged(&["en:\n  title: Plain\n", "title:\n  sub:\n    en: Nested\n"]);
        assert_eq!(
            lookup(out.get("en").unwrap(), "title.sub").and_then(|n| n.as_str()),
            Some("Nested")
        );
    }

    #[test]
    fn other_language_document_keeps_earlier_translation() {
        let out = merged(&["title:\n  en: Profile\n", "title:\n  ja: プロフィール\n"]);
        assert_eq!(
            lookup(out.get("en").unwrap(), "title").and_then(|n| n.as_str()),
            Some("Profile")
        );
        assert_eq!(
            lookup(out.get("ja").unwrap(), "title").and_then(|n| n.as_str()),
            Some("プロフィール")
        );
    }

    #[test]
    fn grouping_without_the_language_creates_nothing() {
        let out = merged(&[
            "common:\n  save:\n    en: Save\n",
            "items:\n  en:\n    one: 1 item\n",
        ]);
        let ja = out.get("ja").unwrap();
        assert!(ja.is_empty(), "unexpected ja entries: {ja:?}");
        let keys: Vec<_> = out.get("en").unwrap().keys().cloned().collect();
        assert_eq!(keys, vec!["common", "items"]);
    }

    #[test]
    fn scalar_survives_grouping_with_only_other_languages() {
        let out = merged(&["en:\n  menu: Menu\n", "menu:\n  file:\n    ja: ファイル\n"]);
        assert_eq!(
            lookup(out.get("en").unwrap(), "menu").and_then(|n| n.as_str()),
            Some("Menu")
        );
        assert_eq!(
            lookup(out.get("ja").unwrap(), "menu.file").and_then(|n| n.as_str()),
            Some("ファイル")
        );
    }

    #[test]
    fn language_rooted_reports_extra_top_level_keys() {
        let engine = engine();
        let mut out = OutputTrees::new(engine.languages());
        let outcome = engine.merge_document(&doc("en:\n  a: A\nja:\n  a: エー\n"), &mut out);
        assert_eq!(outcome.ignored_keys, vec!["ja"]);
        assert!(out.get("ja").unwrap().is_empty());
    }

    #[test]
    fn input_is_untouched_by_repeated_walks() {
        let d = doc("title:\n  en: Profile\n  ja: プロフィール\n");
        let before = d.root.clone();
        let engine = engine();
        let mut out = OutputTrees::new(engine.languages());
        engine.merge_document(&d, &mut out);
        engine.merge_document(&d, &mut out);
        assert_eq!(d.root, before);
    }

    #[test]
    fn handles_deep_nesting() {
        let depth = 2_000;
        let mut node = TranslationNode::Map({
            let mut m = NodeMap::new();
            m.insert("en".into(), TranslationNode::string("deep"));
            m
        });
        for i in 0..depth {
            let mut m = NodeMap::new();
            m.insert(format!("k{i}"), node);
            node = TranslationNode::Map(m);
        }
        let root = node.as_map().unwrap();
        let mut out = NodeMap::new();
        let truncated = engine().merge_multilingual(root, "en", &mut out);
        assert!(truncated.is_empty());
        assert_eq!(out.len(), 1);
    }
}
