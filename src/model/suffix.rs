//! Suffix-frequency tag table
//!
//! Counts labels per token suffix and answers with the best label for the
//! longest matching suffix. Trained once before tuning; the unknown-word
//! tagger consumes its prediction as a feature.

use super::{write_artifact, ArtifactPaths, TrainableClassifier, UNSEEN_LABEL};
use crate::corpus::Example;
use crate::error::Result;
use crate::eval::Classify;
use crate::grid::ParameterSet;
use serde::Serialize;
use std::collections::HashMap;

/// Longest suffix tracked, in characters.
const MAX_SUFFIX: usize = 3;

#[derive(Debug, Clone)]
pub struct SuffixTable {
    paths: ArtifactPaths,
    counts: HashMap<String, HashMap<String, usize>>,
    best: HashMap<String, String>,
    default_label: Option<String>,
}

impl SuffixTable {
    pub fn new(paths: ArtifactPaths) -> Self {
        Self {
            paths,
            counts: HashMap::new(),
            best: HashMap::new(),
            default_label: None,
        }
    }
}

fn suffixes(token: &str) -> impl Iterator<Item = String> + '_ {
    let chars: Vec<char> = token.chars().collect();
    let max = MAX_SUFFIX.min(chars.len());
    (1..=max).map(move |n| chars[chars.len() - n..].iter().collect())
}

impl Classify for SuffixTable {
    fn classify(&self, example: &Example) -> String {
        // Longest matching suffix wins.
        let mut answer = None;
        for suffix in suffixes(&example.token) {
            if let Some(label) = self.best.get(&suffix) {
                answer = Some(label.clone());
            }
        }
        answer
            .or_else(|| self.default_label.clone())
            .unwrap_or_else(|| UNSEEN_LABEL.to_string())
    }
}

impl TrainableClassifier for SuffixTable {
    fn learn(&mut self, example: &Example) {
        for suffix in suffixes(&example.token) {
            *self
                .counts
                .entry(suffix)
                .or_default()
                .entry(example.label.clone())
                .or_insert(0) += 1;
        }
    }

    fn done_with_round(&mut self) {}

    fn done_learning(&mut self) {
        let mut overall: HashMap<&str, usize> = HashMap::new();
        for (suffix, labels) in &self.counts {
            let mut ranked: Vec<(&String, &usize)> = labels.iter().collect();
            ranked.sort_by(|a, b| b.1.cmp(a.1).then(a.0.cmp(b.0)));
            self.best.insert(suffix.clone(), ranked[0].0.clone());
            for (label, n) in labels {
                *overall.entry(label.as_str()).or_insert(0) += n;
            }
        }
        let mut ranked: Vec<(&str, usize)> = overall.into_iter().collect();
        ranked.sort_by(|a, b| b.1.cmp(&a.1).then(a.0.cmp(b.0)));
        self.default_label = ranked.first().map(|(label, _)| label.to_string());
    }

    fn save(&self) -> Result<()> {
        #[derive(Serialize)]
        struct ModelFile<'a> {
            default_label: &'a Option<String>,
            best: &'a HashMap<String, String>,
        }
        write_artifact(
            &self.paths.model,
            &ModelFile {
                default_label: &self.default_label,
                best: &self.best,
            },
        )?;
        let mut lexicon: Vec<&String> = self.best.keys().collect();
        lexicon.sort();
        write_artifact(&self.paths.lexicon, &lexicon)
    }

    fn forget(&mut self) {
        self.counts.clear();
        self.best.clear();
        self.default_label = None;
    }

    fn set_parameters(&mut self, _params: &ParameterSet) -> Result<()> {
        Ok(())
    }

    fn parameters(&self) -> Option<&ParameterSet> {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_longest_suffix_wins() {
        let mut table = SuffixTable::new(ArtifactPaths::new("s.model.json", "s.lex.json"));
        for (token, label) in [("walking", "VBG"), ("talking", "VBG"), ("king", "NN")] {
            table.learn(&Example::new(token, label));
        }
        table.done_learning();
        // "-ing" is seen three times; the 3-char suffix decides.
        assert_eq!(table.classify(&Example::new("jumping", "?")), "VBG");
    }

    #[test]
    fn test_unseen_suffix_falls_back() {
        let mut table = SuffixTable::new(ArtifactPaths::new("s.model.json", "s.lex.json"));
        table.learn(&Example::new("walked", "VBD"));
        table.done_learning();
        assert_eq!(table.classify(&Example::new("xyz", "?")), "VBD");
    }

    #[test]
    fn test_short_tokens_use_available_suffixes() {
        let mut table = SuffixTable::new(ArtifactPaths::new("s.model.json", "s.lex.json"));
        table.learn(&Example::new("a", "DT"));
        table.done_learning();
        assert_eq!(table.classify(&Example::new("a", "?")), "DT");
    }
}
