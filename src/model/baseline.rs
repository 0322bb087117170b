//! Most-frequent-tag baseline
//!
//! Counts (token, label) pairs and answers with the most frequent label for
//! each token. Trained once before tuning; the known-word tagger consumes its
//! prediction as a feature.

use super::{write_artifact, ArtifactPaths, TrainableClassifier, UNSEEN_LABEL};
use crate::corpus::Example;
use crate::error::Result;
use crate::eval::Classify;
use crate::grid::ParameterSet;
use serde::Serialize;
use std::collections::HashMap;

#[derive(Debug, Clone)]
pub struct BaselineModel {
    paths: ArtifactPaths,
    counts: HashMap<String, HashMap<String, usize>>,
    /// Finalized at `done_learning`: best label per token plus the overall
    /// most frequent label as fallback.
    best: HashMap<String, String>,
    default_label: Option<String>,
}

impl BaselineModel {
    pub fn new(paths: ArtifactPaths) -> Self {
        Self {
            paths,
            counts: HashMap::new(),
            best: HashMap::new(),
            default_label: None,
        }
    }

    /// Whether the token was observed during training. This is the
    /// known/unknown vocabulary boundary for the combined tagger.
    pub fn observed(&self, token: &str) -> bool {
        self.best.contains_key(token) || self.counts.contains_key(token)
    }
}

impl Classify for BaselineModel {
    fn classify(&self, example: &Example) -> String {
        if let Some(label) = self.best.get(&example.token) {
            return label.clone();
        }
        self.default_label
            .clone()
            .unwrap_or_else(|| UNSEEN_LABEL.to_string())
    }
}

impl TrainableClassifier for BaselineModel {
    fn learn(&mut self, example: &Example) {
        *self
            .counts
            .entry(example.token.clone())
            .or_default()
            .entry(example.label.clone())
            .or_insert(0) += 1;
    }

    fn done_with_round(&mut self) {}

    fn done_learning(&mut self) {
        let mut overall: HashMap<&str, usize> = HashMap::new();
        for (token, labels) in &self.counts {
            // Ties resolve to the lexicographically smallest label so the
            // finalized table is independent of hash iteration order.
            let mut ranked: Vec<(&String, &usize)> = labels.iter().collect();
            ranked.sort_by(|a, b| b.1.cmp(a.1).then(a.0.cmp(b.0)));
            self.best.insert(token.clone(), ranked[0].0.clone());
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
        // Un-parameterized; nothing to apply.
        Ok(())
    }

    fn parameters(&self) -> Option<&ParameterSet> {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn trained() -> BaselineModel {
        let mut model = BaselineModel::new(ArtifactPaths::new("b.model.json", "b.lex.json"));
        for (token, label) in [
            ("run", "VB"),
            ("run", "VB"),
            ("run", "NN"),
            ("dog", "NN"),
        ] {
            model.learn(&Example::new(token, label));
        }
        model.done_learning();
        model
    }

    #[test]
    fn test_most_frequent_label_wins() {
        let model = trained();
        assert_eq!(model.classify(&Example::new("run", "?")), "VB");
        assert_eq!(model.classify(&Example::new("dog", "?")), "NN");
    }

    #[test]
    fn test_unseen_token_falls_back_to_overall_majority() {
        let model = trained();
        assert_eq!(model.classify(&Example::new("cat", "?")), "NN");
        assert!(!model.observed("cat"));
        assert!(model.observed("dog"));
    }

    #[test]
    fn test_forget_clears_learned_state() {
        let mut model = trained();
        model.forget();
        assert_eq!(model.classify(&Example::new("run", "?")), UNSEEN_LABEL);
    }

    #[test]
    fn test_save_writes_both_artifacts() {
        let dir = tempfile::tempdir().unwrap();
        let paths = ArtifactPaths::new(
            dir.path().join("baseline.model.json"),
            dir.path().join("baseline.lex.json"),
        );
        let mut model = BaselineModel::new(paths.clone());
        model.learn(&Example::new("dog", "NN"));
        model.done_learning();
        model.save().unwrap();
        assert!(paths.model.exists());
        assert!(paths.lexicon.exists());
    }
}
