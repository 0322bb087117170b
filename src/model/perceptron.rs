//! Sparse averaged perceptron tagger
//!
//! Multiclass perceptron over sparse string features with margin-driven
//! updates and lazily-maintained weight averages. Two variants share the
//! implementation: the known-word tagger adds the token form as a feature and
//! consumes the baseline model's guess; the unknown-word tagger relies on
//! affix/shape features and the suffix table's guess.
//!
//! Hyperparameters: `thickness` (required score margin between the gold
//! label and its best rival) and `learningRate` (update step).

use super::{write_artifact, ArtifactPaths, TrainableClassifier};
use crate::corpus::Example;
use crate::error::Result;
use crate::eval::Classify;
use crate::grid::ParameterSet;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;

const DEFAULT_LEARNING_RATE: f64 = 0.1;
const DEFAULT_THICKNESS: f64 = 1.0;

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
struct WeightEntry {
    value: f64,
    /// Running sum of `value` over update steps, caught up lazily: the value
    /// held since `stamp` has not been folded in yet.
    total: f64,
    stamp: usize,
}

impl WeightEntry {
    fn averaged(&self, step: usize) -> f64 {
        self.total + self.value * (step - self.stamp) as f64
    }
}

pub struct PerceptronTagger {
    paths: ArtifactPaths,
    aux: Arc<dyn Classify>,
    /// Known-word variant keys on the token form; the unknown-word variant
    /// must generalize past it.
    lexicalized: bool,
    learning_rate: f64,
    thickness: f64,
    params: Option<ParameterSet>,
    weights: HashMap<String, HashMap<String, WeightEntry>>,
    labels: BTreeSet<String>,
    step: usize,
    finalized: bool,
}

impl PerceptronTagger {
    /// Tagger for vocabulary seen during training.
    pub fn known(paths: ArtifactPaths, aux: Arc<dyn Classify>) -> Self {
        Self::with_variant(paths, aux, true)
    }

    /// Tagger for unseen vocabulary.
    pub fn unknown(paths: ArtifactPaths, aux: Arc<dyn Classify>) -> Self {
        Self::with_variant(paths, aux, false)
    }

    fn with_variant(paths: ArtifactPaths, aux: Arc<dyn Classify>, lexicalized: bool) -> Self {
        Self {
            paths,
            aux,
            lexicalized,
            learning_rate: DEFAULT_LEARNING_RATE,
            thickness: DEFAULT_THICKNESS,
            params: None,
            weights: HashMap::new(),
            labels: BTreeSet::new(),
            step: 0,
            finalized: false,
        }
    }

    fn features(&self, example: &Example) -> Vec<String> {
        let token = &example.token;
        let mut feats = Vec::with_capacity(8);
        if self.lexicalized {
            feats.push(format!("form={}", token.to_lowercase()));
        }
        let chars: Vec<char> = token.chars().collect();
        for n in 1..=chars.len().min(3) {
            let suffix: String = chars[chars.len() - n..].iter().collect();
            feats.push(format!("suf{n}={suffix}"));
        }
        if let Some(&first) = chars.first() {
            feats.push(format!("pre1={first}"));
            if first.is_uppercase() {
                feats.push("cap".to_string());
            }
        }
        if chars.iter().any(|c| c.is_ascii_digit()) {
            feats.push("num".to_string());
        }
        if chars.contains(&'-') {
            feats.push("hyp".to_string());
        }
        feats.push(format!("aux={}", self.aux.classify(example)));
        feats
    }

    fn score(&self, feats: &[String], label: &str) -> f64 {
        feats
            .iter()
            .filter_map(|f| self.weights.get(f).and_then(|m| m.get(label)))
            .map(|e| {
                if self.finalized {
                    e.value
                } else {
                    e.averaged(self.step)
                }
            })
            .sum()
    }

    /// Highest-scoring label among `labels`, ties broken by label order.
    fn argmax<'a>(&self, feats: &[String], labels: impl Iterator<Item = &'a String>) -> Option<(String, f64)> {
        let mut best: Option<(String, f64)> = None;
        for label in labels {
            let s = self.score(feats, label);
            match &best {
                Some((_, top)) if s <= *top => {}
                _ => best = Some((label.clone(), s)),
            }
        }
        best
    }

    fn bump(&mut self, feature: &str, label: &str, delta: f64) {
        let entry = self
            .weights
            .entry(feature.to_string())
            .or_default()
            .entry(label.to_string())
            .or_default();
        entry.total += entry.value * (self.step - entry.stamp) as f64;
        entry.stamp = self.step;
        entry.value += delta;
    }
}

impl Classify for PerceptronTagger {
    fn classify(&self, example: &Example) -> String {
        let feats = self.features(example);
        match self.argmax(&feats, self.labels.iter()) {
            Some((label, _)) => label,
            // Nothing learned yet; the auxiliary model's guess stands.
            None => self.aux.classify(example),
        }
    }
}

impl TrainableClassifier for PerceptronTagger {
    fn learn(&mut self, example: &Example) {
        let gold = example.label.clone();
        self.labels.insert(gold.clone());
        let feats = self.features(example);
        self.step += 1;

        let gold_score = self.score(&feats, &gold);
        let rival = {
            let candidates = self.labels.iter().filter(|l| **l != gold);
            self.argmax(&feats, candidates)
        };
        if let Some((rival_label, rival_score)) = rival {
            if gold_score - rival_score <= self.thickness {
                let lr = self.learning_rate;
                for feature in &feats {
                    self.bump(feature, &gold, lr);
                }
                for feature in &feats {
                    self.bump(feature, &rival_label, -lr);
                }
            }
        }
    }

    fn done_with_round(&mut self) {
        // Averages are maintained per update; nothing to flush per round.
    }

    fn done_learning(&mut self) {
        let step = self.step.max(1);
        for entries in self.weights.values_mut() {
            for entry in entries.values_mut() {
                entry.total = entry.averaged(self.step);
                entry.stamp = self.step;
                entry.value = entry.total / step as f64;
            }
        }
        self.finalized = true;
    }

    fn save(&self) -> Result<()> {
        #[derive(Serialize)]
        struct ModelFile<'a> {
            learning_rate: f64,
            thickness: f64,
            lexicalized: bool,
            labels: &'a BTreeSet<String>,
            weights: HashMap<&'a String, HashMap<&'a String, f64>>,
        }
        let weights = self
            .weights
            .iter()
            .map(|(f, m)| (f, m.iter().map(|(l, e)| (l, e.value)).collect()))
            .collect();
        write_artifact(
            &self.paths.model,
            &ModelFile {
                learning_rate: self.learning_rate,
                thickness: self.thickness,
                lexicalized: self.lexicalized,
                labels: &self.labels,
                weights,
            },
        )?;
        let mut lexicon: Vec<&String> = self.weights.keys().collect();
        lexicon.sort();
        write_artifact(&self.paths.lexicon, &lexicon)
    }

    fn forget(&mut self) {
        self.weights.clear();
        self.labels.clear();
        self.step = 0;
        self.finalized = false;
    }

    fn set_parameters(&mut self, params: &ParameterSet) -> Result<()> {
        if let Some(v) = params.get("thickness") {
            self.thickness = v;
        }
        if let Some(v) = params.get("learningRate") {
            self.learning_rate = v;
        }
        self.params = Some(params.clone());
        Ok(())
    }

    fn parameters(&self) -> Option<&ParameterSet> {
        self.params.as_ref()
    }
}
