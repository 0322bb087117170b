//! Discrete classification scoring
//!
//! The same evaluator is used during tuning, for final training reports, and
//! for optional test-set reports. Scorecards are deterministic: identical
//! classifier state, gold source, and stream produce bit-identical results.

use crate::corpus::{Example, TokenStream};
use crate::error::{Result, TagTuneError};
use ndarray::Array1;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Assigns a discrete value to an example. Implemented by trained models and
/// by the gold-label oracle.
pub trait Classify {
    fn classify(&self, example: &Example) -> String;
}

/// Oracle that reads the gold label off the example itself.
#[derive(Debug, Clone, Copy, Default)]
pub struct GoldLabel;

impl Classify for GoldLabel {
    fn classify(&self, example: &Example) -> String {
        example.label.clone()
    }
}

/// Target statistic used to rank parameter combinations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TargetStat {
    Accuracy,
    F1,
}

impl TargetStat {
    /// Recognizes exactly `ACC` and `F1`; anything else is a configuration
    /// error.
    pub fn parse(name: &str) -> Result<Self> {
        match name {
            "ACC" => Ok(TargetStat::Accuracy),
            "F1" => Ok(TargetStat::F1),
            other => Err(TagTuneError::ConfigError(format!(
                "invalid target statistic '{other}'; expected ACC or F1"
            ))),
        }
    }

    /// Position of this statistic in [`Scorecard::overall_stats`].
    pub fn stat_index(self) -> usize {
        match self {
            TargetStat::F1 => 2,
            TargetStat::Accuracy => 3,
        }
    }
}

/// Per-class tallies. True positives are `correct`; false positives and
/// false negatives derive from `predicted` and `labeled`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassCounts {
    /// Predictions of this class that matched the gold label.
    pub correct: usize,
    /// Times this class was predicted.
    pub predicted: usize,
    /// Times this class appeared as the gold label.
    pub labeled: usize,
}

impl ClassCounts {
    pub fn false_positives(&self) -> usize {
        self.predicted - self.correct
    }

    pub fn false_negatives(&self) -> usize {
        self.labeled - self.correct
    }

    pub fn precision(&self) -> f64 {
        ratio(self.correct, self.predicted)
    }

    pub fn recall(&self) -> f64 {
        ratio(self.correct, self.labeled)
    }

    pub fn f1(&self) -> f64 {
        harmonic(self.precision(), self.recall())
    }
}

/// Discrete classification scorecard: per-class counts plus overall
/// aggregates. Classes iterate in sorted order, so two identical evaluations
/// render identically.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Scorecard {
    classes: BTreeMap<String, ClassCounts>,
    total: usize,
    correct: usize,
}

impl Scorecard {
    pub fn record(&mut self, gold: &str, predicted: &str) {
        self.total += 1;
        if gold == predicted {
            self.correct += 1;
            self.class_mut(gold).correct += 1;
        }
        self.class_mut(predicted).predicted += 1;
        self.class_mut(gold).labeled += 1;
    }

    fn class_mut(&mut self, label: &str) -> &mut ClassCounts {
        self.classes.entry(label.to_string()).or_default()
    }

    pub fn classes(&self) -> &BTreeMap<String, ClassCounts> {
        &self.classes
    }

    pub fn total(&self) -> usize {
        self.total
    }

    pub fn accuracy(&self) -> f64 {
        ratio(self.correct, self.total)
    }

    /// Micro-averaged precision over all classes.
    pub fn overall_precision(&self) -> f64 {
        let correct: usize = self.classes.values().map(|c| c.correct).sum();
        let predicted: usize = self.classes.values().map(|c| c.predicted).sum();
        ratio(correct, predicted)
    }

    /// Micro-averaged recall over all classes.
    pub fn overall_recall(&self) -> f64 {
        let correct: usize = self.classes.values().map(|c| c.correct).sum();
        let labeled: usize = self.classes.values().map(|c| c.labeled).sum();
        ratio(correct, labeled)
    }

    pub fn overall_f1(&self) -> f64 {
        harmonic(self.overall_precision(), self.overall_recall())
    }

    /// Overall-statistics vector: `[precision, recall, F1, accuracy]`.
    /// [`TargetStat::stat_index`] indexes into this layout.
    pub fn overall_stats(&self) -> Array1<f64> {
        Array1::from_vec(vec![
            self.overall_precision(),
            self.overall_recall(),
            self.overall_f1(),
            self.accuracy(),
        ])
    }
}

impl fmt::Display for Scorecard {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "{:<10} {:>9} {:>9} {:>9} {:>8} {:>9} {:>8}",
            "label", "precision", "recall", "f1", "labeled", "predicted", "correct"
        )?;
        for (label, counts) in &self.classes {
            writeln!(
                f,
                "{:<10} {:>9.3} {:>9.3} {:>9.3} {:>8} {:>9} {:>8}",
                label,
                counts.precision(),
                counts.recall(),
                counts.f1(),
                counts.labeled,
                counts.predicted,
                counts.correct
            )?;
        }
        writeln!(
            f,
            "overall accuracy {:.5} over {} examples",
            self.accuracy(),
            self.total
        )
    }
}

/// Score a classifier against a held-out stream using a gold oracle. The
/// stream is reset before scoring, so repeated calls see identical data.
pub fn test_discrete(
    classifier: &dyn Classify,
    oracle: &dyn Classify,
    stream: &mut TokenStream,
) -> Scorecard {
    stream.reset();
    let mut card = Scorecard::default();
    while let Some(example) = stream.next_example() {
        card.record(&oracle.classify(&example), &classifier.classify(&example));
    }
    card
}

fn ratio(num: usize, den: usize) -> f64 {
    if den == 0 {
        0.0
    } else {
        num as f64 / den as f64
    }
}

fn harmonic(p: f64, r: f64) -> f64 {
    if p + r == 0.0 {
        0.0
    } else {
        2.0 * p * r / (p + r)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    struct Always(&'static str);

    impl Classify for Always {
        fn classify(&self, _example: &Example) -> String {
            self.0.to_string()
        }
    }

    fn stream() -> TokenStream {
        TokenStream::from_examples(vec![
            Example::new("a", "NN"),
            Example::new("b", "NN"),
            Example::new("c", "DT"),
            Example::new("d", "VB"),
        ])
    }

    #[test]
    fn test_target_stat_positions() {
        assert_eq!(TargetStat::F1.stat_index(), 2);
        assert_eq!(TargetStat::Accuracy.stat_index(), 3);
        assert_eq!(TargetStat::parse("ACC").unwrap(), TargetStat::Accuracy);
        assert_eq!(TargetStat::parse("F1").unwrap(), TargetStat::F1);
    }

    #[test]
    fn test_unrecognized_target_stat() {
        assert!(matches!(
            TargetStat::parse("AUC"),
            Err(TagTuneError::ConfigError(_))
        ));
    }

    #[test]
    fn test_scorecard_counts() {
        let mut s = stream();
        let card = test_discrete(&Always("NN"), &GoldLabel, &mut s);
        assert_eq!(card.total(), 4);
        let nn = card.classes()["NN"];
        assert_eq!(nn.correct, 2);
        assert_eq!(nn.predicted, 4);
        assert_eq!(nn.labeled, 2);
        assert_eq!(nn.false_positives(), 2);
        assert_eq!(card.classes()["DT"].false_negatives(), 1);
        assert_relative_eq!(card.accuracy(), 0.5);
    }

    #[test]
    fn test_overall_stats_layout() {
        let mut s = stream();
        let card = test_discrete(&Always("NN"), &GoldLabel, &mut s);
        let stats = card.overall_stats();
        assert_relative_eq!(stats[2], card.overall_f1());
        assert_relative_eq!(stats[3], card.accuracy());
    }

    #[test]
    fn test_evaluation_is_deterministic() {
        let mut s = stream();
        let first = test_discrete(&Always("NN"), &GoldLabel, &mut s);
        let second = test_discrete(&Always("NN"), &GoldLabel, &mut s);
        assert_eq!(first, second);
        assert_eq!(first.to_string(), second.to_string());
    }
}
