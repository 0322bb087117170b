//! Tuning run configuration
//!
//! Built from a string option map with defaults for every recognized option,
//! or assembled directly with builder methods. Configuration problems fail
//! fast, before any training starts.

use crate::corpus::SplitPolicy;
use crate::error::{Result, TagTuneError};
use crate::eval::TargetStat;
use crate::model::ArtifactPaths;
use crate::tuner::BatchPolicy;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::warn;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TuningConfig {
    /// Corpus used for fold rotation during tuning and for final training.
    pub training_and_dev_data: PathBuf,
    /// Held-out corpus, consulted only when test evaluation is enabled.
    pub test_data: PathBuf,
    /// Directory prefix for all model artifacts.
    pub model_path: PathBuf,
    pub report_file: PathBuf,
    pub num_folds: usize,
    pub random_split: bool,
    pub split_seed: u64,
    pub target_stat: TargetStat,
    /// Comma-separated hyperparameter value lists; parsed by the grid.
    pub thickness_values: String,
    pub learning_rate_values: String,
    pub evaluate_on_test: bool,
    pub batch: BatchPolicy,
    /// Tokens at or below this corpus frequency train the unknown-word
    /// tagger.
    pub rarity_threshold: usize,
}

impl Default for TuningConfig {
    fn default() -> Self {
        Self {
            training_and_dev_data: PathBuf::from("data/train-dev.br"),
            test_data: PathBuf::from("data/test.br"),
            model_path: PathBuf::from("models"),
            report_file: PathBuf::from("models/tune-report.xml"),
            num_folds: 5,
            random_split: true,
            split_seed: 42,
            target_stat: TargetStat::Accuracy,
            thickness_values: "2,4,8,16,32".to_string(),
            learning_rate_values: "0.05,0.1,0.2,0.4".to_string(),
            evaluate_on_test: false,
            batch: BatchPolicy::default(),
            rarity_threshold: 1,
        }
    }
}

impl TuningConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Apply recognized options from a name/value map on top of the
    /// defaults. Unrecognized names are logged and ignored.
    pub fn from_options(options: &HashMap<String, String>) -> Result<Self> {
        let mut config = Self::default();
        for (key, value) in options {
            match key.as_str() {
                "trainingAndDevData" => config.training_and_dev_data = PathBuf::from(value),
                "testData" => config.test_data = PathBuf::from(value),
                "modelPath" => config.model_path = PathBuf::from(value),
                "reportFile" => config.report_file = PathBuf::from(value),
                "numFolds" => config.num_folds = parse_num(key, value)?,
                "isTrainSplitRandom" => config.random_split = parse_bool(key, value)?,
                "splitSeed" => config.split_seed = parse_num(key, value)?,
                "performanceTargetStat" => config.target_stat = TargetStat::parse(value)?,
                "thicknessParams" => config.thickness_values = value.clone(),
                "learningRateParams" => config.learning_rate_values = value.clone(),
                "evaluateOnTestData" => config.evaluate_on_test = parse_bool(key, value)?,
                "maxRounds" => config.batch.max_rounds = parse_num(key, value)?,
                "plateauPatience" => config.batch.plateau_patience = parse_num(key, value)?,
                "rarityThreshold" => config.rarity_threshold = parse_num(key, value)?,
                other => warn!(option = other, "ignoring unrecognized option"),
            }
        }
        Ok(config)
    }

    /// Load options from a properties file (`name = value` lines, `#`
    /// comments) and apply them on top of the defaults.
    pub fn from_properties_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|e| {
            TagTuneError::DataAccessError(format!(
                "cannot read configuration {}: {}",
                path.display(),
                e
            ))
        })?;
        let mut options = HashMap::new();
        for line in text.lines() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            let (key, value) = line.split_once('=').ok_or_else(|| {
                TagTuneError::ConfigError(format!("malformed configuration line '{line}'"))
            })?;
            options.insert(key.trim().to_string(), value.trim().to_string());
        }
        Self::from_options(&options)
    }

    pub fn with_folds(mut self, k: usize) -> Self {
        self.num_folds = k;
        self
    }

    pub fn with_target_stat(mut self, stat: TargetStat) -> Self {
        self.target_stat = stat;
        self
    }

    pub fn with_split_policy(mut self, random: bool, seed: u64) -> Self {
        self.random_split = random;
        self.split_seed = seed;
        self
    }

    pub fn with_evaluate_on_test(mut self, enabled: bool) -> Self {
        self.evaluate_on_test = enabled;
        self
    }

    pub fn split_policy(&self) -> SplitPolicy {
        if self.random_split {
            SplitPolicy::Random {
                seed: self.split_seed,
            }
        } else {
            SplitPolicy::Sequential
        }
    }

    pub fn known_paths(&self) -> ArtifactPaths {
        self.artifact_paths("known-tagger")
    }

    pub fn unknown_paths(&self) -> ArtifactPaths {
        self.artifact_paths("unknown-tagger")
    }

    pub fn baseline_paths(&self) -> ArtifactPaths {
        self.artifact_paths("baseline")
    }

    pub fn suffix_paths(&self) -> ArtifactPaths {
        self.artifact_paths("suffix-table")
    }

    fn artifact_paths(&self, name: &str) -> ArtifactPaths {
        ArtifactPaths::new(
            self.model_path.join(format!("{name}.model.json")),
            self.model_path.join(format!("{name}.lex.json")),
        )
    }
}

fn parse_num<T: std::str::FromStr>(key: &str, value: &str) -> Result<T> {
    value.parse().map_err(|_| {
        TagTuneError::ConfigError(format!("cannot parse '{value}' for option '{key}'"))
    })
}

fn parse_bool(key: &str, value: &str) -> Result<bool> {
    match value {
        "true" => Ok(true),
        "false" => Ok(false),
        other => Err(TagTuneError::ConfigError(format!(
            "cannot parse '{other}' for option '{key}'; expected true or false"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = TuningConfig::default();
        assert_eq!(config.num_folds, 5);
        assert!(config.random_split);
        assert_eq!(config.target_stat, TargetStat::Accuracy);
        assert_eq!(config.thickness_values, "2,4,8,16,32");
        assert_eq!(config.learning_rate_values, "0.05,0.1,0.2,0.4");
        assert!(!config.evaluate_on_test);
    }

    #[test]
    fn test_from_options_overrides() {
        let options = HashMap::from([
            ("numFolds".to_string(), "3".to_string()),
            ("performanceTargetStat".to_string(), "F1".to_string()),
            ("isTrainSplitRandom".to_string(), "false".to_string()),
            ("evaluateOnTestData".to_string(), "true".to_string()),
        ]);
        let config = TuningConfig::from_options(&options).unwrap();
        assert_eq!(config.num_folds, 3);
        assert_eq!(config.target_stat, TargetStat::F1);
        assert_eq!(config.split_policy(), SplitPolicy::Sequential);
        assert!(config.evaluate_on_test);
    }

    #[test]
    fn test_bad_numeric_option() {
        let options = HashMap::from([("numFolds".to_string(), "five".to_string())]);
        let err = TuningConfig::from_options(&options).unwrap_err();
        match err {
            TagTuneError::ConfigError(msg) => assert!(msg.contains("'five'")),
            other => panic!("expected ConfigError, got {other:?}"),
        }
    }

    #[test]
    fn test_bad_target_stat_option() {
        let options = HashMap::from([(
            "performanceTargetStat".to_string(),
            "RECALL".to_string(),
        )]);
        assert!(matches!(
            TuningConfig::from_options(&options),
            Err(TagTuneError::ConfigError(_))
        ));
    }

    #[test]
    fn test_artifact_paths_share_prefix() {
        let config = TuningConfig::default();
        let known = config.known_paths();
        assert_eq!(known.model, PathBuf::from("models/known-tagger.model.json"));
        assert_eq!(known.lexicon, PathBuf::from("models/known-tagger.lex.json"));
    }
}
