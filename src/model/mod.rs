//! Trainable model capability contract and reference implementations
//!
//! The tuner drives any model exclusively through [`TrainableClassifier`]; a
//! model owns its internal state and persists exactly two artifacts (weights
//! and lexicon) keyed by configured paths.

mod baseline;
mod perceptron;
mod suffix;

pub use baseline::BaselineModel;
pub use perceptron::PerceptronTagger;
pub use suffix::SuffixTable;

use crate::corpus::Example;
use crate::error::{Result, TagTuneError};
use crate::eval::Classify;
use crate::grid::ParameterSet;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Label returned when a model has nothing learned to say about an example.
pub const UNSEEN_LABEL: &str = "UNKNOWN";

/// Paths for the two artifacts a model persists.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArtifactPaths {
    pub model: PathBuf,
    pub lexicon: PathBuf,
}

impl ArtifactPaths {
    pub fn new(model: impl Into<PathBuf>, lexicon: impl Into<PathBuf>) -> Self {
        Self {
            model: model.into(),
            lexicon: lexicon.into(),
        }
    }
}

/// Capability contract for a stateful, incrementally-trainable classifier.
pub trait TrainableClassifier: Classify {
    /// Consume one training example.
    fn learn(&mut self, example: &Example);

    /// Mark the end of one complete pass over the training data.
    fn done_with_round(&mut self);

    /// Finalize learned state; no further `learn` calls will follow.
    fn done_learning(&mut self);

    /// Persist the model's artifacts (weights + lexicon).
    fn save(&self) -> Result<()>;

    /// Discard all learned state. Applied parameters survive.
    fn forget(&mut self);

    /// Apply a hyperparameter combination.
    fn set_parameters(&mut self, params: &ParameterSet) -> Result<()>;

    /// The currently applied combination, if any.
    fn parameters(&self) -> Option<&ParameterSet>;
}

/// Full tagger: routes vocabulary observed during training to the known-word
/// model and everything else to the unknown-word model.
pub struct CombinedTagger {
    known: PerceptronTagger,
    unknown: PerceptronTagger,
    vocabulary: Arc<BaselineModel>,
}

impl CombinedTagger {
    pub fn new(
        known: PerceptronTagger,
        unknown: PerceptronTagger,
        vocabulary: Arc<BaselineModel>,
    ) -> Self {
        Self {
            known,
            unknown,
            vocabulary,
        }
    }
}

impl Classify for CombinedTagger {
    fn classify(&self, example: &Example) -> String {
        if self.vocabulary.observed(&example.token) {
            self.known.classify(example)
        } else {
            self.unknown.classify(example)
        }
    }
}

/// Serialize a value to a pretty-printed JSON artifact, creating parent
/// directories as needed.
pub(crate) fn write_artifact<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent).map_err(|e| {
                TagTuneError::DataAccessError(format!(
                    "cannot create artifact directory {}: {}",
                    parent.display(),
                    e
                ))
            })?;
        }
    }
    let json = serde_json::to_string_pretty(value)?;
    fs::write(path, json).map_err(|e| {
        TagTuneError::DataAccessError(format!(
            "cannot write model artifact {}: {}",
            path.display(),
            e
        ))
    })
}
