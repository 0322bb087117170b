//! tagtune - cross-validated hyperparameter tuning for complementary taggers
//!
//! Finds, by k-fold rotation over a training corpus, the best hyperparameter
//! combination and training round count for a pair of sequence-labeling
//! classifiers: one specialized for vocabulary seen during training, one for
//! unseen tokens. Winning configurations are retrained over the full
//! training+development data, model artifacts are persisted, and a structured
//! performance report is written, optionally against a held-out test set.
//!
//! # Modules
//!
//! - [`corpus`] - Restartable example streams and k-fold rotation
//! - [`grid`] - Hyperparameter cross-product enumeration
//! - [`eval`] - Discrete classification scorecards and target statistics
//! - [`model`] - Trainable-classifier contract and reference taggers
//! - [`tuner`] - Batch training, selection, and session orchestration
//! - [`report`] - Structured report emission
//! - [`config`] - Run configuration with option-map loading

pub mod config;
pub mod corpus;
pub mod error;
pub mod eval;
pub mod grid;
pub mod model;
pub mod report;
pub mod tuner;

pub use error::{Result, TagTuneError};

/// Re-export commonly used types
pub mod prelude {
    pub use crate::config::TuningConfig;
    pub use crate::corpus::{Example, FoldSplitter, SplitPolicy, TokenStream};
    pub use crate::error::{Result, TagTuneError};
    pub use crate::eval::{test_discrete, Classify, GoldLabel, Scorecard, TargetStat};
    pub use crate::grid::{ParameterGrid, ParameterSet};
    pub use crate::model::{
        ArtifactPaths, BaselineModel, CombinedTagger, PerceptronTagger, SuffixTable,
        TrainableClassifier,
    };
    pub use crate::report::ReportWriter;
    pub use crate::tuner::{BatchPolicy, BatchTrainer, TuneOutcome, TuneSession, TuningRecord};
}
