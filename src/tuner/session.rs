//! Tuning session orchestration
//!
//! One session runs the whole pipeline sequentially: train the auxiliary
//! models once, tune the known- and unknown-word taggers independently over
//! the parameter grid, retrain final models with the winning configurations,
//! and emit the report.

use crate::config::TuningConfig;
use crate::corpus::{FoldSplitter, TokenStream};
use crate::error::{Result, TagTuneError};
use crate::eval::{test_discrete, GoldLabel, Scorecard};
use crate::grid::{ParameterGrid, ParameterSet};
use crate::model::{
    BaselineModel, CombinedTagger, PerceptronTagger, SuffixTable, TrainableClassifier,
};
use crate::report::ReportWriter;
use crate::tuner::{find_num_rounds, select_best, BatchTrainer, TuningRecord};
use serde::Serialize;
use std::sync::Arc;
use tracing::info;

/// Winning configuration for one classifier.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChosenConfiguration {
    pub params: ParameterSet,
    pub rounds: usize,
    pub metric: f64,
}

/// Result of a completed tuning run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TuneOutcome {
    pub known: ChosenConfiguration,
    pub unknown: ChosenConfiguration,
}

/// A full cross-validated tuning run.
pub struct TuneSession {
    config: TuningConfig,
    grid: ParameterGrid,
}

impl TuneSession {
    /// Validate the configuration and build the parameter grid. All
    /// configuration errors surface here, before any training starts.
    pub fn new(config: TuningConfig) -> Result<Self> {
        if config.num_folds < 2 {
            return Err(TagTuneError::ConfigError(format!(
                "fold count must be at least 2, got {}",
                config.num_folds
            )));
        }
        let grid = ParameterGrid::from_comma_lists(&[
            ("thickness", &config.thickness_values),
            ("learningRate", &config.learning_rate_values),
        ])?;
        Ok(Self { config, grid })
    }

    pub fn grid(&self) -> &ParameterGrid {
        &self.grid
    }

    /// Run the pipeline to completion and write the report.
    pub fn run(&self) -> Result<TuneOutcome> {
        let config = &self.config;
        let mut train = TokenStream::from_bracket_file(&config.training_and_dev_data)?;
        let mut unknown_train = train.unknown_view(config.rarity_threshold);
        info!(
            examples = train.len(),
            rare = unknown_train.len(),
            "corpus loaded"
        );

        let policy = config.split_policy();
        let known_folds = FoldSplitter::new(&train, config.num_folds, policy)?;
        let unknown_folds = FoldSplitter::new(&unknown_train, config.num_folds, policy)?;

        // The tuned taggers consume the auxiliary models' output, so those
        // train first, once, over the initial held-in view.
        info!("training baseline and suffix models");
        let mut baseline = BaselineModel::new(config.baseline_paths());
        let mut suffix = SuffixTable::new(config.suffix_paths());
        let mut held_in = known_folds.held_in();
        while let Some(example) = held_in.next_example() {
            baseline.learn(&example);
            suffix.learn(&example);
        }
        baseline.done_learning();
        baseline.save()?;
        suffix.done_learning();
        suffix.save()?;
        let baseline = Arc::new(baseline);
        let suffix = Arc::new(suffix);

        let trainer = BatchTrainer::new(config.batch, config.target_stat);

        info!("tuning known-word tagger");
        let known_records = trainer.tune(
            || PerceptronTagger::known(config.known_paths(), baseline.clone()),
            &self.grid,
            &known_folds,
        )?;
        info!("tuning unknown-word tagger");
        let unknown_records = trainer.tune(
            || PerceptronTagger::unknown(config.unknown_paths(), suffix.clone()),
            &self.grid,
            &unknown_folds,
        )?;

        let known = self.assemble(&known_records)?;
        let unknown = self.assemble(&unknown_records)?;
        info!(
            known = %known.params,
            known_rounds = known.rounds,
            unknown = %unknown.params,
            unknown_rounds = unknown.rounds,
            "winning configurations selected"
        );

        // Final models see the complete training+dev data every round.
        let mut known_final = PerceptronTagger::known(config.known_paths(), baseline.clone());
        train_final(&mut known_final, &mut train, &known.params, known.rounds)?;
        let mut unknown_final =
            PerceptronTagger::unknown(config.unknown_paths(), suffix.clone());
        train_final(
            &mut unknown_final,
            &mut unknown_train,
            &unknown.params,
            unknown.rounds,
        )?;

        let tagger = CombinedTagger::new(known_final, unknown_final, baseline);
        let training_card = test_discrete(&tagger, &GoldLabel, &mut train);
        let test_card: Option<Scorecard> = if config.evaluate_on_test {
            let mut test = TokenStream::from_bracket_file(&config.test_data)?;
            Some(test_discrete(&tagger, &GoldLabel, &mut test))
        } else {
            None
        };

        info!(report = %config.report_file.display(), "writing report");
        let mut writer = ReportWriter::create(&config.report_file)?;
        writer.write_report(
            (&known.params, known.rounds),
            (&unknown.params, unknown.rounds),
            &training_card,
            test_card.as_ref(),
        )?;

        Ok(TuneOutcome { known, unknown })
    }

    /// Turn a record list into the winning configuration, reverse-checking
    /// the round bookkeeping.
    fn assemble(&self, records: &[TuningRecord]) -> Result<ChosenConfiguration> {
        let best = select_best(records).ok_or_else(|| {
            TagTuneError::InternalConsistencyError("tuning produced no records".to_string())
        })?;
        let params = self.grid.combinations()[best.combination].clone();
        let (rounds, _) = find_num_rounds(&params, &self.grid, records)?;
        Ok(ChosenConfiguration {
            params,
            rounds,
            metric: best.metric,
        })
    }
}

/// Retrain a classifier from scratch with a winning configuration: exactly
/// `rounds` passes over the stream, resetting it at the start of each pass so
/// every round sees the complete data in the same order; then persist.
pub fn train_final<C: TrainableClassifier>(
    classifier: &mut C,
    stream: &mut TokenStream,
    params: &ParameterSet,
    rounds: usize,
) -> Result<()> {
    classifier.forget();
    classifier.set_parameters(params)?;
    for _ in 0..rounds {
        stream.reset();
        while let Some(example) = stream.next_example() {
            classifier.learn(&example);
        }
        classifier.done_with_round();
    }
    classifier.done_learning();
    classifier.save()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::corpus::Example;
    use crate::model::ArtifactPaths;

    #[test]
    fn test_session_rejects_bad_fold_count() {
        let config = TuningConfig::default().with_folds(1);
        assert!(matches!(
            TuneSession::new(config),
            Err(TagTuneError::ConfigError(_))
        ));
    }

    #[test]
    fn test_session_rejects_bad_grid() {
        let mut config = TuningConfig::default();
        config.thickness_values = "2,huge".to_string();
        assert!(matches!(
            TuneSession::new(config),
            Err(TagTuneError::ConfigError(_))
        ));
    }

    #[test]
    fn test_train_final_persists_artifacts() {
        let dir = tempfile::tempdir().unwrap();
        let paths = ArtifactPaths::new(
            dir.path().join("final.model.json"),
            dir.path().join("final.lex.json"),
        );
        let mut stream = TokenStream::from_examples(vec![
            Example::new("the", "DT"),
            Example::new("dog", "NN"),
        ]);
        let mut tagger = PerceptronTagger::known(paths.clone(), Arc::new(GoldLabel));
        let params = ParameterSet::new(vec![
            ("thickness".to_string(), 2.0),
            ("learningRate".to_string(), 0.1),
        ]);
        train_final(&mut tagger, &mut stream, &params, 3).unwrap();
        assert!(paths.model.exists());
        assert!(paths.lexicon.exists());
        assert_eq!(tagger.parameters(), Some(&params));
    }
}
