//! Incremental batch training against a fold rotation
//!
//! Drives one classifier instance per fold through discrete training rounds,
//! scoring the held-out fold after every round. Per parameter combination it
//! records the round count that achieved the best fold-averaged target
//! statistic; the stopping policy (round cap, metric plateau) lives here.

use crate::corpus::{FoldSplitter, TokenStream};
use crate::error::{Result, TagTuneError};
use crate::eval::{test_discrete, GoldLabel, TargetStat};
use crate::grid::{ParameterGrid, ParameterSet};
use crate::model::TrainableClassifier;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

/// Stopping policy for incremental training of one combination.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BatchPolicy {
    /// Hard cap on training rounds.
    pub max_rounds: usize,
    /// Stop once the fold-averaged metric has not improved for this many
    /// consecutive rounds.
    pub plateau_patience: usize,
}

impl Default for BatchPolicy {
    fn default() -> Self {
        Self {
            max_rounds: 50,
            plateau_patience: 5,
        }
    }
}

/// Outcome of tuning one parameter combination: the round count that achieved
/// the combination's best metric, and that metric.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TuningRecord {
    /// Position of the combination in grid enumeration order.
    pub combination: usize,
    pub rounds: usize,
    pub metric: f64,
}

/// Round-incremental trainer over a fold rotation.
pub struct BatchTrainer {
    policy: BatchPolicy,
    target: TargetStat,
}

impl BatchTrainer {
    pub fn new(policy: BatchPolicy, target: TargetStat) -> Self {
        Self { policy, target }
    }

    /// Tune every combination in the grid, in enumeration order.
    ///
    /// `make` produces a fresh untrained classifier; one instance per fold is
    /// trained round-major, so after each round every instance has consumed
    /// its held-in stream exactly once more and the fold-averaged held-out
    /// metric is compared strictly against the combination's best-so-far
    /// (earlier rounds win ties).
    pub fn tune<C, F>(
        &self,
        make: F,
        grid: &ParameterGrid,
        folds: &FoldSplitter,
    ) -> Result<Vec<TuningRecord>>
    where
        C: TrainableClassifier,
        F: Fn() -> C,
    {
        let mut records = Vec::with_capacity(grid.len());
        for (idx, combo) in grid.combinations().iter().enumerate() {
            let record = self.tune_one(&make, idx, combo, folds)?;
            info!(
                combination = idx,
                rounds = record.rounds,
                metric = record.metric,
                "combination tuned"
            );
            records.push(record);
        }
        Ok(records)
    }

    fn tune_one<C, F>(
        &self,
        make: &F,
        idx: usize,
        combo: &ParameterSet,
        folds: &FoldSplitter,
    ) -> Result<TuningRecord>
    where
        C: TrainableClassifier,
        F: Fn() -> C,
    {
        let k = folds.k();
        let mut members: Vec<C> = Vec::with_capacity(k);
        let mut views: Vec<(TokenStream, TokenStream)> = Vec::with_capacity(k);
        let mut rotation = folds.clone();
        for pivot in 0..k {
            rotation.set_pivot(pivot)?;
            views.push((rotation.held_in(), rotation.held_out()));
            let mut member = make();
            member.set_parameters(combo)?;
            members.push(member);
        }

        let mut best = TuningRecord {
            combination: idx,
            rounds: 0,
            metric: f64::NEG_INFINITY,
        };
        let mut stall = 0;
        for round in 1..=self.policy.max_rounds {
            let mut sum = 0.0;
            for (member, (held_in, held_out)) in members.iter_mut().zip(views.iter_mut()) {
                held_in.reset();
                while let Some(example) = held_in.next_example() {
                    member.learn(&example);
                }
                member.done_with_round();
                let card = test_discrete(&*member, &GoldLabel, held_out);
                sum += card.overall_stats()[self.target.stat_index()];
            }
            let avg = sum / k as f64;
            debug!(combination = idx, round, metric = avg, "round evaluated");
            if avg > best.metric {
                best = TuningRecord {
                    combination: idx,
                    rounds: round,
                    metric: avg,
                };
                stall = 0;
            } else {
                stall += 1;
                if stall >= self.policy.plateau_patience {
                    break;
                }
            }
        }
        Ok(best)
    }
}

/// Select the winning record: maximum metric, ties broken by earliest grid
/// position. Returns `None` only for an empty record list.
pub fn select_best(records: &[TuningRecord]) -> Option<&TuningRecord> {
    let mut best: Option<&TuningRecord> = None;
    for record in records {
        match best {
            Some(b) if record.metric <= b.metric => {}
            _ => best = Some(record),
        }
    }
    best
}

/// Recover `(rounds, grid position)` for a winning parameter set by reverse
/// lookup. A miss means the caller holds a combination the tuner never
/// registered.
pub fn find_num_rounds(
    winner: &ParameterSet,
    grid: &ParameterGrid,
    records: &[TuningRecord],
) -> Result<(usize, usize)> {
    let idx = grid.position(winner).ok_or_else(|| {
        TagTuneError::InternalConsistencyError(format!(
            "winning combination [{winner}] not present in the parameter grid"
        ))
    })?;
    let record = records.iter().find(|r| r.combination == idx).ok_or_else(|| {
        TagTuneError::InternalConsistencyError(format!(
            "no tuning record for combination {idx}"
        ))
    })?;
    Ok((record.rounds, idx))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(combination: usize, rounds: usize, metric: f64) -> TuningRecord {
        TuningRecord {
            combination,
            rounds,
            metric,
        }
    }

    #[test]
    fn test_select_best_takes_maximum() {
        let records = vec![record(0, 3, 0.71), record(1, 5, 0.93), record(2, 2, 0.80)];
        assert_eq!(select_best(&records), Some(&records[1]));
    }

    #[test]
    fn test_select_best_tie_goes_to_earliest() {
        let records = vec![record(0, 4, 0.80), record(1, 7, 0.80)];
        let best = select_best(&records).unwrap();
        assert_eq!(best.combination, 0);
        assert_eq!(best.rounds, 4);
    }

    #[test]
    fn test_select_best_with_no_improvement_still_selects() {
        let records = vec![record(0, 1, 0.25), record(1, 1, 0.25), record(2, 1, 0.25)];
        assert_eq!(select_best(&records).unwrap().combination, 0);
    }

    #[test]
    fn test_find_num_rounds_round_trip() {
        let grid =
            ParameterGrid::from_comma_lists(&[("thickness", "2,4"), ("learningRate", "0.1")])
                .unwrap();
        let records = vec![record(0, 6, 0.9), record(1, 2, 0.8)];
        let winner = grid.combinations()[1].clone();
        assert_eq!(find_num_rounds(&winner, &grid, &records).unwrap(), (2, 1));
    }

    #[test]
    fn test_unregistered_winner_is_internal_consistency_error() {
        let grid =
            ParameterGrid::from_comma_lists(&[("thickness", "2,4"), ("learningRate", "0.1")])
                .unwrap();
        let records = vec![record(0, 6, 0.9)];
        let foreign = ParameterSet::new(vec![
            ("thickness".to_string(), 16.0),
            ("learningRate".to_string(), 0.1),
        ]);
        assert!(matches!(
            find_num_rounds(&foreign, &grid, &records),
            Err(TagTuneError::InternalConsistencyError(_))
        ));
        // Registered combination with no record is the same class of bug.
        let unrecorded = grid.combinations()[1].clone();
        assert!(matches!(
            find_num_rounds(&unrecorded, &grid, &records),
            Err(TagTuneError::InternalConsistencyError(_))
        ));
    }
}
