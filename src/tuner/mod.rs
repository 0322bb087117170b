//! Cross-validation tuning: batch training, selection, and orchestration

mod batch;
mod session;

pub use batch::{find_num_rounds, select_best, BatchPolicy, BatchTrainer, TuningRecord};
pub use session::{train_final, ChosenConfiguration, TuneOutcome, TuneSession};
