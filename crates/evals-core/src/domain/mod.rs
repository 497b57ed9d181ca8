//! Domain model for the harness.
//!
//! - [`model`]: `ModelInfo`, `Evaluation`
//! - [`task`]: `Task`, `RunnerResult`, `GraderResult`
//! - [`score`]: `Score`, `fold_score`
//! - [`error`]: `EvalError`, `SelectionError`

pub mod error;
pub mod model;
pub mod score;
pub mod task;

pub use error::{EvalError, Result, SelectionError};
pub use model::{Evaluation, ModelInfo};
pub use score::{fold_score, Score};
pub use task::{GraderResult, RunnerDebug, RunnerOutput, RunnerResult, Task};
