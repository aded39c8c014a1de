pub mod annealing;
pub mod dataset;
pub mod distance;
pub mod frequency;
pub mod history;
pub mod odds;
pub mod prizes;
pub mod recommend;
pub mod repeat;
pub mod uniformity;

pub use dataset::{AnalysisError, Dataset, ValidDraw};

const MILLIS_PER_DAY: i64 = 86_400_000;
