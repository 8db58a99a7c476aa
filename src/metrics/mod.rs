//! Training metrics and progress tracking

pub mod training_stats;

pub use training_stats::TrainingStats;
