//! Application modes
//!
//! - Single-agent training (train module)
//! - Multi-agent training on a shared board (multi module)

pub mod multi;
pub mod train;

pub use multi::{MultiTrainConfig, MultiTrainMode};
pub use train::{TrainConfig, TrainMode};
