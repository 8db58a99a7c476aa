//! Core game simulation module for Snake
//!
//! This module contains all the simulation logic without any I/O or rendering
//! dependencies:
//! - Grid primitives and game state (state module)
//! - Relative actions and the shared rotation table (action module)
//! - Difficulty / reward-profile configuration (config module)
//! - Single-agent engine with reward and termination logic (engine module)
//! - Multi-agent engine sharing one board (multi module)

pub mod action;
pub mod config;
pub mod engine;
pub mod multi;
pub mod state;

// Re-export commonly used types
pub use action::{Direction, Turn};
pub use config::{CutoffScale, Difficulty, GameConfig, RewardConfig, RewardProfile};
pub use engine::{GameEngine, StepOutcome};
pub use multi::MultiAgentEngine;
pub use state::{CollisionType, GameState, Position, Snake};

use thiserror::Error;

/// Errors raised by the simulation
#[derive(Debug, Error)]
pub enum GameError {
    /// The action was not one of the three recognized one-hot vectors
    #[error("invalid action encoding: expected a 3-element one-hot vector, got {0:?}")]
    InvalidAction(Vec<f32>),

    /// The engine was asked to operate on a state it should never reach
    /// through its own step/reset operations
    #[error("inconsistent game state: {0}")]
    Consistency(String),
}
