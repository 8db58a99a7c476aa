//! Snake RL - grid snake simulation with reinforcement learning trainers
//!
//! This library provides:
//! - Core game logic: single- and multi-agent engines (game module)
//! - RL infrastructure: observation encoding, DQN/PPO/A3C trainers,
//!   checkpointing (rl module)
//! - Training statistics (metrics module)
//! - Training modes driving any trainer (modes module)

pub mod game;
pub mod metrics;
pub mod modes;
pub mod rl;
