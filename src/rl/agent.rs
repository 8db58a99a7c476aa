//! The common policy interface shared by the three trainers
//!
//! The training loops drive DQN, PPO, and A3C through this trait, so a mode
//! never needs to know which algorithm it is running. Actions cross the
//! boundary as strict one-hot vectors and are decoded by the game layer.

use super::observation::Observation;
use crate::game::Turn;
use anyhow::Result;
use std::path::Path;

/// A trainable action-selection policy
pub trait Policy {
    /// Pick an action for the observation
    ///
    /// With `training` set, the policy may explore (epsilon-greedy or
    /// sampling from the action distribution); without it, the policy acts
    /// greedily. Returns the one-hot encoding of the chosen turn.
    fn select_action(&mut self, observation: &Observation, training: bool) -> [f32; 3];

    /// Record one environment transition
    ///
    /// Called after every step. Off-policy learners may also train here;
    /// on-policy learners only accumulate.
    fn record(
        &mut self,
        state: Observation,
        action: Turn,
        reward: f32,
        next_state: Observation,
        done: bool,
    );

    /// Run the end-of-episode update
    ///
    /// Returns the training loss when an update actually ran, `None` when
    /// there was nothing to train on.
    fn update(&mut self) -> Option<f32>;

    /// Number of completed training episodes
    fn episodes_trained(&self) -> usize;

    /// Save network weights and metadata to `path`
    fn save(&self, path: &Path) -> Result<()>;

    /// Load network weights from `path`
    ///
    /// A missing or unreadable checkpoint is not fatal: the policy logs a
    /// warning and keeps its fresh parameters.
    fn load(&mut self, path: &Path) -> Result<()>;

    /// Short algorithm name for logging and metadata
    fn name(&self) -> &'static str;
}
