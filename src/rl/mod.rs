//! Reinforcement learning components
//!
//! Three trainers share one environment interface:
//! - **DQN** (dqn module): off-policy Q-learning with experience replay and
//!   epsilon-greedy exploration
//! - **PPO** (ppo module): on-policy clipped-surrogate updates over episode
//!   rollouts
//! - **A3C** (a3c module): single-worker advantage actor-critic, one update
//!   per episode
//!
//! Supporting modules: the 11-feature observation encoding (observation),
//! experience stores (memory), the MLP networks (network), checkpointing
//! (persistence), and backend aliases (backend). The [`Policy`] trait lets
//! the training modes drive any of the three trainers interchangeably.

pub mod a3c;
pub mod agent;
pub mod backend;
pub mod dqn;
pub mod memory;
pub mod network;
pub mod observation;
pub mod persistence;
pub mod ppo;

// Re-export commonly used types
pub use a3c::{A3cAgent, A3cConfig};
pub use agent::Policy;
pub use backend::{default_device, InferenceBackend, TrainingBackend};
pub use dqn::{DqnAgent, DqnConfig};
pub use memory::{
    EpisodeMemory, ExperienceStore, PolicyStep, ReplayBuffer, RolloutMemory, Transition,
};
pub use network::{ActorCriticConfig, ActorCriticNetwork, QNetwork, QNetworkConfig};
pub use observation::{observe, observe_state, Observation, OBSERVATION_SIZE};
pub use persistence::{load_module, save_module, ModelMetadata};
pub use ppo::{PpoAgent, PpoConfig};
