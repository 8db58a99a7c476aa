//! Neural networks for the Snake RL agents
//!
//! Two small MLPs over the 11-feature observation vector:
//! - **QNetwork**: plain feed-forward net mapping states to per-action
//!   Q-values, used by the DQN trainer
//! - **ActorCriticNetwork**: shared trunk with a policy head (action logits)
//!   and a value head, used by the PPO and A3C trainers
//!
//! # Architecture
//!
//! ```text
//! QNetwork:              ActorCriticNetwork:
//! Input: [batch, 11]     Input: [batch, 11]
//!   ↓ Linear(11→256)       ↓ Linear(11→256) + ReLU
//!     + ReLU               ↓ Linear(256→256) + ReLU
//!   ↓ Linear(256→256)      ↓ Split
//!     + ReLU               ├─→ Actor: Linear(256→3) → logits
//!   ↓ Linear(256→3)        └─→ Critic: Linear(256→1) → value
//! Output: [batch, 3]
//! ```
//!
//! # Example
//!
//! ```rust
//! use snake_rl::rl::{QNetworkConfig, InferenceBackend, default_device};
//! use burn::tensor::Tensor;
//!
//! let device = default_device();
//! let network = QNetworkConfig::new().init::<InferenceBackend>(&device);
//!
//! let states = Tensor::zeros([4, 11], &device);
//! let q_values = network.forward(states);
//! assert_eq!(q_values.dims(), [4, 3]);
//! ```

use super::observation::OBSERVATION_SIZE;
use crate::game::Turn;
use burn::{
    module::Module,
    nn::{Linear, LinearConfig},
    tensor::{activation::relu, backend::Backend, Tensor},
};

/// Configuration for the Q-network
#[derive(Debug, Clone)]
pub struct QNetworkConfig {
    /// Number of input features
    pub input_size: usize,
    /// Width of the two hidden layers
    pub hidden_size: usize,
    /// Number of actions the head scores
    pub num_actions: usize,
}

impl QNetworkConfig {
    /// Default hyperparameters: 11 → 256 → 256 → 3
    pub fn new() -> Self {
        Self {
            input_size: OBSERVATION_SIZE,
            hidden_size: 256,
            num_actions: Turn::COUNT,
        }
    }

    /// Initialize the Q-network from this configuration
    pub fn init<B: Backend>(&self, device: &B::Device) -> QNetwork<B> {
        QNetwork {
            linear1: LinearConfig::new(self.input_size, self.hidden_size).init(device),
            linear2: LinearConfig::new(self.hidden_size, self.hidden_size).init(device),
            linear3: LinearConfig::new(self.hidden_size, self.num_actions).init(device),
        }
    }
}

impl Default for QNetworkConfig {
    fn default() -> Self {
        Self::new()
    }
}

/// Feed-forward Q-network mapping observations to per-action values
#[derive(Module, Debug)]
pub struct QNetwork<B: Backend> {
    linear1: Linear<B>,
    linear2: Linear<B>,
    linear3: Linear<B>,
}

impl<B: Backend> QNetwork<B> {
    /// Forward pass: `[batch, 11]` observations to `[batch, 3]` Q-values
    pub fn forward(&self, states: Tensor<B, 2>) -> Tensor<B, 2> {
        let x = relu(self.linear1.forward(states));
        let x = relu(self.linear2.forward(x));
        self.linear3.forward(x)
    }
}

/// Configuration for the actor-critic network
#[derive(Debug, Clone)]
pub struct ActorCriticConfig {
    /// Number of input features
    pub input_size: usize,
    /// Width of the shared trunk layers
    pub hidden_size: usize,
    /// Number of actions the policy head scores
    pub num_actions: usize,
}

impl ActorCriticConfig {
    /// Default hyperparameters: 11 → 256 → 256 trunk, 3-way policy head
    pub fn new() -> Self {
        Self {
            input_size: OBSERVATION_SIZE,
            hidden_size: 256,
            num_actions: Turn::COUNT,
        }
    }

    /// Initialize the actor-critic network from this configuration
    pub fn init<B: Backend>(&self, device: &B::Device) -> ActorCriticNetwork<B> {
        ActorCriticNetwork {
            fc1: LinearConfig::new(self.input_size, self.hidden_size).init(device),
            fc2: LinearConfig::new(self.hidden_size, self.hidden_size).init(device),
            actor: LinearConfig::new(self.hidden_size, self.num_actions).init(device),
            critic: LinearConfig::new(self.hidden_size, 1).init(device),
        }
    }
}

impl Default for ActorCriticConfig {
    fn default() -> Self {
        Self::new()
    }
}

/// Two-headed network sharing a trunk between policy and value
#[derive(Module, Debug)]
pub struct ActorCriticNetwork<B: Backend> {
    fc1: Linear<B>,
    fc2: Linear<B>,
    /// Policy head: outputs action logits
    actor: Linear<B>,
    /// Value head: outputs the state-value estimate
    critic: Linear<B>,
}

impl<B: Backend> ActorCriticNetwork<B> {
    /// Forward pass through trunk and both heads
    ///
    /// Returns `(action_logits, value)` with shapes `[batch, 3]` and
    /// `[batch, 1]`.
    pub fn forward(&self, states: Tensor<B, 2>) -> (Tensor<B, 2>, Tensor<B, 2>) {
        let x = relu(self.fc1.forward(states));
        let x = relu(self.fc2.forward(x));

        let action_logits = self.actor.forward(x.clone());
        let value = self.critic.forward(x);

        (action_logits, value)
    }
}
