//! Single-worker advantage actor-critic trainer
//!
//! The simplest of the three trainers: one gradient step per episode over the
//! whole episode trace. Returns are plain discounted sums (the trace covers a
//! single episode, so no terminal reset is needed), advantages detach the
//! critic, and the value head trains on a mean-squared-error toward the
//! returns.

use super::{
    agent::Policy,
    memory::{EpisodeMemory, EpisodeStep, ExperienceStore},
    network::{ActorCriticConfig, ActorCriticNetwork},
    observation::{batch_to_tensor, Observation},
    persistence::{load_module, save_module, ModelMetadata},
};
use crate::game::Turn;
use anyhow::Result;
use burn::{
    module::AutodiffModule,
    optim::{adaptor::OptimizerAdaptor, Adam, AdamConfig, GradientsParams, Optimizer},
    tensor::{
        activation::{log_softmax, softmax},
        backend::AutodiffBackend,
        ElementConversion, Int, Tensor, TensorData,
    },
};
use rand::{rngs::StdRng, Rng, SeedableRng};
use std::path::Path;
use tracing::warn;

/// A3C hyperparameters
#[derive(Debug, Clone)]
pub struct A3cConfig {
    /// Adam learning rate
    pub learning_rate: f64,
    /// Discount factor
    pub gamma: f32,
    /// Weight of the value loss in the total
    pub value_coef: f32,
}

impl Default for A3cConfig {
    fn default() -> Self {
        Self {
            learning_rate: 1e-3,
            gamma: 0.99,
            value_coef: 0.5,
        }
    }
}

impl A3cConfig {
    /// Validate hyperparameter ranges
    pub fn validate(&self) -> Result<()> {
        anyhow::ensure!(self.learning_rate > 0.0, "learning_rate must be positive");
        anyhow::ensure!(
            (0.0..=1.0).contains(&self.gamma),
            "gamma must be in [0, 1]"
        );
        anyhow::ensure!(self.value_coef >= 0.0, "value_coef must be non-negative");
        Ok(())
    }
}

/// Plain discounted returns over one episode trace
fn episode_returns(rewards: &[f32], gamma: f32) -> Vec<f32> {
    let mut returns = vec![0.0; rewards.len()];
    let mut running = 0.0;
    for i in (0..rewards.len()).rev() {
        running = rewards[i] + gamma * running;
        returns[i] = running;
    }
    returns
}

/// Single-worker A3C agent over the shared actor-critic network
pub struct A3cAgent<B: AutodiffBackend> {
    network: ActorCriticNetwork<B>,
    optim: OptimizerAdaptor<Adam, ActorCriticNetwork<B>, B>,
    config: A3cConfig,
    memory: EpisodeMemory,
    episodes_trained: usize,
    rng: StdRng,
    device: B::Device,
}

impl<B: AutodiffBackend> A3cAgent<B> {
    /// Create a new agent with freshly initialized weights
    pub fn new(config: A3cConfig, device: B::Device) -> Result<Self> {
        Self::with_rng(config, device, StdRng::from_entropy())
    }

    /// Create an agent with a seeded sampling RNG
    pub fn with_seed(config: A3cConfig, device: B::Device, seed: u64) -> Result<Self> {
        Self::with_rng(config, device, StdRng::seed_from_u64(seed))
    }

    fn with_rng(config: A3cConfig, device: B::Device, rng: StdRng) -> Result<Self> {
        config.validate()?;
        let network = ActorCriticConfig::new().init(&device);
        let optim = AdamConfig::new().init();

        Ok(Self {
            network,
            optim,
            config,
            memory: EpisodeMemory::new(),
            episodes_trained: 0,
            rng,
            device,
        })
    }

    /// Action probabilities for one observation, gradient-free
    fn action_probs(&self, observation: &Observation) -> Vec<f32> {
        let network = self.network.clone().valid();
        let states = observation.to_tensor::<B::InnerBackend>(&self.device);
        let (logits, _) = network.forward(states);
        softmax(logits, 1)
            .into_data()
            .to_vec()
            .expect("probability tensor converts to vec")
    }
}

impl<B: AutodiffBackend> Policy for A3cAgent<B> {
    fn select_action(&mut self, observation: &Observation, training: bool) -> [f32; 3] {
        let probs = self.action_probs(observation);

        let index = if training {
            let threshold: f32 = self.rng.gen();
            let mut cumulative = 0.0;
            let mut picked = probs.len() - 1;
            for (idx, &p) in probs.iter().enumerate() {
                cumulative += p;
                if threshold < cumulative {
                    picked = idx;
                    break;
                }
            }
            picked
        } else {
            probs
                .iter()
                .enumerate()
                .max_by(|a, b| a.1.total_cmp(b.1))
                .map(|(i, _)| i)
                .unwrap_or(0)
        };

        let mut encoding = [0.0; 3];
        encoding[index] = 1.0;
        encoding
    }

    fn record(
        &mut self,
        state: Observation,
        action: Turn,
        reward: f32,
        _next_state: Observation,
        _done: bool,
    ) {
        self.memory.record(EpisodeStep {
            state,
            action: action.index(),
            reward,
        });
    }

    fn update(&mut self) -> Option<f32> {
        self.episodes_trained += 1;

        let steps = self.memory.drain();
        if steps.is_empty() {
            return None;
        }
        let n = steps.len();

        let rewards: Vec<f32> = steps.iter().map(|s| s.reward).collect();
        let returns = episode_returns(&rewards, self.config.gamma);

        let states: Vec<Observation> = steps.iter().map(|s| s.state).collect();
        let actions: Vec<i64> = steps.iter().map(|s| s.action as i64).collect();

        let states = batch_to_tensor::<B>(&states, &self.device);
        let actions: Tensor<B, 1, Int> =
            Tensor::from_data(TensorData::new(actions, [n]), &self.device);
        let returns: Tensor<B, 1> =
            Tensor::from_data(TensorData::new(returns, [n]), &self.device);

        let (action_logits, values) = self.network.forward(states);
        let values = values.squeeze::<1>(1);

        let log_probs = log_softmax(action_logits, 1)
            .gather(1, actions.unsqueeze_dim(1))
            .squeeze::<1>(1);

        // Advantages detach the critic so the actor term only moves the policy
        let advantages = returns.clone() - values.clone().detach();
        let actor_loss = (log_probs * advantages).neg().mean();

        let diff = values - returns;
        let critic_loss = (diff.clone() * diff).mean();

        let total_loss = actor_loss + critic_loss * self.config.value_coef;

        let loss_value = total_loss.clone().into_scalar().elem::<f32>();
        if !loss_value.is_finite() {
            warn!(loss = loss_value, "skipping optimizer step on non-finite loss");
            return None;
        }

        let grads = GradientsParams::from_grads(total_loss.backward(), &self.network);
        self.network = self
            .optim
            .step(self.config.learning_rate, self.network.clone(), grads);

        Some(loss_value)
    }

    fn episodes_trained(&self) -> usize {
        self.episodes_trained
    }

    fn save(&self, path: &Path) -> Result<()> {
        let metadata = ModelMetadata::new(self.name(), self.episodes_trained);
        save_module(self.network.clone(), &metadata, path)
    }

    fn load(&mut self, path: &Path) -> Result<()> {
        match load_module(self.network.clone(), path, &self.device) {
            Ok((network, metadata)) => {
                self.network = network;
                self.episodes_trained = metadata.episodes_trained;
                Ok(())
            }
            Err(err) => {
                warn!(?path, %err, "could not load checkpoint, starting fresh");
                Ok(())
            }
        }
    }

    fn name(&self) -> &'static str {
        "a3c"
    }
}
