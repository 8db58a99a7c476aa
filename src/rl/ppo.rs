//! PPO (Proximal Policy Optimization) trainer
//!
//! On-policy trainer over whole-episode rollouts:
//! - actions are sampled from the policy distribution during training and the
//!   behavior log prob is stored with each step
//! - at update time, discounted returns are computed backwards with a reset
//!   at terminal steps, then normalized
//! - the clipped surrogate objective runs for `k_epochs` passes over the
//!   rollout, with a value loss and an entropy bonus folded into the total

use super::{
    agent::Policy,
    memory::{ExperienceStore, PolicyStep, RolloutMemory},
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

/// PPO hyperparameters
#[derive(Debug, Clone)]
pub struct PpoConfig {
    /// Adam learning rate
    pub learning_rate: f64,
    /// Discount factor
    pub gamma: f32,
    /// Clip range for the probability ratio
    pub clip_epsilon: f32,
    /// Number of optimization passes over each rollout
    pub k_epochs: usize,
    /// Weight of the value loss in the total
    pub value_coef: f32,
    /// Weight of the entropy bonus in the total
    pub entropy_coef: f32,
}

impl Default for PpoConfig {
    fn default() -> Self {
        Self {
            learning_rate: 3e-4,
            gamma: 0.99,
            clip_epsilon: 0.2,
            k_epochs: 4,
            value_coef: 0.5,
            entropy_coef: 0.01,
        }
    }
}

impl PpoConfig {
    /// Validate hyperparameter ranges
    pub fn validate(&self) -> Result<()> {
        anyhow::ensure!(self.learning_rate > 0.0, "learning_rate must be positive");
        anyhow::ensure!(
            (0.0..=1.0).contains(&self.gamma),
            "gamma must be in [0, 1]"
        );
        anyhow::ensure!(self.clip_epsilon > 0.0, "clip_epsilon must be positive");
        anyhow::ensure!(self.k_epochs > 0, "k_epochs must be positive");
        anyhow::ensure!(self.value_coef >= 0.0, "value_coef must be non-negative");
        anyhow::ensure!(
            self.entropy_coef >= 0.0,
            "entropy_coef must be non-negative"
        );
        Ok(())
    }
}

/// Discounted returns with a reset at each terminal step
pub(crate) fn discounted_returns(rewards: &[f32], dones: &[bool], gamma: f32) -> Vec<f32> {
    let mut returns = vec![0.0; rewards.len()];
    let mut running = 0.0;
    for i in (0..rewards.len()).rev() {
        if dones[i] {
            running = 0.0;
        }
        running = rewards[i] + gamma * running;
        returns[i] = running;
    }
    returns
}

/// Normalize in place to zero mean and unit variance
///
/// Uses the sample standard deviation with a small epsilon so constant
/// return vectors map to zeros instead of dividing by zero.
pub(crate) fn normalize(values: &mut [f32]) {
    let n = values.len();
    if n == 0 {
        return;
    }
    let mean = values.iter().sum::<f32>() / n as f32;
    let variance = if n > 1 {
        values.iter().map(|v| (v - mean).powi(2)).sum::<f32>() / (n - 1) as f32
    } else {
        0.0
    };
    let std = variance.sqrt() + 1e-7;
    for v in values.iter_mut() {
        *v = (*v - mean) / std;
    }
}

/// Sample an index from a categorical distribution given its probabilities
fn sample_categorical<R: Rng>(probs: &[f32], rng: &mut R) -> usize {
    let threshold: f32 = rng.gen();
    let mut cumulative = 0.0;
    for (idx, &p) in probs.iter().enumerate() {
        cumulative += p;
        if threshold < cumulative {
            return idx;
        }
    }
    probs.len() - 1
}

/// PPO agent over the shared actor-critic network
pub struct PpoAgent<B: AutodiffBackend> {
    network: ActorCriticNetwork<B>,
    optim: OptimizerAdaptor<Adam, ActorCriticNetwork<B>, B>,
    config: PpoConfig,
    memory: RolloutMemory,
    /// Behavior log prob of the most recently sampled action, consumed by
    /// the next `record` call
    last_log_prob: f32,
    episodes_trained: usize,
    rng: StdRng,
    device: B::Device,
}

impl<B: AutodiffBackend> PpoAgent<B> {
    /// Create a new agent with freshly initialized weights
    pub fn new(config: PpoConfig, device: B::Device) -> Result<Self> {
        Self::with_rng(config, device, StdRng::from_entropy())
    }

    /// Create an agent with a seeded sampling RNG
    pub fn with_seed(config: PpoConfig, device: B::Device, seed: u64) -> Result<Self> {
        Self::with_rng(config, device, StdRng::seed_from_u64(seed))
    }

    fn with_rng(config: PpoConfig, device: B::Device, rng: StdRng) -> Result<Self> {
        config.validate()?;
        let network = ActorCriticConfig::new().init(&device);
        let optim = AdamConfig::new().init();

        Ok(Self {
            network,
            optim,
            config,
            memory: RolloutMemory::new(),
            last_log_prob: 0.0,
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

    /// The clipped surrogate objective and the policy entropy
    ///
    /// Returns `(policy_loss, entropy)` as scalar tensors.
    fn compute_policy_loss(
        &self,
        action_logits: &Tensor<B, 2>,
        actions: &Tensor<B, 1, Int>,
        old_log_probs: &Tensor<B, 1>,
        advantages: &Tensor<B, 1>,
    ) -> (Tensor<B, 1>, Tensor<B, 1>) {
        let log_probs = log_softmax(action_logits.clone(), 1);
        let new_log_probs = log_probs
            .gather(1, actions.clone().unsqueeze_dim(1))
            .squeeze::<1>(1);

        // r = exp(log pi_new - log pi_old)
        let ratio = (new_log_probs - old_log_probs.clone()).exp();

        let surr1 = ratio.clone() * advantages.clone();
        let surr2 = ratio.clamp(
            1.0 - self.config.clip_epsilon,
            1.0 + self.config.clip_epsilon,
        ) * advantages.clone();

        let policy_loss = surr1.min_pair(surr2).neg().mean();

        let probs = softmax(action_logits.clone(), 1);
        let log_probs_all = log_softmax(action_logits.clone(), 1);
        let entropy = (probs * log_probs_all).sum_dim(1).neg().mean();

        (policy_loss, entropy)
    }
}

impl<B: AutodiffBackend> Policy for PpoAgent<B> {
    fn select_action(&mut self, observation: &Observation, training: bool) -> [f32; 3] {
        let probs = self.action_probs(observation);

        let index = if training {
            let index = sample_categorical(&probs, &mut self.rng);
            self.last_log_prob = probs[index].max(f32::MIN_POSITIVE).ln();
            index
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
        done: bool,
    ) {
        self.memory.record(PolicyStep {
            state,
            action: action.index(),
            log_prob: self.last_log_prob,
            reward,
            done,
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
        let dones: Vec<bool> = steps.iter().map(|s| s.done).collect();
        let mut returns = discounted_returns(&rewards, &dones, self.config.gamma);
        normalize(&mut returns);

        let states: Vec<Observation> = steps.iter().map(|s| s.state).collect();
        let actions: Vec<i64> = steps.iter().map(|s| s.action as i64).collect();
        let old_log_probs: Vec<f32> = steps.iter().map(|s| s.log_prob).collect();

        let states = batch_to_tensor::<B>(&states, &self.device);
        let actions: Tensor<B, 1, Int> =
            Tensor::from_data(TensorData::new(actions, [n]), &self.device);
        let old_log_probs: Tensor<B, 1> =
            Tensor::from_data(TensorData::new(old_log_probs, [n]), &self.device);
        let returns: Tensor<B, 1> =
            Tensor::from_data(TensorData::new(returns, [n]), &self.device);

        let mut last_loss = 0.0;
        for _ in 0..self.config.k_epochs {
            let (action_logits, values) = self.network.forward(states.clone());
            let values = values.squeeze::<1>(1);

            // Advantages use the detached critic so only the returns drive it
            let advantages = returns.clone() - values.clone().detach();

            let (policy_loss, entropy) = self.compute_policy_loss(
                &action_logits,
                &actions,
                &old_log_probs,
                &advantages,
            );

            let diff = values - returns.clone();
            let value_loss = (diff.clone() * diff).mean();

            let total_loss = policy_loss + value_loss * self.config.value_coef
                - entropy * self.config.entropy_coef;

            let loss_value = total_loss.clone().into_scalar().elem::<f32>();
            if !loss_value.is_finite() {
                warn!(loss = loss_value, "skipping optimizer step on non-finite loss");
                return None;
            }
            last_loss = loss_value;

            let grads = GradientsParams::from_grads(total_loss.backward(), &self.network);
            self.network = self
                .optim
                .step(self.config.learning_rate, self.network.clone(), grads);
        }

        Some(last_loss)
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
        "ppo"
    }
}
