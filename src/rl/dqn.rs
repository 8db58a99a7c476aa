//! DQN trainer with experience replay
//!
//! Classic deep Q-learning over the compact observation vector:
//! - epsilon-greedy exploration with a linear decay over episodes
//! - a short update on every recorded transition
//! - a replay update over a sampled minibatch at episode end
//!
//! There is no separate target network; bootstrap targets come from the
//! current network evaluated without gradients, matching the small scale of
//! this environment.

use super::{
    agent::Policy,
    memory::{ExperienceStore, ReplayBuffer, Transition},
    network::{QNetwork, QNetworkConfig},
    observation::{batch_to_tensor, Observation},
    persistence::{load_module, save_module, ModelMetadata},
};
use crate::game::Turn;
use anyhow::Result;
use burn::{
    module::AutodiffModule,
    optim::{adaptor::OptimizerAdaptor, Adam, AdamConfig, GradientsParams, Optimizer},
    tensor::{backend::AutodiffBackend, ElementConversion, Int, Tensor, TensorData},
};
use rand::{rngs::StdRng, Rng, SeedableRng};
use std::path::Path;
use tracing::warn;

/// DQN hyperparameters
#[derive(Debug, Clone)]
pub struct DqnConfig {
    /// Adam learning rate
    pub learning_rate: f64,
    /// Discount factor
    pub gamma: f32,
    /// Replay minibatch size
    pub batch_size: usize,
    /// Replay buffer capacity
    pub memory_capacity: usize,
    /// Starting exploration threshold; effective epsilon is
    /// `max(epsilon_start - episodes, epsilon_floor)` out of 200
    pub epsilon_start: f32,
    /// Exploration floor
    pub epsilon_floor: f32,
}

impl Default for DqnConfig {
    fn default() -> Self {
        Self {
            learning_rate: 1e-3,
            gamma: 0.9,
            batch_size: 1000,
            memory_capacity: 100_000,
            epsilon_start: 80.0,
            epsilon_floor: 0.0,
        }
    }
}

impl DqnConfig {
    /// Validate hyperparameter ranges
    pub fn validate(&self) -> Result<()> {
        anyhow::ensure!(self.learning_rate > 0.0, "learning_rate must be positive");
        anyhow::ensure!(
            (0.0..=1.0).contains(&self.gamma),
            "gamma must be in [0, 1]"
        );
        anyhow::ensure!(self.batch_size > 0, "batch_size must be positive");
        anyhow::ensure!(
            self.memory_capacity >= self.batch_size,
            "memory_capacity must hold at least one batch"
        );
        anyhow::ensure!(
            self.epsilon_floor >= 0.0 && self.epsilon_start >= self.epsilon_floor,
            "epsilon_start must be at least epsilon_floor"
        );
        Ok(())
    }
}

/// Compute the bootstrap Q-targets for a batch
///
/// Terminal transitions get the bare reward; the rest add the discounted max
/// Q-value of the next state.
fn q_targets(batch: &[Transition], max_next_q: &[f32], gamma: f32) -> Vec<f32> {
    batch
        .iter()
        .zip(max_next_q)
        .map(|(t, &next)| {
            if t.done {
                t.reward
            } else {
                t.reward + gamma * next
            }
        })
        .collect()
}

/// Deep Q-learning agent with experience replay
pub struct DqnAgent<B: AutodiffBackend> {
    network: QNetwork<B>,
    optim: OptimizerAdaptor<Adam, QNetwork<B>, B>,
    config: DqnConfig,
    memory: ReplayBuffer,
    episodes_trained: usize,
    rng: StdRng,
    device: B::Device,
}

impl<B: AutodiffBackend> DqnAgent<B> {
    /// Create a new agent with freshly initialized weights
    pub fn new(config: DqnConfig, device: B::Device) -> Result<Self> {
        Self::with_rng(config, device, StdRng::from_entropy())
    }

    /// Create an agent with a seeded exploration RNG
    pub fn with_seed(config: DqnConfig, device: B::Device, seed: u64) -> Result<Self> {
        Self::with_rng(config, device, StdRng::seed_from_u64(seed))
    }

    fn with_rng(config: DqnConfig, device: B::Device, rng: StdRng) -> Result<Self> {
        config.validate()?;
        let network = QNetworkConfig::new().init(&device);
        let optim = AdamConfig::new().init();
        let memory = ReplayBuffer::new(config.memory_capacity);

        Ok(Self {
            network,
            optim,
            config,
            memory,
            episodes_trained: 0,
            rng,
            device,
        })
    }

    /// Current exploration threshold out of 200
    pub fn epsilon(&self) -> f32 {
        (self.config.epsilon_start - self.episodes_trained as f32).max(self.config.epsilon_floor)
    }

    /// Greedy action index for an observation, gradient-free
    fn greedy_action(&self, observation: &Observation) -> usize {
        let network = self.network.clone().valid();
        let states = observation.to_tensor::<B::InnerBackend>(&self.device);
        let q_values = network.forward(states);
        q_values
            .argmax(1)
            .into_scalar()
            .elem::<i64>() as usize
    }

    /// Run one gradient step over a batch of transitions
    ///
    /// Returns the loss, or `None` if the batch was empty or the loss went
    /// non-finite (in which case the optimizer step is skipped).
    fn train_step(&mut self, batch: &[Transition]) -> Option<f32> {
        if batch.is_empty() {
            return None;
        }

        // Bootstrap values from the current network without gradients
        let next_states: Vec<Observation> = batch.iter().map(|t| t.next_state).collect();
        let next_q = self
            .network
            .clone()
            .valid()
            .forward(batch_to_tensor::<B::InnerBackend>(&next_states, &self.device));
        let max_next: Vec<f32> = next_q
            .max_dim(1)
            .squeeze::<1>(1)
            .into_data()
            .to_vec()
            .expect("q-value tensor converts to vec");

        let targets = q_targets(batch, &max_next, self.config.gamma);

        let states: Vec<Observation> = batch.iter().map(|t| t.state).collect();
        let actions: Vec<i64> = batch.iter().map(|t| t.action as i64).collect();
        let n = batch.len();

        let states = batch_to_tensor::<B>(&states, &self.device);
        let actions: Tensor<B, 1, Int> =
            Tensor::from_data(TensorData::new(actions, [n]), &self.device);
        let targets: Tensor<B, 1> =
            Tensor::from_data(TensorData::new(targets, [n]), &self.device);

        // Q-values of the taken actions
        let predicted = self
            .network
            .forward(states)
            .gather(1, actions.unsqueeze_dim(1))
            .squeeze::<1>(1);

        let diff = predicted - targets;
        let loss = (diff.clone() * diff).mean();

        let loss_value = loss.clone().into_scalar().elem::<f32>();
        if !loss_value.is_finite() {
            warn!(loss = loss_value, "skipping optimizer step on non-finite loss");
            return None;
        }

        let grads = GradientsParams::from_grads(loss.backward(), &self.network);
        self.network = self
            .optim
            .step(self.config.learning_rate, self.network.clone(), grads);

        Some(loss_value)
    }
}

impl<B: AutodiffBackend> Policy for DqnAgent<B> {
    fn select_action(&mut self, observation: &Observation, training: bool) -> [f32; 3] {
        let explore = training && (self.rng.gen_range(0..=200) as f32) < self.epsilon();
        let index = if explore {
            self.rng.gen_range(0..Turn::COUNT)
        } else {
            self.greedy_action(observation)
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
        next_state: Observation,
        done: bool,
    ) {
        let transition = Transition {
            state,
            action: action.index(),
            reward,
            next_state,
            done,
        };
        self.memory.record(transition);

        // Short update on the fresh transition
        self.train_step(&[transition]);
    }

    fn update(&mut self) -> Option<f32> {
        self.episodes_trained += 1;

        let batch = self.memory.sample(self.config.batch_size, &mut self.rng);
        self.train_step(&batch)
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
        "dqn"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rl::{default_device, TrainingBackend};

    fn test_agent() -> DqnAgent<TrainingBackend> {
        let config = DqnConfig {
            batch_size: 16,
            ..Default::default()
        };
        DqnAgent::with_seed(config, default_device(), 3).unwrap()
    }

    fn obs(fill: f32) -> Observation {
        Observation([fill; 11])
    }

    #[test]
    fn test_q_targets_terminal_uses_bare_reward() {
        let t = Transition {
            state: obs(0.0),
            action: 0,
            reward: -10.0,
            next_state: obs(0.0),
            done: true,
        };
        let targets = q_targets(&[t], &[99.0], 0.9);
        assert_eq!(targets, vec![-10.0]);
    }

    #[test]
    fn test_q_targets_bootstrap_discounted_max() {
        let t = Transition {
            state: obs(0.0),
            action: 1,
            reward: 10.0,
            next_state: obs(1.0),
            done: false,
        };
        let targets = q_targets(&[t], &[5.0], 0.9);
        assert_eq!(targets, vec![10.0 + 0.9 * 5.0]);
    }

    #[test]
    fn test_config_validation() {
        assert!(DqnConfig::default().validate().is_ok());

        let bad = DqnConfig {
            gamma: 1.5,
            ..Default::default()
        };
        assert!(bad.validate().is_err());

        let bad = DqnConfig {
            memory_capacity: 10,
            batch_size: 100,
            ..Default::default()
        };
        assert!(bad.validate().is_err());
    }

    #[test]
    fn test_epsilon_decays_with_episodes() {
        let mut agent = test_agent();
        assert_eq!(agent.epsilon(), 80.0);

        for _ in 0..30 {
            agent.update();
        }
        assert_eq!(agent.epsilon(), 50.0);

        for _ in 0..100 {
            agent.update();
        }
        assert_eq!(agent.epsilon(), 0.0);
    }

    #[test]
    fn test_select_action_is_one_hot() {
        let mut agent = test_agent();
        for _ in 0..20 {
            let encoding = agent.select_action(&obs(0.5), true);
            assert!(Turn::from_one_hot(&encoding).is_ok());
        }
    }

    #[test]
    fn test_greedy_selection_is_deterministic() {
        let mut agent = test_agent();
        let first = agent.select_action(&obs(0.5), false);
        for _ in 0..5 {
            assert_eq!(agent.select_action(&obs(0.5), false), first);
        }
    }

    #[test]
    fn test_record_and_update_produce_finite_loss() {
        let mut agent = test_agent();
        for i in 0..20 {
            let done = i % 10 == 9;
            agent.record(obs(0.1), Turn::Straight, if done { -10.0 } else { 0.0 }, obs(0.2), done);
        }

        let loss = agent.update();
        assert!(loss.is_some());
        assert!(loss.unwrap().is_finite());
        assert_eq!(agent.episodes_trained(), 1);
    }

    #[test]
    fn test_update_without_experience_trains_nothing() {
        let mut agent = test_agent();
        assert!(agent.update().is_none());
        assert_eq!(agent.episodes_trained(), 1);
    }

    #[test]
    fn test_save_and_load_round_trip() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("dqn.mpk");

        let mut agent = test_agent();
        agent.record(obs(0.1), Turn::Right, 10.0, obs(0.2), false);
        agent.update();
        agent.save(&path).unwrap();

        let mut fresh = test_agent();
        fresh.load(&path).unwrap();
        assert_eq!(fresh.episodes_trained(), 1);

        // Loaded agent acts identically to the saved one
        assert_eq!(
            agent.select_action(&obs(0.5), false),
            fresh.select_action(&obs(0.5), false)
        );
    }

    #[test]
    fn test_load_missing_checkpoint_keeps_fresh_weights() {
        let mut agent = test_agent();
        let result = agent.load(Path::new("/nonexistent/dqn.mpk"));
        assert!(result.is_ok());
        assert_eq!(agent.episodes_trained(), 0);
    }
}
