//! Single-agent training mode
//!
//! Runs the episode loop for any [`Policy`]: observe, act, step, record,
//! then an end-of-episode update. The best-scoring model is saved whenever
//! a new record is set, plus periodic checkpoints and a final save.
//!
//! # Example
//!
//! ```rust,ignore
//! use snake_rl::game::GameConfig;
//! use snake_rl::modes::{TrainConfig, TrainMode};
//! use snake_rl::rl::{default_device, DqnAgent, DqnConfig, TrainingBackend};
//! use std::path::PathBuf;
//!
//! let config = TrainConfig::new(1000, PathBuf::from("models/dqn.mpk"));
//! let agent = DqnAgent::<TrainingBackend>::new(DqnConfig::default(), default_device())?;
//! let mut mode = TrainMode::new(config, agent)?;
//! mode.run()?;
//! ```

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};

use crate::game::{GameConfig, GameEngine, Turn};
use crate::metrics::TrainingStats;
use crate::rl::observation::observe_state;
use crate::rl::Policy;

/// Configuration for training mode
#[derive(Debug, Clone)]
pub struct TrainConfig {
    /// Number of episodes to train
    pub num_episodes: usize,

    /// Path for the best model and the final save
    pub save_path: PathBuf,

    /// Save a checkpoint every N episodes
    pub checkpoint_frequency: usize,

    /// Log training progress every N episodes
    pub log_frequency: usize,

    /// Game configuration (grid size, rewards)
    pub game_config: GameConfig,

    /// Seed for the environment RNG; `None` draws from entropy
    pub seed: Option<u64>,
}

impl TrainConfig {
    /// Create a training configuration with default frequencies
    pub fn new(num_episodes: usize, save_path: PathBuf) -> Self {
        Self {
            num_episodes,
            save_path,
            checkpoint_frequency: 1000,
            log_frequency: 100,
            game_config: GameConfig::default(),
            seed: None,
        }
    }
}

/// Training mode driving one policy against one engine
pub struct TrainMode<P: Policy> {
    policy: P,
    engine: GameEngine,
    stats: TrainingStats,
    config: TrainConfig,
}

impl<P: Policy> TrainMode<P> {
    /// Create a training mode for a policy
    pub fn new(config: TrainConfig, policy: P) -> Result<Self> {
        let engine = match config.seed {
            Some(seed) => GameEngine::with_seed(config.game_config.clone(), seed),
            None => GameEngine::new(config.game_config.clone()),
        }
        .context("Failed to create game engine")?;

        Ok(Self {
            policy,
            engine,
            stats: TrainingStats::new(100),
            config,
        })
    }

    /// Run the training loop
    pub fn run(&mut self) -> Result<()> {
        self.print_header();

        for episode in 0..self.config.num_episodes {
            let (episode_reward, episode_steps, episode_score) = self.run_episode()?;

            if let Some(loss) = self.policy.update() {
                self.stats.record_loss(loss);
            }

            let new_record =
                self.stats
                    .record_episode(episode_reward, episode_steps, episode_score);

            // Save whenever a new best score is set
            if new_record {
                self.save_model()?;
            }

            if (episode + 1) % self.config.log_frequency == 0 {
                self.print_progress(episode + 1);
            }

            if (episode + 1) % self.config.checkpoint_frequency == 0 {
                self.save_checkpoint(episode + 1)?;
            }
        }

        self.save_model()?;

        println!("\nTraining complete!");
        println!("Final model saved to: {:?}", self.config.save_path);
        println!("\nFinal Statistics:");
        println!("{}", self.stats.format_summary());

        Ok(())
    }

    /// Run a single training episode
    ///
    /// Returns the total reward, step count, and final score.
    fn run_episode(&mut self) -> Result<(f32, usize, u32)> {
        self.engine.reset()?;
        let mut obs = observe_state(self.engine.state());
        let mut episode_reward = 0.0;
        let mut episode_steps = 0;

        loop {
            let encoding = self.policy.select_action(&obs, true);
            let turn = Turn::from_one_hot(&encoding)?;

            let outcome = self.engine.step(turn)?;
            let next_obs = observe_state(self.engine.state());

            self.policy
                .record(obs, turn, outcome.reward, next_obs, outcome.done);

            episode_reward += outcome.reward;
            episode_steps += 1;
            obs = next_obs;

            if outcome.done {
                return Ok((episode_reward, episode_steps, outcome.score));
            }
        }
    }

    fn save_checkpoint(&self, episode: usize) -> Result<()> {
        let checkpoint_path = self
            .config
            .save_path
            .parent()
            .unwrap_or(Path::new("."))
            .join(format!("checkpoint_ep{}.mpk", episode));

        self.policy
            .save(&checkpoint_path)
            .with_context(|| format!("Failed to save checkpoint to {:?}", checkpoint_path))?;

        println!("  Checkpoint saved: {:?}", checkpoint_path);
        Ok(())
    }

    fn save_model(&self) -> Result<()> {
        self.policy
            .save(&self.config.save_path)
            .with_context(|| format!("Failed to save model to {:?}", self.config.save_path))
    }

    fn print_header(&self) {
        println!("{}", "=".repeat(70));
        println!("{} Training - Snake RL", self.policy.name().to_uppercase());
        println!("{}", "=".repeat(70));
        println!("Episodes: {}", self.config.num_episodes);
        println!(
            "Game Config: {}x{} grid",
            self.config.game_config.grid_width, self.config.game_config.grid_height
        );
        println!(
            "Rewards: food {} / death {} / step {} / shaping {}",
            self.config.game_config.rewards.food_reward,
            self.config.game_config.rewards.death_penalty,
            self.config.game_config.rewards.step_penalty,
            self.config.game_config.rewards.closer_to_food_reward,
        );
        println!(
            "Checkpoints: Every {} episodes",
            self.config.checkpoint_frequency
        );
        println!("Logging: Every {} episodes", self.config.log_frequency);
        println!("Save path: {:?}", self.config.save_path);
        println!("{}", "=".repeat(70));
        println!();
    }

    fn print_progress(&self, episode: usize) {
        println!(
            "[Episode {}/{}] {}",
            episode,
            self.config.num_episodes,
            self.stats.format_summary()
        );
    }
}
