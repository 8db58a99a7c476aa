//! Multi-agent training mode
//!
//! Trains one independent policy per snake on a shared board. Each agent has
//! its own experience and its own checkpoint file; an episode ends when every
//! snake has died.

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};

use crate::game::{GameConfig, MultiAgentEngine, Turn};
use crate::metrics::TrainingStats;
use crate::rl::observation::{observe, Observation};
use crate::rl::Policy;

/// Configuration for multi-agent training
#[derive(Debug, Clone)]
pub struct MultiTrainConfig {
    /// Number of episodes to train
    pub num_episodes: usize,

    /// Base save path; per-agent files get an `_agentN` suffix
    pub save_path: PathBuf,

    /// Save checkpoints every N episodes
    pub checkpoint_frequency: usize,

    /// Log training progress every N episodes
    pub log_frequency: usize,

    /// Game configuration shared by all agents
    pub game_config: GameConfig,

    /// Seed for the environment RNG; `None` draws from entropy
    pub seed: Option<u64>,
}

impl MultiTrainConfig {
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

/// Derive the per-agent variant of a save path
fn agent_path(base: &Path, agent_idx: usize) -> PathBuf {
    let stem = base
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "model".to_string());
    let name = match base.extension() {
        Some(ext) => format!("{}_agent{}.{}", stem, agent_idx, ext.to_string_lossy()),
        None => format!("{}_agent{}", stem, agent_idx),
    };
    base.with_file_name(name)
}

/// Multi-agent training mode: one policy per snake
pub struct MultiTrainMode<P: Policy> {
    policies: Vec<P>,
    engine: MultiAgentEngine,
    stats: Vec<TrainingStats>,
    config: MultiTrainConfig,
}

impl<P: Policy> MultiTrainMode<P> {
    /// Create a training mode with one policy per agent
    pub fn new(config: MultiTrainConfig, policies: Vec<P>) -> Result<Self> {
        anyhow::ensure!(!policies.is_empty(), "need at least one policy");

        let num_agents = policies.len();
        let engine = match config.seed {
            Some(seed) => {
                MultiAgentEngine::with_seed(config.game_config.clone(), num_agents, seed)
            }
            None => MultiAgentEngine::new(config.game_config.clone(), num_agents),
        }
        .context("Failed to create multi-agent engine")?;

        let stats = (0..num_agents).map(|_| TrainingStats::new(100)).collect();

        Ok(Self {
            policies,
            engine,
            stats,
            config,
        })
    }

    /// Run the training loop
    pub fn run(&mut self) -> Result<()> {
        self.print_header();

        for episode in 0..self.config.num_episodes {
            let results = self.run_episode()?;

            for (i, (reward, steps, score)) in results.iter().enumerate() {
                if let Some(loss) = self.policies[i].update() {
                    self.stats[i].record_loss(loss);
                }
                let new_record = self.stats[i].record_episode(*reward, *steps, *score);
                if new_record {
                    self.policies[i]
                        .save(&agent_path(&self.config.save_path, i))
                        .context("Failed to save record model")?;
                }
            }

            if (episode + 1) % self.config.log_frequency == 0 {
                self.print_progress(episode + 1);
            }

            if (episode + 1) % self.config.checkpoint_frequency == 0 {
                self.save_all()?;
            }
        }

        self.save_all()?;

        println!("\nMulti-agent training complete!");
        for (i, stats) in self.stats.iter().enumerate() {
            println!("Agent {}: {}", i, stats.format_summary());
        }

        Ok(())
    }

    /// Observation for one agent, with opponents folded into the danger flags
    fn observe_agent(&self, agent_idx: usize) -> Observation {
        let agent = self.engine.agent(agent_idx);
        observe(&agent.snake, agent.food, |pos| {
            self.engine.is_danger(agent_idx, pos)
        })
    }

    /// Run one shared-board episode
    ///
    /// Returns `(reward, steps, score)` per agent. The episode ends when
    /// every snake has died.
    fn run_episode(&mut self) -> Result<Vec<(f32, usize, u32)>> {
        self.engine.reset()?;
        let num_agents = self.policies.len();

        let mut rewards = vec![0.0; num_agents];
        let mut steps = vec![0usize; num_agents];
        let mut scores = vec![0u32; num_agents];

        while !self.engine.all_done() {
            // Snapshot liveness and observations before the tick so each
            // recorded transition pairs the state the action was chosen in
            let alive_before: Vec<bool> =
                (0..num_agents).map(|i| self.engine.agent(i).alive).collect();
            let observations: Vec<Observation> =
                (0..num_agents).map(|i| self.observe_agent(i)).collect();

            let mut turns = Vec::with_capacity(num_agents);
            for i in 0..num_agents {
                if alive_before[i] {
                    let encoding = self.policies[i].select_action(&observations[i], true);
                    turns.push(Turn::from_one_hot(&encoding)?);
                } else {
                    turns.push(Turn::Straight);
                }
            }

            let outcomes = self.engine.step(&turns)?;

            for i in 0..num_agents {
                if !alive_before[i] {
                    continue;
                }
                let next_obs = self.observe_agent(i);
                self.policies[i].record(
                    observations[i],
                    turns[i],
                    outcomes[i].reward,
                    next_obs,
                    outcomes[i].done,
                );
                rewards[i] += outcomes[i].reward;
                steps[i] += 1;
                scores[i] = outcomes[i].score;
            }
        }

        Ok((0..num_agents)
            .map(|i| (rewards[i], steps[i], scores[i]))
            .collect())
    }

    fn save_all(&self) -> Result<()> {
        for (i, policy) in self.policies.iter().enumerate() {
            let path = agent_path(&self.config.save_path, i);
            policy
                .save(&path)
                .with_context(|| format!("Failed to save model to {:?}", path))?;
        }
        Ok(())
    }

    fn print_header(&self) {
        println!("{}", "=".repeat(70));
        println!(
            "{} Multi-Agent Training - Snake RL ({} agents)",
            self.policies[0].name().to_uppercase(),
            self.policies.len()
        );
        println!("{}", "=".repeat(70));
        println!("Episodes: {}", self.config.num_episodes);
        println!(
            "Game Config: {}x{} grid",
            self.config.game_config.grid_width, self.config.game_config.grid_height
        );
        println!("Save path: {:?}", self.config.save_path);
        println!("{}", "=".repeat(70));
        println!();
    }

    fn print_progress(&self, episode: usize) {
        for (i, stats) in self.stats.iter().enumerate() {
            println!(
                "[Episode {}/{}] Agent {}: {}",
                episode,
                self.config.num_episodes,
                i,
                stats.format_summary()
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::Difficulty;
    use crate::rl::{default_device, DqnAgent, DqnConfig, TrainingBackend};
    use tempfile::TempDir;

    fn test_policies(n: usize) -> Vec<DqnAgent<TrainingBackend>> {
        (0..n)
            .map(|i| {
                let config = DqnConfig {
                    batch_size: 8,
                    ..Default::default()
                };
                DqnAgent::with_seed(config, default_device(), i as u64).unwrap()
            })
            .collect()
    }

    #[test]
    fn test_agent_path_suffixing() {
        assert_eq!(
            agent_path(Path::new("models/multi.mpk"), 0),
            PathBuf::from("models/multi_agent0.mpk")
        );
        assert_eq!(
            agent_path(Path::new("multi"), 2),
            PathBuf::from("multi_agent2")
        );
    }

    #[test]
    fn test_rejects_empty_policy_list() {
        let config = MultiTrainConfig::new(1, PathBuf::from("x.mpk"));
        let result = MultiTrainMode::<DqnAgent<TrainingBackend>>::new(config, vec![]);
        assert!(result.is_err());
    }

    #[test]
    fn test_run_episode_reports_per_agent() {
        let temp_dir = TempDir::new().unwrap();
        let mut config = MultiTrainConfig::new(1, temp_dir.path().join("multi.mpk"));
        let (w, h) = Difficulty::Medium.grid_size();
        config.game_config = GameConfig::new(w, h);
        config.seed = Some(4);

        let mut mode = MultiTrainMode::new(config, test_policies(2)).unwrap();
        let results = mode.run_episode().unwrap();

        assert_eq!(results.len(), 2);
        for (_, steps, _) in &results {
            assert!(*steps > 0);
        }
        assert!(mode.engine.all_done());
    }
}
