use anyhow::Result;
use clap::{Parser, ValueEnum};
use snake_rl::game::{Difficulty, GameConfig, RewardProfile};
use snake_rl::modes::{MultiTrainConfig, MultiTrainMode, TrainConfig, TrainMode};
use snake_rl::rl::{
    default_device, A3cAgent, A3cConfig, DqnAgent, DqnConfig, Policy, PpoAgent, PpoConfig,
    TrainingBackend,
};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "snake_rl")]
#[command(version, about = "Train RL agents on the Snake game")]
struct Cli {
    /// Training algorithm
    #[arg(long, default_value = "dqn")]
    algorithm: Algorithm,

    /// Number of training episodes
    #[arg(long, default_value = "1000")]
    episodes: usize,

    /// Difficulty preset (easy, medium, hard) selecting the board size
    #[arg(long, default_value = "medium")]
    difficulty: Difficulty,

    /// Reward profile (default, encouraging, strict, shaped)
    #[arg(long, default_value = "default")]
    reward_profile: RewardProfile,

    /// Number of agents sharing the board; above 1 trains one policy each
    #[arg(long, default_value = "1")]
    agents: usize,

    /// Path to save the trained model
    #[arg(long, default_value = "models/snake.mpk")]
    model_path: PathBuf,

    /// Resume from an existing checkpoint at the model path
    #[arg(long)]
    resume: bool,

    /// Seed for the environment and exploration RNGs
    #[arg(long)]
    seed: Option<u64>,

    /// Save a checkpoint every N episodes
    #[arg(long, default_value = "1000")]
    checkpoint_frequency: usize,

    /// Log progress every N episodes
    #[arg(long, default_value = "100")]
    log_frequency: usize,
}

#[derive(Clone, Copy, ValueEnum)]
enum Algorithm {
    /// Deep Q-learning with experience replay
    Dqn,
    /// Proximal policy optimization
    Ppo,
    /// Single-worker advantage actor-critic
    A3c,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    let game_config = GameConfig::from_profiles(cli.difficulty, cli.reward_profile);
    let device = default_device();

    match cli.algorithm {
        Algorithm::Dqn => {
            let make = |seed: Option<u64>| -> Result<DqnAgent<TrainingBackend>> {
                match seed {
                    Some(s) => DqnAgent::with_seed(DqnConfig::default(), device.clone(), s),
                    None => DqnAgent::new(DqnConfig::default(), device.clone()),
                }
            };
            run(&cli, game_config, make)
        }
        Algorithm::Ppo => {
            let make = |seed: Option<u64>| -> Result<PpoAgent<TrainingBackend>> {
                match seed {
                    Some(s) => PpoAgent::with_seed(PpoConfig::default(), device.clone(), s),
                    None => PpoAgent::new(PpoConfig::default(), device.clone()),
                }
            };
            run(&cli, game_config, make)
        }
        Algorithm::A3c => {
            let make = |seed: Option<u64>| -> Result<A3cAgent<TrainingBackend>> {
                match seed {
                    Some(s) => A3cAgent::with_seed(A3cConfig::default(), device.clone(), s),
                    None => A3cAgent::new(A3cConfig::default(), device.clone()),
                }
            };
            run(&cli, game_config, make)
        }
    }
}

/// Build the policies and dispatch to the right training mode
fn run<P, F>(cli: &Cli, game_config: GameConfig, make_policy: F) -> Result<()>
where
    P: Policy,
    F: Fn(Option<u64>) -> Result<P>,
{
    if cli.agents <= 1 {
        let mut policy = make_policy(cli.seed)?;
        if cli.resume {
            policy.load(&cli.model_path)?;
        }

        let config = TrainConfig {
            num_episodes: cli.episodes,
            save_path: cli.model_path.clone(),
            checkpoint_frequency: cli.checkpoint_frequency,
            log_frequency: cli.log_frequency,
            game_config,
            seed: cli.seed,
        };

        TrainMode::new(config, policy)?.run()
    } else {
        let mut policies = Vec::with_capacity(cli.agents);
        for i in 0..cli.agents {
            // Offset seeds so agents explore differently
            policies.push(make_policy(cli.seed.map(|s| s + i as u64))?);
        }

        let config = MultiTrainConfig {
            num_episodes: cli.episodes,
            save_path: cli.model_path.clone(),
            checkpoint_frequency: cli.checkpoint_frequency,
            log_frequency: cli.log_frequency,
            game_config,
            seed: cli.seed,
        };

        MultiTrainMode::new(config, policies)?.run()
    }
}
