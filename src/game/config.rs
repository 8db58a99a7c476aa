use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Grid cell size in pixels used by the board presets
///
/// Difficulty presets are specified as pixel boards; the engine works in
/// cells, so preset dimensions divide by this.
const BLOCK_SIZE: usize = 20;

/// Named difficulty level selecting tick speed and board size
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Difficulty {
    /// Slower speed, larger board
    Easy,
    /// Default settings
    Medium,
    /// Faster speed, smaller board
    Hard,
}

impl Difficulty {
    /// Ticks per second for rendering collaborators
    pub fn speed(&self) -> u32 {
        match self {
            Difficulty::Easy => 10,
            Difficulty::Medium => 15,
            Difficulty::Hard => 25,
        }
    }

    /// Board size in cells (width, height)
    pub fn grid_size(&self) -> (usize, usize) {
        let (w, h) = match self {
            Difficulty::Easy => (800, 600),
            Difficulty::Medium => (640, 480),
            Difficulty::Hard => (480, 360),
        };
        (w / BLOCK_SIZE, h / BLOCK_SIZE)
    }
}

impl FromStr for Difficulty {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "easy" => Ok(Difficulty::Easy),
            "medium" => Ok(Difficulty::Medium),
            "hard" => Ok(Difficulty::Hard),
            other => Err(format!(
                "unknown difficulty '{}', expected one of: easy, medium, hard",
                other
            )),
        }
    }
}

/// Reward shaping parameters consumed by the engine
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RewardConfig {
    /// Reward for eating food
    pub food_reward: f32,
    /// Penalty for dying (wall, self, other snake, or safety cutoff)
    pub death_penalty: f32,
    /// Reward for each non-eating, non-terminal step
    pub step_penalty: f32,
    /// Shaping bonus added when the head moves closer to the food
    /// (and subtracted when it moves away); 0 disables shaping
    pub closer_to_food_reward: f32,
}

impl Default for RewardConfig {
    fn default() -> Self {
        RewardProfile::Default.rewards()
    }
}

/// Named reward profile
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RewardProfile {
    /// Standard reward system
    Default,
    /// More rewards, less penalty
    Encouraging,
    /// Harsh penalties, encourages efficiency
    Strict,
    /// Rewards getting closer to food
    Shaped,
}

impl RewardProfile {
    /// The reward parameters for this profile
    pub fn rewards(&self) -> RewardConfig {
        match self {
            RewardProfile::Default => RewardConfig {
                food_reward: 10.0,
                death_penalty: -10.0,
                step_penalty: 0.0,
                closer_to_food_reward: 0.0,
            },
            RewardProfile::Encouraging => RewardConfig {
                food_reward: 20.0,
                death_penalty: -5.0,
                step_penalty: 0.0,
                closer_to_food_reward: 0.1,
            },
            RewardProfile::Strict => RewardConfig {
                food_reward: 10.0,
                death_penalty: -20.0,
                step_penalty: -0.01,
                closer_to_food_reward: 0.0,
            },
            RewardProfile::Shaped => RewardConfig {
                food_reward: 10.0,
                death_penalty: -10.0,
                step_penalty: 0.0,
                closer_to_food_reward: 0.5,
            },
        }
    }
}

impl FromStr for RewardProfile {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "default" => Ok(RewardProfile::Default),
            "encouraging" => Ok(RewardProfile::Encouraging),
            "strict" => Ok(RewardProfile::Strict),
            "shaped" => Ok(RewardProfile::Shaped),
            other => Err(format!(
                "unknown reward profile '{}', expected one of: default, encouraging, strict, shaped",
                other
            )),
        }
    }
}

/// How the frame-count safety cutoff scales on multi-agent boards
///
/// The cutoff fires when `frame_count > 100 × body length × multiplier`.
/// Both readings of the multiplier are selectable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CutoffScale {
    /// Multiplier is 1 regardless of agent count
    PerAgent,
    /// Multiplier is the number of agents sharing the board
    Total,
}

/// Configuration for the game engine
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GameConfig {
    /// Width of the game grid in cells
    pub grid_width: usize,
    /// Height of the game grid in cells
    pub grid_height: usize,
    /// Tick speed, informational for rendering collaborators
    pub speed: u32,
    /// Initial length of the snake
    pub initial_snake_length: usize,
    /// Reward parameters
    pub rewards: RewardConfig,
    /// Safety cutoff scaling for multi-agent boards
    pub cutoff_scale: CutoffScale,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            grid_width: 20,
            grid_height: 20,
            speed: Difficulty::Medium.speed(),
            initial_snake_length: 3,
            rewards: RewardConfig::default(),
            cutoff_scale: CutoffScale::Total,
        }
    }
}

impl GameConfig {
    /// Create a configuration with a custom grid size
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            grid_width: width,
            grid_height: height,
            ..Default::default()
        }
    }

    /// Create a configuration from the named presets
    pub fn from_profiles(difficulty: Difficulty, profile: RewardProfile) -> Self {
        let (grid_width, grid_height) = difficulty.grid_size();
        Self {
            grid_width,
            grid_height,
            speed: difficulty.speed(),
            rewards: profile.rewards(),
            ..Default::default()
        }
    }

    /// Replace the reward parameters
    pub fn with_rewards(mut self, rewards: RewardConfig) -> Self {
        self.rewards = rewards;
        self
    }

    /// Create a small grid for testing
    pub fn small() -> Self {
        Self::new(10, 10)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = GameConfig::default();
        assert_eq!(config.grid_width, 20);
        assert_eq!(config.grid_height, 20);
        assert_eq!(config.initial_snake_length, 3);
        assert_eq!(config.rewards.food_reward, 10.0);
        assert_eq!(config.rewards.death_penalty, -10.0);
    }

    #[test]
    fn test_difficulty_presets() {
        assert_eq!(Difficulty::Easy.grid_size(), (40, 30));
        assert_eq!(Difficulty::Medium.grid_size(), (32, 24));
        assert_eq!(Difficulty::Hard.grid_size(), (24, 18));
        assert_eq!(Difficulty::Hard.speed(), 25);
    }

    #[test]
    fn test_difficulty_names_are_validated() {
        assert_eq!("medium".parse::<Difficulty>().unwrap(), Difficulty::Medium);
        assert_eq!("HARD".parse::<Difficulty>().unwrap(), Difficulty::Hard);
        assert!("impossible".parse::<Difficulty>().is_err());
    }

    #[test]
    fn test_reward_profile_names_are_validated() {
        assert_eq!(
            "encouraging".parse::<RewardProfile>().unwrap(),
            RewardProfile::Encouraging
        );
        assert!("generous".parse::<RewardProfile>().is_err());
    }

    #[test]
    fn test_profile_parameters() {
        let strict = RewardProfile::Strict.rewards();
        assert_eq!(strict.death_penalty, -20.0);
        assert_eq!(strict.step_penalty, -0.01);

        let shaped = RewardProfile::Shaped.rewards();
        assert_eq!(shaped.closer_to_food_reward, 0.5);
    }

    #[test]
    fn test_from_profiles() {
        let config = GameConfig::from_profiles(Difficulty::Easy, RewardProfile::Encouraging);
        assert_eq!(config.grid_width, 40);
        assert_eq!(config.grid_height, 30);
        assert_eq!(config.speed, 10);
        assert_eq!(config.rewards.food_reward, 20.0);
    }
}
