use super::{
    action::Turn,
    config::GameConfig,
    state::{CollisionType, GameState, Position, Snake},
    Direction, GameError,
};
use rand::{rngs::StdRng, Rng, SeedableRng};

/// Result of one simulation tick
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StepOutcome {
    /// Reward for this step (for RL training)
    pub reward: f32,
    /// Whether the episode has terminated
    pub done: bool,
    /// Score after the step
    pub score: u32,
    /// Type of collision if one ended the episode
    pub collision: Option<CollisionType>,
}

/// The single-agent game engine
///
/// Owns the game state and the food-placement RNG. Given identical state and
/// action, `step` is deterministic except for food re-placement, which draws
/// only from the engine's own seedable RNG.
pub struct GameEngine {
    config: GameConfig,
    state: GameState,
    rng: StdRng,
}

impl GameEngine {
    /// Create a new engine with entropy-seeded food placement
    pub fn new(config: GameConfig) -> Result<Self, GameError> {
        Self::from_rng(config, StdRng::from_entropy())
    }

    /// Create a new engine with a fixed seed for reproducible food placement
    pub fn with_seed(config: GameConfig, seed: u64) -> Result<Self, GameError> {
        Self::from_rng(config, StdRng::seed_from_u64(seed))
    }

    fn from_rng(config: GameConfig, mut rng: StdRng) -> Result<Self, GameError> {
        let state = Self::initial_state(&config, &mut rng)?;
        Ok(Self { config, state, rng })
    }

    fn initial_state(config: &GameConfig, rng: &mut StdRng) -> Result<GameState, GameError> {
        let center = Position::new(
            (config.grid_width / 2) as i32,
            (config.grid_height / 2) as i32,
        );
        let snake = Snake::new(center, Direction::Right, config.initial_snake_length);
        let food = place_food(
            rng,
            config.grid_width,
            config.grid_height,
            |pos| snake.occupies(pos),
        )?;

        Ok(GameState::new(
            snake,
            food,
            config.grid_width,
            config.grid_height,
        ))
    }

    /// Reset to a fresh 3-segment snake centered on the board heading right,
    /// with food at a random empty cell and zeroed score and frame counter
    pub fn reset(&mut self) -> Result<&GameState, GameError> {
        self.state = Self::initial_state(&self.config, &mut self.rng)?;
        Ok(&self.state)
    }

    /// Current game state (read-only; rendering collaborators use this)
    pub fn state(&self) -> &GameState {
        &self.state
    }

    /// Engine configuration
    pub fn config(&self) -> &GameConfig {
        &self.config
    }

    /// Advance the simulation one tick with a relative action
    ///
    /// Resolves the new heading via the shared rotation table, moves the head
    /// one cell, then checks termination, food capture, and the frame-count
    /// safety cutoff (`frame_count > 100 × body length`).
    pub fn step(&mut self, turn: Turn) -> Result<StepOutcome, GameError> {
        if self.state.snake.is_empty() {
            return Err(GameError::Consistency(
                "stepping a snake with no body".to_string(),
            ));
        }
        if !self.state.is_alive {
            // Stepping a finished episode is a no-op tick
            return Ok(StepOutcome {
                reward: 0.0,
                done: true,
                score: self.state.score,
                collision: None,
            });
        }

        self.state.frame_count += 1;

        let rewards = self.config.rewards;
        let old_food_distance = self.state.snake.head().manhattan_distance(self.state.food);

        // Resolve heading and tentatively insert the new head; the tail is
        // popped later unless the snake grows or dies this tick.
        let new_heading = turn.apply(self.state.snake.direction);
        self.state.snake.direction = new_heading;
        let new_head = self.state.snake.head().moved_in_direction(new_heading);
        self.state.snake.body.insert(0, new_head);

        let collision = self.check_collision(new_head);
        let cutoff = self.state.frame_count > 100 * self.state.snake.len() as u32;
        if collision.is_some() || cutoff {
            self.state.is_alive = false;
            return Ok(StepOutcome {
                reward: rewards.death_penalty,
                done: true,
                score: self.state.score,
                collision,
            });
        }

        let mut reward;
        if new_head == self.state.food {
            self.state.score += 1;
            reward = rewards.food_reward;
            if rewards.closer_to_food_reward != 0.0 {
                reward += rewards.closer_to_food_reward;
            }
            // Growth: tail retained, food re-placed on an empty cell
            let snake = &self.state.snake;
            self.state.food = place_food(
                &mut self.rng,
                self.config.grid_width,
                self.config.grid_height,
                |pos| snake.occupies(pos),
            )?;
        } else {
            self.state.snake.body.pop();
            reward = rewards.step_penalty;
            if rewards.closer_to_food_reward != 0.0 {
                let new_food_distance = new_head.manhattan_distance(self.state.food);
                if new_food_distance < old_food_distance {
                    reward += rewards.closer_to_food_reward;
                } else {
                    reward -= rewards.closer_to_food_reward;
                }
            }
        }

        Ok(StepOutcome {
            reward,
            done: false,
            score: self.state.score,
            collision: None,
        })
    }

    /// Classify a collision for the just-inserted head position
    ///
    /// The head is compared against `body[1..]`, i.e. the pre-existing body
    /// including the previous head cell.
    fn check_collision(&self, head: Position) -> Option<CollisionType> {
        if !self.state.is_in_bounds(head) {
            return Some(CollisionType::Wall);
        }
        if self.state.snake.collides_with_body(head) {
            return Some(CollisionType::SelfCollision);
        }
        None
    }
}

/// Place food at a uniformly random empty cell via rejection sampling
///
/// `occupied` covers every cell a snake body claims. Fails with a
/// `Consistency` error if no empty cell exists.
pub(crate) fn place_food<F: Fn(Position) -> bool>(
    rng: &mut StdRng,
    grid_width: usize,
    grid_height: usize,
    occupied: F,
) -> Result<Position, GameError> {
    let cells = grid_width * grid_height;
    let free = (0..cells).any(|i| {
        !occupied(Position::new(
            (i % grid_width) as i32,
            (i / grid_width) as i32,
        ))
    });
    if !free {
        return Err(GameError::Consistency(
            "no empty cell left for food placement".to_string(),
        ));
    }

    loop {
        let pos = Position::new(
            rng.gen_range(0..grid_width) as i32,
            rng.gen_range(0..grid_height) as i32,
        );
        if !occupied(pos) {
            return Ok(pos);
        }
    }
}
