use super::{
    action::Turn,
    config::{CutoffScale, GameConfig},
    engine::{place_food, StepOutcome},
    state::{CollisionType, Position, Snake},
    Direction, GameError,
};
use rand::{rngs::StdRng, Rng, SeedableRng};

/// Per-agent state on a shared board
#[derive(Debug, Clone)]
pub struct AgentState {
    pub snake: Snake,
    /// Each agent chases its own food item
    pub food: Position,
    pub score: u32,
    pub alive: bool,
}

/// Attempts at finding a free interior cell for an extra agent before the
/// board is declared too crowded
const SPAWN_ATTEMPTS: usize = 1000;

/// Spawn corners for the first four agents: top-left heading right,
/// bottom-right heading left, top-right heading down, bottom-left heading up.
/// Insets keep the initial bodies clear of the walls and of each other on
/// full-size boards; `reset_to` rejects boards where they collide anyway.
fn corner_spawns(width: i32, height: i32) -> [(Position, Direction); 4] {
    [
        (Position::new(5, 5), Direction::Right),
        (Position::new(width - 8, height - 5), Direction::Left),
        (Position::new(width - 8, 5), Direction::Down),
        (Position::new(5, height - 5), Direction::Up),
    ]
}

/// Engine for several independent snakes sharing one board
///
/// Every agent has its own snake, food, and score; the frame counter is
/// shared. Agents die on walls, their own body, or any living opponent's
/// body, and a dead agent's body immediately stops being an obstacle.
pub struct MultiAgentEngine {
    config: GameConfig,
    agents: Vec<AgentState>,
    frame_count: u32,
    rng: StdRng,
}

impl MultiAgentEngine {
    /// Create an engine for `num_agents` snakes with entropy-seeded RNG
    pub fn new(config: GameConfig, num_agents: usize) -> Result<Self, GameError> {
        Self::from_rng(config, num_agents, StdRng::from_entropy())
    }

    /// Create an engine with a fixed seed for reproducible spawns and food
    pub fn with_seed(config: GameConfig, num_agents: usize, seed: u64) -> Result<Self, GameError> {
        Self::from_rng(config, num_agents, StdRng::seed_from_u64(seed))
    }

    fn from_rng(config: GameConfig, num_agents: usize, rng: StdRng) -> Result<Self, GameError> {
        if num_agents == 0 {
            return Err(GameError::Consistency(
                "multi-agent board needs at least one agent".to_string(),
            ));
        }
        let mut engine = Self {
            config,
            agents: Vec::new(),
            frame_count: 0,
            rng,
        };
        engine.reset_to(num_agents)?;
        Ok(engine)
    }

    /// Respawn every agent at its corner and re-place all food
    pub fn reset(&mut self) -> Result<(), GameError> {
        self.reset_to(self.agents.len())
    }

    fn reset_to(&mut self, num_agents: usize) -> Result<(), GameError> {
        self.frame_count = 0;
        self.agents.clear();

        let width = self.config.grid_width as i32;
        let height = self.config.grid_height as i32;
        let length = self.config.initial_snake_length;
        let corners = corner_spawns(width, height);

        for i in 0..num_agents {
            let snake = if i < corners.len() {
                let (head, direction) = corners[i];
                let snake = Snake::new(head, direction, length);
                if !self.spawn_fits(&snake) {
                    return Err(GameError::Consistency(format!(
                        "{}x{} board is too small to spawn agent {}",
                        width, height, i
                    )));
                }
                snake
            } else {
                self.random_spawn(width, height, length)?
            };
            self.agents.push(AgentState {
                snake,
                food: Position::new(0, 0),
                score: 0,
                alive: true,
            });
        }

        for i in 0..num_agents {
            self.place_food_for(i)?;
        }
        Ok(())
    }

    /// Whether a freshly spawned snake lies fully on the board without
    /// touching any already-placed agent
    fn spawn_fits(&self, snake: &Snake) -> bool {
        snake.body.iter().all(|&pos| {
            self.is_in_bounds(pos) && !self.agents.iter().any(|a| a.snake.occupies(pos))
        })
    }

    /// Spawn an extra agent at a random interior cell with a random heading
    ///
    /// Rejects candidate spawns overlapping existing bodies. Fails with a
    /// `Consistency` error when the interior is too small to sample from or
    /// no free spawn is found within the attempt limit.
    fn random_spawn(&mut self, width: i32, height: i32, length: usize) -> Result<Snake, GameError> {
        if width <= 10 || height <= 10 {
            return Err(GameError::Consistency(format!(
                "{}x{} board has no interior to spawn extra agents in",
                width, height
            )));
        }

        for _ in 0..SPAWN_ATTEMPTS {
            let head = Position::new(
                self.rng.gen_range(5..width - 5),
                self.rng.gen_range(5..height - 5),
            );
            let direction = super::action::CLOCKWISE[self.rng.gen_range(0..4)];
            let snake = Snake::new(head, direction, length);
            if self.spawn_fits(&snake) {
                return Ok(snake);
            }
        }
        Err(GameError::Consistency(
            "no free spawn cell left for an extra agent".to_string(),
        ))
    }

    /// Re-place food for one agent, avoiding every snake body on the board
    fn place_food_for(&mut self, agent_idx: usize) -> Result<(), GameError> {
        let agents = &self.agents;
        let food = place_food(
            &mut self.rng,
            self.config.grid_width,
            self.config.grid_height,
            |pos| agents.iter().any(|a| a.snake.occupies(pos)),
        )?;
        self.agents[agent_idx].food = food;
        Ok(())
    }

    /// Advance every agent one tick
    ///
    /// Takes one turn per agent in agent order; dead agents are skipped and
    /// report a zero-reward done outcome. The shared frame counter feeds the
    /// safety cutoff `frame_count > 100 × body length × multiplier`, where
    /// the multiplier follows the configured [`CutoffScale`].
    pub fn step(&mut self, turns: &[Turn]) -> Result<Vec<StepOutcome>, GameError> {
        if turns.len() != self.agents.len() {
            return Err(GameError::Consistency(format!(
                "expected {} actions, got {}",
                self.agents.len(),
                turns.len()
            )));
        }

        self.frame_count += 1;
        let cutoff_multiplier = match self.config.cutoff_scale {
            CutoffScale::PerAgent => 1,
            CutoffScale::Total => self.agents.len() as u32,
        };

        let mut outcomes = Vec::with_capacity(self.agents.len());
        for (i, &turn) in turns.iter().enumerate() {
            if !self.agents[i].alive {
                outcomes.push(StepOutcome {
                    reward: 0.0,
                    done: true,
                    score: self.agents[i].score,
                    collision: None,
                });
                continue;
            }

            let agent = &mut self.agents[i];
            let new_heading = turn.apply(agent.snake.direction);
            agent.snake.direction = new_heading;
            let new_head = agent.snake.head().moved_in_direction(new_heading);
            agent.snake.body.insert(0, new_head);

            let collision = self.collision_at(i, new_head);
            let cutoff =
                self.frame_count > 100 * self.agents[i].snake.len() as u32 * cutoff_multiplier;
            if collision.is_some() || cutoff {
                let agent = &mut self.agents[i];
                agent.alive = false;
                outcomes.push(StepOutcome {
                    reward: self.config.rewards.death_penalty,
                    done: true,
                    score: agent.score,
                    collision,
                });
                continue;
            }

            if new_head == self.agents[i].food {
                self.agents[i].score += 1;
                self.place_food_for(i)?;
                outcomes.push(StepOutcome {
                    reward: self.config.rewards.food_reward,
                    done: false,
                    score: self.agents[i].score,
                    collision: None,
                });
            } else {
                let agent = &mut self.agents[i];
                agent.snake.body.pop();
                outcomes.push(StepOutcome {
                    reward: self.config.rewards.step_penalty,
                    done: false,
                    score: agent.score,
                    collision: None,
                });
            }
        }

        Ok(outcomes)
    }

    /// Classify a collision for an agent's just-inserted head
    fn collision_at(&self, agent_idx: usize, head: Position) -> Option<CollisionType> {
        if !self.is_in_bounds(head) {
            return Some(CollisionType::Wall);
        }
        if self.agents[agent_idx].snake.collides_with_body(head) {
            return Some(CollisionType::SelfCollision);
        }
        for (i, other) in self.agents.iter().enumerate() {
            if i != agent_idx && other.alive && other.snake.occupies(head) {
                return Some(CollisionType::OtherSnake);
            }
        }
        None
    }

    /// Whether a cell would end this agent's episode, opponents included
    ///
    /// This is the danger predicate the per-agent observation encoder uses.
    pub fn is_danger(&self, agent_idx: usize, pos: Position) -> bool {
        if !self.is_in_bounds(pos) {
            return true;
        }
        if self.agents[agent_idx].snake.collides_with_body(pos) {
            return true;
        }
        self.agents
            .iter()
            .enumerate()
            .any(|(i, other)| i != agent_idx && other.alive && other.snake.occupies(pos))
    }

    fn is_in_bounds(&self, pos: Position) -> bool {
        pos.x >= 0
            && pos.x < self.config.grid_width as i32
            && pos.y >= 0
            && pos.y < self.config.grid_height as i32
    }

    pub fn config(&self) -> &GameConfig {
        &self.config
    }

    pub fn agents(&self) -> &[AgentState] {
        &self.agents
    }

    pub fn agent(&self, idx: usize) -> &AgentState {
        &self.agents[idx]
    }

    pub fn frame_count(&self) -> u32 {
        self.frame_count
    }

    /// Whether every agent has died
    pub fn all_done(&self) -> bool {
        self.agents.iter().all(|a| !a.alive)
    }

    /// Number of agents still alive
    pub fn alive_count(&self) -> usize {
        self.agents.iter().filter(|a| a.alive).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::Difficulty;

    fn engine(num_agents: usize) -> MultiAgentEngine {
        let (w, h) = Difficulty::Medium.grid_size();
        MultiAgentEngine::with_seed(GameConfig::new(w, h), num_agents, 11).unwrap()
    }

    #[test]
    fn test_corner_spawns() {
        let eng = engine(4);
        let agents = eng.agents();

        assert_eq!(agents.len(), 4);
        assert_eq!(agents[0].snake.head(), Position::new(5, 5));
        assert_eq!(agents[0].snake.direction, Direction::Right);
        assert_eq!(agents[1].snake.direction, Direction::Left);
        assert_eq!(agents[2].snake.direction, Direction::Down);
        assert_eq!(agents[3].snake.direction, Direction::Up);
        for a in agents {
            assert!(a.alive);
            assert_eq!(a.score, 0);
            assert_eq!(a.snake.len(), 3);
        }
    }

    #[test]
    fn test_food_avoids_every_snake() {
        let eng = engine(4);
        for a in eng.agents() {
            for other in eng.agents() {
                assert!(!other.snake.occupies(a.food));
            }
        }
    }

    #[test]
    fn test_zero_agents_rejected() {
        let result = MultiAgentEngine::with_seed(GameConfig::default(), 0, 1);
        assert!(matches!(result, Err(GameError::Consistency(_))));
    }

    #[test]
    fn test_small_board_rejects_overlapping_corner_spawns() {
        // On a 10x10 board the top-left and bottom-right spawn bodies cross
        // at (3,5)/(4,5), so two agents cannot be hosted.
        let result = MultiAgentEngine::with_seed(GameConfig::small(), 2, 1);
        assert!(matches!(result, Err(GameError::Consistency(_))));
    }

    #[test]
    fn test_small_board_rejects_extra_agents() {
        // A board with no interior beyond the spawn insets must error out
        // instead of sampling from an empty range.
        let result = MultiAgentEngine::with_seed(GameConfig::small(), 5, 1);
        assert!(matches!(result, Err(GameError::Consistency(_))));
    }

    #[test]
    fn test_spawned_bodies_never_overlap() {
        let (w, h) = Difficulty::Easy.grid_size();
        let eng = MultiAgentEngine::with_seed(GameConfig::new(w, h), 6, 11).unwrap();

        let agents = eng.agents();
        assert_eq!(agents.len(), 6);
        for (i, a) in agents.iter().enumerate() {
            for &pos in &a.snake.body {
                assert!(pos.x >= 0 && pos.x < w as i32);
                assert!(pos.y >= 0 && pos.y < h as i32);
                for (j, b) in agents.iter().enumerate() {
                    if i != j {
                        assert!(!b.snake.occupies(pos), "agents {} and {} overlap", i, j);
                    }
                }
            }
        }
    }

    #[test]
    fn test_action_count_must_match() {
        let mut eng = engine(2);
        assert!(matches!(
            eng.step(&[Turn::Straight]),
            Err(GameError::Consistency(_))
        ));
    }

    #[test]
    fn test_independent_outcomes_per_agent() {
        let mut eng = engine(2);
        let outcomes = eng.step(&[Turn::Straight, Turn::Straight]).unwrap();

        assert_eq!(outcomes.len(), 2);
        assert!(!outcomes[0].done);
        assert!(!outcomes[1].done);
        assert_eq!(eng.frame_count(), 1);
    }

    #[test]
    fn test_dead_agent_reports_noop_and_stops_blocking() {
        let mut eng = engine(2);
        eng.agents[1].alive = false;

        let body_cell = eng.agents[1].snake.head();
        assert!(!eng.is_danger(0, body_cell));

        let outcomes = eng.step(&[Turn::Straight, Turn::Straight]).unwrap();
        assert_eq!(outcomes[1].reward, 0.0);
        assert!(outcomes[1].done);
        assert!(!eng.all_done());
        assert_eq!(eng.alive_count(), 1);
    }

    #[test]
    fn test_cross_agent_collision() {
        let mut eng = engine(2);
        // Park agent 1 directly in agent 0's path
        eng.agents[1].snake = Snake::new(
            eng.agents[0].snake.head().moved_in_direction(Direction::Right),
            Direction::Up,
            3,
        );

        let outcomes = eng.step(&[Turn::Straight, Turn::Straight]).unwrap();
        assert!(outcomes[0].done);
        assert_eq!(outcomes[0].collision, Some(CollisionType::OtherSnake));
        assert_eq!(outcomes[0].reward, eng.config().rewards.death_penalty);
    }

    #[test]
    fn test_danger_includes_living_opponents() {
        let eng = engine(2);
        let opponent_head = eng.agents()[1].snake.head();
        assert!(eng.is_danger(0, opponent_head));
        assert!(!eng.is_danger(1, opponent_head));
    }

    #[test]
    fn test_cutoff_scales_with_agent_count() {
        let mut eng = engine(2);
        // Total scaling: 3-segment snakes on a 2-agent board cut off past 600
        eng.frame_count = 600;
        eng.agents[1].alive = false;

        let outcomes = eng.step(&[Turn::Right, Turn::Straight]).unwrap();
        assert!(outcomes[0].done);
        assert_eq!(outcomes[0].reward, eng.config().rewards.death_penalty);
    }

    #[test]
    fn test_all_done_after_everyone_dies() {
        let mut eng = engine(2);
        for a in &mut eng.agents {
            a.alive = false;
        }
        assert!(eng.all_done());
        assert_eq!(eng.alive_count(), 0);
    }
}
