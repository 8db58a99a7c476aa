//! Compact 11-feature observation encoding
//!
//! Every agent sees the same egocentric feature vector regardless of board
//! size:
//!
//! ```text
//! [0..3)  danger flags, relative: straight, right, left
//! [3..7)  heading one-hot, absolute: left, right, up, down
//! [7..11) food flags, absolute: left, right, up, down
//! ```
//!
//! Danger flags reuse the engine's own danger predicate, so the encoding can
//! never disagree with the collision rules. All features are 0.0 or 1.0.
//!
//! # Example
//!
//! ```rust
//! use snake_rl::game::{GameConfig, GameEngine};
//! use snake_rl::rl::observation::{observe_state, OBSERVATION_SIZE};
//!
//! let engine = GameEngine::with_seed(GameConfig::new(20, 20), 0).unwrap();
//! let obs = observe_state(engine.state());
//! assert_eq!(obs.as_slice().len(), OBSERVATION_SIZE);
//! ```

use crate::game::{GameState, Position, Snake};
use burn::tensor::{backend::Backend, Tensor, TensorData};

/// Number of features in the observation vector
pub const OBSERVATION_SIZE: usize = 11;

/// One encoded observation
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Observation(pub [f32; OBSERVATION_SIZE]);

impl Observation {
    pub fn as_slice(&self) -> &[f32] {
        &self.0
    }

    /// Convert to a `[1, 11]` tensor for a single forward pass
    pub fn to_tensor<B: Backend>(&self, device: &B::Device) -> Tensor<B, 2> {
        let data = TensorData::new(self.0.to_vec(), [1, OBSERVATION_SIZE]);
        Tensor::from_data(data, device)
    }
}

/// Stack observations into a `[batch, 11]` tensor
pub fn batch_to_tensor<B: Backend>(
    observations: &[Observation],
    device: &B::Device,
) -> Tensor<B, 2> {
    let batch = observations.len();
    let mut flat = Vec::with_capacity(batch * OBSERVATION_SIZE);
    for obs in observations {
        flat.extend_from_slice(&obs.0);
    }
    Tensor::from_data(TensorData::new(flat, [batch, OBSERVATION_SIZE]), device)
}

/// Encode the observation for a snake chasing `food`
///
/// `danger` is the predicate deciding whether a cell would end the episode.
/// The single-agent engine passes its own state check; the multi-agent engine
/// passes a closure that also sees living opponents.
pub fn observe<F: Fn(Position) -> bool>(snake: &Snake, food: Position, danger: F) -> Observation {
    let head = snake.head();
    let heading = snake.direction;

    let ahead = head.moved_in_direction(heading);
    let right_of = head.moved_in_direction(heading.clockwise());
    let left_of = head.moved_in_direction(heading.counter_clockwise());

    let flag = |b: bool| if b { 1.0 } else { 0.0 };

    Observation([
        // Danger flags relative to the heading
        flag(danger(ahead)),
        flag(danger(right_of)),
        flag(danger(left_of)),
        // Heading one-hot: left, right, up, down
        flag(heading == crate::game::Direction::Left),
        flag(heading == crate::game::Direction::Right),
        flag(heading == crate::game::Direction::Up),
        flag(heading == crate::game::Direction::Down),
        // Food flags in absolute board coordinates
        flag(food.x < head.x),
        flag(food.x > head.x),
        flag(food.y < head.y),
        flag(food.y > head.y),
    ])
}

/// Encode the observation for a single-agent game state
pub fn observe_state(state: &GameState) -> Observation {
    observe(&state.snake, state.food, |pos| state.is_danger(pos))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::{Direction, GameState, Position, Snake};
    use crate::rl::InferenceBackend;
    use burn::backend::ndarray::NdArrayDevice;

    fn state_with(head: Position, direction: Direction, food: Position) -> GameState {
        GameState::new(Snake::new(head, direction, 3), food, 20, 20)
    }

    #[test]
    fn test_all_features_are_binary() {
        let state = state_with(Position::new(10, 10), Direction::Right, Position::new(3, 17));
        let obs = observe_state(&state);
        for &v in obs.as_slice() {
            assert!(v == 0.0 || v == 1.0);
        }
    }

    #[test]
    fn test_heading_one_hot() {
        let cases = [
            (Direction::Left, 3),
            (Direction::Right, 4),
            (Direction::Up, 5),
            (Direction::Down, 6),
        ];
        for (dir, hot_idx) in cases {
            let state = state_with(Position::new(10, 10), dir, Position::new(0, 0));
            let obs = observe_state(&state);
            for idx in 3..7 {
                assert_eq!(obs.0[idx], if idx == hot_idx { 1.0 } else { 0.0 });
            }
        }
    }

    #[test]
    fn test_food_flags_follow_board_axes() {
        // Food up-left of the head
        let state = state_with(Position::new(10, 10), Direction::Right, Position::new(4, 2));
        let obs = observe_state(&state);
        assert_eq!(&obs.0[7..11], &[1.0, 0.0, 1.0, 0.0]);

        // Food down-right of the head
        let state = state_with(Position::new(10, 10), Direction::Right, Position::new(15, 15));
        let obs = observe_state(&state);
        assert_eq!(&obs.0[7..11], &[0.0, 1.0, 0.0, 1.0]);

        // Food exactly at the head leaves all four flags clear
        let state = state_with(Position::new(10, 10), Direction::Right, Position::new(10, 10));
        let obs = observe_state(&state);
        assert_eq!(&obs.0[7..11], &[0.0, 0.0, 0.0, 0.0]);
    }

    #[test]
    fn test_danger_flags_rotate_with_heading() {
        // Head against the right wall heading right: straight is the wall
        let state = state_with(Position::new(19, 10), Direction::Right, Position::new(0, 0));
        let obs = observe_state(&state);
        assert_eq!(obs.0[0], 1.0); // straight
        assert_eq!(obs.0[1], 0.0); // right (down, in bounds)
        assert_eq!(obs.0[2], 0.0); // left (up, in bounds)

        // Same wall cell heading up: the wall is now to the right
        let state = state_with(Position::new(19, 10), Direction::Up, Position::new(0, 0));
        let obs = observe_state(&state);
        assert_eq!(obs.0[0], 0.0);
        assert_eq!(obs.0[1], 1.0);
        assert_eq!(obs.0[2], 0.0);
    }

    #[test]
    fn test_own_body_is_danger() {
        // U-shaped snake with a body cell directly ahead of the head
        let mut snake = Snake::new(Position::new(10, 10), Direction::Up, 3);
        snake.body = vec![
            Position::new(10, 10),
            Position::new(10, 11),
            Position::new(11, 11),
            Position::new(11, 10),
            Position::new(11, 9),
            Position::new(10, 9),
        ];
        let state = GameState::new(snake, Position::new(0, 0), 20, 20);
        let obs = observe_state(&state);
        assert_eq!(obs.0[0], 1.0); // cell (10, 9) ahead is body
    }

    #[test]
    fn test_tensor_shapes() {
        let device = NdArrayDevice::default();
        let state = state_with(Position::new(10, 10), Direction::Right, Position::new(3, 3));
        let obs = observe_state(&state);

        let single = obs.to_tensor::<InferenceBackend>(&device);
        assert_eq!(single.dims(), [1, OBSERVATION_SIZE]);

        let batch = batch_to_tensor::<InferenceBackend>(&[obs, obs, obs], &device);
        assert_eq!(batch.dims(), [3, OBSERVATION_SIZE]);
    }
}
