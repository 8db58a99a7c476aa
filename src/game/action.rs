use super::GameError;
use serde::{Deserialize, Serialize};

/// Absolute heading on the grid
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Direction {
    Right,
    Down,
    Left,
    Up,
}

/// The single rotation table shared by movement resolution and the danger
/// lookups in the observation encoder. "Right turn" advances one step in this
/// order, "left turn" goes one step back.
pub const CLOCKWISE: [Direction; 4] = [
    Direction::Right,
    Direction::Down,
    Direction::Left,
    Direction::Up,
];

impl Direction {
    /// Returns the delta (dx, dy) for moving one cell in this direction
    pub fn delta(&self) -> (i32, i32) {
        match self {
            Direction::Right => (1, 0),
            Direction::Down => (0, 1),
            Direction::Left => (-1, 0),
            Direction::Up => (0, -1),
        }
    }

    fn clockwise_index(&self) -> usize {
        CLOCKWISE
            .iter()
            .position(|d| d == self)
            .expect("direction is in the rotation table")
    }

    /// The heading after a single clockwise (right) turn
    pub fn clockwise(&self) -> Direction {
        CLOCKWISE[(self.clockwise_index() + 1) % 4]
    }

    /// The heading after a single counter-clockwise (left) turn
    pub fn counter_clockwise(&self) -> Direction {
        CLOCKWISE[(self.clockwise_index() + 3) % 4]
    }
}

/// Action relative to the snake's current heading
///
/// Agents never emit absolute compass directions; the three relative turns
/// are the whole action space.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Turn {
    Straight,
    Right,
    Left,
}

impl Turn {
    /// Number of actions in the action space
    pub const COUNT: usize = 3;

    /// Resolve the new heading from this turn and the current heading
    pub fn apply(&self, heading: Direction) -> Direction {
        match self {
            Turn::Straight => heading,
            Turn::Right => heading.clockwise(),
            Turn::Left => heading.counter_clockwise(),
        }
    }

    /// Index of this turn in the one-hot encoding [straight, right, left]
    pub fn index(&self) -> usize {
        match self {
            Turn::Straight => 0,
            Turn::Right => 1,
            Turn::Left => 2,
        }
    }

    /// Turn corresponding to an action index
    pub fn from_index(index: usize) -> Result<Turn, GameError> {
        match index {
            0 => Ok(Turn::Straight),
            1 => Ok(Turn::Right),
            2 => Ok(Turn::Left),
            _ => Err(GameError::InvalidAction(vec![index as f32])),
        }
    }

    /// Decode a strict one-hot action vector
    ///
    /// Exactly one entry must be 1.0 and the other two 0.0; anything else is
    /// an `InvalidAction` error rather than a silent default.
    pub fn from_one_hot(encoding: &[f32]) -> Result<Turn, GameError> {
        if encoding.len() != Self::COUNT {
            return Err(GameError::InvalidAction(encoding.to_vec()));
        }

        let mut hot = None;
        for (i, &v) in encoding.iter().enumerate() {
            if v == 1.0 {
                if hot.is_some() {
                    return Err(GameError::InvalidAction(encoding.to_vec()));
                }
                hot = Some(i);
            } else if v != 0.0 {
                return Err(GameError::InvalidAction(encoding.to_vec()));
            }
        }

        match hot {
            Some(i) => Turn::from_index(i),
            None => Err(GameError::InvalidAction(encoding.to_vec())),
        }
    }

    /// One-hot encoding of this turn
    pub fn to_one_hot(&self) -> [f32; 3] {
        let mut encoding = [0.0; 3];
        encoding[self.index()] = 1.0;
        encoding
    }
}
