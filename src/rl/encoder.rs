//! Feature encoding of the grid world
//!
//! Features, in order:
//! - liveness flag and head motion delta (`WithMotion` only): `[1, d_row, d_col]`
//! - danger in each direction (up, down, left, right): 1 if the next cell is
//!   outside the grid or on the body, else 0
//! - food direction: `[sign(apple.col - head.col), sign(apple.row - head.row)]`
//!
//! The order is a contract with the Q-network input layer.

use serde::{Deserialize, Serialize};

use crate::game::{Direction, GridWorld, Position};

/// Width and composition of the feature vector
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FeatureLayout {
    /// `[danger(4), food(2)]`
    Compact,
    /// `[liveness, d_row, d_col, danger(4), food(2)]`
    WithMotion,
}

impl FeatureLayout {
    /// Number of features produced by this layout
    pub fn width(&self) -> usize {
        match self {
            FeatureLayout::Compact => 6,
            FeatureLayout::WithMotion => 9,
        }
    }
}

/// Encoded game state fed to the Q-function
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureVector(Vec<f32>);

impl FeatureVector {
    pub fn new(values: Vec<f32>) -> Self {
        Self(values)
    }

    pub fn as_slice(&self) -> &[f32] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Turns a [`GridWorld`] into a [`FeatureVector`]
///
/// Only the motion layout carries state: the head position seen by the last
/// [`encode_for_action`](StateEncoder::encode_for_action) call.
#[derive(Debug, Clone)]
pub struct StateEncoder {
    layout: FeatureLayout,
    previous_head: Option<Position>,
}

impl StateEncoder {
    pub fn new(layout: FeatureLayout) -> Self {
        Self {
            layout,
            previous_head: None,
        }
    }

    pub fn layout(&self) -> FeatureLayout {
        self.layout
    }

    /// Forget the previous head at the start of an episode
    pub fn reset(&mut self) {
        self.previous_head = None;
    }

    /// Encode the state an action is about to be chosen for
    ///
    /// Records the current head so the next encoding sees the move as a delta.
    pub fn encode_for_action(&mut self, world: &GridWorld) -> FeatureVector {
        let features = self.encode(world);
        self.previous_head = Some(world.snake().head());
        features
    }

    /// Encode the state reached after a move, used for the TD target
    pub fn encode_for_target(&self, world: &GridWorld) -> FeatureVector {
        self.encode(world)
    }

    fn encode(&self, world: &GridWorld) -> FeatureVector {
        let head = world.snake().head();
        let mut values = Vec::with_capacity(self.layout.width());

        if self.layout == FeatureLayout::WithMotion {
            // An unknown previous head counts as the origin
            let previous = self.previous_head.unwrap_or(Position::new(0, 0));
            values.push(1.0);
            values.push((head.row - previous.row) as f32);
            values.push((head.col - previous.col) as f32);
        }

        values.extend(danger_vector(world));
        values.extend(food_direction(world));

        FeatureVector(values)
    }
}

/// Danger flag for each direction in action-index order
pub fn danger_vector(world: &GridWorld) -> [f32; 4] {
    let head = world.snake().head();
    Direction::ALL.map(|direction| {
        if world.is_danger(head.moved_in_direction(direction)) {
            1.0
        } else {
            0.0
        }
    })
}

/// Horizontal then vertical sign of the apple relative to the head
pub fn food_direction(world: &GridWorld) -> [f32; 2] {
    let head = world.snake().head();
    let apple = world.apple();
    [
        (apple.col - head.col).signum() as f32,
        (apple.row - head.row).signum() as f32,
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::{GameConfig, GameState, Snake};

    fn world_at(segments: Vec<Position>, apple: Position) -> GridWorld {
        let snake = Snake::from_segments(segments).unwrap();
        GridWorld::with_state(GameConfig::default(), GameState::new(snake, apple), Some(0))
    }

    #[test]
    fn test_layout_lengths() {
        assert_eq!(FeatureLayout::Compact.width(), 6);
        assert_eq!(FeatureLayout::WithMotion.width(), 9);
    }

    #[test]
    fn test_compact_encoding() {
        let world = world_at(vec![Position::new(0, 0)], Position::new(7, 7));
        let mut encoder = StateEncoder::new(FeatureLayout::Compact);

        let features = encoder.encode_for_action(&world);

        // up and left are walls, apple is right and below
        assert_eq!(features.as_slice(), &[1.0, 0.0, 1.0, 0.0, 1.0, 1.0]);
    }

    #[test]
    fn test_danger_includes_body() {
        let world = world_at(
            vec![
                Position::new(5, 5),
                Position::new(5, 6),
                Position::new(6, 6),
                Position::new(6, 5),
            ],
            Position::new(2, 2),
        );

        assert_eq!(danger_vector(&world), [0.0, 1.0, 0.0, 1.0]);
    }

    #[test]
    fn test_food_direction_signs() {
        let world = world_at(vec![Position::new(5, 5)], Position::new(2, 5));
        assert_eq!(food_direction(&world), [0.0, -1.0]);

        let world = world_at(vec![Position::new(5, 5)], Position::new(5, 1));
        assert_eq!(food_direction(&world), [-1.0, 0.0]);
    }

    #[test]
    fn test_motion_delta_tracks_action_encodings_only() {
        let mut world = GridWorld::new(GameConfig::default(), Some(0));
        let mut encoder = StateEncoder::new(FeatureLayout::WithMotion);

        // Unknown previous head is the origin
        let first = encoder.encode_for_action(&world);
        assert_eq!(&first.as_slice()[..3], &[1.0, 4.0, 4.0]);

        world.apply(Direction::Right);
        let target = encoder.encode_for_target(&world);
        assert_eq!(&target.as_slice()[..3], &[1.0, 0.0, 1.0]);

        // Target encoding did not overwrite the recorded head
        let next = encoder.encode_for_action(&world);
        assert_eq!(&next.as_slice()[..3], &[1.0, 0.0, 1.0]);

        world.apply(Direction::Down);
        let next = encoder.encode_for_action(&world);
        assert_eq!(&next.as_slice()[..3], &[1.0, 1.0, 0.0]);
        assert_eq!(next.len(), 9);
    }

    #[test]
    fn test_reset_forgets_previous_head() {
        let world = GridWorld::new(GameConfig::default(), Some(0));
        let mut encoder = StateEncoder::new(FeatureLayout::WithMotion);

        encoder.encode_for_action(&world);
        encoder.reset();

        let features = encoder.encode_for_target(&world);
        assert_eq!(&features.as_slice()[..3], &[1.0, 4.0, 4.0]);
    }
}
