use serde::{Deserialize, Serialize};

pub mod engine;
pub mod interaction;
pub mod map;
pub mod office;
pub mod pilot;

pub use engine::{EngineConfig, OfficeEngine, OfficeError};
pub use interaction::{DescribeByKind, Interaction, InteractionHandler, StateChange};
pub use office::{Element, ElementKind, LayoutError, OfficeState, Tile};

/// Unique identifier for placed elements.
pub type ElementId = String;

/// Represents a 2D coordinate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Position {
    pub x: usize,
    pub y: usize,
}

impl Position {
    pub const fn new(x: usize, y: usize) -> Self {
        Position { x, y }
    }

    /// Returns the manhattan distance between two positions.
    pub fn manhattan_distance(&self, other: &Position) -> usize {
        self.x.abs_diff(other.x) + self.y.abs_diff(other.y)
    }
}
