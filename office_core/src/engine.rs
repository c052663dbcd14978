use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use tracing::{debug, info, warn};

use crate::{
    ElementId, Position,
    interaction::{DescribeByKind, InteractionHandler, StateChange},
    office::{DEFAULT_BLUEPRINT, LayoutError, OfficeState, load_office_from_string},
};

/// Manhattan distance at which the character can use an element by default.
pub const DEFAULT_INTERACTION_RANGE: usize = 1;

/// Represents the ways an engine command can be refused.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum OfficeError {
    #[error("The office has not been initialized yet.")]
    NotInitialized,
    #[error("Position ({x}, {y}) is outside the office ({width}x{height}).")]
    OutOfBounds {
        x: usize,
        y: usize,
        width: usize,
        height: usize,
    },
    #[error("Position ({x}, {y}) is blocked by a wall.")]
    Blocked { x: usize, y: usize },
    #[error("No element with id '{id}'.")]
    NotFound { id: ElementId },
    #[error("Element '{id}' is {distance} tiles away; it must be within {range}.")]
    TooFar {
        id: ElementId,
        distance: usize,
        range: usize,
    },
    #[error("Invalid office layout: {0}")]
    Layout(#[from] LayoutError),
    #[error("Office state storage is unavailable.")]
    StateUnavailable,
}

/// Settings an engine is built with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineConfig {
    /// Blueprint text the office is built from on every `initialize`.
    pub blueprint: String,
    /// Maximum manhattan distance between the character and a usable element.
    pub interaction_range: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        EngineConfig {
            blueprint: DEFAULT_BLUEPRINT.to_string(),
            interaction_range: DEFAULT_INTERACTION_RANGE,
        }
    }
}

/// The authoritative holder of one office.
///
/// Commands take `&self`; every mutation runs under a single write lock so the
/// read-validate-write sequence of one command never interleaves with another.
/// Snapshots are cloned under the read lock.
pub struct OfficeEngine {
    config: EngineConfig,
    handler: Box<dyn InteractionHandler>,
    state: RwLock<Option<OfficeState>>,
}

impl Default for OfficeEngine {
    fn default() -> Self {
        OfficeEngine::new(EngineConfig::default())
    }
}

impl OfficeEngine {
    /// Creates an uninitialized engine that describes elements by kind.
    pub fn new(config: EngineConfig) -> Self {
        OfficeEngine {
            config,
            handler: Box::new(DescribeByKind),
            state: RwLock::new(None),
        }
    }

    /// Replaces the interaction handler.
    pub fn with_handler(mut self, handler: impl InteractionHandler + 'static) -> Self {
        self.handler = Box::new(handler);
        self
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Builds the office from the configured blueprint, replacing any prior state.
    pub fn initialize(&self) -> Result<(), OfficeError> {
        let office = load_office_from_string(&self.config.blueprint)?;
        info!(
            width = office.width(),
            height = office.height(),
            elements = office.elements.len(),
            start = ?office.character_position,
            "office initialized"
        );
        *self.write_state()? = Some(office);
        Ok(())
    }

    /// Returns a full snapshot of the office.
    pub fn get_state(&self) -> Result<OfficeState, OfficeError> {
        self.read_state()?
            .as_ref()
            .cloned()
            .ok_or(OfficeError::NotInitialized)
    }

    pub fn is_initialized(&self) -> bool {
        self.read_state().is_ok_and(|state| state.is_some())
    }

    /// Places the character at `(x, y)`.
    ///
    /// The target must be inside the grid and not a wall. No path between the
    /// current position and the target is checked.
    pub fn move_character(&self, x: usize, y: usize) -> Result<(), OfficeError> {
        let mut guard = self.write_state()?;
        let office = guard.as_mut().ok_or(OfficeError::NotInitialized)?;

        let target = match validate_target(office, x, y) {
            Ok(target) => target,
            Err(err) => {
                debug!(x, y, %err, "move rejected");
                return Err(err);
            }
        };
        debug!(from = ?office.character_position, to = ?target, "character moved");
        office.character_position = target;
        Ok(())
    }

    /// Uses the element with the given id and returns what happened.
    pub fn interact_with_element(&self, element_id: &str) -> Result<String, OfficeError> {
        let mut guard = self.write_state()?;
        let office = guard.as_mut().ok_or(OfficeError::NotInitialized)?;

        let element = office
            .element(element_id)
            .cloned()
            .ok_or_else(|| OfficeError::NotFound {
                id: element_id.to_string(),
            })?;

        let distance = element.position.manhattan_distance(&office.character_position);
        if distance > self.config.interaction_range {
            debug!(id = element_id, distance, "interaction rejected");
            return Err(OfficeError::TooFar {
                id: element.id,
                distance,
                range: self.config.interaction_range,
            });
        }

        let interaction = self.handler.interact(&element, office);
        if !interaction.effects.is_empty() {
            // Apply to a copy so a failing effect leaves the office untouched
            let mut working = office.clone();
            for effect in &interaction.effects {
                apply_change(&mut working, effect)?;
            }
            *office = working;
        }

        debug!(
            id = element_id,
            effects = interaction.effects.len(),
            "element used"
        );
        Ok(interaction.description)
    }

    fn read_state(&self) -> Result<RwLockReadGuard<'_, Option<OfficeState>>, OfficeError> {
        self.state.read().map_err(|_| {
            warn!(operation = "read", "office state lock poisoned");
            OfficeError::StateUnavailable
        })
    }

    fn write_state(&self) -> Result<RwLockWriteGuard<'_, Option<OfficeState>>, OfficeError> {
        self.state.write().map_err(|_| {
            warn!(operation = "write", "office state lock poisoned");
            OfficeError::StateUnavailable
        })
    }
}

/// Checks that the character may be placed at `(x, y)`.
fn validate_target(office: &OfficeState, x: usize, y: usize) -> Result<Position, OfficeError> {
    let tile = office.grid.get(x, y).ok_or(OfficeError::OutOfBounds {
        x,
        y,
        width: office.width(),
        height: office.height(),
    })?;
    if !tile.is_walkable() {
        return Err(OfficeError::Blocked { x, y });
    }
    Ok(Position { x, y })
}

fn apply_change(office: &mut OfficeState, change: &StateChange) -> Result<(), OfficeError> {
    match change {
        StateChange::MoveCharacter(target) => {
            let target = validate_target(office, target.x, target.y)?;
            office.character_position = target;
        }
        StateChange::RenameElement { id, name } => {
            let element = office
                .element_mut(id)
                .ok_or_else(|| OfficeError::NotFound { id: id.clone() })?;
            element.name = name.clone();
        }
    }
    Ok(())
}
