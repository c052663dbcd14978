use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::{ElementId, Position, map::Grid};

/// The office the engine builds when no other blueprint is configured.
pub const DEFAULT_BLUEPRINT: &str = "
WL WL WL WL WL WL WL WL WL WL
WL ST FL FL FL WL PL FL FL WL
WL FL DK PC FL WL FL DK PC WL
WL FL CH FL FL FL FL CH FL WL
WL FL FL FL FL WL FL FL FL WL
WL PL FL DK PC WL WL FL WL WL
WL FL FL CH FL FL FL FL PL WL
WL WL WL WL WL WL WL WL WL WL
";

/// Represents errors raised while building an office from a blueprint.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LayoutError {
    #[error("Blueprint is empty.")]
    Empty,
    #[error("Inconsistent width at row {row}: expected {expected}, found {found}")]
    InconsistentWidth {
        row: usize,
        expected: usize,
        found: usize,
    },
    #[error("Unknown blueprint code '{token}' at position ({x}, {y}).")]
    UnknownToken { token: String, x: usize, y: usize },
    #[error("Multiple start positions ('ST') found at {first:?} and {second:?}.")]
    MultipleStarts { first: Position, second: Position },
    #[error("No start position ('ST') found in blueprint.")]
    MissingStart,
    #[error("Unknown tile code {0}.")]
    UnknownTileCode(u8),
}

/// Represents the static kind of a cell in the office grid.
///
/// On the wire each tile is a small integer code; `1` is a wall.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "u8", try_from = "u8")]
pub enum Tile {
    #[default]
    Floor,
    Wall,
    Desk,
    Chair,
    Plant,
    Computer,
}

impl Tile {
    /// Only walls block the character; furniture is stood at to be used.
    pub fn is_walkable(self) -> bool {
        !matches!(self, Tile::Wall)
    }
}

impl From<Tile> for u8 {
    fn from(tile: Tile) -> Self {
        match tile {
            Tile::Floor => 0,
            Tile::Wall => 1,
            Tile::Desk => 2,
            Tile::Chair => 3,
            Tile::Plant => 4,
            Tile::Computer => 5,
        }
    }
}

impl TryFrom<u8> for Tile {
    type Error = LayoutError;

    fn try_from(code: u8) -> Result<Self, Self::Error> {
        match code {
            0 => Ok(Tile::Floor),
            1 => Ok(Tile::Wall),
            2 => Ok(Tile::Desk),
            3 => Ok(Tile::Chair),
            4 => Ok(Tile::Plant),
            5 => Ok(Tile::Computer),
            other => Err(LayoutError::UnknownTileCode(other)),
        }
    }
}

/// The kinds of furniture a character can interact with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ElementKind {
    Desk,
    Chair,
    Plant,
    Computer,
}

impl ElementKind {
    /// The tile this furniture occupies in the grid.
    pub fn tile(self) -> Tile {
        match self {
            ElementKind::Desk => Tile::Desk,
            ElementKind::Chair => Tile::Chair,
            ElementKind::Plant => Tile::Plant,
            ElementKind::Computer => Tile::Computer,
        }
    }

    /// Lowercase slug used to build element ids.
    pub fn slug(self) -> &'static str {
        match self {
            ElementKind::Desk => "desk",
            ElementKind::Chair => "chair",
            ElementKind::Plant => "plant",
            ElementKind::Computer => "computer",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            ElementKind::Desk => "Desk",
            ElementKind::Chair => "Chair",
            ElementKind::Plant => "Plant",
            ElementKind::Computer => "Computer",
        }
    }
}

/// A placed interactive object.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Element {
    pub id: ElementId,
    pub kind: ElementKind,
    pub name: String,
    pub position: Position,
}

/// A complete snapshot of the office: grid, elements and character.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OfficeState {
    #[serde(rename = "layout")]
    pub grid: Grid<Tile>,
    pub elements: Vec<Element>,
    pub character_position: Position,
}

impl OfficeState {
    pub fn width(&self) -> usize {
        self.grid.width()
    }

    pub fn height(&self) -> usize {
        self.grid.height()
    }

    /// Returns the tile at a position, or `None` outside the grid.
    pub fn tile_at(&self, position: Position) -> Option<Tile> {
        self.grid.get(position.x, position.y).copied()
    }

    /// Checks whether the character may stand on the given position.
    pub fn is_walkable(&self, position: Position) -> bool {
        self.tile_at(position).is_some_and(Tile::is_walkable)
    }

    pub fn element(&self, id: &str) -> Option<&Element> {
        self.elements.iter().find(|element| element.id == id)
    }

    pub fn element_mut(&mut self, id: &str) -> Option<&mut Element> {
        self.elements.iter_mut().find(|element| element.id == id)
    }
}

/// Loads an office from a string representation of a blueprint.
///
/// Furniture codes place both the furniture tile and an element with an id
/// of the form `<kind>-<n>`, numbered per kind in row-major order.
pub fn load_office_from_string(blueprint: &str) -> Result<OfficeState, LayoutError> {
    let lines: Vec<&str> = blueprint
        .trim()
        .lines()
        .filter(|line| !line.trim().is_empty())
        .collect();
    if lines.is_empty() {
        return Err(LayoutError::Empty);
    }

    let height = lines.len();
    let mut width = 0;
    let mut parsed_rows: Vec<Vec<&str>> = Vec::with_capacity(height);

    for (y, line) in lines.iter().enumerate() {
        let tokens: Vec<&str> = line.split_whitespace().collect();
        if y == 0 {
            width = tokens.len();
        } else if tokens.len() != width {
            return Err(LayoutError::InconsistentWidth {
                row: y,
                expected: width,
                found: tokens.len(),
            });
        }
        parsed_rows.push(tokens);
    }

    let mut grid: Grid<Tile> = Grid::new(width, height);
    let mut elements = Vec::new();
    let mut counters = [0usize; 4];
    let mut start_position: Option<Position> = None;

    for (y, row_tokens) in parsed_rows.iter().enumerate() {
        for (x, token) in row_tokens.iter().enumerate() {
            let pos = Position { x, y };
            let (tile, furniture) = match *token {
                "ST" => {
                    if let Some(first) = start_position {
                        return Err(LayoutError::MultipleStarts { first, second: pos });
                    }
                    start_position = Some(pos);
                    (Tile::Floor, None)
                }
                "FL" => (Tile::Floor, None),
                "WL" => (Tile::Wall, None),
                "DK" => (Tile::Desk, Some(ElementKind::Desk)),
                "CH" => (Tile::Chair, Some(ElementKind::Chair)),
                "PL" => (Tile::Plant, Some(ElementKind::Plant)),
                "PC" => (Tile::Computer, Some(ElementKind::Computer)),
                unknown => {
                    return Err(LayoutError::UnknownToken {
                        token: unknown.to_string(),
                        x,
                        y,
                    });
                }
            };

            grid[pos] = tile;
            if let Some(kind) = furniture {
                let counter = &mut counters[kind as usize];
                *counter += 1;
                elements.push(Element {
                    id: format!("{}-{}", kind.slug(), counter),
                    kind,
                    name: format!("{} {}", kind.label(), counter),
                    position: pos,
                });
            }
        }
    }

    let character_position = start_position.ok_or(LayoutError::MissingStart)?;
    debug!(
        width,
        height,
        elements = elements.len(),
        "blueprint loaded"
    );

    Ok(OfficeState {
        grid,
        elements,
        character_position,
    })
}
