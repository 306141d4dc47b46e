use std::io;
use std::path::PathBuf;

use crate::world::definitions::TileId;
use crate::world::map::Layer;

/// Fatal configuration errors. These indicate broken authoring data or a
/// bootstrap bug and are never recovered from during play.
#[derive(Debug)]
pub enum WorldError {
    Io(io::Error),
    /// A content file could not be parsed.
    Content { path: PathBuf, message: String },
    /// A map layer references an id missing from the definition table.
    UnknownTileId {
        map: String,
        layer: Layer,
        x: i32,
        y: i32,
        id: TileId,
    },
    /// A definition references another tile id that does not exist.
    DanglingReference { tile: TileId, target: TileId },
    DuplicateTileId(TileId),
    ReservedTileId,
    DuplicateMap(String),
    LayerShape {
        map: String,
        layer: Layer,
        expected: (usize, usize),
        found: (usize, usize),
    },
    /// `load_map` was asked for a map that was never precached.
    MapNotFound(String),
    OutOfBounds { map: String, x: i32, y: i32 },
}

impl std::fmt::Display for WorldError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            WorldError::Io(e) => write!(f, "I/O error: {}", e),
            WorldError::Content { path, message } => {
                write!(f, "{}: {}", path.display(), message)
            }
            WorldError::UnknownTileId { map, layer, x, y, id } => write!(
                f,
                "Map '{}' {:?} layer references unknown tile id {} at ({}, {})",
                map, layer, id, x, y
            ),
            WorldError::DanglingReference { tile, target } => write!(
                f,
                "Tile {} references tile id {} which is not defined",
                tile, target
            ),
            WorldError::DuplicateTileId(id) => write!(f, "Tile id {} is defined twice", id),
            WorldError::ReservedTileId => {
                write!(f, "Tile id 0 is reserved for empty cells")
            }
            WorldError::DuplicateMap(name) => write!(f, "Map '{}' is defined twice", name),
            WorldError::LayerShape {
                map,
                layer,
                expected,
                found,
            } => write!(
                f,
                "Map '{}' {:?} layer is {}x{}, expected {}x{}",
                map, layer, found.0, found.1, expected.0, expected.1
            ),
            WorldError::MapNotFound(name) => {
                write!(f, "Map '{}' was not found in the cache", name)
            }
            WorldError::OutOfBounds { map, x, y } => {
                write!(f, "({}, {}) is outside map '{}'", x, y, map)
            }
        }
    }
}

impl std::error::Error for WorldError {}

impl From<io::Error> for WorldError {
    fn from(e: io::Error) -> Self {
        WorldError::Io(e)
    }
}
