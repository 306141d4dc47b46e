use serde::Serialize;

use crate::simulation::calendar::{DayClock, Season};
use crate::world::definitions::{LightType, TileDefinitionTable, TileId};
use crate::world::geometry::{GridPos, PixelRect};
use crate::world::lighting::LightView;
use crate::world::map::{Layer, MapKind, MapState};
use crate::world::tile::{Behavior, GrassState, TileInstance};

/// Sheets with a snow-covered twin used all winter.
const WINTER_SHEETS: [(&str, &str); 3] = [
    ("graphics/decoration/buildings", "graphics/decoration/buildingsWinter"),
    ("graphics/decoration/outsideDecor", "graphics/decoration/outsideDecorWinter"),
    ("graphics/nature/terrain", "graphics/nature/terrainWinter"),
];

/// Sheet key to draw `image` with in `season`.
pub fn seasonal_sheet(image: &str, season: Season) -> String {
    if season != Season::Winter {
        return image.to_string();
    }
    for (normal, winter) in WINTER_SHEETS {
        if image.starts_with(winter) {
            break;
        }
        if let Some(rest) = image.strip_prefix(normal) {
            return format!("{}{}", winter, rest);
        }
    }
    image.to_string()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FenceStyle {
    Wood,
    Stone,
}

/// Which neighbouring fences a fence draws connectors towards.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct FenceConnectors {
    pub above: Option<FenceStyle>,
    pub left: Option<FenceStyle>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CellView {
    pub x: i32,
    pub y: i32,
    pub tile_id: TileId,
    pub frame: u32,
    pub sheet: String,
    pub source: [i32; 4],
    pub draw_offset: [i32; 2],
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fence: Option<FenceConnectors>,
    /// Grass only: draw the tilled soil and water shadow overlays from this.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub soil: Option<GrassState>,
    /// Light emitters only: whether the flame or bulb is drawn lit.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lit: Option<bool>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LayerView {
    pub layer: Layer,
    pub cells: Vec<CellView>,
}

/// Read-only picture of one map for an external renderer or a debug dump.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MapView {
    pub name: String,
    pub kind: MapKind,
    pub width: i32,
    pub height: i32,
    pub season: Season,
    pub daylight: bool,
    pub layers: Vec<LayerView>,
    /// One string per row, `#` for blocked cells.
    pub collision: Vec<String>,
    pub lights: Vec<LightView>,
    pub exits: Vec<PixelRect>,
}

fn fence_style(table: &TileDefinitionTable, tile: &TileInstance) -> Option<FenceStyle> {
    if !matches!(tile.behavior, Behavior::Fence) {
        return None;
    }
    let stone = table
        .get(tile.base_tile_id)
        .is_some_and(|d| d.name.contains("Stone"));
    Some(if stone { FenceStyle::Stone } else { FenceStyle::Wood })
}

fn fence_connectors(state: &MapState, table: &TileDefinitionTable, pos: GridPos) -> FenceConnectors {
    let neighbour = |offset: GridPos| {
        state
            .tile_at(Layer::Object, pos + offset)
            .and_then(|t| fence_style(table, t))
    };
    FenceConnectors {
        above: neighbour(GridPos::new(0, -1)),
        left: neighbour(GridPos::new(-1, 0)),
    }
}

fn cell_view(
    state: &MapState,
    table: &TileDefinitionTable,
    tile: &TileInstance,
    clock: &DayClock,
    daylight: bool,
) -> CellView {
    let tile_id = tile.display_id(daylight);
    let def = table.get(tile_id).or_else(|| table.get(tile.base_tile_id));
    let fence = matches!(tile.behavior, Behavior::Fence)
        .then(|| fence_connectors(state, table, tile.position));
    CellView {
        x: tile.position.x,
        y: tile.position.y,
        tile_id,
        frame: tile.frame_index(clock.time()),
        sheet: def
            .map(|d| seasonal_sheet(&d.image, clock.season()))
            .unwrap_or_default(),
        source: def.map(|d| d.source).unwrap_or_default(),
        draw_offset: def.map(|d| d.draw_offset).unwrap_or_default(),
        fence,
        soil: tile.grass().copied(),
        lit: (tile.light_type() != LightType::None).then_some(tile.is_on),
    }
}

pub fn map_view(state: &MapState, table: &TileDefinitionTable, clock: &DayClock) -> MapView {
    let daylight = clock.is_daytime();
    let layers = Layer::ALL
        .iter()
        .map(|&layer| LayerView {
            layer,
            cells: state
                .layer(layer)
                .occupied()
                .filter_map(|(_, key)| state.tile(key))
                .map(|tile| cell_view(state, table, tile, clock, daylight))
                .collect(),
        })
        .collect();
    let collision: Vec<String> = state
        .collision()
        .rows()
        .map(|row| row.iter().map(|&b| if b { '#' } else { '.' }).collect::<String>())
        .collect();
    let size = state.size();
    MapView {
        name: state.name().to_string(),
        kind: state.kind(),
        width: size.x,
        height: size.y,
        season: clock.season(),
        daylight,
        layers,
        collision,
        lights: state
            .lights()
            .iter()
            .filter_map(|k| state.tile(*k))
            .map(LightView::of)
            .collect(),
        exits: state.exits().iter().map(|e| e.area).collect(),
    }
}
