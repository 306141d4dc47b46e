use glam::IVec2;
use serde::Serialize;

/// Edge length of one grid cell in pixels.
pub const TILE_SIZE: i32 = 16;

/// Grid cell coordinate (x right, y down).
pub type GridPos = IVec2;

/// Axis-aligned rectangle in world pixels. Right and bottom edges are exclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PixelRect {
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
}

impl PixelRect {
    pub fn new(x: i32, y: i32, width: i32, height: i32) -> Self {
        PixelRect {
            x,
            y,
            width,
            height,
        }
    }

    /// The pixel area covered by a single grid cell.
    pub fn of_cell(cell: GridPos) -> Self {
        PixelRect::new(cell.x * TILE_SIZE, cell.y * TILE_SIZE, TILE_SIZE, TILE_SIZE)
    }

    pub fn contains(&self, point: IVec2) -> bool {
        point.x >= self.x
            && point.x < self.x + self.width
            && point.y >= self.y
            && point.y < self.y + self.height
    }

    pub fn intersects(&self, other: &PixelRect) -> bool {
        self.x < other.x + other.width
            && other.x < self.x + self.width
            && self.y < other.y + other.height
            && other.y < self.y + self.height
    }
}

/// The rectangular set of cells a tile occupies.
///
/// A tile's stored grid position is the bottom-left cell of its footprint:
/// the rectangle extends `size.x - 1` cells to the right and `size.y - 1`
/// cells upward, then shifts by the collider offset. Collision derivation,
/// click reverse lookup and placement preview all go through this type so
/// they cannot disagree.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Footprint {
    /// Top-left cell.
    pub origin: GridPos,
    pub size: IVec2,
}

impl Footprint {
    pub fn anchored(anchor: GridPos, size: IVec2, offset: IVec2) -> Self {
        let size = size.max(IVec2::ONE);
        Footprint {
            origin: IVec2::new(anchor.x + offset.x, anchor.y - (size.y - 1) + offset.y),
            size,
        }
    }

    /// Cells in row-major order.
    pub fn cells(&self) -> impl Iterator<Item = GridPos> + '_ {
        (0..self.size.y).flat_map(move |j| {
            (0..self.size.x).map(move |i| self.origin + IVec2::new(i, j))
        })
    }

    pub fn contains(&self, cell: GridPos) -> bool {
        cell.x >= self.origin.x
            && cell.x < self.origin.x + self.size.x
            && cell.y >= self.origin.y
            && cell.y < self.origin.y + self.size.y
    }

    pub fn pixel_rect(&self) -> PixelRect {
        PixelRect::new(
            self.origin.x * TILE_SIZE,
            self.origin.y * TILE_SIZE,
            self.size.x * TILE_SIZE,
            self.size.y * TILE_SIZE,
        )
    }
}

/// Row-major offset of `pos` in a `size` grid, or `None` outside it.
pub fn row_major_index(size: IVec2, pos: GridPos) -> Option<usize> {
    if pos.x < 0 || pos.y < 0 || pos.x >= size.x || pos.y >= size.y {
        None
    } else {
        Some((pos.y * size.x + pos.x) as usize)
    }
}

/// Chebyshev (king-move) distance between two cells.
pub fn chebyshev(a: GridPos, b: GridPos) -> i32 {
    let d = (a - b).abs();
    d.x.max(d.y)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn single_cell_footprint_is_the_anchor() {
        let fp = Footprint::anchored(IVec2::new(4, 7), IVec2::ONE, IVec2::ZERO);
        let cells: Vec<_> = fp.cells().collect();
        assert_eq!(cells, vec![IVec2::new(4, 7)]);
    }

    #[test]
    fn footprint_extends_up_and_right_from_anchor() {
        let fp = Footprint::anchored(IVec2::new(2, 5), IVec2::new(3, 2), IVec2::ZERO);
        let cells: Vec<_> = fp.cells().collect();
        assert_eq!(cells.len(), 6);
        assert!(cells.contains(&IVec2::new(2, 5)));
        assert!(cells.contains(&IVec2::new(4, 4)));
        assert!(!cells.contains(&IVec2::new(2, 6)));
        assert!(!cells.contains(&IVec2::new(1, 5)));
    }

    #[test]
    fn offset_shifts_footprint() {
        let fp = Footprint::anchored(IVec2::new(3, 3), IVec2::ONE, IVec2::new(0, -1));
        assert_eq!(fp.origin, IVec2::new(3, 2));
    }

    #[test]
    fn pixel_rect_matches_cells() {
        let fp = Footprint::anchored(IVec2::new(1, 4), IVec2::new(2, 3), IVec2::ZERO);
        let rect = fp.pixel_rect();
        assert_eq!(rect, PixelRect::new(16, 32, 32, 48));
        for cell in fp.cells() {
            assert!(rect.contains(cell * TILE_SIZE));
        }
        assert!(!rect.contains(IVec2::new(1, 5) * TILE_SIZE));
    }

    #[test]
    fn rect_intersection_excludes_touching_edges() {
        let a = PixelRect::new(0, 0, 16, 16);
        let b = PixelRect::new(16, 0, 16, 16);
        let c = PixelRect::new(15, 15, 4, 4);
        assert!(!a.intersects(&b));
        assert!(a.intersects(&c));
        assert!(c.intersects(&a));
    }

    #[test]
    fn row_major_index_rejects_cells_outside_the_grid() {
        let size = IVec2::new(4, 3);
        assert_eq!(row_major_index(size, IVec2::new(0, 0)), Some(0));
        assert_eq!(row_major_index(size, IVec2::new(3, 0)), Some(3));
        assert_eq!(row_major_index(size, IVec2::new(1, 2)), Some(9));
        assert_eq!(row_major_index(size, IVec2::new(4, 0)), None);
        assert_eq!(row_major_index(size, IVec2::new(0, 3)), None);
        assert_eq!(row_major_index(size, IVec2::new(-1, 1)), None);
    }

    #[test]
    fn chebyshev_counts_diagonals_as_one() {
        assert_eq!(chebyshev(IVec2::new(0, 0), IVec2::new(1, 1)), 1);
        assert_eq!(chebyshev(IVec2::new(0, 0), IVec2::new(2, -1)), 2);
        assert_eq!(chebyshev(IVec2::new(3, 3), IVec2::new(3, 3)), 0);
    }
}
