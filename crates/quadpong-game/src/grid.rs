//! The destructible brick grid.
//!
//! Generated once per room: a four-way symmetric field of bricks with a
//! clear zone around the center (where balls spawn into play) and a
//! clear margin along the walls (so paddles get room to work). The grid
//! is finished when every brick has been worn down to zero life — the
//! sole game-over trigger.

use rand::Rng;

use quadpong_protocol::{CellKind, CellState};

use crate::config::GameConfig;
use crate::physics::Rect;

/// One grid cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Cell {
    pub kind: CellKind,
    /// Hits remaining. `0 ⇒ kind == Empty`.
    pub life: u32,
    /// Initial life; the score a brick is worth.
    pub level: u32,
}

impl Cell {
    fn empty() -> Self {
        Self {
            kind: CellKind::Empty,
            life: 0,
            level: 0,
        }
    }

    fn brick(life: u32) -> Self {
        Self {
            kind: CellKind::Brick,
            life,
            level: life,
        }
    }

    /// Whether this cell still blocks and damages balls.
    pub fn is_live(&self) -> bool {
        self.kind == CellKind::Brick && self.life > 0
    }
}

/// A square grid of cells, row-major.
#[derive(Debug, Clone)]
pub struct Grid {
    size: usize,
    cell_size: i32,
    cells: Vec<Cell>,
}

impl Grid {
    /// Generates a symmetric grid from the config's density, clearance,
    /// and life parameters.
    ///
    /// Cells are decided for one quadrant and mirrored four ways, so
    /// every player faces the same field.
    pub fn generate(config: &GameConfig, rng: &mut impl Rng) -> Self {
        let size = config.grid_size;
        let mut cells = vec![Cell::empty(); size * size];

        let half = size.div_ceil(2);
        for row in 0..half {
            for col in 0..half {
                if !Self::placeable(config, size, col, row) {
                    continue;
                }
                if !rng.random_bool(config.grid_fill_density) {
                    continue;
                }
                let life =
                    rng.random_range(config.brick_min_life..=config.brick_max_life);
                let brick = Cell::brick(life);
                for (c, r) in [
                    (col, row),
                    (size - 1 - col, row),
                    (col, size - 1 - row),
                    (size - 1 - col, size - 1 - row),
                ] {
                    cells[r * size + c] = brick;
                }
            }
        }

        Self {
            size,
            cell_size: config.cell_size(),
            cells,
        }
    }

    /// Whether a brick may be placed at (col, row): outside the wall
    /// margin and outside the center clearance circle.
    fn placeable(config: &GameConfig, size: usize, col: usize, row: usize) -> bool {
        let margin = config.clear_wall_distance;
        if col < margin || row < margin || col >= size - margin || row >= size - margin {
            return false;
        }
        let center = (size as f64 - 1.0) / 2.0;
        let dx = col as f64 - center;
        let dy = row as f64 - center;
        (dx * dx + dy * dy).sqrt() >= config.clear_center_radius
    }

    pub fn size(&self) -> usize {
        self.size
    }

    pub fn cell_size(&self) -> i32 {
        self.cell_size
    }

    pub fn cell(&self, col: usize, row: usize) -> &Cell {
        &self.cells[row * self.size + col]
    }

    pub fn cell_mut(&mut self, col: usize, row: usize) -> &mut Cell {
        &mut self.cells[row * self.size + col]
    }

    /// The pixel rectangle covered by a cell.
    pub fn cell_rect(&self, col: usize, row: usize) -> Rect {
        Rect::new(
            col as i32 * self.cell_size,
            row as i32 * self.cell_size,
            self.cell_size,
            self.cell_size,
        )
    }

    /// The pixel center of a cell.
    pub fn cell_center(&self, col: usize, row: usize) -> (i32, i32) {
        let rect = self.cell_rect(col, row);
        (rect.center_x(), rect.center_y())
    }

    /// The inclusive cell-coordinate range covered by a pixel rectangle,
    /// clamped to the grid. `None` when the rect lies entirely outside.
    pub fn cells_in_rect(
        &self,
        rect: &Rect,
    ) -> Option<(std::ops::RangeInclusive<usize>, std::ops::RangeInclusive<usize>)> {
        let max = (self.size as i32 * self.cell_size) - 1;
        let left = rect.x.max(0);
        let top = rect.y.max(0);
        let right = (rect.right() - 1).min(max);
        let bottom = (rect.bottom() - 1).min(max);
        if left > right || top > bottom {
            return None;
        }
        let col_range = (left / self.cell_size) as usize..=(right / self.cell_size) as usize;
        let row_range = (top / self.cell_size) as usize..=(bottom / self.cell_size) as usize;
        Some((col_range, row_range))
    }

    /// How many cells still hold a live brick.
    pub fn remaining_bricks(&self) -> usize {
        self.cells.iter().filter(|c| c.is_live()).count()
    }

    /// Flat snapshot of every cell, row-major, for `fullGridUpdate`.
    pub fn snapshot(&self) -> Vec<CellState> {
        self.cells
            .iter()
            .enumerate()
            .map(|(i, cell)| CellState {
                col: i % self.size,
                row: i / self.size,
                kind: cell.kind,
                life: cell.life,
                level: cell.level,
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn config() -> GameConfig {
        GameConfig::default().validated()
    }

    fn generate(seed: u64) -> (GameConfig, Grid) {
        let cfg = config();
        let grid = Grid::generate(&cfg, &mut StdRng::seed_from_u64(seed));
        (cfg, grid)
    }

    #[test]
    fn test_generate_is_four_way_symmetric() {
        let (_, grid) = generate(7);
        let n = grid.size();
        for row in 0..n {
            for col in 0..n {
                let a = *grid.cell(col, row);
                assert_eq!(a, *grid.cell(n - 1 - col, row), "({col},{row}) h-mirror");
                assert_eq!(a, *grid.cell(col, n - 1 - row), "({col},{row}) v-mirror");
            }
        }
    }

    #[test]
    fn test_generate_respects_wall_margin() {
        let (cfg, grid) = generate(11);
        let n = grid.size();
        let margin = cfg.clear_wall_distance;
        for row in 0..n {
            for col in 0..n {
                let near_wall = col < margin
                    || row < margin
                    || col >= n - margin
                    || row >= n - margin;
                if near_wall {
                    assert!(
                        !grid.cell(col, row).is_live(),
                        "brick inside wall margin at ({col},{row})"
                    );
                }
            }
        }
    }

    #[test]
    fn test_generate_clears_the_center() {
        let (cfg, grid) = generate(13);
        let n = grid.size();
        let center = (n as f64 - 1.0) / 2.0;
        for row in 0..n {
            for col in 0..n {
                let dx = col as f64 - center;
                let dy = row as f64 - center;
                if (dx * dx + dy * dy).sqrt() < cfg.clear_center_radius {
                    assert!(
                        !grid.cell(col, row).is_live(),
                        "brick inside center clearance at ({col},{row})"
                    );
                }
            }
        }
    }

    #[test]
    fn test_generated_life_within_configured_range() {
        let (cfg, grid) = generate(17);
        let n = grid.size();
        for row in 0..n {
            for col in 0..n {
                let cell = grid.cell(col, row);
                if cell.is_live() {
                    assert!(cell.life >= cfg.brick_min_life);
                    assert!(cell.life <= cfg.brick_max_life);
                    assert_eq!(cell.life, cell.level);
                }
            }
        }
    }

    #[test]
    fn test_full_density_fills_every_placeable_cell() {
        let cfg = GameConfig {
            grid_fill_density: 1.0,
            ..config()
        };
        let grid = Grid::generate(&cfg, &mut StdRng::seed_from_u64(1));
        let n = grid.size();
        for row in 0..n {
            for col in 0..n {
                let placeable = Grid::placeable(&cfg, n, col, row);
                // Mirroring can only add bricks to placeable positions,
                // which are themselves symmetric.
                assert_eq!(grid.cell(col, row).is_live(), placeable, "({col},{row})");
            }
        }
        assert!(grid.remaining_bricks() > 0);
    }

    #[test]
    fn test_zero_density_generates_no_bricks() {
        let cfg = GameConfig {
            grid_fill_density: 0.0,
            ..config()
        };
        let grid = Grid::generate(&cfg, &mut StdRng::seed_from_u64(1));
        assert_eq!(grid.remaining_bricks(), 0);
    }

    #[test]
    fn test_snapshot_covers_every_cell_in_row_major_order() {
        let (cfg, grid) = generate(3);
        let cells = grid.snapshot();
        assert_eq!(cells.len(), cfg.grid_size * cfg.grid_size);
        assert_eq!((cells[0].col, cells[0].row), (0, 0));
        assert_eq!((cells[1].col, cells[1].row), (1, 0));
        let last = cells.last().unwrap();
        assert_eq!((last.col, last.row), (cfg.grid_size - 1, cfg.grid_size - 1));
    }

    #[test]
    fn test_cells_in_rect_clamps_to_grid() {
        let (_, grid) = generate(5);
        let rect = Rect::new(-20, -20, 30, 30);
        let (cols, rows) = grid.cells_in_rect(&rect).unwrap();
        assert_eq!(cols, 0..=0);
        assert_eq!(rows, 0..=0);

        let outside = Rect::new(-50, -50, 10, 10);
        assert!(grid.cells_in_rect(&outside).is_none());
    }

    #[test]
    fn test_cells_in_rect_spans_boundaries() {
        let (cfg, grid) = generate(5);
        let cell = cfg.cell_size();
        // A rect straddling the corner of four cells.
        let rect = Rect::new(cell - 5, cell - 5, 10, 10);
        let (cols, rows) = grid.cells_in_rect(&rect).unwrap();
        assert_eq!(cols, 0..=1);
        assert_eq!(rows, 0..=1);
    }
}
