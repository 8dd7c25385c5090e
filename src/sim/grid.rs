//! Uniform spatial grid for the collision broad phase
//!
//! Each entity is stored in its home cell and in every cell within
//! `ceil(radius / cell_size)` of it, so a query only has to look at the home cell
//! of the querying entity. Results are candidates; callers still do the exact
//! circle test.

use std::collections::HashMap;

use glam::Vec2;

use super::entity::EntityRef;

#[derive(Debug, Clone)]
pub struct SpatialGrid {
    cell_size: f32,
    cells: HashMap<(i32, i32), Vec<EntityRef>>,
}

impl SpatialGrid {
    pub fn new(cell_size: f32) -> Self {
        Self {
            cell_size: cell_size.max(1.0),
            cells: HashMap::new(),
        }
    }

    pub fn cell_size(&self) -> f32 {
        self.cell_size
    }

    /// Cell coordinates of a world position
    pub fn cell_of(&self, pos: Vec2) -> (i32, i32) {
        (
            (pos.x / self.cell_size).floor() as i32,
            (pos.y / self.cell_size).floor() as i32,
        )
    }

    /// Empty every cell (keeps allocations)
    pub fn clear(&mut self) {
        for entries in self.cells.values_mut() {
            entries.clear();
        }
    }

    pub fn insert(&mut self, entry: EntityRef, pos: Vec2, radius: f32) {
        let (cx, cy) = self.cell_of(pos);
        let reach = self.radius_in_cells(radius);
        for dx in -reach..=reach {
            for dy in -reach..=reach {
                self.cells.entry((cx + dx, cy + dy)).or_default().push(entry);
            }
        }
    }

    /// Entries registered in the cell containing `pos`
    pub fn candidates(&self, pos: Vec2) -> &[EntityRef] {
        self.cells
            .get(&self.cell_of(pos))
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Number of non-empty cells
    pub fn occupied_cells(&self) -> usize {
        self.cells.values().filter(|entries| !entries.is_empty()).count()
    }

    fn radius_in_cells(&self, radius: f32) -> i32 {
        ((radius / self.cell_size).ceil() as i32).max(1)
    }
}
