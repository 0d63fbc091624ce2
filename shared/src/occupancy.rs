//! Which grid cells and canvas regions are already taken.
//!
//! Occupancy is consulted when an organizer picks a cell; nothing in the
//! store enforces it, so concurrent editors can still land on one cell.

use std::collections::HashMap;
use std::hash::Hash;

use crate::grid::GridPosition;
use crate::CanvasRect;

pub struct OccupancyTracker<K> {
    cells: HashMap<GridPosition, Vec<K>>,
    regions: Vec<(K, CanvasRect)>,
}

impl<K> Default for OccupancyTracker<K> {
    fn default() -> Self {
        Self {
            cells: HashMap::new(),
            regions: Vec::new(),
        }
    }
}

impl<K: Eq + Hash + Clone> OccupancyTracker<K> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_cells(cells: impl IntoIterator<Item = (K, GridPosition)>) -> Self {
        let mut tracker = Self::new();
        for (key, position) in cells {
            tracker.insert_cell(key, position);
        }
        tracker
    }

    pub fn insert_cell(&mut self, key: K, position: GridPosition) {
        self.cells.entry(position).or_default().push(key);
    }

    pub fn insert_region(&mut self, key: K, rect: CanvasRect) {
        self.regions.push((key, rect));
    }

    pub fn is_occupied(&self, position: GridPosition) -> bool {
        self.cells
            .get(&position)
            .is_some_and(|keys| !keys.is_empty())
    }

    /// Occupied by anything other than `exclude`; used while moving a booth
    /// so that its own cell does not block it.
    pub fn is_occupied_excluding(&self, position: GridPosition, exclude: &K) -> bool {
        self.cells
            .get(&position)
            .is_some_and(|keys| keys.iter().any(|key| key != exclude))
    }

    pub fn occupant(&self, position: GridPosition) -> Option<&K> {
        self.cells.get(&position).and_then(|keys| keys.first())
    }

    pub fn free_cells(&self) -> Vec<GridPosition> {
        GridPosition::all()
            .filter(|position| !self.is_occupied(*position))
            .collect()
    }

    /// Cells claimed by more than one booth, in row-major order.
    pub fn conflicts(&self) -> Vec<(GridPosition, Vec<K>)> {
        let mut conflicts = self
            .cells
            .iter()
            .filter(|(_, keys)| keys.len() > 1)
            .map(|(position, keys)| (*position, keys.clone()))
            .collect::<Vec<_>>();
        conflicts.sort_by_key(|(position, _)| *position);
        conflicts
    }

    pub fn overlaps(&self, rect: &CanvasRect, exclude: Option<&K>) -> Vec<K> {
        self.regions
            .iter()
            .filter(|(key, _)| exclude != Some(key))
            .filter(|(_, other)| other.intersects(rect))
            .map(|(key, _)| key.clone())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cell(row: u8, col: u8) -> GridPosition {
        GridPosition::new(row, col).unwrap()
    }

    #[test]
    fn own_cell_does_not_block_the_booth_itself() {
        let tracker = OccupancyTracker::from_cells([("b", cell(2, 5)), ("c", cell(0, 0))]);
        assert!(tracker.is_occupied(cell(2, 5)));
        assert!(!tracker.is_occupied_excluding(cell(2, 5), &"b"));
        assert!(tracker.is_occupied_excluding(cell(2, 5), &"c"));
        assert!(!tracker.is_occupied(cell(2, 6)));
    }

    #[test]
    fn free_cells_skip_taken_ones() {
        let tracker = OccupancyTracker::from_cells([(1, cell(0, 0)), (2, cell(7, 11))]);
        let free = tracker.free_cells();
        assert_eq!(free.len(), 94);
        assert!(!free.contains(&cell(0, 0)));
        assert_eq!(tracker.occupant(cell(7, 11)), Some(&2));
    }

    #[test]
    fn double_booked_cells_are_reported() {
        let tracker =
            OccupancyTracker::from_cells([("x", cell(3, 3)), ("y", cell(3, 3)), ("z", cell(1, 1))]);
        assert_eq!(tracker.conflicts(), vec![(cell(3, 3), vec!["x", "y"])]);
        assert!(tracker.is_occupied_excluding(cell(3, 3), &"x"));
    }

    #[test]
    fn canvas_overlap_excludes_self() {
        let mut tracker = OccupancyTracker::new();
        tracker.insert_region("a", CanvasRect::new(0.0, 0.0, 100.0, 100.0));
        tracker.insert_region("b", CanvasRect::new(300.0, 300.0, 50.0, 50.0));
        let probe = CanvasRect::new(50.0, 50.0, 100.0, 100.0);
        assert_eq!(tracker.overlaps(&probe, None), vec!["a"]);
        assert!(tracker.overlaps(&probe, Some(&"a")).is_empty());
    }
}
