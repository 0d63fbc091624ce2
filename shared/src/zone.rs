//! Named, colored rectangles drawn over the grid for orientation only.

use bincode::{Decode, Encode};
use serde::{Deserialize, Serialize};

use crate::grid::{GridMapper, GridPosition, GRID_COLS, GRID_ROWS};
pub use crate::model::ZoneId;
use crate::CanvasRect;

pub const ZONE_SWATCHES: [&str; 6] = [
    "#3b82f6", "#22c55e", "#f59e0b", "#ef4444", "#a855f7", "#14b8a6",
];

const DEFAULT_ZONE_NAME: &str = "Zone";
const MAX_NAME_LEN: usize = 64;
const MAX_COLOR_LEN: usize = 32;

#[derive(Serialize, Deserialize, Encode, Decode, Clone, Copy, Debug, PartialEq, Eq)]
pub struct ZoneFootprint {
    pub start_row: u8,
    pub start_col: u8,
    pub row_span: u8,
    pub col_span: u8,
}

impl ZoneFootprint {
    /// Stepper semantics: values are pulled into the grid, never rejected.
    pub fn clamped(start_row: i64, start_col: i64, row_span: i64, col_span: i64) -> Self {
        let start = GridPosition::clamped(start_row, start_col);
        let max_rows = (GRID_ROWS - start.row) as i64;
        let max_cols = (GRID_COLS - start.col) as i64;
        Self {
            start_row: start.row,
            start_col: start.col,
            row_span: row_span.clamp(1, max_rows) as u8,
            col_span: col_span.clamp(1, max_cols) as u8,
        }
    }

    pub fn normalized(self) -> Self {
        Self::clamped(
            self.start_row as i64,
            self.start_col as i64,
            self.row_span as i64,
            self.col_span as i64,
        )
    }

    pub fn contains(&self, position: GridPosition) -> bool {
        let (row, col) = (position.row as u16, position.col as u16);
        row >= self.start_row as u16
            && row < self.start_row as u16 + self.row_span as u16
            && col >= self.start_col as u16
            && col < self.start_col as u16 + self.col_span as u16
    }

    pub fn to_rect(&self, mapper: &GridMapper) -> CanvasRect {
        let cell = mapper.cell_size();
        CanvasRect::new(
            self.start_col as f64 * cell,
            self.start_row as f64 * cell,
            self.col_span as f64 * cell,
            self.row_span as f64 * cell,
        )
    }
}

#[derive(Serialize, Deserialize, Encode, Decode, Clone, Debug, PartialEq)]
pub struct Zone {
    pub id: ZoneId,
    pub name: String,
    pub color: String,
    pub footprint: ZoneFootprint,
}

impl Zone {
    pub fn new(name: impl Into<String>, color: impl Into<String>, footprint: ZoneFootprint) -> Self {
        Self {
            id: ZoneId::generate(),
            name: String::new(),
            color: String::new(),
            footprint,
        }
        .with_name(name.into())
        .with_color(color.into())
    }

    fn with_name(mut self, name: String) -> Self {
        let trimmed = name.trim();
        self.name = if trimmed.is_empty() {
            DEFAULT_ZONE_NAME.to_string()
        } else {
            trimmed.chars().take(MAX_NAME_LEN).collect()
        };
        self
    }

    fn with_color(mut self, color: String) -> Self {
        self.color = sanitize_color(color);
        self
    }

    pub fn sanitized(self) -> Self {
        let name = self.name.clone();
        let color = self.color.clone();
        let footprint = self.footprint.normalized();
        Self { footprint, ..self }.with_name(name).with_color(color)
    }
}

fn sanitize_color(color: String) -> String {
    let trimmed = color.trim();
    if trimmed.is_empty() {
        return ZONE_SWATCHES[0].to_string();
    }
    trimmed.chars().take(MAX_COLOR_LEN).collect()
}

/// The zone set of one floor plan.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ZoneOverlay {
    zones: Vec<Zone>,
}

impl ZoneOverlay {
    pub fn new(zones: Vec<Zone>) -> Self {
        Self {
            zones: zones.into_iter().map(Zone::sanitized).collect(),
        }
    }

    pub fn add_zone(&mut self, zone: Zone) -> &Zone {
        let zone = zone.sanitized();
        self.zones.retain(|existing| existing.id != zone.id);
        self.zones.push(zone);
        &self.zones[self.zones.len() - 1]
    }

    pub fn update_zone(&mut self, zone: Zone) -> bool {
        let zone = zone.sanitized();
        match self.zones.iter_mut().find(|existing| existing.id == zone.id) {
            Some(existing) => {
                *existing = zone;
                true
            }
            None => false,
        }
    }

    pub fn remove_zone(&mut self, id: &ZoneId) -> Option<Zone> {
        let index = self.zones.iter().position(|zone| &zone.id == id)?;
        Some(self.zones.remove(index))
    }

    pub fn list_zones(&self) -> &[Zone] {
        &self.zones
    }

    pub fn zones_at(&self, position: GridPosition) -> Vec<&Zone> {
        self.zones
            .iter()
            .filter(|zone| zone.footprint.contains(position))
            .collect()
    }

    pub fn into_zones(self) -> Vec<Zone> {
        self.zones
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::occupancy::OccupancyTracker;

    #[test]
    fn footprint_clamps_instead_of_rejecting() {
        let footprint = ZoneFootprint::clamped(6, 10, 5, 0);
        assert_eq!(
            footprint,
            ZoneFootprint {
                start_row: 6,
                start_col: 10,
                row_span: 2,
                col_span: 1,
            }
        );
        let footprint = ZoneFootprint::clamped(-4, 40, 3, 3);
        assert_eq!(footprint.start_row, 0);
        assert_eq!(footprint.start_col, 11);
        assert_eq!(footprint.col_span, 1);
    }

    #[test]
    fn zones_may_overlap() {
        let mut overlay = ZoneOverlay::default();
        overlay.add_zone(Zone::new(
            "North Hall",
            "#3b82f6",
            ZoneFootprint::clamped(0, 0, 4, 6),
        ));
        overlay.add_zone(Zone::new(
            "Sponsors",
            "#f59e0b",
            ZoneFootprint::clamped(2, 4, 2, 4),
        ));
        let hits = overlay.zones_at(GridPosition::new(3, 5).unwrap());
        assert_eq!(hits.len(), 2);
    }

    #[test]
    fn zone_does_not_affect_occupancy() {
        let mut overlay = ZoneOverlay::default();
        overlay.add_zone(Zone::new("", "", ZoneFootprint::clamped(0, 0, 8, 12)));
        let tracker: OccupancyTracker<&str> = OccupancyTracker::new();
        let position = GridPosition::new(4, 4).unwrap();
        assert_eq!(overlay.zones_at(position).len(), 1);
        assert!(!tracker.is_occupied(position));
        assert_eq!(overlay.list_zones()[0].name, "Zone");
        assert_eq!(overlay.list_zones()[0].color, ZONE_SWATCHES[0]);
    }

    #[test]
    fn update_and_remove_by_id() {
        let mut overlay = ZoneOverlay::default();
        let id = overlay
            .add_zone(Zone::new("Gym", "#22c55e", ZoneFootprint::clamped(0, 0, 1, 1)))
            .id
            .clone();
        let mut edited = overlay.list_zones()[0].clone();
        edited.name = "  Main Gym ".into();
        assert!(overlay.update_zone(edited));
        assert_eq!(overlay.list_zones()[0].name, "Main Gym");
        assert!(overlay.remove_zone(&id).is_some());
        assert!(overlay.remove_zone(&id).is_none());
        assert!(overlay.list_zones().is_empty());
    }

    #[test]
    fn footprint_maps_to_canvas_rect() {
        let mapper = GridMapper::default();
        let rect = ZoneFootprint::clamped(1, 2, 2, 3).to_rect(&mapper);
        assert_eq!(rect, CanvasRect::new(200.0, 100.0, 300.0, 200.0));
    }

    #[test]
    fn long_multibyte_color_is_cut_on_a_char_boundary() {
        let zone = Zone::new("North Hall", "€".repeat(11), ZoneFootprint::clamped(0, 0, 1, 1));
        assert_eq!(zone.color, "€".repeat(11));
        let zone = Zone::new("North Hall", "é".repeat(40), ZoneFootprint::clamped(0, 0, 1, 1));
        assert_eq!(zone.color.chars().count(), 32);
        let overlay = ZoneOverlay::new(vec![Zone {
            color: "ü".repeat(50),
            ..zone
        }]);
        assert_eq!(overlay.list_zones()[0].color, "ü".repeat(32));
    }

    #[test]
    fn unnormalized_footprint_at_the_edge_does_not_overflow() {
        let footprint = ZoneFootprint {
            start_row: 200,
            start_col: 200,
            row_span: 200,
            col_span: 200,
        };
        assert!(!footprint.contains(GridPosition::new(7, 11).unwrap()));
        let whole = ZoneFootprint {
            start_row: 0,
            start_col: 0,
            row_span: u8::MAX,
            col_span: u8::MAX,
        };
        assert!(whole.contains(GridPosition::new(7, 11).unwrap()));
    }
}
