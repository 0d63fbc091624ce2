use bincode::{Decode, Encode};
use serde::{Deserialize, Serialize};

pub mod attendee;
pub mod grid;
pub mod model;
pub mod occupancy;
pub mod plan_format;
pub mod zone;

pub use grid::{
    CellSize, GridMapper, GridPosition, CANVAS_HEIGHT, CANVAS_WIDTH, GRID_COLS, GRID_ROWS,
};
pub use model::{
    Booth, BoothDetails, BoothFeatures, BoothId, BoothRecord, EventId, FloorPlan, FloorPlanId,
    ModelError, OrgType, Placement, SponsorTier, VenueId,
};
pub use occupancy::OccupancyTracker;
pub use plan_format::{decode_plan_file, encode_plan_file, PlanFileData, PlanFileDecodeError};
pub use zone::{Zone, ZoneFootprint, ZoneId, ZoneOverlay, ZONE_SWATCHES};

/// A point on the logical floor-plan canvas.
#[derive(Serialize, Deserialize, Encode, Decode, Clone, Copy, Debug, PartialEq)]
pub struct CanvasPoint {
    pub x: f64,
    pub y: f64,
}

impl CanvasPoint {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn is_finite(self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }
}

/// Axis-aligned booth rectangle. `depth` is the vertical extent on the canvas.
#[derive(Serialize, Deserialize, Encode, Decode, Clone, Copy, Debug, PartialEq)]
pub struct CanvasRect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub depth: f64,
}

impl CanvasRect {
    pub fn new(x: f64, y: f64, width: f64, depth: f64) -> Self {
        Self {
            x,
            y,
            width,
            depth,
        }
    }

    pub fn right(&self) -> f64 {
        self.x + self.width
    }

    pub fn bottom(&self) -> f64 {
        self.y + self.depth
    }

    pub fn center(&self) -> CanvasPoint {
        CanvasPoint {
            x: self.x + self.width / 2.0,
            y: self.y + self.depth / 2.0,
        }
    }

    pub fn contains(&self, point: CanvasPoint) -> bool {
        point.x >= self.x && point.x <= self.right() && point.y >= self.y && point.y <= self.bottom()
    }

    /// Strict overlap; rectangles that only share an edge do not intersect.
    pub fn intersects(&self, other: &CanvasRect) -> bool {
        self.x < other.right()
            && other.x < self.right()
            && self.y < other.bottom()
            && other.y < self.bottom()
    }

    pub fn translated(&self, dx: f64, dy: f64) -> Self {
        Self {
            x: self.x + dx,
            y: self.y + dy,
            ..*self
        }
    }

    pub fn is_valid(&self) -> bool {
        self.x.is_finite()
            && self.y.is_finite()
            && self.width.is_finite()
            && self.depth.is_finite()
            && self.width > 0.0
            && self.depth > 0.0
    }
}

/// Change-feed frames pushed to every editor connected to an event.
///
/// The feed only tells clients *what kind* of data moved; they re-fetch it.
#[derive(Serialize, Deserialize, Encode, Decode, Clone, Debug, PartialEq)]
#[serde(tag = "type")]
pub enum ServerMessage {
    #[serde(rename = "welcome")]
    Welcome { connection_id: String },
    #[serde(rename = "booths:changed")]
    BoothsChanged { event_id: String },
    #[serde(rename = "zones:changed")]
    ZonesChanged { event_id: String },
    #[serde(rename = "floor_plan:changed")]
    FloorPlanChanged { event_id: String },
}

impl ServerMessage {
    pub fn kind(&self) -> &'static str {
        match self {
            ServerMessage::Welcome { .. } => "welcome",
            ServerMessage::BoothsChanged { .. } => "booths:changed",
            ServerMessage::ZonesChanged { .. } => "zones:changed",
            ServerMessage::FloorPlanChanged { .. } => "floor_plan:changed",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn edge_contact_is_not_overlap() {
        let a = CanvasRect::new(0.0, 0.0, 60.0, 60.0);
        let b = CanvasRect::new(60.0, 0.0, 60.0, 60.0);
        assert!(!a.intersects(&b));
        assert!(a.intersects(&b.translated(-1.0, 0.0)));
    }

    #[test]
    fn server_message_json_uses_type_tag() {
        let message = ServerMessage::BoothsChanged {
            event_id: "expo-2024".into(),
        };
        let json = serde_json::to_string(&message).unwrap();
        assert_eq!(json, r#"{"type":"booths:changed","event_id":"expo-2024"}"#);
    }

    #[test]
    fn server_message_bincode_frame_decodes() {
        let message = ServerMessage::ZonesChanged {
            event_id: "fair".into(),
        };
        let bytes = bincode::encode_to_vec(&message, bincode::config::standard()).unwrap();
        let (decoded, _): (ServerMessage, usize) =
            bincode::decode_from_slice(&bytes, bincode::config::standard()).unwrap();
        assert_eq!(decoded, message);
    }
}
