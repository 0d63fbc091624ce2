//! Typed booth, floor-plan and store-row definitions.

use std::fmt;

use bincode::{Decode, Encode};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::grid::{GridPosition, CANVAS_HEIGHT, CANVAS_WIDTH};
use crate::CanvasRect;

macro_rules! string_id {
    ($name:ident) => {
        #[derive(
            Serialize, Deserialize, Encode, Decode, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord,
        )]
        #[serde(transparent)]
        pub struct $name(pub String);

        impl $name {
            pub fn new(value: impl Into<String>) -> Self {
                Self(value.into())
            }

            pub fn generate() -> Self {
                Self(uuid::Uuid::new_v4().to_string())
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<&str> for $name {
            fn from(value: &str) -> Self {
                Self(value.to_string())
            }
        }
    };
}

string_id!(EventId);
string_id!(BoothId);
string_id!(VenueId);
string_id!(FloorPlanId);
string_id!(ZoneId);

#[derive(Debug, Error, PartialEq)]
pub enum ModelError {
    #[error("booth {0} has neither a grid cell nor a canvas rectangle")]
    MissingPlacement(String),
    #[error("grid cell ({row}, {col}) is outside the 8x12 grid")]
    GridOutOfBounds { row: i32, col: i32 },
    #[error("booth {0} has an invalid canvas rectangle")]
    InvalidRect(String),
    #[error("booth id must be between 1 and 64 characters")]
    InvalidId,
}

#[derive(Serialize, Deserialize, Encode, Decode, Clone, Copy, Debug, PartialEq)]
pub enum Placement {
    Grid(GridPosition),
    Canvas(CanvasRect),
}

#[derive(
    Serialize, Deserialize, Encode, Decode, Clone, Copy, Debug, Default, PartialEq, Eq, Hash,
)]
#[serde(rename_all = "lowercase")]
pub enum OrgType {
    College,
    Military,
    Sponsor,
    #[default]
    Other,
}

#[derive(
    Serialize, Deserialize, Encode, Decode, Clone, Copy, Debug, Default, PartialEq, Eq, Hash,
)]
#[serde(rename_all = "lowercase")]
pub enum SponsorTier {
    Platinum,
    Gold,
    Silver,
    Bronze,
    #[default]
    #[serde(rename = "none")]
    Unsponsored,
}

impl SponsorTier {
    /// Lower ranks are listed first.
    pub fn rank(self) -> u8 {
        match self {
            SponsorTier::Platinum => 0,
            SponsorTier::Gold => 1,
            SponsorTier::Silver => 2,
            SponsorTier::Bronze => 3,
            SponsorTier::Unsponsored => 4,
        }
    }
}

#[derive(Serialize, Deserialize, Encode, Decode, Clone, Debug, Default, PartialEq)]
pub struct BoothFeatures {
    pub on_spot_admission: bool,
    pub application_fee_waived: bool,
    pub scholarship: Option<String>,
}

#[derive(Serialize, Deserialize, Encode, Decode, Clone, Debug, Default, PartialEq)]
pub struct BoothDetails {
    pub org_name: String,
    pub org_type: OrgType,
    pub sponsor_tier: SponsorTier,
    pub table_no: Option<String>,
    pub features: BoothFeatures,
}

#[derive(Serialize, Deserialize, Encode, Decode, Clone, Debug, PartialEq)]
pub struct Booth {
    pub id: BoothId,
    pub event_id: EventId,
    pub placement: Placement,
    pub details: BoothDetails,
}

/// Flat row shape of the booth table in the shared store.
#[derive(Serialize, Deserialize, Encode, Decode, Clone, Debug, Default, PartialEq)]
pub struct BoothRecord {
    pub id: String,
    pub event_id: String,
    #[serde(default)]
    pub grid_row: Option<i32>,
    #[serde(default)]
    pub grid_col: Option<i32>,
    #[serde(default)]
    pub x_position: Option<f64>,
    #[serde(default)]
    pub y_position: Option<f64>,
    #[serde(default)]
    pub booth_width: Option<f64>,
    #[serde(default)]
    pub booth_depth: Option<f64>,
    #[serde(default)]
    pub table_no: Option<String>,
    #[serde(default)]
    pub org_name: String,
    #[serde(default)]
    pub org_type: OrgType,
    #[serde(default)]
    pub sponsor_tier: SponsorTier,
    #[serde(default)]
    pub on_spot_admission: bool,
    #[serde(default)]
    pub application_fee_waived: bool,
    #[serde(default)]
    pub scholarship_info: Option<String>,
}

impl BoothRecord {
    pub fn grid_position(&self) -> Option<GridPosition> {
        let (row, col) = (self.grid_row?, self.grid_col?);
        GridPosition::new(u8::try_from(row).ok()?, u8::try_from(col).ok()?)
    }
}

impl From<&Booth> for BoothRecord {
    fn from(booth: &Booth) -> Self {
        let mut record = BoothRecord {
            id: booth.id.0.clone(),
            event_id: booth.event_id.0.clone(),
            table_no: booth.details.table_no.clone(),
            org_name: booth.details.org_name.clone(),
            org_type: booth.details.org_type,
            sponsor_tier: booth.details.sponsor_tier,
            on_spot_admission: booth.details.features.on_spot_admission,
            application_fee_waived: booth.details.features.application_fee_waived,
            scholarship_info: booth.details.features.scholarship.clone(),
            ..BoothRecord::default()
        };
        match booth.placement {
            Placement::Grid(position) => {
                record.grid_row = Some(position.row as i32);
                record.grid_col = Some(position.col as i32);
            }
            Placement::Canvas(rect) => {
                record.x_position = Some(rect.x);
                record.y_position = Some(rect.y);
                record.booth_width = Some(rect.width);
                record.booth_depth = Some(rect.depth);
            }
        }
        record
    }
}

impl TryFrom<BoothRecord> for Booth {
    type Error = ModelError;

    fn try_from(record: BoothRecord) -> Result<Self, Self::Error> {
        if record.id.is_empty() || record.id.len() > 64 {
            return Err(ModelError::InvalidId);
        }
        let placement = match (record.grid_row, record.grid_col) {
            (Some(row), Some(col)) => {
                let position = record
                    .grid_position()
                    .ok_or(ModelError::GridOutOfBounds { row, col })?;
                Placement::Grid(position)
            }
            _ => match (
                record.x_position,
                record.y_position,
                record.booth_width,
                record.booth_depth,
            ) {
                (Some(x), Some(y), Some(width), Some(depth)) => {
                    let rect = CanvasRect::new(x, y, width, depth);
                    if !rect.is_valid() {
                        return Err(ModelError::InvalidRect(record.id));
                    }
                    Placement::Canvas(rect)
                }
                _ => return Err(ModelError::MissingPlacement(record.id)),
            },
        };
        Ok(Booth {
            id: BoothId(record.id),
            event_id: EventId(record.event_id),
            placement,
            details: BoothDetails {
                org_name: record.org_name,
                org_type: record.org_type,
                sponsor_tier: record.sponsor_tier,
                table_no: record.table_no,
                features: BoothFeatures {
                    on_spot_admission: record.on_spot_admission,
                    application_fee_waived: record.application_fee_waived,
                    scholarship: record.scholarship_info,
                },
            },
        })
    }
}

#[derive(Serialize, Deserialize, Encode, Decode, Clone, Debug, PartialEq)]
pub struct FloorPlan {
    pub id: FloorPlanId,
    pub venue_id: VenueId,
    pub event_id: EventId,
    pub background_url: Option<String>,
    pub canvas_width: f64,
    pub canvas_height: f64,
    pub grid_opacity: f64,
}

impl FloorPlan {
    pub fn new(event_id: EventId, venue_id: VenueId) -> Self {
        Self {
            id: FloorPlanId::generate(),
            venue_id,
            event_id,
            background_url: None,
            canvas_width: CANVAS_WIDTH,
            canvas_height: CANVAS_HEIGHT,
            grid_opacity: 0.5,
        }
    }

    pub fn set_grid_opacity(&mut self, opacity: f64) {
        self.grid_opacity = clamp_opacity(opacity);
    }

    /// Repairs values an older or hand-edited row may carry.
    pub fn sanitized(mut self) -> Self {
        self.grid_opacity = clamp_opacity(self.grid_opacity);
        if !(self.canvas_width.is_finite() && self.canvas_width > 0.0) {
            self.canvas_width = CANVAS_WIDTH;
        }
        if !(self.canvas_height.is_finite() && self.canvas_height > 0.0) {
            self.canvas_height = CANVAS_HEIGHT;
        }
        if self.background_url.as_deref() == Some("") {
            self.background_url = None;
        }
        self
    }
}

fn clamp_opacity(value: f64) -> f64 {
    if value.is_finite() {
        value.clamp(0.0, 1.0)
    } else {
        1.0
    }
}
