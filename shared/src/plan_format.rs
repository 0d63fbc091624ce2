use bincode::{Decode, Encode};
use thiserror::Error;

use crate::model::{BoothRecord, FloorPlan};
use crate::zone::Zone;

pub const PLAN_FILE_MAGIC: [u8; 4] = *b"FPLN";
pub const PLAN_FILE_VERSION: u32 = 1;
const PLAN_HEADER_LEN: usize = PLAN_FILE_MAGIC.len() + std::mem::size_of::<u32>();

/// Everything stored for one event: the floor plan, its booths and zones.
#[derive(Clone, Debug, Default, PartialEq, Encode, Decode, serde::Serialize, serde::Deserialize)]
pub struct PlanFileData {
    pub floor_plan: Option<FloorPlan>,
    pub booths: Vec<BoothRecord>,
    pub zones: Vec<Zone>,
}

#[derive(Debug, Error, PartialEq)]
pub enum PlanFileDecodeError {
    #[error("unsupported plan file version {0}")]
    UnsupportedVersion(u32),
    #[error("invalid plan file data")]
    InvalidData,
}

pub fn encode_plan_file(data: &PlanFileData) -> Vec<u8> {
    let mut payload = Vec::new();
    payload.extend_from_slice(&PLAN_FILE_MAGIC);
    payload.extend_from_slice(&PLAN_FILE_VERSION.to_le_bytes());
    let body = bincode::encode_to_vec(data, bincode::config::standard()).unwrap_or_default();
    payload.extend_from_slice(&body);
    payload
}

pub fn decode_plan_file(payload: &[u8]) -> Result<PlanFileData, PlanFileDecodeError> {
    if !(payload.len() >= PLAN_HEADER_LEN && payload.starts_with(&PLAN_FILE_MAGIC)) {
        return Err(PlanFileDecodeError::InvalidData);
    }
    let version = u32::from_le_bytes(
        payload[PLAN_FILE_MAGIC.len()..PLAN_HEADER_LEN]
            .try_into()
            .map_err(|_| PlanFileDecodeError::InvalidData)?,
    );
    let body = &payload[PLAN_HEADER_LEN..];
    match version {
        1 => bincode::decode_from_slice(body, bincode::config::standard())
            .map(|(data, _)| data)
            .map_err(|_| PlanFileDecodeError::InvalidData),
        _ => Err(PlanFileDecodeError::UnsupportedVersion(version)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{EventId, VenueId};
    use crate::zone::ZoneFootprint;

    #[test]
    fn stored_plan_reads_back() {
        let data = PlanFileData {
            floor_plan: Some(FloorPlan::new(EventId::from("expo"), VenueId::from("gym"))),
            booths: vec![BoothRecord {
                id: "b1".into(),
                event_id: "expo".into(),
                grid_row: Some(1),
                grid_col: Some(4),
                org_name: "Spelman College".into(),
                ..BoothRecord::default()
            }],
            zones: vec![Zone::new(
                "North Hall",
                "#3b82f6",
                ZoneFootprint::clamped(0, 0, 2, 12),
            )],
        };
        let bytes = encode_plan_file(&data);
        assert!(bytes.starts_with(b"FPLN"));
        assert_eq!(decode_plan_file(&bytes), Ok(data));
    }

    #[test]
    fn rejects_foreign_and_future_files() {
        assert_eq!(
            decode_plan_file(b"PLAN\x01\x00\x00\x00"),
            Err(PlanFileDecodeError::InvalidData)
        );
        assert_eq!(decode_plan_file(b"FPL"), Err(PlanFileDecodeError::InvalidData));
        let mut future = PLAN_FILE_MAGIC.to_vec();
        future.extend_from_slice(&7u32.to_le_bytes());
        assert_eq!(
            decode_plan_file(&future),
            Err(PlanFileDecodeError::UnsupportedVersion(7))
        );
    }
}
