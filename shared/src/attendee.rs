//! Helpers for the read-only attendee map and exhibitor directory.

use crate::grid::GridMapper;
use crate::model::{Booth, OrgType, Placement, SponsorTier};
use crate::CanvasRect;

/// Where a booth is drawn on the 1200x800 canvas, whichever model placed it.
pub fn footprint(placement: &Placement, mapper: &GridMapper) -> CanvasRect {
    match placement {
        Placement::Grid(position) => mapper.cell_rect(*position),
        Placement::Canvas(rect) => *rect,
    }
}

#[derive(Clone, Debug, Default)]
pub struct AttendeeFilter {
    pub query: String,
    pub org_type: Option<OrgType>,
    pub sponsor_tier: Option<SponsorTier>,
    pub on_spot_admission_only: bool,
    pub fee_waived_only: bool,
}

impl AttendeeFilter {
    pub fn matches(&self, booth: &Booth) -> bool {
        let details = &booth.details;
        if let Some(org_type) = self.org_type {
            if details.org_type != org_type {
                return false;
            }
        }
        if let Some(tier) = self.sponsor_tier {
            if details.sponsor_tier != tier {
                return false;
            }
        }
        if self.on_spot_admission_only && !details.features.on_spot_admission {
            return false;
        }
        if self.fee_waived_only && !details.features.application_fee_waived {
            return false;
        }
        let query = self.query.trim().to_lowercase();
        if query.is_empty() {
            return true;
        }
        details.org_name.to_lowercase().contains(&query)
            || details
                .table_no
                .as_deref()
                .is_some_and(|table| table.to_lowercase() == query)
    }
}

/// Sponsors first by tier, then alphabetical.
pub fn sort_for_directory(booths: &mut [Booth]) {
    booths.sort_by(|a, b| {
        a.details
            .sponsor_tier
            .rank()
            .cmp(&b.details.sponsor_tier.rank())
            .then_with(|| {
                a.details
                    .org_name
                    .to_lowercase()
                    .cmp(&b.details.org_name.to_lowercase())
            })
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::GridPosition;
    use crate::model::{BoothDetails, BoothFeatures, BoothId, EventId};

    fn booth(name: &str, tier: SponsorTier, org_type: OrgType, on_spot: bool) -> Booth {
        Booth {
            id: BoothId::generate(),
            event_id: EventId::from("expo"),
            placement: Placement::Grid(GridPosition::new(0, 0).unwrap()),
            details: BoothDetails {
                org_name: name.into(),
                org_type,
                sponsor_tier: tier,
                table_no: Some("12".into()),
                features: BoothFeatures {
                    on_spot_admission: on_spot,
                    ..BoothFeatures::default()
                },
            },
        }
    }

    #[test]
    fn filter_combines_conditions() {
        let morehouse = booth("Morehouse College", SponsorTier::Unsponsored, OrgType::College, true);
        let army = booth("US Army", SponsorTier::Gold, OrgType::Military, false);
        let filter = AttendeeFilter {
            query: "college".into(),
            on_spot_admission_only: true,
            ..AttendeeFilter::default()
        };
        assert!(filter.matches(&morehouse));
        assert!(!filter.matches(&army));
        let filter = AttendeeFilter {
            org_type: Some(OrgType::Military),
            ..AttendeeFilter::default()
        };
        assert!(filter.matches(&army));
        let by_table = AttendeeFilter {
            query: "12".into(),
            ..AttendeeFilter::default()
        };
        assert!(by_table.matches(&army));
    }

    #[test]
    fn directory_lists_sponsors_first() {
        let mut booths = vec![
            booth("zeta", SponsorTier::Unsponsored, OrgType::College, false),
            booth("Alpha", SponsorTier::Unsponsored, OrgType::College, false),
            booth("Beta Corp", SponsorTier::Platinum, OrgType::Sponsor, false),
        ];
        sort_for_directory(&mut booths);
        let names = booths
            .iter()
            .map(|booth| booth.details.org_name.as_str())
            .collect::<Vec<_>>();
        assert_eq!(names, vec!["Beta Corp", "Alpha", "zeta"]);
    }

    #[test]
    fn grid_footprint_uses_cell_rect() {
        let mapper = GridMapper::default();
        let placement = Placement::Grid(GridPosition::new(2, 5).unwrap());
        assert_eq!(
            footprint(&placement, &mapper),
            CanvasRect::new(500.0, 200.0, 100.0, 100.0)
        );
    }
}
