//! Sample data for demo deployments
//!
//! Six safe zones around Pune: two police stations, two hospitals, two NGOs.

use crate::models::NewSafeZone;
use crate::{Result, Storage};
use tracing::{debug, info};

struct SampleZone {
    name: &'static str,
    kind: &'static str,
    address: &'static str,
    latitude: &'static str,
    longitude: &'static str,
    phone: &'static str,
}

const SAMPLE_SAFE_ZONES: &[SampleZone] = &[
    SampleZone {
        name: "Koregaon Park Police Station",
        kind: "police",
        address: "North Main Road, Koregaon Park, Pune",
        latitude: "18.5314",
        longitude: "73.8927",
        phone: "+91-20-26013000",
    },
    SampleZone {
        name: "Ruby Hall Clinic",
        kind: "hospital",
        address: "Sassoon Road, Pune",
        latitude: "18.5204",
        longitude: "73.8567",
        phone: "+91-20-66455000",
    },
    SampleZone {
        name: "Pune Women's Safety NGO",
        kind: "ngo",
        address: "FC Road, Pune",
        latitude: "18.5074",
        longitude: "73.8077",
        phone: "+91-20-25433000",
    },
    SampleZone {
        name: "Shivajinagar Police Station",
        kind: "police",
        address: "Shivajinagar, Pune",
        latitude: "18.5308",
        longitude: "73.8506",
        phone: "+91-20-25533000",
    },
    SampleZone {
        name: "Jehangir Hospital",
        kind: "hospital",
        address: "Sassoon Road, Near Pune Railway Station",
        latitude: "18.5200",
        longitude: "73.8553",
        phone: "+91-20-66455000",
    },
    SampleZone {
        name: "Mahila Mandal NGO",
        kind: "ngo",
        address: "JM Road, Pune",
        latitude: "18.5158",
        longitude: "73.8283",
        phone: "+91-20-25443000",
    },
];

/// The sample zones as insert payloads
pub fn sample_safe_zones() -> Vec<NewSafeZone> {
    SAMPLE_SAFE_ZONES
        .iter()
        .map(|z| NewSafeZone {
            name: z.name.to_string(),
            kind: z.kind.to_string(),
            address: z.address.to_string(),
            latitude: z.latitude.to_string(),
            longitude: z.longitude.to_string(),
            phone: Some(z.phone.to_string()),
            is_active: true,
        })
        .collect()
}

/// Insert the sample safe zones if the store has none
///
/// Returns how many zones were inserted (0 when zones already existed).
pub async fn seed_safe_zones(storage: &dyn Storage) -> Result<usize> {
    let existing = storage.count_safe_zones().await?;
    if existing > 0 {
        debug!("Skipping safe zone seed: {} zones already present", existing);
        return Ok(0);
    }

    let zones = sample_safe_zones();
    let count = zones.len();
    for zone in zones {
        storage.create_safe_zone(zone).await?;
    }

    info!("Seeded {} sample safe zones", count);
    Ok(count)
}
