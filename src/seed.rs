//! Demo data for the Bihar districts FixMate launches in
//!
//! Seeding is idempotent: a district that already lists two or more technicians
//! is left alone.

use chrono::Utc;
use rand::{rngs::StdRng, Rng, SeedableRng};
use uuid::Uuid;

use crate::pricing::{price_range, ServiceCategory};
use crate::store::{NegotiationStore, StoreResult};
use crate::technician::{Technician, DEFAULT_RATING};

pub const DISTRICTS: [&str; 12] = [
    "Patna",
    "Purnia",
    "Darbhanga",
    "Sitamarhi",
    "Madhubani",
    "Madhepura",
    "Katihar",
    "Saharsa",
    "East Champaran",
    "West Champaran",
    "Begusarai",
    "Barauni",
];

const TECHNICIAN_NAMES: [&str; 15] = [
    "Rohit Kumar",
    "Rahul Singh",
    "Aman Verma",
    "Sumit Yadav",
    "Vikram Gupta",
    "Manoj Tiwari",
    "Sunil Sharma",
    "Pankaj Mishra",
    "Rajesh Ranjan",
    "Anil Paswan",
    "Kavita Devi",
    "Pooja Kumari",
    "Sita Devi",
    "Deepak Kumar",
    "Suresh Singh",
];

/// Districts with fewer technicians than this get a full roster
const MIN_TECHNICIANS_PER_DISTRICT: i64 = 2;

fn demo_technician<R: Rng>(rng: &mut R, district: &str, service: ServiceCategory, core: bool) -> Technician {
    let range = price_range(&service);
    let name = TECHNICIAN_NAMES[rng.gen_range(0..TECHNICIAN_NAMES.len())];
    let (experience_years, bio) = if core {
        (
            rng.gen_range(1..=10),
            format!("Expert {} serving {}.", service, district),
        )
    } else {
        (
            rng.gen_range(1..=5),
            format!("Reliable {} service in {}.", service, district),
        )
    };

    Technician {
        id: Uuid::new_v4(),
        user_id: Uuid::new_v4(),
        name: name.to_string(),
        base_charge: rng.gen_range(range.min..=range.max),
        service_type: service,
        district: district.to_string(),
        experience_years,
        is_verified: true,
        rating: DEFAULT_RATING,
        bio: Some(bio),
        created_at: Utc::now(),
    }
}

/// Roster for one district: one verified technician per core and standard trade.
pub fn district_roster<R: Rng>(rng: &mut R, district: &str) -> Vec<Technician> {
    let core = ServiceCategory::CORE
        .into_iter()
        .map(|service| (service, true));
    let standard = ServiceCategory::STANDARD
        .into_iter()
        .map(|service| (service, false));

    core.chain(standard)
        .map(|(service, is_core)| demo_technician(rng, district, service, is_core))
        .collect()
}

/// Seed every under-populated district. Returns the number of technicians inserted.
pub async fn seed_demo_data(store: &dyn NegotiationStore) -> StoreResult<usize> {
    let mut rng = StdRng::from_entropy();
    let mut inserted = 0;

    for district in DISTRICTS {
        let existing = store.count_technicians_in_district(district).await?;
        if existing >= MIN_TECHNICIANS_PER_DISTRICT {
            tracing::debug!(district, existing, "District already seeded");
            continue;
        }

        for technician in district_roster(&mut rng, district) {
            store.insert_technician(&technician).await?;
            inserted += 1;
        }
        tracing::info!(district, "Seeded demo technicians");
    }

    Ok(inserted)
}
