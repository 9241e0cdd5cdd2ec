//! Sample data generation.

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use serde::Serialize;
use tradebook_core::{Client, NewClient, NewVendor, RecordStore, Vendor};

use crate::error::Error;

/// Default number of clients to generate.
pub const DEFAULT_CLIENTS: usize = 100;

/// The vendors every seeded store starts with, in id order.
pub const VENDOR_NAMES: [&str; 10] = [
    "ABC Home",
    "Schoolhouse Electric",
    "Serena & Lily",
    "Crate & Barrel",
    "Room & Board",
    "DWR",
    "CB2",
    "Restoration Hardware",
    "Dwell Studio",
    "Some thrift shop in Williamsburg",
];

const FIRST_NAMES: &[&str] = &[
    "Ada", "Bea", "Cal", "Dev", "Eli", "Fay", "Gus", "Hal", "Ivy", "Joe", "Kit", "Lou", "Mae",
    "Ned", "Ora", "Pia", "Quinn", "Roy", "Sue", "Ty", "Uma", "Vic", "Wes", "Xia", "Yan", "Zoe",
];

const LAST_NAMES: &[&str] = &[
    "Abbott", "Baker", "Chen", "Diaz", "Evans", "Fischer", "Garcia", "Hughes", "Ito", "Jensen",
    "Kwon", "Lopez", "Moreau", "Novak", "Okafor", "Patel", "Reyes", "Silva", "Tanaka", "Weber",
];

/// What a seed run created.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SeedReport {
    pub clients: usize,
    pub vendors: usize,
    /// Ids that already existed and were left alone.
    pub skipped: usize,
}

/// Generates clients and vendors with fixed ids.
pub struct Seeder {
    rng: StdRng,
}

impl Seeder {
    /// Seeder with a fixed seed, or from entropy when `None`.
    pub fn new(seed: Option<u64>) -> Self {
        let rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Self { rng }
    }

    /// Email of the `n`th seeded client.
    pub fn client_email(n: usize) -> String {
        format!("aspiring_home-lover{}@example.com", n)
    }

    fn client_name(&mut self) -> String {
        let first = FIRST_NAMES.choose(&mut self.rng).copied().unwrap_or("Ada");
        let last = LAST_NAMES.choose(&mut self.rng).copied().unwrap_or("Abbott");
        format!("{} {}", first, last)
    }

    /// Create clients `1..=clients` and the ten vendors, skipping ids that
    /// are already taken.
    pub fn run(&mut self, store: &RecordStore, clients: usize) -> Result<SeedReport, Error> {
        let mut report = SeedReport::default();

        for n in 1..=clients {
            let id = n as u64;
            if store.get::<Client>(id)?.is_some() {
                report.skipped += 1;
                continue;
            }
            let draft = NewClient::new(self.client_name(), Self::client_email(n))
                .with_id(id)
                .with_active(Some(self.rng.gen_bool(0.5)));
            store.create::<Client>(draft)?;
            report.clients += 1;
        }

        for (i, name) in VENDOR_NAMES.iter().enumerate() {
            let id = i as u64 + 1;
            if store.get::<Vendor>(id)?.is_some() {
                report.skipped += 1;
                continue;
            }
            let draft = NewVendor::new(*name, self.rng.gen_bool(0.5)).with_id(id);
            store.create::<Vendor>(draft)?;
            report.vendors += 1;
        }

        tracing::info!(
            clients = report.clients,
            vendors = report.vendors,
            skipped = report.skipped,
            "seed complete"
        );
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tradebook_core::StorageConfig;

    #[test]
    fn test_seed_creates_fixed_ids() {
        let store = RecordStore::open(StorageConfig::temporary()).unwrap();
        let report = Seeder::new(Some(7)).run(&store, 5).unwrap();

        assert_eq!(report, SeedReport { clients: 5, vendors: 10, skipped: 0 });
        let third = store.get::<Client>(3).unwrap().unwrap();
        assert_eq!(third.email, "aspiring_home-lover3@example.com");
        assert_eq!(store.get::<Vendor>(10).unwrap().unwrap().name, VENDOR_NAMES[9]);
    }

    #[test]
    fn test_seed_twice_skips_existing() {
        let store = RecordStore::open(StorageConfig::temporary()).unwrap();
        Seeder::new(Some(1)).run(&store, 3).unwrap();
        let report = Seeder::new(Some(2)).run(&store, 4).unwrap();

        assert_eq!(report.clients, 1);
        assert_eq!(report.vendors, 0);
        assert_eq!(report.skipped, 13);
    }

    #[test]
    fn test_same_seed_same_data() {
        let a = RecordStore::open(StorageConfig::temporary()).unwrap();
        let b = RecordStore::open(StorageConfig::temporary()).unwrap();
        Seeder::new(Some(42)).run(&a, 10).unwrap();
        Seeder::new(Some(42)).run(&b, 10).unwrap();

        let names = |s: &RecordStore| {
            s.list::<Client>()
                .unwrap()
                .into_iter()
                .map(|c| (c.name, c.active))
                .collect::<Vec<_>>()
        };
        assert_eq!(names(&a), names(&b));
    }
}
