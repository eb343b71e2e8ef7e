//! Service categories offered on the marketplace

use serde::{Deserialize, Serialize};
use std::fmt;

/// Trade a technician offers.
///
/// Parsing never fails: names outside the known trades are kept verbatim in
/// [`ServiceCategory::Other`] and priced with the default range.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ServiceCategory {
    Electrician,
    Plumber,
    AcRepair,
    Carpenter,
    Painter,
    Maid,
    CarWash,
    Haircut,
    Other(String),
}

impl ServiceCategory {
    /// Trades seeded with the higher-value price window
    pub const CORE: [ServiceCategory; 5] = [
        ServiceCategory::Electrician,
        ServiceCategory::Plumber,
        ServiceCategory::AcRepair,
        ServiceCategory::Carpenter,
        ServiceCategory::Painter,
    ];

    pub const STANDARD: [ServiceCategory; 3] = [
        ServiceCategory::Maid,
        ServiceCategory::CarWash,
        ServiceCategory::Haircut,
    ];

    /// Parse a display name such as `"AC Repair"` or `"car-wash"`.
    pub fn from_name(name: &str) -> Self {
        let key: String = name
            .chars()
            .filter(|c| c.is_ascii_alphanumeric())
            .map(|c| c.to_ascii_lowercase())
            .collect();

        match key.as_str() {
            "electrician" => ServiceCategory::Electrician,
            "plumber" => ServiceCategory::Plumber,
            "acrepair" => ServiceCategory::AcRepair,
            "carpenter" => ServiceCategory::Carpenter,
            "painter" => ServiceCategory::Painter,
            "maid" => ServiceCategory::Maid,
            "carwash" => ServiceCategory::CarWash,
            "haircut" => ServiceCategory::Haircut,
            _ => ServiceCategory::Other(name.trim().to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            ServiceCategory::Electrician => "Electrician",
            ServiceCategory::Plumber => "Plumber",
            ServiceCategory::AcRepair => "AC Repair",
            ServiceCategory::Carpenter => "Carpenter",
            ServiceCategory::Painter => "Painter",
            ServiceCategory::Maid => "Maid",
            ServiceCategory::CarWash => "Car Wash",
            ServiceCategory::Haircut => "Haircut",
            ServiceCategory::Other(name) => name,
        }
    }
}

impl fmt::Display for ServiceCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<String> for ServiceCategory {
    fn from(name: String) -> Self {
        ServiceCategory::from_name(&name)
    }
}

impl From<&str> for ServiceCategory {
    fn from(name: &str) -> Self {
        ServiceCategory::from_name(name)
    }
}

impl From<ServiceCategory> for String {
    fn from(category: ServiceCategory) -> Self {
        category.as_str().to_string()
    }
}
