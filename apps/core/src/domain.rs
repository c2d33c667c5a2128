use serde::{Deserialize, Deserializer, Serialize};

/// Look-ahead window sent with every new subscription.
pub const DATE_RANGE_DAYS: u32 = 30;

/// Device family the user picked on the welcome screen. Only drives which
/// setup instructions are shown.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Platform {
    Iphone,
    Android,
    Desktop,
}

impl Platform {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Iphone => "iphone",
            Self::Android => "android",
            Self::Desktop => "desktop",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_lowercase().as_str() {
            "iphone" | "ios" => Some(Self::Iphone),
            "android" => Some(Self::Android),
            "desktop" => Some(Self::Desktop),
            _ => None,
        }
    }
}

/// Appointment category as served by `GET /categories`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    pub key: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
}

/// Body of `POST /subscriptions`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubscriptionRequest {
    pub user_id: String,
    /// JSON-serialized push subscription, `null` when push is unavailable.
    pub push_subscription: Option<String>,
    pub categories: Vec<String>,
    pub locations: Vec<String>,
    pub date_range_days: u32,
}

/// Subscription as returned by `GET /subscriptions/{user_id}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubscriptionRecord {
    #[serde(default)]
    pub user_id: String,
    #[serde(default)]
    pub categories: Vec<String>,
    #[serde(default)]
    pub locations: Vec<String>,
    #[serde(default = "default_date_range")]
    pub date_range_days: u32,
    #[serde(default)]
    pub created_at: Option<String>,
}

const fn default_date_range() -> u32 {
    DATE_RANGE_DAYS
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct VapidKeyResponse {
    pub public_key: String,
}

/// One row of the `last_check.json` snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AvailabilityEntry {
    pub category: String,
    pub location_name: String,
    #[serde(default)]
    pub last_checked: Option<String>,
    #[serde(default, deserialize_with = "lenient_count")]
    pub slots_count: u64,
}

// The snapshot writer occasionally emits null or strings here; anything that
// is not a non-negative integer counts as zero slots.
fn lenient_count<'de, D>(deserializer: D) -> Result<u64, D::Error>
where
    D: Deserializer<'de>,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    Ok(value.as_u64().unwrap_or(0))
}

/// Turns `driver_license` into `Driver License`.
pub fn format_category_label(key: &str) -> String {
    key.split('_')
        .map(|part| {
            let mut chars = part.chars();
            chars.next().map_or_else(String::new, |first| {
                first.to_uppercase().chain(chars).collect::<String>()
            })
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// Offices the monitor checks. Fixed per deployment.
pub const NC_LOCATIONS: &[&str] = &[
    "Aberdeen",
    "Ahoskie",
    "Albemarle",
    "Andrews",
    "Asheboro",
    "Asheville",
    "Boone",
    "Brevard",
    "Bryson City",
    "Burgaw",
    "Burnsville",
    "Carrboro",
    "Cary",
    "Charlotte East",
    "Charlotte North",
    "Charlotte South",
    "Charlotte West",
    "Clayton",
    "Clinton",
    "Clyde",
    "Concord",
    "Durham East",
    "Durham South",
    "Elizabeth City",
    "Elizabethtown",
    "Elkin",
    "Erwin",
    "Fayetteville South",
    "Fayetteville West",
    "Forest City",
    "Franklin",
    "Fuquay-Varina",
    "Garner",
    "Gastonia",
    "Goldsboro",
    "Graham",
    "Greensboro East",
    "Greensboro West",
    "Greenville",
    "Hamlet",
    "Havelock",
    "Henderson",
    "Hendersonville",
    "Hickory",
    "High Point",
    "Hillsborough",
    "Hudson",
    "Huntersville",
    "Jacksonville",
    "Jefferson",
    "Kernersville",
    "Kinston",
    "Lexington",
    "Lincolnton",
    "Louisburg",
    "Lumberton",
    "Marion",
    "Marshall",
    "Mocksville",
    "Monroe",
    "Mooresville",
    "Morehead City",
    "Morganton",
    "Mount Airy",
    "Mount Holly",
    "Nags Head",
    "New Bern",
    "Newton",
    "Oxford",
    "Polkton",
    "Raleigh North",
    "Raleigh West",
    "Roanoke Rapids",
    "Rocky Mount",
    "Roxboro",
    "Salisbury",
    "Sanford",
    "Shallotte",
    "Shelby",
    "Siler City",
    "Smithfield",
    "Statesville",
    "Stedman",
    "Sylva",
    "Tarboro",
    "Taylorsville",
    "Thomasville",
    "Troy",
    "Washington",
    "Wendell",
    "Wentworth",
    "Whiteville",
    "Wilkesboro",
    "Williamston",
    "Wilmington North",
    "Wilmington South",
    "Wilson",
    "Winston Salem North",
    "Winston Salem South",
    "Yadkinville",
];
