use serde::{Deserialize, Serialize};

/// Permission grant implied by applying any location configuration.
pub const GEOLOCATION_PERMISSION: &str = "geolocation";

const MOBILE_USER_AGENT: &str = "Mozilla/5.0 (iPhone; CPU iPhone OS 15_0 like Mac OS X) \
AppleWebKit/605.1.15 (KHTML, like Gecko) Version/15.0 Mobile/15E148 Safari/604.1";
const DESKTOP_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) \
AppleWebKit/537.36 (KHTML, like Gecko) Chrome/91.0.4472.124 Safari/537.36";

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
/// A named, reusable configuration fragment attachable to a test case.
pub enum ConfigTag {
    Mobile,
    Desktop,
    London,
    #[serde(rename = "newyork")]
    NewYork,
    Skip,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum DeviceTag {
    Mobile,
    Desktop,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum LocationTag {
    London,
    #[serde(rename = "newyork")]
    NewYork,
}

impl ConfigTag {
    pub fn as_keyword(&self) -> &'static str {
        match self {
            Self::Mobile => "mobile",
            Self::Desktop => "desktop",
            Self::London => "london",
            Self::NewYork => "newyork",
            Self::Skip => "skip",
        }
    }

    pub fn from_keyword(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "mobile" => Some(Self::Mobile),
            "desktop" => Some(Self::Desktop),
            "london" => Some(Self::London),
            "newyork" | "new_york" => Some(Self::NewYork),
            "skip" => Some(Self::Skip),
            _ => None,
        }
    }
}

impl From<DeviceTag> for ConfigTag {
    fn from(tag: DeviceTag) -> Self {
        match tag {
            DeviceTag::Mobile => Self::Mobile,
            DeviceTag::Desktop => Self::Desktop,
        }
    }
}

impl From<LocationTag> for ConfigTag {
    fn from(tag: LocationTag) -> Self {
        match tag {
            LocationTag::London => Self::London,
            LocationTag::NewYork => Self::NewYork,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
/// Browsing-context parameters for one device profile.
pub struct DeviceConfig {
    pub viewport_width: u32,
    pub viewport_height: u32,
    pub user_agent: String,
    pub is_mobile: bool,
    pub has_touch: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
/// Geolocation coordinates for one location profile.
pub struct LocationConfig {
    pub latitude: f64,
    pub longitude: f64,
    #[serde(default)]
    pub accuracy: Option<f64>,
}

/// Looks up the catalog entry for a device tag. Returns an owned copy so a
/// consumer mutating its configuration cannot corrupt the catalog.
pub fn device_config(tag: DeviceTag) -> DeviceConfig {
    match tag {
        DeviceTag::Mobile => DeviceConfig {
            viewport_width: 375,
            viewport_height: 667,
            user_agent: MOBILE_USER_AGENT.to_string(),
            is_mobile: true,
            has_touch: true,
        },
        DeviceTag::Desktop => DeviceConfig {
            viewport_width: 1920,
            viewport_height: 1080,
            user_agent: DESKTOP_USER_AGENT.to_string(),
            is_mobile: false,
            has_touch: false,
        },
    }
}

/// Looks up the catalog entry for a location tag. Returns an owned copy.
pub fn location_config(tag: LocationTag) -> LocationConfig {
    match tag {
        LocationTag::London => LocationConfig {
            latitude: 51.5074,
            longitude: -0.1278,
            accuracy: Some(100.0),
        },
        LocationTag::NewYork => LocationConfig {
            latitude: 40.7128,
            longitude: -74.0060,
            accuracy: Some(100.0),
        },
    }
}
