use serde::{Deserialize, Serialize};

// --- Geo types ---

/// A single geographic point. Vendor line geometries are reduced to their
/// first vertex before they become one of these.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub lon: f64,
    pub lat: f64,
}

impl GeoPoint {
    pub fn new(lon: f64, lat: f64) -> Self {
        Self { lon, lat }
    }
}

/// Axis-aligned bounding box in lon/lat order: min_lon, min_lat, max_lon, max_lat.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub min_lon: f64,
    pub min_lat: f64,
    pub max_lon: f64,
    pub max_lat: f64,
}

impl BoundingBox {
    pub fn new(min_lon: f64, min_lat: f64, max_lon: f64, max_lat: f64) -> Self {
        Self {
            min_lon,
            min_lat,
            max_lon,
            max_lat,
        }
    }

    /// Parse the wire form `minLon,minLat,maxLon,maxLat`.
    pub fn parse(raw: &str) -> Result<Self, String> {
        let parts: Vec<&str> = raw.split(',').map(str::trim).collect();
        if parts.len() != 4 {
            return Err(format!(
                "expected 4 comma-separated numbers, got {}",
                parts.len()
            ));
        }
        let mut nums = [0f64; 4];
        for (i, part) in parts.iter().enumerate() {
            nums[i] = part
                .parse()
                .map_err(|_| format!("'{part}' is not a number"))?;
        }
        Ok(Self::new(nums[0], nums[1], nums[2], nums[3]))
    }

    pub fn contains(&self, point: GeoPoint) -> bool {
        point.lon >= self.min_lon
            && point.lon <= self.max_lon
            && point.lat >= self.min_lat
            && point.lat <= self.max_lat
    }
}

impl std::fmt::Display for BoundingBox {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{},{},{},{}",
            self.min_lon, self.min_lat, self.max_lon, self.max_lat
        )
    }
}

// --- Enums ---

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IncidentSource {
    Vendor,
    User,
}

impl std::fmt::Display for IncidentSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            IncidentSource::Vendor => write!(f, "vendor"),
            IncidentSource::User => write!(f, "user"),
        }
    }
}

impl std::str::FromStr for IncidentSource {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "vendor" => Ok(IncidentSource::Vendor),
            "user" => Ok(IncidentSource::User),
            other => Err(format!("unknown incident source '{other}'")),
        }
    }
}

/// Closed set of incident kinds. Everything the vendor or a reporter can
/// describe maps into one of these.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum IncidentType {
    Accident,
    Congestion,
    RoadClosed,
    Roadworks,
    Hazard,
    Police,
    Flood,
    Other,
}

impl IncidentType {
    /// Default description when a record carries no free text.
    pub fn label(&self) -> &'static str {
        match self {
            IncidentType::Accident => "Accident reported",
            IncidentType::Congestion => "Heavy traffic",
            IncidentType::RoadClosed => "Road closed",
            IncidentType::Roadworks => "Roadworks in progress",
            IncidentType::Hazard => "Hazard on the road",
            IncidentType::Police => "Police activity",
            IncidentType::Flood => "Flooded road",
            IncidentType::Other => "Traffic incident",
        }
    }
}

impl std::fmt::Display for IncidentType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            IncidentType::Accident => write!(f, "accident"),
            IncidentType::Congestion => write!(f, "congestion"),
            IncidentType::RoadClosed => write!(f, "roadClosed"),
            IncidentType::Roadworks => write!(f, "roadworks"),
            IncidentType::Hazard => write!(f, "hazard"),
            IncidentType::Police => write!(f, "police"),
            IncidentType::Flood => write!(f, "flood"),
            IncidentType::Other => write!(f, "other"),
        }
    }
}

impl std::str::FromStr for IncidentType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "accident" => Ok(IncidentType::Accident),
            "congestion" => Ok(IncidentType::Congestion),
            "roadClosed" | "road_closed" => Ok(IncidentType::RoadClosed),
            "roadworks" => Ok(IncidentType::Roadworks),
            "hazard" => Ok(IncidentType::Hazard),
            "police" => Ok(IncidentType::Police),
            "flood" => Ok(IncidentType::Flood),
            "other" => Ok(IncidentType::Other),
            other => Err(format!("unknown incident type '{other}'")),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Low,
    Moderate,
    High,
    Severe,
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Severity::Low => write!(f, "low"),
            Severity::Moderate => write!(f, "moderate"),
            Severity::High => write!(f, "high"),
            Severity::Severe => write!(f, "severe"),
        }
    }
}

impl std::str::FromStr for Severity {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "low" => Ok(Severity::Low),
            "moderate" => Ok(Severity::Moderate),
            "high" => Ok(Severity::High),
            "severe" => Ok(Severity::Severe),
            other => Err(format!("unknown severity '{other}'")),
        }
    }
}
