//! Trip data as the user sees it

use alloy::primitives::B256;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{VaultError, VaultResult};

/// Travel style catalogue
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[repr(u8)]
pub enum TravelStyle {
    Adventure = 0,
    Leisure = 1,
    Business = 2,
    Cultural = 3,
    Backpacking = 4,
}

impl TravelStyle {
    pub const ALL: [TravelStyle; 5] = [
        TravelStyle::Adventure,
        TravelStyle::Leisure,
        TravelStyle::Business,
        TravelStyle::Cultural,
        TravelStyle::Backpacking,
    ];

    pub fn from_id(id: u8) -> Option<Self> {
        Self::ALL.into_iter().find(|s| s.id() == id)
    }

    pub fn id(self) -> u8 {
        self as u8
    }

    pub fn label(self) -> &'static str {
        match self {
            TravelStyle::Adventure => "Adventure",
            TravelStyle::Leisure => "Leisure",
            TravelStyle::Business => "Business",
            TravelStyle::Cultural => "Cultural",
            TravelStyle::Backpacking => "Backpacking",
        }
    }

    /// Label for a raw id; unknown ids render as "Travel"
    pub fn label_for(id: u8) -> &'static str {
        Self::from_id(id).map(Self::label).unwrap_or("Travel")
    }
}

impl std::fmt::Display for TravelStyle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.label())
    }
}

impl std::str::FromStr for TravelStyle {
    type Err = VaultError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if let Ok(id) = s.parse::<u8>() {
            return Self::from_id(id)
                .ok_or_else(|| VaultError::InvalidRequest(format!("Unknown travel style: {id}")));
        }
        Self::ALL
            .into_iter()
            .find(|style| style.label().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| VaultError::InvalidRequest(format!("Unknown travel style: {s}")))
    }
}

/// A trip before submission
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TripDraft {
    pub title: String,
    pub style: u8,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub destinations: String,
    pub plan: String,
}

impl TripDraft {
    /// Whole nights between the dates, at least one
    pub fn nights(&self) -> u32 {
        let days = (self.end_date - self.start_date).num_days();
        days.clamp(1, u32::MAX as i64) as u32
    }

    /// Reject blank required fields
    pub fn validate(&self) -> VaultResult<()> {
        for (name, value) in [
            ("title", &self.title),
            ("destinations", &self.destinations),
            ("plan", &self.plan),
        ] {
            if value.trim().is_empty() {
                return Err(VaultError::InvalidRequest(format!("{name} is required")));
            }
        }
        Ok(())
    }

    pub fn route_payload(&self) -> RoutePayload {
        RoutePayload {
            title: self.title.clone(),
            destinations: self.destinations.clone(),
            start_date: self.start_date,
            end_date: self.end_date,
        }
    }

    pub fn schedule_payload(&self, captured_at: DateTime<Utc>) -> SchedulePayload {
        SchedulePayload {
            plan: self.plan.clone(),
            captured_at,
        }
    }
}

/// Sealed route document
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoutePayload {
    pub title: String,
    pub destinations: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
}

/// Sealed schedule document
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SchedulePayload {
    pub plan: String,
    pub captured_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TripSummary {
    pub id: u64,
    pub title: String,
    pub style: u8,
    pub created_at: u64,
}

impl TripSummary {
    pub fn style_label(&self) -> &'static str {
        TravelStyle::label_for(self.style)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DecryptedTrip {
    pub id: u64,
    pub title: String,
    pub style: u8,
    pub created_at: u64,
    pub route: RoutePayload,
    pub schedule: SchedulePayload,
    /// Present when the engine could decrypt the numeric handles
    pub nights: Option<u64>,
    pub unit: Option<u64>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SubmitReceipt {
    pub record_id: Option<u64>,
    pub tx_hash: Option<B256>,
    pub nights: u32,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn draft(start: &str, end: &str) -> TripDraft {
        TripDraft {
            title: "Andes".into(),
            style: 0,
            start_date: start.parse().unwrap(),
            end_date: end.parse().unwrap(),
            destinations: "Cusco, Puno".into(),
            plan: "Day 1: acclimatise".into(),
        }
    }

    #[test]
    fn test_nights() {
        assert_eq!(draft("2025-03-01", "2025-03-08").nights(), 7);
        assert_eq!(draft("2025-03-01", "2025-03-01").nights(), 1);
        assert_eq!(draft("2025-03-08", "2025-03-01").nights(), 1);
    }

    #[test]
    fn test_blank_fields_rejected() {
        let mut d = draft("2025-03-01", "2025-03-02");
        assert!(d.validate().is_ok());

        d.plan = "   ".into();
        let err = d.validate().unwrap_err();
        assert_eq!(err.to_string(), "Invalid request: plan is required");
    }

    #[test]
    fn test_payload_json_shape() {
        let d = draft("2025-03-01", "2025-03-02");
        let route = serde_json::to_value(d.route_payload()).unwrap();
        assert_eq!(route["startDate"], "2025-03-01");
        assert_eq!(route["destinations"], "Cusco, Puno");

        let captured = "2025-01-02T03:04:05Z".parse::<DateTime<Utc>>().unwrap();
        let schedule = serde_json::to_value(d.schedule_payload(captured)).unwrap();
        assert_eq!(schedule["plan"], "Day 1: acclimatise");
        assert!(schedule["capturedAt"].as_str().unwrap().starts_with("2025-01-02T03:04:05"));
    }

    #[test]
    fn test_style_catalogue() {
        assert_eq!(TravelStyle::label_for(3), "Cultural");
        assert_eq!(TravelStyle::label_for(42), "Travel");
        assert_eq!("business".parse::<TravelStyle>().unwrap(), TravelStyle::Business);
        assert_eq!("4".parse::<TravelStyle>().unwrap(), TravelStyle::Backpacking);
        assert!("cruise".parse::<TravelStyle>().is_err());
    }
}
