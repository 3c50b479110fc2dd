use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

pub mod paths;

pub use paths::ResourceGroup;

pub type Timestamp = DateTime<Utc>;

/// Number of holes tracked by the per-hole rollup.
pub const TRACKED_HOLES: u32 = 18;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: String,
    pub name: String,
    pub handicap: f64,
    pub joined: NaiveDate,
    /// Fields the record store carries beyond the typed ones.
    #[serde(flatten)]
    pub extra: BTreeMap<String, serde_json::Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Course {
    pub id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(default)]
    pub holes: Vec<Hole>,
}

impl Course {
    pub fn par_total(&self) -> u32 {
        self.holes.iter().map(|h| u32::from(h.par)).sum()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Hole {
    pub hole_number: u32,
    pub par: u8,
    pub distance: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub difficulty: Option<u8>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Round {
    pub id: String,
    pub user_id: String,
    pub course_id: String,
    pub date: NaiveDate,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub weather: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f64>,
    pub total_score: u32,
    #[serde(default)]
    pub hole_results: Vec<HoleResult>,
}

/// Outcome of one hole. Absent optional fields mean "not recorded", which is
/// different from `false`/`0`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct HoleResult {
    pub hole_number: u32,
    pub score: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub putts: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fairway_hit: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub green_hit: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub distance: Option<u32>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Statistics {
    pub user_id: String,
    pub rounds_played: u32,
    pub avg_score: f64,
    pub best_score: u32,
    /// Last three total scores, oldest first.
    pub recent_form: Vec<u32>,
    pub fairway_hit_rate: f64,
    pub green_hit_rate: f64,
    /// Putts per hole that recorded putts (not per round).
    pub avg_putts_per_round: f64,
    pub sample_sizes: SampleSizes,
    pub hole_stats: Vec<HoleStat>,
    pub last_updated: Timestamp,
}

/// Denominators behind the rate fields. A zero here means the matching rate
/// is a "no data" sentinel rather than a measured zero.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct SampleSizes {
    pub fairway_hit: u32,
    pub green_hit: u32,
    pub putts: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct HoleStat {
    pub hole_number: u32,
    pub avg_score: f64,
    pub score_count: u32,
}

// --- Materialized resource documents ---

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RootIndex {
    pub name: String,
    pub resources: Vec<ResourceEntry>,
    pub timestamp: Timestamp,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ResourceEntry {
    pub name: String,
    pub path: String,
    pub description: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ListResource<T> {
    pub items: Vec<T>,
    pub count: usize,
    pub timestamp: Timestamp,
}

impl<T> ListResource<T> {
    pub fn new(items: Vec<T>, timestamp: Timestamp) -> Self {
        Self {
            count: items.len(),
            items,
            timestamp,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Detail<T> {
    #[serde(flatten)]
    pub record: T,
    pub timestamp: Timestamp,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct UserDetail {
    #[serde(flatten)]
    pub user: User,
    pub statistics: Option<Statistics>,
    pub rounds: Vec<RoundSummary>,
    pub timestamp: Timestamp,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct UserSummary {
    pub id: String,
    pub name: String,
    pub handicap: f64,
    pub rounds_played: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RoundSummary {
    pub id: String,
    pub user_id: String,
    pub course_id: String,
    pub date: NaiveDate,
    pub total_score: u32,
}

impl From<&Round> for RoundSummary {
    fn from(round: &Round) -> Self {
        Self {
            id: round.id.clone(),
            user_id: round.user_id.clone(),
            course_id: round.course_id.clone(),
            date: round.date,
            total_score: round.total_score,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CourseSummary {
    pub id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    pub hole_count: usize,
    pub par: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct StatisticsSummary {
    pub user_id: String,
    pub rounds_played: u32,
    pub avg_score: f64,
    pub best_score: u32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hole_result_absent_fields_stay_absent() {
        let v = serde_json::json!({ "holeNumber": 3, "score": 3 });
        let hr: HoleResult = serde_json::from_value(v).unwrap();
        assert_eq!(hr.fairway_hit, None);
        assert_eq!(hr.putts, None);

        let back = serde_json::to_value(&hr).unwrap();
        assert!(back.get("fairwayHit").is_none());
        assert!(back.get("putts").is_none());
    }

    #[test]
    fn round_without_hole_results_defaults_empty() {
        let v = serde_json::json!({
            "id": "r1",
            "userId": "u1",
            "courseId": "c1",
            "date": "2024-05-01",
            "totalScore": 82
        });
        let round: Round = serde_json::from_value(v).unwrap();
        assert!(round.hole_results.is_empty());
        assert_eq!(round.weather, None);
        assert_eq!(round.date, NaiveDate::from_ymd_opt(2024, 5, 1).unwrap());
    }

    #[test]
    fn user_keeps_unknown_fields_in_extra() {
        let v = serde_json::json!({
            "id": "u1",
            "name": "Ada",
            "handicap": 12.4,
            "joined": "2023-01-15",
            "homeClub": "Pine Valley"
        });
        let user: User = serde_json::from_value(v).unwrap();
        assert_eq!(user.extra["homeClub"], "Pine Valley");
    }

    #[test]
    fn user_detail_flattens_user_fields() {
        let ts = DateTime::parse_from_rfc3339("2024-06-01T00:00:00Z")
            .unwrap()
            .with_timezone(&Utc);
        let detail = UserDetail {
            user: User {
                id: "u1".to_string(),
                name: "Ada".to_string(),
                handicap: 12.4,
                joined: NaiveDate::from_ymd_opt(2023, 1, 15).unwrap(),
                extra: BTreeMap::new(),
            },
            statistics: None,
            rounds: vec![],
            timestamp: ts,
        };

        let json = serde_json::to_value(&detail).unwrap();
        assert_eq!(json["id"], "u1");
        assert_eq!(json["name"], "Ada");
        assert!(json["statistics"].is_null());
        assert_eq!(json["timestamp"], "2024-06-01T00:00:00Z");

        let back: UserDetail = serde_json::from_value(json).unwrap();
        assert!(back.user.extra.is_empty());
    }

    #[test]
    fn course_par_total_sums_holes() {
        let course = Course {
            id: "c1".to_string(),
            name: "Links".to_string(),
            location: None,
            holes: vec![
                Hole { hole_number: 1, par: 4, distance: 380, difficulty: Some(5) },
                Hole { hole_number: 2, par: 3, distance: 160, difficulty: None },
            ],
        };
        assert_eq!(course.par_total(), 7);
    }
}
