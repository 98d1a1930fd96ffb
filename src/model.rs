//! Record shapes shared by the store, the engines and the HTTP layer.
//!
//! Optional fields (post location, report media) are explicit `Option`s;
//! nothing downstream assumes they are present.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Declares a closed set of string-tagged variants with `ALL`, `as_str`
/// and a `FromStr` that accepts exactly the serialized names.
macro_rules! string_enum {
    ($(#[$meta:meta])* $name:ident { $($variant:ident => $tag:literal),+ $(,)? }) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        pub enum $name {
            $(
                #[serde(rename = $tag)]
                $variant,
            )+
        }

        impl $name {
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            pub fn as_str(&self) -> &'static str {
                match self {
                    $($name::$variant => $tag,)+
                }
            }
        }

        impl FromStr for $name {
            type Err = UnknownVariant;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($tag => Ok($name::$variant),)+
                    other => Err(UnknownVariant {
                        kind: stringify!($name),
                        value: other.to_string(),
                    }),
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }
    };
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown {kind} value: {value:?}")]
pub struct UnknownVariant {
    pub kind: &'static str,
    pub value: String,
}

string_enum!(HazardType {
    Tsunami => "tsunami",
    StormSurge => "storm_surge",
    Flooding => "flooding",
    HighWaves => "high_waves",
    AbnormalSeaBehavior => "abnormal_sea_behavior",
    CoastalErosion => "coastal_erosion",
});

string_enum!(
    /// Ordered risk level; derives `Ord` so `Low < Critical`.
    Severity {
        Low => "low",
        Medium => "medium",
        High => "high",
        Critical => "critical",
    }
);

string_enum!(Source {
    Citizen => "citizen",
    Official => "official",
    SocialMedia => "social_media",
});

string_enum!(Status {
    Pending => "pending",
    Verified => "verified",
    FalseAlarm => "false_alarm",
});

string_enum!(Platform {
    Twitter => "twitter",
    Facebook => "facebook",
    Youtube => "youtube",
});

string_enum!(Sentiment {
    Positive => "positive",
    Negative => "negative",
    Neutral => "neutral",
});

string_enum!(Role {
    Citizen => "citizen",
    Official => "official",
    Admin => "admin",
});

impl Role {
    /// Provenance recorded on a report submitted by this role.
    pub fn report_source(&self) -> Source {
        match self {
            Role::Citizen => Source::Citizen,
            Role::Official | Role::Admin => Source::Official,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub lat: f64,
    pub lng: f64,
    pub address: String,
}

impl GeoPoint {
    pub fn is_valid(&self) -> bool {
        (-90.0..=90.0).contains(&self.lat) && (-180.0..=180.0).contains(&self.lng)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HazardReport {
    pub id: String,
    #[serde(rename = "type")]
    pub hazard_type: HazardType,
    pub description: String,
    pub location: GeoPoint,
    pub timestamp: DateTime<Utc>,
    pub severity: Severity,
    pub source: Source,
    pub status: Status,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub media: Option<Vec<String>>,
    pub reported_by: String,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Engagement {
    pub likes: u64,
    pub shares: u64,
    pub comments: u64,
}

impl Engagement {
    pub fn total(&self) -> u64 {
        self.likes + self.shares + self.comments
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SocialPost {
    pub id: String,
    pub platform: Platform,
    pub content: String,
    pub author: String,
    pub timestamp: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<GeoPoint>,
    pub sentiment: Sentiment,
    #[serde(default)]
    pub keywords: Vec<String>,
    #[serde(default)]
    pub engagement: Engagement,
}

/// Report as submitted by a client, before the server assigns id and status.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewReport {
    #[serde(rename = "type")]
    pub hazard_type: HazardType,
    pub description: String,
    pub location: GeoPoint,
    #[serde(default = "default_severity")]
    pub severity: Severity,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub media: Option<Vec<String>>,
}

fn default_severity() -> Severity {
    Severity::Medium
}

impl NewReport {
    /// Returns the first problem that makes this submission unusable.
    pub fn validate(&self) -> Result<(), String> {
        if self.description.trim().is_empty() {
            return Err("description is required".to_string());
        }
        if !self.location.is_valid() {
            return Err("location is out of range".to_string());
        }
        Ok(())
    }

    pub fn into_report(self, id: String, reported_by: String, role: Role, now: DateTime<Utc>) -> HazardReport {
        HazardReport {
            id,
            hazard_type: self.hazard_type,
            description: self.description,
            location: self.location,
            timestamp: now,
            severity: self.severity,
            source: role.report_source(),
            status: Status::Pending,
            media: self.media,
            reported_by,
        }
    }
}

// =============================================================================
// Backend records
// =============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub role: Role,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Query {
    pub id: i64,
    pub user_id: i64,
    pub text: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryResult {
    pub id: i64,
    pub query_id: i64,
    pub summary: String,
    pub confidence: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Location {
    pub id: i64,
    pub result_id: Option<i64>,
    pub lat: f64,
    pub lng: f64,
    pub label: String,
    pub score: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewLocation {
    #[serde(default)]
    pub result_id: Option<i64>,
    pub lat: f64,
    pub lng: f64,
    #[serde(default)]
    pub label: String,
    #[serde(default)]
    pub score: Option<f64>,
}

/// Partial update; absent fields keep their stored value.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LocationPatch {
    pub result_id: Option<i64>,
    pub lat: Option<f64>,
    pub lng: Option<f64>,
    pub label: Option<String>,
    pub score: Option<f64>,
}

fn check_marker(lat: f64, lng: f64, score: Option<f64>) -> Result<(), String> {
    if !(-90.0..=90.0).contains(&lat) {
        return Err("lat must be between -90 and 90".to_string());
    }
    if !(-180.0..=180.0).contains(&lng) {
        return Err("lng must be between -180 and 180".to_string());
    }
    if let Some(score) = score {
        if !(0.0..=1.0).contains(&score) {
            return Err("score must be between 0 and 1".to_string());
        }
    }
    Ok(())
}

impl NewLocation {
    pub fn validate(&self) -> Result<(), String> {
        check_marker(self.lat, self.lng, self.score)
    }
}

impl Location {
    pub fn apply(&mut self, patch: LocationPatch) -> Result<(), String> {
        let lat = patch.lat.unwrap_or(self.lat);
        let lng = patch.lng.unwrap_or(self.lng);
        let score = patch.score.or(self.score);
        check_marker(lat, lng, score)?;
        self.lat = lat;
        self.lng = lng;
        self.score = score;
        if let Some(label) = patch.label {
            self.label = label;
        }
        if patch.result_id.is_some() {
            self.result_id = patch.result_id;
        }
        Ok(())
    }
}
