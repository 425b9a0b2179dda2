use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

/// Academic level of the submitter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum Degree {
    Lisans,
    YuksekLisans,
    Doktora,
}

impl Degree {
    pub fn as_str(&self) -> &'static str {
        match self {
            Degree::Lisans => "lisans",
            Degree::YuksekLisans => "yuksek_lisans",
            Degree::Doktora => "doktora",
        }
    }
}

impl FromStr for Degree {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "lisans" => Ok(Degree::Lisans),
            "yuksek_lisans" => Ok(Degree::YuksekLisans),
            "doktora" => Ok(Degree::Doktora),
            _ => Err(()),
        }
    }
}

impl fmt::Display for Degree {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Presentation mode: oral (`sozlu`) or poster
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum Presentation {
    Sozlu,
    Poster,
}

impl Presentation {
    pub fn as_str(&self) -> &'static str {
        match self {
            Presentation::Sozlu => "sozlu",
            Presentation::Poster => "poster",
        }
    }
}

impl FromStr for Presentation {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "sozlu" => Ok(Presentation::Sozlu),
            "poster" => Ok(Presentation::Poster),
            _ => Err(()),
        }
    }
}

impl fmt::Display for Presentation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Submission form as sent by the client.
///
/// Every field is optional on the wire so that a missing field is reported by the
/// validation rules with its name, rather than as an opaque deserialization error.
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
pub struct SubmissionPayload {
    /// One of `lisans`, `yuksek_lisans`, `doktora`
    pub degree: Option<String>,
    pub full_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    pub email: Option<String>,
    pub university: Option<String>,
    pub title: Option<String>,
    /// One of `sozlu`, `poster`
    pub presentation: Option<String>,
    /// 1 to 10 non-empty keywords
    pub keywords: Option<Vec<String>>,
    /// At most 500 words
    pub summary: Option<String>,
    pub file_name: Option<String>,
    pub file_mime: Option<String>,
    /// File size in bytes
    pub file_size: Option<i64>,
    /// Path returned by the upload credential endpoint
    pub file_path: Option<String>,
}

/// A validated submission, ready to persist
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewSubmission {
    pub degree: Degree,
    pub full_name: String,
    pub phone: Option<String>,
    pub email: String,
    pub university: String,
    pub title: String,
    pub presentation: Presentation,
    pub keywords: Vec<String>,
    pub summary: String,
    pub file_name: String,
    pub file_mime: String,
    pub file_size: i64,
    pub file_path: String,
    pub ip: Option<String>,
    pub user_agent: Option<String>,
}

/// A persisted submission
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Submission {
    pub id: Uuid,
    #[serde(flatten)]
    pub fields: NewSubmission,
    pub created_at: DateTime<Utc>,
}

/// Acknowledgement returned by the intake endpoint
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct SubmitResponse {
    pub ok: bool,
}
