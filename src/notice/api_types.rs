//! Serde-deserializable types matching the notice service's JSON.
//!
//! The service hands rows straight from its database driver to JSON, so ids
//! may arrive as strings or numbers and dates as full timestamps. These
//! types absorb that and convert into the domain types.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use tracing::warn;

use super::types::{Attachment, Department, Notice, NoticeId};

// ============================================================================
// Circular rows
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct ApiNotice {
  #[serde(deserialize_with = "deserialize_id")]
  pub id: NoticeId,
  #[serde(default)]
  pub title: String,
  #[serde(default)]
  pub subject: String,
  #[serde(default)]
  pub body: String,
  pub department: Department,
  #[serde(deserialize_with = "deserialize_date")]
  pub date: NaiveDate,
  #[serde(default, deserialize_with = "deserialize_attachments")]
  pub attachments: Vec<Attachment>,
  #[serde(default, deserialize_with = "deserialize_flag")]
  pub is_featured: bool,
  pub created_at: DateTime<Utc>,
}

impl From<ApiNotice> for Notice {
  fn from(n: ApiNotice) -> Self {
    Notice {
      id: n.id,
      title: n.title,
      subject: n.subject,
      body: n.body,
      department: n.department,
      date: n.date,
      attachments: n.attachments,
      is_featured: n.is_featured,
      created_at: n.created_at,
    }
  }
}

/// Decode a listing row by row, skipping rows that do not fit (an unknown
/// department, a broken date) so one bad row cannot hide the others.
pub fn decode_rows(rows: Vec<serde_json::Value>) -> Vec<Notice> {
  rows
    .into_iter()
    .filter_map(|row| {
      let id = row.get("id").map(|id| id.to_string()).unwrap_or_default();
      match serde_json::from_value::<ApiNotice>(row) {
        Ok(notice) => Some(notice.into()),
        Err(e) => {
          warn!(id = %id, error = %e, "skipping unreadable notice row");
          None
        }
      }
    })
    .collect()
}

// ============================================================================
// Auth and misc endpoints
// ============================================================================

#[derive(Debug, Serialize)]
pub struct ApiLoginRequest<'a> {
  pub username: &'a str,
  pub password: &'a str,
}

#[derive(Debug, Deserialize)]
pub struct ApiLoginResponse {
  pub token: String,
  pub username: String,
}

/// Error body returned by every failing endpoint
#[derive(Debug, Deserialize)]
pub struct ApiErrorBody {
  pub error: String,
  #[serde(default)]
  pub details: Option<String>,
}

impl ApiErrorBody {
  pub fn message(&self) -> String {
    match &self.details {
      Some(details) => format!("{} ({})", self.error, details),
      None => self.error.clone(),
    }
  }
}

#[derive(Debug, Deserialize)]
pub struct ApiHealth {
  pub status: String,
}

// ============================================================================
// Helpers
// ============================================================================

/// Ids are opaque; accept either a JSON string or a number
fn deserialize_id<'de, D>(deserializer: D) -> Result<NoticeId, D::Error>
where
  D: Deserializer<'de>,
{
  match serde_json::Value::deserialize(deserializer)? {
    serde_json::Value::String(s) => Ok(NoticeId::new(s)),
    serde_json::Value::Number(n) => Ok(NoticeId::new(n.to_string())),
    other => Err(serde::de::Error::custom(format!(
      "expected string or number id, got {}",
      other
    ))),
  }
}

/// Accept `YYYY-MM-DD` or an RFC 3339 timestamp, keeping the calendar date
fn deserialize_date<'de, D>(deserializer: D) -> Result<NaiveDate, D::Error>
where
  D: Deserializer<'de>,
{
  let s = String::deserialize(deserializer)?;
  parse_notice_date(&s).map_err(serde::de::Error::custom)
}

pub fn parse_notice_date(s: &str) -> Result<NaiveDate, String> {
  let s = s.trim();
  if let Ok(date) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
    return Ok(date);
  }
  if let Ok(ts) = DateTime::parse_from_rfc3339(s) {
    return Ok(ts.date_naive());
  }
  // Fall back to the date prefix of any timestamp-shaped value
  s.get(..10)
    .and_then(|prefix| NaiveDate::parse_from_str(prefix, "%Y-%m-%d").ok())
    .ok_or_else(|| format!("invalid date '{}'", s))
}

/// Attachments are a JSON column; older rows store them as a JSON string
fn deserialize_attachments<'de, D>(deserializer: D) -> Result<Vec<Attachment>, D::Error>
where
  D: Deserializer<'de>,
{
  match Option::<serde_json::Value>::deserialize(deserializer)? {
    None | Some(serde_json::Value::Null) => Ok(Vec::new()),
    Some(serde_json::Value::String(raw)) => {
      serde_json::from_str(&raw).map_err(serde::de::Error::custom)
    }
    Some(value) => serde_json::from_value(value).map_err(serde::de::Error::custom),
  }
}

fn deserialize_flag<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
  D: Deserializer<'de>,
{
  Ok(Option::<bool>::deserialize(deserializer)?.unwrap_or(false))
}
