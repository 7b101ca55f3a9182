use base64::{engine::general_purpose::STANDARD, Engine};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Largest attachment the service accepts.
pub const MAX_ATTACHMENT_BYTES: u64 = 10 * 1024 * 1024;

/// Opaque notice identifier assigned by the store
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct NoticeId(String);

impl NoticeId {
  pub fn new(id: impl Into<String>) -> Self {
    Self(id.into())
  }

  pub fn as_str(&self) -> &str {
    &self.0
  }
}

impl fmt::Display for NoticeId {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.pad(&self.0)
  }
}

impl From<&str> for NoticeId {
  fn from(s: &str) -> Self {
    Self(s.to_string())
  }
}

/// Department tag. `All` is the wildcard that applies to every department.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Department {
  CE,
  ME,
  CS,
  EC,
  EE,
  All,
  Office,
  Results,
  FeeDues,
  Exams,
  Scholarships,
  Internship,
  AnnualDay,
  Functions,
  AdmissionTicket,
  Admissions,
}

impl Department {
  /// Every department, wildcard included, in display order
  pub const ALL: [Department; 16] = [
    Department::CE,
    Department::ME,
    Department::CS,
    Department::EC,
    Department::EE,
    Department::All,
    Department::Office,
    Department::Results,
    Department::FeeDues,
    Department::Exams,
    Department::Scholarships,
    Department::Internship,
    Department::AnnualDay,
    Department::Functions,
    Department::AdmissionTicket,
    Department::Admissions,
  ];

  /// Label used on the wire and in the UI
  pub fn label(self) -> &'static str {
    match self {
      Department::CE => "CE",
      Department::ME => "ME",
      Department::CS => "CS",
      Department::EC => "EC",
      Department::EE => "EE",
      Department::All => "All",
      Department::Office => "Office",
      Department::Results => "Results",
      Department::FeeDues => "Fee Dues",
      Department::Exams => "Exams",
      Department::Scholarships => "Scholarships",
      Department::Internship => "Internship",
      Department::AnnualDay => "Annual Day",
      Department::Functions => "Functions",
      Department::AdmissionTicket => "Admission Ticket",
      Department::Admissions => "Admissions",
    }
  }

  /// Departments a notice can be filtered by (everything except the wildcard)
  pub fn concrete() -> impl Iterator<Item = Department> {
    Self::ALL.into_iter().filter(|d| *d != Department::All)
  }

  pub fn is_wildcard(self) -> bool {
    self == Department::All
  }

  /// True when a notice tagged `self` should be shown for `other`.
  pub fn applies_to(self, other: Department) -> bool {
    self == other || self.is_wildcard() || other.is_wildcard()
  }
}

impl fmt::Display for Department {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.pad(self.label())
  }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownDepartment(pub String);

impl fmt::Display for UnknownDepartment {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "unknown department '{}'", self.0)
  }
}

impl std::error::Error for UnknownDepartment {}

impl FromStr for Department {
  type Err = UnknownDepartment;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    let wanted: String = s
      .chars()
      .filter(|c| !c.is_whitespace() && *c != '_' && *c != '-')
      .collect::<String>()
      .to_lowercase();

    Department::ALL
      .into_iter()
      .find(|d| d.label().replace(' ', "").to_lowercase() == wanted)
      .ok_or_else(|| UnknownDepartment(s.to_string()))
  }
}

impl Serialize for Department {
  fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(self.label())
  }
}

impl<'de> Deserialize<'de> for Department {
  fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
    let s = String::deserialize(deserializer)?;
    s.parse().map_err(serde::de::Error::custom)
  }
}

/// File attached to a notice, carried inline as base64
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attachment {
  pub name: String,
  #[serde(rename = "type")]
  pub mime_type: String,
  #[serde(rename = "size")]
  pub size_bytes: u64,
  #[serde(rename = "base64")]
  pub content: String,
}

impl Attachment {
  /// Build an attachment from raw bytes
  pub fn from_bytes(name: impl Into<String>, mime_type: impl Into<String>, bytes: &[u8]) -> Self {
    Self {
      name: name.into(),
      mime_type: mime_type.into(),
      size_bytes: bytes.len() as u64,
      content: STANDARD.encode(bytes),
    }
  }

  /// Decode the payload. Browsers hand out data URLs, so a
  /// `data:<mime>;base64,` prefix is tolerated.
  pub fn decode(&self) -> Result<Vec<u8>, base64::DecodeError> {
    let payload = match self.content.split_once(";base64,") {
      Some((prefix, rest)) if prefix.starts_with("data:") => rest,
      _ => self.content.as_str(),
    };
    STANDARD.decode(payload.trim())
  }

  pub fn is_csv(&self) -> bool {
    self.name.trim().to_lowercase().ends_with(".csv")
  }
}

/// A notice ("circular") as stored by the service
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Notice {
  pub id: NoticeId,
  pub title: String,
  pub subject: String,
  /// Constrained HTML produced by the rich-text editor
  pub body: String,
  pub department: Department,
  pub date: NaiveDate,
  pub attachments: Vec<Attachment>,
  pub is_featured: bool,
  pub created_at: DateTime<Utc>,
}

impl Notice {
  pub fn applies_to(&self, department: Department) -> bool {
    self.department.applies_to(department)
  }

  /// Case-insensitive match against title and subject
  pub fn matches_text(&self, needle: &str) -> bool {
    let needle = needle.trim().to_lowercase();
    needle.is_empty()
      || self.title.to_lowercase().contains(&needle)
      || self.subject.to_lowercase().contains(&needle)
  }

  /// Draft carrying this notice's current content, for edits
  pub fn to_draft(&self) -> NoticeDraft {
    NoticeDraft {
      title: self.title.clone(),
      date: self.date,
      subject: self.subject.clone(),
      department: self.department,
      body: self.body.clone(),
      attachments: self.attachments.clone(),
    }
  }
}

/// Writable fields of a notice
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NoticeDraft {
  pub title: String,
  pub date: NaiveDate,
  pub subject: String,
  pub department: Department,
  pub body: String,
  #[serde(default)]
  pub attachments: Vec<Attachment>,
}

impl NoticeDraft {
  /// Check the draft before sending it to the store
  pub fn validate(&self) -> Result<(), String> {
    if self.title.trim().is_empty() {
      return Err("title is required".to_string());
    }
    if self.subject.trim().is_empty() {
      return Err("subject is required".to_string());
    }
    if self.body.trim().is_empty() {
      return Err("body is required".to_string());
    }
    if let Some(big) = self
      .attachments
      .iter()
      .find(|a| a.size_bytes > MAX_ATTACHMENT_BYTES)
    {
      return Err(format!(
        "file too large: {}. Maximum size is 10MB.",
        big.name
      ));
    }
    Ok(())
  }
}

/// Server-side list filter
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct NoticeFilter {
  /// Restrict to one department (plus `All`); `None` or `All` lists everything
  pub department: Option<Department>,
  /// Only the featured notice
  pub featured_only: bool,
}

impl NoticeFilter {
  pub fn department(department: Department) -> Self {
    Self {
      department: Some(department),
      featured_only: false,
    }
  }

  pub fn featured() -> Self {
    Self {
      department: None,
      featured_only: true,
    }
  }
}
