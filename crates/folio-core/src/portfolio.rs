//! Portfolio — the per-user record this store manages, with its nested
//! project and experience entries.
//!
//! Wire field names are camelCase to match the stored document shape. Every
//! struct carries a flattened `extra` map so fields this crate does not know
//! about survive a read/write round trip unchanged.

use std::{borrow::Cow, fmt};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use uuid::Uuid;

use crate::normalize;

/// Fallback avatar shown until the owner uploads a profile image.
pub const PROFILE_IMAGE_PLACEHOLDER: &str = "/assets/defaults/profile.png";

// ─── Entry id ────────────────────────────────────────────────────────────────

/// Identity of a nested project or experience entry — the sole key used for
/// upsert matching.
///
/// Legacy documents hold numeric ids; form payloads send the same ids back as
/// strings. A number and its decimal string form denote the same identity, so
/// equality compares canonical forms: `EntryId::Number(1)` equals
/// `EntryId::Text("1")`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum EntryId {
  Number(i64),
  Text(String),
}

impl EntryId {
  /// Mint a fresh collision-resistant id for an entry appended without one.
  pub fn generate() -> Self {
    Self::Text(Uuid::new_v4().to_string())
  }

  fn canonical(&self) -> Cow<'_, str> {
    match self {
      Self::Number(n) => Cow::Owned(n.to_string()),
      Self::Text(s) => Cow::Borrowed(s.as_str()),
    }
  }
}

impl PartialEq for EntryId {
  fn eq(&self, other: &Self) -> bool {
    self.canonical() == other.canonical()
  }
}

impl Eq for EntryId {}

impl fmt::Display for EntryId {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(&self.canonical())
  }
}

// ─── Skills input ────────────────────────────────────────────────────────────

/// Accepted wire forms for a scalar string-list field.
///
/// The editing UI submits `skills` as one comma-joined string; stored
/// documents hold a real array. Both shapes deserialise into this union and
/// are resolved to a sequence by [`normalize::normalize_skills`].
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SkillsInput {
  List(Vec<String>),
  Joined(String),
}

impl SkillsInput {
  /// Read a raw JSON value as a skills input. Any shape other than an array
  /// or a string yields `None` (and so normalises to the empty sequence).
  pub fn from_value(value: Value) -> Option<Self> {
    serde_json::from_value(value).ok()
  }
}

// ─── Portfolio ───────────────────────────────────────────────────────────────

/// The canonical per-user record. One per user; the document id equals the
/// owning user's identifier and never changes after creation.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct Portfolio {
  pub id:            String,
  pub name:          String,
  pub title:         String,
  pub about:         String,
  pub email:         String,
  pub phone:         String,
  pub location:      String,
  pub linkedin:      String,
  pub github:        String,
  pub image_url:     String,
  pub profile_image: String,
  /// Ordered, duplicates kept, insertion order preserved.
  pub skills:        Vec<String>,
  /// Storage order is insertion order, not chronological.
  pub experience:    Vec<Experience>,
  pub projects:      Vec<Project>,
  /// Server-assigned; set once on first creation.
  #[serde(skip_serializing_if = "Option::is_none")]
  pub created_at:    Option<DateTime<Utc>>,
  /// Server-assigned; refreshed on every write, nested upserts included.
  #[serde(skip_serializing_if = "Option::is_none")]
  pub updated_at:    Option<DateTime<Utc>>,
  /// Fields this crate does not model, passed through untouched.
  #[serde(flatten)]
  pub extra:         Map<String, Value>,
}

impl Default for Portfolio {
  fn default() -> Self {
    Self {
      id:            String::new(),
      name:          String::new(),
      title:         String::new(),
      about:         String::new(),
      email:         String::new(),
      phone:         String::new(),
      location:      String::new(),
      linkedin:      String::new(),
      github:        String::new(),
      image_url:     String::new(),
      profile_image: PROFILE_IMAGE_PLACEHOLDER.to_owned(),
      skills:        Vec::new(),
      experience:    Vec::new(),
      projects:      Vec::new(),
      created_at:    None,
      updated_at:    None,
      extra:         Map::new(),
    }
  }
}

// ─── Nested entries ──────────────────────────────────────────────────────────

/// A project entry, owned by its portfolio. `title` and `description` are
/// required for a complete entry but not enforced at the storage layer.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct Project {
  #[serde(skip_serializing_if = "Option::is_none")]
  pub id:            Option<EntryId>,
  pub title:         String,
  pub description:   String,
  /// Unique strings, insertion order, case-sensitive exact-match dedup.
  #[serde(deserialize_with = "normalize::lenient_string_list")]
  pub technologies:  Vec<String>,
  pub image_url:     String,
  pub link:          String,
  pub github:        String,
  pub start_date:    String,
  pub end_date:      String,
  pub role:          String,
  pub category:      String,
  #[serde(deserialize_with = "normalize::lenient_string_list")]
  pub collaborators: Vec<String>,
  pub featured:      bool,
  #[serde(flatten)]
  pub extra:         Map<String, Value>,
}

/// A work-experience entry, owned by its portfolio.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct Experience {
  #[serde(skip_serializing_if = "Option::is_none")]
  pub id:           Option<EntryId>,
  pub company:      String,
  pub position:     String,
  pub location:     String,
  pub description:  String,
  /// ISO date; required for a correct chronological sort by renderers.
  pub start_date:   String,
  pub end_date:     String,
  /// When true, `end_date` is unset as far as any renderer is concerned.
  pub current:      bool,
  #[serde(deserialize_with = "normalize::lenient_string_list")]
  pub achievements: Vec<String>,
  #[serde(flatten)]
  pub extra:        Map<String, Value>,
}

impl Experience {
  /// The end date a renderer should display — `None` for a current position
  /// regardless of what `end_date` holds.
  pub fn effective_end_date(&self) -> Option<&str> {
    if self.current || self.end_date.is_empty() {
      None
    } else {
      Some(&self.end_date)
    }
  }
}

// ─── EntryRecord ─────────────────────────────────────────────────────────────

/// Common surface of the two nested entry kinds, used by list normalisation
/// and by the shared upsert path in the store facade.
pub trait EntryRecord: Serialize + serde::de::DeserializeOwned {
  /// The portfolio field holding this entry kind.
  const FIELD: &'static str;

  fn id(&self) -> Option<&EntryId>;
  fn assign_id(&mut self, id: EntryId);

  /// Restore the entry's own invariants (dedup of set-like fields).
  fn canonicalize(&mut self);
}

impl EntryRecord for Project {
  const FIELD: &'static str = "projects";

  fn id(&self) -> Option<&EntryId> {
    self.id.as_ref()
  }

  fn assign_id(&mut self, id: EntryId) {
    self.id = Some(id);
  }

  fn canonicalize(&mut self) {
    normalize::dedup_exact(&mut self.technologies);
    normalize::dedup_exact(&mut self.collaborators);
  }
}

impl EntryRecord for Experience {
  const FIELD: &'static str = "experience";

  fn id(&self) -> Option<&EntryId> {
    self.id.as_ref()
  }

  fn assign_id(&mut self, id: EntryId) {
    self.id = Some(id);
  }

  fn canonicalize(&mut self) {
    normalize::dedup_exact(&mut self.achievements);
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn entry_id_number_equals_its_decimal_string_form() {
    assert_eq!(EntryId::Number(1), EntryId::Text("1".into()));
    assert_eq!(EntryId::Text("42".into()), EntryId::Number(42));
    assert_ne!(EntryId::Number(1), EntryId::Text("2".into()));
    assert_ne!(EntryId::Text("a".into()), EntryId::Text("b".into()));
  }

  #[test]
  fn generated_entry_ids_are_distinct() {
    assert_ne!(EntryId::generate(), EntryId::generate());
  }

  #[test]
  fn skills_input_rejects_non_list_shapes() {
    assert!(SkillsInput::from_value(Value::Null).is_none());
    assert!(SkillsInput::from_value(serde_json::json!(42)).is_none());
    assert!(SkillsInput::from_value(serde_json::json!({"a": 1})).is_none());
  }

  #[test]
  fn current_position_has_no_effective_end_date() {
    let exp = Experience {
      end_date: "2024-01-01".into(),
      current: true,
      ..Experience::default()
    };
    assert_eq!(exp.effective_end_date(), None);

    let past = Experience {
      end_date: "2024-01-01".into(),
      current: false,
      ..Experience::default()
    };
    assert_eq!(past.effective_end_date(), Some("2024-01-01"));
  }

  #[test]
  fn unknown_portfolio_fields_survive_a_serde_round_trip() {
    let json = serde_json::json!({
      "name": "Alice",
      "skills": ["Go"],
      "themeColor": "#aabbcc",
    });
    let portfolio: Portfolio = serde_json::from_value(json).unwrap();
    assert_eq!(portfolio.extra.get("themeColor").unwrap(), "#aabbcc");

    let back = serde_json::to_value(&portfolio).unwrap();
    assert_eq!(back.get("themeColor").unwrap(), "#aabbcc");
  }
}
