//! The normalizer — total functions from raw, possibly malformed input to
//! the canonical [`Portfolio`] shape.
//!
//! Nothing in this module performs I/O and nothing here fails: malformed
//! input degrades to defaults so the read path stays available even for
//! legacy or partially-written documents. The one thing normalisation never
//! does is invent identity — a nested entry without an id keeps no id until
//! the upsert path assigns one.

use chrono::{DateTime, Utc};
use serde::Deserialize as _;
use serde_json::{Map, Value};

use crate::portfolio::{
  EntryRecord, Portfolio, SkillsInput, PROFILE_IMAGE_PLACEHOLDER,
};

/// Editor-only fields that must never reach storage (e.g. a staged but
/// un-uploaded image file reference).
const TRANSIENT_FORM_FIELDS: &[&str] = &["imageFile", "imagePreview"];

// ─── Scalar lists ────────────────────────────────────────────────────────────

/// Resolve the string-or-sequence union for `skills`.
///
/// A sequence is returned unchanged — order preserved, no dedup, no trim. A
/// joined string is split on `,` with each piece trimmed and empty pieces
/// dropped. Absent input yields the empty sequence. Idempotent: applying it
/// to its own output is a no-op.
pub fn normalize_skills(input: Option<SkillsInput>) -> Vec<String> {
  match input {
    Some(SkillsInput::List(items)) => items,
    Some(SkillsInput::Joined(joined)) => joined
      .split(',')
      .map(str::trim)
      .filter(|piece| !piece.is_empty())
      .map(str::to_owned)
      .collect(),
    None => Vec::new(),
  }
}

/// Drop exact duplicates, keeping the first occurrence. Case-sensitive.
pub fn dedup_exact(items: &mut Vec<String>) {
  let mut seen = std::collections::HashSet::new();
  items.retain(|item| seen.insert(item.clone()));
}

/// Serde field helper: accept either wire form of a string list and resolve
/// it through [`normalize_skills`]. Any other shape degrades to empty.
pub(crate) fn lenient_string_list<'de, D>(
  deserializer: D,
) -> Result<Vec<String>, D::Error>
where
  D: serde::Deserializer<'de>,
{
  let value = Value::deserialize(deserializer)?;
  Ok(normalize_skills(SkillsInput::from_value(value)))
}

// ─── Entry lists ─────────────────────────────────────────────────────────────

/// Materialise a structured entry list (`projects`, `experience`).
///
/// Unlike [`normalize_skills`] there is no string form to parse: anything
/// that is not an array coerces to the empty sequence, and array elements
/// that cannot be read as entry objects are dropped rather than failing the
/// whole read.
pub fn normalize_entries<T: EntryRecord>(input: Option<Value>) -> Vec<T> {
  match input {
    Some(Value::Array(items)) => items
      .into_iter()
      .filter_map(|item| serde_json::from_value::<T>(item).ok())
      .map(|mut entry| {
        entry.canonicalize();
        entry
      })
      .collect(),
    _ => Vec::new(),
  }
}

// ─── Whole-document canonicalisation ─────────────────────────────────────────

/// Repair an arbitrary raw document into the canonical [`Portfolio`] shape.
///
/// Every declared scalar falls back to its default when absent or malformed,
/// sequence fields are materialised as real sequences, and fields this crate
/// does not model pass through into `extra` untouched.
pub fn to_canonical_portfolio(raw: Value) -> Portfolio {
  let mut doc = match raw {
    Value::Object(map) => map,
    _ => Map::new(),
  };

  let skills =
    normalize_skills(doc.remove("skills").and_then(SkillsInput::from_value));
  let experience = normalize_entries(doc.remove("experience"));
  let projects = normalize_entries(doc.remove("projects"));
  let created_at = doc.remove("createdAt").and_then(datetime_from_value);
  let updated_at = doc.remove("updatedAt").and_then(datetime_from_value);

  let profile_image = match take_string(&mut doc, "profileImage") {
    s if s.is_empty() => PROFILE_IMAGE_PLACEHOLDER.to_owned(),
    s => s,
  };

  Portfolio {
    id: take_string(&mut doc, "id"),
    name: take_string(&mut doc, "name"),
    title: take_string(&mut doc, "title"),
    about: take_string(&mut doc, "about"),
    email: take_string(&mut doc, "email"),
    phone: take_string(&mut doc, "phone"),
    location: take_string(&mut doc, "location"),
    linkedin: take_string(&mut doc, "linkedin"),
    github: take_string(&mut doc, "github"),
    image_url: take_string(&mut doc, "imageUrl"),
    profile_image,
    skills,
    experience,
    projects,
    created_at,
    updated_at,
    extra: doc,
  }
}

/// Shape editor form state into the wire payload for a write.
///
/// The form carries `skills` as one comma-joined string for editing
/// convenience; it leaves here as a sequence. Transient editor-only fields
/// are dropped and `updatedAt` is stamped with the supplied time.
pub fn to_submission_payload(
  form: Value,
  now: DateTime<Utc>,
) -> Map<String, Value> {
  let mut payload = match form {
    Value::Object(map) => map,
    _ => Map::new(),
  };

  if let Some(raw) = payload.remove("skills") {
    let skills = normalize_skills(SkillsInput::from_value(raw));
    payload.insert("skills".to_owned(), Value::from(skills));
  }

  for field in TRANSIENT_FORM_FIELDS {
    payload.remove(*field);
  }

  payload.insert("updatedAt".to_owned(), Value::String(now.to_rfc3339()));
  payload
}

// ─── Helpers ─────────────────────────────────────────────────────────────────

fn take_string(doc: &mut Map<String, Value>, key: &str) -> String {
  match doc.remove(key) {
    Some(Value::String(s)) => s,
    _ => String::new(),
  }
}

fn datetime_from_value(value: Value) -> Option<DateTime<Utc>> {
  serde_json::from_value(value).ok()
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::portfolio::{Experience, Project};
  use serde_json::json;

  fn skills_of(value: Value) -> Vec<String> {
    normalize_skills(SkillsInput::from_value(value))
  }

  // ── normalize_skills ───────────────────────────────────────────────────────

  #[test]
  fn empty_string_yields_empty_sequence() {
    assert!(skills_of(json!("")).is_empty());
  }

  #[test]
  fn joined_string_splits_trims_and_drops_empties() {
    assert_eq!(skills_of(json!("a, b ,c")), vec!["a", "b", "c"]);
    assert_eq!(skills_of(json!("a,,b,")), vec!["a", "b"]);
  }

  #[test]
  fn sequence_input_is_identity() {
    // No trim and no dedup on already-sequence input.
    assert_eq!(
      skills_of(json!([" a ", "b", "b"])),
      vec![" a ".to_owned(), "b".to_owned(), "b".to_owned()]
    );
  }

  #[test]
  fn absent_input_yields_empty_sequence() {
    assert!(normalize_skills(None).is_empty());
  }

  #[test]
  fn normalize_skills_is_idempotent() {
    for raw in [json!("Go, Rust"), json!(["Go", "Rust"]), json!("")] {
      let once = skills_of(raw);
      let twice = normalize_skills(Some(SkillsInput::List(once.clone())));
      assert_eq!(once, twice);
    }
  }

  // ── normalize_entries ──────────────────────────────────────────────────────

  #[test]
  fn non_array_entry_input_coerces_to_empty() {
    assert!(normalize_entries::<Project>(None).is_empty());
    assert!(normalize_entries::<Project>(Some(json!("garbage"))).is_empty());
    assert!(normalize_entries::<Project>(Some(json!({"id": 1}))).is_empty());
  }

  #[test]
  fn malformed_elements_are_dropped_not_fatal() {
    let entries: Vec<Project> = normalize_entries(Some(json!([
      {"id": 1, "title": "A"},
      "not an object",
      {"id": 2, "title": "B"},
    ])));
    assert_eq!(entries.len(), 2);
    assert_eq!(entries[0].title, "A");
    assert_eq!(entries[1].title, "B");
  }

  #[test]
  fn entry_set_fields_are_deduped_in_order() {
    let entries: Vec<Project> = normalize_entries(Some(json!([
      {"title": "A", "technologies": ["Rust", "Go", "Rust"]},
    ])));
    assert_eq!(entries[0].technologies, vec!["Rust", "Go"]);
  }

  #[test]
  fn entry_string_list_accepts_joined_form() {
    let entries: Vec<Experience> = normalize_entries(Some(json!([
      {"company": "Acme", "achievements": "shipped v1, led team"},
    ])));
    assert_eq!(entries[0].achievements, vec!["shipped v1", "led team"]);
  }

  // ── to_canonical_portfolio ─────────────────────────────────────────────────

  #[test]
  fn empty_object_yields_all_defaults() {
    let p = to_canonical_portfolio(json!({}));
    assert!(p.skills.is_empty());
    assert!(p.experience.is_empty());
    assert!(p.projects.is_empty());
    assert_eq!(p.name, "");
    assert_eq!(p.title, "");
    assert_eq!(p.image_url, "");
    assert_eq!(p.profile_image, PROFILE_IMAGE_PLACEHOLDER);
    assert!(p.extra.is_empty());
  }

  #[test]
  fn joined_skills_become_a_sequence() {
    let p = to_canonical_portfolio(json!({"skills": "React, Node"}));
    assert_eq!(p.skills, vec!["React", "Node"]);
  }

  #[test]
  fn canonical_input_round_trips_unchanged() {
    let p = to_canonical_portfolio(json!({
      "id": "u1",
      "name": "Alice",
      "skills": ["Go", "Rust"],
      "projects": [{"id": 1, "title": "A"}],
    }));
    let again =
      to_canonical_portfolio(serde_json::to_value(&p).expect("serialise"));
    assert_eq!(p, again);
  }

  #[test]
  fn non_object_input_degrades_to_defaults() {
    let p = to_canonical_portfolio(json!("not a document"));
    assert_eq!(p, Portfolio::default());
  }

  #[test]
  fn unknown_fields_pass_through() {
    let p = to_canonical_portfolio(json!({"name": "A", "themeColor": "#fff"}));
    assert_eq!(p.extra.get("themeColor").unwrap(), "#fff");
  }

  #[test]
  fn missing_entry_ids_are_not_invented() {
    let p = to_canonical_portfolio(json!({
      "projects": [{"title": "no id yet"}],
    }));
    assert!(p.projects[0].id.is_none());
  }

  // ── to_submission_payload ──────────────────────────────────────────────────

  #[test]
  fn submission_splits_skills_and_drops_transients() {
    let now = Utc::now();
    let payload = to_submission_payload(
      json!({
        "name": "Alice",
        "skills": "Go, Rust",
        "imageFile": {"blob": "staged"},
      }),
      now,
    );

    assert_eq!(payload.get("skills").unwrap(), &json!(["Go", "Rust"]));
    assert!(!payload.contains_key("imageFile"));
    assert_eq!(
      payload.get("updatedAt").unwrap(),
      &Value::String(now.to_rfc3339())
    );
    assert_eq!(payload.get("name").unwrap(), "Alice");
  }
}
