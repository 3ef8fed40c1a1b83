//! Content model for courses
//!
//! Documents arrive from a Mongo-backed API, so ids are `_id` (with `id` and
//! extended-JSON `{ "$oid": ... }` accepted too) and most fields are optional.
//! Decoding is deliberately lenient: a field of the wrong type becomes `None`
//! instead of rejecting the whole document.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// Status value items use to mark themselves done
pub const STATUS_COMPLETE: &str = "complete";
/// Status value synthesized items start with
pub const STATUS_INCOMPLETE: &str = "incomplete";

/// Type of a section or item
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ContentKind {
    Lesson,
    Reading,
    Video,
    Quiz,
    Exercise,
    Assignment,
    /// Any other label, kept verbatim
    Other(String),
}

impl ContentKind {
    /// Parse a type label (case-insensitive)
    pub fn parse(label: &str) -> Self {
        let trimmed = label.trim();
        match trimmed.to_uppercase().as_str() {
            "LESSON" => Self::Lesson,
            "READING" => Self::Reading,
            "VIDEO" => Self::Video,
            "QUIZ" => Self::Quiz,
            "EXERCISE" => Self::Exercise,
            "ASSIGNMENT" => Self::Assignment,
            _ => Self::Other(trimmed.to_string()),
        }
    }

    /// Wire label
    pub fn label(&self) -> &str {
        match self {
            Self::Lesson => "LESSON",
            Self::Reading => "READING",
            Self::Video => "VIDEO",
            Self::Quiz => "QUIZ",
            Self::Exercise => "EXERCISE",
            Self::Assignment => "ASSIGNMENT",
            Self::Other(label) => label,
        }
    }

    /// Display order within a module (lower first)
    pub fn priority(&self) -> u32 {
        match self {
            Self::Lesson | Self::Reading | Self::Video => 1,
            Self::Quiz => 2,
            Self::Exercise => 3,
            Self::Assignment => 4,
            Self::Other(_) => 999,
        }
    }

    /// Lessons, readings and videos are all consumed by viewing
    pub fn is_lesson_like(&self) -> bool {
        matches!(self, Self::Lesson | Self::Reading | Self::Video)
    }
}

impl From<String> for ContentKind {
    fn from(label: String) -> Self {
        Self::parse(&label)
    }
}

impl From<ContentKind> for String {
    fn from(kind: ContentKind) -> Self {
        kind.label().to_string()
    }
}

impl std::fmt::Display for ContentKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// A module with its resolved sections
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(from = "RawModule")]
pub struct Module {
    /// Module identifier
    pub id: Option<String>,
    /// Display title
    pub title: Option<String>,
    /// Referenced section ids in module order
    pub section_ids: Vec<String>,
    /// Sections, filled in by the loader
    pub sections: Vec<Section>,
}

impl Module {
    /// Title to show, falling back to a generic label
    pub fn display_title(&self) -> &str {
        self.title.as_deref().unwrap_or("Untitled module")
    }

    /// Find the section containing an item
    pub fn section_of_item(&self, item_id: &str) -> Option<&Section> {
        self.sections.iter().find(|s| s.items.iter().any(|i| i.id.as_deref() == Some(item_id)))
    }

    /// Total number of items across sections
    pub fn item_count(&self) -> usize {
        self.sections.iter().map(|s| s.items.len()).sum()
    }
}

/// A typed section of a module
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(from = "RawSection")]
pub struct Section {
    /// Section identifier
    pub id: Option<String>,
    /// Display title
    pub title: Option<String>,
    /// Section type
    pub kind: Option<ContentKind>,
    /// Duration in minutes
    pub duration: Option<u32>,
    /// Direct completion status, if the backend stores one
    pub status: Option<String>,
    /// Items, filled in by the loader
    pub items: Vec<Item>,
}

impl Section {
    /// Create an empty section of the given type
    pub fn new(id: impl Into<String>, title: impl Into<String>, kind: ContentKind) -> Self {
        Self {
            id: Some(id.into()),
            title: Some(title.into()),
            kind: Some(kind),
            ..Default::default()
        }
    }

    /// Title to show, falling back to a generic label
    pub fn display_title(&self) -> &str {
        self.title.as_deref().unwrap_or("Untitled section")
    }

    /// Sort priority of this section's type
    pub fn priority(&self) -> u32 {
        self.kind.as_ref().map_or(999, ContentKind::priority)
    }

    /// Total duration: the section's own, or the sum of its items
    pub fn total_minutes(&self) -> Option<u32> {
        self.duration.or_else(|| {
            let sum =
                self.items.iter().filter_map(|i| i.duration).fold(0u32, u32::saturating_add);
            (sum > 0).then_some(sum)
        })
    }
}

/// The smallest trackable unit of content
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(from = "RawItem", rename_all = "camelCase")]
pub struct Item {
    /// Item identifier
    #[serde(rename = "_id")]
    pub id: Option<String>,
    /// Display title
    pub title: Option<String>,
    /// Item type; inherits the section's type when absent
    #[serde(rename = "type")]
    pub kind: Option<ContentKind>,
    /// Duration in minutes
    pub duration: Option<u32>,
    /// Stored status, when the backend keeps one on the item
    pub status: Option<String>,
    /// Owning section
    pub section_id: Option<String>,
}

impl Item {
    /// Create an item of the given type
    pub fn new(id: impl Into<String>, title: impl Into<String>, kind: ContentKind) -> Self {
        Self {
            id: Some(id.into()),
            title: Some(title.into()),
            kind: Some(kind),
            ..Default::default()
        }
    }

    /// Stand-in shown when no exercise could be fetched for a section
    pub fn placeholder_exercise(section_id: &str) -> Self {
        Self {
            id: Some(format!("{}-exercise", section_id)),
            title: Some("Exercise".to_string()),
            kind: Some(ContentKind::Exercise),
            duration: None,
            status: Some(STATUS_INCOMPLETE.to_string()),
            section_id: Some(section_id.to_string()),
        }
    }

    /// Title to show, falling back to a generic label
    pub fn display_title(&self) -> &str {
        self.title.as_deref().unwrap_or("Untitled item")
    }

    /// Own type, or the section's type when unspecified
    pub fn effective_kind<'a>(&'a self, section: Option<&'a Section>) -> Option<&'a ContentKind> {
        self.kind.as_ref().or_else(|| section.and_then(|s| s.kind.as_ref()))
    }

    /// Whether the stored status marks the item done
    pub fn has_complete_status(&self) -> bool {
        self.status.as_deref() == Some(STATUS_COMPLETE)
    }
}

// Wire shapes. Documents may carry `_id` and `id` (or `section` and
// `sectionId`) at the same time, which serde aliases reject as duplicates,
// so every spelling gets its own field and the conversions pick one.

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawModule {
    #[serde(rename = "_id", default, deserialize_with = "lenient_id")]
    mongo_id: Option<String>,
    #[serde(default, deserialize_with = "lenient_id")]
    id: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    title: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    name: Option<String>,
    #[serde(default, deserialize_with = "id_list")]
    sections: Vec<String>,
}

impl From<RawModule> for Module {
    fn from(raw: RawModule) -> Self {
        Self {
            id: raw.mongo_id.or(raw.id),
            title: raw.title.or(raw.name),
            section_ids: raw.sections,
            sections: Vec::new(),
        }
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawSection {
    #[serde(rename = "_id", default, deserialize_with = "lenient_id")]
    mongo_id: Option<String>,
    #[serde(default, deserialize_with = "lenient_id")]
    id: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    title: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    name: Option<String>,
    #[serde(rename = "type", default, deserialize_with = "lenient_kind")]
    kind: Option<ContentKind>,
    #[serde(default, deserialize_with = "lenient_kind")]
    section_type: Option<ContentKind>,
    #[serde(default, deserialize_with = "lenient_minutes")]
    duration: Option<u32>,
    #[serde(default, deserialize_with = "lenient_text")]
    status: Option<String>,
}

impl From<RawSection> for Section {
    fn from(raw: RawSection) -> Self {
        Self {
            id: raw.mongo_id.or(raw.id),
            title: raw.title.or(raw.name),
            kind: raw.kind.or(raw.section_type),
            duration: raw.duration,
            status: raw.status,
            items: Vec::new(),
        }
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawItem {
    #[serde(rename = "_id", default, deserialize_with = "lenient_id")]
    mongo_id: Option<String>,
    #[serde(default, deserialize_with = "lenient_id")]
    id: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    title: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    name: Option<String>,
    #[serde(rename = "type", default, deserialize_with = "lenient_kind")]
    kind: Option<ContentKind>,
    #[serde(default, deserialize_with = "lenient_minutes")]
    duration: Option<u32>,
    #[serde(default, deserialize_with = "lenient_text")]
    status: Option<String>,
    #[serde(default, deserialize_with = "lenient_id")]
    section_id: Option<String>,
    #[serde(default, deserialize_with = "lenient_id")]
    section: Option<String>,
}

impl From<RawItem> for Item {
    fn from(raw: RawItem) -> Self {
        Self {
            id: raw.mongo_id.or(raw.id),
            title: raw.title.or(raw.name),
            kind: raw.kind,
            duration: raw.duration,
            status: raw.status,
            section_id: raw.section_id.or(raw.section),
        }
    }
}

/// Extract an id from a string, number, or document reference
pub fn id_of(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
        Value::Number(n) => Some(n.to_string()),
        Value::Object(map) => {
            map.get("_id").or_else(|| map.get("id")).or_else(|| map.get("$oid")).and_then(id_of)
        }
        _ => None,
    }
}

pub(crate) fn lenient_id<'de, D: Deserializer<'de>>(d: D) -> Result<Option<String>, D::Error> {
    let value = Value::deserialize(d)?;
    Ok(id_of(&value))
}

pub(crate) fn lenient_text<'de, D: Deserializer<'de>>(d: D) -> Result<Option<String>, D::Error> {
    Ok(match Value::deserialize(d)? {
        Value::String(s) => Some(s),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    })
}

pub(crate) fn lenient_kind<'de, D: Deserializer<'de>>(
    d: D,
) -> Result<Option<ContentKind>, D::Error> {
    Ok(match Value::deserialize(d)? {
        Value::String(s) if !s.trim().is_empty() => Some(ContentKind::parse(&s)),
        _ => None,
    })
}

pub(crate) fn lenient_minutes<'de, D: Deserializer<'de>>(d: D) -> Result<Option<u32>, D::Error> {
    Ok(match Value::deserialize(d)? {
        Value::Number(n) => n.as_f64().filter(|m| *m >= 0.0).map(|m| m.round() as u32),
        Value::String(s) => {
            s.trim().parse::<f64>().ok().filter(|m| *m >= 0.0).map(|m| m.round() as u32)
        }
        _ => None,
    })
}

pub(crate) fn lenient_count<'de, D: Deserializer<'de>>(d: D) -> Result<u32, D::Error> {
    lenient_minutes(d).map(Option::unwrap_or_default)
}

pub(crate) fn lenient_bool<'de, D: Deserializer<'de>>(d: D) -> Result<Option<bool>, D::Error> {
    Ok(match Value::deserialize(d)? {
        Value::Bool(b) => Some(b),
        _ => None,
    })
}

/// Decode the entries of an array that fit `T`, dropping the rest
pub(crate) fn lenient_list<'de, D, T>(d: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: serde::de::DeserializeOwned,
{
    Ok(match Value::deserialize(d)? {
        Value::Array(values) => {
            values.into_iter().filter_map(|v| serde_json::from_value(v).ok()).collect()
        }
        _ => Vec::new(),
    })
}

/// Decode an object into `T`, or `None` when it does not fit
pub(crate) fn lenient_object<'de, D, T>(d: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: serde::de::DeserializeOwned,
{
    Ok(match Value::deserialize(d)? {
        value @ Value::Object(_) => serde_json::from_value(value).ok(),
        _ => None,
    })
}

fn id_list<'de, D: Deserializer<'de>>(d: D) -> Result<Vec<String>, D::Error> {
    Ok(match Value::deserialize(d)? {
        Value::Array(values) => values.iter().filter_map(id_of).collect(),
        _ => Vec::new(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn kind_parse_is_case_insensitive() {
        assert_eq!(ContentKind::parse("quiz"), ContentKind::Quiz);
        assert_eq!(ContentKind::parse(" Lesson "), ContentKind::Lesson);
        assert_eq!(ContentKind::parse("PODCAST"), ContentKind::Other("PODCAST".into()));
    }

    #[test]
    fn kind_priorities() {
        assert_eq!(ContentKind::Video.priority(), 1);
        assert_eq!(ContentKind::Quiz.priority(), 2);
        assert_eq!(ContentKind::Exercise.priority(), 3);
        assert_eq!(ContentKind::Assignment.priority(), 4);
        assert_eq!(ContentKind::Other("LAB".into()).priority(), 999);
    }

    #[test]
    fn module_accepts_id_and_populated_section_refs() {
        let module: Module = serde_json::from_value(json!({
            "_id": { "$oid": "m1" },
            "title": "Ownership",
            "sections": ["s1", { "_id": "s2", "title": "Populated" }, null, { "id": 3 }]
        }))
        .unwrap();

        assert_eq!(module.id.as_deref(), Some("m1"));
        assert_eq!(module.section_ids, vec!["s1", "s2", "3"]);
        assert!(module.sections.is_empty());
    }

    #[test]
    fn documents_with_both_id_spellings_decode() {
        let item: Item = serde_json::from_value(json!({
            "_id": "e1",
            "id": "e1",
            "section": "s1",
            "sectionId": "s1"
        }))
        .unwrap();
        assert_eq!(item.id.as_deref(), Some("e1"));
        assert_eq!(item.section_id.as_deref(), Some("s1"));
    }

    #[test]
    fn module_without_sections_field() {
        let module: Module = serde_json::from_value(json!({ "id": "m2" })).unwrap();
        assert!(module.section_ids.is_empty());
        assert_eq!(module.display_title(), "Untitled module");
    }

    #[test]
    fn section_decodes_leniently() {
        let section: Section = serde_json::from_value(json!({
            "_id": "s1",
            "title": "Intro",
            "type": "lesson",
            "duration": "12.4",
            "status": null
        }))
        .unwrap();

        assert_eq!(section.kind, Some(ContentKind::Lesson));
        assert_eq!(section.duration, Some(12));
        assert_eq!(section.status, None);
    }

    #[test]
    fn item_section_reference_may_be_populated() {
        let item: Item = serde_json::from_value(json!({
            "_id": "e1",
            "name": "Borrow checker drills",
            "section": { "_id": "s3", "title": "Exercises" },
            "duration": 15
        }))
        .unwrap();

        assert_eq!(item.section_id.as_deref(), Some("s3"));
        assert_eq!(item.display_title(), "Borrow checker drills");
        assert_eq!(item.duration, Some(15));
    }

    #[test]
    fn wrong_types_become_none() {
        let item: Item = serde_json::from_value(json!({
            "_id": ["weird"],
            "title": { "en": "Hi" },
            "type": 5,
            "duration": -3
        }))
        .unwrap();

        assert_eq!(item, Item::default());
    }

    #[test]
    fn effective_kind_falls_back_to_section() {
        let section = Section::new("s1", "Quizzes", ContentKind::Quiz);
        let item = Item { id: Some("q1".into()), ..Default::default() };
        assert_eq!(item.effective_kind(Some(&section)), Some(&ContentKind::Quiz));
        assert_eq!(item.effective_kind(None), None);
    }

    #[test]
    fn placeholder_exercise_shape() {
        let item = Item::placeholder_exercise("s9");
        assert_eq!(item.kind, Some(ContentKind::Exercise));
        assert_eq!(item.status.as_deref(), Some(STATUS_INCOMPLETE));
        assert_eq!(item.title.as_deref(), Some("Exercise"));
        assert_eq!(item.section_id.as_deref(), Some("s9"));
    }

    #[test]
    fn section_total_minutes_sums_items() {
        let mut section = Section::new("s1", "Lessons", ContentKind::Lesson);
        section.items.push(Item { duration: Some(5), ..Default::default() });
        section.items.push(Item { duration: Some(7), ..Default::default() });
        assert_eq!(section.total_minutes(), Some(12));

        section.duration = Some(30);
        assert_eq!(section.total_minutes(), Some(30));
    }

    #[test]
    fn huge_item_durations_saturate() {
        let mut section = Section::new("s1", "Lessons", ContentKind::Lesson);
        section.items.push(Item { duration: Some(u32::MAX), ..Default::default() });
        section.items.push(Item { duration: Some(1), ..Default::default() });
        assert_eq!(section.total_minutes(), Some(u32::MAX));
    }

    #[test]
    fn kind_serializes_as_label() {
        let item = Item::new("l1", "Hello", ContentKind::Lesson);
        let json = serde_json::to_value(&item).unwrap();
        assert_eq!(json["type"], "LESSON");
        assert_eq!(json["_id"], "l1");
    }
}
