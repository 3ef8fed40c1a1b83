//! Response shape normalization
//!
//! The LMS backend wraps its payloads inconsistently: some routes answer
//! `{ "data": { "lessons": [...] } }`, others `{ "data": [...] }`, a bare
//! array, or a single document. Every response goes through [`normalize`],
//! which tries a fixed list of shape matchers in order and stops at the first
//! one that applies.

use serde::de::DeserializeOwned;
use serde_json::Value;

/// Kind of entity a response is expected to carry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntityKind {
    Course,
    Module,
    Section,
    Lesson,
    Quiz,
    Exercise,
    Assignment,
}

impl EntityKind {
    /// Key under which collections of this kind are wrapped
    pub fn collection_key(self) -> &'static str {
        match self {
            Self::Course => "courses",
            Self::Module => "modules",
            Self::Section => "sections",
            Self::Lesson => "lessons",
            Self::Quiz => "quizzes",
            Self::Exercise => "exercises",
            Self::Assignment => "assignments",
        }
    }

    /// Key under which a single entity of this kind is wrapped
    pub fn singular_key(self) -> &'static str {
        match self {
            Self::Course => "course",
            Self::Module => "module",
            Self::Section => "section",
            Self::Lesson => "lesson",
            Self::Quiz => "quiz",
            Self::Exercise => "exercise",
            Self::Assignment => "assignment",
        }
    }
}

/// Which matcher produced the entity list
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Shape {
    /// `response.data.<collectionKey>` array
    DataCollection,
    /// `response.data` array
    DataArray,
    /// `response.<collectionKey>` array
    Collection,
    /// `response` is itself an array
    BareArray,
    /// `response.data` is a single document
    DataObject,
    /// `response.<singularKey>` is a single document
    KeyedObject,
    /// `response` is a single document with an id
    BareEntity,
    /// Nothing recognizable
    Empty,
}

type Matcher = fn(&Value, EntityKind) -> Option<Vec<Value>>;

/// Matchers in priority order
const MATCHERS: [(Shape, Matcher); 7] = [
    (Shape::DataCollection, data_collection),
    (Shape::DataArray, data_array),
    (Shape::Collection, collection),
    (Shape::BareArray, bare_array),
    (Shape::DataObject, data_object),
    (Shape::KeyedObject, keyed_object),
    (Shape::BareEntity, bare_entity),
];

fn data_collection(response: &Value, kind: EntityKind) -> Option<Vec<Value>> {
    response.get("data")?.get(kind.collection_key())?.as_array().cloned()
}

fn data_array(response: &Value, _kind: EntityKind) -> Option<Vec<Value>> {
    response.get("data")?.as_array().cloned()
}

fn collection(response: &Value, kind: EntityKind) -> Option<Vec<Value>> {
    response.get(kind.collection_key())?.as_array().cloned()
}

fn bare_array(response: &Value, _kind: EntityKind) -> Option<Vec<Value>> {
    response.as_array().cloned()
}

fn non_empty_object(value: &Value) -> Option<Vec<Value>> {
    let map = value.as_object()?;
    if map.is_empty() { None } else { Some(vec![value.clone()]) }
}

fn data_object(response: &Value, _kind: EntityKind) -> Option<Vec<Value>> {
    non_empty_object(response.get("data")?)
}

fn keyed_object(response: &Value, kind: EntityKind) -> Option<Vec<Value>> {
    non_empty_object(response.get(kind.singular_key())?)
}

fn bare_entity(response: &Value, _kind: EntityKind) -> Option<Vec<Value>> {
    let map = response.as_object()?;
    if map.contains_key("_id") || map.contains_key("id") {
        Some(vec![response.clone()])
    } else {
        None
    }
}

/// Raw entities extracted from a response
#[derive(Debug, Clone, PartialEq)]
pub struct Normalized {
    /// Matcher that fired
    pub shape: Shape,
    /// Entities in response order
    pub entities: Vec<Value>,
}

impl Normalized {
    /// Whether no entity was found
    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    /// Decode each entity, skipping the ones that do not fit `T`
    pub fn decode<T: DeserializeOwned>(self, kind: EntityKind) -> Vec<T> {
        self.entities
            .into_iter()
            .filter_map(|entity| match serde_json::from_value::<T>(entity) {
                Ok(decoded) => Some(decoded),
                Err(e) => {
                    tracing::warn!(kind = ?kind, error = %e, "Skipping malformed entity");
                    None
                }
            })
            .collect()
    }
}

/// Extract the entity list from a response of uncertain shape
pub fn normalize(response: &Value, kind: EntityKind) -> Normalized {
    for (shape, matcher) in MATCHERS {
        if let Some(entities) = matcher(response, kind) {
            return Normalized { shape, entities };
        }
    }

    Normalized { shape: Shape::Empty, entities: Vec::new() }
}

/// Normalize and decode in one step
pub fn normalize_as<T: DeserializeOwned>(response: &Value, kind: EntityKind) -> Vec<T> {
    normalize(response, kind).decode(kind)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use proptest::prelude::*;
    use serde_json::json;

    use crate::course::model::Item;

    fn ids(normalized: &Normalized) -> Vec<&str> {
        normalized.entities.iter().filter_map(|e| e["_id"].as_str()).collect()
    }

    #[test]
    fn wrapped_collection_wins_first() {
        let response = json!({ "data": { "lessons": [{ "_id": "l1" }, { "_id": "l2" }] } });
        let normalized = normalize(&response, EntityKind::Lesson);
        assert_eq!(normalized.shape, Shape::DataCollection);
        assert_eq!(ids(&normalized), vec!["l1", "l2"]);
    }

    #[test]
    fn wrapped_array() {
        let response = json!({ "success": true, "data": [{ "_id": "q1" }] });
        let normalized = normalize(&response, EntityKind::Quiz);
        assert_eq!(normalized.shape, Shape::DataArray);
        assert_eq!(ids(&normalized), vec!["q1"]);
    }

    #[test]
    fn top_level_collection() {
        let response = json!({ "exercises": [{ "_id": "e1" }], "count": 1 });
        let normalized = normalize(&response, EntityKind::Exercise);
        assert_eq!(normalized.shape, Shape::Collection);
        assert_eq!(ids(&normalized), vec!["e1"]);
    }

    #[test]
    fn bare_array_response() {
        let response = json!([{ "_id": "a1" }, { "_id": "a2" }]);
        let normalized = normalize(&response, EntityKind::Assignment);
        assert_eq!(normalized.shape, Shape::BareArray);
        assert_eq!(normalized.entities.len(), 2);
    }

    #[test]
    fn wrapped_single_object_becomes_one_element() {
        let response = json!({ "data": { "_id": "m1", "title": "Ownership" } });
        let normalized = normalize(&response, EntityKind::Module);
        assert_eq!(normalized.shape, Shape::DataObject);
        assert_eq!(ids(&normalized), vec!["m1"]);
    }

    #[test]
    fn singular_key_unwraps_one_document() {
        let response = json!({ "success": true, "course": { "_id": "c1", "modules": [] } });
        let normalized = normalize(&response, EntityKind::Course);
        assert_eq!(normalized.shape, Shape::KeyedObject);
        assert_eq!(ids(&normalized), vec!["c1"]);

        // Only the expected kind's key counts
        assert_eq!(normalize(&response, EntityKind::Module).shape, Shape::Empty);
        assert_eq!(normalize(&json!({ "course": {} }), EntityKind::Course).shape, Shape::Empty);
    }

    #[test]
    fn bare_entity_with_plain_id() {
        let response = json!({ "id": "s1", "title": "Intro" });
        let normalized = normalize(&response, EntityKind::Section);
        assert_eq!(normalized.shape, Shape::BareEntity);
        assert_eq!(normalized.entities.len(), 1);
    }

    #[test]
    fn unrecognized_shapes_are_empty() {
        for response in [
            Value::Null,
            json!({}),
            json!({ "message": "ok" }),
            json!({ "data": null }),
            json!({ "data": {} }),
            json!("lessons"),
            json!(42),
        ] {
            let normalized = normalize(&response, EntityKind::Lesson);
            assert_eq!(normalized.shape, Shape::Empty, "response: {response}");
            assert!(normalized.is_empty());
        }
    }

    #[test]
    fn empty_wrapped_collection_is_not_a_fallthrough() {
        let response = json!({ "data": { "exercises": [] }, "_id": "ignored" });
        let normalized = normalize(&response, EntityKind::Exercise);
        assert_eq!(normalized.shape, Shape::DataCollection);
        assert!(normalized.is_empty());
    }

    #[test]
    fn collection_key_is_kind_specific() {
        // A `lessons` key means nothing when quizzes are expected
        let response = json!({ "lessons": [{ "_id": "l1" }] });
        assert_eq!(normalize(&response, EntityKind::Quiz).shape, Shape::Empty);
    }

    #[test]
    fn decode_skips_malformed_entries() {
        let response = json!({ "data": [{ "_id": "l1", "title": "Hello" }, "not-an-object", 7] });
        let items: Vec<Item> = normalize_as(&response, EntityKind::Lesson);
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].id.as_deref(), Some("l1"));
    }

    fn arb_json() -> impl Strategy<Value = Value> {
        let leaf = prop_oneof![
            Just(Value::Null),
            any::<bool>().prop_map(Value::from),
            any::<i64>().prop_map(Value::from),
            "[a-z_]{0,8}".prop_map(Value::from),
        ];
        leaf.prop_recursive(4, 32, 4, |inner| {
            let key = prop_oneof![
                Just("data".to_string()),
                Just("_id".to_string()),
                Just("lessons".to_string()),
                Just("type".to_string()),
                "[a-z]{1,6}",
            ];
            prop_oneof![
                prop::collection::vec(inner.clone(), 0..4).prop_map(Value::Array),
                prop::collection::hash_map(key, inner, 0..4)
                    .prop_map(|m| Value::Object(m.into_iter().collect())),
            ]
        })
    }

    proptest! {
        #[test]
        fn normalize_never_panics(response in arb_json()) {
            let normalized = normalize(&response, EntityKind::Lesson);
            if normalized.shape == Shape::Empty {
                prop_assert!(normalized.entities.is_empty());
            }
            let _items: Vec<Item> = normalized.decode(EntityKind::Lesson);
        }
    }
}
