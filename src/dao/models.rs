use std::{cmp::Ordering, fmt, str::FromStr};

use indexmap::IndexMap;
use rand::Rng;
use serde::{Deserialize, Deserializer, Serialize, Serializer, de::DeserializeOwned};
use serde_json::{Map, Number, Value};
use thiserror::Error;
use utoipa::ToSchema;

/// Ordered field name to value mapping exchanged with the storage backends.
pub type Fields = IndexMap<String, String>;

/// Length of the textual record identifier (12 bytes, hex encoded).
const ID_LENGTH: usize = 24;

/// Opaque record identifier shared by every backend.
///
/// The canonical form is 24 lowercase hexadecimal characters, the textual
/// shape of a MongoDB ObjectId, so identifiers stay interchangeable between
/// the memory, MongoDB and CouchDB stores.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, ToSchema)]
#[schema(value_type = String, example = "65a1f0c2e4b0a1b2c3d4e5f6")]
pub struct RecordId(String);

/// Raised when a client supplied identifier is not in the expected format.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("malformed record id `{0}`")]
pub struct MalformedId(pub String);

impl RecordId {
    /// Parse a client supplied identifier, normalising hex digits to lowercase.
    pub fn parse(raw: &str) -> Result<Self, MalformedId> {
        if raw.len() == ID_LENGTH && raw.chars().all(|c| c.is_ascii_hexdigit()) {
            Ok(Self(raw.to_ascii_lowercase()))
        } else {
            Err(MalformedId(raw.to_owned()))
        }
    }

    /// Produce a fresh random identifier for backends that do not assign their own.
    pub fn generate() -> Self {
        let mut bytes = [0u8; ID_LENGTH / 2];
        rand::rng().fill(&mut bytes);
        Self(bytes.iter().map(|byte| format!("{byte:02x}")).collect())
    }

    /// Borrow the canonical textual form.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for RecordId {
    type Err = MalformedId;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl Serialize for RecordId {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for RecordId {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        Self::parse(&raw).map_err(serde::de::Error::custom)
    }
}

/// Raw document as handed back by a storage backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document {
    /// Identifier assigned at insertion time.
    pub id: RecordId,
    /// Stored field values.
    pub fields: Fields,
}

/// Exact-match search filter (field name to expected value).
///
/// An empty filter matches every document. A field the document does not carry
/// never matches, which mirrors what a document database does for a query on
/// an absent field.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Filter(Fields);

impl Filter {
    /// Filter matching everything.
    pub fn all() -> Self {
        Self::default()
    }

    /// Add an equality constraint.
    pub fn with(mut self, field: impl Into<String>, value: impl Into<String>) -> Self {
        self.0.insert(field.into(), value.into());
        self
    }

    /// Whether the filter has no constraint at all.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterate over the `(field, value)` constraints.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Check whether the given stored fields satisfy every constraint.
    pub fn matches(&self, fields: &Fields) -> bool {
        self.0
            .iter()
            .all(|(field, expected)| fields.get(field) == Some(expected))
    }
}

impl<K, V> FromIterator<(K, V)> for Filter
where
    K: Into<String>,
    V: Into<String>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(
            iter.into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }
}

/// Compare two documents by the given ascending key tuple.
pub fn compare_by_keys(a: &Fields, b: &Fields, keys: &[&str]) -> Ordering {
    keys.iter()
        .map(|key| {
            let left = a.get(*key).map(String::as_str).unwrap_or_default();
            let right = b.get(*key).map(String::as_str).unwrap_or_default();
            left.cmp(right)
        })
        .find(|ordering| ordering.is_ne())
        .unwrap_or(Ordering::Equal)
}

/// Text stored for a payload value, or `None` when the value is falsy.
///
/// Non-empty strings, non-zero numbers and `true` are truthy. Empty strings,
/// zero, `false`, `null`, arrays and objects are ignored.
pub fn truthy_text(value: &Value) -> Option<String> {
    match value {
        Value::String(text) if !text.is_empty() => Some(text.clone()),
        Value::Number(number) if number.as_f64() != Some(0.0) => Some(number_text(number)),
        Value::Bool(true) => Some("true".to_owned()),
        _ => None,
    }
}

/// Integral floats print without a fraction, as JavaScript's `String(1.0)` does.
fn number_text(number: &Number) -> String {
    match number.as_f64() {
        Some(float) if number.is_f64() && float.fract() == 0.0 && float.abs() < 1e21 => {
            format!("{float}")
        }
        _ => number.to_string(),
    }
}

/// Field of another collection a record is expected to name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reference {
    /// Field on the referencing record.
    pub field: &'static str,
    /// Collection holding the referenced records.
    pub collection: &'static str,
    /// Field of the referenced record that must match.
    pub target_field: &'static str,
    /// Human readable name of the referenced entity.
    pub label: &'static str,
    /// Value that must exist in the target collection.
    pub value: String,
}

/// Shape descriptor shared by every entity kind.
///
/// Defaulting of missing fields, truthy-only patching and the sort order are
/// implemented once here; entities only declare their field list.
pub trait Record:
    Clone + Default + fmt::Debug + PartialEq + Serialize + DeserializeOwned + Send + Sync + 'static
{
    /// Storage collection name.
    const COLLECTION: &'static str;
    /// REST path segment of the collection endpoint.
    const RESOURCE: &'static str;
    /// Human readable entity name used in messages.
    const LABEL: &'static str;
    /// Recognised fields, which double as the ascending sort key tuple.
    const FIELDS: &'static [&'static str];

    /// Read a field by name.
    fn field(&self, name: &str) -> Option<&str>;

    /// Mutable access to a field by name.
    fn field_mut(&mut self, name: &str) -> Option<&mut String>;

    /// Soft references carried by this record (non-empty values only).
    fn references(&self) -> Vec<Reference> {
        Vec::new()
    }

    /// Build a record from an optional payload, defaulting every missing or
    /// falsy field to the empty string.
    fn from_payload(payload: &Map<String, Value>) -> Self {
        let mut record = Self::default();
        record.apply(payload);
        record
    }

    /// Overwrite the fields that are present and truthy in `payload`.
    ///
    /// Returns the names of the fields that were written.
    fn apply(&mut self, payload: &Map<String, Value>) -> Vec<&'static str> {
        let mut applied = Vec::new();
        for name in Self::FIELDS {
            let Some(text) = payload.get(*name).and_then(truthy_text) else {
                continue;
            };
            if let Some(slot) = self.field_mut(name) {
                *slot = text;
                applied.push(*name);
            }
        }
        applied
    }

    /// Flatten the record into storage fields.
    fn to_fields(&self) -> Fields {
        Self::FIELDS
            .iter()
            .map(|name| {
                (
                    (*name).to_owned(),
                    self.field(name).unwrap_or_default().to_owned(),
                )
            })
            .collect()
    }

    /// Rebuild a record from stored fields; absent fields read as empty.
    fn from_fields(fields: &Fields) -> Self {
        let mut record = Self::default();
        for name in Self::FIELDS {
            if let (Some(value), Some(slot)) = (fields.get(*name), record.field_mut(name)) {
                *slot = value.clone();
            }
        }
        record
    }
}

/// Record together with its storage identifier.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Stored<R> {
    /// Identifier of the stored record.
    pub id: RecordId,
    /// Field values.
    #[serde(flatten)]
    pub record: R,
}

impl<R: Record> From<Document> for Stored<R> {
    fn from(document: Document) -> Self {
        Self {
            record: R::from_fields(&document.fields),
            id: document.id,
        }
    }
}

/// A racer registered on the board.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(default)]
pub struct Player {
    /// Display name, referenced by highscores.
    pub name: String,
    /// Free-form skill description (e.g. "Beginner", "Pro").
    pub skill_level: String,
}

impl Record for Player {
    const COLLECTION: &'static str = "player";
    const RESOURCE: &'static str = "player";
    const LABEL: &'static str = "player";
    const FIELDS: &'static [&'static str] = &["name", "skill_level"];

    fn field(&self, name: &str) -> Option<&str> {
        match name {
            "name" => Some(&self.name),
            "skill_level" => Some(&self.skill_level),
            _ => None,
        }
    }

    fn field_mut(&mut self, name: &str) -> Option<&mut String> {
        match name {
            "name" => Some(&mut self.name),
            "skill_level" => Some(&mut self.skill_level),
            _ => None,
        }
    }
}

/// A race track.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(default)]
pub struct Track {
    /// Track title, referenced by highscores.
    pub track_title: String,
    /// Game edition the track belongs to.
    pub game_version: String,
}

impl Record for Track {
    const COLLECTION: &'static str = "tracks";
    const RESOURCE: &'static str = "track";
    const LABEL: &'static str = "track";
    const FIELDS: &'static [&'static str] = &["track_title", "game_version"];

    fn field(&self, name: &str) -> Option<&str> {
        match name {
            "track_title" => Some(&self.track_title),
            "game_version" => Some(&self.game_version),
            _ => None,
        }
    }

    fn field_mut(&mut self, name: &str) -> Option<&mut String> {
        match name {
            "track_title" => Some(&mut self.track_title),
            "game_version" => Some(&mut self.game_version),
            _ => None,
        }
    }
}

/// A lap time set by a player on a track.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(default)]
pub struct Highscore {
    /// Name of the player (soft reference to [`Player::name`]).
    pub name: String,
    /// Title of the track (soft reference to [`Track::track_title`]).
    pub track: String,
    /// Free-form time, conventionally `"HHh MMm SSs"`.
    pub time: String,
}

impl Record for Highscore {
    const COLLECTION: &'static str = "highscore";
    const RESOURCE: &'static str = "highscore";
    const LABEL: &'static str = "highscore";
    const FIELDS: &'static [&'static str] = &["name", "track", "time"];

    fn field(&self, name: &str) -> Option<&str> {
        match name {
            "name" => Some(&self.name),
            "track" => Some(&self.track),
            "time" => Some(&self.time),
            _ => None,
        }
    }

    fn field_mut(&mut self, name: &str) -> Option<&mut String> {
        match name {
            "name" => Some(&mut self.name),
            "track" => Some(&mut self.track),
            "time" => Some(&mut self.time),
            _ => None,
        }
    }

    fn references(&self) -> Vec<Reference> {
        let mut references = Vec::new();
        if !self.name.is_empty() {
            references.push(Reference {
                field: "name",
                collection: Player::COLLECTION,
                target_field: "name",
                label: Player::LABEL,
                value: self.name.clone(),
            });
        }
        if !self.track.is_empty() {
            references.push(Reference {
                field: "track",
                collection: Track::COLLECTION,
                target_field: "track_title",
                label: Track::LABEL,
                value: self.track.clone(),
            });
        }
        references
    }
}

/// Every collection with its ascending sort tuple, for backends that index them.
pub const SORTED_COLLECTIONS: [(&str, &[&str]); 3] = [
    (Player::COLLECTION, Player::FIELDS),
    (Track::COLLECTION, Track::FIELDS),
    (Highscore::COLLECTION, Highscore::FIELDS),
];
