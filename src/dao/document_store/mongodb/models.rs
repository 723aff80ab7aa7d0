use mongodb::bson::{Bson, Document as BsonDocument, doc, oid::ObjectId};
use tracing::warn;

use crate::dao::models::{Document, Fields, Filter, RecordId};

/// Query selecting a single document by identifier.
pub fn id_filter(id: &RecordId) -> BsonDocument {
    match ObjectId::parse_str(id.as_str()) {
        Ok(oid) => doc! { "_id": oid },
        Err(_) => doc! { "_id": id.as_str() },
    }
}

/// Equality query built from an exact-match filter.
pub fn filter_document(filter: &Filter) -> BsonDocument {
    let mut query = BsonDocument::new();
    for (field, value) in filter.iter() {
        query.insert(field, value);
    }
    query
}

/// Ascending sort specification for the given key tuple.
pub fn sort_document(keys: &[&str]) -> BsonDocument {
    let mut order = BsonDocument::new();
    for key in keys {
        order.insert(*key, 1);
    }
    order
}

/// Store every field as a BSON string.
pub fn fields_document(fields: &Fields) -> BsonDocument {
    let mut document = BsonDocument::new();
    for (field, value) in fields {
        document.insert(field.clone(), value.clone());
    }
    document
}

/// Convert a fetched BSON document, skipping anything that is not a scalar.
pub fn into_document(raw: BsonDocument) -> Option<Document> {
    let id = match raw.get("_id") {
        Some(Bson::ObjectId(oid)) => RecordId::parse(&oid.to_hex()).ok(),
        Some(Bson::String(text)) => RecordId::parse(text).ok(),
        _ => None,
    };
    let Some(id) = id else {
        warn!(id = ?raw.get("_id"), "skipping MongoDB document with unsupported identifier");
        return None;
    };

    let mut fields = Fields::new();
    for (key, value) in raw {
        if key == "_id" {
            continue;
        }
        let text = match value {
            Bson::String(text) => text,
            Bson::Int32(number) => number.to_string(),
            Bson::Int64(number) => number.to_string(),
            Bson::Double(number) => number.to_string(),
            Bson::Boolean(flag) => flag.to_string(),
            _ => continue,
        };
        fields.insert(key, text);
    }

    Some(Document { id, fields })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn object_ids_round_trip_through_record_ids() {
        let oid = ObjectId::new();
        let raw = doc! { "_id": oid, "name": "Ada", "skill_level": "Pro", "rank": 3 };
        let document = into_document(raw).unwrap();
        assert_eq!(document.id.as_str(), oid.to_hex());
        assert_eq!(document.fields["name"], "Ada");
        assert_eq!(document.fields["rank"], "3");
        assert_eq!(id_filter(&document.id), doc! { "_id": oid });
    }

    #[test]
    fn documents_without_usable_id_are_skipped() {
        assert!(into_document(doc! { "_id": 42, "name": "Ada" }).is_none());
        assert!(into_document(doc! { "name": "Ada" }).is_none());
    }

    #[test]
    fn sort_document_keeps_key_order() {
        let order = sort_document(&["name", "track", "time"]);
        let keys = order.keys().cloned().collect::<Vec<_>>();
        assert_eq!(keys, ["name", "track", "time"]);
    }
}
