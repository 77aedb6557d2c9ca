//! # BSON Conversion
//!
//! Records carry their id as a hex string; MongoDB stores it as an
//! `ObjectId`. These helpers translate at the collection boundary.

use market_core::{MarketError, MarketResult};
use mongodb::bson::{self, doc, oid::ObjectId, Bson, Document};
use serde::{de::DeserializeOwned, Serialize};
use tracing::warn;

/// Parse a client-supplied id
pub fn object_id(id: &str) -> MarketResult<ObjectId> {
    ObjectId::parse_str(id)
        .map_err(|_| MarketError::InvalidRequest(format!("invalid id: {}", id)))
}

/// `{ _id: ObjectId(id) }`
pub fn id_filter(id: &str) -> MarketResult<Document> {
    Ok(doc! { "_id": object_id(id)? })
}

/// Serialize a record for storage, leaving `_id` to the database
pub fn to_document<T: Serialize>(record: &T) -> MarketResult<Document> {
    let mut document = bson::to_document(record)
        .map_err(|e| MarketError::Serialization(format!("failed to encode document: {}", e)))?;
    document.remove("_id");
    Ok(document)
}

/// Decode a stored document, rendering its `ObjectId` as hex
pub fn from_document<T: DeserializeOwned>(mut document: Document) -> MarketResult<T> {
    if let Ok(oid) = document.get_object_id("_id") {
        document.insert("_id", oid.to_hex());
    }
    bson::from_document(document)
        .map_err(|e| MarketError::Serialization(format!("failed to decode document: {}", e)))
}

/// Decode a fetched batch, skipping documents that no longer fit the record
pub fn decode_all<T: DeserializeOwned>(collection: &str, documents: Vec<Document>) -> Vec<T> {
    documents
        .into_iter()
        .filter_map(|document| {
            let id = document.get("_id").map(bson_id);
            match from_document(document) {
                Ok(record) => Some(record),
                Err(e) => {
                    warn!(
                        "Skipping undecodable document {:?} in {}: {}",
                        id, collection, e
                    );
                    None
                }
            }
        })
        .collect()
}

/// Render a driver-generated id the way clients see it
pub fn bson_id(id: &Bson) -> String {
    match id {
        Bson::ObjectId(oid) => oid.to_hex(),
        Bson::String(s) => s.clone(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use market_core::{Tool, User};
    use serde_json::json;

    #[test]
    fn test_object_id_parsing() {
        assert!(object_id("nope").is_err());
        let oid = ObjectId::new();
        assert_eq!(object_id(&oid.to_hex()).unwrap(), oid);
        assert_eq!(id_filter(&oid.to_hex()).unwrap(), doc! { "_id": oid });
    }

    #[test]
    fn test_to_document_drops_id() {
        let mut tool = Tool::new("Chisel", 8.0, 30);
        tool.id = Some("client-chosen".to_string());
        let document = to_document(&tool).unwrap();
        assert!(document.get("_id").is_none());
        assert_eq!(document.get_str("name").unwrap(), "Chisel");
        assert_eq!(document.get_f64("price").unwrap(), 8.0);
    }

    #[test]
    fn test_from_document_renders_object_id() {
        let oid = ObjectId::new();
        let document = doc! {
            "_id": oid,
            "email": "admin@example.com",
            "role": "admin",
            "phone": "555-0101",
        };
        let user: User = from_document(document).unwrap();
        assert_eq!(user.id, Some(oid.to_hex()));
        assert!(user.is_admin());
        assert_eq!(user.extra.get("phone"), Some(&json!("555-0101")));
    }

    #[test]
    fn test_from_document_accepts_integer_price() {
        let document = doc! { "_id": ObjectId::new(), "name": "Vise", "price": 20_i32, "quantity": 3_i32 };
        let tool: Tool = from_document(document).unwrap();
        assert_eq!(tool.price, 20.0);
        assert_eq!(tool.quantity, 3);
    }

    #[test]
    fn test_from_document_accepts_string_numbers() {
        let document = doc! { "_id": ObjectId::new(), "name": "Clamp", "price": "25", "quantity": "5" };
        let tool: Tool = from_document(document).unwrap();
        assert_eq!(tool.price, 25.0);
        assert_eq!(tool.quantity, 5);
    }

    #[test]
    fn test_decode_all_skips_off_type_documents() {
        let documents = vec![
            doc! { "_id": ObjectId::new(), "name": "Saw", "price": 30.0, "quantity": 2_i32 },
            doc! { "_id": ObjectId::new(), "name": "Broken", "price": { "amount": 5 }, "quantity": 1_i32 },
            doc! { "_id": ObjectId::new(), "price": 4.0 },
            doc! { "_id": ObjectId::new(), "name": "Level", "price": "12.5", "quantity": "3" },
        ];
        let tools: Vec<Tool> = decode_all("tools", documents);
        let names: Vec<&str> = tools.iter().map(|t| t.name.as_str()).collect();
        assert_eq!(names, vec!["Saw", "Level"]);
    }

    #[test]
    fn test_bson_id() {
        let oid = ObjectId::new();
        assert_eq!(bson_id(&Bson::ObjectId(oid)), oid.to_hex());
        assert_eq!(bson_id(&Bson::String("abc".into())), "abc");
    }
}
