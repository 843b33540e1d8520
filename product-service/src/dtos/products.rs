use crate::models::Product;
use mongodb::bson::Bson;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Wire shape of a product: every stored field plus `_id`.
///
/// ObjectIds are rendered as hex strings and dates as RFC 3339; other BSON
/// values use relaxed extended JSON.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(transparent)]
pub struct ProductResponse(pub Map<String, Value>);

impl From<Product> for ProductResponse {
    fn from(product: Product) -> Self {
        let mut body = Map::new();
        body.insert("_id".to_string(), bson_to_json(product.id()));
        for (key, value) in product.fields() {
            body.insert(key.clone(), bson_to_json(value));
        }
        Self(body)
    }
}

fn bson_to_json(value: &Bson) -> Value {
    match value {
        Bson::ObjectId(oid) => Value::String(oid.to_hex()),
        Bson::DateTime(dt) => match dt.try_to_rfc3339_string() {
            Ok(s) => Value::String(s),
            Err(_) => value.clone().into_relaxed_extjson(),
        },
        Bson::Document(doc) => Value::Object(
            doc.iter()
                .map(|(k, v)| (k.clone(), bson_to_json(v)))
                .collect(),
        ),
        Bson::Array(items) => Value::Array(items.iter().map(bson_to_json).collect()),
        other => other.clone().into_relaxed_extjson(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mongodb::bson::{doc, oid::ObjectId};
    use serde_json::json;

    #[test]
    fn extra_fields_and_mongoose_version_key_are_kept() {
        let id = ObjectId::new();
        let product = Product::from_document(doc! {
            "_id": id,
            "name": "X",
            "price": 1.0,
            "__v": 0,
            "stock": 7,
        })
        .unwrap();

        let body = serde_json::to_value(ProductResponse::from(product)).unwrap();
        assert_eq!(
            body,
            json!({
                "_id": id.to_hex(),
                "name": "X",
                "price": 1.0,
                "__v": 0,
                "stock": 7,
            })
        );
    }

    #[test]
    fn off_enum_category_and_custom_id_render_as_stored() {
        let reference = ObjectId::parse_str("65a1f0c2e4b0a1b2c3d4e5f6").unwrap();
        let product = Product::from_document(doc! {
            "_id": "sku-1",
            "category": "Toys",
            "tags": ["a", "b"],
            "dimensions": { "w": 2, "ref": reference },
        })
        .unwrap();

        let body = serde_json::to_value(ProductResponse::from(product)).unwrap();
        assert_eq!(body["_id"], "sku-1");
        assert_eq!(body["category"], "Toys");
        assert_eq!(body["tags"], json!(["a", "b"]));
        assert_eq!(body["dimensions"]["ref"], "65a1f0c2e4b0a1b2c3d4e5f6");
    }

    #[test]
    fn dates_render_as_rfc3339() {
        let product = Product::from_document(doc! {
            "_id": 1,
            "createdAt": mongodb::bson::DateTime::from_millis(0),
        })
        .unwrap();

        let body = serde_json::to_value(ProductResponse::from(product)).unwrap();
        assert_eq!(body["_id"], 1);
        assert_eq!(body["createdAt"], "1970-01-01T00:00:00Z");
    }
}
