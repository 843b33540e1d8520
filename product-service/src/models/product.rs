use mongodb::bson::{Bson, Document};
use serde::{Deserialize, Serialize};
use service_core::error::AppError;
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum Category {
    Electronics,
    Books,
    Fashion,
    #[serde(rename = "Men's clothing")]
    MensClothing,
    #[serde(rename = "Women's clothing")]
    WomensClothing,
    Jewelery,
}

impl Category {
    pub const ALL: [Category; 6] = [
        Category::Electronics,
        Category::Books,
        Category::Fashion,
        Category::MensClothing,
        Category::WomensClothing,
        Category::Jewelery,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Category::Electronics => "Electronics",
            Category::Books => "Books",
            Category::Fashion => "Fashion",
            Category::MensClothing => "Men's clothing",
            Category::WomensClothing => "Women's clothing",
            Category::Jewelery => "Jewelery",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Category {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Category::ALL
            .into_iter()
            .find(|c| c.as_str() == s)
            .ok_or_else(|| format!("Unknown category: {}", s))
    }
}

/// A product document as stored in the `products` collection.
///
/// Documents may come from outside this service, so the body is kept as the
/// raw BSON it was read as: unknown fields, off-enum categories and
/// non-ObjectId identifiers all survive the read path. The typed accessors
/// return `None` for fields that are absent or of an unexpected type.
#[derive(Debug, Clone, PartialEq)]
pub struct Product {
    id: Bson,
    fields: Document,
}

impl Product {
    pub fn from_document(mut document: Document) -> Result<Self, AppError> {
        let id = document.remove("_id").ok_or_else(|| {
            AppError::DatabaseError(anyhow::anyhow!("product document without _id"))
        })?;
        Ok(Self {
            id,
            fields: document,
        })
    }

    pub fn id(&self) -> &Bson {
        &self.id
    }

    /// Every stored field except `_id`.
    pub fn fields(&self) -> &Document {
        &self.fields
    }

    pub fn get(&self, key: &str) -> Option<&Bson> {
        self.fields.get(key)
    }

    pub fn name(&self) -> Option<&str> {
        self.fields.get_str("name").ok()
    }

    pub fn price(&self) -> Option<f64> {
        match self.fields.get("price")? {
            Bson::Double(v) => Some(*v),
            Bson::Int32(v) => Some(f64::from(*v)),
            Bson::Int64(v) => Some(*v as f64),
            _ => None,
        }
    }

    /// The category when it is one of the known values.
    pub fn category(&self) -> Option<Category> {
        self.raw_category()?.parse().ok()
    }

    pub fn raw_category(&self) -> Option<&str> {
        self.fields.get_str("category").ok()
    }

    pub fn image_url(&self) -> Option<&str> {
        self.fields.get_str("imageUrl").ok()
    }
}

/// A product that has not been persisted yet; the store assigns `_id`.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct NewProduct {
    pub category: Option<Category>,
    pub name: Option<String>,
    pub price: Option<f64>,
    pub model: Option<String>,
    pub image_url: Option<String>,
    pub description: Option<String>,
}

impl NewProduct {
    pub fn new(name: impl Into<String>, price: f64) -> Self {
        Self {
            name: Some(name.into()),
            price: Some(price),
            ..Default::default()
        }
    }

    pub fn with_image_url(mut self, image_url: impl Into<String>) -> Self {
        self.image_url = Some(image_url.into());
        self
    }

    pub fn with_category(mut self, category: Category) -> Self {
        self.category = Some(category);
        self
    }

    /// The stored form. Absent fields are omitted, never written as null.
    pub fn to_document(&self) -> Document {
        let mut document = Document::new();
        if let Some(category) = self.category {
            document.insert("category", category.as_str());
        }
        if let Some(name) = &self.name {
            document.insert("name", name.as_str());
        }
        if let Some(price) = self.price {
            document.insert("price", price);
        }
        if let Some(model) = &self.model {
            document.insert("model", model.as_str());
        }
        if let Some(image_url) = &self.image_url {
            document.insert("imageUrl", image_url.as_str());
        }
        if let Some(description) = &self.description {
            document.insert("description", description.as_str());
        }
        document
    }

    pub fn into_product(self, id: impl Into<Bson>) -> Product {
        Product {
            id: id.into(),
            fields: self.to_document(),
        }
    }
}
