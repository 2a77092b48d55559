use serde::{Deserialize, Deserializer, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::models::{Category, Product};

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateProductRequest {
    pub name: String,
    pub description: Option<String>,
    pub price: i64,
    pub discount_price: Option<i64>,
    pub stock: Option<i32>,
    pub is_available: Option<bool>,
    pub image: Option<String>,
    pub category_id: Option<Uuid>,
    pub city_id: Option<Uuid>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateProductRequest {
    pub name: Option<String>,
    pub description: Option<String>,
    pub price: Option<i64>,
    /// Absent keeps the current discount, `null` removes it.
    #[serde(default, deserialize_with = "present")]
    #[schema(value_type = Option<i64>)]
    pub discount_price: Option<Option<i64>>,
    pub stock: Option<i32>,
    pub is_available: Option<bool>,
    pub image: Option<String>,
    pub category_id: Option<Uuid>,
    pub city_id: Option<Uuid>,
}

/// Marks a field as sent, so an explicit `null` is told apart from an absent key.
fn present<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

#[derive(Serialize, ToSchema)]
#[serde(transparent)]
pub struct ProductList {
    #[schema(value_type = Vec<Product>)]
    pub items: Vec<Product>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct CategoryRequest {
    pub name: String,
}

#[derive(Serialize, ToSchema)]
#[serde(transparent)]
pub struct CategoryList {
    #[schema(value_type = Vec<Category>)]
    pub items: Vec<Category>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn discount(json: &str) -> Option<Option<i64>> {
        serde_json::from_str::<UpdateProductRequest>(json)
            .unwrap()
            .discount_price
    }

    #[test]
    fn null_discount_differs_from_missing() {
        assert_eq!(discount(r#"{"price": 500}"#), None);
        assert_eq!(discount(r#"{"discount_price": null}"#), Some(None));
        assert_eq!(discount(r#"{"discount_price": 300}"#), Some(Some(300)));
    }
}
