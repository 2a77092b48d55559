use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::{
    error::{AppError, AppResult},
    models::Order,
};

pub const DEFAULT_COUNTRY: &str = "Pakistan";
pub const PAYMENT_COD: &str = "COD";

#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct CreateOrderRequest {
    pub full_name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub address_line1: Option<String>,
    pub address_line2: Option<String>,
    pub city: Option<String>,
    pub country: Option<String>,
}

/// Trimmed shipping fields, email lower-cased.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShippingDetails {
    pub full_name: String,
    pub email: String,
    pub phone: String,
    pub address_line1: String,
    pub address_line2: String,
    pub city: String,
    pub country: String,
}

fn present(value: &Option<String>) -> Option<&str> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty())
}

impl CreateOrderRequest {
    pub fn into_shipping(self) -> AppResult<ShippingDetails> {
        let required = [
            ("full_name", &self.full_name),
            ("email", &self.email),
            ("phone", &self.phone),
            ("address_line1", &self.address_line1),
            ("city", &self.city),
        ];
        let missing: Vec<&str> = required
            .iter()
            .filter(|(_, value)| present(value).is_none())
            .map(|(name, _)| *name)
            .collect();
        if !missing.is_empty() {
            return Err(AppError::Validation(format!(
                "Missing required fields. Please provide: {}",
                missing.join(", ")
            )));
        }

        let field = |value: &Option<String>| present(value).unwrap_or_default().to_string();
        Ok(ShippingDetails {
            full_name: field(&self.full_name),
            email: field(&self.email).to_lowercase(),
            phone: field(&self.phone),
            address_line1: field(&self.address_line1),
            address_line2: field(&self.address_line2),
            city: field(&self.city),
            country: present(&self.country).unwrap_or(DEFAULT_COUNTRY).to_string(),
        })
    }
}

#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct ConfirmOrderRequest {
    /// One of Pending, Confirmed, Shipped, Delivered, Cancelled. Defaults to Confirmed.
    pub status: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct CheckoutResponse {
    pub error: bool,
    pub message: String,
    pub data: Order,
    pub email_sent: bool,
    pub items_count: usize,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct OrderStatusResponse {
    pub error: bool,
    pub message: String,
    pub data: Order,
    /// Emails queued by this transition.
    pub notifications: usize,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(transparent)]
pub struct OrderList {
    #[schema(value_type = Vec<Order>)]
    pub items: Vec<Order>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request() -> CreateOrderRequest {
        CreateOrderRequest {
            full_name: Some("  Ali Khan ".into()),
            email: Some("Ali@Example.COM ".into()),
            phone: Some("03001234567".into()),
            address_line1: Some("Main Bazaar".into()),
            address_line2: None,
            city: Some("Gilgit".into()),
            country: None,
        }
    }

    #[test]
    fn normalizes_fields_and_defaults_country() {
        let shipping = request().into_shipping().unwrap();
        assert_eq!(shipping.full_name, "Ali Khan");
        assert_eq!(shipping.email, "ali@example.com");
        assert_eq!(shipping.address_line2, "");
        assert_eq!(shipping.country, DEFAULT_COUNTRY);
    }

    #[test]
    fn names_every_blank_required_field() {
        let req = CreateOrderRequest {
            full_name: Some("   ".into()),
            city: None,
            ..request()
        };
        let err = req.into_shipping().unwrap_err();
        match err {
            AppError::Validation(msg) => {
                assert!(msg.contains("full_name"));
                assert!(msg.contains("city"));
                assert!(!msg.contains("phone"));
            }
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[test]
    fn blank_country_falls_back_to_default() {
        let req = CreateOrderRequest {
            country: Some(" ".into()),
            ..request()
        };
        assert_eq!(req.into_shipping().unwrap().country, "Pakistan");
    }
}
