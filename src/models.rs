use std::{fmt, str::FromStr};

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::order_status::OrderStatus;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema, Default)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    #[default]
    Tourist,
    BusinessOwner,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Tourist => "tourist",
            Role::BusinessOwner => "business_owner",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Role::Tourist => "tourist",
            Role::BusinessOwner => "business owner",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "tourist" => Ok(Role::Tourist),
            "business_owner" => Ok(Role::BusinessOwner),
            other => Err(format!("unknown role '{other}'")),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct User {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    pub role: Role,
    pub first_name: Option<String>,
    pub phone: Option<String>,
    pub shop_name: Option<String>,
    pub address: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct Region {
    pub id: Uuid,
    pub name: String,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct City {
    pub id: Uuid,
    pub region_id: Uuid,
    pub region: Option<String>,
    pub name: String,
    pub description: Option<String>,
    pub highlights: Vec<String>,
    pub altitude: Option<String>,
    pub best_time_to_visit: Option<String>,
    pub image: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct Category {
    pub id: Uuid,
    pub name: String,
    pub slug: String,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct Product {
    pub id: Uuid,
    pub owner_id: Uuid,
    /// Display name of the owning account.
    pub owner: Option<String>,
    pub category: Option<Category>,
    pub city_id: Option<Uuid>,
    pub name: String,
    pub slug: String,
    pub description: Option<String>,
    pub price: i64,
    pub discount_price: Option<i64>,
    pub effective_price: i64,
    pub discount_percentage: i64,
    pub stock: i32,
    pub is_available: bool,
    pub image: Option<String>,
    pub reviews_count: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct CartItem {
    pub id: Uuid,
    pub product: Product,
    pub quantity: i32,
    pub total_price: i64,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct Cart {
    pub id: Option<Uuid>,
    pub user_id: Uuid,
    pub items: Vec<CartItem>,
    pub subtotal: i64,
    pub grand_total: i64,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct OrderItem {
    pub id: Uuid,
    pub product_id: Option<Uuid>,
    pub product_name: Option<String>,
    pub product_image: Option<String>,
    pub quantity: i32,
    pub price: i64,
    pub subtotal: i64,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct Order {
    pub id: Uuid,
    pub buyer: Option<String>,
    pub seller: Option<String>,
    pub full_name: String,
    pub email: String,
    pub phone: String,
    pub address_line1: String,
    pub address_line2: String,
    pub city: String,
    pub country: String,
    pub shipping_address: String,
    pub status: OrderStatus,
    pub payment_method: String,
    pub total_amount: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub items: Vec<OrderItem>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct Review {
    pub id: Uuid,
    pub product_id: Uuid,
    pub user: Option<String>,
    pub rating: i16,
    pub comment: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema, Default)]
#[serde(rename_all = "snake_case")]
pub enum BusinessType {
    #[default]
    Restaurant,
    Hotel,
    LocalTraditional,
    Cafe,
}

impl BusinessType {
    pub const ALL: [BusinessType; 4] = [
        BusinessType::Restaurant,
        BusinessType::Hotel,
        BusinessType::LocalTraditional,
        BusinessType::Cafe,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            BusinessType::Restaurant => "restaurant",
            BusinessType::Hotel => "hotel",
            BusinessType::LocalTraditional => "local_traditional",
            BusinessType::Cafe => "cafe",
        }
    }
}

impl FromStr for BusinessType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        BusinessType::ALL
            .into_iter()
            .find(|kind| kind.as_str() == s)
            .ok_or_else(|| format!("unknown business type '{s}'"))
    }
}

/// A restaurant, hotel, guest house or cafe listed by a business owner.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct Business {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub city_id: Option<Uuid>,
    pub city: Option<String>,
    pub name: String,
    pub business_type: BusinessType,
    pub location_inside_city: Option<String>,
    pub description: Option<String>,
    pub is_active: bool,
    pub room_available: bool,
    pub contacts_and_hours: Vec<String>,
    pub amenities: Vec<String>,
    pub get_direction: Option<String>,
    pub whatsapp_number: Option<String>,
    pub whatsapp_link: Option<String>,
    pub image: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum EventType {
    CulturalFestival,
    NaturalFestival,
    AdventureFestival,
    SportsFestival,
}

impl EventType {
    pub const ALL: [EventType; 4] = [
        EventType::CulturalFestival,
        EventType::NaturalFestival,
        EventType::AdventureFestival,
        EventType::SportsFestival,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            EventType::CulturalFestival => "cultural_festival",
            EventType::NaturalFestival => "natural_festival",
            EventType::AdventureFestival => "adventure_festival",
            EventType::SportsFestival => "sports_festival",
        }
    }
}

impl FromStr for EventType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        EventType::ALL
            .into_iter()
            .find(|kind| kind.as_str() == s)
            .ok_or_else(|| format!("unknown event type '{s}'"))
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct Event {
    pub id: Uuid,
    pub city_id: Uuid,
    pub city: Option<String>,
    pub title: String,
    pub description: String,
    pub event_type: EventType,
    pub date: NaiveDate,
    pub location: String,
    pub image: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct TouristPlace {
    pub id: Uuid,
    pub city_id: Option<Uuid>,
    pub city: Option<String>,
    pub name: String,
    pub short_description: Option<String>,
    pub location_inside_city: Option<String>,
    pub distance_from_main_city: Option<String>,
    pub map_url: Option<String>,
    pub image: Option<String>,
    pub extra_images: Vec<String>,
    pub created_at: DateTime<Utc>,
}

/// `https://wa.me/<digits>` for a stored number, ignoring spaces, dashes and a leading `+`.
pub fn whatsapp_link(number: Option<&str>) -> Option<String> {
    let digits: String = number?.chars().filter(char::is_ascii_digit).collect();
    (!digits.is_empty()).then(|| format!("https://wa.me/{digits}"))
}

/// Trimmed entries of a JSON string array. A bare string is split on commas.
pub fn string_list(raw: Option<&serde_json::Value>) -> Vec<String> {
    let entries: Vec<&str> = match raw {
        Some(serde_json::Value::Array(values)) => {
            values.iter().filter_map(serde_json::Value::as_str).collect()
        }
        Some(serde_json::Value::String(text)) => text.split(',').collect(),
        _ => Vec::new(),
    };
    entries
        .into_iter()
        .map(str::trim)
        .filter(|entry| !entry.is_empty())
        .map(String::from)
        .collect()
}

/// Highest unit price a product may carry, in rupees.
pub const MAX_PRICE: i64 = 100_000_000;
/// Most units of one product a cart line may hold.
pub const MAX_LINE_QUANTITY: i32 = 10_000;

/// Unit price a buyer pays: the discount price when one is set.
pub fn effective_price(price: i64, discount_price: Option<i64>) -> i64 {
    discount_price.unwrap_or(price)
}

/// `unit * quantity`, or `None` when it does not fit in an `i64`.
pub fn line_total(unit: i64, quantity: i32) -> Option<i64> {
    unit.checked_mul(i64::from(quantity))
}

pub fn sum_totals(totals: impl IntoIterator<Item = i64>) -> Option<i64> {
    totals
        .into_iter()
        .try_fold(0i64, |acc, total| acc.checked_add(total))
}

pub fn discount_percentage(price: i64, discount_price: Option<i64>) -> i64 {
    match discount_price {
        Some(discount) if price > 0 => {
            let pct = (price - discount) as f64 * 100.0 / price as f64;
            pct.round() as i64
        }
        _ => 0,
    }
}

/// Non-blank address parts joined with `", "`.
pub fn shipping_address(parts: [&str; 5]) -> String {
    parts
        .into_iter()
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn discount_price_wins_when_present() {
        assert_eq!(effective_price(1000, Some(800)), 800);
        assert_eq!(effective_price(1000, None), 1000);
    }

    #[test]
    fn totals_refuse_to_overflow() {
        assert_eq!(line_total(800, 3), Some(2400));
        assert_eq!(line_total(i64::MAX / 2, 3), None);
        assert_eq!(sum_totals([2400, 650]), Some(3050));
        assert_eq!(sum_totals([i64::MAX, 1]), None);
        assert_eq!(sum_totals([]), Some(0));
    }

    #[test]
    fn discount_percentage_rounds() {
        assert_eq!(discount_percentage(1000, Some(800)), 20);
        assert_eq!(discount_percentage(300, Some(200)), 33);
        assert_eq!(discount_percentage(0, Some(0)), 0);
        assert_eq!(discount_percentage(500, None), 0);
    }

    #[test]
    fn shipping_address_skips_blank_line2() {
        assert_eq!(
            shipping_address(["Ali Khan", "Main Bazaar", "", "Gilgit", "Pakistan"]),
            "Ali Khan, Main Bazaar, Gilgit, Pakistan"
        );
        assert_eq!(
            shipping_address(["Ali Khan", "Main Bazaar", "Near Polo Ground", "Gilgit", "Pakistan"]),
            "Ali Khan, Main Bazaar, Near Polo Ground, Gilgit, Pakistan"
        );
    }

    #[test]
    fn whatsapp_link_keeps_digits_only() {
        assert_eq!(
            whatsapp_link(Some("+92 300-1234567")).as_deref(),
            Some("https://wa.me/923001234567")
        );
        assert_eq!(whatsapp_link(Some("  ")), None);
        assert_eq!(whatsapp_link(None), None);
    }

    #[test]
    fn string_list_accepts_arrays_and_comma_text() {
        let array = serde_json::json!([" Wifi ", "", "Parking"]);
        assert_eq!(string_list(Some(&array)), vec!["Wifi", "Parking"]);
        let text = serde_json::json!("Mon-Sat 9-10, 0300 1234567,");
        assert_eq!(string_list(Some(&text)), vec!["Mon-Sat 9-10", "0300 1234567"]);
        assert!(string_list(None).is_empty());
    }

    #[test]
    fn directory_types_parse_from_storage() {
        assert_eq!("local_traditional".parse::<BusinessType>(), Ok(BusinessType::LocalTraditional));
        assert!("motel".parse::<BusinessType>().is_err());
        assert_eq!("sports_festival".parse::<EventType>(), Ok(EventType::SportsFestival));
    }

    #[test]
    fn role_round_trips_through_text() {
        assert_eq!("business_owner".parse::<Role>(), Ok(Role::BusinessOwner));
        assert_eq!(Role::Tourist.as_str(), "tourist");
        assert!("admin".parse::<Role>().is_err());
    }
}
