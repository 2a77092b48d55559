use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::{
    models::{Business, BusinessType, Event, EventType, TouristPlace},
    routes::params::Pagination,
};

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateBusinessRequest {
    pub name: String,
    pub business_type: Option<BusinessType>,
    pub city_id: Option<Uuid>,
    pub location_inside_city: Option<String>,
    pub description: Option<String>,
    pub is_active: Option<bool>,
    pub room_available: Option<bool>,
    pub contacts_and_hours: Option<Vec<String>>,
    pub amenities: Option<Vec<String>>,
    pub get_direction: Option<String>,
    pub whatsapp_number: Option<String>,
    pub image: Option<String>,
}

#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct UpdateBusinessRequest {
    pub name: Option<String>,
    pub business_type: Option<BusinessType>,
    pub city_id: Option<Uuid>,
    pub location_inside_city: Option<String>,
    pub description: Option<String>,
    pub is_active: Option<bool>,
    pub room_available: Option<bool>,
    pub contacts_and_hours: Option<Vec<String>>,
    pub amenities: Option<Vec<String>>,
    pub get_direction: Option<String>,
    pub whatsapp_number: Option<String>,
    pub image: Option<String>,
}

#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct BusinessQuery {
    pub page: Option<i64>,
    pub per_page: Option<i64>,
    /// Matches name or business type.
    pub q: Option<String>,
    pub city_id: Option<Uuid>,
    pub business_type: Option<BusinessType>,
}

impl BusinessQuery {
    pub fn pagination(&self) -> Pagination {
        Pagination {
            page: self.page,
            per_page: self.per_page,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(transparent)]
pub struct BusinessList {
    #[schema(value_type = Vec<Business>)]
    pub items: Vec<Business>,
}

#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct EventQuery {
    pub page: Option<i64>,
    pub per_page: Option<i64>,
    pub q: Option<String>,
    pub city_id: Option<Uuid>,
    pub event_type: Option<EventType>,
    /// Only events after today, soonest first.
    pub upcoming: Option<bool>,
}

impl EventQuery {
    pub fn pagination(&self) -> Pagination {
        Pagination {
            page: self.page,
            per_page: self.per_page,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(transparent)]
pub struct EventList {
    #[schema(value_type = Vec<Event>)]
    pub items: Vec<Event>,
}

#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct TouristPlaceQuery {
    pub page: Option<i64>,
    pub per_page: Option<i64>,
    /// Matches name, location and description.
    pub q: Option<String>,
    pub city_id: Option<Uuid>,
}

impl TouristPlaceQuery {
    pub fn pagination(&self) -> Pagination {
        Pagination {
            page: self.page,
            per_page: self.per_page,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(transparent)]
pub struct TouristPlaceList {
    #[schema(value_type = Vec<TouristPlace>)]
    pub items: Vec<TouristPlace>,
}
