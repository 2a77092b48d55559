use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::{
    models::{City, Region},
    routes::params::Pagination,
};

#[derive(Debug, Serialize, ToSchema)]
#[serde(transparent)]
pub struct RegionList {
    #[schema(value_type = Vec<Region>)]
    pub items: Vec<Region>,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(transparent)]
pub struct CityList {
    #[schema(value_type = Vec<City>)]
    pub items: Vec<City>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct CityQuery {
    pub page: Option<i64>,
    pub per_page: Option<i64>,
    pub region_id: Option<Uuid>,
}

impl CityQuery {
    pub fn pagination(&self) -> Pagination {
        Pagination {
            page: self.page,
            per_page: self.per_page,
        }
    }
}
