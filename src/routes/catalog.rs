use axum::{
    Json, Router,
    extract::{Path, Query, State},
    routing::get,
};
use uuid::Uuid;

use crate::{
    dto::{
        catalog::{CityList, CityQuery, RegionList},
        directory::{EventList, EventQuery, TouristPlaceList, TouristPlaceQuery},
    },
    error::AppResult,
    models::{City, Event, TouristPlace},
    response::ApiResponse,
    services::catalog_service,
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/regions", get(list_regions))
        .route("/cities", get(list_cities))
        .route("/cities/{id}", get(get_city))
        .route("/events", get(list_events))
        .route("/events/{id}", get(get_event))
        .route("/tourist-places", get(list_tourist_places))
        .route("/tourist-places/{id}", get(get_tourist_place))
}

#[utoipa::path(
    get,
    path = "/api/catalog/regions",
    responses(
        (status = 200, description = "All regions", body = ApiResponse<RegionList>)
    ),
    tag = "Catalog"
)]
pub async fn list_regions(
    State(state): State<AppState>,
) -> AppResult<Json<ApiResponse<RegionList>>> {
    let resp = catalog_service::list_regions(&state).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/api/catalog/cities",
    params(
        ("page" = Option<i64>, Query, description = "Page number, default 1"),
        ("per_page" = Option<i64>, Query, description = "Items per page, default 20"),
        ("region_id" = Option<Uuid>, Query, description = "Filter by region"),
    ),
    responses(
        (status = 200, description = "Cities by name", body = ApiResponse<CityList>)
    ),
    tag = "Catalog"
)]
pub async fn list_cities(
    State(state): State<AppState>,
    Query(query): Query<CityQuery>,
) -> AppResult<Json<ApiResponse<CityList>>> {
    let resp = catalog_service::list_cities(&state, query).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/api/catalog/cities/{id}",
    params(("id" = Uuid, Path, description = "City id")),
    responses(
        (status = 200, description = "City detail", body = ApiResponse<City>),
        (status = 404, description = "City not found")
    ),
    tag = "Catalog"
)]
pub async fn get_city(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<City>>> {
    let resp = catalog_service::get_city(&state, id).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/api/catalog/events",
    params(
        ("page" = Option<i64>, Query, description = "Page number, default 1"),
        ("per_page" = Option<i64>, Query, description = "Items per page, default 20"),
        ("q" = Option<String>, Query, description = "Search title, description and location"),
        ("city_id" = Option<Uuid>, Query, description = "Filter by city"),
        ("event_type" = Option<String>, Query, description = "cultural_festival, natural_festival, adventure_festival or sports_festival"),
        ("upcoming" = Option<bool>, Query, description = "Only future events, soonest first"),
    ),
    responses(
        (status = 200, description = "Events", body = ApiResponse<EventList>)
    ),
    tag = "Catalog"
)]
pub async fn list_events(
    State(state): State<AppState>,
    Query(query): Query<EventQuery>,
) -> AppResult<Json<ApiResponse<EventList>>> {
    let resp = catalog_service::list_events(&state, query).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/api/catalog/events/{id}",
    params(("id" = Uuid, Path, description = "Event id")),
    responses(
        (status = 200, description = "Event detail", body = ApiResponse<Event>),
        (status = 404, description = "Event not found")
    ),
    tag = "Catalog"
)]
pub async fn get_event(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<Event>>> {
    let resp = catalog_service::get_event(&state, id).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/api/catalog/tourist-places",
    params(
        ("page" = Option<i64>, Query, description = "Page number, default 1"),
        ("per_page" = Option<i64>, Query, description = "Items per page, default 20"),
        ("q" = Option<String>, Query, description = "Search name, location and description"),
        ("city_id" = Option<Uuid>, Query, description = "Filter by city"),
    ),
    responses(
        (status = 200, description = "Tourist places by name", body = ApiResponse<TouristPlaceList>)
    ),
    tag = "Catalog"
)]
pub async fn list_tourist_places(
    State(state): State<AppState>,
    Query(query): Query<TouristPlaceQuery>,
) -> AppResult<Json<ApiResponse<TouristPlaceList>>> {
    let resp = catalog_service::list_tourist_places(&state, query).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/api/catalog/tourist-places/{id}",
    params(("id" = Uuid, Path, description = "Tourist place id")),
    responses(
        (status = 200, description = "Tourist place with its extra images", body = ApiResponse<TouristPlace>),
        (status = 404, description = "Tourist place not found")
    ),
    tag = "Catalog"
)]
pub async fn get_tourist_place(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<TouristPlace>>> {
    let resp = catalog_service::get_tourist_place(&state, id).await?;
    Ok(Json(resp))
}
