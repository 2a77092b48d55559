use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    routing::get,
};
use uuid::Uuid;

use crate::{
    dto::directory::{BusinessList, BusinessQuery, CreateBusinessRequest, UpdateBusinessRequest},
    error::AppResult,
    middleware::auth::AuthUser,
    models::Business,
    response::ApiResponse,
    routes::params::Pagination,
    services::directory_service,
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_businesses).post(create_business))
        .route("/mine", get(my_businesses))
        .route(
            "/{id}",
            get(get_business).put(update_business).delete(delete_business),
        )
}

#[utoipa::path(
    get,
    path = "/api/businesses",
    params(
        ("page" = Option<i64>, Query, description = "Page number, default 1"),
        ("per_page" = Option<i64>, Query, description = "Items per page, default 20"),
        ("q" = Option<String>, Query, description = "Search name and type"),
        ("city_id" = Option<Uuid>, Query, description = "Filter by city"),
        ("business_type" = Option<String>, Query, description = "restaurant, hotel, local_traditional or cafe"),
    ),
    responses(
        (status = 200, description = "Directory listings, newest first", body = ApiResponse<BusinessList>)
    ),
    tag = "Businesses"
)]
pub async fn list_businesses(
    State(state): State<AppState>,
    Query(query): Query<BusinessQuery>,
) -> AppResult<Json<ApiResponse<BusinessList>>> {
    let resp = directory_service::list_businesses(&state, query).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/api/businesses/mine",
    params(
        ("page" = Option<i64>, Query, description = "Page number, default 1"),
        ("per_page" = Option<i64>, Query, description = "Items per page, default 20"),
    ),
    responses(
        (status = 200, description = "Listings owned by the caller", body = ApiResponse<BusinessList>),
        (status = 401, description = "Unauthorized")
    ),
    security(("bearer_auth" = [])),
    tag = "Businesses"
)]
pub async fn my_businesses(
    State(state): State<AppState>,
    user: AuthUser,
    Query(pagination): Query<Pagination>,
) -> AppResult<Json<ApiResponse<BusinessList>>> {
    let resp = directory_service::my_businesses(&state, &user, pagination).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/api/businesses/{id}",
    params(("id" = Uuid, Path, description = "Business id")),
    responses(
        (status = 200, description = "Listing detail", body = ApiResponse<Business>),
        (status = 404, description = "Business not found")
    ),
    tag = "Businesses"
)]
pub async fn get_business(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<Business>>> {
    let resp = directory_service::get_business(&state, id).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/api/businesses",
    request_body = CreateBusinessRequest,
    responses(
        (status = 201, description = "Listing created", body = ApiResponse<Business>),
        (status = 400, description = "Missing name or unknown city"),
        (status = 403, description = "Only business owners can create listings")
    ),
    security(("bearer_auth" = [])),
    tag = "Businesses"
)]
pub async fn create_business(
    State(state): State<AppState>,
    user: AuthUser,
    Json(payload): Json<CreateBusinessRequest>,
) -> AppResult<(StatusCode, Json<ApiResponse<Business>>)> {
    let resp = directory_service::create_business(&state, &user, payload).await?;
    Ok((StatusCode::CREATED, Json(resp)))
}

#[utoipa::path(
    put,
    path = "/api/businesses/{id}",
    params(("id" = Uuid, Path, description = "Business id")),
    request_body = UpdateBusinessRequest,
    responses(
        (status = 200, description = "Listing updated", body = ApiResponse<Business>),
        (status = 403, description = "Not the owner"),
        (status = 404, description = "Business not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Businesses"
)]
pub async fn update_business(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateBusinessRequest>,
) -> AppResult<Json<ApiResponse<Business>>> {
    let resp = directory_service::update_business(&state, &user, id, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    delete,
    path = "/api/businesses/{id}",
    params(("id" = Uuid, Path, description = "Business id")),
    responses(
        (status = 200, description = "Listing deleted"),
        (status = 403, description = "Not the owner"),
        (status = 404, description = "Business not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Businesses"
)]
pub async fn delete_business(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<serde_json::Value>>> {
    let resp = directory_service::delete_business(&state, &user, id).await?;
    Ok(Json(resp))
}
