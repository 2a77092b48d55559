//! Business directory: restaurants, hotels, guest houses and cafes.

use chrono::Utc;
use sea_orm::sea_query::Expr;
use sea_orm::sea_query::extension::postgres::PgExpr;
use sea_orm::ActiveValue::NotSet;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, ConnectionTrait, EntityTrait, PaginatorTrait,
    QueryFilter, QueryOrder, QuerySelect, Select, Set,
};
use uuid::Uuid;

use crate::{
    audit,
    dto::directory::{BusinessList, BusinessQuery, CreateBusinessRequest, UpdateBusinessRequest},
    entity::{
        businesses::{ActiveModel, Column, Entity as Businesses, Model as BusinessModel},
        cities::Entity as Cities,
    },
    error::{AppError, AppResult},
    middleware::auth::AuthUser,
    models::{Business, BusinessType, string_list, whatsapp_link},
    policy::{ensure_business_owner, ensure_owner},
    response::{ApiResponse, Meta},
    routes::params::Pagination,
    services::catalog_service::city_names,
    state::AppState,
};

pub async fn list_businesses(
    state: &AppState,
    query: BusinessQuery,
) -> AppResult<ApiResponse<BusinessList>> {
    let mut condition = Condition::all();
    if let Some(search) = query.q.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
        let pattern = format!("%{search}%");
        condition = condition.add(
            Condition::any()
                .add(Expr::col(Column::Name).ilike(pattern.clone()))
                .add(Expr::col(Column::BusinessType).ilike(pattern)),
        );
    }
    if let Some(city_id) = query.city_id {
        condition = condition.add(Column::CityId.eq(city_id));
    }
    if let Some(kind) = query.business_type {
        condition = condition.add(Column::BusinessType.eq(kind.as_str()));
    }

    let finder = Businesses::find()
        .filter(condition)
        .order_by_desc(Column::CreatedAt);
    paged(state, finder, query.pagination(), "Businesses").await
}

pub async fn my_businesses(
    state: &AppState,
    user: &AuthUser,
    pagination: Pagination,
) -> AppResult<ApiResponse<BusinessList>> {
    let finder = Businesses::find()
        .filter(Column::OwnerId.eq(user.user_id))
        .order_by_desc(Column::CreatedAt);
    paged(state, finder, pagination, "My businesses").await
}

async fn paged(
    state: &AppState,
    finder: Select<Businesses>,
    pagination: Pagination,
    message: &str,
) -> AppResult<ApiResponse<BusinessList>> {
    let (page, limit, offset) = pagination.normalize();
    let total = finder.clone().count(&state.orm).await? as i64;
    let models = finder
        .limit(limit as u64)
        .offset(offset as u64)
        .all(&state.orm)
        .await?;
    let items = load_businesses(&state.orm, models).await?;

    Ok(ApiResponse::success(
        message,
        BusinessList { items },
        Some(Meta::new(page, limit, total)),
    ))
}

pub async fn get_business(state: &AppState, id: Uuid) -> AppResult<ApiResponse<Business>> {
    let model = find_business(&state.orm, id).await?;
    let business = load_business(&state.orm, model).await?;
    Ok(ApiResponse::success("Business", business, None))
}

pub async fn create_business(
    state: &AppState,
    user: &AuthUser,
    payload: CreateBusinessRequest,
) -> AppResult<ApiResponse<Business>> {
    ensure_business_owner(user)?;

    let name = payload.name.trim().to_string();
    if name.is_empty() {
        return Err(AppError::Validation("name is required".into()));
    }
    ensure_city(&state.orm, payload.city_id).await?;

    let business = ActiveModel {
        id: Set(Uuid::new_v4()),
        owner_id: Set(user.user_id),
        city_id: Set(payload.city_id),
        name: Set(name),
        business_type: Set(payload.business_type.unwrap_or_default().as_str().to_string()),
        location_inside_city: Set(payload.location_inside_city),
        description: Set(payload.description),
        is_active: Set(payload.is_active.unwrap_or(true)),
        room_available: Set(payload.room_available.unwrap_or(false)),
        contacts_and_hours: Set(payload.contacts_and_hours.map(list_json)),
        amenities: Set(payload.amenities.map(list_json)),
        get_direction: Set(payload.get_direction),
        whatsapp_number: Set(payload.whatsapp_number),
        image: Set(payload.image),
        created_at: NotSet,
        updated_at: NotSet,
    }
    .insert(&state.orm)
    .await?;

    audit::record(
        &state.pool,
        user.user_id,
        "business_create",
        "businesses",
        serde_json::json!({ "business_id": business.id, "name": business.name }),
    )
    .await;

    let business = load_business(&state.orm, business).await?;
    Ok(ApiResponse::success("Business created", business, Some(Meta::empty())))
}

pub async fn update_business(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
    payload: UpdateBusinessRequest,
) -> AppResult<ApiResponse<Business>> {
    let existing = find_business(&state.orm, id).await?;
    ensure_owner(user, &existing)?;
    ensure_city(&state.orm, payload.city_id).await?;

    let mut active: ActiveModel = existing.into();
    if let Some(name) = payload.name.map(|n| n.trim().to_string()) {
        if name.is_empty() {
            return Err(AppError::Validation("name cannot be blank".into()));
        }
        active.name = Set(name);
    }
    if let Some(kind) = payload.business_type {
        active.business_type = Set(kind.as_str().to_string());
    }
    if payload.city_id.is_some() {
        active.city_id = Set(payload.city_id);
    }
    if let Some(location) = payload.location_inside_city {
        active.location_inside_city = Set(Some(location));
    }
    if let Some(description) = payload.description {
        active.description = Set(Some(description));
    }
    if let Some(is_active) = payload.is_active {
        active.is_active = Set(is_active);
    }
    if let Some(room_available) = payload.room_available {
        active.room_available = Set(room_available);
    }
    if let Some(contacts) = payload.contacts_and_hours {
        active.contacts_and_hours = Set(Some(list_json(contacts)));
    }
    if let Some(amenities) = payload.amenities {
        active.amenities = Set(Some(list_json(amenities)));
    }
    if let Some(direction) = payload.get_direction {
        active.get_direction = Set(Some(direction));
    }
    if let Some(number) = payload.whatsapp_number {
        active.whatsapp_number = Set(Some(number));
    }
    if let Some(image) = payload.image {
        active.image = Set(Some(image));
    }
    active.updated_at = Set(Utc::now().into());

    let business = active.update(&state.orm).await?;

    audit::record(
        &state.pool,
        user.user_id,
        "business_update",
        "businesses",
        serde_json::json!({ "business_id": business.id }),
    )
    .await;

    let business = load_business(&state.orm, business).await?;
    Ok(ApiResponse::success("Updated", business, Some(Meta::empty())))
}

pub async fn delete_business(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
) -> AppResult<ApiResponse<serde_json::Value>> {
    let existing = find_business(&state.orm, id).await?;
    ensure_owner(user, &existing)?;

    Businesses::delete_by_id(id).exec(&state.orm).await?;

    audit::record(
        &state.pool,
        user.user_id,
        "business_delete",
        "businesses",
        serde_json::json!({ "business_id": id }),
    )
    .await;

    Ok(ApiResponse::success(
        "Deleted",
        serde_json::json!({}),
        Some(Meta::empty()),
    ))
}

async fn find_business<C: ConnectionTrait>(db: &C, id: Uuid) -> AppResult<BusinessModel> {
    Businesses::find_by_id(id)
        .one(db)
        .await?
        .ok_or_else(|| AppError::NotFound("Business not found".into()))
}

async fn ensure_city<C: ConnectionTrait>(db: &C, city_id: Option<Uuid>) -> AppResult<()> {
    if let Some(id) = city_id {
        if Cities::find_by_id(id).one(db).await?.is_none() {
            return Err(AppError::Validation(format!("city {id} does not exist")));
        }
    }
    Ok(())
}

fn list_json(entries: Vec<String>) -> serde_json::Value {
    let entries: Vec<String> = entries
        .into_iter()
        .map(|entry| entry.trim().to_string())
        .filter(|entry| !entry.is_empty())
        .collect();
    serde_json::json!(entries)
}

async fn load_business<C: ConnectionTrait>(db: &C, model: BusinessModel) -> AppResult<Business> {
    load_businesses(db, vec![model])
        .await?
        .pop()
        .ok_or_else(|| AppError::Internal(anyhow::anyhow!("business vanished while loading")))
}

async fn load_businesses<C: ConnectionTrait>(
    db: &C,
    models: Vec<BusinessModel>,
) -> AppResult<Vec<Business>> {
    let names = city_names(db, models.iter().filter_map(|b| b.city_id)).await?;
    models
        .into_iter()
        .map(|model| {
            let city = model.city_id.and_then(|id| names.get(&id).cloned());
            business_from_entity(model, city)
        })
        .collect()
}

fn business_from_entity(model: BusinessModel, city: Option<String>) -> AppResult<Business> {
    let business_type = model
        .business_type
        .parse::<BusinessType>()
        .map_err(|e| AppError::Internal(anyhow::anyhow!(e)))?;

    Ok(Business {
        id: model.id,
        owner_id: model.owner_id,
        city_id: model.city_id,
        city,
        business_type,
        contacts_and_hours: string_list(model.contacts_and_hours.as_ref()),
        amenities: string_list(model.amenities.as_ref()),
        whatsapp_link: whatsapp_link(model.whatsapp_number.as_deref()),
        name: model.name,
        location_inside_city: model.location_inside_city,
        description: model.description,
        is_active: model.is_active,
        room_available: model.room_available,
        get_direction: model.get_direction,
        whatsapp_number: model.whatsapp_number,
        image: model.image,
        created_at: model.created_at.with_timezone(&Utc),
        updated_at: model.updated_at.with_timezone(&Utc),
    })
}
