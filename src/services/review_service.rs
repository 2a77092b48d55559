use chrono::Utc;
use sea_orm::ActiveValue::NotSet;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder,
    QuerySelect, Set, SqlErr,
};
use uuid::Uuid;

use crate::{
    audit,
    dto::reviews::{CreateReviewRequest, ReviewList},
    entity::{
        reviews::{ActiveModel as ReviewActive, Column as ReviewCol, Entity as Reviews, Model as ReviewModel},
        users::Entity as Users,
    },
    error::{AppError, AppResult},
    middleware::auth::AuthUser,
    models::Review,
    policy::ensure_owner,
    response::{ApiResponse, Meta},
    routes::params::Pagination,
    services::product_service::find_product,
    state::AppState,
};

const ALREADY_REVIEWED: &str = "You have already reviewed this product";

pub async fn list_reviews(
    state: &AppState,
    product_id: Uuid,
    pagination: Pagination,
) -> AppResult<ApiResponse<ReviewList>> {
    find_product(&state.orm, product_id).await?;

    let (page, limit, offset) = pagination.normalize();
    let finder = Reviews::find()
        .filter(ReviewCol::ProductId.eq(product_id))
        .order_by_desc(ReviewCol::CreatedAt);

    let total = finder.clone().count(&state.orm).await? as i64;
    let items = finder
        .limit(limit as u64)
        .offset(offset as u64)
        .find_also_related(Users)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(|(review, author)| review_from_entity(review, author.map(|u| u.username)))
        .collect();

    Ok(ApiResponse::success(
        "Reviews",
        ReviewList { items },
        Some(Meta::new(page, limit, total)),
    ))
}

pub async fn create_review(
    state: &AppState,
    user: &AuthUser,
    product_id: Uuid,
    payload: CreateReviewRequest,
) -> AppResult<ApiResponse<Review>> {
    let product = find_product(&state.orm, product_id).await?;
    validate_rating(payload.rating)?;

    let existing = Reviews::find()
        .filter(ReviewCol::ProductId.eq(product.id))
        .filter(ReviewCol::UserId.eq(user.user_id))
        .one(&state.orm)
        .await?;
    if existing.is_some() {
        return Err(AppError::Conflict(ALREADY_REVIEWED.into()));
    }

    let comment = payload
        .comment
        .map(|c| c.trim().to_string())
        .filter(|c| !c.is_empty());
    let inserted = ReviewActive {
        id: Set(Uuid::new_v4()),
        product_id: Set(product.id),
        user_id: Set(user.user_id),
        rating: Set(payload.rating),
        comment: Set(comment),
        created_at: NotSet,
    }
    .insert(&state.orm)
    .await;

    // A concurrent duplicate loses on the (product, user) unique key.
    let review = match inserted {
        Ok(review) => review,
        Err(err) if matches!(err.sql_err(), Some(SqlErr::UniqueConstraintViolation(_))) => {
            return Err(AppError::Conflict(ALREADY_REVIEWED.into()));
        }
        Err(err) => return Err(err.into()),
    };

    audit::record(
        &state.pool,
        user.user_id,
        "review_create",
        "reviews",
        serde_json::json!({ "review_id": review.id, "product_id": product.id, "rating": review.rating }),
    )
    .await;

    let author = Users::find_by_id(user.user_id)
        .one(&state.orm)
        .await?
        .map(|u| u.username);
    Ok(ApiResponse::success(
        "Review added",
        review_from_entity(review, author),
        None,
    ))
}

pub async fn delete_review(
    state: &AppState,
    user: &AuthUser,
    product_id: Uuid,
    id: Uuid,
) -> AppResult<ApiResponse<serde_json::Value>> {
    let review = Reviews::find_by_id(id)
        .filter(ReviewCol::ProductId.eq(product_id))
        .one(&state.orm)
        .await?
        .ok_or_else(|| AppError::NotFound("Review not found".into()))?;
    ensure_owner(user, &review)?;

    Reviews::delete_by_id(review.id).exec(&state.orm).await?;

    audit::record(
        &state.pool,
        user.user_id,
        "review_delete",
        "reviews",
        serde_json::json!({ "review_id": review.id, "product_id": product_id }),
    )
    .await;

    Ok(ApiResponse::success(
        "Review deleted",
        serde_json::json!({ "id": review.id }),
        Some(Meta::empty()),
    ))
}

fn validate_rating(rating: i16) -> AppResult<()> {
    if !(1..=5).contains(&rating) {
        return Err(AppError::Validation(
            "rating must be between 1 and 5".into(),
        ));
    }
    Ok(())
}

fn review_from_entity(model: ReviewModel, user: Option<String>) -> Review {
    Review {
        id: model.id,
        product_id: model.product_id,
        user,
        rating: model.rating,
        comment: model.comment,
        created_at: model.created_at.with_timezone(&Utc),
    }
}
