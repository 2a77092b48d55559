use std::collections::HashMap;

use chrono::Utc;
use sea_orm::sea_query::Expr;
use sea_orm::sea_query::extension::postgres::PgExpr;
use sea_orm::ActiveValue::NotSet;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, ConnectionTrait, EntityTrait, FromQueryResult,
    PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, Set,
};
use uuid::Uuid;

use crate::{
    audit,
    dto::products::{
        CategoryList, CategoryRequest, CreateProductRequest, ProductList, UpdateProductRequest,
    },
    entity::{
        categories::{ActiveModel as CategoryActive, Column as CategoryCol, Entity as Categories, Model as CategoryModel},
        cities::Entity as Cities,
        products::{ActiveModel, Column, Entity as Products, Model as ProductModel},
        reviews::{Column as ReviewCol, Entity as Reviews},
        users::{Column as UserCol, Entity as Users},
    },
    error::{AppError, AppResult},
    middleware::auth::AuthUser,
    models::{Category, MAX_PRICE, Product, discount_percentage, effective_price},
    policy::{ensure_business_owner, ensure_owner},
    response::{ApiResponse, Meta},
    routes::params::{Pagination, ProductQuery, ProductSortBy, SortOrder},
    slug::{slugify, unique_slug},
    state::AppState,
};

pub async fn list_products(
    state: &AppState,
    query: ProductQuery,
) -> AppResult<ApiResponse<ProductList>> {
    let mut condition = Condition::all();

    if let Some(search) = query.q.as_ref().map(|s| s.trim()).filter(|s| !s.is_empty()) {
        let pattern = format!("%{search}%");
        condition = condition.add(
            Condition::any()
                .add(Expr::col(Column::Name).ilike(pattern.clone()))
                .add(Expr::col(Column::Description).ilike(pattern)),
        );
    }
    if let Some(category_id) = query.category_id {
        condition = condition.add(Column::CategoryId.eq(category_id));
    }
    if let Some(city_id) = query.city_id {
        condition = condition.add(Column::CityId.eq(city_id));
    }
    if let Some(is_available) = query.is_available {
        condition = condition.add(Column::IsAvailable.eq(is_available));
    }
    if let Some(min_price) = query.min_price {
        condition = condition.add(Column::Price.gte(min_price));
    }
    if let Some(max_price) = query.max_price {
        condition = condition.add(Column::Price.lte(max_price));
    }

    let sort_col = match query.sort_by.as_ref().unwrap_or(&ProductSortBy::CreatedAt) {
        ProductSortBy::CreatedAt => Column::CreatedAt,
        ProductSortBy::Price => Column::Price,
        ProductSortBy::Name => Column::Name,
    };
    let mut finder = Products::find().filter(condition);
    finder = match query.sort_order.as_ref().unwrap_or(&SortOrder::Desc) {
        SortOrder::Asc => finder.order_by_asc(sort_col),
        SortOrder::Desc => finder.order_by_desc(sort_col),
    };

    if query.all.unwrap_or(false) {
        let models = finder.all(&state.orm).await?;
        let total = models.len() as i64;
        let items = load_products(&state.orm, models).await?;
        return Ok(ApiResponse::success(
            "Products",
            ProductList { items },
            Some(Meta::new(1, total, total)),
        ));
    }

    let (page, limit, offset) = query.pagination().normalize();
    let total = finder.clone().count(&state.orm).await? as i64;
    let models = finder
        .limit(limit as u64)
        .offset(offset as u64)
        .all(&state.orm)
        .await?;
    let items = load_products(&state.orm, models).await?;

    Ok(ApiResponse::success(
        "Products",
        ProductList { items },
        Some(Meta::new(page, limit, total)),
    ))
}

pub async fn my_products(
    state: &AppState,
    user: &AuthUser,
    pagination: Pagination,
) -> AppResult<ApiResponse<ProductList>> {
    let (page, limit, offset) = pagination.normalize();
    let finder = Products::find()
        .filter(Column::OwnerId.eq(user.user_id))
        .order_by_desc(Column::CreatedAt);

    let total = finder.clone().count(&state.orm).await? as i64;
    let models = finder
        .limit(limit as u64)
        .offset(offset as u64)
        .all(&state.orm)
        .await?;
    let items = load_products(&state.orm, models).await?;

    Ok(ApiResponse::success(
        "My products",
        ProductList { items },
        Some(Meta::new(page, limit, total)),
    ))
}

pub async fn get_product(state: &AppState, id: Uuid) -> AppResult<ApiResponse<Product>> {
    let model = find_product(&state.orm, id).await?;
    let product = load_product(&state.orm, model).await?;
    Ok(ApiResponse::success("Product", product, None))
}

pub async fn create_product(
    state: &AppState,
    user: &AuthUser,
    payload: CreateProductRequest,
) -> AppResult<ApiResponse<Product>> {
    ensure_business_owner(user)?;

    let name = payload.name.trim().to_string();
    if name.is_empty() {
        return Err(AppError::Validation("name is required".into()));
    }
    let stock = payload.stock.unwrap_or(0);
    validate_pricing(payload.price, payload.discount_price, stock)?;
    ensure_references(&state.orm, payload.category_id, payload.city_id).await?;

    let slug = next_product_slug(&state.orm, user.user_id, &name).await?;
    let product = ActiveModel {
        id: Set(Uuid::new_v4()),
        owner_id: Set(user.user_id),
        category_id: Set(payload.category_id),
        city_id: Set(payload.city_id),
        name: Set(name),
        slug: Set(slug),
        description: Set(payload.description),
        price: Set(payload.price),
        discount_price: Set(payload.discount_price),
        stock: Set(stock),
        is_available: Set(payload.is_available.unwrap_or(true)),
        image: Set(payload.image),
        created_at: NotSet,
        updated_at: NotSet,
    }
    .insert(&state.orm)
    .await?;

    audit::record(
        &state.pool,
        user.user_id,
        "product_create",
        "products",
        serde_json::json!({ "product_id": product.id, "slug": product.slug }),
    )
    .await;

    let product = load_product(&state.orm, product).await?;
    Ok(ApiResponse::success("Product created", product, Some(Meta::empty())))
}

pub async fn update_product(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
    payload: UpdateProductRequest,
) -> AppResult<ApiResponse<Product>> {
    let existing = find_product(&state.orm, id).await?;
    ensure_owner(user, &existing)?;

    let price = payload.price.unwrap_or(existing.price);
    let discount_price = payload.discount_price.unwrap_or(existing.discount_price);
    let stock = payload.stock.unwrap_or(existing.stock);
    validate_pricing(price, discount_price, stock)?;
    ensure_references(&state.orm, payload.category_id, payload.city_id).await?;

    let mut active: ActiveModel = existing.into();
    if let Some(name) = payload.name.map(|n| n.trim().to_string()) {
        if name.is_empty() {
            return Err(AppError::Validation("name cannot be blank".into()));
        }
        active.name = Set(name);
    }
    if let Some(description) = payload.description {
        active.description = Set(Some(description));
    }
    if let Some(image) = payload.image {
        active.image = Set(Some(image));
    }
    if let Some(is_available) = payload.is_available {
        active.is_available = Set(is_available);
    }
    if payload.category_id.is_some() {
        active.category_id = Set(payload.category_id);
    }
    if payload.city_id.is_some() {
        active.city_id = Set(payload.city_id);
    }
    active.price = Set(price);
    active.discount_price = Set(discount_price);
    active.stock = Set(stock);
    active.updated_at = Set(Utc::now().into());

    let product = active.update(&state.orm).await?;

    audit::record(
        &state.pool,
        user.user_id,
        "product_update",
        "products",
        serde_json::json!({ "product_id": product.id }),
    )
    .await;

    let product = load_product(&state.orm, product).await?;
    Ok(ApiResponse::success("Updated", product, Some(Meta::empty())))
}

pub async fn delete_product(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
) -> AppResult<ApiResponse<serde_json::Value>> {
    let existing = find_product(&state.orm, id).await?;
    ensure_owner(user, &existing)?;

    Products::delete_by_id(id).exec(&state.orm).await?;

    audit::record(
        &state.pool,
        user.user_id,
        "product_delete",
        "products",
        serde_json::json!({ "product_id": id }),
    )
    .await;

    Ok(ApiResponse::success(
        "Deleted",
        serde_json::json!({}),
        Some(Meta::empty()),
    ))
}

pub async fn list_categories(state: &AppState) -> AppResult<ApiResponse<CategoryList>> {
    let items = Categories::find()
        .order_by_asc(CategoryCol::Name)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(category_from_entity)
        .collect();
    Ok(ApiResponse::success("Categories", CategoryList { items }, None))
}

pub async fn create_category(
    state: &AppState,
    user: &AuthUser,
    payload: CategoryRequest,
) -> AppResult<ApiResponse<Category>> {
    let (name, slug) = category_name_and_slug(&payload)?;
    ensure_category_free(state, &name, &slug, None).await?;

    let category = CategoryActive {
        id: Set(Uuid::new_v4()),
        name: Set(name),
        slug: Set(slug),
        created_at: NotSet,
    }
    .insert(&state.orm)
    .await?;

    audit::record(
        &state.pool,
        user.user_id,
        "category_create",
        "categories",
        serde_json::json!({ "category_id": category.id }),
    )
    .await;

    Ok(ApiResponse::success(
        "Category created",
        category_from_entity(category),
        None,
    ))
}

pub async fn update_category(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
    payload: CategoryRequest,
) -> AppResult<ApiResponse<Category>> {
    let existing = Categories::find_by_id(id)
        .one(&state.orm)
        .await?
        .ok_or_else(|| AppError::NotFound("Category not found".into()))?;
    let (name, slug) = category_name_and_slug(&payload)?;
    ensure_category_free(state, &name, &slug, Some(id)).await?;

    let mut active: CategoryActive = existing.into();
    active.name = Set(name);
    active.slug = Set(slug);
    let category = active.update(&state.orm).await?;

    audit::record(
        &state.pool,
        user.user_id,
        "category_update",
        "categories",
        serde_json::json!({ "category_id": category.id }),
    )
    .await;

    Ok(ApiResponse::success(
        "Category updated",
        category_from_entity(category),
        None,
    ))
}

pub async fn delete_category(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
) -> AppResult<ApiResponse<serde_json::Value>> {
    let result = Categories::delete_by_id(id).exec(&state.orm).await?;
    if result.rows_affected == 0 {
        return Err(AppError::NotFound("Category not found".into()));
    }

    audit::record(
        &state.pool,
        user.user_id,
        "category_delete",
        "categories",
        serde_json::json!({ "category_id": id }),
    )
    .await;

    Ok(ApiResponse::success(
        "Deleted",
        serde_json::json!({}),
        Some(Meta::empty()),
    ))
}

fn category_name_and_slug(payload: &CategoryRequest) -> AppResult<(String, String)> {
    let name = payload.name.trim().to_string();
    let slug = slugify(&name);
    if slug.is_empty() {
        return Err(AppError::Validation("category name is required".into()));
    }
    Ok((name, slug))
}

async fn ensure_category_free(
    state: &AppState,
    name: &str,
    slug: &str,
    except: Option<Uuid>,
) -> AppResult<()> {
    let mut finder = Categories::find().filter(
        Condition::any()
            .add(CategoryCol::Name.eq(name))
            .add(CategoryCol::Slug.eq(slug)),
    );
    if let Some(id) = except {
        finder = finder.filter(CategoryCol::Id.ne(id));
    }
    if finder.one(&state.orm).await?.is_some() {
        return Err(AppError::Conflict(format!("Category '{name}' already exists")));
    }
    Ok(())
}

fn validate_pricing(price: i64, discount_price: Option<i64>, stock: i32) -> AppResult<()> {
    if price < 0 {
        return Err(AppError::Validation("price cannot be negative".into()));
    }
    if price > MAX_PRICE {
        return Err(AppError::Validation(format!("price cannot exceed {MAX_PRICE}")));
    }
    if let Some(discount) = discount_price {
        if discount < 0 || discount > price {
            return Err(AppError::Validation(
                "discount_price must be between 0 and price".into(),
            ));
        }
    }
    if stock < 0 {
        return Err(AppError::Validation("stock cannot be negative".into()));
    }
    Ok(())
}

async fn ensure_references<C: ConnectionTrait>(
    db: &C,
    category_id: Option<Uuid>,
    city_id: Option<Uuid>,
) -> AppResult<()> {
    if let Some(id) = category_id {
        if Categories::find_by_id(id).one(db).await?.is_none() {
            return Err(AppError::Validation(format!("category {id} does not exist")));
        }
    }
    if let Some(id) = city_id {
        if Cities::find_by_id(id).one(db).await?.is_none() {
            return Err(AppError::Validation(format!("city {id} does not exist")));
        }
    }
    Ok(())
}

/// Slug for `name` that is free among `owner`'s products.
async fn next_product_slug<C: ConnectionTrait>(db: &C, owner: Uuid, name: &str) -> AppResult<String> {
    let base = slugify(name);
    let taken: Vec<String> = Products::find()
        .select_only()
        .column(Column::Slug)
        .filter(Column::OwnerId.eq(owner))
        .filter(Column::Slug.starts_with(&base))
        .into_tuple()
        .all(db)
        .await?;
    Ok(unique_slug(&base, |candidate| {
        taken.iter().any(|slug| slug == candidate)
    }))
}

pub async fn find_product<C: ConnectionTrait>(db: &C, id: Uuid) -> AppResult<ProductModel> {
    Products::find_by_id(id)
        .one(db)
        .await?
        .ok_or_else(|| AppError::NotFound("Product not found".into()))
}

#[derive(Debug, FromQueryResult)]
struct ReviewCountRow {
    product_id: Uuid,
    count: i64,
}

pub async fn load_product<C: ConnectionTrait>(db: &C, model: ProductModel) -> AppResult<Product> {
    let mut products = load_products(db, vec![model]).await?;
    products
        .pop()
        .ok_or_else(|| AppError::Internal(anyhow::anyhow!("product vanished while loading")))
}

/// Attach owner names, categories and review counts in three batched queries.
pub async fn load_products<C: ConnectionTrait>(
    db: &C,
    models: Vec<ProductModel>,
) -> AppResult<Vec<Product>> {
    if models.is_empty() {
        return Ok(Vec::new());
    }

    let ids: Vec<Uuid> = models.iter().map(|p| p.id).collect();
    let owner_ids: Vec<Uuid> = models.iter().map(|p| p.owner_id).collect();
    let category_ids: Vec<Uuid> = models.iter().filter_map(|p| p.category_id).collect();

    let owners: HashMap<Uuid, String> = Users::find()
        .filter(UserCol::Id.is_in(owner_ids))
        .all(db)
        .await?
        .into_iter()
        .map(|u| (u.id, u.username))
        .collect();

    let mut categories: HashMap<Uuid, CategoryModel> = HashMap::new();
    if !category_ids.is_empty() {
        categories = Categories::find()
            .filter(CategoryCol::Id.is_in(category_ids))
            .all(db)
            .await?
            .into_iter()
            .map(|c| (c.id, c))
            .collect();
    }

    let counts: HashMap<Uuid, i64> = Reviews::find()
        .select_only()
        .column(ReviewCol::ProductId)
        .column_as(Expr::col(ReviewCol::Id).count(), "count")
        .filter(ReviewCol::ProductId.is_in(ids))
        .group_by(ReviewCol::ProductId)
        .into_model::<ReviewCountRow>()
        .all(db)
        .await?
        .into_iter()
        .map(|row| (row.product_id, row.count))
        .collect();

    Ok(models
        .into_iter()
        .map(|model| {
            let owner = owners.get(&model.owner_id).cloned();
            let category = model
                .category_id
                .and_then(|id| categories.get(&id).cloned())
                .map(category_from_entity);
            let reviews_count = counts.get(&model.id).copied().unwrap_or(0);
            product_from_entity(model, owner, category, reviews_count)
        })
        .collect())
}

pub fn product_from_entity(
    model: ProductModel,
    owner: Option<String>,
    category: Option<Category>,
    reviews_count: i64,
) -> Product {
    Product {
        id: model.id,
        owner_id: model.owner_id,
        owner,
        category,
        city_id: model.city_id,
        effective_price: effective_price(model.price, model.discount_price),
        discount_percentage: discount_percentage(model.price, model.discount_price),
        name: model.name,
        slug: model.slug,
        description: model.description,
        price: model.price,
        discount_price: model.discount_price,
        stock: model.stock,
        is_available: model.is_available,
        image: model.image,
        reviews_count,
        created_at: model.created_at.with_timezone(&Utc),
        updated_at: model.updated_at.with_timezone(&Utc),
    }
}

fn category_from_entity(model: CategoryModel) -> Category {
    Category {
        id: model.id,
        name: model.name,
        slug: model.slug,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pricing_rules() {
        assert!(validate_pricing(1000, Some(800), 5).is_ok());
        assert!(validate_pricing(1000, None, 0).is_ok());
        assert!(validate_pricing(1000, Some(1200), 5).is_err());
        assert!(validate_pricing(-1, None, 5).is_err());
        assert!(validate_pricing(MAX_PRICE, None, 5).is_ok());
        assert!(validate_pricing(i64::MAX / 2, None, 5).is_err());
        assert!(validate_pricing(1000, None, -2).is_err());
    }

    #[test]
    fn category_requires_sluggable_name() {
        let ok = CategoryRequest {
            name: " Dry Fruits ".into(),
        };
        assert_eq!(
            category_name_and_slug(&ok).unwrap(),
            ("Dry Fruits".to_string(), "dry-fruits".to_string())
        );
        let blank = CategoryRequest { name: "  !! ".into() };
        assert!(category_name_and_slug(&blank).is_err());
    }
}
