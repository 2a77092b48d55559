use sea_orm::sea_query::Expr;
use sea_orm::ActiveValue::NotSet;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DbErr, EntityTrait, QueryFilter, QueryOrder,
    QuerySelect, Set, SqlErr, TransactionTrait,
};
use uuid::Uuid;

use crate::{
    audit,
    dto::cart::{AddToCartRequest, RemoveFromCartRequest},
    entity::{
        cart_items::{ActiveModel as CartItemActive, Column as CartItemCol, Entity as CartItems},
        carts::{ActiveModel as CartActive, Column as CartCol, Entity as Carts, Model as CartModel},
        products::Entity as Products,
    },
    error::{AppError, AppResult},
    middleware::auth::AuthUser,
    models::{Cart, CartItem, MAX_LINE_QUANTITY, line_total, sum_totals},
    response::{ApiResponse, Meta},
    services::product_service::{find_product, load_products},
    state::AppState,
};

pub async fn get_cart(state: &AppState, user: &AuthUser) -> AppResult<ApiResponse<Cart>> {
    let cart = load_cart(&state.orm, user.user_id).await?;
    Ok(ApiResponse::success("Cart", cart, Some(Meta::empty())))
}

pub async fn add_to_cart(
    state: &AppState,
    user: &AuthUser,
    payload: AddToCartRequest,
) -> AppResult<ApiResponse<Cart>> {
    let quantity = payload.quantity.unwrap_or(1);
    if quantity <= 0 {
        return Err(AppError::Validation(
            "quantity must be greater than 0".to_string(),
        ));
    }
    if quantity > MAX_LINE_QUANTITY {
        return Err(AppError::Validation(format!(
            "quantity cannot exceed {MAX_LINE_QUANTITY}"
        )));
    }

    let product = find_product(&state.orm, payload.product_id).await?;
    if !product.is_available {
        return Err(AppError::Validation(format!(
            "Product '{}' is not available",
            product.name
        )));
    }

    let cart = get_or_create_cart(&state.orm, user.user_id).await?;

    let txn = state.orm.begin().await?;
    // Serializes with checkout, which holds the same row lock.
    let cart = Carts::find_by_id(cart.id)
        .lock_exclusive()
        .one(&txn)
        .await?
        .ok_or_else(|| AppError::NotFound("Cart not found".into()))?;

    let existing = CartItems::find()
        .filter(CartItemCol::CartId.eq(cart.id))
        .filter(CartItemCol::ProductId.eq(product.id))
        .one(&txn)
        .await?;

    match existing {
        Some(item) => {
            let within_limit = item
                .quantity
                .checked_add(quantity)
                .is_some_and(|total| total <= MAX_LINE_QUANTITY);
            if !within_limit {
                return Err(AppError::Validation(format!(
                    "quantity cannot exceed {MAX_LINE_QUANTITY}"
                )));
            }
            CartItems::update_many()
                .col_expr(
                    CartItemCol::Quantity,
                    Expr::col(CartItemCol::Quantity).add(quantity),
                )
                .filter(CartItemCol::Id.eq(item.id))
                .exec(&txn)
                .await?;
        }
        None => {
            CartItemActive {
                id: Set(Uuid::new_v4()),
                cart_id: Set(cart.id),
                product_id: Set(product.id),
                quantity: Set(quantity),
                created_at: NotSet,
            }
            .insert(&txn)
            .await?;
        }
    }
    touch_cart(&txn, cart).await?;
    txn.commit().await?;

    audit::record(
        &state.pool,
        user.user_id,
        "cart_add",
        "cart_items",
        serde_json::json!({ "product_id": product.id, "quantity": quantity }),
    )
    .await;

    let cart = load_cart(&state.orm, user.user_id).await?;
    Ok(ApiResponse::success("Added to cart", cart, None))
}

/// Removing a product that is not in the cart is not an error.
pub async fn remove_from_cart(
    state: &AppState,
    user: &AuthUser,
    payload: RemoveFromCartRequest,
) -> AppResult<ApiResponse<Cart>> {
    if let Some(cart) = find_cart(&state.orm, user.user_id).await? {
        let result = CartItems::delete_many()
            .filter(CartItemCol::CartId.eq(cart.id))
            .filter(CartItemCol::ProductId.eq(payload.product_id))
            .exec(&state.orm)
            .await?;

        if result.rows_affected > 0 {
            audit::record(
                &state.pool,
                user.user_id,
                "cart_remove",
                "cart_items",
                serde_json::json!({ "product_id": payload.product_id }),
            )
            .await;
        }
    }

    let cart = load_cart(&state.orm, user.user_id).await?;
    Ok(ApiResponse::success("Removed from cart", cart, None))
}

pub async fn clear_cart(state: &AppState, user: &AuthUser) -> AppResult<ApiResponse<Cart>> {
    if let Some(cart) = find_cart(&state.orm, user.user_id).await? {
        clear_items(&state.orm, cart.id).await?;
        audit::record(
            &state.pool,
            user.user_id,
            "cart_clear",
            "carts",
            serde_json::json!({ "cart_id": cart.id }),
        )
        .await;
    }

    let cart = load_cart(&state.orm, user.user_id).await?;
    Ok(ApiResponse::success("Cart cleared", cart, None))
}

pub async fn find_cart<C: ConnectionTrait>(db: &C, user_id: Uuid) -> Result<Option<CartModel>, DbErr> {
    Carts::find().filter(CartCol::UserId.eq(user_id)).one(db).await
}

pub async fn clear_items<C: ConnectionTrait>(db: &C, cart_id: Uuid) -> Result<u64, DbErr> {
    let result = CartItems::delete_many()
        .filter(CartItemCol::CartId.eq(cart_id))
        .exec(db)
        .await?;
    Ok(result.rows_affected)
}

/// Carts are created on first mutation. A concurrent creator may win the
/// unique `user_id` race, in which case its row is returned.
async fn get_or_create_cart<C: ConnectionTrait>(db: &C, user_id: Uuid) -> Result<CartModel, DbErr> {
    if let Some(cart) = find_cart(db, user_id).await? {
        return Ok(cart);
    }

    let inserted = CartActive {
        id: Set(Uuid::new_v4()),
        user_id: Set(user_id),
        created_at: NotSet,
        updated_at: NotSet,
    }
    .insert(db)
    .await;

    match inserted {
        Ok(cart) => Ok(cart),
        Err(err) if matches!(err.sql_err(), Some(SqlErr::UniqueConstraintViolation(_))) => {
            find_cart(db, user_id)
                .await?
                .ok_or_else(|| DbErr::RecordNotFound("cart".into()))
        }
        Err(err) => Err(err),
    }
}

async fn touch_cart<C: ConnectionTrait>(db: &C, cart: CartModel) -> Result<(), DbErr> {
    let mut active: CartActive = cart.into();
    active.updated_at = Set(chrono::Utc::now().into());
    active.update(db).await?;
    Ok(())
}

/// The caller's cart with priced lines. A user without a cart row reads as empty.
pub async fn load_cart<C: ConnectionTrait>(db: &C, user_id: Uuid) -> AppResult<Cart> {
    let Some(cart) = find_cart(db, user_id).await? else {
        return Ok(Cart {
            id: None,
            user_id,
            items: Vec::new(),
            subtotal: 0,
            grand_total: 0,
        });
    };

    let rows = CartItems::find()
        .filter(CartItemCol::CartId.eq(cart.id))
        .order_by_asc(CartItemCol::CreatedAt)
        .find_also_related(Products)
        .all(db)
        .await?;

    let (lines, models): (Vec<_>, Vec<_>) = rows
        .into_iter()
        .filter_map(|(item, product)| product.map(|p| (item, p)))
        .unzip();
    let products = load_products(db, models).await?;

    let items = lines
        .into_iter()
        .zip(products)
        .map(|(line, product)| {
            let total_price = line_total(product.effective_price, line.quantity)
                .ok_or_else(too_large)?;
            Ok(CartItem {
                id: line.id,
                total_price,
                quantity: line.quantity,
                product,
            })
        })
        .collect::<AppResult<Vec<CartItem>>>()?;
    let subtotal =
        sum_totals(items.iter().map(|item| item.total_price)).ok_or_else(too_large)?;

    Ok(Cart {
        id: Some(cart.id),
        user_id,
        items,
        subtotal,
        grand_total: subtotal,
    })
}

fn too_large() -> AppError {
    AppError::Validation("Cart total is too large".into())
}
