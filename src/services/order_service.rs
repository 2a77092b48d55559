use std::collections::HashMap;

use chrono::Utc;
use sea_orm::ActiveValue::NotSet;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, ConnectionTrait, EntityTrait, PaginatorTrait,
    QueryFilter, QueryOrder, QuerySelect, Select, Set, TransactionTrait,
};
use uuid::Uuid;

use crate::{
    audit,
    dto::orders::{
        CheckoutResponse, ConfirmOrderRequest, CreateOrderRequest, OrderList,
        OrderStatusResponse, PAYMENT_COD,
    },
    entity::{
        cart_items::{Column as CartItemCol, Entity as CartItems},
        carts::{Column as CartCol, Entity as Carts},
        order_items::{
            ActiveModel as OrderItemActive, Column as OrderItemCol, Entity as OrderItems,
            Model as OrderItemModel,
        },
        orders::{ActiveModel as OrderActive, Column as OrderCol, Entity as Orders, Model as OrderModel},
        products::{Entity as Products, Model as ProductModel},
        users::{Column as UserCol, Entity as Users, Model as UserModel},
    },
    error::{AppError, AppResult},
    middleware::auth::AuthUser,
    models::{Order, OrderItem, effective_price, line_total, shipping_address, sum_totals},
    notify::{MailLine, OrderMail, new_order_mail, notice_mail},
    order_status::{OrderEvent, OrderStatus, Transition, apply},
    policy::{OrderAction, authorize_order, order_party},
    response::{ApiResponse, Meta},
    routes::params::Pagination,
    services::cart_service::clear_items,
    state::AppState,
};

/// Turn the caller's cart into a single Pending order and notify the seller.
pub async fn checkout(
    state: &AppState,
    user: &AuthUser,
    payload: CreateOrderRequest,
) -> AppResult<CheckoutResponse> {
    let txn = state.orm.begin().await?;

    let cart = Carts::find()
        .filter(CartCol::UserId.eq(user.user_id))
        .lock_exclusive()
        .one(&txn)
        .await?
        .ok_or_else(|| AppError::Validation("Cart is empty".into()))?;

    let rows = CartItems::find()
        .filter(CartItemCol::CartId.eq(cart.id))
        .order_by_asc(CartItemCol::CreatedAt)
        .find_also_related(Products)
        .all(&txn)
        .await?;
    if rows.is_empty() {
        return Err(AppError::Validation("Cart is empty".into()));
    }

    // The seller is whoever owns the first line's product.
    let seller = match rows.first().and_then(|(_, product)| product.as_ref()) {
        Some(product) => Users::find_by_id(product.owner_id).one(&txn).await?,
        None => None,
    };
    let seller = seller.ok_or_else(|| AppError::Validation("Invalid cart items".into()))?;

    let shipping = payload.into_shipping()?;

    let lines: Vec<(i32, ProductModel)> = rows
        .into_iter()
        .filter_map(|(item, product)| product.map(|p| (item.quantity, p)))
        .collect();
    let subtotals = lines
        .iter()
        .map(|(quantity, product)| line_subtotal(product, *quantity))
        .collect::<AppResult<Vec<i64>>>()?;
    let total_price = sum_totals(subtotals.iter().copied()).ok_or_else(total_too_large)?;

    let now = Utc::now();
    let order = OrderActive {
        id: Set(Uuid::new_v4()),
        user_id: Set(user.user_id),
        owner_id: Set(seller.id),
        full_name: Set(shipping.full_name),
        email: Set(shipping.email),
        phone: Set(shipping.phone),
        address_line1: Set(shipping.address_line1),
        address_line2: Set(shipping.address_line2),
        city: Set(shipping.city),
        country: Set(shipping.country),
        payment_method: Set(PAYMENT_COD.to_string()),
        status: Set(OrderStatus::Pending.as_str().to_string()),
        total_price: Set(total_price),
        created_at: Set(now.into()),
        updated_at: Set(now.into()),
    }
    .insert(&txn)
    .await?;

    let mut mail_lines = Vec::with_capacity(lines.len());
    for ((quantity, product), subtotal) in lines.iter().zip(subtotals) {
        OrderItemActive {
            id: Set(Uuid::new_v4()),
            order_id: Set(order.id),
            product_id: Set(Some(product.id)),
            quantity: Set(*quantity),
            price: Set(effective_price(product.price, product.discount_price)),
            subtotal: Set(subtotal),
            created_at: NotSet,
        }
        .insert(&txn)
        .await?;
        mail_lines.push(MailLine {
            name: product.name.clone(),
            quantity: *quantity,
            subtotal,
        });
    }

    clear_items(&txn, cart.id).await?;
    txn.commit().await?;

    audit::record(
        &state.pool,
        user.user_id,
        "checkout",
        "orders",
        serde_json::json!({ "order_id": order.id, "total_price": order.total_price }),
    )
    .await;

    let buyer = Users::find_by_id(user.user_id).one(&state.orm).await?;
    let mail = buyer.as_ref().and_then(|buyer| {
        new_order_mail(OrderMail {
            order: &order,
            lines: &mail_lines,
            buyer,
            seller: &seller,
        })
    });
    let email_sent = match mail {
        Some(mail) => state.notifier.deliver(mail).await,
        None => false,
    };

    let items_count = mail_lines.len();
    let data = load_order(&state.orm, order).await?;
    Ok(CheckoutResponse {
        error: false,
        message: "Order placed successfully".to_string(),
        data,
        email_sent,
        items_count,
    })
}

fn line_subtotal(product: &ProductModel, quantity: i32) -> AppResult<i64> {
    line_total(effective_price(product.price, product.discount_price), quantity)
        .ok_or_else(total_too_large)
}

fn total_too_large() -> AppError {
    AppError::Validation("Order total is too large".into())
}

/// Seller moves the order to `status` (default Confirmed).
pub async fn confirm_order(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
    payload: ConfirmOrderRequest,
) -> AppResult<OrderStatusResponse> {
    let event = requested_status(payload.status.as_deref()).map(OrderEvent::SetStatus);
    transition(state, user, id, OrderAction::Confirm, event).await
}

fn requested_status(raw: Option<&str>) -> AppResult<OrderStatus> {
    match raw.map(str::trim) {
        Some(raw) if !raw.is_empty() => raw.parse(),
        _ => Ok(OrderStatus::Confirmed),
    }
}

pub async fn cancel_order(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
) -> AppResult<OrderStatusResponse> {
    transition(state, user, id, OrderAction::Cancel, Ok(OrderEvent::Cancel)).await
}

async fn transition(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
    action: OrderAction,
    event: AppResult<OrderEvent>,
) -> AppResult<OrderStatusResponse> {
    let txn = state.orm.begin().await?;

    let order = Orders::find_by_id(id)
        .lock_exclusive()
        .one(&txn)
        .await?
        .ok_or_else(|| AppError::NotFound("Order not found".into()))?;
    let actor = authorize_order(user, action, &order)?;
    // A malformed request only matters once the order exists and the caller may act on it.
    let event = event?;

    let current = order.status.parse::<OrderStatus>()?;
    let Transition { from, to, notices } = apply(current, event, actor)?;

    let order = if from != to {
        let mut active: OrderActive = order.into();
        active.status = Set(to.as_str().to_string());
        active.updated_at = Set(Utc::now().into());
        active.update(&txn).await?
    } else {
        order
    };
    txn.commit().await?;

    if from == to {
        let data = load_order(&state.orm, order).await?;
        return Ok(OrderStatusResponse {
            error: false,
            message: format!("Order status is already {to}"),
            data,
            notifications: 0,
        });
    }

    let audit_action = match event {
        OrderEvent::Cancel => "order_cancel",
        OrderEvent::SetStatus(_) => "order_status",
    };
    audit::record(
        &state.pool,
        user.user_id,
        audit_action,
        "orders",
        serde_json::json!({ "order_id": order.id, "from": from.as_str(), "to": to.as_str() }),
    )
    .await;

    let mut mails = Vec::new();
    if !notices.is_empty() {
        if let Some((buyer, seller, lines)) = mail_context(&state.orm, &order).await? {
            let ctx = OrderMail {
                order: &order,
                lines: &lines,
                buyer: &buyer,
                seller: &seller,
            };
            mails = notices
                .into_iter()
                .filter_map(|notice| notice_mail(notice, from.as_str(), ctx))
                .collect();
        } else {
            tracing::warn!(order_id = %order.id, "order party missing, skipping notifications");
        }
    }
    let notifications = state.notifier.dispatch(mails);

    let message = match event {
        OrderEvent::Cancel => "Order cancelled successfully".to_string(),
        OrderEvent::SetStatus(_) => format!("Order status updated from {from} to {to}"),
    };
    let data = load_order(&state.orm, order).await?;
    Ok(OrderStatusResponse {
        error: false,
        message,
        data,
        notifications,
    })
}

async fn mail_context<C: ConnectionTrait>(
    db: &C,
    order: &OrderModel,
) -> AppResult<Option<(UserModel, UserModel, Vec<MailLine>)>> {
    let Some(buyer) = Users::find_by_id(order.user_id).one(db).await? else {
        return Ok(None);
    };
    let Some(seller) = Users::find_by_id(order.owner_id).one(db).await? else {
        return Ok(None);
    };

    let lines = OrderItems::find()
        .filter(OrderItemCol::OrderId.eq(order.id))
        .order_by_asc(OrderItemCol::CreatedAt)
        .find_also_related(Products)
        .all(db)
        .await?
        .into_iter()
        .map(|(item, product)| MailLine {
            name: product.map_or_else(|| "Deleted product".to_string(), |p| p.name),
            quantity: item.quantity,
            subtotal: item.subtotal,
        })
        .collect();

    Ok(Some((buyer, seller, lines)))
}

/// Either party may delete an order in any status; items cascade.
pub async fn delete_order(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
) -> AppResult<ApiResponse<serde_json::Value>> {
    let order = find_order(&state.orm, id).await?;
    authorize_order(user, OrderAction::Delete, &order)?;

    Orders::delete_by_id(order.id).exec(&state.orm).await?;

    audit::record(
        &state.pool,
        user.user_id,
        "order_delete",
        "orders",
        serde_json::json!({ "order_id": order.id, "status": order.status }),
    )
    .await;

    Ok(ApiResponse::success(
        "Order deleted successfully",
        serde_json::json!({ "id": order.id }),
        Some(Meta::empty()),
    ))
}

/// Orders where the caller is the buyer or the seller.
pub async fn list_orders(
    state: &AppState,
    user: &AuthUser,
    pagination: Pagination,
) -> AppResult<ApiResponse<OrderList>> {
    let finder = Orders::find().filter(
        Condition::any()
            .add(OrderCol::UserId.eq(user.user_id))
            .add(OrderCol::OwnerId.eq(user.user_id)),
    );
    paged_orders(state, finder, pagination, "Orders").await
}

pub async fn my_orders(
    state: &AppState,
    user: &AuthUser,
    pagination: Pagination,
) -> AppResult<ApiResponse<OrderList>> {
    let finder = Orders::find().filter(OrderCol::UserId.eq(user.user_id));
    paged_orders(state, finder, pagination, "My orders").await
}

/// Incoming orders for the caller's products. Cancelled orders are hidden.
pub async fn seller_orders(
    state: &AppState,
    user: &AuthUser,
    pagination: Pagination,
) -> AppResult<ApiResponse<OrderList>> {
    let finder = Orders::find()
        .filter(OrderCol::OwnerId.eq(user.user_id))
        .filter(OrderCol::Status.ne(OrderStatus::Cancelled.as_str()));
    paged_orders(state, finder, pagination, "Seller orders").await
}

async fn paged_orders(
    state: &AppState,
    finder: Select<Orders>,
    pagination: Pagination,
    message: &str,
) -> AppResult<ApiResponse<OrderList>> {
    let (page, limit, offset) = pagination.normalize();
    let finder = finder.order_by_desc(OrderCol::CreatedAt);

    let total = finder.clone().count(&state.orm).await? as i64;
    let models = finder
        .limit(limit as u64)
        .offset(offset as u64)
        .all(&state.orm)
        .await?;
    let items = load_orders(&state.orm, models).await?;

    Ok(ApiResponse::success(
        message,
        OrderList { items },
        Some(Meta::new(page, limit, total)),
    ))
}

/// Visible to either party only; anyone else sees 404.
pub async fn get_order(state: &AppState, user: &AuthUser, id: Uuid) -> AppResult<ApiResponse<Order>> {
    let order = find_order(&state.orm, id).await?;
    if order_party(user, &order).is_none() {
        return Err(AppError::NotFound("Order not found".into()));
    }
    let order = load_order(&state.orm, order).await?;
    Ok(ApiResponse::success("Order", order, Some(Meta::empty())))
}

async fn find_order<C: ConnectionTrait>(db: &C, id: Uuid) -> AppResult<OrderModel> {
    Orders::find_by_id(id)
        .one(db)
        .await?
        .ok_or_else(|| AppError::NotFound("Order not found".into()))
}

async fn load_order<C: ConnectionTrait>(db: &C, model: OrderModel) -> AppResult<Order> {
    let mut orders = load_orders(db, vec![model]).await?;
    orders
        .pop()
        .ok_or_else(|| AppError::Internal(anyhow::anyhow!("order vanished while loading")))
}

/// Attach party names and item lines in two batched queries.
pub async fn load_orders<C: ConnectionTrait>(
    db: &C,
    models: Vec<OrderModel>,
) -> AppResult<Vec<Order>> {
    if models.is_empty() {
        return Ok(Vec::new());
    }

    let ids: Vec<Uuid> = models.iter().map(|o| o.id).collect();
    let user_ids: Vec<Uuid> = models
        .iter()
        .flat_map(|o| [o.user_id, o.owner_id])
        .collect();

    let names: HashMap<Uuid, String> = Users::find()
        .filter(UserCol::Id.is_in(user_ids))
        .all(db)
        .await?
        .into_iter()
        .map(|u| (u.id, u.username))
        .collect();

    let mut items: HashMap<Uuid, Vec<OrderItem>> = HashMap::new();
    let rows = OrderItems::find()
        .filter(OrderItemCol::OrderId.is_in(ids))
        .order_by_asc(OrderItemCol::CreatedAt)
        .find_also_related(Products)
        .all(db)
        .await?;
    for (item, product) in rows {
        items
            .entry(item.order_id)
            .or_default()
            .push(order_item_from_entity(item, product));
    }

    models
        .into_iter()
        .map(|model| {
            let buyer = names.get(&model.user_id).cloned();
            let seller = names.get(&model.owner_id).cloned();
            let lines = items.remove(&model.id).unwrap_or_default();
            order_from_entity(model, buyer, seller, lines)
        })
        .collect()
}

pub fn order_from_entity(
    model: OrderModel,
    buyer: Option<String>,
    seller: Option<String>,
    items: Vec<OrderItem>,
) -> AppResult<Order> {
    let status = model.status.parse::<OrderStatus>()?;
    let shipping_address = shipping_address([
        model.full_name.as_str(),
        model.address_line1.as_str(),
        model.address_line2.as_str(),
        model.city.as_str(),
        model.country.as_str(),
    ]);
    Ok(Order {
        id: model.id,
        buyer,
        seller,
        shipping_address,
        status,
        full_name: model.full_name,
        email: model.email,
        phone: model.phone,
        address_line1: model.address_line1,
        address_line2: model.address_line2,
        city: model.city,
        country: model.country,
        payment_method: model.payment_method,
        total_amount: model.total_price,
        created_at: model.created_at.with_timezone(&Utc),
        updated_at: model.updated_at.with_timezone(&Utc),
        items,
    })
}

fn order_item_from_entity(model: OrderItemModel, product: Option<ProductModel>) -> OrderItem {
    let (product_name, product_image) = match product {
        Some(p) => (Some(p.name), p.image),
        None => (None, None),
    };
    OrderItem {
        id: model.id,
        product_id: model.product_id,
        product_name,
        product_image,
        quantity: model.quantity,
        price: model.price,
        subtotal: model.subtotal,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn order(status: &str) -> OrderModel {
        let now = Utc::now().into();
        OrderModel {
            id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            owner_id: Uuid::new_v4(),
            full_name: "Ali Khan".into(),
            email: "ali@example.com".into(),
            phone: "03001234567".into(),
            address_line1: "Main Bazaar".into(),
            address_line2: String::new(),
            city: "Gilgit".into(),
            country: "Pakistan".into(),
            payment_method: PAYMENT_COD.into(),
            status: status.into(),
            total_price: 2400,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn representation_derives_shipping_address() {
        let order = order_from_entity(order("Shipped"), Some("ali".into()), None, Vec::new()).unwrap();
        assert_eq!(order.shipping_address, "Ali Khan, Main Bazaar, Gilgit, Pakistan");
        assert_eq!(order.status, OrderStatus::Shipped);
        assert_eq!(order.total_amount, 2400);
    }

    #[test]
    fn unknown_stored_status_is_rejected() {
        assert!(order_from_entity(order("paid"), None, None, Vec::new()).is_err());
    }

    #[test]
    fn deleted_product_leaves_snapshot() {
        let item = OrderItemModel {
            id: Uuid::new_v4(),
            order_id: Uuid::new_v4(),
            product_id: None,
            quantity: 3,
            price: 800,
            subtotal: 2400,
            created_at: Utc::now().into(),
        };
        let item = order_item_from_entity(item, None);
        assert_eq!(item.product_name, None);
        assert_eq!(item.subtotal, 2400);
    }
}
