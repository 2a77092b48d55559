mod common;

use std::sync::Arc;

use marketplace_api::{
    dto::{cart::RemoveFromCartRequest, orders::ConfirmOrderRequest},
    error::AppError,
    mailer::Mailer,
    models::{MAX_LINE_QUANTITY, Role},
    order_status::OrderStatus,
    routes::params::Pagination,
    services::{cart_service, order_service},
};
use uuid::Uuid;

use common::{
    FailingMailer, StalledMailer, add, create_product, create_user, setup, setup_with, shipping,
};

fn status(value: &str) -> ConfirmOrderRequest {
    ConfirmOrderRequest {
        status: Some(value.into()),
    }
}

// Buyer adds a discounted product three times over, checks out, and the
// seller is mailed while the cart empties.
#[tokio::test]
async fn checkout_snapshots_prices_and_empties_cart() -> anyhow::Result<()> {
    let Some(app) = setup().await? else {
        return Ok(());
    };
    let state = &app.state;

    let (seller, _) = create_user(state, Role::BusinessOwner).await?;
    let (_, buyer) = create_user(state, Role::Tourist).await?;
    let product = create_product(state, &seller, "Dried Apricots", 1000, Some(800)).await?;

    add(state, &buyer, product.id, 3).await?;
    let resp = order_service::checkout(state, &buyer, shipping("Ali Khan")).await?;

    assert!(!resp.error);
    assert!(resp.email_sent);
    assert_eq!(resp.items_count, 1);

    let order = resp.data;
    assert_eq!(order.total_amount, 2400);
    assert_eq!(order.status, OrderStatus::Pending);
    assert_eq!(order.payment_method, "COD");
    assert_eq!(order.email, "buyer@example.com");
    assert_eq!(order.country, "Pakistan");
    assert_eq!(order.shipping_address, "Ali Khan, Main Bazaar, Gilgit, Pakistan");
    assert_eq!(order.seller.as_deref(), Some(seller.username.as_str()));
    assert_eq!(order.items.len(), 1);
    assert_eq!(order.items[0].price, 800);
    assert_eq!(order.items[0].quantity, 3);
    assert_eq!(order.items[0].subtotal, 2400);
    assert_eq!(order.items[0].product_name.as_deref(), Some("Dried Apricots"));

    let cart = cart_service::load_cart(&state.orm, buyer.user_id).await?;
    assert!(cart.items.is_empty());
    assert_eq!(cart.grand_total, 0);

    let mails = app.mailer.sent_to(&seller.email);
    assert_eq!(mails.len(), 1);
    assert!(mails[0].body.contains("Dried Apricots x 3 = Rs. 2400"));

    Ok(())
}

#[tokio::test]
async fn empty_cart_cannot_be_checked_out() -> anyhow::Result<()> {
    let Some(app) = setup().await? else {
        return Ok(());
    };
    let state = &app.state;

    let (seller, _) = create_user(state, Role::BusinessOwner).await?;
    let (_, buyer) = create_user(state, Role::Tourist).await?;

    // No cart row at all.
    let err = order_service::checkout(state, &buyer, shipping("Ali Khan"))
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Validation(ref m) if m == "Cart is empty"));

    // A cart that was filled and then cleared.
    let product = create_product(state, &seller, "Mulberry Mix", 650, None).await?;
    add(state, &buyer, product.id, 1).await?;
    cart_service::clear_cart(state, &buyer).await?;
    let err = order_service::checkout(state, &buyer, shipping("Ali Khan"))
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Validation(ref m) if m == "Cart is empty"));

    let orders = order_service::my_orders(state, &buyer, Pagination::default()).await?;
    assert_eq!(orders.meta.and_then(|m| m.total), Some(0));
    assert!(app.mailer.sent().is_empty());

    Ok(())
}

#[tokio::test]
async fn missing_shipping_fields_leave_cart_intact() -> anyhow::Result<()> {
    let Some(app) = setup().await? else {
        return Ok(());
    };
    let state = &app.state;

    let (seller, _) = create_user(state, Role::BusinessOwner).await?;
    let (_, buyer) = create_user(state, Role::Tourist).await?;
    let product = create_product(state, &seller, "Hand-woven Shawl", 4500, Some(3900)).await?;
    add(state, &buyer, product.id, 1).await?;

    let mut request = shipping("Ali Khan");
    request.phone = Some("   ".into());
    request.city = None;
    let err = order_service::checkout(state, &buyer, request).await.unwrap_err();
    match err {
        AppError::Validation(msg) => {
            assert!(msg.starts_with("Missing required fields"));
            assert!(msg.contains("phone"));
            assert!(msg.contains("city"));
        }
        other => panic!("unexpected error {other:?}"),
    }

    let cart = cart_service::load_cart(&state.orm, buyer.user_id).await?;
    assert_eq!(cart.items.len(), 1);
    assert_eq!(cart.grand_total, 3900);

    Ok(())
}

#[tokio::test]
async fn only_the_seller_moves_an_order_forward() -> anyhow::Result<()> {
    let Some(app) = setup().await? else {
        return Ok(());
    };
    let state = &app.state;

    let (seller_model, seller) = create_user(state, Role::BusinessOwner).await?;
    let (_, buyer) = create_user(state, Role::Tourist).await?;
    let product = create_product(state, &seller_model, "Topaz Pendant", 12000, None).await?;
    add(state, &buyer, product.id, 1).await?;
    let order = order_service::checkout(state, &buyer, shipping("Ali Khan")).await?.data;

    // The buyer is a party but not the seller.
    let err = order_service::confirm_order(state, &buyer, order.id, ConfirmOrderRequest::default())
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Forbidden(_)));
    let current = order_service::get_order(state, &seller, order.id).await?;
    assert_eq!(current.data.map(|o| o.status), Some(OrderStatus::Pending));

    let err = order_service::confirm_order(state, &seller, order.id, status("Refunded"))
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Validation(_)));

    let confirmed =
        order_service::confirm_order(state, &seller, order.id, ConfirmOrderRequest::default()).await?;
    assert_eq!(confirmed.data.status, OrderStatus::Confirmed);
    assert_eq!(confirmed.notifications, 1);
    assert_eq!(confirmed.message, "Order status updated from Pending to Confirmed");

    let again =
        order_service::confirm_order(state, &seller, order.id, ConfirmOrderRequest::default()).await?;
    assert_eq!(again.data.status, OrderStatus::Confirmed);
    assert_eq!(again.notifications, 0);

    let shipped = order_service::confirm_order(state, &seller, order.id, status("Shipped")).await?;
    assert_eq!(shipped.data.status, OrderStatus::Shipped);
    assert_eq!(shipped.notifications, 0);

    let err = order_service::confirm_order(state, &seller, order.id, status("Confirmed"))
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Conflict(_)));

    order_service::confirm_order(state, &seller, order.id, status("Delivered")).await?;
    let err = order_service::cancel_order(state, &buyer, order.id)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Conflict(_)));

    // Checkout mail to the seller plus the single confirmation to the buyer.
    let sent = app.mailer.wait_for(2).await;
    assert_eq!(
        sent.iter()
            .filter(|m| m.subject.starts_with("Order Confirmed"))
            .count(),
        1
    );

    Ok(())
}

#[tokio::test]
async fn buyer_cancellation_notifies_both_sides() -> anyhow::Result<()> {
    let Some(app) = setup().await? else {
        return Ok(());
    };
    let state = &app.state;

    let (seller_model, seller) = create_user(state, Role::BusinessOwner).await?;
    let (_, buyer) = create_user(state, Role::Tourist).await?;
    let (_, stranger) = create_user(state, Role::Tourist).await?;
    let product = create_product(state, &seller_model, "Dried Apricots", 1000, None).await?;
    add(state, &buyer, product.id, 2).await?;
    let order = order_service::checkout(state, &buyer, shipping("Ali Khan")).await?.data;

    let err = order_service::cancel_order(state, &stranger, order.id)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Forbidden(_)));

    let cancelled = order_service::cancel_order(state, &buyer, order.id).await?;
    assert_eq!(cancelled.data.status, OrderStatus::Cancelled);
    assert_eq!(cancelled.notifications, 2);

    let err = order_service::cancel_order(state, &seller, order.id)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Conflict(_)));

    let sent = app.mailer.wait_for(3).await;
    assert!(sent.iter().any(|m| m.to == "buyer@example.com"
        && m.body.contains("has been cancelled by you")));
    assert!(sent.iter().any(|m| m.to == seller_model.email
        && m.subject.starts_with("Order Cancelled by Customer")));

    // Hidden from the seller's incoming list, still in the buyer's history.
    let incoming = order_service::seller_orders(state, &seller, Pagination::default()).await?;
    let incoming = incoming.data.map(|l| l.items).unwrap_or_default();
    assert!(incoming.iter().all(|o| o.id != order.id));

    let history = order_service::my_orders(state, &buyer, Pagination::default()).await?;
    let history = history.data.map(|l| l.items).unwrap_or_default();
    assert!(history.iter().any(|o| o.id == order.id));

    Ok(())
}

#[tokio::test]
async fn seller_cancellation_mails_only_the_buyer() -> anyhow::Result<()> {
    let Some(app) = setup().await? else {
        return Ok(());
    };
    let state = &app.state;

    let (seller_model, seller) = create_user(state, Role::BusinessOwner).await?;
    let (_, buyer) = create_user(state, Role::Tourist).await?;
    let product = create_product(state, &seller_model, "Mulberry Mix", 650, None).await?;
    add(state, &buyer, product.id, 1).await?;
    let order = order_service::checkout(state, &buyer, shipping("Ali Khan")).await?.data;

    let cancelled = order_service::cancel_order(state, &seller, order.id).await?;
    assert_eq!(cancelled.notifications, 1);

    let sent = app.mailer.wait_for(2).await;
    assert!(sent.iter().any(|m| m.body.contains("has been cancelled by the seller")));

    Ok(())
}

#[tokio::test]
async fn parties_can_delete_but_strangers_cannot() -> anyhow::Result<()> {
    let Some(app) = setup().await? else {
        return Ok(());
    };
    let state = &app.state;

    let (seller_model, _) = create_user(state, Role::BusinessOwner).await?;
    let (_, buyer) = create_user(state, Role::Tourist).await?;
    let (_, stranger) = create_user(state, Role::Tourist).await?;
    let product = create_product(state, &seller_model, "Hand-woven Shawl", 4500, None).await?;
    add(state, &buyer, product.id, 1).await?;
    let order = order_service::checkout(state, &buyer, shipping("Ali Khan")).await?.data;

    let err = order_service::get_order(state, &stranger, order.id)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::NotFound(_)));

    let err = order_service::delete_order(state, &stranger, order.id)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Forbidden(_)));

    order_service::delete_order(state, &buyer, order.id).await?;
    let err = order_service::get_order(state, &buyer, order.id)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::NotFound(_)));

    let err = order_service::delete_order(state, &buyer, Uuid::new_v4())
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::NotFound(_)));

    Ok(())
}

#[tokio::test]
async fn cart_increments_and_tolerates_missing_items() -> anyhow::Result<()> {
    let Some(app) = setup().await? else {
        return Ok(());
    };
    let state = &app.state;

    let (seller, _) = create_user(state, Role::BusinessOwner).await?;
    let (_, buyer) = create_user(state, Role::Tourist).await?;
    let product = create_product(state, &seller, "Dried Apricots", 1000, Some(800)).await?;

    add(state, &buyer, product.id, 1).await?;
    add(state, &buyer, product.id, 2).await?;
    let cart = cart_service::load_cart(&state.orm, buyer.user_id).await?;
    assert_eq!(cart.items.len(), 1);
    assert_eq!(cart.items[0].quantity, 3);
    assert_eq!(cart.items[0].total_price, 2400);
    assert_eq!(cart.subtotal, 2400);

    let err = add(state, &buyer, product.id, 0).await.unwrap_err();
    assert!(matches!(
        err.downcast_ref::<AppError>(),
        Some(AppError::Validation(_))
    ));
    let err = add(state, &buyer, Uuid::new_v4(), 1).await.unwrap_err();
    assert!(matches!(
        err.downcast_ref::<AppError>(),
        Some(AppError::NotFound(_))
    ));

    // Removing something that is not in the cart is fine.
    cart_service::remove_from_cart(
        state,
        &buyer,
        RemoveFromCartRequest {
            product_id: Uuid::new_v4(),
        },
    )
    .await?;
    let resp = cart_service::remove_from_cart(
        state,
        &buyer,
        RemoveFromCartRequest {
            product_id: product.id,
        },
    )
    .await?;
    assert!(resp.data.map(|c| c.items.is_empty()).unwrap_or(false));

    Ok(())
}

async fn checkout_survives_mailer(mailer: Arc<dyn Mailer>) -> anyhow::Result<()> {
    let Some(state) = setup_with(mailer).await? else {
        return Ok(());
    };
    let state = &state;

    let (seller, _) = create_user(state, Role::BusinessOwner).await?;
    let (_, buyer) = create_user(state, Role::Tourist).await?;
    let product = create_product(state, &seller, "Dried Apricots", 1000, None).await?;
    add(state, &buyer, product.id, 2).await?;

    let resp = order_service::checkout(state, &buyer, shipping("Ali Khan")).await?;
    assert!(!resp.error);
    assert!(!resp.email_sent);
    assert_eq!(resp.data.total_amount, 2000);

    let stored = order_service::get_order(state, &buyer, resp.data.id).await?;
    assert_eq!(stored.data.map(|o| o.status), Some(OrderStatus::Pending));
    let cart = cart_service::load_cart(&state.orm, buyer.user_id).await?;
    assert!(cart.items.is_empty());

    Ok(())
}

#[tokio::test]
async fn rejected_mail_does_not_undo_checkout() -> anyhow::Result<()> {
    checkout_survives_mailer(Arc::new(FailingMailer)).await
}

#[tokio::test]
async fn stalled_mail_times_out_after_checkout() -> anyhow::Result<()> {
    checkout_survives_mailer(Arc::new(StalledMailer)).await
}

#[tokio::test]
async fn status_is_validated_after_access_checks() -> anyhow::Result<()> {
    let Some(app) = setup().await? else {
        return Ok(());
    };
    let state = &app.state;

    let (seller_model, seller) = create_user(state, Role::BusinessOwner).await?;
    let (_, buyer) = create_user(state, Role::Tourist).await?;
    let (_, stranger) = create_user(state, Role::BusinessOwner).await?;
    let product = create_product(state, &seller_model, "Mulberry Mix", 650, None).await?;
    add(state, &buyer, product.id, 1).await?;
    let order = order_service::checkout(state, &buyer, shipping("Ali Khan")).await?.data;

    let err = order_service::confirm_order(state, &stranger, order.id, status("Bogus"))
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Forbidden(_)));

    let err = order_service::confirm_order(state, &seller, Uuid::new_v4(), status("Bogus"))
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::NotFound(_)));

    let err = order_service::confirm_order(state, &seller, order.id, status("Bogus"))
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Validation(_)));

    Ok(())
}

#[tokio::test]
async fn oversized_totals_are_rejected_not_wrapped() -> anyhow::Result<()> {
    let Some(app) = setup().await? else {
        return Ok(());
    };
    let state = &app.state;

    let (seller, _) = create_user(state, Role::BusinessOwner).await?;
    let (_, buyer) = create_user(state, Role::Tourist).await?;
    // Stored directly, past the price cap the product endpoints enforce.
    let product = create_product(state, &seller, "Gold Nugget", i64::MAX / 2, None).await?;

    let err = add(state, &buyer, product.id, 3).await.unwrap_err();
    assert!(matches!(
        err.downcast_ref::<AppError>(),
        Some(AppError::Validation(_))
    ));
    let err = cart_service::get_cart(state, &buyer).await.unwrap_err();
    assert!(matches!(err, AppError::Validation(_)));

    let err = order_service::checkout(state, &buyer, shipping("Ali Khan"))
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Validation(ref m) if m == "Order total is too large"));
    let history = order_service::my_orders(state, &buyer, Pagination::default()).await?;
    assert_eq!(history.meta.and_then(|m| m.total), Some(0));

    Ok(())
}

#[tokio::test]
async fn line_quantity_is_capped() -> anyhow::Result<()> {
    let Some(app) = setup().await? else {
        return Ok(());
    };
    let state = &app.state;

    let (seller, _) = create_user(state, Role::BusinessOwner).await?;
    let (_, buyer) = create_user(state, Role::Tourist).await?;
    let product = create_product(state, &seller, "Dried Apricots", 1000, None).await?;

    let err = add(state, &buyer, product.id, MAX_LINE_QUANTITY + 1).await.unwrap_err();
    assert!(matches!(
        err.downcast_ref::<AppError>(),
        Some(AppError::Validation(_))
    ));

    add(state, &buyer, product.id, MAX_LINE_QUANTITY).await?;
    let err = add(state, &buyer, product.id, 1).await.unwrap_err();
    assert!(matches!(
        err.downcast_ref::<AppError>(),
        Some(AppError::Validation(_))
    ));

    let cart = cart_service::load_cart(&state.orm, buyer.user_id).await?;
    assert_eq!(cart.items[0].quantity, MAX_LINE_QUANTITY);
    assert_eq!(cart.grand_total, 1000 * i64::from(MAX_LINE_QUANTITY));

    Ok(())
}
