//! Access predicates shared by the services.
//!
//! Each check maps `(caller, resource)` to allow or a `Forbidden` error.

use uuid::Uuid;

use crate::{
    entity::orders::Model as OrderModel,
    error::{AppError, AppResult},
    middleware::auth::AuthUser,
    models::Role,
    order_status::Party,
};

/// Resources that belong to a single account.
pub trait Owned {
    fn owner_id(&self) -> Uuid;
}

impl Owned for crate::entity::products::Model {
    fn owner_id(&self) -> Uuid {
        self.owner_id
    }
}

impl Owned for crate::entity::businesses::Model {
    fn owner_id(&self) -> Uuid {
        self.owner_id
    }
}

impl Owned for crate::entity::reviews::Model {
    fn owner_id(&self) -> Uuid {
        self.user_id
    }
}

pub fn ensure_role(user: &AuthUser, role: Role) -> AppResult<()> {
    if user.role != role {
        return Err(AppError::Forbidden(format!(
            "Only {} accounts can perform this action",
            role.label()
        )));
    }
    Ok(())
}

pub fn ensure_business_owner(user: &AuthUser) -> AppResult<()> {
    ensure_role(user, Role::BusinessOwner)
}

pub fn ensure_owner(user: &AuthUser, resource: &impl Owned) -> AppResult<()> {
    if resource.owner_id() != user.user_id {
        return Err(AppError::Forbidden(
            "You can only modify your own resources".into(),
        ));
    }
    Ok(())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrderAction {
    View,
    Confirm,
    Cancel,
    Delete,
}

impl OrderAction {
    fn verb(&self) -> &'static str {
        match self {
            OrderAction::View => "view",
            OrderAction::Confirm => "update",
            OrderAction::Cancel => "cancel",
            OrderAction::Delete => "delete",
        }
    }
}

/// Seller wins when a user somehow bought from themselves.
pub fn order_party(user: &AuthUser, order: &OrderModel) -> Option<Party> {
    if order.owner_id == user.user_id {
        Some(Party::Seller)
    } else if order.user_id == user.user_id {
        Some(Party::Buyer)
    } else {
        None
    }
}

pub fn authorize_order(user: &AuthUser, action: OrderAction, order: &OrderModel) -> AppResult<Party> {
    let party = order_party(user, order);
    match (action, party) {
        (OrderAction::Confirm, Some(Party::Seller)) => Ok(Party::Seller),
        (OrderAction::Confirm, _) => Err(AppError::Forbidden(
            "You can only update orders for your own products".into(),
        )),
        (_, Some(party)) => Ok(party),
        (action, None) => Err(AppError::Forbidden(format!(
            "Not authorized to {} this order",
            action.verb()
        ))),
    }
}
