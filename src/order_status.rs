//! Order status lifecycle.
//!
//! `Pending -> Confirmed -> Shipped -> Delivered`, with `Cancelled` reachable
//! from every non-terminal state. All transition rules and the mails they
//! trigger are decided here so handlers never compare status strings.

use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::error::AppError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
pub enum OrderStatus {
    Pending,
    Confirmed,
    Shipped,
    Delivered,
    Cancelled,
}

impl OrderStatus {
    pub const ALL: [OrderStatus; 5] = [
        OrderStatus::Pending,
        OrderStatus::Confirmed,
        OrderStatus::Shipped,
        OrderStatus::Delivered,
        OrderStatus::Cancelled,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Pending => "Pending",
            OrderStatus::Confirmed => "Confirmed",
            OrderStatus::Shipped => "Shipped",
            OrderStatus::Delivered => "Delivered",
            OrderStatus::Cancelled => "Cancelled",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, OrderStatus::Delivered | OrderStatus::Cancelled)
    }

    /// Position on the fulfilment chain. `Cancelled` sits outside it.
    fn rank(&self) -> Option<u8> {
        match self {
            OrderStatus::Pending => Some(0),
            OrderStatus::Confirmed => Some(1),
            OrderStatus::Shipped => Some(2),
            OrderStatus::Delivered => Some(3),
            OrderStatus::Cancelled => None,
        }
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OrderStatus {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        OrderStatus::ALL
            .into_iter()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| {
                let allowed: Vec<&str> = OrderStatus::ALL.iter().map(|s| s.as_str()).collect();
                AppError::Validation(format!(
                    "Invalid status '{s}'. Status must be one of: {}",
                    allowed.join(", ")
                ))
            })
    }
}

/// Which side of the order is acting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Party {
    Buyer,
    Seller,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrderEvent {
    /// Seller moves the order to an explicit status.
    SetStatus(OrderStatus),
    /// Buyer or seller abandons the order.
    Cancel,
}

/// A mail owed to one side of the order after a transition commits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Notice {
    BuyerConfirmed,
    BuyerCancelled { by: Party },
    SellerCancelledByBuyer,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transition {
    pub from: OrderStatus,
    pub to: OrderStatus,
    pub notices: Vec<Notice>,
}

impl Transition {
    pub fn changed(&self) -> bool {
        self.from != self.to
    }
}

/// Resolve `event` against `current`. Rejections are `AppError::Conflict`.
pub fn apply(current: OrderStatus, event: OrderEvent, actor: Party) -> Result<Transition, AppError> {
    if current.is_terminal() {
        return Err(AppError::Conflict(format!(
            "Orders with status '{current}' cannot be changed"
        )));
    }

    let next = match event {
        OrderEvent::Cancel => OrderStatus::Cancelled,
        OrderEvent::SetStatus(target) => match (current.rank(), target.rank()) {
            _ if target == current => current,
            (_, None) => OrderStatus::Cancelled,
            (Some(from), Some(to)) if to > from => target,
            _ => {
                return Err(AppError::Conflict(format!(
                    "Cannot move order from '{current}' back to '{target}'"
                )));
            }
        },
    };

    Ok(Transition {
        from: current,
        to: next,
        notices: notices_for(current, next, actor),
    })
}

fn notices_for(from: OrderStatus, to: OrderStatus, actor: Party) -> Vec<Notice> {
    if from == to {
        return Vec::new();
    }
    match (to, actor) {
        (OrderStatus::Confirmed, _) => vec![Notice::BuyerConfirmed],
        (OrderStatus::Cancelled, Party::Buyer) => vec![
            Notice::BuyerCancelled { by: Party::Buyer },
            Notice::SellerCancelledByBuyer,
        ],
        (OrderStatus::Cancelled, Party::Seller) => vec![Notice::BuyerCancelled { by: Party::Seller }],
        _ => Vec::new(),
    }
}
