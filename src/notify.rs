//! Order and account notifications rendered as plain-text mail.

use std::{sync::Arc, time::Duration};

use crate::{
    entity::{orders::Model as OrderModel, users::Model as UserModel},
    mailer::{MailError, Mailer, OutgoingMail},
    order_status::{Notice, Party},
};

const SIGNATURE: &str = "Best regards,\nGB Green Guide Team";

/// One ordered line as shown in a mail.
#[derive(Debug, Clone)]
pub struct MailLine {
    pub name: String,
    pub quantity: i32,
    pub subtotal: i64,
}

/// Everything a mail about one order may mention.
#[derive(Debug, Clone, Copy)]
pub struct OrderMail<'a> {
    pub order: &'a OrderModel,
    pub lines: &'a [MailLine],
    pub buyer: &'a UserModel,
    pub seller: &'a UserModel,
}

#[derive(Clone)]
pub struct Notifier {
    mailer: Arc<dyn Mailer>,
    timeout: Duration,
}

impl Notifier {
    pub fn new(mailer: Arc<dyn Mailer>, timeout: Duration) -> Self {
        Self { mailer, timeout }
    }

    /// Send and wait, bounded by the configured timeout. Returns whether the
    /// transport accepted the message.
    pub async fn deliver(&self, mail: OutgoingMail) -> bool {
        let to = mail.to.clone();
        let result = match tokio::time::timeout(self.timeout, self.mailer.send(mail)).await {
            Ok(result) => result,
            Err(_) => Err(MailError::Timeout),
        };
        match result {
            Ok(()) => {
                tracing::info!(to = %to, "notification email sent");
                true
            }
            Err(err) => {
                tracing::warn!(to = %to, error = %err, "failed to send notification email");
                false
            }
        }
    }

    /// Detach delivery from the caller. Returns how many mails were queued.
    pub fn dispatch(&self, mails: Vec<OutgoingMail>) -> usize {
        let queued = mails.len();
        for mail in mails {
            let notifier = self.clone();
            tokio::spawn(async move {
                notifier.deliver(mail).await;
            });
        }
        queued
    }
}

fn display_name(user: &UserModel) -> &str {
    user.first_name
        .as_deref()
        .filter(|name| !name.trim().is_empty())
        .unwrap_or(&user.username)
}

fn recipient(address: &str) -> Option<String> {
    let address = address.trim();
    (!address.is_empty()).then(|| address.to_string())
}

fn item_lines(lines: &[MailLine]) -> String {
    lines
        .iter()
        .map(|line| format!("- {} x {} = Rs. {}\n", line.name, line.quantity, line.subtotal))
        .collect()
}

/// Mail to the seller announcing a fresh order.
pub fn new_order_mail(ctx: OrderMail<'_>) -> Option<OutgoingMail> {
    let to = recipient(&ctx.seller.email)?;
    let order = ctx.order;
    let line2 = if order.address_line2.is_empty() {
        String::new()
    } else {
        format!("{}, ", order.address_line2)
    };

    let body = format!(
        "Dear {seller},\n\nYou have received a new order!\n\nOrder Details:\n\
         - Order ID: #{id}\n- Customer: {customer}\n- Customer Name: {full_name}\n\
         - Total Amount: Rs. {total}\n- Customer Phone: {phone}\n- Customer Email: {email}\n\n\
         Shipping Address:\n{full_name}\n{line1}\n{line2}{city}, {country}\n\n\
         Items Ordered:\n{items}\n\
         Please contact the customer to confirm and arrange delivery.\n\n{SIGNATURE}\n",
        seller = display_name(ctx.seller),
        id = order.id,
        customer = display_name(ctx.buyer),
        full_name = order.full_name,
        total = order.total_price,
        phone = order.phone,
        email = order.email,
        line1 = order.address_line1,
        city = order.city,
        country = order.country,
        items = item_lines(ctx.lines),
    );

    Some(OutgoingMail {
        to,
        subject: format!("New Order Received - GB Green Guide #{}", order.id),
        body,
    })
}

/// Render the mail a status-transition notice calls for.
pub fn notice_mail(notice: Notice, previous: &str, ctx: OrderMail<'_>) -> Option<OutgoingMail> {
    let order = ctx.order;
    let date = order.updated_at.format("%B %d, %Y");
    match notice {
        Notice::BuyerConfirmed => Some(OutgoingMail {
            to: recipient(&order.email)?,
            subject: format!("Order Confirmed - GB Green Guide #{}", order.id),
            body: format!(
                "Dear {name},\n\nGreat news! Your order #{id} has been confirmed by the seller!\n\n\
                 Order Details:\n- Order ID: #{id}\n- Seller: {seller}\n- Total Amount: Rs. {total}\n\
                 - Payment Method: {payment}\n- Status: {status}\n\nItems Ordered:\n{items}\n\
                 The seller will contact you soon at {phone} to arrange delivery.\n\n\
                 Thank you for shopping with GB Green Guide!\n\n{SIGNATURE}\n",
                name = order.full_name,
                id = order.id,
                seller = display_name(ctx.seller),
                total = order.total_price,
                payment = order.payment_method,
                status = order.status,
                items = item_lines(ctx.lines),
                phone = order.phone,
            ),
        }),
        Notice::BuyerCancelled { by } => {
            let by = match by {
                Party::Buyer => "you",
                Party::Seller => "the seller",
            };
            Some(OutgoingMail {
                to: recipient(&order.email)?,
                subject: format!("Order Cancelled - GB Green Guide #{}", order.id),
                body: format!(
                    "Dear {name},\n\nYour order #{id} has been cancelled by {by}.\n\n\
                     Order Details:\n- Order ID: #{id}\n- Total Amount: Rs. {total}\n\
                     - Previous Status: {previous}\n- Cancellation Date: {date}\n\n\
                     If you have any questions, please contact us.\n\n{SIGNATURE}\n",
                    name = order.full_name,
                    id = order.id,
                    total = order.total_price,
                ),
            })
        }
        Notice::SellerCancelledByBuyer => Some(OutgoingMail {
            to: recipient(&ctx.seller.email)?,
            subject: format!("Order Cancelled by Customer - GB Green Guide #{}", order.id),
            body: format!(
                "Dear {seller},\n\nOrder #{id} has been cancelled by the customer.\n\n\
                 Order Details:\n- Order ID: #{id}\n- Customer: {customer}\n- Total Amount: Rs. {total}\n\
                 - Previous Status: {previous}\n- Cancellation Date: {date}\n\n{SIGNATURE}\n",
                seller = display_name(ctx.seller),
                id = order.id,
                customer = order.full_name,
                total = order.total_price,
            ),
        }),
    }
}

pub fn password_reset_mail(user: &UserModel, link: &str) -> Option<OutgoingMail> {
    Some(OutgoingMail {
        to: recipient(&user.email)?,
        subject: "Reset your GB Green Guide password".to_string(),
        body: format!(
            "Dear {name},\n\nWe received a request to reset your password.\n\
             Open the link below within one hour to choose a new one:\n\n{link}\n\n\
             If you did not request this, you can ignore this email.\n\n{SIGNATURE}\n",
            name = display_name(user),
        ),
    })
}
