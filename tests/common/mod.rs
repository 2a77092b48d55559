#![allow(dead_code)]

use std::{
    sync::{Arc, Mutex},
    time::Duration,
};

use async_trait::async_trait;
use marketplace_api::{
    config::AppConfig,
    db::{create_orm_conn, create_pool, run_migrations},
    dto::cart::AddToCartRequest,
    dto::orders::CreateOrderRequest,
    entity::{
        cities::{ActiveModel as CityActive, Model as CityModel},
        products::{ActiveModel as ProductActive, Model as ProductModel},
        regions::ActiveModel as RegionActive,
        users::{ActiveModel as UserActive, Model as UserModel},
    },
    mailer::{MailError, Mailer, OutgoingMail},
    middleware::auth::AuthUser,
    models::Role,
    services::cart_service,
    slug::slugify,
    state::AppState,
};
use sea_orm::ActiveValue::NotSet;
use sea_orm::{ActiveModelTrait, Set};
use tokio::sync::OnceCell;
use uuid::Uuid;

static MIGRATED: OnceCell<()> = OnceCell::const_new();

/// Captures every mail instead of delivering it.
#[derive(Clone, Default)]
pub struct RecordingMailer {
    sent: Arc<Mutex<Vec<OutgoingMail>>>,
}

impl RecordingMailer {
    pub fn sent(&self) -> Vec<OutgoingMail> {
        self.sent.lock().map(|s| s.clone()).unwrap_or_default()
    }

    pub fn sent_to(&self, address: &str) -> Vec<OutgoingMail> {
        self.sent().into_iter().filter(|m| m.to == address).collect()
    }

    /// Detached deliveries land a little after the request returns.
    pub async fn wait_for(&self, count: usize) -> Vec<OutgoingMail> {
        for _ in 0..50 {
            let sent = self.sent();
            if sent.len() >= count {
                return sent;
            }
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
        self.sent()
    }
}

#[async_trait]
impl Mailer for RecordingMailer {
    async fn send(&self, mail: OutgoingMail) -> Result<(), MailError> {
        if let Ok(mut sent) = self.sent.lock() {
            sent.push(mail);
        }
        Ok(())
    }
}

/// Refuses every message.
pub struct FailingMailer;

#[async_trait]
impl Mailer for FailingMailer {
    async fn send(&self, mail: OutgoingMail) -> Result<(), MailError> {
        Err(MailError::InvalidAddress(mail.to))
    }
}

/// Never answers within the one second the tests allow.
pub struct StalledMailer;

#[async_trait]
impl Mailer for StalledMailer {
    async fn send(&self, _mail: OutgoingMail) -> Result<(), MailError> {
        tokio::time::sleep(Duration::from_secs(30)).await;
        Ok(())
    }
}

pub struct TestApp {
    pub state: AppState,
    pub mailer: RecordingMailer,
}

/// `None` when no database is configured; callers skip.
pub async fn setup() -> anyhow::Result<Option<TestApp>> {
    let mailer = RecordingMailer::default();
    let state = setup_with(Arc::new(mailer.clone())).await?;
    Ok(state.map(|state| TestApp { state, mailer }))
}

/// Same as [`setup`] with a caller-chosen transport and a one second mail timeout.
pub async fn setup_with(mailer: Arc<dyn Mailer>) -> anyhow::Result<Option<AppState>> {
    let database_url = match std::env::var("TEST_DATABASE_URL")
        .or_else(|_| std::env::var("DATABASE_URL"))
    {
        Ok(url) => url,
        Err(_) => {
            eprintln!(
                "Skipping test: set TEST_DATABASE_URL or DATABASE_URL to run integration flow tests."
            );
            return Ok(None);
        }
    };

    MIGRATED
        .get_or_try_init(|| async {
            let orm = create_orm_conn(&database_url).await?;
            run_migrations(&orm).await?;
            anyhow::Ok(())
        })
        .await?;

    let pool = create_pool(&database_url).await?;
    let orm = create_orm_conn(&database_url).await?;
    let config = AppConfig {
        database_url,
        host: "127.0.0.1".into(),
        port: 0,
        jwt_secret: "test-secret".into(),
        jwt_ttl_hours: 1,
        smtp: None,
        mail_from: "GB Green Guide <no-reply@example.com>".into(),
        mail_timeout_secs: 1,
        frontend_url: "http://localhost:5173".into(),
    };
    Ok(Some(AppState::new(pool, orm, mailer, config)))
}

/// Tests share one database, so every account gets a unique name.
pub async fn create_user(state: &AppState, role: Role) -> anyhow::Result<(UserModel, AuthUser)> {
    let tag = Uuid::new_v4().simple().to_string();
    let username = format!("{}_{}", role.as_str(), &tag[..12]);
    let user = UserActive {
        id: Set(Uuid::new_v4()),
        email: Set(format!("{username}@example.com")),
        username: Set(username),
        password_hash: Set("dummy".into()),
        role: Set(role.as_str().into()),
        first_name: Set(None),
        phone: Set(None),
        shop_name: Set(None),
        address: Set(None),
        created_at: NotSet,
    }
    .insert(&state.orm)
    .await?;

    let auth = AuthUser {
        user_id: user.id,
        role,
    };
    Ok((user, auth))
}

pub async fn create_product(
    state: &AppState,
    owner: &UserModel,
    name: &str,
    price: i64,
    discount_price: Option<i64>,
) -> anyhow::Result<ProductModel> {
    let product = ProductActive {
        id: Set(Uuid::new_v4()),
        owner_id: Set(owner.id),
        category_id: Set(None),
        city_id: Set(None),
        name: Set(name.into()),
        slug: Set(slugify(name)),
        description: Set(None),
        price: Set(price),
        discount_price: Set(discount_price),
        stock: Set(10),
        is_available: Set(true),
        image: Set(None),
        created_at: NotSet,
        updated_at: NotSet,
    }
    .insert(&state.orm)
    .await?;
    Ok(product)
}

/// A city under a fresh region, so listings can be filtered in isolation.
pub async fn create_city(state: &AppState, name: &str) -> anyhow::Result<CityModel> {
    let tag = Uuid::new_v4().simple().to_string();
    let region = RegionActive {
        id: Set(Uuid::new_v4()),
        name: Set(format!("Region {}", &tag[..12])),
    }
    .insert(&state.orm)
    .await?;

    let city = CityActive {
        id: Set(Uuid::new_v4()),
        region_id: Set(region.id),
        name: Set(name.into()),
        description: Set(None),
        highlights: Set(None),
        altitude: Set(None),
        best_time_to_visit: Set(None),
        image: Set(None),
        created_at: NotSet,
    }
    .insert(&state.orm)
    .await?;
    Ok(city)
}

pub async fn add(state: &AppState, user: &AuthUser, product_id: Uuid, quantity: i32) -> anyhow::Result<()> {
    cart_service::add_to_cart(
        state,
        user,
        AddToCartRequest {
            product_id,
            quantity: Some(quantity),
        },
    )
    .await?;
    Ok(())
}

pub fn shipping(full_name: &str) -> CreateOrderRequest {
    CreateOrderRequest {
        full_name: Some(full_name.into()),
        email: Some("Buyer@Example.com".into()),
        phone: Some("03001234567".into()),
        address_line1: Some("Main Bazaar".into()),
        address_line2: None,
        city: Some("Gilgit".into()),
        country: None,
    }
}
