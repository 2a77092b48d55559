use std::{sync::Arc, time::Duration};

use crate::{
    config::AppConfig,
    db::{DbPool, OrmConn},
    mailer::Mailer,
    notify::Notifier,
};

#[derive(Clone)]
pub struct AppState {
    pub pool: DbPool,
    pub orm: OrmConn,
    pub notifier: Notifier,
    pub config: Arc<AppConfig>,
}

impl AppState {
    pub fn new(pool: DbPool, orm: OrmConn, mailer: Arc<dyn Mailer>, config: AppConfig) -> Self {
        let notifier = Notifier::new(mailer, Duration::from_secs(config.mail_timeout_secs));
        Self {
            pool,
            orm,
            notifier,
            config: Arc::new(config),
        }
    }
}
