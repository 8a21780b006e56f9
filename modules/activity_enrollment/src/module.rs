//! Module declaration and lifecycle implementation
//!
//! `init` wires storage, the domain service and the native client from
//! [`Config`]; `register_rest` mounts the REST surface on a caller router.

use crate::config::Config;
use crate::contract::EnrollmentApi;
use crate::domain::{AuditLog, EnrollmentStore, Service};
use crate::infra::{
    InMemoryAuditLog, InMemoryEnrollmentStore, SeaOrmAuditLog, SeaOrmEnrollmentStore,
};
use anyhow::Result;
use parking_lot::RwLock;
use sea_orm::{Database, DatabaseConnection};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

/// Activity enrollment module
pub struct EnrollmentModule {
    config: RwLock<Config>,
    service: RwLock<Option<Arc<Service>>>,
}

impl Default for EnrollmentModule {
    fn default() -> Self {
        Self::new(Config::default())
    }
}

impl EnrollmentModule {
    pub fn new(config: Config) -> Self {
        Self {
            config: RwLock::new(config),
            service: RwLock::new(None),
        }
    }

    pub async fn init(&self) -> Result<()> {
        let cfg = self.config.read().clone();
        cfg.validate()?;

        // Build storage
        let (store, audit_log): (Arc<dyn EnrollmentStore>, Arc<dyn AuditLog>) =
            match cfg.database_url.as_deref() {
                Some(url) => {
                    let db = Database::connect(url).await?;
                    Self::migrate(&db).await?;
                    let conn = Arc::new(db);
                    let store: Arc<dyn EnrollmentStore> =
                        Arc::new(SeaOrmEnrollmentStore::new(conn.clone()));
                    let audit_log: Arc<dyn AuditLog> = Arc::new(SeaOrmAuditLog::new(conn));
                    tracing::info!("Activity enrollment using SQL storage");
                    (store, audit_log)
                }
                None => {
                    let audit_log: Arc<dyn AuditLog> = Arc::new(InMemoryAuditLog::new());
                    let store: Arc<dyn EnrollmentStore> =
                        Arc::new(InMemoryEnrollmentStore::new(audit_log.clone()));
                    tracing::info!("Activity enrollment using in-memory storage");
                    (store, audit_log)
                }
            };

        // Build domain service
        let service = Arc::new(Service::new(store, audit_log, cfg));
        *self.service.write() = Some(service);

        tracing::info!("Activity enrollment module initialized");
        Ok(())
    }

    /// Run pending migrations
    pub async fn migrate(db: &DatabaseConnection) -> Result<()> {
        use crate::infra::storage::migrations::Migrator;
        use sea_orm_migration::MigratorTrait;

        Migrator::up(db, None).await?;
        tracing::info!("Activity enrollment migrations completed");
        Ok(())
    }

    pub fn config(&self) -> Config {
        self.config.read().clone()
    }

    pub fn service(&self) -> Result<Arc<Service>> {
        self.service
            .read()
            .as_ref()
            .cloned()
            .ok_or_else(|| anyhow::anyhow!("Service not initialized"))
    }

    /// In-process client for other modules
    pub fn client(&self) -> Result<Arc<dyn EnrollmentApi>> {
        let service = self.service()?;
        Ok(Arc::new(crate::api::native::NativeClient::new(service)))
    }

    /// Mount the REST routes on `router`
    pub fn register_rest(&self, router: axum::Router) -> Result<axum::Router> {
        let service = self.service()?;

        tracing::info!("Registering activity enrollment REST routes");
        Ok(crate::api::rest::register_routes(router, service).layer(TraceLayer::new_for_http()))
    }
}
