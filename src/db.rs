use crate::config::AppConfig;
use crate::entities::{order_work_item, purchased_part};
use crate::errors::ServiceError;
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectOptions, ConnectionTrait, Database, DatabaseConnection,
    DatabaseTransaction, DbErr, EntityTrait, QueryFilter, Set, TransactionTrait,
};
use sea_orm_migration::MigratorTrait;
use std::time::Duration;
use tracing::{debug, error, info};

/// Type alias for a database connection pool
pub type DbPool = DatabaseConnection;

/// Configuration for database connection
#[derive(Debug, Clone)]
pub struct DbConfig {
    /// Database connection URL
    pub url: String,
    /// Maximum number of connections
    pub max_connections: u32,
    /// Minimum number of connections
    pub min_connections: u32,
    /// Connection timeout duration
    pub connect_timeout: Duration,
    /// Idle timeout duration
    pub idle_timeout: Duration,
    /// Acquire connection timeout
    pub acquire_timeout: Duration,
}

impl Default for DbConfig {
    fn default() -> Self {
        Self {
            url: String::new(),
            max_connections: 10,
            min_connections: 1,
            connect_timeout: Duration::from_secs(30),
            idle_timeout: Duration::from_secs(600),
            acquire_timeout: Duration::from_secs(8),
        }
    }
}

impl From<&AppConfig> for DbConfig {
    fn from(cfg: &AppConfig) -> Self {
        Self {
            url: cfg.database_url.clone(),
            max_connections: cfg.db_max_connections,
            min_connections: cfg.db_min_connections,
            connect_timeout: Duration::from_secs(cfg.db_connect_timeout_secs),
            idle_timeout: Duration::from_secs(cfg.db_idle_timeout_secs),
            acquire_timeout: Duration::from_secs(cfg.db_acquire_timeout_secs),
        }
    }
}

/// Establishes a connection pool to the database with custom configuration
///
/// # Errors
/// Returns `ServiceError::DatabaseError` if the pool cannot be created
pub async fn establish_connection_with_config(config: &DbConfig) -> Result<DbPool, ServiceError> {
    debug!("Configuring database connection with: {:?}", config);

    let mut opt = ConnectOptions::new(config.url.clone());
    opt.max_connections(config.max_connections)
        .min_connections(config.min_connections)
        .connect_timeout(config.connect_timeout)
        .acquire_timeout(config.acquire_timeout)
        .idle_timeout(config.idle_timeout)
        .sqlx_logging(false);

    info!(
        "Connecting to database with max_connections={}",
        config.max_connections
    );

    let pool = Database::connect(opt)
        .await
        .map_err(|e| ServiceError::db("connect", e))?;

    info!("Database connection pool established successfully");
    Ok(pool)
}

/// Establish DB pool using AppConfig tuning
pub async fn establish_connection_from_app_config(cfg: &AppConfig) -> Result<DbPool, ServiceError> {
    let db_cfg: DbConfig = cfg.into();
    establish_connection_with_config(&db_cfg).await
}

/// Applies every pending migration, seeding the reference tables on first run.
pub async fn run_migrations(pool: &DbPool) -> Result<(), ServiceError> {
    info!("Running database migrations");
    crate::migrator::Migrator::up(pool, None)
        .await
        .map_err(|e| ServiceError::db("run migrations", e))?;
    info!("Database migrations completed");
    Ok(())
}

/// Round-trips a trivial statement to confirm the pool is usable.
pub async fn check_connection(pool: &DbPool) -> Result<(), DbErr> {
    pool.ping().await
}

pub async fn close_pool(pool: DbPool) -> Result<(), ServiceError> {
    pool.close()
        .await
        .map_err(|e| ServiceError::db("close pool", e))
}

/// Opens a transaction; dropping it without `commit` rolls back.
pub async fn begin(pool: &DbPool) -> Result<DatabaseTransaction, ServiceError> {
    pool.begin()
        .await
        .map_err(|e| ServiceError::db("begin transaction", e))
}

pub async fn commit(txn: DatabaseTransaction) -> Result<(), ServiceError> {
    txn.commit()
        .await
        .map_err(|e| ServiceError::db("commit transaction", e))
}

/// Recomputes an order work item's `parts_total` from its order-scoped parts
/// and writes it back. Callers must run this after inserting or removing
/// order-scoped parts; the returned value is what a re-read would observe.
pub async fn refresh_parts_total<C>(conn: &C, work_item_id: i32) -> Result<Decimal, ServiceError>
where
    C: ConnectionTrait,
{
    let item = order_work_item::Entity::find_by_id(work_item_id)
        .one(conn)
        .await
        .map_err(|e| ServiceError::db("load work item for parts total", e))?
        .ok_or_else(|| ServiceError::NotFound(format!("Work item {} not found", work_item_id)))?;

    let parts = purchased_part::Entity::find()
        .filter(purchased_part::Column::OrderWorkItemId.eq(work_item_id))
        .all(conn)
        .await
        .map_err(|e| ServiceError::db("load parts for parts total", e))?;

    let total: Decimal = parts.iter().map(purchased_part::Model::total_cost).sum();
    let total = total.round_dp(2);

    if item.parts_total != total {
        let mut active: order_work_item::ActiveModel = item.into();
        active.parts_total = Set(total);
        active.update(conn).await.map_err(|e| {
            error!(work_item_id, error = %e, "failed to store parts total");
            ServiceError::DatabaseError(e)
        })?;
    }

    debug!(work_item_id, %total, "parts total refreshed");
    Ok(total)
}
