//! Connection pool bootstrap

use crate::config::ConnectionConfig;
use crate::error::{OrmError, OrmResult};
use crate::executor::Executor;
use mysql_async::Pool;
use mysql_async::prelude::Queryable;

/// Build a pool from a validated configuration.
///
/// No connection is opened here; the first query (or [`connect`]) does that.
///
/// # Example
///
/// ```ignore
/// let config = myorm::ConnectionConfig::new().database("shop").password("secret");
/// let pool = myorm::create_pool(&config)?;
/// let db = myorm::Executor::pooled(pool);
/// ```
pub fn create_pool(config: &ConnectionConfig) -> OrmResult<Pool> {
    let opts = config.to_opts()?;
    tracing::info!(
        target: "myorm.sql",
        target_db = %config.display_target(),
        max_open = config.max_open_conns,
        max_idle = config.max_idle_conns,
        "creating connection pool"
    );
    Ok(Pool::new(opts))
}

/// Build a pool, check that the server is reachable, and wrap it in a pooled executor.
///
/// Failure to open or ping the first connection is reported as
/// [`OrmError::DriverInitFailed`] and the pool is shut down again.
pub async fn connect(config: &ConnectionConfig) -> OrmResult<Executor> {
    let pool = create_pool(config)?;

    if let Err(err) = ping(&pool).await {
        let _ = pool.disconnect().await;
        return Err(OrmError::from_init_error(err));
    }

    Ok(Executor::pooled(pool))
}

async fn ping(pool: &Pool) -> Result<(), mysql_async::Error> {
    let mut conn = pool.get_conn().await?;
    conn.ping().await
}
