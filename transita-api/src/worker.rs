use std::sync::Arc;
use tokio::time::{sleep, Duration};
use tracing::{error, info};
use transita_store::{DbClient, LedgerRepository};

/// Hygiene loop that drops expired lock rows. Readers already treat an
/// expired lock as available, so this only keeps the table small; nothing
/// breaks while it is down.
pub async fn start_lock_sweeper(db: Arc<DbClient>, interval_seconds: u64) {
    info!("Lock sweeper started ({}s interval)", interval_seconds);

    loop {
        sleep(Duration::from_secs(interval_seconds)).await;
        match LedgerRepository::sweep_expired(&db.pool).await {
            Ok(0) => {}
            Ok(swept) => info!("Swept {} expired seat locks", swept),
            Err(e) => error!("Lock sweep failed: {}", e),
        }
    }
}
