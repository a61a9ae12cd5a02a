/// Background catalog warmer.
///
/// One sweep over the full catalog, refreshing every product whose cached
/// record is missing or past its trust window. Individual failures are
/// logged and skipped; the sweep keeps going.
use crate::logger::{log, LogTag};
use crate::printful::PrintfulClient;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;

/// Pause after every upstream product fetch. The products endpoint family is
/// documented at 30 requests per minute; a fixed pause keeps a full sweep
/// comfortably under it without consuming the shared quota in bursts.
pub const WARM_PAUSE: Duration = Duration::from_secs(3);

pub fn spawn(client: Arc<PrintfulClient>) -> JoinHandle<()> {
    tokio::spawn(run(client))
}

pub async fn run(client: Arc<PrintfulClient>) {
    let snapshot = match client.get_catalog().await {
        Ok(snapshot) => snapshot,
        Err(e) => {
            log(
                LogTag::Warmer,
                "ERROR",
                &format!("catalog listing failed, skipping warm sweep: {}", e),
            );
            return;
        }
    };

    log(
        LogTag::Warmer,
        "INFO",
        &format!("warming {} catalog products", snapshot.products.len()),
    );

    let mut warmed = 0usize;
    let mut failed = 0usize;
    for product in &snapshot.products {
        match client.warm_product(product.id).await {
            Ok((_, false)) => {}
            Ok((_, true)) => {
                warmed += 1;
                tokio::time::sleep(WARM_PAUSE).await;
            }
            Err(e) => {
                failed += 1;
                log(
                    LogTag::Warmer,
                    "WARN",
                    &format!("product {} failed to warm, continuing: {}", product.id, e),
                );
            }
        }
    }

    log(
        LogTag::Warmer,
        "INFO",
        &format!(
            "warm sweep finished: {} refreshed, {} already fresh, {} failed",
            warmed,
            snapshot.products.len() - warmed - failed,
            failed
        ),
    );
}
