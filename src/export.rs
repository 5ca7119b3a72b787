use std::path::Path;

use tracing::info;

use crate::db::{MarketFilter, Store};
use crate::error::Result;

/// Write every active market, in listing order, as pretty-printed JSON.
/// Used to publish a static snapshot for the frontend. Returns the row count.
pub async fn write_active_markets(store: &Store, out: &Path) -> Result<usize> {
    let markets = store.list_markets(&MarketFilter::default()).await?;

    if let Some(dir) = out.parent().filter(|d| !d.as_os_str().is_empty()) {
        std::fs::create_dir_all(dir)?;
    }
    std::fs::write(out, serde_json::to_string_pretty(&markets)?)?;

    info!(count = markets.len(), path = %out.display(), "Exported markets");
    Ok(markets.len())
}
