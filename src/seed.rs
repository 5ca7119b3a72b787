//! Initial market catalogue. The bundled list ships in the binary; an operator
//! can point `moltvote seed --file` at their own JSON array instead.

use std::path::Path;

use tracing::info;

use crate::db::Store;
use crate::error::{AppError, Result};
use crate::types::NewMarket;

const BUNDLED_MARKETS: &str = include_str!("../seed/markets.json");

/// Parse and validate a seed document: a JSON array of `{question, category, endDate, isHot?}`.
pub fn parse_markets(json: &str) -> Result<Vec<NewMarket>> {
    let markets: Vec<NewMarket> = serde_json::from_str(json)?;
    for (i, m) in markets.iter().enumerate() {
        if m.question.trim().is_empty() || m.category.trim().is_empty() || m.end_date.trim().is_empty() {
            return Err(AppError::Validation(format!(
                "seed entry {i} is missing question, category or endDate"
            )));
        }
    }
    Ok(markets)
}

pub fn load_markets(file: Option<&Path>) -> Result<Vec<NewMarket>> {
    match file {
        Some(path) => parse_markets(&std::fs::read_to_string(path)?),
        None => parse_markets(BUNDLED_MARKETS),
    }
}

/// Insert the seed set in one transaction. Returns the number of markets created.
pub async fn run(store: &Store, file: Option<&Path>) -> Result<u64> {
    let markets = load_markets(file)?;
    let source = file.map_or_else(|| "bundled list".to_string(), |p| p.display().to_string());
    let count = store.create_markets(&markets).await?;
    info!(count, source = %source, "Seeded markets");
    Ok(count)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::store::test_store;
    use crate::db::MarketFilter;

    #[test]
    fn bundled_list_parses() {
        let markets = load_markets(None).unwrap();
        assert!(markets.len() > 100);
        assert!(markets.iter().any(|m| m.is_hot));
        assert!(markets.iter().all(|m| !m.question.is_empty()));
    }

    #[test]
    fn rejects_blank_fields() {
        let err = parse_markets(r#"[{"question":"  ","category":"meme","endDate":"2027-01-01"}]"#)
            .unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }

    #[test]
    fn rejects_malformed_json() {
        assert!(matches!(parse_markets("{not json"), Err(AppError::Json(_))));
    }

    #[tokio::test]
    async fn seeds_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("markets.json");
        std::fs::write(
            &path,
            r#"[
                {"question":"Is cereal a soup?","category":"meme","endDate":"2027-02-04"},
                {"question":"Do we live in a simulation?","category":"philosophy","endDate":"2027-02-04","isHot":true}
            ]"#,
        )
        .unwrap();

        let store = test_store().await;
        assert_eq!(run(&store, Some(&path)).await.unwrap(), 2);

        let markets = store.list_markets(&MarketFilter::default()).await.unwrap();
        assert_eq!(markets.len(), 2);
        assert_eq!(markets[0].question, "Do we live in a simulation?");
    }
}
