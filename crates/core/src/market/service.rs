use crate::domain::market::StockData;
use crate::market::provider::{MarketDataProvider, OutputSize};

/// Quote, daily history of the requested size and company overview for one
/// symbol.
///
/// The three calls are issued together; the provider's throttle still spaces
/// them. Without a quote there is nothing to show, so a missing or failed
/// quote yields `Ok(None)`. History and overview failures degrade to empty
/// and absent.
pub async fn fetch_stock_data(
    provider: &dyn MarketDataProvider,
    symbol: &str,
    size: OutputSize,
) -> anyhow::Result<Option<StockData>> {
    let symbol = symbol.trim().to_uppercase();
    anyhow::ensure!(!symbol.is_empty(), "symbol must be non-empty");

    let (quote, history, overview) = tokio::join!(
        provider.quote(&symbol),
        provider.daily_history(&symbol, size),
        provider.company_overview(&symbol),
    );

    let quote = match quote {
        Ok(Some(q)) => q,
        Ok(None) => {
            tracing::info!(%symbol, provider = provider.provider_name(), "no quote for symbol");
            return Ok(None);
        }
        Err(err) => {
            tracing::warn!(%symbol, provider = provider.provider_name(), error = %err, "quote fetch failed");
            return Ok(None);
        }
    };

    let historical_data = history.unwrap_or_else(|err| {
        tracing::warn!(%symbol, error = %err, "history fetch failed; continuing without it");
        Vec::new()
    });

    let company = overview.unwrap_or_else(|err| {
        tracing::warn!(%symbol, error = %err, "company overview fetch failed; continuing without it");
        None
    });

    Ok(Some(StockData {
        quote,
        historical_data,
        company,
    }))
}
