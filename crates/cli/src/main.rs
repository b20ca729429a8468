use clap::{Parser, Subcommand};
use std::sync::Arc;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use stocklens_core::analysis::{self, Analyzer};
use stocklens_core::domain::request::AnalysisRequest;
use stocklens_core::llm::gemini::GeminiClient;
use stocklens_core::market::alpha_vantage::AlphaVantageClient;
use stocklens_core::market::{fetch_stock_data, MarketDataProvider, OutputSize};

mod report;

#[derive(Debug, Parser)]
#[command(name = "stocklens_cli")]
struct Args {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Find symbols by company name or ticker fragment.
    Search { query: String },

    /// Fetch each symbol and print a buy/hold/sell analysis.
    Analyze {
        #[arg(required = true)]
        symbols: Vec<String>,

        /// Print the analysis as JSON.
        #[arg(long)]
        json: bool,

        /// Skip the language model and use technical indicators only.
        #[arg(long)]
        offline: bool,

        /// Fetch the full daily history instead of the last ~100 sessions.
        #[arg(long)]
        full: bool,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let settings = stocklens_core::config::Settings::from_env()?;
    let _sentry_guard = init_sentry(&settings);

    tracing_subscriber::registry()
        .with(EnvFilter::from_default_env())
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(sentry_tracing::layer())
        .init();

    let args = Args::parse();
    let market = AlphaVantageClient::from_settings(&settings)?;

    match args.command {
        Command::Search { query } => {
            let matches = market.search_symbols(query.trim()).await?;
            print!("{}", report::render_matches(&matches));
        }
        Command::Analyze {
            symbols,
            json,
            offline,
            full,
        } => {
            let size = if full {
                OutputSize::Full
            } else {
                OutputSize::Compact
            };
            let analyzer = if offline {
                None
            } else {
                match GeminiClient::from_settings(&settings) {
                    Ok(client) => Some(Analyzer::from_env(Arc::new(client))),
                    Err(err) => {
                        tracing::warn!(error = %err, "LLM client unavailable; running offline");
                        None
                    }
                }
            };

            let mut failures = 0usize;
            // Serial; the shared throttle spaces every provider call anyway.
            for symbol in &symbols {
                if let Err(err) = analyze_symbol(&market, analyzer.as_ref(), symbol, size, json).await {
                    sentry_anyhow::capture_anyhow(&err);
                    tracing::error!(%symbol, error = %err, "analysis failed");
                    failures += 1;
                }
            }
            anyhow::ensure!(
                failures == 0,
                "{failures} of {} symbols could not be analyzed",
                symbols.len()
            );
        }
    }

    Ok(())
}

async fn analyze_symbol(
    market: &dyn MarketDataProvider,
    analyzer: Option<&Analyzer>,
    symbol: &str,
    size: OutputSize,
    json: bool,
) -> anyhow::Result<()> {
    let data = fetch_stock_data(market, symbol, size)
        .await?
        .ok_or_else(|| anyhow::anyhow!("stock not found or API limit reached"))?;

    let request = AnalysisRequest {
        symbol: Some(data.quote.symbol.clone()),
        current_price: Some(data.quote.current_price),
        historical_data: Some(data.historical_data),
        company_info: data.company,
    }
    .validate()?;

    let analysis = match analyzer {
        Some(analyzer) => analyzer.analyze_validated(&request).await,
        None => analysis::offline(&request),
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&analysis)?);
    } else {
        print!("{}", report::render_analysis(&request.symbol, &analysis));
    }
    Ok(())
}

fn init_sentry(settings: &stocklens_core::config::Settings) -> Option<sentry::ClientInitGuard> {
    let dsn = settings.sentry_dsn.as_deref()?;
    Some(sentry::init((
        dsn,
        sentry::ClientOptions {
            release: sentry::release_name!(),
            ..Default::default()
        },
    )))
}
