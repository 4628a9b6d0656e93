use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use serde_json::Value;
use tracing_subscriber::EnvFilter;

use scour_client::{ExecutorConfig, FlareSolverr, FlareSolverrConfig, HttpProxySource, RequestExecutor};
use scour_core::traits::{CaptchaResolver, Fetcher};
use scour_core::{
    CacheConfig, CaptchaResolutionChain, ContentFetcher, ProxyPool, ProxyPoolConfig, ResponseCache,
    Settings,
};
use scour_extract::{ExtractionResult, ScraperApi};

#[cfg(feature = "browser")]
type InteractiveStage = scour_client::InteractiveSolver;
#[cfg(not(feature = "browser"))]
type InteractiveStage = scour_core::traits::NullSolver;

#[derive(Parser)]
#[command(name = "scour", version, about = "Resilient fetcher and site-family extractor")]
struct Cli {
    /// Never escalate to a CAPTCHA solver
    #[arg(long, global = true, default_value_t = false)]
    no_captcha: bool,

    /// Bypass the in-memory response cache
    #[arg(long, global = true, default_value_t = false)]
    no_cache: bool,

    /// CAPTCHA-solving service endpoint
    #[arg(long, global = true, env = "FLARESOLVERR_URL")]
    flaresolverr_url: Option<String>,

    /// Log level for the scour crates
    #[arg(long, global = true, env = "LOG_LEVEL")]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Fetch a page, extract it with the matching adapter and save the record
    Scrape {
        /// Target URL to scrape
        #[arg(short, long)]
        url: String,

        /// Where to write the JSON record
        #[arg(short, long, default_value = "data.json")]
        output: PathBuf,

        /// Run the CAPTCHA chain even when no challenge is detected
        #[arg(long, default_value_t = false)]
        force_captcha: bool,
    },

    /// Extract products from a page and print a short listing
    Products {
        /// Target URL
        #[arg(short, long)]
        url: String,

        /// Number of products to print
        #[arg(short, long, default_value_t = 5)]
        limit: usize,
    },

    /// Check that a page can be fetched
    Test {
        /// Target URL
        #[arg(short, long)]
        url: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env if present
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();

    let mut settings = Settings::from_env().context("Invalid configuration")?;
    if let Some(endpoint) = &cli.flaresolverr_url {
        settings.flaresolverr_url = endpoint.clone();
    }
    if let Some(level) = &cli.log_level {
        settings.log_level = level.to_lowercase();
    }

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::from_default_env()
                .add_directive(format!("scour={}", settings.log_level).parse()?),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let executor = RequestExecutor::new(ExecutorConfig::from_settings(&settings))
        .context("Failed to create HTTP client")?;
    let executor = if cli.no_cache {
        executor
    } else {
        executor.with_cache(ResponseCache::new(
            CacheConfig::default().with_ttl(settings.cache_expiration),
        ))
    };

    match settings.proxy_list_url.as_deref() {
        Some(list_url) => {
            let source = HttpProxySource::new(list_url).context("Failed to create proxy source")?;
            let executor = executor.with_proxy_pool(ProxyPool::new(source, ProxyPoolConfig::default()));
            with_resolver(executor, &cli, &settings).await
        }
        None => with_resolver(executor, &cli, &settings).await,
    }
}

async fn with_resolver<F: Fetcher>(fetcher: F, cli: &Cli, settings: &Settings) -> Result<()> {
    if cli.no_captcha {
        let api = ScraperApi::new(ContentFetcher::without_resolver(fetcher))?;
        return run(&api, &cli.command).await;
    }

    let automated = FlareSolverr::new(FlareSolverrConfig::new(settings.flaresolverr_url.as_str()))
        .context("Failed to create CAPTCHA solver client")?;
    let chain = CaptchaResolutionChain::new(automated, InteractiveStage::default());
    let api = ScraperApi::new(ContentFetcher::new(fetcher, chain))?;
    run(&api, &cli.command).await
}

async fn run<F, R>(api: &ScraperApi<F, R>, command: &Commands) -> Result<()>
where
    F: Fetcher,
    R: CaptchaResolver,
{
    match command {
        Commands::Scrape {
            url,
            output,
            force_captcha,
        } => cmd_scrape(api, url, output, *force_captcha).await,
        Commands::Products { url, limit } => cmd_products(api, url, *limit).await,
        Commands::Test { url } => cmd_test(api, url).await,
    }
}

async fn cmd_scrape<F, R>(
    api: &ScraperApi<F, R>,
    url: &str,
    output: &Path,
    force_captcha: bool,
) -> Result<()>
where
    F: Fetcher,
    R: CaptchaResolver,
{
    tracing::info!(url = %url, adapter = %api.select_adapter(url), "Scraping");

    let result = api
        .scrape(url, force_captcha)
        .await
        .with_context(|| format!("Failed to fetch {url}"))?;

    if let Some(error) = result.error() {
        tracing::warn!(url = %url, error = %error, "Extraction reported an error");
    }

    write_record(output, &result)?;
    println!("Saved {} items to {}", item_count(&result), output.display());

    Ok(())
}

async fn cmd_products<F, R>(api: &ScraperApi<F, R>, url: &str, limit: usize) -> Result<()>
where
    F: Fetcher,
    R: CaptchaResolver,
{
    let result = api
        .extract_products(url)
        .await
        .with_context(|| format!("Failed to fetch {url}"))?;
    if let Some(error) = result.error() {
        anyhow::bail!("Product extraction failed: {error}");
    }

    let products = result
        .get("products")
        .and_then(Value::as_array)
        .map(Vec::as_slice)
        .unwrap_or_default();

    for line in product_lines(products, limit) {
        println!("{line}");
    }
    println!("\nTotal products: {}", products.len());

    Ok(())
}

async fn cmd_test<F, R>(api: &ScraperApi<F, R>, url: &str) -> Result<()>
where
    F: Fetcher,
    R: CaptchaResolver,
{
    let doc = api
        .get_content(url, false)
        .await
        .with_context(|| format!("Failed to fetch {url}"))?;

    tracing::info!(url = %doc.url, provenance = %doc.provenance, "Fetched");
    println!("Success! Content length: {}", doc.html.len());

    Ok(())
}

fn write_record(path: &Path, result: &ExtractionResult) -> Result<()> {
    let json = serde_json::to_string_pretty(result)?;
    std::fs::write(path, json).with_context(|| format!("Failed to write {}", path.display()))
}

/// Entries in the record: list lengths summed, or the payload's field count
/// when it carries no list.
fn item_count(result: &ExtractionResult) -> usize {
    let lists: Vec<usize> = result
        .payload()
        .map(|payload| {
            payload
                .values()
                .filter_map(Value::as_array)
                .map(Vec::len)
                .collect()
        })
        .unwrap_or_default();
    if lists.is_empty() {
        result.payload().map_or(0, |p| p.len())
    } else {
        lists.iter().sum()
    }
}

/// `"{n}. {name} - ${price}"` for the first `limit` products.
fn product_lines(products: &[Value], limit: usize) -> Vec<String> {
    products
        .iter()
        .take(limit)
        .enumerate()
        .map(|(i, product)| {
            format!(
                "{}. {} - ${}",
                i + 1,
                display(product.get("name")),
                display(product.get("price"))
            )
        })
        .collect()
}

fn display(value: Option<&Value>) -> String {
    match value {
        Some(Value::String(s)) => s.clone(),
        Some(Value::Null) | None => "-".into(),
        Some(other) => other.to_string(),
    }
}
