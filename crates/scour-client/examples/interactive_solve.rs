/// Manual check for `InteractiveSolver`.
///
/// Opens a visible Chromium window on the given URL (default: a Cloudflare
/// challenge demo) and prints the page once the challenge is gone.
///
/// Run with:
///   cargo run -p scour-client --example interactive_solve --features browser -- <url>
use std::time::Duration;

use scour_client::{InteractiveConfig, InteractiveSolver};
use scour_core::traits::CaptchaSolver;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt().with_env_filter("info").init();

    let url = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "https://nowsecure.nl".to_string());

    let solver = InteractiveSolver::new(
        InteractiveConfig::default().with_timeout(Duration::from_secs(120)),
    );
    let html = solver.solve(&url).await?;

    println!("OK: got {} bytes once the challenge cleared", html.len());
    println!("First 300 chars:\n{}", &html[..html.len().min(300)]);
    Ok(())
}
