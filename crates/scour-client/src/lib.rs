#[cfg(feature = "browser")]
pub mod browser_solver;
pub mod executor;
pub mod flaresolverr;
pub mod proxy_source;
pub mod user_agent;

#[cfg(feature = "browser")]
pub use browser_solver::{InteractiveConfig, InteractiveSolver};
pub use executor::{ExecutorConfig, RequestExecutor};
pub use flaresolverr::{FlareSolverr, FlareSolverrConfig};
pub use proxy_source::HttpProxySource;
pub use user_agent::Device;
