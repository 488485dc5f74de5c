/// blogmesh - blog platform services
///
/// Runs the blog, comment, user and notification services and the API
/// gateway, either one per process or all together.
use blogmesh::{config::ServerConfig, context::AppContext, error::MeshResult, server};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[tokio::main]
async fn main() -> MeshResult<()> {
    // Load configuration
    let config = ServerConfig::from_env()?;

    // Initialize logging
    let filter = EnvFilter::try_new(&config.logging.level)
        .unwrap_or_else(|_| EnvFilter::new(blogmesh::config::DEFAULT_LOG_FILTER));
    let json = config.logging.json;
    tracing_subscriber::registry()
        .with(filter)
        .with(json.then(|| fmt::layer().json()))
        .with((!json).then(|| fmt::layer()))
        .init();

    // Print banner
    print_banner(&config);

    // Create application context
    let ctx = AppContext::new(config)?;

    // Start server
    server::serve(ctx).await?;

    Ok(())
}

fn print_banner(config: &ServerConfig) {
    println!(
        r#"
    __    __                                __
   / /_  / /___  ____ _____ ___  ___  _____/ /_
  / __ \/ / __ \/ __ `/ __ `__ \/ _ \/ ___/ __ \
 / /_/ / / /_/ / /_/ / / / / / /  __(__  ) / / /
/_.___/_/\____/\__, /_/ /_/ /_/\___/____/_/ /_/
              /____/

        Blog platform services v{} ({})
        "#,
        env!("CARGO_PKG_VERSION"),
        config.service.kind.as_str()
    );
}
