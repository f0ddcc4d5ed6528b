use tokio::io::{stdin, stdout};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use wgsl_debug::server::{DapServer, ServerError};

#[tokio::main]
async fn main() -> Result<(), ServerError> {
    // stdout carries the protocol
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "wgsl_debug=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let server = DapServer::new();
    server.run(stdin(), stdout()).await?;

    Ok(())
}
