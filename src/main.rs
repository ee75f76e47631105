mod compare;
mod content;
mod edit;
mod fs;
mod mime;
mod protocol;
mod sandbox;
mod server;
mod walk;

use anyhow::Result;

#[tokio::main]
async fn main() -> Result<()> {
	let config = server::load_config()?;
	server::init_tracing(&config);
	let result = server::run(config).await;
	opentelemetry::global::shutdown_tracer_provider();
	result
}
