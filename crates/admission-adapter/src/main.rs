use std::sync::Arc;

use admission_adapter::{
    cli, config::Config, tracing::setup_tracing, webhook::FixedVerdict, AdmissionServer,
};
use anyhow::Result;

#[tokio::main]
async fn main() -> Result<()> {
    let matches = cli::build_cli().get_matches();
    let config = Config::from_args(&matches)?;

    setup_tracing(&config.log_level, &config.log_fmt, config.log_no_color)?;

    let webhook = Arc::new(FixedVerdict::new(config.verdict));
    AdmissionServer::new(config, webhook).run().await
}
