use std::sync::Arc;

use clap::Parser;
use openvpn_authd::{
    api::{start_api_server, ApiState},
    cli::Cli,
    observability::{init_logging, log_config_info},
    secrets::{VaultHealthProbe, VaultPkiBackend},
    services::ProfileService,
    Config, Result, APP_NAME, VERSION,
};
use tracing::{error, info};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Must happen before any config is read from the environment
    cli.load_env_file()?;

    let config = Config::from_env()?;

    if cli.check_config {
        println!("{}", config.redacted_summary()?);
        return Ok(());
    }

    init_logging(&config.observability, cli.verbose)?;

    info!(app_name = APP_NAME, version = VERSION, "Starting openvpn-authd");
    log_config_info(&config);

    // Fail fast: never bind the listener without a Vault session.
    let backend = VaultPkiBackend::connect(&config.vault).await.inspect_err(|e| {
        error!(error = %e, vault_addr = %config.vault.address, "Unable to authenticate to Vault");
    })?;
    let health_probe = VaultHealthProbe::new(&config.vault)?;

    let profile_service = ProfileService::from_config(Arc::new(backend), &config)?;
    let state = ApiState::from_config(Arc::new(profile_service), Arc::new(health_probe), &config)?;

    start_api_server(&config.server, state).await
}
