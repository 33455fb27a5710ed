use casics_common::config::CONFIG;
use casics_common::credentials::{
    PartialCredentials, ServerDefaults, SqliteKeyring, TerminalPrompter, acquire,
};
use casics_common::db::connection::DB_LABEL;
use casics_common::logging::{Logger, LoggerOptions};
use mimalloc::MiMalloc;
use tracing::info;

#[global_allocator]
static GLOBAL: MiMalloc = MiMalloc;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();

    let cfg = &*CONFIG;

    let logger = Logger::init(LoggerOptions {
        name: Some("casics-credentials".to_string()),
        file: cfg.log_file.clone(),
        console: cfg.log_console,
        level: cfg.loglevel.clone(),
    })?;

    info!(
        keyring_url = %cfg.keyring_url,
        keyring_name = %cfg.keyring_name,
        log_file = %logger.log_file().display(),
        version = casics_common::VERSION
    );

    let keyring = SqliteKeyring::connect(&cfg.keyring_url).await?;
    let creds = acquire(
        &keyring,
        &cfg.keyring_name,
        &TerminalPrompter,
        DB_LABEL,
        &PartialCredentials::default(),
        &ServerDefaults::from_config(cfg),
        true,
    )
    .await?;

    casics_common::messages::msg(format!(
        "Credentials for {}@{}:{} stored in keyring \"{}\".",
        creds.user, creds.host, creds.port, cfg.keyring_name
    ));
    Ok(())
}
