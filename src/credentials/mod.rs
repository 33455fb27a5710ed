//! Database credentials kept in a per-user keyring.
//!
//! A keyring only maps `(ring, field)` to a string, but we need to keep a
//! user name, password, host and port together without knowing the user
//! name in advance. Each value is therefore stored under a fixed pseudo
//! field name: `username`, `password`, `host` and `port`.

pub mod keyring;
pub mod prompt;
pub mod secret;

pub use keyring::{MemoryKeyring, SecretStore, SqliteKeyring};
pub use prompt::{Prompter, ScriptedPrompter, TerminalPrompter};
pub use secret::Secret;

use crate::error::CasicsError;
use tracing::{debug, info};

pub const USERNAME_FIELD: &str = "username";
pub const PASSWORD_FIELD: &str = "password";
pub const HOST_FIELD: &str = "host";
pub const PORT_FIELD: &str = "port";

/// A complete set of database login details.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credentials {
    pub user: String,
    pub password: Secret,
    pub host: String,
    pub port: u16,
}

/// Any subset of the login details, as held in a keyring or given by a caller.
/// Empty strings count as absent.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PartialCredentials {
    pub user: Option<String>,
    pub password: Option<Secret>,
    pub host: Option<String>,
    pub port: Option<String>,
}

impl PartialCredentials {
    fn user(&self) -> Option<&str> {
        non_empty(self.user.as_deref())
    }

    fn password(&self) -> Option<&str> {
        non_empty(self.password.as_ref().map(Secret::expose))
    }

    fn host(&self) -> Option<&str> {
        non_empty(self.host.as_deref())
    }

    fn port(&self) -> Option<&str> {
        non_empty(self.port.as_deref())
    }

    /// All four values are present, so no keyring or prompt is needed.
    pub fn complete(&self) -> Option<Credentials> {
        Some(Credentials {
            user: self.user()?.to_string(),
            password: Secret::new(self.password()?),
            host: self.host()?.to_string(),
            port: parse_port(self.port()?).ok()?,
        })
    }
}

impl From<&Credentials> for PartialCredentials {
    fn from(c: &Credentials) -> Self {
        Self {
            user: Some(c.user.clone()),
            password: Some(c.password.clone()),
            host: Some(c.host.clone()),
            port: Some(c.port.to_string()),
        }
    }
}

/// Fallbacks offered when the user leaves host or port blank.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerDefaults {
    pub host: String,
    pub port: u16,
}

impl ServerDefaults {
    pub fn from_config(cfg: &crate::config::Config) -> Self {
        Self {
            host: cfg.default_host.clone(),
            port: cfg.default_port,
        }
    }
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.is_empty())
}

fn parse_port(value: &str) -> Result<u16, CasicsError> {
    value
        .trim()
        .parse::<u16>()
        .ok()
        .filter(|p| *p != 0)
        .ok_or_else(|| CasicsError::InvalidPort(value.to_string()))
}

/// Look up the credentials stored in `ring`. A given `user` replaces the
/// stored user name.
pub async fn get_keyring_credentials<S: SecretStore>(
    store: &S,
    ring: &str,
    user: Option<&str>,
) -> Result<PartialCredentials, CasicsError> {
    let user = match non_empty(user) {
        Some(u) => Some(u.to_string()),
        None => store.get(ring, USERNAME_FIELD).await?,
    };
    Ok(PartialCredentials {
        user,
        password: store.get(ring, PASSWORD_FIELD).await?.map(Secret::from),
        host: store.get(ring, HOST_FIELD).await?,
        port: store.get(ring, PORT_FIELD).await?,
    })
}

/// Store all four values in `ring`; the port is kept as decimal text.
pub async fn save_keyring_credentials<S: SecretStore>(
    store: &S,
    ring: &str,
    creds: &Credentials,
) -> Result<(), CasicsError> {
    store.set(ring, USERNAME_FIELD, &creds.user).await?;
    store
        .set(ring, PASSWORD_FIELD, creds.password.expose())
        .await?;
    store.set(ring, HOST_FIELD, &creds.host).await?;
    store.set(ring, PORT_FIELD, &creds.port.to_string()).await?;
    debug!(ring, user = %creds.user, "credentials saved to keyring");
    Ok(())
}

/// Fill in each value from, in order: `overrides`, the keyring (when a store
/// and ring are given), and finally the prompter.
pub async fn obtain_credentials<S, P>(
    keyring: Option<(&S, &str)>,
    prompter: &P,
    db_label: &str,
    overrides: &PartialCredentials,
    defaults: &ServerDefaults,
) -> Result<Credentials, CasicsError>
where
    S: SecretStore,
    P: Prompter + ?Sized,
{
    let stored = match keyring {
        Some((store, ring)) => get_keyring_credentials(store, ring, None).await?,
        None => PartialCredentials::default(),
    };

    let host = match overrides.host().or(stored.host()) {
        Some(h) => h.to_string(),
        None => prompter.ask(&format!(
            "{db_label} host (default: {}): ",
            defaults.host
        ))?,
    };
    let host = if host.trim().is_empty() {
        defaults.host.clone()
    } else {
        host.trim().to_string()
    };

    let port = match overrides.port().or(stored.port()) {
        Some(p) => parse_port(p)?,
        None => {
            let answer = prompter.ask(&format!(
                "{db_label} port (default: {}): ",
                defaults.port
            ))?;
            if answer.trim().is_empty() {
                defaults.port
            } else {
                parse_port(&answer)?
            }
        }
    };

    let user = match overrides.user().or(stored.user()) {
        Some(u) => u.to_string(),
        None => prompter.ask(&format!("{db_label} user name: "))?,
    };
    if user.trim().is_empty() {
        return Err(CasicsError::MissingCredential(USERNAME_FIELD));
    }

    let password = match overrides.password().or(stored.password()) {
        Some(p) => Secret::new(p),
        None => Secret::new(prompter.ask_secret("Password: ")?),
    };
    if password.is_empty() {
        return Err(CasicsError::MissingCredential(PASSWORD_FIELD));
    }

    Ok(Credentials {
        user: user.trim().to_string(),
        password,
        host,
        port,
    })
}

/// Resolve credentials for `ring` and, when `save` is set, write them back
/// if anything differs from what the keyring already holds. Complete
/// overrides bypass the keyring entirely.
pub async fn acquire<S, P>(
    store: &S,
    ring: &str,
    prompter: &P,
    db_label: &str,
    overrides: &PartialCredentials,
    defaults: &ServerDefaults,
    save: bool,
) -> Result<Credentials, CasicsError>
where
    S: SecretStore,
    P: Prompter + ?Sized,
{
    if let Some(creds) = overrides.complete() {
        return Ok(creds);
    }

    let creds =
        obtain_credentials(Some((store, ring)), prompter, db_label, overrides, defaults).await?;

    if save {
        let stored = get_keyring_credentials(store, ring, None).await?;
        if stored != PartialCredentials::from(&creds) {
            save_keyring_credentials(store, ring, &creds).await?;
            info!(ring, host = %creds.host, port = creds.port, "keyring updated");
        }
    }
    Ok(creds)
}
