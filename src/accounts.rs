//! Hosting-service logins read from a TOML accounts file.
//!
//! Each table is named after a hosting service and holds either a single
//! `login`/`password` pair or numbered pairs (`login1`/`password1`, ...):
//!
//! ```toml
//! [github]
//! login1 = "casics-bot"
//! password1 = "..."
//! login2 = "casics-crawler"
//! password2 = "..."
//! ```

use crate::credentials::Secret;
use crate::error::CasicsError;
use figment::{
    Figment,
    providers::{Format, Toml},
};
use std::collections::BTreeMap;
use std::path::Path;
use tracing::warn;

type Section = BTreeMap<String, String>;

#[derive(Debug, Clone, Default)]
pub struct ServiceAccounts {
    sections: BTreeMap<String, Section>,
}

impl ServiceAccounts {
    pub fn load(path: &Path) -> Result<Self, CasicsError> {
        if !path.is_file() {
            return Err(CasicsError::Io(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                format!("file \"{}\" not found", path.display()),
            )));
        }
        let sections = Figment::from(Toml::file(path)).extract()?;
        Ok(Self { sections })
    }

    pub fn from_toml_str(data: &str) -> Result<Self, CasicsError> {
        let sections = Figment::from(Toml::string(data)).extract()?;
        Ok(Self { sections })
    }

    pub fn get(&self, section: &str, key: &str) -> Option<&str> {
        self.sections.get(section)?.get(key).map(String::as_str)
    }

    /// All `(key, value)` pairs of a section, sorted by key.
    pub fn items(&self, section: &str) -> Option<Vec<(&str, &str)>> {
        self.sections.get(section).map(|s| {
            s.iter()
                .map(|(k, v)| (k.as_str(), v.as_str()))
                .collect()
        })
    }

    /// Look up a login for `section`. With an account name, the matching
    /// `loginN` entry and its `passwordN` are returned; without one, the
    /// first numbered pair or else the plain `login`/`password` pair.
    pub fn login(
        &self,
        section: &str,
        account: Option<&str>,
    ) -> Result<(String, Secret), CasicsError> {
        let Some(entries) = self.sections.get(section) else {
            warn!("section {} not present in accounts file", section);
            return Err(CasicsError::MissingLogin(section.to_string()));
        };

        match account {
            Some(account) => {
                let index = entries
                    .iter()
                    .find(|(k, v)| k.starts_with("login") && v.as_str() == account)
                    .map(|(k, _)| &k["login".len()..])
                    .ok_or_else(|| CasicsError::AccountNotFound {
                        account: account.to_string(),
                        section: section.to_string(),
                    })?;
                let password = entries
                    .get(&format!("password{index}"))
                    .ok_or_else(|| CasicsError::MissingLogin(section.to_string()))?;
                Ok((account.to_string(), Secret::new(password.as_str())))
            }
            None => {
                let pair = |login: &str, password: &str| {
                    Some((entries.get(login)?, entries.get(password)?))
                };
                let (login, password) = pair("login1", "password1")
                    .or_else(|| pair("login", "password"))
                    .ok_or_else(|| CasicsError::MissingLogin(section.to_string()))?;
                Ok((login.clone(), Secret::new(password.as_str())))
            }
        }
    }
}
