// Copyright 2025, Offchain Labs, Inc.
// For licensing, see https://github.com/OffchainLabs/stylus-sdk-rs/blob/main/licenses/COPYRIGHT.md

//! Named network profiles.

use std::{collections::BTreeMap, time::Duration};

use reqwest::Url;

use crate::core::{
    config::{Config, ConfigError},
    credentials::CredentialRef,
};

/// Timeout for remote networks which do not configure one.
pub const DEFAULT_REMOTE_TIMEOUT: Duration = Duration::from_millis(20_000);

#[derive(Debug, thiserror::Error)]
pub enum ProfileError {
    #[error("unknown network profile '{0}'")]
    UnknownProfile(String),
    #[error("no default network profile is configured")]
    NoDefaultProfile,
}

/// Connection parameters for one network.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NetworkProfile {
    pub name: String,
    /// `None` selects the in-process simulated chain.
    pub endpoint: Option<Url>,
    pub accounts: Vec<CredentialRef>,
    pub timeout: Duration,
    pub is_default: bool,
    pub chain_id: Option<u64>,
}

impl NetworkProfile {
    pub fn is_local(&self) -> bool {
        self.endpoint.is_none()
    }
}

/// Holds every configured profile, exactly one of which is the default.
#[derive(Debug, Default)]
pub struct ProfileStore {
    profiles: BTreeMap<String, NetworkProfile>,
}

impl ProfileStore {
    pub fn from_config(config: &Config) -> Result<Self, ConfigError> {
        let mut profiles = BTreeMap::new();
        for (name, network) in &config.networks {
            let endpoint = match &network.url {
                Some(url) => {
                    let parsed = Url::parse(url)
                        .map_err(|_| ConfigError::InvalidUrl(name.clone(), url.clone()))?;
                    if !matches!(parsed.scheme(), "http" | "https") {
                        return Err(ConfigError::InvalidUrl(name.clone(), url.clone()));
                    }
                    Some(parsed)
                }
                None => None,
            };
            let accounts = network
                .accounts
                .iter()
                .map(|account| {
                    account
                        .parse::<CredentialRef>()
                        .map_err(|err| ConfigError::InvalidAccount {
                            network: name.clone(),
                            reason: err.to_string(),
                        })
                })
                .collect::<Result<Vec<_>, _>>()?;
            let timeout = match network.timeout_ms {
                Some(0) => return Err(ConfigError::InvalidTimeout(name.clone())),
                Some(ms) => Duration::from_millis(ms),
                None => DEFAULT_REMOTE_TIMEOUT,
            };
            profiles.insert(
                name.clone(),
                NetworkProfile {
                    name: name.clone(),
                    endpoint,
                    accounts,
                    timeout,
                    is_default: *name == config.default_network,
                    chain_id: network.chain_id,
                },
            );
        }
        Ok(Self { profiles })
    }

    /// Build a store directly from profiles, as used by tests and programmatic callers.
    pub fn new(profiles: impl IntoIterator<Item = NetworkProfile>) -> Self {
        Self {
            profiles: profiles
                .into_iter()
                .map(|profile| (profile.name.clone(), profile))
                .collect(),
        }
    }

    /// Look up a profile by name, or the default one when no name is given.
    pub fn resolve(&self, name: Option<&str>) -> Result<&NetworkProfile, ProfileError> {
        match name {
            Some(name) => self
                .profiles
                .get(name)
                .ok_or_else(|| ProfileError::UnknownProfile(name.to_string())),
            None => {
                let mut defaults = self.profiles.values().filter(|p| p.is_default);
                match (defaults.next(), defaults.next()) {
                    (Some(profile), None) => Ok(profile),
                    _ => Err(ProfileError::NoDefaultProfile),
                }
            }
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &NetworkProfile> {
        self.profiles.values()
    }
}
