mod provider;
mod savetiktok;
mod tikdown;
mod tikwm;
mod types;

pub use provider::{Provider, ProviderError};
pub use types::{Engagement, MediaReference};

use anyhow::Result;
use savetiktok::SavetiktokProvider;
use std::time::Duration;
use tikdown::TikdownProvider;
use tikwm::TikwmProvider;
use tracing::{info, warn};
use url::Url;

/// Hosts accepted as TikTok share links.
const SUPPORTED_HOSTS: [&str; 4] = [
    "vm.tiktok.com",
    "vt.tiktok.com",
    "www.tiktok.com",
    "tiktok.com",
];

/// Sweeps extraction providers in configured order until one yields a usable
/// media reference. Holds no state between calls.
pub struct Resolver {
    providers: Vec<Box<dyn Provider>>,
    attempt_timeout: Duration,
}

impl Resolver {
    /// Builds the provider chain from configured names. List order is the
    /// priority order; names outside the known set are rejected.
    pub fn new(names: &[String], attempt_timeout: Duration) -> Result<Self> {
        let mut providers: Vec<Box<dyn Provider>> = Vec::with_capacity(names.len());

        for name in names {
            providers.push(match name.as_str() {
                "tikdown" => Box::new(TikdownProvider::new(attempt_timeout)),
                "tikwm" => Box::new(TikwmProvider::new(attempt_timeout)),
                "savetiktok" => Box::new(SavetiktokProvider::new(attempt_timeout)),
                other => anyhow::bail!("Unknown provider in config: {}", other),
            });
        }

        if providers.is_empty() {
            anyhow::bail!("Provider list is empty");
        }

        Ok(Self {
            providers,
            attempt_timeout,
        })
    }

    #[cfg(test)]
    fn with_providers(providers: Vec<Box<dyn Provider>>, attempt_timeout: Duration) -> Self {
        Self {
            providers,
            attempt_timeout,
        }
    }

    pub fn is_supported_url(&self, url: &str) -> bool {
        let host = match Url::parse(url) {
            Ok(parsed) => match parsed.host_str() {
                Some(host) => host.to_string(),
                None => return false,
            },
            Err(_) => return false,
        };

        SUPPORTED_HOSTS
            .iter()
            .any(|domain| host == *domain || host.ends_with(&format!(".{domain}")))
    }

    /// Tries each provider once, in order, and returns the first usable
    /// reference. Provider failures are logged and masked; `None` means
    /// every provider was exhausted.
    pub async fn resolve(&self, url: &str) -> Option<MediaReference> {
        info!("Resolving media reference for URL: {}", url);

        for provider in &self.providers {
            let attempt = tokio::time::timeout(self.attempt_timeout, provider.fetch(url));

            match attempt.await {
                Ok(Ok(Some(reference))) if reference.is_usable() => {
                    info!("Resolved with provider {}", provider.name());
                    return Some(reference);
                }
                Ok(Ok(Some(_))) => {
                    warn!("{} returned a reference without a media URL", provider.name());
                }
                Ok(Ok(None)) => {
                    warn!("{} had no result for this URL", provider.name());
                }
                Ok(Err(e)) => {
                    warn!("{} failed: {}", provider.name(), e);
                }
                Err(_) => {
                    warn!(
                        "{} timed out after {:?}",
                        provider.name(),
                        self.attempt_timeout
                    );
                }
            }
        }

        None
    }
}
