// src/services/shortener.rs - Business logic
use std::collections::BTreeSet;
use std::sync::Arc;

use async_trait::async_trait;
use futures_util::TryStreamExt;
use log::{debug, info, warn};

use crate::config::ShortenerConfig;
use crate::errors::{ServiceError, StoreError};
use crate::models::Mapping;
use crate::store::KeyValueStore;
use crate::utils::{HashCodeGenerator, UrlPolicy};
use crate::validations::validate_code;

type Result<T> = std::result::Result<T, ServiceError>;

/// Times a claim re-tries when the slot it lost to is gone on read-back
const MAX_CLAIM_ROUNDS: usize = 3;

/// Outcome of a create call
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Shortened {
    pub code: String,
    /// The normalized URL now stored under `code`
    pub url: String,
    /// `false` when the exact mapping already existed
    pub created: bool,
}

#[async_trait]
pub trait ShortenerServiceTrait {
    /// Maps `url` to `requested_code`, or to a code derived from the URL.
    async fn create(&self, url: &str, requested_code: Option<&str>) -> Result<Shortened>;

    /// Looks up the URL stored under `code`.
    async fn resolve(&self, code: &str) -> Result<String>;

    /// Every mapping, sorted by code.
    ///
    /// This walks the whole namespace and fetches each value: cost grows
    /// linearly with the number of mappings and there is no pagination.
    async fn list_all(&self) -> Result<Vec<Mapping>>;

    /// Whether `code` is mapped, without fetching the URL.
    async fn contains(&self, code: &str) -> Result<bool>;
}

/// Result of trying to put a URL into one slot
enum Claim {
    Created,
    Existing,
    Taken(String),
}

/// Shortening engine over an injected store handle.
///
/// Holds no mapping state; every guarantee about uniqueness comes from
/// [`KeyValueStore::set_if_absent`].
pub struct ShortenerService<S: KeyValueStore + ?Sized> {
    store: Arc<S>,
    key_prefix: String,
    policy: UrlPolicy,
    generator: HashCodeGenerator,
}

/// Service type shared by the HTTP layer
pub type SharedShortenerService = ShortenerService<dyn KeyValueStore>;

impl<S: KeyValueStore + ?Sized> ShortenerService<S> {
    pub fn new(store: Arc<S>, config: &ShortenerConfig) -> Self {
        Self {
            store,
            key_prefix: config.key_prefix.clone(),
            policy: UrlPolicy::from(config),
            generator: HashCodeGenerator::new(config.code_length, config.max_attempts),
        }
    }

    /// The underlying store, for health probes
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Applies the configured normalization to `url`
    pub fn normalize(&self, url: &str) -> Result<String> {
        self.policy.normalize(url)
    }

    fn key(&self, code: &str) -> String {
        format!("{}{}", self.key_prefix, code)
    }

    /// Writes `url` into the slot for `code` unless something is there.
    ///
    /// A failed write is followed by a read to tell "same URL" from "other
    /// URL". Only the successful write touches the store.
    async fn claim(&self, code: &str, url: &str) -> Result<Claim> {
        let key = self.key(code);

        for _ in 0..MAX_CLAIM_ROUNDS {
            if self.store.set_if_absent(&key, url).await? {
                return Ok(Claim::Created);
            }

            match self.store.get(&key).await? {
                Some(existing) if existing == url => return Ok(Claim::Existing),
                Some(existing) => return Ok(Claim::Taken(existing)),
                None => warn!("Key '{}' vanished between write and read-back, retrying", key),
            }
        }

        Err(StoreError::Unavailable(format!(
            "key '{}' kept vanishing after {} claim rounds",
            key, MAX_CLAIM_ROUNDS
        ))
        .into())
    }

    async fn create_with_code(&self, url: String, code: &str) -> Result<Shortened> {
        validate_code(code).map_err(|e| ServiceError::InvalidCode(format!("'{}': {}", code, e)))?;

        match self.claim(code, &url).await? {
            Claim::Created => {
                info!("Created mapping '{}' -> '{}'", code, url);
                Ok(Shortened {
                    code: code.to_string(),
                    url,
                    created: true,
                })
            }
            Claim::Existing => {
                debug!("Mapping '{}' -> '{}' already exists", code, url);
                Ok(Shortened {
                    code: code.to_string(),
                    url,
                    created: false,
                })
            }
            Claim::Taken(existing) => {
                debug!(
                    "Requested code '{}' is taken by '{}', refusing '{}'",
                    code, existing, url
                );
                Err(ServiceError::CodeConflict {
                    code: code.to_string(),
                    url,
                })
            }
        }
    }

    async fn create_with_generated_code(&self, url: String) -> Result<Shortened> {
        let mut attempts = 0;

        for candidate in self.generator.candidates(&url) {
            attempts += 1;

            match self.claim(&candidate, &url).await? {
                Claim::Created => {
                    info!("Created mapping '{}' -> '{}'", candidate, url);
                    return Ok(Shortened {
                        code: candidate,
                        url,
                        created: true,
                    });
                }
                Claim::Existing => {
                    debug!("Mapping '{}' -> '{}' already exists", candidate, url);
                    return Ok(Shortened {
                        code: candidate,
                        url,
                        created: false,
                    });
                }
                Claim::Taken(existing) => {
                    debug!(
                        "Candidate '{}' for '{}' collides with '{}', lengthening",
                        candidate, url, existing
                    );
                }
            }
        }

        warn!(
            "No free code for '{}' after {} attempts (limit {})",
            url,
            attempts,
            self.generator.max_attempts()
        );
        Err(ServiceError::CodeGenerationExhausted { url, attempts })
    }
}

#[async_trait]
impl<S: KeyValueStore + ?Sized> ShortenerServiceTrait for ShortenerService<S> {
    async fn create(&self, url: &str, requested_code: Option<&str>) -> Result<Shortened> {
        let url = self.policy.normalize(url)?;

        match requested_code.map(str::trim).filter(|code| !code.is_empty()) {
            Some(code) => self.create_with_code(url, code).await,
            None => self.create_with_generated_code(url).await,
        }
    }

    async fn resolve(&self, code: &str) -> Result<String> {
        self.store
            .get(&self.key(code))
            .await?
            .ok_or_else(|| ServiceError::NotFound(code.to_string()))
    }

    async fn list_all(&self) -> Result<Vec<Mapping>> {
        let mut keys = self.store.scan_keys(&self.key_prefix);

        // A scan may repeat keys; the set also yields them in code order
        let mut codes = BTreeSet::new();
        while let Some(key) = keys.try_next().await? {
            match key.strip_prefix(self.key_prefix.as_str()) {
                Some(code) if !code.is_empty() => {
                    codes.insert(code.to_string());
                }
                _ => debug!("Ignoring key '{}' outside the mapping namespace", key),
            }
        }

        let mut mappings = Vec::with_capacity(codes.len());
        for code in codes {
            match self.store.get(&self.key(&code)).await? {
                Some(url) => mappings.push(Mapping { code, url }),
                None => debug!("Key for '{}' disappeared during listing", code),
            }
        }

        debug!("Listed {} mappings", mappings.len());
        Ok(mappings)
    }

    async fn contains(&self, code: &str) -> Result<bool> {
        Ok(self.store.exists(&self.key(code)).await?)
    }
}
