use std::collections::BTreeMap;
use std::time::Duration;

use reqwest::blocking::{Client, RequestBuilder};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::RuntimeConfig;
use crate::model::{FavoriteCity, ValidationError, normalize_city, normalize_favorite_id};

pub trait FavoritesStore {
    fn fetch_all(&self) -> Result<Vec<FavoriteCity>, FavoritesError>;
    /// Returns the id assigned by the store.
    fn create(&self, name: &str) -> Result<String, FavoritesError>;
    fn delete(&self, id: &str) -> Result<(), FavoritesError>;
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum FavoritesError {
    #[error("favorites store is not configured: set FAVORITES_STORE_URL")]
    NotConfigured,
    #[error("{0}")]
    Validation(String),
    #[error("favorites transport error: {0}")]
    Transport(String),
    #[error("favorites store http error ({status}): {message}")]
    Http { status: u16, message: String },
    #[error("invalid favorites store response: {0}")]
    InvalidResponse(String),
}

impl From<ValidationError> for FavoritesError {
    fn from(value: ValidationError) -> Self {
        Self::Validation(value.to_string())
    }
}

#[derive(Debug, Serialize)]
struct NewFavorite<'a> {
    name: &'a str,
}

#[derive(Debug, Deserialize)]
struct StoredFavorite {
    name: String,
}

#[derive(Debug, Deserialize)]
struct CreatedFavorite {
    name: String,
}

/// Firebase-style REST collection: `<url>.json` and `<url>/<id>.json`.
#[derive(Debug, Clone)]
pub struct HttpFavoritesStore {
    client: Client,
    collection_url: String,
}

impl HttpFavoritesStore {
    pub fn new(collection_url: impl Into<String>, timeout: Duration) -> Result<Self, FavoritesError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|error| FavoritesError::Transport(error.to_string()))?;
        Ok(Self {
            client,
            collection_url: collection_url.into(),
        })
    }

    pub fn from_config(config: &RuntimeConfig) -> Result<Self, FavoritesError> {
        let url = config
            .favorites_url
            .as_deref()
            .ok_or(FavoritesError::NotConfigured)?;
        Self::new(url, Duration::from_secs(config.http_timeout_secs))
    }

    fn collection_endpoint(&self) -> String {
        format!("{}.json", self.collection_url)
    }

    fn item_endpoint(&self, id: &str) -> String {
        format!("{}/{id}.json", self.collection_url)
    }
}

impl FavoritesStore for HttpFavoritesStore {
    fn fetch_all(&self) -> Result<Vec<FavoriteCity>, FavoritesError> {
        let body = execute_request(self.client.get(self.collection_endpoint()))?;
        parse_collection(&body)
    }

    fn create(&self, name: &str) -> Result<String, FavoritesError> {
        let body = execute_request(
            self.client
                .post(self.collection_endpoint())
                .json(&NewFavorite { name }),
        )?;
        parse_created_id(&body)
    }

    fn delete(&self, id: &str) -> Result<(), FavoritesError> {
        execute_request(self.client.delete(self.item_endpoint(id)))?;
        Ok(())
    }
}

fn execute_request(request: RequestBuilder) -> Result<String, FavoritesError> {
    let response = request
        .send()
        .map_err(|error| FavoritesError::Transport(error.to_string()))?;
    let status = response.status();
    let body = response
        .text()
        .map_err(|error| FavoritesError::Transport(error.to_string()))?;

    if status.is_success() {
        return Ok(body);
    }

    let message = Some(body.trim())
        .filter(|value| !value.is_empty())
        .map(ToOwned::to_owned)
        .unwrap_or_else(|| {
            status
                .canonical_reason()
                .unwrap_or("request failed")
                .to_string()
        });
    Err(FavoritesError::Http {
        status: status.as_u16(),
        message,
    })
}

/// An empty collection comes back as `null`; entries are ordered by id.
fn parse_collection(body: &str) -> Result<Vec<FavoriteCity>, FavoritesError> {
    let payload: Option<BTreeMap<String, StoredFavorite>> = serde_json::from_str(body)
        .map_err(|error| FavoritesError::InvalidResponse(format!("collection payload: {error}")))?;

    Ok(payload
        .unwrap_or_default()
        .into_iter()
        .map(|(id, stored)| FavoriteCity {
            id: Some(id),
            name: stored.name,
        })
        .collect())
}

fn parse_created_id(body: &str) -> Result<String, FavoritesError> {
    let created: CreatedFavorite = serde_json::from_str(body)
        .map_err(|error| FavoritesError::InvalidResponse(format!("create payload: {error}")))?;
    let id = created.name.trim();
    if id.is_empty() {
        return Err(FavoritesError::InvalidResponse(
            "create payload: empty id".to_string(),
        ));
    }
    Ok(id.to_string())
}

/// Local mirror of the remote favorites list.
#[derive(Debug)]
pub struct FavoritesClient<S> {
    store: S,
    cities: Vec<FavoriteCity>,
}

impl<S: FavoritesStore> FavoritesClient<S> {
    pub fn new(store: S) -> Self {
        Self {
            store,
            cities: Vec::new(),
        }
    }

    /// Replaces the cache with the store contents; a failed load leaves it empty.
    pub fn load(&mut self) -> &[FavoriteCity] {
        self.cities = match self.store.fetch_all() {
            Ok(cities) => cities,
            Err(error) => {
                tracing::warn!(%error, "failed to load favorite cities");
                Vec::new()
            }
        };
        &self.cities
    }

    pub fn add(&mut self, name: &str) -> Result<FavoriteCity, FavoritesError> {
        let name = normalize_city(name)?;
        let id = self.store.create(&name).inspect_err(|error| {
            tracing::warn!(%error, city = %name, "failed to add favorite city");
        })?;

        let city = FavoriteCity { id: Some(id), name };
        self.cities.push(city.clone());
        Ok(city)
    }

    pub fn remove(&mut self, id: &str) -> Result<(), FavoritesError> {
        let id = normalize_favorite_id(id)?;
        self.store.delete(&id).inspect_err(|error| {
            tracing::warn!(%error, id = %id, "failed to remove favorite city");
        })?;

        self.cities.retain(|city| city.id.as_deref() != Some(id.as_str()));
        Ok(())
    }

    pub fn list(&self) -> &[FavoriteCity] {
        &self.cities
    }

    pub fn contains(&self, name: &str) -> bool {
        let name = name.trim();
        self.cities
            .iter()
            .any(|city| city.name.eq_ignore_ascii_case(name))
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use std::cell::RefCell;

    use super::*;

    /// In-memory store that can be told to fail.
    #[derive(Debug, Default)]
    pub struct MemoryStore {
        pub entries: RefCell<BTreeMap<String, String>>,
        pub next_id: RefCell<u32>,
        pub fail: RefCell<bool>,
    }

    impl MemoryStore {
        pub fn with_entries(entries: &[(&str, &str)]) -> Self {
            let store = Self::default();
            for (id, name) in entries {
                store
                    .entries
                    .borrow_mut()
                    .insert((*id).to_string(), (*name).to_string());
            }
            store
        }

        fn check(&self) -> Result<(), FavoritesError> {
            if *self.fail.borrow() {
                return Err(FavoritesError::Transport("connection refused".to_string()));
            }
            Ok(())
        }
    }

    impl FavoritesStore for MemoryStore {
        fn fetch_all(&self) -> Result<Vec<FavoriteCity>, FavoritesError> {
            self.check()?;
            Ok(self
                .entries
                .borrow()
                .iter()
                .map(|(id, name)| FavoriteCity {
                    id: Some(id.clone()),
                    name: name.clone(),
                })
                .collect())
        }

        fn create(&self, name: &str) -> Result<String, FavoritesError> {
            self.check()?;
            let mut next = self.next_id.borrow_mut();
            *next += 1;
            let id = format!("-N{:04}", *next);
            self.entries
                .borrow_mut()
                .insert(id.clone(), name.to_string());
            Ok(id)
        }

        fn delete(&self, id: &str) -> Result<(), FavoritesError> {
            self.check()?;
            self.entries.borrow_mut().remove(id);
            Ok(())
        }
    }
}
