//! Translation manager
//!
//! Locale catalogs are JSON documents fetched per namespace from
//! `/locales/{locale}/{namespace}.json`. Keys are dotted paths into the
//! catalog, optionally prefixed with a namespace (`signup:steps.team`).
//! Lookups fall back to the fallback locale and finally to the key itself.
//! The chosen locale persists under `signupflow_locale`.

use async_trait::async_trait;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use thiserror::Error;

use crate::api::{ApiClient, ApiError};
use crate::config::I18nConfig;
use crate::storage::{keys, KeyValueStore, StorageError};

/// Translation errors
#[derive(Error, Debug)]
pub enum I18nError {
    #[error("Unsupported locale: {0}")]
    UnsupportedLocale(String),

    #[error("Failed to load {locale}/{namespace}: {message}")]
    Fetch {
        locale: String,
        namespace: String,
        message: String,
    },

    #[error("Catalog {locale}/{namespace} is not a JSON object")]
    InvalidCatalog { locale: String, namespace: String },

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),
}

pub type I18nResult<T> = Result<T, I18nError>;

/// Where catalogs come from
#[async_trait]
pub trait LocaleSource: Send + Sync {
    async fn fetch(&self, locale: &str, namespace: &str) -> I18nResult<Value>;
}

#[async_trait]
impl LocaleSource for ApiClient {
    async fn fetch(&self, locale: &str, namespace: &str) -> I18nResult<Value> {
        let path = format!(
            "/locales/{}/{}.json",
            urlencoding::encode(locale),
            urlencoding::encode(namespace)
        );
        self.public_get(&path).await.map_err(|e: ApiError| I18nError::Fetch {
            locale: locale.to_string(),
            namespace: namespace.to_string(),
            message: e.user_message(),
        })
    }
}

/// A piece of UI text tagged with a translation key
#[derive(Debug, Clone, PartialEq)]
pub struct KeyedText {
    pub key: String,
    pub text: String,
}

impl KeyedText {
    pub fn new(key: impl Into<String>) -> Self {
        let key = key.into();
        Self {
            text: key.clone(),
            key,
        }
    }
}

type Catalog = HashMap<String, Value>;

pub struct I18n {
    config: I18nConfig,
    source: Arc<dyn LocaleSource>,
    store: Arc<dyn KeyValueStore>,
    catalogs: HashMap<String, Catalog>,
    locale: String,
}

impl I18n {
    pub fn new(config: I18nConfig, source: Arc<dyn LocaleSource>, store: Arc<dyn KeyValueStore>) -> Self {
        let locale = config.default_locale.clone();
        Self {
            config,
            source,
            store,
            catalogs: HashMap::new(),
            locale,
        }
    }

    /// Current locale
    pub fn locale(&self) -> &str {
        &self.locale
    }

    pub fn is_supported(&self, locale: &str) -> bool {
        self.config.supported_locales.iter().any(|l| l == locale)
    }

    /// Stored locale if supported, otherwise the default
    pub fn preferred_locale(&self) -> String {
        match self.store.get_item(keys::SIGNUP_LOCALE) {
            Ok(Some(stored)) if self.is_supported(&stored) => stored,
            Ok(Some(stored)) => {
                tracing::warn!(locale = %stored, "Ignoring unsupported stored locale");
                self.config.default_locale.clone()
            }
            Ok(None) => self.config.default_locale.clone(),
            Err(e) => {
                tracing::warn!("Could not read stored locale: {}", e);
                self.config.default_locale.clone()
            }
        }
    }

    /// Load the preferred locale and the fallback locale
    pub async fn init(&mut self) -> I18nResult<()> {
        let fallback = self.config.fallback_locale.clone();
        self.load(&fallback).await?;

        let preferred = self.preferred_locale();
        self.load(&preferred).await?;
        self.locale = preferred;
        Ok(())
    }

    /// Switch locale, loading its catalogs first, and remember the choice
    pub async fn set_locale(&mut self, locale: &str) -> I18nResult<()> {
        self.load(locale).await?;
        self.store.set_item(keys::SIGNUP_LOCALE, locale)?;
        self.locale = locale.to_string();
        tracing::info!(locale, "Locale changed");
        Ok(())
    }

    /// Fetch every namespace of a locale.
    ///
    /// A namespace that fails to load is skipped; its keys fall back.
    pub async fn load(&mut self, locale: &str) -> I18nResult<()> {
        if !self.is_supported(locale) {
            return Err(I18nError::UnsupportedLocale(locale.to_string()));
        }
        if self.catalogs.contains_key(locale) {
            return Ok(());
        }

        let mut catalog = Catalog::new();
        for namespace in &self.config.namespaces {
            match self.source.fetch(locale, namespace).await {
                Ok(value) if value.is_object() => {
                    catalog.insert(namespace.clone(), value);
                }
                Ok(_) => {
                    let err = I18nError::InvalidCatalog {
                        locale: locale.to_string(),
                        namespace: namespace.clone(),
                    };
                    tracing::warn!("{}", err);
                }
                Err(e) => tracing::warn!("{}", e),
            }
        }

        tracing::debug!(locale, namespaces = catalog.len(), "Locale loaded");
        self.catalogs.insert(locale.to_string(), catalog);
        Ok(())
    }

    /// Translate a key; returns the key when no catalog has it
    pub fn t(&self, key: &str) -> String {
        self.lookup(key).unwrap_or_else(|| key.to_string())
    }

    /// Translate and substitute `{{name}}` placeholders
    pub fn t_with(&self, key: &str, vars: &[(&str, &str)]) -> String {
        interpolate(&self.t(key), vars)
    }

    /// Rewrite the text of every tagged node
    pub fn translate_all(&self, nodes: &mut [KeyedText]) {
        for node in nodes {
            if let Some(text) = self.lookup(&node.key) {
                node.text = text;
            }
        }
    }

    fn lookup(&self, key: &str) -> Option<String> {
        let (namespace, path) = match key.split_once(':') {
            Some((ns, path)) => (ns, path),
            None => (self.config.namespaces.first().map(String::as_str)?, key),
        };

        [self.locale.as_str(), self.config.fallback_locale.as_str()]
            .iter()
            .filter_map(|locale| self.catalogs.get(*locale))
            .filter_map(|catalog| catalog.get(namespace))
            .find_map(|root| resolve_path(root, path))
    }
}

fn resolve_path(root: &Value, path: &str) -> Option<String> {
    let mut node = root;
    for segment in path.split('.') {
        node = node.get(segment)?;
    }
    node.as_str().map(str::to_string)
}

/// Substitute `{{name}}` placeholders; unknown placeholders stay as-is
pub fn interpolate(template: &str, vars: &[(&str, &str)]) -> String {
    let mut out = template.to_string();
    for (name, value) in vars {
        out = out.replace(&format!("{{{{{}}}}}", name), value);
    }
    out
}
