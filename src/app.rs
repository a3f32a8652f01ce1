//! Application Context
//!
//! Owns the shared handles every screen needs: configuration, the key/value
//! store, the session, the API client and the toast queue. Components receive
//! what they need from here instead of reaching for globals.

use async_trait::async_trait;
use chrono::{Duration, Utc};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use crate::api::{
    AnalyticsSummary, ApiClient, ApiError, ApiResult, Broadcast, Event, Invitation, OnboardingProgress, Person,
    Plan, Solution, Subscription, Team,
};
use crate::config::Config;
use crate::i18n::I18n;
use crate::notify::Toasts;
use crate::recurrence::{PreviewController, PreviewSettings};
use crate::router::{Router, View, ViewLoader};
use crate::session::{SessionManager, User};
use crate::storage::{FileStore, KeyValueStore, MemoryStore, StorageResult};
use crate::views::{BroadcastComposer, FeatureUnlocks};

/// Days of events shown on the dashboard
const DASHBOARD_DAYS: i64 = 7;

/// Days of events shown on the schedule
const SCHEDULE_DAYS: i64 = 30;

/// Shared handles for one running client
#[derive(Clone)]
pub struct AppContext {
    pub config: Arc<Config>,
    pub store: Arc<dyn KeyValueStore>,
    pub session: SessionManager,
    pub api: ApiClient,
    pub toasts: Toasts,
}

impl AppContext {
    /// Build a context around an existing store
    pub fn with_store(config: Config, store: Arc<dyn KeyValueStore>) -> ApiResult<Self> {
        let session = SessionManager::new(store.clone());
        let api = ApiClient::new(&config.api, session.clone())?;
        Ok(Self {
            config: Arc::new(config),
            store,
            session,
            api,
            toasts: Toasts::new(),
        })
    }

    /// Context persisted in the configured data directory
    pub fn open(config: Config) -> ApiResult<Self> {
        let store = FileStore::open(config.storage.store_path())?;
        tracing::debug!(path = %store.path().display(), "Opened key/value store");
        Self::with_store(config, Arc::new(store))
    }

    /// Context that forgets everything on exit
    pub fn in_memory(config: Config) -> ApiResult<Self> {
        Self::with_store(config, Arc::new(MemoryStore::new()))
    }

    /// Router whose views load through the API client
    pub fn router(&self) -> (Router, Arc<ApiViewLoader>) {
        let loader = Arc::new(ApiViewLoader::new(self.api.clone()));
        let router = Router::new(
            self.session.clone(),
            Arc::new(self.api.clone()),
            loader.clone(),
            self.toasts.clone(),
        );
        (router, loader)
    }

    pub fn preview_controller(&self) -> PreviewController {
        PreviewController::new(
            Arc::new(self.api.clone()),
            PreviewSettings::from(&self.config.recurring),
        )
    }

    pub fn broadcast_composer(&self) -> BroadcastComposer {
        BroadcastComposer::new(&self.config.sms)
    }

    pub fn feature_unlocks(&self) -> FeatureUnlocks {
        FeatureUnlocks::new(self.store.clone())
    }

    pub fn i18n(&self) -> I18n {
        I18n::new(self.config.i18n.clone(), Arc::new(self.api.clone()), self.store.clone())
    }

    /// Toggle the `debug` store flag
    pub fn set_debug(&self, enabled: bool) -> StorageResult<()> {
        if enabled {
            self.store.set_item(crate::storage::keys::DEBUG, "true")
        } else {
            self.store.remove_item(crate::storage::keys::DEBUG)
        }
    }
}

/// Data fetched for a view
#[derive(Debug, Clone, PartialEq)]
pub enum ViewData {
    Dashboard {
        upcoming: Vec<Event>,
        solutions: Vec<Solution>,
    },
    Schedule(Vec<Event>),
    Events(Vec<Event>),
    People(Vec<Person>),
    Teams(Vec<Team>),
    Solutions(Vec<Solution>),
    Invitations(Vec<Invitation>),
    Messages {
        recipients: Vec<Person>,
        history: Vec<Broadcast>,
    },
    Billing {
        plans: Vec<Plan>,
        subscription: Subscription,
    },
    Analytics(AnalyticsSummary),
    Onboarding(OnboardingProgress),
    Settings(User),
}

/// Loads view data through the API and keeps the latest result per view
pub struct ApiViewLoader {
    api: ApiClient,
    loaded: Mutex<HashMap<View, ViewData>>,
}

impl ApiViewLoader {
    pub fn new(api: ApiClient) -> Self {
        Self {
            api,
            loaded: Mutex::new(HashMap::new()),
        }
    }

    /// Data from the most recent load of `view`
    pub fn data(&self, view: View) -> Option<ViewData> {
        self.loaded.lock().ok()?.get(&view).cloned()
    }

    async fn fetch(&self, view: View) -> ApiResult<ViewData> {
        let api = &self.api;
        let now = Utc::now();
        Ok(match view {
            View::Dashboard => ViewData::Dashboard {
                upcoming: api
                    .list_events(Some(now), Some(now + Duration::days(DASHBOARD_DAYS)))
                    .await?,
                solutions: api.list_solutions().await?,
            },
            View::Schedule => ViewData::Schedule(
                api.list_events(Some(now), Some(now + Duration::days(SCHEDULE_DAYS)))
                    .await?,
            ),
            View::Events => ViewData::Events(api.list_events(None, None).await?),
            View::People => ViewData::People(api.list_people().await?),
            View::Teams => ViewData::Teams(api.list_teams().await?),
            View::Solutions => ViewData::Solutions(api.list_solutions().await?),
            View::Invitations => ViewData::Invitations(api.list_invitations().await?),
            View::Messages => ViewData::Messages {
                recipients: api.list_sms_recipients().await?,
                history: api.list_broadcasts().await?,
            },
            View::Billing => ViewData::Billing {
                plans: api.list_plans().await?,
                subscription: api.get_subscription().await?,
            },
            View::Analytics => ViewData::Analytics(api.analytics_summary("30d").await?),
            View::Onboarding => ViewData::Onboarding(match api.get_onboarding_progress().await {
                // No progress recorded yet: the wizard starts fresh
                Err(ApiError::Status { status: 404, .. }) => OnboardingProgress::default(),
                other => other?,
            }),
            View::Settings => ViewData::Settings(api.me().await?),
        })
    }
}

#[async_trait]
impl ViewLoader for ApiViewLoader {
    async fn load(&self, view: View) -> ApiResult<()> {
        let data = self.fetch(view).await?;
        if let Ok(mut loaded) = self.loaded.lock() {
            loaded.insert(view, data);
        }
        Ok(())
    }
}
