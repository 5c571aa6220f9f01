//! One fetch-and-render cycle per search, plus favorite toggling for the city on display.
//!
//! Every search gets a ticket from a monotonic counter. A response is applied
//! only if its ticket is the most recent one issued, so a slow reply to an
//! earlier search can never overwrite a newer one.

use anyhow::Result;
use chrono::{Local, TimeZone};
use std::sync::Arc;
use tokio::sync::broadcast;

use crate::{
    config::{Config, Limits},
    error::AppError,
    favorites::{FavoritesStore, Toggled},
    forecast::WeatherView,
    model::{Lookup, WeatherPayload},
    provider::{HttpWeatherSource, WeatherSource},
    state::{AppState, Panel, Phase, StateChange},
    storage::JsonFileStore,
};

const CHANGE_CHANNEL_CAPACITY: usize = 64;

/// Identifies one issued search.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct RequestTicket(u64);

/// A validated search waiting for its response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchRequest {
    pub ticket: RequestTicket,
    pub city: String,
}

/// Outcome of handing a response to the controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Applied {
    /// The weather panel now shows the response.
    Rendered,
    /// A newer search was issued in the meantime; the response was dropped.
    Stale,
}

pub struct WeatherController<Tz: TimeZone = Local> {
    source: Arc<dyn WeatherSource>,
    state: AppState,
    limits: Limits,
    icon_host: String,
    tz: Tz,
    changes: broadcast::Sender<StateChange>,
}

impl WeatherController<Local> {
    pub fn new(source: Arc<dyn WeatherSource>, favorites: FavoritesStore, config: &Config) -> Self {
        Self::with_timezone(source, favorites, config, Local)
    }

    /// Wire up the HTTP source and file-backed favorites described by `config`.
    pub fn from_config(config: &Config) -> Result<Self> {
        let source = HttpWeatherSource::from_config(config)?;
        let storage = JsonFileStore::new(config.favorites_file_path()?);
        tracing::debug!(path = %storage.path().display(), "using favorites storage");

        let favorites = FavoritesStore::load(Box::new(storage), config.limits.favorites_capacity);
        Ok(Self::new(Arc::new(source), favorites, config))
    }
}

impl<Tz: TimeZone> WeatherController<Tz> {
    /// Like [`WeatherController::new`], but labels times in `tz` instead of the local zone.
    pub fn with_timezone(
        source: Arc<dyn WeatherSource>,
        favorites: FavoritesStore,
        config: &Config,
        tz: Tz,
    ) -> Self {
        let (changes, _) = broadcast::channel(CHANGE_CHANNEL_CAPACITY);
        Self {
            source,
            state: AppState::new(favorites),
            limits: config.limits,
            icon_host: config.icon_host.clone(),
            tz,
            changes,
        }
    }

    pub fn state(&self) -> &AppState {
        &self.state
    }

    /// Receive a [`StateChange`] for every mutation from now on.
    pub fn subscribe(&self) -> broadcast::Receiver<StateChange> {
        self.changes.subscribe()
    }

    /// Shared handle to the weather source, for running fetches outside the controller.
    pub fn source(&self) -> Arc<dyn WeatherSource> {
        Arc::clone(&self.source)
    }

    /// Look up `city_text` and render the result.
    pub async fn search(&mut self, city_text: &str) -> Result<Applied, AppError> {
        let request = self.begin_search(city_text)?;
        let response = self.source.fetch(&request.city).await;
        self.complete_search(request.ticket, response)
    }

    /// Validate input, issue a ticket and enter the loading phase. No I/O happens here.
    pub fn begin_search(&mut self, city_text: &str) -> Result<SearchRequest, AppError> {
        let city = city_text.trim();
        if city.is_empty() {
            return Err(AppError::EmptyInput);
        }

        self.state.latest_request += 1;
        let ticket = RequestTicket(self.state.latest_request);
        tracing::info!(city, ticket = ticket.0, "searching");

        self.set_phase(Phase::Loading);
        Ok(SearchRequest { ticket, city: city.to_string() })
    }

    /// Apply the response for `ticket`, unless a newer search has been issued since.
    ///
    /// On a transport or parse failure the previous panel stays as it was.
    pub fn complete_search(
        &mut self,
        ticket: RequestTicket,
        response: Result<WeatherPayload>,
    ) -> Result<Applied, AppError> {
        if ticket.0 != self.state.latest_request {
            tracing::debug!(
                ticket = ticket.0,
                latest = self.state.latest_request,
                "discarding stale weather response"
            );
            return Ok(Applied::Stale);
        }

        self.set_phase(Phase::Idle);

        let lookup = response.and_then(WeatherPayload::into_lookup).map_err(|err| {
            tracing::warn!(error = ?err, "weather fetch failed");
            AppError::Fetch(err)
        })?;

        match lookup {
            Lookup::NotFound { message } => {
                tracing::info!(%message, "city not found");
                self.state.panel = Panel::NotFound { message: message.clone() };
                self.notify(StateChange::Weather);
                self.notify(StateChange::FavoriteToggle);
                Err(AppError::CityNotFound { message })
            }
            Lookup::Found(snapshot) => {
                let view = WeatherView::build(&snapshot, &self.limits, &self.icon_host, &self.tz);
                tracing::info!(city = %snapshot.current.name, temp_c = view.current.temp_c, "weather rendered");

                self.state.current_city = Some(snapshot.current.name);
                self.state.panel = Panel::Weather(view);
                self.notify(StateChange::Weather);
                self.notify(StateChange::FavoriteToggle);
                Ok(Applied::Rendered)
            }
        }
    }

    /// Pin or unpin the city on display.
    pub fn toggle_favorite(&mut self) -> Result<Toggled, AppError> {
        let city = self.toggle_target()?;
        let toggled = self.state.favorites.toggle(&city)?;
        self.favorites_changed();
        Ok(toggled)
    }

    /// Resolve a full favorites list: drop `city_to_remove`, then pin the city on display.
    pub fn evict_and_add(&mut self, city_to_remove: &str) -> Result<(), AppError> {
        let city = self.toggle_target()?;
        self.state.favorites.evict_and_add(city_to_remove, &city)?;
        self.favorites_changed();
        Ok(())
    }

    fn toggle_target(&self) -> Result<String, AppError> {
        self.state
            .toggle_target()
            .map(str::to_string)
            .ok_or(AppError::NoCitySelected)
    }

    fn favorites_changed(&self) {
        self.notify(StateChange::Favorites);
        // Only the city on display can be mutated here, so its button always changes too.
        self.notify(StateChange::FavoriteToggle);
    }

    fn set_phase(&mut self, phase: Phase) {
        if self.state.phase != phase {
            self.state.phase = phase;
            self.notify(StateChange::Phase);
        }
    }

    fn notify(&self, change: StateChange) {
        // No subscribers is fine; the state is still readable directly.
        let _ = self.changes.send(change);
    }
}
