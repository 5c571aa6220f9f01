//! Application state owned by the controller, and the notifications it emits.

use crate::{favorites::FavoritesStore, forecast::WeatherView};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Phase {
    #[default]
    Idle,
    Loading,
}

/// What the weather area currently shows.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Panel {
    /// Nothing looked up yet.
    #[default]
    Empty,
    /// The service did not know the city; only its message is shown.
    NotFound { message: String },
    Weather(WeatherView),
}

/// Visual state of the favorite button.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToggleState {
    Disabled,
    Off,
    On,
}

/// Which part of the state changed; the view redraws that part from [`AppState`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StateChange {
    Phase,
    Weather,
    Favorites,
    FavoriteToggle,
}

#[derive(Debug)]
pub struct AppState {
    pub(crate) phase: Phase,
    pub(crate) current_city: Option<String>,
    pub(crate) panel: Panel,
    pub(crate) favorites: FavoritesStore,
    pub(crate) latest_request: u64,
}

impl AppState {
    pub fn new(favorites: FavoritesStore) -> Self {
        Self {
            phase: Phase::Idle,
            current_city: None,
            panel: Panel::Empty,
            favorites,
            latest_request: 0,
        }
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// Service-reported name of the city on display, if any lookup has succeeded.
    pub fn current_city(&self) -> Option<&str> {
        self.current_city.as_deref()
    }

    pub fn panel(&self) -> &Panel {
        &self.panel
    }

    pub fn favorites(&self) -> &FavoritesStore {
        &self.favorites
    }

    /// The city the favorite button acts on: only set while weather data is on display.
    pub fn toggle_target(&self) -> Option<&str> {
        match self.panel {
            Panel::Weather(_) => self.current_city(),
            _ => None,
        }
    }

    pub fn toggle_state(&self) -> ToggleState {
        match self.toggle_target() {
            None => ToggleState::Disabled,
            Some(city) if self.favorites.is_favorite(city) => ToggleState::On,
            Some(_) => ToggleState::Off,
        }
    }
}
