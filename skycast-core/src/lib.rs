//! Core library for the `skycast` weather lookup client.
//!
//! This crate defines:
//! - Configuration handling
//! - The favorites store and its durable storage
//! - Fetching from the weather service and deriving the current/hourly/weekly views
//! - The controller that owns application state and emits change notifications
//!
//! It is used by `skycast-cli`, but any front end can drive a [`WeatherController`]
//! and redraw from its [`AppState`].

pub mod config;
pub mod controller;
pub mod error;
pub mod favorites;
pub mod forecast;
pub mod model;
pub mod provider;
pub mod state;
pub mod storage;

pub use config::{Config, Limits};
pub use controller::{Applied, RequestTicket, SearchRequest, WeatherController};
pub use error::AppError;
pub use favorites::{FavoritesStore, Toggled};
pub use forecast::{DailyItem, HourlyItem, WeatherView};
pub use model::{Lookup, WeatherPayload, WeatherSnapshot};
pub use provider::{HttpWeatherSource, WeatherSource};
pub use state::{AppState, Panel, Phase, StateChange, ToggleState};
pub use storage::{JsonFileStore, KeyValueStore, MemoryStore};
