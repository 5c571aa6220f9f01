use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use inquire::{
    CustomType, CustomUserError, InquireError, Select, Text, validator::Validation,
};
use skycast_core::{
    AppError, Config, FavoritesStore, JsonFileStore, StateChange, Toggled, WeatherController,
};
use std::{io, path::PathBuf};
use tokio::sync::broadcast;

use crate::render::{self, Renderer};

/// Top-level CLI struct.
#[derive(Debug, Parser)]
#[command(name = "skycast", version, about = "Weather lookup with pinned favorite cities")]
pub struct Cli {
    /// Use this config file instead of the platform default.
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Interactively edit the configuration file.
    Configure,

    /// Show current, hourly and weekly weather for a city.
    Show {
        city: String,

        /// Print the rendered view as JSON.
        #[arg(long)]
        json: bool,
    },

    /// Pin or unpin a city as a favorite.
    Favorite {
        city: String,

        /// When favorites are full, remove this city instead of asking.
        #[arg(long)]
        evict: Option<String>,
    },

    /// List pinned cities.
    Favorites,

    /// Interactive session: search, toggle favorites, reopen pinned cities.
    Browse,
}

impl Cli {
    pub async fn run(self) -> Result<()> {
        let config_path = match &self.config {
            Some(path) => path.clone(),
            None => Config::config_file_path()?,
        };
        let config = Config::load_from(&config_path)?;
        tracing::debug!(path = %config_path.display(), ?config, "loaded config");

        match self.command {
            Command::Configure => configure(config, &config_path),
            Command::Show { city, json } => show(&config, &city, json).await,
            Command::Favorite { city, evict } => favorite(&config, &city, evict.as_deref()).await,
            Command::Favorites => {
                let path = config.favorites_file_path()?;
                let capacity = config.limits.favorites_capacity;
                let store = FavoritesStore::load(Box::new(JsonFileStore::new(path)), capacity);
                println!("{}", render::favorites_bar(store.list()));
                Ok(())
            }
            Command::Browse => browse(&config).await,
        }
    }
}

fn configure(mut config: Config, path: &std::path::Path) -> Result<()> {
    config.endpoint = Text::new("Weather service endpoint:")
        .with_default(&config.endpoint)
        .prompt()?;
    config.icon_host = Text::new("Icon host:").with_default(&config.icon_host).prompt()?;
    config.request_timeout_secs = CustomType::<u64>::new("Request timeout (seconds):")
        .with_default(config.request_timeout_secs)
        .with_validator(|secs: &u64| {
            Ok::<_, CustomUserError>(if *secs == 0 {
                Validation::Invalid("Timeout must be at least 1 second".into())
            } else {
                Validation::Valid
            })
        })
        .prompt()?;
    config.limits.favorites_capacity = CustomType::<usize>::new("Maximum favorites:")
        .with_default(config.limits.favorites_capacity)
        .prompt()?;

    config.save_to(path)?;
    println!("Saved configuration to {}", path.display());
    Ok(())
}

async fn show(config: &Config, city: &str, json: bool) -> Result<()> {
    let mut ctl = WeatherController::from_config(config)?;

    match ctl.search(city).await {
        Ok(_) | Err(AppError::CityNotFound { .. }) => {}
        Err(err) => return Err(err.into()),
    }

    if json {
        let out = render::panel_json(ctl.state().panel()).context("Failed to serialize view")?;
        println!("{out}");
    } else {
        println!("{}", render::panel(ctl.state()));
    }
    Ok(())
}

async fn favorite(config: &Config, city: &str, evict: Option<&str>) -> Result<()> {
    let mut ctl = WeatherController::from_config(config)?;

    if let Err(err) = ctl.search(city).await {
        match err {
            AppError::CityNotFound { message } => {
                println!("{message}");
                return Ok(());
            }
            other => return Err(other.into()),
        }
    }

    let current = ctl.state().current_city().unwrap_or(city).to_string();
    match ctl.toggle_favorite() {
        Ok(Toggled::Added) => println!("Pinned {current}"),
        Ok(Toggled::Removed) => println!("Unpinned {current}"),
        Err(AppError::FavoritesFull { favorites }) => {
            let victim = match evict {
                Some(victim) => victim.to_string(),
                None => match pick_eviction(favorites)? {
                    Some(victim) => victim,
                    None => return Ok(()),
                },
            };
            ctl.evict_and_add(&victim)?;
            println!("Replaced {victim} with {current}");
        }
        Err(err) => return Err(err.into()),
    }

    println!("{}", render::favorites_bar(ctl.state().favorites().list()));
    Ok(())
}

const CANCEL: &str = "(cancel)";

/// Ask which favorite to drop. `None` means the user backed out.
fn pick_eviction(mut favorites: Vec<String>) -> Result<Option<String>> {
    favorites.push(CANCEL.to_string());
    let choice = Select::new("Too many favorites. Remove one to make room:", favorites).prompt();

    match choice {
        Ok(city) if city == CANCEL => Ok(None),
        Ok(city) => Ok(Some(city)),
        Err(InquireError::OperationCanceled) => Ok(None),
        Err(err) => Err(err.into()),
    }
}

const ACTION_SEARCH: &str = "Search a city";
const ACTION_TOGGLE: &str = "Toggle favorite";
const ACTION_OPEN: &str = "Open a favorite";
const ACTION_QUIT: &str = "Quit";

async fn browse(config: &Config) -> Result<()> {
    let mut ctl = WeatherController::from_config(config)?;
    let mut changes = ctl.subscribe();
    let mut renderer = Renderer::new(io::stdout());

    println!("{}", render::favorites_bar(ctl.state().favorites().list()));

    loop {
        let mut actions = vec![ACTION_SEARCH];
        if ctl.state().toggle_target().is_some() {
            actions.push(ACTION_TOGGLE);
        }
        if !ctl.state().favorites().list().is_empty() {
            actions.push(ACTION_OPEN);
        }
        actions.push(ACTION_QUIT);

        let action = match Select::new("What next?", actions).prompt() {
            Ok(action) => action,
            Err(InquireError::OperationCanceled | InquireError::OperationInterrupted) => break,
            Err(err) => return Err(err.into()),
        };

        let outcome = match action {
            ACTION_SEARCH => match Text::new("City:").prompt() {
                Ok(text) => search(&mut ctl, &mut changes, &mut renderer, &text).await,
                Err(InquireError::OperationCanceled) => Ok(()),
                Err(err) => return Err(err.into()),
            },
            ACTION_OPEN => {
                let favorites = ctl.state().favorites().list().to_vec();
                match Select::new("Favorite:", favorites).prompt() {
                    Ok(city) => search(&mut ctl, &mut changes, &mut renderer, &city).await,
                    Err(InquireError::OperationCanceled) => Ok(()),
                    Err(err) => return Err(err.into()),
                }
            }
            ACTION_TOGGLE => toggle(&mut ctl),
            _ => break,
        };

        if let Err(err) = outcome {
            report(&err);
        }
        renderer.apply(&drain(&mut changes), ctl.state())?;
    }

    Ok(())
}

/// Runs the two halves of a search with a redraw in between so "Loading" shows.
async fn search(
    ctl: &mut WeatherController,
    changes: &mut broadcast::Receiver<StateChange>,
    renderer: &mut Renderer<io::Stdout>,
    text: &str,
) -> Result<(), AppError> {
    let request = ctl.begin_search(text)?;
    if let Err(err) = renderer.apply(&drain(changes), ctl.state()) {
        tracing::warn!(error = %err, "failed to draw loading state");
    }

    let response = ctl.source().fetch(&request.city).await;
    ctl.complete_search(request.ticket, response).map(|_| ())
}

fn toggle(ctl: &mut WeatherController) -> Result<(), AppError> {
    match ctl.toggle_favorite() {
        Err(AppError::FavoritesFull { favorites }) => {
            let victim = match pick_eviction(favorites) {
                Ok(Some(victim)) => victim,
                Ok(None) => return Ok(()),
                Err(err) => {
                    tracing::warn!(error = %err, "eviction prompt failed");
                    return Ok(());
                }
            };
            ctl.evict_and_add(&victim)
        }
        other => other.map(|_| ()),
    }
}

fn drain(changes: &mut broadcast::Receiver<StateChange>) -> Vec<StateChange> {
    let mut out = Vec::new();
    loop {
        match changes.try_recv() {
            Ok(change) => out.push(change),
            Err(broadcast::error::TryRecvError::Lagged(skipped)) => {
                tracing::debug!(skipped, "renderer lagged behind state changes");
            }
            Err(_) => break,
        }
    }
    out
}

fn report(err: &AppError) {
    match err {
        // Shown inline in the weather panel.
        AppError::CityNotFound { .. } => {}
        AppError::Fetch(source) => {
            tracing::debug!(error = ?source, "fetch failed");
            eprintln!("{err}.");
        }
        other => eprintln!("{other}"),
    }
}
