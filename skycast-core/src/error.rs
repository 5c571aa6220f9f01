use thiserror::Error;

/// Everything a search or a favorites mutation can report back to the view.
///
/// None of these are fatal: the front end renders them and carries on.
#[derive(Debug, Error)]
pub enum AppError {
    /// Search submitted with no city text; no request was issued.
    #[error("Please enter a city")]
    EmptyInput,

    /// Network failure, unreadable body or a payload missing required fields.
    #[error("Error fetching weather")]
    Fetch(#[source] anyhow::Error),

    /// The service answered with a not-found status.
    #[error("{message}")]
    CityNotFound { message: String },

    /// A new favorite was requested while the list is already at capacity.
    /// Carries the current favorites so the caller can offer one to evict.
    #[error("Too many favorites; remove one of {} first", .favorites.join(", "))]
    FavoritesFull { favorites: Vec<String> },

    /// Favorite toggling is disabled until a city has been looked up.
    #[error("No city selected; look up a city before pinning it")]
    NoCitySelected,

    #[error("Failed to access favorites storage")]
    Storage(#[source] anyhow::Error),
}

impl AppError {
    pub fn is_favorites_full(&self) -> bool {
        matches!(self, AppError::FavoritesFull { .. })
    }
}
