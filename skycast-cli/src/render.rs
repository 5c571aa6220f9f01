//! Text rendering of [`AppState`]. Everything here reads state; nothing mutates it.

use std::io::{self, Write};

use skycast_core::{AppState, DailyItem, HourlyItem, Panel, Phase, StateChange, ToggleState};

pub fn toggle_button(state: ToggleState) -> &'static str {
    match state {
        ToggleState::Disabled => "",
        ToggleState::Off => "☆ not a favorite",
        ToggleState::On => "★ favorite",
    }
}

pub fn favorites_bar(favorites: &[String]) -> String {
    if favorites.is_empty() {
        return "Favorites: (none)".to_string();
    }
    let tags: Vec<String> = favorites.iter().map(|c| format!("[{c}]")).collect();
    format!("Favorites: {}", tags.join(" "))
}

pub fn hourly_strip(items: &[HourlyItem]) -> String {
    items
        .iter()
        .map(|i| format!("{:>5} {:>4}°C", i.label, i.temp_c))
        .collect::<Vec<_>>()
        .join(" |")
}

pub fn weekly_list(items: &[DailyItem]) -> String {
    items
        .iter()
        .map(|d| format!("{:<10} {:<7} {:>4}°C", d.weekday, d.date, d.temp_c))
        .collect::<Vec<_>>()
        .join("\n")
}

/// The weather area plus the favorite button, as one block.
pub fn panel(state: &AppState) -> String {
    match state.panel() {
        Panel::Empty => "Search for a city to see its weather.".to_string(),
        Panel::NotFound { message } => message.clone(),
        Panel::Weather(view) => {
            let current = &view.current;
            let mut out = format!(
                "{}  {}\n{}°C, {}\nicon: {}\n",
                current.city,
                toggle_button(state.toggle_state()),
                current.temp_c,
                current.description,
                current.icon_url,
            );
            out.push_str("\nHourly\n");
            out.push_str(&hourly_strip(&view.hourly));
            out.push_str("\n\nThis week\n");
            out.push_str(&weekly_list(&view.weekly));
            out
        }
    }
}

/// Machine-readable form of the weather area for `show --json`.
pub fn panel_json(panel: &Panel) -> serde_json::Result<String> {
    match panel {
        Panel::Weather(view) => serde_json::to_string_pretty(view),
        Panel::NotFound { message } => {
            serde_json::to_string_pretty(&serde_json::json!({ "not_found": message }))
        }
        Panel::Empty => Ok("null".to_string()),
    }
}

/// Redraws the parts of the screen named by incoming [`StateChange`]s.
pub struct Renderer<W: Write> {
    out: W,
}

impl<W: Write> Renderer<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }

    pub fn apply(&mut self, changes: &[StateChange], state: &AppState) -> io::Result<()> {
        if changes.contains(&StateChange::Phase) && state.phase() == Phase::Loading {
            writeln!(self.out, "Loading...")?;
        }

        if changes.contains(&StateChange::Weather) {
            writeln!(self.out, "\n{}\n", panel(state))?;
        } else if changes.contains(&StateChange::FavoriteToggle) {
            let button = toggle_button(state.toggle_state());
            if !button.is_empty() {
                writeln!(self.out, "{button}")?;
            }
        }

        if changes.contains(&StateChange::Favorites) {
            writeln!(self.out, "{}", favorites_bar(state.favorites().list()))?;
        }

        self.out.flush()
    }

    #[cfg(test)]
    pub fn into_inner(self) -> W {
        self.out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn favorites_bar_lists_tags_in_order() {
        let favs = vec!["Paris".to_string(), "London".to_string()];
        assert_eq!(favorites_bar(&favs), "Favorites: [Paris] [London]");
        assert_eq!(favorites_bar(&[]), "Favorites: (none)");
    }

    #[test]
    fn hourly_strip_formats_each_item() {
        let items = vec![
            HourlyItem { label: "3 PM".into(), temp_c: 12, icon_url: String::new() },
            HourlyItem { label: "6 PM".into(), temp_c: -1, icon_url: String::new() },
        ];
        assert_eq!(hourly_strip(&items), " 3 PM   12°C | 6 PM   -1°C");
    }

    #[test]
    fn weekly_list_has_one_line_per_day() {
        let items = vec![
            DailyItem {
                weekday: "Monday".into(),
                date: "Jan 1".into(),
                icon_url: String::new(),
                temp_c: 7,
            },
            DailyItem {
                weekday: "Tuesday".into(),
                date: "Jan 2".into(),
                icon_url: String::new(),
                temp_c: 17,
            },
        ];
        let text = weekly_list(&items);
        assert_eq!(text.lines().count(), 2);
        assert!(text.starts_with("Monday     Jan 1"));
    }

    #[test]
    fn renderer_redraws_only_what_changed() {
        use skycast_core::{FavoritesStore, MemoryStore};

        let mut favorites = FavoritesStore::load(Box::new(MemoryStore::new()), 3);
        favorites.toggle("Paris").unwrap();
        let state = AppState::new(favorites);

        let mut renderer = Renderer::new(Vec::new());
        renderer.apply(&[StateChange::Favorites], &state).unwrap();
        renderer.apply(&[StateChange::Weather], &state).unwrap();
        let text = String::from_utf8(renderer.into_inner()).unwrap();

        assert_eq!(
            text,
            "Favorites: [Paris]\n\nSearch for a city to see its weather.\n\n"
        );
    }

    #[test]
    fn not_found_panel_is_still_json() {
        let panel = Panel::NotFound { message: "city not found".into() };
        let value: serde_json::Value = serde_json::from_str(&panel_json(&panel).unwrap()).unwrap();
        assert_eq!(value, serde_json::json!({ "not_found": "city not found" }));
    }

    #[test]
    fn disabled_toggle_renders_nothing() {
        assert_eq!(toggle_button(ToggleState::Disabled), "");
        assert_eq!(toggle_button(ToggleState::On), "★ favorite");
    }
}
