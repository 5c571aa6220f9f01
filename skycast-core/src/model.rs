use anyhow::{Context, Result, anyhow};
use serde::{Deserialize, Serialize};

/// Status code the backend relays for an unknown city.
pub const NOT_FOUND_CODE: &str = "404";

/// Raw body of `GET /weather`. Everything is optional here because the
/// not-found shape only carries `cod` and `message`.
#[derive(Debug, Clone, Deserialize)]
pub struct WeatherPayload {
    pub current: CurrentPayload,
    #[serde(default)]
    pub forecast: Option<ForecastPayload>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CurrentPayload {
    #[serde(default)]
    pub cod: Option<StatusCode>,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub main: Option<MainPayload>,
    #[serde(default)]
    pub weather: Vec<ConditionPayload>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MainPayload {
    /// Kelvin.
    pub temp: f64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ConditionPayload {
    #[serde(default)]
    pub description: Option<String>,
    pub icon: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ForecastPayload {
    #[serde(default)]
    pub list: Vec<ForecastPayloadEntry>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ForecastPayloadEntry {
    pub dt: i64,
    pub main: MainPayload,
    pub weather: Vec<ConditionPayload>,
}

/// `cod` arrives as a number on success (`200`) and as a string on errors (`"404"`).
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum StatusCode {
    Number(i64),
    Text(String),
}

impl StatusCode {
    pub fn as_string(&self) -> String {
        match self {
            StatusCode::Number(n) => n.to_string(),
            StatusCode::Text(s) => s.trim().to_string(),
        }
    }

    pub fn is_not_found(&self) -> bool {
        self.as_string() == NOT_FOUND_CODE
    }
}

/// Current conditions of a successful lookup.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CurrentConditions {
    /// City name as the service reports it.
    pub name: String,
    pub temp_kelvin: f64,
    pub description: String,
    pub icon: String,
    pub status: String,
}

/// One timestamped forecast sample.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ForecastEntry {
    /// Unix seconds.
    pub dt: i64,
    pub temp_kelvin: f64,
    pub icon: String,
}

/// Parsed result of one fetch; lives for a single render cycle.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WeatherSnapshot {
    pub current: CurrentConditions,
    pub forecast: Vec<ForecastEntry>,
}

/// What the service said about the requested city.
#[derive(Debug, Clone, PartialEq)]
pub enum Lookup {
    Found(WeatherSnapshot),
    NotFound { message: String },
}

impl WeatherPayload {
    /// Classify the payload, failing if a found-city response lacks required fields.
    pub fn into_lookup(self) -> Result<Lookup> {
        let current = self.current;

        if current.cod.as_ref().is_some_and(StatusCode::is_not_found) {
            let message = current.message.unwrap_or_else(|| "city not found".to_string());
            return Ok(Lookup::NotFound { message });
        }

        let name = current.name.ok_or_else(|| anyhow!("Weather response is missing `current.name`"))?;
        let main = current.main.ok_or_else(|| anyhow!("Weather response is missing `current.main`"))?;
        let condition = current
            .weather
            .into_iter()
            .next()
            .ok_or_else(|| anyhow!("Weather response is missing `current.weather[0]`"))?;

        let forecast = self
            .forecast
            .ok_or_else(|| anyhow!("Weather response is missing `forecast`"))?
            .list
            .into_iter()
            .enumerate()
            .map(|(i, entry)| {
                let icon = entry
                    .weather
                    .into_iter()
                    .next()
                    .map(|w| w.icon)
                    .with_context(|| format!("Forecast entry {i} is missing `weather[0]`"))?;
                Ok(ForecastEntry { dt: entry.dt, temp_kelvin: entry.main.temp, icon })
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Lookup::Found(WeatherSnapshot {
            current: CurrentConditions {
                name,
                temp_kelvin: main.temp,
                description: condition.description.unwrap_or_default(),
                icon: condition.icon,
                status: current.cod.map(|c| c.as_string()).unwrap_or_default(),
            },
            forecast,
        }))
    }
}
