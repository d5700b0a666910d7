//! Third-party APIs behind the dashboard widgets.
//!
//! Weather, translation, currency and flight lookups are proxied so API keys
//! stay in server configuration. Responses are passed through as JSON.

mod cooldown;

pub use cooldown::CooldownGuard;

use std::time::Duration;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::config::IntegrationsConfig;
use crate::errors::{AppError, AppResult};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Request body for a translation.
#[derive(Debug, Clone, Deserialize)]
pub struct TranslateRequest {
    pub text: String,
    #[serde(default = "default_source")]
    pub source: String,
    pub target: String,
}

fn default_source() -> String {
    "auto".to_string()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Translation {
    pub translated_text: String,
}

/// HTTP client for the widget APIs.
pub struct Integrations {
    client: reqwest::Client,
    config: IntegrationsConfig,
    flight_cooldown: CooldownGuard,
}

impl Integrations {
    pub fn new(config: IntegrationsConfig) -> AppResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| AppError::Internal(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            flight_cooldown: CooldownGuard::new(config.flight_cooldown),
            config,
        })
    }

    /// Daily forecast for a coordinate.
    pub async fn weather(&self, latitude: f64, longitude: f64) -> AppResult<Value> {
        if !(-90.0..=90.0).contains(&latitude) || !(-180.0..=180.0).contains(&longitude) {
            return Err(AppError::Validation(
                "Coordinates are out of range".to_string(),
            ));
        }

        let response = self
            .client
            .get(&self.config.weather_url)
            .query(&[
                ("latitude", latitude.to_string()),
                ("longitude", longitude.to_string()),
                (
                    "daily",
                    "temperature_2m_max,temperature_2m_min,weathercode".to_string(),
                ),
                ("timezone", "auto".to_string()),
            ])
            .send()
            .await?
            .error_for_status()?;

        Ok(response.json().await?)
    }

    /// Translate text between two languages.
    pub async fn translate(&self, request: &TranslateRequest) -> AppResult<Translation> {
        let text = crate::models::required_text("Text", &request.text)?;
        let target = crate::models::required_text("Target language", &request.target)?;

        let mut body = serde_json::json!({
            "q": text,
            "source": request.source,
            "target": target,
            "format": "text",
        });
        if let Some(key) = &self.config.translate_key {
            body["api_key"] = Value::String(key.clone());
        }

        let response = self
            .client
            .post(&self.config.translate_url)
            .json(&body)
            .send()
            .await?
            .error_for_status()?;

        let translated: Value = response.json().await?;
        let translated_text = translated["translatedText"]
            .as_str()
            .ok_or_else(|| AppError::Upstream("Translation response had no text".to_string()))?
            .to_string();

        Ok(Translation { translated_text })
    }

    /// Latest exchange rates for a base currency.
    pub async fn currency(&self, base: &str) -> AppResult<Value> {
        let base = base.trim().to_ascii_uppercase();
        if base.len() != 3 || !base.chars().all(|c| c.is_ascii_alphabetic()) {
            return Err(AppError::Validation(format!(
                "{} is not a currency code",
                base
            )));
        }

        let url = format!("{}/{}", self.config.currency_url.trim_end_matches('/'), base);
        let response = self.client.get(url).send().await?.error_for_status()?;

        Ok(response.json().await?)
    }

    /// Live status of a flight, at most once per cooldown window per flight.
    pub async fn flight(&self, flight_number: &str) -> AppResult<Value> {
        let flight = normalize_flight_number(flight_number)?;

        self.flight_cooldown
            .try_acquire(&flight)
            .map_err(|wait| AppError::RateLimited {
                message: format!("Flight {} was refreshed recently", flight),
                retry_after_secs: wait.as_secs().max(1),
            })?;

        let mut request = self
            .client
            .get(&self.config.flights_url)
            .query(&[("flight_iata", flight.as_str())]);
        if let Some(key) = &self.config.flights_key {
            request = request.query(&[("access_key", key.as_str())]);
        }

        let response = request.send().await?.error_for_status()?;
        Ok(response.json().await?)
    }
}

/// Uppercase a flight number such as `ga 404` into `GA404`.
fn normalize_flight_number(raw: &str) -> AppResult<String> {
    let flight: String = raw
        .chars()
        .filter(|c| !c.is_whitespace())
        .collect::<String>()
        .to_ascii_uppercase();

    let valid = (3..=8).contains(&flight.len())
        && flight.chars().all(|c| c.is_ascii_alphanumeric())
        && flight.chars().any(|c| c.is_ascii_digit());
    if !valid {
        return Err(AppError::Validation(format!(
            "{} is not a flight number",
            raw
        )));
    }
    Ok(flight)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_flight_number() {
        assert_eq!(normalize_flight_number(" ga 404 ").unwrap(), "GA404");
        assert!(normalize_flight_number("GA").is_err());
        assert!(normalize_flight_number("GARUDA").is_err());
        assert!(normalize_flight_number("GA-404").is_err());
    }

    #[tokio::test]
    async fn test_translate_rejects_empty_text_without_calling_out() {
        let config = IntegrationsConfig {
            translate_url: "http://127.0.0.1:9/translate".to_string(),
            ..IntegrationsConfig::default()
        };
        let integrations = Integrations::new(config).unwrap();

        let err = integrations
            .translate(&TranslateRequest {
                text: "   ".to_string(),
                source: default_source(),
                target: "id".to_string(),
            })
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }

    #[tokio::test]
    async fn test_repeated_flight_lookup_is_rate_limited() {
        let config = IntegrationsConfig {
            flights_url: "http://127.0.0.1:9/flights".to_string(),
            ..IntegrationsConfig::default()
        };
        let integrations = Integrations::new(config).unwrap();

        // First lookup passes the guard and then fails to connect
        let first = integrations.flight("GA404").await.unwrap_err();
        assert!(matches!(first, AppError::Upstream(_)));

        let second = integrations.flight("ga404").await.unwrap_err();
        assert!(matches!(second, AppError::RateLimited { .. }));
    }

    #[tokio::test]
    async fn test_weather_validates_coordinates() {
        let integrations = Integrations::new(IntegrationsConfig::default()).unwrap();
        assert!(matches!(
            integrations.weather(120.0, 0.0).await,
            Err(AppError::Validation(_))
        ));
    }
}
