use super::error::WeatherError;
use super::types::QueryKind;
use crate::config::Config;
use reqwest::Client;
use serde_json::Value;

const API_VERSION_PATH: &str = "/data/2.5";
const DETAILED_EXCLUDE: &str = "minutely,daily,alerts,hourly";

pub struct OpenWeatherClient {
    client: Client,
    config: Config,
}

impl OpenWeatherClient {
    pub fn new(config: Config) -> Result<Self, WeatherError> {
        let client = Client::builder()
            .user_agent("CityWeather/1.0")
            .timeout(config.http_timeout)
            .build()?;

        Ok(Self { client, config })
    }

    pub fn request_url(&self, kind: QueryKind) -> String {
        format!(
            "{}{}/{}",
            self.config.openweather_base_url.trim_end_matches('/'),
            API_VERSION_PATH,
            kind.endpoint()
        )
    }

    /// Fetches the raw provider payload for `location`.
    pub async fn fetch(&self, kind: QueryKind, location: &str) -> Result<Value, WeatherError> {
        tracing::info!("Getting {} weather for {} from API", kind, location);

        let mut params = vec![
            ("q", location),
            ("appid", self.config.openweather_api_key.as_str()),
            ("lang", self.config.openweather_lang.as_str()),
            ("units", self.config.openweather_units.as_str()),
        ];
        if kind == QueryKind::Detailed {
            params.push(("exclude", DETAILED_EXCLUDE));
        }

        let url = self.request_url(kind);
        let response = match self.client.get(&url).query(&params).send().await {
            Ok(response) => response,
            Err(e) => {
                tracing::warn!("A request error occurred during the request. Details: {}", e);
                return Err(WeatherError::Transport(e));
            }
        };
        tracing::debug!("Requested {}", response.url());

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await?;
            tracing::warn!(
                "Request returned a non-success code. Code: {}. Details: {}",
                status,
                body
            );
            return Err(WeatherError::Upstream {
                status: status.as_u16(),
                body,
            });
        }

        let json = response.json::<Value>().await.map_err(|e| {
            if e.is_decode() {
                WeatherError::MalformedResponse(e.to_string())
            } else {
                WeatherError::Transport(e)
            }
        })?;
        Ok(json)
    }
}
