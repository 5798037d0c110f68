use super::aggregate::group_into_days;
use super::cache::ExpiringCache;
use super::error::WeatherError;
use super::openweather::OpenWeatherClient;
use super::parse::{parse_current, parse_forecast_list};
use super::types::*;
use crate::config::Config;

/// Fetches weather for a location key, keeping one cache per query kind.
pub struct WeatherManager {
    client: OpenWeatherClient,
    current_cache: ExpiringCache<CurrentWeather>,
    forecast_cache: ExpiringCache<ForecastDays>,
}

impl WeatherManager {
    pub fn new(config: Config) -> Result<Self, WeatherError> {
        let current_cache = ExpiringCache::new(config.current_cache_ttl);
        let forecast_cache = ExpiringCache::new(config.forecast_cache_ttl);
        let client = OpenWeatherClient::new(config)?;

        Ok(Self {
            client,
            current_cache,
            forecast_cache,
        })
    }

    /// Current conditions, or the forecast narrowed to the `days` earliest
    /// dates. `Detailed` is not supported.
    pub async fn get_for_city(
        &self,
        location: &str,
        kind: QueryKind,
        days: Option<usize>,
    ) -> Result<WeatherReport, WeatherError> {
        match kind {
            QueryKind::Current => self.current(location).await.map(WeatherReport::Current),
            QueryKind::Forecast => {
                let forecast = self.forecast(location).await?;
                Ok(WeatherReport::Forecast(first_days(forecast, days)))
            }
            QueryKind::Detailed => Err(WeatherError::NotImplemented(
                "coordinate lookup by location name",
            )),
        }
    }

    async fn current(&self, location: &str) -> Result<CurrentWeather, WeatherError> {
        let was_cached = self.current_cache.exists(location);
        if let Some(cached) = self.current_cache.get(location) {
            tracing::info!("Getting current weather for {} from cache", location);
            return Ok(cached);
        }
        if was_cached {
            tracing::info!("Cached current weather for {} is stale", location);
        }

        let raw = self.client.fetch(QueryKind::Current, location).await?;
        let current = parse_current(&raw)?;
        self.current_cache.set(location, current.clone());
        Ok(current)
    }

    async fn forecast(&self, location: &str) -> Result<ForecastDays, WeatherError> {
        let was_cached = self.forecast_cache.exists(location);
        if let Some(cached) = self.forecast_cache.get(location) {
            tracing::info!("Getting forecast for {} from cache", location);
            return Ok(cached);
        }
        if was_cached {
            tracing::info!("Cached forecast for {} is stale", location);
        }

        let raw = self.client.fetch(QueryKind::Forecast, location).await?;
        let samples = parse_forecast_list(&raw)?;
        let forecast = group_into_days(&samples);
        self.forecast_cache.set(location, forecast.clone());
        Ok(forecast)
    }
}

/// Keeps the `count` earliest dates. `None` or zero keeps everything.
pub fn first_days(forecast: ForecastDays, count: Option<usize>) -> ForecastDays {
    match count {
        Some(count) if count > 0 => {
            tracing::debug!("Keeping first {} days", count);
            forecast.into_iter().take(count).collect()
        }
        _ => forecast,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use serde_json::{json, Value};
    use std::sync::Arc;
    use std::time::Duration;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn manager_for(server: &MockServer) -> WeatherManager {
        let mut config = Config::new("test_key");
        config.openweather_base_url = server.uri();
        WeatherManager::new(config).unwrap()
    }

    fn current_body() -> Value {
        json!({
            "weather": [
                {"id": 600, "main": "Snow", "description": "light snow", "icon": "13d"}
            ],
            "main": {"temp": -5.0, "pressure": 1020, "humidity": 90},
            "wind": {"speed": 3.0, "deg": 90},
            "clouds": {"all": 100}
        })
    }

    fn item(dt_txt: &str, temp: f64, main: &str) -> Value {
        json!({
            "dt_txt": dt_txt,
            "main": {"temp": temp},
            "clouds": {"all": 50},
            "weather": [
                {
                    "id": 800,
                    "main": main,
                    "description": main.to_lowercase(),
                    "icon": format!("{}-icon", main)
                }
            ]
        })
    }

    fn five_day_body() -> Value {
        let list: Vec<Value> = (1..=5)
            .flat_map(|day| {
                vec![
                    item(&format!("2024-01-0{} 09:00:00", day), day as f64, "Clear"),
                    item(&format!("2024-01-0{} 15:00:00", day), day as f64 + 1.0, "Clouds"),
                ]
            })
            .collect();
        json!({"cod": "200", "list": list})
    }

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    fn unwrap_forecast(report: WeatherReport) -> ForecastDays {
        match report {
            WeatherReport::Forecast(days) => days,
            other => panic!("Expected forecast, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_current_is_cached() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/data/2.5/weather"))
            .and(query_param("q", "Yaroslavl"))
            .respond_with(ResponseTemplate::new(200).set_body_json(current_body()))
            .expect(1)
            .mount(&mock_server)
            .await;

        let manager = manager_for(&mock_server);
        let first = manager
            .get_for_city("Yaroslavl", QueryKind::Current, None)
            .await
            .unwrap();
        let second = manager
            .get_for_city("Yaroslavl", QueryKind::Current, None)
            .await
            .unwrap();

        assert_eq!(first, second);
        match first {
            WeatherReport::Current(current) => {
                assert_eq!(current.temp, -5.0);
                assert_eq!(current.wind.direction, CompassPoint::E);
            }
            other => panic!("Expected current weather, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_forecast_narrowing_uses_cache() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/data/2.5/forecast"))
            .respond_with(ResponseTemplate::new(200).set_body_json(five_day_body()))
            .expect(1)
            .mount(&mock_server)
            .await;

        let manager = manager_for(&mock_server);
        let full = unwrap_forecast(
            manager
                .get_for_city("Yaroslavl", QueryKind::Forecast, None)
                .await
                .unwrap(),
        );
        let narrowed = unwrap_forecast(
            manager
                .get_for_city("Yaroslavl", QueryKind::Forecast, Some(3))
                .await
                .unwrap(),
        );

        assert_eq!(full.len(), 5);
        let keys: Vec<NaiveDate> = narrowed.keys().copied().collect();
        assert_eq!(
            keys,
            vec![date("2024-01-01"), date("2024-01-02"), date("2024-01-03")]
        );
        for (day, bucket) in &narrowed {
            assert_eq!(bucket, &full[day]);
        }
    }

    #[tokio::test]
    async fn test_narrowed_first_call_caches_full_result() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/data/2.5/forecast"))
            .respond_with(ResponseTemplate::new(200).set_body_json(five_day_body()))
            .expect(1)
            .mount(&mock_server)
            .await;

        let manager = manager_for(&mock_server);
        let narrowed = unwrap_forecast(
            manager
                .get_for_city("Yaroslavl", QueryKind::Forecast, Some(2))
                .await
                .unwrap(),
        );
        let more = unwrap_forecast(
            manager
                .get_for_city("Yaroslavl", QueryKind::Forecast, Some(10))
                .await
                .unwrap(),
        );

        assert_eq!(narrowed.len(), 2);
        assert_eq!(more.len(), 5);
    }

    #[tokio::test]
    async fn test_forecast_end_to_end_summary() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/data/2.5/forecast"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "list": [
                    item("2024-01-01 09:00:00", 2.0, "Snow"),
                    item("2024-01-01 15:00:00", 5.0, "Clouds")
                ]
            })))
            .mount(&mock_server)
            .await;

        let manager = manager_for(&mock_server);
        let days = unwrap_forecast(
            manager
                .get_for_city("Yaroslavl", QueryKind::Forecast, None)
                .await
                .unwrap(),
        );
        let bucket = &days[&date("2024-01-01")];

        assert_eq!(bucket.min_temp, 2.0);
        assert_eq!(bucket.max_temp, 5.0);
        assert_eq!(bucket.main_weather.morning.temp, 2.0);
        assert_eq!(bucket.main_weather.morning.main.as_deref(), Some("Snow"));
        assert_eq!(bucket.main_weather.day.temp, 5.0);
        assert_eq!(bucket.main_weather.day.main.as_deref(), Some("Clouds"));
        assert_eq!(bucket.main_weather.evening.temp, 0.0);
        assert_eq!(bucket.main_weather.evening.main, None);
    }

    #[tokio::test]
    async fn test_detailed_is_not_implemented() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
            .expect(0)
            .mount(&mock_server)
            .await;

        let manager = manager_for(&mock_server);
        let result = manager
            .get_for_city("Yaroslavl", QueryKind::Detailed, Some(3))
            .await;

        assert!(matches!(result, Err(WeatherError::NotImplemented(_))));
    }

    #[tokio::test]
    async fn test_detailed_fails_with_warm_cache() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/data/2.5/forecast"))
            .respond_with(ResponseTemplate::new(200).set_body_json(five_day_body()))
            .expect(1)
            .mount(&mock_server)
            .await;
        Mock::given(method("GET"))
            .and(path("/data/2.5/weather"))
            .respond_with(ResponseTemplate::new(200).set_body_json(current_body()))
            .expect(1)
            .mount(&mock_server)
            .await;

        let manager = manager_for(&mock_server);
        manager
            .get_for_city("Yaroslavl", QueryKind::Forecast, None)
            .await
            .unwrap();
        manager
            .get_for_city("Yaroslavl", QueryKind::Current, None)
            .await
            .unwrap();

        for days in [None, Some(3)] {
            let result = manager
                .get_for_city("Yaroslavl", QueryKind::Detailed, days)
                .await;
            assert!(matches!(result, Err(WeatherError::NotImplemented(_))));
        }
    }

    #[tokio::test]
    async fn test_concurrent_callers_share_cache() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/data/2.5/forecast"))
            .respond_with(ResponseTemplate::new(200).set_body_json(five_day_body()))
            .mount(&mock_server)
            .await;
        Mock::given(method("GET"))
            .and(path("/data/2.5/weather"))
            .respond_with(ResponseTemplate::new(200).set_body_json(current_body()))
            .mount(&mock_server)
            .await;

        let manager = Arc::new(manager_for(&mock_server));
        let spawn = |kind: QueryKind, days: Option<usize>| {
            let manager = Arc::clone(&manager);
            tokio::spawn(async move { manager.get_for_city("Yaroslavl", kind, days).await })
        };

        let (a, b, c, d) = tokio::join!(
            spawn(QueryKind::Forecast, None),
            spawn(QueryKind::Forecast, Some(2)),
            spawn(QueryKind::Current, None),
            spawn(QueryKind::Current, None),
        );

        let full = unwrap_forecast(a.unwrap().unwrap());
        let narrowed = unwrap_forecast(b.unwrap().unwrap());
        assert_eq!(full.len(), 5);
        assert_eq!(narrowed.len(), 2);
        assert_eq!(c.unwrap().unwrap(), d.unwrap().unwrap());

        // Once everyone is done the partitions are warm, so no more fetches.
        let requests_before = mock_server.received_requests().await.unwrap().len();
        let again = unwrap_forecast(
            manager
                .get_for_city("Yaroslavl", QueryKind::Forecast, Some(3))
                .await
                .unwrap(),
        );
        manager
            .get_for_city("Yaroslavl", QueryKind::Current, None)
            .await
            .unwrap();
        let requests_after = mock_server.received_requests().await.unwrap().len();

        assert_eq!(again.len(), 3);
        assert_eq!(requests_before, requests_after);
        assert!((2..=4).contains(&requests_after));
    }

    #[tokio::test]
    async fn test_partitions_are_independent() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/data/2.5/weather"))
            .respond_with(ResponseTemplate::new(200).set_body_json(current_body()))
            .expect(1)
            .mount(&mock_server)
            .await;
        Mock::given(method("GET"))
            .and(path("/data/2.5/forecast"))
            .respond_with(ResponseTemplate::new(200).set_body_json(five_day_body()))
            .expect(1)
            .mount(&mock_server)
            .await;

        let manager = manager_for(&mock_server);
        for _ in 0..2 {
            manager
                .get_for_city("Yaroslavl", QueryKind::Current, None)
                .await
                .unwrap();
            manager
                .get_for_city("Yaroslavl", QueryKind::Forecast, None)
                .await
                .unwrap();
        }
    }

    #[tokio::test]
    async fn test_expired_cache_refetches() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/data/2.5/weather"))
            .respond_with(ResponseTemplate::new(200).set_body_json(current_body()))
            .expect(2)
            .mount(&mock_server)
            .await;

        let mut config = Config::new("test_key");
        config.openweather_base_url = mock_server.uri();
        config.current_cache_ttl = Duration::from_millis(50);
        let manager = WeatherManager::new(config).unwrap();

        manager
            .get_for_city("Yaroslavl", QueryKind::Current, None)
            .await
            .unwrap();
        tokio::time::sleep(Duration::from_millis(100)).await;
        manager
            .get_for_city("Yaroslavl", QueryKind::Current, None)
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_upstream_error_is_not_cached() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/data/2.5/weather"))
            .respond_with(ResponseTemplate::new(401).set_body_string("Invalid API key"))
            .expect(2)
            .mount(&mock_server)
            .await;

        let manager = manager_for(&mock_server);
        for _ in 0..2 {
            let result = manager
                .get_for_city("Yaroslavl", QueryKind::Current, None)
                .await;
            assert!(matches!(
                result,
                Err(WeatherError::Upstream { status: 401, .. })
            ));
        }
    }

    #[tokio::test]
    async fn test_malformed_forecast() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/data/2.5/forecast"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "list": [{"dt_txt": "2024-01-01 09:00:00"}]
            })))
            .mount(&mock_server)
            .await;

        let manager = manager_for(&mock_server);
        let result = manager
            .get_for_city("Yaroslavl", QueryKind::Forecast, None)
            .await;

        assert!(matches!(result, Err(WeatherError::MalformedResponse(_))));
    }

    #[test]
    fn test_first_days() {
        let body = five_day_body();
        let samples = parse_forecast_list(&body).unwrap();
        let forecast = group_into_days(&samples);

        assert_eq!(first_days(forecast.clone(), Some(1)).len(), 1);
        assert_eq!(first_days(forecast.clone(), Some(7)).len(), 5);
        assert_eq!(first_days(forecast.clone(), Some(0)).len(), 5);
        assert_eq!(first_days(forecast, None).len(), 5);
    }
}
