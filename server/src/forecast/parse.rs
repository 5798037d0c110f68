use super::error::WeatherError;
use super::types::*;
use chrono::NaiveDateTime;
use serde::Deserialize;
use serde_json::Value;

const DT_TXT_FORMAT: &str = "%Y-%m-%d %H:%M:%S";
const SECTOR_WIDTH: f64 = 45.0;

const COMPASS_ROSE: [CompassPoint; 8] = [
    CompassPoint::N,
    CompassPoint::NE,
    CompassPoint::E,
    CompassPoint::SE,
    CompassPoint::S,
    CompassPoint::SW,
    CompassPoint::W,
    CompassPoint::NW,
];

/// Maps a wind bearing to its compass-rose sector. A bearing on the border
/// of two sectors goes to the one counter-clockwise of it, so 22.5 is N and
/// 337.5 is NW.
pub fn wind_direction(deg: f64) -> CompassPoint {
    let offset = (deg - SECTOR_WIDTH / 2.0).rem_euclid(360.0);
    let index = (offset / SECTOR_WIDTH).ceil() as usize % COMPASS_ROSE.len();
    COMPASS_ROSE[index]
}

pub fn parse_current(raw: &Value) -> Result<CurrentWeather, WeatherError> {
    let response = CurrentResponse::deserialize(raw)?;

    Ok(CurrentWeather {
        temp: response.main.temp,
        cloudiness: response.clouds.all,
        humidity: response.main.humidity,
        pressure: response.main.pressure,
        wind: Wind {
            speed: response.wind.speed,
            deg: response.wind.deg,
            direction: wind_direction(response.wind.deg),
        },
        weather: response.weather,
    })
}

/// Flat list of 3-hour samples in provider order.
pub fn parse_forecast_list(raw: &Value) -> Result<Vec<ForecastSample>, WeatherError> {
    let response = ForecastResponse::deserialize(raw)?;
    response
        .list
        .into_iter()
        .map(ForecastSample::from_forecast_item)
        .collect()
}

impl ForecastSample {
    pub fn from_forecast_item(item: ForecastItem) -> Result<Self, WeatherError> {
        let timestamp = NaiveDateTime::parse_from_str(&item.dt_txt, DT_TXT_FORMAT).map_err(|e| {
            WeatherError::MalformedResponse(format!("Bad dt_txt {:?}: {}", item.dt_txt, e))
        })?;

        let precipitation = item
            .weather
            .iter()
            .filter(|w| w.is_precipitation())
            .cloned()
            .collect();

        Ok(Self {
            time: timestamp.time(),
            timestamp,
            temp: item.main.temp,
            cloudiness: item.clouds.all,
            precipitation,
            weather: item.weather,
            dt_txt: item.dt_txt,
        })
    }
}
