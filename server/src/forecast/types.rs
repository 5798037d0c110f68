use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// Which weather product is requested.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QueryKind {
    #[default]
    Current,
    Forecast,
    Detailed,
}

impl QueryKind {
    /// Path segment under `/data/2.5/`.
    pub fn endpoint(&self) -> &'static str {
        match self {
            Self::Current => "weather",
            Self::Forecast => "forecast",
            Self::Detailed => "onecall",
        }
    }
}

impl fmt::Display for QueryKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Current => "current",
            Self::Forecast => "forecast",
            Self::Detailed => "detailed",
        };
        f.write_str(name)
    }
}

impl FromStr for QueryKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "current" => Ok(Self::Current),
            "forecast" => Ok(Self::Forecast),
            "detailed" => Ok(Self::Detailed),
            other => Err(format!("Unknown weather kind: {}", other)),
        }
    }
}

// Provider payloads, see https://openweathermap.org/current and
// https://openweathermap.org/forecast5

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Condition {
    pub id: i64,
    pub main: String,
    pub description: String,
    pub icon: String,
}

impl Condition {
    pub fn is_precipitation(&self) -> bool {
        matches!(self.main.as_str(), "Snow" | "Rain" | "Thunderstorm")
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct CurrentResponse {
    pub main: CurrentMain,
    pub clouds: Clouds,
    pub wind: WindRaw,
    pub weather: Vec<Condition>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CurrentMain {
    pub temp: f64,
    pub humidity: u8,
    pub pressure: f64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Clouds {
    pub all: u8,
}

#[derive(Debug, Clone, Deserialize)]
pub struct WindRaw {
    pub speed: f64,
    pub deg: f64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ForecastResponse {
    pub list: Vec<ForecastItem>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ForecastItem {
    pub dt_txt: String,
    pub main: ForecastMain,
    pub clouds: Clouds,
    pub weather: Vec<Condition>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ForecastMain {
    pub temp: f64,
}

// Internal shapes handed to callers

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CompassPoint {
    N,
    NE,
    E,
    SE,
    S,
    SW,
    W,
    NW,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Wind {
    pub speed: f64,
    pub deg: f64,
    pub direction: CompassPoint,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CurrentWeather {
    pub temp: f64,
    pub cloudiness: u8,
    pub humidity: u8,
    pub pressure: f64,
    pub wind: Wind,
    pub weather: Vec<Condition>,
}

/// One 3-hour forecast step.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastSample {
    pub dt_txt: String,
    pub timestamp: NaiveDateTime,
    pub time: NaiveTime,
    pub temp: f64,
    pub cloudiness: u8,
    pub precipitation: Vec<Condition>,
    pub weather: Vec<Condition>,
}

impl ForecastSample {
    pub fn date(&self) -> NaiveDate {
        self.timestamp.date()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DayPart {
    Morning,
    Day,
    Evening,
}

/// One value per day part.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DayParts<T> {
    pub morning: T,
    pub day: T,
    pub evening: T,
}

impl<T> DayParts<T> {
    pub fn get(&self, part: DayPart) -> &T {
        match part {
            DayPart::Morning => &self.morning,
            DayPart::Day => &self.day,
            DayPart::Evening => &self.evening,
        }
    }

    pub fn get_mut(&mut self, part: DayPart) -> &mut T {
        match part {
            DayPart::Morning => &mut self.morning,
            DayPart::Day => &mut self.day,
            DayPart::Evening => &mut self.evening,
        }
    }
}

/// Dominant condition and mean temperature of one day part.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PartSummary {
    pub main: Option<String>,
    pub description: Option<String>,
    pub icon: Option<String>,
    pub temp: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DayBucket {
    pub list: Vec<ForecastSample>,
    pub parts: DayParts<Vec<ForecastSample>>,
    pub min_temp: f64,
    pub max_temp: f64,
    pub main_weather: DayParts<PartSummary>,
}

/// Day buckets in ascending date order.
pub type ForecastDays = BTreeMap<NaiveDate, DayBucket>;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", content = "data", rename_all = "lowercase")]
pub enum WeatherReport {
    Current(CurrentWeather),
    Forecast(ForecastDays),
}
