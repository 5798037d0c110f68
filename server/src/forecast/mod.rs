pub mod aggregate;
pub mod cache;
pub mod error;
pub mod manager;
pub mod openweather;
pub mod parse;
pub mod types;

pub use error::WeatherError;
pub use manager::WeatherManager;
pub use types::{QueryKind, WeatherReport};
