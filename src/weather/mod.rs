pub mod openweather;
pub mod types;
