pub mod icons;
pub mod image;
pub mod weather;

pub use image::{ImageClient, ImageEntry, ImageResult};
pub use weather::{WeatherClient, WeatherResult};
