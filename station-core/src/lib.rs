//! Core library for the `weather-station` demo.
//!
//! This crate defines:
//! - The measurement model published by a station
//! - The observer capability and the subject that fans updates out to it
//! - Temperature and humidity display observers with pluggable output sinks
//! - Configuration for the replayed readings and notification policy
//!
//! It is used by `station-cli`, but the subject and observers carry no
//! dependency on it.

pub mod config;
pub mod display;
pub mod model;
pub mod observer;
pub mod subject;

pub use config::{Reading, StationConfig};
pub use display::{DisplaySink, HumidityDisplay, MemorySink, TemperatureDisplay, TracingSink};
pub use model::{Measurement, STANDARD_PRESSURE_HPA};
pub use observer::{Observer, ObserverError};
pub use subject::{FailurePolicy, NotificationFailure, NotifyError, Subject, WeatherStation};
