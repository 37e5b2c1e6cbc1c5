use serde::Serialize;
use std::{fmt, rc::Rc};
use tracing::info;

use station_core::{
    DisplaySink, FailurePolicy, HumidityDisplay, Measurement, Reading, StationConfig, Subject,
    TemperatureDisplay, WeatherStation,
};

/// Reading recorded after the humidity display has been removed.
pub const FOLLOW_UP: Reading = Reading::new(30.0, 40.0, None);

/// Final state of a run, printed by the CLI.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Summary {
    pub measurement: Option<Measurement>,
    pub temperature_display: f64,
    pub humidity_display: f64,
    pub observers: usize,
    pub policy: FailurePolicy,
}

impl fmt::Display for Summary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.measurement {
            Some(m) => writeln!(f, "Current weather: {m}")?,
            None => writeln!(f, "Current weather: no data")?,
        }
        writeln!(f, "Temperature display: {:.1} °C", self.temperature_display)?;
        writeln!(f, "Humidity display:    {:.1} %", self.humidity_display)?;
        write!(f, "Registered observers: {} (policy: {})", self.observers, self.policy)
    }
}

struct Displays {
    station: WeatherStation,
    temperature: Rc<TemperatureDisplay>,
    humidity: Rc<HumidityDisplay>,
}

impl Displays {
    fn wire(policy: FailurePolicy, sink: Rc<dyn DisplaySink>) -> Self {
        let mut station = WeatherStation::with_policy(policy);
        let temperature = Rc::new(TemperatureDisplay::with_sink(Rc::clone(&sink)));
        let humidity = Rc::new(HumidityDisplay::with_sink(sink));

        station.register_observer(temperature.clone());
        station.register_observer(humidity.clone());

        Self { station, temperature, humidity }
    }

    fn summary(&self) -> Summary {
        Summary {
            measurement: self.station.current_measurement().copied(),
            temperature_display: self.temperature.current_temperature(),
            humidity_display: self.humidity.current_humidity(),
            observers: self.station.observer_count(),
            policy: self.station.policy(),
        }
    }
}

/// Register both displays, replay the configured readings, drop the humidity
/// display and record [`FOLLOW_UP`].
pub fn run_demo(
    config: &StationConfig,
    policy: FailurePolicy,
    sink: Rc<dyn DisplaySink>,
) -> anyhow::Result<Summary> {
    let mut displays = Displays::wire(policy, sink);

    for reading in &config.readings {
        reading.apply(&mut displays.station)?;
    }

    info!("Removing humidity display");
    displays.station.remove_observer(&*displays.humidity);

    FOLLOW_UP.apply(&mut displays.station)?;

    Ok(displays.summary())
}

/// One notification cycle against freshly registered displays.
pub fn record_once(
    reading: Reading,
    policy: FailurePolicy,
    sink: Rc<dyn DisplaySink>,
) -> anyhow::Result<Summary> {
    let mut displays = Displays::wire(policy, sink);
    reading.apply(&mut displays.station)?;
    Ok(displays.summary())
}
