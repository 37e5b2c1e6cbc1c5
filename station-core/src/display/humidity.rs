use std::{cell::Cell, rc::Rc};

use crate::{
    display::{DisplaySink, TracingSink},
    model::Measurement,
    observer::{Observer, ObserverError},
};

/// Shows the latest relative humidity, in percent.
#[derive(Debug)]
pub struct HumidityDisplay {
    current: Cell<f64>,
    sink: Rc<dyn DisplaySink>,
}

impl HumidityDisplay {
    pub fn new() -> Self {
        Self::with_sink(Rc::new(TracingSink))
    }

    pub fn with_sink(sink: Rc<dyn DisplaySink>) -> Self {
        tracing::info!("Humidity display created");
        Self { current: Cell::new(0.0), sink }
    }

    /// Last humidity received, `0.0` before the first update.
    pub fn current_humidity(&self) -> f64 {
        self.current.get()
    }

    fn display(&self) {
        self.sink.render(&format!("Humidity display: {:.1} %", self.current.get()));
    }
}

impl Default for HumidityDisplay {
    fn default() -> Self {
        Self::new()
    }
}

impl Observer<Measurement> for HumidityDisplay {
    fn update(&self, data: Option<&Measurement>) -> Result<(), ObserverError> {
        match data {
            Some(measurement) => {
                self.current.set(measurement.humidity);
                self.display();
            }
            None => self.sink.warn("humidity display: no weather data available"),
        }
        Ok(())
    }

    fn name(&self) -> &str {
        "humidity display"
    }
}
