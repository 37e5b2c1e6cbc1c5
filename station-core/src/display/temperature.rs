use std::{cell::Cell, rc::Rc};

use crate::{
    display::{DisplaySink, TracingSink},
    model::Measurement,
    observer::{Observer, ObserverError},
};

/// Shows the latest temperature, in degrees Celsius.
#[derive(Debug)]
pub struct TemperatureDisplay {
    current: Cell<f64>,
    sink: Rc<dyn DisplaySink>,
}

impl TemperatureDisplay {
    pub fn new() -> Self {
        Self::with_sink(Rc::new(TracingSink))
    }

    pub fn with_sink(sink: Rc<dyn DisplaySink>) -> Self {
        tracing::info!("Temperature display created");
        Self { current: Cell::new(0.0), sink }
    }

    /// Last temperature received, `0.0` before the first update.
    pub fn current_temperature(&self) -> f64 {
        self.current.get()
    }

    fn display(&self) {
        self.sink.render(&format!("Temperature display: {:.1} °C", self.current.get()));
    }
}

impl Default for TemperatureDisplay {
    fn default() -> Self {
        Self::new()
    }
}

impl Observer<Measurement> for TemperatureDisplay {
    fn update(&self, data: Option<&Measurement>) -> Result<(), ObserverError> {
        match data {
            Some(measurement) => {
                self.current.set(measurement.temperature);
                self.display();
            }
            None => self.sink.warn("temperature display: no weather data available"),
        }
        Ok(())
    }

    fn name(&self) -> &str {
        "temperature display"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::display::MemorySink;

    #[test]
    fn starts_at_zero() {
        assert_eq!(TemperatureDisplay::new().current_temperature(), 0.0);
    }

    #[test]
    fn caches_and_renders_with_one_decimal() {
        let sink = Rc::new(MemorySink::new());
        let display = TemperatureDisplay::with_sink(sink.clone());

        display.update(Some(&Measurement::new(21.46, 50.0, 1000.0))).unwrap();

        assert_eq!(display.current_temperature(), 21.46);
        assert_eq!(sink.rendered(), ["Temperature display: 21.5 °C"]);
    }

    #[test]
    fn absent_data_only_warns() {
        let sink = Rc::new(MemorySink::new());
        let display = TemperatureDisplay::with_sink(sink.clone());
        display.update(Some(&Measurement::new(3.0, 4.0, 5.0))).unwrap();

        display.update(None).unwrap();

        assert_eq!(display.current_temperature(), 3.0);
        assert_eq!(sink.rendered().len(), 1);
        assert_eq!(sink.warnings(), ["temperature display: no weather data available"]);
    }
}
