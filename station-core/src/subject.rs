use serde::{Deserialize, Serialize};
use std::{fmt, rc::Rc};
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::{
    model::Measurement,
    observer::{Observer, ObserverError},
};

/// What a subject does when an observer fails during a notification cycle.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FailurePolicy {
    /// Stop at the first failing observer; later observers are not notified.
    FailFast,
    /// Notify every observer and report all failures afterwards.
    #[default]
    Isolate,
}

impl FailurePolicy {
    pub fn as_str(&self) -> &'static str {
        match self {
            FailurePolicy::FailFast => "fail-fast",
            FailurePolicy::Isolate => "isolate",
        }
    }

    pub const fn all() -> &'static [FailurePolicy] {
        &[FailurePolicy::FailFast, FailurePolicy::Isolate]
    }
}

impl fmt::Display for FailurePolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<&str> for FailurePolicy {
    type Error = anyhow::Error;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value.to_lowercase().as_str() {
            "fail-fast" | "failfast" => Ok(FailurePolicy::FailFast),
            "isolate" => Ok(FailurePolicy::Isolate),
            _ => Err(anyhow::anyhow!(
                "Unknown failure policy '{value}'. Supported policies: fail-fast, isolate."
            )),
        }
    }
}

/// An observer failure together with its position in the registry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotificationFailure {
    pub position: usize,
    pub error: ObserverError,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NotifyError {
    #[error("notification aborted at observer #{position}: {source}")]
    Aborted {
        position: usize,
        #[source]
        source: ObserverError,
    },

    #[error("{} observer(s) failed during notification", .0.len())]
    Isolated(Vec<NotificationFailure>),
}

impl NotifyError {
    /// Every failure carried by this error, in registry order.
    pub fn failures(&self) -> Vec<NotificationFailure> {
        match self {
            NotifyError::Aborted { position, source } => {
                vec![NotificationFailure { position: *position, error: source.clone() }]
            }
            NotifyError::Isolated(failures) => failures.clone(),
        }
    }
}

/// Holder of state that broadcasts changes to registered observers.
pub trait Subject<T> {
    /// Append `observer` to the registry. Duplicates are allowed and are
    /// notified once per registration.
    fn register_observer(&mut self, observer: Rc<dyn Observer<T>>);

    /// Remove the first registration of this exact observer instance.
    /// Unknown observers are ignored.
    fn remove_observer<O: Observer<T> + ?Sized>(&mut self, observer: &O);

    /// Deliver the current state to every observer, in registration order.
    fn notify_observers(&self) -> Result<(), NotifyError>;

    /// Copy of the registry; changing it does not affect the subject.
    fn observers(&self) -> Vec<Rc<dyn Observer<T>>>;
}

/// Subject publishing [`Measurement`]s to display observers.
pub struct WeatherStation {
    observers: Vec<Rc<dyn Observer<Measurement>>>,
    current: Option<Measurement>,
    policy: FailurePolicy,
}

impl WeatherStation {
    pub fn new() -> Self {
        Self::with_policy(FailurePolicy::default())
    }

    pub fn with_policy(policy: FailurePolicy) -> Self {
        Self { observers: Vec::new(), current: None, policy }
    }

    pub fn policy(&self) -> FailurePolicy {
        self.policy
    }

    pub fn observer_count(&self) -> usize {
        self.observers.len()
    }

    /// Latest measurement, `None` until the first `set_measurements*` call.
    pub fn current_measurement(&self) -> Option<&Measurement> {
        self.current.as_ref()
    }

    /// Replace the current measurement and notify every observer, even when
    /// the values did not change.
    pub fn set_measurements(
        &mut self,
        temperature: f64,
        humidity: f64,
        pressure: f64,
    ) -> Result<(), NotifyError> {
        info!(
            "Updating measurements: {temperature:.1} °C, {humidity:.1} %, {pressure:.1} hPa"
        );
        self.record(Measurement::new(temperature, humidity, pressure))
    }

    /// Same as [`set_measurements`](Self::set_measurements) with standard
    /// sea-level pressure.
    pub fn set_measurements_at_sea_level(
        &mut self,
        temperature: f64,
        humidity: f64,
    ) -> Result<(), NotifyError> {
        info!("Updating measurements: {temperature:.1} °C, {humidity:.1} %");
        self.record(Measurement::at_sea_level(temperature, humidity))
    }

    fn record(&mut self, measurement: Measurement) -> Result<(), NotifyError> {
        self.current = Some(measurement);
        info!("Measurements changed, notifying observers");
        self.notify_observers()
    }
}

impl Default for WeatherStation {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for WeatherStation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names: Vec<&str> = self.observers.iter().map(|o| o.name()).collect();
        f.debug_struct("WeatherStation")
            .field("observers", &names)
            .field("current", &self.current)
            .field("policy", &self.policy)
            .finish()
    }
}

impl Subject<Measurement> for WeatherStation {
    fn register_observer(&mut self, observer: Rc<dyn Observer<Measurement>>) {
        let name = observer.name().to_owned();
        self.observers.push(observer);
        info!("Registered observer '{name}'. Total observers: {}", self.observers.len());
    }

    fn remove_observer<O: Observer<Measurement> + ?Sized>(&mut self, observer: &O) {
        let target = (observer as *const O).cast::<()>();
        let found = self
            .observers
            .iter()
            .position(|o| Rc::as_ptr(o).cast::<()>() == target);

        match found {
            Some(index) => {
                let removed = self.observers.remove(index);
                info!(
                    "Removed observer '{}'. Total observers: {}",
                    removed.name(),
                    self.observers.len()
                );
            }
            None => debug!("Observer '{}' is not registered, nothing removed", observer.name()),
        }
    }

    fn notify_observers(&self) -> Result<(), NotifyError> {
        info!("Notifying {} observers of new weather data", self.observers.len());

        let data = self.current.as_ref();
        let mut failures = Vec::new();

        for (position, observer) in self.observers.iter().enumerate() {
            if let Err(error) = observer.update(data) {
                warn!("Observer #{position} failed: {error}");
                match self.policy {
                    FailurePolicy::FailFast => {
                        return Err(NotifyError::Aborted { position, source: error });
                    }
                    FailurePolicy::Isolate => {
                        failures.push(NotificationFailure { position, error })
                    }
                }
            }
        }

        if failures.is_empty() {
            Ok(())
        } else {
            Err(NotifyError::Isolated(failures))
        }
    }

    fn observers(&self) -> Vec<Rc<dyn Observer<Measurement>>> {
        self.observers.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;

    type Journal = Rc<RefCell<Vec<(String, Option<Measurement>)>>>;

    struct Recorder {
        label: String,
        journal: Journal,
    }

    impl Recorder {
        fn new(label: &str, journal: &Journal) -> Rc<Self> {
            Rc::new(Self { label: label.to_owned(), journal: Rc::clone(journal) })
        }
    }

    impl Observer<Measurement> for Recorder {
        fn update(&self, data: Option<&Measurement>) -> Result<(), ObserverError> {
            self.journal.borrow_mut().push((self.label.clone(), data.copied()));
            Ok(())
        }

        fn name(&self) -> &str {
            &self.label
        }
    }

    struct Broken {
        journal: Journal,
    }

    impl Observer<Measurement> for Broken {
        fn update(&self, data: Option<&Measurement>) -> Result<(), ObserverError> {
            self.journal.borrow_mut().push(("broken".to_owned(), data.copied()));
            Err(ObserverError::new("broken", "display unplugged"))
        }
    }

    fn journal() -> Journal {
        Rc::new(RefCell::new(Vec::new()))
    }

    fn labels(journal: &Journal) -> Vec<String> {
        journal.borrow().iter().map(|(label, _)| label.clone()).collect()
    }

    #[test]
    fn observers_keep_registration_order_including_duplicates() {
        let j = journal();
        let a = Recorder::new("a", &j);
        let b = Recorder::new("b", &j);

        let mut station = WeatherStation::new();
        station.register_observer(a.clone());
        station.register_observer(b.clone());
        station.register_observer(a.clone());

        let names: Vec<String> =
            station.observers().iter().map(|o| o.name().to_owned()).collect();
        assert_eq!(names, ["a", "b", "a"]);
        assert_eq!(station.observer_count(), 3);
    }

    #[test]
    fn observers_snapshot_is_detached() {
        let j = journal();
        let mut station = WeatherStation::new();
        station.register_observer(Recorder::new("a", &j));

        let mut snapshot = station.observers();
        snapshot.clear();

        assert_eq!(station.observer_count(), 1);
    }

    #[test]
    fn set_measurements_notifies_each_observer_once_in_order() {
        let j = journal();
        let mut station = WeatherStation::new();
        station.register_observer(Recorder::new("first", &j));
        station.register_observer(Recorder::new("second", &j));

        station.set_measurements(25.0, 65.0, 1013.0).unwrap();

        let expected = Some(Measurement::new(25.0, 65.0, 1013.0));
        assert_eq!(
            *j.borrow(),
            vec![("first".to_owned(), expected), ("second".to_owned(), expected)]
        );
        assert_eq!(station.current_measurement(), expected.as_ref());
    }

    #[test]
    fn duplicate_registration_is_notified_twice() {
        let j = journal();
        let a = Recorder::new("a", &j);
        let mut station = WeatherStation::new();
        station.register_observer(a.clone());
        station.register_observer(a);

        station.set_measurements(1.0, 2.0, 3.0).unwrap();

        assert_eq!(labels(&j), ["a", "a"]);
    }

    #[test]
    fn sea_level_overload_uses_standard_pressure() {
        let mut station = WeatherStation::new();
        station.set_measurements_at_sea_level(10.0, 50.0).unwrap();

        assert_eq!(
            station.current_measurement(),
            Some(&Measurement::new(10.0, 50.0, 1013.25))
        );
    }

    #[test]
    fn removed_observer_is_not_notified() {
        let j = journal();
        let a = Recorder::new("a", &j);
        let b = Recorder::new("b", &j);
        let mut station = WeatherStation::new();
        station.register_observer(a.clone());
        station.register_observer(b.clone());

        station.remove_observer(&*a);
        station.set_measurements(1.0, 2.0, 3.0).unwrap();

        assert_eq!(labels(&j), ["b"]);
    }

    #[test]
    fn remove_takes_only_first_registration() {
        let j = journal();
        let a = Recorder::new("a", &j);
        let b = Recorder::new("b", &j);
        let mut station = WeatherStation::new();
        station.register_observer(a.clone());
        station.register_observer(b.clone());
        station.register_observer(a.clone());

        station.remove_observer(&*a);

        let names: Vec<String> =
            station.observers().iter().map(|o| o.name().to_owned()).collect();
        assert_eq!(names, ["b", "a"]);
    }

    #[test]
    fn remove_matches_identity_not_value() {
        let j = journal();
        let registered = Recorder::new("same", &j);
        let lookalike = Recorder::new("same", &j);
        let mut station = WeatherStation::new();
        station.register_observer(registered);

        station.remove_observer(&*lookalike);

        assert_eq!(station.observer_count(), 1);
    }

    #[test]
    fn remove_through_trait_object_handle() {
        let j = journal();
        let handle: Rc<dyn Observer<Measurement>> = Recorder::new("a", &j);
        let mut station = WeatherStation::new();
        station.register_observer(Rc::clone(&handle));

        station.remove_observer(&*handle);

        assert_eq!(station.observer_count(), 0);
    }

    #[test]
    fn removing_unknown_observer_is_a_no_op() {
        let j = journal();
        let mut station = WeatherStation::new();
        station.register_observer(Recorder::new("a", &j));

        station.remove_observer(&*Recorder::new("ghost", &j));

        assert_eq!(station.observer_count(), 1);
    }

    #[test]
    fn identical_readings_trigger_two_cycles() {
        let j = journal();
        let mut station = WeatherStation::new();
        station.register_observer(Recorder::new("a", &j));

        station.set_measurements(5.0, 5.0, 5.0).unwrap();
        station.set_measurements(5.0, 5.0, 5.0).unwrap();

        assert_eq!(j.borrow().len(), 2);
    }

    #[test]
    fn notify_before_any_reading_delivers_none() {
        let j = journal();
        let mut station = WeatherStation::new();
        station.register_observer(Recorder::new("a", &j));

        station.notify_observers().unwrap();

        assert_eq!(*j.borrow(), vec![("a".to_owned(), None)]);
        assert!(station.current_measurement().is_none());
    }

    #[test]
    fn isolate_policy_notifies_everyone_and_reports_failures() {
        let j = journal();
        let mut station = WeatherStation::with_policy(FailurePolicy::Isolate);
        station.register_observer(Rc::new(Broken { journal: Rc::clone(&j) }));
        station.register_observer(Recorder::new("after", &j));

        let err = station.set_measurements(1.0, 2.0, 3.0).unwrap_err();

        assert_eq!(labels(&j), ["broken", "after"]);
        let failures = err.failures();
        assert_eq!(failures.len(), 1);
        assert_eq!(failures[0].position, 0);
        assert_eq!(failures[0].error.message, "display unplugged");
        assert!(err.to_string().contains("1 observer(s) failed"));
    }

    #[test]
    fn fail_fast_policy_stops_at_first_failure() {
        let j = journal();
        let mut station = WeatherStation::with_policy(FailurePolicy::FailFast);
        station.register_observer(Recorder::new("before", &j));
        station.register_observer(Rc::new(Broken { journal: Rc::clone(&j) }));
        station.register_observer(Recorder::new("after", &j));

        let err = station.set_measurements(1.0, 2.0, 3.0).unwrap_err();

        assert_eq!(labels(&j), ["before", "broken"]);
        assert!(matches!(err, NotifyError::Aborted { position: 1, .. }));
        // the measurement is recorded even though delivery was cut short
        assert!(station.current_measurement().is_some());
    }

    #[test]
    fn failure_policy_parses_names() {
        for policy in FailurePolicy::all() {
            let parsed = FailurePolicy::try_from(policy.as_str()).expect("roundtrip should succeed");
            assert_eq!(*policy, parsed);
        }

        let err = FailurePolicy::try_from("retry").unwrap_err();
        assert!(err.to_string().contains("Unknown failure policy"));
    }

    #[derive(Clone, Default)]
    struct Captured(std::sync::Arc<std::sync::Mutex<Vec<u8>>>);

    impl std::io::Write for Captured {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    impl<'a> tracing_subscriber::fmt::MakeWriter<'a> for Captured {
        type Writer = Captured;

        fn make_writer(&'a self) -> Self::Writer {
            self.clone()
        }
    }

    #[test]
    fn update_logs_values_with_one_decimal() {
        let captured = Captured::default();
        let subscriber = tracing_subscriber::fmt()
            .with_writer(captured.clone())
            .with_ansi(false)
            .finish();

        tracing::subscriber::with_default(subscriber, || {
            let mut station = WeatherStation::new();
            station.set_measurements(25.0, 65.04, 1013.0).unwrap();
            station.set_measurements_at_sea_level(10.0, 50.0).unwrap();
        });

        let logs = String::from_utf8(captured.0.lock().unwrap().clone()).unwrap();
        assert!(logs.contains("Updating measurements: 25.0 °C, 65.0 %, 1013.0 hPa"));
        assert!(logs.contains("Updating measurements: 10.0 °C, 50.0 %"));
        assert_eq!(logs.matches("Measurements changed, notifying observers").count(), 2);
    }

    #[test]
    fn default_policy_is_isolate() {
        assert_eq!(WeatherStation::default().policy(), FailurePolicy::Isolate);
    }
}
