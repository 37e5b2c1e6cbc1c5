use std::{cell::RefCell, fmt::Debug};

pub mod humidity;
pub mod temperature;

pub use humidity::HumidityDisplay;
pub use temperature::TemperatureDisplay;

/// Where display observers send their output.
pub trait DisplaySink: Debug {
    /// A rendered reading.
    fn render(&self, line: &str);

    /// A diagnostic emitted instead of rendering.
    fn warn(&self, message: &str);
}

/// Sink that forwards to `tracing` at info and warn level.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingSink;

impl DisplaySink for TracingSink {
    fn render(&self, line: &str) {
        tracing::info!("{line}");
    }

    fn warn(&self, message: &str) {
        tracing::warn!("{message}");
    }
}

/// Severity of a line captured by [`MemorySink`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Level {
    Render,
    Warn,
}

/// Sink that keeps every line in memory.
#[derive(Debug, Default)]
pub struct MemorySink {
    lines: RefCell<Vec<(Level, String)>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn lines(&self) -> Vec<(Level, String)> {
        self.lines.borrow().clone()
    }

    pub fn rendered(&self) -> Vec<String> {
        self.filtered(Level::Render)
    }

    pub fn warnings(&self) -> Vec<String> {
        self.filtered(Level::Warn)
    }

    fn filtered(&self, level: Level) -> Vec<String> {
        self.lines
            .borrow()
            .iter()
            .filter(|(l, _)| *l == level)
            .map(|(_, line)| line.clone())
            .collect()
    }
}

impl DisplaySink for MemorySink {
    fn render(&self, line: &str) {
        self.lines.borrow_mut().push((Level::Render, line.to_owned()));
    }

    fn warn(&self, message: &str) {
        self.lines.borrow_mut().push((Level::Warn, message.to_owned()));
    }
}
