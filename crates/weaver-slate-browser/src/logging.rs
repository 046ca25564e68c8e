//! Console logging, plus the last few editor records kept in memory so a
//! host can attach them to a bug report.

use std::cell::RefCell;
use std::collections::VecDeque;
use std::fmt::Write as _;

use tracing::field::{Field, Visit};
use tracing::{Event, Level, Subscriber};
use tracing_subscriber::Layer;
use tracing_subscriber::layer::{Context, SubscriberExt};

/// Records kept by [`RecentLogLayer`].
const CAPACITY: usize = 100;

thread_local! {
    static RECENT: RefCell<RecentLogs> = RefCell::new(RecentLogs::new(CAPACITY));
}

/// Bounded history of formatted records, oldest first.
#[derive(Debug)]
struct RecentLogs {
    lines: VecDeque<String>,
    capacity: usize,
}

impl RecentLogs {
    fn new(capacity: usize) -> Self {
        Self {
            lines: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    fn push(&mut self, line: String) {
        if self.lines.len() == self.capacity {
            self.lines.pop_front();
        }
        self.lines.push_back(line);
    }
}

/// Install `tracing-wasm` console output and a [`RecentLogLayer`] as the
/// global subscriber. Returns `false` when a subscriber was already set.
pub fn init_logging() -> bool {
    let console_level = if cfg!(debug_assertions) {
        Level::DEBUG
    } else {
        Level::INFO
    };
    let console = tracing_wasm::WASMLayer::new(
        tracing_wasm::WASMLayerConfigBuilder::new()
            .set_max_level(console_level)
            .build(),
    );
    let subscriber = tracing_subscriber::Registry::default()
        .with(console)
        .with(RecentLogLayer::default());
    tracing::subscriber::set_global_default(subscriber).is_ok()
}

/// Keeps editor records (targets under `weaver`) at or above `min_level`.
#[derive(Debug, Clone, Copy)]
pub struct RecentLogLayer {
    pub min_level: Level,
}

impl Default for RecentLogLayer {
    fn default() -> Self {
        Self {
            min_level: Level::DEBUG,
        }
    }
}

impl<S: Subscriber> Layer<S> for RecentLogLayer {
    fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
        let meta = event.metadata();
        if !meta.target().starts_with("weaver") || *meta.level() > self.min_level {
            return;
        }
        let mut fields = FieldLine::default();
        event.record(&mut fields);
        let line = format!("[{}] {}: {}", meta.level(), meta.target(), fields.finish());
        RECENT.with(|recent| recent.borrow_mut().push(line));
    }
}

/// Message first, then `name=value` pairs in recording order.
#[derive(Default)]
struct FieldLine {
    message: String,
    pairs: String,
}

impl FieldLine {
    fn finish(self) -> String {
        match (self.message.is_empty(), self.pairs.is_empty()) {
            (_, true) => self.message,
            (true, false) => self.pairs,
            (false, false) => format!("{}, {}", self.message, self.pairs),
        }
    }
}

impl Visit for FieldLine {
    fn record_debug(&mut self, field: &Field, value: &dyn std::fmt::Debug) {
        if field.name() == "message" {
            let _ = write!(self.message, "{value:?}");
            return;
        }
        if !self.pairs.is_empty() {
            self.pairs.push_str(", ");
        }
        let _ = write!(self.pairs, "{}={value:?}", field.name());
    }

    fn record_str(&mut self, field: &Field, value: &str) {
        if field.name() == "message" {
            self.message.push_str(value);
        } else {
            self.record_debug(field, &format_args!("{value}"));
        }
    }
}

/// Kept records, oldest first, one per line.
pub fn recent_logs() -> String {
    RECENT.with(|recent| {
        let recent = recent.borrow();
        let lines: Vec<&str> = recent.lines.iter().map(String::as_str).collect();
        lines.join("\n")
    })
}

pub fn clear_logs() {
    RECENT.with(|recent| recent.borrow_mut().lines.clear());
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_recent_editor_records_are_kept() {
        clear_logs();
        let subscriber = tracing_subscriber::Registry::default().with(RecentLogLayer::default());
        tracing::subscriber::with_default(subscriber, || {
            for i in 0..(CAPACITY + 5) {
                tracing::debug!(target: "weaver::test", i, "entry");
            }
            tracing::trace!(target: "weaver::test", "too quiet");
            tracing::warn!(target: "other", "not ours");
        });
        let logs = recent_logs();
        let lines: Vec<_> = logs.lines().collect();
        assert_eq!(lines.len(), CAPACITY);
        assert_eq!(lines[0], "[DEBUG] weaver::test: entry, i=5");
        assert!(!logs.contains("not ours"));
        assert!(!logs.contains("too quiet"));
    }

    #[test]
    fn string_fields_are_not_quoted() {
        clear_logs();
        let layer = RecentLogLayer {
            min_level: Level::INFO,
        };
        let subscriber = tracing_subscriber::Registry::default().with(layer);
        tracing::subscriber::with_default(subscriber, || {
            tracing::info!(target: "weaver::input", action = "paste", "handled");
            tracing::debug!(target: "weaver::input", "below the minimum");
        });
        assert_eq!(recent_logs(), "[INFO] weaver::input: handled, action=paste");
    }
}
