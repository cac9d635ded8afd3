//! Statement monitoring.
//!
//! Wrap any client in [`InstrumentedClient`] with a [`QueryMonitor`] to
//! observe every statement it executes: SQL, parameters, duration and
//! outcome. Monitors are plain values handed to the wrapper; there is no
//! process-wide registration.
//!
//! # Example
//!
//! ```rust,ignore
//! use modelq::monitor::{CompositeMonitor, InstrumentedClient, StatsMonitor, TracingMonitor};
//! use std::sync::Arc;
//! use std::time::Duration;
//!
//! let stats = Arc::new(StatsMonitor::new());
//! let client = InstrumentedClient::new(pg_client)
//!     .with_monitor(CompositeMonitor::new().add(TracingMonitor::new()).add_arc(stats.clone()))
//!     .with_slow_query_threshold(Duration::from_millis(500));
//! ```

mod instrumented;
mod monitors;
mod types;

#[cfg(feature = "tracing")]
mod tracing_monitor;


pub use instrumented::InstrumentedClient;
pub use monitors::{CompositeMonitor, NoopMonitor, QueryStats, StatsMonitor};
pub use types::{QueryContext, QueryMonitor, QueryResult, QueryType};

#[cfg(feature = "tracing")]
pub use tracing_monitor::TracingMonitor;

/// Cut `s` to at most `max_bytes`, backing off to a char boundary.
pub(crate) fn truncate_bytes(s: &str, max_bytes: usize) -> &str {
    if s.len() <= max_bytes {
        return s;
    }
    let mut end = max_bytes;
    while end > 0 && !s.is_char_boundary(end) {
        end -= 1;
    }
    &s[..end]
}
