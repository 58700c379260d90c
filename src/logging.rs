//! Log output setup.

use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

/// Installs a stderr subscriber filtered by `filter` (`EnvFilter` syntax).
///
/// An unparsable filter falls back to [`crate::config::DEFAULT_LOG_FILTER`].
/// Calling this more than once keeps the first subscriber.
pub fn init(filter: &str) {
    let filter = EnvFilter::try_new(filter)
        .unwrap_or_else(|_| EnvFilter::new(crate::config::DEFAULT_LOG_FILTER));
    // Tests and repeated CLI runs in one process install a subscriber more than once.
    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr).with_target(false))
        .try_init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn init_tolerates_bad_filters_and_repeats() {
        init("task_wizard=[");
        init("debug");
        tracing::debug!("logging initialized twice");
    }
}
