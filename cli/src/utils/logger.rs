use crate::utils::format_duration;
use tracing::{debug, info, warn};
use tracing_subscriber::{
    fmt::{self, time::ChronoUtc},
    layer::SubscriberExt,
    util::SubscriberInitExt,
    EnvFilter,
};

/// Initialize logging; `RUST_LOG` overrides the default `tickerscope=info`.
pub fn init_logger() -> anyhow::Result<()> {
    let timer = ChronoUtc::rfc_3339();

    let format_layer = fmt::layer()
        .with_target(true)
        .with_thread_ids(false)
        .with_thread_names(false)
        .with_timer(timer)
        .compact();

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("tickerscope=info"));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(format_layer)
        .try_init()?;

    Ok(())
}

/// Logger struct for contextual logging
#[derive(Debug, Clone)]
pub struct Logger {
    context: String,
}

impl Logger {
    pub fn new(context: &str) -> Self {
        Self {
            context: context.to_string(),
        }
    }

    pub fn warn(&self, message: &str) {
        warn!("{}: {}", self.context, message);
    }

    pub fn debug(&self, message: &str) {
        debug!("{}: {}", self.context, message);
    }
}

/// [FETCH] - Data fetch operations
pub fn log_fetch(message: &str) {
    info!("FETCH: {}", message);
}

/// [ANALYSIS] - Statistics and tests
pub fn log_analysis(message: &str) {
    info!("ANALYSIS: {}", message);
}

/// [CHART] - Rendered chart files
pub fn log_chart(message: &str) {
    info!("CHART: {}", message);
}

/// Performance timing helper
pub struct Timer {
    start: std::time::Instant,
    name: String,
}

impl Timer {
    pub fn start(name: &str) -> Self {
        Self {
            start: std::time::Instant::now(),
            name: name.to_string(),
        }
    }

    pub fn elapsed_ms(&self) -> f64 {
        self.start.elapsed().as_secs_f64() * 1000.0
    }

    pub fn log_elapsed(&self, context: &str) {
        info!(
            "{}: {} completed in {}",
            context,
            self.name,
            format_duration(self.elapsed_ms())
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_timer_measures_elapsed_time() {
        let timer = Timer::start("sleep");
        std::thread::sleep(std::time::Duration::from_millis(5));
        assert!(timer.elapsed_ms() >= 5.0);
        timer.log_elapsed("TEST");
    }

    #[test]
    fn test_init_logger_twice_fails_cleanly() {
        let _ = init_logger();
        assert!(init_logger().is_err());
    }
}
