use tracing_subscriber::EnvFilter;

pub const LOG_FILTER_ENV: &str = "WEATHER_LOG";
pub const DEFAULT_LOG_FILTER: &str = "warn";

fn filter_from(value: Option<&str>) -> EnvFilter {
    value
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .and_then(|value| EnvFilter::try_new(value).ok())
        .unwrap_or_else(|| EnvFilter::new(DEFAULT_LOG_FILTER))
}

/// Installs the stderr subscriber. Later calls are no-ops.
pub fn init() {
    let configured = std::env::var(LOG_FILTER_ENV).ok();
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter_from(configured.as_deref()))
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn logging_filter_defaults_to_warn() {
        assert_eq!(filter_from(None).to_string(), DEFAULT_LOG_FILTER);
        assert_eq!(filter_from(Some("  ")).to_string(), DEFAULT_LOG_FILTER);
    }

    #[test]
    fn logging_filter_accepts_directives() {
        assert_eq!(
            filter_from(Some("weather_dashboard=debug")).to_string(),
            "weather_dashboard=debug"
        );
    }

    #[test]
    fn logging_init_twice_is_harmless() {
        init();
        init();
    }
}
