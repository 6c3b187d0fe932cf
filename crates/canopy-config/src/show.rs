use crate::loader::RuntimeConfig;

/// Render the effective runtime configuration as a human-readable block,
/// for a `canopy config show`-style diagnostic command.
#[must_use]
pub fn render_effective_config(config: &RuntimeConfig) -> String {
    format!(
        "log_filter = {:?}\nremote_call_timeout = {}s\nbackend_start_retry = {}s\nsimple_mode_max_iterations = {}",
        config.log_filter,
        config.remote_call_timeout.as_secs(),
        config.backend_start_retry.as_secs(),
        config.simple_mode_max_iterations,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn includes_every_field() {
        let rendered = render_effective_config(&RuntimeConfig::default());
        assert!(rendered.contains("log_filter"));
        assert!(rendered.contains("remote_call_timeout"));
        assert!(rendered.contains("backend_start_retry"));
        assert!(rendered.contains("simple_mode_max_iterations"));
    }
}
