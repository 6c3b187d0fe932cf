/// A partially specified layer of runtime configuration, as read from one
/// file or the environment. `None` means "this layer does not opine" so a
/// later, higher-priority layer (or the hardcoded default) can win.
#[derive(Debug, Clone, Default, serde::Deserialize)]
pub struct RuntimeConfigLayer {
    pub(crate) log_filter: Option<String>,
    pub(crate) remote_call_timeout_secs: Option<u64>,
    pub(crate) backend_start_retry_secs: Option<u64>,
    pub(crate) simple_mode_max_iterations: Option<u32>,
}

impl RuntimeConfigLayer {
    /// Overlay `other` on top of `self`: every field `other` sets wins,
    /// every field it leaves unset falls through to `self`.
    #[must_use]
    pub fn merge(self, other: Self) -> Self {
        Self {
            log_filter: other.log_filter.or(self.log_filter),
            remote_call_timeout_secs: other.remote_call_timeout_secs.or(self.remote_call_timeout_secs),
            backend_start_retry_secs: other.backend_start_retry_secs.or(self.backend_start_retry_secs),
            simple_mode_max_iterations: other
                .simple_mode_max_iterations
                .or(self.simple_mode_max_iterations),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn later_layer_wins_field_by_field() {
        let base = RuntimeConfigLayer {
            log_filter: Some("info".into()),
            remote_call_timeout_secs: Some(60),
            backend_start_retry_secs: None,
            simple_mode_max_iterations: None,
        };
        let overlay = RuntimeConfigLayer {
            log_filter: None,
            remote_call_timeout_secs: Some(30),
            backend_start_retry_secs: Some(5),
            simple_mode_max_iterations: None,
        };
        let merged = base.merge(overlay);
        assert_eq!(merged.log_filter.as_deref(), Some("info"));
        assert_eq!(merged.remote_call_timeout_secs, Some(30));
        assert_eq!(merged.backend_start_retry_secs, Some(5));
        assert_eq!(merged.simple_mode_max_iterations, None);
    }
}
