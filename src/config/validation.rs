//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (windows and timeouts > 0, addresses parse)
//! - Check the backend candidate list is usable
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: GatewayConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::net::SocketAddr;

use crate::config::schema::GatewayConfig;

/// Headroom the request timeout keeps above the worst-case fallback chain.
pub const REQUEST_TIMEOUT_MARGIN_SECS: u64 = 10;

/// A single semantic problem found in a configuration.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("backend.models must list at least one model")]
    NoModels,
    #[error("backend.models[{0}] is blank")]
    BlankModel(usize),
    #[error("backend.base_url {0:?} is not a valid URL")]
    InvalidBaseUrl(String),
    #[error("backend.candidate_timeout_secs must be greater than zero")]
    ZeroCandidateTimeout,
    #[error("timeouts.request_secs must be greater than zero")]
    ZeroRequestTimeout,
    #[error("timeouts.request_secs ({request_secs}) does not cover every model timing out; need at least {required}")]
    RequestTimeoutTooShort { request_secs: u64, required: u64 },
    #[error("rate_limit.window_secs must be greater than zero")]
    ZeroWindow,
    #[error("rate_limit.max_requests must be greater than zero")]
    ZeroMaxRequests,
    #[error("rate_limit.max_tracked_clients must be greater than zero")]
    ZeroTrackedClients,
    #[error("listener.bind_address {0:?} is not a socket address")]
    InvalidBindAddress(String),
    #[error("observability.metrics_address {0:?} is not a socket address")]
    InvalidMetricsAddress(String),
}

/// Check a parsed configuration, collecting every error found.
pub fn validate_config(config: &GatewayConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.backend.models.is_empty() {
        errors.push(ValidationError::NoModels);
    }
    for (i, model) in config.backend.models.iter().enumerate() {
        if model.trim().is_empty() {
            errors.push(ValidationError::BlankModel(i));
        }
    }
    if url::Url::parse(&config.backend.base_url).is_err() {
        errors.push(ValidationError::InvalidBaseUrl(config.backend.base_url.clone()));
    }
    if config.backend.candidate_timeout_secs == 0 {
        errors.push(ValidationError::ZeroCandidateTimeout);
    }

    let request_secs = config.timeouts.request_secs;
    let required = min_request_timeout_secs(config);
    if request_secs == 0 {
        errors.push(ValidationError::ZeroRequestTimeout);
    } else if request_secs < required {
        errors.push(ValidationError::RequestTimeoutTooShort { request_secs, required });
    }

    if config.rate_limit.window_secs == 0 {
        errors.push(ValidationError::ZeroWindow);
    }
    if config.rate_limit.max_requests == 0 {
        errors.push(ValidationError::ZeroMaxRequests);
    }
    if config.rate_limit.max_tracked_clients == 0 {
        errors.push(ValidationError::ZeroTrackedClients);
    }

    if config.listener.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::InvalidBindAddress(config.listener.bind_address.clone()));
    }
    if config.observability.metrics_enabled
        && config.observability.metrics_address.parse::<SocketAddr>().is_err()
    {
        errors.push(ValidationError::InvalidMetricsAddress(
            config.observability.metrics_address.clone(),
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

/// Shortest request timeout that still lets every candidate use its full deadline.
pub fn min_request_timeout_secs(config: &GatewayConfig) -> u64 {
    let candidates = u64::try_from(config.backend.models.len()).unwrap_or(u64::MAX);
    config
        .backend
        .candidate_timeout_secs
        .saturating_mul(candidates)
        .saturating_add(REQUEST_TIMEOUT_MARGIN_SECS)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        assert_eq!(validate_config(&GatewayConfig::default()), Ok(()));
    }

    #[test]
    fn test_collects_every_error() {
        let mut config = GatewayConfig::default();
        config.backend.models = vec!["gemini-pro".into(), "  ".into()];
        config.rate_limit.window_secs = 0;
        config.rate_limit.max_requests = 0;
        config.listener.bind_address = "nowhere".into();

        let errors = validate_config(&config).unwrap_err();
        assert_eq!(
            errors,
            vec![
                ValidationError::BlankModel(1),
                ValidationError::ZeroWindow,
                ValidationError::ZeroMaxRequests,
                ValidationError::InvalidBindAddress("nowhere".into()),
            ]
        );
    }

    #[test]
    fn test_empty_model_list_rejected() {
        let mut config = GatewayConfig::default();
        config.backend.models.clear();
        assert_eq!(validate_config(&config), Err(vec![ValidationError::NoModels]));
    }

    #[test]
    fn test_metrics_address_checked_only_when_enabled() {
        let mut config = GatewayConfig::default();
        config.observability.metrics_address = "bogus".into();
        assert!(validate_config(&config).is_ok());

        config.observability.metrics_enabled = true;
        assert_eq!(
            validate_config(&config),
            Err(vec![ValidationError::InvalidMetricsAddress("bogus".into())])
        );
    }

    #[test]
    fn test_zero_request_timeout_rejected() {
        let mut config = GatewayConfig::default();
        config.timeouts.request_secs = 0;
        assert_eq!(validate_config(&config), Err(vec![ValidationError::ZeroRequestTimeout]));
    }

    #[test]
    fn test_request_timeout_must_cover_every_candidate() {
        let mut config = GatewayConfig::default();
        config.backend.models = ["a", "b", "c", "d", "e"].iter().map(|m| m.to_string()).collect();
        config.backend.candidate_timeout_secs = 30;
        config.timeouts.request_secs = 120;

        assert_eq!(
            validate_config(&config),
            Err(vec![ValidationError::RequestTimeoutTooShort {
                request_secs: 120,
                required: 160,
            }])
        );

        config.timeouts.request_secs = min_request_timeout_secs(&config);
        assert_eq!(validate_config(&config), Ok(()));
    }

    #[test]
    fn test_huge_candidate_timeout_does_not_overflow() {
        let mut config = GatewayConfig::default();
        config.backend.candidate_timeout_secs = u64::MAX;
        assert_eq!(min_request_timeout_secs(&config), u64::MAX);
        assert!(validate_config(&config).is_err());
    }
}
