//! Classified result of one trigger resolver.

use mfa_trigger_sdk::Event;

use super::DomainError;

/// What a trigger resolver concluded for one request.
#[derive(Debug, Clone, PartialEq)]
pub enum TriggerOutcome {
    /// The named provider must be satisfied.
    Required(Event),
    /// No opinion; the chain continues.
    Miss,
    /// Fatal policy misconfiguration.
    ConfigError(DomainError),
    /// The attempt itself failed (unavailable provider in closed mode, collaborator error).
    UpstreamFailure(DomainError),
}

impl From<Result<Option<Event>, DomainError>> for TriggerOutcome {
    fn from(result: Result<Option<Event>, DomainError>) -> Self {
        match result {
            Ok(Some(event)) => Self::Required(event),
            Ok(None) => Self::Miss,
            Err(e) if e.is_configuration_error() => Self::ConfigError(e),
            Err(e) => Self::UpstreamFailure(e),
        }
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;

    #[test]
    fn classifies_errors() {
        let outcome = TriggerOutcome::from(Err(DomainError::ProviderNotFound {
            provider_id: "mfa-x".to_owned(),
        }));
        assert!(matches!(outcome, TriggerOutcome::ConfigError(_)));

        let outcome = TriggerOutcome::from(Err(DomainError::ProviderUnavailable {
            provider_id: "mfa-x".to_owned(),
        }));
        assert!(matches!(outcome, TriggerOutcome::UpstreamFailure(_)));

        assert_eq!(TriggerOutcome::from(Ok(None)), TriggerOutcome::Miss);
    }
}
