//! Filter compilation errors.

use tenantdb_core::error::DomainError;
use thiserror::Error;

/// Errors raised while compiling a filter event stream.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FilterError {
    /// A group end arrived while no group was open.
    #[error("group end without a matching group start")]
    UnbalancedGroupEnd,

    /// The event stream ended with groups still open.
    #[error("{0} group(s) still open at the end of the filter")]
    UnclosedGroups(usize),

    /// A comparison named no field.
    #[error("comparison without a field name")]
    EmptyField,

    /// The external parser rejected the filter text.
    #[error("filter parse error: {0}")]
    Parse(String),
}

impl FilterError {
    /// Returns `true` for violations of the group start/end contract.
    #[must_use]
    pub fn is_contract_violation(&self) -> bool {
        matches!(self, Self::UnbalancedGroupEnd | Self::UnclosedGroups(_))
    }
}

impl From<FilterError> for DomainError {
    fn from(err: FilterError) -> Self {
        if err.is_contract_violation() {
            DomainError::ContractViolation(err.to_string())
        } else {
            DomainError::InvalidFilter(err.to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use tenantdb_core::error::DomainError;

    use super::FilterError;

    #[test]
    fn test_group_errors_map_to_contract_violation() {
        assert!(matches!(
            DomainError::from(FilterError::UnbalancedGroupEnd),
            DomainError::ContractViolation(_)
        ));
        assert!(matches!(
            DomainError::from(FilterError::UnclosedGroups(2)),
            DomainError::ContractViolation(_)
        ));
    }

    #[test]
    fn test_parse_errors_map_to_invalid_filter() {
        match DomainError::from(FilterError::Parse("unexpected ';'".into())) {
            DomainError::InvalidFilter(msg) => assert!(msg.contains("unexpected ';'")),
            other => panic!("expected InvalidFilter, got {other:?}"),
        }
    }
}
