use crate::domain::{
    entities::{ComplianceWeights, EnvironmentContext, Template},
    error::DomainError,
    extractor::ExtractionPolicy,
};

/// Centralized domain validation.
///
/// All validation logic lives here, not scattered across callers.
pub struct DomainValidator;

impl DomainValidator {
    pub fn validate_template(template: &Template) -> Result<(), DomainError> {
        template.validate()
    }

    pub fn validate_environment(context: &EnvironmentContext) -> Result<(), DomainError> {
        context.validate()
    }

    pub fn validate_weights(weights: &ComplianceWeights) -> Result<(), DomainError> {
        weights.validate()
    }

    pub fn validate_policy(policy: &ExtractionPolicy) -> Result<(), DomainError> {
        policy.validate()
    }
}
