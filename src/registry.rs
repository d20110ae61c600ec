// 🗂️ Rule Registry - Ordered collection of active control rules
// Duplicate identifiers are a configuration defect, fatal at startup

use crate::rules::{
    DeprecatedAccountUsage, InvoiceReceiptMismatch, Rule, UnbalancedJournal, ZeroAmountEntry,
    ZeroCostItem,
};
use rust_decimal::Decimal;
use thiserror::Error;
use tracing::info;

// ============================================================================
// REGISTRY ERRORS
// ============================================================================

#[derive(Debug, Error)]
pub enum RegistryError {
    /// Two rules with the same identifier indicate a programming or
    /// configuration defect, not a data condition - this aborts startup.
    #[error("duplicate rule identifier '{0}'")]
    DuplicateRule(String),

    #[error("unknown rule '{0}' in enabled-rules list")]
    UnknownRule(String),
}

// ============================================================================
// RULE REGISTRY
// ============================================================================

struct RegisteredRule {
    rule: Box<dyn Rule>,
    enabled: bool,
}

/// Holds the rules to run, in registration order.
///
/// Order affects only report grouping, never correctness - no rule depends
/// on another's output. Disabling removes a rule from iteration without
/// restructuring anything else.
pub struct RuleRegistry {
    rules: Vec<RegisteredRule>,
}

impl std::fmt::Debug for RuleRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RuleRegistry")
            .field(
                "rules",
                &self
                    .rules
                    .iter()
                    .map(|r| (r.rule.id(), r.enabled))
                    .collect::<Vec<_>>(),
            )
            .finish()
    }
}

impl RuleRegistry {
    pub fn new() -> Self {
        RuleRegistry { rules: Vec::new() }
    }

    /// Registry with the full built-in rule set, in the order the original
    /// checks ran: journals first, then documents, then inventory.
    pub fn with_default_rules(invoice_tolerance: Decimal) -> Self {
        // Built-in ids are distinct by construction, so no duplicate check.
        let rules = Self::default_rules(invoice_tolerance)
            .into_iter()
            .map(|rule| RegisteredRule { rule, enabled: true })
            .collect();
        RuleRegistry { rules }
    }

    fn default_rules(invoice_tolerance: Decimal) -> Vec<Box<dyn Rule>> {
        vec![
            Box::new(ZeroAmountEntry),
            Box::new(UnbalancedJournal),
            Box::new(DeprecatedAccountUsage),
            Box::new(InvoiceReceiptMismatch::with_tolerance(invoice_tolerance)),
            Box::new(ZeroCostItem),
        ]
    }

    /// Registry restricted to an enabled-rules list (startup configuration).
    /// Names must match built-in rule identifiers.
    pub fn from_enabled(
        enabled: &[String],
        invoice_tolerance: Decimal,
    ) -> Result<Self, RegistryError> {
        let mut registry = RuleRegistry::new();

        for name in enabled {
            let rule = Self::default_rules(invoice_tolerance)
                .into_iter()
                .find(|r| r.id() == name)
                .ok_or_else(|| RegistryError::UnknownRule(name.clone()))?;
            registry.register(rule)?;
        }

        info!(rules = registry.active_count(), "rule registry configured");
        Ok(registry)
    }

    /// Add a rule. Fails if the identifier is already present.
    pub fn register(&mut self, rule: Box<dyn Rule>) -> Result<(), RegistryError> {
        if self.rules.iter().any(|r| r.rule.id() == rule.id()) {
            return Err(RegistryError::DuplicateRule(rule.id().to_string()));
        }
        self.rules.push(RegisteredRule { rule, enabled: true });
        Ok(())
    }

    /// Active rules in registration order. Restartable - each call yields a
    /// fresh iteration.
    pub fn active(&self) -> impl Iterator<Item = &dyn Rule> {
        self.rules
            .iter()
            .filter(|r| r.enabled)
            .map(|r| r.rule.as_ref())
    }

    /// Disable a rule by identifier. Returns false if no such rule.
    pub fn disable(&mut self, id: &str) -> bool {
        self.set_enabled(id, false)
    }

    /// Re-enable a previously disabled rule.
    pub fn enable(&mut self, id: &str) -> bool {
        self.set_enabled(id, true)
    }

    fn set_enabled(&mut self, id: &str, enabled: bool) -> bool {
        match self.rules.iter_mut().find(|r| r.rule.id() == id) {
            Some(r) => {
                r.enabled = enabled;
                true
            }
            None => false,
        }
    }

    pub fn active_count(&self) -> usize {
        self.rules.iter().filter(|r| r.enabled).count()
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

impl Default for RuleRegistry {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_default_registry_has_five_rules() {
        let registry = RuleRegistry::with_default_rules(dec!(0.01));
        assert_eq!(registry.len(), 5);
        assert_eq!(registry.active_count(), 5);

        let ids: Vec<&str> = registry.active().map(|r| r.id()).collect();
        assert_eq!(
            ids,
            vec![
                "zero_amount_entry",
                "unbalanced_journal",
                "deprecated_account_usage",
                "invoice_receipt_mismatch",
                "zero_cost_item",
            ]
        );
    }

    #[test]
    fn test_duplicate_identifier_rejected() {
        let mut registry = RuleRegistry::new();
        registry.register(Box::new(ZeroAmountEntry)).unwrap();

        let err = registry.register(Box::new(ZeroAmountEntry)).unwrap_err();
        assert!(matches!(err, RegistryError::DuplicateRule(id) if id == "zero_amount_entry"));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_disable_removes_from_iteration_only() {
        let mut registry = RuleRegistry::with_default_rules(dec!(0.01));

        assert!(registry.disable("zero_cost_item"));
        assert_eq!(registry.len(), 5);
        assert_eq!(registry.active_count(), 4);
        assert!(registry.active().all(|r| r.id() != "zero_cost_item"));

        assert!(registry.enable("zero_cost_item"));
        assert_eq!(registry.active_count(), 5);

        assert!(!registry.disable("no_such_rule"));
    }

    #[test]
    fn test_iteration_is_restartable() {
        let registry = RuleRegistry::with_default_rules(dec!(0.01));
        let first: Vec<&str> = registry.active().map(|r| r.id()).collect();
        let second: Vec<&str> = registry.active().map(|r| r.id()).collect();
        assert_eq!(first, second);
    }

    #[test]
    fn test_from_enabled_subset_preserves_order() {
        let enabled = vec![
            "unbalanced_journal".to_string(),
            "zero_cost_item".to_string(),
        ];
        let registry = RuleRegistry::from_enabled(&enabled, dec!(0.01)).unwrap();

        let ids: Vec<&str> = registry.active().map(|r| r.id()).collect();
        assert_eq!(ids, vec!["unbalanced_journal", "zero_cost_item"]);
    }

    #[test]
    fn test_from_enabled_unknown_rule_fails() {
        let enabled = vec!["vat_consistency".to_string()];
        let err = RuleRegistry::from_enabled(&enabled, dec!(0.01)).unwrap_err();
        assert!(matches!(err, RegistryError::UnknownRule(name) if name == "vat_consistency"));
    }
}
