//! Dialect conformance validation.
//!
//! An ordered chain of pure string/pattern checks; the first failing rule
//! determines the outcome and later rules are not evaluated. Callers rely
//! on this first-violated-rule semantics for repair targeting, so the rule
//! order is part of the contract. No SQL is parsed into an AST.

use mend_backend::{DialectProfile, Marker};
use serde::{Deserialize, Serialize};

/// Which conformance rule a SQL string violated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ViolationKind {
    EmptySql,
    MissingSelect,
    MissingFrom,
    MissingResultAlias,
    MissingSchemaPrefix,
    ForbiddenSchemaPrefix,
    MissingLockHint,
    ForbiddenLockHint,
    /// A construct belonging to the other dialect is present.
    ForeignConstruct(Marker),
}

impl std::fmt::Display for ViolationKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ViolationKind::EmptySql => write!(f, "SQL text is empty"),
            ViolationKind::MissingSelect => write!(f, "missing SELECT clause"),
            ViolationKind::MissingFrom => write!(f, "missing FROM clause"),
            ViolationKind::MissingResultAlias => write!(f, "result not aliased to the dialect's value column"),
            ViolationKind::MissingSchemaPrefix => write!(f, "table reference lacks required schema prefix"),
            ViolationKind::ForbiddenSchemaPrefix => write!(f, "schema prefix is not allowed in this dialect"),
            ViolationKind::MissingLockHint => write!(f, "missing required lock hint"),
            ViolationKind::ForbiddenLockHint => write!(f, "lock hint is not allowed in this dialect"),
            ViolationKind::ForeignConstruct(m) => write!(f, "foreign dialect construct present: {:?}", m),
        }
    }
}

/// Result of validating one SQL string against one dialect profile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ValidationOutcome {
    Valid,
    Invalid(ViolationKind),
}

impl ValidationOutcome {
    pub fn is_valid(&self) -> bool {
        matches!(self, ValidationOutcome::Valid)
    }
}

type Rule = fn(&DialectProfile, &str) -> Option<ViolationKind>;

/// The ordered conformance rule chain. Order is a contract.
const RULES: &[Rule] = &[
    non_empty,
    has_select,
    has_from,
    has_result_alias,
    schema_prefix_matches,
    lock_hint_matches,
    no_foreign_functions,
];

/// Validate a SQL string against a dialect profile.
///
/// Deterministic and pure; repeated calls with the same inputs yield the
/// same outcome.
pub fn validate(profile: &DialectProfile, sql: &str) -> ValidationOutcome {
    for rule in RULES {
        if let Some(kind) = rule(profile, sql) {
            return ValidationOutcome::Invalid(kind);
        }
    }
    ValidationOutcome::Valid
}

fn non_empty(_profile: &DialectProfile, sql: &str) -> Option<ViolationKind> {
    sql.trim().is_empty().then_some(ViolationKind::EmptySql)
}

fn has_select(_profile: &DialectProfile, sql: &str) -> Option<ViolationKind> {
    (!sql.to_lowercase().contains("select")).then_some(ViolationKind::MissingSelect)
}

fn has_from(_profile: &DialectProfile, sql: &str) -> Option<ViolationKind> {
    (!sql.to_lowercase().contains("from")).then_some(ViolationKind::MissingFrom)
}

fn has_result_alias(profile: &DialectProfile, sql: &str) -> Option<ViolationKind> {
    let needle = format!("as {}", profile.result_alias.to_lowercase());
    (!sql.to_lowercase().contains(&needle)).then_some(ViolationKind::MissingResultAlias)
}

fn schema_prefix_matches(profile: &DialectProfile, sql: &str) -> Option<ViolationKind> {
    let present = Marker::SchemaPrefix.present_in(sql);
    if profile.requires_schema_prefix && !present {
        Some(ViolationKind::MissingSchemaPrefix)
    } else if !profile.requires_schema_prefix && present {
        Some(ViolationKind::ForbiddenSchemaPrefix)
    } else {
        None
    }
}

fn lock_hint_matches(profile: &DialectProfile, sql: &str) -> Option<ViolationKind> {
    let present = Marker::LockHint.present_in(sql);
    if profile.requires_lock_hint && !present {
        Some(ViolationKind::MissingLockHint)
    } else if !profile.requires_lock_hint && present {
        Some(ViolationKind::ForbiddenLockHint)
    } else {
        None
    }
}

/// Date and null-handling vocabulary must belong to this dialect.
/// Prefix and hint markers are covered by the two rules above.
fn no_foreign_functions(profile: &DialectProfile, sql: &str) -> Option<ViolationKind> {
    for marker in profile.forbidden_constructs {
        match marker {
            Marker::SchemaPrefix | Marker::LockHint => continue,
            m if m.present_in(sql) => return Some(ViolationKind::ForeignConstruct(*m)),
            _ => {}
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use mend_backend::SqlDialect;

    fn tsql() -> &'static DialectProfile {
        DialectProfile::of(SqlDialect::TSql)
    }

    fn jet() -> &'static DialectProfile {
        DialectProfile::of(SqlDialect::Jet)
    }

    #[test]
    fn empty_text_fails_first() {
        assert_eq!(
            validate(tsql(), "   "),
            ValidationOutcome::Invalid(ViolationKind::EmptySql)
        );
    }

    #[test]
    fn rule_order_short_circuits() {
        // No SELECT and no FROM: the SELECT rule wins because it runs first.
        assert_eq!(
            validate(tsql(), "DELETE everything"),
            ValidationOutcome::Invalid(ViolationKind::MissingSelect)
        );
    }

    #[test]
    fn unqualified_table_fails_under_tsql() {
        assert_eq!(
            validate(tsql(), "SELECT Count(*) as value FROM Rentals"),
            ValidationOutcome::Invalid(ViolationKind::MissingSchemaPrefix)
        );
    }

    #[test]
    fn same_string_is_valid_under_jet() {
        assert_eq!(
            validate(jet(), "SELECT Count(*) as value FROM Rentals"),
            ValidationOutcome::Valid
        );
    }

    #[test]
    fn lock_hint_is_forbidden_under_jet() {
        let sql = "SELECT COUNT(*) AS value FROM Rentals WITH (NOLOCK)";
        assert_eq!(
            validate(jet(), sql),
            ValidationOutcome::Invalid(ViolationKind::ForbiddenLockHint)
        );
    }

    #[test]
    fn qualified_hinted_query_needs_tsql_dates() {
        let sql = "SELECT COUNT(*) AS value FROM dbo.oe_hdr WITH (NOLOCK) \
                   WHERE order_date >= DateAdd('d', -7, Date())";
        assert_eq!(
            validate(tsql(), sql),
            ValidationOutcome::Invalid(ViolationKind::ForeignConstruct(Marker::JetDateFn))
        );
    }

    #[test]
    fn well_formed_tsql_query_is_valid() {
        let sql = "SELECT COUNT(*) AS value FROM dbo.oe_hdr WITH (NOLOCK) \
                   WHERE order_date >= DATEADD(day, -7, GETDATE())";
        assert_eq!(validate(tsql(), sql), ValidationOutcome::Valid);
    }

    #[test]
    fn missing_alias_reported_before_prefix_check() {
        assert_eq!(
            validate(tsql(), "SELECT COUNT(*) FROM oe_hdr"),
            ValidationOutcome::Invalid(ViolationKind::MissingResultAlias)
        );
    }
}
