//! SQL dialect definitions and conformance profiles.
//!
//! Two backends are supported: the ERP system speaks a T-SQL dialect
//! (schema-qualified tables, `WITH (NOLOCK)` hints, `GETDATE()`/`DATEADD`),
//! the rental system speaks a Jet/Access dialect (bare table names,
//! `Date()`/`DateAdd`, `Nz`). The profile for each dialect is a fixed data
//! table; validation and repair are driven entirely by it.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::OnceLock;

/// SQL dialect used by a backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SqlDialect {
    /// T-SQL dialect (ERP backend).
    TSql,
    /// Jet/Access dialect (rental backend).
    Jet,
}

impl SqlDialect {
    /// Get a human-readable name for this dialect.
    pub fn name(&self) -> &'static str {
        match self {
            SqlDialect::TSql => "T-SQL",
            SqlDialect::Jet => "Jet",
        }
    }

    /// Parse a catalog dialect tag. Unknown tags are rejected here, at the
    /// construction boundary; the engine itself never sees them.
    pub fn parse(tag: &str) -> Option<Self> {
        match tag.trim().to_lowercase().as_str() {
            "tsql" | "t-sql" | "p21" | "erp" => Some(SqlDialect::TSql),
            "jet" | "access" | "por" | "rental" => Some(SqlDialect::Jet),
            _ => None,
        }
    }
}

impl std::fmt::Display for SqlDialect {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// A syntactic construct the validator can recognize in a SQL string.
///
/// These are pattern checks over a narrow, closed vocabulary; no SQL is
/// ever parsed into an AST.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Marker {
    /// `dbo.`-style schema qualification on table references.
    SchemaPrefix,
    /// `WITH (NOLOCK)` locking hint.
    LockHint,
    /// `GETDATE(` or `DATEADD(` usage.
    TsqlDateFn,
    /// `Date()` or `DateAdd(` usage.
    JetDateFn,
    /// `ISNULL(` usage.
    TsqlCoalesceFn,
    /// `Nz(` usage.
    JetCoalesceFn,
}

impl Marker {
    /// Whether the marker appears in the given SQL text (case-insensitive).
    pub fn present_in(&self, sql: &str) -> bool {
        let lower = sql.to_lowercase();
        match self {
            Marker::SchemaPrefix => lower.contains("dbo."),
            Marker::LockHint => lower.contains("with (nolock)"),
            Marker::TsqlDateFn => lower.contains("getdate(") || lower.contains("dateadd(day")
                || lower.contains("dateadd(month")
                || lower.contains("dateadd(week")
                || lower.contains("dateadd(year"),
            // Jet spells DateAdd with a quoted interval code: DateAdd('d', ...)
            Marker::JetDateFn => jet_date_now_re().is_match(sql) || lower.contains("dateadd('"),
            Marker::TsqlCoalesceFn => lower.contains("isnull("),
            Marker::JetCoalesceFn => lower.contains("nz("),
        }
    }
}

// `GETDATE()` ends in `date()`, so a substring check cannot tell the two
// apart; the word boundary can.
fn jet_date_now_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?i)\bdate\(\)").unwrap())
}

/// Conformance profile for one dialect.
///
/// Immutable, one static instance per dialect. The validator walks this
/// table; the generator and repair rules read their vocabulary from it.
#[derive(Debug, Clone)]
pub struct DialectProfile {
    pub name: SqlDialect,

    /// Table references must (T-SQL) or must not (Jet) be schema-qualified.
    pub requires_schema_prefix: bool,

    /// `WITH (NOLOCK)` must (T-SQL) or must not (Jet) follow the table.
    pub requires_lock_hint: bool,

    /// Constructs belonging to the other dialect; any occurrence is a
    /// conformance violation.
    pub forbidden_constructs: &'static [Marker],

    /// Current-timestamp function, e.g. `GETDATE()`.
    pub date_now_fn: &'static str,

    /// Date-arithmetic function name, e.g. `DATEADD`.
    pub date_add_fn: &'static str,

    /// Null-coalescing function name, e.g. `ISNULL`.
    pub null_coalesce_fn: &'static str,

    /// Canonical alias every generated query exposes its value under.
    pub result_alias: &'static str,

    /// Concrete schema prefix text, where required.
    pub schema_prefix: &'static str,

    /// Concrete lock hint text, where required.
    pub lock_hint: &'static str,
}

static TSQL_PROFILE: DialectProfile = DialectProfile {
    name: SqlDialect::TSql,
    requires_schema_prefix: true,
    requires_lock_hint: true,
    forbidden_constructs: &[Marker::JetDateFn, Marker::JetCoalesceFn],
    date_now_fn: "GETDATE()",
    date_add_fn: "DATEADD",
    null_coalesce_fn: "ISNULL",
    result_alias: "value",
    schema_prefix: "dbo.",
    lock_hint: "WITH (NOLOCK)",
};

static JET_PROFILE: DialectProfile = DialectProfile {
    name: SqlDialect::Jet,
    requires_schema_prefix: false,
    requires_lock_hint: false,
    forbidden_constructs: &[
        Marker::SchemaPrefix,
        Marker::LockHint,
        Marker::TsqlDateFn,
        Marker::TsqlCoalesceFn,
    ],
    date_now_fn: "Date()",
    date_add_fn: "DateAdd",
    null_coalesce_fn: "Nz",
    result_alias: "value",
    schema_prefix: "",
    lock_hint: "",
};

impl DialectProfile {
    /// Profile lookup. Total over the closed set of dialects; no error path.
    pub fn of(dialect: SqlDialect) -> &'static DialectProfile {
        match dialect {
            SqlDialect::TSql => &TSQL_PROFILE,
            SqlDialect::Jet => &JET_PROFILE,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn profile_lookup_is_total() {
        assert_eq!(DialectProfile::of(SqlDialect::TSql).name, SqlDialect::TSql);
        assert_eq!(DialectProfile::of(SqlDialect::Jet).name, SqlDialect::Jet);
    }

    #[test]
    fn forbidden_sets_are_disjoint_from_own_vocabulary() {
        let tsql = DialectProfile::of(SqlDialect::TSql);
        assert!(!tsql.forbidden_constructs.contains(&Marker::TsqlDateFn));
        let jet = DialectProfile::of(SqlDialect::Jet);
        assert!(!jet.forbidden_constructs.contains(&Marker::JetDateFn));
    }

    #[test]
    fn markers_detect_their_constructs() {
        assert!(Marker::LockHint.present_in("SELECT 1 FROM dbo.t WITH (NOLOCK)"));
        assert!(Marker::SchemaPrefix.present_in("SELECT 1 FROM dbo.t"));
        assert!(Marker::TsqlDateFn.present_in("WHERE d >= DATEADD(day, -7, GETDATE())"));
        assert!(Marker::JetDateFn.present_in("WHERE d >= DateAdd('d', -7, Date())"));
        assert!(!Marker::JetDateFn.present_in("WHERE d >= DATEADD(day, -7, GETDATE())"));
    }

    #[test]
    fn getdate_is_not_mistaken_for_the_jet_date_fn() {
        assert!(!Marker::JetDateFn.present_in(
            "SELECT COUNT(*) AS value FROM dbo.oe_hdr WITH (NOLOCK) \
             WHERE order_date >= DATEADD(day, -7, GETDATE())"
        ));
        assert!(!Marker::JetDateFn.present_in("SELECT getdate() AS value FROM dbo.t"));
        assert!(Marker::JetDateFn.present_in("SELECT Date() AS value FROM Rentals"));
        assert!(Marker::JetDateFn.present_in("WHERE CreatedDate >= date()"));
    }

    #[test]
    fn dialect_tags_parse_at_the_boundary() {
        assert_eq!(SqlDialect::parse("P21"), Some(SqlDialect::TSql));
        assert_eq!(SqlDialect::parse("por"), Some(SqlDialect::Jet));
        assert_eq!(SqlDialect::parse("oracle"), None);
    }
}
