//! Semantic-preserving repair rules for empty-result queries.
//!
//! Each rule is a named, pure function `(sql) -> Option<sql>` that returns
//! `None` when inapplicable, composed into a fixed, ordered pipeline. The
//! date-window rule walks a finite escalation ladder one step at a time;
//! the remaining rules fire at most once, so a repair run is bounded at
//! `MAX_REPAIR_ATTEMPTS` without any loop counter tricks. Rules only widen
//! or coarsen a query; they never change what it conceptually measures
//! beyond the window/predicate they touch, and every accepted output must
//! re-validate against the dialect profile.

use crate::generator::{self, TemplateId};
use crate::metric::MetricDefinition;
use crate::tables::TableMap;
use crate::validator::{self, ValidationOutcome};
use mend_backend::{DialectProfile, SqlDialect};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::OnceLock;

/// Hard ceiling on attempts in one repair run: up to three ladder steps
/// for the date window (an off-ladder start below the first rung walks
/// all of them) plus one each for the other three rules.
pub const MAX_REPAIR_ATTEMPTS: usize = 6;

/// Identity of one repair rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RepairRuleId {
    WidenDateWindow,
    RelaxPredicate,
    SubstituteTable,
    CanonicalFallback,
}

/// One accepted rewrite step.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RepairAttempt {
    pub rule: RepairRuleId,
    pub input_sql: String,
    pub output_sql: String,
    pub changed: bool,
}

/// Context a rule may consult: the dialect profile plus the metric's
/// lower-cased name text (for the canonical-fallback patterns).
pub struct RepairContext<'a> {
    pub profile: &'static DialectProfile,
    pub metric_text: String,
    pub table_map: &'a TableMap,
}

impl<'a> RepairContext<'a> {
    pub fn new(metric: &MetricDefinition, table_map: &'a TableMap) -> Self {
        Self {
            profile: DialectProfile::of(metric.dialect),
            metric_text: metric.classification_text(),
            table_map,
        }
    }
}

/// The ordered rule pipeline. Order is a contract: the coarse predicate
/// relaxation must only run after date widening has been exhausted.
pub const RULES: &[RepairRuleId] = &[
    RepairRuleId::WidenDateWindow,
    RepairRuleId::RelaxPredicate,
    RepairRuleId::SubstituteTable,
    RepairRuleId::CanonicalFallback,
];

impl RepairRuleId {
    /// Apply this rule to a SQL string. `None` means inapplicable; an
    /// unchanged output is treated the same by callers.
    pub fn apply(&self, ctx: &RepairContext, sql: &str) -> Option<String> {
        match self {
            RepairRuleId::WidenDateWindow => widen_date_window(ctx, sql),
            RepairRuleId::RelaxPredicate => relax_predicate(sql),
            RepairRuleId::SubstituteTable => substitute_table(ctx, sql),
            RepairRuleId::CanonicalFallback => canonical_fallback(ctx, sql),
        }
    }

    /// Whether the rule may fire again in the same run. Only the date
    /// ladder walks multiple steps; it terminates when the ladder tops out.
    pub fn repeatable(&self) -> bool {
        matches!(self, RepairRuleId::WidenDateWindow)
    }
}

/// Apply the whole pipeline as a pure computation, assuming every step
/// still yields an empty result. This is the worst-case attempt sequence
/// the runner can produce; the runner itself stops at the first non-empty
/// re-execution.
pub fn apply_all(ctx: &RepairContext, sql: &str) -> Vec<RepairAttempt> {
    let mut attempts = Vec::new();
    let mut current = sql.to_string();

    'rules: for rule in RULES {
        loop {
            if attempts.len() >= MAX_REPAIR_ATTEMPTS {
                break 'rules;
            }
            let Some(candidate) = rule.apply(ctx, &current) else {
                break;
            };
            if candidate == current {
                break;
            }
            if validator::validate(ctx.profile, &candidate) != ValidationOutcome::Valid {
                break;
            }
            attempts.push(RepairAttempt {
                rule: *rule,
                input_sql: current.clone(),
                output_sql: candidate.clone(),
                changed: true,
            });
            current = candidate;
            if !rule.repeatable() {
                break;
            }
        }
    }

    attempts
}

// Rule 1: widen the look-back window one ladder step (7 -> 30 -> 90 days,
// 1 -> 6 -> 12 months). Values between rungs move up to the next rung.

const DAY_LADDER: &[u32] = &[7, 30, 90];
const MONTH_LADDER: &[u32] = &[1, 6, 12];

fn tsql_lookback_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?i)DATEADD\(\s*(day|month)\s*,\s*-(\d+)").unwrap())
}

fn jet_lookback_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?i)DATEADD\(\s*'([dm])'\s*,\s*-(\d+)").unwrap())
}

fn widen_date_window(ctx: &RepairContext, sql: &str) -> Option<String> {
    let re = match ctx.profile.name {
        SqlDialect::TSql => tsql_lookback_re(),
        SqlDialect::Jet => jet_lookback_re(),
    };
    let caps = re.captures(sql)?;
    let unit = caps.get(1)?.as_str().to_lowercase();
    let number = caps.get(2)?;
    let n: u32 = number.as_str().parse().ok()?;

    let ladder = if unit.starts_with('m') { MONTH_LADDER } else { DAY_LADDER };
    let next = ladder.iter().copied().find(|&rung| rung > n)?;

    let mut out = sql.to_string();
    out.replace_range(number.range(), &next.to_string());
    Some(out)
}

// Rule 2: truncate the WHERE body to a tautology, keeping any trailing
// GROUP BY / ORDER BY / HAVING. Coarse by design; runs only after the
// date ladder is exhausted.

fn where_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?i)\bWHERE\b").unwrap())
}

fn tail_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?i)\b(GROUP\s+BY|ORDER\s+BY|HAVING)\b").unwrap())
}

fn relax_predicate(sql: &str) -> Option<String> {
    let where_match = where_re().find(sql)?;
    let body_start = where_match.end();
    let body_end = tail_re()
        .find_at(sql, body_start)
        .map(|m| m.start())
        .unwrap_or(sql.len());

    if sql[body_start..body_end].trim() == "1=1" {
        return None;
    }

    let tail = sql[body_end..].trim_end();
    let mut out = String::with_capacity(sql.len());
    out.push_str(&sql[..body_start]);
    out.push_str(" 1=1");
    if !tail.is_empty() {
        out.push(' ');
        out.push_str(tail);
    }
    Some(out)
}

// Rule 3: substitute tables that were renamed (or never existed) in the
// live schemas. Fixed mapping per dialect, first hit wins.

const TSQL_TABLE_FIXES: &[(&str, &str)] = &[
    ("dbo.order_hdr", "dbo.oe_hdr"),
    ("dbo.oe_header", "dbo.oe_hdr"),
    ("dbo.inv_master", "dbo.inv_mast"),
    ("dbo.ar_open_item", "dbo.ar_open_items"),
];

const JET_TABLE_FIXES: &[(&str, &str)] = &[
    ("RentalContracts", "Rentals"),
    ("ItemMaster", "Items"),
    ("ARDetail", "AccountsReceivable"),
];

fn tsql_table_fix_res() -> &'static [(Regex, &'static str)] {
    static FIXES: OnceLock<Vec<(Regex, &'static str)>> = OnceLock::new();
    FIXES.get_or_init(|| compile_table_fixes(TSQL_TABLE_FIXES))
}

fn jet_table_fix_res() -> &'static [(Regex, &'static str)] {
    static FIXES: OnceLock<Vec<(Regex, &'static str)>> = OnceLock::new();
    FIXES.get_or_init(|| compile_table_fixes(JET_TABLE_FIXES))
}

fn compile_table_fixes(fixes: &[(&str, &'static str)]) -> Vec<(Regex, &'static str)> {
    fixes
        .iter()
        .map(|(bad, good)| {
            // Word boundary keeps e.g. ar_open_item from matching inside
            // ar_open_items.
            let re = Regex::new(&format!(r"(?i){}\b", regex::escape(bad))).unwrap();
            (re, *good)
        })
        .collect()
}

fn substitute_table(ctx: &RepairContext, sql: &str) -> Option<String> {
    let fixes = match ctx.profile.name {
        SqlDialect::TSql => tsql_table_fix_res(),
        SqlDialect::Jet => jet_table_fix_res(),
    };
    for (re, good) in fixes {
        if let Some(m) = re.find(sql) {
            let mut out = sql.to_string();
            out.replace_range(m.range(), good);
            return Some(out);
        }
    }
    None
}

// Rule 4: whole-query replacement with the known-good canonical query for
// a small fixed set of metric name patterns. Last resort.

const CANONICAL_PATTERNS: &[(&str, TemplateId)] = &[
    ("inventory", TemplateId::InventoryValue),
    ("ar aging", TemplateId::ArAgingTotal),
    ("aging", TemplateId::ArAgingTotal),
];

fn canonical_fallback(ctx: &RepairContext, sql: &str) -> Option<String> {
    for (pattern, template) in CANONICAL_PATTERNS {
        if ctx.metric_text.contains(pattern) {
            let canonical = generator::instantiate(*template, ctx.profile, ctx.table_map);
            if canonical != sql {
                return Some(canonical);
            }
            return None;
        }
    }
    None
}
