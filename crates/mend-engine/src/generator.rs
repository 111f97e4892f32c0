//! Expression generation: abstract metric → dialect-correct SQL.
//!
//! Classification is keyword-based over an ordered data table; first match
//! wins. Adding a metric pattern is a data change, not a code change. A
//! metric whose hand-tuned `raw_expression` already conforms to the target
//! dialect is passed through untouched; regeneration would destroy tuning.

use crate::metric::MetricDefinition;
use crate::tables::{Fact, TableMap};
use crate::validator::{self, ValidationOutcome};
use mend_backend::{DialectProfile, SqlDialect};
use serde::{Deserialize, Serialize};

/// Canonical SQL skeletons the generator can instantiate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TemplateId {
    OrderCount,
    RevenueSum,
    DailyRevenue,
    OpenRentalCount,
    CustomerCount,
    InventoryValue,
    ArAgingTotal,
    /// Dialect default when no keyword matches.
    RowCount,
}

/// How the emitted SQL was produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GenerationSource {
    /// The metric's raw expression already conformed; emitted unchanged.
    Passthrough,
    /// A keyword matched and the named template was instantiated.
    Template(TemplateId),
    /// No keyword matched; the dialect default template was used.
    /// Reported distinctly because confidence in the SQL is lower.
    Fallback,
}

/// Generated SQL plus its provenance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeneratedSql {
    pub sql: String,
    pub source: GenerationSource,
}

/// Ordered keyword → template table. Earlier entries take priority, so
/// more specific phrases sit above their substrings.
const KEYWORD_TEMPLATES: &[(&str, TemplateId)] = &[
    ("ar aging", TemplateId::ArAgingTotal),
    ("aging", TemplateId::ArAgingTotal),
    ("inventory", TemplateId::InventoryValue),
    ("daily revenue", TemplateId::DailyRevenue),
    ("revenue", TemplateId::RevenueSum),
    ("sales", TemplateId::RevenueSum),
    ("total orders", TemplateId::OrderCount),
    ("order", TemplateId::OrderCount),
    ("rental", TemplateId::OpenRentalCount),
    ("customer", TemplateId::CustomerCount),
];

/// Generate dialect-correct SQL for a metric.
///
/// Pure function of its inputs. If the raw expression already validates
/// under the target profile it is returned unchanged.
pub fn generate(metric: &MetricDefinition, table_map: &TableMap) -> GeneratedSql {
    let profile = DialectProfile::of(metric.dialect);

    if validator::validate(profile, &metric.raw_expression) == ValidationOutcome::Valid {
        return GeneratedSql {
            sql: metric.raw_expression.clone(),
            source: GenerationSource::Passthrough,
        };
    }

    let text = metric.classification_text();
    for (keyword, template) in KEYWORD_TEMPLATES {
        if text.contains(keyword) {
            return GeneratedSql {
                sql: instantiate(*template, profile, table_map),
                source: GenerationSource::Template(*template),
            };
        }
    }

    GeneratedSql {
        sql: instantiate(TemplateId::RowCount, profile, table_map),
        source: GenerationSource::Fallback,
    }
}

/// Instantiate one template for one dialect.
///
/// Also used by the repair engine's canonical-fallback rule, so templates
/// and repairs can never drift apart.
pub fn instantiate(template: TemplateId, profile: &DialectProfile, table_map: &TableMap) -> String {
    let dialect = profile.name;
    match template {
        TemplateId::OrderCount => {
            let src = table_map.source(dialect, Fact::Orders);
            format!(
                "SELECT COUNT(*) AS {alias} FROM {from} WHERE {date} >= {cutoff}",
                alias = profile.result_alias,
                from = from_clause(profile, &src.table),
                date = src.date_column,
                cutoff = lookback(profile, DateUnit::Day, 7),
            )
        }
        TemplateId::RevenueSum => {
            let src = table_map.source(dialect, Fact::Invoices);
            format!(
                "SELECT {sum} AS {alias} FROM {from} WHERE {date} >= {cutoff}",
                sum = coalesced_sum(profile, &src.amount_column),
                alias = profile.result_alias,
                from = from_clause(profile, &src.table),
                date = src.date_column,
                cutoff = lookback(profile, DateUnit::Day, 30),
            )
        }
        TemplateId::DailyRevenue => {
            let src = table_map.source(dialect, Fact::Invoices);
            format!(
                "SELECT {sum} AS {alias} FROM {from} WHERE {date} >= {cutoff}",
                sum = coalesced_sum(profile, &src.amount_column),
                alias = profile.result_alias,
                from = from_clause(profile, &src.table),
                date = src.date_column,
                cutoff = lookback(profile, DateUnit::Day, 1),
            )
        }
        TemplateId::OpenRentalCount => {
            let src = table_map.source(dialect, Fact::Rentals);
            format!(
                "SELECT COUNT(*) AS {alias} FROM {from} WHERE {date} >= {cutoff}",
                alias = profile.result_alias,
                from = from_clause(profile, &src.table),
                date = src.date_column,
                cutoff = lookback(profile, DateUnit::Month, 1),
            )
        }
        TemplateId::CustomerCount => {
            let src = table_map.source(dialect, Fact::Customers);
            format!(
                "SELECT COUNT(*) AS {alias} FROM {from} WHERE {date} >= {cutoff}",
                alias = profile.result_alias,
                from = from_clause(profile, &src.table),
                date = src.date_column,
                cutoff = lookback(profile, DateUnit::Month, 1),
            )
        }
        TemplateId::InventoryValue => {
            let src = table_map.source(dialect, Fact::Inventory);
            format!(
                "SELECT {sum} AS {alias} FROM {from}",
                sum = coalesced_sum(profile, &src.amount_column),
                alias = profile.result_alias,
                from = from_clause(profile, &src.table),
            )
        }
        TemplateId::ArAgingTotal => {
            let src = table_map.source(dialect, Fact::Receivables);
            format!(
                "SELECT {sum} AS {alias} FROM {from} WHERE {date} <= {now}",
                sum = coalesced_sum(profile, &src.amount_column),
                alias = profile.result_alias,
                from = from_clause(profile, &src.table),
                date = src.date_column,
                now = profile.date_now_fn,
            )
        }
        TemplateId::RowCount => {
            let src = table_map.source(dialect, TableMap::default_fact(dialect));
            format!(
                "SELECT COUNT(*) AS {alias} FROM {from}",
                alias = profile.result_alias,
                from = from_clause(profile, &src.table),
            )
        }
    }
}

#[derive(Debug, Clone, Copy)]
enum DateUnit {
    Day,
    Month,
}

/// FROM clause with schema prefix and lock hint where the dialect needs them.
fn from_clause(profile: &DialectProfile, table: &str) -> String {
    if profile.requires_lock_hint {
        format!("{}{} {}", profile.schema_prefix, table, profile.lock_hint)
    } else {
        format!("{}{}", profile.schema_prefix, table)
    }
}

/// "Now minus N units" in the dialect's date vocabulary.
fn lookback(profile: &DialectProfile, unit: DateUnit, n: u32) -> String {
    match profile.name {
        SqlDialect::TSql => {
            let unit = match unit {
                DateUnit::Day => "day",
                DateUnit::Month => "month",
            };
            format!("{}({}, -{}, {})", profile.date_add_fn, unit, n, profile.date_now_fn)
        }
        SqlDialect::Jet => {
            let unit = match unit {
                DateUnit::Day => "d",
                DateUnit::Month => "m",
            };
            format!("{}('{}', -{}, {})", profile.date_add_fn, unit, n, profile.date_now_fn)
        }
    }
}

/// SUM wrapped in the dialect's null-coalescing function.
fn coalesced_sum(profile: &DialectProfile, amount: &str) -> String {
    format!("{}(SUM({}), 0)", profile.null_coalesce_fn, amount)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn metric(variable_name: &str, chart_group: &str, dialect: SqlDialect) -> MetricDefinition {
        MetricDefinition::new("m1", variable_name, chart_group, variable_name, dialect, "")
    }

    #[test]
    fn total_orders_under_tsql_is_qualified_hinted_and_aliased() {
        let m = metric("Total Orders", "Key Metrics", SqlDialect::TSql);
        let generated = generate(&m, &TableMap::new());

        assert_eq!(generated.source, GenerationSource::Template(TemplateId::OrderCount));
        assert!(generated.sql.contains("COUNT(*)"));
        assert!(generated.sql.contains("dbo.oe_hdr"));
        assert!(generated.sql.contains("WITH (NOLOCK)"));
        assert!(generated.sql.contains("AS value"));
        let profile = DialectProfile::of(SqlDialect::TSql);
        assert!(validator::validate(profile, &generated.sql).is_valid());
    }

    #[test]
    fn rentals_under_jet_carry_no_tsql_markers() {
        let m = metric("Open Rentals", "Rentals", SqlDialect::Jet);
        let generated = generate(&m, &TableMap::new());

        assert!(generated.sql.contains("FROM Rentals"));
        assert!(!generated.sql.contains("dbo."));
        assert!(!generated.sql.contains("NOLOCK"));
        assert!(generated.sql.contains("DateAdd('m', -1, Date())"));
        let profile = DialectProfile::of(SqlDialect::Jet);
        assert!(validator::validate(profile, &generated.sql).is_valid());
    }

    #[test]
    fn valid_raw_expression_passes_through_unchanged() {
        let raw = "SELECT Count(*) as value FROM Rentals";
        let mut m = metric("Open Rentals", "Rentals", SqlDialect::Jet);
        m.raw_expression = raw.to_string();

        let generated = generate(&m, &TableMap::new());
        assert_eq!(generated.source, GenerationSource::Passthrough);
        assert_eq!(generated.sql, raw);
    }

    #[test]
    fn invalid_raw_expression_is_regenerated_not_patched() {
        // Valid Jet SQL, wrong dialect for a T-SQL metric: regenerate.
        let mut m = metric("Total Orders", "Key Metrics", SqlDialect::TSql);
        m.raw_expression = "SELECT Count(*) as value FROM Rentals".to_string();

        let generated = generate(&m, &TableMap::new());
        assert_eq!(generated.source, GenerationSource::Template(TemplateId::OrderCount));
        assert!(generated.sql.contains("dbo.oe_hdr"));
    }

    #[test]
    fn no_keyword_match_falls_back_to_default_template() {
        let m = metric("Widget Frobnication", "Misc", SqlDialect::TSql);
        let generated = generate(&m, &TableMap::new());

        assert_eq!(generated.source, GenerationSource::Fallback);
        assert!(generated.sql.contains("dbo.oe_hdr"));
        let profile = DialectProfile::of(SqlDialect::TSql);
        assert!(validator::validate(profile, &generated.sql).is_valid());
    }

    #[test]
    fn keyword_priority_prefers_specific_phrases() {
        // "ar aging" sits above the broader keywords, so it wins even
        // when the chart group would also match something else.
        let m = metric("AR Aging Total", "Accounts Receivable", SqlDialect::TSql);
        let generated = generate(&m, &TableMap::new());
        assert_eq!(generated.source, GenerationSource::Template(TemplateId::ArAgingTotal));
    }

    #[test]
    fn every_template_validates_under_both_dialects() {
        let map = TableMap::new();
        for template in [
            TemplateId::OrderCount,
            TemplateId::RevenueSum,
            TemplateId::DailyRevenue,
            TemplateId::OpenRentalCount,
            TemplateId::CustomerCount,
            TemplateId::InventoryValue,
            TemplateId::ArAgingTotal,
            TemplateId::RowCount,
        ] {
            for dialect in [SqlDialect::TSql, SqlDialect::Jet] {
                let profile = DialectProfile::of(dialect);
                let sql = instantiate(template, profile, &map);
                assert!(
                    validator::validate(profile, &sql).is_valid(),
                    "{:?} under {:?}: {}",
                    template,
                    dialect,
                    sql
                );
            }
        }
    }
}
