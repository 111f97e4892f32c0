//! Logical fact → physical table mapping per dialect.
//!
//! Templates are written against logical facts ("orders", "invoices", ...);
//! this map supplies the physical table and column names for each dialect.
//! A built-in default ships with the known ERP/rental schema and individual
//! entries can be overridden from project configuration.

use mend_backend::SqlDialect;
use std::collections::HashMap;
use std::str::FromStr;

/// A logical fact a template can aggregate over.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Fact {
    Orders,
    Invoices,
    Rentals,
    Customers,
    Inventory,
    Receivables,
}

impl FromStr for Fact {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "orders" => Ok(Fact::Orders),
            "invoices" => Ok(Fact::Invoices),
            "rentals" => Ok(Fact::Rentals),
            "customers" => Ok(Fact::Customers),
            "inventory" => Ok(Fact::Inventory),
            "receivables" => Ok(Fact::Receivables),
            _ => Err(format!("Unknown fact: {}", s)),
        }
    }
}

/// Physical source for one fact in one dialect.
///
/// `amount_column` may be a simple column or a fixed arithmetic expression;
/// it is substituted verbatim into the aggregate.
#[derive(Debug, Clone, PartialEq)]
pub struct FactSource {
    pub table: String,
    pub date_column: String,
    pub amount_column: String,
}

impl FactSource {
    pub fn new(
        table: impl Into<String>,
        date_column: impl Into<String>,
        amount_column: impl Into<String>,
    ) -> Self {
        Self {
            table: table.into(),
            date_column: date_column.into(),
            amount_column: amount_column.into(),
        }
    }
}

/// Table map with built-in defaults and per-entry overrides.
#[derive(Debug, Clone, Default)]
pub struct TableMap {
    overrides: HashMap<(SqlDialect, Fact), FactSource>,
}

impl TableMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Override the source for one (dialect, fact) pair.
    pub fn set(&mut self, dialect: SqlDialect, fact: Fact, source: FactSource) {
        self.overrides.insert((dialect, fact), source);
    }

    /// Resolve the physical source for a fact. Total: falls back to the
    /// built-in default when no override is present.
    pub fn source(&self, dialect: SqlDialect, fact: Fact) -> FactSource {
        self.overrides
            .get(&(dialect, fact))
            .cloned()
            .unwrap_or_else(|| builtin(dialect, fact))
    }

    /// The fact a dialect's default (no keyword match) template counts.
    pub fn default_fact(dialect: SqlDialect) -> Fact {
        match dialect {
            SqlDialect::TSql => Fact::Orders,
            SqlDialect::Jet => Fact::Rentals,
        }
    }
}

/// Built-in physical schema for both backends.
///
/// Table names are stored bare; schema qualification and lock hints are
/// applied by the generator from the dialect profile.
fn builtin(dialect: SqlDialect, fact: Fact) -> FactSource {
    match (dialect, fact) {
        (SqlDialect::TSql, Fact::Orders) => FactSource::new("oe_hdr", "order_date", "order_amt"),
        (SqlDialect::TSql, Fact::Invoices) => {
            FactSource::new("invoice_hdr", "invoice_date", "total_amount")
        }
        (SqlDialect::TSql, Fact::Rentals) => {
            FactSource::new("rental_hdr", "start_date", "rental_amount")
        }
        (SqlDialect::TSql, Fact::Customers) => {
            FactSource::new("customer", "date_created", "credit_limit")
        }
        (SqlDialect::TSql, Fact::Inventory) => {
            FactSource::new("inv_mast", "date_created", "qty_on_hand * standard_cost")
        }
        (SqlDialect::TSql, Fact::Receivables) => {
            FactSource::new("ar_open_items", "due_date", "amount_due")
        }
        (SqlDialect::Jet, Fact::Orders) => {
            FactSource::new("Transactions", "TransactionDate", "TotalAmount")
        }
        (SqlDialect::Jet, Fact::Invoices) => FactSource::new("Invoices", "InvoiceDate", "Amount"),
        (SqlDialect::Jet, Fact::Rentals) => {
            FactSource::new("Rentals", "CreatedDate", "RentalAmount")
        }
        (SqlDialect::Jet, Fact::Customers) => {
            FactSource::new("Customers", "CreatedDate", "CreditLimit")
        }
        (SqlDialect::Jet, Fact::Inventory) => {
            FactSource::new("Items", "CreatedDate", "Quantity * UnitCost")
        }
        (SqlDialect::Jet, Fact::Receivables) => {
            FactSource::new("AccountsReceivable", "DueDate", "AmountDue")
        }
    }
}
