use serde::Serialize;
use tracing::debug;
use uuid::Uuid;

use crate::schema::{ParsedReport, SchemaType};

/// A named group of parsed exports, typically one class.
#[derive(Debug, Clone, Serialize)]
pub struct Cohort {
    pub id: Uuid,
    pub name: String,
    pub reports: Vec<ParsedReport>,
}

impl Cohort {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            reports: Vec::new(),
        }
    }

    pub fn add_reports<I: IntoIterator<Item = ParsedReport>>(&mut self, reports: I) {
        let before = self.reports.len();
        self.reports.extend(reports);
        debug!(cohort = %self.name, added = self.reports.len() - before, "reports added");
    }

    /// Returns the removed report, if the id was present.
    pub fn remove_report(&mut self, id: Uuid) -> Option<ParsedReport> {
        let pos = self.reports.iter().position(|r| r.id == id)?;
        Some(self.reports.remove(pos))
    }

    /// First report of the given schema, in insertion order.
    pub fn find(&self, schema: SchemaType) -> Option<&ParsedReport> {
        self.reports.iter().find(|r| r.schema_type() == schema)
    }

    pub fn records_total(&self) -> usize {
        self.reports.iter().map(|r| r.records.len()).sum()
    }
}
