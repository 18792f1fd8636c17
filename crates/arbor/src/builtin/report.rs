//! In-memory report.
//!
//! `VariableNames` lists addresses resolved relative to the report on every
//! step. Entries are trimmed, empty entries dropped and duplicates (ignoring
//! case) removed; `address as Alias` renames a column. Runs produced by an
//! experiment get one leading column per factor.

use arbor_kernel::{
    Component, DependencySlot, HookContext, HookError, OnCommencing, OnTimestep, Timestep,
};
use arbor_types::{Attributes, Value};

use super::Simulation;

/// A single recorded column.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Column {
    pub address: String,
    pub heading: String,
}

impl Column {
    /// Parses `address` or `address as Heading`.
    pub fn parse(entry: &str) -> Option<Self> {
        let entry = entry.trim();
        if entry.is_empty() {
            return None;
        }
        let lower = entry.to_ascii_lowercase();
        if let Some(at) = lower.rfind(" as ") {
            let address = entry[..at].trim();
            let heading = entry[at + 4..].trim();
            if !address.is_empty() && !heading.is_empty() {
                return Some(Self {
                    address: address.to_string(),
                    heading: heading.to_string(),
                });
            }
        }
        Some(Self {
            address: entry.to_string(),
            heading: entry.to_string(),
        })
    }
}

/// Sanitises raw variable names into columns.
pub fn columns(entries: &[&str]) -> Vec<Column> {
    let mut seen: Vec<String> = Vec::new();
    let mut columns = Vec::new();
    for column in entries.iter().filter_map(|entry| Column::parse(entry)) {
        let key = column.heading.to_lowercase();
        if !seen.contains(&key) {
            seen.push(key);
            columns.push(column);
        }
    }
    columns
}

#[derive(Debug, Clone, Default)]
pub struct Report {
    headings: Vec<String>,
    columns: Vec<Column>,
    factor_values: Vec<Value>,
    rows: Vec<Vec<Value>>,
}

impl Report {
    pub fn headings(&self) -> &[String] {
        &self.headings
    }

    pub fn rows(&self) -> &[Vec<Value>] {
        &self.rows
    }
}

impl Component for Report {
    fn kind(&self) -> &'static str {
        super::REPORT
    }

    fn dependencies(&self) -> &'static [DependencySlot] {
        const SLOTS: &[DependencySlot] =
            &[DependencySlot::optional("Simulation", super::SIMULATION)];
        SLOTS
    }

    fn default_attributes(&self) -> Attributes {
        let mut attributes = Attributes::new();
        attributes.insert("VariableNames".into(), Value::List(Vec::new()));
        attributes
    }

    fn member(&self, name: &str) -> Option<Value> {
        match name {
            "RowCount" => Some(Value::Int(self.rows.len() as i64)),
            "Headings" => Some(Value::from(self.headings.clone())),
            _ => None,
        }
    }

    fn commencing_hook(&mut self) -> Option<&mut dyn OnCommencing> {
        Some(self)
    }

    fn timestep_hook(&mut self) -> Option<&mut dyn OnTimestep> {
        Some(self)
    }
}

impl OnCommencing for Report {
    fn commencing(&mut self, cx: &mut HookContext<'_>) -> Result<(), HookError> {
        let names = cx
            .attribute("VariableNames")
            .and_then(Value::as_text_list)
            .ok_or_else(|| HookError::failed("VariableNames must be a list of text"))?;
        self.columns = columns(&names);

        let factors = cx
            .dependency("Simulation")
            .and_then(|sim| cx.tree().downcast::<Simulation>(sim))
            .map(|sim| sim.factors().to_vec())
            .unwrap_or_default();

        self.headings = factors.iter().map(|(name, _)| name.clone()).collect();
        self.headings
            .extend(self.columns.iter().map(|c| c.heading.clone()));
        self.factor_values = factors.into_iter().map(|(_, level)| level).collect();
        self.rows.clear();
        Ok(())
    }
}

impl OnTimestep for Report {
    fn timestep(&mut self, cx: &mut HookContext<'_>, _step: Timestep) -> Result<(), HookError> {
        let mut row = self.factor_values.clone();
        for column in &self.columns {
            row.push(cx.get_value(&column.address)?);
        }
        self.rows.push(row);
        Ok(())
    }
}
