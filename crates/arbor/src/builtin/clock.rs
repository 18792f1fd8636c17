//! Simulation clock.

use arbor_kernel::{Component, HookContext, HookError, MemberWrite, OnCommencing};
use arbor_types::{Attributes, Value};
use chrono::NaiveDate;

use crate::error::ExecutionError;

/// ISO date format used by `Start`, `End` and `Today`.
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Drives daily steps between its `Start` and `End` dates, inclusive.
#[derive(Debug, Clone, Default)]
pub struct Clock {
    today: Option<NaiveDate>,
}

impl Clock {
    pub fn today(&self) -> Option<NaiveDate> {
        self.today
    }

    pub fn set_today(&mut self, date: NaiveDate) {
        self.today = Some(date);
    }

    /// Parses the `Start` and `End` attributes of a clock node.
    pub fn range(
        attributes: &Attributes,
        path: &str,
    ) -> Result<(NaiveDate, NaiveDate), ExecutionError> {
        let start = parse_date(attributes, "Start", path)?;
        let end = parse_date(attributes, "End", path)?;
        if end < start {
            return Err(ExecutionError::EmptyRange {
                path: path.to_string(),
                start: start.format(DATE_FORMAT).to_string(),
                end: end.format(DATE_FORMAT).to_string(),
            });
        }
        Ok((start, end))
    }
}

fn parse_date(
    attributes: &Attributes,
    field: &'static str,
    path: &str,
) -> Result<NaiveDate, ExecutionError> {
    let raw = attributes.get(field).and_then(Value::as_text).unwrap_or_default();
    NaiveDate::parse_from_str(raw, DATE_FORMAT).map_err(|_| ExecutionError::InvalidDate {
        path: path.to_string(),
        field,
        value: raw.to_string(),
    })
}

impl Component for Clock {
    fn kind(&self) -> &'static str {
        super::CLOCK
    }

    fn default_attributes(&self) -> Attributes {
        let mut attributes = Attributes::new();
        attributes.insert("Start".into(), Value::from("2000-01-01"));
        attributes.insert("End".into(), Value::from("2000-01-01"));
        attributes
    }

    fn member(&self, name: &str) -> Option<Value> {
        match name {
            "Today" => Some(Value::Text(
                self.today
                    .map(|d| d.format(DATE_FORMAT).to_string())
                    .unwrap_or_default(),
            )),
            _ => None,
        }
    }

    fn set_member(&mut self, name: &str, _value: Value) -> MemberWrite {
        match name {
            "Today" => MemberWrite::ReadOnly,
            _ => MemberWrite::Unknown,
        }
    }

    fn commencing_hook(&mut self) -> Option<&mut dyn OnCommencing> {
        Some(self)
    }
}

impl OnCommencing for Clock {
    fn commencing(&mut self, cx: &mut HookContext<'_>) -> Result<(), HookError> {
        let path = cx.full_path();
        let attributes = cx
            .tree()
            .node(cx.node())
            .map(|node| node.attributes().clone())
            .unwrap_or_default();
        let (start, _) =
            Clock::range(&attributes, &path).map_err(|e| HookError::failed(e.to_string()))?;
        self.today = Some(start);
        Ok(())
    }
}
