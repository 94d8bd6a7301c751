//! Render context — the substitution values line templates see.

use serde::{Deserialize, Serialize};

use certify_core::{
    dates::format_date_range,
    types::{ColumnMap, Field, RosterRecord, TraceId},
};

use crate::error::RenderError;

/// Flat rendering payload built from one [`RosterRecord`].
///
/// Absent optional fields are empty strings so templates never hit an
/// undefined variable; [`RenderContext::require`] enforces layout needs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RenderContext {
    pub full_name: String,
    pub specialization: String,
    pub email: String,
    /// ISO `YYYY-MM-DD`, or empty when absent.
    pub start_date: String,
    pub end_date: String,
    /// `from January 10 to March 20 2024`, or empty without both dates.
    pub date_range: String,
    pub weeks: String,
    pub trace_id: String,
}

impl RenderContext {
    /// Build a context from a record read through `columns`.
    ///
    /// Dates that are present but unparseable fail with
    /// [`RenderError::Format`] regardless of the layout.
    pub fn from_record(
        record: &RosterRecord,
        columns: &ColumnMap,
        trace_id: TraceId,
    ) -> Result<Self, RenderError> {
        let text = |field| record.text(columns, field).unwrap_or_default();
        let start = record.date(columns, Field::StartDate)?;
        let end = record.date(columns, Field::EndDate)?;
        let date_range = match (start, end) {
            (Some(start), Some(end)) => format_date_range(start, end),
            _ => String::new(),
        };

        Ok(RenderContext {
            full_name: text(Field::FullName),
            specialization: text(Field::Specialization),
            email: text(Field::Email),
            start_date: start.map(|d| d.to_string()).unwrap_or_default(),
            end_date: end.map(|d| d.to_string()).unwrap_or_default(),
            date_range,
            weeks: text(Field::Weeks),
            trace_id: trace_id.to_string(),
        })
    }

    /// Whether `field` has a usable value.
    pub fn has(&self, field: Field) -> bool {
        let value = match field {
            Field::FullName => &self.full_name,
            Field::Specialization => &self.specialization,
            Field::Email => &self.email,
            Field::StartDate => &self.start_date,
            Field::EndDate => &self.end_date,
            Field::Weeks => &self.weeks,
        };
        !value.is_empty()
    }

    /// Fail with [`RenderError::MissingField`] on the first absent field.
    pub fn require(&self, fields: &[Field]) -> Result<(), RenderError> {
        match fields.iter().find(|f| !self.has(**f)) {
            Some(field) => Err(RenderError::MissingField { field: *field }),
            None => Ok(()),
        }
    }

    /// Convert to a [`tera::Context`] for rendering.
    pub fn to_tera_context(&self) -> Result<tera::Context, RenderError> {
        tera::Context::from_serialize(self).map_err(RenderError::from)
    }
}
