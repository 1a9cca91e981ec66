//! Shift spans and the per-staff daily schedule set

use chrono::{Days, NaiveDate, NaiveDateTime};
use roster_config::{ShiftCatalog, ShiftTemplate};
use roster_store::{Ledger, LedgerResult, ShiftAssignment};
use roster_util::{minutes_between, AssignmentId, StaffId};
use tracing::warn;

/// Absolute bounds of one shift occurrence
///
/// Overnight templates resolve to an end on the following day; every
/// comparison downstream works on these absolute instants, never on bare
/// times of day.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ShiftSpan {
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
}

impl ShiftSpan {
    /// Anchor a template to the assignment date
    pub fn of(date: NaiveDate, template: &ShiftTemplate) -> Self {
        let start = template.start.on(date);
        let end_date = if template.wraps_midnight() {
            date + Days::new(1)
        } else {
            date
        };
        Self {
            start,
            end: template.end.on(end_date),
        }
    }

    pub fn duration_minutes(&self) -> i64 {
        minutes_between(self.start, self.end)
    }
}

/// One assignment joined with its resolved template span
#[derive(Debug, Clone)]
pub struct ScheduledShift {
    pub assignment: ShiftAssignment,
    pub shift_name: String,
    pub span: ShiftSpan,
}

/// The ordered shift assignments governing a staff member around a date
///
/// Materialized over `date-1 ..= date+1`: yesterday's overnight shift and a
/// just-past-midnight shift tomorrow both have buffered windows that can
/// reach into today.
#[derive(Debug, Clone, Default)]
pub struct DailyScheduleSet {
    shifts: Vec<ScheduledShift>,
}

impl DailyScheduleSet {
    pub fn from_shifts(mut shifts: Vec<ScheduledShift>) -> Self {
        shifts.sort_by_key(|s| s.span.start);
        Self { shifts }
    }

    /// Load the schedule set from the ledger, joining templates from the
    /// catalog. Assignments referencing unknown templates are skipped.
    pub fn load(
        ledger: &dyn Ledger,
        catalog: &ShiftCatalog,
        staff_id: &StaffId,
        around: NaiveDate,
    ) -> LedgerResult<Self> {
        let from = around - Days::new(1);
        let to = around + Days::new(1);
        let assignments = ledger.assignments_between(staff_id, from, to)?;

        let mut shifts = Vec::with_capacity(assignments.len());
        for assignment in assignments {
            match catalog.get(&assignment.template_id) {
                Some(template) => shifts.push(ScheduledShift {
                    span: ShiftSpan::of(assignment.date, template),
                    shift_name: template.name.clone(),
                    assignment,
                }),
                None => {
                    warn!(
                        assignment_id = %assignment.id,
                        template_id = %assignment.template_id,
                        "Assignment references unknown template, skipping"
                    );
                }
            }
        }

        Ok(Self::from_shifts(shifts))
    }

    pub fn shifts(&self) -> &[ScheduledShift] {
        &self.shifts
    }

    pub fn is_empty(&self) -> bool {
        self.shifts.is_empty()
    }

    pub fn find(&self, id: &AssignmentId) -> Option<&ScheduledShift> {
        self.shifts.iter().find(|s| &s.assignment.id == id)
    }
}
