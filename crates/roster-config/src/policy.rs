//! Validated policy and shift catalog structures

use crate::schema::{RawConfig, RawPolicy, RawTemplate};
use crate::validation::parse_time;
use chrono::Duration;
use roster_util::{TemplateId, WallClock};
use std::path::PathBuf;

/// Validated configuration ready for use by the engine
#[derive(Debug, Clone)]
pub struct Config {
    /// Service paths
    pub service: ServiceConfig,

    /// Attendance policy
    pub policy: AttendancePolicy,

    /// Shift template catalog
    pub catalog: ShiftCatalog,
}

impl Config {
    /// Convert from raw config (after validation)
    pub fn from_raw(raw: RawConfig) -> Self {
        let policy = raw
            .policy
            .map(AttendancePolicy::from_raw)
            .unwrap_or_default();

        let templates = raw.templates.into_iter().map(convert_template).collect();

        Self {
            service: ServiceConfig::from_raw(raw.service),
            policy,
            catalog: ShiftCatalog::new(templates),
        }
    }
}

/// Service configuration
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    pub data_dir: PathBuf,
    pub log_dir: PathBuf,
}

impl ServiceConfig {
    fn from_raw(raw: crate::schema::RawServiceConfig) -> Self {
        Self {
            data_dir: raw
                .data_dir
                .unwrap_or_else(|| PathBuf::from("/var/lib/rosterd")),
            log_dir: raw
                .log_dir
                .unwrap_or_else(|| PathBuf::from("/var/log/rosterd")),
        }
    }
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("/var/lib/rosterd"),
            log_dir: PathBuf::from("/var/log/rosterd"),
        }
    }
}

/// Attendance policy for one work location
///
/// The defaults are the widened buffer values; earlier deployments carried
/// narrower ad hoc values, superseded here.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttendancePolicy {
    pub checkin_buffer_minutes: i64,
    pub short_shift_buffer_minutes: i64,
    pub short_shift_max_minutes: i64,
    pub early_departure_tolerance_minutes: i64,
    pub late_checkout_grace_minutes: i64,
    pub staleness_threshold_days: i64,
    pub fallback_close_hours: i64,
}

impl Default for AttendancePolicy {
    fn default() -> Self {
        Self {
            checkin_buffer_minutes: 30,
            short_shift_buffer_minutes: 60,
            short_shift_max_minutes: 30,
            early_departure_tolerance_minutes: 15,
            late_checkout_grace_minutes: 60,
            staleness_threshold_days: 1,
            fallback_close_hours: 8,
        }
    }
}

impl AttendancePolicy {
    fn from_raw(raw: RawPolicy) -> Self {
        let defaults = Self::default();
        Self {
            checkin_buffer_minutes: raw
                .checkin_buffer_minutes
                .map(i64::from)
                .unwrap_or(defaults.checkin_buffer_minutes),
            short_shift_buffer_minutes: raw
                .short_shift_buffer_minutes
                .map(i64::from)
                .unwrap_or(defaults.short_shift_buffer_minutes),
            short_shift_max_minutes: raw
                .short_shift_max_minutes
                .map(i64::from)
                .unwrap_or(defaults.short_shift_max_minutes),
            early_departure_tolerance_minutes: raw
                .early_departure_tolerance_minutes
                .map(i64::from)
                .unwrap_or(defaults.early_departure_tolerance_minutes),
            late_checkout_grace_minutes: raw
                .late_checkout_grace_minutes
                .map(i64::from)
                .unwrap_or(defaults.late_checkout_grace_minutes),
            staleness_threshold_days: raw
                .staleness_threshold_days
                .map(i64::from)
                .unwrap_or(defaults.staleness_threshold_days),
            fallback_close_hours: raw
                .fallback_close_hours
                .map(i64::from)
                .unwrap_or(defaults.fallback_close_hours),
        }
    }

    /// Check-in buffer for a shift of the given duration; short shifts get
    /// the widened buffer so the window is never narrower than the shift
    pub fn checkin_buffer_for(&self, shift_minutes: i64) -> Duration {
        if shift_minutes <= self.short_shift_max_minutes {
            Duration::minutes(self.short_shift_buffer_minutes)
        } else {
            Duration::minutes(self.checkin_buffer_minutes)
        }
    }

    pub fn early_departure_tolerance(&self) -> Duration {
        Duration::minutes(self.early_departure_tolerance_minutes)
    }

    pub fn late_checkout_grace(&self) -> Duration {
        Duration::minutes(self.late_checkout_grace_minutes)
    }

    pub fn staleness_threshold(&self) -> Duration {
        Duration::days(self.staleness_threshold_days)
    }

    pub fn fallback_close(&self) -> Duration {
        Duration::hours(self.fallback_close_hours)
    }
}

/// Validated shift template
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShiftTemplate {
    pub id: TemplateId,
    pub name: String,
    pub start: WallClock,
    pub end: WallClock,
}

impl ShiftTemplate {
    /// End at or before start means the shift runs past midnight
    pub fn wraps_midnight(&self) -> bool {
        self.end <= self.start
    }

    pub fn duration_minutes(&self) -> i64 {
        let start = self.start.as_minutes_from_midnight() as i64;
        let end = self.end.as_minutes_from_midnight() as i64;
        if self.wraps_midnight() {
            (24 * 60 - start) + end
        } else {
            end - start
        }
    }
}

/// Read-only lookup of shift templates
#[derive(Debug, Clone, Default)]
pub struct ShiftCatalog {
    templates: Vec<ShiftTemplate>,
}

impl ShiftCatalog {
    pub fn new(templates: Vec<ShiftTemplate>) -> Self {
        Self { templates }
    }

    pub fn get(&self, id: &TemplateId) -> Option<&ShiftTemplate> {
        self.templates.iter().find(|t| &t.id == id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &ShiftTemplate> {
        self.templates.iter()
    }

    pub fn len(&self) -> usize {
        self.templates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.templates.is_empty()
    }
}

fn convert_template(raw: RawTemplate) -> ShiftTemplate {
    // Times were already validated; fall back to midnight rather than panic
    let (start_h, start_m) = parse_time(&raw.start).unwrap_or((0, 0));
    let (end_h, end_m) = parse_time(&raw.end).unwrap_or((0, 0));

    ShiftTemplate {
        id: TemplateId::new(raw.id),
        name: raw.name,
        start: WallClock::new(start_h, start_m).unwrap(),
        end: WallClock::new(end_h, end_m).unwrap(),
    }
}
