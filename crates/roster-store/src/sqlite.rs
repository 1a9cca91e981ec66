//! SQLite-based ledger implementation

use chrono::{NaiveDate, NaiveDateTime};
use rusqlite::{params, Connection, OptionalExtension};
use roster_api::SessionStatus;
use roster_util::{AssignmentId, SessionId, StaffId, TemplateId};
use std::path::Path;
use std::sync::Mutex;
use tracing::{debug, warn};

use crate::{
    AttendanceSession, AuditEvent, BeginSession, Ledger, LedgerError, LedgerResult, OpenLookup,
    ShiftAssignment,
};

const DATETIME_FMT: &str = "%Y-%m-%d %H:%M:%S";
const DATE_FMT: &str = "%Y-%m-%d";

const SESSION_COLS: &str =
    "id, staff_id, assignment_id, check_in_at, check_out_at, status, location_in, location_out";

/// SQLite-based ledger
pub struct SqliteLedger {
    conn: Mutex<Connection>,
}

impl SqliteLedger {
    /// Open or create a ledger at the given path
    pub fn open(path: impl AsRef<Path>) -> LedgerResult<Self> {
        let conn = Connection::open(path)?;
        let ledger = Self {
            conn: Mutex::new(conn),
        };
        ledger.init_schema()?;
        Ok(ledger)
    }

    /// Create an in-memory ledger (for testing)
    pub fn in_memory() -> LedgerResult<Self> {
        let conn = Connection::open_in_memory()?;
        let ledger = Self {
            conn: Mutex::new(conn),
        };
        ledger.init_schema()?;
        Ok(ledger)
    }

    fn init_schema(&self) -> LedgerResult<()> {
        let conn = self.conn.lock().unwrap();

        conn.execute_batch(
            r#"
            -- Roster: one row per staff/date/template occurrence
            CREATE TABLE IF NOT EXISTS assignments (
                id TEXT PRIMARY KEY,
                staff_id TEXT NOT NULL,
                date TEXT NOT NULL,
                template_id TEXT NOT NULL,
                unit TEXT,
                role TEXT
            );

            -- Attendance sessions (never deleted)
            CREATE TABLE IF NOT EXISTS sessions (
                id TEXT PRIMARY KEY,
                staff_id TEXT NOT NULL,
                assignment_id TEXT,
                check_in_at TEXT NOT NULL,
                check_out_at TEXT,
                status TEXT NOT NULL,
                location_in TEXT,
                location_out TEXT
            );

            -- Audit log (append-only)
            CREATE TABLE IF NOT EXISTS audit_log (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                timestamp TEXT NOT NULL,
                event_json TEXT NOT NULL
            );

            -- Indexes
            CREATE INDEX IF NOT EXISTS idx_assignments_staff_date ON assignments(staff_id, date);
            CREATE INDEX IF NOT EXISTS idx_sessions_staff_open ON sessions(staff_id, check_out_at);
            CREATE INDEX IF NOT EXISTS idx_audit_timestamp ON audit_log(timestamp);
            "#,
        )?;

        debug!("Ledger schema initialized");
        Ok(())
    }
}

fn fmt_dt(dt: NaiveDateTime) -> String {
    dt.format(DATETIME_FMT).to_string()
}

fn parse_dt(s: &str) -> LedgerResult<NaiveDateTime> {
    NaiveDateTime::parse_from_str(s, DATETIME_FMT)
        .map_err(|e| LedgerError::Database(format!("bad datetime '{}': {}", s, e)))
}

fn fmt_date(d: NaiveDate) -> String {
    d.format(DATE_FMT).to_string()
}

fn parse_date(s: &str) -> LedgerResult<NaiveDate> {
    NaiveDate::parse_from_str(s, DATE_FMT)
        .map_err(|e| LedgerError::Database(format!("bad date '{}': {}", s, e)))
}

type SessionRow = (
    String,
    String,
    Option<String>,
    String,
    Option<String>,
    String,
    Option<String>,
    Option<String>,
);

fn read_session_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<SessionRow> {
    Ok((
        row.get(0)?,
        row.get(1)?,
        row.get(2)?,
        row.get(3)?,
        row.get(4)?,
        row.get(5)?,
        row.get(6)?,
        row.get(7)?,
    ))
}

fn session_from_row(row: SessionRow) -> LedgerResult<AttendanceSession> {
    let (id, staff_id, assignment_id, check_in_at, check_out_at, status, location_in, location_out) =
        row;

    let uuid = uuid::Uuid::parse_str(&id)
        .map_err(|e| LedgerError::Database(format!("bad session id '{}': {}", id, e)))?;
    let status = SessionStatus::parse(&status)
        .ok_or_else(|| LedgerError::Database(format!("bad session status '{}'", status)))?;

    Ok(AttendanceSession {
        id: SessionId::from_uuid(uuid),
        staff_id: StaffId::new(staff_id),
        assignment_id: assignment_id.map(AssignmentId::new),
        check_in_at: parse_dt(&check_in_at)?,
        check_out_at: check_out_at.as_deref().map(parse_dt).transpose()?,
        status,
        location_in,
        location_out,
    })
}

impl Ledger for SqliteLedger {
    fn append_audit(&self, mut event: AuditEvent) -> LedgerResult<()> {
        let conn = self.conn.lock().unwrap();
        let event_json = serde_json::to_string(&event.event)?;

        conn.execute(
            "INSERT INTO audit_log (timestamp, event_json) VALUES (?, ?)",
            params![fmt_dt(event.timestamp), event_json],
        )?;

        event.id = conn.last_insert_rowid();
        debug!(event_id = event.id, "Audit event appended");

        Ok(())
    }

    fn recent_audits(&self, limit: usize) -> LedgerResult<Vec<AuditEvent>> {
        let conn = self.conn.lock().unwrap();

        let mut stmt = conn.prepare(
            "SELECT id, timestamp, event_json FROM audit_log ORDER BY id DESC LIMIT ?",
        )?;

        let rows = stmt.query_map([limit], |row| {
            let id: i64 = row.get(0)?;
            let timestamp_str: String = row.get(1)?;
            let event_json: String = row.get(2)?;
            Ok((id, timestamp_str, event_json))
        })?;

        let mut events = Vec::new();
        for row in rows {
            let (id, timestamp_str, event_json) = row?;
            let timestamp = parse_dt(&timestamp_str)?;
            let event: crate::AuditEventType = serde_json::from_str(&event_json)?;

            events.push(AuditEvent {
                id,
                timestamp,
                event,
            });
        }

        Ok(events)
    }

    fn record_assignment(&self, assignment: &ShiftAssignment) -> LedgerResult<()> {
        let conn = self.conn.lock().unwrap();

        conn.execute(
            r#"
            INSERT INTO assignments (id, staff_id, date, template_id, unit, role)
            VALUES (?, ?, ?, ?, ?, ?)
            ON CONFLICT(id)
            DO UPDATE SET staff_id = excluded.staff_id,
                          date = excluded.date,
                          template_id = excluded.template_id,
                          unit = excluded.unit,
                          role = excluded.role
            "#,
            params![
                assignment.id.as_str(),
                assignment.staff_id.as_str(),
                fmt_date(assignment.date),
                assignment.template_id.as_str(),
                assignment.unit,
                assignment.role,
            ],
        )?;

        debug!(
            assignment_id = %assignment.id,
            staff_id = %assignment.staff_id,
            "Assignment recorded"
        );
        Ok(())
    }

    fn assignment(&self, id: &AssignmentId) -> LedgerResult<Option<ShiftAssignment>> {
        let conn = self.conn.lock().unwrap();

        let row: Option<(String, String, String, String, Option<String>, Option<String>)> = conn
            .query_row(
                "SELECT id, staff_id, date, template_id, unit, role FROM assignments WHERE id = ?",
                [id.as_str()],
                |row| {
                    Ok((
                        row.get(0)?,
                        row.get(1)?,
                        row.get(2)?,
                        row.get(3)?,
                        row.get(4)?,
                        row.get(5)?,
                    ))
                },
            )
            .optional()?;

        row.map(|(id, staff_id, date, template_id, unit, role)| {
            Ok(ShiftAssignment {
                id: AssignmentId::new(id),
                staff_id: StaffId::new(staff_id),
                date: parse_date(&date)?,
                template_id: TemplateId::new(template_id),
                unit,
                role,
            })
        })
        .transpose()
    }

    fn assignments_between(
        &self,
        staff_id: &StaffId,
        from: NaiveDate,
        to: NaiveDate,
    ) -> LedgerResult<Vec<ShiftAssignment>> {
        let conn = self.conn.lock().unwrap();

        let mut stmt = conn.prepare(
            "SELECT id, staff_id, date, template_id, unit, role FROM assignments
             WHERE staff_id = ? AND date >= ? AND date <= ? ORDER BY date",
        )?;

        let rows = stmt.query_map(
            params![staff_id.as_str(), fmt_date(from), fmt_date(to)],
            |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, String>(2)?,
                    row.get::<_, String>(3)?,
                    row.get::<_, Option<String>>(4)?,
                    row.get::<_, Option<String>>(5)?,
                ))
            },
        )?;

        let mut assignments = Vec::new();
        for row in rows {
            let (id, staff_id, date, template_id, unit, role) = row?;
            assignments.push(ShiftAssignment {
                id: AssignmentId::new(id),
                staff_id: StaffId::new(staff_id),
                date: parse_date(&date)?,
                template_id: TemplateId::new(template_id),
                unit,
                role,
            });
        }

        Ok(assignments)
    }

    fn begin_session(&self, session: &AttendanceSession) -> LedgerResult<BeginSession> {
        let mut conn = self.conn.lock().unwrap();
        let tx = conn.transaction()?;

        // The open-check and insert must see the same state; both run
        // inside this transaction.
        let open: Vec<SessionRow> = {
            let mut stmt = tx.prepare(&format!(
                "SELECT {SESSION_COLS} FROM sessions
                 WHERE staff_id = ? AND check_out_at IS NULL
                 ORDER BY check_in_at DESC"
            ))?;
            let rows = stmt.query_map([session.staff_id.as_str()], read_session_row)?;
            rows.collect::<Result<_, _>>()?
        };

        match open.len() {
            0 => {}
            1 => {
                let existing = session_from_row(open.into_iter().next().unwrap())?;
                return Ok(BeginSession::AlreadyOpen(Box::new(existing)));
            }
            count => {
                warn!(
                    staff_id = %session.staff_id,
                    count,
                    "Multiple open sessions found for staff member"
                );
                return Ok(BeginSession::MultipleOpen { count });
            }
        }

        tx.execute(
            &format!("INSERT INTO sessions ({SESSION_COLS}) VALUES (?, ?, ?, ?, ?, ?, ?, ?)"),
            params![
                session.id.to_string(),
                session.staff_id.as_str(),
                session.assignment_id.as_ref().map(|a| a.as_str().to_string()),
                fmt_dt(session.check_in_at),
                session.check_out_at.map(fmt_dt),
                session.status.as_str(),
                session.location_in,
                session.location_out,
            ],
        )?;
        tx.commit()?;

        debug!(
            session_id = %session.id,
            staff_id = %session.staff_id,
            "Session created"
        );
        Ok(BeginSession::Created)
    }

    fn open_session(&self, staff_id: &StaffId) -> LedgerResult<OpenLookup> {
        let conn = self.conn.lock().unwrap();

        let open: Vec<SessionRow> = {
            let mut stmt = conn.prepare(&format!(
                "SELECT {SESSION_COLS} FROM sessions
                 WHERE staff_id = ? AND check_out_at IS NULL
                 ORDER BY check_in_at DESC"
            ))?;
            let rows = stmt.query_map([staff_id.as_str()], read_session_row)?;
            rows.collect::<Result<_, _>>()?
        };

        match open.len() {
            0 => Ok(OpenLookup::None),
            1 => Ok(OpenLookup::One(Box::new(session_from_row(
                open.into_iter().next().unwrap(),
            )?))),
            count => Ok(OpenLookup::Multiple { count }),
        }
    }

    fn close_session(
        &self,
        id: &SessionId,
        at: NaiveDateTime,
        status: SessionStatus,
        location_out: Option<&str>,
    ) -> LedgerResult<bool> {
        let conn = self.conn.lock().unwrap();

        // The IS NULL guard makes this a compare-and-swap: a session closed
        // by someone else between our read and this write changes no rows.
        let changed = conn.execute(
            "UPDATE sessions
             SET check_out_at = ?, status = ?, location_out = COALESCE(location_out, ?)
             WHERE id = ? AND check_out_at IS NULL",
            params![fmt_dt(at), status.as_str(), location_out, id.to_string()],
        )?;

        if changed == 1 {
            debug!(session_id = %id, status = status.as_str(), "Session closed");
        }
        Ok(changed == 1)
    }

    fn stale_open_sessions(
        &self,
        older_than: NaiveDateTime,
    ) -> LedgerResult<Vec<AttendanceSession>> {
        let conn = self.conn.lock().unwrap();

        let rows: Vec<SessionRow> = {
            let mut stmt = conn.prepare(&format!(
                "SELECT {SESSION_COLS} FROM sessions
                 WHERE check_out_at IS NULL AND check_in_at < ?
                 ORDER BY check_in_at"
            ))?;
            let rows = stmt.query_map([fmt_dt(older_than)], read_session_row)?;
            rows.collect::<Result<_, _>>()?
        };

        rows.into_iter().map(session_from_row).collect()
    }

    fn session(&self, id: &SessionId) -> LedgerResult<Option<AttendanceSession>> {
        let conn = self.conn.lock().unwrap();

        let row: Option<SessionRow> = conn
            .query_row(
                &format!("SELECT {SESSION_COLS} FROM sessions WHERE id = ?"),
                [id.to_string()],
                read_session_row,
            )
            .optional()?;

        row.map(session_from_row).transpose()
    }

    fn sessions_for(
        &self,
        staff_id: &StaffId,
        limit: usize,
    ) -> LedgerResult<Vec<AttendanceSession>> {
        let conn = self.conn.lock().unwrap();

        let rows: Vec<SessionRow> = {
            let mut stmt = conn.prepare(&format!(
                "SELECT {SESSION_COLS} FROM sessions
                 WHERE staff_id = ? ORDER BY check_in_at DESC LIMIT ?"
            ))?;
            let rows = stmt.query_map(params![staff_id.as_str(), limit], read_session_row)?;
            rows.collect::<Result<_, _>>()?
        };

        rows.into_iter().map(session_from_row).collect()
    }

    fn is_healthy(&self) -> bool {
        match self.conn.lock() {
            Ok(conn) => conn.query_row("SELECT 1", [], |_| Ok(())).is_ok(),
            Err(_) => {
                warn!("Ledger lock poisoned");
                false
            }
        }
    }
}
