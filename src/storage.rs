//! SQLite-backed record store.
//!
//! Users, queries, results and locations are plain tables. Hazard reports
//! are stored as JSON documents keyed by report id, in insertion order.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension, Row};

use crate::model::{HazardReport, Location, LocationPatch, NewLocation, Query, QueryResult, Role, User};

pub struct StateStore {
    conn: Connection,
}

/// A user row together with its stored password hash.
pub struct UserRecord {
    pub user: User,
    pub password_hash: String,
}

fn user_from_row(row: &Row<'_>) -> rusqlite::Result<UserRecord> {
    let role: String = row.get(3)?;
    let role = role.parse::<Role>().map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(3, rusqlite::types::Type::Text, Box::new(e))
    })?;
    Ok(UserRecord {
        user: User {
            id: row.get(0)?,
            name: row.get(1)?,
            email: row.get(2)?,
            role,
            created_at: row.get(5)?,
        },
        password_hash: row.get(4)?,
    })
}

fn location_from_row(row: &Row<'_>) -> rusqlite::Result<Location> {
    Ok(Location {
        id: row.get(0)?,
        result_id: row.get(1)?,
        lat: row.get(2)?,
        lng: row.get(3)?,
        label: row.get(4)?,
        score: row.get(5)?,
    })
}

impl StateStore {
    pub fn new(path: &str) -> Result<Self> {
        let conn = Connection::open(path).with_context(|| format!("opening database {}", path))?;
        Ok(Self { conn })
    }

    pub fn init(&mut self) -> Result<()> {
        self.conn.execute_batch(
            "BEGIN;
            CREATE TABLE IF NOT EXISTS users (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                name TEXT NOT NULL,
                email TEXT NOT NULL UNIQUE COLLATE NOCASE,
                role TEXT NOT NULL,
                password_hash TEXT NOT NULL,
                created_at TEXT NOT NULL
            );
            CREATE TABLE IF NOT EXISTS queries (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                user_id INTEGER NOT NULL REFERENCES users(id),
                text TEXT NOT NULL,
                created_at TEXT NOT NULL
            );
            CREATE TABLE IF NOT EXISTS results (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                query_id INTEGER NOT NULL REFERENCES queries(id),
                summary TEXT NOT NULL,
                confidence REAL NOT NULL
            );
            CREATE INDEX IF NOT EXISTS results_by_query ON results(query_id);
            CREATE TABLE IF NOT EXISTS locations (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                result_id INTEGER,
                lat REAL NOT NULL,
                lng REAL NOT NULL,
                label TEXT NOT NULL,
                score REAL
            );
            CREATE TABLE IF NOT EXISTS reports (
                seq INTEGER PRIMARY KEY AUTOINCREMENT,
                id TEXT NOT NULL UNIQUE,
                doc TEXT NOT NULL
            );
            COMMIT;",
        )?;
        Ok(())
    }

    // =========================================================================
    // Users
    // =========================================================================

    /// Returns `None` when the email is already registered.
    pub fn create_user(
        &mut self,
        name: &str,
        email: &str,
        role: Role,
        password_hash: &str,
        now: DateTime<Utc>,
    ) -> Result<Option<User>> {
        if self.find_user_by_email(email)?.is_some() {
            return Ok(None);
        }
        self.conn.execute(
            "INSERT INTO users (name, email, role, password_hash, created_at) VALUES (?1, ?2, ?3, ?4, ?5)",
            params![name, email, role.as_str(), password_hash, now],
        )?;
        Ok(Some(User { id: self.conn.last_insert_rowid(), name: name.to_string(), email: email.to_string(), role, created_at: now }))
    }

    pub fn find_user_by_email(&self, email: &str) -> Result<Option<UserRecord>> {
        let record = self
            .conn
            .query_row(
                "SELECT id, name, email, role, password_hash, created_at FROM users WHERE email = ?1",
                params![email],
                user_from_row,
            )
            .optional()?;
        Ok(record)
    }

    // =========================================================================
    // Queries and results
    // =========================================================================

    pub fn insert_query(&mut self, user_id: i64, text: &str, now: DateTime<Utc>) -> Result<Query> {
        self.conn.execute(
            "INSERT INTO queries (user_id, text, created_at) VALUES (?1, ?2, ?3)",
            params![user_id, text, now],
        )?;
        Ok(Query { id: self.conn.last_insert_rowid(), user_id, text: text.to_string(), created_at: now })
    }

    pub fn insert_result(&mut self, query_id: i64, summary: &str, confidence: f64) -> Result<QueryResult> {
        self.conn.execute(
            "INSERT INTO results (query_id, summary, confidence) VALUES (?1, ?2, ?3)",
            params![query_id, summary, confidence],
        )?;
        Ok(QueryResult { id: self.conn.last_insert_rowid(), query_id, summary: summary.to_string(), confidence })
    }

    pub fn results_for_query(&self, query_id: i64) -> Result<Vec<QueryResult>> {
        let mut stmt = self
            .conn
            .prepare("SELECT id, query_id, summary, confidence FROM results WHERE query_id = ?1 ORDER BY id")?;
        let rows = stmt.query_map(params![query_id], |row| {
            Ok(QueryResult { id: row.get(0)?, query_id: row.get(1)?, summary: row.get(2)?, confidence: row.get(3)? })
        })?;
        Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
    }

    // =========================================================================
    // Locations
    // =========================================================================

    pub fn list_locations(&self) -> Result<Vec<Location>> {
        let mut stmt = self
            .conn
            .prepare("SELECT id, result_id, lat, lng, label, score FROM locations ORDER BY id")?;
        let rows = stmt.query_map([], location_from_row)?;
        Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
    }

    pub fn get_location(&self, id: i64) -> Result<Option<Location>> {
        let loc = self
            .conn
            .query_row(
                "SELECT id, result_id, lat, lng, label, score FROM locations WHERE id = ?1",
                params![id],
                location_from_row,
            )
            .optional()?;
        Ok(loc)
    }

    pub fn insert_location(&mut self, new: &NewLocation) -> Result<Location> {
        self.conn.execute(
            "INSERT INTO locations (result_id, lat, lng, label, score) VALUES (?1, ?2, ?3, ?4, ?5)",
            params![new.result_id, new.lat, new.lng, new.label, new.score],
        )?;
        Ok(Location {
            id: self.conn.last_insert_rowid(),
            result_id: new.result_id,
            lat: new.lat,
            lng: new.lng,
            label: new.label.clone(),
            score: new.score,
        })
    }

    /// `Ok(None)` when the location does not exist; `Ok(Some(Err))` when the
    /// patch would produce an invalid marker.
    pub fn update_location(&mut self, id: i64, patch: LocationPatch) -> Result<Option<Result<Location, String>>> {
        let Some(mut loc) = self.get_location(id)? else {
            return Ok(None);
        };
        if let Err(msg) = loc.apply(patch) {
            return Ok(Some(Err(msg)));
        }
        self.conn.execute(
            "UPDATE locations SET result_id = ?2, lat = ?3, lng = ?4, label = ?5, score = ?6 WHERE id = ?1",
            params![loc.id, loc.result_id, loc.lat, loc.lng, loc.label, loc.score],
        )?;
        Ok(Some(Ok(loc)))
    }

    pub fn delete_location(&mut self, id: i64) -> Result<bool> {
        let n = self.conn.execute("DELETE FROM locations WHERE id = ?1", params![id])?;
        Ok(n > 0)
    }

    // =========================================================================
    // Hazard reports
    // =========================================================================

    pub fn insert_report(&mut self, report: &HazardReport) -> Result<()> {
        let doc = serde_json::to_string(report)?;
        self.conn
            .execute("INSERT INTO reports (id, doc) VALUES (?1, ?2)", params![report.id, doc])
            .with_context(|| format!("inserting report {}", report.id))?;
        Ok(())
    }

    pub fn insert_reports(&mut self, reports: &[HazardReport]) -> Result<()> {
        let tx = self.conn.transaction()?;
        for report in reports {
            tx.execute(
                "INSERT INTO reports (id, doc) VALUES (?1, ?2)",
                params![report.id, serde_json::to_string(report)?],
            )?;
        }
        tx.commit()?;
        Ok(())
    }

    /// All reports in insertion order.
    pub fn list_reports(&self) -> Result<Vec<HazardReport>> {
        let mut stmt = self.conn.prepare("SELECT doc FROM reports ORDER BY seq")?;
        let docs = stmt
            .query_map([], |row| row.get::<_, String>(0))?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        docs.iter()
            .map(|doc| serde_json::from_str(doc).context("decoding report document"))
            .collect()
    }

    pub fn report_count(&self) -> Result<u64> {
        let n: i64 = self.conn.query_row("SELECT COUNT(*) FROM reports", [], |row| row.get(0))?;
        Ok(n as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sample;

    fn store() -> StateStore {
        let mut store = StateStore::new(":memory:").unwrap();
        store.init().unwrap();
        store
    }

    #[test]
    fn test_duplicate_email_rejected_case_insensitive() {
        let mut s = store();
        let now = Utc::now();
        assert!(s.create_user("Test", "test@example.com", Role::Citizen, "h", now).unwrap().is_some());
        assert!(s.create_user("Test", "TEST@example.com", Role::Citizen, "h", now).unwrap().is_none());
        let found = s.find_user_by_email("test@example.com").unwrap().unwrap();
        assert_eq!(found.user.name, "Test");
        assert_eq!(found.password_hash, "h");
    }

    #[test]
    fn test_results_scoped_to_query() {
        let mut s = store();
        let user = s.create_user("T", "t@x.org", Role::Official, "h", Utc::now()).unwrap().unwrap();
        let q1 = s.insert_query(user.id, "Earthquake in Japan", Utc::now()).unwrap();
        let q2 = s.insert_query(user.id, "Storm in Goa", Utc::now()).unwrap();
        s.insert_result(q1.id, "Detected earthquake", 0.95).unwrap();
        assert_eq!(s.results_for_query(q1.id).unwrap().len(), 1);
        assert!(s.results_for_query(q2.id).unwrap().is_empty());
    }

    #[test]
    fn test_location_crud() {
        let mut s = store();
        let loc = s
            .insert_location(&NewLocation { result_id: None, lat: 35.6895, lng: 139.6917, label: "Tokyo".into(), score: Some(0.9) })
            .unwrap();
        assert_eq!(s.list_locations().unwrap().len(), 1);

        let updated = s
            .update_location(loc.id, LocationPatch { label: Some("Tokyo Updated".into()), ..Default::default() })
            .unwrap()
            .unwrap()
            .unwrap();
        assert_eq!(updated.label, "Tokyo Updated");
        assert_eq!(s.get_location(loc.id).unwrap().unwrap().label, "Tokyo Updated");

        assert!(s.delete_location(loc.id).unwrap());
        assert!(!s.delete_location(loc.id).unwrap());
        assert!(s.get_location(loc.id).unwrap().is_none());
        assert!(s.update_location(loc.id, LocationPatch::default()).unwrap().is_none());
    }

    #[test]
    fn test_reports_keep_insertion_order() {
        let mut s = store();
        let reports = sample::hazard_reports();
        s.insert_reports(&reports).unwrap();
        assert_eq!(s.report_count().unwrap(), 20);
        assert_eq!(s.list_reports().unwrap(), reports);
        assert!(s.insert_report(&reports[0]).is_err());
    }
}
