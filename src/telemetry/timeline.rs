//! Timeline Store — append-only, indexed SQLite persistence of timeline
//! entries. See spec.md §4.5.

use std::path::Path;
use std::time::Duration;

use parking_lot::Mutex;
use rusqlite::{params, Connection, OptionalExtension};
use serde::{Deserialize, Serialize};

use crate::error::{EngineError, EngineResult};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TimelineEntry {
    pub id: Option<i64>,
    pub timestamp: f64,
    pub source: String,
    pub event_type: String,
    pub load_score: f64,
    pub context: String,
    pub metadata_json: String,
}

impl TimelineEntry {
    pub fn new(
        timestamp: f64,
        source: impl Into<String>,
        event_type: impl Into<String>,
        load_score: f64,
        context: impl Into<String>,
        metadata_json: impl Into<String>,
    ) -> Self {
        Self {
            id: None,
            timestamp,
            source: source.into(),
            event_type: event_type.into(),
            load_score,
            context: context.into(),
            metadata_json: metadata_json.into(),
        }
    }
}

/// Optional query filters for [`TimelineStore::query`].
#[derive(Debug, Clone, Default)]
pub struct QueryFilter {
    pub since: Option<f64>,
    pub until: Option<f64>,
    pub source: Option<String>,
    pub limit: u32,
}

/// Thread-safe SQLite-backed timeline store. Writes are serialized through a
/// single mutex-guarded connection, matching spec.md §4.5's "single
/// transactional append per call" requirement.
pub struct TimelineStore {
    conn: Mutex<Connection>,
}

/// External API cap from spec.md §4.5.
pub const MAX_QUERY_LIMIT: u32 = 1000;

impl TimelineStore {
    pub fn open(db_path: impl AsRef<Path>) -> EngineResult<Self> {
        let conn = Connection::open(db_path)?;
        conn.busy_timeout(Duration::from_millis(500))?;
        init_schema(&conn)?;
        Ok(Self { conn: Mutex::new(conn) })
    }

    pub fn open_in_memory() -> EngineResult<Self> {
        let conn = Connection::open_in_memory()?;
        init_schema(&conn)?;
        Ok(Self { conn: Mutex::new(conn) })
    }

    /// Insert `entry`, commit, and return the assigned id.
    #[tracing::instrument(skip(self, entry), fields(source = %entry.source, event_type = %entry.event_type))]
    pub fn append(&self, entry: &TimelineEntry) -> EngineResult<i64> {
        let conn = self.conn.lock();
        conn.execute(
            "INSERT INTO timeline (timestamp, source, event_type, load_score, context, metadata_json)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                entry.timestamp,
                entry.source,
                entry.event_type,
                entry.load_score,
                entry.context,
                entry.metadata_json,
            ],
        )?;
        Ok(conn.last_insert_rowid())
    }

    /// Returns at most `filter.limit` entries matching the filter, ordered
    /// by timestamp DESC (newest first).
    pub fn query(&self, filter: &QueryFilter) -> EngineResult<Vec<TimelineEntry>> {
        let limit = filter.limit.min(MAX_QUERY_LIMIT).max(1);

        let mut sql = String::from(
            "SELECT id, timestamp, source, event_type, load_score, context, metadata_json FROM timeline",
        );
        let mut clauses = Vec::new();
        if filter.since.is_some() {
            clauses.push("timestamp >= ?");
        }
        if filter.until.is_some() {
            clauses.push("timestamp <= ?");
        }
        if filter.source.is_some() {
            clauses.push("source = ?");
        }
        if !clauses.is_empty() {
            sql.push_str(" WHERE ");
            sql.push_str(&clauses.join(" AND "));
        }
        sql.push_str(" ORDER BY timestamp DESC LIMIT ?");

        let conn = self.conn.lock();
        let mut stmt = conn.prepare(&sql)?;

        let mut idx = 1;
        // rusqlite binds by position; build a Vec<&dyn ToSql> in the same
        // order the clauses above were appended.
        let mut bound: Vec<Box<dyn rusqlite::ToSql>> = Vec::new();
        if let Some(since) = filter.since {
            bound.push(Box::new(since));
        }
        if let Some(until) = filter.until {
            bound.push(Box::new(until));
        }
        if let Some(source) = &filter.source {
            bound.push(Box::new(source.clone()));
        }
        bound.push(Box::new(limit));
        let _ = &mut idx;

        let params_ref: Vec<&dyn rusqlite::ToSql> = bound.iter().map(|b| b.as_ref()).collect();

        let rows = stmt.query_map(params_ref.as_slice(), row_to_entry)?;
        let mut out = Vec::new();
        for row in rows {
            out.push(row?);
        }
        Ok(out)
    }

    /// Shorthand for `query(since=now-window_s, limit=1000)` projected to
    /// `load_score`, ascending (chronological) order.
    pub fn recent_load_scores(&self, now: f64, window_s: f64) -> EngineResult<Vec<f64>> {
        let entries = self.query(&QueryFilter {
            since: Some(now - window_s),
            limit: MAX_QUERY_LIMIT,
            ..Default::default()
        })?;
        Ok(entries.into_iter().rev().map(|e| e.load_score).collect())
    }

    /// Fetch all `inference_tick` engine entries in `[since, until]`,
    /// chronological order. Internal helper shared by session and daily
    /// analytics.
    pub(crate) fn engine_ticks(&self, since: Option<f64>, until: Option<f64>) -> EngineResult<Vec<TimelineEntry>> {
        // Session/daily analytics are not bound by the public API's 1000-row
        // cap, so this goes through the uncapped query path directly.
        let all = self.query_unbounded(since, until)?;
        let mut ticks: Vec<TimelineEntry> =
            all.into_iter().filter(|e| e.event_type == "inference_tick").collect();
        ticks.reverse(); // query_unbounded() returns DESC; analytics wants ASC
        Ok(ticks)
    }

    /// Internal: query without the public API's `MAX_QUERY_LIMIT` cap, for
    /// analytics callers that legitimately need the full range.
    fn query_unbounded(&self, since: Option<f64>, until: Option<f64>) -> EngineResult<Vec<TimelineEntry>> {
        let mut sql = String::from(
            "SELECT id, timestamp, source, event_type, load_score, context, metadata_json FROM timeline WHERE source = 'engine'",
        );
        if since.is_some() {
            sql.push_str(" AND timestamp >= ?1");
        }
        if until.is_some() {
            let placeholder = if since.is_some() { "?2" } else { "?1" };
            sql.push_str(&format!(" AND timestamp <= {placeholder}"));
        }
        sql.push_str(" ORDER BY timestamp DESC");

        let conn = self.conn.lock();
        let mut stmt = conn.prepare(&sql)?;
        let mut bound: Vec<Box<dyn rusqlite::ToSql>> = Vec::new();
        if let Some(s) = since {
            bound.push(Box::new(s));
        }
        if let Some(u) = until {
            bound.push(Box::new(u));
        }
        let params_ref: Vec<&dyn rusqlite::ToSql> = bound.iter().map(|b| b.as_ref()).collect();
        let rows = stmt.query_map(params_ref.as_slice(), row_to_entry)?;
        let mut out = Vec::new();
        for row in rows {
            out.push(row?);
        }
        Ok(out)
    }

    /// Look up a single entry by id (used by tests/diagnostics).
    pub fn get(&self, id: i64) -> EngineResult<Option<TimelineEntry>> {
        let conn = self.conn.lock();
        let entry = conn
            .query_row(
                "SELECT id, timestamp, source, event_type, load_score, context, metadata_json FROM timeline WHERE id = ?1",
                params![id],
                row_to_entry,
            )
            .optional()?;
        Ok(entry)
    }
}

fn row_to_entry(row: &rusqlite::Row<'_>) -> rusqlite::Result<TimelineEntry> {
    Ok(TimelineEntry {
        id: Some(row.get(0)?),
        timestamp: row.get(1)?,
        source: row.get(2)?,
        event_type: row.get(3)?,
        load_score: row.get(4)?,
        context: row.get(5)?,
        metadata_json: row.get(6)?,
    })
}

fn init_schema(conn: &Connection) -> EngineResult<()> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS timeline (
            id            INTEGER PRIMARY KEY AUTOINCREMENT,
            timestamp     REAL    NOT NULL,
            source        TEXT    NOT NULL,
            event_type    TEXT    NOT NULL,
            load_score    REAL    NOT NULL DEFAULT 0.0,
            context       TEXT    NOT NULL DEFAULT 'unknown',
            metadata_json TEXT    NOT NULL DEFAULT '{}'
        );
        CREATE INDEX IF NOT EXISTS idx_timeline_ts ON timeline(timestamp);",
    )?;
    Ok(())
}

/// Guard used by store callers that build filter bounds from user input.
pub fn validate_range(since: Option<f64>, until: Option<f64>) -> EngineResult<()> {
    if let (Some(s), Some(u)) = (since, until) {
        if s > u {
            return Err(EngineError::InvalidRange(format!("since ({s}) > until ({u})")));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(ts: f64, score: f64, ctx: &str) -> TimelineEntry {
        TimelineEntry::new(ts, "engine", "inference_tick", score, ctx, "{}")
    }

    #[test]
    fn append_assigns_monotonic_ids() {
        let store = TimelineStore::open_in_memory().unwrap();
        let id1 = store.append(&entry(1.0, 0.1, "unknown")).unwrap();
        let id2 = store.append(&entry(2.0, 0.2, "unknown")).unwrap();
        assert!(id2 > id1);
    }

    #[test]
    fn query_orders_newest_first_and_respects_limit() {
        let store = TimelineStore::open_in_memory().unwrap();
        for i in 0..5 {
            store.append(&entry(i as f64, 0.1, "unknown")).unwrap();
        }
        let results = store
            .query(&QueryFilter { limit: 3, ..Default::default() })
            .unwrap();
        assert_eq!(results.len(), 3);
        assert!(results[0].timestamp > results[1].timestamp);
    }

    #[test]
    fn query_filters_by_source() {
        let store = TimelineStore::open_in_memory().unwrap();
        store.append(&entry(1.0, 0.1, "unknown")).unwrap();
        store
            .append(&TimelineEntry::new(2.0, "browser", "tab_switch", 0.0, "unknown", "{}"))
            .unwrap();
        let results = store
            .query(&QueryFilter { source: Some("browser".into()), limit: 10, ..Default::default() })
            .unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].source, "browser");
    }

    #[test]
    fn query_limit_is_capped_externally() {
        let store = TimelineStore::open_in_memory().unwrap();
        for i in 0..5 {
            store.append(&entry(i as f64, 0.1, "unknown")).unwrap();
        }
        let results = store
            .query(&QueryFilter { limit: 5_000, ..Default::default() })
            .unwrap();
        assert!(results.len() <= MAX_QUERY_LIMIT as usize);
    }

    #[test]
    fn recent_load_scores_are_chronological() {
        let store = TimelineStore::open_in_memory().unwrap();
        store.append(&entry(1.0, 0.1, "unknown")).unwrap();
        store.append(&entry(2.0, 0.2, "unknown")).unwrap();
        store.append(&entry(3.0, 0.3, "unknown")).unwrap();
        let scores = store.recent_load_scores(100.0, 1000.0).unwrap();
        assert_eq!(scores, vec![0.1, 0.2, 0.3]);
    }

    #[test]
    fn timeline_is_append_only_prefix() {
        let store = TimelineStore::open_in_memory().unwrap();
        store.append(&entry(1.0, 0.1, "unknown")).unwrap();
        let first_query = store.query(&QueryFilter { limit: 10, ..Default::default() }).unwrap();
        store.append(&entry(2.0, 0.2, "unknown")).unwrap();
        let second_query = store.query(&QueryFilter { limit: 10, ..Default::default() }).unwrap();
        // first_query (newest-first) must be a prefix of second_query by id.
        assert_eq!(second_query[1].id, first_query[0].id);
    }

    #[test]
    fn validate_range_rejects_inverted_bounds() {
        assert!(validate_range(Some(10.0), Some(5.0)).is_err());
        assert!(validate_range(Some(5.0), Some(10.0)).is_ok());
        assert!(validate_range(None, None).is_ok());
    }
}
