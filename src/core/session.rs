//! # Session Grouping Module / 会话分组模块
//!
//! Groups the record stream of one execution data file into per-session probe
//! stores. The source announces a session boundary, then zero or more probe
//! records that belong to it; [`SessionVisitor`] tracks the current session as
//! an explicit state.
//!
//! 将一个执行数据文件的记录流按会话分组为探针存储。数据源先宣告会话边界，
//! 随后是属于该会话的零个或多个探针记录；[`SessionVisitor`] 以显式状态跟踪当前会话。

use crate::core::models::{ExecutionData, SessionInfo};
use std::collections::BTreeMap;
use std::collections::btree_map;
use tracing::trace;

/// Errors raised while grouping records into sessions.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    /// A probe record arrived before any session boundary was announced.
    #[error("probe record for class {class} arrived before any session boundary")]
    NoActiveSession { class: String },
    /// The same class id was recorded with a different name or probe count.
    #[error("incompatible execution data for class {name} with id {id:016x}")]
    IncompatibleProbes { id: u64, name: String },
}

/// The consumer side of the execution record protocol.
/// 执行记录协议的消费端。
pub trait RecordVisitor {
    /// A session boundary: every following probe record belongs to `info.id`.
    fn on_session_boundary(&mut self, info: SessionInfo);

    /// A probe record for the most recently announced session.
    fn on_probe_record(&mut self, record: ExecutionData) -> Result<(), SessionError>;
}

/// Accumulated probe hits of one session, keyed by class id.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProbeStore {
    entries: BTreeMap<u64, ExecutionData>,
}

impl ProbeStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a record. A record for an already-known class id is merged by
    /// OR-ing its probes into the stored ones.
    pub fn put(&mut self, record: ExecutionData) -> Result<(), SessionError> {
        match self.entries.entry(record.id) {
            btree_map::Entry::Vacant(slot) => {
                slot.insert(record);
            }
            btree_map::Entry::Occupied(mut slot) => {
                let stored = slot.get_mut();
                if stored.name != record.name || stored.probes.len() != record.probes.len() {
                    return Err(SessionError::IncompatibleProbes {
                        id: record.id,
                        name: record.name,
                    });
                }
                for (hit, incoming) in stored.probes.iter_mut().zip(record.probes) {
                    *hit |= incoming;
                }
            }
        }
        Ok(())
    }

    pub fn get(&self, id: u64) -> Option<&ExecutionData> {
        self.entries.get(&id)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ExecutionData> {
        self.entries.values()
    }
}

/// One session: the boundary that opened it and everything recorded under it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    /// The first boundary seen for this id.
    pub info: SessionInfo,
    pub store: ProbeStore,
}

impl Session {
    pub fn id(&self) -> &str {
        &self.info.id
    }
}

/// The grouped sessions of one record stream, iterated in identifier order.
/// 一个记录流分组后的会话，按标识符顺序迭代。
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Sessions {
    sessions: BTreeMap<String, Session>,
}

impl Sessions {
    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }

    pub fn get(&self, id: &str) -> Option<&Session> {
        self.sessions.get(id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Session> {
        self.sessions.values()
    }

    /// Sessions that can become test cases, i.e. those with a non-empty id.
    pub fn non_empty(&self) -> impl Iterator<Item = &Session> {
        self.iter().filter(|session| !session.id().is_empty())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum VisitorState {
    Idle,
    Active(String),
}

/// Groups records into sessions.
///
/// States: `Idle` until the first boundary, then `Active(id)`; each boundary
/// moves to `Active` with the announced id, creating its store on first sight.
#[derive(Debug)]
pub struct SessionVisitor {
    sessions: BTreeMap<String, Session>,
    state: VisitorState,
}

impl Default for SessionVisitor {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionVisitor {
    pub fn new() -> Self {
        Self {
            sessions: BTreeMap::new(),
            state: VisitorState::Idle,
        }
    }

    /// The id of the current session, if a boundary has been seen.
    pub fn current_session(&self) -> Option<&str> {
        match &self.state {
            VisitorState::Idle => None,
            VisitorState::Active(id) => Some(id),
        }
    }

    pub fn into_sessions(self) -> Sessions {
        Sessions {
            sessions: self.sessions,
        }
    }
}

impl RecordVisitor for SessionVisitor {
    fn on_session_boundary(&mut self, info: SessionInfo) {
        trace!(
            session = %info.id,
            start = %format_timestamp(info.start_time()),
            dump = %format_timestamp(info.dump_time()),
            "session boundary"
        );

        let id = info.id.clone();
        self.sessions
            .entry(id.clone())
            .or_insert_with(|| Session {
                info,
                store: ProbeStore::new(),
            });
        self.state = VisitorState::Active(id);
    }

    fn on_probe_record(&mut self, record: ExecutionData) -> Result<(), SessionError> {
        let VisitorState::Active(id) = &self.state else {
            return Err(SessionError::NoActiveSession { class: record.name });
        };

        trace!(
            "{:016x}  {:3} of {:3}   {}",
            record.id,
            record.hit_count(),
            record.probes.len(),
            record.name
        );

        match self.sessions.get_mut(id) {
            Some(session) => session.store.put(record),
            None => Err(SessionError::NoActiveSession { class: record.name }),
        }
    }
}

fn format_timestamp(time: Option<chrono::DateTime<chrono::Utc>>) -> String {
    time.map(|t| t.to_rfc3339())
        .unwrap_or_else(|| "invalid".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(id: u64, name: &str, probes: &[bool]) -> ExecutionData {
        ExecutionData::new(id, name, probes.to_vec())
    }

    #[test]
    fn probe_before_boundary_is_rejected() {
        let mut visitor = SessionVisitor::new();
        assert_eq!(visitor.current_session(), None);

        let err = visitor
            .on_probe_record(record(1, "p/A", &[true]))
            .unwrap_err();
        assert!(matches!(err, SessionError::NoActiveSession { class } if class == "p/A"));
    }

    #[test]
    fn records_follow_the_latest_boundary() {
        let mut visitor = SessionVisitor::new();
        visitor.on_session_boundary(SessionInfo::new("a_PASS", 0, 1));
        visitor.on_probe_record(record(1, "p/A", &[true, false])).unwrap();
        visitor.on_session_boundary(SessionInfo::new("b_FAIL", 2, 3));
        visitor.on_probe_record(record(2, "p/B", &[true])).unwrap();
        assert_eq!(visitor.current_session(), Some("b_FAIL"));

        let sessions = visitor.into_sessions();
        assert_eq!(sessions.len(), 2);
        assert!(sessions.get("a_PASS").unwrap().store.get(1).is_some());
        assert!(sessions.get("a_PASS").unwrap().store.get(2).is_none());
        assert!(sessions.get("b_FAIL").unwrap().store.get(2).is_some());
    }

    #[test]
    fn repeated_boundary_merges_into_the_same_store() {
        let mut visitor = SessionVisitor::new();
        visitor.on_session_boundary(SessionInfo::new("a_PASS", 0, 1));
        visitor.on_probe_record(record(1, "p/A", &[true, false, false])).unwrap();
        visitor.on_session_boundary(SessionInfo::new("b_PASS", 0, 1));
        visitor.on_session_boundary(SessionInfo::new("a_PASS", 5, 6));
        visitor.on_probe_record(record(1, "p/A", &[false, false, true])).unwrap();

        let sessions = visitor.into_sessions();
        let session = sessions.get("a_PASS").unwrap();
        assert_eq!(session.info.start, 0, "first boundary is kept");
        assert_eq!(session.store.get(1).unwrap().probes, vec![true, false, true]);
        assert!(sessions.get("b_PASS").unwrap().store.is_empty());
    }

    #[test]
    fn incompatible_records_are_rejected() {
        let mut store = ProbeStore::new();
        store.put(record(7, "p/A", &[true, false])).unwrap();

        let err = store.put(record(7, "p/A", &[true])).unwrap_err();
        assert!(matches!(err, SessionError::IncompatibleProbes { id: 7, .. }));

        let err = store.put(record(7, "p/Other", &[true, false])).unwrap_err();
        assert!(matches!(err, SessionError::IncompatibleProbes { .. }));
    }

    #[test]
    fn empty_ids_are_grouped_but_not_offered_as_test_cases() {
        let mut visitor = SessionVisitor::new();
        visitor.on_session_boundary(SessionInfo::new("", 0, 0));
        visitor.on_probe_record(record(1, "p/A", &[true])).unwrap();
        visitor.on_session_boundary(SessionInfo::new("x_PASS", 0, 0));

        let sessions = visitor.into_sessions();
        assert_eq!(sessions.len(), 2);
        let ids: Vec<_> = sessions.non_empty().map(Session::id).collect();
        assert_eq!(ids, vec!["x_PASS"]);
    }
}
