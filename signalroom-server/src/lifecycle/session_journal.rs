//! In-memory session history.
//!
//! Keeps one record per joined connection plus per-room counters. Closed
//! records are evicted oldest first once more than `max_sessions` are held;
//! live sessions and the room counters are never evicted. Nothing here feeds
//! back into signaling.

use crate::lifecycle::{ConnectionMeta, LifecycleEvent, LifecycleSink};
use async_trait::async_trait;
use chrono::{DateTime, Duration, NaiveDate, Utc};
use dashmap::DashMap;
use serde::Serialize;
use signalroom_core::{ConnectionId, Role, RoomId};
use std::collections::{BTreeMap, HashSet, VecDeque};
use std::net::SocketAddr;
use std::sync::Mutex;
use tracing::{debug, info};

/// How far back `daily_stats` looks.
pub const DAILY_STATS_WINDOW_DAYS: i64 = 30;

/// Default number of session records kept in memory.
pub const DEFAULT_JOURNAL_MAX_SESSIONS: usize = 10_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionStatus {
    Active,
    Disconnected,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SessionRecord {
    pub session_id: ConnectionId,
    pub room_id: RoomId,
    pub role: Role,
    pub remote_addr: Option<SocketAddr>,
    pub user_agent: Option<String>,
    pub connected_at: DateTime<Utc>,
    pub disconnected_at: Option<DateTime<Utc>>,
    pub duration_seconds: Option<i64>,
    pub status: SessionStatus,
}

/// Lifetime counters for one room. Unaffected by record eviction.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RoomStats {
    pub room_id: RoomId,
    pub total_sessions: u64,
    pub active_sessions: u64,
    pub closed_sessions: u64,
    pub peak_concurrent: u64,
    pub total_duration_seconds: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub last_joined_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OverallStats {
    pub total_sessions: u64,
    pub total_rooms: usize,
    pub active_sessions: u64,
    pub avg_session_duration: Option<f64>,
    pub last_connection: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DailyStats {
    pub date: NaiveDate,
    pub total_connections: usize,
    pub unique_rooms: usize,
    pub senders: usize,
    pub viewers: usize,
    pub avg_duration: Option<f64>,
}

/// Session history sink.
///
/// The query methods are the read side for an embedding application, e.g. a
/// statistics endpoint; the relay itself only logs a summary on close.
#[derive(Debug)]
pub struct SessionJournal {
    max_sessions: usize,
    // Accepted connections that have not joined a room yet.
    pending: DashMap<ConnectionId, ConnectionMeta>,
    sessions: DashMap<ConnectionId, SessionRecord>,
    // Closed session ids, oldest first; the eviction order.
    closed: Mutex<VecDeque<ConnectionId>>,
    rooms: DashMap<RoomId, RoomStats>,
}

impl Default for SessionJournal {
    fn default() -> Self {
        Self::with_max_sessions(DEFAULT_JOURNAL_MAX_SESSIONS)
    }
}

impl SessionJournal {
    pub fn new() -> Self {
        Self::default()
    }

    /// A journal holding at most `max_sessions` records, plus any sessions
    /// that are still live.
    pub fn with_max_sessions(max_sessions: usize) -> Self {
        Self {
            max_sessions,
            pending: DashMap::new(),
            sessions: DashMap::new(),
            closed: Mutex::new(VecDeque::new()),
            rooms: DashMap::new(),
        }
    }

    pub fn max_sessions(&self) -> usize {
        self.max_sessions
    }

    /// Number of session records currently held.
    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }

    pub fn session(&self, id: &ConnectionId) -> Option<SessionRecord> {
        self.sessions.get(id).map(|r| r.value().clone())
    }

    pub fn room_stats(&self, room_id: &RoomId) -> Option<RoomStats> {
        self.rooms.get(room_id).map(|r| r.value().clone())
    }

    /// Most recently joined sessions still held, newest first.
    pub fn recent_sessions(&self, limit: usize) -> Vec<SessionRecord> {
        let mut sessions: Vec<_> = self.sessions.iter().map(|r| r.value().clone()).collect();
        sessions.sort_by(|a, b| b.connected_at.cmp(&a.connected_at));
        sessions.truncate(limit);
        sessions
    }

    /// Rooms by lifetime session count, busiest first.
    pub fn popular_rooms(&self, limit: usize) -> Vec<RoomStats> {
        let mut rooms: Vec<_> = self.rooms.iter().map(|r| r.value().clone()).collect();
        rooms.sort_by(|a, b| {
            b.total_sessions
                .cmp(&a.total_sessions)
                .then_with(|| a.room_id.as_str().cmp(b.room_id.as_str()))
        });
        rooms.truncate(limit);
        rooms
    }

    /// Lifetime totals, computed from the room counters.
    pub fn overall_stats(&self) -> OverallStats {
        let mut stats = OverallStats {
            total_sessions: 0,
            total_rooms: self.rooms.len(),
            active_sessions: 0,
            avg_session_duration: None,
            last_connection: None,
        };
        let mut closed = 0u64;
        let mut duration = 0i64;

        for entry in self.rooms.iter() {
            let room = entry.value();
            stats.total_sessions += room.total_sessions;
            stats.active_sessions += room.active_sessions;
            closed += room.closed_sessions;
            duration += room.total_duration_seconds;
            stats.last_connection = stats.last_connection.max(Some(room.last_joined_at));
        }

        if closed > 0 {
            stats.avg_session_duration = Some(round2(duration as f64 / closed as f64));
        }
        stats
    }

    /// Per-day totals over the held records for the last
    /// `DAILY_STATS_WINDOW_DAYS` days, newest first.
    pub fn daily_stats(&self, now: DateTime<Utc>) -> Vec<DailyStats> {
        #[derive(Default)]
        struct Day {
            connections: usize,
            rooms: HashSet<RoomId>,
            senders: usize,
            viewers: usize,
            durations: Vec<i64>,
        }

        let since = now - Duration::days(DAILY_STATS_WINDOW_DAYS);
        let mut days: BTreeMap<NaiveDate, Day> = BTreeMap::new();

        for entry in self.sessions.iter() {
            let record = entry.value();
            if record.connected_at < since {
                continue;
            }
            let day = days.entry(record.connected_at.date_naive()).or_default();
            day.connections += 1;
            day.rooms.insert(record.room_id.clone());
            match record.role {
                Role::Sender => day.senders += 1,
                Role::Viewer => day.viewers += 1,
            }
            if let Some(d) = record.duration_seconds {
                day.durations.push(d);
            }
        }

        days.into_iter()
            .rev()
            .map(|(date, day)| DailyStats {
                date,
                total_connections: day.connections,
                unique_rooms: day.rooms.len(),
                senders: day.senders,
                viewers: day.viewers,
                avg_duration: average(&day.durations),
            })
            .collect()
    }

    fn open_session(&self, id: ConnectionId, room_id: &RoomId, role: Role, at: DateTime<Utc>) {
        let meta = self.pending.remove(&id).map(|(_, meta)| meta).unwrap_or_default();

        self.sessions.insert(
            id,
            SessionRecord {
                session_id: id,
                room_id: room_id.clone(),
                role,
                remote_addr: meta.remote_addr,
                user_agent: meta.user_agent,
                connected_at: at,
                disconnected_at: None,
                duration_seconds: None,
                status: SessionStatus::Active,
            },
        );

        let mut stats = self.rooms.entry(room_id.clone()).or_insert_with(|| RoomStats {
            room_id: room_id.clone(),
            total_sessions: 0,
            active_sessions: 0,
            closed_sessions: 0,
            peak_concurrent: 0,
            total_duration_seconds: 0,
            created_at: at,
            updated_at: at,
            last_joined_at: at,
        });
        stats.total_sessions += 1;
        stats.active_sessions += 1;
        stats.peak_concurrent = stats.peak_concurrent.max(stats.active_sessions);
        stats.updated_at = at;
        stats.last_joined_at = stats.last_joined_at.max(at);
    }

    fn close_session(&self, id: &ConnectionId, at: DateTime<Utc>) {
        self.pending.remove(id);

        let room_id;
        let duration;
        {
            let Some(mut record) = self.sessions.get_mut(id) else {
                return;
            };
            if record.status != SessionStatus::Active {
                return;
            }
            duration = (at - record.connected_at).num_seconds().max(0);
            record.disconnected_at = Some(at);
            record.duration_seconds = Some(duration);
            record.status = SessionStatus::Disconnected;
            room_id = record.room_id.clone();
        }

        if let Some(mut stats) = self.rooms.get_mut(&room_id) {
            stats.active_sessions = stats.active_sessions.saturating_sub(1);
            stats.closed_sessions += 1;
            stats.total_duration_seconds += duration;
            stats.updated_at = at;
        }

        self.retire(*id);
    }

    // Queues a closed record and drops the oldest closed ones past the cap.
    fn retire(&self, id: ConnectionId) {
        let mut closed = self.closed.lock().unwrap_or_else(|e| e.into_inner());
        closed.push_back(id);
        while self.sessions.len() > self.max_sessions {
            let Some(oldest) = closed.pop_front() else {
                break;
            };
            self.sessions.remove(&oldest);
            debug!(session_id = %oldest, "evicted session record");
        }
    }
}

fn average(values: &[i64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    let sum: i64 = values.iter().sum();
    Some(round2(sum as f64 / values.len() as f64))
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

#[async_trait]
impl LifecycleSink for SessionJournal {
    fn name(&self) -> &'static str {
        "session-journal"
    }

    async fn record(&self, event: &LifecycleEvent) -> anyhow::Result<()> {
        match event {
            LifecycleEvent::Connected {
                connection_id,
                meta,
                ..
            } => {
                self.pending.insert(*connection_id, meta.clone());
            }
            LifecycleEvent::Joined {
                connection_id,
                room_id,
                role,
                at,
            } => self.open_session(*connection_id, room_id, *role, *at),
            LifecycleEvent::Disconnected {
                connection_id, at, ..
            } => self.close_session(connection_id, *at),
        }
        Ok(())
    }

    async fn close(&self) {
        let stats = self.overall_stats();
        let busiest: Vec<_> = self
            .popular_rooms(3)
            .into_iter()
            .map(|room| format!("{}={}", room.room_id, room.total_sessions))
            .collect();
        info!(
            total_sessions = stats.total_sessions,
            total_rooms = stats.total_rooms,
            active_sessions = stats.active_sessions,
            avg_session_duration = ?stats.avg_session_duration,
            busiest_rooms = ?busiest,
            "session journal closed"
        );
    }
}
