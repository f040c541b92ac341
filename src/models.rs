use chrono::{DateTime, Local};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    Online,
    Offline,
}

impl Status {
    pub fn from_reachable(reachable: bool) -> Self {
        if reachable {
            Status::Online
        } else {
            Status::Offline
        }
    }
}

impl std::fmt::Display for Status {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // `pad` so width specifiers like `{:<8}` apply
        match self {
            Status::Online => f.pad("Online"),
            Status::Offline => f.pad("Offline"),
        }
    }
}

/// Lifetime probe counters for one target. Only ever incremented.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Counters {
    pub success: u64,
    pub failure: u64,
}

impl Counters {
    pub fn record(&mut self, reachable: bool) -> Status {
        if reachable {
            self.success += 1;
        } else {
            self.failure += 1;
        }
        Status::from_reachable(reachable)
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct TargetState {
    pub counters: Counters,
    pub last_status: Option<Status>,
}

/// Per-target state, index-aligned with `MonitorConfig::targets`.
#[derive(Debug, Clone)]
pub struct MonitorState {
    pub targets: Vec<TargetState>,
    pub rounds: u64,
}

impl MonitorState {
    pub fn new(len: usize) -> Self {
        Self {
            targets: vec![TargetState::default(); len],
            rounds: 0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TargetRecord {
    pub target: String,
    pub status: Status,
    pub success: u64,
    pub failure: u64,
}

/// The view handed to the display after a completed round.
#[derive(Debug, Clone)]
pub struct Snapshot {
    pub round: u64,
    pub taken_at: DateTime<Local>,
    pub records: Vec<TargetRecord>,
}

#[cfg(test)]
impl Snapshot {
    pub fn get(&self, target: &str) -> Option<&TargetRecord> {
        self.records.iter().find(|r| r.target == target)
    }
}
