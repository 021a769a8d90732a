use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;
use std::time::Instant;
use sysinfo::{Pid, ProcessRefreshKind, ProcessesToUpdate, System};

/// Process-level runtime metrics
pub struct Metrics {
    pub http_requests: AtomicU64,
    started: Instant,
    system: Mutex<System>,
    pid: Option<Pid>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MetricsSummary {
    /// Seconds since the server started
    pub uptime: f64,
    /// Resident memory of the process in bytes, if it could be read
    pub used_memory: Option<u64>,
    /// HTTP requests served so far
    pub http_requests: u64,
}

impl Metrics {
    pub fn new() -> Self {
        Self {
            http_requests: AtomicU64::new(0),
            started: Instant::now(),
            system: Mutex::new(System::new()),
            pid: sysinfo::get_current_pid().ok(),
        }
    }

    pub fn increment_requests(&self) {
        self.http_requests.fetch_add(1, Ordering::Relaxed);
    }

    pub fn summary(&self) -> MetricsSummary {
        MetricsSummary {
            uptime: self.started.elapsed().as_secs_f64(),
            used_memory: self.used_memory(),
            http_requests: self.http_requests.load(Ordering::Relaxed),
        }
    }

    fn used_memory(&self) -> Option<u64> {
        let pid = self.pid?;
        let mut system = self.system.lock().ok()?;

        system.refresh_processes_specifics(
            ProcessesToUpdate::Some(&[pid]),
            true,
            ProcessRefreshKind::nothing().with_memory(),
        );

        system.process(pid).map(|process| process.memory())
    }
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}
