//! Introspection snapshot and process memory sampling.

use sysinfo::{ProcessRefreshKind, ProcessesToUpdate, System};

use crate::domain::{Command, SubscriberId};

/// Point-in-time view of the relay.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelayStatus {
    /// Resident memory of this process in bytes (0 if unavailable).
    pub memory_bytes: u64,
    /// Registered observers, in connection order.
    pub subscribers: Vec<SubscriberId>,
    /// Pending commands, head first.
    pub commands: Vec<Command>,
}

impl RelayStatus {
    /// Memory usage rendered as megabytes with two decimals, e.g. `"12.34 MB"`.
    #[must_use]
    pub fn memory_usage_label(&self) -> String {
        #[allow(clippy::cast_precision_loss)]
        let mb = self.memory_bytes as f64 / 1024.0 / 1024.0;
        format!("{mb:.2} MB")
    }
}

/// Samples the resident memory of the current process.
pub fn process_memory_bytes() -> u64 {
    let Ok(pid) = sysinfo::get_current_pid() else {
        return 0;
    };
    let mut sys = System::new();
    sys.refresh_processes_specifics(
        ProcessesToUpdate::Some(&[pid]),
        false,
        ProcessRefreshKind::new().with_memory(),
    );
    sys.process(pid).map_or(0, sysinfo::Process::memory)
}
