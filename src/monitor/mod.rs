//! Liveness monitor: probe the service, redeploy it when it looks down.

pub mod daemon;

pub use daemon::{run_monitor_daemon, CycleReport, Health, LivenessMonitor, RedeployOutcome};
