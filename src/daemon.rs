//! Wires configured sample sets to engines, drivers and reporters.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use sampled_config::{DaemonConfig, GlobalConfig};
use sampled_core::{SampleSetConfig, SampleSetEvent, SampleSetReport};
use sampled_engine::{Driver, SampleSet, SampleSetHandle};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::sync::broadcast::error::RecvError;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

struct Instance {
    handle:   SampleSetHandle,
    driver:   Driver,
    reporter: JoinHandle<()>,
}

/// All running sample sets, keyed by name.
pub struct Daemon {
    global:    GlobalConfig,
    instances: HashMap<String, Instance>,
}

impl Daemon {
    pub fn new(global: GlobalConfig) -> Self {
        Self {
            global,
            instances: HashMap::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.instances.len()
    }

    /// Bring running instances in line with `config`.
    ///
    /// Existing sample sets are reconfigured in place; drivers are only
    /// respawned when the parameter list or the global settings change.
    /// Collected history always survives a reload.
    pub async fn apply(&mut self, config: DaemonConfig) {
        if config.global != self.global {
            info!("global settings changed; respawning drivers");
            self.global = config.global.clone();
            self.restart_all().await;
        }

        let now = Utc::now();
        let wanted: Vec<&str> = config.sample_sets.iter().map(|s| s.name.as_str()).collect();
        let removed: Vec<String> = self
            .instances
            .keys()
            .filter(|name| !wanted.contains(&name.as_str()))
            .cloned()
            .collect();
        for name in removed {
            if let Some(instance) = self.instances.remove(&name) {
                info!(sample_set = %name, "removed from config");
                instance.stop().await;
            }
        }

        for set in config.sample_sets {
            let name = set.name.clone();
            let instance = match self.instances.remove(&name) {
                Some(instance) => self.reconfigure(instance, set, now).await,
                None => match self.spawn(set, now) {
                    Ok(instance) => instance,
                    Err(e) => {
                        error!(sample_set = %name, "cannot apply configuration: {e:#}");
                        continue;
                    }
                },
            };
            self.instances.insert(name, instance);
        }
    }

    /// Respawn every driver and reporter, keeping each engine's state.
    async fn restart_all(&mut self) {
        let names: Vec<String> = self.instances.keys().cloned().collect();
        for name in names {
            let Some(instance) = self.instances.remove(&name) else {
                continue;
            };
            let handle = instance.handle.clone();
            instance.stop().await;
            self.instances.insert(name, self.start_instance(handle));
        }
    }

    fn spawn(&self, set: SampleSetConfig, now: DateTime<Utc>) -> Result<Instance> {
        let name = set.name.clone();
        let engine = SampleSet::new(set, now).with_context(|| format!("creating '{name}'"))?;
        let handle = SampleSetHandle::new(engine);
        Ok(self.start_instance(handle))
    }

    /// A rejected configuration leaves the instance running as it was.
    async fn reconfigure(&self, instance: Instance, set: SampleSetConfig, now: DateTime<Utc>) -> Instance {
        let parameters_changed = instance.handle.lock().config().parameters != set.parameters;
        if let Err(e) = instance.handle.apply(set, now) {
            error!(sample_set = %instance.handle.name(), "cannot apply configuration: {e}");
            return instance;
        }

        if !parameters_changed {
            return instance;
        }
        let handle = instance.handle.clone();
        instance.stop().await;
        self.start_instance(handle)
    }

    fn start_instance(&self, handle: SampleSetHandle) -> Instance {
        let parameters = handle.lock().config().parameters.clone();
        let sources = sampled_system::sources_for(&parameters);
        let period = Duration::from_millis(self.global.tick_ms.max(1));

        let driver = Driver::spawn(handle.clone(), sources, period);
        let reporter = tokio::spawn(report_loop(handle.clone(), self.global.report_dir.clone()));
        Instance { handle, driver, reporter }
    }

    /// Stop every driver and reporter.
    pub async fn shutdown(&mut self) {
        for (name, instance) in self.instances.drain() {
            debug!(sample_set = %name, "stopping");
            instance.stop().await;
        }
    }
}

impl Instance {
    async fn stop(self) {
        self.reporter.abort();
        self.driver.shutdown().await;
    }
}

/// Emit a report on every fetch pulse.
async fn report_loop(handle: SampleSetHandle, report_dir: Option<PathBuf>) {
    let mut rx = handle.subscribe();
    loop {
        match rx.recv().await {
            Ok(SampleSetEvent::Trigger { at, completed_intervals }) => {
                info!(sample_set = %handle.name(), %at, completed_intervals, "fetch pulse");
                let report = handle.report();
                if let Err(e) = emit(&report, at, report_dir.as_deref()).await {
                    warn!(sample_set = %report.name, "report not written: {e:#}");
                }
            }
            Ok(SampleSetEvent::StatusChanged { from, to }) => {
                debug!(sample_set = %handle.name(), %from, %to, "status changed");
            }
            Ok(_) => {}
            Err(RecvError::Lagged(missed)) => {
                warn!(sample_set = %handle.name(), missed, "event stream lagged");
            }
            Err(RecvError::Closed) => break,
        }
    }
}

async fn emit(report: &SampleSetReport, at: DateTime<Utc>, dir: Option<&Path>) -> Result<()> {
    let json = serde_json::to_string_pretty(report).context("serializing report")?;
    let Some(dir) = dir else {
        info!(sample_set = %report.name, "{json}");
        return Ok(());
    };

    tokio::fs::create_dir_all(dir)
        .await
        .with_context(|| format!("creating '{}'", dir.display()))?;
    let path = dir.join(report_file_name(&report.name, at));
    tokio::fs::write(&path, json)
        .await
        .with_context(|| format!("writing '{}'", path.display()))?;
    debug!(path = %path.display(), "report written");
    Ok(())
}

fn report_file_name(name: &str, at: DateTime<Utc>) -> String {
    format!("{name}-{}.json", at.format("%Y%m%dT%H%M%SZ"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn set(name: &str, parameters: &[&str]) -> SampleSetConfig {
        SampleSetConfig {
            enable: true,
            sample_interval: 60,
            parameters: parameters.iter().map(|p| p.to_string()).collect(),
            ..SampleSetConfig::new(name)
        }
    }

    #[test]
    fn report_file_name_is_timestamped() {
        let at = Utc.with_ymd_and_hms(2024, 5, 6, 7, 8, 9).unwrap();
        assert_eq!(report_file_name("cpu", at), "cpu-20240506T070809Z.json");
    }

    #[tokio::test]
    async fn apply_adds_reconfigures_and_removes() {
        let mut daemon = Daemon::new(GlobalConfig::default());
        let config = DaemonConfig {
            global: GlobalConfig::default(),
            sample_sets: vec![
                set("uptime", &["Device.DeviceInfo.UpTime"]),
                set("memory", &["Device.DeviceInfo.MemoryStatus.Free"]),
            ],
        };
        daemon.apply(config).await;
        assert_eq!(daemon.len(), 2);

        let mut resized = set("uptime", &["Device.DeviceInfo.UpTime"]);
        resized.report_samples = 4;
        daemon
            .apply(DaemonConfig {
                global: GlobalConfig::default(),
                sample_sets: vec![resized],
            })
            .await;
        assert_eq!(daemon.len(), 1);
        let report = daemon.instances["uptime"].handle.report();
        assert_eq!(report.report_samples, 4);

        daemon.shutdown().await;
        assert_eq!(daemon.len(), 0);
    }

    fn single(global: GlobalConfig, set: SampleSetConfig) -> DaemonConfig {
        DaemonConfig {
            global,
            sample_sets: vec![set],
        }
    }

    #[tokio::test]
    async fn global_change_keeps_history() {
        let mut daemon = Daemon::new(GlobalConfig::default());
        let uptime = set("uptime", &["Device.DeviceInfo.UpTime"]);
        daemon.apply(single(GlobalConfig::default(), uptime.clone())).await;
        daemon.instances["uptime"].handle.force_sample(Utc::now()).unwrap();
        let before = daemon.instances["uptime"].handle.report();
        assert!(!before.parameters[0].values.is_empty());

        let global = GlobalConfig {
            tick_ms: 500,
            ..GlobalConfig::default()
        };
        daemon.apply(single(global.clone(), uptime)).await;
        assert_eq!(daemon.global, global);

        let instance = &daemon.instances["uptime"];
        assert!(instance.driver.is_running());
        let after = instance.handle.report();
        assert_eq!(after.report_start_time, before.report_start_time);
        assert!(!after.parameters[0].values.is_empty());
        daemon.shutdown().await;
    }

    #[tokio::test]
    async fn reload_with_force_sample_writes_preview() {
        let mut daemon = Daemon::new(GlobalConfig::default());
        let mut uptime = set("uptime", &["Device.DeviceInfo.UpTime"]);
        daemon.apply(single(GlobalConfig::default(), uptime.clone())).await;
        let started = daemon.instances["uptime"].handle.report().report_start_time;
        assert!(started.is_some());

        uptime.force_sample = true;
        daemon.apply(single(GlobalConfig::default(), uptime)).await;
        let report = daemon.instances["uptime"].handle.report();
        assert_eq!(report.report_start_time, started);
        assert!(!report.parameters[0].values.is_empty());
        daemon.shutdown().await;
    }

    #[tokio::test]
    async fn rejected_reconfigure_keeps_instance() {
        let mut daemon = Daemon::new(GlobalConfig::default());
        let uptime = set("uptime", &["Device.DeviceInfo.UpTime"]);
        let report_samples = uptime.report_samples;
        daemon.apply(single(GlobalConfig::default(), uptime.clone())).await;

        let broken = SampleSetConfig {
            report_samples: 0,
            ..uptime
        };
        daemon.apply(single(GlobalConfig::default(), broken)).await;

        assert_eq!(daemon.len(), 1);
        let instance = &daemon.instances["uptime"];
        assert!(instance.driver.is_running());
        assert_eq!(instance.handle.report().report_samples, report_samples);
        daemon.shutdown().await;
    }

    #[tokio::test]
    async fn emit_writes_json_file() {
        let dir = std::env::temp_dir().join(format!("sampled-report-{}", std::process::id()));
        let at = Utc.with_ymd_and_hms(2024, 5, 6, 7, 8, 9).unwrap();
        let engine = SampleSet::new(set("cpu", &["Device.DeviceInfo.UpTime"]), at).unwrap();

        emit(&engine.report(), at, Some(dir.as_path())).await.unwrap();
        let raw = std::fs::read_to_string(dir.join("cpu-20240506T070809Z.json")).unwrap();
        let parsed: SampleSetReport = serde_json::from_str(&raw).unwrap();
        assert_eq!(parsed, engine.report());
        std::fs::remove_dir_all(dir).unwrap();
    }
}
