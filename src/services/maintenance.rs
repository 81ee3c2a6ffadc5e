/*
 * Responsibility
 * - Availability probe consumed by the maintenance gate
 * - The gate only knows the trait; where the flag lives (file, env, remote) is up to the probe
 */
use std::io::ErrorKind;
use std::path::PathBuf;

/// Reports whether the server is in maintenance mode.
///
/// Called once per request, synchronously, with no caching or timeout.
pub trait MaintenanceProbe: Send + Sync {
    fn in_maintenance(&self) -> anyhow::Result<bool>;
}

impl<F> MaintenanceProbe for F
where
    F: Fn() -> anyhow::Result<bool> + Send + Sync,
{
    fn in_maintenance(&self) -> anyhow::Result<bool> {
        self()
    }
}

/// Maintenance is on while `path` exists.
#[derive(Debug, Clone)]
pub struct FlagFileProbe {
    path: PathBuf,
}

impl FlagFileProbe {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl MaintenanceProbe for FlagFileProbe {
    fn in_maintenance(&self) -> anyhow::Result<bool> {
        match std::fs::metadata(&self.path) {
            Ok(_) => Ok(true),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
            Err(e) => Err(anyhow::Error::new(e)
                .context(format!("stat maintenance flag {}", self.path.display()))),
        }
    }
}

/// Probe used when no flag source is configured.
#[derive(Debug, Clone, Copy, Default)]
pub struct NeverInMaintenance;

impl MaintenanceProbe for NeverInMaintenance {
    fn in_maintenance(&self) -> anyhow::Result<bool> {
        Ok(false)
    }
}
