//! Cache management for the generated inventory.
//!
//! The artifact is valid for the rest of the calendar day it was written on,
//! unless the configuration changed after it was written.

use crate::error::{Error, Result};
use chrono::{DateTime, Local, NaiveDate, Utc};
use chrono_tz::Tz;
use std::io::ErrorKind;
use std::path::Path;

/// Decides whether a cached artifact can be served as is.
#[derive(Debug, Clone, Copy, Default)]
pub struct CacheGate {
    timezone: Option<Tz>,
}

impl CacheGate {
    /// Use `timezone` for the calendar day, or the host local timezone when `None`.
    pub fn new(timezone: Option<Tz>) -> CacheGate {
        CacheGate { timezone }
    }

    /// Check the artifact at `cache_path` against the configuration file.
    ///
    /// A missing or unreadable artifact is never valid.
    pub fn is_valid(
        &self,
        cache_path: &Path,
        config_path: &Path,
        now: DateTime<Utc>,
        force_refresh: bool,
    ) -> bool {
        if force_refresh {
            log::info!("Cache refresh forced");
            return false;
        }
        let Some(cache_mtime) = modified(cache_path) else {
            return false;
        };
        self.is_fresh(cache_mtime, modified(config_path), now)
    }

    /// The policy itself, on timestamps.
    pub fn is_fresh(
        &self,
        cache_mtime: DateTime<Utc>,
        config_mtime: Option<DateTime<Utc>>,
        now: DateTime<Utc>,
    ) -> bool {
        if config_mtime.is_some_and(|c| c > cache_mtime) {
            log::info!("Configuration changed after cache was written");
            return false;
        }
        let cache_day = self.day(cache_mtime);
        let today = self.day(now);
        if cache_day != today {
            log::info!("Cache is from {cache_day}, today is {today}");
            return false;
        }
        true
    }

    fn day(&self, t: DateTime<Utc>) -> NaiveDate {
        match self.timezone {
            Some(tz) => t.with_timezone(&tz).date_naive(),
            None => t.with_timezone(&Local).date_naive(),
        }
    }
}

fn modified(path: &Path) -> Option<DateTime<Utc>> {
    std::fs::metadata(path)
        .and_then(|m| m.modified())
        .map(DateTime::<Utc>::from)
        .ok()
}

/// Read the artifact verbatim, `None` if it does not exist.
pub fn read_cache(path: &Path) -> Result<Option<String>> {
    match std::fs::read_to_string(path) {
        Ok(text) => {
            log::info!("Reading from cache file: {}", path.display());
            Ok(Some(text))
        }
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
        Err(e) => Err(Error::io(path, e)),
    }
}

/// Delete the artifact if present.
pub fn invalidate(path: &Path) -> Result<()> {
    match std::fs::remove_file(path) {
        Ok(()) => {
            log::warn!("Removed stale cache file: {}", path.display());
            Ok(())
        }
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
        Err(e) => Err(Error::io(path, e)),
    }
}

/// Replace the artifact in one step: write a sibling temp file, then rename.
///
/// Readers see either the old artifact or the new one, never a partial write.
pub fn write_cache(path: &Path, contents: &str) -> Result<()> {
    let dir = path.parent().unwrap_or_else(|| Path::new("."));
    if !dir.as_os_str().is_empty() {
        std::fs::create_dir_all(dir).map_err(|e| Error::io(dir, e))?;
    }
    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let tmp = dir.join(format!(".{file_name}.{}.tmp", std::process::id()));

    std::fs::write(&tmp, contents).map_err(|e| Error::io(&tmp, e))?;
    if let Err(e) = std::fs::rename(&tmp, path) {
        let _ = std::fs::remove_file(&tmp);
        return Err(Error::io(path, e));
    }
    log::warn!("Writing data to cache file: {}", path.display());
    Ok(())
}
