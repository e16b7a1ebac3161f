//! Last-Modified timestamps persisted between runs
//!
//! One plain-text file per tracked resource, each holding a single RFC 3339
//! timestamp. Missing or unparsable files read as "never fetched".

use anyhow::{Context, Result};
use chrono::{DateTime, FixedOffset, SecondsFormat};
use log::warn;
use std::fs;
use std::io::ErrorKind;
use std::path::Path;

use crate::config::{ARCHIVE_LAST_MODIFIED_FILE, PAGE_LAST_MODIFIED_FILE};

pub type Timestamp = DateTime<FixedOffset>;

/// Remote resources whose freshness is tracked
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resource {
    Page,
    Archive,
}

impl Resource {
    fn file_name(self) -> &'static str {
        match self {
            Resource::Page => PAGE_LAST_MODIFIED_FILE,
            Resource::Archive => ARCHIVE_LAST_MODIFIED_FILE,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Resource::Page => "Page",
            Resource::Archive => "Archive",
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
struct Slot {
    value: Option<Timestamp>,
    updated: bool,
}

/// In-memory view of the two cached timestamps.
///
/// Values changed through [`LastModifiedCache::set`] are written back by
/// [`LastModifiedCache::save`]; untouched values are never rewritten.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LastModifiedCache {
    page: Slot,
    archive: Slot,
}

impl LastModifiedCache {
    /// Load both timestamps from `dir`. A missing directory is an empty cache.
    pub fn load(dir: &Path) -> Result<Self> {
        let mut cache = Self::default();
        for resource in [Resource::Page, Resource::Archive] {
            cache.slot_mut(resource).value = read_timestamp(&dir.join(resource.file_name()))?;
        }
        Ok(cache)
    }

    pub fn get(&self, resource: Resource) -> Option<Timestamp> {
        self.slot(resource).value
    }

    pub fn set(&mut self, resource: Resource, value: Timestamp) {
        *self.slot_mut(resource) = Slot {
            value: Some(value),
            updated: true,
        };
    }

    /// Write every updated timestamp into `dir`, creating it if needed
    pub fn save(&self, dir: &Path) -> Result<()> {
        for resource in [Resource::Page, Resource::Archive] {
            let slot = self.slot(resource);
            let Some(value) = slot.value.filter(|_| slot.updated) else {
                continue;
            };
            fs::create_dir_all(dir)
                .with_context(|| format!("Failed to create cache directory: {}", dir.display()))?;
            let path = dir.join(resource.file_name());
            fs::write(&path, format_timestamp(&value))
                .with_context(|| format!("Failed to write cache: {}", path.display()))?;
        }
        Ok(())
    }

    fn slot(&self, resource: Resource) -> &Slot {
        match resource {
            Resource::Page => &self.page,
            Resource::Archive => &self.archive,
        }
    }

    fn slot_mut(&mut self, resource: Resource) -> &mut Slot {
        match resource {
            Resource::Page => &mut self.page,
            Resource::Archive => &mut self.archive,
        }
    }
}

fn read_timestamp(path: &Path) -> Result<Option<Timestamp>> {
    let content = match fs::read_to_string(path) {
        Ok(c) => c,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
        Err(e) => {
            return Err(e).with_context(|| format!("Failed to read cache: {}", path.display()))
        }
    };

    let parsed = parse_timestamp(&content);
    if parsed.is_none() {
        warn!("Ignoring unparsable timestamp in {}", path.display());
    }
    Ok(parsed)
}

/// Parse a stored timestamp. Accepts RFC 3339 (what we write) and RFC 2822.
pub fn parse_timestamp(s: &str) -> Option<Timestamp> {
    let s = s.trim();
    DateTime::parse_from_rfc3339(s)
        .or_else(|_| DateTime::parse_from_rfc2822(s))
        .ok()
}

pub fn format_timestamp(ts: &Timestamp) -> String {
    ts.to_rfc3339_opts(SecondsFormat::AutoSi, false)
}
