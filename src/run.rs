//! One refresh run: page check, archive check, extraction

use anyhow::Result;
use log::info;

use crate::archive::extract_archive;
use crate::cache::{LastModifiedCache, Resource};
use crate::config::{Config, ARCHIVE_LINK_MARKER};
use crate::detect::{Change, ChangeDetector};
use crate::fetch::Fetch;
use crate::link::resolve_archive_url;
use crate::routes::ROUTES;

/// What a completed run did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// Nothing new upstream; no CSV was written
    Unchanged,
    /// The archive changed and every routed sheet was extracted
    Updated,
}

pub fn run<F: Fetch>(config: &Config, fetcher: &F) -> Result<Outcome> {
    let cache = LastModifiedCache::load(&config.cache_dir)?;
    let mut detector = ChangeDetector::new(fetcher, cache);

    let (page, charset) = match detector.check(Resource::Page, &config.page_url)? {
        Change::Unchanged => return Ok(Outcome::Unchanged),
        Change::Modified { body, charset } => (body, charset),
    };

    let archive_url = resolve_archive_url(
        &page,
        charset.as_deref(),
        &config.page_url,
        ARCHIVE_LINK_MARKER,
    )?;
    info!("Archive: {}", archive_url);

    let archive = match detector.check(Resource::Archive, archive_url.as_str())? {
        Change::Unchanged => {
            detector.cache().save(&config.cache_dir)?;
            return Ok(Outcome::Unchanged);
        }
        Change::Modified { body, .. } => body,
    };

    let summary = extract_archive(archive, ROUTES, &config.output_dir)?;
    info!(
        "Wrote {} files from {} workbooks ({} entries, {} skipped)",
        summary.files_written, summary.workbooks, summary.entries, summary.skipped_legacy
    );

    // Timestamps are committed last so a failed run is retried next time
    detector.cache().save(&config.cache_dir)?;
    Ok(Outcome::Updated)
}
