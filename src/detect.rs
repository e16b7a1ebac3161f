//! Change detection gate for the page and the archive

use anyhow::Result;
use log::info;

use crate::cache::{LastModifiedCache, Resource};
use crate::error::JobError;
use crate::fetch::{Fetch, FetchResponse};

#[derive(Debug)]
pub enum Change {
    Unchanged,
    Modified {
        body: Vec<u8>,
        charset: Option<String>,
    },
}

/// Issues conditional requests against the cached timestamps and records
/// the new `Last-Modified` of every resource that changed.
pub struct ChangeDetector<'a, F: Fetch> {
    fetcher: &'a F,
    cache: LastModifiedCache,
}

impl<'a, F: Fetch> ChangeDetector<'a, F> {
    pub fn new(fetcher: &'a F, cache: LastModifiedCache) -> Self {
        Self { fetcher, cache }
    }

    pub fn check(&mut self, resource: Resource, url: &str) -> Result<Change> {
        match self.fetcher.fetch(url, self.cache.get(resource))? {
            FetchResponse::NotModified => {
                info!("{} not modified.", resource.label());
                Ok(Change::Unchanged)
            }
            FetchResponse::Fresh {
                last_modified,
                charset,
                body,
            } => {
                let last_modified = last_modified.ok_or_else(|| JobError::MissingLastModified {
                    url: url.to_string(),
                })?;
                info!("{} modified.", resource.label());
                self.cache.set(resource, last_modified);
                Ok(Change::Modified { body, charset })
            }
        }
    }

    pub fn cache(&self) -> &LastModifiedCache {
        &self.cache
    }
}
