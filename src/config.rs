//! Fixed locations and runtime configuration for the refresh job

use std::path::PathBuf;
use std::time::Duration;

/// Technical material page that links to the code table archive
pub const PAGE_URL: &str = "http://xml.kishou.go.jp/tec_material.html";

/// Anchor text identifying the individual code table archive link
pub const ARCHIVE_LINK_MARKER: &str = "個別コード表";

pub const CACHE_DIR: &str = ".cache";
pub const OUTPUT_DIR: &str = "csv";

pub const PAGE_LAST_MODIFIED_FILE: &str = "pageLastModified.txt";
pub const ARCHIVE_LAST_MODIFIED_FILE: &str = "zipLastModified.txt";

pub const HTTP_TIMEOUT: Duration = Duration::from_secs(10);
pub const USER_AGENT: &str = "Mozilla/5.0 (compatible; JmaCodeDictionary/0.1)";

#[derive(Debug, Clone)]
pub struct Config {
    pub page_url: String,
    pub cache_dir: PathBuf,
    pub output_dir: PathBuf,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            page_url: PAGE_URL.to_string(),
            cache_dir: PathBuf::from(CACHE_DIR),
            output_dir: PathBuf::from(OUTPUT_DIR),
        }
    }
}
