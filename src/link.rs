//! Locate the code table archive link on the technical material page

use anyhow::{Context, Result};
use encoding_rs::{Encoding, UTF_8};
use reqwest::Url;
use scraper::{Html, Selector};

use crate::error::JobError;

/// How far into the document to look for a `<meta charset>` declaration
const CHARSET_PRESCAN_LEN: usize = 1024;

/// Find the first anchor whose text contains `marker` and resolve its `href`
/// against `page_url`.
///
/// `charset` is the one declared by the HTTP response, if any.
pub fn resolve_archive_url(
    page: &[u8],
    charset: Option<&str>,
    page_url: &str,
    marker: &str,
) -> Result<Url> {
    let html = decode_html(page, charset);
    let document = Html::parse_document(&html);
    let anchors = Selector::parse("a").map_err(|e| anyhow::anyhow!("{}", e))?;

    let href = document
        .select(&anchors)
        .filter(|a| a.text().collect::<String>().contains(marker))
        .find_map(|a| a.value().attr("href"))
        .ok_or_else(|| JobError::ArchiveLinkNotFound {
            marker: marker.to_string(),
        })?;

    let base = Url::parse(page_url).with_context(|| format!("Invalid page URL: {}", page_url))?;
    base.join(href.trim())
        .with_context(|| format!("Invalid archive link: {}", href))
}

/// Decode page bytes using a BOM, then the transport charset, then a
/// `charset=` declaration near the top of the document, then UTF-8.
pub fn decode_html(bytes: &[u8], charset: Option<&str>) -> String {
    let encoding = Encoding::for_bom(bytes)
        .map(|(encoding, _)| encoding)
        .or_else(|| charset.and_then(|label| Encoding::for_label(label.as_bytes())))
        .or_else(|| sniff_meta_charset(bytes))
        .unwrap_or(UTF_8);
    let (text, _, _) = encoding.decode(bytes);
    text.into_owned()
}

fn sniff_meta_charset(bytes: &[u8]) -> Option<&'static Encoding> {
    let head = &bytes[..bytes.len().min(CHARSET_PRESCAN_LEN)];
    let head = String::from_utf8_lossy(head).to_ascii_lowercase();
    let start = head.find("charset=")? + "charset=".len();
    let label: String = head[start..]
        .trim_start_matches(|c: char| c == '"' || c == '\'')
        .chars()
        .take_while(|&c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | ':' | '.'))
        .collect();
    Encoding::for_label(label.as_bytes())
}
