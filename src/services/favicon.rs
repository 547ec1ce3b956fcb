//! Favicon discovery for bookmarked pages.
//!
//! The page is fetched once and scanned for the first `<link>` whose `rel`
//! is `icon` or `shortcut icon`. The scan is a pure function over the body
//! so it is testable without a network.

use anyhow::{Context, Result};
use quick_xml::Reader;
use quick_xml::events::Event;
use reqwest::Client;
use std::time::Duration;
use url::Url;

#[derive(Clone)]
pub struct FaviconFetcher {
    client: Client,
}

impl FaviconFetcher {
    pub fn new() -> Result<Self> {
        let client = Client::builder()
            .user_agent("Theca/1.0")
            .timeout(Duration::from_secs(15))
            .build()
            .context("Failed to build favicon HTTP client")?;

        Ok(Self { client })
    }

    /// Resolves the favicon of `page_url` to a single absolute URL.
    pub async fn fetch(&self, page_url: &str) -> Result<String> {
        let response = self
            .client
            .get(page_url)
            .send()
            .await
            .with_context(|| format!("Failed to fetch {page_url}"))?;

        if !response.status().is_success() {
            anyhow::bail!("Page returned {} for {page_url}", response.status());
        }

        let body = response
            .text()
            .await
            .with_context(|| format!("Failed to read body of {page_url}"))?;

        let href = find_icon_href(&body)
            .ok_or_else(|| anyhow::anyhow!("No favicon link found on {page_url}"))?;

        resolve_icon_url(page_url, &href)
    }
}

/// Scans HTML for the first `<link rel="icon"|"shortcut icon" href=...>`.
/// HTML is not XML, so name checks are relaxed and parse errors end the scan
/// instead of failing it.
#[must_use]
pub fn find_icon_href(body: &str) -> Option<String> {
    let mut reader = Reader::from_str(body);
    reader.config_mut().check_end_names = false;

    loop {
        match reader.read_event() {
            Ok(Event::Start(e) | Event::Empty(e)) if e.local_name().as_ref() == b"link" => {
                let mut rel_matches = false;
                let mut href: Option<String> = None;

                for attr in e.attributes().with_checks(false).flatten() {
                    match attr.key.as_ref() {
                        b"rel" => {
                            let value = String::from_utf8_lossy(&attr.value).to_lowercase();
                            if value == "icon" || value == "shortcut icon" {
                                rel_matches = true;
                            }
                        }
                        b"href" => {
                            let value = String::from_utf8_lossy(&attr.value).into_owned();
                            if !value.is_empty() {
                                href = Some(value);
                            }
                        }
                        _ => {}
                    }
                }

                if rel_matches && href.is_some() {
                    return href;
                }
            }
            Ok(Event::Eof) | Err(_) => return None,
            Ok(_) => {}
        }
    }
}

/// Resolves an icon `href` against the page it was found on. Absolute hrefs
/// pass through unchanged.
pub fn resolve_icon_url(page_url: &str, href: &str) -> Result<String> {
    let base = Url::parse(page_url).with_context(|| format!("Invalid page URL: {page_url}"))?;
    let resolved = base
        .join(href)
        .with_context(|| format!("Invalid favicon href: {href}"))?;

    Ok(resolved.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_finds_basic_icon_link() {
        let html = r#"<html><head><link rel="icon" href="/favicon.ico"></head></html>"#;
        assert_eq!(find_icon_href(html), Some("/favicon.ico".to_string()));
    }

    #[test]
    fn test_finds_shortcut_icon() {
        let html = r#"<head><link rel="shortcut icon" href="https://cdn.example.com/i.png"/></head>"#;
        assert_eq!(
            find_icon_href(html),
            Some("https://cdn.example.com/i.png".to_string())
        );
    }

    #[test]
    fn test_rel_is_case_insensitive() {
        let html = r#"<link rel="ICON" href="/fav.svg">"#;
        assert_eq!(find_icon_href(html), Some("/fav.svg".to_string()));
    }

    #[test]
    fn test_ignores_stylesheets_and_empty_hrefs() {
        let html = r#"
            <link rel="stylesheet" href="/style.css">
            <link rel="icon" href="">
            <link rel="apple-touch-icon" href="/apple.png">
        "#;
        assert_eq!(find_icon_href(html), None);
    }

    #[test]
    fn test_takes_first_matching_link() {
        let html = r#"
            <link rel="icon" href="/first.ico">
            <link rel="icon" href="/second.ico">
        "#;
        assert_eq!(find_icon_href(html), Some("/first.ico".to_string()));
    }

    #[test]
    fn test_tolerates_unclosed_html_tags() {
        let html = r#"<head><meta charset="utf-8"><link rel="icon" href="/f.ico"><title>x</title>"#;
        assert_eq!(find_icon_href(html), Some("/f.ico".to_string()));
    }

    #[test]
    fn test_resolves_relative_href() {
        let resolved = resolve_icon_url("https://example.com/blog/post", "/favicon.ico").unwrap();
        assert_eq!(resolved, "https://example.com/favicon.ico");

        let resolved = resolve_icon_url("https://example.com/blog/", "icons/fav.png").unwrap();
        assert_eq!(resolved, "https://example.com/blog/icons/fav.png");
    }

    #[test]
    fn test_absolute_href_passes_through() {
        let resolved =
            resolve_icon_url("https://example.com", "https://cdn.example.com/i.png").unwrap();
        assert_eq!(resolved, "https://cdn.example.com/i.png");
    }

    #[test]
    fn test_invalid_page_url_is_an_error() {
        assert!(resolve_icon_url("not a url", "/favicon.ico").is_err());
    }
}
