//! Subcommand implementations. Each writes its report to `out`.

use std::fs::File;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::atomic::AtomicBool;
use std::sync::Arc;

use bridgeview_common::{BridgeviewError, SurfaceError};
use bridgeview_config::BridgeviewConfig;
use bridgeview_surface::classify::{self, OriginWhitelist};
use bridgeview_surface::intercept::{HttpFetcher, InterceptionPipeline, ResourceRequest};
use bridgeview_surface::settings::SurfaceConfig;
use bridgeview_surface::ResponseInjector;
use encoding_rs::{Encoding, UTF_8};
use serde_json::json;
use tokio::sync::watch;
use tracing::{debug, info};

/// One JSON line per URL.
pub fn classify_urls(
    urls: &[String],
    whitelist: &[String],
    out: &mut impl Write,
) -> Result<(), BridgeviewError> {
    let whitelist = OriginWhitelist::compile(whitelist)?;
    for url in urls {
        let mut line = json!({
            "url": url,
            "interceptable": !classify::looks_invalid(url),
            "origin": classify::origin_of(url),
        });
        if !whitelist.is_empty() {
            line["whitelisted"] = json!(whitelist.matches(url));
        }
        writeln!(out, "{line}")?;
    }
    Ok(())
}

fn charset_for_label(label: Option<&str>) -> Result<&'static Encoding, BridgeviewError> {
    match label {
        None => Ok(UTF_8),
        Some(label) => Encoding::for_label(label.as_bytes())
            .ok_or_else(|| BridgeviewError::Other(format!("unknown charset '{label}'"))),
    }
}

pub fn inject_file(
    input: &Path,
    script: &str,
    charset: Option<&str>,
    window: usize,
    out: &mut impl Write,
) -> Result<(), BridgeviewError> {
    let encoding = charset_for_label(charset)?;
    let file = File::open(input)?;
    let mut injector = ResponseInjector::with_window(file, script, encoding, window);
    let written = io::copy(&mut injector, out)?;
    debug!(input = %input.display(), charset = encoding.name(), written, "document injected");
    Ok(())
}

pub fn fetch_url(
    config: &BridgeviewConfig,
    url: &str,
    script: Option<&str>,
    user_agent: Option<&str>,
    out: &mut impl Write,
) -> Result<(), BridgeviewError> {
    let snapshot = SurfaceConfig {
        user_agent: user_agent
            .map(str::to_string)
            .or_else(|| config.surface.default_user_agent.clone())
            .unwrap_or_else(|| format!("bridgeview/{}", env!("CARGO_PKG_VERSION"))),
        injected_on_start_loading_javascript: script.map(str::to_string),
        ..Default::default()
    };
    let (_config_tx, config_rx) = watch::channel(Arc::new(snapshot));

    let fetcher = Arc::new(HttpFetcher::new(&config.interception)?);
    let pipeline = InterceptionPipeline::new(fetcher, config_rx, Arc::new(AtomicBool::new(false)))
        .with_head_search_window(config.interception.head_search_window as usize);

    match pipeline.intercept(&ResourceRequest::new(url, true), true) {
        Some(mut response) => {
            info!(
                url = %url,
                status = response.status,
                charset = %response.charset,
                injected = response.injected,
                "response intercepted"
            );
            io::copy(&mut response.body, out)?;
            Ok(())
        }
        None => Err(SurfaceError::Fetch(format!(
            "interception declined {url}; the engine would load it directly"
        ))
        .into()),
    }
}

pub fn check_config(path: Option<&PathBuf>, out: &mut impl Write) -> Result<(), BridgeviewError> {
    let config = match path {
        Some(path) => bridgeview_config::load_config_from(path)?,
        None => bridgeview_config::load_config()?,
    };
    writeln!(out, "{}", bridgeview_config::config_to_json(&config))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lines(buf: &[u8]) -> Vec<serde_json::Value> {
        String::from_utf8_lossy(buf)
            .lines()
            .map(|l| serde_json::from_str(l).unwrap())
            .collect()
    }

    #[test]
    fn classify_reports_each_url() {
        let mut out = Vec::new();
        classify_urls(
            &["http://x".into(), "wwwhttp://x".into()],
            &[],
            &mut out,
        )
        .unwrap();
        let report = lines(&out);
        assert_eq!(report.len(), 2);
        assert_eq!(report[0]["interceptable"], true);
        assert_eq!(report[0]["origin"], "http://x");
        assert_eq!(report[1]["interceptable"], false);
        assert!(report[0].get("whitelisted").is_none());
    }

    #[test]
    fn classify_checks_whitelist() {
        let mut out = Vec::new();
        classify_urls(
            &["https://example.com/a".into(), "https://evil.com".into()],
            &["https://example\\.com".into()],
            &mut out,
        )
        .unwrap();
        let report = lines(&out);
        assert_eq!(report[0]["whitelisted"], true);
        assert_eq!(report[1]["whitelisted"], false);
    }

    #[test]
    fn classify_rejects_bad_pattern() {
        let err = classify_urls(&["https://a".into()], &["(".into()], &mut Vec::new()).unwrap_err();
        assert!(matches!(
            err,
            BridgeviewError::Surface(SurfaceError::InvalidPattern { .. })
        ));
    }

    #[test]
    fn inject_splices_after_head() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("page.html");
        std::fs::write(&path, "<html><HEAD><title>t</title></HEAD></html>").unwrap();
        let mut out = Vec::new();
        inject_file(&path, "go()", None, 1024, &mut out).unwrap();
        let html = String::from_utf8(out).unwrap();
        assert!(html.starts_with("<html><HEAD><script"));
        assert_eq!(html.matches("go()").count(), 1);
        assert!(html.ends_with("<title>t</title></HEAD></html>"));
    }

    #[test]
    fn inject_encodes_in_document_charset() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("page.html");
        let utf16: Vec<u8> = "<head>x</head>"
            .encode_utf16()
            .flat_map(u16::to_le_bytes)
            .collect();
        std::fs::write(&path, &utf16).unwrap();

        let mut out = Vec::new();
        inject_file(&path, "go()", Some("utf-16le"), 1024, &mut out).unwrap();
        let (decoded, _, had_errors) = encoding_rs::UTF_16LE.decode(&out);
        assert!(!had_errors);
        assert!(decoded.starts_with("<head><script"));
        assert!(decoded.contains("go()"));
    }

    #[test]
    fn inject_unknown_charset_fails() {
        let err = inject_file(
            Path::new("/nonexistent"),
            "x",
            Some("no-such-charset"),
            1024,
            &mut Vec::new(),
        )
        .unwrap_err();
        assert!(matches!(err, BridgeviewError::Other(_)));
    }

    #[test]
    fn check_config_prints_json() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[bridge]\nrelink_progress_threshold = 25\n").unwrap();
        let mut out = Vec::new();
        check_config(Some(&path), &mut out).unwrap();
        let json: serde_json::Value = serde_json::from_slice(&out).unwrap();
        assert_eq!(json["bridge"]["relink_progress_threshold"], 25);
    }

    #[test]
    fn check_config_reports_validation_errors() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[interception]\ntimeout_secs = 0\n").unwrap();
        let err = check_config(Some(&path), &mut Vec::new()).unwrap_err();
        assert!(matches!(err, BridgeviewError::Config(_)));
    }

    #[test]
    fn fetch_declines_invalid_url() {
        let err = fetch_url(
            &BridgeviewConfig::default(),
            "ftp://example.com",
            Some("x()"),
            None,
            &mut Vec::new(),
        )
        .unwrap_err();
        assert!(matches!(err, BridgeviewError::Surface(SurfaceError::Fetch(_))));
    }
}
