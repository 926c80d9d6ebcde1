//! Concurrent, timeout-bounded link checker.
//!
//! Every URL gets a single attempt: a `HEAD` request, replaced by `GET` only
//! when the server rejects the `HEAD` method. Failures are reported, never
//! retried.

use std::net::IpAddr;
use std::sync::Arc;
use std::time::{Duration, Instant};

use reqwest::{Client, StatusCode};
use serde::Serialize;
use tokio::sync::Semaphore;
use tracing::{debug, info, instrument, warn};
use url::Url;

use coursehub_shared::{CourseHubError, LinkCheckConfig, Result};

use crate::LinkTarget;

/// User-Agent string for link check requests.
const USER_AGENT: &str = concat!("CourseHub-LinkCheck/", env!("CARGO_PKG_VERSION"));

// ---------------------------------------------------------------------------
// Results
// ---------------------------------------------------------------------------

/// Outcome of checking one URL.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum LinkStatus {
    /// 2xx/3xx response.
    Ok { code: u16 },
    /// 4xx/5xx response.
    Broken { code: u16 },
    /// Timeout, DNS, TLS or connection failure.
    Failed { reason: String },
    /// Not checked (excluded pattern, private address, unsupported scheme).
    Skipped { reason: String },
}

impl LinkStatus {
    pub fn is_healthy(&self) -> bool {
        matches!(self, Self::Ok { .. } | Self::Skipped { .. })
    }
}

/// Result for one URL and every place it is referenced from.
#[derive(Debug, Clone, Serialize)]
pub struct LinkReport {
    pub url: String,
    pub sources: Vec<String>,
    #[serde(flatten)]
    pub status: LinkStatus,
    pub elapsed_ms: u64,
}

/// Summary of a full check run.
#[derive(Debug, Clone, Serialize)]
pub struct CheckSummary {
    pub checked: usize,
    pub healthy: usize,
    pub unhealthy: usize,
    pub skipped: usize,
    pub reports: Vec<LinkReport>,
}

impl CheckSummary {
    pub fn unhealthy_reports(&self) -> impl Iterator<Item = &LinkReport> {
        self.reports.iter().filter(|r| !r.status.is_healthy())
    }
}

// ---------------------------------------------------------------------------
// Checker
// ---------------------------------------------------------------------------

/// HTTP link checker.
#[derive(Debug, Clone)]
pub struct LinkChecker {
    client: Client,
    concurrency: usize,
    allow_private: bool,
    exclude_patterns: Vec<regex::Regex>,
}

impl LinkChecker {
    /// Create a new checker with the given configuration.
    pub fn new(config: &LinkCheckConfig) -> Result<Self> {
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .redirect(reqwest::redirect::Policy::limited(5))
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| CourseHubError::Network(format!("failed to build HTTP client: {e}")))?;

        let exclude_patterns = config
            .exclude_patterns
            .iter()
            .filter_map(|p| {
                let re = glob_to_regex(p);
                if re.is_none() {
                    warn!(pattern = %p, "ignoring invalid exclude pattern");
                }
                re
            })
            .collect();

        Ok(Self {
            client,
            concurrency: config.concurrency.max(1) as usize,
            allow_private: config.allow_private,
            exclude_patterns,
        })
    }

    /// Check all targets with bounded concurrency, preserving input order.
    #[instrument(skip_all, fields(targets = targets.len(), concurrency = self.concurrency))]
    pub async fn check_all(&self, targets: &[LinkTarget]) -> CheckSummary {
        let semaphore = Arc::new(Semaphore::new(self.concurrency));
        let mut handles = Vec::with_capacity(targets.len());

        info!("starting link check");

        for target in targets {
            let checker = self.clone();
            let sem = semaphore.clone();
            let url = target.url.clone();

            handles.push(tokio::spawn(async move {
                let Ok(_permit) = sem.acquire_owned().await else {
                    return (
                        LinkStatus::Failed {
                            reason: "semaphore closed".into(),
                        },
                        0,
                    );
                };
                let started = Instant::now();
                let status = checker.check_url(&url).await;
                (status, started.elapsed().as_millis() as u64)
            }));
        }

        let mut reports = Vec::with_capacity(targets.len());
        for (target, handle) in targets.iter().zip(handles) {
            let (status, elapsed_ms) = match handle.await {
                Ok(outcome) => outcome,
                Err(e) => (
                    LinkStatus::Failed {
                        reason: format!("task failed: {e}"),
                    },
                    0,
                ),
            };
            if !status.is_healthy() {
                warn!(url = %target.url, sources = ?target.sources, ?status, "unhealthy link");
            }
            reports.push(LinkReport {
                url: target.url.clone(),
                sources: target.sources.clone(),
                status,
                elapsed_ms,
            });
        }

        let skipped = reports
            .iter()
            .filter(|r| matches!(r.status, LinkStatus::Skipped { .. }))
            .count();
        let unhealthy = reports.iter().filter(|r| !r.status.is_healthy()).count();
        let summary = CheckSummary {
            checked: reports.len() - skipped,
            healthy: reports.len() - unhealthy - skipped,
            unhealthy,
            skipped,
            reports,
        };

        info!(
            checked = summary.checked,
            unhealthy = summary.unhealthy,
            skipped = summary.skipped,
            "link check completed"
        );
        summary
    }

    /// Check a single URL with one timeout-bounded attempt.
    pub async fn check_url(&self, raw: &str) -> LinkStatus {
        let url = match Url::parse(raw) {
            Ok(url) => url,
            Err(e) => {
                return LinkStatus::Failed {
                    reason: format!("invalid URL: {e}"),
                };
            }
        };

        if let Some(reason) = self.skip_reason(&url) {
            debug!(%url, reason, "skipping link");
            return LinkStatus::Skipped { reason };
        }

        let response = match self.client.head(url.as_str()).send().await {
            Ok(resp)
                if resp.status() == StatusCode::METHOD_NOT_ALLOWED
                    || resp.status() == StatusCode::NOT_IMPLEMENTED =>
            {
                debug!(%url, "HEAD rejected, using GET");
                self.client.get(url.as_str()).send().await
            }
            other => other,
        };

        match response {
            Ok(resp) => {
                let code = resp.status().as_u16();
                if resp.status().is_success() || resp.status().is_redirection() {
                    LinkStatus::Ok { code }
                } else {
                    LinkStatus::Broken { code }
                }
            }
            Err(e) if e.is_timeout() => LinkStatus::Failed {
                reason: "timed out".into(),
            },
            Err(e) => LinkStatus::Failed {
                reason: e.to_string(),
            },
        }
    }

    fn skip_reason(&self, url: &Url) -> Option<String> {
        if !matches!(url.scheme(), "http" | "https") {
            return Some(format!("unsupported scheme '{}'", url.scheme()));
        }
        if self.exclude_patterns.iter().any(|p| p.is_match(url.as_str())) {
            return Some("excluded by pattern".into());
        }
        if !self.allow_private && is_private_target(url) {
            return Some("private or loopback address".into());
        }
        None
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Convert a glob-like pattern to a regex over the full URL.
fn glob_to_regex(pattern: &str) -> Option<regex::Regex> {
    let escaped = regex::escape(pattern)
        .replace(r"\*\*", ".*")
        .replace(r"\*", "[^/]*")
        .replace(r"\?", ".");
    regex::Regex::new(&format!("^{escaped}$")).ok()
}

/// Check if a URL targets a loopback/private host.
fn is_private_target(url: &Url) -> bool {
    match url.host() {
        Some(url::Host::Ipv4(v4)) => is_private_ip(&IpAddr::V4(v4)),
        Some(url::Host::Ipv6(v6)) => is_private_ip(&IpAddr::V6(v6)),
        Some(url::Host::Domain(host)) => {
            host == "localhost" || host.ends_with(".local") || host.ends_with(".internal")
        }
        None => true,
    }
}

/// Check if an IP is in a private/reserved range.
fn is_private_ip(ip: &IpAddr) -> bool {
    match ip {
        IpAddr::V4(v4) => {
            v4.is_loopback()
                || v4.is_private()
                || v4.is_link_local()
                || v4.is_broadcast()
                || v4.is_unspecified()
                // 100.64.0.0/10 (Carrier-grade NAT)
                || (v4.octets()[0] == 100 && (v4.octets()[1] & 0xC0) == 64)
        }
        IpAddr::V6(v6) => v6.is_loopback() || v6.is_unspecified(),
    }
}
