// SPDX-FileCopyrightText: 2025-2026 Zexin Yuan <aim@yzx9.xyz>
//
// SPDX-License-Identifier: Apache-2.0

//! Per-run state shared by both service flows.

use std::future::Future;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};

use tokio_util::sync::CancellationToken;
use tracing::Level;
use url::Url;

use crate::dns::{DnsResolver, SrvRecord, WeightSelector};
use crate::error::{Cancelled, DavError, DnsError};
use crate::hint::Hint;
use crate::http::{DavTransport, PropFindResponse};
use crate::request::{Depth, Prop};

/// Append-only diagnostic log, safe to write from several tasks.
#[derive(Debug, Default)]
pub struct DiagnosticLog {
    lines: Mutex<Vec<String>>,
}

impl DiagnosticLog {
    /// Appends a line.
    pub fn push(&self, level: Level, message: &str) {
        let line = format!("{level} {message}");
        self.lines
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .push(line);
    }

    /// Consumes the log.
    #[must_use]
    pub fn into_lines(self) -> Vec<String> {
        self.lines
            .into_inner()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }
}

/// State of one discovery run.
///
/// Every network call goes through the context so that it races against cancellation and so
/// that 401 answers set the sticky auth-failure flag.
pub(crate) struct DiscoveryContext<'a> {
    hint: &'a Hint,
    transport: &'a dyn DavTransport,
    resolver: &'a dyn DnsResolver,
    selector: &'a dyn WeightSelector,
    cancel: &'a CancellationToken,
    auth_failure: AtomicBool,
    log: DiagnosticLog,
}

impl<'a> DiscoveryContext<'a> {
    pub fn new(
        hint: &'a Hint,
        transport: &'a dyn DavTransport,
        resolver: &'a dyn DnsResolver,
        selector: &'a dyn WeightSelector,
        cancel: &'a CancellationToken,
    ) -> Self {
        Self {
            hint,
            transport,
            resolver,
            selector,
            cancel,
            auth_failure: AtomicBool::new(false),
            log: DiagnosticLog::default(),
        }
    }

    pub fn hint(&self) -> &Hint {
        self.hint
    }

    pub fn selector(&self) -> &dyn WeightSelector {
        self.selector
    }

    /// Fails fast between steps once the run is cancelled.
    pub fn checkpoint(&self) -> Result<(), Cancelled> {
        if self.cancel.is_cancelled() {
            Err(Cancelled)
        } else {
            Ok(())
        }
    }

    /// Runs `fut` unless the run is cancelled first.
    pub async fn guard<F: Future>(&self, fut: F) -> Result<F::Output, Cancelled> {
        tokio::select! {
            biased;
            () = self.cancel.cancelled() => Err(Cancelled),
            output = fut => Ok(output),
        }
    }

    pub async fn propfind(
        &self,
        url: &Url,
        depth: Depth,
        props: &[Prop],
    ) -> Result<Result<PropFindResponse, DavError>, Cancelled> {
        let result = self
            .guard(self.transport.propfind(url, depth, props))
            .await?;
        Ok(self.observe(url, result))
    }

    pub async fn options(&self, url: &Url) -> Result<Result<Vec<String>, DavError>, Cancelled> {
        let result = self.guard(self.transport.options(url)).await?;
        Ok(self.observe(url, result))
    }

    pub async fn srv_lookup(
        &self,
        name: &str,
    ) -> Result<Result<Vec<SrvRecord>, DnsError>, Cancelled> {
        self.debug(format!("DNS SRV lookup {name}"));
        self.guard(self.resolver.srv_lookup(name)).await
    }

    pub async fn txt_lookup(
        &self,
        name: &str,
    ) -> Result<Result<Vec<Vec<String>>, DnsError>, Cancelled> {
        self.debug(format!("DNS TXT lookup {name}"));
        self.guard(self.resolver.txt_lookup(name)).await
    }

    fn observe<T>(&self, url: &Url, result: Result<T, DavError>) -> Result<T, DavError> {
        if let Err(DavError::Unauthorized) = &result {
            self.auth_failure.store(true, Ordering::Relaxed);
            self.warn(format!("{url} rejected the credentials (401)"));
        }
        result
    }

    /// Logs a failed request at a level matching how surprising it is.
    ///
    /// Missing resources are ordinary negative results; transport and protocol failures are
    /// worth a warning with the full detail.
    pub fn report(&self, action: &str, url: &Url, err: &DavError) {
        match err {
            DavError::Unauthorized => self.debug(format!("{action} {url}: {err}")),
            DavError::Status { status, .. } if (400..500).contains(status) => {
                self.debug(format!("{action} {url}: {err}"));
            }
            _ => self.warn(format!("{action} {url} failed: {err}")),
        }
    }

    pub fn auth_failure_observed(&self) -> bool {
        self.auth_failure.load(Ordering::Relaxed)
    }

    pub fn debug(&self, message: String) {
        tracing::debug!("{message}");
        self.log.push(Level::DEBUG, &message);
    }

    pub fn info(&self, message: String) {
        tracing::info!("{message}");
        self.log.push(Level::INFO, &message);
    }

    pub fn warn(&self, message: String) {
        tracing::warn!("{message}");
        self.log.push(Level::WARN, &message);
    }

    pub fn into_log(self) -> Vec<String> {
        self.log.into_lines()
    }
}
