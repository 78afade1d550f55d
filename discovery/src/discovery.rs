// SPDX-FileCopyrightText: 2025-2026 Zexin Yuan <aim@yzx9.xyz>
//
// SPDX-License-Identifier: Apache-2.0

use std::fmt;

use tokio_util::sync::CancellationToken;

use crate::config::DiscoveryConfig;
use crate::context::DiscoveryContext;
use crate::dns::{DnsResolver, HickoryResolver, RandomWeightSelector, WeightSelector};
use crate::error::{Cancelled, DavError};
use crate::flow;
use crate::hint::Hint;
use crate::http::{DavTransport, HttpTransport};
use crate::types::{DiscoveryResult, ServiceType};

/// `CardDAV`/`CalDAV` service discovery.
///
/// A `Discovery` runs once: [`Discovery::discover`] consumes it, so the HTTP client and DNS
/// resolver are released when the run ends, whether it succeeds or is cancelled.
///
/// # Example
///
/// ```no_run
/// use davprobe_discovery::{CancellationToken, Discovery, DiscoveryConfig, Hint};
///
/// # async fn run() -> Result<(), Box<dyn std::error::Error>> {
/// let hint = Hint::parse("alice@example.com")?;
/// let discovery = Discovery::new(DiscoveryConfig::default())?;
/// let result = discovery.discover(&hint, &CancellationToken::new()).await?;
/// if let Some(caldav) = &result.caldav {
///     println!("{} calendars", caldav.collections.len());
/// }
/// # Ok(())
/// # }
/// ```
pub struct Discovery<T = HttpTransport, R = HickoryResolver> {
    transport: T,
    resolver: R,
    selector: Box<dyn WeightSelector>,
}

impl<T: fmt::Debug, R: fmt::Debug> fmt::Debug for Discovery<T, R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Discovery")
            .field("transport", &self.transport)
            .field("resolver", &self.resolver)
            .finish_non_exhaustive()
    }
}

impl Discovery {
    /// Creates a discovery over HTTP with the system DNS configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client or the DNS resolver cannot be set up.
    pub fn new(config: DiscoveryConfig) -> Result<Self, DavError> {
        let transport = HttpTransport::new(config)?;
        let resolver = HickoryResolver::new().map_err(|e| DavError::Config(e.to_string()))?;
        Ok(Self::with_parts(transport, resolver))
    }
}

impl<T: DavTransport, R: DnsResolver> Discovery<T, R> {
    /// Creates a discovery over the given transport and resolver.
    pub fn with_parts(transport: T, resolver: R) -> Self {
        Self {
            transport,
            resolver,
            selector: Box::new(RandomWeightSelector),
        }
    }

    /// Replaces the source of randomness for weighted SRV selection.
    #[must_use]
    pub fn with_weight_selector(mut self, selector: impl WeightSelector + 'static) -> Self {
        self.selector = Box::new(selector);
        self
    }

    /// Discovers `CardDAV` and `CalDAV` for `hint`.
    ///
    /// Network and protocol failures never fail the run; they show up in the log of the result
    /// and leave the affected service empty. Services with neither a principal nor collections
    /// are reported as `None`.
    ///
    /// # Errors
    ///
    /// Returns [`Cancelled`] if `cancel` fires before the run finishes. Partial results are
    /// discarded.
    pub async fn discover(
        self,
        hint: &Hint,
        cancel: &CancellationToken,
    ) -> Result<DiscoveryResult, Cancelled> {
        let ctx = DiscoveryContext::new(
            hint,
            &self.transport,
            &self.resolver,
            self.selector.as_ref(),
            cancel,
        );
        ctx.info(format!("discovering services for {hint}"));

        let run = async {
            let carddav = flow::run(&ctx, ServiceType::CardDav).await?;
            let caldav = flow::run(&ctx, ServiceType::CalDav).await?;
            Ok::<_, Cancelled>((carddav, caldav))
        };
        let (carddav, caldav) = match run.await {
            Ok(services) => services,
            Err(e) => {
                tracing::info!(%hint, "discovery cancelled");
                return Err(e);
            }
        };

        if ctx.auth_failure_observed() {
            ctx.warn("the server rejected the credentials at least once".to_string());
        }

        Ok(DiscoveryResult {
            carddav: carddav.into_present(),
            caldav: caldav.into_present(),
            auth_failure_observed: ctx.auth_failure_observed(),
            log: ctx.into_log(),
        })
    }
}
