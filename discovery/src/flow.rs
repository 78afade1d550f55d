// SPDX-FileCopyrightText: 2025-2026 Zexin Yuan <aim@yzx9.xyz>
//
// SPDX-License-Identifier: Apache-2.0

//! Discovery of a single service.
//!
//! The flow tries the user-given URL, then the well-known URI, then DNS, and stops at the first
//! step that yields a principal. Afterwards it fills in home sets and lists their collections.
//! Each step logs its own failures and never aborts the flow; only cancellation does.

use std::collections::BTreeSet;

use url::Url;

use crate::context::DiscoveryContext;
use crate::dns::{resolve_context_paths, resolve_service};
use crate::email::emails_for;
use crate::error::Cancelled;
use crate::principal::find_current_user_principal;
use crate::probe::supports;
use crate::request::Depth;
use crate::scanner::scan_response;
use crate::types::{ServiceInfo, ServiceType};

/// Runs the discovery flow for `service`.
pub(crate) async fn run(
    ctx: &DiscoveryContext<'_>,
    service: ServiceType,
) -> Result<ServiceInfo, Cancelled> {
    let mut flow = ServiceFlow {
        ctx,
        service,
        info: ServiceInfo::default(),
    };
    ctx.info(format!("{service}: starting discovery"));

    if let Some(url) = ctx.hint().url() {
        flow.check_user_url(url).await?;
    }

    if flow.info.principal.is_none()
        && let Some(url) = ctx.hint().https_url()
    {
        flow.check_well_known(url).await?;
    }

    if flow.info.principal.is_none()
        && let Some(domain) = ctx.hint().dns_domain()
    {
        flow.discover_via_dns(&domain).await?;
    }

    if let Some(principal) = flow.info.principal.clone() {
        if flow.info.home_sets.is_empty() {
            flow.find_home_sets(&principal).await?;
        }
        if service == ServiceType::CalDav {
            ctx.checkpoint()?;
            flow.info.emails = emails_for(ctx, &principal).await?;
        }
    }

    flow.list_home_sets().await?;

    ctx.info(format!(
        "{service}: done, principal {}, {} home set(s), {} collection(s)",
        flow.info
            .principal
            .as_ref()
            .map_or_else(|| "not found".to_string(), Url::to_string),
        flow.info.home_sets.len(),
        flow.info.collections.len()
    ));
    Ok(flow.info)
}

struct ServiceFlow<'c, 'a> {
    ctx: &'c DiscoveryContext<'a>,
    service: ServiceType,
    info: ServiceInfo,
}

impl ServiceFlow<'_, '_> {
    /// Scans the user-given URL and accepts the first principal candidate offering the service.
    async fn check_user_url(&mut self, url: &Url) -> Result<(), Cancelled> {
        self.ctx.checkpoint()?;
        let service = self.service;
        self.ctx.info(format!("{service}: checking user-given URL {url}"));

        let resp = match self
            .ctx
            .propfind(url, Depth::Zero, &service.scan_props())
            .await?
        {
            Ok(resp) => resp,
            Err(e) => {
                self.ctx.report("PROPFIND", url, &e);
                return Ok(());
            }
        };

        let mut candidates: Vec<Url> = Vec::new();
        for item in &resp.multistatus.responses {
            for candidate in scan_response(&resp.url, item, service, &mut self.info) {
                if !candidates.contains(&candidate) {
                    candidates.push(candidate);
                }
            }
        }

        for candidate in candidates {
            if supports(self.ctx, &candidate, service).await? {
                self.ctx
                    .info(format!("{service}: found principal {candidate} at user-given URL"));
                self.info.principal = Some(candidate);
                break;
            }
            self.ctx.info(format!(
                "{service}: principal candidate {candidate} does not provide {service}"
            ));
        }
        Ok(())
    }

    /// Asks `/.well-known/{service}` on the host of `url`, RFC 6764 §5.
    async fn check_well_known(&mut self, url: &Url) -> Result<(), Cancelled> {
        self.ctx.checkpoint()?;
        let service = self.service;
        let well_known = match url.join(&service.well_known_path()) {
            Ok(well_known) => well_known,
            Err(e) => {
                self.ctx
                    .warn(format!("{service}: cannot build well-known URL from {url}: {e}"));
                return Ok(());
            }
        };

        self.ctx
            .info(format!("{service}: checking well-known URL {well_known}"));
        self.info.principal =
            find_current_user_principal(self.ctx, &well_known, Some(service)).await?;
        Ok(())
    }

    /// Locates the service through SRV and TXT records of `domain`, RFC 6764 §6.
    async fn discover_via_dns(&mut self, domain: &str) -> Result<(), Cancelled> {
        self.ctx.checkpoint()?;
        let service = self.service;
        self.ctx
            .info(format!("{service}: looking up {domain} in DNS"));

        let (host, port) = resolve_service(self.ctx, domain, service).await?;
        let paths = resolve_context_paths(self.ctx, domain, service).await?;

        for path in paths {
            self.ctx.checkpoint()?;
            let url = match Url::parse(&format!("https://{host}:{port}{path}")) {
                Ok(url) => url,
                Err(e) => {
                    self.ctx.warn(format!(
                        "{service}: skipping invalid URL https://{host}:{port}{path}: {e}"
                    ));
                    continue;
                }
            };

            if let Some(principal) =
                find_current_user_principal(self.ctx, &url, Some(service)).await?
            {
                self.info.principal = Some(principal);
                break;
            }
        }
        Ok(())
    }

    /// Reads the home-set property from the principal resource.
    async fn find_home_sets(&mut self, principal: &Url) -> Result<(), Cancelled> {
        self.ctx.checkpoint()?;
        let service = self.service;
        self.ctx
            .debug(format!("{service}: querying home sets of {principal}"));

        match self
            .ctx
            .propfind(principal, Depth::Zero, &[service.home_set_prop()])
            .await?
        {
            Ok(resp) => {
                for item in &resp.multistatus.responses {
                    scan_response(&resp.url, item, service, &mut self.info);
                }
            }
            Err(e) => self.ctx.report("PROPFIND", principal, &e),
        }

        if self.info.home_sets.is_empty() {
            self.ctx
                .info(format!("{service}: principal {principal} names no home set"));
        }
        Ok(())
    }

    /// Lists the direct members of every home set.
    ///
    /// A listing may name further home sets; those are listed too, each at most once.
    async fn list_home_sets(&mut self) -> Result<(), Cancelled> {
        let service = self.service;
        let mut listed = BTreeSet::new();
        loop {
            let Some(home_set) = self.info.home_sets.difference(&listed).next().cloned() else {
                break;
            };
            listed.insert(home_set.clone());
            self.ctx.checkpoint()?;
            self.ctx
                .debug(format!("{service}: listing home set {home_set}"));

            match self
                .ctx
                .propfind(&home_set, Depth::One, &service.scan_props())
                .await?
            {
                Ok(resp) => {
                    for item in &resp.multistatus.responses {
                        scan_response(&resp.url, item, service, &mut self.info);
                    }
                }
                Err(e) => self.ctx.report("PROPFIND", &home_set, &e),
            }
        }
        Ok(())
    }
}
