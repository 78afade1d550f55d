// SPDX-FileCopyrightText: 2025-2026 Zexin Yuan <aim@yzx9.xyz>
//
// SPDX-License-Identifier: Apache-2.0

//! In-memory transport and resolver for discovery tests.

#![allow(dead_code)]

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use davprobe_discovery::{
    DavError, DavTransport, Depth, DnsError, DnsResolver, MultiStatusResponse, Prop,
    PropFindResponse, SrvRecord, WeightSelector,
};
use url::Url;

/// Transport answering from canned responses. Clones share state, so a test can keep one to
/// inspect the calls made through another.
#[derive(Debug, Clone, Default)]
pub struct FakeTransport {
    state: Arc<Mutex<TransportState>>,
}

#[derive(Debug, Default)]
struct TransportState {
    propfind: HashMap<String, String>,
    options: HashMap<String, Vec<String>>,
    unauthorized: HashSet<String>,
    pending: bool,
    calls: Vec<String>,
}

impl FakeTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Answers PROPFIND on `url` with `depth` by the multistatus body `xml`.
    pub fn propfind(&self, url: &str, depth: Depth, xml: &str) -> &Self {
        self.state()
            .propfind
            .insert(format!("{depth} {url}"), xml.to_string());
        self
    }

    /// Answers OPTIONS on `url` with the given `DAV` tokens.
    pub fn options(&self, url: &str, capabilities: &[&str]) -> &Self {
        self.state().options.insert(
            url.to_string(),
            capabilities.iter().map(ToString::to_string).collect(),
        );
        self
    }

    /// Rejects every request on `url` with 401.
    pub fn unauthorized(&self, url: &str) -> &Self {
        self.state().unauthorized.insert(url.to_string());
        self
    }

    /// Never answers any request.
    pub fn pending(&self) -> &Self {
        self.state().pending = true;
        self
    }

    /// Requests made so far, as `PROPFIND {depth} {url}` or `OPTIONS {url}`.
    pub fn calls(&self) -> Vec<String> {
        self.state().calls.clone()
    }

    fn state(&self) -> std::sync::MutexGuard<'_, TransportState> {
        self.state.lock().unwrap()
    }

    async fn wait_if_pending(&self) {
        let pending = self.state().pending;
        if pending {
            std::future::pending::<()>().await;
        }
    }
}

fn not_found() -> DavError {
    DavError::Status {
        status: 404,
        body: String::new(),
    }
}

#[async_trait]
impl DavTransport for FakeTransport {
    async fn propfind(
        &self,
        url: &Url,
        depth: Depth,
        _props: &[Prop],
    ) -> Result<PropFindResponse, DavError> {
        self.state().calls.push(format!("PROPFIND {depth} {url}"));
        self.wait_if_pending().await;

        let xml = {
            let state = self.state();
            if state.unauthorized.contains(url.as_str()) {
                return Err(DavError::Unauthorized);
            }
            state.propfind.get(&format!("{depth} {url}")).cloned()
        };
        let xml = xml.ok_or_else(not_found)?;
        Ok(PropFindResponse {
            url: url.clone(),
            multistatus: MultiStatusResponse::from_xml(&xml)?,
        })
    }

    async fn options(&self, url: &Url) -> Result<Vec<String>, DavError> {
        self.state().calls.push(format!("OPTIONS {url}"));
        self.wait_if_pending().await;

        let state = self.state();
        if state.unauthorized.contains(url.as_str()) {
            return Err(DavError::Unauthorized);
        }
        state.options.get(url.as_str()).cloned().ok_or_else(not_found)
    }
}

/// Resolver answering from canned records; unknown names have no records.
#[derive(Debug, Clone, Default)]
pub struct FakeResolver {
    state: Arc<Mutex<ResolverState>>,
}

#[derive(Debug, Default)]
struct ResolverState {
    srv: HashMap<String, Vec<SrvRecord>>,
    txt: HashMap<String, Vec<Vec<String>>>,
    failing: bool,
    calls: Vec<String>,
}

impl FakeResolver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a SRV record for `name`.
    pub fn srv(&self, name: &str, priority: u16, weight: u16, target: &str, port: u16) -> &Self {
        self.state()
            .srv
            .entry(name.to_string())
            .or_default()
            .push(SrvRecord {
                priority,
                weight,
                port,
                target: target.to_string(),
            });
        self
    }

    /// Adds a TXT record with the given character strings for `name`.
    pub fn txt(&self, name: &str, strings: &[&str]) -> &Self {
        self.state()
            .txt
            .entry(name.to_string())
            .or_default()
            .push(strings.iter().map(ToString::to_string).collect());
        self
    }

    /// Fails every lookup.
    pub fn failing(&self) -> &Self {
        self.state().failing = true;
        self
    }

    /// Lookups made so far, as `SRV {name}` or `TXT {name}`.
    pub fn calls(&self) -> Vec<String> {
        self.state().calls.clone()
    }

    fn state(&self) -> std::sync::MutexGuard<'_, ResolverState> {
        self.state.lock().unwrap()
    }

    fn failure(name: &str) -> DnsError {
        DnsError {
            name: name.to_string(),
            reason: "SERVFAIL".to_string(),
        }
    }
}

#[async_trait]
impl DnsResolver for FakeResolver {
    async fn srv_lookup(&self, name: &str) -> Result<Vec<SrvRecord>, DnsError> {
        let mut state = self.state();
        state.calls.push(format!("SRV {name}"));
        if state.failing {
            return Err(Self::failure(name));
        }
        Ok(state.srv.get(name).cloned().unwrap_or_default())
    }

    async fn txt_lookup(&self, name: &str) -> Result<Vec<Vec<String>>, DnsError> {
        let mut state = self.state();
        state.calls.push(format!("TXT {name}"));
        if state.failing {
            return Err(Self::failure(name));
        }
        Ok(state.txt.get(name).cloned().unwrap_or_default())
    }
}

/// Selector always drawing the same value.
#[derive(Debug, Clone, Copy)]
pub struct Fixed(pub u32);

impl WeightSelector for Fixed {
    fn select(&self, _total: u32) -> u32 {
        self.0
    }
}

/// A multistatus with a single successful response for `href` holding `props`.
pub fn multistatus(href: &str, props: &str) -> String {
    format!(
        r#"<?xml version="1.0" encoding="utf-8"?>
<d:multistatus xmlns:d="DAV:" xmlns:c="urn:ietf:params:xml:ns:caldav" xmlns:cr="urn:ietf:params:xml:ns:carddav">
  <d:response>
    <d:href>{href}</d:href>
    <d:propstat>
      <d:prop>{props}</d:prop>
      <d:status>HTTP/1.1 200 OK</d:status>
    </d:propstat>
  </d:response>
</d:multistatus>"#
    )
}

/// `current-user-principal` property pointing at `href`.
pub fn principal_prop(href: &str) -> String {
    format!("<d:current-user-principal><d:href>{href}</d:href></d:current-user-principal>")
}
