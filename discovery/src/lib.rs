// SPDX-FileCopyrightText: 2025-2026 Zexin Yuan <aim@yzx9.xyz>
//
// SPDX-License-Identifier: Apache-2.0

//! `CardDAV`/`CalDAV` service discovery (RFC 6764).
//!
//! Given a URL or an email address, [`Discovery`] finds the principal, home sets and
//! collections of both services, trying the URL itself, the well-known URIs, and DNS SRV/TXT
//! records in turn.

#![warn(
    trivial_casts,
    trivial_numeric_casts,
    missing_copy_implementations,
    missing_debug_implementations,
    missing_docs,
    unsafe_code,
    unstable_features,
    unused_import_braces,
    unused_qualifications,
    clippy::dbg_macro,
    clippy::indexing_slicing,
    clippy::pedantic
)]
// Allow certain clippy lints that are too restrictive for this crate
#![allow(
    clippy::option_option,
    clippy::similar_names,
    clippy::single_match_else,
    clippy::match_bool
)]

mod config;
mod context;
mod discovery;
mod dns;
mod email;
mod error;
mod flow;
mod hint;
mod http;
mod principal;
mod probe;
mod request;
mod response;
mod scanner;
mod types;
mod xml;

pub use tokio_util::sync::CancellationToken;

pub use crate::config::{AuthMethod, DiscoveryConfig};
pub use crate::discovery::Discovery;
pub use crate::dns::{
    DEFAULT_PORT, DnsResolver, HickoryResolver, RandomWeightSelector, SrvRecord, WeightSelector,
    candidate_paths, context_paths_from_txt, select_srv,
};
pub use crate::email::mailto_addresses;
pub use crate::error::{Cancelled, DavError, DnsError, HintError};
pub use crate::hint::Hint;
pub use crate::http::{DavTransport, HttpTransport, PropFindResponse};
pub use crate::probe::advertises;
pub use crate::request::{Depth, Prop, PropFindRequest};
pub use crate::response::{
    MultiStatusResponse, PropStat, Properties, Privileges, ResourceType, ResponseItem,
};
pub use crate::scanner::scan_response;
pub use crate::types::{
    CollectionInfo, CollectionType, DiscoveryResult, Href, ServiceInfo, ServiceType,
    with_trailing_slash,
};
