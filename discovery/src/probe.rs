// SPDX-FileCopyrightText: 2025-2026 Zexin Yuan <aim@yzx9.xyz>
//
// SPDX-License-Identifier: Apache-2.0

//! Capability checks via OPTIONS.

use url::Url;

use crate::context::DiscoveryContext;
use crate::error::Cancelled;
use crate::types::ServiceType;

/// Whether the `DAV` header tokens advertise `service`.
#[must_use]
pub fn advertises(capabilities: &[String], service: ServiceType) -> bool {
    capabilities
        .iter()
        .any(|token| token.eq_ignore_ascii_case(service.capability()))
}

/// Asks `url` whether it provides `service`.
///
/// Any failure short of cancellation is a plain `false`.
pub(crate) async fn supports(
    ctx: &DiscoveryContext<'_>,
    url: &Url,
    service: ServiceType,
) -> Result<bool, Cancelled> {
    match ctx.options(url).await? {
        Ok(capabilities) => {
            let found = advertises(&capabilities, service);
            ctx.debug(format!(
                "{service}: OPTIONS {url} advertises [{}], {} {}",
                capabilities.join(", "),
                if found { "includes" } else { "lacks" },
                service.capability()
            ));
            Ok(found)
        }
        Err(e) => {
            ctx.report("OPTIONS", url, &e);
            Ok(false)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn advertises_matches_whole_tokens() {
        let caps: Vec<String> = ["1", "2", "access-control", "calendar-access"]
            .into_iter()
            .map(String::from)
            .collect();
        assert!(advertises(&caps, ServiceType::CalDav));
        assert!(!advertises(&caps, ServiceType::CardDav));

        let caps = vec!["addressbook-extended".to_string()];
        assert!(!advertises(&caps, ServiceType::CardDav));
    }
}
