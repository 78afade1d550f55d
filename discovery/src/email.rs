// SPDX-FileCopyrightText: 2025-2026 Zexin Yuan <aim@yzx9.xyz>
//
// SPDX-License-Identifier: Apache-2.0

//! Email addresses of a `CalDAV` principal, RFC 6638 §2.4.1.

use url::Url;

use crate::context::DiscoveryContext;
use crate::error::Cancelled;
use crate::request::{Depth, Prop};
use crate::types::Href;

/// Keeps the `mailto:` entries of a calendar user address set, without the scheme.
#[must_use]
pub fn mailto_addresses(hrefs: &[Href]) -> Vec<String> {
    hrefs
        .iter()
        .filter_map(|href| {
            let href = href.trim();
            let (scheme, address) = href.split_at_checked(7)?;
            scheme
                .eq_ignore_ascii_case("mailto:")
                .then(|| address.to_string())
        })
        .filter(|address| !address.is_empty())
        .collect()
}

/// Queries `calendar-user-address-set` on `principal`.
///
/// Failures are logged and yield no addresses.
pub(crate) async fn emails_for(
    ctx: &DiscoveryContext<'_>,
    principal: &Url,
) -> Result<Vec<String>, Cancelled> {
    let resp = match ctx
        .propfind(principal, Depth::Zero, &[Prop::CalendarUserAddressSet])
        .await?
    {
        Ok(resp) => resp,
        Err(e) => {
            ctx.report("PROPFIND", principal, &e);
            return Ok(Vec::new());
        }
    };

    let hrefs: Vec<Href> = resp
        .multistatus
        .responses
        .iter()
        .flat_map(|item| item.properties().calendar_user_address_set)
        .collect();
    let emails = mailto_addresses(&hrefs);
    if !emails.is_empty() {
        ctx.info(format!("principal {principal} uses {}", emails.join(", ")));
    }
    Ok(emails)
}
