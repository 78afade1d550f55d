// SPDX-FileCopyrightText: 2025-2026 Zexin Yuan <aim@yzx9.xyz>
//
// SPDX-License-Identifier: Apache-2.0

//! `current-user-principal` lookups, RFC 5397.

use url::Url;

use crate::context::DiscoveryContext;
use crate::error::Cancelled;
use crate::probe::supports;
use crate::request::{Depth, Prop};
use crate::types::ServiceType;

/// Finds the principal of the authenticated user starting from `url`.
///
/// With `expected` set, a principal that does not advertise that service is discarded. Every
/// failure short of cancellation yields `None`.
pub(crate) async fn find_current_user_principal(
    ctx: &DiscoveryContext<'_>,
    url: &Url,
    expected: Option<ServiceType>,
) -> Result<Option<Url>, Cancelled> {
    let resp = match ctx
        .propfind(url, Depth::Zero, &[Prop::CurrentUserPrincipal])
        .await?
    {
        Ok(resp) => resp,
        Err(e) => {
            ctx.report("PROPFIND", url, &e);
            return Ok(None);
        }
    };

    let Some(href) = resp
        .multistatus
        .responses
        .iter()
        .find_map(|item| item.properties().current_user_principal)
    else {
        ctx.debug(format!("{url} has no current-user-principal"));
        return Ok(None);
    };

    let principal = match resp.url.join(&href) {
        Ok(principal) => principal,
        Err(e) => {
            ctx.warn(format!("{url} returned an unusable principal href {href}: {e}"));
            return Ok(None);
        }
    };

    if let Some(service) = expected
        && !supports(ctx, &principal, service).await?
    {
        ctx.info(format!(
            "{service}: principal {principal} does not provide {service}, ignoring it"
        ));
        return Ok(None);
    }

    ctx.info(format!("found principal {principal} via {url}"));
    Ok(Some(principal))
}
