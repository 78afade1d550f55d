// SPDX-FileCopyrightText: 2025-2026 Zexin Yuan <aim@yzx9.xyz>
//
// SPDX-License-Identifier: Apache-2.0

//! DNS-based service location, RFC 6764 §3 and §4.
//!
//! The SRV record `_{service}s._tcp.{domain}` names the host and port of the TLS-secured
//! service, and TXT records under the same name may carry `path=` context paths.

use async_trait::async_trait;
use hickory_resolver::TokioResolver;
use rand::Rng;

use crate::context::DiscoveryContext;
use crate::error::{Cancelled, DnsError};
use crate::types::ServiceType;

/// Port used when no SRV record names one.
pub const DEFAULT_PORT: u16 = 443;

/// The fields of a SRV record that matter for target selection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SrvRecord {
    /// Lower is preferred.
    pub priority: u16,
    /// Relative weight among records of the same priority.
    pub weight: u16,
    /// Port of the service.
    pub port: u16,
    /// Target host, without the trailing dot.
    pub target: String,
}

impl SrvRecord {
    /// A target of `.` means the service is decidedly not available at this domain.
    #[must_use]
    pub fn is_unavailable(&self) -> bool {
        self.target.is_empty() || self.target == "."
    }
}

/// DNS lookups discovery needs.
#[async_trait]
pub trait DnsResolver: Send + Sync {
    /// Looks up the SRV records for `name`. Absent records are an empty list, not an error.
    ///
    /// # Errors
    ///
    /// Returns an error if the lookup itself fails.
    async fn srv_lookup(&self, name: &str) -> Result<Vec<SrvRecord>, DnsError>;

    /// Looks up the TXT records for `name`, each as its list of character strings. Absent
    /// records are an empty list, not an error.
    ///
    /// # Errors
    ///
    /// Returns an error if the lookup itself fails.
    async fn txt_lookup(&self, name: &str) -> Result<Vec<Vec<String>>, DnsError>;
}

/// Source of the random draw used for weighted SRV selection.
pub trait WeightSelector: Send + Sync {
    /// Returns a value in `0..total`. `total` is never zero.
    fn select(&self, total: u32) -> u32;
}

/// [`WeightSelector`] backed by the thread-local RNG.
#[derive(Debug, Clone, Copy, Default)]
pub struct RandomWeightSelector;

impl WeightSelector for RandomWeightSelector {
    fn select(&self, total: u32) -> u32 {
        rand::rng().random_range(0..total)
    }
}

/// Picks the SRV record to use, RFC 2782.
///
/// Only the records with the lowest priority compete. Among them a record is drawn with a
/// probability proportional to its weight; records of weight 0 only win when every record of
/// that priority has weight 0, in which case the draw is uniform. Records announcing that the
/// service is unavailable are never picked.
#[must_use]
pub fn select_srv<'r>(
    records: &'r [SrvRecord],
    selector: &dyn WeightSelector,
) -> Option<&'r SrvRecord> {
    let usable: Vec<&SrvRecord> = records.iter().filter(|r| !r.is_unavailable()).collect();
    let lowest = usable.iter().map(|r| r.priority).min()?;
    let group: Vec<&SrvRecord> = usable.into_iter().filter(|r| r.priority == lowest).collect();

    let total: u32 = group.iter().map(|r| u32::from(r.weight)).sum();
    if total == 0 {
        let count = u32::try_from(group.len()).unwrap_or(u32::MAX);
        let index = selector.select(count).min(count - 1);
        return group.get(usize::try_from(index).ok()?).copied();
    }

    let draw = selector.select(total).min(total - 1);
    let mut running = 0;
    group
        .into_iter()
        .filter(|r| r.weight > 0)
        .find(|r| {
            running += u32::from(r.weight);
            running > draw
        })
}

/// Extracts the `path=` values of TXT records, in the order they appear.
///
/// A record may carry several space separated `key=value` pairs and several character strings.
/// Paths are made absolute.
#[must_use]
pub fn context_paths_from_txt(records: &[Vec<String>]) -> Vec<String> {
    records
        .iter()
        .flatten()
        .flat_map(|text| text.split_whitespace())
        .filter_map(|pair| pair.strip_prefix("path="))
        .filter(|path| !path.is_empty())
        .map(|path| {
            if path.starts_with('/') {
                path.to_string()
            } else {
                format!("/{path}")
            }
        })
        .collect()
}

/// Candidate context paths: TXT paths first, then the well-known path, then `/`.
#[must_use]
pub fn candidate_paths(txt_paths: Vec<String>, service: ServiceType) -> Vec<String> {
    let mut paths = txt_paths;
    paths.push(service.well_known_path());
    paths.push("/".to_string());
    paths
}

/// Finds the host and port serving `service` for `domain`.
///
/// Falls back to `domain:443` when no usable SRV record exists or the lookup fails.
pub(crate) async fn resolve_service(
    ctx: &DiscoveryContext<'_>,
    domain: &str,
    service: ServiceType,
) -> Result<(String, u16), Cancelled> {
    let name = service.srv_name(domain);
    let records = match ctx.srv_lookup(&name).await? {
        Ok(records) => records,
        Err(e) => {
            ctx.warn(format!("{service}: SRV lookup failed: {e}"));
            Vec::new()
        }
    };

    if let Some(record) = select_srv(&records, ctx.selector()) {
        ctx.info(format!(
            "{service}: SRV {name} points to {}:{}",
            record.target, record.port
        ));
        return Ok((record.target.clone(), record.port));
    }

    ctx.debug(format!(
        "{service}: no usable SRV record for {name}, using {domain}:{DEFAULT_PORT}"
    ));
    Ok((domain.to_string(), DEFAULT_PORT))
}

/// Lists the context paths to try for `service` at `domain`, in order.
pub(crate) async fn resolve_context_paths(
    ctx: &DiscoveryContext<'_>,
    domain: &str,
    service: ServiceType,
) -> Result<Vec<String>, Cancelled> {
    let name = service.srv_name(domain);
    let txt_paths = match ctx.txt_lookup(&name).await? {
        Ok(records) => context_paths_from_txt(&records),
        Err(e) => {
            ctx.warn(format!("{service}: TXT lookup failed: {e}"));
            Vec::new()
        }
    };

    if !txt_paths.is_empty() {
        ctx.info(format!(
            "{service}: TXT {name} advertises {}",
            txt_paths.join(", ")
        ));
    }
    Ok(candidate_paths(txt_paths, service))
}

/// [`DnsResolver`] backed by `hickory-resolver` with the system configuration.
#[derive(Debug, Clone)]
pub struct HickoryResolver {
    resolver: TokioResolver,
}

impl HickoryResolver {
    /// Creates a resolver from the system configuration (`/etc/resolv.conf` on Unix).
    ///
    /// # Errors
    ///
    /// Returns an error if the system configuration cannot be read.
    pub fn new() -> Result<Self, DnsError> {
        let resolver = TokioResolver::builder_tokio()
            .map_err(|e| DnsError {
                name: "<system configuration>".to_string(),
                reason: e.to_string(),
            })?
            .build();
        Ok(Self { resolver })
    }
}

#[async_trait]
impl DnsResolver for HickoryResolver {
    async fn srv_lookup(&self, name: &str) -> Result<Vec<SrvRecord>, DnsError> {
        match self.resolver.srv_lookup(name).await {
            Ok(lookup) => Ok(lookup
                .iter()
                .map(|srv| SrvRecord {
                    priority: srv.priority(),
                    weight: srv.weight(),
                    port: srv.port(),
                    target: srv.target().to_utf8().trim_end_matches('.').to_string(),
                })
                .collect()),
            Err(e) if e.is_no_records_found() || e.is_nx_domain() => Ok(Vec::new()),
            Err(e) => Err(DnsError {
                name: name.to_string(),
                reason: e.to_string(),
            }),
        }
    }

    async fn txt_lookup(&self, name: &str) -> Result<Vec<Vec<String>>, DnsError> {
        match self.resolver.txt_lookup(name).await {
            Ok(lookup) => Ok(lookup
                .iter()
                .map(|txt| {
                    txt.txt_data()
                        .iter()
                        .map(|data| String::from_utf8_lossy(data).into_owned())
                        .collect()
                })
                .collect()),
            Err(e) if e.is_no_records_found() || e.is_nx_domain() => Ok(Vec::new()),
            Err(e) => Err(DnsError {
                name: name.to_string(),
                reason: e.to_string(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Fixed(u32);

    impl WeightSelector for Fixed {
        fn select(&self, _total: u32) -> u32 {
            self.0
        }
    }

    fn srv(priority: u16, weight: u16, target: &str) -> SrvRecord {
        SrvRecord {
            priority,
            weight,
            port: 443,
            target: target.to_string(),
        }
    }

    #[test]
    fn select_srv_prefers_lowest_priority() {
        let records = [srv(20, 100, "backup.example.com"), srv(10, 1, "main.example.com")];
        let picked = select_srv(&records, &Fixed(0)).unwrap();
        assert_eq!(picked.target, "main.example.com");
    }

    #[test]
    fn select_srv_never_picks_zero_weight_against_weighted() {
        let records = [srv(10, 0, "zero.example.com"), srv(10, 100, "heavy.example.com")];
        for draw in [0, 50, 99] {
            let picked = select_srv(&records, &Fixed(draw)).unwrap();
            assert_eq!(picked.target, "heavy.example.com");
        }
    }

    #[test]
    fn select_srv_is_proportional_to_weight() {
        let records = [srv(10, 30, "a.example.com"), srv(10, 70, "b.example.com")];
        assert_eq!(select_srv(&records, &Fixed(0)).unwrap().target, "a.example.com");
        assert_eq!(select_srv(&records, &Fixed(29)).unwrap().target, "a.example.com");
        assert_eq!(select_srv(&records, &Fixed(30)).unwrap().target, "b.example.com");
        assert_eq!(select_srv(&records, &Fixed(99)).unwrap().target, "b.example.com");
    }

    #[test]
    fn select_srv_all_zero_weights_is_uniform() {
        let records = [srv(10, 0, "a.example.com"), srv(10, 0, "b.example.com")];
        assert_eq!(select_srv(&records, &Fixed(0)).unwrap().target, "a.example.com");
        assert_eq!(select_srv(&records, &Fixed(1)).unwrap().target, "b.example.com");
    }

    #[test]
    fn select_srv_skips_unavailable_targets() {
        assert_eq!(select_srv(&[srv(0, 0, ".")], &Fixed(0)), None);
        assert_eq!(select_srv(&[], &Fixed(0)), None);
    }

    #[test]
    fn random_selector_stays_in_range() {
        let selector = RandomWeightSelector;
        for _ in 0..100 {
            assert!(selector.select(3) < 3);
        }
    }

    #[test]
    fn txt_paths_keep_record_order() {
        let records = vec![
            vec!["path=/a".to_string()],
            vec!["foo=bar path=/b".to_string(), "path=c".to_string()],
            vec!["path=".to_string()],
        ];
        assert_eq!(context_paths_from_txt(&records), vec!["/a", "/b", "/c"]);
    }

    #[test]
    fn candidate_paths_end_with_well_known_and_root() {
        let paths = candidate_paths(vec!["/dav/".to_string()], ServiceType::CardDav);
        assert_eq!(paths, vec!["/dav/", "/.well-known/carddav", "/"]);

        let paths = candidate_paths(Vec::new(), ServiceType::CalDav);
        assert_eq!(paths, vec!["/.well-known/caldav", "/"]);
    }
}
