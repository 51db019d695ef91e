//! # Origin Gate
//!
//! First stage of the pipeline: decides from the client address whether a
//! request may proceed at all.
//!
//! A denied request is answered with a canned 404, optionally imitating a
//! well-known web server (see [`crate::impersonation`]), so that callers
//! outside the permit list cannot tell an admin interface is mounted here.
//!
//! The permit decision itself belongs to an [`OriginChecker`]. The gate fails
//! closed: a checker error or panic is logged and treated as a denial.

use crate::config::ConfigSnapshot;
use crate::error::OriginCheckError;
use crate::impersonation::{ImpersonationType, DEFAULT_BODY, DEFAULT_HEADERS};
use crate::response::ResponseState;
use std::net::IpAddr;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;
use tracing::{debug, warn};

/// Decides whether a source address is on the permit list.
pub trait OriginChecker: Send + Sync {
    /// `Ok(true)` if `ip` may reach the admin interface.
    fn permitted_source(&self, ip: &str) -> Result<bool, OriginCheckError>;
}

/// Outcome of the origin gate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Admission {
    Allowed,
    /// The response state now holds the canned denial
    Denied,
}

/// Permit/deny stage backed by an [`OriginChecker`].
#[derive(Clone)]
pub struct OriginGate {
    checker: Arc<dyn OriginChecker>,
}

impl OriginGate {
    pub fn new(checker: Arc<dyn OriginChecker>) -> Self {
        Self { checker }
    }

    /// Judge `ip`. On denial `state` is overwritten with the canned response;
    /// on admission it is left untouched.
    pub fn check(&self, ip: &str, config: &ConfigSnapshot, state: &mut ResponseState) -> Admission {
        let decision = catch_unwind(AssertUnwindSafe(|| self.checker.permitted_source(ip)));
        let permitted = match decision {
            Ok(Ok(permitted)) => permitted,
            Ok(Err(e)) => {
                warn!(client_ip = %ip, error = %e, "Origin check failed - denying");
                false
            }
            Err(panic) => {
                warn!(
                    client_ip = %ip,
                    panic_message = %format!("{panic:?}"),
                    "Origin checker panicked - denying"
                );
                false
            }
        };

        if permitted {
            debug!(client_ip = %ip, "Origin permitted");
            return Admission::Allowed;
        }

        let (body, headers) = if config.impersonation_enabled {
            ImpersonationType::parse(&config.impersonation_type).canned()
        } else {
            (DEFAULT_BODY, DEFAULT_HEADERS)
        };
        state.replace(404, body, headers);
        warn!(
            client_ip = %ip,
            impersonation = config.impersonation_enabled,
            impersonation_type = %config.impersonation_type,
            "Origin not permitted"
        );
        Admission::Denied
    }
}

/// One permitted network in CIDR notation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Subnet {
    network: IpAddr,
    prefix: u8,
}

impl Subnet {
    fn parse(entry: &str) -> Result<Self, OriginCheckError> {
        let invalid = || OriginCheckError::InvalidPermitList {
            entry: entry.to_string(),
        };
        let (addr, prefix) = match entry.trim().split_once('/') {
            Some((addr, prefix)) => (addr, Some(prefix)),
            None => (entry.trim(), None),
        };
        let network: IpAddr = addr.parse().map_err(|_| invalid())?;
        let max = if network.is_ipv4() { 32 } else { 128 };
        let prefix = match prefix {
            Some(p) => p.parse::<u8>().map_err(|_| invalid())?,
            None => max,
        };
        if prefix > max {
            return Err(invalid());
        }
        Ok(Self { network, prefix })
    }

    fn contains(&self, ip: IpAddr) -> bool {
        match (self.network, ip) {
            (IpAddr::V4(net), IpAddr::V4(ip)) => {
                let mask = u32::MAX.checked_shl(32 - u32::from(self.prefix)).unwrap_or(0);
                u32::from(net) & mask == u32::from(ip) & mask
            }
            (IpAddr::V6(net), IpAddr::V6(ip)) => {
                let mask = u128::MAX.checked_shl(128 - u32::from(self.prefix)).unwrap_or(0);
                u128::from(net) & mask == u128::from(ip) & mask
            }
            _ => false,
        }
    }
}

/// Static CIDR permit list.
///
/// Addresses that do not parse as IPs are reported as errors, which the
/// gate turns into denials.
#[derive(Debug, Clone, Default)]
pub struct SubnetAllowList {
    subnets: Vec<Subnet>,
}

impl SubnetAllowList {
    /// Build from entries like `"127.0.0.1"`, `"10.0.0.0/8"` or `"::1/128"`.
    pub fn new<I, S>(entries: I) -> Result<Self, OriginCheckError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let subnets = entries
            .into_iter()
            .map(|e| Subnet::parse(e.as_ref()))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { subnets })
    }

    /// Permit loopback only (`127.0.0.0/8` and `::1`).
    #[must_use]
    pub fn loopback() -> Self {
        Self {
            subnets: vec![
                Subnet {
                    network: IpAddr::from([127, 0, 0, 0]),
                    prefix: 8,
                },
                Subnet {
                    network: IpAddr::from([0u16, 0, 0, 0, 0, 0, 0, 1]),
                    prefix: 128,
                },
            ],
        }
    }
}

impl OriginChecker for SubnetAllowList {
    fn permitted_source(&self, ip: &str) -> Result<bool, OriginCheckError> {
        let addr: IpAddr = ip.trim().parse().map_err(|_| OriginCheckError::InvalidAddress {
            address: ip.to_string(),
        })?;
        Ok(self.subnets.iter().any(|s| s.contains(addr)))
    }
}
