//! Allow/deny decisions over a chain of lists
//!
//! A [`Shield`] walks its rules in order. Each rule names a list and the
//! action to take when the client is in it (`if_in_list`) or not in it
//! (`if_not_in_list`); a rule without an action for the observed outcome
//! falls through to the next one. When every rule falls through, the
//! client is allowed.
//!
//! ```text
//! client 203.0.113.9
//!   rule "allowlist"   in? no   if_not_in_list: -      -> next
//!   rule "firehol"     in? yes  if_in_list: deny       -> DENY (firehol)
//! ```
//!
//! Addresses that aren't IPv4 never reach the lists: IPv6 clients get
//! `when_non_ipv4` (allowed when unset) and text that isn't an address at
//! all gets `on_indeterminate`. IPv4-mapped IPv6 addresses
//! (`::ffff:a.b.c.d`) are checked as IPv4.

use crate::cidr::{ipv4_to_bits, parse_ip};
use crate::store::{AnyIndex, SharedRangeStore};
use log::info;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::net::IpAddr;

pub use crate::store::Membership;

/// What to do with a request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Action {
    /// Let the request through
    Allow,
    /// Reject the request
    Deny,
}

/// Action applied when membership can't be determined
pub type DefaultPolicy = Action;

impl Action {
    /// `true` for [`Action::Deny`]
    pub fn is_deny(self) -> bool {
        self == Action::Deny
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Action::Allow => f.write_str("allow"),
            Action::Deny => f.write_str("deny"),
        }
    }
}

/// Why a decision was reached
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DecisionReason {
    /// A list rule decided
    Rule {
        /// Name of the rule
        name: String,
        /// Whether the client was in the list
        member: bool,
    },
    /// Client is IPv6
    NonIpv4,
    /// Client address could not be parsed
    Indeterminate,
    /// Every rule fell through
    NoRuleMatched,
}

impl fmt::Display for DecisionReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DecisionReason::Rule { name, member: true } => write!(f, "in list '{}'", name),
            DecisionReason::Rule {
                name,
                member: false,
            } => write!(f, "not in list '{}'", name),
            DecisionReason::NonIpv4 => f.write_str("not an IPv4 address"),
            DecisionReason::Indeterminate => f.write_str("unparsable address"),
            DecisionReason::NoRuleMatched => f.write_str("no rule matched"),
        }
    }
}

/// Result of [`Shield::evaluate`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Decision {
    /// Allow or deny
    pub action: Action,
    /// What decided it
    pub reason: DecisionReason,
}

impl Decision {
    fn new(action: Action, reason: DecisionReason) -> Self {
        Self { action, reason }
    }
}

impl fmt::Display for Decision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.action, self.reason)
    }
}

/// One list in the chain
#[derive(Debug)]
pub struct ListRule {
    /// Name used in decisions and logs
    pub name: String,
    /// The list
    pub index: SharedRangeStore<AnyIndex>,
    /// Action when the client is in the list
    pub if_in_list: Option<Action>,
    /// Action when the client is not in the list
    pub if_not_in_list: Option<Action>,
}

impl ListRule {
    /// Rule with no actions yet
    pub fn new(name: impl Into<String>, index: SharedRangeStore<AnyIndex>) -> Self {
        Self {
            name: name.into(),
            index,
            if_in_list: None,
            if_not_in_list: None,
        }
    }

    /// Set the action for members
    pub fn if_in_list(mut self, action: Action) -> Self {
        self.if_in_list = Some(action);
        self
    }

    /// Set the action for non-members
    pub fn if_not_in_list(mut self, action: Action) -> Self {
        self.if_not_in_list = Some(action);
        self
    }

    fn decide(&self, addr: u32) -> Option<Decision> {
        let member = self.index.check_addr(addr);
        let action = if member {
            self.if_in_list
        } else {
            self.if_not_in_list
        };
        action.map(|action| {
            Decision::new(
                action,
                DecisionReason::Rule {
                    name: self.name.clone(),
                    member,
                },
            )
        })
    }
}

/// Ordered chain of list rules
#[derive(Debug)]
pub struct Shield {
    /// Rules, evaluated first to last
    pub rules: Vec<ListRule>,
    /// Action for IPv6 clients; `None` lets them through
    pub when_non_ipv4: Option<Action>,
    /// Action for unparsable client addresses
    pub on_indeterminate: DefaultPolicy,
    /// Log denials at `info`
    pub log_decisions: bool,
}

impl Default for Shield {
    fn default() -> Self {
        Self {
            rules: Vec::new(),
            when_non_ipv4: None,
            on_indeterminate: Action::Deny,
            log_decisions: false,
        }
    }
}

impl Shield {
    /// Empty chain: allows every IPv4 and IPv6 client
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a rule
    pub fn with_rule(mut self, rule: ListRule) -> Self {
        self.rules.push(rule);
        self
    }

    /// Decide for a client address (`ip`, `ip:port` or `[ipv6]:port`)
    pub fn evaluate(&self, client: &str) -> Decision {
        let decision = self.decide(extract_host(client));
        if self.log_decisions && decision.action.is_deny() {
            info!("denied {}: {}", client, decision.reason);
        }
        decision
    }

    fn decide(&self, host: &str) -> Decision {
        // Same dotted-quad rules as the stores, so `010.0.0.1` is IPv4 here too
        let addr = match parse_ip(host) {
            Ok(addr) => addr,
            Err(_) => match host.parse::<IpAddr>() {
                Ok(IpAddr::V4(v4)) => ipv4_to_bits(v4),
                Ok(IpAddr::V6(v6)) => match v6.to_ipv4_mapped() {
                    Some(v4) => ipv4_to_bits(v4),
                    None => {
                        let action = self.when_non_ipv4.unwrap_or(Action::Allow);
                        return Decision::new(action, DecisionReason::NonIpv4);
                    }
                },
                Err(_) => {
                    return Decision::new(self.on_indeterminate, DecisionReason::Indeterminate)
                }
            },
        };

        self.rules
            .iter()
            .find_map(|rule| rule.decide(addr))
            .unwrap_or_else(|| Decision::new(Action::Allow, DecisionReason::NoRuleMatched))
    }

    /// Membership of `client` in the rule named `name`, if there is one
    pub fn membership(&self, name: &str, client: &str) -> Option<Membership> {
        let rule = self.rules.iter().find(|rule| rule.name == name)?;
        Some(rule.index.check_membership(extract_host(client)))
    }
}

/// Strip a port from a client address
///
/// `1.2.3.4:8080` → `1.2.3.4`, `[::1]:443` → `::1`. Bare addresses,
/// including bare IPv6, are returned trimmed but otherwise unchanged.
pub fn extract_host(client: &str) -> &str {
    let client = client.trim();

    if let Some(rest) = client.strip_prefix('[') {
        return match rest.find(']') {
            Some(end) => &rest[..end],
            None => client,
        };
    }

    match client.split_once(':') {
        // More than one colon is a bare IPv6 address
        Some((host, port)) if !port.contains(':') => host,
        _ => client,
    }
}
