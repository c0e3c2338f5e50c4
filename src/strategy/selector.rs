//! Strategy Selector
//!
//! First-match classification of a request path against the ordered rule table.

use axum::http::Method;
use serde::Serialize;

use super::rules::{default_rules, RequestClass, Strategy, StrategyRule};
use crate::cache::PartitionRole;

/// Outcome of classifying one request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Route {
    pub rule: &'static str,
    pub class: RequestClass,
    pub strategy: Strategy,
    pub partition: PartitionRole,
}

/// Fallback route for tables without a catch-all rule.
const DEFAULT_ROUTE: Route = Route {
    rule: "default",
    class: RequestClass::Default,
    strategy: Strategy::NetworkFirst,
    partition: PartitionRole::Dynamic,
};

#[derive(Debug, Clone)]
pub struct StrategySelector {
    rules: Vec<StrategyRule>,
}

impl StrategySelector {
    pub fn new(rules: Vec<StrategyRule>) -> Self {
        Self { rules }
    }

    /// Returns the route for a request. Never fails: unmatched paths get the
    /// network-first default against the dynamic partition.
    ///
    /// The method does not influence the route; the interceptor bypasses the
    /// cache for non-GET requests after classification.
    pub fn classify(&self, _method: &Method, path: &str) -> Route {
        self.rules
            .iter()
            .find(|rule| rule.pattern.matches(path))
            .map(|rule| Route {
                rule: rule.name,
                class: rule.class,
                strategy: rule.strategy,
                partition: rule.partition,
            })
            .unwrap_or(DEFAULT_ROUTE)
    }
}

impl Default for StrategySelector {
    fn default() -> Self {
        Self::new(default_rules())
    }
}
