//! Strategy Module
//!
//! Maps request paths to a class, a caching strategy and a partition.

mod rules;
mod selector;

pub use rules::{
    default_rules, PathPattern, RequestClass, Strategy, StrategyRule, FONT_EXTENSIONS,
    IMAGE_EXTENSIONS, STATIC_EXTENSIONS,
};
pub use selector::{Route, StrategySelector};
