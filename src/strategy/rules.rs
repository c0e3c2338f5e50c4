//! Routing rules: path patterns mapped to request classes and strategies.

use std::fmt;

use serde::Serialize;

use crate::cache::PartitionRole;

// == Strategy ==
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Strategy {
    CacheFirst,
    NetworkFirst,
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Strategy::CacheFirst => f.write_str("cache-first"),
            Strategy::NetworkFirst => f.write_str("network-first"),
        }
    }
}

// == Request Class ==
/// Class of a request; decides which offline substitute is produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RequestClass {
    Static,
    Api,
    Image,
    Default,
}

// == Path Pattern ==
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PathPattern {
    /// Path starts with the prefix
    Prefix(&'static str),
    /// Last path segment ends with one of the extensions (case-insensitive)
    Extension(&'static [&'static str]),
    /// Any of the inner patterns
    AnyOf(Vec<PathPattern>),
    /// Matches every path
    Any,
}

impl PathPattern {
    pub fn matches(&self, path: &str) -> bool {
        match self {
            PathPattern::Prefix(prefix) => path.starts_with(prefix),
            PathPattern::Extension(extensions) => match extension_of(path) {
                Some(ext) => extensions.iter().any(|e| e.eq_ignore_ascii_case(ext)),
                None => false,
            },
            PathPattern::AnyOf(patterns) => patterns.iter().any(|p| p.matches(path)),
            PathPattern::Any => true,
        }
    }
}

fn extension_of(path: &str) -> Option<&str> {
    let segment = path.rsplit('/').next()?;
    let (stem, ext) = segment.rsplit_once('.')?;
    if stem.is_empty() || ext.is_empty() {
        None
    } else {
        Some(ext)
    }
}

// == Strategy Rule ==
/// One entry of the ordered rule table.
#[derive(Debug, Clone)]
pub struct StrategyRule {
    pub name: &'static str,
    pub pattern: PathPattern,
    pub class: RequestClass,
    pub strategy: Strategy,
    pub partition: PartitionRole,
}

pub const IMAGE_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "gif", "svg", "webp", "ico", "avif"];
pub const FONT_EXTENSIONS: &[&str] = &["woff", "woff2", "ttf", "otf", "eot"];
pub const STATIC_EXTENSIONS: &[&str] = &["js", "mjs", "css", "map", "webmanifest"];

/// Rule table in priority order: api > images > fonts > static > default.
pub fn default_rules() -> Vec<StrategyRule> {
    vec![
        StrategyRule {
            name: "api",
            pattern: PathPattern::Prefix("/api/"),
            class: RequestClass::Api,
            strategy: Strategy::NetworkFirst,
            partition: PartitionRole::Api,
        },
        StrategyRule {
            name: "images",
            pattern: PathPattern::AnyOf(vec![
                PathPattern::Prefix("/storage/"),
                PathPattern::Prefix("/images/"),
                PathPattern::Extension(IMAGE_EXTENSIONS),
            ]),
            class: RequestClass::Image,
            strategy: Strategy::CacheFirst,
            partition: PartitionRole::Dynamic,
        },
        StrategyRule {
            name: "fonts",
            pattern: PathPattern::AnyOf(vec![
                PathPattern::Prefix("/fonts/"),
                PathPattern::Extension(FONT_EXTENSIONS),
            ]),
            class: RequestClass::Static,
            strategy: Strategy::CacheFirst,
            partition: PartitionRole::Static,
        },
        StrategyRule {
            name: "static",
            pattern: PathPattern::AnyOf(vec![
                PathPattern::Prefix("/build/"),
                PathPattern::Prefix("/assets/"),
                PathPattern::Extension(STATIC_EXTENSIONS),
            ]),
            class: RequestClass::Static,
            strategy: Strategy::CacheFirst,
            partition: PartitionRole::Static,
        },
        StrategyRule {
            name: "default",
            pattern: PathPattern::Any,
            class: RequestClass::Default,
            strategy: Strategy::NetworkFirst,
            partition: PartitionRole::Dynamic,
        },
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extension_of() {
        assert_eq!(extension_of("/images/logo.PNG"), Some("PNG"));
        assert_eq!(extension_of("/build/assets/app-3f2a.js"), Some("js"));
        assert_eq!(extension_of("/api/deliveries/5"), None);
        assert_eq!(extension_of("/.well-known"), None);
        assert_eq!(extension_of("/dir.d/file"), None);
    }

    #[test]
    fn test_extension_match_is_case_insensitive() {
        let pattern = PathPattern::Extension(IMAGE_EXTENSIONS);
        assert!(pattern.matches("/photos/IMG_001.JPG"));
        assert!(!pattern.matches("/photos/notes.txt"));
    }

    #[test]
    fn test_prefix_does_not_match_similar_path() {
        let pattern = PathPattern::Prefix("/api/");
        assert!(pattern.matches("/api/zones"));
        assert!(!pattern.matches("/apiary"));
    }

    #[test]
    fn test_default_rules_end_with_catch_all() {
        let rules = default_rules();
        assert_eq!(
            rules.iter().map(|r| r.name).collect::<Vec<_>>(),
            vec!["api", "images", "fonts", "static", "default"]
        );
        assert_eq!(rules.last().unwrap().pattern, PathPattern::Any);
    }
}
