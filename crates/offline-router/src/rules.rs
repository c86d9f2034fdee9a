//! Ordered routing rules.
//!
//! Rules are evaluated in a fixed precedence order and the first match wins:
//!
//! 1. non-idempotent methods → `Passthrough`
//! 2. opaque cross-origin hosts → `OpaquePassthrough`
//! 3. dynamic API paths → `NetworkOnly`
//! 4. documents → `NetworkFirst`
//! 5. media assets → `NetworkNoStore`
//! 6. everything else → `CacheFirst`

use offline_core::{ConfigError, Destination, PathMatch, Request, RouterConfig, Strategy};

use crate::host::HostDenylist;

/// Path patterns compared by prefix or substring.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathPatterns {
    patterns: Vec<String>,
    mode: PathMatch,
}

impl PathPatterns {
    /// Create a pattern set.
    pub fn new<S: AsRef<str>>(patterns: &[S], mode: PathMatch) -> Self {
        Self {
            patterns: patterns
                .iter()
                .map(|p| p.as_ref().trim().to_string())
                .filter(|p| !p.is_empty())
                .collect(),
            mode,
        }
    }

    /// Check a request path against the patterns.
    pub fn matches(&self, path: &str) -> bool {
        self.patterns.iter().any(|pattern| match self.mode {
            PathMatch::Prefix => path.starts_with(pattern.as_str()),
            PathMatch::Contains => path.contains(pattern.as_str()),
        })
    }

    /// Whether there are no patterns.
    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }
}

/// Predicate half of a routing rule.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RuleMatcher {
    /// Any method other than GET/HEAD.
    NonIdempotentMethod,
    /// Host is on the opaque denylist.
    OpaqueHost(HostDenylist),
    /// Path matches a dynamic API pattern.
    DynamicPath(PathPatterns),
    /// Top-level navigation, or URL containing a document marker.
    Document { markers: Vec<String> },
    /// Path matches a media pattern or ends in a media extension.
    Media {
        prefixes: PathPatterns,
        extensions: Vec<String>,
    },
    /// Matches every request.
    Any,
}

impl RuleMatcher {
    /// Stable rule name.
    pub fn name(&self) -> &'static str {
        match self {
            Self::NonIdempotentMethod => "non-idempotent",
            Self::OpaqueHost(_) => "opaque-host",
            Self::DynamicPath(_) => "dynamic-api",
            Self::Document { .. } => "document",
            Self::Media { .. } => "media",
            Self::Any => "static",
        }
    }

    /// Evaluate the predicate.
    pub fn matches(&self, request: &Request) -> bool {
        match self {
            Self::NonIdempotentMethod => !request.is_cacheable_method(),
            Self::OpaqueHost(denylist) => request.host().is_some_and(|h| denylist.matches(h)),
            Self::DynamicPath(patterns) => patterns.matches(request.path()),
            Self::Document { markers } => {
                if request.destination == Destination::Document {
                    return true;
                }
                let url = request.url_string();
                markers.iter().any(|m| url.contains(m.as_str()))
            }
            Self::Media {
                prefixes,
                extensions,
            } => {
                prefixes.matches(request.path())
                    || path_extension(request.path())
                        .is_some_and(|ext| extensions.iter().any(|e| e == &ext))
            }
            Self::Any => true,
        }
    }
}

/// Lowercased extension of the last path segment.
fn path_extension(path: &str) -> Option<String> {
    let segment = path.rsplit('/').next()?;
    let (stem, ext) = segment.rsplit_once('.')?;
    if stem.is_empty() && ext.is_empty() {
        return None;
    }
    Some(ext.to_ascii_lowercase())
}

/// A predicate paired with the strategy it selects.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoutingRule {
    /// Predicate.
    pub matcher: RuleMatcher,
    /// Strategy applied on match.
    pub strategy: Strategy,
}

impl RoutingRule {
    /// Create a rule.
    pub fn new(matcher: RuleMatcher, strategy: Strategy) -> Self {
        Self { matcher, strategy }
    }

    /// Rule name.
    pub fn name(&self) -> &'static str {
        self.matcher.name()
    }
}

/// Ordered list of rules, always terminated by a catch-all.
#[derive(Debug, Clone)]
pub struct RoutingTable {
    rules: Vec<RoutingRule>,
}

impl RoutingTable {
    /// Build the fixed-precedence table from configuration.
    pub fn from_config(config: &RouterConfig) -> Result<Self, ConfigError> {
        config.validate()?;

        let mode = config.path_match;
        let rules = vec![
            RoutingRule::new(RuleMatcher::NonIdempotentMethod, Strategy::Passthrough),
            RoutingRule::new(
                RuleMatcher::OpaqueHost(HostDenylist::from_entries(&config.opaque_host_denylist)),
                Strategy::OpaquePassthrough,
            ),
            RoutingRule::new(
                RuleMatcher::DynamicPath(PathPatterns::new(&config.dynamic_path_prefixes, mode)),
                Strategy::NetworkOnly,
            ),
            RoutingRule::new(
                RuleMatcher::Document {
                    markers: config
                        .document_url_markers
                        .iter()
                        .filter(|m| !m.is_empty())
                        .cloned()
                        .collect(),
                },
                Strategy::NetworkFirst,
            ),
            RoutingRule::new(
                RuleMatcher::Media {
                    prefixes: PathPatterns::new(&config.media_path_prefixes, mode),
                    extensions: config.normalized_media_extensions(),
                },
                Strategy::NetworkNoStore,
            ),
            RoutingRule::new(RuleMatcher::Any, Strategy::CacheFirst),
        ];

        Ok(Self { rules })
    }

    /// The rules in evaluation order.
    pub fn rules(&self) -> &[RoutingRule] {
        &self.rules
    }

    /// Select the first matching rule.
    pub fn classify(&self, request: &Request) -> &RoutingRule {
        self.rules
            .iter()
            .find(|rule| rule.matcher.matches(request))
            .unwrap_or(&CATCH_ALL)
    }
}

static CATCH_ALL: RoutingRule = RoutingRule {
    matcher: RuleMatcher::Any,
    strategy: Strategy::CacheFirst,
};

#[cfg(test)]
mod tests {
    use super::*;
    use offline_core::Method;

    fn table() -> RoutingTable {
        let config = RouterConfig::new("v1")
            .with_origin("https://shop.example.com")
            .with_document_marker("storefront-api.js");
        RoutingTable::from_config(&config).unwrap()
    }

    fn strategy_for(request: Request) -> Strategy {
        let origin = "https://shop.example.com".parse().unwrap();
        table().classify(&request.resolve(&origin).unwrap()).strategy
    }

    #[test]
    fn test_non_idempotent_methods_pass_through() {
        for method in [Method::POST, Method::PUT, Method::DELETE, Method::PATCH] {
            let req = Request::new(method, "/api/commerce/cart/").unwrap();
            assert_eq!(strategy_for(req), Strategy::Passthrough);
        }
        // Even a document marker does not outrank the method check.
        let req = Request::new(Method::POST, "/checkout.html").unwrap();
        assert_eq!(strategy_for(req), Strategy::Passthrough);
    }

    #[test]
    fn test_opaque_host_precedes_media() {
        let req = Request::get("https://pub-3484.r2.dev/videos/clip.mp4").unwrap();
        assert_eq!(strategy_for(req), Strategy::OpaquePassthrough);
    }

    #[test]
    fn test_default_denylist_covers_bucket_host() {
        let bucket = "https://pub-3484fb4b3c5748cd80420365c258aaaa.media-cdn.example/clip.mp4";
        assert_eq!(
            strategy_for(Request::get(bucket).unwrap()),
            Strategy::OpaquePassthrough
        );
        assert_eq!(
            strategy_for(Request::get("https://pub-1111.media-cdn.example/clip.mp4").unwrap()),
            Strategy::NetworkNoStore
        );
    }

    #[test]
    fn test_dynamic_api_paths() {
        assert_eq!(
            strategy_for(Request::get("/api/commerce/cart/").unwrap()),
            Strategy::NetworkOnly
        );
        assert_eq!(
            strategy_for(Request::get("/users/42/profile").unwrap()),
            Strategy::NetworkOnly
        );
        // Dynamic paths outrank documents.
        assert_eq!(
            strategy_for(Request::document("/api/page.html").unwrap()),
            Strategy::NetworkOnly
        );
    }

    #[test]
    fn test_documents() {
        assert_eq!(
            strategy_for(Request::get("/index.html").unwrap()),
            Strategy::NetworkFirst
        );
        assert_eq!(
            strategy_for(Request::document("/").unwrap()),
            Strategy::NetworkFirst
        );
        assert_eq!(
            strategy_for(Request::get("/js/storefront-api.js?v=3").unwrap()),
            Strategy::NetworkFirst
        );
    }

    #[test]
    fn test_media() {
        assert_eq!(
            strategy_for(Request::get("/avatars/photo.jpg").unwrap()),
            Strategy::NetworkNoStore
        );
        assert_eq!(
            strategy_for(Request::get("/static/hero.WEBP").unwrap()),
            Strategy::NetworkNoStore
        );
        assert_eq!(
            strategy_for(Request::get("/media/manifest").unwrap()),
            Strategy::NetworkNoStore
        );
    }

    #[test]
    fn test_static_assets_default_to_cache_first() {
        assert_eq!(
            strategy_for(Request::get("/css/site.css").unwrap()),
            Strategy::CacheFirst
        );
        assert_eq!(
            strategy_for(Request::new(Method::HEAD, "/js/app.js").unwrap()),
            Strategy::CacheFirst
        );
        // Extension matching is on the path only, not the query.
        assert_eq!(
            strategy_for(Request::get("/font.woff2?name=x.png").unwrap()),
            Strategy::CacheFirst
        );
    }

    #[test]
    fn test_path_match_modes() {
        let prefix = PathPatterns::new(&["/api/"], PathMatch::Prefix);
        assert!(prefix.matches("/api/v1/cart"));
        assert!(!prefix.matches("/shop/api/v1"));

        let contains = PathPatterns::new(&["/api/"], PathMatch::Contains);
        assert!(contains.matches("/shop/api/v1"));
        assert!(!contains.matches("/shop/apiv1"));
    }

    #[test]
    fn test_path_extension() {
        assert_eq!(path_extension("/a/b.JPG"), Some("jpg".to_string()));
        assert_eq!(path_extension("/a.dir/file"), None);
        assert_eq!(path_extension("/"), None);
    }

    #[test]
    fn test_table_order_is_fixed() {
        let names: Vec<&str> = table().rules().iter().map(RoutingRule::name).collect();
        assert_eq!(
            names,
            vec!["non-idempotent", "opaque-host", "dynamic-api", "document", "media", "static"]
        );
    }

    #[test]
    fn test_invalid_config_rejected() {
        assert!(RoutingTable::from_config(&RouterConfig::new("")).is_err());
    }
}
