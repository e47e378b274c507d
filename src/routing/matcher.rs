//! Request matcher
//!
//! Decides which bundle, if any, should answer a request. The cascade is an
//! ordered list of strategies; each is a pure function of the normalized
//! path and a read-only [`MatchContext`]. The first strategies listed win.
//!
//! Strategies return candidates instead of a single answer. Entry
//! candidates are final: the request is served from that bundle or handed to
//! the host. Asset candidates only claim the request when the file exists, so
//! a miss moves on to the next candidate in the cascade.

use crate::bundle::BundleKind;
use crate::store::SiteSnapshot;

use super::host::HostSignals;

/// What part of a bundle a candidate refers to
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MatchTarget {
    /// The bundle's entry document
    Entry,
    /// A file path relative to the bundle folder, still URL-encoded
    Asset(String),
}

/// One candidate produced by a strategy
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BundleMatch {
    pub kind: BundleKind,
    pub folder: String,
    pub target: MatchTarget,
    /// Name of the strategy that produced this candidate
    pub strategy: &'static str,
}

impl BundleMatch {
    pub const fn is_entry(&self) -> bool {
        matches!(self.target, MatchTarget::Entry)
    }
}

/// Everything a strategy may look at besides the path
pub struct MatchContext<'a> {
    pub snapshot: &'a SiteSnapshot,
    pub signals: &'a dyn HostSignals,
    pub template_prefix: &'a str,
    pub reserved_prefixes: &'a [String],
    pub reserved_paths: &'a [String],
}

type Strategy = fn(&str, &MatchContext<'_>) -> Vec<BundleMatch>;

/// The cascade, highest priority first
const STRATEGIES: &[Strategy] = &[
    root_home,
    front_page_signal,
    named_pages,
    single_post_template,
    template_asset,
    home_asset_fallback,
];

/// All candidates for `path` in cascade order
///
/// `path` must already be normalized (see [`super::normalize_path`]).
pub fn candidates(path: &str, ctx: &MatchContext<'_>) -> Vec<BundleMatch> {
    STRATEGIES.iter().flat_map(|strategy| strategy(path, ctx)).collect()
}

fn home_entry(ctx: &MatchContext<'_>, strategy: &'static str) -> Vec<BundleMatch> {
    ctx.snapshot
        .pages
        .home()
        .map(|home| BundleMatch {
            kind: BundleKind::Home,
            folder: home.folder.clone(),
            target: MatchTarget::Entry,
            strategy,
        })
        .into_iter()
        .collect()
}

fn root_home(path: &str, ctx: &MatchContext<'_>) -> Vec<BundleMatch> {
    if path == "/" || path == "/index.php" {
        home_entry(ctx, "root_home")
    } else {
        Vec::new()
    }
}

// Covers paths the host treats as home even though they are not "/"
fn front_page_signal(path: &str, ctx: &MatchContext<'_>) -> Vec<BundleMatch> {
    if ctx.signals.is_front_page(path) || ctx.signals.is_home(path) {
        home_entry(ctx, "front_page_signal")
    } else {
        Vec::new()
    }
}

fn named_pages(path: &str, ctx: &MatchContext<'_>) -> Vec<BundleMatch> {
    let mut found = Vec::new();
    for page in ctx.snapshot.pages.pages() {
        let Some(rest) = path
            .strip_prefix('/')
            .and_then(|p| p.strip_prefix(page.slug.as_str()))
        else {
            continue;
        };

        let target = if rest.is_empty() {
            MatchTarget::Entry
        } else if let Some(relative) = rest.strip_prefix('/') {
            MatchTarget::Asset(relative.to_string())
        } else {
            continue;
        };

        let is_entry = matches!(target, MatchTarget::Entry);
        found.push(BundleMatch {
            kind: BundleKind::Page(page.slug.clone()),
            folder: page.folder.clone(),
            target,
            strategy: "named_page",
        });
        if is_entry {
            break;
        }
    }
    found
}

fn single_post_template(path: &str, ctx: &MatchContext<'_>) -> Vec<BundleMatch> {
    match ctx.snapshot.serving_template() {
        Some(template) if ctx.signals.is_single_post(path) => vec![BundleMatch {
            kind: BundleKind::PostTemplate,
            folder: template.folder.clone(),
            target: MatchTarget::Entry,
            strategy: "single_post_template",
        }],
        _ => Vec::new(),
    }
}

fn template_asset(path: &str, ctx: &MatchContext<'_>) -> Vec<BundleMatch> {
    let Some(relative) = path
        .strip_prefix(ctx.template_prefix)
        .filter(|rel| !rel.is_empty())
    else {
        return Vec::new();
    };
    ctx.snapshot
        .serving_template()
        .map(|template| BundleMatch {
            kind: BundleKind::PostTemplate,
            folder: template.folder.clone(),
            target: MatchTarget::Asset(relative.to_string()),
            strategy: "template_asset",
        })
        .into_iter()
        .collect()
}

fn home_asset_fallback(path: &str, ctx: &MatchContext<'_>) -> Vec<BundleMatch> {
    let relative = path.trim_matches('/');
    if relative.is_empty()
        || ctx.reserved_prefixes.iter().any(|p| relative.starts_with(p.as_str()))
        || ctx.reserved_paths.iter().any(|p| p == relative)
    {
        return Vec::new();
    }
    ctx.snapshot
        .pages
        .home()
        .map(|home| BundleMatch {
            kind: BundleKind::Home,
            folder: home.folder.clone(),
            target: MatchTarget::Asset(relative.to_string()),
            strategy: "home_asset_fallback",
        })
        .into_iter()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::HostConfig;
    use crate::routing::ConfiguredHost;
    use crate::store::{PageRecord, PostTemplate};

    struct Fixture {
        snapshot: SiteSnapshot,
        host: ConfiguredHost,
        config: HostConfig,
    }

    impl Fixture {
        fn new(slugs: &[&str]) -> Self {
            let config = HostConfig {
                single_post_prefixes: vec!["/blog/".to_string()],
                ..HostConfig::default()
            };
            Self {
                snapshot: SiteSnapshot {
                    pages: slugs.iter().map(|s| PageRecord::new(s, s)).collect(),
                    post_template: None,
                },
                host: ConfiguredHost::new(&config),
                config,
            }
        }

        fn with_template(mut self, enabled: bool) -> Self {
            let mut template = PostTemplate::new("_post_template");
            template.enabled = enabled;
            self.snapshot.post_template = Some(template);
            self
        }

        fn with_front_pages(mut self, paths: &[&str]) -> Self {
            self.config.front_page_paths = paths.iter().map(ToString::to_string).collect();
            self.host = ConfiguredHost::new(&self.config);
            self
        }

        fn run(&self, path: &str) -> Vec<BundleMatch> {
            let ctx = MatchContext {
                snapshot: &self.snapshot,
                signals: &self.host,
                template_prefix: "/_cpl_pt/",
                reserved_prefixes: &self.config.reserved_prefixes,
                reserved_paths: &self.config.reserved_paths,
            };
            candidates(path, &ctx)
        }
    }

    #[test]
    fn test_root_and_index_php_are_home() {
        let f = Fixture::new(&["home", "landing"]);
        for path in ["/", "/index.php"] {
            let first = &f.run(path)[0];
            assert_eq!(first.kind, BundleKind::Home);
            assert_eq!(first.target, MatchTarget::Entry);
            assert_eq!(first.strategy, "root_home");
        }
    }

    #[test]
    fn test_root_without_home_defers() {
        let f = Fixture::new(&["landing"]);
        assert!(f.run("/").is_empty());
    }

    #[test]
    fn test_named_page_entry_and_asset() {
        let f = Fixture::new(&["landing"]);
        let entry = f.run("/landing");
        assert_eq!(entry.len(), 1);
        assert_eq!(entry[0].kind, BundleKind::Page("landing".into()));
        assert!(entry[0].is_entry());

        let asset = f.run("/landing/css/app.css");
        assert_eq!(asset[0].target, MatchTarget::Asset("css/app.css".into()));
    }

    #[test]
    fn test_slug_match_is_exact_and_case_sensitive() {
        let f = Fixture::new(&["landing"]);
        assert!(f.run("/landing-two").is_empty());
        assert!(f.run("/Landing").is_empty());
    }

    #[test]
    fn test_prefix_slugs_follow_mapping_order() {
        let f = Fixture::new(&["promo", "promo/summer"]);
        let found = f.run("/promo/summer/logo.png");
        assert_eq!(found[0].kind, BundleKind::Page("promo".into()));
        assert_eq!(found[0].target, MatchTarget::Asset("summer/logo.png".into()));
        assert_eq!(found[1].kind, BundleKind::Page("promo/summer".into()));
        assert_eq!(found[1].target, MatchTarget::Asset("logo.png".into()));
    }

    #[test]
    fn test_single_post_requires_serving_template() {
        let f = Fixture::new(&[]).with_template(true);
        let found = f.run("/blog/hello");
        assert_eq!(found[0].kind, BundleKind::PostTemplate);
        assert!(found[0].is_entry());

        let disabled = Fixture::new(&[]).with_template(false);
        assert!(disabled.run("/blog/hello").is_empty());
    }

    #[test]
    fn test_template_assets_outside_single_post() {
        let f = Fixture::new(&["home"]).with_template(true);
        let found = f.run("/_cpl_pt/style.css");
        assert_eq!(found[0].kind, BundleKind::PostTemplate);
        assert_eq!(found[0].target, MatchTarget::Asset("style.css".into()));
        // home fallback still queued behind it
        assert_eq!(found[1].strategy, "home_asset_fallback");
    }

    #[test]
    fn test_home_asset_fallback_skips_reserved() {
        let f = Fixture::new(&["home"]);
        let found = f.run("/assets/style.css");
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].target, MatchTarget::Asset("assets/style.css".into()));

        assert!(f.run("/wp-admin/admin.php").is_empty());
        assert!(f.run("/xmlrpc.php").is_empty());
    }

    #[test]
    fn test_page_entry_precedes_home_fallback() {
        let f = Fixture::new(&["home", "landing"]);
        let found = f.run("/landing");
        assert!(found[0].is_entry());
        assert_eq!(found[0].kind, BundleKind::Page("landing".into()));
    }

    #[test]
    fn test_front_page_signal_precedes_named_page() {
        let f = Fixture::new(&["home", "welcome"]).with_front_pages(&["/", "/welcome"]);
        let found = f.run("/welcome");
        assert_eq!(found[0].kind, BundleKind::Home);
        assert!(found[0].is_entry());
        assert_eq!(found[0].strategy, "front_page_signal");
        assert_eq!(found[1].kind, BundleKind::Page("welcome".into()));
        assert_eq!(found[1].strategy, "named_page");
    }

    #[test]
    fn test_posts_index_is_home() {
        let f = Fixture::new(&["home"]);
        let found = f.run("/blog");
        assert_eq!(found[0].kind, BundleKind::Home);
        assert_eq!(found[0].strategy, "front_page_signal");
    }
}
