//! Bundle serving
//!
//! Turns one matcher candidate into a response. Every failure here is soft:
//! an entry document that cannot be rendered hands the request back to the
//! host, a missing asset lets the cascade try its next candidate.

use http_body_util::Full;
use hyper::body::Bytes;
use hyper::Response;
use tokio::fs;

use crate::bundle::{Bundle, BundleKind};
use crate::config::AppState;
use crate::error::LoaderError;
use crate::http::{self, CachePolicy};
use crate::logger;
use crate::routing::{BundleMatch, MatchTarget};

/// Result of trying one candidate
pub enum Outcome {
    Served {
        response: Response<Full<Bytes>>,
        served_by: String,
    },
    /// Stop the cascade and let the host answer
    Defer,
    /// Candidate did not apply, try the next one
    Continue,
}

pub async fn serve_candidate(candidate: &BundleMatch, state: &AppState, is_head: bool) -> Outcome {
    let bundle = Bundle::new(candidate.kind.clone(), &state.upload_dir, &candidate.folder);
    match &candidate.target {
        MatchTarget::Entry => serve_entry(&bundle, state, is_head).await,
        MatchTarget::Asset(relative) => serve_asset(&bundle, relative, is_head).await,
    }
}

async fn serve_entry(bundle: &Bundle, state: &AppState, is_head: bool) -> Outcome {
    let bundles = &state.config.bundles;
    match bundle
        .render_entry(
            &state.config.host.site_url,
            &bundles.template_prefix,
            bundles.rewrite_mode,
        )
        .await
    {
        Ok(html) => Outcome::Served {
            response: http::build_entry_response(
                html,
                CachePolicy::entry(bundles.entry_cache),
                is_head,
            ),
            served_by: bundle.kind.to_string(),
        },
        Err(e) => {
            log_serving_failure(&bundle.kind, &e);
            Outcome::Defer
        }
    }
}

async fn serve_asset(bundle: &Bundle, relative: &str, is_head: bool) -> Outcome {
    let asset = match bundle.resolve_asset(relative) {
        Ok(asset) => asset,
        Err(e) => {
            if matches!(e, LoaderError::ConfigInconsistent { .. }) {
                log_serving_failure(&bundle.kind, &e);
            }
            return Outcome::Continue;
        }
    };

    match fs::read(&asset.path).await {
        Ok(data) => Outcome::Served {
            response: http::build_asset_response(data, asset.content_type, is_head),
            served_by: format!("asset:{}", bundle.kind),
        },
        Err(e) => {
            logger::log_error(&format!(
                "Failed to read asset '{}': {}",
                asset.path.display(),
                e
            ));
            Outcome::Continue
        }
    }
}

fn log_serving_failure(kind: &BundleKind, error: &LoaderError) {
    match error {
        LoaderError::ConfigInconsistent { .. } => {
            logger::log_warning(&format!("Bundle {kind} deferred to host: {error}"));
        }
        LoaderError::NotFound(_) => {
            logger::log_debug(&format!("Bundle {kind} has no entry document: {error}"));
        }
        _ => logger::log_error(&format!("Bundle {kind} failed: {error}")),
    }
}
