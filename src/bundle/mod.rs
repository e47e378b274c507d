//! Bundle module
//!
//! A bundle is a folder of static files uploaded as one archive, served in
//! place of a page. This module locates bundles on disk, resolves assets
//! inside them and renders their entry document.

pub mod archive;
pub mod flatten;
pub mod resolver;
pub mod rewriter;
pub mod upload;

use std::fmt;
use std::path::{Path, PathBuf};

use crate::config::RewriteMode;
use crate::error::{LoaderError, Result};

pub use resolver::ResolvedAsset;

/// File served for a bundle's page request
pub const ENTRY_DOCUMENT: &str = "index.html";

/// Which configured bundle a request refers to
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BundleKind {
    Home,
    Page(String),
    PostTemplate,
}

impl fmt::Display for BundleKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Home => write!(f, "home"),
            Self::Page(slug) => write!(f, "page:{slug}"),
            Self::PostTemplate => write!(f, "post_template"),
        }
    }
}

/// A bundle bound to its folder on disk
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Bundle {
    pub kind: BundleKind,
    pub root: PathBuf,
}

impl Bundle {
    pub fn new(kind: BundleKind, upload_dir: &Path, folder: &str) -> Self {
        Self {
            kind,
            root: upload_dir.join(folder),
        }
    }

    /// Public URL prefix the bundle's relative references resolve against
    ///
    /// `site_url` is the origin (may be empty); `template_prefix` is the
    /// virtual post template namespace such as `/_cpl_pt/`.
    pub fn base_url(&self, site_url: &str, template_prefix: &str) -> String {
        let site = site_url.trim_end_matches('/');
        match &self.kind {
            BundleKind::Home => format!("{site}/"),
            BundleKind::Page(slug) => format!("{site}/{slug}/"),
            BundleKind::PostTemplate => {
                format!("{site}/{}/", template_prefix.trim_matches('/'))
            }
        }
    }

    /// Fail with `ConfigInconsistent` when the mapped folder is gone
    pub fn ensure_present(&self) -> Result<()> {
        if self.root.is_dir() {
            Ok(())
        } else {
            Err(LoaderError::ConfigInconsistent {
                slug: self.kind.to_string(),
                folder: self.root.clone(),
            })
        }
    }

    /// Resolve a request-relative asset path inside this bundle
    pub fn resolve_asset(&self, relative: &str) -> Result<ResolvedAsset> {
        self.ensure_present()?;
        resolver::resolve(&self.root, relative)
    }

    /// Read and render the entry document
    pub async fn render_entry(
        &self,
        site_url: &str,
        template_prefix: &str,
        mode: RewriteMode,
    ) -> Result<Vec<u8>> {
        self.ensure_present()?;
        let path = self.root.join(ENTRY_DOCUMENT);
        let bytes = tokio::fs::read(&path).await.map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => LoaderError::NotFound(path.display().to_string()),
            _ => LoaderError::Io(e),
        })?;
        let base_url = self.base_url(site_url, template_prefix);
        let root = &self.root;
        Ok(rewriter::render(&bytes, &base_url, mode, |rel| {
            resolver::resolve_decoded(root, rel).is_ok()
        }))
    }
}
