//! Bundle deployment: replace a folder with the contents of an uploaded archive.

use std::fs;
use std::path::{Path, PathBuf};

use super::{archive, flatten, ENTRY_DOCUMENT};
use crate::error::{LoaderError, Result};
use crate::logger;

/// Folder used for the post template bundle; slugs can never produce it
pub const TEMPLATE_FOLDER: &str = "_post_template";

/// Normalize a user-supplied slug: lowercase ASCII alphanumerics joined by
/// single dashes. Returns None when nothing usable remains.
pub fn sanitize_slug(input: &str) -> Option<String> {
    let mut slug = String::with_capacity(input.len());
    for c in input.trim().chars() {
        if c.is_ascii_alphanumeric() {
            slug.push(c.to_ascii_lowercase());
        } else if !slug.is_empty() && !slug.ends_with('-') {
            slug.push('-');
        }
    }
    while slug.ends_with('-') {
        slug.pop();
    }
    (!slug.is_empty()).then_some(slug)
}

/// Clear `upload_dir/folder`, extract `archive` into it, optionally flatten
///
/// On failure the partially written folder is removed.
pub fn deploy_archive(
    upload_dir: &Path,
    folder: &str,
    archive: &[u8],
    flatten_files: bool,
) -> Result<PathBuf> {
    if folder.is_empty() || folder.contains(['/', '\\']) || folder.starts_with('.') {
        return Err(LoaderError::UploadFailed(format!(
            "invalid bundle folder name: {folder:?}"
        )));
    }

    let target = upload_dir.join(folder);
    remove_bundle(upload_dir, folder)?;
    fs::create_dir_all(&target)?;

    let result = archive::extract(archive, &target).and_then(|written| {
        if flatten_files {
            flatten::flatten(&target)?;
        }
        Ok(written)
    });

    match result {
        Ok(written) => {
            if !target.join(ENTRY_DOCUMENT).is_file() {
                logger::log_warning(&format!(
                    "Bundle '{folder}' has no {ENTRY_DOCUMENT} at its root"
                ));
            }
            logger::log_info(&format!(
                "Deployed bundle '{folder}' ({written} file(s)) to {}",
                target.display()
            ));
            Ok(target)
        }
        Err(e) => {
            let _ = fs::remove_dir_all(&target);
            Err(match e {
                LoaderError::Io(io) => LoaderError::UploadFailed(io.to_string()),
                other => other,
            })
        }
    }
}

/// Delete a bundle folder; a missing folder is not an error
pub fn remove_bundle(upload_dir: &Path, folder: &str) -> Result<()> {
    let target = upload_dir.join(folder);
    match fs::symlink_metadata(&target) {
        Ok(meta) if meta.is_dir() => fs::remove_dir_all(&target)?,
        Ok(_) => fs::remove_file(&target)?,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
        Err(e) => return Err(e.into()),
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bundle::archive::tests::make_zip;

    #[test]
    fn test_sanitize_slug() {
        assert_eq!(sanitize_slug("My Landing Page!").as_deref(), Some("my-landing-page"));
        assert_eq!(sanitize_slug("  home ").as_deref(), Some("home"));
        assert_eq!(sanitize_slug("../etc").as_deref(), Some("etc"));
        assert_eq!(sanitize_slug("_post_template").as_deref(), Some("post-template"));
        assert_eq!(sanitize_slug("///"), None);
        assert_eq!(sanitize_slug(""), None);
    }

    #[test]
    fn test_deploy_flattens() {
        let dir = tempfile::tempdir().unwrap();
        let data = make_zip(&[
            ("site/index.html", "<html></html>"),
            ("site/css/app.css", "body{}"),
        ]);

        let target = deploy_archive(dir.path(), "landing", &data, true).unwrap();
        assert!(target.join("index.html").is_file());
        assert!(target.join("app.css").is_file());
        assert!(!target.join("site").exists());
    }

    #[test]
    fn test_redeploy_replaces_contents() {
        let dir = tempfile::tempdir().unwrap();
        let v1 = make_zip(&[("index.html", "v1"), ("old.css", "old")]);
        let v2 = make_zip(&[("index.html", "v2")]);

        deploy_archive(dir.path(), "landing", &v1, true).unwrap();
        let target = deploy_archive(dir.path(), "landing", &v2, true).unwrap();

        assert_eq!(fs::read_to_string(target.join("index.html")).unwrap(), "v2");
        assert!(!target.join("old.css").exists());
    }

    #[test]
    fn test_failed_deploy_leaves_no_folder() {
        let dir = tempfile::tempdir().unwrap();
        let err = deploy_archive(dir.path(), "landing", b"garbage", true).unwrap_err();
        assert!(matches!(err, LoaderError::UploadFailed(_)));
        assert!(!dir.path().join("landing").exists());
    }

    #[test]
    fn test_invalid_folder_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let data = make_zip(&[("index.html", "x")]);
        assert!(deploy_archive(dir.path(), "../x", &data, true).is_err());
        assert!(deploy_archive(dir.path(), "", &data, true).is_err());
    }

    #[test]
    fn test_remove_missing_is_ok() {
        let dir = tempfile::tempdir().unwrap();
        assert!(remove_bundle(dir.path(), "nothing").is_ok());
    }
}
