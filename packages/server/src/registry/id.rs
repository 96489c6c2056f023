//! Dataset identifiers and local file names.

use chrono::{DateTime, Utc};

/// Lowercase `title`, keeping ASCII alphanumerics and collapsing every other
/// run of characters into a single `-`.
pub fn slugify(title: &str) -> String {
    let mut slug = String::with_capacity(title.len());
    for c in title.trim().chars() {
        if c.is_ascii_alphanumeric() {
            slug.push(c.to_ascii_lowercase());
        } else if !slug.is_empty() && !slug.ends_with('-') {
            slug.push('-');
        }
    }
    while slug.ends_with('-') {
        slug.pop();
    }
    if slug.is_empty() {
        slug.push_str("dataset");
    }
    slug
}

/// `<slug>-<unix seconds>-<8 random hex chars>`.
///
/// The random suffix keeps same-second uploads of one title apart, so a new
/// dataset never reuses the id (and the claims) of a deleted one.
pub fn dataset_id(title: &str, created_at: DateTime<Utc>) -> String {
    let nonce = uuid::Uuid::new_v4().simple().to_string();
    format!("{}-{}-{}", slugify(title), created_at.timestamp(), &nonce[..8])
}

/// Extension of an uploaded file name including the leading dot, or `""`.
///
/// Only the last path component is considered. Dotfiles and names ending in a
/// dot have no extension, and extensions with anything other than ASCII
/// alphanumerics are dropped rather than copied into a local file name.
pub fn file_extension(filename: &str) -> &str {
    let base = filename.rsplit(['/', '\\']).next().unwrap_or(filename);
    match base.rsplit_once('.') {
        Some((stem, ext))
            if !stem.is_empty()
                && !ext.is_empty()
                && ext.chars().all(|c| c.is_ascii_alphanumeric()) =>
        {
            &base[stem.len()..]
        }
        _ => "",
    }
}
