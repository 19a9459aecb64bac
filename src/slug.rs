//! Derives URL-safe post identifiers from source file locations. A post's
//! slug is its path relative to the content root, lowercased, with the
//! extension stripped and every platform separator replaced by `/`. The slug
//! doubles as the post's permanent output path segment, so it must stay
//! deterministic across rebuilds.

use std::path::{Component, Path};

/// Derives the slug for a post at `path` under the content root `root`.
/// Nested paths keep their directory structure with `/` separators (e.g.,
/// `{root}/ops/postmortem.md` becomes `ops/postmortem`). A path outside
/// `root` is slugged as-is rather than rejected, matching how the rest of
/// the pipeline treats the content root as advisory.
///
/// Two distinct source paths that differ only by letter case produce the
/// same slug; nothing here detects that collision.
pub fn from_path(root: &Path, path: &Path) -> String {
    let rel = path.strip_prefix(root).unwrap_or(path);
    rel.with_extension("")
        .components()
        .filter_map(|component| match component {
            Component::Normal(part) => {
                Some(part.to_string_lossy().to_lowercase())
            }
            _ => None,
        })
        .collect::<Vec<_>>()
        .join("/")
}

/// Produces a human-readable title from a slug's last segment: hyphens
/// become spaces and each word is title-cased. Used as the fallback when a
/// post's front matter has no `title`.
pub fn humanize(slug: &str) -> String {
    let base = slug.rsplit('/').next().unwrap_or(slug);
    base.split('-')
        .filter(|word| !word.is_empty())
        .map(capitalize)
        .collect::<Vec<_>>()
        .join(" ")
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        None => String::new(),
        Some(first) => first.to_uppercase().chain(chars).collect(),
    }
}
