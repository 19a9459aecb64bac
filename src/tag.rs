//! Tag normalization and grouping. Raw tag labels are free text; their
//! normalized forms are the grouping keys and URL segments. Normalization is
//! idempotent, so a label that is already in canonical form passes through
//! unchanged, and labels that differ only by case or separator style land in
//! the same group.

use std::collections::{HashMap, HashSet};

use crate::post::Post;

/// The identifier used when a label contains nothing alphanumeric.
const EMPTY_LABEL_FALLBACK: &str = "tag";

/// Normalizes a raw tag label into its canonical identifier: letters and
/// digits (Unicode, not just ASCII) are lowercased and copied through, and
/// every run of anything else collapses into a single `-`. Leading and
/// trailing separators are dropped. A label with no alphanumeric content at
/// all normalizes to `"tag"`.
pub fn normalize(label: &str) -> String {
    let mut normalized = String::with_capacity(label.len());
    let mut pending_separator = false;
    for c in label.chars() {
        if c.is_alphanumeric() {
            if pending_separator && !normalized.is_empty() {
                normalized.push('-');
            }
            pending_separator = false;
            normalized.extend(c.to_lowercase());
        } else {
            pending_separator = true;
        }
    }
    if normalized.is_empty() {
        return EMPTY_LABEL_FALLBACK.to_owned();
    }
    normalized
}

/// A set of posts sharing one normalized tag.
pub struct TagGroup<'a> {
    /// The display label: the first raw spelling seen for this tag, case
    /// preserved.
    pub name: String,

    /// The normalized identifier, used as grouping key and URL segment.
    pub slug: String,

    /// The group's posts, most recent publish date first.
    pub posts: Vec<&'a Post>,
}

/// Groups posts by normalized tag. A post contributes to a given group at
/// most once even if its raw tag list repeats the label in different
/// spellings. Labels that are empty after trimming are skipped. Each group's
/// posts are ordered by publish date descending (stable), and the groups
/// themselves by display name, case-insensitively.
pub fn group(posts: &[Post]) -> Vec<TagGroup<'_>> {
    let mut groups: Vec<TagGroup> = Vec::new();
    let mut index_by_slug: HashMap<String, usize> = HashMap::new();
    let mut seen: HashSet<(String, &str)> = HashSet::new();

    for post in posts {
        for raw in &post.tags {
            let name = raw.trim();
            if name.is_empty() {
                continue;
            }
            let slug = normalize(name);
            if !seen.insert((slug.clone(), post.slug.as_str())) {
                continue;
            }
            let i = match index_by_slug.get(&slug) {
                Some(&i) => i,
                None => {
                    groups.push(TagGroup {
                        name: name.to_owned(),
                        slug: slug.clone(),
                        posts: Vec::new(),
                    });
                    index_by_slug.insert(slug, groups.len() - 1);
                    groups.len() - 1
                }
            };
            groups[i].posts.push(post);
        }
    }

    for group in &mut groups {
        group.posts.sort_by(|a, b| b.date.cmp(&a.date));
    }
    groups.sort_by(|a, b| a.name.to_lowercase().cmp(&b.name.to_lowercase()));
    groups
}

#[cfg(test)]
mod test {
    use super::*;
    use chrono::{TimeZone, Utc};
    use std::path::PathBuf;

    #[test]
    fn test_normalize_folds_case_and_separators() {
        assert_eq!("devops", normalize("DevOps"));
        assert_eq!("site-reliability", normalize("Site Reliability"));
        assert_eq!("site-reliability", normalize("site_reliability"));
        assert_eq!("site-reliability", normalize("site -_ reliability"));
    }

    #[test]
    fn test_normalize_is_idempotent() {
        for label in ["DevOps", "Site Reliability", "café", "a--b", "..."] {
            let once = normalize(label);
            assert_eq!(once, normalize(&once));
        }
    }

    #[test]
    fn test_normalize_keeps_unicode_letters() {
        assert_eq!("café-au-lait", normalize("Café au lait"));
        assert_eq!("데브옵스", normalize("데브옵스"));
    }

    #[test]
    fn test_normalize_empty_and_punctuation_fall_back() {
        assert_eq!("tag", normalize(""));
        assert_eq!("tag", normalize("  "));
        assert_eq!("tag", normalize("!!!"));
    }

    #[test]
    fn test_normalize_trims_separators() {
        assert_eq!("go", normalize("-go-"));
        assert_eq!("a-b", normalize("--a---b--"));
    }

    fn post(slug: &str, day: u32, tags: &[&str]) -> Post {
        Post {
            slug: slug.to_owned(),
            title: slug.to_owned(),
            date: Utc.with_ymd_and_hms(2025, 1, day, 0, 0, 0).unwrap(),
            tags: tags.iter().map(|t| t.to_string()).collect(),
            summary: None,
            description: None,
            draft: false,
            html: String::new(),
            raw_body: String::new(),
            source_path: PathBuf::from(slug),
        }
    }

    #[test]
    fn test_group_deduplicates_per_post() {
        let posts = vec![post("only", 1, &["Go", "go", "GO"])];
        let groups = group(&posts);
        assert_eq!(1, groups.len());
        assert_eq!("go", groups[0].slug);
        assert_eq!("Go", groups[0].name);
        assert_eq!(1, groups[0].posts.len());
    }

    #[test]
    fn test_group_first_spelling_wins() {
        let posts = vec![
            post("first", 2, &["macOS"]),
            post("second", 1, &["MacOS"]),
        ];
        let groups = group(&posts);
        assert_eq!(1, groups.len());
        assert_eq!("macOS", groups[0].name);
        assert_eq!(2, groups[0].posts.len());
    }

    #[test]
    fn test_group_posts_most_recent_first() {
        let posts = vec![post("older", 1, &["ops"]), post("newer", 5, &["ops"])];
        let groups = group(&posts);
        assert_eq!("newer", groups[0].posts[0].slug);
        assert_eq!("older", groups[0].posts[1].slug);
    }

    #[test]
    fn test_group_orders_groups_case_insensitively() {
        let posts = vec![post("p", 1, &["zebra", "Apple", "mango"])];
        let groups = group(&posts);
        let names: Vec<&str> = groups.iter().map(|g| g.name.as_str()).collect();
        assert_eq!(vec!["Apple", "mango", "zebra"], names);
    }

    #[test]
    fn test_group_skips_blank_labels() {
        let posts = vec![post("p", 1, &["", "  ", "real"])];
        let groups = group(&posts);
        assert_eq!(1, groups.len());
        assert_eq!("real", groups[0].slug);
    }
}
