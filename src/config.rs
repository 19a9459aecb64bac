//! Site configuration. Everything that was once a compiled-in constant —
//! the base URL, the feed's channel strings, the repository link shown on
//! post pages, the feed item cap, the excerpt length — lives here so the
//! pipeline can be driven entirely by injected values. Configuration is
//! read from an optional YAML file; a missing file means defaults, and the
//! CLI may override the directory and URL fields afterwards.

use std::fs::File;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Deserialize;
use url::Url;

const DEFAULT_BASE_URL: &str = "https://example.com/";

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SiteConfig {
    /// Directory of markdown posts.
    pub content_dir: PathBuf,

    /// Directory of gtmpl page templates.
    pub template_dir: PathBuf,

    /// Directory of static assets, copied verbatim into the output tree.
    /// May be absent on disk; that simply means "no assets".
    pub asset_dir: PathBuf,

    /// Where the generated site is written.
    pub output_dir: PathBuf,

    /// Base URL for absolute links in the feed. Joined with post slugs, so
    /// its path is kept slash-terminated (see [`SiteConfig::load`]).
    pub base_url: Url,

    /// Feed channel title.
    pub title: String,

    /// Feed channel description.
    pub description: String,

    /// Feed channel language code.
    pub language: String,

    /// External repository link made available to post templates.
    pub repository: String,

    /// Feed location relative to the output directory.
    pub feed_path: String,

    /// Maximum number of feed items.
    pub feed_limit: usize,

    /// Character cap for derived excerpts; zero disables the cap.
    pub excerpt_limit: usize,
}

impl Default for SiteConfig {
    fn default() -> SiteConfig {
        SiteConfig {
            content_dir: PathBuf::from("content"),
            template_dir: PathBuf::from("templates"),
            asset_dir: PathBuf::from("assets"),
            output_dir: PathBuf::from("public"),
            // statically valid, can't fail to parse
            base_url: Url::parse(DEFAULT_BASE_URL).unwrap(),
            title: "My Blog".to_owned(),
            description: "Notes on software and operations".to_owned(),
            language: "en".to_owned(),
            repository: String::new(),
            feed_path: "feeds/rss.xml".to_owned(),
            feed_limit: 50,
            excerpt_limit: 200,
        }
    }
}

impl SiteConfig {
    /// Loads configuration from `path`. A missing file yields the defaults;
    /// an unreadable or undecodable file is an error.
    pub fn load(path: &Path) -> Result<SiteConfig> {
        if !path.exists() {
            return Ok(SiteConfig::default());
        }
        let file = File::open(path).with_context(|| {
            format!("opening config file `{}`", path.display())
        })?;
        let mut config: SiteConfig = serde_yaml::from_reader(file)
            .with_context(|| {
                format!("decoding config file `{}`", path.display())
            })?;
        config.normalize_base_url();
        Ok(config)
    }

    /// Ensures the base URL's path ends in `/`. [`Url::join`] treats a base
    /// without a trailing slash as a file name and would replace the last
    /// path segment instead of appending to it.
    pub fn normalize_base_url(&mut self) {
        if !self.base_url.path().ends_with('/') {
            let path = format!("{}/", self.base_url.path());
            self.base_url.set_path(&path);
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_default_limits() {
        let config = SiteConfig::default();
        assert_eq!(50, config.feed_limit);
        assert_eq!(200, config.excerpt_limit);
        assert_eq!("feeds/rss.xml", config.feed_path);
    }

    #[test]
    fn test_load_missing_file_yields_defaults() {
        let config =
            SiteConfig::load(Path::new("does/not/exist.yaml")).unwrap();
        assert_eq!(PathBuf::from("content"), config.content_dir);
    }

    #[test]
    fn test_load_reads_overrides() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            "title: Ops Diary\n\
             base_url: https://blog.example.org/notes\n\
             feed_limit: 10\n\
             excerpt_limit: 80\n",
        )
        .unwrap();

        let config = SiteConfig::load(file.path()).unwrap();
        assert_eq!("Ops Diary", config.title);
        assert_eq!(10, config.feed_limit);
        assert_eq!(80, config.excerpt_limit);
        // defaults survive for unset fields
        assert_eq!(PathBuf::from("templates"), config.template_dir);
        // trailing slash restored for joining
        assert_eq!(
            "https://blog.example.org/notes/",
            config.base_url.as_str(),
        );
    }

    #[test]
    fn test_normalize_base_url_is_idempotent() {
        let mut config = SiteConfig::default();
        config.normalize_base_url();
        let once = config.base_url.clone();
        config.normalize_base_url();
        assert_eq!(once, config.base_url);
    }
}
