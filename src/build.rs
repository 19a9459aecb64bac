//! Exports the [`build_site`] function which stitches together the
//! high-level steps of a build: loading the page templates, loading and
//! rendering the posts ([`crate::post`]), writing the post/index/tag pages
//! ([`crate::write`]), generating the RSS feed ([`crate::feed`]), and
//! copying static assets into the output tree.
//!
//! There is no partial recovery: the first failing step aborts the build
//! with the offending path attached. The only absorbed condition is an
//! empty content directory, which is an informational no-op.

use std::fmt;
use std::fs::File;
use std::path::{Path, PathBuf};
use std::sync::atomic::AtomicBool;

use gtmpl::Template;
use tracing::{debug, info};
use walkdir::WalkDir;

use crate::config::SiteConfig;
use crate::feed::{self, Error as FeedError};
use crate::post::{self, Error as PostError};
use crate::tag;
use crate::write::{Error as WriteError, Writer};

/// The parsed page templates, one per page kind. Each is the theme's base
/// layout concatenated with the page's own template file.
pub struct Templates {
    pub index: Template,
    pub post: Template,
    pub tag_index: Template,
    pub tag: Template,
}

impl Templates {
    /// Loads and parses the four page templates from `dir`. Expects
    /// `base.html`, `index.html`, `post.html`, `tags.html`, and `tag.html`.
    pub fn load(dir: &Path) -> Result<Templates> {
        let base = dir.join("base.html");
        Ok(Templates {
            index: parse_template(&[base.clone(), dir.join("index.html")])?,
            post: parse_template(&[base.clone(), dir.join("post.html")])?,
            tag_index: parse_template(&[
                base.clone(),
                dir.join("tags.html"),
            ])?,
            tag: parse_template(&[base, dir.join("tag.html")])?,
        })
    }
}

/// Builds the site from a [`SiteConfig`]. This calls into
/// [`post::load_posts`], the [`Writer`] methods, and [`feed::channel`]
/// which do the heavy lifting, then copies the static assets. The `cancel`
/// flag aborts the post walk between documents; pages already written stay
/// on disk, which is fine because a rerun rebuilds them identically.
pub fn build_site(config: &SiteConfig, cancel: &AtomicBool) -> Result<()> {
    let templates = Templates::load(&config.template_dir)?;

    let posts = post::load_posts(&config.content_dir, cancel)?;
    if posts.is_empty() {
        info!(
            "no posts found under `{}`; nothing to build",
            config.content_dir.display(),
        );
        return Ok(());
    }
    info!("loaded {} posts", posts.len());

    let writer = Writer {
        index_template: &templates.index,
        post_template: &templates.post,
        tag_index_template: &templates.tag_index,
        tag_template: &templates.tag,
        output_dir: &config.output_dir,
        config,
    };
    writer.write_posts(&posts)?;
    writer.write_index(&posts)?;

    let groups = tag::group(&posts);
    writer.write_tag_index(&groups)?;
    writer.write_tag_pages(&groups)?;

    write_feed(config, &posts)?;
    copy_assets(&config.asset_dir, &config.output_dir.join("assets"))?;
    Ok(())
}

/// Writes the RSS feed, unless there is nothing to feed, in which case no
/// file is created at all.
fn write_feed(config: &SiteConfig, posts: &[post::Post]) -> Result<()> {
    let channel = match feed::channel(config, posts)? {
        Some(channel) => channel,
        None => return Ok(()),
    };
    let path = config.output_dir.join(&config.feed_path);
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    feed::write_channel(&channel, File::create(&path)?)
        .map_err(Error::Feed)?;
    info!("wrote feed `{}`", path.display());
    Ok(())
}

/// Copies every file under `src` to the parallel location under `dst`,
/// preserving relative paths. A missing `src` means "no assets" and is not
/// an error.
fn copy_assets(src: &Path, dst: &Path) -> Result<()> {
    if !src.exists() {
        debug!("no asset directory at `{}`", src.display());
        return Ok(());
    }
    for entry in WalkDir::new(src) {
        let entry = entry?;
        // strip_prefix can't fail: `src` is an ancestor of every entry
        let target = dst.join(entry.path().strip_prefix(src).unwrap());
        if entry.file_type().is_dir() {
            std::fs::create_dir_all(&target)?;
        } else {
            if let Some(parent) = target.parent() {
                std::fs::create_dir_all(parent)?;
            }
            std::fs::copy(entry.path(), &target)?;
        }
    }
    Ok(())
}

// Loads the template file contents, appends them to the running text, and
// parses the result into a single template.
fn parse_template(template_files: &[PathBuf]) -> Result<Template> {
    let mut contents = String::new();
    for template_file in template_files {
        use std::io::Read;
        File::open(template_file)
            .map_err(|e| Error::OpenTemplateFile {
                path: template_file.to_owned(),
                err: e,
            })?
            .read_to_string(&mut contents)?;
        contents.push('\n');
    }

    let mut template = Template::default();
    template.parse(&contents).map_err(Error::ParseTemplate)?;
    Ok(template)
}

/// The result of a site-building operation.
pub type Result<T> = std::result::Result<T, Error>;

/// The error type for building a site. Errors can occur while loading
/// posts, writing pages, assembling the feed, parsing template files, and
/// copying assets.
#[derive(Debug)]
pub enum Error {
    /// Returned for errors while loading posts.
    Post(PostError),

    /// Returned for errors writing pages to disk.
    Write(WriteError),

    /// Returned for errors assembling or writing the feed.
    Feed(FeedError),

    /// Returned for I/O problems while opening template files.
    OpenTemplateFile { path: PathBuf, err: std::io::Error },

    /// Returned for errors parsing template files.
    ParseTemplate(String),

    /// Returned for I/O errors while walking the asset tree.
    WalkDir(walkdir::Error),

    /// Returned for other I/O errors.
    Io(std::io::Error),
}

impl fmt::Display for Error {
    /// Implements [`fmt::Display`] for [`Error`].
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Error::Post(err) => err.fmt(f),
            Error::Write(err) => err.fmt(f),
            Error::Feed(err) => err.fmt(f),
            Error::OpenTemplateFile { path, err } => {
                write!(f, "opening template file `{}`: {}", path.display(), err)
            }
            Error::ParseTemplate(err) => err.fmt(f),
            Error::WalkDir(err) => err.fmt(f),
            Error::Io(err) => err.fmt(f),
        }
    }
}

impl std::error::Error for Error {
    /// Implements [`std::error::Error`] for [`Error`].
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Post(err) => Some(err),
            Error::Write(err) => Some(err),
            Error::Feed(err) => Some(err),
            Error::OpenTemplateFile { path: _, err } => Some(err),
            Error::ParseTemplate(_) => None,
            Error::WalkDir(err) => Some(err),
            Error::Io(err) => Some(err),
        }
    }
}

impl From<PostError> for Error {
    /// Converts a [`PostError`] into an [`Error`]. This allows us to use
    /// the `?` operator.
    fn from(err: PostError) -> Error {
        Error::Post(err)
    }
}

impl From<WriteError> for Error {
    /// Converts a [`WriteError`] into an [`Error`]. This allows us to use
    /// the `?` operator.
    fn from(err: WriteError) -> Error {
        Error::Write(err)
    }
}

impl From<FeedError> for Error {
    /// Converts a [`FeedError`] into an [`Error`]. This allows us to use
    /// the `?` operator.
    fn from(err: FeedError) -> Error {
        Error::Feed(err)
    }
}

impl From<walkdir::Error> for Error {
    /// Converts a [`walkdir::Error`] into an [`Error`]. This allows us to
    /// use the `?` operator for the asset walk.
    fn from(err: walkdir::Error) -> Error {
        Error::WalkDir(err)
    }
}

impl From<std::io::Error> for Error {
    /// Converts a [`std::io::Error`] into an [`Error`]. This allows us to
    /// use the `?` operator.
    fn from(err: std::io::Error) -> Error {
        Error::Io(err)
    }
}
