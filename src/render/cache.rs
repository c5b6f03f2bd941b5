//! Path-keyed cache of compiled templates.
//!
//! # Responsibilities
//! - Resolve relative paths inside the selected content root
//! - Compile files on first use, or eagerly in whitelist mode
//! - Apply the HTML-escaping policy to render data
//!
//! # Design Decisions
//! - Resolution is lexical: a path that escapes its root is rejected before
//!   any filesystem access
//! - Entries are created at most once per path and never invalidated;
//!   concurrent first renders may compile redundantly, the stored entry wins
//! - Whitelist mode is a closed world: files added after startup are never
//!   served for the lifetime of the process

use std::collections::HashMap;
use std::path::{Component, Path, PathBuf};
use std::sync::Arc;

use bytes::Bytes;
use dashmap::DashMap;

use crate::render::escape::escape_values;
use crate::render::template::Template;

/// Which content root a render request resolves against.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RootKind {
    /// The full content root.
    Public,
    /// The `static/` subtree of the content root.
    Static,
}

/// Data mapping passed to a render, with an optional per-call opt-out of
/// the global escaping policy.
#[derive(Debug, Clone, Default)]
pub struct RenderData {
    values: HashMap<String, String>,
    no_escape: bool,
}

impl RenderData {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a named value.
    pub fn with(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.values.insert(name.into(), value.into());
        self
    }

    /// Skip HTML escaping for this render only.
    pub fn no_escape(mut self) -> Self {
        self.no_escape = true;
        self
    }
}

/// Cache of compiled templates, keyed by resolved path.
pub struct TemplateCache {
    public_root: PathBuf,
    entries: DashMap<PathBuf, Arc<Template>>,
    escape_render: bool,
    /// Set once `preload` has walked the content root; afterwards any miss
    /// is a not-found outcome with no lazy compilation.
    whitelist: bool,
}

impl TemplateCache {
    pub fn new(public_root: impl Into<PathBuf>, escape_render: bool) -> Self {
        Self {
            public_root: public_root.into(),
            entries: DashMap::new(),
            escape_render,
            whitelist: false,
        }
    }

    /// Eagerly compile every file under the content root and lock the cache
    /// to exactly that set. Returns the number of entries compiled.
    ///
    /// A file that fails to read or compile is skipped with a warning; it
    /// simply never enters the cache, matching the lazy-mode outcome.
    pub async fn preload(&mut self) -> std::io::Result<usize> {
        let files = walk(self.public_root.clone()).await?;
        let mut compiled = 0;
        for path in files {
            match tokio::fs::read(&path).await {
                Ok(raw) => match Template::compile(raw) {
                    Ok(template) => {
                        self.entries.insert(path, Arc::new(template));
                        compiled += 1;
                    }
                    Err(err) => {
                        tracing::warn!(path = %path.display(), error = %err, "Skipping uncompilable file");
                    }
                },
                Err(err) => {
                    tracing::warn!(path = %path.display(), error = %err, "Skipping unreadable file");
                }
            }
        }
        self.whitelist = true;
        Ok(compiled)
    }

    /// Render the file at `rel` under the selected root with the given data.
    ///
    /// Returns `None` for every not-found outcome: path escapes the root,
    /// file missing or unreadable, compilation failure, whitelist miss, or
    /// an unresolved placeholder at render time.
    pub async fn render(&self, rel: &str, kind: RootKind, data: &RenderData) -> Option<Bytes> {
        let path = self.resolve(rel, kind)?;

        let template = match self.entries.get(&path) {
            Some(entry) => Arc::clone(&entry),
            None => {
                if self.whitelist {
                    tracing::debug!(path = %path.display(), "Whitelist miss");
                    return None;
                }
                let template = self.compile_file(&path).await?;
                // Racing first renders are fine: compilation is idempotent.
                self.entries
                    .entry(path)
                    .or_insert_with(|| template)
                    .clone()
            }
        };

        let rendered = if self.escape_render && !data.no_escape {
            template.render(&escape_values(&data.values))
        } else {
            template.render(&data.values)
        };
        match rendered {
            Ok(bytes) => Some(bytes),
            Err(err) => {
                tracing::debug!(rel, error = %err, "Render failed");
                None
            }
        }
    }

    /// Lexically resolve `rel` inside the selected root.
    ///
    /// Any traversal that would leave the root yields `None` without
    /// touching the filesystem.
    fn resolve(&self, rel: &str, kind: RootKind) -> Option<PathBuf> {
        let base = match kind {
            RootKind::Public => self.public_root.clone(),
            RootKind::Static => self.public_root.join("static"),
        };

        let mut resolved = base;
        let mut depth: usize = 0;
        for component in Path::new(rel.trim_start_matches('/')).components() {
            match component {
                Component::Normal(part) => {
                    resolved.push(part);
                    depth += 1;
                }
                Component::CurDir => {}
                Component::ParentDir => {
                    if depth == 0 {
                        return None;
                    }
                    resolved.pop();
                    depth -= 1;
                }
                // Absolute prefixes cannot appear in a root-relative path.
                Component::RootDir | Component::Prefix(_) => return None,
            }
        }
        Some(resolved)
    }

    async fn compile_file(&self, path: &Path) -> Option<Arc<Template>> {
        let raw = match tokio::fs::read(path).await {
            Ok(raw) => raw,
            Err(err) => {
                tracing::debug!(path = %path.display(), error = %err, "Read failed");
                return None;
            }
        };
        match Template::compile(raw) {
            Ok(template) => Some(Arc::new(template)),
            Err(err) => {
                tracing::debug!(path = %path.display(), error = %err, "Compilation failed");
                None
            }
        }
    }
}

/// Recursively list every file under `dir`.
fn walk(
    dir: PathBuf,
) -> std::pin::Pin<Box<dyn std::future::Future<Output = std::io::Result<Vec<PathBuf>>> + Send>> {
    Box::pin(async move {
        let mut files = Vec::new();
        let mut entries = tokio::fs::read_dir(&dir).await?;
        while let Some(entry) = entries.next_entry().await? {
            let file_type = entry.file_type().await?;
            if file_type.is_dir() {
                files.extend(walk(entry.path()).await?);
            } else {
                files.push(entry.path());
            }
        }
        Ok(files)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn site() -> tempfile::TempDir {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().join("public");
        fs::create_dir_all(root.join("static")).unwrap();
        fs::write(root.join("hello.html"), "Hello {{ name }}").unwrap();
        fs::write(root.join("static").join("index.html"), "<h1>home</h1>").unwrap();
        dir
    }

    #[tokio::test]
    async fn renders_from_public_root() {
        let dir = site();
        let cache = TemplateCache::new(dir.path().join("public"), true);
        let out = cache
            .render("hello.html", RootKind::Public, &RenderData::new().with("name", "Ada"))
            .await
            .unwrap();
        assert_eq!(out, Bytes::from("Hello Ada"));
    }

    #[tokio::test]
    async fn escapes_data_values_by_default() {
        let dir = site();
        let cache = TemplateCache::new(dir.path().join("public"), true);
        let data = RenderData::new().with("name", "A&B");
        let out = cache
            .render("hello.html", RootKind::Public, &data)
            .await
            .unwrap();
        assert_eq!(out, Bytes::from("Hello A&#38;B"));

        let raw = cache
            .render("hello.html", RootKind::Public, &data.no_escape())
            .await
            .unwrap();
        assert_eq!(raw, Bytes::from("Hello A&B"));
    }

    #[tokio::test]
    async fn static_root_selects_the_subtree() {
        let dir = site();
        let cache = TemplateCache::new(dir.path().join("public"), true);
        let out = cache
            .render("/index.html", RootKind::Static, &RenderData::new())
            .await
            .unwrap();
        assert_eq!(out, Bytes::from("<h1>home</h1>"));
    }

    #[tokio::test]
    async fn traversal_outside_root_is_rejected() {
        let dir = site();
        fs::write(dir.path().join("secret.txt"), "secret").unwrap();
        let cache = TemplateCache::new(dir.path().join("public"), true);
        assert!(cache
            .render("../secret.txt", RootKind::Public, &RenderData::new())
            .await
            .is_none());
        assert!(cache
            .render("../../../../etc/passwd", RootKind::Public, &RenderData::new())
            .await
            .is_none());
    }

    #[tokio::test]
    async fn dot_dot_within_root_is_allowed() {
        let dir = site();
        let cache = TemplateCache::new(dir.path().join("public"), true);
        let out = cache
            .render("static/../hello.html", RootKind::Public, &RenderData::new().with("name", "x"))
            .await
            .unwrap();
        assert_eq!(out, Bytes::from("Hello x"));
    }

    #[tokio::test]
    async fn whitelist_mode_is_a_closed_world() {
        let dir = site();
        let root = dir.path().join("public");
        let mut cache = TemplateCache::new(root.clone(), true);
        let compiled = cache.preload().await.unwrap();
        assert_eq!(compiled, 2);

        // Present at startup: served.
        assert!(cache
            .render("static/index.html", RootKind::Public, &RenderData::new())
            .await
            .is_some());

        // Added afterwards: never served.
        fs::write(root.join("late.html"), "late").unwrap();
        assert!(cache
            .render("late.html", RootKind::Public, &RenderData::new())
            .await
            .is_none());
    }

    #[tokio::test]
    async fn missing_file_is_not_found() {
        let dir = site();
        let cache = TemplateCache::new(dir.path().join("public"), true);
        assert!(cache
            .render("nope.html", RootKind::Public, &RenderData::new())
            .await
            .is_none());
    }

    #[tokio::test]
    async fn unresolved_placeholder_is_not_found() {
        let dir = site();
        let cache = TemplateCache::new(dir.path().join("public"), true);
        assert!(cache
            .render("hello.html", RootKind::Public, &RenderData::new())
            .await
            .is_none());
    }

    #[tokio::test]
    async fn binary_files_render_as_identity() {
        let dir = site();
        let root = dir.path().join("public");
        fs::write(root.join("blob.bin"), [0xff_u8, 0x00, 0x01]).unwrap();
        let cache = TemplateCache::new(root, true);
        let out = cache
            .render("blob.bin", RootKind::Public, &RenderData::new())
            .await
            .unwrap();
        assert_eq!(out, Bytes::from(vec![0xff_u8, 0x00, 0x01]));
    }
}
