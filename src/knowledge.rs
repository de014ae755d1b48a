//! Knowledge-base service: loads the safety guide once and answers queries.
//!
//! A [`KnowledgeBase`] starts empty and is populated by a single call to
//! [`KnowledgeBase::initialize`] with a [`KnowledgeSource`]. Queries are
//! never blocked on loading: until the index is published every answer is
//! [`NOT_AVAILABLE`](crate::resolve::NOT_AVAILABLE). Callers that need to
//! know when loading has finished observe [`LoadState`] through
//! [`KnowledgeBase::state`] or await [`KnowledgeBase::wait_loaded`].
//!
//! ```text
//! Pending ──load ok──▶ Ready { sections }
//!    │
//!    └────load err──▶ Failed   (index stays empty)
//! ```

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, OnceLock};
use tokio::sync::watch;
use tokio::task::JoinHandle;

use crate::config::Config;
use crate::extract::{content_type_for_path, extract_text};
use crate::resolve::{resolve_detailed, Resolution, ResolveOptions};
use crate::section::{build_index, SectionIndex};

/// Something that produces the raw knowledge text.
#[async_trait]
pub trait KnowledgeSource: Send + Sync {
    /// Label used in logs.
    fn name(&self) -> &str;

    /// Returns the full extracted text of the knowledge document.
    async fn load(&self) -> Result<String>;
}

/// Reads a PDF or plain-text file from disk.
pub struct FileSource {
    path: PathBuf,
    label: String,
}

impl FileSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let label = path.display().to_string();
        Self { path, label }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl KnowledgeSource for FileSource {
    fn name(&self) -> &str {
        &self.label
    }

    async fn load(&self) -> Result<String> {
        let bytes = tokio::fs::read(&self.path)
            .await
            .with_context(|| format!("Failed to read knowledge file: {}", self.path.display()))?;
        let content_type = content_type_for_path(&self.path);

        // PDF parsing is CPU-bound.
        let text = tokio::task::spawn_blocking(move || extract_text(&bytes, content_type))
            .await
            .context("Text extraction task panicked")?
            .with_context(|| format!("Failed to extract text from {}", self.path.display()))?;
        Ok(text)
    }
}

/// Serves text already held in memory.
pub struct StaticSource {
    name: String,
    text: String,
}

impl StaticSource {
    pub fn new(name: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            text: text.into(),
        }
    }
}

#[async_trait]
impl KnowledgeSource for StaticSource {
    fn name(&self) -> &str {
        &self.name
    }

    async fn load(&self) -> Result<String> {
        Ok(self.text.clone())
    }
}

/// Loading progress of a [`KnowledgeBase`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum LoadState {
    Pending,
    Ready { sections: usize },
    Failed,
}

impl LoadState {
    pub fn is_finished(&self) -> bool {
        !matches!(self, LoadState::Pending)
    }
}

struct Inner {
    index: OnceLock<SectionIndex>,
    started: AtomicBool,
    state: watch::Sender<LoadState>,
    options: ResolveOptions,
}

/// Shared handle to the process-wide section index.
///
/// Cloning is cheap; all clones observe the same index and state.
#[derive(Clone)]
pub struct KnowledgeBase {
    inner: Arc<Inner>,
}

impl Default for KnowledgeBase {
    fn default() -> Self {
        Self::new(ResolveOptions::default())
    }
}

impl KnowledgeBase {
    pub fn new(options: ResolveOptions) -> Self {
        let (state, _) = watch::channel(LoadState::Pending);
        Self {
            inner: Arc::new(Inner {
                index: OnceLock::new(),
                started: AtomicBool::new(false),
                state,
                options,
            }),
        }
    }

    /// Creates a knowledge base and loads the file named in `config`.
    ///
    /// Unlike the server startup path, a load failure is returned.
    pub async fn open(config: &Config) -> Result<Self> {
        let kb = Self::new(ResolveOptions {
            strict_threshold: config.resolver.strict_threshold,
        });
        kb.initialize(&FileSource::new(&config.knowledge.path))
            .await?;
        Ok(kb)
    }

    /// Loads the source text and publishes the section index.
    ///
    /// Returns the number of indexed sections. Only the first call does any
    /// work; later calls fail without touching the published index.
    pub async fn initialize(&self, source: &dyn KnowledgeSource) -> Result<usize> {
        if self.inner.started.swap(true, Ordering::SeqCst) {
            anyhow::bail!("knowledge base already initialized");
        }

        let text = match source.load().await {
            Ok(text) => text,
            Err(e) => {
                tracing::error!(source = source.name(), error = %format!("{:#}", e), "knowledge load failed");
                self.inner.state.send_replace(LoadState::Failed);
                return Err(e);
            }
        };

        let index = build_index(&text);
        let sections = index.len();
        if sections == 0 {
            tracing::warn!(source = source.name(), "knowledge text contains no sections");
        }
        // `started` guarantees this is the only writer.
        let _ = self.inner.index.set(index);
        self.inner
            .state
            .send_replace(LoadState::Ready { sections });
        tracing::info!(source = source.name(), sections, "knowledge base loaded and indexed");
        Ok(sections)
    }

    /// Runs [`initialize`](Self::initialize) on the tokio runtime.
    pub fn spawn_initialize(&self, source: Arc<dyn KnowledgeSource>) -> JoinHandle<Result<usize>> {
        let kb = self.clone();
        tokio::spawn(async move { kb.initialize(source.as_ref()).await })
    }

    pub fn state(&self) -> LoadState {
        *self.inner.state.borrow()
    }

    /// Waits until loading has either succeeded or failed.
    pub async fn wait_loaded(&self) -> LoadState {
        let mut rx = self.inner.state.subscribe();
        let state = match rx.wait_for(LoadState::is_finished).await {
            Ok(state) => *state,
            Err(_) => LoadState::Failed,
        };
        state
    }

    pub fn options(&self) -> ResolveOptions {
        self.inner.options
    }

    /// Number of indexed sections (0 until ready).
    pub fn len(&self) -> usize {
        self.inner.index.get().map_or(0, SectionIndex::len)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Section keys in index order.
    pub fn section_keys(&self) -> Vec<String> {
        self.inner
            .index
            .get()
            .map(|index| index.keys().map(str::to_string).collect())
            .unwrap_or_default()
    }

    /// Resolves a query against whatever index is currently published.
    pub fn resolve(&self, query: &str) -> Resolution {
        let empty = SectionIndex::new();
        let index = self.inner.index.get().unwrap_or(&empty);
        let resolution = resolve_detailed(query, index, &self.inner.options);
        tracing::debug!(
            tier = %resolution.tier,
            key = resolution.key.as_deref().unwrap_or("-"),
            score = resolution.score,
            "resolved query"
        );
        resolution
    }

    /// Resolves a query to section text or a fallback sentence.
    pub fn answer(&self, query: &str) -> String {
        self.resolve(query).into_text()
    }
}
