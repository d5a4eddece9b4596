//! Code cache: debounced, asynchronous rasterization keyed by element id.
//!
//! ## Lifecycle of an entry
//!
//! 1. [`CodeCache::ensure`] compares the element's [`CodeKey`] with the
//!    cached one. Same key: nothing happens. New key: the entry becomes
//!    `Pending` with a fresh ticket and a generation task is spawned.
//! 2. The task sleeps for the debounce window, then checks that its ticket
//!    is still the entry's ticket. A newer `ensure` in the window has
//!    replaced it, so bursts collapse into one generation.
//! 3. Rasterization runs on the blocking pool. The result is stored only if
//!    the ticket is still current; a forgotten or re-keyed entry drops it.
//!
//! Failures become `Placeholder` entries. Nothing here returns an error.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};

use tokio::sync::{Mutex, RwLock};
use tokio::task::JoinHandle;

use super::{CodeKey, Placeholder, RenderedCode};
use crate::config::CodeConfig;
use crate::element::{Element, ElementId};

/// What the renderer should draw for a code element.
#[derive(Debug, Clone)]
pub enum CodeStatus {
    /// Generation scheduled or running; draw a placeholder meanwhile.
    Pending,
    Ready(Arc<RenderedCode>),
    /// Encoding failed.
    Placeholder(Arc<Placeholder>),
}

impl CodeStatus {
    pub fn is_pending(&self) -> bool {
        matches!(self, CodeStatus::Pending)
    }

    pub fn rendered(&self) -> Option<&RenderedCode> {
        match self {
            CodeStatus::Ready(code) => Some(code),
            _ => None,
        }
    }
}

#[derive(Debug)]
struct CacheEntry {
    key: CodeKey,
    ticket: u64,
    status: CodeStatus,
}

type Entries = Arc<RwLock<HashMap<ElementId, CacheEntry>>>;

/// Per-element raster cache.
///
/// Cloning is cheap and clones share state.
#[derive(Debug, Clone)]
pub struct CodeCache {
    entries: Entries,
    tasks: Arc<Mutex<Vec<JoinHandle<()>>>>,
    next_ticket: Arc<AtomicU64>,
    generations: Arc<AtomicUsize>,
    config: Arc<CodeConfig>,
}

impl Default for CodeCache {
    fn default() -> Self {
        Self::new(CodeConfig::default())
    }
}

impl CodeCache {
    pub fn new(config: CodeConfig) -> Self {
        Self {
            entries: Arc::new(RwLock::new(HashMap::new())),
            tasks: Arc::new(Mutex::new(Vec::new())),
            next_ticket: Arc::new(AtomicU64::new(1)),
            generations: Arc::new(AtomicUsize::new(0)),
            config: Arc::new(config),
        }
    }

    /// Number of rasterizations actually performed.
    pub fn generations(&self) -> usize {
        self.generations.load(Ordering::SeqCst)
    }

    /// Schedule generation for a barcode or QR element if its key changed.
    ///
    /// Returns `true` when a new generation was scheduled. Other element
    /// kinds are ignored.
    pub async fn ensure(&self, element: &Element) -> bool {
        let Some(key) = CodeKey::for_element(element) else {
            return false;
        };

        let ticket = {
            let mut entries = self.entries.write().await;
            if entries.get(&element.id).is_some_and(|entry| entry.key == key) {
                return false;
            }
            let ticket = self.next_ticket.fetch_add(1, Ordering::SeqCst);
            entries.insert(
                element.id.clone(),
                CacheEntry {
                    key: key.clone(),
                    ticket,
                    status: CodeStatus::Pending,
                },
            );
            ticket
        };

        tracing::debug!("code {}: scheduling generation (ticket {})", element.id, ticket);
        let handle = tokio::spawn(generate(
            self.entries.clone(),
            self.generations.clone(),
            self.config.clone(),
            element.id.clone(),
            key,
            ticket,
        ));

        let mut tasks = self.tasks.lock().await;
        tasks.retain(|t| !t.is_finished());
        tasks.push(handle);
        true
    }

    /// Ensure every code element in the list (group children included).
    pub async fn ensure_all(&self, elements: &[Element]) -> usize {
        let mut codes = Vec::new();
        for el in elements {
            el.walk(&mut |e| {
                if e.is_symbolic_code() {
                    codes.push(e.clone());
                }
            });
        }
        let mut scheduled = 0;
        for el in &codes {
            if self.ensure(el).await {
                scheduled += 1;
            }
        }
        scheduled
    }

    pub async fn status(&self, id: &ElementId) -> Option<CodeStatus> {
        self.entries.read().await.get(id).map(|e| e.status.clone())
    }

    /// Drop the entry for a removed element. In-flight work is discarded.
    pub async fn forget(&self, id: &ElementId) {
        self.entries.write().await.remove(id);
    }

    /// Drop entries whose element is no longer present.
    pub async fn retain(&self, live: &HashSet<ElementId>) {
        let mut entries = self.entries.write().await;
        let before = entries.len();
        entries.retain(|id, _| live.contains(id));
        let dropped = before - entries.len();
        if dropped > 0 {
            tracing::debug!("code cache: dropped {} stale entries", dropped);
        }
    }

    /// Forget everything (canvas resize, template load).
    pub async fn invalidate_all(&self) {
        let mut entries = self.entries.write().await;
        if !entries.is_empty() {
            tracing::debug!("code cache: invalidating {} entries", entries.len());
        }
        entries.clear();
    }

    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }

    /// Wait for every scheduled generation to finish.
    pub async fn flush(&self) {
        loop {
            let pending: Vec<JoinHandle<()>> = std::mem::take(&mut *self.tasks.lock().await);
            if pending.is_empty() {
                return;
            }
            for handle in pending {
                if let Err(e) = handle.await {
                    tracing::warn!("code generation task failed: {}", e);
                }
            }
        }
    }
}

async fn is_current(entries: &Entries, id: &ElementId, ticket: u64) -> bool {
    entries
        .read()
        .await
        .get(id)
        .is_some_and(|e| e.ticket == ticket)
}

async fn generate(
    entries: Entries,
    generations: Arc<AtomicUsize>,
    config: Arc<CodeConfig>,
    id: ElementId,
    key: CodeKey,
    ticket: u64,
) {
    let debounce = config.debounce();
    if !debounce.is_zero() {
        tokio::time::sleep(debounce).await;
    }
    if !is_current(&entries, &id, ticket).await {
        tracing::debug!("code {}: ticket {} superseded before generation", id, ticket);
        return;
    }

    generations.fetch_add(1, Ordering::SeqCst);
    let raster_key = key.clone();
    let result = tokio::task::spawn_blocking(move || raster_key.rasterize(&config)).await;

    let status = match result {
        Ok(Ok(code)) => CodeStatus::Ready(Arc::new(code)),
        Ok(Err(e)) => {
            tracing::warn!("code {}: {}; using placeholder", id, e);
            CodeStatus::Placeholder(Arc::new(Placeholder::new(key.value(), e.to_string())))
        }
        Err(e) => {
            tracing::warn!("code {}: generation panicked: {}", id, e);
            CodeStatus::Placeholder(Arc::new(Placeholder::new(key.value(), e.to_string())))
        }
    };

    let mut entries = entries.write().await;
    match entries.get_mut(&id) {
        Some(entry) if entry.ticket == ticket => entry.status = status,
        _ => tracing::debug!("code {}: discarding stale result (ticket {})", id, ticket),
    }
}
