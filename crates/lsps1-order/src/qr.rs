//! QR capability abstraction with graceful degradation.
//!
//! The host may already have a QR backend, may be able to load one
//! asynchronously, or may have none at all. All three cases resolve to a
//! renderable surface: while a backend is unresolved or failed to load, the
//! deterministic text placeholder still carries enough of the payload for
//! the copy action to remain useful.

use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::OnceCell;

use crate::error::Result;

/// Characters of the payload preserved in the text placeholder.
const PLACEHOLDER_PREVIEW_LEN: usize = 20;

/// A rendered QR block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QrSurface {
    /// Produced by a native backend; the payload is backend-defined markup.
    Image(String),
    /// Text fallback shown while no backend is available.
    Placeholder(String),
}

/// A QR rendering backend.
pub trait QrRenderer: Send + Sync {
    fn render(&self, text: &str) -> Result<QrSurface>;
}

/// Loads a QR backend asynchronously, e.g. from a host resource.
#[async_trait]
pub trait QrProvider: Send + Sync {
    async fn load(&self) -> Result<Arc<dyn QrRenderer>>;
}

/// One-shot resolution of an optional QR backend, with a cached outcome.
///
/// The provider is consulted at most once; a failed load is cached as
/// "unavailable" and never retried. Rendering never fails and never blocks
/// on anything but the single resolution step.
pub struct QrCapability {
    renderer: OnceCell<Option<Arc<dyn QrRenderer>>>,
    provider: Option<Arc<dyn QrProvider>>,
}

impl QrCapability {
    /// A backend is already at hand; no resolution step needed.
    pub fn with_renderer(renderer: Arc<dyn QrRenderer>) -> Self {
        Self {
            renderer: OnceCell::new_with(Some(Some(renderer))),
            provider: None,
        }
    }

    /// Resolve the backend lazily from `provider` on first render.
    pub fn with_provider(provider: Arc<dyn QrProvider>) -> Self {
        Self {
            renderer: OnceCell::new(),
            provider: Some(provider),
        }
    }

    /// No backend and no way to load one; always renders the placeholder.
    pub fn unavailable() -> Self {
        Self {
            renderer: OnceCell::new_with(Some(None)),
            provider: None,
        }
    }

    /// Whether a native backend has been resolved.
    pub fn available(&self) -> bool {
        matches!(self.renderer.get(), Some(Some(_)))
    }

    /// Render `text`, degrading to the text placeholder when no backend is
    /// available or the backend itself errors.
    pub async fn render(&self, text: &str) -> QrSurface {
        match self.resolve().await {
            Some(renderer) => match renderer.render(text) {
                Ok(surface) => surface,
                Err(err) => {
                    tracing::warn!(error = %err, "QR backend failed to render");
                    text_placeholder(text)
                }
            },
            None => text_placeholder(text),
        }
    }

    async fn resolve(&self) -> Option<&Arc<dyn QrRenderer>> {
        let provider = self.provider.clone();
        self.renderer
            .get_or_init(|| async move {
                let provider = provider?;
                match provider.load().await {
                    Ok(renderer) => Some(renderer),
                    Err(err) => {
                        tracing::warn!(error = %err, "QR backend failed to load");
                        None
                    }
                }
            })
            .await
            .as_ref()
    }
}

/// Deterministic fallback surface carrying the truncated payload.
pub fn text_placeholder(text: &str) -> QrSurface {
    let preview: String = text.chars().take(PLACEHOLDER_PREVIEW_LEN).collect();
    QrSurface::Placeholder(format!("QR Code not available. Invoice: {preview}..."))
}

/// Mount target for the QR block, exclusively owned by the presenter that
/// created it.
#[derive(Debug, Default)]
pub struct QrSlot {
    surface: Option<QrSurface>,
}

impl QrSlot {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_mounted(&self) -> bool {
        self.surface.is_some()
    }

    /// Mount a surface. A no-op returning `false` when the slot is already
    /// occupied, so re-renders never duplicate content.
    pub fn mount(&mut self, surface: QrSurface) -> bool {
        if self.surface.is_some() {
            return false;
        }
        self.surface = Some(surface);
        true
    }

    pub fn surface(&self) -> Option<&QrSurface> {
        self.surface.as_ref()
    }

    /// Tear down the mounted content, e.g. when the order leaves the
    /// awaiting-payment state.
    pub fn unmount(&mut self) {
        self.surface = None;
    }
}
