//! The live-page contract consumed by the extraction engine.

use async_trait::async_trait;
use serde_json::Value;

use crate::error::PageError;
use crate::query::Query;

/// Opaque reference to one live DOM node.
///
/// Valid only for the lifetime of the current render: the host application
/// re-renders at will, so a handle may go stale between any two operations.
/// The engine never caches handles across a convergence iteration; it
/// re-queries each pass and re-resolves on [`PageError::Stale`].
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ElementHandle(u64);

impl ElementHandle {
    /// Mint a handle. Drivers own id allocation.
    pub fn new(id: u64) -> Self {
        Self(id)
    }

    pub fn id(&self) -> u64 {
        self.0
    }
}

/// Where a scroll operation should land.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScrollTarget {
    /// Bottom of the main document.
    PageBottom,
    /// Bring one element into the viewport.
    IntoView(ElementHandle),
    /// Bottom of a nested scrollable container.
    ContainerBottom(ElementHandle),
}

/// A live page session capable of querying and mutating the rendered
/// document.
///
/// Implementations wrap a browser-automation transport. All operations are
/// bounded by driver-side timeouts; there is no unbounded wait behind any
/// of these calls. The engine issues them strictly sequentially; drivers do
/// not need to tolerate concurrent calls.
#[async_trait]
pub trait PageHandle: Send + Sync {
    /// All elements matching one strategy, optionally scoped to the subtree
    /// under `scope`. Order follows document order.
    async fn query(
        &self,
        query: &Query,
        scope: Option<&ElementHandle>,
    ) -> Result<Vec<ElementHandle>, PageError>;

    /// Evaluate a script in the page context and return its value.
    async fn evaluate(&self, script: &str, args: &[Value]) -> Result<Value, PageError>;

    /// Evaluate a script with the element bound as its subject
    /// (CDP `callFunctionOn` style).
    async fn evaluate_on(&self, handle: &ElementHandle, script: &str)
        -> Result<Value, PageError>;

    /// Immediate text content of the element.
    async fn text(&self, handle: &ElementHandle) -> Result<String, PageError>;

    /// Attribute value, `None` when absent.
    async fn attribute(
        &self,
        handle: &ElementHandle,
        name: &str,
    ) -> Result<Option<String>, PageError>;

    /// Whether the element currently occupies visible layout space.
    async fn is_visible(&self, handle: &ElementHandle) -> Result<bool, PageError>;

    /// Whether the element would receive pointer input.
    async fn is_interactable(&self, handle: &ElementHandle) -> Result<bool, PageError>;

    /// Click the element.
    async fn click(&self, handle: &ElementHandle) -> Result<(), PageError>;

    /// Type text into the element.
    async fn type_text(&self, handle: &ElementHandle, text: &str) -> Result<(), PageError>;

    /// Dispatch a synthetic key press to the focused element
    /// (e.g. `"PageDown"`, `"End"`).
    async fn press_key(&self, key: &str) -> Result<(), PageError>;

    /// Scroll the document or a container.
    async fn scroll_to(&self, target: ScrollTarget) -> Result<(), PageError>;

    /// Nearest ancestor of `handle` matching `query`, `None` when there is
    /// none (DOM `closest` semantics).
    async fn closest(
        &self,
        handle: &ElementHandle,
        query: &Query,
    ) -> Result<Option<ElementHandle>, PageError>;

    /// Whether the document has finished its current load cycle.
    async fn ready(&self) -> Result<bool, PageError>;
}
