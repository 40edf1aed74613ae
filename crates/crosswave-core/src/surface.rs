//! Browser control surface.
//!
//! The executor drives a live browser through this trait; it never owns
//! rendering, networking, or the DOM. Production hosts implement it over a
//! real browser; `crosswave-headless` implements it over scripted pages for
//! tests.

use thiserror::Error;

use crate::session::DocumentHandle;
use url::Url;

/// Errors surfaced by a browser host.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BrowserError {
    #[error("target unreachable: {url}: {reason}")]
    Unreachable { url: String, reason: String },

    #[error("document {document_id} is gone (replaced or never loaded)")]
    NoSuchDocument { document_id: u64 },

    #[error("query '{selector}' failed: {reason}")]
    QueryFailed { selector: String, reason: String },

    #[error("element is no longer attached to its document")]
    DetachedElement,
}

/// An element inside a specific document.
///
/// Handles are only meaningful against the document they were queried from;
/// once that document is replaced the host reports them as detached.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ElementHandle {
    document_id: u64,
    selector: String,
    index: usize,
}

impl ElementHandle {
    pub fn new(document_id: u64, selector: impl Into<String>, index: usize) -> Self {
        Self {
            document_id,
            selector: selector.into(),
            index,
        }
    }

    pub fn document_id(&self) -> u64 {
        self.document_id
    }

    pub fn selector(&self) -> &str {
        &self.selector
    }

    pub fn index(&self) -> usize {
        self.index
    }
}

/// The result of a DOM query: zero or more element handles, in document order.
#[derive(Debug, Clone, Default)]
pub struct ElementSet {
    elements: Vec<ElementHandle>,
}

impl ElementSet {
    pub fn new(elements: Vec<ElementHandle>) -> Self {
        Self { elements }
    }

    pub fn empty() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.elements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ElementHandle> {
        self.elements.iter()
    }
}

/// Primitive operations the executor needs from a browser host.
///
/// All three operations are synchronous from the executor's point of view;
/// waiting for asynchronous rendering is the retry engine's job, not the
/// host's.
pub trait BrowserSurface {
    /// Load `url` and return a handle to the new current document.
    ///
    /// A successful navigation replaces the previous document; handles into
    /// it become stale.
    fn navigate(&mut self, url: &Url) -> Result<DocumentHandle, BrowserError>;

    /// Query the given document for elements matching `selector`.
    fn query_dom(
        &mut self,
        document: &DocumentHandle,
        selector: &str,
    ) -> Result<ElementSet, BrowserError>;

    /// Read the text content of an element.
    fn read_text(&mut self, element: &ElementHandle) -> Result<String, BrowserError>;
}
