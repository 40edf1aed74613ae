//! Scripted in-memory browser host.
//!
//! Implements [`BrowserSurface`] over a table of scripted pages so the
//! executor can be exercised without a real browser. Suitable for automated
//! testing and CI environments.
//!
//! Pages model the timing behavior of a live, asynchronously rendering
//! document: an element's text can be scripted to become visible only from
//! the Nth query on, and a document can be scripted to vanish after a number
//! of queries (an externally triggered replacement, as a redirect would
//! cause).

use std::collections::HashMap;

use crosswave_core::{BrowserError, BrowserSurface, DocumentHandle, ElementHandle, ElementSet, Origin};
use tracing::{debug, trace};
use url::Url;

/// One scripted element: selector, text, and the query number from which the
/// text is visible.
#[derive(Debug, Clone)]
struct ScriptedElement {
    selector: String,
    text: String,
    visible_from_query: u32,
}

/// A scripted page registered under one URL.
#[derive(Debug, Clone)]
pub struct ScriptedPage {
    url: Url,
    elements: Vec<ScriptedElement>,
    unreachable: Option<String>,
    vanish_after_queries: Option<u32>,
}

impl ScriptedPage {
    /// Script a page at `url`.
    ///
    /// Panics on an invalid URL; pages are authored by tests.
    pub fn new(url: &str) -> Self {
        Self {
            url: Url::parse(url).expect("scripted page URL must parse"),
            elements: Vec::new(),
            unreachable: None,
            vanish_after_queries: None,
        }
    }

    /// Add an element whose text is visible from the first query.
    pub fn element(self, selector: &str, text: &str) -> Self {
        self.element_visible_from(selector, text, 1)
    }

    /// Add an element whose text only becomes visible from the
    /// `visible_from_query`-th query on (1-based), modeling asynchronous
    /// rendering.
    pub fn element_visible_from(mut self, selector: &str, text: &str, visible_from_query: u32) -> Self {
        self.elements.push(ScriptedElement {
            selector: selector.to_string(),
            text: text.to_string(),
            visible_from_query,
        });
        self
    }

    /// Make navigation to this page fail.
    pub fn unreachable(mut self, reason: &str) -> Self {
        self.unreachable = Some(reason.to_string());
        self
    }

    /// Replace the document out from under its handles after `queries`
    /// queries have been answered.
    pub fn vanish_after_queries(mut self, queries: u32) -> Self {
        self.vanish_after_queries = Some(queries);
        self
    }
}

struct LiveDocument {
    page_url: Url,
    queries_answered: u32,
}

/// In-memory [`BrowserSurface`] implementation over scripted pages.
pub struct HeadlessBrowser {
    pages: HashMap<Url, ScriptedPage>,
    documents: HashMap<u64, LiveDocument>,
    next_document_id: u64,
}

impl HeadlessBrowser {
    pub fn new() -> Self {
        Self {
            pages: HashMap::new(),
            documents: HashMap::new(),
            next_document_id: 1,
        }
    }

    /// Register a scripted page, replacing any previous page at its URL.
    pub fn install(&mut self, page: ScriptedPage) {
        self.pages.insert(page.url.clone(), page);
    }

    /// Builder-style [`install`](Self::install).
    pub fn with_page(mut self, page: ScriptedPage) -> Self {
        self.install(page);
        self
    }

    fn visible_elements(page: &ScriptedPage, selector: &str, queries_answered: u32) -> Vec<usize> {
        page.elements
            .iter()
            .enumerate()
            .filter(|(_, el)| el.selector == selector && queries_answered >= el.visible_from_query)
            .map(|(i, _)| i)
            .collect()
    }
}

impl Default for HeadlessBrowser {
    fn default() -> Self {
        Self::new()
    }
}

impl BrowserSurface for HeadlessBrowser {
    fn navigate(&mut self, url: &Url) -> Result<DocumentHandle, BrowserError> {
        let page = self.pages.get(url).ok_or_else(|| BrowserError::Unreachable {
            url: url.to_string(),
            reason: "no such page".to_string(),
        })?;

        if let Some(reason) = &page.unreachable {
            return Err(BrowserError::Unreachable {
                url: url.to_string(),
                reason: reason.clone(),
            });
        }

        let origin = Origin::from_url(url).map_err(|err| BrowserError::Unreachable {
            url: url.to_string(),
            reason: err.to_string(),
        })?;

        // A successful load replaces whatever document was live before.
        self.documents.clear();

        let id = self.next_document_id;
        self.next_document_id += 1;
        self.documents.insert(
            id,
            LiveDocument {
                page_url: url.clone(),
                queries_answered: 0,
            },
        );

        debug!(%url, document_id = id, "Headless navigation");
        Ok(DocumentHandle::new(id, origin))
    }

    fn query_dom(
        &mut self,
        document: &DocumentHandle,
        selector: &str,
    ) -> Result<ElementSet, BrowserError> {
        let live = self
            .documents
            .get_mut(&document.id())
            .ok_or(BrowserError::NoSuchDocument {
                document_id: document.id(),
            })?;

        live.queries_answered += 1;

        // Scripted replacement: the document vanishes once its budget of
        // queries is spent.
        let page = &self.pages[&live.page_url];
        if let Some(limit) = page.vanish_after_queries {
            if live.queries_answered > limit {
                let document_id = document.id();
                self.documents.remove(&document_id);
                return Err(BrowserError::NoSuchDocument { document_id });
            }
        }

        let indices = Self::visible_elements(page, selector, live.queries_answered);
        trace!(
            selector,
            matches = indices.len(),
            query = live.queries_answered,
            "Headless query"
        );

        Ok(ElementSet::new(
            indices
                .into_iter()
                .map(|index| ElementHandle::new(document.id(), selector, index))
                .collect(),
        ))
    }

    fn read_text(&mut self, element: &ElementHandle) -> Result<String, BrowserError> {
        let live = self
            .documents
            .get(&element.document_id())
            .ok_or(BrowserError::DetachedElement)?;

        let page = &self.pages[&live.page_url];
        let el = page
            .elements
            .get(element.index())
            .ok_or(BrowserError::DetachedElement)?;

        Ok(el.text.clone())
    }
}
