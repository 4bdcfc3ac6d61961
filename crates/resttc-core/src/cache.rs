// ── Caches ──
//
// Neither cache evicts. A saved query descriptor is resolved once and
// reused; an HTML fragment is stored when a specification's contents are
// fetched and is the only source later HTML/text lookups read from.

use std::collections::HashMap;

use tracing::debug;

use crate::command::{FindSavedQuery, TcCommand};
use crate::connection::Connection;
use crate::error::CoreError;
use crate::html;
use crate::model::{ItemRevisionId, ModelObject};

/// Returned by HTML/text lookups for an identifier that was never cached.
pub const HTML_UNAVAILABLE: &str = "<b>Failed to Get HTML!</b>";

// ── SavedQueryCache ──────────────────────────────────────────────────

/// Saved query descriptors by query name.
#[derive(Debug, Default)]
pub struct SavedQueryCache {
    queries: HashMap<String, ModelObject>,
}

impl SavedQueryCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// The descriptor of `name`, asking the server only on first use.
    pub async fn find(
        &mut self,
        connection: &mut Connection,
        name: &str,
    ) -> Result<ModelObject, CoreError> {
        if let Some(query) = self.queries.get(name) {
            debug!(query = name, "saved query cache hit");
            return Ok(query.clone());
        }

        let query = FindSavedQuery::new(name).send(connection).await?;
        self.queries.insert(name.to_owned(), query.clone());
        Ok(query)
    }

    pub fn get(&self, name: &str) -> Option<&ModelObject> {
        self.queries.get(name)
    }

    pub fn len(&self) -> usize {
        self.queries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queries.is_empty()
    }
}

// ── HtmlTextCache ────────────────────────────────────────────────────

/// Rewritten HTML fragments keyed by `ITEMID_REV`.
#[derive(Debug, Default)]
pub struct HtmlTextCache {
    fragments: HashMap<String, String>,
}

impl HtmlTextCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, id: &ItemRevisionId, html: String) {
        self.fragments.insert(id.to_string(), html);
    }

    pub fn get(&self, id: &ItemRevisionId) -> Option<&str> {
        self.fragments.get(&id.to_string()).map(String::as_str)
    }

    /// Cached HTML, or [`HTML_UNAVAILABLE`].
    pub fn html(&self, id: &ItemRevisionId) -> String {
        self.get(id).unwrap_or(HTML_UNAVAILABLE).to_owned()
    }

    /// Visible text of the cached HTML (or of [`HTML_UNAVAILABLE`]).
    pub fn text(&self, id: &ItemRevisionId) -> String {
        html::to_text(self.get(id).unwrap_or(HTML_UNAVAILABLE))
    }

    pub fn len(&self) -> usize {
        self.fragments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fragments.is_empty()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn miss_yields_sentinel() {
        let cache = HtmlTextCache::new();
        let id = ItemRevisionId::new("REQ-404", "A");
        assert_eq!(cache.html(&id), HTML_UNAVAILABLE);
        assert_eq!(cache.text(&id), "Failed to Get HTML!");
    }

    #[test]
    fn hit_returns_html_and_text() {
        let mut cache = HtmlTextCache::new();
        let id = ItemRevisionId::new("REQ-010", "A");
        cache.insert(&id, "<p>Brakes <b>shall</b> work.</p>".into());

        assert_eq!(cache.html(&id), "<p>Brakes <b>shall</b> work.</p>");
        assert_eq!(cache.text(&id), "Brakes shall work.");
        assert_eq!(cache.len(), 1);
    }
}
