//! Fetched page value
use crate::crawler::parser::extract_title;
use std::fmt;
use std::sync::OnceLock;
use url::Url;

/// A successfully fetched and decoded HTML document
///
/// Pages are immutable once constructed. The title is derived lazily from the HTML
/// the first time it is requested.
#[derive(Debug, Clone)]
pub struct Page {
    url: Url,
    html: String,
    title: OnceLock<String>,
}

impl Page {
    /// Creates a page for `html` fetched from `url`
    pub fn new(url: Url, html: String) -> Self {
        Self {
            url,
            html,
            title: OnceLock::new(),
        }
    }

    /// The address the page was fetched from
    pub fn url(&self) -> &Url {
        &self.url
    }

    /// The decoded HTML content
    pub fn html(&self) -> &str {
        &self.html
    }

    /// The text of the first `<title>` element, entity-decoded, or an empty string
    pub fn title(&self) -> &str {
        self.title.get_or_init(|| extract_title(&self.html))
    }

    /// Resolves `link` against the page URL
    ///
    /// Returns `None` if the link cannot form an absolute URL.
    pub fn absolute_url(&self, link: &str) -> Option<Url> {
        self.url.join(link).ok()
    }

    /// Consumes the page and returns its HTML
    pub fn into_html(self) -> String {
        self.html
    }
}

impl fmt::Display for Page {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.html)
    }
}
