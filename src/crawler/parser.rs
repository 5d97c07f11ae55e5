//! HTML querying for link and title extraction
//!
//! The engine only needs three things from an HTML library: selecting elements,
//! reading an attribute, and reading an element's text. [`DomQuery`] captures that
//! capability; the `scraper` document type implements it.

use crate::crawler::page::Page;
use crate::SpiderError;
use scraper::{ElementRef, Html, Selector};
use url::Url;

/// Minimal DOM-query capability over a parsed document
pub trait DomQuery<'a> {
    /// Handle to an element borrowed from the document
    type Element: Copy;

    /// Returns every element matching `selector`, in document order
    fn select_all(&'a self, selector: &str) -> Result<Vec<Self::Element>, String>;

    /// Reads a named attribute from an element
    fn attribute(element: Self::Element, name: &str) -> Option<&'a str>;

    /// Returns the text content of an element with entities decoded
    fn text(element: Self::Element) -> String;
}

impl<'a> DomQuery<'a> for Html {
    type Element = ElementRef<'a>;

    fn select_all(&'a self, selector: &str) -> Result<Vec<ElementRef<'a>>, String> {
        let parsed = Selector::parse(selector)
            .map_err(|e| format!("invalid selector '{}': {:?}", selector, e))?;
        Ok(self.select(&parsed).collect())
    }

    fn attribute(element: ElementRef<'a>, name: &str) -> Option<&'a str> {
        element.value().attr(name)
    }

    fn text(element: ElementRef<'a>) -> String {
        element.text().collect()
    }
}

/// Default link-discovery strategy
///
/// Selects every anchor, reads its `href` and resolves it against the page URL.
/// Hrefs that are empty or fail to resolve are discarded; every other URL is returned
/// whatever its scheme, and the transport reports schemes it cannot fetch. Fragments
/// are dropped from the resolved URL. Duplicates are kept; deduplication happens in
/// the visited set.
///
/// # Example
///
/// ```
/// use spider_engine::crawler::find_outbound_links;
/// use spider_engine::Page;
/// use url::Url;
///
/// let page = Page::new(
///     Url::parse("https://example.com/docs/").unwrap(),
///     r#"<a href="intro">Intro</a><a href="/">Home</a>"#.to_string(),
/// );
/// let links = find_outbound_links(&page).unwrap();
/// assert_eq!(links[0].as_str(), "https://example.com/docs/intro");
/// assert_eq!(links[1].as_str(), "https://example.com/");
/// ```
pub fn find_outbound_links(page: &Page) -> Result<Vec<Url>, SpiderError> {
    let document = Html::parse_document(page.html());
    collect_links(&document, page)
}

/// Extracts links from any document implementing [`DomQuery`]
pub fn collect_links<'a, D>(document: &'a D, page: &Page) -> Result<Vec<Url>, SpiderError>
where
    D: DomQuery<'a>,
{
    let anchors = document
        .select_all("a")
        .map_err(|message| SpiderError::HtmlParse {
            url: page.url().to_string(),
            message,
        })?;

    let links = anchors
        .into_iter()
        .filter_map(|anchor| D::attribute(anchor, "href"))
        .filter_map(|href| resolve_link(page, href))
        .collect();

    Ok(links)
}

/// Returns the text of the first `<title>` element, or an empty string
pub fn extract_title(html: &str) -> String {
    let document = Html::parse_document(html);
    first_text(&document, "title").unwrap_or_default()
}

fn first_text<'a, D>(document: &'a D, selector: &str) -> Option<String>
where
    D: DomQuery<'a>,
{
    // Only called with constant selectors, so a selector error reads as "no element"
    let first = document.select_all(selector).ok()?.into_iter().next()?;
    Some(D::text(first))
}

fn resolve_link(page: &Page, href: &str) -> Option<Url> {
    let href = href.trim();
    if href.is_empty() {
        return None;
    }

    let mut url = page.absolute_url(href)?;
    url.set_fragment(None);
    Some(url)
}
