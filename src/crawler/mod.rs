//! Crawler module for recursive page fetching and processing
//!
//! This module contains the core crawling logic, including:
//! - The transport collaborator and its `reqwest` implementation
//! - Two-pass charset resolution of response bodies
//! - HTML querying for links and titles
//! - The recursive, concurrent traversal engine

mod encoding;
mod fetcher;
mod page;
mod parser;
mod spider;

pub use encoding::{decode, find_encoding};
pub use fetcher::{build_http_client, FetchResponse, ReqwestTransport, Transport};
pub use page::Page;
pub use parser::{collect_links, extract_title, find_outbound_links, DomQuery};
pub use spider::{ErrorHandler, LinkFinder, PageHandler, Spider, Traversal};
