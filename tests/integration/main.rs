//! Integration tests for Spider-Engine

mod crawl_tests;
