//! End-to-end harvest tests against in-memory page snapshots

mod crawl_tests;
