//! Integration tests for the opinion pages.
//!
//! Drives the full router against a deterministic mock archive and the
//! bundled demo data files, verifying the archive-first / demo-fallback
//! behavior end to end.

mod fallback;
mod mock_archive;
