//! Property-based tests for dispatch resolution.
//!
//! Uses proptest to compare registry answers with a brute-force search over
//! randomly generated taxonomies.
