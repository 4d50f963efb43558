//! Wire contract tests for the fabric's envelopes
//!
//! These tests define the stable contract for the reserved channels and
//! typed envelope shapes that window transports depend on.
