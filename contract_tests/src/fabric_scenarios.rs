//! End-to-end delivery and correlation guarantees
//!
//! Each test pins a behavior callers are entitled to rely on: session ID
//! allocation, at-most-once replies, cancellation, exclude-self filtering,
//! snapshot-stable broadcasts, and panel-kind envelope shapes.
