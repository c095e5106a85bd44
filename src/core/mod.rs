pub mod error;
pub mod logging;
pub mod models;

// Request plumbing: transport, payload shaping
pub mod transport;
pub mod transform;

// Request timing and bookkeeping
pub mod cache;
pub mod debounce;
pub mod lifecycle;

// AI-augmented search providers
pub mod ai;

// Top-level controller composing the above
pub mod orchestrator;
