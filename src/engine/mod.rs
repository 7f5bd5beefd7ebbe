//! Execution engine: cascade driver, clipper, cancellation and progress

pub mod cancel;
pub mod cascade;
pub mod clipper;
pub mod progress;

pub use cancel::CancellationToken;
pub use cascade::SelectorCascade;
pub use clipper::FragmentClipper;
pub use progress::{ProgressEvent, ProgressPhase, ProgressSink};
