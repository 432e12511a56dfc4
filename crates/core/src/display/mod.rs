//! Live display management.
//!
//! Two outbound messages are edited in place while a run executes: a status
//! panel and a streaming preview. This module provides:
//! - [`transport`]: the seam to the external chat surface
//! - [`throttle`]: adaptive per-slot re-render throttling
//! - [`panel`]: panel/preview content rendering

pub mod panel;
pub mod throttle;
pub mod transport;

pub use panel::{render_panel, PreviewBuffer};
pub use throttle::DisplayThrottler;
pub use transport::{ChatTransport, TransportError};
