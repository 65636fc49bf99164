//! Integration tests for marga-nav using the chakra-io simulated robot
//!
//! The simulated robot drives on a rendered street grid; the navigator only
//! sees it through overhead frames, exactly as with the real camera.
//!
//! ```bash
//! cargo test -p marga-nav --test integration -- --nocapture
//! ```

mod harness;
mod scenarios;

pub use harness::{GRID_NODES, StreetWorld, drifting_robot};
