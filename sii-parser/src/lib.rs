//! Reader for SCS `.sii` unit files
//!
//! A unit file is a small nested key-value document:
//!
//! ```text
//! SiiNunit
//! {
//! road_look : road.look0 {
//!     road_offset: 1.5
//!     lanes_left[]: traffic_lane.road.local
//! }
//! }
//! ```
//!
//! Architecture:
//! 1. `reader` - Line-driven state machine yielding blocks lazily
//! 2. `block` - Parsed block with its ordered items
//! 3. `error` - Line-numbered grammar errors

mod block;
mod error;
mod reader;

pub use block::{SiiBlock, SiiValue, ARRAY_MARKER};
pub use error::{Result, SiiError};
pub use reader::{parse_str, SiiReader, HEADER};
