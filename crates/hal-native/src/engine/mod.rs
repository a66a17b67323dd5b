//! Simulation engines shared by the native devices.
//!
//! Each engine is plain data with no knowledge of lifecycle, callbacks or the
//! clock; devices wrap them and decide when they run.

pub mod countdown;
pub mod edge;
pub mod pending;
pub mod ring;

pub use countdown::{first_time_of_day_match, ModuloCounter, Overflows, Threshold};
pub use edge::EdgeDetector;
pub use pending::PendingStore;
pub use ring::RingBuffer;
