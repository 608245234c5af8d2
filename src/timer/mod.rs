//! Timer data
//!
//! Pure data with no threading or runtime concerns. The tick handler owns
//! the only mutable copy; everything else sees rendered snapshots.

pub mod state;

pub use state::TimerState;
