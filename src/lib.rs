//! adsequencer - ad playback sequencing for a shared playback surface
//!
//! The [`AdsController`] decides when content may play, when ads may play,
//! and how content is put back afterwards, driven entirely by events from
//! the host and an integration. The host supplies the playback surface
//! through the [`MediaSurface`] trait.

pub mod ads;
pub mod scenario;
pub mod surface;
pub mod utils;

pub use ads::{
    AdEvent, AdState, AdsController, AdsEvent, AdsEventHandler, EventContext, PlayerSnapshot,
};
pub use scenario::{Scenario, Step, SurfacePatch};
pub use surface::{MediaSurface, SimulatedSurface};
pub use utils::{AdsConfig, AdsError, Result};
