#![warn(clippy::all, clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

//! Mitral valve modelling: fit a closed opening profile through landmarks,
//! derive cross-section planes along it, capture leaflet curves on those
//! planes and stitch them into a closed triangle surface.

pub mod geom;
pub mod modeller;
pub mod scene;

pub use modeller::{ModellerError, ModellerOptions, ValveModeller};

cfg_if::cfg_if! {
    if #[cfg(feature = "debug_logs")] {
        /// Installs an `env_logger` stderr logger at `Debug` level. Safe to call more than once.
        pub fn initialize() {
            init_logger();
        }
    } else {
        /// No logger is installed without the `debug_logs` feature; `log`
        /// records go to whatever logger the host has set.
        pub fn initialize() {}
    }
}

#[cfg(feature = "debug_logs")]
fn init_logger() {
    // A second call finds a logger already installed and leaves it in place.
    let _ = env_logger::Builder::new()
        .filter_level(log::LevelFilter::Debug)
        .try_init();
}

#[macro_export]
macro_rules! debug_log {
    ($($t:tt)*) => {{
        #[cfg(feature = "debug_logs")]
        {
            ::log::debug!($($t)*);
        }
    }};
}
