#![doc = include_str!("../README.md")]


mod config;
pub use config::{DegeneracyPolicy, NoiseModelConfig};

mod covariance;
pub use covariance::{n_offdiag, pack_symmetric, unpack_symmetric};

mod data;
pub use data::{AstTable, ColumnKind, SedGrid, NOT_RECOVERED_MAG};

mod error;
pub use error::{NoiseModelError, TableError};

mod kdtree;
pub use kdtree::{KdTree, Neighbor};

mod model_set;
pub use model_set::AstModelSet;

mod noise_model;
pub use noise_model::{AstNoiseModel, InterpolatedNoise};

mod progress;
#[cfg(feature = "progress")]
pub use progress::IndicatifProgress;
pub use progress::ProgressSink;

mod stats;
pub use stats::GroupStats;

mod vega;
pub use vega::{mag_to_flux, ReferenceFlux, VegaFluxes};

pub use ndarray;
