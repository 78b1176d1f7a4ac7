//! Numerical building blocks shared by profiles, spectra and the renderer.

pub mod fft;
pub mod lookup_table;

pub use fft::{good_fft_size, inverse_fft_2d};
pub use lookup_table::{LookupTable, TableError};
