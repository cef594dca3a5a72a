pub mod percentile;
pub mod reflect;
pub mod resize;

pub use percentile::percentile;
pub use reflect::pad_to_square;
pub use resize::resample;
