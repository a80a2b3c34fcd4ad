mod config;
mod scale_factor;

pub use config::ProtocolParams;
pub use scale_factor::{mul_div_floor, saturating_u64, ScaleFactor};
