mod answer;
mod constants;
mod moves;
mod scoring;
mod status;

pub mod dto;

pub use answer::*;
pub use constants::*;
pub use moves::*;
pub use scoring::*;
pub use status::*;
