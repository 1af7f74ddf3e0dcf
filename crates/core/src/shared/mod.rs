pub mod constants;
pub mod emotion;
pub mod encode;
pub mod frame;
pub mod prediction;
pub mod region;
