pub mod analysis;
pub mod annotate;
pub mod broadcast;
pub mod capture;
pub mod pipeline;
pub mod shared;
pub mod stats;
