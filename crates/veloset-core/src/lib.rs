pub mod align;
pub mod dataset;
pub mod errors;
pub mod filter;
pub mod persist;
pub mod pipeline;
pub mod samples;
pub mod scale;
pub mod split;
pub mod window;
