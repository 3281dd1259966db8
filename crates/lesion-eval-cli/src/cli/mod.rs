pub mod args;
pub mod pipeline;
