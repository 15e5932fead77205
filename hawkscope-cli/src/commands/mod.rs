pub mod attach;
pub mod bootstrap;
pub mod common;
pub mod detect;
pub mod plan;
pub mod probe;
