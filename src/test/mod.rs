
pub use widgets::*;
