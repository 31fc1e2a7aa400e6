pub mod health;
pub mod diagnostics;
pub mod run_code;

pub use health::*;
pub use diagnostics::*;
pub use run_code::*;
