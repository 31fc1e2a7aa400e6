pub mod member;
pub mod messages;
pub mod execution;
pub mod health;
pub mod diagnostics;
pub mod error;

pub use member::*;
pub use messages::*;
pub use execution::*;
pub use health::*;
pub use diagnostics::*;
pub use error::*;
