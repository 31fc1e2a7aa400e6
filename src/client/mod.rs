pub mod replica;
pub mod session_client;

pub use replica::WorkspaceReplica;
pub use session_client::{ClientError, SessionClient};
