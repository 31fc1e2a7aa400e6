pub mod connctx;
pub mod gateway;
pub mod hub;
pub mod registry;
pub mod router;
