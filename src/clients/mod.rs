pub mod executor_client;
