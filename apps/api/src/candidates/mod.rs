pub mod handlers;
pub mod query;
pub mod repo;
pub mod search;
pub mod similar;
pub mod stats;
