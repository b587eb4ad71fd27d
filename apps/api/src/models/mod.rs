pub mod analysis;
pub mod email_log;
