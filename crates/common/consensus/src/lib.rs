pub mod constants;
pub mod deposit_data;
pub mod deposit_message;
pub mod fork;
pub mod fork_data;
pub mod misc;
pub mod signing_data;
pub mod voluntary_exit;
