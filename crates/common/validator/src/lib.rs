pub mod deposit;
pub mod deposit_set;
pub mod registerable;
pub mod voluntary_exit;
