pub mod info;
pub mod validators;
