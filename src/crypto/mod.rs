pub mod envelope;
pub mod field;
pub mod password;
