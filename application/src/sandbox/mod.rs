pub mod isolation;
pub mod policy;
