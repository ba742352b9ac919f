pub mod comment;
pub mod user;
