pub mod comment;
pub mod enums;
pub mod user;
