pub mod note;
pub mod ticket;
pub mod user;
