pub mod prelude;

pub mod notes;
pub mod tickets;
pub mod users;
