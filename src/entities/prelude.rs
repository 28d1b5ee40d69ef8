pub use super::notes::Entity as Notes;
pub use super::tickets::Entity as Tickets;
pub use super::users::Entity as Users;
