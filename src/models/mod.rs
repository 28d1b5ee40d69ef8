pub mod note;
pub mod ticket;
pub mod user;

pub use note::{Note, NoteIntent, NoteWrite};
pub use ticket::{NewTicket, StatusWrite, Ticket, TicketChanges};
pub use user::{NewUser, User, UserCredentials};
