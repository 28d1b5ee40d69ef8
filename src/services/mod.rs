pub mod guard;
pub mod validation;

pub mod auth_service;
pub mod auth_service_impl;
pub use auth_service::{
    AuthError, AuthService, AuthenticatedUser, ChangePasswordRequest, LoginRequest, RegisterRequest,
};
pub use auth_service_impl::DefaultAuthService;

pub mod ticket_service;
pub mod ticket_service_impl;
pub use ticket_service::{CreateTicketRequest, TicketError, TicketService, UpdateTicketRequest};
pub use ticket_service_impl::DefaultTicketService;

pub mod note_service;
pub mod note_service_impl;
pub use note_service::{NoteError, NoteService};
pub use note_service_impl::DefaultNoteService;
