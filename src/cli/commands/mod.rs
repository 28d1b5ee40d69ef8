mod account;
mod notes;
mod tickets;

pub use account::{cmd_login, cmd_passwd, cmd_register, cmd_rotate_key, cmd_whoami};
pub use notes::{cmd_notes_add, cmd_notes_list};
pub use tickets::{
    cmd_ticket_close, cmd_ticket_create, cmd_ticket_delete, cmd_ticket_list, cmd_ticket_show,
};

use anyhow::{Context, bail};

use crate::cli::Remote;
use crate::client::{ClientError, ErrorKind, HelpdeskClient, RequestState};

fn connect(remote: &Remote) -> anyhow::Result<HelpdeskClient> {
    HelpdeskClient::new(&remote.server)
        .with_context(|| format!("Cannot use server URL '{}'", remote.server))
}

fn token(remote: &Remote) -> anyhow::Result<&str> {
    remote
        .token
        .as_deref()
        .filter(|t| !t.is_empty())
        .context("No token given. Pass --token or set HELPDESK_TOKEN (see `helpdesk login`)")
}

/// Runs a finished request through [`RequestState`] and turns failures into
/// a message for the terminal.
fn settle<T>(result: Result<T, ClientError>) -> anyhow::Result<T> {
    let detail = result.as_ref().err().map(ToString::to_string);

    match RequestState::from_result(result) {
        RequestState::Loaded(value) => Ok(value),
        RequestState::Failed(kind) => {
            let detail = detail.unwrap_or_default();
            match kind {
                ErrorKind::Unauthorized => {
                    bail!("{kind}: {detail}\nLog in again with `helpdesk login`")
                }
                ErrorKind::Transport => bail!("{kind}: {detail}"),
                _ => bail!("Request {kind}: {detail}"),
            }
        }
        RequestState::Idle | RequestState::Loading => bail!("Request did not complete"),
    }
}

fn status_indicator(status: crate::domain::TicketStatus) -> &'static str {
    use crate::domain::TicketStatus;
    match status {
        TicketStatus::New => "🆕",
        TicketStatus::Open => "🟢",
        TicketStatus::Closed => "✓",
    }
}
