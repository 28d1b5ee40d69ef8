//! Note command handlers

use super::{connect, settle, token};
use crate::cli::Remote;
use crate::domain::TicketId;

pub async fn cmd_notes_list(remote: &Remote, ticket_id: i32) -> anyhow::Result<()> {
    let client = connect(remote)?;
    let notes = settle(
        client
            .fetch_notes(TicketId::new(ticket_id), token(remote)?)
            .await,
    )?;

    if notes.is_empty() {
        println!("Ticket #{ticket_id} has no notes.");
        return Ok(());
    }

    println!("Notes on ticket #{ticket_id} ({} total)", notes.len());
    println!("{:-<70}", "");
    for note in notes {
        println!("#{} [{}] user {}", note.id, note.created_at, note.user_id);
        println!("  {}", note.text);
    }
    Ok(())
}

pub async fn cmd_notes_add(remote: &Remote, ticket_id: i32, text: &str) -> anyhow::Result<()> {
    let client = connect(remote)?;
    let note = settle(
        client
            .submit_note(TicketId::new(ticket_id), text, token(remote)?)
            .await,
    )?;
    println!("✓ Note #{} added to ticket #{}", note.id, note.ticket_id);
    Ok(())
}
