//! Ticket command handlers

use anyhow::Context;

use super::{connect, settle, status_indicator, token};
use crate::cli::Remote;
use crate::domain::{Product, TicketId};
use crate::models::Ticket;

fn print_ticket(ticket: &Ticket) {
    println!(
        "{} #{} [{}] {}",
        status_indicator(ticket.status),
        ticket.id,
        ticket.product,
        ticket.description
    );
    println!(
        "  Status: {} | Opened: {} | Updated: {}",
        ticket.status, ticket.created_at, ticket.updated_at
    );
}

pub async fn cmd_ticket_list(remote: &Remote) -> anyhow::Result<()> {
    let client = connect(remote)?;
    let tickets = settle(client.list_tickets(token(remote)?).await)?;

    if tickets.is_empty() {
        println!("No tickets yet.");
        println!();
        println!("File one with: helpdesk tickets create \"Smart Hub\" \"Wi-Fi drops\"");
        return Ok(());
    }

    println!("Tickets ({} total)", tickets.len());
    println!("{:-<70}", "");
    for ticket in &tickets {
        print_ticket(ticket);
    }
    println!();
    println!("Legend: 🆕 New | 🟢 Open | ✓ Closed");
    Ok(())
}

pub async fn cmd_ticket_show(remote: &Remote, id: i32) -> anyhow::Result<()> {
    let client = connect(remote)?;
    let token = token(remote)?;
    let id = TicketId::new(id);

    let ticket = settle(client.get_ticket(id, token).await)?;
    print_ticket(&ticket);

    let notes = settle(client.fetch_notes(id, token).await)?;
    println!();
    if notes.is_empty() {
        println!("No notes.");
    } else {
        println!("Notes ({}):", notes.len());
        for note in notes {
            println!("  [{}] user {}: {}", note.created_at, note.user_id, note.text);
        }
    }
    Ok(())
}

pub async fn cmd_ticket_create(
    remote: &Remote,
    product: &str,
    description: &str,
) -> anyhow::Result<()> {
    let product: Product = product.parse().with_context(|| {
        let names: Vec<&str> = Product::ALL.iter().map(Product::as_str).collect();
        format!("Product must be one of: {}", names.join(", "))
    })?;

    let client = connect(remote)?;
    let ticket = settle(
        client
            .create_ticket(product, description, token(remote)?)
            .await,
    )?;

    println!("✓ Ticket #{} created", ticket.id);
    print_ticket(&ticket);
    Ok(())
}

pub async fn cmd_ticket_close(remote: &Remote, id: i32) -> anyhow::Result<()> {
    let client = connect(remote)?;
    let ticket = settle(client.close_ticket(TicketId::new(id), token(remote)?).await)?;
    println!("✓ Ticket #{} closed", ticket.id);
    Ok(())
}

pub async fn cmd_ticket_delete(remote: &Remote, id: i32) -> anyhow::Result<()> {
    let client = connect(remote)?;
    settle(client.delete_ticket(TicketId::new(id), token(remote)?).await)?;
    println!("✓ Ticket #{id} deleted");
    Ok(())
}
