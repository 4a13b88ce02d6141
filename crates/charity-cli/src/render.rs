//! Text rendering of the catalog and the session state.

use charity::{Charity, DonationRecord, SessionState, WorkflowStatus};
use comfy_table::{Cell, Color, ContentArrangement, Table, presets::ASCII_MARKDOWN};
use std::fmt::Write;
use yansi::Paint;

/// The catalog as a table.
pub fn charities(charities: &[Charity]) -> Table {
    let mut table = Table::new();
    table.load_preset(ASCII_MARKDOWN);
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(["ID", "Charity", "Description", "Trust"]);
    for charity in charities {
        let trust = Cell::new(charity.trust_label()).fg(if charity.trustworthy {
            Color::Green
        } else {
            Color::Red
        });
        table.add_row(vec![
            Cell::new(charity.id),
            Cell::new(charity.name),
            Cell::new(charity.description),
            trust,
        ]);
    }
    table
}

/// The donation form: account, selection, amount and last status.
pub fn session(state: &SessionState) -> String {
    let mut out = String::new();
    let account = match state.account {
        Some(account) => account.to_string(),
        None if state.loading => "Connecting...".to_string(),
        None => "Not connected".to_string(),
    };
    let _ = writeln!(out, "Connected Account: {account}");

    match &state.selected_charity {
        Some(charity) => {
            let _ = writeln!(out, "Selected Charity: {charity}");
        }
        None => out.push_str("Selected Charity: none\n"),
    }
    if !state.donation_amount.is_empty() {
        let _ = writeln!(out, "Amount: {} ETH", state.donation_amount);
    }

    match &state.status {
        WorkflowStatus::Idle => {}
        WorkflowStatus::Pending => out.push_str("Status: Processing...\n"),
        WorkflowStatus::Success(msg) => {
            let _ = writeln!(out, "Status: {}", msg.green());
        }
        WorkflowStatus::Failure(msg) => {
            let _ = writeln!(out, "Status: {}", msg.red());
        }
    }
    out
}

/// The session's donation history, oldest first.
pub fn history(history: &[DonationRecord]) -> String {
    if history.is_empty() {
        return "No donations made yet.\n".to_string();
    }
    history.iter().map(|record| format!("- {record}\n")).collect()
}
