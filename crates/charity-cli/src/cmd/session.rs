use crate::render;
use charity::{CHARITIES, CharityConfig, DonationError, DonationWorkflow, WalletEvent};
use eyre::{Result, bail};
use std::{
    io::{self, Write},
    str::FromStr,
    sync::Arc,
};
use tokio::{
    io::{AsyncBufReadExt, BufReader},
    sync::broadcast::{self, error::RecvError},
};
use yansi::Paint;

/// A line typed into the interactive session.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SessionCommand {
    List,
    Select(u64),
    Clear,
    Amount(String),
    Donate,
    Check,
    Show,
    History,
    Help,
    Quit,
}

const HELP: &[(&str, &str)] = &[
    ("list", "List the charities"),
    ("select <id>", "Select a charity"),
    ("clear", "Clear the selected charity"),
    ("amount <eth>", "Set the donation amount"),
    ("donate", "Donate the amount to the selected charity"),
    ("check", "Check whether the selected charity received a donation"),
    ("show", "Show the connected account, selection and status"),
    ("history", "Show the donations made in this session"),
    ("help", "Show this help"),
    ("quit", "Leave the session"),
];

impl FromStr for SessionCommand {
    type Err = eyre::Report;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let (cmd, arg) = s.split_once(char::is_whitespace).unwrap_or((s, ""));
        let arg = arg.trim();
        let cmd = match cmd.to_lowercase().as_str() {
            "list" | "ls" => Self::List,
            "select" => match arg.parse() {
                Ok(id) => Self::Select(id),
                Err(_) if arg.is_empty() => bail!("usage: select <id>"),
                Err(_) => bail!("invalid charity id `{arg}`"),
            },
            "clear" => Self::Clear,
            "amount" => Self::Amount(arg.to_string()),
            "donate" => Self::Donate,
            "check" | "status" => Self::Check,
            "show" => Self::Show,
            "history" => Self::History,
            "help" | "?" => Self::Help,
            "quit" | "exit" | "q" => Self::Quit,
            _ => bail!("unknown command `{cmd}`, see available commands with `help`"),
        };
        Ok(cmd)
    }
}

/// Runs the interactive session until `quit`, end of input or Ctrl-C.
///
/// Donations and status checks run in the background, wallet notifications are applied as
/// they arrive.
pub async fn run(config: &CharityConfig) -> Result<()> {
    let workflow = Arc::new(DonationWorkflow::from_config(config)?);
    let mut events = workflow.connector().subscribe();
    workflow.load().await;
    print!("{}", render::session(&workflow.session().snapshot()));
    println!("Type `help` for the list of commands.");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        prompt();
        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line? else { break };
                if line.trim().is_empty() {
                    continue;
                }
                match line.parse::<SessionCommand>() {
                    Ok(SessionCommand::Quit) => break,
                    Ok(cmd) => dispatch(&workflow, cmd),
                    Err(err) => eprintln!("{}", err.red()),
                }
            }
            Some(event) = next_event(&mut events) => {
                let reconnect = matches!(event, WalletEvent::ChainChanged(_));
                workflow.handle_event(event).await;
                println!();
                if reconnect {
                    println!("{}", "Network changed, started a new session.".yellow());
                }
                print!("{}", render::session(&workflow.session().snapshot()));
            }
            _ = tokio::signal::ctrl_c() => break,
        }
    }
    Ok(())
}

fn dispatch(workflow: &Arc<DonationWorkflow>, cmd: SessionCommand) {
    match cmd {
        SessionCommand::List => println!("{}", render::charities(CHARITIES)),
        SessionCommand::Select(id) => match workflow.select_charity(id) {
            Ok(charity) => println!("Selected {charity}"),
            Err(err) => eprintln!("{}", err.red()),
        },
        SessionCommand::Clear => workflow.clear_selection(),
        SessionCommand::Amount(amount) => workflow.set_amount(amount),
        SessionCommand::Donate => {
            let workflow = workflow.clone();
            tokio::spawn(async move {
                match workflow.donate().await {
                    Ok(record) => println!("\n{}\n{record}", "Donation successful".green()),
                    Err(err) => report(&err),
                }
                prompt();
            });
        }
        SessionCommand::Check => {
            let workflow = workflow.clone();
            tokio::spawn(async move {
                match workflow.check_status().await {
                    Ok(_) => {
                        let state = workflow.session().snapshot();
                        println!("\n{}", state.status.message().unwrap_or_default());
                    }
                    Err(err) => report(&err),
                }
                prompt();
            });
        }
        SessionCommand::Show => print!("{}", render::session(&workflow.session().snapshot())),
        SessionCommand::History => {
            print!("{}", render::history(&workflow.session().snapshot().history))
        }
        SessionCommand::Help => {
            for (usage, about) in HELP {
                println!("  {:<14} {about}", usage.cyan());
            }
        }
        SessionCommand::Quit => {}
    }
}

fn report(err: &DonationError) {
    if err.is_prompt() {
        eprintln!("\n{}", err.yellow());
    } else {
        eprintln!("\n{}", err.red());
    }
}

fn prompt() {
    print!("> ");
    let _ = io::stdout().flush();
}

/// Waits for the next wallet notification, or forever once the channel is gone.
async fn next_event(
    events: &mut Option<broadcast::Receiver<WalletEvent>>,
) -> Option<WalletEvent> {
    let Some(receiver) = events else { return std::future::pending().await };
    loop {
        match receiver.recv().await {
            Ok(event) => return Some(event),
            Err(RecvError::Lagged(skipped)) => debug!(skipped, "missed wallet notifications"),
            Err(RecvError::Closed) => {
                *events = None;
                return None;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_commands() {
        assert_eq!("list".parse::<SessionCommand>().unwrap(), SessionCommand::List);
        assert_eq!(" SELECT  7 ".parse::<SessionCommand>().unwrap(), SessionCommand::Select(7));
        assert_eq!(
            "amount 0.25".parse::<SessionCommand>().unwrap(),
            SessionCommand::Amount("0.25".to_string())
        );
        let cleared = "amount".parse::<SessionCommand>().unwrap();
        assert_eq!(cleared, SessionCommand::Amount(String::new()));
        assert_eq!("exit".parse::<SessionCommand>().unwrap(), SessionCommand::Quit);
        assert_eq!("status".parse::<SessionCommand>().unwrap(), SessionCommand::Check);
    }

    #[test]
    fn rejects_bad_commands() {
        let err = "select".parse::<SessionCommand>().unwrap_err();
        assert_eq!(err.to_string(), "usage: select <id>");
        let err = "select one".parse::<SessionCommand>().unwrap_err();
        assert_eq!(err.to_string(), "invalid charity id `one`");
        let err = "withdraw 1".parse::<SessionCommand>().unwrap_err();
        assert!(err.to_string().starts_with("unknown command `withdraw`"));
    }

    #[tokio::test]
    async fn closed_channel_yields_none() {
        let (tx, rx) = broadcast::channel(4);
        let mut events = Some(rx);
        tx.send(WalletEvent::ChainChanged(1)).unwrap();
        drop(tx);
        assert_eq!(next_event(&mut events).await, Some(WalletEvent::ChainChanged(1)));
        assert_eq!(next_event(&mut events).await, None);
        assert!(events.is_none());
    }
}
