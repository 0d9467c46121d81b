//! Command grammar shared by one-shot invocations and the interactive shell.

use clap::Subcommand;
use std::path::PathBuf;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader, Lines, Stdin};

use crate::app::App;

pub mod caps;
pub mod data;
pub mod roster;
pub mod score;
pub mod shell;

pub type CmdResult = Result<(), Box<dyn std::error::Error>>;

#[derive(Subcommand, Debug, Clone, PartialEq)]
pub enum Command {
    /// Score a hand-entered breakdown: a=.. b=.. c=.. d=..
    ///
    /// The result is remembered until the process exits, so `recent` and
    /// `assign` without --percent can use it inside `scorecap shell`.
    Calculate {
        #[arg(required = true)]
        values: Vec<String>,
    },

    /// Show your last calculated result (inside `scorecap shell` only)
    Recent,

    /// Show how a percentage would be split, without storing anything
    Preview {
        #[arg(allow_negative_numbers = true)]
        percent: f64,
        /// Optional overrides such as a=0.2 c=0.5
        overrides: Vec<String>,
    },

    /// Store a score. Without --percent, stores your last calculated result
    /// from the same `scorecap shell` session
    Assign {
        player: String,
        #[arg(short, long, allow_negative_numbers = true)]
        percent: Option<f64>,
        /// Optional overrides such as a=0.2 c=0.5
        overrides: Vec<String>,
    },

    /// Change one component of a stored score, e.g. b=0.75
    Adjust {
        player: String,
        change: Vec<String>,
    },

    /// Revert a player's last assignment made in this `scorecap shell` session
    Undo { player: String },

    /// Show a player's stored breakdown
    View { player: String },

    /// Players ranked by score
    Top {
        #[arg(default_value_t = 1)]
        page: usize,
    },

    /// Players in alphabetical order
    List {
        #[arg(default_value_t = 1)]
        page: usize,
    },

    /// Attach a comment to a player
    Note {
        player: String,
        #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
        message: Vec<String>,
    },

    /// Remove a player's comment
    ClearNote { player: String },

    /// Move a player's record to a new name
    Rename { old: String, new: String },

    /// Delete a player's record
    Clear { player: String },

    /// Delete every record (asks for CONFIRM)
    Wipe {
        /// Skip the confirmation prompt
        #[arg(long)]
        yes: bool,
    },

    /// Write all records to a JSON backup
    Export { output: Option<PathBuf> },

    /// Replace all records with a JSON backup (asks for CONFIRM)
    Import {
        file: PathBuf,
        /// Skip the confirmation prompt
        #[arg(long)]
        yes: bool,
    },

    /// Show the current caps
    Caps,

    /// Change one cap, e.g. b=0.75. Stored values above it are clamped
    SetCap {
        #[arg(required = true)]
        assignment: Vec<String>,
    },

    /// Append the admin log to this file
    SetLogChannel { destination: PathBuf },
}

/// Line reader over stdin, shared by the shell and confirmation prompts.
pub fn stdin_lines() -> Lines<BufReader<Stdin>> {
    BufReader::new(tokio::io::stdin()).lines()
}

/// Run one command against the app.
pub async fn dispatch<R>(app: &mut App, command: Command, input: &mut Lines<R>) -> CmdResult
where
    R: AsyncBufRead + Unpin,
{
    match command {
        Command::Calculate { values } => score::calculate(app, &values.join(" ")),
        Command::Recent => score::recent(app),
        Command::Preview { percent, overrides } => {
            score::preview(app, percent, &overrides.join(" "))
        }
        Command::Assign {
            player,
            percent,
            overrides,
        } => score::assign(app, &player, percent, &overrides.join(" ")),
        Command::Adjust { player, change } => roster::adjust(app, &player, &change.join(" ")),
        Command::Undo { player } => roster::undo(app, &player),
        Command::View { player } => roster::view(app, &player),
        Command::Top { page } => roster::top(app, page),
        Command::List { page } => roster::list(app, page),
        Command::Note { player, message } => roster::note(app, &player, &message.join(" ")),
        Command::ClearNote { player } => roster::clear_note(app, &player),
        Command::Rename { old, new } => roster::rename(app, &old, &new),
        Command::Clear { player } => roster::clear(app, &player),
        Command::Wipe { yes } => data::wipe(app, yes, input).await,
        Command::Export { output } => data::export(app, output),
        Command::Import { file, yes } => data::import(app, &file, yes, input).await,
        Command::Caps => caps::show(app),
        Command::SetCap { assignment } => caps::set(app, &assignment.join(" ")),
        Command::SetLogChannel { destination } => data::set_log_channel(app, &destination),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use scorecap_audit::{AdminAction, AuditOutcome};
    use scorecap_config::AppConfig;
    use scorecap_core::{Component, Note};
    use scorecap_ledger::InMemoryStore;
    use std::sync::Arc;

    fn app() -> App {
        App::with_store(AppConfig::default(), Arc::new(InMemoryStore::new()))
    }

    fn input(text: &'static str) -> Lines<BufReader<&'static [u8]>> {
        BufReader::new(text.as_bytes()).lines()
    }

    async fn run(app: &mut App, command: Command) -> CmdResult {
        dispatch(app, command, &mut input("")).await
    }

    #[tokio::test]
    async fn assign_adjust_and_cap_change_flow() {
        let mut app = app();
        run(
            &mut app,
            Command::Assign {
                player: "Alice".into(),
                percent: Some(90.0),
                overrides: vec![],
            },
        )
        .await
        .unwrap();
        run(
            &mut app,
            Command::Adjust {
                player: "alice".into(),
                change: vec!["a=0.1".into()],
            },
        )
        .await
        .unwrap();
        assert_eq!(app.ledger.get("alice").unwrap().breakdown.a, 0.1);

        run(
            &mut app,
            Command::SetCap {
                assignment: vec!["c=0.5".into()],
            },
        )
        .await
        .unwrap();
        let record = app.ledger.get("alice").unwrap();
        assert_eq!(record.breakdown.c, 0.5);
        assert_eq!(record.note, Note::Revalidated);

        let actions: Vec<AdminAction> = app.audit.entries().into_iter().map(|e| e.action).collect();
        assert!(matches!(actions[0], AdminAction::Assigned { .. }));
        assert!(matches!(actions[2], AdminAction::CapChanged { clamped: 1, .. }));
    }

    #[tokio::test]
    async fn assign_without_percent_promotes_recent_result() {
        let mut app = app();
        let err = run(
            &mut app,
            Command::Assign {
                player: "bob".into(),
                percent: None,
                overrides: vec![],
            },
        )
        .await
        .unwrap_err();
        assert!(err.to_string().contains("No recent result"));

        run(
            &mut app,
            Command::Calculate {
                values: vec!["a=0.3".into(), "b=1".into(), "c=1".into(), "d=1".into()],
            },
        )
        .await
        .unwrap();
        run(
            &mut app,
            Command::Assign {
                player: "bob".into(),
                percent: None,
                overrides: vec![],
            },
        )
        .await
        .unwrap();
        let record = app.ledger.get("bob").unwrap();
        assert_eq!(record.percent, 100.0);
        assert_eq!(record.note, Note::Overridden);
    }

    #[tokio::test]
    async fn unsaved_changes_are_logged_as_failures() {
        let store = Arc::new(InMemoryStore::new());
        let mut app = App::with_store(AppConfig::default(), store.clone());
        store.set_fail_writes(true);

        let err = run(
            &mut app,
            Command::Assign {
                player: "alice".into(),
                percent: Some(50.0),
                overrides: vec![],
            },
        )
        .await
        .unwrap_err();
        assert!(err.to_string().contains("Persistence failure"));
        assert!(app.ledger.get("alice").is_some());

        let failed = app.audit.entries_by_outcome(&AuditOutcome::Failure);
        assert_eq!(failed.len(), 1);
        assert_eq!(failed[0].action, AdminAction::Assigned { percent: 50.0 });
        assert_eq!(failed[0].target, "alice");
        assert!(failed[0].details.as_deref().is_some_and(|d| d.contains("Persistence failure")));

        run(
            &mut app,
            Command::Adjust {
                player: "alice".into(),
                change: vec!["a=0.1".into()],
            },
        )
        .await
        .unwrap_err();
        let failed = app.audit.entries_by_outcome(&AuditOutcome::Failure);
        assert!(matches!(
            failed[1].action,
            AdminAction::Adjusted { component: Component::A, value, .. } if value == 0.1
        ));

        run(
            &mut app,
            Command::SetCap {
                assignment: vec!["c=0.2".into()],
            },
        )
        .await
        .unwrap_err();
        let failed = app.audit.entries_by_outcome(&AuditOutcome::Failure);
        assert!(matches!(failed[2].action, AdminAction::CapChanged { clamped: 1, .. }));
        assert_eq!(app.ledger.get("alice").unwrap().breakdown.c, 0.2);
        assert!(app.audit.entries_by_outcome(&AuditOutcome::Success).is_empty());
    }

    #[tokio::test]
    async fn rejected_input_is_not_logged() {
        let mut app = app();
        run(
            &mut app,
            Command::Clear {
                player: "ghost".into(),
            },
        )
        .await
        .unwrap_err();
        assert_eq!(app.audit.count(), 0);
    }

    #[tokio::test]
    async fn wipe_requires_confirm() {
        let mut app = app();
        for name in ["a", "b"] {
            run(
                &mut app,
                Command::Assign {
                    player: name.into(),
                    percent: Some(50.0),
                    overrides: vec![],
                },
            )
            .await
            .unwrap();
        }

        dispatch(&mut app, Command::Wipe { yes: false }, &mut input("cancel\n"))
            .await
            .unwrap();
        assert_eq!(app.ledger.len(), 2);
        let canceled = app.audit.entries_by_outcome(&AuditOutcome::Canceled);
        assert_eq!(canceled.len(), 1);

        dispatch(&mut app, Command::Wipe { yes: false }, &mut input(" Confirm \n"))
            .await
            .unwrap();
        assert!(app.ledger.is_empty());
    }

    #[tokio::test]
    async fn export_then_import_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let backup = dir.path().join("backup.json");

        let mut app = app();
        run(
            &mut app,
            Command::Assign {
                player: "carol".into(),
                percent: Some(40.0),
                overrides: vec![],
            },
        )
        .await
        .unwrap();
        run(
            &mut app,
            Command::Export {
                output: Some(backup.clone()),
            },
        )
        .await
        .unwrap();

        let mut other = self::app();
        run(
            &mut other,
            Command::Import {
                file: backup,
                yes: true,
            },
        )
        .await
        .unwrap();
        assert_eq!(other.ledger.get("carol"), app.ledger.get("carol"));
    }

    #[tokio::test]
    async fn import_rejects_non_json_extension() {
        let mut app = app();
        let err = run(
            &mut app,
            Command::Import {
                file: PathBuf::from("backup.txt"),
                yes: true,
            },
        )
        .await
        .unwrap_err();
        assert!(err.to_string().contains(".json"));
    }
}
