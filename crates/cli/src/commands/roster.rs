//! Per-player commands: adjust, undo, view, listings, comments, rename, clear.

use scorecap_audit::{AdminAction, AuditOutcome};
use scorecap_core::{COMMENT_MAX_CHARS, LedgerError, Note, OverrideMode, parse_overrides};

use super::CmdResult;
use crate::app::App;
use crate::display::{compact_breakdown, paginate, record_card, title_case};

pub fn adjust(app: &mut App, player: &str, text: &str) -> CmdResult {
    let caps = app.caps();
    if app.ledger.get(player).is_none() {
        return Err(LedgerError::NotFound(player.to_string()).into());
    }
    let overrides = parse_overrides(text, &caps, OverrideMode::Partial)?;
    let change = app
        .ledger
        .adjust(player, &overrides, &caps)
        .inspect_err(|e| {
            let Some((&component, _)) = overrides.iter().next() else {
                return;
            };
            if let Some(record) = app.ledger.get(player) {
                let action = AdminAction::Adjusted {
                    component,
                    value: record.breakdown.get(component),
                    percent: record.percent,
                };
                app.record_unsaved(action, player, e);
            }
        })?;

    println!(
        "🔧 Updated {player}'s {} to {}. New score: {:.2}%.",
        change.component, change.new_value, change.percent
    );
    app.record(
        AdminAction::Adjusted {
            component: change.component,
            value: change.new_value,
            percent: change.percent,
        },
        player,
    );
    Ok(())
}

pub fn undo(app: &mut App, player: &str) -> CmdResult {
    let restored = app
        .ledger
        .undo(player)
        .inspect_err(|e| app.record_unsaved(AdminAction::Undone, player, e))?;
    println!(
        "↩️  Reverted last assignment for {player} ({:.2}%).",
        restored.percent
    );
    app.record(AdminAction::Undone, player);
    Ok(())
}

pub fn view(app: &App, player: &str) -> CmdResult {
    let record = app
        .ledger
        .get(player)
        .ok_or_else(|| LedgerError::NotFound(player.to_string()))?;
    for line in record_card(player, record, &app.caps()) {
        println!("{line}");
    }
    Ok(())
}

pub fn top(app: &App, page: usize) -> CmdResult {
    if app.ledger.is_empty() {
        println!("📭 No player data available.");
        return Ok(());
    }

    let ranked = app.ledger.ranked();
    let page = paginate(&ranked, page, app.config.shell.page_size);
    println!("🏆 Top Players");
    for (i, (name, record)) in page.items.iter().enumerate() {
        println!(
            "{}. {} ({:.2}%)",
            page.offset + i + 1,
            title_case(name),
            record.percent
        );
        println!("   {}", compact_breakdown(&record.breakdown));
        match record.note {
            Note::Overridden => println!("   📌 Overridden"),
            Note::Approx => println!("   🔧 Approximated"),
            Note::Revalidated => println!("   🩹 Revalidated"),
        }
        if let Some(comment) = &record.comment {
            println!("   💬 {comment}");
        }
    }
    println!("{}", page.footer());
    Ok(())
}

pub fn list(app: &App, page: usize) -> CmdResult {
    if app.ledger.is_empty() {
        println!("📭 No players found.");
        return Ok(());
    }

    let names: Vec<&String> = app.ledger.entries().map(|(name, _)| name).collect();
    let page = paginate(&names, page, app.config.shell.page_size);
    println!("🧾 Player List");
    for (i, name) in page.items.iter().enumerate() {
        println!("{}. {}", page.offset + i + 1, title_case(name));
    }
    println!("{}", page.footer());
    Ok(())
}

pub fn note(app: &mut App, player: &str, text: &str) -> CmdResult {
    let update = app.ledger.set_comment(player, text).inspect_err(|e| {
        let truncated = text.trim().chars().count() > COMMENT_MAX_CHARS;
        app.record_unsaved(AdminAction::CommentSet { truncated }, player, e);
    })?;
    if update.truncated {
        println!("⚠️  Note was too long. Truncated to {COMMENT_MAX_CHARS} characters.");
    }
    println!("📝 Note added to {player}: “{}”", update.comment);
    app.audit.log(
        app.operator(),
        AdminAction::CommentSet {
            truncated: update.truncated,
        },
        player,
        AuditOutcome::Success,
        Some(update.comment),
    );
    Ok(())
}

pub fn clear_note(app: &mut App, player: &str) -> CmdResult {
    let cleared = app
        .ledger
        .clear_comment(player)
        .inspect_err(|e| app.record_unsaved(AdminAction::CommentCleared, player, e))?;
    if !cleared {
        println!("ℹ️  {player} has no note to clear.");
        return Ok(());
    }
    println!("🧽 Cleared note for {player}.");
    app.record(AdminAction::CommentCleared, player);
    Ok(())
}

pub fn rename(app: &mut App, old: &str, new: &str) -> CmdResult {
    let action = AdminAction::Renamed {
        to: new.to_string(),
    };
    app.ledger
        .rename(old, new)
        .inspect_err(|e| app.record_unsaved(action.clone(), old, e))?;
    println!("🔁 Renamed {old} → {new}.");
    app.record(action, old);
    Ok(())
}

pub fn clear(app: &mut App, player: &str) -> CmdResult {
    app.ledger
        .clear(player)
        .inspect_err(|e| app.record_unsaved(AdminAction::Cleared, player, e))?;
    println!("🗑️  Cleared data for {player}.");
    app.record(AdminAction::Cleared, player);
    Ok(())
}
