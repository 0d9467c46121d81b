//! `caps` and `set-cap`.

use scorecap_audit::AdminAction;
use scorecap_core::{Component, parse_cap_assignment, round_places};

use super::CmdResult;
use crate::app::App;
use crate::display::caps_line;

/// Clamped players listed individually before the rest are summarized.
const CLAMP_PREVIEW: usize = 10;

pub fn show(app: &App) -> CmdResult {
    let caps = app.caps();
    println!("📏 Current caps");
    println!("   {}", caps_line(&caps));
    println!("   Total weight: {}", caps.total_weight());
    Ok(())
}

pub fn set(app: &mut App, text: &str) -> CmdResult {
    let (key, value) = parse_cap_assignment(text)?;
    let component: Component = key.parse()?;
    let old_cap = app.caps().get(component);
    let new_cap = round_places(value, 3);
    let over = app
        .ledger
        .entries()
        .filter(|(_, record)| record.breakdown.get(component) > new_cap)
        .count();

    let update = app
        .caps
        .set_component(component, value, &mut app.ledger)
        .inspect_err(|e| {
            let action = AdminAction::CapChanged {
                component,
                old_cap,
                new_cap,
                clamped: if new_cap < old_cap { over } else { 0 },
            };
            app.record_unsaved(action, component.key(), e);
        })?;
    let change = update.change;

    println!("✅ Cap for {} set to {}.", change.component, change.new_cap);
    if !update.clamped.is_empty() {
        println!(
            "⚠️  {} stored values exceeded the new cap and were clamped:",
            update.clamped.len()
        );
        for clamp in update.clamped.iter().take(CLAMP_PREVIEW) {
            println!(
                "   🔧 {}: {} capped from {} → {}",
                clamp.entity, change.component, clamp.old_value, clamp.new_value
            );
        }
        if update.clamped.len() > CLAMP_PREVIEW {
            println!("   ...and {} more.", update.clamped.len() - CLAMP_PREVIEW);
        }
    }

    app.record(
        AdminAction::CapChanged {
            component: change.component,
            old_cap: change.old_cap,
            new_cap: change.new_cap,
            clamped: update.clamped.len(),
        },
        change.component.key(),
    );
    Ok(())
}
