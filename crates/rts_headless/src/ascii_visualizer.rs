//! ASCII map renderer for terminal review.
//!
//! Draws a [`WorldSnapshot`] one character per tile. Player entities are
//! uppercase, opponent entities lowercase; buildings fill their footprint.

use std::collections::BTreeMap;
use std::fmt::Write as _;

use rts_core::factions::FactionId;
use rts_core::snapshot::{EntitySnapshot, WorldSnapshot};

/// ASCII rendering configuration.
#[derive(Debug, Clone)]
pub struct AsciiConfig {
    /// Show the symbol legend and entity counts.
    pub show_legend: bool,
    /// Use colored output (ANSI).
    pub use_color: bool,
    /// Mark units below this share of max hp with the damaged color.
    pub damaged_threshold: f32,
}

impl Default for AsciiConfig {
    fn default() -> Self {
        Self {
            show_legend: true,
            use_color: true,
            damaged_threshold: 0.5,
        }
    }
}

/// ANSI color codes.
mod colors {
    pub const RESET: &str = "\x1b[0m";
    pub const BOLD: &str = "\x1b[1m";
    pub const BLUE: &str = "\x1b[34m";
    pub const RED: &str = "\x1b[31m";
    pub const YELLOW: &str = "\x1b[33m";
    pub const GRAY: &str = "\x1b[90m";
}

/// Character representation for an entity kind.
fn entity_char(kind: &str, owner: FactionId) -> char {
    let base = match kind {
        "Worker" => 'W',
        "Melee" => 'M',
        "Ranged" => 'R',
        "CommandCenter" => 'C',
        "Barracks" => 'B',
        _ => '?',
    };
    match owner {
        FactionId::Player => base,
        FactionId::Opponent => base.to_ascii_lowercase(),
    }
}

fn faction_color(owner: FactionId) -> &'static str {
    match owner {
        FactionId::Player => colors::BLUE,
        FactionId::Opponent => colors::RED,
    }
}

fn is_building(entity: &EntitySnapshot) -> bool {
    matches!(entity.kind.as_str(), "CommandCenter" | "Barracks")
}

/// Render a snapshot as ASCII art.
pub fn render_ascii(snapshot: &WorldSnapshot, config: &AsciiConfig) -> String {
    let width = snapshot.width.max(0) as usize;
    let height = snapshot.height.max(0) as usize;

    // (char, color) per cell, terrain first
    let mut grid: Vec<Vec<(char, &'static str)>> = snapshot
        .tiles
        .iter()
        .map(|row| {
            row.chars()
                .map(|c| match c {
                    '$' => ('$', colors::YELLOW),
                    '.' => ('.', colors::GRAY),
                    other => (other, ""),
                })
                .collect()
        })
        .collect();

    let mut counts: BTreeMap<(FactionId, String), usize> = BTreeMap::new();

    // Buildings first so units standing next to them stay visible
    let (buildings, units): (Vec<_>, Vec<_>) =
        snapshot.entities.iter().partition(|e| is_building(e));
    for entity in buildings.iter().chain(units.iter()) {
        *counts
            .entry((entity.owner, entity.kind.clone()))
            .or_default() += 1;

        let ch = entity_char(&entity.kind, entity.owner);
        let damaged = entity.max_hp > 0
            && (entity.hp as f32 / entity.max_hp as f32) < config.damaged_threshold;
        let color = if damaged {
            colors::YELLOW
        } else {
            faction_color(entity.owner)
        };

        for dy in 0..entity.size {
            for dx in 0..entity.size {
                let (x, y) = (entity.pos.x + dx, entity.pos.y + dy);
                if x < 0 || y < 0 {
                    continue;
                }
                if let Some(cell) = grid
                    .get_mut(y as usize)
                    .and_then(|row| row.get_mut(x as usize))
                {
                    *cell = (ch, color);
                }
            }
        }
    }

    let (bold, reset) = if config.use_color {
        (colors::BOLD, colors::RESET)
    } else {
        ("", "")
    };

    let mut output = String::new();
    let _ = writeln!(
        output,
        "{bold}╔══ Tick: {} │ Gold: {} / {} ══╗{reset}",
        snapshot.tick, snapshot.gold.player, snapshot.gold.opponent
    );

    output.push('╔');
    output.push_str(&"═".repeat(width));
    output.push_str("╗\n");

    for row in grid.iter().take(height) {
        output.push('║');
        for (ch, color) in row {
            if config.use_color && !color.is_empty() {
                output.push_str(color);
                output.push(*ch);
                output.push_str(colors::RESET);
            } else {
                output.push(*ch);
            }
        }
        output.push_str("║\n");
    }

    output.push('╚');
    output.push_str(&"═".repeat(width));
    output.push_str("╝\n");

    if config.show_legend {
        output.push_str("C/c=CommandCenter B/b=Barracks W/w=Worker M/m=Melee R/r=Ranged $=Gold #=Blocked\n");
        output.push_str("(UPPER=Player lower=Opponent)\n");
        for faction in FactionId::ALL {
            let parts: Vec<String> = counts
                .iter()
                .filter(|((owner, _), _)| *owner == faction)
                .map(|((_, kind), n)| format!("{kind}:{n}"))
                .collect();
            let _ = writeln!(output, "{faction}: {}", parts.join(" "));
        }
    }

    output
}
