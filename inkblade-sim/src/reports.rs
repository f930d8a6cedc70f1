//! Report writers for simulation results: console, JSON and markdown.

use std::io::Write;

use colored::Colorize;
use inkblade_game::catalog::Catalog;
use serde::Serialize;

use crate::analysis::{CadenceSummary, first_time_major_beats, summarize_cadence};
use crate::simulation::{EventTag, SimConfig, SimResult};
use crate::util::{fmt_num, fmt_pct, fmt_time};

const BURST_WINDOW_SECS: f64 = 120.0;

struct BalanceFlag {
    warn: bool,
    msg: String,
}

pub fn write_console_report(
    w: &mut dyn Write,
    catalog: &Catalog,
    config: &SimConfig,
    result: &SimResult,
) -> std::io::Result<()> {
    let hr = "─".repeat(60);
    let hr2 = "═".repeat(60);

    writeln!(w)?;
    writeln!(w, "{hr2}")?;
    writeln!(w, "  {}", "INKBLADE — PACING EVALUATION REPORT".bright_cyan().bold())?;
    writeln!(w, "{hr2}")?;
    writeln!(
        w,
        "  Strategy      : {} · {} clicks/sec",
        config.strategy, config.clicks_per_sec
    )?;
    writeln!(w, "  Duration      : {} min simulated", config.minutes)?;
    writeln!(w, "  Max prestiges : {}", config.max_prestiges)?;
    writeln!(w, "  Seed          : {:#x}", config.seed)?;
    writeln!(w)?;

    writeln!(w, "{hr}")?;
    writeln!(w, "  {}", "TIMELINE".bright_yellow().bold())?;
    writeln!(w, "{hr}")?;
    for event in &result.events {
        let time = fmt_time(event.sim_time);
        let tag = format!("[{}]", event.tag.as_str());
        let detail = event
            .detail
            .as_ref()
            .map_or(String::new(), |d| format!("  ·  {d}"));
        writeln!(w, "  {time:>8}  {tag:<10}  {}{detail}", event.label)?;
    }
    writeln!(w)?;

    write_snapshots(w, catalog, result, &hr)?;
    write_content_reached(w, catalog, result, &hr)?;
    write_pacing_analysis(w, result, &hr)?;
    write_cadence(w, catalog, result, &hr)?;
    write_balance_flags(w, catalog, config, result, &hr)?;
    write_final_summary(w, catalog, config, result, &hr)?;

    writeln!(w, "{hr2}")?;
    writeln!(w)?;
    Ok(())
}

fn write_snapshots(
    w: &mut dyn Write,
    catalog: &Catalog,
    result: &SimResult,
    hr: &str,
) -> std::io::Result<()> {
    writeln!(w, "{hr}")?;
    writeln!(w, "  {}", "INCOME SNAPSHOTS (every 5 minutes)".bright_yellow().bold())?;
    writeln!(w, "{hr}")?;
    writeln!(
        w,
        "  Time      Click/hit   Passive/s    Total/s  Idle%  Media        Artists  Phase  Prestige"
    )?;
    writeln!(w, "  {}", "─".repeat(92))?;
    for snap in &result.snapshots {
        let tier_name = catalog
            .media_tier(snap.media_tier)
            .map_or("?", |t| t.name.as_str());
        let tier_short: String = tier_name.chars().take(11).collect();
        let prestige = if snap.prestige_count > 0 {
            format!("#{}", snap.prestige_count)
        } else {
            "-".to_string()
        };
        writeln!(
            w,
            "  {:>8}  {:>9}  {:>10}  {:>9}  {:>5}  {:<11}  {:>7}  {:<5}  {prestige}",
            fmt_time(snap.time),
            fmt_num(snap.effective_click_power),
            fmt_num(snap.effective_passive_rate),
            fmt_num(snap.total_income),
            fmt_pct(snap.passive_fraction),
            tier_short,
            snap.artist_count,
            snap.phase.label(),
        )?;
    }
    writeln!(w)?;
    Ok(())
}

fn write_content_reached(
    w: &mut dyn Write,
    catalog: &Catalog,
    result: &SimResult,
    hr: &str,
) -> std::io::Result<()> {
    writeln!(w, "{hr}")?;
    writeln!(w, "  {}", "CONTENT REACHED".bright_yellow().bold())?;
    writeln!(w, "{hr}")?;

    let max_tier_reached = result
        .snapshots
        .iter()
        .map(|s| s.media_tier)
        .max()
        .unwrap_or(0);
    writeln!(w, "  Media tiers:")?;
    for (idx, tier) in catalog.media_tiers().iter().enumerate() {
        if idx <= max_tier_reached {
            let when = if idx == 0 {
                "@ start".to_string()
            } else {
                result
                    .events
                    .iter()
                    .find(|e| e.tag == EventTag::Media && e.label.contains(&tier.name))
                    .map_or("@ start".to_string(), |e| {
                        format!("@ {}", fmt_time(e.sim_time))
                    })
            };
            writeln!(
                w,
                "    Tier {idx}: {:<18} {when}  ×{} multiplier",
                tier.name,
                fmt_num(tier.multiplier)
            )?;
        } else {
            writeln!(
                w,
                "    Tier {idx}: {:<18} NOT REACHED  (costs {})",
                tier.name,
                fmt_num(tier.cost)
            )?;
        }
    }
    writeln!(w)?;

    writeln!(w, "  Swords unlocked:")?;
    for def in catalog.swords() {
        let unlocked = result.final_state.has_sword(&def.id)
            || result
                .events
                .iter()
                .any(|e| e.tag == EventTag::Sword && e.label == def.name);
        if unlocked {
            let when = result
                .events
                .iter()
                .find(|e| e.tag == EventTag::Sword && e.label == def.name)
                .map_or("@ start".to_string(), |e| format!("@ {}", fmt_time(e.sim_time)));
            writeln!(w, "    {} {:<22} {when}  +{}%", "✓".green(), def.name, def.bonus_pct)?;
        } else {
            writeln!(
                w,
                "    {} {:<22} NOT REACHED  (needs {} strokes)",
                "✗".red(),
                def.name,
                fmt_num(def.threshold)
            )?;
        }
    }
    writeln!(w)?;

    writeln!(w, "  Achievements unlocked:")?;
    for def in catalog.achievements() {
        let unlocked = result.final_state.has_achievement(&def.id);
        let when = result
            .events
            .iter()
            .find(|e| e.tag == EventTag::Achieve && e.label == def.name)
            .map_or(String::new(), |e| format!("@ {}", fmt_time(e.sim_time)));
        let mark = if unlocked { "✓".green() } else { "✗".red() };
        writeln!(w, "    {mark} {:<38} {when}", def.name)?;
    }
    writeln!(w)?;

    writeln!(w, "  Artists employed (final state):")?;
    for def in catalog.artists() {
        let count = result.final_state.artist_count(&def.id);
        let bar = "█".repeat(usize::min(count as usize, 20));
        writeln!(w, "    {:<22} ×{count:>3}  {bar}", def.name)?;
    }
    writeln!(w)?;

    if !result.prestige_times.is_empty() {
        writeln!(w, "  Prestige timeline:")?;
        for (i, time) in result.prestige_times.iter().enumerate() {
            writeln!(w, "    Erasure #{} @ {}", i + 1, fmt_time(*time))?;
        }
        writeln!(w)?;
    }
    Ok(())
}

fn write_pacing_analysis(
    w: &mut dyn Write,
    result: &SimResult,
    hr: &str,
) -> std::io::Result<()> {
    writeln!(w, "{hr}")?;
    writeln!(w, "  {}", "PACING ANALYSIS".bright_yellow().bold())?;
    writeln!(w, "{hr}")?;

    writeln!(w, "  Phase durations:")?;
    let mut prev_time = 0.0f64;
    let mut prev_name = "early".to_string();
    for event in &result.events {
        if event.tag != EventTag::Phase {
            continue;
        }
        writeln!(
            w,
            "    {:<8} : {} → {}  ({})",
            prev_name.to_uppercase(),
            fmt_time(prev_time),
            fmt_time(event.sim_time),
            fmt_time(event.sim_time - prev_time)
        )?;
        prev_time = event.sim_time;
        prev_name = event
            .label
            .split('→')
            .nth(1)
            .map_or(prev_name.clone(), |s| s.trim().to_lowercase());
    }
    writeln!(
        w,
        "    {:<8} : {} → {}  ({})",
        prev_name.to_uppercase(),
        fmt_time(prev_time),
        fmt_time(result.duration_secs),
        fmt_time(result.duration_secs - prev_time)
    )?;
    writeln!(w)?;

    let total_dead: f64 = result.dead_zones.iter().map(|dz| dz.end - dz.start).sum();
    let dead_pct = if result.duration_secs > 0.0 {
        total_dead / result.duration_secs
    } else {
        0.0
    };
    writeln!(
        w,
        "  Dead zones (waiting >120s with nothing to buy): {}",
        result.dead_zones.len()
    )?;
    for dz in &result.dead_zones {
        writeln!(
            w,
            "    {} → {}  ({})  waiting for: {}",
            fmt_time(dz.start),
            fmt_time(dz.end),
            fmt_time(dz.end - dz.start),
            dz.waiting_for
        )?;
    }
    if !result.dead_zones.is_empty() {
        writeln!(
            w,
            "  Total dead time: {}  ({} of session)",
            fmt_time(total_dead),
            fmt_pct(dead_pct)
        )?;
    }
    writeln!(w)?;

    writeln!(w, "  Total purchases made     : {}", result.purchases)?;
    if result.duration_secs > 0.0 && result.purchases > 0 {
        writeln!(
            w,
            "  Avg time between buys    : {}",
            fmt_time(result.duration_secs / result.purchases as f64)
        )?;
    }
    writeln!(
        w,
        "  Decision moments (≥2 affordable options): {}",
        result.decision_moments
    )?;
    if result.duration_secs > 0.0 && result.decision_moments > 0 {
        writeln!(
            w,
            "  Avg decision frequency   : every {}",
            fmt_time(result.duration_secs / result.decision_moments as f64)
        )?;
    }
    writeln!(
        w,
        "  Close-call moments (top-2 ROI within 15%): {}",
        result.close_call_moments
    )?;
    if result.decision_moments > 0 {
        writeln!(
            w,
            "  Close-call share         : {}",
            fmt_pct(result.close_call_moments as f64 / result.decision_moments as f64)
        )?;
    }
    writeln!(w)?;
    Ok(())
}

fn write_cadence(
    w: &mut dyn Write,
    catalog: &Catalog,
    result: &SimResult,
    hr: &str,
) -> std::io::Result<()> {
    writeln!(w, "{hr}")?;
    writeln!(w, "  {}", "EXPERIENCE CADENCE".bright_yellow().bold())?;
    writeln!(w, "{hr}")?;

    let beats = first_time_major_beats(&result.events);
    let cadence = summarize_cadence(&beats, result.duration_secs, BURST_WINDOW_SECS);
    writeln!(w, "  First-time major beats  : {}", cadence.beat_count)?;
    match cadence.first_beat_time {
        Some(t) => writeln!(w, "  Time to first major beat: {}", fmt_time(t))?,
        None => writeln!(w, "  Time to first major beat: none")?,
    }
    match cadence.avg_gap {
        Some(gap) => writeln!(w, "  Avg beat gap            : {}", fmt_time(gap))?,
        None => writeln!(w, "  Avg beat gap            : n/a")?,
    }
    match cadence.median_gap {
        Some(gap) => writeln!(w, "  Median beat gap         : {}", fmt_time(gap))?,
        None => writeln!(w, "  Median beat gap         : n/a")?,
    }
    writeln!(
        w,
        "  Longest novelty drought : {} ({} -> {})",
        fmt_time(cadence.longest_drought),
        fmt_time(cadence.drought_start),
        fmt_time(cadence.drought_end)
    )?;
    if let (Some(start), Some(end)) = (cadence.peak_burst_start, cadence.peak_burst_end) {
        writeln!(
            w,
            "  Peak novelty burst      : {} beats in {} window ({} -> {})",
            cadence.peak_burst_count,
            fmt_time(cadence.burst_window_secs),
            fmt_time(start),
            fmt_time(end)
        )?;
    } else {
        writeln!(w, "  Peak novelty burst      : none")?;
    }

    if let Some(recovery) = &result.recovery {
        let media_name = catalog
            .media_tier(recovery.pre_max_media_tier)
            .map_or("?", |t| t.name.as_str());
        let sword_name = catalog
            .swords()
            .get(recovery.pre_max_sword_idx)
            .map_or("?", |s| s.name.as_str());
        writeln!(
            w,
            "  Pre-prestige peaks      : media {media_name}, sword {sword_name}"
        )?;
        match recovery.media_recovery_secs {
            Some(secs) if secs == 0.0 => {
                writeln!(w, "  Post-prestige media recovery: instant")?;
            }
            Some(secs) => {
                writeln!(w, "  Post-prestige media recovery: {}", fmt_time(secs))?;
            }
            None => writeln!(w, "  Post-prestige media recovery: not recovered this run")?,
        }
        match recovery.sword_recovery_secs {
            Some(secs) if secs == 0.0 => {
                let reason = if recovery.keeps_swords {
                    "instant (Portfolio kept swords)"
                } else {
                    "instant"
                };
                writeln!(w, "  Post-prestige sword recovery: {reason}")?;
            }
            Some(secs) => {
                writeln!(w, "  Post-prestige sword recovery: {}", fmt_time(secs))?;
            }
            None => writeln!(w, "  Post-prestige sword recovery: not recovered this run")?,
        }
    } else {
        writeln!(w, "  Post-prestige recovery  : no prestige in this session")?;
    }
    writeln!(w)?;
    Ok(())
}

fn write_balance_flags(
    w: &mut dyn Write,
    catalog: &Catalog,
    config: &SimConfig,
    result: &SimResult,
    hr: &str,
) -> std::io::Result<()> {
    writeln!(w, "{hr}")?;
    writeln!(w, "  {}", "BALANCE FLAGS".bright_yellow().bold())?;
    writeln!(w, "{hr}")?;

    let mut flags: Vec<BalanceFlag> = Vec::new();

    if result.stalled {
        flags.push(BalanceFlag {
            warn: true,
            msg: "Run stalled: zero income with nothing reachable".to_string(),
        });
    }

    let total_dead: f64 = result.dead_zones.iter().map(|dz| dz.end - dz.start).sum();
    let dead_pct = if result.duration_secs > 0.0 {
        total_dead / result.duration_secs
    } else {
        0.0
    };
    if dead_pct > 0.2 {
        flags.push(BalanceFlag {
            warn: true,
            msg: format!(
                "High dead time: {} of session spent waiting, pacing may feel slow",
                fmt_pct(dead_pct)
            ),
        });
    } else if dead_pct < 0.05 {
        flags.push(BalanceFlag {
            warn: false,
            msg: format!(
                "Low dead time ({}): always something to buy, good purchase density",
                fmt_pct(dead_pct)
            ),
        });
    } else {
        flags.push(BalanceFlag {
            warn: false,
            msg: format!("Dead time: {} of session, reasonable pacing", fmt_pct(dead_pct)),
        });
    }

    if let Some(final_snap) = result.snapshots.last() {
        let pf = final_snap.passive_fraction;
        if pf < 0.5 {
            flags.push(BalanceFlag {
                warn: true,
                msg: format!(
                    "Clicking dominates at end ({} passive), passive income may be too weak",
                    fmt_pct(pf)
                ),
            });
        } else if pf > 0.98 {
            flags.push(BalanceFlag {
                warn: false,
                msg: format!(
                    "Passive income dominates ({}) at end, idle-friendly",
                    fmt_pct(pf)
                ),
            });
        } else {
            flags.push(BalanceFlag {
                warn: false,
                msg: format!("Healthy click/passive split: {} passive at end", fmt_pct(pf)),
            });
        }
    }

    if let Some(first_prestige) = result.prestige_times.first() {
        let share = first_prestige / result.duration_secs.max(1.0);
        if share < 0.4 {
            flags.push(BalanceFlag {
                warn: true,
                msg: format!(
                    "First prestige at {} of session ({}), may feel rushed",
                    fmt_pct(share),
                    fmt_time(*first_prestige)
                ),
            });
        } else {
            flags.push(BalanceFlag {
                warn: false,
                msg: format!(
                    "First prestige at {} ({} of session), feels paced",
                    fmt_time(*first_prestige),
                    fmt_pct(share)
                ),
            });
        }
    } else if config.max_prestiges > 0 {
        flags.push(BalanceFlag {
            warn: true,
            msg: format!(
                "Prestige not reached in {} min; threshold is {} total strokes",
                config.minutes,
                fmt_num(catalog.tuning.prestige_threshold)
            ),
        });
    }

    for def in catalog.artists() {
        if result.final_state.artist_count(&def.id) == 0 {
            flags.push(BalanceFlag {
                warn: true,
                msg: format!(
                    "Artist never hired: {} (base cost {}), may be unreachable",
                    def.name,
                    fmt_num(def.base_cost)
                ),
            });
        }
    }

    if let Some(first_hire) = result.events.iter().find(|e| e.tag == EventTag::Hire) {
        if first_hire.sim_time > 120.0 {
            flags.push(BalanceFlag {
                warn: true,
                msg: format!(
                    "First artist hired at {}, early game may feel slow",
                    fmt_time(first_hire.sim_time)
                ),
            });
        } else {
            flags.push(BalanceFlag {
                warn: false,
                msg: format!(
                    "First artist hired at {}, early game has a quick first milestone",
                    fmt_time(first_hire.sim_time)
                ),
            });
        }
    }

    let tiers = catalog.media_tiers();
    for i in 1..tiers.len().saturating_sub(1) {
        let ratio = tiers[i + 1].cost / tiers[i].cost.max(1.0);
        if ratio > 100.0 {
            flags.push(BalanceFlag {
                warn: true,
                msg: format!(
                    "Large cost gap: {} ({}) to {} ({}), ratio ×{}",
                    tiers[i].name,
                    fmt_num(tiers[i].cost),
                    tiers[i + 1].name,
                    fmt_num(tiers[i + 1].cost),
                    ratio.round()
                ),
            });
        }
    }

    let max_tier_reached = result
        .snapshots
        .iter()
        .map(|s| s.media_tier)
        .max()
        .unwrap_or(0);
    if max_tier_reached < catalog.max_media_tier() {
        if let Some(next) = catalog.media_tier(max_tier_reached + 1) {
            flags.push(BalanceFlag {
                warn: false,
                msg: format!(
                    "{} media tier(s) not reached; next is {} at {} strokes",
                    catalog.max_media_tier() - max_tier_reached,
                    next.name,
                    fmt_num(next.cost)
                ),
            });
        }
    }

    for flag in &flags {
        let mark = if flag.warn { "⚠".yellow() } else { "✓".green() };
        writeln!(w, "  {mark} {}", flag.msg)?;
    }
    writeln!(w)?;
    Ok(())
}

fn write_final_summary(
    w: &mut dyn Write,
    catalog: &Catalog,
    config: &SimConfig,
    result: &SimResult,
    hr: &str,
) -> std::io::Result<()> {
    writeln!(w, "{hr}")?;
    writeln!(w, "  {}", "FINAL STATE SUMMARY".bright_yellow().bold())?;
    writeln!(w, "{hr}")?;
    let state = &result.final_state;
    writeln!(
        w,
        "  Time elapsed     : {}  ({} min simulated)",
        fmt_time(result.duration_secs),
        config.minutes
    )?;
    writeln!(
        w,
        "  Lifetime strokes : {}",
        fmt_num(state.total_strokes + state.lifetime_strokes)
    )?;
    let tier_name = catalog
        .media_tier(state.media_tier)
        .map_or("?", |t| t.name.as_str());
    writeln!(w, "  Media tier       : {} ({tier_name})", state.media_tier)?;
    writeln!(
        w,
        "  Swords           : {}/{}",
        state.unlocked_swords.len(),
        catalog.swords().len()
    )?;
    writeln!(
        w,
        "  Achievements     : {}/{}",
        state.unlocked_achievements.len(),
        catalog.achievements().len()
    )?;
    writeln!(w, "  Total artists    : {}", state.artists_owned())?;
    writeln!(w, "  Prestige count   : {}", state.prestige_count)?;
    if state.prestige_count > 0 {
        let upgrades: Vec<String> = catalog
            .prestige_upgrades()
            .iter()
            .filter(|def| state.prestige_level(&def.id) > 0)
            .map(|def| format!("{} ×{}", def.name, state.prestige_level(&def.id)))
            .collect();
        let summary = if upgrades.is_empty() {
            "none".to_string()
        } else {
            upgrades.join(", ")
        };
        writeln!(w, "  Prestige upgrades: {summary}")?;
    }
    if let Some(snap) = result.snapshots.last() {
        writeln!(w, "  Effective click  : {}/click", fmt_num(snap.effective_click_power))?;
        writeln!(w, "  Effective passive: {}/sec", fmt_num(snap.effective_passive_rate))?;
        writeln!(w, "  Total income     : {}/sec", fmt_num(snap.total_income))?;
    }
    writeln!(w)?;
    Ok(())
}

#[derive(Serialize)]
struct JsonReport<'a> {
    config: &'a SimConfig,
    cadence: CadenceSummary,
    result: &'a SimResult,
}

/// Machine-readable variant of the full run.
///
/// # Errors
///
/// Returns an error if serialization or the write fails.
pub fn write_json_report(
    w: &mut dyn Write,
    config: &SimConfig,
    result: &SimResult,
) -> anyhow::Result<()> {
    let beats = first_time_major_beats(&result.events);
    let report = JsonReport {
        config,
        cadence: summarize_cadence(&beats, result.duration_secs, BURST_WINDOW_SECS),
        result,
    };
    writeln!(w, "{}", serde_json::to_string_pretty(&report)?)?;
    Ok(())
}

/// Markdown summary of the run.
///
/// # Errors
///
/// Returns an error if the write fails.
pub fn write_markdown_report(
    w: &mut dyn Write,
    catalog: &Catalog,
    config: &SimConfig,
    result: &SimResult,
) -> std::io::Result<()> {
    writeln!(w, "# Inkblade Pacing Report\n")?;
    writeln!(w, "## Run\n")?;
    writeln!(w, "- **Strategy**: {}", config.strategy)?;
    writeln!(w, "- **Duration**: {} min simulated", config.minutes)?;
    writeln!(w, "- **Clicks/sec**: {}", config.clicks_per_sec)?;
    writeln!(w, "- **Max prestiges**: {}", config.max_prestiges)?;
    writeln!(w, "- **Seed**: {:#x}\n", config.seed)?;

    writeln!(w, "## Outcome\n")?;
    let state = &result.final_state;
    writeln!(
        w,
        "- **Lifetime strokes**: {}",
        fmt_num(state.total_strokes + state.lifetime_strokes)
    )?;
    writeln!(w, "- **Purchases**: {}", result.purchases)?;
    writeln!(
        w,
        "- **Media tier**: {} / {}",
        state.media_tier,
        catalog.max_media_tier()
    )?;
    writeln!(
        w,
        "- **Swords**: {} / {}",
        state.unlocked_swords.len(),
        catalog.swords().len()
    )?;
    writeln!(
        w,
        "- **Achievements**: {} / {}",
        state.unlocked_achievements.len(),
        catalog.achievements().len()
    )?;
    writeln!(w, "- **Prestiges**: {}", state.prestige_count)?;
    writeln!(w, "- **Stalled**: {}\n", result.stalled)?;

    writeln!(w, "## Timeline\n")?;
    writeln!(w, "| Time | Tag | Event |")?;
    writeln!(w, "|------|-----|-------|")?;
    for event in &result.events {
        writeln!(
            w,
            "| {} | {} | {} |",
            fmt_time(event.sim_time),
            event.tag.as_str(),
            event.label
        )?;
    }
    writeln!(w)?;

    let total_dead: f64 = result.dead_zones.iter().map(|dz| dz.end - dz.start).sum();
    writeln!(w, "## Pacing\n")?;
    writeln!(w, "- **Dead zones**: {}", result.dead_zones.len())?;
    writeln!(w, "- **Total dead time**: {}", fmt_time(total_dead))?;
    writeln!(w, "- **Decision moments**: {}", result.decision_moments)?;
    writeln!(w, "- **Close calls**: {}", result.close_call_moments)?;
    Ok(())
}
