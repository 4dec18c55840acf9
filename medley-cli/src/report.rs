//! Console rendering of roster state and analytics.

use chrono::NaiveDate;
use colored::Colorize;
use medley_engine::{
    Catalog, DailySnapshot, Roster, TrendDirection, attrition_risk, culture_score,
    engagement_trend, level_progress, most_improved, mvp, peak_performance_windows,
};

/// Athlete table: progression and weekly goals at a glance.
pub fn print_roster(roster: &Roster) {
    if roster.athletes.is_empty() {
        println!("{}", "Roster is empty.".dimmed());
        return;
    }
    println!(
        "{:<22} {:<10} {:>6} {:>5} {:>7} {:>7} {:>9}",
        "NAME".bold(),
        "LEVEL".bold(),
        "XP".bold(),
        "%".bold(),
        "STREAK".bold(),
        "WEIGHT".bold(),
        "WEEK".bold(),
    );
    for athlete in roster.athletes.values() {
        let progress = level_progress(athlete.xp);
        println!(
            "{:<22} {:<10} {:>6} {:>4.0}% {:>7} {:>7} {:>5}/{}",
            athlete.name,
            progress.current.name,
            athlete.xp,
            progress.percent,
            athlete.streak,
            athlete.weight_streak,
            athlete.week_sessions,
            athlete.week_target,
        );
    }
}

fn risk_label(risk: u32) -> colored::ColoredString {
    let text = format!("{risk:>3}");
    if risk >= 60 {
        text.red().bold()
    } else if risk >= 30 {
        text.yellow()
    } else {
        text.green()
    }
}

/// Full analytics report over the current document.
pub fn print_report(roster: &Roster, catalog: &Catalog, today: NaiveDate) {
    let snapshots: Vec<&DailySnapshot> = roster.snapshots.iter().collect();

    println!("{}", "== Team pulse ==".bold());
    let culture = culture_score(roster, &snapshots, &roster.audit, catalog);
    println!("Culture score: {}", format!("{culture}/100").cyan());

    let trend = engagement_trend(&snapshots);
    let arrow = match trend.direction {
        TrendDirection::Up => "up".green(),
        TrendDirection::Down => "down".red(),
        TrendDirection::Neutral => "steady".normal(),
    };
    println!("Engagement trend: {arrow} ({:+.1}% week over week)", trend.delta_pct);

    let windows = peak_performance_windows(&snapshots);
    if let Some(best) = windows.first() {
        println!(
            "Highest-yield day: {} (avg {:.0} XP over {} sessions)",
            best.weekday, best.average_xp, best.samples
        );
    }

    if let Some(star) = mvp(roster, None) {
        println!("MVP: {} ({} XP)", star.name.bold(), star.xp);
    }
    if let Some(improved) = most_improved(roster, &snapshots, today) {
        if let Some(athlete) = roster.athletes.get(&improved.athlete_id) {
            println!("Most improved: {} (+{} XP in ~30 days)", athlete.name.bold(), improved.gain);
        }
    }

    if !roster.team_challenges.is_empty() {
        println!("\n{}", "== Team challenges ==".bold());
        for challenge in &roster.team_challenges {
            println!(
                "{:<28} {:>3}/{} (reward {} XP)",
                challenge.name, challenge.current, challenge.target, challenge.reward_xp
            );
        }
    }

    if !roster.athletes.is_empty() {
        println!("\n{}", "== Attrition risk ==".bold());
        let mut risks: Vec<(&str, u32)> = roster
            .athletes
            .values()
            .map(|athlete| {
                (
                    athlete.name.as_str(),
                    attrition_risk(athlete, &snapshots, &roster.audit),
                )
            })
            .collect();
        risks.sort_by(|a, b| b.1.cmp(&a.1).then(a.0.cmp(b.0)));
        for (name, risk) in risks {
            println!("{} {name}", risk_label(risk));
        }
    }
}

/// Newest-first slice of the audit trail.
pub fn print_audit(roster: &Roster, limit: usize) {
    if roster.audit.is_empty() {
        println!("{}", "Audit trail is empty.".dimmed());
        return;
    }
    for entry in roster.audit.recent(limit) {
        let delta = if entry.xp_delta > 0 {
            format!("{:+}", entry.xp_delta).green()
        } else if entry.xp_delta < 0 {
            format!("{:+}", entry.xp_delta).red()
        } else {
            "  ±0".normal()
        };
        println!(
            "{} {delta:>5} {} {} {}",
            entry.timestamp.format("%Y-%m-%d %H:%M").to_string().dimmed(),
            entry.athlete_name.bold(),
            entry.label,
            format!("[{}]", entry.actor).dimmed(),
        );
    }
}
