//! Read-only tabular projection of the roster for spreadsheet export.

use crate::progression::level_of;
use crate::roster::Roster;

const HEADER: &str = "name,age,gender,xp,level,streak,weight_streak,total_practices";

fn csv_field(value: &str) -> String {
    if value.contains([',', '"', '\n']) {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}

/// Serialize the roster as CSV, one row per athlete in id order.
#[must_use]
pub fn roster_csv(roster: &Roster) -> String {
    let mut out = String::from(HEADER);
    out.push('\n');
    for athlete in roster.athletes.values() {
        let age = athlete.age.map(|a| a.to_string()).unwrap_or_default();
        out.push_str(&format!(
            "{},{},{},{},{},{},{},{}\n",
            csv_field(&athlete.name),
            age,
            athlete.gender,
            athlete.xp,
            csv_field(level_of(athlete.xp).name),
            athlete.streak,
            athlete.weight_streak,
            athlete.total_practices,
        ));
    }
    out
}
