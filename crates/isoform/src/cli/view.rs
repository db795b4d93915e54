//! Terminal views of the form, one per tab.

use std::fmt::Write as _;

use crate::controller::Tab;
use crate::form::{display_time, FormState, ReconSide, SideKey};
use crate::render::{blocks_to_text, render_blocks};

const DASH: &str = "-";

fn line(out: &mut String, label: &str, value: &str) {
    let value = value.trim();
    let _ = writeln!(out, "  {label:<22} {}", if value.is_empty() { DASH } else { value });
}

fn time_line(out: &mut String, label: &str, value: &str) {
    line(out, label, &display_time(value));
}

fn heading(out: &mut String, title: &str) {
    let _ = writeln!(out, "{title}\n{}", "-".repeat(title.chars().count()));
}

fn basic(out: &mut String, state: &FormState) {
    heading(out, "Basic");
    line(out, "ISO", &state.iso_name);
    time_line(out, "Arrived", &state.arrival_time);
    line(out, "Incident", &state.incident_name);
    line(out, "IC", &state.ic_name);
    line(out, "Floors above", &state.floors_above);
    line(out, "Floors below", &state.floors_below);
    line(out, "Usage", &state.usage);
    line(out, "Structure", state.structure_text());
    line(out, "Floor area (m²)", &state.floor_area);
    line(out, "Weather", state.weather.display());
    line(out, "Temperature (°C)", &state.temperature);
    line(out, "Wind", &state.wind_direction);
    line(out, "Ground", state.ground.display());
    line(out, "Trapped", if state.trapped { "yes" } else { "no" });
    if state.trapped {
        line(out, "Still trapped", &state.trapped_count);
        line(out, "Rescued", &state.rescued_count);
    }
    line(out, "Crews deployed", &state.deployment_groups);
    time_line(out, "Briefing", &state.briefing_time);
    time_line(out, "ASO requested", &state.aso_request_time);
    line(out, "ASO", &state.aso_name);
    time_line(out, "ASO arrived", &state.aso_arrival_time);
    time_line(out, "IC confirmed", &state.ic_confirm_time);
    time_line(out, "RIT established", &state.rit_time);
    line(out, "RIT leader", &state.rit_leader);
}

fn side(out: &mut String, key: SideKey, side: &ReconSide) {
    let _ = writeln!(out, "  [{key}]");
    line(out, "Floor", &side.floor);
    line(out, "Fire", &side.fire_severity().to_string());
    line(
        out,
        "Smoke vol/vel/col/den",
        &format!(
            "{}/{}/{}/{}",
            side.smoke_volume, side.smoke_velocity, side.smoke_color, side.smoke_density
        ),
    );
    line(out, "Door / window", &format!("{} / {}", side.door, side.window));
    line(out, "Crews", &side.groups);
    line(out, "Risks", &side.risk_items().join(", "));
    time_line(out, "Assessed", &side.time);
    line(out, "Photo", if side.photo.is_some() { "attached" } else { "" });
}

fn recon(out: &mut String, state: &FormState) {
    heading(out, "Recon");
    for (key, data) in state.recon.iter() {
        side(out, key, data);
    }
    if !state.analysis.trim().is_empty() {
        let _ = writeln!(out, "\nAI analysis\n");
        out.push_str(&blocks_to_text(&render_blocks(&state.analysis)));
    }
}

fn medic(out: &mut String, state: &FormState) {
    heading(out, "Medic");
    if state.medic_records.is_empty() {
        let _ = writeln!(out, "  (no records)");
    }
    for record in &state.medic_records {
        let _ = writeln!(out, "  [#{}]", record.id);
        time_line(out, "Time", &record.time);
        line(out, "Monitoring", &record.monitor);
        line(out, "Communicate", record.communicate.display());
        line(out, "Photo", if record.photo.is_some() { "attached" } else { "" });
        if !record.analysis_action.trim().is_empty() {
            out.push_str(&blocks_to_text(&render_blocks(&record.analysis_action)));
        }
    }
}

fn mayday(out: &mut String, state: &FormState) {
    let m = &state.mayday;
    heading(out, "Mayday");
    time_line(out, "Confirmed", &m.confirm_time);
    line(out, "Still trapped", &m.trapped_count);
    line(out, "RIT officer", &m.rit_officer);
    line(out, "L location", &m.lunar_location);
    line(out, "U unit", &m.lunar_unit);
    line(out, "N name", &m.lunar_name);
    line(out, "A air/task", &m.lunar_air_task);
    line(out, "R resources", &m.lunar_resources);
    time_line(out, "ASO requested", &m.aso_request_time);
    line(out, "ASO", &m.aso_name);
    time_line(out, "ASO arrived", &m.aso_arrival_time);
    line(out, "Radio channel", &m.radio_channel);
    let equipment: Vec<String> = m.equipment.iter().map(ToString::to_string).collect();
    line(out, "Equipment", &equipment.join(", "));
    line(out, "Breaking tools", &m.equipment_breaking);
    line(out, "Other equipment", &m.equipment_other);
    let _ = writeln!(out, "  Event log:");
    if m.event_log.is_empty() {
        let _ = writeln!(out, "    (empty)");
    }
    for log in &m.event_log {
        let _ = writeln!(
            out,
            "    #{:<4} {:<16} {}",
            log.id,
            display_time(&log.time),
            log.event
        );
    }
}

/// Render one tab as terminal text.
#[must_use]
pub fn render_tab(state: &FormState, tab: Tab) -> String {
    let mut out = String::new();
    match tab {
        Tab::Basic => basic(&mut out, state),
        Tab::Recon => recon(&mut out, state),
        Tab::Medic => medic(&mut out, state),
        Tab::Mayday => mayday(&mut out, state),
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::form::RowId;

    #[test]
    fn test_basic_view_placeholders() {
        let text = render_tab(&FormState::default(), Tab::Basic);
        assert!(text.starts_with("Basic\n-----\n"));
        assert!(text.contains("Weather                sunny"));
        assert!(!text.contains("Rescued"));
    }

    #[test]
    fn test_recon_view_lists_sides() {
        let text = render_tab(&FormState::default(), Tab::Recon);
        for n in 1..=4 {
            assert!(text.contains(&format!("[side {n}]")));
        }
        assert!(!text.contains("AI analysis"));
    }

    #[test]
    fn test_recon_view_renders_analysis() {
        let mut state = FormState::default();
        state.analysis = "### Risk\n- collapse".to_string();
        let text = render_tab(&state, Tab::Recon);
        assert!(text.contains("== Risk =="));
        assert!(text.contains("• collapse"));
    }

    #[test]
    fn test_medic_and_mayday_views() {
        let mut state = FormState::default();
        assert!(render_tab(&state, Tab::Medic).contains("(no records)"));

        let id = state.add_mayday_log().unwrap();
        state.mayday_log_mut(id).unwrap().event = "PASS alarm".to_string();
        let text = render_tab(&state, Tab::Mayday);
        assert!(text.contains("PASS alarm"));
        assert_eq!(id, RowId(1));
        assert!(text.contains("#1"));
    }
}
