//! Static HTML report of the whole form.
//!
//! Sections always appear in the same order. Empty fields show a
//! "not entered" placeholder instead of being dropped, so a printed report
//! makes missing data visible.

use std::fmt::Write as _;

use chrono::NaiveDateTime;

use super::{blocks_to_html, escape_html, render_blocks};
use crate::form::{display_time, FormState, MaydayState, MedicRecord, ReconSide, SideKey};
use crate::image_normalizer::DataUri;

/// Shown for empty fields.
pub const NOT_ENTERED: &str = "not entered";
/// Shown when there are no MEDIC records.
pub const NO_MEDIC_RECORDS: &str = "no MEDIC records";
/// Shown when the mayday event log is empty.
pub const NO_MAYDAY_EVENTS: &str = "no mayday events";

const STYLES: &str = "\
body { font-family: Arial, sans-serif; color: #333; line-height: 1.6; padding: 20px; }
.header { text-align: center; margin-bottom: 30px; border-bottom: 3px solid #ff6b00; }
.section { margin-bottom: 25px; page-break-inside: avoid; }
.section.page-break { page-break-before: always; }
.section-title { font-size: 18px; font-weight: bold; color: #ff6b00; border-bottom: 2px solid #ff6b00; }
.field { margin-bottom: 8px; }
.field-label { font-size: 12px; font-weight: bold; color: #666; }
.field-value { font-size: 14px; padding: 6px; background: #f9f9f9; }
.field-value.empty { color: #999; font-style: italic; }
.subsection { margin: 12px 0 0 20px; padding-left: 12px; border-left: 3px solid #ff8c00; page-break-inside: avoid; }
.subsection-title { font-weight: bold; color: #ff8c00; }
.placeholder { padding: 20px; background: #f5f5f5; color: #999; text-align: center; }
.risk-item { display: inline-block; background: #f0f0f0; padding: 4px 8px; margin: 2px; }
.photo img { display: block; margin: 0 auto; max-width: 100%; max-height: 260px; }
.narrative h4 { margin: 10px 0 4px; color: #d32f2f; }
.narrative p { margin: 4px 0; }
.narrative .bullet, .narrative .numbered { margin: 2px 0 2px 12px; }
.narrative .spacer { height: 8px; }
table { width: 100%; border-collapse: collapse; }
th, td { border: 1px solid #ddd; padding: 8px; text-align: left; }
.footer { margin-top: 24px; text-align: center; font-size: 11px; color: #999; }
";

/// Accumulates report HTML.
struct ReportWriter {
    out: String,
}

impl ReportWriter {
    fn new() -> Self {
        Self { out: String::new() }
    }

    fn raw(&mut self, html: &str) {
        self.out.push_str(html);
    }

    fn open_section(&mut self, title: &str, page_break: bool) {
        let class = if page_break { "section page-break" } else { "section" };
        let _ = writeln!(
            self.out,
            "<div class=\"{class}\">\n<div class=\"section-title\">{}</div>",
            escape_html(title)
        );
    }

    fn open_subsection(&mut self, title: &str) {
        let _ = writeln!(
            self.out,
            "<div class=\"subsection\">\n<div class=\"subsection-title\">{}</div>",
            escape_html(title)
        );
    }

    fn close(&mut self) {
        self.out.push_str("</div>\n");
    }

    /// Plain text field; empty values become the placeholder.
    fn field(&mut self, label: &str, value: &str) {
        self.field_with_suffix(label, value, "");
    }

    /// Text field with a unit appended when a value is present.
    fn field_with_suffix(&mut self, label: &str, value: &str, suffix: &str) {
        let value = value.trim();
        if value.is_empty() {
            self.empty_field(label);
        } else {
            self.filled_field(label, &format!("{}{suffix}", escape_html(value)));
        }
    }

    /// Timestamp field shown with a space instead of `T`.
    fn time_field(&mut self, label: &str, value: &str) {
        self.field(label, &display_time(value));
    }

    fn empty_field(&mut self, label: &str) {
        let _ = writeln!(
            self.out,
            "<div class=\"field\"><div class=\"field-label\">{}</div>\
             <div class=\"field-value empty\">{NOT_ENTERED}</div></div>",
            escape_html(label)
        );
    }

    /// Field whose value is already HTML.
    fn filled_field(&mut self, label: &str, value_html: &str) {
        let _ = writeln!(
            self.out,
            "<div class=\"field\"><div class=\"field-label\">{}</div>\
             <div class=\"field-value\">{value_html}</div></div>",
            escape_html(label)
        );
    }

    fn placeholder(&mut self, text: &str) {
        let _ = writeln!(
            self.out,
            "<div class=\"placeholder\">{}</div>",
            escape_html(text)
        );
    }

    fn photo(&mut self, caption: &str, photo: &DataUri) {
        let caption = escape_html(caption);
        let _ = writeln!(
            self.out,
            "<div class=\"photo\"><div class=\"photo-label\">{caption}</div>\
             <img src=\"{}\" alt=\"{caption}\" /></div>",
            escape_html(photo.as_str())
        );
    }

    fn finish(self) -> String {
        self.out
    }
}

fn or_dash(value: &str) -> String {
    if value.trim().is_empty() {
        "-".to_string()
    } else {
        escape_html(value.trim())
    }
}

fn basic_info(w: &mut ReportWriter, state: &FormState) {
    w.open_section("1. Basic information", false);
    w.field("Incident safety officer (ISO)", &state.iso_name);
    w.time_field("Arrival on scene", &state.arrival_time);
    w.field("Incident name", &state.incident_name);
    w.field("Initial incident commander (IC)", &state.ic_name);
    w.close();
}

fn building_info(w: &mut ReportWriter, state: &FormState) {
    w.open_section("2. Building information", false);
    w.field_with_suffix("Floors above grade", &state.floors_above, " floors");
    let below = state.floors_below.trim();
    w.field(
        "Floors below grade",
        &if below.is_empty() {
            String::new()
        } else {
            format!("B{below}")
        },
    );
    w.field("Occupancy", &state.usage);
    w.field("Construction", state.structure_text());
    w.field_with_suffix("Floor area", &state.floor_area, " m²");
    w.close();
}

fn environment(w: &mut ReportWriter, state: &FormState) {
    w.open_section("3. Environment and weather", false);
    w.field("Weather", state.weather.display());
    w.field_with_suffix("Temperature", &state.temperature, "°C");
    w.field("Wind direction", &state.wind_direction);
    w.field("Ground", state.ground.display());
    w.close();
}

fn trapped_and_deployment(w: &mut ReportWriter, state: &FormState) {
    w.open_section("4. Trapped persons and deployment", false);
    w.field("Persons trapped", if state.trapped { "yes" } else { "no" });
    if state.trapped {
        w.field_with_suffix("Still trapped", &state.trapped_count, " persons");
        w.field_with_suffix("Rescued", &state.rescued_count, " persons");
    }
    w.field("Crews deployed", &state.deployment_groups);
    w.time_field("Safety briefing", &state.briefing_time);
    w.close();
}

fn aso_and_rit(w: &mut ReportWriter, state: &FormState) {
    w.open_section("5. Assistant safety officer (ASO) and RIT", false);
    w.time_field("ASO requested", &state.aso_request_time);
    w.field("ASO name", &state.aso_name);
    w.time_field("ASO arrival", &state.aso_arrival_time);
    w.time_field("IC confirmation", &state.ic_confirm_time);
    w.time_field("RIT established", &state.rit_time);
    w.field("RIT leader", &state.rit_leader);
    w.close();
}

fn recon_side(w: &mut ReportWriter, key: SideKey, side: &ReconSide) {
    w.open_subsection(&format!("Side {}", key.number()));
    w.field("Floor", &side.floor);
    w.field("Fire", &side.fire_severity().to_string());
    w.filled_field(
        "Smoke (volume/velocity/color/density)",
        &format!(
            "{}/{}/{}/{}",
            or_dash(&side.smoke_volume),
            or_dash(&side.smoke_velocity),
            escape_html(&side.smoke_color.to_string()),
            or_dash(&side.smoke_density)
        ),
    );
    w.field("Door", &side.door.to_string());
    w.field("Window", &side.window.to_string());
    w.field_with_suffix("Crews assigned", &side.groups, " crews");
    w.time_field("Assessed at", &side.time);

    let items = side.risk_items();
    if !items.is_empty() {
        let tags: Vec<String> = items
            .iter()
            .map(|item| format!("<span class=\"risk-item\">{}</span>", escape_html(item)))
            .collect();
        w.filled_field("Risks", &tags.join(" "));
    }
    if let Some(photo) = &side.photo {
        w.photo(&format!("Side {} photo", key.number()), photo);
    }
    w.close();
}

fn recon(w: &mut ReportWriter, state: &FormState) {
    w.open_section("6. Initial 360° reconnaissance (RECON)", true);
    for (key, side) in state.recon.iter() {
        recon_side(w, key, side);
    }
    w.close();
}

fn ai_analysis(w: &mut ReportWriter, state: &FormState) {
    if state.analysis.trim().is_empty() {
        return;
    }
    w.open_section("7. AI safety analysis", true);
    let _ = writeln!(
        w.out,
        "<div class=\"field-value narrative\">\n{}</div>",
        blocks_to_html(&render_blocks(&state.analysis))
    );
    w.close();
}

fn medic_record(w: &mut ReportWriter, index: usize, record: &MedicRecord) {
    w.open_subsection(&format!("MEDIC record {}", index + 1));
    w.time_field("Recorded at", &record.time);
    w.field("Communicated to", record.communicate.display());
    w.field("Monitoring and actions", &record.monitor);
    if !record.analysis_action.trim().is_empty() {
        w.field("Assessment and countermeasures", &record.analysis_action);
    }
    if let Some(photo) = &record.photo {
        w.photo(&format!("MEDIC record photo ({})", index + 1), photo);
    }
    w.close();
}

fn medic(w: &mut ReportWriter, state: &FormState) {
    w.open_section("8. MEDIC records", true);
    if state.medic_records.is_empty() {
        w.placeholder(NO_MEDIC_RECORDS);
    } else {
        for (index, record) in state.medic_records.iter().enumerate() {
            medic_record(w, index, record);
        }
    }
    w.close();
}

fn equipment_text(mayday: &MaydayState) -> String {
    let mut items: Vec<String> = mayday.equipment.iter().map(ToString::to_string).collect();
    if !mayday.equipment_breaking.trim().is_empty() {
        items.push(format!("breaking: {}", mayday.equipment_breaking.trim()));
    }
    if !mayday.equipment_other.trim().is_empty() {
        items.push(format!("other: {}", mayday.equipment_other.trim()));
    }
    items.join(", ")
}

fn mayday(w: &mut ReportWriter, state: &FormState) {
    let mayday = &state.mayday;
    w.open_section("9. Mayday", true);
    w.time_field("Mayday confirmed", &mayday.confirm_time);
    w.field_with_suffix("Still trapped", &mayday.trapped_count, " persons");
    w.field("RIT officer", &mayday.rit_officer);
    w.field("Radio channel", &mayday.radio_channel);
    w.field("Equipment", &equipment_text(mayday));

    w.open_subsection("LUNAR");
    w.field("L (location)", &mayday.lunar_location);
    w.field("U (unit)", &mayday.lunar_unit);
    w.field("N (name)", &mayday.lunar_name);
    w.field("A (air/task)", &mayday.lunar_air_task);
    w.field("R (resources)", &mayday.lunar_resources);
    w.close();

    w.open_subsection("Event log");
    if mayday.event_log.is_empty() {
        w.placeholder(NO_MAYDAY_EVENTS);
    } else {
        w.raw("<table>\n<thead><tr><th>Time</th><th>Event</th></tr></thead>\n<tbody>\n");
        for log in &mayday.event_log {
            let time = display_time(&log.time);
            let _ = writeln!(
                w.out,
                "<tr><td>{}</td><td>{}</td></tr>",
                if time.is_empty() {
                    NOT_ENTERED.to_string()
                } else {
                    escape_html(&time)
                },
                if log.event.trim().is_empty() {
                    NOT_ENTERED.to_string()
                } else {
                    escape_html(&log.event)
                }
            );
        }
        w.raw("</tbody>\n</table>\n");
    }
    w.close();
    w.close();
}

/// Render the complete form as a standalone HTML document.
///
/// Output depends only on `state` and `generated_at`.
#[must_use]
pub fn render_full_report(state: &FormState, generated_at: NaiveDateTime) -> String {
    let stamp = generated_at.format("%Y-%m-%d %H:%M").to_string();
    let mut w = ReportWriter::new();

    let _ = writeln!(
        w.out,
        "<div class=\"header\"><h1>Incident Safety Officer Assessment Report</h1>\
         <p>ISO Report | generated {stamp}</p></div>"
    );
    basic_info(&mut w, state);
    building_info(&mut w, state);
    environment(&mut w, state);
    trapped_and_deployment(&mut w, state);
    aso_and_rit(&mut w, state);
    recon(&mut w, state);
    ai_analysis(&mut w, state);
    medic(&mut w, state);
    mayday(&mut w, state);
    let _ = writeln!(
        w.out,
        "<div class=\"footer\">Incident Safety Officer assessment | generated {stamp}</div>"
    );

    let body = w.finish();
    format!(
        "<!DOCTYPE html>\n<html>\n<head>\n<meta charset=\"UTF-8\">\n\
         <title>ISO Report</title>\n<style>\n{STYLES}</style>\n</head>\n<body>\n{body}</body>\n</html>\n"
    )
}
