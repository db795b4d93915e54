//! Dotted field paths for editing the form from text input.
//!
//! Paths look like `incident_name`, `recon.2.fire`, `mayday.lunar_unit`,
//! `medic.7.monitor` or `mayday.log.9.event`. Time fields accept `now`.

use std::collections::BTreeSet;

use chrono::Local;

use super::model::{FormState, ReconSide, RowId, SideKey};
use super::options::{Access, Choice, Equipment, FireSeverity, ListedOption, RiskTag, SmokeColor};
use crate::error::{Error, Result};

/// Timestamp layout used by every time field.
pub const TIME_FORMAT: &str = "%Y-%m-%dT%H:%M";

/// Current local time in the form's timestamp layout.
#[must_use]
pub fn now_timestamp() -> String {
    Local::now().format(TIME_FORMAT).to_string()
}

/// Timestamp as shown to people: the `T` separator becomes a space.
#[must_use]
pub fn display_time(value: &str) -> String {
    value.replacen('T', " ", 1)
}

fn time_value(value: &str) -> String {
    if value.trim().eq_ignore_ascii_case("now") {
        now_timestamp()
    } else {
        value.trim().to_string()
    }
}

fn parse_bool(field: &str, value: &str) -> Result<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "yes" | "y" | "true" | "1" => Ok(true),
        "no" | "n" | "false" | "0" | "" => Ok(false),
        _ => Err(Error::invalid_value(field, value, "expected yes or no")),
    }
}

fn parse_listed<T: ListedOption>(field: &str, value: &str) -> Result<T> {
    T::parse(value).ok_or_else(|| {
        let keys: Vec<&str> = T::ALL.iter().map(|o| o.key()).collect();
        Error::invalid_value(field, value, format!("expected one of {}", keys.join(", ")))
    })
}

fn parse_listed_set<T: ListedOption + Ord>(field: &str, value: &str) -> Result<BTreeSet<T>> {
    value
        .split(',')
        .map(str::trim)
        .filter(|item| !item.is_empty())
        .map(|item| parse_listed(field, item))
        .collect()
}

fn parse_row_id(field: &str, segment: &str) -> Result<RowId> {
    segment
        .parse::<u64>()
        .map(RowId)
        .map_err(|_| Error::invalid_value(field, segment, "row id must be a number"))
}

fn unknown(path: &str) -> Error {
    Error::UnknownField {
        path: path.to_string(),
    }
}

/// Apply one textual edit to the form.
///
/// # Errors
///
/// Returns [`Error::UnknownField`] for paths that name nothing,
/// [`Error::InvalidValue`] for values a field rejects, and
/// [`Error::RowNotFound`] for row paths whose id does not exist.
pub fn apply(state: &mut FormState, path: &str, value: &str) -> Result<()> {
    let segments: Vec<&str> = path.trim().split('.').collect();
    match segments.as_slice() {
        ["recon", side, field] => {
            let key = side
                .parse::<u8>()
                .ok()
                .and_then(SideKey::from_number)
                .ok_or_else(|| Error::invalid_value(path, *side, "side must be 1-4"))?;
            apply_recon(state.recon.side_mut(key), path, field, value)
        }
        ["medic", id, field] => {
            let id = parse_row_id(path, id)?;
            let record = state.medic_mut(id).ok_or(Error::RowNotFound {
                kind: "medic",
                id: id.0,
            })?;
            match *field {
                "time" => record.time = time_value(value),
                "monitor" => record.monitor = value.to_string(),
                "analysis" | "analysis_action" => record.analysis_action = value.to_string(),
                "communicate" => record.communicate = Choice::parse(value),
                _ => return Err(unknown(path)),
            }
            Ok(())
        }
        ["mayday", "log", id, field] => {
            let id = parse_row_id(path, id)?;
            let log = state.mayday_log_mut(id).ok_or(Error::RowNotFound {
                kind: "mayday",
                id: id.0,
            })?;
            match *field {
                "time" => log.time = time_value(value),
                "event" => log.event = value.to_string(),
                _ => return Err(unknown(path)),
            }
            Ok(())
        }
        ["mayday", field] => apply_mayday(state, path, field, value),
        [field] => apply_top_level(state, path, field, value),
        _ => Err(unknown(path)),
    }
}

fn apply_top_level(state: &mut FormState, path: &str, field: &str, value: &str) -> Result<()> {
    let text = value.to_string();
    match field {
        "iso_name" => state.iso_name = text,
        "arrival_time" => state.arrival_time = time_value(value),
        "incident_name" => state.incident_name = text,
        "ic_name" => state.ic_name = text,
        "floors_above" => state.floors_above = text,
        "floors_below" => state.floors_below = text,
        "usage" => state.usage = text,
        "structure" => {
            state.structure = if value.trim().is_empty() {
                None
            } else {
                Some(Choice::parse(value))
            };
        }
        "floor_area" => state.floor_area = text,
        "aso_request_time" => state.aso_request_time = time_value(value),
        "aso_name" => state.aso_name = text,
        "aso_arrival_time" => state.aso_arrival_time = time_value(value),
        "ic_confirm_time" => state.ic_confirm_time = time_value(value),
        "trapped" => state.trapped = parse_bool(path, value)?,
        "trapped_count" => state.trapped_count = text,
        "rescued_count" => state.rescued_count = text,
        "deployment_groups" => state.deployment_groups = text,
        "briefing_time" => state.briefing_time = time_value(value),
        "rit_time" => state.rit_time = time_value(value),
        "rit_leader" => state.rit_leader = text,
        "weather" => state.weather = Choice::parse(value),
        "temperature" => state.temperature = text,
        "wind_direction" => state.wind_direction = text,
        "ground" => state.ground = Choice::parse(value),
        "analysis" => state.analysis = text,
        _ => return Err(unknown(path)),
    }
    Ok(())
}

fn apply_recon(side: &mut ReconSide, path: &str, field: &str, value: &str) -> Result<()> {
    let text = value.to_string();
    match field {
        "floor" => side.floor = text,
        "fire" => {
            let severity = FireSeverity::parse_code(value)
                .ok_or_else(|| Error::invalid_value(path, value, "fire code must be 0-3"))?;
            side.fire = severity.code().to_string();
        }
        "smoke_volume" => side.smoke_volume = text,
        "smoke_velocity" => side.smoke_velocity = text,
        "smoke_color" => side.smoke_color = parse_listed::<SmokeColor>(path, value)?,
        "smoke_density" => side.smoke_density = text,
        "door" => side.door = parse_listed::<Access>(path, value)?,
        "window" => side.window = parse_listed::<Access>(path, value)?,
        "groups" => side.groups = text,
        "risks" => side.risks = parse_listed_set::<RiskTag>(path, value)?,
        "risk" => side.toggle_risk(parse_listed::<RiskTag>(path, value)?),
        "risk_other" => side.risk_other = text,
        "time" => side.time = time_value(value),
        _ => return Err(unknown(path)),
    }
    Ok(())
}

fn apply_mayday(state: &mut FormState, path: &str, field: &str, value: &str) -> Result<()> {
    let mayday = &mut state.mayday;
    let text = value.to_string();
    match field {
        "confirm_time" => mayday.confirm_time = time_value(value),
        "trapped_count" => mayday.trapped_count = text,
        "rit_officer" => mayday.rit_officer = text,
        "location" | "lunar_location" => mayday.lunar_location = text,
        "unit" | "lunar_unit" => mayday.lunar_unit = text,
        "name" | "lunar_name" => mayday.lunar_name = text,
        "air_task" | "lunar_air_task" => mayday.lunar_air_task = text,
        "resources" | "lunar_resources" => mayday.lunar_resources = text,
        "aso_request_time" => mayday.aso_request_time = time_value(value),
        "aso_name" => mayday.aso_name = text,
        "aso_arrival_time" => mayday.aso_arrival_time = time_value(value),
        "radio_channel" => mayday.radio_channel = text,
        "equipment" => mayday.equipment = parse_listed_set::<Equipment>(path, value)?,
        "equipment_breaking" => mayday.equipment_breaking = text,
        "equipment_other" => mayday.equipment_other = text,
        _ => return Err(unknown(path)),
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::form::options::{Ground, StructureType, Weather};

    #[test]
    fn test_set_top_level_text() {
        let mut state = FormState::default();
        apply(&mut state, "incident_name", "Harbor warehouse").unwrap();
        apply(&mut state, "ic_name", "Chief Lin").unwrap();

        assert_eq!(state.incident_name, "Harbor warehouse");
        assert_eq!(state.ic_name, "Chief Lin");
    }

    #[test]
    fn test_set_choices() {
        let mut state = FormState::default();
        apply(&mut state, "structure", "rc").unwrap();
        apply(&mut state, "weather", "typhoon").unwrap();
        apply(&mut state, "ground", "muddy").unwrap();

        assert_eq!(state.structure, Some(Choice::Listed(StructureType::Rc)));
        assert_eq!(state.weather, Choice::Other("typhoon".to_string()));
        assert_eq!(state.ground, Choice::Listed(Ground::Muddy));

        apply(&mut state, "structure", "").unwrap();
        assert!(state.structure.is_none());
        assert_eq!(state.weather, Choice::<Weather>::Other("typhoon".into()));
    }

    #[test]
    fn test_set_trapped_flag() {
        let mut state = FormState::default();
        apply(&mut state, "trapped", "yes").unwrap();
        assert!(state.trapped);

        let err = apply(&mut state, "trapped", "maybe").unwrap_err();
        assert!(matches!(err, Error::InvalidValue { .. }));
        assert!(state.trapped);
    }

    #[test]
    fn test_time_fields_accept_now() {
        let mut state = FormState::default();
        apply(&mut state, "arrival_time", "now").unwrap();

        assert_eq!(state.arrival_time.len(), "2024-01-01T00:00".len());
        assert!(state.arrival_time.contains('T'));
    }

    #[test]
    fn test_set_recon_fields() {
        let mut state = FormState::default();
        apply(&mut state, "recon.2.fire", "2").unwrap();
        apply(&mut state, "recon.2.door", "not-enterable").unwrap();
        apply(&mut state, "recon.2.risks", "electrocution, collapse").unwrap();
        apply(&mut state, "recon.2.risk_other", "unstable scaffolding").unwrap();

        let side = state.recon.side(SideKey::Two);
        assert_eq!(side.fire_severity(), FireSeverity::WindowBlowThrough);
        assert_eq!(side.door, Access::NotEnterable);
        assert_eq!(side.risks.len(), 2);
        assert_eq!(side.risk_other, "unstable scaffolding");
        assert_eq!(state.recon.side(SideKey::One), &ReconSide::default());
    }

    #[test]
    fn test_recon_risk_toggle() {
        let mut state = FormState::default();
        apply(&mut state, "recon.1.risk", "explosion").unwrap();
        assert!(state.recon.side(SideKey::One).risks.contains(&RiskTag::Explosion));
        apply(&mut state, "recon.1.risk", "explosion").unwrap();
        assert!(state.recon.side(SideKey::One).risks.is_empty());
    }

    #[test]
    fn test_recon_rejects_bad_input() {
        let mut state = FormState::default();
        assert!(apply(&mut state, "recon.5.floor", "1F").is_err());
        assert!(apply(&mut state, "recon.1.fire", "9").is_err());
        assert!(apply(&mut state, "recon.1.door", "ajar").is_err());
        assert!(apply(&mut state, "recon.1.risks", "collapse, flood").is_err());
        assert_eq!(state.recon.side(SideKey::One), &ReconSide::default());
    }

    #[test]
    fn test_set_medic_row_fields() {
        let mut state = FormState::default();
        let id = state.add_medic_record().unwrap();
        let path = format!("medic.{id}.monitor");
        apply(&mut state, &path, "crew fatigue on side 3").unwrap();
        apply(&mut state, &format!("medic.{id}.communicate"), "commander").unwrap();

        let record = state.medic(id).unwrap();
        assert_eq!(record.monitor, "crew fatigue on side 3");
        assert_eq!(record.communicate.display(), "incident commander");
    }

    #[test]
    fn test_set_missing_row() {
        let mut state = FormState::default();
        let err = apply(&mut state, "medic.77.monitor", "x").unwrap_err();
        assert!(matches!(err, Error::RowNotFound { kind: "medic", id: 77 }));

        let err = apply(&mut state, "mayday.log.5.event", "x").unwrap_err();
        assert!(matches!(err, Error::RowNotFound { kind: "mayday", id: 5 }));
    }

    #[test]
    fn test_set_mayday_fields() {
        let mut state = FormState::default();
        apply(&mut state, "mayday.location", "2F stairwell").unwrap();
        apply(&mut state, "mayday.equipment", "tic, guide-rope").unwrap();
        let id = state.add_mayday_log().unwrap();
        apply(&mut state, &format!("mayday.log.{id}.event"), "RIT entered").unwrap();

        assert_eq!(state.mayday.lunar_location, "2F stairwell");
        assert_eq!(state.mayday.equipment.len(), 2);
        assert_eq!(state.mayday.event_log[0].event, "RIT entered");
    }

    #[test]
    fn test_unknown_paths() {
        let mut state = FormState::default();
        for path in ["nope", "recon.1.nope", "mayday.nope", "a.b.c.d.e"] {
            let err = apply(&mut state, path, "x").unwrap_err();
            assert!(matches!(err, Error::UnknownField { .. }), "{path}");
        }
    }

    #[test]
    fn test_display_time() {
        assert_eq!(display_time("2024-05-01T13:45"), "2024-05-01 13:45");
        assert_eq!(display_time(""), "");
    }
}
