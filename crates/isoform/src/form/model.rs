//! The form document and its nested records.

use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Serialize};

use super::options::{
    Access, Choice, CommTarget, Equipment, FireSeverity, Ground, ListedOption, RiskTag,
    SmokeColor, StructureType, Weather,
};
use crate::error::{Error, Result};
use crate::image_normalizer::DataUri;

/// Identity of a MEDIC record or mayday log row.
///
/// Drawn from [`FormState::next_row_id`], so ids are unique and strictly
/// increasing for the lifetime of the document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RowId(pub u64);

impl fmt::Display for RowId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One face of the building, numbered 1-4 around the 360° recon.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum SideKey {
    /// Side 1.
    One,
    /// Side 2.
    Two,
    /// Side 3.
    Three,
    /// Side 4.
    Four,
}

impl SideKey {
    /// All sides in recon order.
    pub const ALL: [Self; 4] = [Self::One, Self::Two, Self::Three, Self::Four];

    /// Side number, 1-4.
    #[must_use]
    pub fn number(self) -> u8 {
        match self {
            Self::One => 1,
            Self::Two => 2,
            Self::Three => 3,
            Self::Four => 4,
        }
    }

    /// Look a side up by its number.
    #[must_use]
    pub fn from_number(number: u8) -> Option<Self> {
        match number {
            1 => Some(Self::One),
            2 => Some(Self::Two),
            3 => Some(Self::Three),
            4 => Some(Self::Four),
            _ => None,
        }
    }

    fn index(self) -> usize {
        usize::from(self.number() - 1)
    }
}

impl fmt::Display for SideKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "side {}", self.number())
    }
}

/// Reconnaissance snapshot of one building face.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReconSide {
    /// Floor label the observation applies to.
    pub floor: String,
    /// Raw fire-severity code, "0"-"3". See [`ReconSide::fire_severity`].
    pub fire: String,
    /// Smoke volume scalar.
    pub smoke_volume: String,
    /// Smoke velocity scalar.
    pub smoke_velocity: String,
    /// Smoke color.
    pub smoke_color: SmokeColor,
    /// Smoke density scalar.
    pub smoke_density: String,
    /// Door accessibility.
    pub door: Access,
    /// Window accessibility.
    pub window: Access,
    /// Number of crews assigned to this side.
    pub groups: String,
    /// Selected risk tags.
    pub risks: BTreeSet<RiskTag>,
    /// Freeform "other risk" text.
    pub risk_other: String,
    /// When the observation was made.
    pub time: String,
    /// Normalized photo of this side.
    pub photo: Option<DataUri>,
}

impl Default for ReconSide {
    fn default() -> Self {
        Self {
            floor: String::new(),
            fire: FireSeverity::None.code().to_string(),
            smoke_volume: String::new(),
            smoke_velocity: String::new(),
            smoke_color: SmokeColor::None,
            smoke_density: String::new(),
            door: Access::Unknown,
            window: Access::Unknown,
            groups: String::new(),
            risks: BTreeSet::new(),
            risk_other: String::new(),
            time: String::new(),
            photo: None,
        }
    }
}

impl ReconSide {
    /// Interpret the stored fire code; unknown codes read as no fire.
    #[must_use]
    pub fn fire_severity(&self) -> FireSeverity {
        FireSeverity::from_code(&self.fire)
    }

    /// Selected risks followed by the freeform risk, if any.
    #[must_use]
    pub fn risk_items(&self) -> Vec<String> {
        let mut items: Vec<String> = self.risks.iter().map(|r| r.label().to_string()).collect();
        let other = self.risk_other.trim();
        if !other.is_empty() {
            items.push(other.to_string());
        }
        items
    }

    /// Add the tag if absent, remove it if present.
    pub fn toggle_risk(&mut self, tag: RiskTag) {
        if !self.risks.remove(&tag) {
            self.risks.insert(tag);
        }
    }
}

/// Exactly four recon sides, addressed by [`SideKey`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "ReconSetRepr", into = "ReconSetRepr")]
pub struct ReconSet {
    sides: [ReconSide; 4],
}

/// Snapshot layout of [`ReconSet`]: one key per side.
#[derive(Default, Serialize, Deserialize)]
#[serde(default)]
struct ReconSetRepr {
    s1: ReconSide,
    s2: ReconSide,
    s3: ReconSide,
    s4: ReconSide,
}

impl From<ReconSetRepr> for ReconSet {
    fn from(repr: ReconSetRepr) -> Self {
        Self {
            sides: [repr.s1, repr.s2, repr.s3, repr.s4],
        }
    }
}

impl From<ReconSet> for ReconSetRepr {
    fn from(set: ReconSet) -> Self {
        let [s1, s2, s3, s4] = set.sides;
        Self { s1, s2, s3, s4 }
    }
}

impl ReconSet {
    /// Borrow one side.
    #[must_use]
    pub fn side(&self, key: SideKey) -> &ReconSide {
        &self.sides[key.index()]
    }

    /// Mutably borrow one side.
    pub fn side_mut(&mut self, key: SideKey) -> &mut ReconSide {
        &mut self.sides[key.index()]
    }

    /// Iterate sides in order 1 to 4.
    pub fn iter(&self) -> impl Iterator<Item = (SideKey, &ReconSide)> {
        SideKey::ALL.into_iter().zip(self.sides.iter())
    }
}

/// One timestamped hazard or medical observation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MedicRecord {
    /// Row identity.
    pub id: RowId,
    /// When the observation was made.
    #[serde(default)]
    pub time: String,
    /// Monitoring note.
    #[serde(default)]
    pub monitor: String,
    /// Normalized photo.
    #[serde(default)]
    pub photo: Option<DataUri>,
    /// Evaluation and action narrative, usually AI-generated.
    #[serde(default)]
    pub analysis_action: String,
    /// Who the observation is communicated to.
    #[serde(default = "default_comm_target")]
    pub communicate: Choice<CommTarget>,
}

fn default_comm_target() -> Choice<CommTarget> {
    Choice::Listed(CommTarget::Unassigned)
}

impl MedicRecord {
    /// A blank record with the given id.
    #[must_use]
    pub fn new(id: RowId) -> Self {
        Self {
            id,
            time: String::new(),
            monitor: String::new(),
            photo: None,
            analysis_action: String::new(),
            communicate: default_comm_target(),
        }
    }
}

/// One line of the mayday event log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MaydayLog {
    /// Row identity.
    pub id: RowId,
    /// When the event happened.
    #[serde(default)]
    pub time: String,
    /// What happened.
    #[serde(default)]
    pub event: String,
}

impl MaydayLog {
    /// A blank log line with the given id.
    #[must_use]
    pub fn new(id: RowId) -> Self {
        Self {
            id,
            time: String::new(),
            event: String::new(),
        }
    }
}

/// The mayday workflow sub-document.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MaydayState {
    /// When the mayday was confirmed.
    pub confirm_time: String,
    /// Members still trapped.
    pub trapped_count: String,
    /// Officer leading the RIT.
    pub rit_officer: String,
    /// LUNAR: location.
    pub lunar_location: String,
    /// LUNAR: unit.
    pub lunar_unit: String,
    /// LUNAR: name.
    pub lunar_name: String,
    /// LUNAR: air supply and assigned task.
    pub lunar_air_task: String,
    /// LUNAR: resources needed.
    pub lunar_resources: String,
    /// When an ASO was requested for the mayday.
    pub aso_request_time: String,
    /// ASO name.
    pub aso_name: String,
    /// When the ASO arrived.
    pub aso_arrival_time: String,
    /// Dedicated radio channel.
    pub radio_channel: String,
    /// Equipment staged for the RIT.
    pub equipment: BTreeSet<Equipment>,
    /// Forcible-entry tools.
    pub equipment_breaking: String,
    /// Any other equipment.
    pub equipment_other: String,
    /// Event log, newest first.
    pub event_log: Vec<MaydayLog>,
}

/// The whole form, one per session.
///
/// Every struct in the document uses `#[serde(default)]`, so snapshots written
/// by an older or newer layout load with missing fields defaulted and unknown
/// fields ignored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FormState {
    /// Incident safety officer.
    pub iso_name: String,
    /// When the ISO arrived on scene.
    pub arrival_time: String,
    /// Incident name.
    pub incident_name: String,
    /// Initial incident commander.
    pub ic_name: String,
    /// Floors above grade.
    pub floors_above: String,
    /// Floors below grade.
    pub floors_below: String,
    /// Building usage.
    pub usage: String,
    /// Structure type, unset until chosen.
    pub structure: Option<Choice<StructureType>>,
    /// Floor area per storey in m².
    pub floor_area: String,
    /// When an ASO was requested.
    pub aso_request_time: String,
    /// ASO name.
    pub aso_name: String,
    /// When the ASO arrived.
    pub aso_arrival_time: String,
    /// When the IC confirmed the ASO.
    pub ic_confirm_time: String,
    /// Whether anyone is trapped.
    pub trapped: bool,
    /// People still trapped.
    pub trapped_count: String,
    /// People already rescued.
    pub rescued_count: String,
    /// Number of crews deployed.
    pub deployment_groups: String,
    /// Safety briefing time.
    pub briefing_time: String,
    /// When the RIT was established.
    pub rit_time: String,
    /// RIT leader.
    pub rit_leader: String,
    /// Weather.
    pub weather: Choice<Weather>,
    /// Temperature in °C.
    pub temperature: String,
    /// Wind direction.
    pub wind_direction: String,
    /// Ground condition.
    pub ground: Choice<Ground>,
    /// Four-sided recon.
    pub recon: ReconSet,
    /// MEDIC observations, newest first.
    pub medic_records: Vec<MedicRecord>,
    /// Mayday workflow.
    pub mayday: MaydayState,
    /// Incident-wide AI analysis narrative.
    pub analysis: String,
    /// Last row id handed out.
    pub last_row_id: u64,
}

impl Default for FormState {
    fn default() -> Self {
        Self {
            iso_name: String::new(),
            arrival_time: String::new(),
            incident_name: String::new(),
            ic_name: String::new(),
            floors_above: String::new(),
            floors_below: String::new(),
            usage: String::new(),
            structure: None,
            floor_area: String::new(),
            aso_request_time: String::new(),
            aso_name: String::new(),
            aso_arrival_time: String::new(),
            ic_confirm_time: String::new(),
            trapped: false,
            trapped_count: String::new(),
            rescued_count: String::new(),
            deployment_groups: String::new(),
            briefing_time: String::new(),
            rit_time: String::new(),
            rit_leader: String::new(),
            weather: Choice::Listed(Weather::Sunny),
            temperature: "25".to_string(),
            wind_direction: String::new(),
            ground: Choice::Listed(Ground::Flat),
            recon: ReconSet::default(),
            medic_records: Vec::new(),
            mayday: MaydayState::default(),
            analysis: String::new(),
            last_row_id: 0,
        }
    }
}

impl FormState {
    /// Hand out a fresh row id, strictly greater than any issued before.
    ///
    /// Rows restored from a snapshot written before the counter existed are
    /// taken into account.
    ///
    /// # Errors
    ///
    /// Returns [`Error::RowIdsExhausted`] once the counter is at `u64::MAX`;
    /// the counter is left unchanged.
    pub fn next_row_id(&mut self) -> Result<RowId> {
        let highest_seen = self
            .medic_records
            .iter()
            .map(|r| r.id.0)
            .chain(self.mayday.event_log.iter().map(|l| l.id.0))
            .max()
            .unwrap_or(0);
        let next = self
            .last_row_id
            .max(highest_seen)
            .checked_add(1)
            .ok_or(Error::RowIdsExhausted)?;
        self.last_row_id = next;
        Ok(RowId(next))
    }

    /// Resolved structure text, empty if unset.
    #[must_use]
    pub fn structure_text(&self) -> &str {
        self.structure.as_ref().map_or("", Choice::display)
    }

    /// Find a MEDIC record by id.
    #[must_use]
    pub fn medic(&self, id: RowId) -> Option<&MedicRecord> {
        self.medic_records.iter().find(|r| r.id == id)
    }

    /// Find a MEDIC record by id for editing.
    pub fn medic_mut(&mut self, id: RowId) -> Option<&mut MedicRecord> {
        self.medic_records.iter_mut().find(|r| r.id == id)
    }

    /// Find a mayday log row by id for editing.
    pub fn mayday_log_mut(&mut self, id: RowId) -> Option<&mut MaydayLog> {
        self.mayday.event_log.iter_mut().find(|l| l.id == id)
    }

    /// Insert a blank MEDIC record at the head of the list.
    ///
    /// # Errors
    ///
    /// Returns [`Error::RowIdsExhausted`] if no fresh id is left.
    pub fn add_medic_record(&mut self) -> Result<RowId> {
        let id = self.next_row_id()?;
        self.medic_records.insert(0, MedicRecord::new(id));
        Ok(id)
    }

    /// Insert a blank mayday log line at the head of the list.
    ///
    /// # Errors
    ///
    /// Returns [`Error::RowIdsExhausted`] if no fresh id is left.
    pub fn add_mayday_log(&mut self) -> Result<RowId> {
        let id = self.next_row_id()?;
        self.mayday.event_log.insert(0, MaydayLog::new(id));
        Ok(id)
    }

    /// Remove the MEDIC record with the given id, keeping the others in order.
    pub fn remove_medic_record(&mut self, id: RowId) -> bool {
        let before = self.medic_records.len();
        self.medic_records.retain(|r| r.id != id);
        self.medic_records.len() != before
    }

    /// Remove the mayday log row with the given id, keeping the others in order.
    pub fn remove_mayday_log(&mut self, id: RowId) -> bool {
        let before = self.mayday.event_log.len();
        self.mayday.event_log.retain(|l| l.id != id);
        self.mayday.event_log.len() != before
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_state() {
        let state = FormState::default();

        assert_eq!(state.weather, Choice::Listed(Weather::Sunny));
        assert_eq!(state.ground, Choice::Listed(Ground::Flat));
        assert_eq!(state.temperature, "25");
        assert!(!state.trapped);
        assert!(state.structure.is_none());
        assert!(state.medic_records.is_empty());
        assert!(state.mayday.event_log.is_empty());
        assert_eq!(state.recon.iter().count(), 4);
    }

    #[test]
    fn test_default_recon_side() {
        let side = ReconSide::default();
        assert_eq!(side.fire, "0");
        assert_eq!(side.door, Access::Unknown);
        assert_eq!(side.window, Access::Unknown);
        assert_eq!(side.smoke_color, SmokeColor::None);
        assert!(side.photo.is_none());
    }

    #[test]
    fn test_side_key_numbers() {
        for (i, key) in SideKey::ALL.iter().enumerate() {
            assert_eq!(usize::from(key.number()), i + 1);
            assert_eq!(SideKey::from_number(key.number()), Some(*key));
        }
        assert_eq!(SideKey::from_number(0), None);
        assert_eq!(SideKey::from_number(5), None);
    }

    #[test]
    fn test_recon_sides_are_independent() {
        let mut recon = ReconSet::default();
        recon.side_mut(SideKey::Three).floor = "3F".to_string();

        assert_eq!(recon.side(SideKey::Three).floor, "3F");
        assert!(recon.side(SideKey::One).floor.is_empty());
        assert!(recon.side(SideKey::Four).floor.is_empty());
    }

    #[test]
    fn test_recon_set_serializes_with_side_keys() {
        let json = serde_json::to_value(ReconSet::default()).unwrap();
        let obj = json.as_object().unwrap();
        assert_eq!(obj.len(), 4);
        for key in ["s1", "s2", "s3", "s4"] {
            assert!(obj.contains_key(key));
        }
    }

    #[test]
    fn test_recon_set_missing_side_defaults() {
        let recon: ReconSet = serde_json::from_str(r#"{"s2":{"floor":"2F"}}"#).unwrap();
        assert_eq!(recon.side(SideKey::Two).floor, "2F");
        assert_eq!(recon.side(SideKey::Four), &ReconSide::default());
    }

    #[test]
    fn test_risk_items_set_then_other() {
        let mut side = ReconSide::default();
        side.risks.insert(RiskTag::Collapse);
        side.risks.insert(RiskTag::Electrocution);
        side.risk_other = "unstable scaffolding".to_string();

        assert_eq!(
            side.risk_items(),
            vec!["electrocution", "collapse", "unstable scaffolding"]
        );
    }

    #[test]
    fn test_toggle_risk() {
        let mut side = ReconSide::default();
        side.toggle_risk(RiskTag::Fall);
        assert!(side.risks.contains(&RiskTag::Fall));
        side.toggle_risk(RiskTag::Fall);
        assert!(side.risks.is_empty());
    }

    #[test]
    fn test_add_rows_prepend_with_increasing_ids() {
        let mut state = FormState::default();
        let first = state.add_medic_record().unwrap();
        let second = state.add_medic_record().unwrap();
        let log = state.add_mayday_log().unwrap();

        assert!(second > first);
        assert!(log > second);
        assert_eq!(state.medic_records[0].id, second);
        assert_eq!(state.medic_records[1].id, first);
        assert_eq!(state.mayday.event_log[0].id, log);
    }

    #[test]
    fn test_ids_never_reused_after_delete() {
        let mut state = FormState::default();
        let a = state.add_medic_record().unwrap();
        let b = state.add_medic_record().unwrap();
        assert!(state.remove_medic_record(b));

        let c = state.add_medic_record().unwrap();
        assert!(c > b);
        assert!(c > a);
    }

    #[test]
    fn test_next_row_id_respects_restored_rows() {
        let mut state = FormState::default();
        state.medic_records.push(MedicRecord::new(RowId(1_700_000_000_000)));
        let id = state.next_row_id().unwrap();
        assert_eq!(id, RowId(1_700_000_000_001));
    }

    #[test]
    fn test_exhausted_row_ids_refuse_new_rows() {
        let mut state: FormState =
            serde_json::from_str(r#"{"last_row_id":18446744073709551615}"#).unwrap();
        let err = state.add_medic_record().unwrap_err();
        assert!(matches!(err, Error::RowIdsExhausted));
        assert!(state.medic_records.is_empty());
        assert_eq!(state.last_row_id, u64::MAX);

        let mut state = FormState::default();
        state.mayday.event_log.push(MaydayLog::new(RowId(u64::MAX)));
        assert!(state.add_mayday_log().is_err());
        assert_eq!(state.mayday.event_log.len(), 1);
    }

    #[test]
    fn test_remove_preserves_order() {
        let mut state = FormState::default();
        let ids: Vec<RowId> = (0..4).map(|_| state.add_mayday_log().unwrap()).collect();
        assert!(state.remove_mayday_log(ids[1]));

        let remaining: Vec<RowId> = state.mayday.event_log.iter().map(|l| l.id).collect();
        assert_eq!(remaining, vec![ids[3], ids[2], ids[0]]);
    }

    #[test]
    fn test_remove_unknown_id() {
        let mut state = FormState::default();
        state.add_medic_record().unwrap();
        assert!(!state.remove_medic_record(RowId(999)));
        assert_eq!(state.medic_records.len(), 1);
    }

    #[test]
    fn test_structure_text() {
        let mut state = FormState::default();
        assert_eq!(state.structure_text(), "");

        state.structure = Some(Choice::Other("steel frame".to_string()));
        assert_eq!(state.structure_text(), "steel frame");
    }

    #[test]
    fn test_state_json_roundtrip() {
        let mut state = FormState::default();
        state.incident_name = "Warehouse fire".to_string();
        state.recon.side_mut(SideKey::Two).fire = "2".to_string();
        state.mayday.equipment.insert(Equipment::Tic);
        let id = state.add_medic_record().unwrap();
        state.medic_mut(id).unwrap().monitor = "roof sagging".to_string();

        let json = serde_json::to_string(&state).unwrap();
        let back: FormState = serde_json::from_str(&json).unwrap();
        assert_eq!(state, back);
    }

    #[test]
    fn test_partial_snapshot_merges_with_defaults() {
        let state: FormState =
            serde_json::from_str(r#"{"incident_name":"Mall","retired_field":true}"#).unwrap();
        assert_eq!(state.incident_name, "Mall");
        assert_eq!(state.temperature, "25");
    }
}
