//! The form document.
//!
//! [`FormState`] is the single mutable document holding everything the
//! operator has entered. It is plain data: the controller owns the instance
//! and persists it after every change.

pub mod fields;
mod model;
pub mod options;

pub use fields::{display_time, now_timestamp};
pub use model::{
    FormState, MaydayLog, MaydayState, MedicRecord, ReconSet, ReconSide, RowId, SideKey,
};
pub use options::{
    Access, Choice, CommTarget, Equipment, FireSeverity, Ground, ListedOption, RiskTag,
    SmokeColor, StructureType, Weather,
};
