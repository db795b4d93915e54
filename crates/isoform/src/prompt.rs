//! Prompt assembly for the AI collaborator.
//!
//! A [`PromptRequest`] is a fixed instruction preamble plus an ordered list of
//! text and image segments. Order matters: a side's text always precedes its
//! photo, and sides are emitted 1 through 4.

use crate::form::{FormState, MedicRecord, ReconSide, SideKey};
use crate::image_normalizer::DataUri;

/// Instruction sent with the whole-incident analysis.
pub const INCIDENT_INSTRUCTION: &str = "\
You are a professional fire-ground Incident Safety Officer (ISO). Using the \
information below (building, weather, four-sided RECON data and photos), give \
a first analysis and safety recommendations.

Output format: use Markdown headings (###) and list items (1. or -).
Example:
### Overall risk assessment
1. Structural risk: ...
2. Fire development: ...

### Hazard areas and potential
- North side: ...
- Roof: ...

### Operational safety recommendations
1. Incident commander (IC): ...
2. Interior crews: ...

Output the content directly with no preamble.";

/// Instruction sent with a single MEDIC observation.
pub const MEDIC_INSTRUCTION: &str = "\
You are a fire-ground Incident Safety Officer (ISO) completing a MEDIC \
assessment. Use Markdown.

### Evaluate
- Risk: ...

### Develop
- Measures: ...

### Intervention
- Action: ...";

/// Text returned when the provider answers with nothing.
pub const EMPTY_RESPONSE_FALLBACK: &str = "analysis failed, no content returned";

/// One part of a prompt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment {
    /// Plain text.
    Text(String),
    /// Inline image.
    Image {
        /// Mime type, e.g. `image/jpeg`.
        mime: String,
        /// Base64 payload.
        data: String,
    },
}

impl Segment {
    fn image(photo: &DataUri) -> Option<Self> {
        photo.parts().map(|(mime, data)| Self::Image {
            mime: mime.to_string(),
            data: data.to_string(),
        })
    }

    /// Whether this is an image segment.
    #[must_use]
    pub fn is_image(&self) -> bool {
        matches!(self, Self::Image { .. })
    }
}

/// A complete request for the AI collaborator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromptRequest {
    /// Fixed system instruction.
    pub instruction: &'static str,
    /// Ordered content segments.
    pub segments: Vec<Segment>,
}

/// Describe a smoke volume/velocity/density code.
fn smoke_scalar(code: &str) -> String {
    match code.trim() {
        "" | "0" => "none (0)".to_string(),
        "1" => "slow/small/light (1)".to_string(),
        "2" => "fast/large/dense (2)".to_string(),
        other => other.to_string(),
    }
}

fn side_text(key: SideKey, side: &ReconSide) -> String {
    format!(
        "[Side {} recon] floor: {}; fire: {}; smoke: volume {} / velocity {} / color {} / density {}; \
         door: {} / window: {}; crews: {}; risks: {}.",
        key.number(),
        side.floor,
        side.fire_severity(),
        smoke_scalar(&side.smoke_volume),
        smoke_scalar(&side.smoke_velocity),
        side.smoke_color,
        smoke_scalar(&side.smoke_density),
        side.door,
        side.window,
        side.groups,
        side.risk_items().join(", "),
    )
}

/// Build the whole-incident analysis request.
///
/// Always one summary segment followed by four side groups, whether or not
/// the sides hold any data.
#[must_use]
pub fn build_incident_prompt(state: &FormState) -> PromptRequest {
    let mut segments = vec![Segment::Text(format!(
        "[Basic info] incident: {}; structure: {}; environment: {}, {}°C",
        state.incident_name,
        state.structure_text(),
        state.weather,
        state.temperature,
    ))];

    for (key, side) in state.recon.iter() {
        segments.push(Segment::Text(side_text(key, side)));
        if let Some(image) = side.photo.as_ref().and_then(Segment::image) {
            segments.push(image);
        }
    }

    PromptRequest {
        instruction: INCIDENT_INSTRUCTION,
        segments,
    }
}

/// Build the request for one MEDIC observation.
#[must_use]
pub fn build_medic_prompt(record: &MedicRecord) -> PromptRequest {
    let mut segments = vec![Segment::Text(format!("Current monitoring: {}", record.monitor))];
    if let Some(image) = record.photo.as_ref().and_then(Segment::image) {
        segments.push(image);
    }
    PromptRequest {
        instruction: MEDIC_INSTRUCTION,
        segments,
    }
}

/// Apply the empty-response fallback to provider output.
#[must_use]
pub fn finish_response(text: String) -> String {
    if text.trim().is_empty() {
        EMPTY_RESPONSE_FALLBACK.to_string()
    } else {
        text
    }
}
