//! Enumerated option lists used by the form.
//!
//! Every list has a stable serialized key and a display label. Fields that
//! also accept freeform text wrap the list in [`Choice`].

use std::fmt;

use serde::{Deserialize, Serialize};

/// A fixed list of selectable options.
pub trait ListedOption: Copy + Sized + 'static {
    /// Every option in display order.
    const ALL: &'static [Self];

    /// Stable key used on the command line and in snapshots.
    fn key(self) -> &'static str;

    /// Human-readable label used in reports and prompts.
    fn label(self) -> &'static str;

    /// Look an option up by key or label, ignoring case and surrounding space.
    fn parse(input: &str) -> Option<Self> {
        let needle = input.trim();
        Self::ALL.iter().copied().find(|option| {
            option.key().eq_ignore_ascii_case(needle) || option.label().eq_ignore_ascii_case(needle)
        })
    }
}

macro_rules! listed_options {
    (
        $(#[$meta:meta])*
        pub enum $name:ident {
            $( $(#[$vmeta:meta])* $variant:ident => ($key:literal, $label:literal), )+
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        pub enum $name {
            $( $(#[$vmeta])* #[serde(rename = $key)] $variant, )+
        }

        impl ListedOption for $name {
            const ALL: &'static [Self] = &[$(Self::$variant),+];

            fn key(self) -> &'static str {
                match self {
                    $(Self::$variant => $key,)+
                }
            }

            fn label(self) -> &'static str {
                match self {
                    $(Self::$variant => $label,)+
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.label())
            }
        }
    };
}

listed_options! {
    /// Building structure type.
    pub enum StructureType {
        /// Reinforced concrete.
        Rc => ("rc", "RC"),
        /// Sheet-metal cladding.
        SheetMetal => ("sheet-metal", "sheet metal"),
        /// Brick.
        Brick => ("brick", "brick"),
        /// Timber.
        Wood => ("wood", "wood"),
    }
}

listed_options! {
    /// Weather at the scene.
    pub enum Weather {
        /// Clear sky.
        Sunny => ("sunny", "sunny"),
        /// Overcast.
        Cloudy => ("cloudy", "cloudy"),
        /// Rain.
        Rainy => ("rainy", "rainy"),
        /// Strong wind.
        StrongWind => ("strong-wind", "strong wind"),
    }
}

listed_options! {
    /// Ground condition around the building.
    pub enum Ground {
        /// Flat and firm.
        Flat => ("flat", "flat"),
        /// Uneven terrain.
        Uneven => ("uneven", "uneven"),
        /// Slippery surface.
        Slippery => ("slippery", "slippery"),
        /// Mud.
        Muddy => ("muddy", "muddy"),
        /// Obstacles in the approach.
        Obstructed => ("obstructed", "obstructed"),
    }
}

listed_options! {
    /// Observed smoke color.
    pub enum SmokeColor {
        /// No smoke.
        None => ("none", "none"),
        /// White smoke.
        White => ("white", "white"),
        /// Gray smoke.
        Gray => ("gray", "gray"),
        /// Black smoke.
        Black => ("black", "black"),
        /// Yellow smoke.
        Yellow => ("yellow", "yellow"),
        /// Brown smoke.
        Brown => ("brown", "brown"),
        /// Any unusual color.
        Special => ("special", "special color"),
    }
}

listed_options! {
    /// Whether a door or window can be used for entry.
    pub enum Access {
        /// Not yet assessed.
        Unknown => ("unknown", "unknown"),
        /// Entry possible.
        Enterable => ("enterable", "enterable"),
        /// Entry not possible.
        NotEnterable => ("not-enterable", "not enterable"),
        /// There is no opening on this side.
        NoOpening => ("none", "no opening"),
    }
}

listed_options! {
    /// Hazard tags a recon side can be flagged with.
    pub enum RiskTag {
        /// Live electrical hazard.
        Electrocution => ("electrocution", "electrocution"),
        /// Corrosive material.
        Corrosion => ("corrosion", "corrosion"),
        /// Explosion potential.
        Explosion => ("explosion", "explosion"),
        /// Fall from height.
        Fall => ("fall", "fall"),
        /// Falling objects.
        FallingObjects => ("falling-objects", "falling objects"),
        /// Structural collapse.
        Collapse => ("collapse", "collapse"),
        /// Improper operation of equipment.
        ImproperOperation => ("improper-operation", "improper operation"),
    }
}

listed_options! {
    /// Who a MEDIC observation is communicated to.
    pub enum CommTarget {
        /// Not yet decided.
        Unassigned => ("unassigned", "unassigned"),
        /// The crew member operating in the hazard area.
        Operator => ("operator", "operator"),
        /// The crew leader.
        CrewLeader => ("crew-leader", "crew leader"),
        /// The incident commander.
        Commander => ("commander", "incident commander"),
    }
}

listed_options! {
    /// Equipment staged for a RIT deployment.
    pub enum Equipment {
        /// Search guide rope.
        GuideRope => ("guide-rope", "guide rope"),
        /// Protection hoseline.
        ProtectionLine => ("protection-line", "protection hoseline"),
        /// Thermal imaging camera.
        Tic => ("tic", "TIC"),
        /// Fast board.
        FastBoard => ("fast-board", "Fast Board"),
        /// Spare air pack.
        AirPak => ("air-pak", "AirPak"),
    }
}

/// Fire severity observed on a recon side, ranked 0 (none) to 3.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub enum FireSeverity {
    /// No fire observed, or nothing entered.
    #[default]
    None,
    /// Glow: fire visible on the floor.
    Glow,
    /// Fire venting out of windows.
    WindowBlowThrough,
    /// Potential to extend to exposures.
    ExtensionPotential,
}

impl FireSeverity {
    /// Every severity, lowest first.
    pub const ALL: [Self; 4] = [
        Self::None,
        Self::Glow,
        Self::WindowBlowThrough,
        Self::ExtensionPotential,
    ];

    /// Interpret a stored severity code. Anything unrecognized is `None`.
    #[must_use]
    pub fn from_code(code: &str) -> Self {
        match code.trim() {
            "1" => Self::Glow,
            "2" => Self::WindowBlowThrough,
            "3" => Self::ExtensionPotential,
            _ => Self::None,
        }
    }

    /// Parse a code strictly, rejecting anything outside 0-3.
    #[must_use]
    pub fn parse_code(code: &str) -> Option<Self> {
        match code.trim() {
            "0" => Some(Self::None),
            other => Some(Self::from_code(other)).filter(|s| *s != Self::None),
        }
    }

    /// Numeric code.
    #[must_use]
    pub fn code(self) -> &'static str {
        match self {
            Self::None => "0",
            Self::Glow => "1",
            Self::WindowBlowThrough => "2",
            Self::ExtensionPotential => "3",
        }
    }

    /// Label used in prompts and reports.
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Self::None => "none",
            Self::Glow => "glow",
            Self::WindowBlowThrough => "window blow-through",
            Self::ExtensionPotential => "extension potential",
        }
    }
}

impl fmt::Display for FireSeverity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.label(), self.code())
    }
}

/// A listed option or a freeform "other" value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Choice<T> {
    /// One of the listed options.
    Listed(T),
    /// Freeform text entered under "other".
    Other(String),
}

impl<T: ListedOption> Choice<T> {
    /// Parse input as a listed option, falling back to freeform text.
    ///
    /// An `other:` prefix forces the freeform variant.
    #[must_use]
    pub fn parse(input: &str) -> Self {
        let trimmed = input.trim();
        if let Some(rest) = trimmed.strip_prefix("other:") {
            return Self::Other(rest.trim().to_string());
        }
        T::parse(trimmed).map_or_else(|| Self::Other(trimmed.to_string()), Self::Listed)
    }

    /// The text shown for this choice. Empty for an empty "other".
    #[must_use]
    pub fn display(&self) -> &str {
        match self {
            Self::Listed(option) => option.label(),
            Self::Other(text) => text,
        }
    }
}

impl<T: ListedOption> fmt::Display for Choice<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display())
    }
}
