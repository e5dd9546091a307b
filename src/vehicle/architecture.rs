// Engine architecture tags, parsed once at ingestion

use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::errors::TunecraftError;

/// How the engine is fed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Aspiration {
    Natural,
    Turbocharged,
    Supercharged,
}

impl Aspiration {
    fn tag(&self) -> &'static str {
        match self {
            Aspiration::Natural => "na",
            Aspiration::Turbocharged => "turbo",
            Aspiration::Supercharged => "supercharged",
        }
    }

    /// Whether the engine already carries a compressor of some kind.
    pub fn is_forced(&self) -> bool {
        matches!(self, Aspiration::Turbocharged | Aspiration::Supercharged)
    }
}

/// Cylinder layout family of the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CylinderFamily {
    I3,
    I4,
    I5,
    I6,
    V6,
    V8,
    V10,
    V12,
    Flat4,
    Flat6,
    Rotary,
}

impl CylinderFamily {
    const ALL: [CylinderFamily; 11] = [
        CylinderFamily::I3,
        CylinderFamily::I4,
        CylinderFamily::I5,
        CylinderFamily::I6,
        CylinderFamily::V6,
        CylinderFamily::V8,
        CylinderFamily::V10,
        CylinderFamily::V12,
        CylinderFamily::Flat4,
        CylinderFamily::Flat6,
        CylinderFamily::Rotary,
    ];

    fn tag(&self) -> &'static str {
        match self {
            CylinderFamily::I3 => "i3",
            CylinderFamily::I4 => "i4",
            CylinderFamily::I5 => "i5",
            CylinderFamily::I6 => "i6",
            CylinderFamily::V6 => "v6",
            CylinderFamily::V8 => "v8",
            CylinderFamily::V10 => "v10",
            CylinderFamily::V12 => "v12",
            CylinderFamily::Flat4 => "flat4",
            CylinderFamily::Flat6 => "flat6",
            CylinderFamily::Rotary => "rotary",
        }
    }

    /// Families that are small-displacement when no displacement figure is known.
    pub fn is_small_displacement(&self) -> bool {
        matches!(
            self,
            CylinderFamily::I3 | CylinderFamily::I4 | CylinderFamily::Flat4 | CylinderFamily::Rotary
        )
    }

    /// Families that are high-output when naturally aspirated.
    pub fn is_large(&self) -> bool {
        matches!(
            self,
            CylinderFamily::V8 | CylinderFamily::V10 | CylinderFamily::V12
        )
    }
}

/// Aspiration × cylinder family.
///
/// A `None` aspiration means the source data only named the cylinder family
/// ("V8") with no turbo or supercharger qualifier. On a requirement it means
/// any aspiration of that family is accepted.
///
/// Serialized as a compact tag: `"turbo-i4"`, `"na-v8"`, `"supercharged-v8"`, `"v8"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct EngineArchitecture {
    pub aspiration: Option<Aspiration>,
    pub cylinders: CylinderFamily,
}

impl EngineArchitecture {
    pub fn new(aspiration: Aspiration, cylinders: CylinderFamily) -> Self {
        Self {
            aspiration: Some(aspiration),
            cylinders,
        }
    }

    /// An architecture known only by its cylinder family.
    pub fn family(cylinders: CylinderFamily) -> Self {
        Self {
            aspiration: None,
            cylinders,
        }
    }

    /// Aspiration used for multiplier lookup: an unqualified engine is treated as natural.
    pub fn effective_aspiration(&self) -> Aspiration {
        self.aspiration.unwrap_or(Aspiration::Natural)
    }

    pub fn tag(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for EngineArchitecture {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.aspiration {
            Some(aspiration) => write!(f, "{}-{}", aspiration.tag(), self.cylinders.tag()),
            None => write!(f, "{}", self.cylinders.tag()),
        }
    }
}

impl FromStr for EngineArchitecture {
    type Err = TunecraftError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_lowercase();
        let (aspiration, family) = match normalized.split_once('-') {
            Some((prefix, family)) => {
                let aspiration = match prefix {
                    "na" => Aspiration::Natural,
                    "turbo" => Aspiration::Turbocharged,
                    "supercharged" => Aspiration::Supercharged,
                    _ => {
                        return Err(TunecraftError::InvalidArchitectureTag {
                            tag: s.to_string(),
                        });
                    }
                };
                (Some(aspiration), family)
            }
            None => (None, normalized.as_str()),
        };

        let cylinders = CylinderFamily::ALL
            .iter()
            .find(|c| c.tag() == family)
            .copied()
            .ok_or_else(|| TunecraftError::InvalidArchitectureTag { tag: s.to_string() })?;

        Ok(Self {
            aspiration,
            cylinders,
        })
    }
}

impl TryFrom<String> for EngineArchitecture {
    type Error = TunecraftError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<EngineArchitecture> for String {
    fn from(value: EngineArchitecture) -> Self {
        value.to_string()
    }
}
