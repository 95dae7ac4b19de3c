//! Supported narration voices.

use serde::{Deserialize, Serialize};

use crate::foundation::error::{NarrationError, NarrationResult};

/// SSML voice gender requested from the speech service.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Gender {
    /// `MALE`
    Male,
    /// `FEMALE`
    Female,
}

impl Gender {
    /// Wire name used by the speech API.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Male => "MALE",
            Self::Female => "FEMALE",
        }
    }
}

/// Closed set of voices the pipeline accepts.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum VoiceProfile {
    /// `es-ES-Standard-A`, female.
    #[serde(rename = "es-ES-Standard-A")]
    EsEsStandardA,
    /// `es-ES-Standard-B`, male.
    #[serde(rename = "es-ES-Standard-B")]
    EsEsStandardB,
}

impl VoiceProfile {
    /// Every supported voice.
    pub const ALL: [VoiceProfile; 2] = [Self::EsEsStandardA, Self::EsEsStandardB];

    /// Voice name as sent to the speech API.
    pub fn id(self) -> &'static str {
        match self {
            Self::EsEsStandardA => "es-ES-Standard-A",
            Self::EsEsStandardB => "es-ES-Standard-B",
        }
    }

    /// BCP-47 language code.
    pub fn language_code(self) -> &'static str {
        "es-ES"
    }

    /// Requested SSML gender.
    pub fn gender(self) -> Gender {
        match self {
            Self::EsEsStandardA => Gender::Female,
            Self::EsEsStandardB => Gender::Male,
        }
    }

    /// Resolve a voice id, rejecting anything outside [`VoiceProfile::ALL`].
    pub fn from_id(id: &str) -> NarrationResult<Self> {
        let id = id.trim();
        Self::ALL
            .into_iter()
            .find(|v| v.id() == id)
            .ok_or_else(|| NarrationError::input(format!("unsupported voice id '{id}'")))
    }
}

impl std::fmt::Display for VoiceProfile {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.id())
    }
}

impl std::str::FromStr for VoiceProfile {
    type Err = NarrationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_id(s)
    }
}
