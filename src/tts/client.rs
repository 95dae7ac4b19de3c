//! Speech service seam.

use crate::foundation::error::NarrationResult;
use crate::voice::VoiceProfile;

/// Audio container requested from the speech service.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum AudioEncoding {
    /// MPEG-1 layer III.
    #[default]
    Mp3,
}

impl AudioEncoding {
    /// Wire name used by the speech API.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Mp3 => "MP3",
        }
    }

    /// File extension for persisted audio.
    pub fn extension(self) -> &'static str {
        match self {
            Self::Mp3 => "mp3",
        }
    }
}

/// One synthesis call.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SynthesisRequest {
    /// Text to speak.
    pub text: String,
    /// Voice to speak it with.
    pub voice: VoiceProfile,
    /// Requested encoding.
    pub encoding: AudioEncoding,
}

impl SynthesisRequest {
    /// MP3 request for `text` spoken by `voice`.
    pub fn mp3(text: impl Into<String>, voice: VoiceProfile) -> Self {
        Self {
            text: text.into(),
            voice,
            encoding: AudioEncoding::Mp3,
        }
    }
}

/// Blocking text-to-speech backend.
///
/// Implementations return the encoded audio bytes on success, `RateLimit` when the service
/// throttles the caller, and `Synthesis` for every other failure.
pub trait SpeechClient: Send {
    /// Synthesize one request.
    fn synthesize(&mut self, request: &SynthesisRequest) -> NarrationResult<Vec<u8>>;
}

impl<T: SpeechClient + ?Sized> SpeechClient for &mut T {
    fn synthesize(&mut self, request: &SynthesisRequest) -> NarrationResult<Vec<u8>> {
        (**self).synthesize(request)
    }
}

impl<T: SpeechClient + ?Sized> SpeechClient for Box<T> {
    fn synthesize(&mut self, request: &SynthesisRequest) -> NarrationResult<Vec<u8>> {
        (**self).synthesize(request)
    }
}
