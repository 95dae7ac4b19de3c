use crate::foundation::error::{NarrationError, NarrationResult};

/// Absolute 0-based frame index in output timeline space.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize,
)]
pub struct FrameIndex(pub u64);

/// Frames-per-second represented as a rational `num/den`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Fps {
    /// Numerator (frames).
    pub num: u32,
    /// Denominator (seconds), must be non-zero.
    pub den: u32, // must be > 0
}

impl Fps {
    /// Create a validated FPS value.
    pub fn new(num: u32, den: u32) -> NarrationResult<Self> {
        if den == 0 {
            return Err(NarrationError::config("fps den must be > 0"));
        }
        if num == 0 {
            return Err(NarrationError::config("fps num must be > 0"));
        }
        Ok(Self { num, den })
    }

    /// Convert to floating-point FPS.
    pub fn as_f64(self) -> f64 {
        f64::from(self.num) / f64::from(self.den)
    }

    /// Duration of one frame in seconds.
    pub fn frame_duration_secs(self) -> f64 {
        f64::from(self.den) / f64::from(self.num)
    }

    /// Start time of frame `idx` in seconds.
    pub fn frame_start_secs(self, idx: FrameIndex) -> f64 {
        (idx.0 as f64) * self.frame_duration_secs()
    }

    /// Number of frames needed to cover `secs` seconds.
    ///
    /// Uses ceil semantics with a small tolerance so that exact multiples of the frame period
    /// do not gain a spurious extra frame from float noise.
    pub fn frames_to_cover(self, secs: f64) -> u64 {
        if !secs.is_finite() || secs <= 0.0 {
            return 0;
        }
        let raw = secs * self.as_f64();
        (raw - 1e-6).ceil().max(0.0) as u64
    }
}

/// Output frame dimensions in pixels.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Resolution {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
}

impl Resolution {
    /// Create a resolution; both sides must be non-zero and even (yuv420p output).
    pub fn new(width: u32, height: u32) -> NarrationResult<Self> {
        let r = Self { width, height };
        r.validate()?;
        Ok(r)
    }

    /// Validate encoder constraints.
    pub fn validate(self) -> NarrationResult<()> {
        if self.width == 0 || self.height == 0 {
            return Err(NarrationError::config("resolution width/height must be non-zero"));
        }
        if !self.width.is_multiple_of(2) || !self.height.is_multiple_of(2) {
            return Err(NarrationError::config(
                "resolution width/height must be even (required for yuv420p mp4 output)",
            ));
        }
        Ok(())
    }

    /// Round both sides down to the nearest even value (minimum 2).
    pub fn even_floor(width: u32, height: u32) -> Self {
        let even = |v: u32| (v & !1).max(2);
        Self {
            width: even(width),
            height: even(height),
        }
    }

    /// Bytes in one tightly packed RGBA8 frame.
    pub fn rgba8_len(self) -> usize {
        self.width as usize * self.height as usize * 4
    }
}

impl std::fmt::Display for Resolution {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

impl std::str::FromStr for Resolution {
    type Err = NarrationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (w, h) = s
            .split_once(['x', 'X'])
            .ok_or_else(|| NarrationError::config(format!("invalid resolution '{s}'")))?;
        let parse = |v: &str| {
            v.trim()
                .parse::<u32>()
                .map_err(|e| NarrationError::config(format!("invalid resolution '{s}': {e}")))
        };
        Self::new(parse(w)?, parse(h)?)
    }
}

/// Straight-alpha RGBA8 color used in configuration.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Rgba8 {
    /// Red channel.
    pub r: u8,
    /// Green channel.
    pub g: u8,
    /// Blue channel.
    pub b: u8,
    /// Alpha channel.
    pub a: u8,
}

impl Rgba8 {
    /// Build a color from channels.
    pub const fn new(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/core.rs"]
mod tests;
