use crate::error::{ScenecastError, ScenecastResult};

#[derive(
    Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize,
)]
pub struct FrameIndex(pub u64);

#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Fps(pub u32);

impl Fps {
    pub fn new(fps: u32) -> ScenecastResult<Self> {
        if fps == 0 {
            return Err(ScenecastError::validation("fps must be > 0"));
        }
        Ok(Self(fps))
    }

    /// Track-relative timestamp of frame `k`, in milliseconds.
    ///
    /// Computed in f64 so long scripts do not accumulate integer truncation
    /// drift (frame 89 @ 30fps is 2966.67ms, not 2966ms).
    pub fn frame_to_ms(self, frame: FrameIndex) -> f64 {
        (frame.0 as f64) * 1000.0 / f64::from(self.0)
    }

    /// Number of frames needed to cover `total_ms`: `ceil(total_ms * fps / 1000)`.
    pub fn frame_count_for(self, total_ms: u64) -> u64 {
        let num = (total_ms as u128) * (self.0 as u128);
        num.div_ceil(1000) as u64
    }
}

impl Default for Fps {
    fn default() -> Self {
        Self(30)
    }
}

/// Output aspect ratio; the enumerated set fixes pixel dimensions.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum AspectRatio {
    #[serde(rename = "16:9")]
    Wide,
    #[serde(rename = "9:16")]
    Vertical,
    #[serde(rename = "1:1")]
    Square,
}

impl AspectRatio {
    pub fn dimensions(self) -> (u32, u32) {
        match self {
            Self::Wide => (1920, 1080),
            Self::Vertical => (1080, 1920),
            Self::Square => (1080, 1080),
        }
    }

    pub fn parse(s: &str) -> ScenecastResult<Self> {
        match s.trim() {
            "16:9" => Ok(Self::Wide),
            "9:16" => Ok(Self::Vertical),
            "1:1" => Ok(Self::Square),
            other => Err(ScenecastError::validation(format!(
                "unknown aspect ratio '{other}' (expected 16:9, 9:16, or 1:1)"
            ))),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct CaptureSpec {
    pub fps: Fps,
    pub aspect: AspectRatio,
}

impl CaptureSpec {
    pub fn validate(&self) -> ScenecastResult<()> {
        if self.fps.0 == 0 {
            return Err(ScenecastError::validation("capture fps must be > 0"));
        }
        Ok(())
    }
}

impl Default for CaptureSpec {
    fn default() -> Self {
        Self {
            fps: Fps::default(),
            aspect: AspectRatio::Wide,
        }
    }
}

/// FNV-1a 64, seeded. Used wherever per-scene determinism needs a stable hash.
pub fn stable_hash64(seed: u64, s: &str) -> u64 {
    let mut h = 0xcbf2_9ce4_8422_2325u64 ^ seed;
    for &b in s.as_bytes() {
        h ^= u64::from(b);
        h = h.wrapping_mul(0x0000_0100_0000_01B3);
    }
    h
}
