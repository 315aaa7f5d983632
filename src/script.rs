use crate::error::{ScenecastError, ScenecastResult};

/// An ordered scene script, as produced by the upstream script generator.
/// The engine validates structural shape only, not semantic quality.
#[derive(Clone, Debug, serde::Serialize, serde::Deserialize)]
pub struct Script {
    pub scenes: Vec<Scene>,
    #[serde(default)]
    pub style: StyleConfig,
    /// Global determinism seed for per-scene randomized sub-elements.
    #[serde(default)]
    pub seed: u64,
}

#[derive(Clone, Debug, serde::Serialize, serde::Deserialize)]
pub struct Scene {
    pub template_id: String,
    #[serde(default)]
    pub params: serde_json::Value,
    pub voiceover_text: String,
    /// Explicit duration. When the built timeline schedules animation past
    /// this, the effective duration extends to cover it (never truncates).
    #[serde(default)]
    pub duration_ms: Option<u64>,
}

impl Script {
    pub fn validate(&self) -> ScenecastResult<()> {
        if self.scenes.is_empty() {
            return Err(ScenecastError::validation(
                "script must contain at least one scene",
            ));
        }
        for (i, scene) in self.scenes.iter().enumerate() {
            if scene.template_id.trim().is_empty() {
                return Err(ScenecastError::validation(format!(
                    "scene {i} has an empty template_id"
                )));
            }
            if scene.voiceover_text.trim().is_empty() {
                return Err(ScenecastError::validation(format!(
                    "scene {i} has empty voiceover text"
                )));
            }
        }
        self.style.validate()?;
        Ok(())
    }
}

/// Immutable styling constants injected into template builders. Replaces
/// ambient module-level palette state.
#[derive(Clone, Debug, serde::Serialize, serde::Deserialize)]
pub struct StyleConfig {
    pub primary_color: String,
    pub secondary_color: String,
    pub font_stack: String,
    /// Rotating per-scene background palette; scene `i` defaults to
    /// `backgrounds[i % len]` when its template has no explicit bgColor.
    pub backgrounds: Vec<String>,
}

impl StyleConfig {
    pub fn validate(&self) -> ScenecastResult<()> {
        if self.backgrounds.is_empty() {
            return Err(ScenecastError::validation(
                "style backgrounds must be non-empty",
            ));
        }
        for color in [&self.primary_color, &self.secondary_color]
            .into_iter()
            .chain(self.backgrounds.iter())
        {
            if !is_hex_color(color) {
                return Err(ScenecastError::validation(format!(
                    "'{color}' is not a #rrggbb color"
                )));
            }
        }
        Ok(())
    }

    pub fn background_for(&self, scene_index: usize) -> &str {
        &self.backgrounds[scene_index % self.backgrounds.len()]
    }
}

impl Default for StyleConfig {
    fn default() -> Self {
        Self {
            primary_color: "#6c5ce7".to_string(),
            secondary_color: "#00cec9".to_string(),
            font_stack: "Inter, Poppins, sans-serif".to_string(),
            backgrounds: vec![
                "#0f0f1a".to_string(),
                "#1a1a2e".to_string(),
                "#16213e".to_string(),
                "#0d1b2a".to_string(),
                "#1b2838".to_string(),
                "#2d132c".to_string(),
                "#0a192f".to_string(),
                "#1f1f2e".to_string(),
            ],
        }
    }
}

fn is_hex_color(s: &str) -> bool {
    s.len() == 7 && s.starts_with('#') && s[1..].chars().all(|c| c.is_ascii_hexdigit())
}
