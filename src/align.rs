//! Word-timestamp alignment: maps the narration's flat word stream onto
//! scene boundaries and answers "which word is being spoken at instant t".

use std::ops::Range;
use std::path::PathBuf;

use crate::error::{ScenecastError, ScenecastResult};

/// One narrated word, timed relative to the full audio track.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct WordTimestamp {
    pub word: String,
    pub start_ms: u64,
    pub end_ms: u64,
}

/// The external text-to-speech result: one merged audio file plus
/// word-level timestamps for the whole narration.
#[derive(Clone, Debug, serde::Serialize, serde::Deserialize)]
pub struct VoiceoverTrack {
    pub audio_path: PathBuf,
    pub words: Vec<WordTimestamp>,
    /// Declared total audio duration; used when ffprobe is unavailable.
    #[serde(default)]
    pub duration_ms: Option<u64>,
}

impl VoiceoverTrack {
    pub fn validate(&self) -> ScenecastResult<()> {
        for (i, w) in self.words.iter().enumerate() {
            if w.start_ms > w.end_ms {
                return Err(ScenecastError::validation(format!(
                    "word {i} ('{}') has start_ms > end_ms",
                    w.word
                )));
            }
        }
        if !self
            .words
            .windows(2)
            .all(|pair| pair[0].end_ms <= pair[1].start_ms)
        {
            return Err(ScenecastError::validation(
                "word timestamps must be non-overlapping and monotonic",
            ));
        }
        Ok(())
    }

    /// End of the last word, in ms. Zero for an empty track.
    pub fn last_word_end_ms(&self) -> u64 {
        self.words.last().map(|w| w.end_ms).unwrap_or(0)
    }
}

/// Tokenize the way the transcription side does: whitespace word
/// boundaries, surrounding punctuation stripped, lowercased. Tokens that
/// are pure punctuation vanish.
pub fn tokenize(text: &str) -> Vec<String> {
    text.split_whitespace()
        .filter_map(|raw| {
            let trimmed = raw.trim_matches(|c: char| !c.is_alphanumeric());
            if trimmed.is_empty() {
                None
            } else {
                Some(trimmed.to_lowercase())
            }
        })
        .collect()
}

/// A scene's slice of the narration: a contiguous word range plus the
/// scene's absolute time span on the shared track.
#[derive(Clone, Debug, PartialEq, serde::Serialize)]
pub struct SceneWindow {
    pub scene_index: usize,
    pub word_range: Range<usize>,
    pub start_ms: u64,
    pub end_ms: u64,
}

impl SceneWindow {
    /// Index (into the full word list) of the active word at track-relative
    /// `t_ms`: the word whose span contains `t`, or the most recently
    /// started word (highlight holds through inter-word gaps and past the
    /// final word). `None` before the scene's first word.
    pub fn active_word_at(&self, words: &[WordTimestamp], t_ms: f64) -> Option<usize> {
        let window = &words[self.word_range.clone()];
        let started = window.partition_point(|w| (w.start_ms as f64) <= t_ms);
        if started == 0 {
            None
        } else {
            Some(self.word_range.start + started - 1)
        }
    }
}

/// Per-scene spans the aligner needs: the voiceover text and the scene's
/// absolute start/end on the track (from cumulative durations).
#[derive(Clone, Debug)]
pub struct SceneSpan {
    pub voiceover_text: String,
    pub start_ms: u64,
    pub end_ms: u64,
}

#[derive(Clone, Debug)]
pub struct Alignment {
    pub windows: Vec<SceneWindow>,
}

impl Alignment {
    /// Walk the flat word list once, consuming each scene's token count in
    /// order. Token counts that do not reconcile fail with
    /// `AlignmentMismatch` unless `proportional_fallback` is set, in which
    /// case words are distributed across scenes by duration share.
    pub fn build(
        spans: &[SceneSpan],
        words: &[WordTimestamp],
        proportional_fallback: bool,
    ) -> ScenecastResult<Self> {
        let token_counts: Vec<usize> = spans
            .iter()
            .map(|s| tokenize(&s.voiceover_text).len())
            .collect();
        let expected: usize = token_counts.iter().sum();

        if expected != words.len() {
            if !proportional_fallback {
                return Err(ScenecastError::AlignmentMismatch {
                    expected,
                    actual: words.len(),
                });
            }
            tracing::warn!(
                expected,
                actual = words.len(),
                "word counts do not reconcile; falling back to proportional alignment"
            );
            return Ok(Self::proportional(spans, words.len()));
        }

        let mut windows = Vec::with_capacity(spans.len());
        let mut cursor = 0usize;
        for (scene_index, (span, &count)) in spans.iter().zip(&token_counts).enumerate() {
            windows.push(SceneWindow {
                scene_index,
                word_range: cursor..cursor + count,
                start_ms: span.start_ms,
                end_ms: span.end_ms,
            });
            cursor += count;
        }
        Ok(Self { windows })
    }

    /// Distribute `word_count` words over scenes proportionally to each
    /// scene's share of the total duration. Contiguity and ordering are
    /// preserved; the final scene absorbs rounding remainder.
    fn proportional(spans: &[SceneSpan], word_count: usize) -> Self {
        let total_ms: u64 = spans.iter().map(|s| s.end_ms - s.start_ms).sum();
        let mut windows = Vec::with_capacity(spans.len());
        let mut cursor = 0usize;
        for (scene_index, span) in spans.iter().enumerate() {
            let take = if scene_index + 1 == spans.len() {
                word_count - cursor
            } else if total_ms == 0 {
                0
            } else {
                let share =
                    (word_count as f64) * ((span.end_ms - span.start_ms) as f64) / (total_ms as f64);
                (share.round() as usize).min(word_count - cursor)
            };
            windows.push(SceneWindow {
                scene_index,
                word_range: cursor..cursor + take,
                start_ms: span.start_ms,
                end_ms: span.end_ms,
            });
            cursor += take;
        }
        Self { windows }
    }

    /// Window owning track-relative instant `t_ms` (scenes are contiguous,
    /// so this is a cumulative-duration lookup).
    pub fn window_at(&self, t_ms: f64) -> Option<&SceneWindow> {
        self.windows
            .iter()
            .find(|w| (w.start_ms as f64) <= t_ms && t_ms < (w.end_ms as f64))
            .or_else(|| {
                // Past the final scene boundary (e.g. padding frames): the
                // last window stays current.
                self.windows.last().filter(|w| t_ms >= w.start_ms as f64)
            })
    }
}
