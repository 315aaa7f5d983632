use std::path::PathBuf;

use serde_json::json;

use scenecast::{Scene, Script, VoiceoverTrack, WordTimestamp};

fn write_fixtures(dir: &PathBuf) -> (PathBuf, PathBuf) {
    std::fs::create_dir_all(dir).unwrap();

    let script = Script {
        scenes: vec![Scene {
            template_id: "key_takeaway".to_string(),
            params: json!({ "takeaway": "Ship small, ship often" }),
            voiceover_text: "ship small ship often".to_string(),
            duration_ms: Some(2000),
        }],
        style: Default::default(),
        seed: 3,
    };
    let voiceover = VoiceoverTrack {
        audio_path: PathBuf::from("voice.mp3"),
        words: ["ship", "small", "ship", "often"]
            .iter()
            .enumerate()
            .map(|(i, w)| WordTimestamp {
                word: (*w).to_string(),
                start_ms: i as u64 * 450,
                end_ms: i as u64 * 450 + 400,
            })
            .collect(),
        duration_ms: Some(2000),
    };

    let script_path = dir.join("script.json");
    let voiceover_path = dir.join("voiceover.json");
    serde_json::to_writer_pretty(std::fs::File::create(&script_path).unwrap(), &script).unwrap();
    serde_json::to_writer_pretty(std::fs::File::create(&voiceover_path).unwrap(), &voiceover)
        .unwrap();
    (script_path, voiceover_path)
}

fn bin() -> PathBuf {
    std::env::var_os("CARGO_BIN_EXE_scenecast")
        .map(PathBuf::from)
        .unwrap_or_else(|| {
            let mut p = PathBuf::from("target").join("debug");
            p.push(if cfg!(windows) {
                "scenecast.exe"
            } else {
                "scenecast"
            });
            p
        })
}

#[test]
fn cli_validate_and_plan_succeed() {
    let dir = PathBuf::from("target").join("cli_smoke");
    let (script, voiceover) = write_fixtures(&dir);

    let status = std::process::Command::new(bin())
        .args(["validate", "--script"])
        .arg(&script)
        .arg("--voiceover")
        .arg(&voiceover)
        .status()
        .unwrap();
    assert!(status.success());

    let output = std::process::Command::new(bin())
        .args(["plan", "--script"])
        .arg(&script)
        .arg("--voiceover")
        .arg(&voiceover)
        .args(["--fps", "30", "--aspect", "9:16"])
        .output()
        .unwrap();
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("1080x1920"));
    assert!(stdout.contains("key_takeaway"));
}

#[test]
fn cli_states_emits_one_json_line_per_frame() {
    let dir = PathBuf::from("target").join("cli_smoke_states");
    let (script, voiceover) = write_fixtures(&dir);

    let output = std::process::Command::new(bin())
        .args(["states", "--script"])
        .arg(&script)
        .arg("--voiceover")
        .arg(&voiceover)
        .args(["--start", "0", "--end", "5"])
        .output()
        .unwrap();
    assert!(output.status.success());

    let stdout = String::from_utf8_lossy(&output.stdout);
    let lines: Vec<&str> = stdout.lines().collect();
    assert_eq!(lines.len(), 5);
    for line in lines {
        let state: serde_json::Value = serde_json::from_str(line).unwrap();
        assert!(state.get("frame").is_some());
        assert!(state.get("subtitle").is_some());
    }
}

#[test]
fn cli_validate_rejects_bad_params() {
    let dir = PathBuf::from("target").join("cli_smoke_bad");
    std::fs::create_dir_all(&dir).unwrap();

    let script = json!({
        "scenes": [{
            "template_id": "key_takeaway",
            "params": { "wrong_field": true },
            "voiceover_text": "hello",
        }]
    });
    let script_path = dir.join("script.json");
    serde_json::to_writer_pretty(std::fs::File::create(&script_path).unwrap(), &script).unwrap();
    let (_, voiceover_path) = write_fixtures(&dir.join("fixtures"));

    let status = std::process::Command::new(bin())
        .args(["validate", "--script"])
        .arg(&script_path)
        .arg("--voiceover")
        .arg(&voiceover_path)
        .status()
        .unwrap();
    assert!(!status.success());
}
