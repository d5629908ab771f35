//! Local speech through the espeak-ng command line

use std::path::{Path, PathBuf};
use std::process::Stdio;

use async_trait::async_trait;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;

use super::Speaker;
use crate::config::SpeechConfig;
use crate::{Error, Result};

/// An installed espeak voice
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Voice {
    /// Language code (e.g. "en-gb")
    pub language: String,
    /// 'M' or 'F' when reported
    pub gender: Option<char>,
    /// Voice name, accepted by `-v`
    pub name: String,
}

/// Speaks through a fresh espeak-ng process per utterance
pub struct EspeakSpeaker {
    config: SpeechConfig,
}

impl EspeakSpeaker {
    /// Create a speaker
    #[must_use]
    pub const fn new(config: SpeechConfig) -> Self {
        Self { config }
    }

    async fn speak_once(&self, text: &str) -> Result<()> {
        let engine = SpeechEngine::acquire(&self.config).await?;
        tracing::info!(text, voice = %engine.voice, "speaking");
        engine.say(text).await
    }
}

#[async_trait]
impl Speaker for EspeakSpeaker {
    async fn speak(&self, text: &str) {
        let text = text.trim();
        if text.is_empty() {
            return;
        }

        if let Err(e) = self.speak_once(text).await {
            tracing::error!(error = %e, "speech failed");
        }
    }
}

/// Engine settings resolved for one utterance
struct SpeechEngine {
    bin: PathBuf,
    voice: String,
    rate: u32,
    amplitude: u32,
}

impl SpeechEngine {
    async fn acquire(config: &SpeechConfig) -> Result<Self> {
        let bin = locate_espeak(config)?;

        let voices = match list_voices(&bin).await {
            Ok(voices) => voices,
            Err(e) => {
                tracing::debug!(error = %e, "could not list voices, using default");
                Vec::new()
            }
        };
        let voice = select_voice(&voices, &config.voice_preferences, &config.language);

        Ok(Self {
            bin,
            voice,
            rate: config.rate,
            amplitude: amplitude_for(config.volume),
        })
    }

    fn args(&self) -> Vec<String> {
        vec![
            "-s".to_string(),
            self.rate.to_string(),
            "-a".to_string(),
            self.amplitude.to_string(),
            "-v".to_string(),
            self.voice.clone(),
            "--stdin".to_string(),
        ]
    }

    /// Speak and wait for playback to finish
    async fn say(&self, text: &str) -> Result<()> {
        let mut child = Command::new(&self.bin)
            .args(self.args())
            .stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| Error::Speech(format!("failed to start {}: {e}", self.bin.display())))?;

        if let Some(mut stdin) = child.stdin.take() {
            stdin.write_all(text.as_bytes()).await?;
        }

        let output = child.wait_with_output().await?;
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(Error::Speech(format!(
                "{} exited with {}: {}",
                self.bin.display(),
                output.status,
                stderr.trim()
            )));
        }

        Ok(())
    }
}

impl Drop for SpeechEngine {
    fn drop(&mut self) {
        tracing::trace!(voice = %self.voice, "speech engine released");
    }
}

fn locate_espeak(config: &SpeechConfig) -> Result<PathBuf> {
    if let Some(bin) = &config.espeak_bin {
        return Ok(bin.clone());
    }

    which::which("espeak-ng")
        .or_else(|_| which::which("espeak"))
        .map_err(|_| Error::Speech("espeak-ng not found on PATH".to_string()))
}

async fn list_voices(bin: &Path) -> Result<Vec<Voice>> {
    let output = Command::new(bin)
        .arg("--voices")
        .stdin(Stdio::null())
        .stderr(Stdio::null())
        .kill_on_drop(true)
        .output()
        .await?;

    if !output.status.success() {
        return Err(Error::Speech(format!("--voices exited with {}", output.status)));
    }

    Ok(parse_voice_list(&String::from_utf8_lossy(&output.stdout)))
}

/// Parse `espeak-ng --voices` output
///
/// Columns are priority, language, age/gender, name, file. The header line and
/// malformed lines are skipped.
#[must_use]
pub fn parse_voice_list(output: &str) -> Vec<Voice> {
    output
        .lines()
        .filter_map(|line| {
            let mut cols = line.split_whitespace();
            let priority = cols.next()?;
            priority.parse::<u32>().ok()?;
            let language = cols.next()?.to_string();
            let gender = cols
                .next()?
                .rsplit('/')
                .next()
                .and_then(|g| g.chars().next())
                .filter(|g| matches!(g, 'M' | 'F'));
            let name = cols.next()?.to_string();
            Some(Voice {
                language,
                gender,
                name,
            })
        })
        .collect()
}

/// Pick the first voice matching a preference, else `fallback`
///
/// A preference matches when it is a substring of the voice name, ignoring
/// case. "female" and "male" also match the reported gender.
#[must_use]
pub fn select_voice(voices: &[Voice], preferences: &[String], fallback: &str) -> String {
    preferences
        .iter()
        .map(|p| p.to_lowercase())
        .find_map(|pref| {
            voices
                .iter()
                .find(|v| voice_matches(v, &pref))
                .map(|v| v.name.clone())
        })
        .unwrap_or_else(|| fallback.to_string())
}

fn voice_matches(voice: &Voice, pref: &str) -> bool {
    let gender_match = match pref {
        "female" => voice.gender == Some('F'),
        "male" => voice.gender == Some('M'),
        _ => false,
    };
    gender_match || voice.name.to_lowercase().contains(pref)
}

/// espeak amplitude (0-200, 100 is normal) for a volume multiplier
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn amplitude_for(volume: f32) -> u32 {
    (volume * 100.0).round().clamp(0.0, 200.0) as u32
}

#[cfg(test)]
mod tests {
    use crate::config::SpeechBackend;

    use super::*;

    const VOICES: &str = "\
Pty Language       Age/Gender VoiceName          File                 Other Languages
 5  af              --/M      Afrikaans          gmw/af
 2  en-gb           --/M      English_(Great_Britain) gmw/en          (en 2)
 5  en-us           --/F      English_(America)  gmw/en-US            (en 3)
 5  hi              --/M      Hindi              inc/hi
";

    fn config(espeak_bin: Option<PathBuf>) -> SpeechConfig {
        SpeechConfig {
            backend: SpeechBackend::Espeak,
            rate: 180,
            volume: 1.0,
            voice_preferences: vec!["female".to_string(), "zira".to_string()],
            language: "en".to_string(),
            espeak_bin,
            openai_api_key: None,
            cloud_voice: "nova".to_string(),
        }
    }

    #[test]
    fn parses_voice_table() {
        let voices = parse_voice_list(VOICES);
        assert_eq!(voices.len(), 4);
        assert_eq!(voices[0].name, "Afrikaans");
        assert_eq!(voices[1].language, "en-gb");
        assert_eq!(voices[2].gender, Some('F'));
    }

    #[test]
    fn prefers_female_voice() {
        let voices = parse_voice_list(VOICES);
        let prefs = vec!["female".to_string()];
        assert_eq!(select_voice(&voices, &prefs, "en"), "English_(America)");
    }

    #[test]
    fn name_substring_matches_case_insensitively() {
        let voices = parse_voice_list(VOICES);
        let prefs = vec!["HINDI".to_string()];
        assert_eq!(select_voice(&voices, &prefs, "en"), "Hindi");
    }

    #[test]
    fn earlier_preference_wins() {
        let voices = parse_voice_list(VOICES);
        let prefs = vec!["zira".to_string(), "afrikaans".to_string(), "female".to_string()];
        assert_eq!(select_voice(&voices, &prefs, "en"), "Afrikaans");
    }

    #[test]
    fn falls_back_to_language() {
        let voices = parse_voice_list(VOICES);
        let prefs = vec!["zira".to_string()];
        assert_eq!(select_voice(&voices, &prefs, "mr"), "mr");
        assert_eq!(select_voice(&[], &prefs, "en"), "en");
    }

    #[test]
    fn volume_maps_to_amplitude() {
        assert_eq!(amplitude_for(1.0), 100);
        assert_eq!(amplitude_for(0.5), 50);
        assert_eq!(amplitude_for(5.0), 200);
    }

    #[tokio::test]
    async fn missing_engine_is_swallowed() {
        let dir = tempfile::tempdir().unwrap();
        let speaker = EspeakSpeaker::new(config(Some(dir.path().join("no-such-espeak"))));

        speaker.speak("hello").await;
    }

    #[tokio::test]
    async fn failed_engine_start_is_a_speech_error() {
        let dir = tempfile::tempdir().unwrap();
        let speaker = EspeakSpeaker::new(config(Some(dir.path().join("no-such-espeak"))));

        let err = speaker.speak_once("hello").await.unwrap_err();
        assert!(matches!(err, Error::Speech(_)));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn engine_receives_settings_and_text() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        let script = dir.path().join("fake-espeak");
        let args_file = dir.path().join("args");
        let text_file = dir.path().join("text");
        std::fs::write(
            &script,
            format!(
                "#!/bin/sh\n\
                 if [ \"$1\" = \"--voices\" ]; then\n\
                 printf '%s\\n' 'Pty Language Age/Gender VoiceName File' ' 5 en-us --/F English_(America) gmw/en-US'\n\
                 exit 0\n\
                 fi\n\
                 echo \"$@\" > {}\n\
                 cat > {}\n",
                args_file.display(),
                text_file.display()
            ),
        )
        .unwrap();
        std::fs::set_permissions(&script, std::fs::Permissions::from_mode(0o755)).unwrap();

        let speaker = EspeakSpeaker::new(config(Some(script)));
        speaker.speak_once("a red mug").await.unwrap();

        let args = std::fs::read_to_string(&args_file).unwrap();
        assert_eq!(args.trim(), "-s 180 -a 100 -v English_(America) --stdin");
        assert_eq!(std::fs::read_to_string(&text_file).unwrap(), "a red mug");
    }
}
