use std::fmt;

/// Audio container/codec as inferred from the source URL or content-type.
///
/// `Native` formats go straight to the speech engine; everything else must
/// pass through the transcoding service first.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AudioFormat {
    Mp3,
    Wav,
    M4a,
    Mp4,
    Mpeg,
    Mpga,
    Webm,
    Ogg,
    Flac,
    Aac,
    Amr,
    Wma,
    Opus,
    ThreeGp,
    Aiff,
}

const NATIVE: &[AudioFormat] = &[
    AudioFormat::Mp3,
    AudioFormat::Wav,
    AudioFormat::M4a,
    AudioFormat::Mp4,
    AudioFormat::Mpeg,
    AudioFormat::Mpga,
    AudioFormat::Webm,
    AudioFormat::Ogg,
    AudioFormat::Flac,
];

impl AudioFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            AudioFormat::Mp3 => "mp3",
            AudioFormat::Wav => "wav",
            AudioFormat::M4a => "m4a",
            AudioFormat::Mp4 => "mp4",
            AudioFormat::Mpeg => "mpeg",
            AudioFormat::Mpga => "mpga",
            AudioFormat::Webm => "webm",
            AudioFormat::Ogg => "ogg",
            AudioFormat::Flac => "flac",
            AudioFormat::Aac => "aac",
            AudioFormat::Amr => "amr",
            AudioFormat::Wma => "wma",
            AudioFormat::Opus => "opus",
            AudioFormat::ThreeGp => "3gp",
            AudioFormat::Aiff => "aiff",
        }
    }

    fn all() -> &'static [AudioFormat] {
        &[
            AudioFormat::Mp3,
            AudioFormat::Wav,
            AudioFormat::M4a,
            AudioFormat::Mp4,
            AudioFormat::Mpeg,
            AudioFormat::Mpga,
            AudioFormat::Webm,
            AudioFormat::Ogg,
            AudioFormat::Flac,
            AudioFormat::Aac,
            AudioFormat::Amr,
            AudioFormat::Wma,
            AudioFormat::Opus,
            AudioFormat::ThreeGp,
            AudioFormat::Aiff,
        ]
    }

    pub fn needs_conversion(&self) -> bool {
        !NATIVE.contains(self)
    }

    /// Infer the format from the URL's path extension, then from the
    /// content-type string. Total: falls back to mp3 when nothing matches.
    pub fn detect(url: &str, content_type: Option<&str>) -> AudioFormat {
        // Strip query/fragment so extensions like ".mp3?token=..." match.
        let path = url
            .split(['?', '#'])
            .next()
            .unwrap_or(url)
            .to_ascii_lowercase();

        for format in Self::all() {
            if path.ends_with(&format!(".{}", format.as_str())) {
                return *format;
            }
        }

        if let Some(ct) = content_type {
            let ct = ct.to_ascii_lowercase();
            for format in Self::all() {
                if ct.contains(format.as_str()) {
                    return *format;
                }
            }
        }

        AudioFormat::Mp3
    }
}

impl fmt::Display for AudioFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
