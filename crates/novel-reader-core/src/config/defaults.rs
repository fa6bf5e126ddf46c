use crate::speech::ProviderKind;

pub(crate) fn default_words_per_page() -> usize {
    400
}

pub(crate) fn default_skip_words() -> usize {
    50
}

pub(crate) fn default_max_phrase_words() -> usize {
    20
}

pub(crate) fn default_resume_after_navigation() -> bool {
    false
}

pub(crate) fn default_pacing_ms() -> u64 {
    100
}

pub(crate) fn default_synthesis_retry_ms() -> u64 {
    500
}

pub(crate) fn default_playback_error_retry_ms() -> u64 {
    500
}

pub(crate) fn default_blocked_retry_ms() -> u64 {
    1000
}

pub(crate) fn default_unlock_retry_ms() -> u64 {
    200
}

pub(crate) fn default_provider() -> ProviderKind {
    ProviderKind::Primary
}

pub(crate) fn default_voice() -> String {
    "en-US-Neural2-C".to_string()
}

pub(crate) fn default_tts_speed() -> f32 {
    1.0
}

pub(crate) fn default_tts_pitch() -> f32 {
    1.0
}

pub(crate) fn default_primary_endpoint() -> String {
    "https://translate.google.com/translate_tts".to_string()
}

pub(crate) fn default_primary_language() -> String {
    "en".to_string()
}

pub(crate) fn default_primary_client() -> String {
    "tw-ob".to_string()
}

pub(crate) fn default_secondary_endpoint() -> String {
    "https://voice-generator.pages.dev/api/v1/audio/speech".to_string()
}

pub(crate) fn default_secondary_model() -> String {
    "kokoro-v0_19".to_string()
}

pub(crate) fn default_request_timeout_secs() -> u64 {
    15
}

pub(crate) fn default_log_level() -> crate::config::LogLevel {
    crate::config::LogLevel::Info
}

pub(crate) fn default_cache_dir() -> String {
    ".cache".to_string()
}
