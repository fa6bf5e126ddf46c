use super::ProviderKind;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VoiceOption {
    pub id: &'static str,
    pub label: &'static str,
    pub provider: ProviderKind,
}

const VOICES: &[VoiceOption] = &[
    VoiceOption {
        id: "en-US-Neural2-C",
        label: "Elena (Female, Natural)",
        provider: ProviderKind::Primary,
    },
    VoiceOption {
        id: "en-US-Neural2-A",
        label: "Aria (Female, Warm)",
        provider: ProviderKind::Primary,
    },
    VoiceOption {
        id: "en-US-Neural2-D",
        label: "Paxton (Male, Deep)",
        provider: ProviderKind::Primary,
    },
    VoiceOption {
        id: "en-US-Neural2-E",
        label: "Liam (Male, Friendly)",
        provider: ProviderKind::Primary,
    },
    VoiceOption {
        id: "af_sky",
        label: "Sky (Female)",
        provider: ProviderKind::Secondary,
    },
    VoiceOption {
        id: "af_bella",
        label: "Bella (Female)",
        provider: ProviderKind::Secondary,
    },
    VoiceOption {
        id: "am_alloy",
        label: "Alloy (Male)",
        provider: ProviderKind::Secondary,
    },
    VoiceOption {
        id: "am_michael",
        label: "Michael (Male)",
        provider: ProviderKind::Secondary,
    },
];

pub fn voice_catalog() -> &'static [VoiceOption] {
    VOICES
}

pub fn find_voice(id: &str) -> Option<&'static VoiceOption> {
    VOICES.iter().find(|voice| voice.id.eq_ignore_ascii_case(id))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn catalog_maps_voices_to_providers() {
        assert_eq!(voice_catalog().len(), 8);
        assert_eq!(find_voice("af_bella").map(|v| v.provider), Some(ProviderKind::Secondary));
        assert_eq!(
            find_voice("EN-US-NEURAL2-D").map(|v| v.provider),
            Some(ProviderKind::Primary)
        );
        assert!(find_voice("robot").is_none());
    }
}
