use rand::seq::SliceRandom;
use rand::Rng;

/// BCP-47 language tags observed in real browser `Accept-Language` headers,
/// roughly ordered by global prevalence.
const LANGUAGE_TAGS: &[&str] = &[
    "en-US", "en-GB", "en-CA", "en-AU", "en-IN", "en-ZA", "en-NZ", "en-IE",
    "es-ES", "es-MX", "es-AR", "es-CL", "es-CO", "es-419",
    "fr-FR", "fr-CA", "fr-BE", "fr-CH",
    "de-DE", "de-AT", "de-CH",
    "it-IT", "it-CH",
    "pt-BR", "pt-PT",
    "nl-NL", "nl-BE",
    "ru-RU", "uk-UA",
    "pl-PL", "cs-CZ", "sk-SK", "hu-HU", "ro-RO", "bg-BG", "el-GR",
    "sv-SE", "nb-NO", "da-DK", "fi-FI",
    "tr-TR", "ar-SA", "ar-EG", "he-IL", "fa-IR",
    "hi-IN", "bn-BD", "ta-IN", "th-TH", "vi-VN", "id-ID", "ms-MY",
    "zh-CN", "zh-TW", "zh-HK", "ja-JP", "ko-KR",
];

/// Generates a comma-joined `Accept-Language` value: 2-5 distinct BCP-47
/// tags in descending-preference order with `q` weights
/// (`q = max(0.1, 1 - 0.1*i)` for `i >= 1`; the first tag carries no `q`).
pub fn random_accept_language() -> String {
    let mut rng = rand::rng();
    let count = rng.random_range(2..=5);
    let chosen: Vec<&str> = LANGUAGE_TAGS
        .choose_multiple(&mut rng, count)
        .copied()
        .collect();

    chosen
        .iter()
        .enumerate()
        .map(|(i, tag)| {
            if i == 0 {
                tag.to_string()
            } else {
                let q = (1.0 - 0.1 * i as f64).max(0.1);
                format!("{tag};q={q:.1}")
            }
        })
        .collect::<Vec<_>>()
        .join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn catalog_has_at_least_fifty_entries() {
        assert!(LANGUAGE_TAGS.len() >= 50, "only {} entries", LANGUAGE_TAGS.len());
    }

    #[test]
    fn generated_header_has_descending_q_values() {
        for _ in 0..50 {
            let header = random_accept_language();
            let parts: Vec<&str> = header.split(", ").collect();
            assert!(parts.len() >= 2 && parts.len() <= 5);
            assert!(!parts[0].contains(";q="));
            for part in &parts[1..] {
                assert!(part.contains(";q="));
            }
        }
    }
}
