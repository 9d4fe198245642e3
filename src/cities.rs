//! Static city table and display-name translation.
//!
//! City keys are stable, uppercase identifiers used throughout the pipeline
//! and as staging file names. Display names are applied only when building
//! report rows.

/// City key to forecast payload URL.
pub static CITIES: &[(&str, &str)] = &[
    (
        "MOSCOW",
        "https://code.s3.yandex.net/async-module/moscow-response.json",
    ),
    (
        "PARIS",
        "https://code.s3.yandex.net/async-module/paris-response.json",
    ),
    (
        "LONDON",
        "https://code.s3.yandex.net/async-module/london-response.json",
    ),
    (
        "BERLIN",
        "https://code.s3.yandex.net/async-module/berlin-response.json",
    ),
    (
        "BEIJING",
        "https://code.s3.yandex.net/async-module/beijing-response.json",
    ),
    (
        "KAZAN",
        "https://code.s3.yandex.net/async-module/kazan-response.json",
    ),
    (
        "SPETERSBURG",
        "https://code.s3.yandex.net/async-module/spetersburg-response.json",
    ),
    (
        "VOLGOGRAD",
        "https://code.s3.yandex.net/async-module/volgograd-response.json",
    ),
    (
        "NOVOSIBIRSK",
        "https://code.s3.yandex.net/async-module/novosibirsk-response.json",
    ),
    (
        "KALININGRAD",
        "https://code.s3.yandex.net/async-module/kaliningrad-response.json",
    ),
    (
        "ABUDHABI",
        "https://code.s3.yandex.net/async-module/abudhabi-response.json",
    ),
    (
        "WARSZAWA",
        "https://code.s3.yandex.net/async-module/warszawa-response.json",
    ),
    (
        "BUCHAREST",
        "https://code.s3.yandex.net/async-module/bucharest-response.json",
    ),
    (
        "ROMA",
        "https://code.s3.yandex.net/async-module/roma-response.json",
    ),
    (
        "CAIRO",
        "https://code.s3.yandex.net/async-module/cairo-response.json",
    ),
    (
        "GIZA",
        "https://code.s3.yandex.net/async-module/giza-response.json",
    ),
    (
        "MADRID",
        "https://code.s3.yandex.net/async-module/madrid-response.json",
    ),
    (
        "TORONTO",
        "https://code.s3.yandex.net/async-module/toronto-response.json",
    ),
];

/// City key to human-readable label. Not every key in [`CITIES`] has an
/// entry; [`display_name`] falls back to the key itself.
static DISPLAY_NAMES: &[(&str, &str)] = &[
    ("MOSCOW", "Moscow"),
    ("PARIS", "Paris"),
    ("LONDON", "London"),
    ("BERLIN", "Berlin"),
    ("BEIJING", "Beijing"),
    ("KAZAN", "Kazan"),
    ("SPETERSBURG", "Saint Petersburg"),
    ("VOLGOGRAD", "Volgograd"),
    ("ROMA", "Rome"),
    ("NOVOSIBIRSK", "Novosibirsk"),
    ("KALININGRAD", "Kaliningrad"),
    ("ABUDHABI", "Abu Dhabi"),
    ("WARSZAWA", "Warsaw"),
    ("BUCHAREST", "Bucharest"),
    ("CAIRO", "Cairo"),
];

/// Returns the payload URL for a city key, or `None` for an unknown city.
pub fn url_for(city: &str) -> Option<&'static str> {
    CITIES
        .iter()
        .find(|(key, _)| *key == city)
        .map(|(_, url)| *url)
}

/// Returns the human-readable label for a city key, falling back to the
/// key itself when no translation exists.
pub fn display_name(city: &str) -> &str {
    DISPLAY_NAMES
        .iter()
        .find(|(key, _)| *key == city)
        .map_or(city, |(_, name)| *name)
}

/// All configured city keys.
pub fn all_keys() -> Vec<String> {
    CITIES.iter().map(|(key, _)| (*key).to_string()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_url_for_known_city() {
        let url = url_for("MOSCOW").unwrap();
        assert!(url.ends_with("moscow-response.json"));
    }

    #[test]
    fn test_url_for_unknown_city() {
        assert!(url_for("ATLANTIS").is_none());
    }

    #[test]
    fn test_display_name_translated() {
        assert_eq!(display_name("SPETERSBURG"), "Saint Petersburg");
    }

    #[test]
    fn test_display_name_falls_back_to_key() {
        // GIZA has a URL but no translation entry
        assert!(url_for("GIZA").is_some());
        assert_eq!(display_name("GIZA"), "GIZA");
    }

    #[test]
    fn test_all_keys_matches_table() {
        assert_eq!(all_keys().len(), CITIES.len());
    }
}
