const COMPASS_POINTS: [&str; 16] = [
    "N", "NNE", "NE", "ENE", "E", "ESE", "SE", "SSE", "S", "SSW", "SW", "WSW", "W", "WNW", "NW",
    "NNW",
];

pub const SUN: &str = "\u{2600}\u{fe0f}";
pub const PARTLY_CLOUDY: &str = "\u{26c5}";
pub const CLOUD: &str = "\u{2601}\u{fe0f}";
pub const HEAVY_RAIN: &str = "\u{1f327}\u{fe0f}";
pub const LIGHT_RAIN: &str = "\u{1f326}\u{fe0f}";
pub const STORM: &str = "\u{26c8}\u{fe0f}";
pub const SNOW: &str = "\u{2744}\u{fe0f}";
pub const FOG: &str = "\u{1f32b}\u{fe0f}";
pub const WIND: &str = "\u{1f4a8}";
pub const FAIR: &str = "\u{1f324}\u{fe0f}";

/// Keyword groups in match order. "partly cloudy" has to come before "cloudy".
const GLYPH_RULES: &[(&[&str], &str)] = &[
    (&["sunny", "clear"], SUN),
    (&["partly cloudy"], PARTLY_CLOUDY),
    (&["cloudy", "overcast"], CLOUD),
    (&["rain", "drizzle"], LIGHT_RAIN),
    (&["thunder", "storm"], STORM),
    (&["snow"], SNOW),
    (&["fog", "mist"], FOG),
    (&["wind"], WIND),
];

/// Pick a glyph for a condition description; the first matching rule wins.
///
/// `_code` is the provider weather code. It is accepted so callers can pass it
/// through, but matching is done on the text alone.
pub fn weather_emoji(condition: &str, _code: Option<&str>) -> &'static str {
    let lower = condition.to_lowercase();

    GLYPH_RULES
        .iter()
        .find(|(keywords, _)| keywords.iter().any(|k| lower.contains(k)))
        .map(|&(_, glyph)| match glyph {
            LIGHT_RAIN if lower.contains("heavy") => HEAVY_RAIN,
            other => other,
        })
        .unwrap_or(FAIR)
}

/// Convert a meteorological bearing in degrees to a 16-point compass label.
pub fn degrees_to_compass(degrees: f64) -> &'static str {
    let sector = ((degrees + 11.25) / 22.5).floor() as i64;
    COMPASS_POINTS[sector.rem_euclid(16) as usize]
}

/// Upper-case the first letter of every word and lower-case the rest,
/// e.g. `"light intensity drizzle"` -> `"Light Intensity Drizzle"`.
pub fn title_case(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut at_word_start = true;

    for ch in text.chars() {
        if ch.is_alphabetic() {
            if at_word_start {
                out.extend(ch.to_uppercase());
            } else {
                out.extend(ch.to_lowercase());
            }
            at_word_start = false;
        } else {
            out.push(ch);
            at_word_start = true;
        }
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partly_cloudy_beats_cloudy() {
        assert_eq!(weather_emoji("Partly cloudy", None), PARTLY_CLOUDY);
        assert_eq!(weather_emoji("Cloudy", None), CLOUD);
        assert_eq!(weather_emoji("Overcast", Some("122")), CLOUD);
    }

    #[test]
    fn heavy_rain_vs_light_rain() {
        assert_eq!(weather_emoji("Heavy rain", None), HEAVY_RAIN);
        assert_eq!(weather_emoji("Light drizzle", None), LIGHT_RAIN);
        assert_eq!(weather_emoji("Patchy rain possible", None), LIGHT_RAIN);
    }

    #[test]
    fn first_match_wins() {
        // "rain" is checked before "thunder".
        assert_eq!(weather_emoji("Thundery rain", None), LIGHT_RAIN);
        assert_eq!(weather_emoji("Thunderstorm", None), STORM);
        assert_eq!(weather_emoji("Clear", None), SUN);
        assert_eq!(weather_emoji("Sunny", None), SUN);
    }

    #[test]
    fn remaining_groups_and_default() {
        assert_eq!(weather_emoji("Light snow", None), SNOW);
        assert_eq!(weather_emoji("Mist", None), FOG);
        assert_eq!(weather_emoji("Freezing fog", None), FOG);
        assert_eq!(weather_emoji("Windy", None), WIND);
        assert_eq!(weather_emoji("Haze", None), FAIR);
        assert_eq!(weather_emoji("", None), FAIR);
    }

    #[test]
    fn compass_cardinals_and_edges() {
        assert_eq!(degrees_to_compass(0.0), "N");
        assert_eq!(degrees_to_compass(11.0), "N");
        assert_eq!(degrees_to_compass(11.25), "NNE");
        assert_eq!(degrees_to_compass(90.0), "E");
        assert_eq!(degrees_to_compass(180.0), "S");
        assert_eq!(degrees_to_compass(270.0), "W");
        assert_eq!(degrees_to_compass(350.0), "N");
        assert_eq!(degrees_to_compass(337.5), "NNW");
        assert_eq!(degrees_to_compass(360.0), "N");
    }

    #[test]
    fn title_case_words() {
        assert_eq!(title_case("light intensity drizzle"), "Light Intensity Drizzle");
        assert_eq!(title_case("OVERCAST clouds"), "Overcast Clouds");
        assert_eq!(title_case("few clouds: 11-25%"), "Few Clouds: 11-25%");
    }
}
