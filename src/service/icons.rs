/// Map an OpenWeather icon code (e.g. `01d`) to a display glyph.
/// Unknown codes map to an empty string.
pub fn icon_for(code: &str) -> &'static str {
    match code {
        "01d" => "☀",
        "01n" => "🌙",
        "02d" => "⛅",
        "02n" => "☁",
        "03d" | "03n" => "☁",
        "04d" | "04n" => "🌥",
        "09d" | "09n" => "🌧",
        "10d" => "🌦",
        "10n" => "🌧",
        "11d" | "11n" => "⛈",
        "13d" | "13n" => "❄",
        "50d" | "50n" => "🌫",
        _ => "",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_codes() {
        assert_eq!(icon_for("01d"), "☀");
        assert_eq!(icon_for("13n"), "❄");
    }

    #[test]
    fn test_unknown_code_is_empty() {
        assert_eq!(icon_for("99x"), "");
        assert_eq!(icon_for(""), "");
    }
}
