/// Validate latitude and longitude coordinates
pub fn validate_coordinates(lat: f64, lon: f64) -> Result<(), String> {
    if !(-90.0..=90.0).contains(&lat) {
        return Err(format!("Invalid latitude: {}. Must be between -90 and 90", lat));
    }
    if !(-180.0..=180.0).contains(&lon) {
        return Err(format!("Invalid longitude: {}. Must be between -180 and 180", lon));
    }
    Ok(())
}

/// Round to specified decimal places. `-0.0` comes back as `0.0`.
pub fn round_to_decimals(value: f64, decimals: u32) -> f64 {
    let multiplier = 10_f64.powi(decimals as i32);
    (value * multiplier).round() / multiplier + 0.0
}

/// Two ASCII letters, e.g. `en` or `PT`.
pub fn is_valid_lang_code(lang: &str) -> bool {
    lang.len() == 2 && lang.chars().all(|c| c.is_ascii_alphabetic())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_coordinates() {
        assert!(validate_coordinates(51.5, -0.12).is_ok());
        assert!(validate_coordinates(90.0, 180.0).is_ok());
        assert!(validate_coordinates(90.1, 0.0).is_err());
        assert!(validate_coordinates(0.0, -180.5).is_err());
        assert!(validate_coordinates(f64::NAN, 0.0).is_err());
    }

    #[test]
    fn test_round_to_decimals() {
        assert_eq!(round_to_decimals(51.50741, 4), 51.5074);
        assert_eq!(round_to_decimals(-0.12779, 4), -0.1278);
        assert!(round_to_decimals(-0.00001, 4).is_sign_positive());
    }

    #[test]
    fn test_lang_code() {
        assert!(is_valid_lang_code("en"));
        assert!(is_valid_lang_code("PT"));
        assert!(!is_valid_lang_code("eng"));
        assert!(!is_valid_lang_code("e1"));
        assert!(!is_valid_lang_code(""));
    }
}
