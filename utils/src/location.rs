use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    static ref ZIP_CODE: Regex = Regex::new(r"\b\d{5}\b").unwrap();
}

/// First standalone five-digit group in a free-form location,
/// e.g. "Los Angeles, CA 90001" -> "90001"
pub fn extract_zip_code(location: &str) -> Option<&str> {
    ZIP_CODE.find(location).map(|m| m.as_str())
}
