use chrono::NaiveDate;
use once_cell::sync::Lazy;
use regex::Regex;

static CROP_YEAR: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\d{4}/\d{2}$").unwrap());

static BULLETIN_MONTH: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)wasde[_-]?(\d{2})(\d{2})").unwrap());

/// Parse a report figure: strip thousands separators and surrounding
/// whitespace. Footnote markers and anything else non-numeric give `None`.
pub fn parse_figure(raw: &str) -> Option<f64> {
    let cleaned: String = raw.trim().chars().filter(|c| *c != ',').collect();
    if cleaned.is_empty() {
        return None;
    }
    cleaned.parse::<f64>().ok().filter(|v| v.is_finite())
}

/// `true` for crop-year labels such as `2024/25`.
pub fn is_crop_year(token: &str) -> bool {
    CROP_YEAR.is_match(token)
}

/// Lines inside a table block are indented; the first flush-left line ends it.
pub fn is_indented(line: &str) -> bool {
    line.starts_with(' ') || line.starts_with('\t')
}

/// Derive the release-month label from a bulletin filename following the
/// `wasdeMMYY` convention, e.g. `wasde0225_TXT.txt` → `Feb`.
/// Returns `None` when the name does not carry a valid month.
pub fn month_label_from_filename(filename: &str) -> Option<String> {
    let caps = BULLETIN_MONTH.captures(filename)?;
    let month: u32 = caps.get(1)?.as_str().parse().ok()?;
    let year: i32 = caps.get(2)?.as_str().parse().ok()?;
    let date = NaiveDate::from_ymd_opt(2000 + year, month, 1)?;
    Some(date.format("%b").to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn figures_parse_with_separators() {
        assert_eq!(parse_figure("1,062.04"), Some(1062.04));
        assert_eq!(parse_figure(" 257.57 "), Some(257.57));
        assert_eq!(parse_figure("-3.1"), Some(-3.1));
    }

    #[test]
    fn footnoted_figures_are_missing() {
        assert_eq!(parse_figure("790.3*"), None);
        assert_eq!(parse_figure("NA"), None);
        assert_eq!(parse_figure(""), None);
        assert_eq!(parse_figure(","), None);
    }

    #[test]
    fn crop_year_shape() {
        assert!(is_crop_year("2024/25"));
        assert!(!is_crop_year("Feb"));
        assert!(!is_crop_year("2024"));
        assert!(!is_crop_year("2024/2025"));
    }

    #[test]
    fn indentation_marker() {
        assert!(is_indented("   2023/24  1  2"));
        assert!(is_indented("\t2023/24"));
        assert!(!is_indented("Coarse Grains"));
        assert!(!is_indented(""));
    }

    #[test]
    fn month_from_bulletin_filename() {
        assert_eq!(month_label_from_filename("wasde0225_TXT.txt").as_deref(), Some("Feb"));
        assert_eq!(month_label_from_filename("WASDE1119.xls").as_deref(), Some("Nov"));
        assert_eq!(month_label_from_filename("wasde1325.txt"), None);
        assert_eq!(month_label_from_filename("latest.txt"), None);
    }
}
