//! CSV delimiter detection.

/// Candidate delimiters, in tie-break order (comma first).
const CANDIDATES: &[char] = &[',', ';', '\t', '|'];

/// Default number of chars sampled from the head of the input.
pub const DEFAULT_SAMPLE_SIZE: usize = 1024;

/// Detect the delimiter of a CSV payload by scoring a small candidate
/// set over a sample of the input.
///
/// Each candidate scores its raw occurrence count, with a bonus when the
/// per-line count is consistent across lines (real delimiters split every
/// row the same way) and another when the implied column count is
/// plausible (2–20). Highest score wins; comma is returned when every
/// candidate scores zero, or for empty and single-column input.
pub fn detect_delimiter(text: &str, sample_size: usize) -> char {
    let sample: String = text.chars().take(sample_size).collect();
    if sample.trim().is_empty() {
        return ',';
    }

    let lines: Vec<&str> = sample
        .lines()
        .filter(|line| !line.trim().is_empty())
        .collect();

    let mut best = ',';
    let mut best_score = 0usize;

    for &candidate in CANDIDATES {
        let total = sample.matches(candidate).count();
        if total == 0 {
            continue;
        }

        let counts: Vec<usize> = lines
            .iter()
            .map(|line| line.matches(candidate).count())
            .collect();

        let mut score = total;

        // Consistent split across multiple lines is the strongest signal.
        if counts.len() >= 2 && counts[0] > 0 && counts.iter().all(|&c| c == counts[0]) {
            score += total * 2;
        }

        // Plausible column count for tabular data.
        let columns = counts.first().copied().unwrap_or(0) + 1;
        if (2..=20).contains(&columns) {
            score += total;
        }

        if score > best_score {
            best_score = score;
            best = candidate;
        }
    }

    best
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detect_comma() {
        let content = "ID,Name,Value\n1,Test,100\n2,Test2,200";
        assert_eq!(detect_delimiter(content, DEFAULT_SAMPLE_SIZE), ',');
    }

    #[test]
    fn test_detect_semicolon() {
        let content = "ID;Name;Value\n1;Test;100\n2;Test2;200";
        assert_eq!(detect_delimiter(content, DEFAULT_SAMPLE_SIZE), ';');
    }

    #[test]
    fn test_detect_tab() {
        let content = "ID\tName\tValue\n1\tTest\t100\n2\tTest2\t200";
        assert_eq!(detect_delimiter(content, DEFAULT_SAMPLE_SIZE), '\t');
    }

    #[test]
    fn test_detect_pipe() {
        let content = "ID|Name|Value\n1|Test|100\n2|Test2|200";
        assert_eq!(detect_delimiter(content, DEFAULT_SAMPLE_SIZE), '|');
    }

    #[test]
    fn test_fallback_to_comma_when_no_delimiter() {
        let content = "IDNameValue\n1Test100\n2Test2200";
        assert_eq!(detect_delimiter(content, DEFAULT_SAMPLE_SIZE), ',');
    }

    #[test]
    fn test_empty_input() {
        assert_eq!(detect_delimiter("", DEFAULT_SAMPLE_SIZE), ',');
    }

    #[test]
    fn test_single_line() {
        assert_eq!(detect_delimiter("ID,Name,Value", DEFAULT_SAMPLE_SIZE), ',');
    }

    #[test]
    fn test_mixed_delimiters_picks_most_frequent() {
        let content = "ID,Name,Value;Extra\n1,Test,100;Data\n2,Test2,200;More";
        assert_eq!(detect_delimiter(content, DEFAULT_SAMPLE_SIZE), ',');
    }

    #[test]
    fn test_unicode_content() {
        let content = "ID,Name,Value\n1,Tëst,100\n2,Tëst2,200";
        assert_eq!(detect_delimiter(content, DEFAULT_SAMPLE_SIZE), ',');
    }

    #[test]
    fn test_large_content_uses_sample_only() {
        let mut lines = vec!["ID;Name;Value".to_string()];
        for i in 0..1000 {
            lines.push(format!("{i};Test{i};{}", i * 100));
        }
        let content = lines.join("\n");
        assert_eq!(detect_delimiter(&content, DEFAULT_SAMPLE_SIZE), ';');
    }

    #[test]
    fn test_semicolon_values_with_comma_decimals() {
        // German-style decimals: commas appear inside values but are
        // inconsistent per line, while the semicolon splits every line
        // identically.
        let content = "ID;Preis;Ort\n1;12,5;Wien\n2;7,25;Graz\n3;1300;Linz";
        assert_eq!(detect_delimiter(content, DEFAULT_SAMPLE_SIZE), ';');
    }
}
