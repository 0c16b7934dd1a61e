//! Word count.

use std::path::Path;

/// Emits `(word, "1")` for every run of letters.
pub fn map(_source: &Path, contents: &str) -> Vec<(String, String)> {
    contents
        .split(|c: char| !c.is_alphabetic())
        .filter(|w| !w.is_empty())
        .map(|w| (w.to_owned(), "1".to_owned()))
        .collect()
}

pub fn reduce(_key: &str, values: &[String]) -> String {
    values.len().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counts_words() {
        let kvs = map(Path::new("x"), "It was the best, of times; it was");
        let words: Vec<&str> = kvs.iter().map(|(k, _)| k.as_str()).collect();
        assert_eq!(words, vec!["It", "was", "the", "best", "of", "times", "it", "was"]);
        assert_eq!(reduce("was", &["1".to_owned(), "1".to_owned()]), "2");
    }
}
