//! Inverted index: for every word, the input files containing it.

use std::collections::BTreeSet;
use std::path::Path;

/// Emits `(word, source)` once per distinct word of the input.
pub fn map(source: &Path, contents: &str) -> Vec<(String, String)> {
    let words: BTreeSet<&str> = contents
        .split(|c: char| !c.is_alphabetic())
        .filter(|w| !w.is_empty())
        .collect();
    let source = source.display().to_string();
    words
        .into_iter()
        .map(|w| (w.to_owned(), source.clone()))
        .collect()
}

/// `<count> <file>,<file>,...` with the files sorted.
pub fn reduce(_key: &str, values: &[String]) -> String {
    let files: BTreeSet<&str> = values.iter().map(String::as_str).collect();
    let files: Vec<&str> = files.into_iter().collect();
    format!("{} {}", files.len(), files.join(","))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn one_entry_per_word_and_file() {
        let kvs = map(Path::new("a.txt"), "to be or not to be");
        assert_eq!(kvs.len(), 4);
        assert!(kvs.iter().all(|(_, f)| f == "a.txt"));

        let files = vec!["b.txt".to_owned(), "a.txt".to_owned(), "b.txt".to_owned()];
        assert_eq!(reduce("be", &files), "2 a.txt,b.txt");
    }
}
