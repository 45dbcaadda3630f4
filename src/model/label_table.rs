use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::path::Path;

/// Labels used when no label file is configured.
pub const DEFAULT_SIGN_LABELS: [&str; 10] = [
    "hello", "i", "you", "yes", "no", "how", "help", "good", "thanks", "goodbye",
];

/// Class names, index-aligned with the model's output scores.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LabelTable {
    labels: Vec<String>,
}

impl LabelTable {
    pub fn new(labels: Vec<String>) -> Self {
        LabelTable { labels }
    }

    pub fn get(&self, index: usize) -> Option<&str> {
        self.labels.get(index).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.labels.iter().map(String::as_str)
    }
}

impl Default for LabelTable {
    fn default() -> Self {
        LabelTable::new(DEFAULT_SIGN_LABELS.iter().map(|s| s.to_string()).collect())
    }
}

impl<S: Into<String>> FromIterator<S> for LabelTable {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        LabelTable::new(iter.into_iter().map(Into::into).collect())
    }
}

/// Reads a file with one label per line so that the output positions which come directly from
/// the inference session can be given meaning. Blank lines are skipped and surrounding
/// whitespace is trimmed.
pub fn read_labels_txt_file(filepath: &Path) -> io::Result<LabelTable> {
    let mut labels = Vec::new();
    for line in BufReader::new(File::open(filepath)?).lines() {
        let line = line?;
        let label = line.trim();
        if !label.is_empty() {
            labels.push(label.to_string());
        }
    }
    Ok(LabelTable::new(labels))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reads_test_labels() {
        let labels = read_labels_txt_file(Path::new("./data/test_data/labels.txt")).unwrap();
        assert_eq!(
            labels.iter().collect::<Vec<_>>(),
            vec!["idle", "hello", "good", "thanks"]
        );
    }

    #[test]
    fn missing_file_is_an_error() {
        assert!(read_labels_txt_file(Path::new("./data/test_data/no_such_labels.txt")).is_err());
    }

    #[test]
    fn default_table_has_ten_signs() {
        let labels = LabelTable::default();
        assert_eq!(labels.len(), 10);
        assert_eq!(labels.get(0), Some("hello"));
        assert_eq!(labels.get(9), Some("goodbye"));
        assert_eq!(labels.get(10), None);
    }
}
