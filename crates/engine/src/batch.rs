//! Size-bounded batching of file arguments
//!
//! Paths are quoted and joined with a single separator. A new batch starts
//! whenever the next path would push the joined text over the limit, so every
//! batch's [`Batch::char_len`] stays within it.

use crate::{Error, Result};

/// Separator between quoted paths
pub const PATH_SEPARATOR: &str = " ";

/// One invocation's worth of paths
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Batch {
    paths: Vec<String>,
    length: usize,
}

impl Batch {
    pub fn paths(&self) -> &[String] {
        &self.paths
    }

    /// Length in characters of the joined, quoted path text
    pub fn char_len(&self) -> usize {
        self.length
    }

    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }

    /// The joined, quoted path text
    pub fn command_text(&self) -> String {
        self.paths
            .iter()
            .map(|path| quote(path))
            .collect::<Vec<_>>()
            .join(PATH_SEPARATOR)
    }

    fn len_with(&self, quoted_len: usize) -> usize {
        if self.paths.is_empty() {
            quoted_len
        } else {
            self.length + PATH_SEPARATOR.chars().count() + quoted_len
        }
    }

    fn push(&mut self, path: &str, quoted_len: usize) {
        self.length = self.len_with(quoted_len);
        self.paths.push(path.to_string());
    }
}

fn quote(path: &str) -> String {
    format!("\"{path}\"")
}

fn quoted_len(path: &str) -> usize {
    path.chars().count() + 2
}

/// Partition `paths` into batches whose joined text fits in `max_len`
///
/// Order is preserved. A path that cannot fit even on its own is an error.
pub fn batch_paths<S: AsRef<str>>(paths: &[S], max_len: usize) -> Result<Vec<Batch>> {
    let mut batches = Vec::new();
    let mut current = Batch::default();

    for path in paths {
        let path = path.as_ref();
        let len = quoted_len(path);
        if len > max_len {
            return Err(Error::PathTooLong {
                path: path.to_string(),
                max: max_len,
            });
        }

        if current.len_with(len) > max_len {
            batches.push(std::mem::take(&mut current));
        }
        current.push(path, len);
    }

    if !current.is_empty() {
        batches.push(current);
    }

    tracing::debug!("Split {} paths into {} batches", paths.len(), batches.len());
    Ok(batches)
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;

    #[test]
    fn test_many_short_paths_split_within_limit() {
        let paths: Vec<String> = (0..1200)
            .map(|i| char::from(b'a' + u8::try_from(i % 26).unwrap()).to_string())
            .collect();

        let batches = batch_paths(&paths, 1000).unwrap();

        assert!(batches.len() >= 2);
        for batch in &batches {
            assert!(batch.char_len() <= 1000);
            assert_eq!(batch.char_len(), batch.command_text().chars().count());
        }
    }

    #[test]
    fn test_batches_recover_original_paths() {
        let paths: Vec<String> = (0..300)
            .map(|i| format!("/ws/art/asset with space {i}.fbx"))
            .collect();

        for max_len in [40, 100, 1000, 100_000] {
            let batches = batch_paths(&paths, max_len).unwrap();
            let recovered: Vec<String> = batches
                .iter()
                .flat_map(|b| b.paths().iter().cloned())
                .collect();

            assert_eq!(recovered, paths);
            assert!(batches.iter().all(|b| b.char_len() <= max_len));
        }
    }

    #[test]
    fn test_exact_fit_stays_in_one_batch() {
        // "ab" "cd" -> 4 + 1 + 4
        let batches = batch_paths(&["ab", "cd"], 9).unwrap();
        assert_eq!(batches.len(), 1);
        assert_eq!(batches[0].command_text(), "\"ab\" \"cd\"");

        let batches = batch_paths(&["ab", "cd"], 8).unwrap();
        assert_eq!(batches.len(), 2);
    }

    #[test]
    fn test_counts_characters_not_bytes() {
        let batches = batch_paths(&["/ws/été.fbx"], 13).unwrap();
        assert_eq!(batches[0].char_len(), 13);
    }

    #[test]
    fn test_oversized_path_is_rejected() {
        let long = "x".repeat(20);
        let err = batch_paths(&[long], 10).unwrap_err();
        assert!(matches!(err, Error::PathTooLong { max: 10, .. }));
    }

    #[test]
    fn test_empty_input() {
        assert!(batch_paths::<&str>(&[], 1000).unwrap().is_empty());
    }
}
