//! Recovering play order from trajectory file names.
//!
//! Recorders name episodes `<prefix><index>.<ext>` with a nine digit,
//! zero padded index. The prefix is discovered from the unique first-index
//! file and every other file must share it.
use regex::Regex;
use std::path::Path;

use crate::collector::TrajectoryFile;
use crate::error::{Result, TrajError};

/// Zero padded index carried by the first episode of every sequence.
pub const FIRST_INDEX_TOKEN: &str = "000000000";

/// Order `files` (all from `dir`) by the integer index embedded in their names.
///
/// Files whose indices parse to the same integer keep their relative input
/// order.
///
/// # Errors
///
/// - [`TrajError::AmbiguousPrefix`] unless exactly one file carries the
///   first-index token.
/// - [`TrajError::InconsistentPrefix`] if a file lacks the shared prefix.
/// - [`TrajError::MalformedIndex`] if an index token is not an integer.
pub fn order_sequence(
    dir: &Path,
    files: Vec<TrajectoryFile>,
    extension: &str,
) -> Result<Vec<TrajectoryFile>> {
    if files.is_empty() {
        return Ok(files);
    }

    let prefix = shared_prefix(dir, &files, extension)?;
    let mut indexed = Vec::with_capacity(files.len());
    for file in files {
        let index = parse_index(&file, &prefix)?;
        indexed.push((index, file));
    }

    indexed.sort_by_key(|(index, _)| *index);
    log::debug!(
        "ordered {} episodes in {} (prefix {prefix:?})",
        indexed.len(),
        dir.display()
    );
    Ok(indexed.into_iter().map(|(_, file)| file).collect())
}

fn first_index_pattern(extension: &str) -> Regex {
    let pattern = format!(
        r"^(?s)(?P<prefix>.*){FIRST_INDEX_TOKEN}\.{}$",
        regex::escape(extension)
    );
    Regex::new(&pattern).expect("extension is escaped and the token is literal digits")
}

fn shared_prefix(dir: &Path, files: &[TrajectoryFile], extension: &str) -> Result<String> {
    let pattern = first_index_pattern(extension);
    let mut firsts = files
        .iter()
        .filter_map(|file| pattern.captures(file.file_name()))
        .map(|caps| caps["prefix"].to_string());

    match (firsts.next(), firsts.next()) {
        (Some(prefix), None) => Ok(prefix),
        (first, second) => {
            let found = usize::from(first.is_some()) + usize::from(second.is_some()) + firsts.count();
            Err(TrajError::AmbiguousPrefix {
                dir: dir.to_path_buf(),
                token: format!("{FIRST_INDEX_TOKEN}.{extension}"),
                found,
            })
        }
    }
}

fn parse_index(file: &TrajectoryFile, prefix: &str) -> Result<u64> {
    let stem = file.stem();
    let token = if prefix.is_empty() {
        stem
    } else {
        let Some((_, rest)) = stem.split_once(prefix) else {
            return Err(TrajError::InconsistentPrefix {
                path: file.path().to_path_buf(),
                prefix: prefix.to_string(),
            });
        };
        rest
    };

    token
        .parse::<u64>()
        .map_err(|_| TrajError::MalformedIndex {
            path: file.path().to_path_buf(),
            token: token.to_string(),
        })
}
