// MIT License
//
// Copyright (c) 2026 Raja Lehtihet & Wael El Oraiby
//
// Permission is hereby granted, free of charge, to any person obtaining a copy
// of this software and associated documentation files (the "Software"), to deal
// in the Software without restriction, including without limitation the rights
// to use, copy, modify, merge, publish, distribute, sublicense, and/or sell
// copies of the Software, and to permit persons to whom the Software is
// furnished to do so, subject to the following conditions:
//
// The above copyright notice and this permission notice shall be included in all
// copies or substantial portions of the Software.
//
// THE SOFTWARE IS PROVIDED "AS IS", WITHOUT WARRANTY OF ANY KIND, EXPRESS OR
// IMPLIED, INCLUDING BUT NOT LIMITED TO THE WARRANTIES OF MERCHANTABILITY,
// FITNESS FOR A PARTICULAR PURPOSE AND NONINFRINGEMENT. IN NO EVENT SHALL THE
// AUTHORS OR COPYRIGHT HOLDERS BE LIABLE FOR ANY CLAIM, DAMAGES OR OTHER
// LIABILITY, WHETHER IN AN ACTION OF CONTRACT, TORT OR OTHERWISE, ARISING FROM,
// OUT OF OR IN CONNECTION WITH THE SOFTWARE OR THE USE OR OTHER DEALINGS IN THE
// SOFTWARE.
//
//! Locating the simulator's output directory.

use std::path::{Path, PathBuf};

use tracing::debug;

use crate::{AnalysisError, Result};

/// Directory the simulator writes its logs into.
pub const TARGET_DIRECTORY: &str = "target";

/// Default occupancy log name inside the target directory.
pub const COUNTS_FILE: &str = "counts.txt";

/// Default windowed histogram name inside the target directory.
pub const WINDOWED_FILE: &str = "windowed_output.txt";

/// Walks from `start` towards the filesystem root and returns the first
/// `target` directory found.
///
/// # Errors
/// Returns [`AnalysisError::TargetNotFound`] when the root is reached.
pub fn find_target(start: &Path) -> Result<PathBuf> {
    search_upwards(start, Path::is_dir)
}

fn search_upwards<F>(start: &Path, is_dir: F) -> Result<PathBuf>
where
    F: Fn(&Path) -> bool,
{
    for directory in start.ancestors() {
        let candidate = directory.join(TARGET_DIRECTORY);
        if is_dir(&candidate) {
            debug!(target_dir = %candidate.display(), "found target directory");
            return Ok(candidate);
        }
    }
    Err(AnalysisError::TargetNotFound(start.to_path_buf()))
}

/// Same as [`find_target`], starting from the current directory.
pub fn find_target_from_current_dir() -> Result<PathBuf> {
    find_target(&std::env::current_dir()?)
}

#[cfg(test)]
mod tests {
    use std::fs;
    use std::path::{Path, PathBuf};

    use super::{TARGET_DIRECTORY, find_target, search_upwards};
    use crate::AnalysisError;

    #[test]
    fn walks_up_to_the_nearest_target() {
        let root = std::env::temp_dir().join(format!("queue-analysis-pathing-{}", std::process::id()));
        let nested = root.join("a").join("b");
        fs::create_dir_all(&nested).unwrap();
        fs::create_dir_all(root.join(TARGET_DIRECTORY)).unwrap();

        let found = find_target(&nested).unwrap();
        assert_eq!(found, root.join(TARGET_DIRECTORY));

        fs::remove_dir_all(&root).unwrap();
    }

    #[test]
    fn plain_files_named_target_are_skipped() {
        let root = std::env::temp_dir().join(format!("queue-analysis-file-{}", std::process::id()));
        let nested = root.join("inner");
        fs::create_dir_all(&nested).unwrap();
        fs::write(nested.join(TARGET_DIRECTORY), b"not a directory").unwrap();
        fs::create_dir_all(root.join(TARGET_DIRECTORY)).unwrap();

        assert_eq!(find_target(&nested).unwrap(), root.join(TARGET_DIRECTORY));

        fs::remove_dir_all(&root).unwrap();
    }

    #[test]
    fn missing_target_is_an_error_at_the_root() {
        let start = Path::new("/srv/queues/run");
        match search_upwards(start, |_| false) {
            Err(AnalysisError::TargetNotFound(path)) => assert_eq!(path, start),
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[test]
    fn every_ancestor_is_checked_up_to_the_root() {
        let checked = std::cell::RefCell::new(Vec::new());
        let found = search_upwards(Path::new("/srv/queues"), |candidate| {
            checked.borrow_mut().push(candidate.to_path_buf());
            candidate == Path::new("/target")
        })
        .unwrap();

        assert_eq!(found, PathBuf::from("/target"));
        assert_eq!(
            checked.into_inner(),
            vec![
                PathBuf::from("/srv/queues/target"),
                PathBuf::from("/srv/target"),
                PathBuf::from("/target"),
            ]
        );
    }
}
