//! Depth-first directory-tree deletion used by `rm -r`.

use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};

/// Delete `path` and everything below it.
///
/// Traversal uses an explicit work list instead of call-stack recursion, so
/// arbitrarily deep trees cannot overflow the stack. Children are removed
/// before their directory, in directory-listing order (no sorting). The
/// first node that cannot be removed aborts the whole call with an error
/// naming that node; anything already deleted stays deleted.
pub(crate) fn remove_tree(path: &Path) -> Result<()> {
    // A directory is visited twice: once to queue its children, and again,
    // after they are gone, to remove the then-empty directory itself.
    let mut pending: Vec<(PathBuf, bool)> = vec![(path.to_path_buf(), false)];

    while let Some((node, children_done)) = pending.pop() {
        if children_done {
            fs::remove_dir(&node)
                .with_context(|| format!("cannot remove directory {}", node.display()))?;
            continue;
        }

        let md = fs::symlink_metadata(&node)
            .with_context(|| format!("cannot stat {}", node.display()))?;

        if md.is_dir() {
            pending.push((node.clone(), true));
            let entries = fs::read_dir(&node)
                .with_context(|| format!("cannot open directory {}", node.display()))?;
            for entry in entries {
                let entry = entry
                    .with_context(|| format!("cannot read directory {}", node.display()))?;
                pending.push((entry.path(), false));
            }
        } else {
            fs::remove_file(&node)
                .with_context(|| format!("cannot remove {}", node.display()))?;
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::remove_tree;
    use crate::testutil::make_unique_temp_dir;
    use std::fs;

    #[test]
    fn test_removes_nested_tree_completely() {
        let temp = make_unique_temp_dir("remove_nested").unwrap();
        let root = temp.join("d");
        fs::create_dir_all(root.join("sub").join("deeper")).unwrap();
        fs::write(root.join("a"), b"x").unwrap();
        fs::write(root.join("sub").join("b"), b"y").unwrap();
        fs::write(root.join("sub").join("deeper").join("c"), b"z").unwrap();

        remove_tree(&root).unwrap();
        assert!(!root.exists());

        let _ = fs::remove_dir_all(&temp);
    }

    #[test]
    fn test_removes_a_plain_file() {
        let temp = make_unique_temp_dir("remove_file").unwrap();
        let file = temp.join("f");
        fs::write(&file, b"x").unwrap();

        remove_tree(&file).unwrap();
        assert!(!file.exists());

        let _ = fs::remove_dir_all(&temp);
    }

    #[test]
    fn test_missing_path_is_an_error() {
        let temp = make_unique_temp_dir("remove_missing").unwrap();
        let gone = temp.join("not_there");

        let err = remove_tree(&gone).unwrap_err();
        assert!(err.to_string().contains("cannot stat"));

        let _ = fs::remove_dir_all(&temp);
    }

    #[test]
    fn test_empty_directory_is_removed() {
        let temp = make_unique_temp_dir("remove_empty").unwrap();
        let root = temp.join("d");
        fs::create_dir(&root).unwrap();

        remove_tree(&root).unwrap();
        assert!(!root.exists());

        let _ = fs::remove_dir_all(&temp);
    }
}
