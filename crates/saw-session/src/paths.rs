//! Path spelling the engine expects.
//!
//! Case and auxiliary file names go over the wire with forward slashes;
//! `SaveCase` wants backslashes. Neither conversion touches the filesystem.

use std::path::Path;

pub fn to_posix(path: impl AsRef<Path>) -> String {
    path.as_ref().to_string_lossy().replace('\\', "/")
}

pub fn to_windows(path: impl AsRef<Path>) -> String {
    path.as_ref().to_string_lossy().replace('/', "\\")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn conversions() {
        assert_eq!(to_posix(r"C:\cases\ieee14.pwb"), "C:/cases/ieee14.pwb");
        assert_eq!(to_windows("C:/cases/ieee14.pwb"), r"C:\cases\ieee14.pwb");
        assert_eq!(to_posix(to_windows("a/b/c")), "a/b/c");
    }
}
