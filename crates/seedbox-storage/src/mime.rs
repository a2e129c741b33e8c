//! Content-type lookup by file extension.

use std::path::Path;

/// Best-effort MIME type for a file name, defaulting to
/// `application/octet-stream`.
pub fn mime_for(name: impl AsRef<Path>) -> String {
    mime_guess::from_path(name)
        .first_or_octet_stream()
        .essence_str()
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_and_unknown_extensions() {
        assert_eq!(mime_for("movie.mp4"), "video/mp4");
        assert_eq!(mime_for("dir/notes.txt"), "text/plain");
        assert_eq!(mime_for("blob.zzz-unknown"), "application/octet-stream");
        assert_eq!(mime_for("no_extension"), "application/octet-stream");
    }
}
