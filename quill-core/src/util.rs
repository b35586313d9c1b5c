//! Helpers for virtual filesystem paths.
//!
//! Virtual paths are always `/`-separated regardless of the host platform.

/// Language tag used when the extension is unknown.
pub const PLAIN_TEXT: &str = "plaintext";

/// Whether `path` is an absolute virtual path. Placeholders for unsaved
/// buffers are never absolute.
pub fn is_absolute(path: &str) -> bool {
    path.starts_with('/')
}

/// Last path segment, ignoring trailing separators.
pub fn basename(path: &str) -> &str {
    let trimmed = path.trim_end_matches('/');
    trimmed.rsplit('/').next().unwrap_or(trimmed)
}

/// Parent directory of `path`; `"/"` for top-level entries and `"."` for
/// bare names.
pub fn dirname(path: &str) -> &str {
    let trimmed = path.trim_end_matches('/');
    match trimmed.rfind('/') {
        Some(0) => "/",
        Some(idx) => &trimmed[..idx],
        None if path.starts_with('/') => "/",
        None => ".",
    }
}

/// Extension of the last segment including the leading dot, or `""`.
///
/// Dotfiles such as `.gitignore` have no extension.
pub fn extension(path: &str) -> &str {
    let name = basename(path);
    match name.rfind('.') {
        Some(0) | None => "",
        Some(idx) => &name[idx..],
    }
}

/// Determine the editor language tag from a path's extension.
pub fn language_from_path(path: &str) -> &'static str {
    let ext = extension(path).trim_start_matches('.').to_lowercase();
    match ext.as_str() {
        "rs" => "rust",
        "py" | "pyi" => "python",
        "js" | "mjs" | "cjs" | "jsx" => "javascript",
        "ts" | "mts" | "cts" | "tsx" => "typescript",
        "html" | "htm" => "html",
        "css" => "css",
        "scss" => "scss",
        "less" => "less",
        "json" | "jsonc" => "json",
        "xml" | "svg" | "xsl" | "xslt" => "xml",
        "yaml" | "yml" => "yaml",
        "toml" => "toml",
        "md" | "markdown" => "markdown",
        "sh" | "bash" | "zsh" | "fish" => "shell",
        "c" | "h" => "c",
        "cpp" | "cc" | "cxx" | "hpp" | "hxx" | "hh" => "cpp",
        "java" => "java",
        "go" => "go",
        "rb" => "ruby",
        "php" => "php",
        "lua" => "lua",
        "sql" => "sql",
        "r" => "r",
        "swift" => "swift",
        "kt" | "kts" => "kotlin",
        "cs" => "csharp",
        "fs" | "fsx" => "fsharp",
        "hs" => "haskell",
        "pl" | "pm" => "perl",
        "dart" => "dart",
        "graphql" | "gql" => "graphql",
        "ini" | "cfg" | "conf" => "ini",
        "bat" | "cmd" => "bat",
        "ps1" | "psm1" => "powershell",
        _ => PLAIN_TEXT,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn is_absolute_requires_leading_slash() {
        assert!(is_absolute("/Users/Public/a.txt"));
        assert!(!is_absolute("untitled"));
        assert!(!is_absolute(""));
    }

    #[test]
    fn basename_basic() {
        assert_eq!(basename("/Users/Public/a.txt"), "a.txt");
        assert_eq!(basename("/a.txt"), "a.txt");
        assert_eq!(basename("a.txt"), "a.txt");
        assert_eq!(basename("/docs/"), "docs");
    }

    #[test]
    fn dirname_basic() {
        assert_eq!(dirname("/Users/Public/a.txt"), "/Users/Public");
        assert_eq!(dirname("/a.txt"), "/");
        assert_eq!(dirname("a.txt"), ".");
    }

    #[test]
    fn extension_keeps_dot_and_case() {
        assert_eq!(extension("/a/b.TXT"), ".TXT");
        assert_eq!(extension("/a/archive.tar.gz"), ".gz");
        assert_eq!(extension("/a/Makefile"), "");
        assert_eq!(extension("/a/.gitignore"), "");
    }

    #[test]
    fn extension_ignores_dots_in_directories() {
        assert_eq!(extension("/a.d/readme"), "");
    }

    #[test]
    fn language_is_case_insensitive() {
        assert_eq!(language_from_path("/src/main.rs"), "rust");
        assert_eq!(language_from_path("/src/MAIN.RS"), "rust");
        assert_eq!(language_from_path("/web/app.Tsx"), "typescript");
    }

    #[test]
    fn language_defaults_to_plain_text() {
        assert_eq!(language_from_path("/notes/todo.txt"), PLAIN_TEXT);
        assert_eq!(language_from_path("/notes/README"), PLAIN_TEXT);
        assert_eq!(language_from_path("/notes/data.xyz"), PLAIN_TEXT);
    }
}
