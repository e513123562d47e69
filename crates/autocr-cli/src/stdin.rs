//! Stdin path-list parsing.
//!
//! NUL-separated when any NUL byte is present (the `find -print0`
//! convention), otherwise line-separated. Entries keep interior spaces.

pub fn parse_paths(bytes: &[u8]) -> Vec<String> {
    let text = String::from_utf8_lossy(bytes);
    let entries: Vec<&str> = if text.contains('\0') {
        text.split('\0').collect()
    } else {
        text.split('\n').collect()
    };
    entries
        .into_iter()
        .map(|entry| entry.strip_suffix('\r').unwrap_or(entry))
        .filter(|entry| !entry.is_empty())
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn newline_separated_paths() {
        let paths = parse_paths(b"src/a.ts\nsrc/b.ts\n");
        assert_eq!(paths, vec!["src/a.ts", "src/b.ts"]);
    }

    #[test]
    fn crlf_line_endings_are_stripped() {
        let paths = parse_paths(b"src/a.ts\r\nsrc/b.ts\r\n");
        assert_eq!(paths, vec!["src/a.ts", "src/b.ts"]);
    }

    #[test]
    fn nul_separation_wins_when_present() {
        let paths = parse_paths(b"src/a.ts\0src/with\nnewline.ts\0");
        assert_eq!(paths, vec!["src/a.ts", "src/with\nnewline.ts"]);
    }

    #[test]
    fn empty_entries_are_dropped_and_spaces_preserved() {
        let paths = parse_paths(b"\n\nsrc/my file.ts\n\n");
        assert_eq!(paths, vec!["src/my file.ts"]);
    }

    #[test]
    fn empty_input_yields_no_paths() {
        assert!(parse_paths(b"").is_empty());
    }
}
