//! Requirement-file parsing.

/// Extract package names from `requirements.txt` contents.
///
/// Comments, pip options (`-r`, `--index-url`, ...), version specifiers,
/// extras and environment markers are ignored. Names keep their original case.
pub fn requirement_names(contents: &str) -> Vec<String> {
    contents
        .lines()
        .filter_map(|line| {
            let line = line.split('#').next().unwrap_or_default().trim();
            if line.is_empty() || line.starts_with('-') {
                return None;
            }
            if let Some((name, _)) = line.split_once(" @ ") {
                return non_empty(name.trim());
            }
            let end = line
                .find(|c: char| !(c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.')))
                .unwrap_or(line.len());
            non_empty(&line[..end])
        })
        .collect()
}

fn non_empty(name: &str) -> Option<String> {
    if name.is_empty() {
        None
    } else {
        Some(name.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_specifiers_extras_and_markers() {
        let contents = "\
# core deps
numpy>=1.24
torch==2.1.0 ; platform_system != 'Darwin'
uvicorn[standard]~=0.23
Pillow
-r extra.txt
--index-url https://example.invalid/simple
mypkg @ git+https://example.invalid/mypkg.git
";
        assert_eq!(
            requirement_names(contents),
            vec!["numpy", "torch", "uvicorn", "Pillow", "mypkg"]
        );
    }

    #[test]
    fn empty_manifest_has_no_names() {
        assert!(requirement_names("\n# nothing\n\n").is_empty());
    }
}
