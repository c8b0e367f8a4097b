use sha2::{Digest, Sha256};

const SUFFIX_HEX_LEN: usize = 12;

/// Turns an arbitrary identity (model name, config name) into a file-name safe slug.
///
/// ASCII alphanumerics, `-` and `.` are kept (letters lowercased); every other
/// character becomes `_`. An empty result falls back to `sweep`. Whenever the
/// slug differs from `name`, a short SHA256 suffix of the raw name is appended
/// so that names differing only in case or punctuation stay distinct.
pub fn slugify(name: &str) -> String {
    let mapped: String = name
        .trim()
        .chars()
        .map(|ch| match ch {
            'a'..='z' | '0'..='9' | '-' | '.' => ch,
            'A'..='Z' => ch.to_ascii_lowercase(),
            _ => '_',
        })
        .collect();
    let slug = if mapped.is_empty() || mapped.chars().all(|ch| ch == '.') {
        "sweep".to_string()
    } else {
        mapped
    };
    if slug == name {
        return slug;
    }
    let digest = format!("{:x}", Sha256::digest(name.as_bytes()));
    format!("{slug}-{}", &digest[..SUFFIX_HEX_LEN])
}
