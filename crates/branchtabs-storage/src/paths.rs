//! File naming for persisted records

use sha2::{Digest, Sha256};

/// Repository-level index of branch names that have a saved session
pub const INDEX_FILE_NAME: &str = "repository.json";

const SLUG_MAX_CHARS: usize = 48;
const HASH_HEX_CHARS: usize = 16;

/// File name for a branch's session record.
///
/// A readable slug keeps the directory browsable; the hash suffix of the raw
/// name keeps distinct branches (`feature/x` vs `feature_x`) apart.
pub fn branch_file_name(branch: &str) -> String {
    let digest = format!("{:x}", Sha256::digest(branch.as_bytes()));
    format!("{}-{}.json", slug(branch), &digest[..HASH_HEX_CHARS])
}

fn slug(branch: &str) -> String {
    let slug: String = branch
        .chars()
        .take(SLUG_MAX_CHARS)
        .map(|c| match c {
            'a'..='z' | 'A'..='Z' | '0'..='9' | '-' | '_' | '.' => c,
            _ => '_',
        })
        .collect();

    let slug = slug.trim_start_matches('.');
    if slug.is_empty() {
        "branch".to_string()
    } else {
        slug.to_string()
    }
}
