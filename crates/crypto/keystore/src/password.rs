use std::{fs, path::Path};

use anyhow::anyhow;
use unicode_normalization::UnicodeNormalization;

/// Reads a password file, dropping the trailing newline editors tend to add.
pub fn load_password_file<P: AsRef<Path>>(path: P) -> anyhow::Result<String> {
    let path = path.as_ref();
    let contents = fs::read_to_string(path)
        .map_err(|err| anyhow!("Unable to load password file {}: {err}", path.display()))?;
    Ok(contents.trim_end_matches(['\n', '\r']).to_string())
}

/// EIP-2335 password normalisation: NFKD, then strip C0, C1 and DEL control codes.
pub fn process_password(password: &str) -> Vec<u8> {
    password
        .nfkd()
        .filter(|character| {
            let code_point = *character as u32;
            !(code_point <= 0x1F || code_point == 0x7F || (0x80..=0x9F).contains(&code_point))
        })
        .collect::<String>()
        .into_bytes()
}
