//! Random name generation for stored uploads.

use std::path::Path;

use rand_core::{OsRng, RngCore};

use super::error::UploadError;

/// Alphabet used for generated tokens (64 symbols).
pub const TOKEN_ALPHABET: &[u8; 64] =
    b"abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789_+";

/// Length of the token used for renamed uploads.
pub const GENERATED_NAME_LENGTH: usize = 20;

/// Generate a random token of `length` symbols from [`TOKEN_ALPHABET`].
///
/// All randomness comes from a single read of the OS secure source. Each byte
/// maps to one symbol by `byte % 64`, which is uniform because 256 is a
/// multiple of the alphabet size.
pub fn generate_token(length: usize) -> Result<String, UploadError> {
    let mut bytes = vec![0u8; length];
    OsRng
        .try_fill_bytes(&mut bytes)
        .map_err(|e| UploadError::EntropyUnavailable(e.to_string()))?;

    Ok(bytes
        .iter()
        .map(|b| TOKEN_ALPHABET[usize::from(*b) % TOKEN_ALPHABET.len()] as char)
        .collect())
}

/// Generate a stored name for `original`: a fresh token plus the original
/// extension, if it has one.
pub fn generated_file_name(original: &str) -> Result<String, UploadError> {
    let token = generate_token(GENERATED_NAME_LENGTH)?;
    Ok(match extension(original) {
        Some(ext) => format!("{token}.{ext}"),
        None => token,
    })
}

/// Reduce a client-supplied file name to its last path component.
///
/// Both `/` and `\` count as separators and trailing separators are
/// ignored, so `C:\photos\cat.jpg` and `albums/2024/` become `cat.jpg`
/// and `2024`.
pub fn client_base_name(name: &str) -> &str {
    let is_separator = |c: char| c == '/' || c == '\\';
    name.trim_end_matches(is_separator)
        .rsplit(is_separator)
        .next()
        .unwrap_or_default()
}

/// Extract the extension of a client-supplied file name.
fn extension(filename: &str) -> Option<&str> {
    Path::new(filename)
        .extension()
        .and_then(|s| s.to_str())
        .filter(|s| !s.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_token_length() {
        for n in [0, 1, 10, 20, 64, 100, 1000] {
            let token = generate_token(n).unwrap();
            assert_eq!(token.chars().count(), n);
        }
    }

    #[test]
    fn test_token_alphabet() {
        let token = generate_token(4096).unwrap();
        assert!(token.bytes().all(|b| TOKEN_ALPHABET.contains(&b)));
    }

    #[test]
    fn test_alphabet_has_64_distinct_symbols() {
        let distinct: HashSet<u8> = TOKEN_ALPHABET.iter().copied().collect();
        assert_eq!(distinct.len(), 64);
    }

    #[test]
    fn test_tokens_differ() {
        let tokens: HashSet<String> = (0..1000)
            .map(|_| generate_token(GENERATED_NAME_LENGTH).unwrap())
            .collect();
        assert_eq!(tokens.len(), 1000);
    }

    #[test]
    fn test_token_uses_whole_alphabet() {
        // 64 symbols over 20000 draws: missing any one is vanishingly unlikely.
        let token = generate_token(20_000).unwrap();
        let seen: HashSet<u8> = token.bytes().collect();
        assert_eq!(seen.len(), 64);
    }

    #[test]
    fn test_generated_file_name_keeps_extension() {
        let name = generated_file_name("photo.png").unwrap();
        assert!(name.ends_with(".png"));
        assert_eq!(name.len(), GENERATED_NAME_LENGTH + ".png".len());

        let name = generated_file_name("archive.tar.gz").unwrap();
        assert!(name.ends_with(".gz"));
    }

    #[test]
    fn test_generated_file_name_without_extension() {
        let name = generated_file_name("README").unwrap();
        assert_eq!(name.len(), GENERATED_NAME_LENGTH);
        assert!(!name.contains('.'));

        // A leading dot is part of the stem, not an extension.
        let name = generated_file_name(".hidden").unwrap();
        assert_eq!(name.len(), GENERATED_NAME_LENGTH);
    }

    #[test]
    fn test_client_base_name() {
        assert_eq!(client_base_name("photo.jpg"), "photo.jpg");
        assert_eq!(client_base_name("a/b.txt"), "b.txt");
        assert_eq!(client_base_name("../../etc/passwd"), "passwd");
        assert_eq!(client_base_name("C:\\photos\\cat.jpg"), "cat.jpg");
        assert_eq!(client_base_name("albums/2024/"), "2024");
        assert_eq!(client_base_name(".."), "..");
        assert_eq!(client_base_name("/"), "");
        assert_eq!(client_base_name(""), "");
    }

    #[test]
    fn test_extension() {
        assert_eq!(extension("test.txt"), Some("txt"));
        assert_eq!(extension("document.PDF"), Some("PDF"));
        assert_eq!(extension("no_ext"), None);
        assert_eq!(extension("trailing."), None);
        assert_eq!(extension("日本語ファイル.txt"), Some("txt"));
    }
}
