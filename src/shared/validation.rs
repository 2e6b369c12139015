use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    /// Runs of characters that may not appear in a stored file name stem
    /// - "summer glow" -> "summer_glow"
    /// - "crème.brûlée" -> "cr_me_br_l_e"
    pub static ref UNSAFE_FILE_STEM_CHARS: Regex = Regex::new(r"[^A-Za-z0-9_-]+").unwrap();

    /// File extensions kept on stored images (without the dot)
    pub static ref FILE_EXTENSION_REGEX: Regex = Regex::new(r"^[a-z0-9]{1,10}$").unwrap();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unsafe_file_stem_chars() {
        assert_eq!(
            UNSAFE_FILE_STEM_CHARS.replace_all("summer glow", "_"),
            "summer_glow"
        );
        assert_eq!(
            UNSAFE_FILE_STEM_CHARS.replace_all("../../etc", "_"),
            "_etc"
        );
        assert!(!UNSAFE_FILE_STEM_CHARS.is_match("lip-gloss_02"));
    }

    #[test]
    fn test_file_extension_regex() {
        assert!(FILE_EXTENSION_REGEX.is_match("png"));
        assert!(FILE_EXTENSION_REGEX.is_match("jpeg"));
        assert!(!FILE_EXTENSION_REGEX.is_match("")); // empty
        assert!(!FILE_EXTENSION_REGEX.is_match("PNG")); // not lowercased
        assert!(!FILE_EXTENSION_REGEX.is_match("p g")); // space
    }
}
