//! Server-compatible slugs for project names.

use once_cell::sync::Lazy;
use regex::Regex;

const MAX_LEN: usize = 45;

static SEPARATORS: Lazy<Regex> = Lazy::new(|| Regex::new(r"[.+@$*%^]").expect("valid slug pattern"));
static INVALID: Lazy<Regex> = Lazy::new(|| Regex::new(r"[^a-z0-9\s-]").expect("valid slug pattern"));
static WHITESPACE_RUNS: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").expect("valid slug pattern"));
static WHITESPACE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s").expect("valid slug pattern"));
static HYPHEN_RUNS: Lazy<Regex> = Lazy::new(|| Regex::new(r"-+").expect("valid slug pattern"));
static TRAILING_HYPHENS: Lazy<Regex> = Lazy::new(|| Regex::new(r"-*$").expect("valid slug pattern"));

/// Turn a display name into a URL slug.
///
/// `"My Web.App"` becomes `"my-web-app"` and `"Café"` becomes `"cafe"`.
/// Accented letters are transliterated to ASCII first; `. + @ $ * % ^` map
/// to `-` and anything else outside `[a-z0-9]`, whitespace and `-` is
/// dropped.
pub fn generate(name: &str) -> String {
    let ascii = deunicode::deunicode(name).to_lowercase();
    let separated = SEPARATORS.replace_all(&ascii, "-");
    let cleaned = INVALID.replace_all(&separated, "");
    let collapsed = WHITESPACE_RUNS.replace_all(&cleaned, " ");

    let cut: String = collapsed.trim().chars().take(MAX_LEN).collect();
    let hyphenated = WHITESPACE.replace_all(cut.trim(), "-");
    let single = HYPHEN_RUNS.replace_all(&hyphenated, "-");
    TRAILING_HYPHENS.replace_all(&single, "").into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lowercases_and_hyphenates() {
        assert_eq!(generate("My Web App"), "my-web-app");
    }

    #[test]
    fn maps_punctuation_to_hyphens() {
        assert_eq!(generate("Api.Gateway+Edge"), "api-gateway-edge");
        assert_eq!(generate("a -- b"), "a-b");
    }

    #[test]
    fn drops_other_characters() {
        assert_eq!(generate("Billing (EU) #2!"), "billing-eu-2");
        assert_eq!(generate("trailing--"), "trailing");
    }

    #[test]
    fn transliterates_accented_letters() {
        assert_eq!(generate("Café Déploiement"), "cafe-deploiement");
        assert_eq!(generate("Übersicht Straße"), "ubersicht-strasse");
    }

    #[test]
    fn truncates_long_names() {
        let name = "x".repeat(60);
        assert_eq!(generate(&name).len(), MAX_LEN);
    }
}
