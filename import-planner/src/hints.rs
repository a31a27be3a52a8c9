//! Cosmetic hints for new folders and automatic bookmark tags

use url::Url;

/// Icon used when no keyword matches
pub const DEFAULT_FOLDER_ICON: &str = "folder";

/// (keywords, icon, color) checked in order against the lowercased folder name
const FOLDER_KEYWORDS: &[(&[&str], &str, &str)] = &[
    (&["dev", "code", "programming", "github"], "code", "#6366f1"),
    (&["design", "art", "ui", "ux"], "palette", "#ec4899"),
    (&["news", "blog"], "newspaper", "#f97316"),
    (&["music", "audio", "podcast"], "music", "#8b5cf6"),
    (&["video", "movie", "youtube"], "video", "#ef4444"),
    (&["shop", "store", "buy"], "shopping-cart", "#f59e0b"),
    (&["travel", "trip"], "plane", "#0ea5e9"),
    (&["food", "recipe", "cook"], "utensils", "#84cc16"),
    (&["work", "job", "office"], "briefcase", "#64748b"),
    (&["finance", "money", "bank"], "dollar-sign", "#10b981"),
    (&["learn", "course", "study", "school"], "graduation-cap", "#14b8a6"),
    (&["doc", "reference", "read", "wiki"], "book", "#3b82f6"),
    (&["game", "gaming"], "gamepad", "#a855f7"),
    (&["social", "friends"], "users", "#06b6d4"),
    (&["tool", "util"], "wrench", "#78716c"),
];

const FALLBACK_COLORS: &[&str] = &[
    "#3b82f6", "#10b981", "#f59e0b", "#ef4444", "#8b5cf6", "#ec4899", "#06b6d4", "#84cc16",
];

/// Domain suffix to tags
const DOMAIN_TAGS: &[(&str, &[&str])] = &[
    ("github.com", &["development", "repository"]),
    ("gitlab.com", &["development", "repository"]),
    ("stackoverflow.com", &["development", "q&a"]),
    ("developer.mozilla.org", &["development", "documentation"]),
    ("docs.rs", &["rust", "documentation"]),
    ("crates.io", &["rust", "packages"]),
    ("npmjs.com", &["javascript", "packages"]),
    ("dev.to", &["development", "blog"]),
    ("medium.com", &["article", "blog"]),
    ("news.ycombinator.com", &["news", "tech"]),
    ("youtube.com", &["video"]),
    ("vimeo.com", &["video"]),
    ("wikipedia.org", &["reference"]),
    ("reddit.com", &["community"]),
    ("twitter.com", &["social"]),
    ("x.com", &["social"]),
    ("linkedin.com", &["social", "professional"]),
    ("figma.com", &["design"]),
    ("dribbble.com", &["design", "inspiration"]),
    ("amazon.com", &["shopping"]),
];

/// Path token to tag
const PATH_TAGS: &[(&str, &str)] = &[
    ("api", "api"),
    ("docs", "docs"),
    ("documentation", "docs"),
    ("tutorial", "tutorial"),
    ("tutorials", "tutorial"),
];

/// Icon hint for a folder name
pub fn icon_for_folder(name: &str) -> &'static str {
    keyword_match(name)
        .map(|(_, icon, _)| icon)
        .unwrap_or(DEFAULT_FOLDER_ICON)
}

/// Color hint for a folder name; deterministic for names without a keyword
pub fn color_for_folder(name: &str) -> &'static str {
    match keyword_match(name) {
        Some((_, _, color)) => color,
        None => FALLBACK_COLORS[name_hash(name) as usize % FALLBACK_COLORS.len()],
    }
}

fn keyword_match(name: &str) -> Option<(&'static [&'static str], &'static str, &'static str)> {
    let lowered = name.to_lowercase();
    FOLDER_KEYWORDS
        .iter()
        .find(|(keywords, _, _)| keywords.iter().any(|k| lowered.contains(k)))
        .copied()
}

/// djb2 over the lowercased name
fn name_hash(name: &str) -> u32 {
    name.to_lowercase()
        .bytes()
        .fold(5381u32, |hash, byte| hash.wrapping_mul(33).wrapping_add(byte as u32))
}

/// Extract the host of a URL without a leading `www.`
pub fn extract_domain(url: &str) -> Option<String> {
    Url::parse(url.trim()).ok().and_then(|u| {
        u.host_str()
            .map(|h| h.to_lowercase().trim_start_matches("www.").to_string())
    })
}

/// Tags derived from the URL's domain and path keywords
pub fn generate_tags(url: &str) -> Vec<String> {
    let Ok(parsed) = Url::parse(url.trim()) else {
        return Vec::new();
    };
    let mut tags = Vec::new();

    if let Some(domain) = extract_domain(url) {
        for (suffix, domain_tags) in DOMAIN_TAGS {
            if domain == *suffix || domain.ends_with(&format!(".{}", suffix)) {
                tags.extend(domain_tags.iter().map(|t| t.to_string()));
                break;
            }
        }

        for (prefix, tag) in [("api.", "api"), ("docs.", "docs")] {
            if domain.starts_with(prefix) {
                tags.push(tag.to_string());
            }
        }
    }

    let path = parsed.path().to_lowercase();
    for token in path.split(|c: char| matches!(c, '/' | '-' | '_' | '.')) {
        if let Some((_, tag)) = PATH_TAGS.iter().find(|(key, _)| *key == token) {
            tags.push(tag.to_string());
        }
    }

    tags
}

/// Remove repeated tags, keeping the first occurrence (case-sensitive)
pub fn dedupe_tags(tags: &mut Vec<String>) {
    let mut seen = std::collections::HashSet::new();
    tags.retain(|tag| seen.insert(tag.clone()));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_keyword_icons() {
        assert_eq!(icon_for_folder("Web Dev"), "code");
        assert_eq!(icon_for_folder("DESIGN inspiration"), "palette");
        assert_eq!(icon_for_folder("Misc"), DEFAULT_FOLDER_ICON);
    }

    #[test]
    fn test_fallback_color_is_deterministic() {
        let first = color_for_folder("Misc");
        assert_eq!(first, color_for_folder("Misc"));
        assert_eq!(first, color_for_folder("misc"));
        assert!(FALLBACK_COLORS.contains(&first));
        assert_eq!(color_for_folder("Dev stuff"), "#6366f1");
    }

    #[test]
    fn test_domain_tags() {
        assert_eq!(
            generate_tags("https://github.com/rust-lang/rust"),
            vec!["development".to_string(), "repository".to_string()]
        );
        assert_eq!(generate_tags("https://en.wikipedia.org/wiki/Rust"), vec!["reference".to_string()]);
        assert!(generate_tags("not a url").is_empty());
    }

    #[test]
    fn test_path_and_subdomain_tags() {
        let tags = generate_tags("https://docs.example.com/api/v1/getting-started-tutorial");
        assert_eq!(
            tags,
            vec!["docs".to_string(), "api".to_string(), "tutorial".to_string()]
        );
    }

    #[test]
    fn test_dedupe_is_case_sensitive() {
        let mut tags = vec![
            "docs".to_string(),
            "Docs".to_string(),
            "docs".to_string(),
            "api".to_string(),
        ];
        dedupe_tags(&mut tags);
        assert_eq!(tags, vec!["docs", "Docs", "api"]);
    }
}
