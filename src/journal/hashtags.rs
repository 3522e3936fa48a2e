use once_cell::sync::Lazy;
use regex::Regex;

static HASHTAG: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"#\w+").expect("hashtag pattern compiles"));

/// All `#tag` tokens in `text`, in order of appearance.
pub fn extract(text: &str) -> Vec<&str> {
    HASHTAG.find_iter(text).map(|m| m.as_str()).collect()
}

/// Splits a whitespace-separated tag field into a de-duplicated list,
/// keeping first-seen order.
pub fn parse_tags(input: &str) -> Vec<String> {
    let mut tags: Vec<String> = Vec::new();
    for tag in input.split_whitespace() {
        if !tags.iter().any(|existing| existing == tag) {
            tags.push(tag.to_string());
        }
    }
    tags
}

pub fn format_tags(tags: &[String]) -> String {
    tags.join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_hashtags_from_free_text() {
        assert_eq!(
            extract("Great #Food and #Nature, more #food_trucks!"),
            vec!["#Food", "#Nature", "#food_trucks"]
        );
        assert!(extract("no tags here # alone").is_empty());
    }

    #[test]
    fn tag_fields_are_deduplicated() {
        assert_eq!(
            parse_tags("  #Vacation #Work\t#Vacation  "),
            vec!["#Vacation".to_string(), "#Work".to_string()]
        );
        assert!(parse_tags("   ").is_empty());
        assert_eq!(format_tags(&parse_tags("#a #b")), "#a #b");
    }
}
