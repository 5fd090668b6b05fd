//! Naive English pluralization for resource names.
//!
//! Good enough for API nouns; anything already ending in a bare `s` is
//! assumed plural and left alone.

pub fn pluralize(word: &str) -> String {
    if word.is_empty() {
        return String::new();
    }
    let lower = word.to_ascii_lowercase();
    if lower.ends_with("ss")
        || lower.ends_with("sh")
        || lower.ends_with("ch")
        || lower.ends_with('x')
        || lower.ends_with('z')
    {
        return format!("{word}es");
    }
    if lower.ends_with('y') && !ends_with_vowel_y(&lower) {
        return format!("{}ies", &word[..word.len() - 1]);
    }
    if lower.ends_with('s') {
        return word.to_string();
    }
    format!("{word}s")
}

pub fn singularize(word: &str) -> String {
    if word.ends_with("ies") && word.len() > 3 {
        format!("{}y", &word[..word.len() - 3])
    } else if word.ends_with("ses") || word.ends_with("xes") || word.ends_with("zes") {
        word[..word.len() - 2].to_string()
    } else if word.ends_with('s') && !word.ends_with("ss") && word.len() > 1 {
        word[..word.len() - 1].to_string()
    } else {
        word.to_string()
    }
}

fn ends_with_vowel_y(lower: &str) -> bool {
    let mut chars = lower.chars().rev();
    chars.next();
    matches!(chars.next(), Some('a' | 'e' | 'i' | 'o' | 'u'))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pluralize_common_nouns() {
        assert_eq!(pluralize("contact"), "contacts");
        assert_eq!(pluralize("company"), "companies");
        assert_eq!(pluralize("box"), "boxes");
        assert_eq!(pluralize("address"), "addresses");
        assert_eq!(pluralize("key"), "keys");
    }

    #[test]
    fn pluralize_leaves_plurals_alone() {
        assert_eq!(pluralize("contacts"), "contacts");
        assert_eq!(pluralize("users"), "users");
    }

    #[test]
    fn singularize_inverts() {
        assert_eq!(singularize("contacts"), "contact");
        assert_eq!(singularize("companies"), "company");
        assert_eq!(singularize("boxes"), "box");
        assert_eq!(singularize("ping"), "ping");
    }
}
