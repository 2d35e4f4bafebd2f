//! Automatic conversation titles.

/// Maximum title length, in characters.
pub const MAX_TITLE_CHARS: usize = 60;

const QUOTES: &[char] = &['"', '\'', '`', '\u{201C}', '\u{201D}', '\u{2018}', '\u{2019}'];

/// Prompt asking the model to name a conversation from its first message.
pub fn title_prompt(user_text: &str) -> String {
    format!(
        "Write a short title of at most six words for a conversation that starts \
         with the message below. Reply with the title only, without quotes.\n\n\
         Message: {user_text}"
    )
}

/// Normalize a generated title.
///
/// Strips surrounding quotes and whitespace, collapses it to a single line and
/// caps it at [`MAX_TITLE_CHARS`]. Returns `None` when nothing usable remains.
pub fn clean_title(raw: &str) -> Option<String> {
    let single_line = raw.split_whitespace().collect::<Vec<_>>().join(" ");
    let stripped = single_line.trim_matches(|c: char| c.is_whitespace() || QUOTES.contains(&c));

    let truncated: String = stripped.chars().take(MAX_TITLE_CHARS).collect();
    let title = truncated.trim_end();

    (!title.is_empty()).then(|| title.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_quotes_and_whitespace() {
        assert_eq!(clean_title("  \"Bakery Promo Ideas\"\n").as_deref(), Some("Bakery Promo Ideas"));
        assert_eq!(clean_title("'Learning Rust'").as_deref(), Some("Learning Rust"));
        assert_eq!(clean_title("\u{201C}Leg Day\u{201D}").as_deref(), Some("Leg Day"));
    }

    #[test]
    fn collapses_to_one_line() {
        assert_eq!(
            clean_title("Weekly\n  Workout   Plan").as_deref(),
            Some("Weekly Workout Plan")
        );
    }

    #[test]
    fn truncates_long_titles() {
        let long = "word ".repeat(40);
        let title = clean_title(&long).unwrap();
        assert!(title.chars().count() <= MAX_TITLE_CHARS);
        assert!(!title.ends_with(' '));
    }

    #[test]
    fn truncation_respects_char_boundaries() {
        let title = clean_title(&"é".repeat(100)).unwrap();
        assert_eq!(title.chars().count(), MAX_TITLE_CHARS);
    }

    #[test]
    fn empty_results_are_rejected() {
        assert_eq!(clean_title(""), None);
        assert_eq!(clean_title("   \n "), None);
        assert_eq!(clean_title("\"\""), None);
    }

    #[test]
    fn prompt_embeds_user_text() {
        assert!(title_prompt("promote my bakery").ends_with("Message: promote my bakery"));
    }
}
