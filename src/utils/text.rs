use mongodb::bson::{doc, Document};

/// Escapes regex metacharacters so user input matches literally.
pub fn escape_regex(input: &str) -> String {
    let mut escaped = String::with_capacity(input.len());
    for c in input.chars() {
        if "\\^$.|?*+()[]{}".contains(c) {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

/// Case-insensitive substring match on a literal value.
pub fn ci_regex(value: &str) -> Document {
    doc! { "$regex": escape_regex(value.trim()), "$options": "i" }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_escape_regex() {
        assert_eq!(escape_regex("a.b*(c)"), "a\\.b\\*\\(c\\)");
        assert_eq!(escape_regex("Tamil Nadu"), "Tamil Nadu");
    }

    #[test]
    fn test_ci_regex_trims() {
        let filter = ci_regex("  Pune ");
        assert_eq!(filter.get_str("$regex").unwrap(), "Pune");
        assert_eq!(filter.get_str("$options").unwrap(), "i");
    }
}
