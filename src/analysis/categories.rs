//! Display labels for platform category ids.

const CATEGORY_LABELS: &[(u32, &str)] = &[
    (1, "Film & Animation"),
    (2, "Autos & Vehicles"),
    (10, "Music"),
    (15, "Pets & Animals"),
    (17, "Sports"),
    (19, "Travel & Events"),
    (20, "Gaming"),
    (22, "People & Blogs"),
    (23, "Comedy"),
    (24, "Entertainment"),
    (25, "News & Politics"),
    (26, "Howto & Style"),
    (27, "Education"),
    (28, "Science & Technology"),
];

/// Known label, or `category_<id>` for ids outside the table
pub fn category_label(id: u32) -> String {
    CATEGORY_LABELS
        .iter()
        .find(|(known, _)| *known == id)
        .map(|(_, label)| label.to_string())
        .unwrap_or_else(|| format!("category_{}", id))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_labels() {
        assert_eq!(category_label(10), "Music");
        assert_eq!(category_label(28), "Science & Technology");
        assert_eq!(CATEGORY_LABELS.len(), 14);
    }

    #[test]
    fn test_unknown_label() {
        assert_eq!(category_label(99), "category_99");
    }
}
