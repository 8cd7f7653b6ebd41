//! String utility functions
//!
//! Identifier normalization used by the table catalog.

/// String utility functions
#[derive(Debug)]
pub struct StringUtils;

impl StringUtils {
    /// Ensure a string starts with a specific prefix
    pub fn ensure_starts_with(s: &str, prefix: &str) -> String {
        if s.starts_with(prefix) {
            s.to_string()
        } else {
            format!("{}{}", prefix, s)
        }
    }

    /// Remove a prefix if present
    pub fn strip_prefix<'a>(s: &'a str, prefix: &str) -> &'a str {
        s.strip_prefix(prefix).unwrap_or(s)
    }

    /// Trim surrounding whitespace and lowercase ASCII letters
    pub fn normalize_identifier(s: &str) -> String {
        s.trim().to_ascii_lowercase()
    }

    /// Qualify a column with its table, `table.column`
    pub fn qualify(table: &str, column: &str) -> String {
        format!("{}.{}", table, column)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn test_ensure_starts_with() {
        assert_eq!(StringUtils::ensure_starts_with("players", "tbl_"), "tbl_players");
        assert_eq!(StringUtils::ensure_starts_with("tbl_players", "tbl_"), "tbl_players");
        assert_eq!(StringUtils::ensure_starts_with("players", ""), "players");
    }

    #[test]
    fn test_strip_prefix() {
        assert_eq!(StringUtils::strip_prefix("tbl_players", "tbl_"), "players");
        assert_eq!(StringUtils::strip_prefix("players", "tbl_"), "players");
    }

    #[rstest]
    #[case("Players", "players")]
    #[case("  games ", "games")]
    #[case("TBL_Games", "tbl_games")]
    fn test_normalize_identifier(#[case] input: &str, #[case] expected: &str) {
        assert_eq!(StringUtils::normalize_identifier(input), expected);
    }

    #[test]
    fn test_qualify() {
        assert_eq!(StringUtils::qualify("games", "player1_id"), "games.player1_id");
    }
}
