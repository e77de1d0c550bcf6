//! Streaming track references and time display

use crate::error::{EightcountError, Result};

const URI_PREFIX: &str = "spotify:track:";
const URL_MARKER: &str = "open.spotify.com/track/";

/// Extract a Spotify track id from a URI, an open.spotify.com URL, or a bare id
///
/// The id is the run of ASCII alphanumerics after the prefix; query strings
/// and trailing path segments are ignored.
pub fn parse_spotify_track_id(input: &str) -> Result<String> {
    let input = input.trim();

    let candidate = if let Some(pos) = input.find(URI_PREFIX) {
        leading_id(&input[pos + URI_PREFIX.len()..])
    } else if let Some(pos) = input.find(URL_MARKER) {
        leading_id(&input[pos + URL_MARKER.len()..])
    } else if !input.is_empty() && input.chars().all(|c| c.is_ascii_alphanumeric()) {
        input
    } else {
        ""
    };

    if candidate.is_empty() {
        Err(EightcountError::InvalidTrackRef(input.to_string()))
    } else {
        Ok(candidate.to_string())
    }
}

fn leading_id(s: &str) -> &str {
    let end = s
        .find(|c: char| !c.is_ascii_alphanumeric())
        .unwrap_or(s.len());
    &s[..end]
}

/// Format a millisecond position as `m:ss`
pub fn format_time(ms: u64) -> String {
    let total_seconds = ms / 1000;
    format!("{}:{:02}", total_seconds / 60, total_seconds % 60)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_uri() {
        assert_eq!(
            parse_spotify_track_id("spotify:track:4uLU6hMCjMI75M1A2tKUQC").unwrap(),
            "4uLU6hMCjMI75M1A2tKUQC"
        );
    }

    #[test]
    fn test_parse_url_with_query() {
        assert_eq!(
            parse_spotify_track_id("https://open.spotify.com/track/4uLU6hMCjMI75M1A2tKUQC?si=abc123").unwrap(),
            "4uLU6hMCjMI75M1A2tKUQC"
        );
    }

    #[test]
    fn test_parse_bare_id() {
        assert_eq!(parse_spotify_track_id(" abc123 ").unwrap(), "abc123");
    }

    #[test]
    fn test_parse_rejects_other_input() {
        for bad in ["", "https://example.com/track/1", "spotify:track:", "not an id"] {
            assert!(
                matches!(parse_spotify_track_id(bad), Err(EightcountError::InvalidTrackRef(_))),
                "should reject {:?}",
                bad
            );
        }
    }

    #[test]
    fn test_format_time() {
        assert_eq!(format_time(0), "0:00");
        assert_eq!(format_time(999), "0:00");
        assert_eq!(format_time(65_432), "1:05");
        assert_eq!(format_time(3_600_000), "60:00");
    }
}
