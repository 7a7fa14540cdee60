//! Unit tests for request validation
use backend_lib::validation::{
    normalize, validate_advanced_search, validate_email, validate_new_song, validate_rating, validate_song_query,
    validate_url, ValidationError,
};
use guitartab_common::song::{AdvancedSearch, NewSong, SongQuery};

#[test]
fn test_normalize() {
    assert_eq!(normalize(Some("  rock ".to_string())), Some("rock".to_string()));
    assert_eq!(normalize(Some("   ".to_string())), None);
    assert_eq!(normalize(None), None);
}

#[test]
fn test_validate_email() {
    assert!(validate_email("picker@example.com").is_ok());
    assert!(matches!(validate_email(""), Err(ValidationError::Required { .. })));
    assert!(validate_email("no-at-sign").is_err());
    assert!(validate_email("a@b").is_err());
}

#[test]
fn test_validate_url_allows_clearing() {
    assert!(validate_url("source_url", None).is_ok());
    assert!(validate_url("source_url", Some("")).is_ok());
    assert!(validate_url("source_url", Some("https://tabs.example.com/song/1")).is_ok());
    assert!(validate_url("source_url", Some("ftp://example.com")).is_err());
}

#[test]
fn test_validate_rating_bounds() {
    assert!(validate_rating("rating", 0.0).is_ok());
    assert!(validate_rating("rating", 5.0).is_ok());
    assert!(validate_rating("rating", 5.01).is_err());
    assert!(validate_rating("rating", f64::NAN).is_err());
}

#[test]
fn test_new_song_collects_every_error() {
    let song = NewSong {
        title: String::new(),
        artist: "Artist".to_string(),
        difficulty: Some(6),
        capo_position: Some(13),
        tempo: Some(10),
        year: Some(1800),
        ..NewSong::default()
    };
    let errors = validate_new_song(&song).unwrap_err();
    let fields: Vec<_> = errors.iter().map(ValidationError::field).collect();
    assert_eq!(fields, ["title", "year", "tempo", "capo_position", "difficulty"]);
}

#[test]
fn test_oversized_content_rejected() {
    let song = NewSong {
        title: "Epic".to_string(),
        artist: "Band".to_string(),
        tab: Some("e|---".repeat(20_000)),
        ..NewSong::default()
    };
    let errors = validate_new_song(&song).unwrap_err();
    assert!(matches!(
        errors.iter().next(),
        Some(ValidationError::TooLarge { field: "tab", .. })
    ));
}

#[test]
fn test_query_ranges_must_be_ordered() {
    let query = SongQuery {
        difficulty_min: Some(4),
        difficulty_max: Some(2),
        ..SongQuery::default()
    };
    assert!(validate_song_query(&query).is_err());

    let search = AdvancedSearch {
        difficulty_range: Some(vec![1, 7]),
        ..AdvancedSearch::default()
    };
    assert!(validate_advanced_search(&search).is_err());
}
