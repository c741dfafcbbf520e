//! Integration tests for record extraction from model output

use mediascout::extract::extract_records;
use mediascout::media::{MediaDraft, MediaType};
use serde_json::json;

#[test]
fn test_truncated_array_keeps_complete_prefix() {
    let records = extract_records(r#"[{"title":"A"},{"title":"B"#);
    assert_eq!(records, vec![json!({"title": "A"})]);
}

#[test]
fn test_prose_answer_yields_nothing() {
    let answer = "I'm sorry, I couldn't find anything matching \"Inception\". [{\"title\":\"x\"}]";
    assert!(extract_records(answer).is_empty());
}

#[test]
fn test_fenced_answer_with_trailing_note() {
    let answer = "```json\n[\n  {\"title\": \"Dune\", \"type\": \"Movie\", \"releaseDate\": \"2021-10-22\"}\n]\n```\nLet me know if you need more.";
    let records = extract_records(answer);
    assert_eq!(records.len(), 1);

    let draft = MediaDraft::from_record(records[0].clone()).unwrap();
    assert_eq!(draft.title, "Dune");
    assert_eq!(draft.media_type, MediaType::Movie);
    assert_eq!(draft.year(), Some("2021"));
}

#[test]
fn test_truncated_real_world_answer() {
    let answer = r#"[
  {"title": "Arcane", "directorOrAuthor": "Christian Linke", "cast": ["Hailee Steinfeld"], "type": "TV Series", "isOngoing": false},
  {"title": "The Last of Us", "directorOrAuthor": "Craig Mazin", "cast": ["Pedro Pascal", "Bella Ramsey"], "type": "TV Series", "isOngoing": true},
  {"title": "Shōgun", "directorOrAuthor": "Rachel Kondo", "description": "Feudal Japan, 1600. Lord Yoshii Toranaga {is fighting"#;
    let titles: Vec<String> = extract_records(answer)
        .into_iter()
        .filter_map(MediaDraft::from_record)
        .map(|d| d.title)
        .collect();
    assert_eq!(titles, ["Arcane", "The Last of Us"]);
}

#[test]
fn test_empty_array_is_a_valid_empty_answer() {
    assert!(extract_records("[]").is_empty());
}

#[test]
fn test_single_record_with_nested_list_and_duplicate_keys() {
    let answer = r#"{"title":"Arcane","type":"TV Series","releaseDate":"2021-11-06","year":"2021","seasons":[{"number":1},{"number":2}]}"#;
    let drafts: Vec<MediaDraft> = extract_records(answer)
        .into_iter()
        .filter_map(MediaDraft::from_record)
        .collect();
    assert_eq!(drafts.len(), 1);
    assert_eq!(drafts[0].title, "Arcane");
    assert_eq!(drafts[0].release_date, "2021-11-06");
}
