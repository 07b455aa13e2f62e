use sermon_analyzer::audit::{audit_registry, collect_registry_additions, reconcile_catalog};
use sermon_analyzer::catalog::{dedup_entries, read_entries, write_entries, SermonEntry, TranscriptFile};
use sermon_analyzer::speakers::{normalize, validate, RejectReason};
use sermon_analyzer::{
    BatchProcessor, ConfigBuilder, SpeakerIdentifier, SpeakerLexicon, SpeakerRegistry, Verdict,
    UNKNOWN_SPEAKER,
};
use std::sync::Arc;
use tempfile::TempDir;
use tokio::fs;

#[test]
fn test_title_examples_end_to_end() {
    let identifier = SpeakerIdentifier::with_defaults().unwrap();
    let registry = SpeakerRegistry::from_names(["Chad Lamb"]);

    let cases = [
        ("Bro David Mayeur — Sunday Morning Service", "David Mayeur"),
        ("2025 Annual Meeting Bro. Darrell Ward 71925", "Darrell Ward"),
        ("Access Granted - Chad Lamb", "Chad Lamb"),
        ("Word And Spirit", UNKNOWN_SPEAKER),
    ];

    for (title, expected) in cases {
        assert_eq!(identifier.identify(title, None, &registry).speaker, expected, "{}", title);
    }
}

#[test]
fn test_digits_and_token_bounds() {
    let lexicon = SpeakerLexicon::new();
    let registry = SpeakerRegistry::from_names(["Branham"]);

    assert_eq!(
        validate(&lexicon, &registry, "Darrell Ward 71925"),
        Verdict::Rejected(RejectReason::ContainsDigit)
    );
    assert!(validate(&lexicon, &registry, "Branham").is_accepted());
    assert!(!validate(&lexicon, &registry, "Mayeur").is_accepted());
    assert!(!validate(&lexicon, &registry, "One Two Three Four Five").is_accepted());
}

#[test]
fn test_normalization_idempotent_across_inputs() {
    let mut lexicon = SpeakerLexicon::new();
    lexicon.add_rule("Dave Mayeur", "David Mayeur");
    let registry = SpeakerRegistry::from_names(["Chad Lamb", "David Mayeur"]);

    for input in ["Chad Lamb Access", "dave mayeur", "Chad Lamb", "Someone Else June"] {
        let once = normalize(&lexicon, &registry, input);
        assert_eq!(normalize(&lexicon, &registry, &once), once);
    }
    assert_eq!(normalize(&lexicon, &registry, "Chad Lamb Access"), "Chad Lamb");
}

#[test]
fn test_rule_file_overrides_defaults() {
    let temp_dir = TempDir::new().unwrap();
    let rules = temp_dir.path().join("rules.json");
    std::fs::write(
        &rules,
        r#"{
            "honorifics": ["Bro", "Minister"],
            "normalization_rules": {"Dave Mayeur": "David Mayeur"},
            "patterns": [{"name": "speaker-line", "regex": "Speaker:\\s*([A-Z][a-z]+ [A-Z][a-z]+)"}]
        }"#,
    )
    .unwrap();

    let lexicon = SpeakerLexicon::from_file(&rules).unwrap();
    assert!(lexicon.is_honorific("minister"));
    assert!(!lexicon.is_honorific("pastor"));
    // categories absent from the file keep their defaults
    assert!(lexicon.is_month("june"));

    let identifier = SpeakerIdentifier::new(Arc::new(lexicon)).unwrap();
    let registry = SpeakerRegistry::new();
    let found = identifier.identify("Untitled", Some("Speaker: Dave Mayeur"), &registry);
    assert_eq!(found.speaker, "David Mayeur");
}

#[test]
fn test_catalog_reconcile_and_registry_rebuild() {
    let temp_dir = TempDir::new().unwrap();
    let csv_path = temp_dir.path().join("grace.csv");

    let entries = vec![
        SermonEntry {
            date: "2024-01-07".to_string(),
            title: "Bro David Mayeur — Sunday Morning Service".to_string(),
            speaker: "Unknown Speaker".to_string(),
            ..Default::default()
        },
        SermonEntry {
            date: "2024-01-14".to_string(),
            title: "Faith".to_string(),
            speaker: "Bro. Darrell Ward".to_string(),
            ..Default::default()
        },
    ];
    write_entries(&csv_path, &entries).unwrap();

    let identifier = SpeakerIdentifier::with_defaults().unwrap();
    let registry = SpeakerRegistry::from_names(["Darrell Ward"]);
    let rows = read_entries(&csv_path).unwrap();

    let (corrections, summary) = reconcile_catalog(&identifier, &registry, &rows);
    assert_eq!(corrections.len(), 2);
    assert_eq!(summary.fixed, 2);

    let additions = collect_registry_additions(&identifier, &registry, &rows);
    assert!(additions.is_empty(), "speakers are still uncorrected: {:?}", additions);

    let fixed: Vec<SermonEntry> = rows
        .iter()
        .zip(&corrections)
        .map(|(row, c)| SermonEntry {
            speaker: c.corrected.clone(),
            ..row.clone()
        })
        .collect();
    assert_eq!(
        collect_registry_additions(&identifier, &registry, &fixed),
        vec!["David Mayeur".to_string()]
    );

    assert!(audit_registry(&identifier, &registry).is_empty());
}

#[test]
fn test_rows_duplicated_across_catalogs_merge_once() {
    let temp_dir = TempDir::new().unwrap();
    let row = |date: &str, title: &str, url: &str, speaker: &str| SermonEntry {
        date: date.to_string(),
        title: title.to_string(),
        url: url.to_string(),
        speaker: speaker.to_string(),
        ..Default::default()
    };

    let grace = temp_dir.path().join("grace.csv");
    let bethel = temp_dir.path().join("bethel.csv");
    write_entries(
        &grace,
        &[
            row("2024-01-07", "Faith", "https://www.youtube.com/watch?v=Xy12ab34CD5", "Bro. Ray Jones"),
            row("2024-01-14", "Hope", "", "Darrell Ward"),
        ],
    )
    .unwrap();
    write_entries(
        &bethel,
        &[
            row("2024-01-07", "Faith", "https://youtu.be/Xy12ab34CD5", "Ray Jones"),
            row("2024-01-21", "Love", "", "Chad Lamb"),
        ],
    )
    .unwrap();

    let mut merged = read_entries(&grace).unwrap();
    merged.extend(read_entries(&bethel).unwrap());
    let (entries, duplicates) = dedup_entries(merged);

    assert_eq!(duplicates, 1);
    assert_eq!(entries.len(), 3);
    assert_eq!(entries[0].speaker, "Bro. Ray Jones");

    let identifier = SpeakerIdentifier::with_defaults().unwrap();
    let registry = SpeakerRegistry::from_names(["Darrell Ward"]);
    assert_eq!(
        collect_registry_additions(&identifier, &registry, &entries),
        vec!["Chad Lamb".to_string(), "Ray Jones".to_string()]
    );
}

#[tokio::test]
async fn test_transcript_scan_and_apply() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("2024-01-07.txt");
    fs::write(
        &path,
        "Date: 2024-01-07\nTitle: 2025 Annual Meeting Bro. Darrell Ward 71925\nSpeaker: \n--- TRANSCRIPT ---\nAmen.\n",
    )
    .await
    .unwrap();

    let config = ConfigBuilder::new().with_workers(1).build();
    let processor = BatchProcessor::new(
        &config,
        SpeakerIdentifier::with_defaults().unwrap(),
        SpeakerRegistry::new(),
    );

    let scan = processor.scan_directory(temp_dir.path()).await.unwrap();
    assert_eq!(scan.corrected, 1);

    let summary = processor.apply_corrections(&scan).await;
    assert_eq!(summary.fixed, 1);

    let file = TranscriptFile::read(&path).unwrap();
    assert_eq!(file.header.speaker.as_deref(), Some("Darrell Ward"));
    assert_eq!(file.body, "Amen.\n");
}
