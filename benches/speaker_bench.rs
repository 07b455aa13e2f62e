use criterion::{black_box, criterion_group, criterion_main, Criterion};
use sermon_analyzer::speakers::{normalize, validate};
use sermon_analyzer::{SpeakerIdentifier, SpeakerLexicon, SpeakerRegistry};

const TITLES: [&str; 6] = [
    "Bro David Mayeur — Sunday Morning Service",
    "2025 Annual Meeting Bro. Darrell Ward 71925",
    "The Seventh Seal - John Smith",
    "Faith That Overcomes by Pastor Ray Jones",
    "Bro. John Smith, Sis. Jane Doe",
    "Sunday Evening Service 2024-01-07",
];

fn registry() -> SpeakerRegistry {
    SpeakerRegistry::from_names((0..500).map(|i| format!("Speaker{} Lastname{}", i, i)).chain([
        "Chad Lamb".to_string(),
        "David Mayeur".to_string(),
        "Darrell Ward".to_string(),
    ]))
}

fn bench_lexicon(c: &mut Criterion) {
    c.bench_function("lexicon_creation", |b| {
        b.iter(|| black_box(SpeakerLexicon::new()))
    });

    let lexicon = SpeakerLexicon::new();
    c.bench_function("lexicon_term_lookup", |b| {
        b.iter(|| {
            black_box(lexicon.is_topic_keyword("Service"));
            black_box(lexicon.is_month("December"));
            black_box(lexicon.is_honorific("Bro."));
        })
    });
}

fn bench_identification(c: &mut Criterion) {
    let identifier = SpeakerIdentifier::with_defaults().unwrap();
    let registry = registry();

    c.bench_function("identify_titles", |b| {
        b.iter(|| {
            for title in TITLES {
                black_box(identifier.identify(title, None, &registry));
            }
        })
    });

    let lexicon = SpeakerLexicon::new();
    c.bench_function("validate_candidates", |b| {
        b.iter(|| {
            black_box(validate(&lexicon, &registry, "Bro. Darrell Ward"));
            black_box(validate(&lexicon, &registry, "Word And Spirit"));
            black_box(validate(&lexicon, &registry, "Sunday Morning Service"));
        })
    });

    c.bench_function("normalize_prefix_collapse", |b| {
        b.iter(|| black_box(normalize(&lexicon, &registry, "Chad Lamb Access")))
    });
}

criterion_group!(benches, bench_lexicon, bench_identification);
criterion_main!(benches);
