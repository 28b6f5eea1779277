use std::collections::{BTreeSet, HashMap};

use near_duper_core::{
    CorpusSnapshot, DedupeEngine, DedupeSettings, DuplicateGroupStore, FileRecord,
    RemoveOutcome, SilentReporter,
};

/// Deterministic pseudo-random text: lowercase "words" separated by single
/// spaces, so collapse normalization leaves it unchanged.
fn random_words(seed: u64, words: usize) -> String {
    let mut state = seed.wrapping_mul(0x9E37_79B9_7F4A_7C15) | 1;
    let mut next = move || {
        state ^= state << 13;
        state ^= state >> 7;
        state ^= state << 17;
        state
    };
    (0..words)
        .map(|_| {
            let len = 3 + (next() % 6) as usize;
            (0..len)
                .map(|_| (b'a' + (next() % 26) as u8) as char)
                .collect::<String>()
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// Replace the `index`-th word.
fn change_word(text: &str, index: usize, replacement: &str) -> String {
    text.split(' ')
        .enumerate()
        .map(|(i, w)| if i == index { replacement } else { w })
        .collect::<Vec<_>>()
        .join(" ")
}

fn settings(threshold: f64, step: usize) -> DedupeSettings {
    DedupeSettings {
        length_range_step: step,
        min_category_length: 2,
        shingle_length: 5,
        shingle_step: 1,
        signature_size: 100,
        similarity_threshold: threshold,
        worker_count: 2,
        ..DedupeSettings::default()
    }
}

fn run(settings: DedupeSettings, records: Vec<FileRecord>) -> near_duper_core::DedupeRun {
    let engine = DedupeEngine::new(settings).unwrap();
    engine
        .run(
            CorpusSnapshot {
                records,
                rejected: Vec::new(),
            },
            &SilentReporter,
        )
        .unwrap()
}

fn membership(groups: &near_duper_core::store::GroupMap) -> BTreeSet<Vec<String>> {
    groups
        .values()
        .map(|g| g.files.iter().map(|f| f.path.clone()).collect())
        .collect()
}

/// Four families of three near-identical documents plus ten unrelated ones.
fn mixed_corpus() -> Vec<FileRecord> {
    let mut records = Vec::new();
    for family in 0..4u64 {
        let base = random_words(100 + family, 80);
        records.push(FileRecord::from_text(format!("/fam{family}/orig.txt"), base.clone()));
        records.push(FileRecord::from_text(
            format!("/fam{family}/edit1.txt"),
            change_word(&base, 10, "replaced"),
        ));
        records.push(FileRecord::from_text(
            format!("/fam{family}/edit2.txt"),
            change_word(&base, 60, "altered"),
        ));
    }
    for unique in 0..10u64 {
        records.push(FileRecord::from_text(
            format!("/unique/{unique}.txt"),
            random_words(1000 + unique, 80),
        ));
    }
    records
}

#[test]
fn test_one_word_change_scenario() {
    let a = "The quick brown fox jumps";
    let b = "The quick brown fox leaps";
    let c = "Completely unrelated text here";
    let records = vec![
        FileRecord::from_text("/a.txt", a),
        FileRecord::from_text("/b.txt", b),
        FileRecord::from_text("/c.txt", c),
    ];

    // Exact Jaccard of the two 5-shingle sets is 16/26, so the threshold
    // must sit below that for a short sentence.
    let result = run(settings(0.4, 50), records);
    assert_eq!(result.groups.len(), 1);
    let group = result.groups.values().next().unwrap();
    let paths: Vec<&str> = group.files.iter().map(|f| f.path.as_str()).collect();
    assert_eq!(paths, vec!["/a.txt", "/b.txt"]);
    assert!(group.avg_similarity >= 0.4);
    assert_eq!(group.length_range, "0-49");
}

#[test]
fn test_one_word_change_in_long_text_at_high_threshold() {
    let base = random_words(7, 120);
    let records = vec![
        FileRecord::from_text("/a.txt", base.clone()),
        FileRecord::from_text("/b.txt", change_word(&base, 50, "leaps")),
        FileRecord::from_text("/c.txt", random_words(8, 120)),
    ];

    let result = run(settings(0.8, 50), records);
    assert_eq!(result.groups.len(), 1);
    let group = result.groups.values().next().unwrap();
    assert_eq!(group.file_count, 2);
    assert!(group.avg_similarity >= 0.8);
    assert!(!group.contains("/c.txt"));
}

#[test]
fn test_identical_content_has_exact_similarity() {
    let text = random_words(11, 40);
    let records = vec![
        FileRecord::from_text("/x/1.txt", text.clone()),
        FileRecord::from_text("/x/2.txt", text.clone()),
        FileRecord::from_text("/x/3.txt", text),
    ];

    let result = run(settings(0.99, 10), records);
    assert_eq!(result.groups.len(), 1);
    let group = result.groups.values().next().unwrap();
    assert_eq!(group.file_count, 3);
    assert_eq!(group.avg_similarity, 1.0);
}

#[test]
fn test_group_properties_hold_on_mixed_corpus() {
    let settings = settings(0.8, 25);
    let result = run(settings.clone(), mixed_corpus());

    let mut seen: HashMap<String, String> = HashMap::new();
    for (id, group) in &result.groups {
        assert_eq!(group.file_count, group.files.len());
        assert!(group.file_count >= settings.min_category_length);
        assert!(group.avg_similarity >= settings.similarity_threshold);
        assert!(group.avg_similarity <= 1.0);
        for file in &group.files {
            if let Some(other) = seen.insert(file.path.clone(), id.clone()) {
                panic!("{} appears in {} and {}", file.path, other, id);
            }
        }
    }

    let expected: BTreeSet<Vec<String>> = (0..4)
        .map(|family| {
            vec![
                format!("/fam{family}/edit1.txt"),
                format!("/fam{family}/edit2.txt"),
                format!("/fam{family}/orig.txt"),
            ]
        })
        .collect();
    assert_eq!(membership(&result.groups), expected);
    assert_eq!(result.stats.files_signed, 22);
    assert!(result.stats.skipped.is_empty());
}

#[test]
fn test_recompute_is_idempotent() {
    let first = run(settings(0.8, 25), mixed_corpus());
    let second = run(settings(0.8, 25), mixed_corpus());

    let first_ids: Vec<&String> = first.groups.keys().collect();
    let second_ids: Vec<&String> = second.groups.keys().collect();
    assert_eq!(first_ids, second_ids);
    assert_eq!(membership(&first.groups), membership(&second.groups));
}

#[test]
fn test_result_independent_of_input_order_and_workers() {
    let mut reversed = mixed_corpus();
    reversed.reverse();

    let serial = run(
        DedupeSettings {
            worker_count: 1,
            ..settings(0.8, 25)
        },
        mixed_corpus(),
    );
    let parallel = run(
        DedupeSettings {
            worker_count: 4,
            ..settings(0.8, 25)
        },
        reversed,
    );
    assert_eq!(
        serial.groups.keys().collect::<Vec<_>>(),
        parallel.groups.keys().collect::<Vec<_>>()
    );
    assert_eq!(membership(&serial.groups), membership(&parallel.groups));
    for (id, group) in &serial.groups {
        let other = &parallel.groups[id];
        assert_eq!(group.avg_similarity, other.avg_similarity);
        assert_eq!(group.length_range, other.length_range);
    }
}

#[test]
fn test_short_files_never_grouped() {
    let records = vec![
        FileRecord::from_text("/tiny1.txt", "abcd"),
        FileRecord::from_text("/tiny2.txt", "abcd"),
        FileRecord::from_text("/tiny3.txt", "ab  c"),
    ];
    let result = run(settings(0.5, 10), records);
    assert!(result.groups.is_empty());
    assert_eq!(result.stats.skipped.len(), 3);
}

#[test]
fn test_min_category_length_drops_small_components() {
    let text = random_words(21, 50);
    let records = vec![
        FileRecord::from_text("/p/1.txt", text.clone()),
        FileRecord::from_text("/p/2.txt", text),
    ];
    let result = run(
        DedupeSettings {
            min_category_length: 3,
            ..settings(0.8, 10)
        },
        records,
    );
    assert!(result.groups.is_empty());
}

#[test]
fn test_three_identical_then_deletions() {
    let text = random_words(31, 30);
    let records = vec![
        FileRecord::from_text("/same/a.txt", text.clone()),
        FileRecord::from_text("/same/b.txt", text.clone()),
        FileRecord::from_text("/same/c.txt", text),
    ];

    let engine = DedupeEngine::new(settings(0.8, 50)).unwrap();
    let mut store = DuplicateGroupStore::new(engine, "unused-dupes.json");
    let groups = store.compute(&records, &SilentReporter).unwrap();
    assert_eq!(groups.len(), 1);
    let (group_id, group) = groups.iter().next().unwrap();
    let group_id = group_id.clone();
    assert_eq!(group.file_count, 3);
    assert_eq!(group.avg_similarity, 1.0);

    assert_eq!(
        store.remove_file("/same/a.txt"),
        RemoveOutcome::Shrunk {
            group_id: group_id.clone(),
            remaining: 2
        }
    );
    let group = store.get(&group_id).unwrap();
    assert_eq!(group.file_count, 2);
    let remaining: Vec<&str> = group.files.iter().map(|f| f.path.as_str()).collect();
    assert_eq!(remaining, vec!["/same/b.txt", "/same/c.txt"]);

    assert_eq!(
        store.remove_file("/same/b.txt"),
        RemoveOutcome::GroupDeleted { group_id }
    );
    assert!(store.is_empty());
    assert_eq!(store.remove_file("/same/c.txt"), RemoveOutcome::NotFound);
}

#[test]
fn test_compute_reports_stats() {
    let engine = DedupeEngine::new(settings(0.8, 25)).unwrap();
    let mut store = DuplicateGroupStore::new(engine, "unused-dupes.json");
    store.compute(&mixed_corpus(), &SilentReporter).unwrap();

    let stats = store.last_run().unwrap();
    assert_eq!(stats.files_seen, 22);
    assert_eq!(stats.groups, 4);
    assert_eq!(stats.grouped_files, 12);
    assert!(stats.candidate_pairs >= stats.edges);
    assert!(stats.buckets >= 1);
}
