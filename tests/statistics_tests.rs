/// File analysis and aggregation through `AnalysisService`
mod common;

use common::TestEnvironment;
use pretty_assertions::assert_eq;
use seqscope::bio::composition::BaseCounts;
use seqscope::bio::stats::HISTOGRAM_BINS;
use seqscope::config::Config;
use seqscope::storage::{FileRecord, FileRegistry, RecordStore, UploadStatus};
use seqscope::SeqscopeError;

#[test]
fn test_end_to_end_two_records() {
    let env = TestEnvironment::new();
    env.add_completed("f1", ">s1\nATCG\n>s2\nGGCC\n");

    let stats = env.analysis.analyze_file("f1").unwrap();

    assert_eq!(stats.file_id, "f1");
    assert_eq!(stats.total_sequences, 2);
    assert_eq!(stats.valid_sequences, 2);
    assert_eq!(stats.total_length, 8);
    assert_eq!(stats.average_length, 4.0);
    assert_eq!(stats.min_length, 4);
    assert_eq!(stats.max_length, 4);
    assert_eq!(stats.average_gc_content, 75.0);
    assert_eq!(stats.base_composition, BaseCounts { a: 1, t: 1, c: 3, g: 3, n: 0 });

    // A single distinct length puts everything in the first bin
    assert_eq!(stats.length_distribution.len(), HISTOGRAM_BINS);
    assert_eq!(stats.length_distribution[0].count, 2);
    // 50% and 100%
    assert_eq!(stats.gc_distribution[5].count, 1);
    assert_eq!(stats.gc_distribution[9].count, 1);
}

#[test]
fn test_histograms_cover_every_valid_record() {
    let env = TestEnvironment::new();
    let mut fasta = String::new();
    for len in [10usize, 25, 33, 47, 58, 61, 72, 88, 95, 110] {
        fasta.push_str(&format!(">len{}\n{}\n", len, "GA".repeat(len / 2) + &"T".repeat(len % 2)));
    }
    env.add_completed("f1", &fasta);

    let stats = env.analysis.analyze_file("f1").unwrap();
    let length_total: usize = stats.length_distribution.iter().map(|b| b.count).sum();
    let gc_total: usize = stats.gc_distribution.iter().map(|b| b.count).sum();

    assert_eq!(length_total, stats.valid_sequences);
    assert_eq!(gc_total, stats.valid_sequences);
    assert_eq!(stats.length_distribution[0].start, 10);
    assert_eq!(stats.length_distribution[HISTOGRAM_BINS - 1].end, 110);
}

#[test]
fn test_empty_file_gives_zero_aggregate() {
    let env = TestEnvironment::new();
    env.add_completed("empty", "");

    let stats = env.analysis.analyze_file("empty").unwrap();
    assert_eq!(stats.total_sequences, 0);
    assert_eq!(stats.average_length, 0.0);
    assert_eq!(stats.average_gc_content, 0.0);
    assert!(stats.length_distribution.is_empty());
    assert!(stats.gc_distribution.is_empty());
}

#[test]
fn test_records_persisted_in_configured_batches() {
    let mut config = Config::default();
    config.storage.batch_size = 4;
    let env = TestEnvironment::with_config(&config);
    env.add_completed("f1", &common::generate_fasta(10, 20));

    env.analysis.analyze_file("f1").unwrap();

    assert_eq!(env.store.batch_inserts(), 3);
    assert_eq!(env.store.single_inserts(), 0);
    let stored = env.store.load_records("f1").unwrap();
    assert_eq!(stored.len(), 10);
    assert_eq!(stored[0].id, "seq_0");
    assert_eq!(stored[9].id, "seq_9");
}

#[test]
fn test_statistics_is_memoized() {
    let env = TestEnvironment::new();
    env.add_completed("f1", ">s1\nACGT\n");

    let first = env.analysis.statistics("f1").unwrap();
    let second = env.analysis.statistics("f1").unwrap();
    assert!(std::sync::Arc::ptr_eq(&first, &second));
}

#[test]
fn test_precondition_errors_name_the_file() {
    let env = TestEnvironment::new();
    env.add_file("pending", ">s1\nACGT\n", UploadStatus::Uploading);
    env.add_file("failed", ">s1\nACGT\n", UploadStatus::Failed);

    let err = env.analysis.analyze_file("nope").unwrap_err();
    assert!(matches!(err, SeqscopeError::NotFound(_)));
    assert!(err.to_string().contains("nope"));

    let err = env.analysis.analyze_file("pending").unwrap_err();
    assert!(err.is_precondition());
    assert!(err.to_string().contains("pending"));
    assert!(err.to_string().contains("UPLOADING"));

    let err = env.analysis.statistics("failed").unwrap_err();
    assert!(err.to_string().contains("FAILED"));
}

#[test]
fn test_composition_string() {
    let records = seqscope::bio::fasta::parse_fasta_from_bytes(b">s\nAATTCCGN\n").unwrap();
    assert_eq!(
        records[0].composition.percentages(),
        "A:25.0%, T:25.0%, C:25.0%, G:12.5%, N:12.5%"
    );
}

#[test]
fn test_truncated_gzip_leaves_nothing_behind() {
    use flate2::write::GzEncoder;
    use flate2::Compression;
    use std::io::Write;

    let mut config = Config::default();
    config.storage.batch_size = 25;
    let env = TestEnvironment::with_config(&config);

    let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(common::generate_fasta(5000, 90).as_bytes()).unwrap();
    let compressed = encoder.finish().unwrap();
    let path = env.path("half.fasta.gz");
    common::write_file(&path, &compressed[..compressed.len() / 2]);
    env.registry
        .register(FileRecord::new("half", "half.fasta.gz", path, compressed.len() as u64 / 2)
            .with_status(UploadStatus::Completed))
        .unwrap();

    let err = env.analysis.analyze_file("half").unwrap_err();
    assert!(matches!(err, SeqscopeError::Io(_)));
    assert!(env.store.batch_inserts() > 0);
    assert!(!env.store.has_records("half").unwrap());

    // Nothing partial is served afterwards either
    assert!(env.analysis.statistics("half").is_err());
    assert!(env.analysis.cached_statistics("half").is_none());
    assert!(env.analysis.records("half").is_err());
}

#[test]
fn test_file_without_valid_records_is_parsed_once() {
    let env = TestEnvironment::new();
    env.add_completed("junk", ">s1\nXYZ\n>s2\n");

    let first = env.analysis.statistics("junk").unwrap();
    assert_eq!(first.total_sequences, 0);
    for _ in 0..3 {
        assert!(env.analysis.records("junk").unwrap().is_empty());
    }

    let later = env.analysis.statistics("junk").unwrap();
    assert!(std::sync::Arc::ptr_eq(&first, &later));
    assert_eq!(env.store.batch_inserts() + env.store.single_inserts(), 0);
}
