//! Benchmarks for the per-value hot path: standardization, extraction and
//! whole-record transformation.

use criterion::{criterion_group, criterion_main, Criterion};
use nutri_guard::analyzers::{AnalysisAccumulator, NumericFormatAnalyzer};
use nutri_guard::config::EngineConfig;
use nutri_guard::extract::{extract, extract_energy, extract_single_pair, ScoreLetterExtractor};
use nutri_guard::record::RawRecord;
use nutri_guard::reference::ReferenceVocabulary;
use nutri_guard::text::{standardize, standardize_name};
use nutri_guard::transform::RecordTransformer;
use serde_json::json;
use std::hint::black_box;
use std::sync::Arc;

const VALUES: [&str; 6] = [
    "1,008 kj (241 kcal)",
    "30,9 g",
    "< 0,5 g",
    "1 portion (30g)",
    "indisponible",
    "Nutri-Score B",
];

fn sample_record(i: usize) -> RawRecord {
    RawRecord::from_value(json!({
        "barcode": format!("{i:013}"),
        "name": "Pâte à tartiner \u{2013} Noisettes",
        "nutri_score": "Nutri-Score E",
        "quantity": "400 g",
        "serving_size": "15g",
        "nutrients_100g": {
            "Energy": "2252 kj (539 kcal)",
            "Fat": "30,9 g",
            "Saturated fat": "10.6 g",
            "Carbohydrates": "57.5 g",
            "Sugars": "56.3 g",
            "Proteins": "6.3 g",
            "Salt": "traces"
        }
    }))
    .unwrap()
}

fn benchmark_text(c: &mut Criterion) {
    let mut group = c.benchmark_group("text");
    group.bench_function("standardize", |b| {
        b.iter(|| {
            for value in VALUES {
                black_box(standardize(black_box(value)));
            }
        })
    });
    group.bench_function("standardize_name", |b| {
        b.iter(|| black_box(standardize_name(black_box("Saturated fat (g) \u{2013} total"))))
    });
    group.finish();
}

fn benchmark_extraction(c: &mut Criterion) {
    let letters = ScoreLetterExtractor::default();
    let mut group = c.benchmark_group("extraction");
    group.bench_function("extract", |b| {
        b.iter(|| {
            for value in VALUES {
                black_box(extract(black_box(value)));
            }
        })
    });
    group.bench_function("extract_single_pair", |b| {
        b.iter(|| {
            for value in VALUES {
                black_box(extract_single_pair(black_box(value)));
            }
        })
    });
    group.bench_function("extract_energy", |b| {
        b.iter(|| black_box(extract_energy(black_box("1,008 kj (241 kcal)"))))
    });
    group.bench_function("extract_letter", |b| {
        b.iter(|| black_box(letters.extract_letter(black_box("Nutri-Score B"))))
    });
    group.finish();
}

fn benchmark_records(c: &mut Criterion) {
    let records: Vec<RawRecord> = (0..1000).map(sample_record).collect();
    let transformer = RecordTransformer::default();
    let vocabulary = Arc::new(ReferenceVocabulary::from_names([
        "energy",
        "fat",
        "saturated fat",
        "carbohydrates",
        "sugars",
        "proteins",
        "salt",
    ]));
    let analyzer = NumericFormatAnalyzer::new(vocabulary, &EngineConfig::default());

    let mut group = c.benchmark_group("records");
    group.bench_function("transform_1000", |b| {
        b.iter(|| {
            for record in &records {
                black_box(transformer.transform(record));
            }
        })
    });
    group.bench_function("numeric_analysis_1000", |b| {
        b.iter(|| {
            let mut acc = AnalysisAccumulator::new();
            for record in &records {
                analyzer.observe(&mut acc, record);
            }
            black_box(acc.finalize())
        })
    });
    group.finish();
}

criterion_group!(benches, benchmark_text, benchmark_extraction, benchmark_records);
criterion_main!(benches);
