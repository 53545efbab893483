use std::time::Instant;

use crate::candidate_store::CandidateStore;
use crate::filter::filter;

fn p95_ms(samples: &mut [f64]) -> f64 {
    samples.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
    let last = samples.len().saturating_sub(1);
    let idx = ((last as f64) * 0.95).round() as usize;
    samples[idx.min(last)]
}

#[test]
fn keystroke_filter_p95_under_5ms() {
    let mut names: Vec<String> = (0..4_000).map(|i| format!("tool-{i:05}")).collect();
    names.push("firefox".to_string());
    let store = CandidateStore::from_names(names, 4_096);

    for _ in 0..30 {
        let _ = filter(&store, "tool-01");
    }

    let mut batch_p95 = Vec::with_capacity(5);
    for _ in 0..5 {
        let mut samples = Vec::with_capacity(80);
        for _ in 0..80 {
            let start = Instant::now();
            let matches = filter(&store, "tool-01");
            samples.push(start.elapsed().as_secs_f64() * 1000.0);
            assert_eq!(matches.len(), 1_000);
        }
        batch_p95.push(p95_ms(&mut samples));
    }

    batch_p95.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
    let median_p95 = batch_p95[batch_p95.len() / 2];

    assert!(
        median_p95 <= 5.0,
        "median batch p95 too high: {median_p95:.3}ms (budget 5.0ms); batches={batch_p95:?}",
    );
}
