use qlaunch_core::candidate_store::CandidateStore;
use qlaunch_core::filter::filter;

const ALPHABET: &[char] = &['a', 'b', 'c', 'A', '-', '.'];

/// Small deterministic xorshift generator for property-style checks.
struct XorShift(u64);

impl XorShift {
    fn next(&mut self) -> u64 {
        let mut x = self.0;
        x ^= x << 13;
        x ^= x >> 7;
        x ^= x << 17;
        self.0 = x;
        x
    }

    fn below(&mut self, bound: usize) -> usize {
        (self.next() % bound as u64) as usize
    }

    fn word(&mut self, max_len: usize) -> String {
        let len = self.below(max_len + 1);
        (0..len).map(|_| ALPHABET[self.below(ALPHABET.len())]).collect()
    }
}

fn random_store(rng: &mut XorShift) -> CandidateStore {
    let count = rng.below(40);
    let names: Vec<String> = (0..count).map(|_| rng.word(5)).collect();
    CandidateStore::from_names(names, 64)
}

#[test]
fn match_iff_candidate_starts_with_input() {
    let mut rng = XorShift(0x9e37_79b9_7f4a_7c15);
    for _ in 0..500 {
        let store = random_store(&mut rng);
        let input = rng.word(3);
        let matches = filter(&store, &input);

        for name in store.iter() {
            let expected = !input.is_empty() && name.starts_with(input.as_str());
            assert_eq!(
                matches.contains(&name),
                expected,
                "name={name:?} input={input:?}"
            );
        }
    }
}

#[test]
fn matches_are_a_subsequence_of_store_order() {
    let mut rng = XorShift(0x2545_f491_4f6c_dd1d);
    for _ in 0..500 {
        let store = random_store(&mut rng);
        let input = rng.word(2);
        let matches = filter(&store, &input);

        let mut names = store.iter();
        for matched in &matches {
            assert!(
                names.any(|name| name == *matched),
                "{matched:?} out of order for input {input:?}"
            );
        }
    }
}

#[test]
fn empty_input_never_matches() {
    let mut rng = XorShift(42);
    for _ in 0..100 {
        let store = random_store(&mut rng);
        assert!(filter(&store, "").is_empty());
    }
}

#[test]
fn fin_scenario() {
    let store = CandidateStore::from_names(["firefox", "find", "finger"], 16);
    assert_eq!(filter(&store, "fin"), ["find", "finger"]);
}
