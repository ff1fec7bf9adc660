use proptest::prelude::*;
use std::num::NonZeroUsize;

use lockhud::classification::BlockingClassifier;
use lockhud::detection::SignatureHistory;
use lockhud::domain::StackSignature;
use lockhud::dump::parse_dump;

fn frame() -> impl Strategy<Value = String> {
    ("[a-z_][a-z0-9_]{0,12}", "[a-z]{1,8}", 1u32..5000)
        .prop_map(|(func, module, line)| format!("{func} ({module}.py:{line})"))
}

fn thread_block() -> impl Strategy<Value = (String, Vec<String>)> {
    ("[a-z][a-z0-9-]{0,10}", prop::collection::vec(frame(), 0..8))
}

fn render(threads: &[(String, String, Vec<String>)]) -> String {
    let mut out = String::from("Process 1: python\n\n");
    for (id, name, frames) in threads {
        out.push_str(&format!("Thread {id} (idle): \"{name}\"\n"));
        for frame in frames {
            out.push_str(&format!("    {frame}\n"));
        }
    }
    out
}

proptest! {
    #[test]
    fn parser_recovers_rendered_threads(blocks in prop::collection::vec(thread_block(), 1..6)) {
        let threads: Vec<_> = blocks
            .into_iter()
            .enumerate()
            .map(|(i, (name, frames))| (format!("0x{:X}", i + 1), name, frames))
            .collect();

        let snapshot = parse_dump(&render(&threads));
        prop_assert_eq!(snapshot.thread_count(), threads.len());
        for (id, name, frames) in &threads {
            let parsed = snapshot.thread(id).unwrap();
            prop_assert_eq!(parsed.thread_name(), name.as_str());
            prop_assert_eq!(parsed.stack_frames(), frames.as_slice());
        }
    }

    #[test]
    fn parser_never_panics(input in "\\PC{0,400}") {
        let snapshot = parse_dump(&input);
        for thread in snapshot.threads() {
            prop_assert!(!thread.thread_id().is_empty());
        }
    }

    #[test]
    fn classification_depends_only_on_top_frames(
        top in prop::collection::vec(frame(), 5),
        tail_a in prop::collection::vec(frame(), 0..5),
        tail_b in prop::collection::vec(frame(), 0..5),
    ) {
        let classifier = BlockingClassifier::default();
        let a: Vec<String> = top.iter().cloned().chain(tail_a).collect();
        let b: Vec<String> = top.iter().cloned().chain(tail_b).collect();
        prop_assert_eq!(classifier.classify_frames(&a), classifier.classify_frames(&b));
    }

    #[test]
    fn history_window_never_exceeds_capacity(
        capacity in 1usize..6,
        picks in prop::collection::vec(0usize..3, 0..40),
    ) {
        let signatures: Vec<StackSignature> = ["a", "b", "c"]
            .iter()
            .map(|f| StackSignature::from_frames(&[*f]))
            .collect();
        let mut history = SignatureHistory::new(NonZeroUsize::new(capacity).unwrap());

        for &pick in &picks {
            history.record("t", signatures[pick]);
            prop_assert!(history.window_len("t") <= capacity);
        }

        prop_assert_eq!(history.window_len("t"), picks.len().min(capacity));
        let expected: Vec<_> =
            picks.iter().rev().take(capacity).rev().map(|&p| signatures[p]).collect();
        let actual: Vec<_> = history.window("t").copied().collect();
        prop_assert_eq!(&actual, &expected);

        let tail_equal = picks.len() >= capacity
            && expected.windows(2).all(|pair| pair[0] == pair[1]);
        prop_assert_eq!(history.is_stable("t"), tail_equal);
    }
}
