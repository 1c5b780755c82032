use mdchunk_core::structure::chunk_document;
use mdchunk_core::tokenizer::CharTokenizer;
use mdchunk_core::window::{split, window_count, window_spans};
use proptest::prelude::*;

const FENCE: &str = "```rust\n# hidden\nlet x = 1;\n```";
const TABLE: &str = "| a | b |\n|---|---|\n| 1 | 2 |";

fn params() -> impl Strategy<Value = (usize, usize)> {
    (2usize..64).prop_flat_map(|target| (Just(target), 1..target))
}

fn markdown_line() -> impl Strategy<Value = String> {
    prop_oneof![
        (1usize..=8, "[a-z]{1,8}").prop_map(|(n, t)| format!("{} {}\n", "#".repeat(n), t)),
        "[a-z ]{0,20}".prop_map(|t| format!("{t}\n")),
        Just("\n".to_string()),
        Just(format!("{FENCE}\n")),
        Just(format!("{TABLE}\n")),
        "\\[[a-z]{1,5}\\]\\(https://[a-z]{1,5}\\.example\\)".prop_map(|l| format!("{l}\n")),
    ]
}

fn markdown_doc() -> impl Strategy<Value = String> {
    prop::collection::vec(markdown_line(), 0..40).prop_map(|lines| lines.concat())
}

proptest! {
    #[test]
    fn windows_cover_input_without_gaps(n in 0usize..500, (target, overlap) in params()) {
        let spans = window_spans(n, target, overlap).unwrap();
        if n == 0 {
            prop_assert!(spans.is_empty());
        } else {
            prop_assert_eq!(spans[0].start, 0);
            prop_assert_eq!(spans.last().unwrap().end, n);
            for pair in spans.windows(2) {
                prop_assert!(pair[0].start < pair[1].start);
                prop_assert!(pair[1].start <= pair[0].end);
            }
        }
    }

    #[test]
    fn windows_bounded_and_overlap_exact(n in 1usize..500, (target, overlap) in params()) {
        let spans = window_spans(n, target, overlap).unwrap();
        for span in &spans {
            prop_assert!(span.len() <= target);
        }
        for pair in spans.windows(2) {
            prop_assert_eq!(pair[0].end - pair[1].start, overlap);
            prop_assert_eq!(pair[0].len(), target);
        }
    }

    #[test]
    fn window_count_formula(n in 0usize..2000, (target, overlap) in params()) {
        let expected = if n == 0 {
            0
        } else if n > overlap {
            (n - overlap).div_ceil(target - overlap)
        } else {
            1
        };
        prop_assert_eq!(window_count(n, target, overlap), expected);
        prop_assert_eq!(window_spans(n, target, overlap).unwrap().len(), expected);
    }

    #[test]
    fn char_windows_reassemble_text(text in "\\PC{0,300}", (target, overlap) in params()) {
        let windows = split(&CharTokenizer, &text, target, overlap).unwrap();
        let mut rebuilt = String::new();
        for (i, w) in windows.iter().enumerate() {
            prop_assert_eq!(w.token_count, w.end_index - w.start_index);
            prop_assert_eq!(w.text.chars().count(), w.token_count);
            let skip = if i == 0 { 0 } else { overlap };
            rebuilt.extend(w.text.chars().skip(skip));
        }
        prop_assert_eq!(rebuilt, text);
    }

    #[test]
    fn structural_roundtrip(doc in markdown_doc()) {
        let chunks = chunk_document(&doc).unwrap();
        let rebuilt: String = chunks.iter().map(|c| c.content.as_str()).collect();
        prop_assert_eq!(rebuilt, doc);
    }

    #[test]
    fn structural_blocks_are_atomic(doc in markdown_doc()) {
        let chunks = chunk_document(&doc).unwrap();
        let mut fences = 0;
        let mut tables = 0;
        for chunk in &chunks {
            let whole = chunk.content.matches(FENCE).count();
            prop_assert_eq!(chunk.content.matches("```rust").count(), whole);
            prop_assert_eq!(chunk.code_blocks.len(), whole);
            fences += whole;
            tables += chunk.content.matches(TABLE).count();
        }
        prop_assert_eq!(fences, doc.matches(FENCE).count());
        prop_assert_eq!(tables, doc.matches(TABLE).count());
    }

    #[test]
    fn structural_parents_precede_and_are_shallower(doc in markdown_doc()) {
        let chunks = chunk_document(&doc).unwrap();
        for (i, chunk) in chunks.iter().enumerate() {
            prop_assert!(chunk.level <= 6);
            if chunk.level > 0 {
                let first = chunk.content.lines().next().unwrap_or_default();
                prop_assert!(first.starts_with(&"#".repeat(chunk.level as usize)));
            }
            if let Some(parent) = &chunk.parent_id {
                let found = chunks[..i].iter().find(|c| &c.id == parent);
                prop_assert!(found.is_some());
                prop_assert!(found.unwrap().level < chunk.level);
            }
        }
    }

    #[test]
    fn structural_ids_deterministic(doc in markdown_doc()) {
        let a = chunk_document(&doc).unwrap();
        let b = chunk_document(&doc).unwrap();
        let ids_a: Vec<&str> = a.iter().map(|c| c.id.as_str()).collect();
        let ids_b: Vec<&str> = b.iter().map(|c| c.id.as_str()).collect();
        prop_assert_eq!(ids_a, ids_b);
    }
}
