use docrag_core::chunker::{HierarchicalChunker, RegexSentenceSplitter};
use docrag_core::traits::{SentenceSplitter, TokenCounter};
use docrag_core::types::{DocumentMetadata, DocumentStructure, Section};
use pretty_assertions::assert_eq;

/// One token per whitespace-separated word, so budgets are easy to reason about.
struct WordCounter;

impl TokenCounter for WordCounter {
    fn count(&self, text: &str) -> usize {
        text.split_whitespace().count()
    }
}

fn chunker(max_tokens: usize, overlap: usize) -> HierarchicalChunker {
    HierarchicalChunker::new(max_tokens, overlap, Box::new(WordCounter), Box::new(RegexSentenceSplitter)).expect("chunker")
}

fn section(title: &str, lines: &[&str]) -> Section {
    Section {
        title: title.to_string(),
        content: lines.iter().map(|s| s.to_string()).collect(),
        level: Some(1),
        page_start: None,
        page: None,
    }
}

fn titled(title: &str) -> DocumentMetadata {
    DocumentMetadata { title: Some(title.to_string()), ..Default::default() }
}

fn id_number(id: &str) -> usize {
    id.strip_prefix("chunk_").and_then(|n| n.parse().ok()).expect("chunk_<n> id")
}

#[test]
fn sections_become_separate_chunks() {
    let structure = DocumentStructure {
        sections: vec![
            section("Introduction", &["Alpha models outperform competitors.", "Beta results show incremental gains."]),
            section("Results", &["Sharpe ratio improves with better risk controls."]),
        ],
    };
    let chunks = HierarchicalChunker::with_defaults(120, 0).expect("chunker").chunk_document(&structure, &titled("Sample Report"));

    assert_eq!(chunks.len(), 2, "each section fits in one chunk");
    assert_eq!(chunks[0].chunk_id, "chunk_0");
    assert_eq!(chunks[1].chunk_id, "chunk_1");
    assert_eq!(chunks[0].metadata.section, "Introduction");
    assert_eq!(chunks[1].metadata.section, "Results");
    assert!(!chunks[1].text.contains("Introduction"));
    assert!(!chunks[1].text.contains("Alpha"));
    assert_eq!(chunks[0].text, "Alpha models outperform competitors. Beta results show incremental gains.");
    assert_eq!(chunks[0].metadata.document_title, "Sample Report");
}

#[test]
fn budget_holds_except_for_single_oversized_sentences() {
    let text = "One two three. Four five six seven. Eight nine. Ten eleven twelve thirteen fourteen fifteen sixteen. Seventeen.";
    let structure = DocumentStructure { sections: vec![section("Body", &[text])] };
    let max_tokens = 5;
    let chunks = chunker(max_tokens, 0).chunk_document(&structure, &titled("Doc"));

    assert!(chunks.len() > 1);
    for chunk in &chunks {
        let sentences = RegexSentenceSplitter.split(&chunk.text);
        assert!(
            chunk.token_count <= max_tokens || sentences.len() == 1,
            "{} has {} tokens over {} sentences",
            chunk.chunk_id,
            chunk.token_count,
            sentences.len()
        );
    }
    // the seven-word sentence is never split
    assert!(chunks.iter().any(|c| c.text == "Ten eleven twelve thirteen fourteen fifteen sixteen."));
}

#[test]
fn ids_are_gap_free_across_sections() {
    let structure = DocumentStructure {
        sections: vec![
            section("A", &["First point here. Second point here. Third point here."]),
            section("Empty", &["   ", ""]),
            section("B", &["Fourth point here. Fifth point here."]),
        ],
    };
    let chunks = chunker(6, 0).chunk_document(&structure, &titled("Doc"));
    let ids: Vec<usize> = chunks.iter().map(|c| id_number(&c.chunk_id)).collect();
    let expected: Vec<usize> = (0..chunks.len()).collect();
    assert_eq!(ids, expected);
    assert!(chunks.iter().all(|c| c.metadata.section != "Empty"), "blank sections yield nothing");
}

#[test]
fn overlap_carries_last_sentence_forward() {
    let text = "Alpha beta gamma. Delta epsilon zeta. Eta theta iota. Kappa lambda mu. Nu xi omicron.";
    let structure = DocumentStructure { sections: vec![section("Body", &[text])] };
    let chunks = chunker(7, 1).chunk_document(&structure, &titled("Doc"));

    assert!(chunks.len() >= 2);
    for pair in chunks.windows(2) {
        let prev = RegexSentenceSplitter.split(&pair[0].text);
        let next = RegexSentenceSplitter.split(&pair[1].text);
        if prev.len() > 1 {
            assert_eq!(next.first(), prev.last());
        }
    }
    assert_eq!(chunks[0].text, "Alpha beta gamma. Delta epsilon zeta.");
    assert_eq!(chunks[1].text, "Delta epsilon zeta. Eta theta iota.");
}

#[test]
fn no_overlap_starts_each_chunk_fresh() {
    let text = "Alpha beta gamma. Delta epsilon zeta. Eta theta iota.";
    let structure = DocumentStructure { sections: vec![section("Body", &[text])] };
    let chunks = chunker(6, 0).chunk_document(&structure, &titled("Doc"));
    let texts: Vec<&str> = chunks.iter().map(|c| c.text.as_str()).collect();
    assert_eq!(texts, vec!["Alpha beta gamma. Delta epsilon zeta.", "Eta theta iota."]);
    assert_eq!(chunks[0].token_count, 6);
    assert_eq!(chunks[1].token_count, 3);
}

#[test]
fn missing_title_and_page_defaults() {
    let structure = DocumentStructure {
        sections: vec![Section {
            title: "Methods".into(),
            content: vec!["We fit a model.".into()],
            level: None,
            page_start: None,
            page: Some(4),
        }],
    };
    let chunks = chunker(50, 0).chunk_document(&structure, &DocumentMetadata::default());
    assert_eq!(chunks.len(), 1);
    assert_eq!(chunks[0].metadata.document_title, "Unknown");
    assert_eq!(chunks[0].metadata.level, 1);
    assert_eq!(chunks[0].metadata.page_start, 4);
}

#[test]
fn offset_start_continues_numbering() {
    let structure = DocumentStructure { sections: vec![section("Body", &["Only sentence."])] };
    let chunks = chunker(50, 0).chunk_document_from(&structure, &titled("Doc"), 7);
    assert_eq!(chunks[0].chunk_id, "chunk_7");
}

#[test]
fn empty_structure_yields_no_chunks() {
    let chunks = chunker(50, 0).chunk_document(&DocumentStructure::default(), &titled("Doc"));
    assert!(chunks.is_empty());
}
