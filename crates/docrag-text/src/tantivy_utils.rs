use tantivy::schema::{IndexRecordOption, Schema, TextFieldIndexing, TextOptions, STORED, STRING};
use tantivy::tokenizer::{LowerCaser, RemoveLongFilter, SimpleTokenizer, StopWordFilter, TextAnalyzer};
use tantivy::Index;

pub const CHUNK_ANALYZER: &str = "chunk_text";

pub const FIELD_CHUNK_ID: &str = "chunk_id";
pub const FIELD_TEXT: &str = "text";
pub const FIELD_SECTION: &str = "section";
pub const FIELD_DOCUMENT_TITLE: &str = "document_title";

pub fn build_schema() -> Schema {
    let mut schema_builder = Schema::builder();
    schema_builder.add_text_field(FIELD_CHUNK_ID, STRING | STORED);
    let text_indexing = TextFieldIndexing::default()
        .set_tokenizer(CHUNK_ANALYZER)
        .set_index_option(IndexRecordOption::WithFreqsAndPositions);
    schema_builder.add_text_field(FIELD_TEXT, TextOptions::default().set_indexing_options(text_indexing));
    schema_builder.add_text_field(FIELD_SECTION, STRING | STORED);
    schema_builder.add_text_field(FIELD_DOCUMENT_TITLE, STRING | STORED);
    schema_builder.build()
}

/// Lower-cased words minus English stop words; tokens over 40 bytes dropped.
/// Must be registered on every opened index before searching or writing.
pub fn register_tokenizer(index: &Index) {
    let stop_words = [
        "a", "an", "and", "are", "as", "at", "be", "by", "for", "from", "has", "in", "is", "it", "its", "of", "on",
        "that", "the", "to", "was", "were", "will", "with", "or", "but", "not", "this", "these", "they", "their",
        "there", "then", "than", "so", "if", "when", "where", "how", "what", "which", "who", "do", "does", "did",
    ];
    let analyzer = TextAnalyzer::builder(SimpleTokenizer::default())
        .filter(RemoveLongFilter::limit(40))
        .filter(LowerCaser)
        .filter(StopWordFilter::remove(stop_words.iter().map(|s| (*s).to_string())))
        .build();
    index.tokenizers().register(CHUNK_ANALYZER, analyzer);
}
