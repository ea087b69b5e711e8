use std::path::Path;

use docrag_core::config::{check_unit_interval, resolve_with_base, AppConfig, EmbeddingProvider};
use docrag_core::error::Error;

#[test]
fn defaults_are_valid() {
    let config = AppConfig::from_toml_str("", Path::new("/srv/docrag")).expect("config");
    assert_eq!(config.chunking.max_tokens, 400);
    assert_eq!(config.retrieval.default_k, 10);
    assert_eq!(config.embedding.provider, EmbeddingProvider::Hash);
    let (semantic, keyword) = config.retrieval.weights().expect("weights");
    assert!((semantic - 0.7).abs() < 1e-6);
    assert!((keyword - 0.3).abs() < 1e-6);
    assert_eq!(config.path(&config.data.processed_dir), Path::new("/srv/docrag/data/processed"));
}

#[test]
fn toml_overrides_sections() {
    let toml = r#"
        [chunking]
        max_tokens = 120
        overlap = 0

        [retrieval]
        semantic_weight = 0.5
    "#;
    let config = AppConfig::from_toml_str(toml, Path::new(".")).expect("config");
    assert_eq!(config.chunking.max_tokens, 120);
    assert_eq!(config.chunking.overlap, 0);
    assert_eq!(config.retrieval.weights().expect("weights"), (0.5, 0.5));
}

#[test]
fn zero_budget_fails_fast() {
    let err = AppConfig::from_toml_str("[chunking]\nmax_tokens = 0", Path::new(".")).unwrap_err();
    assert!(matches!(err, Error::InvalidConfig(_)));
}

#[test]
fn inconsistent_retrieval_split_fails_fast() {
    let toml = "[retrieval]\nsemantic_weight = 0.7\nkeyword_weight = 0.7";
    assert!(matches!(AppConfig::from_toml_str(toml, Path::new(".")), Err(Error::InvalidConfig(_))));
}

#[test]
fn out_of_range_weight_fails_fast() {
    assert!(AppConfig::from_toml_str("[retrieval]\nsemantic_weight = 1.5", Path::new(".")).is_err());
    assert!(AppConfig::from_toml_str("[evaluation]\nretrieval_vs_qa = -0.1", Path::new(".")).is_err());
}

#[test]
fn unknown_provider_is_rejected() {
    assert!(AppConfig::from_toml_str("[embedding]\nprovider = \"magic\"", Path::new(".")).is_err());
}

#[test]
fn bert_provider_needs_model_dir() {
    assert!(AppConfig::from_toml_str("[embedding]\nprovider = \"bert\"", Path::new(".")).is_err());
    let ok = "[embedding]\nprovider = \"bert\"\nmodel_dir = \"models/minilm\"";
    assert!(AppConfig::from_toml_str(ok, Path::new(".")).is_ok());
}

#[test]
fn unit_interval_bounds_are_inclusive() {
    assert!(check_unit_interval("w", 0.0).is_ok());
    assert!(check_unit_interval("w", 1.0).is_ok());
    assert!(check_unit_interval("w", 1.01).is_err());
}

#[test]
fn absolute_paths_ignore_base() {
    assert_eq!(resolve_with_base(Path::new("/base"), "/abs/dir"), Path::new("/abs/dir"));
    assert_eq!(resolve_with_base(Path::new("/base"), "rel"), Path::new("/base/rel"));
}
