use std::collections::HashMap;

use word2vec::doc_vector::{compose, similarity};
use word2vec::huffman::HuffmanTree;
use word2vec::model_store::{load_word_model, save_word_model};
use word2vec::settings::TrainSettings;
use word2vec::trainer::TrainerShared;
use word2vec::vocab::Vocabulary;

fn tiny_settings(vector_size: u16, window: u8) -> TrainSettings {
    TrainSettings {
        min_word_freq: 1,
        vector_size,
        window,
        threads: 1,
        iterations: 5,
        negative_samples: 2,
        ..TrainSettings::default()
    }
}

#[test]
fn scenario_cbow_ns_separates_alternating_words() {
    let corpus = b"a b a b a b a b\n";
    let settings = tiny_settings(8, 1);
    let vocab = Vocabulary::build(corpus, None, &settings.word_delimiters, &settings.end_of_sentence_chars, settings.min_word_freq, None, None);
    assert_eq!(vocab.size(), 3); // </s>, a, b

    let shared = TrainerShared::new(settings, vocab, corpus, None).unwrap();
    shared.run();
    let vectors = shared.into_vectors();

    for v in vectors.values() {
        assert!(v.iter().all(|x| x.is_finite()));
    }
    // training perturbs "a" and "b" away from their shared random init
    assert_ne!(vectors["a"], vectors["b"]);
}

#[test]
fn scenario_repeated_sentence_meets_min_frequency() {
    let mut corpus = String::new();
    for _ in 0..1000 {
        corpus.push_str("x y z\n");
    }
    let settings = TrainSettings {
        min_word_freq: 5,
        ..TrainSettings::default()
    };
    let vocab = Vocabulary::build(
        corpus.as_bytes(),
        None,
        &settings.word_delimiters,
        &settings.end_of_sentence_chars,
        settings.min_word_freq,
        None,
        None,
    );
    for w in ["x", "y", "z"] {
        assert!(vocab.lookup(w).unwrap().frequency >= 1000);
    }
    assert!(vocab.lookup("</s>").is_some());
}

#[test]
fn scenario_compose_document_vector_is_unit_rms_normalized() {
    let corpus = b"a b a b a b a b\n";
    let settings = tiny_settings(8, 1);
    let vocab = Vocabulary::build(corpus, None, &settings.word_delimiters, &settings.end_of_sentence_chars, settings.min_word_freq, None, None);
    let dim = settings.vector_size;
    let shared = TrainerShared::new(settings.clone(), vocab, corpus, None).unwrap();
    shared.run();
    let model = shared.into_vectors();

    let doc_vec = compose("a b", &model, dim, &settings.word_delimiters).unwrap();
    let rms = (doc_vec.iter().map(|x| x * x).sum::<f32>() / dim as f32).sqrt();
    assert!((rms - 1.0).abs() < 1e-3);

    let self_sim = similarity(&doc_vec, &doc_vec);
    assert!(self_sim > 0.9999);
}

#[test]
fn scenario_truncated_word_model_is_malformed() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("model.bin");
    let mut map = HashMap::new();
    map.insert("hello".to_string(), vec![1.0f32, 2.0, 3.0, 4.0]);
    save_word_model(&path, &map, 4).unwrap();

    let mut bytes = std::fs::read(&path).unwrap();
    bytes.truncate(bytes.len() - 1);
    std::fs::write(&path, bytes).unwrap();

    assert!(load_word_model(&path).is_err());
}

#[test]
fn scenario_huffman_tree_orders_codes_by_frequency() {
    let freqs = vec![5u64, 4, 3, 2, 1];
    let tree = HuffmanTree::build(&freqs);
    let shortest = tree.huffman_data(0).unwrap().code.len();
    let longest = tree.huffman_data(4).unwrap().code.len();
    assert!(shortest <= longest);
}

#[test]
fn scenario_stop_words_file_excludes_listed_words() {
    let corpus = b"the cat the dog the\n";
    let stop_words = b"the\n";
    let vocab = Vocabulary::build(corpus, Some(stop_words), " \n", "\n", 1, None, None);
    assert!(vocab.lookup("the").is_none());
    assert!(vocab.lookup("cat").is_some());
    assert!(vocab.lookup("dog").is_some());
    assert!(vocab.lookup("</s>").is_some());
}
