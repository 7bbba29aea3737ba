use telusur_core::stemmer::StemmerKind;
use telusur_core::{Document, DocumentSource, Engine, EngineConfig, Error, SearchMode};

fn config(min_df: u32) -> EngineConfig {
    EngineConfig { min_df, ..EngineConfig::default() }
}

fn climate_corpus() -> Vec<Document> {
    vec![
        Document::new(
            1,
            "Solusi Energi Terbarukan",
            "Energi surya dan energi terbarukan lainnya menjadi solusi krisis iklim.",
        ),
        Document::new(2, "Batu Bara", "Pembangkit batu bara menghasilkan energi dengan emisi tinggi."),
        Document::new(3, "Hutan Tropis", "Hutan tropis menyerap karbon dan menjaga keanekaragaman hayati."),
        Document::new(4, "Cuaca Ekstrem", "Banjir dan kekeringan makin sering terjadi."),
    ]
}

#[test]
fn renewable_energy_query_ranks_matching_document_first() {
    let engine = Engine::build(climate_corpus(), config(1)).unwrap();
    assert_eq!(engine.tokenizer().normalize("energi terbarukan dan surya"), vec!["energi", "baru", "surya"]);

    let hits = engine.search("energi terbarukan dan surya", SearchMode::VectorSpace, 10);
    assert_eq!(hits[0].doc_id, 1);
    assert!(hits[0].score > 0.0);
    assert!(hits.iter().all(|h| h.doc_id != 3 && h.doc_id != 4));
}

#[test]
fn boolean_modes_over_engine() {
    let engine = Engine::build(climate_corpus(), config(1)).unwrap();
    let and: Vec<_> = engine.search("energi surya", SearchMode::BooleanAnd, 10).iter().map(|h| h.doc_id).collect();
    let or: Vec<_> = engine.search("energi surya", SearchMode::BooleanOr, 10).iter().map(|h| h.doc_id).collect();
    assert_eq!(and, vec![1]);
    assert_eq!(or, vec![1, 2]);
}

#[test]
fn rebuild_with_higher_min_df_drops_rare_terms() {
    let docs = vec![
        Document::new(1, "", "panas panas iklim"),
        Document::new(2, "", "iklim laut"),
        Document::new(3, "", "panas panas panas panas panas iklim"),
        Document::new(15, "", "panas iklim"),
    ];
    let cfg = EngineConfig { stemmer: StemmerKind::None, ..config(1) };
    let engine = Engine::build(docs, cfg).unwrap();
    let freqs: Vec<_> = engine.index().postings("panas").iter().map(|p| (p.doc_id, p.frequency)).collect();
    assert_eq!(engine.index().document_frequency("panas"), 3);
    assert!(freqs.contains(&(1, 2)) && freqs.contains(&(3, 5)) && freqs.contains(&(15, 1)));

    let (rebuilt, report) = engine.rebuild_index(4).unwrap();
    assert_eq!(report.terms_before, 3);
    assert_eq!(report.terms_after, 1);
    assert!(!rebuilt.index().contains_term("panas"));
    assert_eq!(rebuilt.index().document_frequency("iklim"), 4);
    assert!(rebuilt.search("panas", SearchMode::BooleanOr, 10).is_empty());
    // the source engine is untouched
    assert_eq!(engine.index().document_frequency("panas"), 3);
}

#[test]
fn negative_min_df_is_a_configuration_error() {
    let engine = Engine::build(climate_corpus(), config(1)).unwrap();
    assert!(matches!(engine.rebuild_index(-3), Err(Error::Configuration(_))));
}

const FILLER: [&str; 7] = [
    "Pagi itu udara terasa sejuk.",
    "Anak anak bermain bola di lapangan.",
    "Pasar buka sejak subuh.",
    "Kucing tidur di teras rumah.",
    "Hujan turun perlahan sore hari.",
    "Jalan desa masih berlumpur.",
    "Semua orang pulang lebih awal.",
];

#[test]
fn summary_keeps_keyword_sentences_in_document_order() {
    let sentences = [
        FILLER[0],
        "Energi surya melimpah.",
        FILLER[1],
        FILLER[2],
        "Turbin angin berputar.",
        FILLER[3],
        FILLER[4],
        FILLER[5],
        "Baterai menyimpan listrik.",
        FILLER[6],
    ];
    // Filler text and titles occur in every document, so only the keyword
    // sentences carry positive TF-IDF weight.
    let docs = vec![
        Document::new(1, "Catatan Harian", sentences.join(" ")),
        Document::new(2, "Catatan Harian", FILLER.join(" ")),
        Document::new(3, "Catatan Harian", FILLER.join(" ")),
    ];
    let engine = Engine::build(docs, config(1)).unwrap();
    let summary = engine.summarize(1, 3).unwrap();
    assert_eq!(summary, vec![sentences[1], sentences[4], sentences[8]]);
}

#[test]
fn short_document_summary_is_whole_document() {
    let engine = Engine::build(climate_corpus(), config(1)).unwrap();
    let summary = engine.summarize(4, 3).unwrap();
    assert_eq!(summary, vec!["Banjir dan kekeringan makin sering terjadi."]);
}

#[test]
fn unknown_document_is_surfaced() {
    let engine = Engine::build(climate_corpus(), config(1)).unwrap();
    assert!(matches!(engine.summarize(99, 3), Err(Error::UnknownDocument(99))));
    assert!(matches!(engine.document(99), Err(Error::UnknownDocument(99))));
}

#[test]
fn stats_and_keywords() {
    let engine = Engine::build(climate_corpus(), config(1)).unwrap();
    let stats = engine.index_stats();
    assert_eq!(stats.document_count, 4);
    assert_eq!(stats.term_count, engine.index().term_count());
    assert!(stats.avg_doc_length > 0.0);

    let keywords = engine.keywords(1, 3).unwrap();
    assert_eq!(keywords.len(), 3);
    assert!(keywords.windows(2).all(|w| w[0].1 >= w[1].1));
}

#[test]
fn persisted_engine_answers_like_the_original() {
    let engine = Engine::build(climate_corpus(), config(1)).unwrap();
    let restored = Engine::deserialize(&engine.serialize().unwrap()).unwrap();
    for (term, plist) in engine.index().terms() {
        assert_eq!(restored.index().postings(term), plist);
        assert_eq!(restored.index().document_frequency(term), plist.len());
    }
    let query = "hutan tropis karbon";
    let a = engine.search(query, SearchMode::VectorSpace, 5);
    let b = restored.search(query, SearchMode::VectorSpace, 5);
    assert_eq!(a.iter().map(|h| h.doc_id).collect::<Vec<_>>(), b.iter().map(|h| h.doc_id).collect::<Vec<_>>());
}

#[test]
fn stub_source_feeds_the_engine() {
    let source: Vec<Document> = climate_corpus();
    let engine = Engine::build(source.load_documents().unwrap(), config(1)).unwrap();
    assert_eq!(engine.documents().count(), 4);
}

#[test]
fn derived_query_words_meet_their_roots() {
    let docs = vec![
        Document::new(1, "Kota", "Suhu udara di kota terus naik."),
        Document::new(2, "Hutan", "Hutan tropis menyerap karbon."),
    ];
    let engine = Engine::build(docs, config(1)).unwrap();
    let hits = engine.search("kenaikan suhu", SearchMode::BooleanAnd, 10);
    assert_eq!(hits.iter().map(|h| h.doc_id).collect::<Vec<_>>(), vec![1]);
}
