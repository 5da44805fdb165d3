//! Snapshot tests for core wire types

#[cfg(test)]
mod snapshot_tests {
    use crate::{ChatAnswer, CollectionConfig, IngestReport};
    use insta::{assert_json_snapshot, assert_yaml_snapshot};

    #[test]
    fn test_chat_answer_snapshot() {
        let answer = ChatAnswer {
            answer: "Grounded reply".to_string(),
            sources: vec!["handbook.md".to_string(), "faq.txt".to_string()],
        };

        assert_json_snapshot!(answer, @r###"
        {
          "answer": "Grounded reply",
          "sources": [
            "handbook.md",
            "faq.txt"
          ]
        }
        "###);
    }

    #[test]
    fn test_ingest_report_snapshot() {
        let report = IngestReport {
            document_count: 3,
            chunk_count: 17,
        };

        assert_json_snapshot!(report, @r###"
        {
          "documentCount": 3,
          "chunkCount": 17
        }
        "###);
    }

    #[test]
    fn test_collection_config_snapshot() {
        assert_yaml_snapshot!(CollectionConfig::default(), @r###"
        name: documents
        dimension: 768
        metric: cosine
        "###);
    }
}
