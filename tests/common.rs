//! Common test utilities for building visual graphs.
use flowsmith::prelude::*;
use serde_json::json;

#[allow(dead_code)]
pub const INGEST: &str = "ingest";
#[allow(dead_code)]
pub const SEARCH: &str = "search";

#[allow(dead_code)]
pub const PRETRAINED_MPNET: &str = "huggingface/sentence-transformers/all-mpnet-base-v2";
#[allow(dead_code)]
pub const PRETRAINED_SPARSE: &str = "amazon/neural-sparse/opensearch-neural-sparse-encoding-v1";

/// A node of `kind` inside `group`, tagged with the kind's default capabilities.
#[allow(dead_code)]
pub fn component(id: &str, kind: ComponentKind, group: &str) -> VisualNode {
    let capabilities = kind.default_capabilities();
    VisualNode::new(id, kind)
        .in_group(group)
        .with_capabilities(capabilities)
}

#[allow(dead_code)]
pub fn ingest_group() -> VisualNode {
    VisualNode::new(INGEST, ComponentKind::IngestGroup)
}

#[allow(dead_code)]
pub fn search_group() -> VisualNode {
    VisualNode::new(SEARCH, ComponentKind::SearchGroup)
}

#[allow(dead_code)]
pub fn document(id: &str, group: &str) -> VisualNode {
    component(id, ComponentKind::Document, group)
}

/// Text embedding transformer reading `text` and writing `embedding`.
#[allow(dead_code)]
pub fn text_embedding(id: &str, model_id: &str, category: &str) -> VisualNode {
    component(id, ComponentKind::TextEmbeddingTransformer, INGEST)
        .with_config("model", json!({ "id": model_id, "category": category }))
        .with_config("inputField", json!("text"))
        .with_config("vectorField", json!("embedding"))
}

/// Sparse encoder reading `passage` and writing `passage_tokens`.
#[allow(dead_code)]
pub fn sparse_encoder(id: &str, model_id: &str, category: &str) -> VisualNode {
    component(id, ComponentKind::SparseEncoderTransformer, INGEST)
        .with_config("model", json!({ "id": model_id, "category": category }))
        .with_config("inputField", json!("passage"))
        .with_config("outputField", json!("passage_tokens"))
}

#[allow(dead_code)]
pub fn knn_indexer(id: &str, index_name: &str) -> VisualNode {
    component(id, ComponentKind::KnnIndexer, INGEST).with_config("indexName", json!(index_name))
}

#[allow(dead_code)]
pub fn neural_query(id: &str) -> VisualNode {
    component(id, ComponentKind::NeuralQuery, SEARCH)
}

#[allow(dead_code)]
pub fn results_transformer(id: &str) -> VisualNode {
    component(id, ComponentKind::NormalizationTransformer, SEARCH)
}

#[allow(dead_code)]
pub fn edge(source: &VisualNode, target: &VisualNode) -> VisualEdge {
    VisualEdge::between(source, target)
}

/// Document -> deployed text embedding -> knn index, all in the ingest group.
#[allow(dead_code)]
pub fn create_deployed_ingest_graph() -> VisualGraph {
    let doc = document("doc", INGEST);
    let embed = text_embedding("embed", "my-deployed-model", "DEPLOYED");
    let index = knn_indexer("index", "my-knn-index");
    let edges = vec![edge(&doc, &embed), edge(&embed, &index)];

    VisualGraph {
        nodes: vec![ingest_group(), doc, embed, index],
        edges,
    }
}

/// Same shape as `create_deployed_ingest_graph`, backed by a pretrained model.
#[allow(dead_code)]
pub fn create_pretrained_ingest_graph() -> VisualGraph {
    let doc = document("doc", INGEST);
    let embed = text_embedding("embed", PRETRAINED_MPNET, "PRETRAINED");
    let index = knn_indexer("index", "my-knn-index");
    let edges = vec![edge(&doc, &embed), edge(&embed, &index)];

    VisualGraph {
        nodes: vec![ingest_group(), doc, embed, index],
        edges,
    }
}

/// Ingest and search groups side by side.
///
/// Ingest: doc -> embed -> index. Search: query_doc -> query -> normalize.
#[allow(dead_code)]
pub fn create_full_graph() -> VisualGraph {
    let doc = document("doc", INGEST);
    let embed = text_embedding("embed", "my-deployed-model", "DEPLOYED");
    let index = knn_indexer("index", "my-knn-index");
    let query_doc = document("query_doc", SEARCH);
    let query = neural_query("query");
    let normalize = results_transformer("normalize");
    let edges = vec![
        edge(&doc, &embed),
        edge(&embed, &index),
        edge(&query_doc, &query),
        edge(&query, &normalize),
    ];

    VisualGraph {
        nodes: vec![
            ingest_group(),
            doc,
            embed,
            index,
            search_group(),
            query_doc,
            query,
            normalize,
        ],
        edges,
    }
}

/// Compiles with sequential ids and returns the provision template.
#[allow(dead_code)]
pub fn compile_provision(graph: VisualGraph) -> Template {
    let flows = Compiler::builder(graph)
        .with_id_strategy(IdStrategy::Sequential)
        .build()
        .compile()
        .expect("Failed to compile");
    flows.provision().cloned().expect("Missing provision template")
}
