//! Tests for partitioning, step emission, linking and template assembly.
mod common;
use common::*;
use flowsmith::prelude::*;
use serde_json::{Value, json};

fn step_json(template: &Template, id: &str) -> Value {
    serde_json::to_value(template.step(id).expect("Missing step")).unwrap()
}

fn single_error(result: std::result::Result<TemplateFlows, CompileError>) -> CompileError {
    let err = result.expect_err("Compilation should fail");
    let errors = err.errors();
    assert_eq!(errors.len(), 1, "Expected exactly one error, got: {:?}", errors);
    errors[0].clone()
}

#[test]
fn test_deployed_transformer_feeding_indexer() {
    let template = compile_provision(create_deployed_ingest_graph());

    let ids: Vec<&str> = template.nodes.iter().map(|s| s.id.as_str()).collect();
    assert_eq!(ids, vec!["embed", "index"]);
    assert_eq!(template.nodes[0].step_type, StepType::CreateIngestPipeline);
    assert_eq!(template.nodes[1].step_type, StepType::CreateIndex);

    let pipeline = step_json(&template, "embed");
    assert_eq!(pipeline["user_inputs"]["pipeline_id"], "ingest_pipeline_0");
    assert_eq!(pipeline["user_inputs"]["model_id"], "my-deployed-model");
    assert_eq!(
        pipeline.pointer("/user_inputs/configurations/processors/0/text_embedding/field_map"),
        Some(&json!({ "text": "embedding" }))
    );
    assert!(pipeline.get("previous_node_inputs").is_none());

    let index = step_json(&template, "index");
    assert_eq!(index["user_inputs"]["index_name"], "my-knn-index");
    assert_eq!(
        index.pointer("/user_inputs/configurations/settings/default_pipeline"),
        Some(&json!("${{embed.pipeline_id}}"))
    );
    let properties = index
        .pointer("/user_inputs/configurations/mappings/properties")
        .expect("Missing mapping properties");
    assert_eq!(properties["text"], json!({ "type": "text" }));
    assert_eq!(properties["embedding"]["type"], "knn_vector");
    assert_eq!(properties["embedding"]["dimension"], 768);
    assert_eq!(properties["embedding"]["method"]["engine"], "lucene");
    assert_eq!(index["previous_node_inputs"], json!({ "embed": "pipeline_id" }));

    assert_eq!(
        template.edges,
        vec![TemplateEdge {
            source: "embed".to_string(),
            dest: "index".to_string(),
        }]
    );
}

#[test]
fn test_pretrained_transformer_registers_model_first() {
    let template = compile_provision(create_pretrained_ingest_graph());

    let ids: Vec<&str> = template.nodes.iter().map(|s| s.id.as_str()).collect();
    assert_eq!(ids, vec!["embed_register_model", "embed", "index"]);

    let register = &template.nodes[0];
    assert_eq!(register.step_type, StepType::RegisterPretrainedModel);
    assert_eq!(
        register.input(&["name"]).and_then(InputValue::as_str),
        Some(PRETRAINED_MPNET)
    );
    let register_json = step_json(&template, "embed_register_model");
    assert_eq!(register_json["type"], "register_local_pretrained_model");
    assert_eq!(register_json["user_inputs"]["model_format"], "TORCH_SCRIPT");
    assert_eq!(register_json["user_inputs"]["version"], "1.0.1");
    assert_eq!(register_json["user_inputs"]["deploy"], true);

    let pipeline = &template.nodes[1];
    assert_eq!(
        pipeline.input(&["model_id"]).and_then(InputValue::as_reference),
        Some(&StepReference::new("embed_register_model", "model_id"))
    );
    let pipeline_json = step_json(&template, "embed");
    assert_eq!(
        pipeline_json["user_inputs"]["model_id"],
        "${{embed_register_model.model_id}}"
    );
    assert_eq!(
        pipeline_json.pointer("/user_inputs/configurations/processors/0/text_embedding/model_id"),
        Some(&json!("${{embed_register_model.model_id}}"))
    );
    assert_eq!(
        pipeline_json["previous_node_inputs"],
        json!({ "embed_register_model": "model_id" })
    );

    // The index still consumes the pipeline, not the registration.
    let index = step_json(&template, "index");
    assert_eq!(index["previous_node_inputs"], json!({ "embed": "pipeline_id" }));
}

#[test]
fn test_pretrained_model_found_by_short_name() {
    let mut graph = create_pretrained_ingest_graph();
    graph.nodes[2] = text_embedding("embed", "all-mpnet-base-v2", "PRETRAINED");

    let template = compile_provision(graph);
    assert_eq!(
        template.nodes[0].input(&["name"]).and_then(InputValue::as_str),
        Some(PRETRAINED_MPNET)
    );
}

#[test]
fn test_document_edges_are_not_linked() {
    let doc = document("doc", INGEST);
    let query = component("query", ComponentKind::NeuralQuery, INGEST);
    let graph = VisualGraph {
        edges: vec![edge(&doc, &query)],
        nodes: vec![ingest_group(), doc, query],
    };

    let template = compile_provision(graph);
    assert!(template.nodes.is_empty());
    assert!(template.edges.is_empty());
}

#[test]
fn test_untagged_document_edges_are_not_linked() {
    let graph: VisualGraph = serde_json::from_value(json!({
        "nodes": [
            { "id": "ingest", "kind": "ingest_group" },
            {
                "id": "doc",
                "parent_group_id": "ingest",
                "kind": "document",
                "capabilities": ["document"]
            },
            {
                "id": "query",
                "parent_group_id": "ingest",
                "kind": "neural_query",
                "capabilities": ["query", "neural_query"]
            }
        ],
        "edges": [{ "source": "doc", "target": "query" }]
    }))
    .expect("Failed to parse graph");
    assert!(graph.edges[0].source_capabilities.is_empty());

    let template = compile_provision(graph);
    assert!(template.edges.is_empty());
}

#[test]
fn test_indexer_without_predecessor_fails() {
    let graph = VisualGraph {
        nodes: vec![ingest_group(), knn_indexer("index", "orphan-index")],
        edges: vec![],
    };

    let result = Compiler::builder(graph).build().compile();
    match single_error(result) {
        CompileError::MissingPredecessor { node_id } => assert_eq!(node_id, "index"),
        other => panic!("Expected MissingPredecessor error, got {:?}", other),
    }
}

#[test]
fn test_indexer_fed_only_by_document_fails() {
    let doc = document("doc", INGEST);
    let index = knn_indexer("index", "my-knn-index");
    let graph = VisualGraph {
        edges: vec![edge(&doc, &index)],
        nodes: vec![ingest_group(), doc, index],
    };

    let result = Compiler::builder(graph).build().compile();
    assert!(matches!(
        single_error(result),
        CompileError::MissingPredecessor { .. }
    ));
}

#[test]
fn test_indexer_fed_by_indexer_is_incompatible() {
    let mut graph = create_deployed_ingest_graph();
    let first = graph.nodes[3].clone();
    let second = knn_indexer("index_copy", "copy-index");
    graph.edges.push(edge(&first, &second));
    graph.nodes.push(second);

    let result = Compiler::builder(graph).build().compile();
    match single_error(result) {
        CompileError::IncompatiblePredecessor {
            node_id,
            predecessor_id,
            ..
        } => {
            assert_eq!(node_id, "index_copy");
            assert_eq!(predecessor_id, "index");
        }
        other => panic!("Expected IncompatiblePredecessor error, got {:?}", other),
    }
}

#[test]
fn test_sparse_encoder_maps_rank_features() {
    let doc = document("doc", INGEST);
    let sparse = sparse_encoder("sparse", "my-sparse-model", "DEPLOYED");
    let index = knn_indexer("index", "sparse-index");
    let graph = VisualGraph {
        edges: vec![edge(&doc, &sparse), edge(&sparse, &index)],
        nodes: vec![ingest_group(), doc, sparse, index],
    };

    let template = compile_provision(graph);

    let pipeline = step_json(&template, "sparse");
    assert_eq!(
        pipeline.pointer("/user_inputs/configurations/processors/0/sparse_encoding/field_map"),
        Some(&json!({ "passage": "passage_tokens" }))
    );
    assert_eq!(pipeline["user_inputs"]["output_field"], "passage_tokens");

    let index = step_json(&template, "index");
    assert_eq!(
        index.pointer("/user_inputs/configurations/mappings/properties"),
        Some(&json!({
            "passage": { "type": "text" },
            "passage_tokens": { "type": "rank_features" },
        }))
    );
}

#[test]
fn test_pretrained_sparse_encoder() {
    let doc = document("doc", INGEST);
    let sparse = sparse_encoder("sparse", PRETRAINED_SPARSE, "PRETRAINED");
    let index = knn_indexer("index", "sparse-index");
    let graph = VisualGraph {
        edges: vec![edge(&doc, &sparse), edge(&sparse, &index)],
        nodes: vec![ingest_group(), doc, sparse, index],
    };

    let template = compile_provision(graph);
    let ids: Vec<&str> = template.nodes.iter().map(|s| s.id.as_str()).collect();
    assert_eq!(ids, vec!["sparse_register_model", "sparse", "index"]);
}

#[test]
fn test_unknown_pretrained_model_fails() {
    let mut graph = create_pretrained_ingest_graph();
    graph.nodes[2] = text_embedding("embed", "not-a-real-model", "PRETRAINED");

    let result = Compiler::builder(graph).build().compile();
    match single_error(result) {
        CompileError::UnknownPretrainedModel { node_id, model_id } => {
            assert_eq!(node_id, "embed");
            assert_eq!(model_id, "not-a-real-model");
        }
        other => panic!("Expected UnknownPretrainedModel error, got {:?}", other),
    }
}

#[test]
fn test_sparse_model_cannot_back_text_embedding() {
    let mut graph = create_pretrained_ingest_graph();
    graph.nodes[2] = text_embedding("embed", PRETRAINED_SPARSE, "PRETRAINED");

    let result = Compiler::builder(graph).build().compile();
    match single_error(result) {
        CompileError::InvalidNodeConfig { node_id, field, .. } => {
            assert_eq!(node_id, "embed");
            assert_eq!(field, "model");
        }
        other => panic!("Expected InvalidNodeConfig error, got {:?}", other),
    }
}

#[test]
fn test_missing_and_empty_config_values() {
    let mut graph = create_deployed_ingest_graph();
    graph.nodes[3].config.remove("indexName");
    graph.nodes[2].config.insert("inputField".to_string(), json!("   "));

    let err = Compiler::builder(graph).build().compile().unwrap_err();
    let fields: Vec<(String, String)> = err
        .errors()
        .into_iter()
        .map(|e| match e {
            CompileError::InvalidNodeConfig { node_id, field, .. } => {
                (node_id.clone(), field.clone())
            }
            other => panic!("Expected InvalidNodeConfig error, got {:?}", other),
        })
        .collect();
    assert_eq!(
        fields,
        vec![
            ("embed".to_string(), "inputField".to_string()),
            ("index".to_string(), "indexName".to_string()),
        ]
    );
}

#[test]
fn test_every_problem_is_reported() {
    let graph = VisualGraph {
        nodes: vec![
            ingest_group(),
            knn_indexer("index_a", "a"),
            knn_indexer("index_b", "b"),
        ],
        edges: vec![],
    };

    let err = Compiler::builder(graph).build().validate().unwrap_err();
    assert!(matches!(err, CompileError::Validation { .. }));
    assert_eq!(err.errors().len(), 2);
    assert_eq!(
        err.to_string(),
        "Workflow validation failed with 2 error(s)"
    );
}

#[test]
fn test_unsupported_nodes_are_skipped() {
    let mut graph = create_deployed_ingest_graph();
    graph.nodes.push(
        VisualNode::new("note", ComponentKind::from("sticky_note"))
            .in_group(INGEST)
            .with_capabilities([Capability::from("annotation")]),
    );

    let template = compile_provision(graph);
    assert_eq!(template.nodes.len(), 2);
    assert!(template.step("note").is_none());
}

#[test]
fn test_search_results_transformer_becomes_search_pipeline() {
    let template = compile_provision(create_full_graph());

    let ids: Vec<&str> = template.nodes.iter().map(|s| s.id.as_str()).collect();
    assert_eq!(ids, vec!["embed", "index", "normalize"]);

    let search = step_json(&template, "normalize");
    assert_eq!(search["type"], "create_search_pipeline");
    assert_eq!(search["user_inputs"]["pipeline_id"], "search_pipeline_0");
    let processor = search
        .pointer("/user_inputs/configurations/phase_results_processors/0/normalization-processor")
        .expect("Missing normalization processor");
    assert_eq!(processor["normalization"]["technique"], "min_max");
    assert_eq!(processor["combination"]["technique"], "arithmetic_mean");
    assert_eq!(
        processor["combination"]["parameters"]["weights"],
        json!([0.3, 0.7])
    );

    // Search-side edges are not linked.
    assert_eq!(template.edges.len(), 1);
}

#[test]
fn test_graph_without_groups_compiles_to_empty_template() {
    let graph = VisualGraph {
        nodes: vec![knn_indexer("index", "loose")],
        edges: vec![],
    };

    let template = compile_provision(graph);
    assert!(template.nodes.is_empty());
    assert!(template.edges.is_empty());
}

#[test]
fn test_duplicate_group_container_fails() {
    let mut graph = create_deployed_ingest_graph();
    graph
        .nodes
        .push(VisualNode::new("ingest_2", ComponentKind::IngestGroup));

    let result = Compiler::builder(graph).build().compile();
    match single_error(result) {
        CompileError::InvalidGraphTopology(TopologyViolation::DuplicateGroup { group, ids }) => {
            assert_eq!(group, GroupTag::Ingest);
            assert_eq!(ids, vec!["ingest".to_string(), "ingest_2".to_string()]);
        }
        other => panic!("Expected DuplicateGroup error, got {:?}", other),
    }
}

#[test]
fn test_cycle_fails() {
    let mut graph = create_deployed_ingest_graph();
    let back = edge(&graph.nodes[3], &graph.nodes[2]);
    graph.edges.push(back);

    let result = Compiler::builder(graph).build().compile();
    match single_error(result) {
        CompileError::InvalidGraphTopology(TopologyViolation::Cycle { node_ids }) => {
            assert_eq!(node_ids, vec!["embed".to_string(), "index".to_string()]);
        }
        other => panic!("Expected Cycle error, got {:?}", other),
    }
}

#[test]
fn test_cycle_lists_nodes_stuck_behind_it() {
    let mut graph = create_deployed_ingest_graph();
    let back = edge(&graph.nodes[3], &graph.nodes[2]);
    graph.edges.push(back);
    let downstream = knn_indexer("index_copy", "copy-index");
    graph.edges.push(edge(&graph.nodes[3], &downstream));
    graph.nodes.push(downstream);

    let err = single_error(Compiler::builder(graph).build().compile());
    match &err {
        CompileError::InvalidGraphTopology(TopologyViolation::Cycle { node_ids }) => {
            assert_eq!(node_ids, &vec!["embed", "index", "index_copy"]);
        }
        other => panic!("Expected Cycle error, got {:?}", other),
    }
    assert!(err.to_string().contains("cannot be ordered"));
}

#[test]
fn test_register_step_id_clash_is_caught_before_emission() {
    let graph = VisualGraph {
        nodes: vec![
            ingest_group(),
            text_embedding("embed", PRETRAINED_MPNET, "PRETRAINED"),
            text_embedding("embed_register_model", "my-deployed-model", "DEPLOYED"),
        ],
        edges: vec![],
    };
    let compiler = Compiler::builder(graph).build();

    let err = compiler.validate().expect_err("Clashing step ids should not validate");
    match err.errors().as_slice() {
        [CompileError::InvalidGraphTopology(TopologyViolation::StepIdClash { step_id, node_id })] => {
            assert_eq!(step_id, "embed_register_model");
            assert_eq!(node_id, "embed_register_model");
        }
        other => panic!("Expected a single StepIdClash error, got {:?}", other),
    }
    assert_eq!(compiler.compile().unwrap_err(), err);
}

#[test]
fn test_field_names_with_surrounding_whitespace_are_rejected() {
    let mut graph = create_deployed_ingest_graph();
    graph.nodes[2]
        .config
        .insert("inputField".to_string(), json!(" text"));

    let result = Compiler::builder(graph).build().compile();
    match single_error(result) {
        CompileError::InvalidNodeConfig {
            node_id,
            field,
            message,
        } => {
            assert_eq!(node_id, "embed");
            assert_eq!(field, "inputField");
            assert!(message.contains("whitespace"));
        }
        other => panic!("Expected InvalidNodeConfig error, got {:?}", other),
    }
}

#[test]
fn test_dangling_edge_and_duplicate_id_fail() {
    let mut graph = create_deployed_ingest_graph();
    graph.edges.push(VisualEdge {
        source: "embed".to_string(),
        target: "ghost".to_string(),
        source_capabilities: vec![],
        target_capabilities: vec![],
    });
    graph.nodes.push(knn_indexer("index", "again"));

    let err = Compiler::builder(graph).build().compile().unwrap_err();
    let errors = err.errors();
    assert_eq!(errors.len(), 2);
    assert!(errors.iter().any(|e| matches!(
        e,
        CompileError::InvalidGraphTopology(TopologyViolation::DuplicateNodeId(id)) if id == "index"
    )));
    assert!(errors.iter().any(|e| matches!(
        e,
        CompileError::InvalidGraphTopology(TopologyViolation::DanglingEdge { target_id, .. })
            if target_id == "ghost"
    )));
}

#[test]
fn test_fan_in_uses_first_emitted_predecessor() {
    let first = text_embedding("embed_a", "model-a", "DEPLOYED");
    let second = text_embedding("embed_b", "model-b", "DEPLOYED");
    let index = knn_indexer("index", "shared-index");
    let graph = VisualGraph {
        edges: vec![edge(&second, &index), edge(&first, &index)],
        nodes: vec![ingest_group(), first, second, index],
    };

    let template = compile_provision(graph);
    let index = step_json(&template, "index");
    assert_eq!(index["previous_node_inputs"], json!({ "embed_a": "pipeline_id" }));
    assert_eq!(template.edges.len(), 2);

    // Pipeline names are numbered in emission order.
    assert_eq!(
        step_json(&template, "embed_b")["user_inputs"]["pipeline_id"],
        "ingest_pipeline_1"
    );
}

#[test]
fn test_builder_options() {
    let compiler = Compiler::builder(create_deployed_ingest_graph())
        .with_id_strategy(IdStrategy::Sequential)
        .with_knn_dimension(384)
        .build();
    assert_eq!(compiler.options().knn_dimension, 384);

    let flows = compiler.compile().expect("Failed to compile");
    let index = step_json(flows.provision().unwrap(), "index");
    assert_eq!(
        index.pointer("/user_inputs/configurations/mappings/properties/embedding/dimension"),
        Some(&json!(384))
    );
}

#[test]
fn test_builder_with_custom_pretrained_model() {
    let mut graph = create_pretrained_ingest_graph();
    graph.nodes[2] = text_embedding("embed", "acme/in-house-embedder", "PRETRAINED");

    let model = PretrainedModel {
        name: "acme/in-house-embedder".to_string(),
        short_name: "in-house-embedder".to_string(),
        description: "An in-house embedding model".to_string(),
        format: "ONNX".to_string(),
        version: "2.0.0".to_string(),
        algorithm: flowsmith::catalog::ModelAlgorithm::TextEmbedding,
    };
    let flows = Compiler::builder(graph)
        .with_pretrained_model(model)
        .with_id_strategy(IdStrategy::Sequential)
        .build()
        .compile()
        .expect("Failed to compile");

    let register = step_json(flows.provision().unwrap(), "embed_register_model");
    assert_eq!(register["user_inputs"]["model_format"], "ONNX");
    assert_eq!(register["user_inputs"]["version"], "2.0.0");
}

#[test]
fn test_compile_with_custom_id_generator() {
    struct Fixed;
    impl IdGenerator for Fixed {
        fn generate(&mut self, prefix: &str) -> String {
            format!("{}_fixed", prefix)
        }
    }

    let compiler = Compiler::builder(create_full_graph()).build();
    let flows = compiler.compile_with(&mut Fixed).expect("Failed to compile");
    let template = flows.provision().unwrap();

    assert_eq!(
        step_json(template, "embed")["user_inputs"]["pipeline_id"],
        "ingest_pipeline_fixed"
    );
    assert_eq!(
        step_json(template, "normalize")["user_inputs"]["pipeline_id"],
        "search_pipeline_fixed"
    );
}

#[test]
fn test_compile_document() {
    let compiler = Compiler::builder(create_deployed_ingest_graph())
        .with_id_strategy(IdStrategy::Sequential)
        .build();
    let document = compiler
        .compile_document("semantic-search", "Demo workflow", "SEMANTIC_SEARCH")
        .expect("Failed to compile");

    let value = serde_json::to_value(&document).unwrap();
    assert_eq!(value["name"], "semantic-search");
    assert_eq!(value["use_case"], "SEMANTIC_SEARCH");
    assert_eq!(value["version"]["template"], "1.0.0");
    assert_eq!(value["version"]["compatibility"], json!(["2.12.0", "3.0.0"]));
    assert_eq!(
        value.pointer("/workflows/provision/nodes/0/id"),
        Some(&json!("embed"))
    );
    assert_eq!(document.workflows, compiler.compile().unwrap());
}
