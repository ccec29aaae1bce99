//! End-to-end pipeline tests: diagram file -> graph -> validation -> spec

use flowplan::adapters::FlowchartParser;
use flowplan::ir::NodeKind;
use flowplan::plan::{PlanGenerator, Verification};
use flowplan::validate::validate;

use super::helpers::{write_flowchart, RELEASE_FLOWCHART};

#[test]
fn test_parse_produces_expected_graph() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_flowchart(&dir, "release.drawio", RELEASE_FLOWCHART);

    let graph = FlowchartParser::new().parse(&path).unwrap();

    assert_eq!(graph.nodes().len(), 6);
    assert_eq!(graph.edges().len(), 6);
    assert_eq!(graph.get_node("s").unwrap().kind, NodeKind::Start);
    assert_eq!(graph.get_node("d").unwrap().kind, NodeKind::Decision);
    assert_eq!(graph.get_node("e").unwrap().kind, NodeKind::End);
    assert_eq!(
        graph.metadata.get("name").and_then(|v| v.as_str()),
        Some("release")
    );

    let yes_edge = graph
        .edges()
        .iter()
        .find(|e| e.source_id == "d" && e.target_id == "e")
        .unwrap();
    assert_eq!(yes_edge.condition.as_deref(), Some("validated"));
}

#[test]
fn test_release_flowchart_passes_validation() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_flowchart(&dir, "release.drawio", RELEASE_FLOWCHART);

    let graph = FlowchartParser::new().parse(&path).unwrap();
    let result = validate(&graph);

    assert!(result.valid);
    assert!(result.errors.is_empty());
    assert!(result.warnings.is_empty());
}

#[test]
fn test_generated_plan_matches_graph_structure() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_flowchart(&dir, "release.drawio", RELEASE_FLOWCHART);

    let graph = FlowchartParser::new().parse(&path).unwrap();
    let plan = PlanGenerator::new().generate(&graph, None, "feature");

    assert_eq!(plan.feature, "release");
    assert_eq!(plan.workflow_type, "feature");
    assert_eq!(plan.services_involved, vec!["backend".to_string()]);

    // One phase per level, start and end stripped
    assert_eq!(plan.phases.len(), 4);
    assert_eq!(plan.phases[0].name, "Configure database");
    assert_eq!(plan.phases[0].depends_on, Vec::<u32>::new());

    let tests_phase = &plan.phases[1];
    assert_eq!(tests_phase.depends_on, vec![1]);
    assert_eq!(
        tests_phase.subtasks[0].verification,
        Some(Verification::Command {
            run: "npm test".to_string(),
            expected: "All tests pass".to_string(),
        })
    );
    assert_eq!(
        tests_phase.subtasks[0].files_to_create,
        Vec::<String>::new()
    );

    assert_eq!(plan.phases[3].name, "Investigate failures");
    assert_eq!(plan.phases[3].depends_on, vec![3]);

    assert_eq!(
        plan.final_acceptance,
        vec!["Completed: Investigate failures".to_string()]
    );
    assert_eq!(plan.status, "backlog");
    assert_eq!(plan.plan_status, "pending");
}

#[test]
fn test_save_to_spec_dir_writes_all_documents() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_flowchart(&dir, "release.drawio", RELEASE_FLOWCHART);

    let graph = FlowchartParser::new().parse(&path).unwrap();
    let spec_dir = dir.path().join("specs").join("001-release");
    let files = PlanGenerator::new()
        .save_to_spec_dir(&graph, &spec_dir, Some("Release Pipeline"), "feature")
        .unwrap();

    assert!(files.plan.exists());
    assert!(files.spec.exists());
    assert!(files.requirements.exists());

    let plan: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&files.plan).unwrap()).unwrap();
    assert_eq!(plan["feature"], "Release Pipeline");
    assert_eq!(plan["planStatus"], "pending");

    let spec = std::fs::read_to_string(&files.spec).unwrap();
    assert!(spec.starts_with("# Release Pipeline"));
    assert!(spec.contains("- `config/db.yml`"));
}

#[test]
fn test_single_node_diagram_fails_validation() {
    let xml = r#"
<mxGraphModel>
  <root>
    <mxCell id="0" />
    <mxCell id="1" parent="0" />
    <mxCell id="n1" value="Collect metrics" style="rounded=0" vertex="1" parent="1" />
  </root>
</mxGraphModel>
"#;
    let dir = tempfile::tempdir().unwrap();
    let path = write_flowchart(&dir, "lonely.xml", xml);

    let graph = FlowchartParser::new().parse(&path).unwrap();
    // Inference promotes the only node to start, so no end remains
    assert_eq!(graph.get_node("n1").unwrap().kind, NodeKind::Start);

    let result = validate(&graph);
    assert!(!result.valid);
    assert!(result.errors.iter().any(|e| e.code == "NO_END_NODE"));
}
