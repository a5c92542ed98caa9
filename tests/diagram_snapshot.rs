//! Snapshot of a full backend document rendered with the built-in schema.

use caseview::core::case::AssuranceCase;
use caseview::core::schema::TypeSchema;
use caseview::diagram::compile;

const DOCUMENT: &str = r#"{
    "id": 3,
    "name": "Clinical triage model",
    "description": "Fairness case",
    "lock_uuid": null,
    "goals": [{
        "id": 1,
        "name": "Goal",
        "short_description": "The model is fair",
        "keywords": ["fairness"],
        "context": [{"id": 2, "name": "Ctx"}],
        "system_description": [{"id": 3, "name": "Sys"}],
        "property_claims": [{
            "id": 4,
            "name": "Claim",
            "evidential_claims": [{
                "id": 5,
                "name": "Sub",
                "evidence": [{"id": 6, "name": "Ev", "URL": "https://example.com/report"}]
            }]
        }, {
            "id": 7,
            "name": "Bare claim"
        }]
    }]
}"#;

#[test]
fn built_in_schema_rendering() {
    let case: AssuranceCase = serde_json::from_str(DOCUMENT).unwrap();
    let diagram = compile(&case, &TypeSchema::assurance(), 64).unwrap();

    insta::assert_snapshot!(diagram.to_mermaid().trim_end(), @r"
    graph TB;
    TopLevelNormativeGoal_1[Goal]
    click TopLevelNormativeGoal_1 callback
    TopLevelNormativeGoal_1 --- Context_2(Ctx)
    click Context_2 callback
    TopLevelNormativeGoal_1 --- SystemDescription_3[(Sys)]
    click SystemDescription_3 callback
    TopLevelNormativeGoal_1 --- PropertyClaim_4{Claim}
    click PropertyClaim_4 callback
    PropertyClaim_4 --- EvidentialClaim_5(Sub)
    click EvidentialClaim_5 callback
    EvidentialClaim_5 --- Evidence_6[(Ev)]
    click Evidence_6 callback
    TopLevelNormativeGoal_1 --- PropertyClaim_7{Bare claim}
    click PropertyClaim_7 callback
    ");
}

#[test]
fn node_ids_follow_output_order() {
    let case: AssuranceCase = serde_json::from_str(DOCUMENT).unwrap();
    let diagram = compile(&case, &TypeSchema::assurance(), 64).unwrap();

    let ids: Vec<String> = diagram.node_ids().iter().map(ToString::to_string).collect();
    assert_eq!(
        ids,
        [
            "TopLevelNormativeGoal_1",
            "Context_2",
            "SystemDescription_3",
            "PropertyClaim_4",
            "EvidentialClaim_5",
            "Evidence_6",
            "PropertyClaim_7",
        ]
    );
}
