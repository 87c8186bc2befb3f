//! Tests for rule table resolution, conflicts and rule-set loading

use std::sync::Arc;

use ncv_validate::{
    ClassHierarchy, ClassPath, CompileError, ConventionRule, RuleDefinition, RuleSetBuild,
    RuleTable,
};

use crate::test_utils::{asset_hierarchy, table};

fn resolved_id(table: &RuleTable, class: &str) -> Option<String> {
    table
        .resolve(&ClassPath::from(class))
        .map(|rule| rule.id.clone())
}

fn compiled(definitions: Vec<RuleDefinition>) -> Vec<ConventionRule> {
    definitions
        .iter()
        .map(|d| ConventionRule::compile(d).unwrap())
        .collect()
}

#[test]
fn test_nearest_ancestor_rule_wins() {
    let table = table(vec![
        RuleDefinition::new("Asset", "{PREFIX:A_}{ALPHANUM}").with_id("asset"),
        RuleDefinition::new("Texture", "{PREFIX:T_}{ALPHANUM}").with_id("texture"),
    ]);

    assert_eq!(resolved_id(&table, "Texture2D").as_deref(), Some("texture"));
    assert_eq!(resolved_id(&table, "Texture").as_deref(), Some("texture"));
    assert_eq!(resolved_id(&table, "StaticMesh").as_deref(), Some("asset"));
    assert_eq!(resolved_id(&table, "Asset").as_deref(), Some("asset"));
}

#[test]
fn test_resolution_is_idempotent() {
    let table = table(vec![
        RuleDefinition::new("Material", "M_{ALPHA}").with_id("material"),
    ]);

    let first = resolved_id(&table, "MaterialInstance");
    let second = resolved_id(&table, "MaterialInstance");
    assert_eq!(first, second);
    assert_eq!(first, resolved_id(&table, "Material"));
}

#[test]
fn test_unknown_class_and_unruled_class_resolve_to_none() {
    let table = table(vec![
        RuleDefinition::new("Texture2D", "T_{ALPHA}").with_id("tex2d"),
    ]);

    assert_eq!(resolved_id(&table, "Sound"), None);
    assert_eq!(resolved_id(&table, "SoundWave"), None);
    assert_eq!(resolved_id(&table, "Texture"), None);
}

#[test]
fn test_disabled_rule_is_never_selected() {
    let only_disabled = table(vec![
        RuleDefinition::new("Material", "M_{ALPHA}").disabled(),
    ]);
    assert_eq!(resolved_id(&only_disabled, "Material"), None);
    assert_eq!(only_disabled.rules().len(), 1);

    let falls_back = table(vec![
        RuleDefinition::new("Texture", "T_{ALPHA}").with_id("texture"),
        RuleDefinition::new("Texture2D", "TX_{ALPHA}").with_id("tex2d").disabled(),
    ]);
    assert_eq!(resolved_id(&falls_back, "Texture2D").as_deref(), Some("texture"));
}

#[test]
fn test_duplicate_target_last_declared_wins_on_equal_priority() {
    let build = RuleTable::build(
        compiled(vec![
            RuleDefinition::new("Material", "M_{ALPHA}").with_id("first"),
            RuleDefinition::new("Material", "MAT_{ALPHA}").with_id("second"),
        ]),
        asset_hierarchy(),
    );

    assert_eq!(build.conflicts.len(), 1);
    let conflict = &build.conflicts[0];
    assert_eq!(conflict.target.as_str(), "Material");
    assert_eq!(conflict.winner, "second");
    assert_eq!(conflict.shadowed, vec!["first".to_string()]);
    assert_eq!(resolved_id(&build.table, "Material").as_deref(), Some("second"));
}

#[test]
fn test_duplicate_target_highest_priority_wins() {
    let build = RuleTable::build(
        compiled(vec![
            RuleDefinition::new("Material", "M_{ALPHA}").with_id("high").with_priority(10),
            RuleDefinition::new("Material", "MAT_{ALPHA}").with_id("low"),
            RuleDefinition::new("Material", "MT_{ALPHA}").with_id("mid").with_priority(5),
        ]),
        asset_hierarchy(),
    );

    assert_eq!(build.conflicts.len(), 1);
    assert_eq!(build.conflicts[0].winner, "high");
    assert_eq!(build.conflicts[0].shadowed, vec!["low".to_string(), "mid".to_string()]);
    assert_eq!(resolved_id(&build.table, "Material").as_deref(), Some("high"));
}

#[test]
fn test_conflict_resolution_is_deterministic() {
    let definitions = vec![
        RuleDefinition::new("Material", "M_{ALPHA}"),
        RuleDefinition::new("Material", "MAT_{ALPHA}"),
    ];

    let winners: Vec<Option<String>> = (0..5)
        .map(|_| {
            let build = RuleSetBuild::load(definitions.clone(), asset_hierarchy());
            assert_eq!(build.conflicts.len(), 1);
            resolved_id(&build.table, "Material")
        })
        .collect();

    assert!(winners.iter().all(|w| w == &winners[0]));
    assert!(winners[0].is_some());
}

#[test]
fn test_disabled_duplicates_do_not_conflict() {
    let build = RuleTable::build(
        compiled(vec![
            RuleDefinition::new("Material", "M_{ALPHA}").with_id("on"),
            RuleDefinition::new("Material", "MAT_{ALPHA}").with_id("off").disabled(),
        ]),
        asset_hierarchy(),
    );

    assert!(build.conflicts.is_empty());
    assert_eq!(resolved_id(&build.table, "Material").as_deref(), Some("on"));
}

#[test]
fn test_resolutions_are_cached_per_class() {
    let table = table(vec![
        RuleDefinition::new("Texture", "T_{ALPHA}").with_id("texture"),
    ]);
    assert_eq!(table.cached_classes(), 0);

    for _ in 0..3 {
        resolved_id(&table, "Texture2D");
    }
    assert_eq!(table.cached_classes(), 1);

    resolved_id(&table, "Sound");
    assert_eq!(table.cached_classes(), 2);
}

#[test]
fn test_audit_accessors() {
    let table = table(vec![
        RuleDefinition::new("Texture", "T_{ALPHA}").with_id("texture"),
        RuleDefinition::new("Texture", "TX_{ALPHA}").with_id("texture-old").disabled(),
        RuleDefinition::new("Material", "M_{ALPHA}").with_id("material"),
    ]);

    assert_eq!(table.rules().len(), 3);
    assert_eq!(table.rules_for("Texture").count(), 2);
    assert_eq!(table.effective_rule_count(), 2);
    assert_eq!(
        table.effective_rule("Texture").map(|r| r.id.as_str()),
        Some("texture")
    );
    assert!(table.effective_rule("Texture2D").is_none());
    assert!(table.get("texture-old").is_some_and(|r| !r.enabled));
    assert!(table.get("missing").is_none());
}

#[test]
fn test_empty_table_resolves_nothing() {
    let table = RuleTable::empty();

    assert!(table.rules().is_empty());
    assert_eq!(resolved_id(&table, "Texture2D"), None);
}

#[test]
fn test_load_routes_broken_rules_aside() {
    let build = RuleSetBuild::load(
        vec![
            RuleDefinition::new("Texture", "T_{ALPHA}").with_id("texture"),
            RuleDefinition::new("Material", "M_{ALPHA").with_id("broken"),
            RuleDefinition::new("StaticMesh", "{ALPHA}{NUM:2}").with_id("ambiguous"),
        ],
        asset_hierarchy(),
    );

    assert_eq!(build.table.rules().len(), 1);
    assert_eq!(build.broken_rules.len(), 2);
    assert_eq!(build.broken_rules[0].id, "broken");
    assert_eq!(
        build.broken_rules[0].error,
        CompileError::Unterminated { offset: 2 }
    );
    assert_eq!(
        build.broken_rules[1].error,
        CompileError::Ambiguous { offset: 7 }
    );
    assert!(build.has_issues());
    assert_eq!(resolved_id(&build.table, "MaterialInstance"), None);
}

#[test]
fn test_load_disambiguates_colliding_ids() {
    let build = RuleSetBuild::load(
        vec![
            RuleDefinition::new("Texture", "T_{ALPHA}").with_id("tex"),
            RuleDefinition::new("Texture2D", "TX_{ALPHA}").with_id("tex"),
            RuleDefinition::new("TextureCube", "TC_{ALPHA}").with_id("tex"),
            RuleDefinition::new("Material", "M_{ALPHA}"),
            RuleDefinition::new("Material", "M_{ALPHA}"),
        ],
        asset_hierarchy(),
    );

    let ids: Vec<&str> = build.table.rules().iter().map(|r| r.id.as_str()).collect();
    assert_eq!(&ids[..3], &["tex", "tex-2", "tex-3"]);
    assert_eq!(ids[4], format!("{}-2", ids[3]));
}

#[test]
fn test_table_without_hierarchy_matches_exact_class_only() {
    let table = RuleSetBuild::load(
        vec![RuleDefinition::new("Texture", "T_{ALPHA}").with_id("texture")],
        Arc::new(ClassHierarchy::empty()),
    )
    .table;

    assert_eq!(resolved_id(&table, "Texture").as_deref(), Some("texture"));
    assert_eq!(resolved_id(&table, "Texture2D"), None);
}

#[test]
fn test_rule_on_undeclared_class_beside_declared_hierarchy() {
    let table = table(vec![
        RuleDefinition::new("Asset", "{PREFIX:A_}{ALPHANUM}").with_id("asset"),
        RuleDefinition::new("Niagara", "{PREFIX:NS_}{ALPHANUM}").with_id("niagara"),
    ]);

    assert_eq!(resolved_id(&table, "Niagara").as_deref(), Some("niagara"));
    assert_eq!(resolved_id(&table, "TextureCube").as_deref(), Some("asset"));
    assert_eq!(resolved_id(&table, "NiagaraEmitter"), None);
}
