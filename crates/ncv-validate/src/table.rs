//! Rule Table
//!
//! Holds every declared rule and resolves, for a class, the single most
//! specific enabled rule by walking the class's ancestor chain. Resolutions
//! are memoised per class so large batches of the same class cost one walk.

use std::collections::HashMap;
use std::collections::hash_map::Entry;
use std::fmt;
use std::sync::Arc;

use dashmap::DashMap;
use serde::Serialize;
use tracing::{info, trace, warn};

use crate::hierarchy::{ClassHierarchy, ClassPath};
use crate::rule::{BrokenRule, ConventionRule, RuleDefinition};

/// Several enabled rules declared for the same class
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConfigurationConflict {
    pub target: ClassPath,
    /// Id of the rule that resolution uses
    pub winner: String,
    /// Ids of the other enabled rules for `target`, in declaration order
    pub shadowed: Vec<String>,
}

impl fmt::Display for ConfigurationConflict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} enabled rules target '{}': '{}' wins over {}",
            self.shadowed.len() + 1,
            self.target,
            self.winner,
            self.shadowed
                .iter()
                .map(|id| format!("'{id}'"))
                .collect::<Vec<_>>()
                .join(", ")
        )
    }
}

/// Result of [`RuleTable::build`]
#[derive(Debug)]
pub struct TableBuild {
    pub table: RuleTable,
    pub conflicts: Vec<ConfigurationConflict>,
}

/// Class-hierarchy-indexed collection of convention rules
#[derive(Debug)]
pub struct RuleTable {
    rules: Vec<Arc<ConventionRule>>,
    /// Exact target -> index of the winning enabled rule
    effective: HashMap<ClassPath, usize>,
    /// Winning rule per declared class, indexed by `ClassId`
    by_class: Vec<Option<usize>>,
    hierarchy: Arc<ClassHierarchy>,
    resolved: DashMap<ClassPath, Option<usize>>,
}

impl RuleTable {
    /// Build a table from rules in declaration order.
    ///
    /// When several enabled rules share a target the highest `priority`
    /// wins and, on equal priority, the last declared one.
    pub fn build(
        rules: impl IntoIterator<Item = ConventionRule>,
        hierarchy: Arc<ClassHierarchy>,
    ) -> TableBuild {
        let rules: Vec<Arc<ConventionRule>> = rules.into_iter().map(Arc::new).collect();

        let mut order: Vec<ClassPath> = Vec::new();
        let mut contenders: HashMap<ClassPath, Vec<usize>> = HashMap::new();
        for (index, rule) in rules.iter().enumerate().filter(|(_, r)| r.enabled) {
            match contenders.entry(rule.target.clone()) {
                Entry::Occupied(mut slot) => slot.get_mut().push(index),
                Entry::Vacant(slot) => {
                    order.push(rule.target.clone());
                    slot.insert(vec![index]);
                }
            }
        }

        let mut effective = HashMap::with_capacity(order.len());
        let mut conflicts = Vec::new();
        for target in order {
            let Some(candidates) = contenders.remove(&target) else {
                continue;
            };
            let Some(&winner) = candidates
                .iter()
                .max_by_key(|&&index| (rules[index].priority, index))
            else {
                continue;
            };

            if candidates.len() > 1 {
                let conflict = ConfigurationConflict {
                    target: target.clone(),
                    winner: rules[winner].id.clone(),
                    shadowed: candidates
                        .iter()
                        .filter(|&&index| index != winner)
                        .map(|&index| rules[index].id.clone())
                        .collect(),
                };
                warn!(target_class = %conflict.target, winner = %conflict.winner, shadowed = ?conflict.shadowed, "Conflicting rules for class");
                conflicts.push(conflict);
            }
            effective.insert(target, winner);
        }
        let by_class = hierarchy
            .classes()
            .map(|class| effective.get(class).copied())
            .collect();

        TableBuild {
            table: Self {
                rules,
                effective,
                by_class,
                hierarchy,
                resolved: DashMap::new(),
            },
            conflicts,
        }
    }

    /// Table without rules; every class resolves to nothing
    pub fn empty() -> Self {
        Self::build(Vec::<ConventionRule>::new(), Arc::new(ClassHierarchy::empty())).table
    }

    /// Most specific enabled rule for `class`: the nearest class on its
    /// ancestor walk that has an effective rule
    pub fn resolve(&self, class: &ClassPath) -> Option<&Arc<ConventionRule>> {
        let cached = self.resolved.get(class).map(|entry| *entry.value());
        let index = match cached {
            Some(index) => index,
            None => {
                let found = match self.hierarchy.id_of(class.as_str()) {
                    Some(id) => self
                        .hierarchy
                        .ancestor_ids(id)
                        .find_map(|ancestor| self.by_class[ancestor.index()]),
                    None => self.effective.get(class).copied(),
                };
                trace!(class = %class, rule = ?found.map(|i| &self.rules[i].id), "Resolved class rule");
                self.resolved.insert(class.clone(), found);
                found
            }
        };
        index.map(|i| &self.rules[i])
    }

    /// All declared rules, enabled or not, in declaration order
    pub fn rules(&self) -> &[Arc<ConventionRule>] {
        &self.rules
    }

    /// Declared rules whose exact target is `class`
    pub fn rules_for<'a>(&'a self, class: &'a str) -> impl Iterator<Item = &'a Arc<ConventionRule>> {
        self.rules.iter().filter(move |rule| rule.applies_to(class))
    }

    /// Winning rule declared for exactly `class`, ignoring ancestors
    pub fn effective_rule(&self, class: &str) -> Option<&Arc<ConventionRule>> {
        self.effective.get(class).map(|&index| &self.rules[index])
    }

    pub fn get(&self, id: &str) -> Option<&Arc<ConventionRule>> {
        self.rules.iter().find(|rule| rule.id == id)
    }

    /// Number of classes with an effective rule of their own
    pub fn effective_rule_count(&self) -> usize {
        self.effective.len()
    }

    pub fn hierarchy(&self) -> &Arc<ClassHierarchy> {
        &self.hierarchy
    }

    /// Number of distinct classes resolved so far
    pub fn cached_classes(&self) -> usize {
        self.resolved.len()
    }
}

/// Outcome of compiling a rule list into a table
#[derive(Debug)]
pub struct RuleSetBuild {
    pub table: RuleTable,
    pub broken_rules: Vec<BrokenRule>,
    pub conflicts: Vec<ConfigurationConflict>,
}

impl RuleSetBuild {
    /// Compile `definitions` and build the table from those that compile.
    ///
    /// Never fails: malformed patterns land in `broken_rules`. Ids that
    /// collide within one load get a `-2`, `-3`, ... suffix in declaration
    /// order.
    pub fn load(
        definitions: impl IntoIterator<Item = RuleDefinition>,
        hierarchy: Arc<ClassHierarchy>,
    ) -> Self {
        let mut used: HashMap<String, usize> = HashMap::new();
        let mut rules = Vec::new();
        let mut broken_rules = Vec::new();

        for definition in definitions {
            let id = unique_id(definition.resolved_id(), &mut used);
            match ConventionRule::compile(&definition) {
                Ok(mut rule) => {
                    rule.id = id;
                    rules.push(rule);
                }
                Err(error) => {
                    warn!(rule_id = %id, target_class = %definition.target, pattern = %definition.pattern, error = %error, "Broken rule excluded from table");
                    broken_rules.push(BrokenRule {
                        id,
                        definition,
                        error,
                    });
                }
            }
        }

        let compiled = rules.len();
        let TableBuild { table, conflicts } = RuleTable::build(rules, hierarchy);
        info!(
            rules = compiled,
            effective = table.effective_rule_count(),
            broken = broken_rules.len(),
            conflicts = conflicts.len(),
            "Rule set loaded"
        );

        Self {
            table,
            broken_rules,
            conflicts,
        }
    }

    pub fn has_issues(&self) -> bool {
        !self.broken_rules.is_empty() || !self.conflicts.is_empty()
    }
}

fn unique_id(base: String, used: &mut HashMap<String, usize>) -> String {
    let Some(&seen) = used.get(&base) else {
        used.insert(base.clone(), 1);
        return base;
    };

    let mut suffix = seen + 1;
    loop {
        let candidate = format!("{base}-{suffix}");
        if !used.contains_key(&candidate) {
            used.insert(base, suffix);
            used.insert(candidate.clone(), 1);
            return candidate;
        }
        suffix += 1;
    }
}
