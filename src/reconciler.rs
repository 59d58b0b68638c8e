//! Passes over the whole table that fix inconsistencies only visible when
//! rows from different pages are compared.
//!
//! Preconditions, enforced by the stage order in [`crate::pipeline`]:
//! - the name passes compare neighbours, so rows are sorted descending by name
//!   first (done by [`reconcile_names`] itself)
//! - [`reconcile_sections`] reads `branch`, so every row's branch must already
//!   be final

use std::collections::{BTreeMap, HashMap, HashSet};

use crate::config::{Corrections, ReconcilePolicy, TrailingInitial};
use crate::models::ProfileRecord;
use crate::normalizer::{dedup_rows, squash_whitespace};

const FAMILY_SUFFIXES: &[&str] = &["III", "II", "Jr", "Sr"];

/// Make each researcher's name consistent across rows.
///
/// Runs, in order: descending sort, first-name corrections, middle-name
/// repair, middle-name corrections and dedup, suffix stripping, last-name
/// repair, full-name corrections.
pub fn reconcile_names(
    mut rows: Vec<ProfileRecord>,
    corrections: &Corrections,
    policy: &ReconcilePolicy,
) -> Vec<ProfileRecord> {
    for row in rows.iter_mut() {
        row.name = squash_whitespace(&row.name);
    }
    rows.sort_by(|a, b| b.name.cmp(&a.name));

    apply_corrections(&mut rows, &corrections.first_names);

    repair_middle_names(&mut rows);
    apply_corrections(&mut rows, &corrections.middle_names);
    let mut rows = dedup_rows(rows);

    for row in rows.iter_mut() {
        row.name = strip_name_suffix(&row.name, policy.trailing_initial);
    }
    repair_last_names(&mut rows, policy.last_name_prefix);
    apply_corrections(&mut rows, &corrections.full_names);

    rows
}

/// Replace names that exactly match a correction key
pub fn apply_corrections(rows: &mut [ProfileRecord], map: &BTreeMap<String, String>) {
    if map.is_empty() {
        return;
    }
    for row in rows.iter_mut() {
        if let Some(fixed) = map.get(&row.name) {
            log::debug!("Correcting {:?} -> {:?}", row.name, fixed);
            row.name = fixed.clone();
        }
    }
}

/// Neighbours with the same first and last name but a different number of
/// tokens both take the variant that carries a middle name or initial.
fn repair_middle_names(rows: &mut [ProfileRecord]) {
    for i in 1..rows.len() {
        let fuller = {
            let prev: Vec<&str> = rows[i - 1].name.split_whitespace().collect();
            let next: Vec<&str> = rows[i].name.split_whitespace().collect();

            match (prev.first(), prev.last(), next.first(), next.last()) {
                (Some(pf), Some(pl), Some(nf), Some(nl))
                    if pf == nf && pl == nl && prev.len() != next.len() =>
                {
                    let (longer, count) = if prev.len() > next.len() {
                        (&rows[i - 1].name, prev.len())
                    } else {
                        (&rows[i].name, next.len())
                    };
                    (count > 2).then(|| longer.clone())
                }
                _ => None,
            }
        };

        if let Some(name) = fuller {
            rows[i - 1].name = name.clone();
            rows[i].name = name;
        }
    }
}

/// Drop a trailing family suffix, or a stray single-letter final token when
/// the policy says so. A one-token name is left alone.
pub fn strip_name_suffix(name: &str, trailing_initial: TrailingInitial) -> String {
    let tokens: Vec<&str> = name.split_whitespace().collect();
    let Some((last, rest)) = tokens.split_last() else {
        return name.to_string();
    };
    if rest.is_empty() {
        return name.to_string();
    }

    let stray_initial = trailing_initial == TrailingInitial::Strip && last.chars().count() == 1;
    if stray_initial || FAMILY_SUFFIXES.contains(last) {
        rest.join(" ")
    } else {
        name.to_string()
    }
}

/// Neighbours sharing a first name whose last names agree on the first
/// `prefix` characters but differ in length are treated as one person: the
/// shorter last name is assumed to be missing letters, and both rows take the
/// full name with the longer last name.
fn repair_last_names(rows: &mut [ProfileRecord], prefix: usize) {
    for i in 1..rows.len() {
        let winner = {
            let prev: Vec<&str> = rows[i - 1].name.split_whitespace().collect();
            let next: Vec<&str> = rows[i].name.split_whitespace().collect();

            match (prev.first(), prev.last(), next.first(), next.last()) {
                (Some(pf), Some(pl), Some(nf), Some(nl))
                    if pf == nf && pl.chars().take(prefix).eq(nl.chars().take(prefix)) =>
                {
                    let (prev_len, next_len) = (pl.chars().count(), nl.chars().count());
                    if prev_len > next_len {
                        Some((i, rows[i - 1].name.clone()))
                    } else if next_len > prev_len {
                        Some((i - 1, rows[i].name.clone()))
                    } else {
                        None
                    }
                }
                _ => None,
            }
        };

        if let Some((target, name)) = winner {
            log::debug!("Repairing last name {:?} -> {:?}", rows[target].name, name);
            rows[target].name = name;
        }
    }
}

/// Append ` (branch)` to every section label that appears under more than one
/// branch. Repeats until every label belongs to a single branch, since a new
/// label can match one already used elsewhere. Running it again changes
/// nothing.
pub fn reconcile_sections(rows: &mut [ProfileRecord]) {
    while suffix_mixed_sections(rows) {}
}

/// One suffixing round. Returns whether any label changed.
fn suffix_mixed_sections(rows: &mut [ProfileRecord]) -> bool {
    let mut branches: HashMap<&str, HashSet<&str>> = HashMap::new();
    for row in rows.iter() {
        branches
            .entry(row.section.as_str())
            .or_default()
            .insert(row.branch.as_deref().unwrap_or(""));
    }

    let mixed: HashSet<String> = branches
        .into_iter()
        .filter(|(_, b)| b.len() > 1)
        .map(|(section, _)| section.to_string())
        .collect();

    if mixed.is_empty() {
        return false;
    }

    let mut changed = false;
    for row in rows.iter_mut() {
        if !mixed.contains(&row.section) {
            continue;
        }
        if let Some(branch) = row.branch.as_deref() {
            row.section = format!("{} ({})", row.section, branch);
            changed = true;
        }
    }
    changed
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Education;

    fn row(name: &str, section: &str) -> ProfileRecord {
        ProfileRecord::new(name, section)
            .with_education(Education::PhD)
            .with_branch("B1")
    }

    fn names(rows: &[ProfileRecord]) -> Vec<&str> {
        rows.iter().map(|r| r.name.as_str()).collect()
    }

    #[test]
    fn test_middle_initial_collapses_rows() {
        let rows = vec![row("John A Smith", "Sec1"), row("John Smith", "Sec1")];
        let out = reconcile_names(rows, &Corrections::empty(), &ReconcilePolicy::default());
        assert_eq!(out, vec![row("John A Smith", "Sec1")]);
    }

    #[test]
    fn test_rows_sorted_descending() {
        let rows = vec![row("Alice Zed", "S"), row("Carol Young", "S"), row("Bob Xu", "S")];
        let out = reconcile_names(rows, &Corrections::empty(), &ReconcilePolicy::default());
        assert_eq!(names(&out), vec!["Carol Young", "Bob Xu", "Alice Zed"]);
    }

    #[test]
    fn test_two_token_mismatch_left_alone() {
        // first and last tokens match but neither variant has a middle token
        let rows = vec![row("Lee", "S"), row("Lee Lee", "S")];
        let out = reconcile_names(rows, &Corrections::empty(), &ReconcilePolicy::default());
        assert_eq!(names(&out), vec!["Lee Lee", "Lee"]);
    }

    #[test]
    fn test_last_name_truncation_repaired() {
        let rows = vec![row("Paul Garcia", "S1"), row("Paul Garci", "S2")];
        let out = reconcile_names(rows, &Corrections::empty(), &ReconcilePolicy::default());
        assert_eq!(names(&out), vec!["Paul Garcia", "Paul Garcia"]);
    }

    #[test]
    fn test_last_name_prefix_must_match() {
        let rows = vec![row("Paul Garcia", "S1"), row("Paul Gomez", "S2")];
        let policy = ReconcilePolicy {
            last_name_prefix: 3,
            ..ReconcilePolicy::default()
        };
        let out = reconcile_names(rows, &Corrections::empty(), &policy);
        assert_eq!(names(&out), vec!["Paul Gomez", "Paul Garcia"]);
    }

    #[test]
    fn test_suffixes_stripped() {
        assert_eq!(strip_name_suffix("Robert Jones Jr", TrailingInitial::Strip), "Robert Jones");
        assert_eq!(strip_name_suffix("Robert Jones III", TrailingInitial::Keep), "Robert Jones");
        assert_eq!(strip_name_suffix("Robert Jones K", TrailingInitial::Strip), "Robert Jones");
        assert_eq!(strip_name_suffix("Robert Jones K", TrailingInitial::Keep), "Robert Jones K");
        assert_eq!(strip_name_suffix("Jr", TrailingInitial::Strip), "Jr");
    }

    #[test]
    fn test_corrections_applied_at_each_stage() {
        let mut corrections = Corrections::empty();
        corrections
            .first_names
            .insert("Beth Fischer".into(), "Elizabeth Fischer".into());
        corrections
            .middle_names
            .insert("Elizabeth Fischer".into(), "Elizabeth R Fischer".into());
        corrections
            .full_names
            .insert("Sumati Ragagopalan".into(), "Sumati Rajagopalan".into());

        let rows = vec![row("Beth Fischer", "S1"), row("Sumati Ragagopalan", "S2")];
        let out = reconcile_names(rows, &corrections, &ReconcilePolicy::default());
        assert_eq!(names(&out), vec!["Sumati Rajagopalan", "Elizabeth R Fischer"]);
    }

    #[test]
    fn test_reconcile_sections_disambiguates() {
        let mut rows = vec![
            ProfileRecord::new("A", "Unit X").with_branch("B1"),
            ProfileRecord::new("B", "Unit X").with_branch("B2"),
            ProfileRecord::new("C", "Unit Y").with_branch("B1"),
        ];
        reconcile_sections(&mut rows);

        assert_eq!(rows[0].section, "Unit X (B1)");
        assert_eq!(rows[1].section, "Unit X (B2)");
        assert_eq!(rows[2].section, "Unit Y");
    }

    #[test]
    fn test_reconcile_sections_idempotent() {
        let mut rows = vec![
            ProfileRecord::new("A", "Unit X").with_branch("B1"),
            ProfileRecord::new("B", "Unit X").with_branch("B2"),
            ProfileRecord::new("C", "Unit X").with_branch("B2"),
        ];
        reconcile_sections(&mut rows);
        let once = rows.clone();
        reconcile_sections(&mut rows);
        assert_eq!(rows, once);
    }

    #[test]
    fn test_reconcile_sections_suffix_matching_existing_label() {
        // "Unit X (B1)" already exists under B3, so the first round collides
        let mut rows = vec![
            ProfileRecord::new("A", "Unit X").with_branch("B1"),
            ProfileRecord::new("B", "Unit X").with_branch("B2"),
            ProfileRecord::new("C", "Unit X (B1)").with_branch("B3"),
        ];
        reconcile_sections(&mut rows);
        let sections: Vec<&str> = rows.iter().map(|r| r.section.as_str()).collect();
        assert_eq!(sections, vec!["Unit X (B1) (B1)", "Unit X (B2)", "Unit X (B1) (B3)"]);

        let once = rows.clone();
        reconcile_sections(&mut rows);
        assert_eq!(rows, once);
    }
}
