#![allow(dead_code)]

extern crate std;

use crate::types::Project;

/// INV-1: Project funds must never be negative.
pub fn assert_funds_non_negative(project: &Project) {
    assert!(
        project.total_funds >= 0,
        "INV-1 violated: project {} has negative funds ({})",
        project.id,
        project.total_funds
    );
}

/// INV-2: Project goal must always be positive.
pub fn assert_goal_positive(project: &Project) {
    assert!(
        project.funding_goal > 0,
        "INV-2 violated: project {} has non-positive goal ({})",
        project.id,
        project.funding_goal
    );
}

/// INV-3: The deadline lies strictly after the creation time.
pub fn assert_deadline_after_creation(project: &Project) {
    assert!(
        project.deadline > project.created_at,
        "INV-3 violated: project {} deadline {} not after creation {}",
        project.id,
        project.deadline,
        project.created_at
    );
}

/// INV-4: At most one terminal flag is ever set.
pub fn assert_single_terminal_flag(project: &Project) {
    let set = [project.is_completed, project.is_expired, project.is_withdrawn]
        .iter()
        .filter(|f| **f)
        .count();
    assert!(
        set <= 1,
        "INV-4 violated: project {} has {} terminal flags set",
        project.id,
        set
    );
}

/// INV-5: A project is completed exactly when its funds reached the goal,
/// unless it left the open state through another exit first.
pub fn assert_completion_matches_funds(project: &Project) {
    if project.is_expired || project.is_withdrawn {
        return;
    }
    assert_eq!(
        project.is_completed,
        project.total_funds >= project.funding_goal,
        "INV-5 violated: project {} completion flag disagrees with funds {} / goal {}",
        project.id,
        project.total_funds,
        project.funding_goal
    );
}

/// INV-6: Only a completed project can be claimed.
pub fn assert_claim_requires_completion(project: &Project) {
    assert!(
        !project.is_claimed || project.is_completed,
        "INV-6 violated: project {} claimed without completion",
        project.id
    );
}

/// INV-7: A contribution raises `total_funds` by exactly the net amount.
pub fn assert_contribution_invariant(funds_before: i128, funds_after: i128, net: i128) {
    assert_eq!(
        funds_after,
        funds_before + net,
        "INV-7 violated: contribution invariant broken: {} + {} != {}",
        funds_before,
        net,
        funds_after
    );
}

/// INV-8: Project IDs are sequential starting from 0.
pub fn assert_sequential_ids(projects: &[Project]) {
    for (i, project) in projects.iter().enumerate() {
        assert_eq!(
            project.id, i as u64,
            "INV-8 violated: expected id {}, got {}",
            i, project.id
        );
    }
}

/// INV-9: Terminal flags never revert once set.
pub fn assert_flags_monotonic(before: &Project, after: &Project) {
    let pairs = [
        (before.is_completed, after.is_completed, "is_completed"),
        (before.is_expired, after.is_expired, "is_expired"),
        (before.is_withdrawn, after.is_withdrawn, "is_withdrawn"),
        (before.is_claimed, after.is_claimed, "is_claimed"),
    ];
    for (was, now, name) in pairs {
        assert!(
            !was || now,
            "INV-9 violated: project {} flag {} reverted",
            after.id,
            name
        );
    }
}

/// INV-10: Fields fixed at creation never change.
pub fn assert_project_immutable_fields(original: &Project, current: &Project) {
    assert_eq!(original.id, current.id, "INV-10 violated: project id changed");
    assert_eq!(
        original.owner, current.owner,
        "INV-10 violated: project owner changed"
    );
    assert_eq!(
        original.name, current.name,
        "INV-10 violated: project name changed"
    );
    assert_eq!(
        original.description, current.description,
        "INV-10 violated: project description changed"
    );
    assert_eq!(original.url, current.url, "INV-10 violated: project url changed");
    assert_eq!(
        original.funding_goal, current.funding_goal,
        "INV-10 violated: project funding_goal changed"
    );
    assert_eq!(
        original.deadline, current.deadline,
        "INV-10 violated: project deadline changed"
    );
}

/// Run all stateless project invariants.
pub fn assert_all_project_invariants(project: &Project) {
    assert_funds_non_negative(project);
    assert_goal_positive(project);
    assert_deadline_after_creation(project);
    assert_single_terminal_flag(project);
    assert_completion_matches_funds(project);
    assert_claim_requires_completion(project);
}
