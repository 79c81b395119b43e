//! Incident lifecycle transition table.
//!
//! This table is the single source of truth for which role may move an
//! incident from which state to which state. Handlers never re-derive
//! legality on their own.

use crate::entities::incidents::IncidentStatus;
use crate::models::Role;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TransitionKind {
    Submit,
    DepartmentApprove,
    DepartmentReject,
    SubmitCommandCenter,
    CommandCenterResolve,
    IssueEmergencyTeam,
    Resolve,
    Close,
    Resubmit,
}

impl TransitionKind {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Submit => "submit",
            Self::DepartmentApprove => "department_approve",
            Self::DepartmentReject => "department_reject",
            Self::SubmitCommandCenter => "submit_command_center",
            Self::CommandCenterResolve => "command_center_resolve",
            Self::IssueEmergencyTeam => "issue_emergency_team",
            Self::Resolve => "resolve",
            Self::Close => "close",
            Self::Resubmit => "resubmit",
        }
    }
}

/// Who may perform a transition, beyond the unconditional admin/leadership
/// grant evaluated first for every transition.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ActorRule {
    /// Only the user who submitted the incident.
    Submitter,
    /// Any of the listed roles. Empty means admin/leadership only.
    Roles(&'static [Role]),
}

/// Payload the transition requires in its request body.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PayloadRule {
    None,
    RejectionReason,
    Resolution,
}

pub struct TransitionRule {
    pub kind: TransitionKind,
    pub source: IncidentStatus,
    pub target: IncidentStatus,
    pub actor: ActorRule,
    pub payload: PayloadRule,
    pub stamps_resolved_at: bool,
    pub stamps_closed_at: bool,
}

const fn rule(
    kind: TransitionKind,
    source: IncidentStatus,
    target: IncidentStatus,
    actor: ActorRule,
    payload: PayloadRule,
) -> TransitionRule {
    TransitionRule {
        kind,
        source,
        target,
        actor,
        payload,
        stamps_resolved_at: false,
        stamps_closed_at: false,
    }
}

pub static TRANSITIONS: &[TransitionRule] = &[
    rule(
        TransitionKind::Submit,
        IncidentStatus::Draft,
        IncidentStatus::SubmittedDepartmentReview,
        ActorRule::Submitter,
        PayloadRule::None,
    ),
    rule(
        TransitionKind::DepartmentApprove,
        IncidentStatus::SubmittedDepartmentReview,
        IncidentStatus::DepartmentApproved,
        ActorRule::Roles(&[Role::DepartmentHead]),
        PayloadRule::None,
    ),
    rule(
        TransitionKind::DepartmentReject,
        IncidentStatus::SubmittedDepartmentReview,
        IncidentStatus::DepartmentRejected,
        ActorRule::Roles(&[Role::DepartmentHead]),
        PayloadRule::RejectionReason,
    ),
    rule(
        TransitionKind::SubmitCommandCenter,
        IncidentStatus::DepartmentApproved,
        IncidentStatus::PendingCommandCenter,
        ActorRule::Roles(&[Role::DepartmentHead]),
        PayloadRule::None,
    ),
    rule(
        TransitionKind::CommandCenterResolve,
        IncidentStatus::PendingCommandCenter,
        IncidentStatus::CommandCenterProcessed,
        ActorRule::Roles(&[Role::CommandCenter]),
        PayloadRule::Resolution,
    ),
    rule(
        TransitionKind::IssueEmergencyTeam,
        IncidentStatus::CommandCenterProcessed,
        IncidentStatus::IssuedEmergencyTeam,
        ActorRule::Roles(&[Role::CommandCenter]),
        PayloadRule::None,
    ),
    TransitionRule {
        kind: TransitionKind::Resolve,
        source: IncidentStatus::IssuedEmergencyTeam,
        target: IncidentStatus::Resolved,
        actor: ActorRule::Roles(&[Role::CommandCenter]),
        payload: PayloadRule::None,
        stamps_resolved_at: true,
        stamps_closed_at: false,
    },
    TransitionRule {
        kind: TransitionKind::Close,
        source: IncidentStatus::Resolved,
        target: IncidentStatus::Closed,
        actor: ActorRule::Roles(&[]),
        payload: PayloadRule::None,
        stamps_resolved_at: false,
        stamps_closed_at: true,
    },
    rule(
        TransitionKind::Resubmit,
        IncidentStatus::DepartmentRejected,
        IncidentStatus::SubmittedDepartmentReview,
        ActorRule::Submitter,
        PayloadRule::None,
    ),
];

#[must_use]
pub fn rule_for(kind: TransitionKind) -> &'static TransitionRule {
    TRANSITIONS
        .iter()
        .find(|rule| rule.kind == kind)
        .expect("transition table covers every kind")
}

/// Fixed evaluation order: admin/leadership override, then the table's actor
/// rule. The source-state gate lives with the caller (and again inside the
/// storage write), not here.
#[must_use]
pub fn is_authorized(rule: &TransitionRule, role: Role, actor_id: i32, submitted_by: i32) -> bool {
    if role.overrides_workflow() {
        return true;
    }

    match rule.actor {
        ActorRule::Submitter => actor_id == submitted_by,
        ActorRule::Roles(roles) => roles.contains(&role),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn table_covers_every_kind() {
        for kind in [
            TransitionKind::Submit,
            TransitionKind::DepartmentApprove,
            TransitionKind::DepartmentReject,
            TransitionKind::SubmitCommandCenter,
            TransitionKind::CommandCenterResolve,
            TransitionKind::IssueEmergencyTeam,
            TransitionKind::Resolve,
            TransitionKind::Close,
            TransitionKind::Resubmit,
        ] {
            assert_eq!(rule_for(kind).kind, kind);
        }
    }

    #[test]
    fn admin_and_leadership_pass_every_transition() {
        for rule in TRANSITIONS {
            assert!(is_authorized(rule, Role::Admin, 999, 1));
            assert!(is_authorized(rule, Role::Leadership, 999, 1));
        }
    }

    #[test]
    fn close_is_leadership_and_admin_only() {
        let rule = rule_for(TransitionKind::Close);

        assert!(!is_authorized(rule, Role::CommandCenter, 1, 1));
        assert!(!is_authorized(rule, Role::DepartmentHead, 1, 1));
        assert!(!is_authorized(rule, Role::Officer, 1, 1));
    }

    #[test]
    fn submitter_rule_checks_identity() {
        let rule = rule_for(TransitionKind::Submit);

        assert!(is_authorized(rule, Role::Officer, 7, 7));
        assert!(!is_authorized(rule, Role::Officer, 8, 7));
        // a department head who is not the submitter cannot submit a draft
        assert!(!is_authorized(rule, Role::DepartmentHead, 8, 7));
    }

    #[test]
    fn department_head_only_acts_on_review_states() {
        assert!(is_authorized(
            rule_for(TransitionKind::DepartmentApprove),
            Role::DepartmentHead,
            2,
            1
        ));
        assert!(!is_authorized(
            rule_for(TransitionKind::CommandCenterResolve),
            Role::DepartmentHead,
            2,
            1
        ));
    }

    #[test]
    fn command_center_cannot_approve_for_department() {
        assert!(!is_authorized(
            rule_for(TransitionKind::DepartmentApprove),
            Role::CommandCenter,
            2,
            1
        ));
    }

    #[test]
    fn reject_requires_reason_payload() {
        assert_eq!(
            rule_for(TransitionKind::DepartmentReject).payload,
            PayloadRule::RejectionReason
        );
        assert_eq!(
            rule_for(TransitionKind::CommandCenterResolve).payload,
            PayloadRule::Resolution
        );
    }

    #[test]
    fn only_resolve_and_close_stamp_timestamps() {
        for rule in TRANSITIONS {
            match rule.kind {
                TransitionKind::Resolve => assert!(rule.stamps_resolved_at),
                TransitionKind::Close => assert!(rule.stamps_closed_at),
                _ => {
                    assert!(!rule.stamps_resolved_at);
                    assert!(!rule.stamps_closed_at);
                }
            }
        }
    }
}
