//! Structural equality between two snapshots.
//!
//! Lists compare element-wise in their original order; a reordered list is
//! not equal. Only the fields that must survive a transfer are compared, so
//! server-assigned ids on channels and steps are ignored.

use crate::models::*;
use crate::snapshot::Snapshot;

pub fn variable_equal(a: &VariableResource, b: &VariableResource) -> bool {
    a.id == b.id
        && a.scope == b.scope
        && a.name == b.name
        && a.value == b.value
        && a.is_sensitive == b.is_sensitive
        && a.is_editable == b.is_editable
}

pub fn variables_equal(a: &[VariableResource], b: &[VariableResource]) -> bool {
    lists_equal(a, b, variable_equal)
}

pub fn channel_equal(a: &ChannelResource, b: &ChannelResource) -> bool {
    a.description == b.description
        && a.is_default == b.is_default
        && a.name == b.name
        && a.lifecycle_id == b.lifecycle_id
}

pub fn channels_equal(a: &[ChannelResource], b: &[ChannelResource]) -> bool {
    lists_equal(a, b, channel_equal)
}

pub fn action_equal(a: &DeploymentActionResource, b: &DeploymentActionResource) -> bool {
    a.action_type == b.action_type && a.name == b.name
}

pub fn actions_equal(a: &[DeploymentActionResource], b: &[DeploymentActionResource]) -> bool {
    lists_equal(a, b, action_equal)
}

pub fn step_equal(a: &DeploymentStepResource, b: &DeploymentStepResource) -> bool {
    a.name == b.name && a.condition == b.condition && actions_equal(&a.actions, &b.actions)
}

pub fn steps_equal(a: &[DeploymentStepResource], b: &[DeploymentStepResource]) -> bool {
    lists_equal(a, b, step_equal)
}

/// Variables, process steps and channels match, ignoring the implicit
/// default channel on both sides.
pub fn snapshots_equivalent(a: &Snapshot, b: &Snapshot) -> bool {
    let explicit = |s: &Snapshot| -> Vec<ChannelResource> {
        s.channels
            .items
            .iter()
            .filter(|c| !c.is_implicit_default())
            .cloned()
            .collect()
    };
    variables_equal(&a.variables.variables, &b.variables.variables)
        && steps_equal(&a.process.steps, &b.process.steps)
        && channels_equal(&explicit(a), &explicit(b))
}

fn lists_equal<T>(a: &[T], b: &[T], eq: impl Fn(&T, &T) -> bool) -> bool {
    a.len() == b.len() && a.iter().zip(b).all(|(x, y)| eq(x, y))
}
