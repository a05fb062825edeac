// crates/flowctl-core/tests/capability_profiles.rs
// ============================================================================
// Integration tests: capability profile resolution is a pure function of the
// profile name and always allocates a fresh token list.
// ============================================================================

#![allow(clippy::unwrap_used, reason = "test assertions use panic-based failure reporting")]

use flowctl_core::capability::CapabilityProfile;
use flowctl_core::Capability;

#[test]
fn read_only_profile_grants_only_fs_read() {
    let tokens = CapabilityProfile::ReadOnly.tokens();
    assert_eq!(tokens, vec![Capability::FsRead]);
}

#[test]
fn from_name_round_trips_known_profiles() {
    for (name, profile) in [
        ("CODE_MODULE_DEFAULT", CapabilityProfile::CodeModuleDefault),
        ("WORKFLOW_MODULE_DEFAULT", CapabilityProfile::WorkflowModuleDefault),
        ("READ_ONLY", CapabilityProfile::ReadOnly),
        ("SYSTEM_PRIVILEGED", CapabilityProfile::SystemPrivileged),
    ] {
        assert_eq!(CapabilityProfile::from_name(name).unwrap(), profile);
    }
}

#[test]
fn unknown_profile_name_is_rejected() {
    assert!(CapabilityProfile::from_name("NOT_A_PROFILE").is_err());
}
