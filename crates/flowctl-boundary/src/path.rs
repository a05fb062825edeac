// crates/flowctl-boundary/src/path.rs
// ============================================================================
// Module: Flowctl Module Boundary Path Validation
// Description: Rejects absolute paths, traversal segments, and sibling-
// directory lookalikes when a candidate path must stay inside a module root.
// Purpose: Give every action carrying a file path (e.g. run_command's
// targetPath) one fail-closed check to call.
// Dependencies: flowctl-core::identifiers::ModuleId, thiserror
// ============================================================================

//! ## Overview
//! [`validate_module_boundary_path`] performs a purely lexical check: it
//! never touches the filesystem. Paths are compared on normalized
//! POSIX-style components; the root is treated as a directory boundary so a
//! candidate must equal the root or begin with `root + "/"`. A literal `..`
//! component anywhere in the candidate is rejected outright (this function
//! does not attempt to resolve `..` segments lexically, since doing so would
//! require trusting the candidate's own claims about its shape).

// ============================================================================
// SECTION: Imports
// ============================================================================

use thiserror::Error;

use flowctl_core::identifiers::ModuleId;

// ============================================================================
// SECTION: Path Boundary Error
// ============================================================================

/// Error returned when a candidate path escapes its module boundary.
#[derive(Debug, Error, PartialEq, Eq)]
#[error("module boundary escape: module {module_id} root {root} candidate {candidate}: {reason}")]
pub struct PathBoundaryError {
    /// Module the boundary check was performed for.
    pub module_id: String,
    /// The configured root path.
    pub root: String,
    /// The rejected candidate path.
    pub candidate: String,
    /// Human-readable reason for the rejection.
    pub reason: &'static str,
}

// ============================================================================
// SECTION: Validation
// ============================================================================

/// Validates that `candidate` lies within `root`, scoped to `module_id`.
///
/// # Errors
///
/// Returns [`PathBoundaryError`] when `candidate` is absolute, contains a
/// `..` segment, or does not equal `root` or begin with `root + "/"` once
/// normalized to POSIX-style components.
pub fn validate_module_boundary_path(
    module_id: &ModuleId,
    root: &str,
    candidate: &str,
) -> Result<(), PathBoundaryError> {
    let fail = |reason: &'static str| PathBoundaryError {
        module_id: module_id.to_string(),
        root: root.to_string(),
        candidate: candidate.to_string(),
        reason,
    };

    if candidate.starts_with('/') {
        return Err(fail("absolute paths are not permitted"));
    }

    if candidate.split('/').any(|segment| segment == "..") {
        return Err(fail("path traversal segment '..' is not permitted"));
    }

    let normalized_root = normalize(root);
    let normalized_candidate = normalize(candidate);

    if normalized_candidate == normalized_root {
        return Ok(());
    }

    let prefix = format!("{normalized_root}/");
    if normalized_candidate.starts_with(&prefix) {
        return Ok(());
    }

    Err(fail("candidate does not resolve within the module root"))
}

/// Normalizes a POSIX-style path by collapsing repeated slashes and
/// stripping a single leading/trailing slash.
fn normalize(path: &str) -> String {
    path.split('/')
        .filter(|segment| !segment.is_empty() && *segment != ".")
        .collect::<Vec<_>>()
        .join("/")
}

#[cfg(test)]
mod tests {
    use super::validate_module_boundary_path;
    use flowctl_core::identifiers::ModuleId;

    fn module_id() -> ModuleId {
        ModuleId::new("module-a")
    }

    #[test]
    fn candidate_equal_to_root_is_allowed() {
        assert!(validate_module_boundary_path(&module_id(), "src/components", "src/components").is_ok());
    }

    #[test]
    fn candidate_inside_root_is_allowed() {
        assert!(validate_module_boundary_path(&module_id(), "src/components", "src/components/button.tsx").is_ok());
    }

    #[test]
    fn sibling_directory_lookalike_is_rejected() {
        let err = validate_module_boundary_path(&module_id(), "src/components", "src/components-evil/x").unwrap_err();
        assert_eq!(err.reason, "candidate does not resolve within the module root");
    }

    #[test]
    fn absolute_path_is_rejected() {
        let err = validate_module_boundary_path(&module_id(), "src/components", "/etc/passwd").unwrap_err();
        assert_eq!(err.reason, "absolute paths are not permitted");
    }

    #[test]
    fn traversal_segment_is_rejected() {
        let err =
            validate_module_boundary_path(&module_id(), "src/components", "src/components/../../etc/passwd")
                .unwrap_err();
        assert_eq!(err.reason, "path traversal segment '..' is not permitted");
    }

    #[test]
    fn repeated_slashes_normalize_before_comparison() {
        assert!(validate_module_boundary_path(&module_id(), "src//components", "src/components/file.ts").is_ok());
    }
}
