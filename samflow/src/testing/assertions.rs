//! Assertions over built definitions.

use crate::core::StageKind;
use crate::pipeline::PipelineHandle;

/// Asserts that stage kinds strictly follow Source < Approve? < Build < Deploy.
///
/// # Panics
///
/// Panics if the order is violated.
pub fn assert_stage_order(handle: &PipelineHandle) {
    let kinds: Vec<StageKind> = handle.stages().iter().map(|s| s.kind()).collect();
    assert!(
        kinds.windows(2).all(|pair| pair[0] < pair[1]),
        "stage kinds out of order: {kinds:?}"
    );
    assert_eq!(kinds.first(), Some(&StageKind::Source), "first stage must be Source");
    assert_eq!(kinds.last(), Some(&StageKind::Deploy), "last stage must be Deploy");
}

/// Asserts that each build-capable identity holds `expected` statements and
/// every other identity holds none.
///
/// # Panics
///
/// Panics on the first stage with the wrong count.
pub fn assert_attached_count(handle: &PipelineHandle, expected: usize) {
    for stage in handle.stages() {
        let want = if stage.kind().is_build_capable() { expected } else { 0 };
        assert_eq!(
            stage.attached_statements().len(),
            want,
            "stage '{}' has the wrong number of statements",
            stage.name()
        );
    }
}
