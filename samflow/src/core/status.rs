//! Stage kinds and the declared execution state machine.

use crate::errors::{codes, ErrorInfo, PipelineValidationError};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// The phase a stage represents.
///
/// Variants are declared in pipeline order; `Ord` follows that order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum StageKind {
    /// Pulls source from the repository.
    Source,
    /// Waits for external sign-off.
    Approve,
    /// Builds the application.
    Build,
    /// Deploys the built application.
    Deploy,
}

impl StageKind {
    /// All kinds in pipeline order.
    pub const ALL: [Self; 4] = [Self::Source, Self::Approve, Self::Build, Self::Deploy];

    /// Returns true if the stage runs in a build environment and therefore
    /// carries an identity with the policy catalogue.
    #[must_use]
    pub fn is_build_capable(&self) -> bool {
        matches!(self, Self::Build | Self::Deploy)
    }

    /// Returns true if the stage may be left out of a pipeline.
    #[must_use]
    pub fn is_optional(&self) -> bool {
        matches!(self, Self::Approve)
    }

    /// Returns the canonical stage name.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Source => "Source",
            Self::Approve => "Approve",
            Self::Build => "Build",
            Self::Deploy => "Deploy",
        }
    }

    /// Returns the execution state entered when this stage starts.
    #[must_use]
    pub fn active_state(&self) -> PipelineState {
        match self {
            Self::Source => PipelineState::Initial,
            Self::Approve => PipelineState::AwaitingApproval,
            Self::Build => PipelineState::Building,
            Self::Deploy => PipelineState::Deploying,
        }
    }
}

impl fmt::Display for StageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for StageKind {
    type Err = PipelineValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.as_str() == s)
            .ok_or_else(|| {
                PipelineValidationError::new(format!("Unknown stage '{s}'"))
                    .with_stages(vec![s.to_string()])
                    .with_error_info(
                        ErrorInfo::new(codes::UNKNOWN_STAGE, format!("'{s}' is not a stage kind"))
                            .with_fix_hint("Use one of Source, Approve, Build, Deploy."),
                    )
            })
    }
}

/// Execution state of a pipeline run, as declared for the external engine.
///
/// This crate never drives transitions; it only answers which ones exist.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PipelineState {
    /// Run created, nothing fetched yet.
    Initial,
    /// Source artifact is available.
    SourceFetched,
    /// Waiting for manual sign-off.
    AwaitingApproval,
    /// Build stage is running.
    Building,
    /// Deploy stage is running.
    Deploying,
    /// Run finished successfully.
    Succeeded,
    /// Run failed or approval was rejected.
    Failed,
}

impl Default for PipelineState {
    fn default() -> Self {
        Self::Initial
    }
}

impl fmt::Display for PipelineState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Initial => "INITIAL",
            Self::SourceFetched => "SOURCE_FETCHED",
            Self::AwaitingApproval => "AWAITING_APPROVAL",
            Self::Building => "BUILDING",
            Self::Deploying => "DEPLOYING",
            Self::Succeeded => "SUCCEEDED",
            Self::Failed => "FAILED",
        };
        f.write_str(s)
    }
}

impl PipelineState {
    /// Returns true if the state ends a run.
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Succeeded | Self::Failed)
    }

    /// Returns the ordered happy path for a pipeline.
    #[must_use]
    pub fn happy_path(with_approval: bool) -> Vec<Self> {
        let mut path = vec![Self::Initial, Self::SourceFetched];
        if with_approval {
            path.push(Self::AwaitingApproval);
        }
        path.extend([Self::Building, Self::Deploying, Self::Succeeded]);
        path
    }

    /// Returns true if `next` may follow `self`.
    ///
    /// `Failed` is reachable from any non-initial, non-terminal state
    /// declared for this pipeline shape.
    #[must_use]
    pub fn can_transition_to(&self, next: Self, with_approval: bool) -> bool {
        if self.is_terminal() {
            return false;
        }
        let path = Self::happy_path(with_approval);
        if next == Self::Failed {
            return *self != Self::Initial && path.contains(self);
        }
        path.windows(2).any(|pair| pair[0] == *self && pair[1] == next)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stage_kind_order() {
        assert!(StageKind::Source < StageKind::Approve);
        assert!(StageKind::Approve < StageKind::Build);
        assert!(StageKind::Build < StageKind::Deploy);
    }

    #[test]
    fn test_stage_kind_parse() {
        assert_eq!("Build".parse::<StageKind>().unwrap(), StageKind::Build);
        let err = "Test".parse::<StageKind>().unwrap_err();
        assert_eq!(err.code(), Some(codes::UNKNOWN_STAGE));
        assert!("build".parse::<StageKind>().is_err());
    }

    #[test]
    fn test_build_capable() {
        assert!(StageKind::Build.is_build_capable());
        assert!(StageKind::Deploy.is_build_capable());
        assert!(!StageKind::Source.is_build_capable());
        assert!(!StageKind::Approve.is_build_capable());
    }

    #[test]
    fn test_happy_path() {
        assert_eq!(
            PipelineState::happy_path(false),
            vec![
                PipelineState::Initial,
                PipelineState::SourceFetched,
                PipelineState::Building,
                PipelineState::Deploying,
                PipelineState::Succeeded,
            ]
        );
        assert!(PipelineState::happy_path(true).contains(&PipelineState::AwaitingApproval));
    }

    #[test]
    fn test_transitions_with_approval() {
        use PipelineState::*;
        assert!(Initial.can_transition_to(SourceFetched, true));
        assert!(SourceFetched.can_transition_to(AwaitingApproval, true));
        assert!(!SourceFetched.can_transition_to(Building, true));
        assert!(AwaitingApproval.can_transition_to(Building, true));
        assert!(AwaitingApproval.can_transition_to(Failed, true));
    }

    #[test]
    fn test_transitions_without_approval() {
        use PipelineState::*;
        assert!(SourceFetched.can_transition_to(Building, false));
        assert!(!SourceFetched.can_transition_to(AwaitingApproval, false));
        assert!(Deploying.can_transition_to(Succeeded, false));
    }

    #[test]
    fn test_failed_reachability() {
        use PipelineState::*;
        assert!(!Initial.can_transition_to(Failed, false));
        assert!(Building.can_transition_to(Failed, false));
        assert!(!Succeeded.can_transition_to(Failed, false));
        assert!(!Failed.can_transition_to(Initial, false));
    }

    #[test]
    fn test_undeclared_state_cannot_fail() {
        use PipelineState::*;
        assert!(!AwaitingApproval.can_transition_to(Failed, false));
        assert!(!AwaitingApproval.can_transition_to(Building, false));
        assert!(AwaitingApproval.can_transition_to(Failed, true));
    }

    #[test]
    fn test_state_serialize() {
        let json = serde_json::to_string(&PipelineState::AwaitingApproval).unwrap();
        assert_eq!(json, r#""AWAITING_APPROVAL""#);
        assert_eq!(PipelineState::SourceFetched.to_string(), "SOURCE_FETCHED");
    }
}
