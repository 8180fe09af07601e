//! Policy statements and effects.

use crate::errors::PolicyError;
use crate::utils::{is_valid_action, is_valid_statement_id};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Whether a statement grants or refuses its actions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Effect {
    /// The actions are permitted.
    Allow,
    /// The actions are refused.
    Deny,
}

impl fmt::Display for Effect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Allow => write!(f, "Allow"),
            Self::Deny => write!(f, "Deny"),
        }
    }
}

impl FromStr for Effect {
    type Err = PolicyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "allow" => Ok(Self::Allow),
            "deny" => Ok(Self::Deny),
            _ => Err(PolicyError::UnknownEffect { value: s.to_string() }),
        }
    }
}

/// A single permission grant: actions on resources with an effect.
///
/// Statements are immutable once built. Serialized with IAM casing
/// (`Sid`, `Effect`, `Action`, `Resource`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "RawStatement")]
pub struct PolicyStatement {
    #[serde(rename = "Sid")]
    id: String,
    #[serde(rename = "Effect")]
    effect: Effect,
    #[serde(rename = "Action")]
    actions: Vec<String>,
    #[serde(rename = "Resource")]
    resources: Vec<String>,
}

impl PolicyStatement {
    /// Creates a validated statement.
    ///
    /// # Errors
    ///
    /// Returns an error if the id is not alphanumeric, if there are no
    /// actions or resources, if an action is not `service:verb`, or if a
    /// resource pattern is blank.
    pub fn new<A, R>(
        id: impl Into<String>,
        effect: Effect,
        actions: A,
        resources: R,
    ) -> Result<Self, PolicyError>
    where
        A: IntoIterator,
        A::Item: Into<String>,
        R: IntoIterator,
        R::Item: Into<String>,
    {
        let statement = Self {
            id: id.into(),
            effect,
            actions: actions.into_iter().map(Into::into).collect(),
            resources: resources.into_iter().map(Into::into).collect(),
        };
        statement.validate()?;
        Ok(statement)
    }

    /// Creates a validated `Allow` statement.
    ///
    /// # Errors
    ///
    /// See [`PolicyStatement::new`].
    pub fn allow<A, R>(id: impl Into<String>, actions: A, resources: R) -> Result<Self, PolicyError>
    where
        A: IntoIterator,
        A::Item: Into<String>,
        R: IntoIterator,
        R::Item: Into<String>,
    {
        Self::new(id, Effect::Allow, actions, resources)
    }

    /// Builds an `Allow` statement from static data without validation.
    ///
    /// Only the built-in catalogue uses this; its contents are checked by tests.
    pub(crate) fn allow_static(id: &str, actions: &[&str], resources: &[&str]) -> Self {
        Self {
            id: id.to_string(),
            effect: Effect::Allow,
            actions: actions.iter().map(|a| (*a).to_string()).collect(),
            resources: resources.iter().map(|r| (*r).to_string()).collect(),
        }
    }

    /// Checks the statement's shape.
    ///
    /// # Errors
    ///
    /// Returns the first problem found.
    pub fn validate(&self) -> Result<(), PolicyError> {
        if !is_valid_statement_id(&self.id) {
            return Err(PolicyError::InvalidId { id: self.id.clone() });
        }
        if self.actions.is_empty() {
            return Err(PolicyError::EmptyActions { id: self.id.clone() });
        }
        if let Some(action) = self.actions.iter().find(|a| !is_valid_action(a)) {
            return Err(PolicyError::InvalidAction {
                id: self.id.clone(),
                action: action.clone(),
            });
        }
        if self.resources.is_empty() {
            return Err(PolicyError::EmptyResources { id: self.id.clone() });
        }
        if self.resources.iter().any(|r| r.trim().is_empty()) {
            return Err(PolicyError::BlankResource { id: self.id.clone() });
        }
        Ok(())
    }

    /// Returns the statement id.
    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Returns the effect.
    #[must_use]
    pub fn effect(&self) -> Effect {
        self.effect
    }

    /// Returns the granted actions.
    #[must_use]
    pub fn actions(&self) -> &[String] {
        &self.actions
    }

    /// Returns the targeted resource patterns.
    #[must_use]
    pub fn resources(&self) -> &[String] {
        &self.resources
    }

    /// Returns true if any resource is the bare `*` wildcard.
    #[must_use]
    pub fn is_wildcard_scoped(&self) -> bool {
        self.resources.iter().any(|r| r == "*")
    }

    /// Returns the distinct service prefixes of the actions, in first-seen order.
    #[must_use]
    pub fn services(&self) -> Vec<&str> {
        let mut services: Vec<&str> = Vec::new();
        for action in &self.actions {
            if let Some((service, _)) = action.split_once(':') {
                if !services.contains(&service) {
                    services.push(service);
                }
            }
        }
        services
    }
}

/// Unvalidated wire form; the effect arrives as free text.
#[derive(Deserialize)]
struct RawStatement {
    #[serde(rename = "Sid")]
    id: String,
    #[serde(rename = "Effect")]
    effect: String,
    #[serde(rename = "Action")]
    actions: Vec<String>,
    #[serde(rename = "Resource")]
    resources: Vec<String>,
}

impl TryFrom<RawStatement> for PolicyStatement {
    type Error = PolicyError;

    fn try_from(raw: RawStatement) -> Result<Self, Self::Error> {
        let effect = raw.effect.parse()?;
        Self::new(raw.id, effect, raw.actions, raw.resources)
    }
}
