//! Deployment input types

use serde::{Deserialize, Serialize};

use crate::error::{NirvanaError, Result};

/// One of the four values needed for an upgrade
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum InputKind {
    Service,
    Namespace,
    Environment,
    ImageTag,
}

impl std::fmt::Display for InputKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            InputKind::Service => "service",
            InputKind::Namespace => "namespace",
            InputKind::Environment => "environment",
            InputKind::ImageTag => "image tag",
        };
        f.write_str(name)
    }
}

/// Values supplied up front on the command line
///
/// Anything left as `None` is resolved interactively.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RequestedInputs {
    pub service: Option<String>,
    pub namespace: Option<String>,
    pub environment: Option<String>,
    pub image_tag: Option<String>,
}

impl RequestedInputs {
    /// Trims every value and drops the ones that end up empty
    pub fn normalized(self) -> Self {
        fn clean(value: Option<String>) -> Option<String> {
            value
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        }

        Self {
            service: clean(self.service),
            namespace: clean(self.namespace),
            environment: clean(self.environment),
            image_tag: clean(self.image_tag),
        }
    }

    /// Iterates over the inputs that were supplied
    pub fn supplied(&self) -> impl Iterator<Item = InputKind> + '_ {
        [
            (InputKind::Service, &self.service),
            (InputKind::Namespace, &self.namespace),
            (InputKind::Environment, &self.environment),
            (InputKind::ImageTag, &self.image_tag),
        ]
        .into_iter()
        .filter(|(_, value)| value.is_some())
        .map(|(kind, _)| kind)
    }
}

/// Fully resolved deployment target
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolvedInputs {
    pub service: String,
    pub namespace: String,
    pub environment: String,
    pub image_tag: String,
}

impl ResolvedInputs {
    /// Builds the resolved inputs, rejecting empty values
    pub fn new(
        service: impl Into<String>,
        namespace: impl Into<String>,
        environment: impl Into<String>,
        image_tag: impl Into<String>,
    ) -> Result<Self> {
        let inputs = Self {
            service: service.into(),
            namespace: namespace.into(),
            environment: environment.into(),
            image_tag: image_tag.into(),
        };

        for (kind, value) in [
            (InputKind::Service, &inputs.service),
            (InputKind::Namespace, &inputs.namespace),
            (InputKind::Environment, &inputs.environment),
            (InputKind::ImageTag, &inputs.image_tag),
        ] {
            if value.trim().is_empty() {
                return Err(NirvanaError::EmptyInput(kind));
            }
        }

        Ok(inputs)
    }
}
