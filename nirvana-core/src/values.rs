//! Deployed values lookup
//!
//! Derives the default image tag from the output of `helm get values`.
//! Every failure here is recovered: the caller gets the fallback tag and
//! the reason is only logged.

use serde::Deserialize;
use serde_yaml::Value as YamlValue;
use tracing::debug;

use crate::domain::task::CommandOutput;

/// Why the fallback tag was used instead of the deployed one
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FallbackReason {
    /// No values fetch was started
    Skipped,
    /// The values command exited non-zero
    FetchFailed { exit_code: i32 },
    /// The values command printed nothing
    Empty,
    /// The output was not a values document
    ParseFailed(String),
    /// The document has no `global.image.tag`
    TagAbsent,
}

/// Outcome of looking up the deployed image tag
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValuesLookup {
    Found(String),
    Fallback(FallbackReason),
}

impl ValuesLookup {
    /// The tag to offer, using `fallback` when nothing was found
    pub fn tag_or(self, fallback: &str) -> String {
        match self {
            ValuesLookup::Found(tag) => tag,
            ValuesLookup::Fallback(reason) => {
                debug!("Using fallback image tag {:?}: {:?}", fallback, reason);
                fallback.to_string()
            }
        }
    }
}

#[derive(Debug, Default, Deserialize)]
struct ReleaseValues {
    #[serde(default)]
    global: Option<GlobalValues>,
}

#[derive(Debug, Default, Deserialize)]
struct GlobalValues {
    #[serde(default)]
    image: Option<ImageValues>,
}

#[derive(Debug, Default, Deserialize)]
struct ImageValues {
    #[serde(default)]
    tag: Option<YamlValue>,
}

/// Looks up `global.image.tag` in a values document
pub fn parse_image_tag(document: &str) -> ValuesLookup {
    if document.trim().is_empty() {
        return ValuesLookup::Fallback(FallbackReason::Empty);
    }

    // A document that is only `null` (helm prints this for no user values)
    let values: Option<ReleaseValues> = match serde_yaml::from_str(document) {
        Ok(values) => values,
        Err(e) => return ValuesLookup::Fallback(FallbackReason::ParseFailed(e.to_string())),
    };

    let tag = values
        .and_then(|v| v.global)
        .and_then(|g| g.image)
        .and_then(|i| i.tag)
        .and_then(scalar_to_string);

    match tag {
        Some(tag) => ValuesLookup::Found(tag),
        None => ValuesLookup::Fallback(FallbackReason::TagAbsent),
    }
}

/// Looks up the deployed image tag from a joined values fetch, if any
pub fn deployed_image_tag(output: Option<&CommandOutput>) -> ValuesLookup {
    match output {
        None => ValuesLookup::Fallback(FallbackReason::Skipped),
        Some(output) if !output.success() => ValuesLookup::Fallback(FallbackReason::FetchFailed {
            exit_code: output.exit_code,
        }),
        Some(output) => parse_image_tag(&output.stdout),
    }
}

fn scalar_to_string(value: YamlValue) -> Option<String> {
    let tag = match value {
        YamlValue::String(s) => s,
        YamlValue::Number(n) => n.to_string(),
        YamlValue::Bool(b) => b.to_string(),
        _ => return None,
    };
    let tag = tag.trim().to_string();
    (!tag.is_empty()).then_some(tag)
}
