use thiserror::Error;

/// Errors surfaced by scene assembly and the rendering backend.
#[derive(Debug, Error)]
pub enum SceneError {
    /// A recipe entry or light is malformed. Assembly aborts.
    #[error("invalid configuration for `{part}`: {source}")]
    Configuration {
        part: String,
        #[source]
        source: ConfigError,
    },
    /// A texture could not be resolved. Recovered locally by the material.
    #[error(transparent)]
    AssetLoad(#[from] AssetLoadError),
    /// The graphics backend could not provide a rendering surface.
    #[error("graphics backend error: {0}")]
    Backend(String),
}

impl SceneError {
    pub fn config(part: impl Into<String>, source: ConfigError) -> Self {
        Self::Configuration {
            part: part.into(),
            source,
        }
    }

    pub fn backend(err: impl std::fmt::Display) -> Self {
        Self::Backend(err.to_string())
    }

    /// Returns the configuration problem if this is a configuration error.
    pub fn as_config(&self) -> Option<&ConfigError> {
        match self {
            Self::Configuration { source, .. } => Some(source),
            _ => None,
        }
    }
}

/// Validation failures for part, composite and light specs.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    #[error("missing geometry parameter `{0}`")]
    MissingParam(&'static str),
    #[error("unexpected geometry parameter `{0}`")]
    UnexpectedParam(String),
    #[error("geometry parameter `{name}` {expected}, got {value}")]
    InvalidParam {
        name: &'static str,
        expected: &'static str,
        value: f32,
    },
    #[error("geometry would need {vertices} vertices, more than the limit of {limit}")]
    TooManyVertices { vertices: u64, limit: u64 },
    #[error("{builder} builder cannot build {kind} geometry")]
    WrongBuilder {
        builder: &'static str,
        kind: &'static str,
    },
    #[error("malformed color `{0}` (expected #RRGGBB or #RGB)")]
    MalformedColor(String),
    #[error("`{property}` is not supported by {kind} materials")]
    UnsupportedMaterialProperty {
        kind: &'static str,
        property: &'static str,
    },
    #[error("material parameter `{name}` {expected}, got {value}")]
    InvalidMaterialParam {
        name: &'static str,
        expected: &'static str,
        value: f32,
    },
    #[error("texture reference for `{0}` is empty")]
    EmptyTextureRef(&'static str),
    #[error("composite child `{0}` carries its own transform; use the relative transform instead")]
    NestedTransform(String),
    #[error("composite has no children")]
    EmptyComposite,
    #[error("`{property}` is not supported by {kind} lights")]
    UnsupportedLightProperty {
        kind: &'static str,
        property: &'static str,
    },
    #[error("light parameter `{name}` {expected}, got {value}")]
    InvalidLightParam {
        name: &'static str,
        expected: &'static str,
        value: f32,
    },
}

/// A texture reference that failed to resolve.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("failed to load texture `{reference}`: {message}")]
pub struct AssetLoadError {
    pub reference: String,
    pub message: String,
}

impl AssetLoadError {
    pub fn new(reference: impl Into<String>, message: impl std::fmt::Display) -> Self {
        Self {
            reference: reference.into(),
            message: message.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn configuration_error_names_the_part() {
        let err = SceneError::config("thruster", ConfigError::MissingParam("height"));
        let message = err.to_string();
        assert!(message.contains("thruster"));
        assert_eq!(err.as_config(), Some(&ConfigError::MissingParam("height")));
    }

    #[test]
    fn asset_errors_convert_into_scene_errors() {
        let err: SceneError = AssetLoadError::new("moon.jpg", "not found").into();
        assert!(matches!(err, SceneError::AssetLoad(_)));
        assert!(err.as_config().is_none());
        assert_eq!(
            err.to_string(),
            "failed to load texture `moon.jpg`: not found"
        );
    }
}
