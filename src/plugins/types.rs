//! Plugin types for plughost
//!
//! This module defines the wire metadata every plugin binary reports, the
//! validated plugin record, and the error attached to plugins that were
//! recognized but failed validation.

use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

use serde::{Deserialize, Serialize, Serializer};

/// Mandatory filename prefix marking an executable as a CLI plugin.
pub const NAME_PREFIX: &str = "docker-";

/// The hidden subcommand every plugin must implement to describe itself.
pub const METADATA_SUBCOMMAND_NAME: &str = "docker-cli-plugin-metadata";

/// The only metadata schema version currently understood.
pub const SUPPORTED_SCHEMA_VERSION: &str = "0.1.0";

/// Environment variable set on plugin processes, holding the path the root
/// CLI was invoked as so the plugin can call back into it.
pub const REEXEC_ENV_VAR: &str = "DOCKER_CLI_PLUGIN_ORIGINAL_CLI_COMMAND";

/// Metadata printed as JSON by `<plugin> docker-cli-plugin-metadata`.
///
/// Keys absent from the JSON object deserialize to empty strings, so the
/// validator can report a missing `SchemaVersion` the same way as a wrong one.
///
/// # Example
///
/// ```json
/// {
///   "SchemaVersion": "0.1.0",
///   "Vendor": "Acme Inc.",
///   "Version": "v1.2.3",
///   "ShortDescription": "Say hello",
///   "URL": "https://example.com/hello"
/// }
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Metadata {
    /// Version of this metadata format. Must be `0.1.0`.
    #[serde(rename = "SchemaVersion", default)]
    pub schema_version: String,

    /// Who provides the plugin. Mandatory.
    #[serde(rename = "Vendor", default)]
    pub vendor: String,

    #[serde(rename = "Version", default, skip_serializing_if = "String::is_empty")]
    pub version: String,

    /// One line shown next to the command in help output.
    #[serde(
        rename = "ShortDescription",
        default,
        skip_serializing_if = "String::is_empty"
    )]
    pub short_description: String,

    #[serde(rename = "URL", default, skip_serializing_if = "String::is_empty")]
    pub url: String,
}

/// The reason a recognized plugin cannot be used.
///
/// Wraps an optional underlying cause. `Display` always yields one
/// human-readable line, and serializing produces that same line, so the
/// error can be embedded in JSON listings. The original cause stays reachable
/// through [`PluginError::cause`] and `source()` for downcasting.
#[derive(Clone)]
pub struct PluginError {
    message: String,
    cause: Option<Arc<dyn std::error::Error + Send + Sync + 'static>>,
}

impl PluginError {
    /// An error with a message and no underlying cause.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            cause: None,
        }
    }

    /// Wrap `cause`, prefixing its message with `context`.
    pub fn wrap<E>(cause: E, context: &str) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Self {
            message: format!("{}: {}", context, cause),
            cause: Some(Arc::new(cause)),
        }
    }

    /// Like [`PluginError::wrap`], but with the full message supplied by the caller.
    pub fn with_message<E>(cause: E, message: impl Into<String>) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Self {
            message: message.into(),
            cause: Some(Arc::new(cause)),
        }
    }

    /// The error this one was created from, if any.
    pub fn cause(&self) -> Option<&(dyn std::error::Error + Send + Sync + 'static)> {
        self.cause.as_deref()
    }
}

impl fmt::Display for PluginError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

impl fmt::Debug for PluginError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PluginError")
            .field("message", &self.message)
            .field("cause", &self.cause.as_ref().map(|c| c.to_string()))
            .finish()
    }
}

impl std::error::Error for PluginError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.cause
            .as_deref()
            .map(|c| c as &(dyn std::error::Error + 'static))
    }
}

impl Serialize for PluginError {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// A candidate after validation.
///
/// When `err` is `None` the plugin is runnable. Otherwise it is known but
/// unusable and is kept only so listings can report why.
#[derive(Debug, Clone, Serialize)]
pub struct Plugin {
    /// Command name, without the `docker-` prefix or any `.exe` suffix.
    #[serde(rename = "Name")]
    pub name: String,

    /// Absolute path of the plugin executable.
    #[serde(rename = "Path")]
    pub path: PathBuf,

    #[serde(flatten)]
    pub metadata: Metadata,

    /// Why this plugin cannot be used, if it cannot.
    #[serde(rename = "Err", skip_serializing_if = "Option::is_none")]
    pub err: Option<PluginError>,

    /// Same-named executables in lower-precedence directories.
    #[serde(rename = "ShadowedPaths", skip_serializing_if = "Vec::is_empty")]
    pub shadowed_paths: Vec<PathBuf>,
}

impl Plugin {
    /// A record for `path` with a name and no metadata yet.
    pub(crate) fn new(name: impl Into<String>, path: PathBuf) -> Self {
        Self {
            name: name.into(),
            path,
            metadata: Metadata::default(),
            err: None,
            shadowed_paths: Vec::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Whether the plugin passed validation and may be executed.
    pub fn is_valid(&self) -> bool {
        self.err.is_none()
    }

    pub(crate) fn invalid(mut self, err: PluginError) -> Self {
        self.err = Some(err);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_metadata_deserialization_full() {
        let json_str = r#"{
            "SchemaVersion": "0.1.0",
            "Vendor": "Acme Inc.",
            "Version": "v1.2.3",
            "ShortDescription": "Say hello",
            "URL": "https://example.com/hello"
        }"#;

        let metadata: Metadata = serde_json::from_str(json_str).unwrap();
        assert_eq!(metadata.schema_version, "0.1.0");
        assert_eq!(metadata.vendor, "Acme Inc.");
        assert_eq!(metadata.version, "v1.2.3");
        assert_eq!(metadata.short_description, "Say hello");
        assert_eq!(metadata.url, "https://example.com/hello");
    }

    #[test]
    fn test_metadata_missing_fields_default_empty() {
        let metadata: Metadata = serde_json::from_str("{}").unwrap();
        assert_eq!(metadata, Metadata::default());
        assert!(metadata.schema_version.is_empty());
        assert!(metadata.vendor.is_empty());
    }

    #[test]
    fn test_metadata_ignores_unknown_fields() {
        let metadata: Metadata =
            serde_json::from_str(r#"{"SchemaVersion":"0.1.0","Vendor":"a","Experimental":true}"#)
                .unwrap();
        assert_eq!(metadata.vendor, "a");
    }

    #[test]
    fn test_plugin_error_new_has_no_cause() {
        let err = PluginError::new("plugin metadata does not define a vendor");
        assert_eq!(err.to_string(), "plugin metadata does not define a vendor");
        assert!(err.cause().is_none());
        assert!(std::error::Error::source(&err).is_none());
    }

    #[test]
    fn test_plugin_error_wrap_keeps_cause() {
        let io_err = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied");
        let err = PluginError::wrap(io_err, "failed to fetch metadata");
        assert_eq!(err.to_string(), "failed to fetch metadata: denied");

        let cause = err.cause().unwrap();
        let io = cause.downcast_ref::<std::io::Error>().unwrap();
        assert_eq!(io.kind(), std::io::ErrorKind::PermissionDenied);

        let source = std::error::Error::source(&err).unwrap();
        assert!(source.downcast_ref::<std::io::Error>().is_some());
    }

    #[test]
    fn test_plugin_error_clone_shares_cause() {
        let err = PluginError::wrap(
            std::io::Error::new(std::io::ErrorKind::Other, "boom"),
            "context",
        );
        let cloned = err.clone();
        assert!(Arc::ptr_eq(
            err.cause.as_ref().unwrap(),
            cloned.cause.as_ref().unwrap()
        ));
        assert_eq!(err.to_string(), cloned.to_string());
    }

    #[test]
    fn test_plugin_error_serializes_to_string() {
        let err = PluginError::new("plugin SchemaVersion \"xyzzy\" is not valid");
        let value = serde_json::to_value(&err).unwrap();
        assert_eq!(value, json!("plugin SchemaVersion \"xyzzy\" is not valid"));
    }

    #[test]
    fn test_plugin_serialization_valid() {
        let mut plugin = Plugin::new("hello", PathBuf::from("/plugins/docker-hello"));
        plugin.metadata = Metadata {
            schema_version: "0.1.0".into(),
            vendor: "Acme".into(),
            ..Default::default()
        };

        let value = serde_json::to_value(&plugin).unwrap();
        assert_eq!(value["Name"], "hello");
        assert_eq!(value["Path"], "/plugins/docker-hello");
        assert_eq!(value["SchemaVersion"], "0.1.0");
        assert_eq!(value["Vendor"], "Acme");
        assert!(value.get("Err").is_none());
        assert!(value.get("ShadowedPaths").is_none());
        assert!(value.get("Version").is_none());
    }

    #[test]
    fn test_plugin_serialization_invalid() {
        let plugin = Plugin::new("hello", PathBuf::from("/plugins/docker-hello"))
            .invalid(PluginError::new("plugin metadata does not define a vendor"));
        assert!(!plugin.is_valid());

        let value = serde_json::to_value(&plugin).unwrap();
        assert_eq!(value["Err"], "plugin metadata does not define a vendor");
    }
}
