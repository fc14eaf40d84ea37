//! Plugin annotations and help stubs
//!
//! Help and listing code never looks at plugin binaries directly. It gets a
//! small annotation map per plugin and, for help output, stub subcommands
//! attached to the root `clap::Command`.

use std::collections::BTreeMap;

use clap::Command;

use super::types::Plugin;

/// Set to `"true"` on every command backed by a plugin.
pub const ANNOTATION_PLUGIN: &str = "com.docker.cli.plugin";
/// The plugin's vendor.
pub const ANNOTATION_VENDOR: &str = "com.docker.cli.plugin.vendor";
/// The plugin's version.
pub const ANNOTATION_VERSION: &str = "com.docker.cli.plugin.version";
/// Why the plugin is unusable. Absent for valid plugins.
pub const ANNOTATION_INVALID: &str = "com.docker.cli.plugin-invalid";

/// Annotation key to value.
pub type Annotations = BTreeMap<&'static str, String>;

/// Annotations describing `plugin`. Empty vendor/version are omitted.
pub fn annotations(plugin: &Plugin) -> Annotations {
    let mut map = BTreeMap::new();
    map.insert(ANNOTATION_PLUGIN, "true".to_string());
    if !plugin.metadata.vendor.is_empty() {
        map.insert(ANNOTATION_VENDOR, plugin.metadata.vendor.clone());
    }
    if !plugin.metadata.version.is_empty() {
        map.insert(ANNOTATION_VERSION, plugin.metadata.version.clone());
    }
    if let Some(err) = &plugin.err {
        map.insert(ANNOTATION_INVALID, err.to_string());
    }
    map
}

/// Vendor annotation, or `""`.
pub fn vendor(annotations: &Annotations) -> &str {
    annotations.get(ANNOTATION_VENDOR).map_or("", String::as_str)
}

/// Version annotation, or `""`.
pub fn version(annotations: &Annotations) -> &str {
    annotations.get(ANNOTATION_VERSION).map_or("", String::as_str)
}

/// The reason a plugin cannot run, if it is invalid.
pub fn invalid_reason(annotations: &Annotations) -> Option<&str> {
    annotations.get(ANNOTATION_INVALID).map(String::as_str)
}

/// One-line help text for a valid plugin, e.g. `Say hello (Acme Inc., v1.0)`.
pub fn plugin_about(description: &str, annotations: &Annotations) -> String {
    let origin = match version(annotations) {
        "" => vendor(annotations).to_string(),
        v => format!("{}, {}", vendor(annotations), v),
    };
    if description.is_empty() {
        format!("({})", origin)
    } else {
        format!("{} ({})", description, origin)
    }
}

/// Attach plugins to `root` for help output.
///
/// Plugins without an invalid annotation become stub subcommands that accept
/// any arguments. Invalid ones are listed with their reasons in a separate
/// section after the normal help. Plugins whose name collides with an
/// existing subcommand are never added as stubs.
pub fn add_plugin_command_stubs(mut root: Command, plugins: &[Plugin]) -> Command {
    let mut invalid = Vec::new();
    for plugin in plugins {
        let map = annotations(plugin);
        if let Some(reason) = invalid_reason(&map) {
            invalid.push(format!("  {:<12} {}", plugin.name, reason));
            continue;
        }
        if root.find_subcommand(&plugin.name).is_some() {
            continue;
        }
        root = root.subcommand(
            Command::new(plugin.name.clone())
                .about(plugin_about(&plugin.metadata.short_description, &map))
                .disable_help_flag(true)
                .arg(
                    clap::Arg::new("args")
                        .num_args(0..)
                        .trailing_var_arg(true)
                        .allow_hyphen_values(true),
                ),
        );
    }

    if !invalid.is_empty() {
        root = root.after_help(format!("Invalid Plugins:\n{}", invalid.join("\n")));
    }
    root
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::plugins::types::{Metadata, PluginError};
    use std::path::PathBuf;

    fn valid(name: &str, vendor: &str, version: &str, desc: &str) -> Plugin {
        let mut plugin = Plugin::new(name, PathBuf::from(format!("/p/docker-{}", name)));
        plugin.metadata = Metadata {
            schema_version: "0.1.0".into(),
            vendor: vendor.into(),
            version: version.into(),
            short_description: desc.into(),
            url: String::new(),
        };
        plugin
    }

    #[test]
    fn test_annotations_valid_plugin() {
        let map = annotations(&valid("hello", "Acme", "v1.0", "Say hello"));
        assert_eq!(map[ANNOTATION_PLUGIN], "true");
        assert_eq!(map[ANNOTATION_VENDOR], "Acme");
        assert_eq!(map[ANNOTATION_VERSION], "v1.0");
        assert!(!map.contains_key(ANNOTATION_INVALID));
    }

    #[test]
    fn test_annotations_invalid_plugin() {
        let plugin = Plugin::new("broken", PathBuf::from("/p/docker-broken"))
            .invalid(PluginError::new("plugin metadata does not define a vendor"));
        let map = annotations(&plugin);
        assert_eq!(map[ANNOTATION_PLUGIN], "true");
        assert_eq!(
            map[ANNOTATION_INVALID],
            "plugin metadata does not define a vendor"
        );
        assert!(!map.contains_key(ANNOTATION_VENDOR));
        assert!(!map.contains_key(ANNOTATION_VERSION));
    }

    #[test]
    fn test_annotation_accessors() {
        let map = annotations(&valid("hello", "Acme", "", "Say hello"));
        assert_eq!(vendor(&map), "Acme");
        assert_eq!(version(&map), "");
        assert_eq!(invalid_reason(&map), None);

        let map = annotations(
            &Plugin::new("broken", PathBuf::from("/p/docker-broken"))
                .invalid(PluginError::new("bad schema")),
        );
        assert_eq!(invalid_reason(&map), Some("bad schema"));
    }

    #[test]
    fn test_plugin_about() {
        let map = annotations(&valid("a", "Acme", "v1", "Say hello"));
        assert_eq!(plugin_about("Say hello", &map), "Say hello (Acme, v1)");
        let map = annotations(&valid("a", "Acme", "", ""));
        assert_eq!(plugin_about("", &map), "(Acme)");
    }

    #[test]
    fn test_add_plugin_command_stubs() {
        let root = Command::new("plughost").subcommand(Command::new("version"));
        let plugins = vec![
            valid("hello", "Acme", "v1", "Say hello"),
            valid("version", "Evil", "", ""),
            Plugin::new("broken", PathBuf::from("/p/docker-broken"))
                .invalid(PluginError::new("bad schema")),
        ];

        let mut root = add_plugin_command_stubs(root, &plugins);
        let names: Vec<&str> = root.get_subcommands().map(|c| c.get_name()).collect();
        assert_eq!(names, vec!["version", "hello"]);

        let hello = root.find_subcommand("hello").unwrap();
        assert_eq!(hello.get_about().unwrap().to_string(), "Say hello (Acme, v1)");

        let help = root.render_long_help().to_string();
        assert!(help.contains("Invalid Plugins:"), "{help}");
        assert!(help.contains("bad schema"), "{help}");
    }

    #[test]
    fn test_invalid_plugin_never_gets_a_stub() {
        let root = add_plugin_command_stubs(
            Command::new("plughost"),
            &[Plugin::new("broken", PathBuf::from("/p/docker-broken"))
                .invalid(PluginError::new("bad schema"))],
        );
        assert!(root.find_subcommand("broken").is_none());
    }

    #[test]
    fn test_stub_accepts_arbitrary_args() {
        let root = add_plugin_command_stubs(
            Command::new("plughost"),
            &[valid("hello", "Acme", "", "")],
        );
        let matches = root
            .try_get_matches_from(["plughost", "hello", "--whatever", "x"])
            .unwrap();
        assert_eq!(matches.subcommand_name(), Some("hello"));
    }
}
