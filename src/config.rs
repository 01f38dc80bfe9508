//! Build configuration
//!
//! The pipeline parameters default to the values baked into the original
//! build script, so a bare `hoist` invocation behaves exactly like it.
//! An optional `Hoist.toml` in the working directory and CLI flags layer on
//! top: flag > manifest > builtin default.

use anyhow::{Context, Result, bail};
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Builtin defaults, matching the original build script's constants.
pub const DEFAULT_IMAGE: &str = "get-system-info:build";
pub const DEFAULT_CONTAINER: &str = "get-system-info-extract";
pub const DEFAULT_BUILD_FILE: &str = "Dockerfile.build";
pub const DEFAULT_ARTIFACT: &str = "/app/target/release/get-system-info";
pub const DEFAULT_DEST: &str = "./get-system-info";

/// Manifest file name looked up in the working directory.
pub const MANIFEST_NAME: &str = "Hoist.toml";

/// Resolved parameters for one pipeline run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildConfig {
    /// Image tag the build step produces.
    pub image: String,
    /// Name of the throwaway container the artifact is copied out of.
    pub container: String,
    /// Build-definition file passed to the image build.
    pub build_file: PathBuf,
    /// Artifact path inside the container filesystem.
    pub artifact: String,
    /// Destination path on the host. Overwritten if it exists.
    pub dest: PathBuf,
}

impl Default for BuildConfig {
    fn default() -> Self {
        Self {
            image: DEFAULT_IMAGE.to_string(),
            container: DEFAULT_CONTAINER.to_string(),
            build_file: PathBuf::from(DEFAULT_BUILD_FILE),
            artifact: DEFAULT_ARTIFACT.to_string(),
            dest: PathBuf::from(DEFAULT_DEST),
        }
    }
}

/// Optional overrides from `Hoist.toml`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Manifest {
    pub image: Option<String>,
    pub container: Option<String>,
    pub build_file: Option<PathBuf>,
    pub artifact: Option<String>,
    pub dest: Option<PathBuf>,
}

impl Manifest {
    /// Load the manifest from an explicit path.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read manifest: {}", path.display()))?;
        toml::from_str(&content)
            .with_context(|| format!("failed to parse manifest: {}", path.display()))
    }

    /// Load `Hoist.toml` from a directory if it exists.
    pub fn load_from_dir(dir: &Path) -> Result<Option<Self>> {
        let path = dir.join(MANIFEST_NAME);
        if !path.exists() {
            return Ok(None);
        }
        Self::load(&path).map(Some)
    }
}

/// Per-parameter overrides from CLI flags, highest precedence.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub image: Option<String>,
    pub container: Option<String>,
    pub build_file: Option<PathBuf>,
    pub artifact: Option<String>,
    pub dest: Option<PathBuf>,
}

impl BuildConfig {
    /// Layer a manifest over the builtin defaults.
    pub fn with_manifest(self, manifest: Manifest) -> Self {
        self.merge(
            manifest.image,
            manifest.container,
            manifest.build_file,
            manifest.artifact,
            manifest.dest,
        )
    }

    /// Layer CLI flags over whatever is resolved so far.
    pub fn with_overrides(self, overrides: Overrides) -> Self {
        self.merge(
            overrides.image,
            overrides.container,
            overrides.build_file,
            overrides.artifact,
            overrides.dest,
        )
    }

    fn merge(
        mut self,
        image: Option<String>,
        container: Option<String>,
        build_file: Option<PathBuf>,
        artifact: Option<String>,
        dest: Option<PathBuf>,
    ) -> Self {
        if let Some(image) = image {
            self.image = image;
        }
        if let Some(container) = container {
            self.container = container;
        }
        if let Some(build_file) = build_file {
            self.build_file = build_file;
        }
        if let Some(artifact) = artifact {
            self.artifact = artifact;
        }
        if let Some(dest) = dest {
            self.dest = dest;
        }
        self
    }

    /// Check identifiers before anything is spawned.
    ///
    /// Rejecting bad names here gives one clear message instead of whatever
    /// the engine prints, and keeps a malformed name from ever reaching an
    /// argv.
    pub fn validate(&self) -> Result<()> {
        validate_container_name(&self.container)?;
        validate_image_ref(&self.image)?;
        if self.artifact.is_empty() {
            bail!("artifact path cannot be empty");
        }
        Ok(())
    }
}

/// Validate a container name: `[a-zA-Z0-9][a-zA-Z0-9_.-]*`.
pub fn validate_container_name(name: &str) -> Result<()> {
    if name.is_empty() {
        bail!("container name cannot be empty");
    }

    let mut chars = name.chars();
    let first = chars.next().unwrap();
    if !first.is_ascii_alphanumeric() {
        bail!(
            "invalid container name '{}': must start with an alphanumeric character",
            name
        );
    }
    if !chars.all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '.' || c == '-') {
        bail!(
            "invalid container name '{}': only alphanumeric characters, '_', '.' and '-' are allowed",
            name
        );
    }

    Ok(())
}

/// Validate an image reference: slash-separated name components plus an
/// optional `:tag`.
pub fn validate_image_ref(image: &str) -> Result<()> {
    if image.is_empty() {
        bail!("image reference cannot be empty");
    }

    let (name, tag) = match image.rsplit_once(':') {
        // A colon inside a path component would be a registry port; tags
        // never contain '/', so a '/' after the colon means no tag.
        Some((name, tag)) if !tag.contains('/') => (name, Some(tag)),
        _ => (image, None),
    };

    if name.is_empty() {
        bail!("invalid image reference '{}': empty name", image);
    }
    for (i, component) in name.split('/').enumerate() {
        if component.is_empty() {
            bail!("invalid image reference '{}': empty path component", image);
        }
        // The first component may be a registry host with a port, as in
        // localhost:5000/app.
        let (base, port) = match component.split_once(':') {
            Some((host, port)) if i == 0 => (host, Some(port)),
            _ => (component, None),
        };
        if let Some(port) = port {
            if port.is_empty() || !port.chars().all(|c| c.is_ascii_digit()) {
                bail!(
                    "invalid image reference '{}': registry port must be numeric",
                    image
                );
            }
        }
        if base.is_empty()
            || !base
                .chars()
                .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_' || c == '.' || c == '-')
        {
            bail!(
                "invalid image reference '{}': name components may only contain lowercase letters, digits, '_', '.' and '-'",
                image
            );
        }
    }

    if let Some(tag) = tag {
        if tag.is_empty() {
            bail!("invalid image reference '{}': empty tag", image);
        }
        if !tag
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '.' || c == '-')
        {
            bail!(
                "invalid image reference '{}': tag may only contain alphanumeric characters, '_', '.' and '-'",
                image
            );
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    // ==================== Defaults ====================

    #[test]
    fn test_defaults_match_script_constants() {
        let config = BuildConfig::default();
        assert_eq!(config.image, "get-system-info:build");
        assert_eq!(config.container, "get-system-info-extract");
        assert_eq!(config.build_file, PathBuf::from("Dockerfile.build"));
        assert_eq!(config.artifact, "/app/target/release/get-system-info");
        assert_eq!(config.dest, PathBuf::from("./get-system-info"));
    }

    #[test]
    fn test_defaults_validate() {
        assert!(BuildConfig::default().validate().is_ok());
    }

    // ==================== Container Name Validation ====================

    #[test]
    fn test_valid_container_names() {
        assert!(validate_container_name("extract").is_ok());
        assert!(validate_container_name("get-system-info-extract").is_ok());
        assert!(validate_container_name("build_1").is_ok());
        assert!(validate_container_name("a").is_ok());
        assert!(validate_container_name("0abc").is_ok());
        assert!(validate_container_name("a.b-c_d").is_ok());
    }

    #[test]
    fn test_empty_container_name() {
        let err = validate_container_name("").unwrap_err();
        assert!(err.to_string().contains("cannot be empty"));
    }

    #[test]
    fn test_container_name_bad_first_char() {
        assert!(validate_container_name("-extract").is_err());
        assert!(validate_container_name(".extract").is_err());
        assert!(validate_container_name("_extract").is_err());
    }

    #[test]
    fn test_container_name_special_characters_rejected() {
        assert!(validate_container_name("ex tract").is_err());
        assert!(validate_container_name("ex/tract").is_err());
        assert!(validate_container_name("ex:tract").is_err());
        assert!(validate_container_name("ex@tract").is_err());
        assert!(validate_container_name("ex\ttract").is_err());
        assert!(validate_container_name("ex\ntract").is_err());
    }

    // ==================== Image Reference Validation ====================

    #[test]
    fn test_valid_image_refs() {
        assert!(validate_image_ref("get-system-info:build").is_ok());
        assert!(validate_image_ref("alpine").is_ok());
        assert!(validate_image_ref("library/alpine:3.20").is_ok());
        assert!(validate_image_ref("registry.example.com/team/app:v1.2.3").is_ok());
        assert!(validate_image_ref("app:latest").is_ok());
    }

    #[test]
    fn test_image_ref_registry_with_port() {
        assert!(validate_image_ref("localhost:5000/app:v1").is_ok());
        assert!(validate_image_ref("localhost:5000/app").is_ok());
        assert!(validate_image_ref("registry.example.com:8443/team/app:v1").is_ok());
    }

    #[test]
    fn test_image_ref_rejects_bad_port() {
        assert!(validate_image_ref("localhost:50x0/app").is_err());
        assert!(validate_image_ref("localhost:/app").is_err());
        assert!(validate_image_ref(":5000/app").is_err());
        // A colon only means a port in the registry component.
        assert!(validate_image_ref("team/app:5000/app:v1").is_err());
    }

    #[test]
    fn test_image_ref_rejects_uppercase_name() {
        assert!(validate_image_ref("GetSystemInfo:build").is_err());
    }

    #[test]
    fn test_image_ref_rejects_empty_parts() {
        assert!(validate_image_ref("").is_err());
        assert!(validate_image_ref(":build").is_err());
        assert!(validate_image_ref("app:").is_err());
        assert!(validate_image_ref("team//app").is_err());
    }

    #[test]
    fn test_image_ref_rejects_bad_tag() {
        assert!(validate_image_ref("app:bad tag").is_err());
        assert!(validate_image_ref("app:bad/tag").is_err());
    }

    #[test]
    fn test_image_ref_uppercase_tag_allowed() {
        assert!(validate_image_ref("app:V1").is_ok());
    }

    // ==================== Manifest ====================

    fn write_manifest(dir: &Path, content: &str) -> PathBuf {
        let path = dir.join(MANIFEST_NAME);
        std::fs::write(&path, content).unwrap();
        path
    }

    #[test]
    fn test_manifest_overrides_defaults() {
        let dir = TempDir::new().unwrap();
        write_manifest(
            dir.path(),
            r#"
image = "myapp:cross"
container = "myapp-extract"
artifact = "/build/out/myapp.exe"
"#,
        );

        let manifest = Manifest::load_from_dir(dir.path()).unwrap().unwrap();
        let config = BuildConfig::default().with_manifest(manifest);

        assert_eq!(config.image, "myapp:cross");
        assert_eq!(config.container, "myapp-extract");
        assert_eq!(config.artifact, "/build/out/myapp.exe");
        // Fields the manifest leaves out keep their defaults.
        assert_eq!(config.build_file, PathBuf::from("Dockerfile.build"));
        assert_eq!(config.dest, PathBuf::from("./get-system-info"));
    }

    #[test]
    fn test_flag_beats_manifest_beats_default() {
        let manifest = Manifest {
            image: Some("manifest:img".to_string()),
            container: Some("manifest-extract".to_string()),
            ..Default::default()
        };
        let overrides = Overrides {
            image: Some("flag:img".to_string()),
            ..Default::default()
        };

        let config = BuildConfig::default()
            .with_manifest(manifest)
            .with_overrides(overrides);

        // Flag wins over the manifest value.
        assert_eq!(config.image, "flag:img");
        // Manifest wins over the builtin default.
        assert_eq!(config.container, "manifest-extract");
        // Untouched fields keep their defaults.
        assert_eq!(config.artifact, DEFAULT_ARTIFACT);
        assert_eq!(config.dest, PathBuf::from(DEFAULT_DEST));
    }

    #[test]
    fn test_empty_overrides_change_nothing() {
        let config = BuildConfig::default().with_overrides(Overrides::default());
        assert_eq!(config, BuildConfig::default());
    }

    #[test]
    fn test_manifest_missing_is_none() {
        let dir = TempDir::new().unwrap();
        assert!(Manifest::load_from_dir(dir.path()).unwrap().is_none());
    }

    #[test]
    fn test_manifest_invalid_toml_errors() {
        let dir = TempDir::new().unwrap();
        write_manifest(dir.path(), "image = ");
        let err = Manifest::load_from_dir(dir.path()).unwrap_err();
        assert!(err.to_string().contains("parse"));
    }

    #[test]
    fn test_manifest_unknown_key_rejected() {
        let dir = TempDir::new().unwrap();
        write_manifest(dir.path(), "imgae = \"typo:latest\"");
        assert!(Manifest::load_from_dir(dir.path()).is_err());
    }

    #[test]
    fn test_validate_rejects_bad_manifest_values() {
        let config = BuildConfig {
            container: "bad name".to_string(),
            ..Default::default()
        };
        assert!(config.validate().is_err());

        let config = BuildConfig {
            artifact: String::new(),
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }
}
