//! Materializing remote repositories as local tools

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use crate::config::DEFAULT_CLONE_TIMEOUT_SECS;
use crate::logging::Logger;

use super::error::{ToolError, ToolsResult};
use super::loader::{LoadedTool, ToolLoader};
use super::process::run;

/// Branch cloned when the caller does not name one
pub const DEFAULT_BRANCH: &str = "main";

/// Human name for a repository URL: its last path segment without `.git`
pub fn repository_name(url: &str) -> ToolsResult<String> {
    let trimmed = url.trim().trim_end_matches('/');
    let segment = trimmed
        .rsplit(|c| c == '/' || c == ':')
        .next()
        .unwrap_or_default();
    let name = segment.strip_suffix(".git").unwrap_or(segment);

    if name.is_empty() || name == "." || name == ".." {
        return Err(ToolError::InvalidSource(format!(
            "cannot derive a tool name from {:?}",
            url
        )));
    }
    Ok(name.to_string())
}

/// Clones repositories under the tools root and loads them
///
/// Each acquisition gets its own `<name>_<suffix>` directory so repeated
/// imports of one repository never collide. The directory is kept after a
/// successful load and removed after any failure.
pub struct ToolAcquisition {
    tools_root: PathBuf,
    git_command: Vec<String>,
    clone_timeout: Duration,
    loader: Arc<ToolLoader>,
    logger: Arc<dyn Logger>,
}

impl ToolAcquisition {
    pub fn new(tools_root: impl Into<PathBuf>, loader: Arc<ToolLoader>, logger: Arc<dyn Logger>) -> Self {
        Self {
            tools_root: tools_root.into(),
            git_command: vec!["git".to_string()],
            clone_timeout: Duration::from_secs(DEFAULT_CLONE_TIMEOUT_SECS),
            loader,
            logger,
        }
    }

    /// Replace the `git` program (argv prefix before `clone ...`)
    pub fn with_git_command(mut self, command: Vec<String>) -> Self {
        self.git_command = command;
        self
    }

    pub fn with_clone_timeout(mut self, timeout: Duration) -> Self {
        self.clone_timeout = timeout;
        self
    }

    pub fn tools_root(&self) -> &Path {
        &self.tools_root
    }

    /// A fresh, uniquely suffixed destination for `name`
    pub fn destination_for(&self, name: &str) -> PathBuf {
        let suffix = uuid::Uuid::new_v4().simple().to_string();
        self.tools_root.join(format!("{}_{}", name, &suffix[..8]))
    }

    /// Shallow-clone `repo_url` at `branch` and load it as a tool
    pub async fn acquire_from_repository(
        &self,
        repo_url: &str,
        branch: Option<&str>,
    ) -> ToolsResult<LoadedTool> {
        let name = repository_name(repo_url)?;
        let branch = branch
            .map(str::trim)
            .filter(|b| !b.is_empty())
            .unwrap_or(DEFAULT_BRANCH);

        tokio::fs::create_dir_all(&self.tools_root).await?;
        let dest = self.destination_for(&name);

        self.logger.info(&format!(
            "[ToolAcquisition] Cloning {} ({}) into {}",
            repo_url,
            branch,
            dest.display()
        ));

        if let Err(e) = self.clone_into(repo_url, branch, &dest).await {
            crate::log_error!(self.logger, "[ToolAcquisition] {}", e);
            self.remove_partial(&dest).await;
            return Err(e);
        }

        match self.loader.load_from_path(&dest, Some(&name)).await {
            Ok(tool) => Ok(tool),
            Err(e) => {
                self.logger.error(&format!(
                    "[ToolAcquisition] Cloned {} but could not load it: {}",
                    repo_url, e
                ));
                self.remove_partial(&dest).await;
                Err(e)
            }
        }
    }

    async fn clone_into(&self, repo_url: &str, branch: &str, dest: &Path) -> ToolsResult<()> {
        let dest_arg = dest.to_string_lossy();
        let args = [
            "clone",
            "--depth",
            "1",
            "--branch",
            branch,
            "--single-branch",
            "--",
            repo_url,
            &*dest_arg,
        ];

        let output = run(&self.git_command, &args, None, None, self.clone_timeout)
            .await
            .map_err(|e| ToolError::Clone {
                url: repo_url.to_string(),
                stderr: e.to_string(),
            })?;

        if output.status.success() {
            Ok(())
        } else {
            Err(ToolError::Clone {
                url: repo_url.to_string(),
                stderr: output.failure_message(),
            })
        }
    }

    async fn remove_partial(&self, dest: &Path) {
        match tokio::fs::remove_dir_all(dest).await {
            Ok(()) => self.logger.debug(&format!(
                "[ToolAcquisition] Removed {}",
                dest.display()
            )),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => self.logger.warn(&format!(
                "[ToolAcquisition] Could not remove {}: {}",
                dest.display(),
                e
            )),
        }
    }
}

impl std::fmt::Debug for ToolAcquisition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ToolAcquisition")
            .field("tools_root", &self.tools_root)
            .field("git_command", &self.git_command)
            .field("clone_timeout", &self.clone_timeout)
            .finish()
    }
}

#[cfg(all(test, unix))]
pub(crate) mod tests {
    use super::*;
    use crate::logging::NoOpLogger;
    use crate::tools::loader::tests::{write_manifest_tool, ECHO_TOOL};
    use crate::tools::manifest::MANIFEST_FILE;
    use std::fs;

    /// Fake `git` that clones the weather tool into the last argument
    pub(crate) const CLONE_OK: &str = r#"for dest; do :; done
mkdir -p "$dest"
cp "$(dirname "$0")/template/"* "$dest"/
"#;

    const CLONE_FAILS: &str = r#"for dest; do :; done
mkdir -p "$dest"
echo partial > "$dest/partial.txt"
echo "fatal: repository 'https://example.com/missing.git' not found" >&2
exit 128
"#;

    const CLONE_NOT_A_TOOL: &str = r##"for dest; do :; done
mkdir -p "$dest"
echo "# readme" > "$dest/README.md"
"##;

    const CLONE_RECORDS_ARGS: &str = r#"printf '%s\n' "$@" > "$(dirname "$0")/args.txt"
for dest; do :; done
mkdir -p "$dest"
cp "$(dirname "$0")/template/"* "$dest"/
"#;

    const CLONE_HANGS: &str = r#"for dest; do :; done
mkdir -p "$dest"
sleep 10
"#;

    /// Tools root plus a fake git script; the template dir holds the tool
    pub(crate) fn fake_git(dir: &Path, script: &str) -> Vec<String> {
        write_manifest_tool(&dir.join("template"));
        let git = dir.join("fake_git.sh");
        fs::write(&git, script).unwrap();
        vec!["sh".to_string(), git.to_string_lossy().into_owned()]
    }

    fn acquisition(root: &Path, git: Vec<String>) -> ToolAcquisition {
        let loader = Arc::new(ToolLoader::new(NoOpLogger::shared()));
        ToolAcquisition::new(root, loader, NoOpLogger::shared())
            .with_git_command(git)
            .with_clone_timeout(Duration::from_secs(10))
    }

    fn entries(dir: &Path) -> Vec<String> {
        fs::read_dir(dir)
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect()
    }

    #[test]
    fn test_repository_name() {
        assert_eq!(repository_name("https://github.com/acme/weather-tool.git").unwrap(), "weather-tool");
        assert_eq!(repository_name("https://github.com/acme/weather-tool/").unwrap(), "weather-tool");
        assert_eq!(repository_name("git@github.com:acme/clock.git").unwrap(), "clock");
        assert!(matches!(repository_name("  "), Err(ToolError::InvalidSource(_))));
        assert!(matches!(repository_name("https://github.com/.git"), Err(ToolError::InvalidSource(_))));
    }

    #[test]
    fn test_destinations_are_unique() {
        let acq = acquisition(Path::new("/tmp/tools"), vec!["git".to_string()]);
        let a = acq.destination_for("weather");
        let b = acq.destination_for("weather");
        assert_ne!(a, b);
        assert!(a.file_name().unwrap().to_string_lossy().starts_with("weather_"));
        assert_eq!(a.file_name().unwrap().len(), "weather_".len() + 8);
        assert_eq!(a.parent().unwrap(), Path::new("/tmp/tools"));
    }

    #[tokio::test]
    async fn test_clone_failure_removes_partial_directory() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().join("tools");
        let acq = acquisition(&root, fake_git(dir.path(), CLONE_FAILS));

        let err = acq
            .acquire_from_repository("https://example.com/missing.git", None)
            .await
            .unwrap_err();

        match err {
            ToolError::Clone { url, stderr } => {
                assert_eq!(url, "https://example.com/missing.git");
                assert!(stderr.contains("not found"));
            }
            other => panic!("expected clone error, got {:?}", other),
        }
        assert!(root.is_dir());
        assert!(entries(&root).is_empty());
    }

    #[tokio::test]
    async fn test_clone_timeout_removes_partial_directory() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().join("tools");
        let acq = acquisition(&root, fake_git(dir.path(), CLONE_HANGS))
            .with_clone_timeout(Duration::from_millis(300));

        let err = acq
            .acquire_from_repository("https://example.com/slow.git", Some("dev"))
            .await
            .unwrap_err();
        assert!(matches!(err, ToolError::Clone { ref stderr, .. } if stderr.contains("timed out")));
        assert!(entries(&root).is_empty());
    }

    #[tokio::test]
    async fn test_load_failure_after_clone_removes_directory() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().join("tools");
        let acq = acquisition(&root, fake_git(dir.path(), CLONE_NOT_A_TOOL));

        let err = acq
            .acquire_from_repository("https://example.com/docs.git", None)
            .await
            .unwrap_err();
        assert!(matches!(err, ToolError::Load { .. }));
        assert!(entries(&root).is_empty());
    }

    #[tokio::test]
    async fn test_url_is_passed_after_option_terminator() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().join("tools");
        let acq = acquisition(&root, fake_git(dir.path(), CLONE_RECORDS_ARGS));

        acq.acquire_from_repository("https://github.com/acme/weather-tool.git", Some("dev"))
            .await
            .unwrap();

        let recorded = fs::read_to_string(dir.path().join("args.txt")).unwrap();
        let args: Vec<&str> = recorded.lines().collect();
        assert_eq!(&args[..7], ["clone", "--depth", "1", "--branch", "dev", "--single-branch", "--"]);
        assert_eq!(args[7], "https://github.com/acme/weather-tool.git");
        assert!(args[8].starts_with(root.to_str().unwrap()));
    }

    #[tokio::test]
    async fn test_successful_acquisition_keeps_directory() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().join("tools");
        let acq = acquisition(&root, fake_git(dir.path(), CLONE_OK));

        let tool = acq
            .acquire_from_repository("https://github.com/acme/weather-tool.git", None)
            .await
            .unwrap();

        assert_eq!(tool.name, "weather-tool");
        assert!(tool.source_path.starts_with(&root));
        assert!(tool.source_path.join(MANIFEST_FILE).is_file());
        assert!(tool.source_path.join("tool.sh").is_file());
        assert_eq!(fs::read_to_string(tool.source_path.join("tool.sh")).unwrap(), ECHO_TOOL);
        assert_eq!(entries(&root).len(), 1);
    }
}
