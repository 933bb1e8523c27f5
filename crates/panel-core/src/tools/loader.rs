//! Loading tools from the local filesystem
//!
//! A path is a tool when it is:
//! - a directory containing `tool-manifest.json`
//! - a directory containing an executable `main` that prints its manifest
//!   when run as `main describe`
//! - a single `*.json` manifest file
//! - a single executable that prints its manifest when run with `describe`
//!
//! Functions are invoked as `<command...> call <function>` with the keyword
//! arguments as a JSON object on stdin. Loaded code runs with the full
//! privileges of this process; there is no sandbox.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;

use crate::config::DEFAULT_TOOL_TIMEOUT_SECS;
use crate::logging::Logger;
use crate::types::FunctionSchema;

use super::error::{ToolError, ToolsResult};
use super::manifest::{ToolManifest, DEFAULT_TOOL_VERSION, ENTRY_POINT, MANIFEST_FILE};
use super::process::{run, RunError};

/// Default deadline for `describe` and `call` subprocesses
pub const DEFAULT_INVOKE_TIMEOUT: Duration = Duration::from_secs(DEFAULT_TOOL_TIMEOUT_SECS);

/// Opaque handle to loaded tool code
#[async_trait]
pub trait ToolCallable: Send + Sync {
    /// Invoke `function` with keyword arguments
    async fn call(&self, function: &str, args: Value) -> ToolsResult<Value>;
}

/// Runs tool functions as subprocesses
#[derive(Debug, Clone)]
pub struct CommandCallable {
    argv: Vec<String>,
    cwd: PathBuf,
    timeout: Duration,
}

impl CommandCallable {
    pub fn new(argv: Vec<String>, cwd: impl Into<PathBuf>, timeout: Duration) -> Self {
        Self {
            argv,
            cwd: cwd.into(),
            timeout,
        }
    }

    /// The argv prefix functions are invoked with
    pub fn argv(&self) -> &[String] {
        &self.argv
    }
}

#[async_trait]
impl ToolCallable for CommandCallable {
    async fn call(&self, function: &str, args: Value) -> ToolsResult<Value> {
        let input = serde_json::to_vec(&args)
            .map_err(|e| ToolError::invocation(function, e.to_string()))?;

        let output = run(
            &self.argv,
            &["call", function],
            Some(&self.cwd),
            Some(input),
            self.timeout,
        )
        .await
        .map_err(|e| ToolError::invocation(function, e.to_string()))?;

        if !output.status.success() {
            return Err(ToolError::invocation(function, output.failure_message()));
        }

        let stdout = output.stdout.trim();
        Ok(serde_json::from_str(stdout).unwrap_or_else(|_| Value::String(stdout.to_string())))
    }
}

/// One exposed tool function
#[derive(Clone)]
pub struct ToolFunction {
    pub name: String,
    pub description: String,
    /// JSON Schema for the keyword arguments
    pub parameters: Value,
    callable: Arc<dyn ToolCallable>,
}

impl ToolFunction {
    pub fn new(
        name: impl Into<String>,
        description: impl Into<String>,
        parameters: Value,
        callable: Arc<dyn ToolCallable>,
    ) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            parameters,
            callable,
        }
    }

    /// Run the function
    pub async fn invoke(&self, args: Value) -> ToolsResult<Value> {
        self.callable.call(&self.name, args).await
    }
}

impl std::fmt::Debug for ToolFunction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ToolFunction")
            .field("name", &self.name)
            .field("description", &self.description)
            .finish()
    }
}

/// A tool whose functions have been extracted and are ready to call
#[derive(Clone)]
pub struct LoadedTool {
    /// Registry key and function-name prefix
    pub name: String,
    /// Name the tool gives itself; the registry key when it declares none
    pub display_name: String,
    pub description: String,
    pub version: String,
    /// Where the tool was loaded from
    pub source_path: PathBuf,
    module: Arc<dyn ToolCallable>,
    functions: Vec<ToolFunction>,
}

impl LoadedTool {
    /// Assemble a tool from an already loaded module
    ///
    /// Later functions with a duplicate name are dropped.
    pub fn new(
        name: impl Into<String>,
        source_path: impl Into<PathBuf>,
        module: Arc<dyn ToolCallable>,
        functions: Vec<ToolFunction>,
    ) -> Self {
        let mut unique: Vec<ToolFunction> = Vec::with_capacity(functions.len());
        for function in functions {
            if !unique.iter().any(|f| f.name == function.name) {
                unique.push(function);
            }
        }
        let name = name.into();
        Self {
            display_name: name.clone(),
            name,
            description: String::new(),
            version: DEFAULT_TOOL_VERSION.to_string(),
            source_path: source_path.into(),
            module,
            functions: unique,
        }
    }

    pub fn with_display_name(mut self, display_name: impl Into<String>) -> Self {
        self.display_name = display_name.into();
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_version(mut self, version: impl Into<String>) -> Self {
        self.version = version.into();
        self
    }

    /// The loaded code handle
    pub fn module(&self) -> &Arc<dyn ToolCallable> {
        &self.module
    }

    /// Functions in declaration order
    pub fn functions(&self) -> &[ToolFunction] {
        &self.functions
    }

    pub fn function(&self, name: &str) -> Option<&ToolFunction> {
        self.functions.iter().find(|f| f.name == name)
    }

    /// `<tool>_<function>` name used in the function-calling schema
    pub fn namespaced(&self, function: &ToolFunction) -> String {
        format!("{}_{}", self.name, function.name)
    }

    /// Function-calling schema entries for this tool
    pub fn schemas(&self) -> Vec<FunctionSchema> {
        self.functions
            .iter()
            .map(|f| {
                FunctionSchema::new(self.namespaced(f), f.description.clone())
                    .with_parameters(f.parameters.clone())
            })
            .collect()
    }
}

impl std::fmt::Debug for LoadedTool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoadedTool")
            .field("name", &self.name)
            .field("display_name", &self.display_name)
            .field("version", &self.version)
            .field("source_path", &self.source_path)
            .field("functions", &self.functions)
            .finish()
    }
}

/// Where a manifest came from and how to invoke the tool it describes
struct Discovered {
    manifest: ToolManifest,
    base_dir: PathBuf,
    /// Executable that produced the manifest, if any
    entry_point: Option<PathBuf>,
}

/// Turns filesystem paths into [`LoadedTool`]s
pub struct ToolLoader {
    timeout: Duration,
    logger: Arc<dyn Logger>,
}

impl ToolLoader {
    pub fn new(logger: Arc<dyn Logger>) -> Self {
        Self {
            timeout: DEFAULT_INVOKE_TIMEOUT,
            logger,
        }
    }

    /// Deadline for `describe` and every function call
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Load the tool at `path`
    ///
    /// The tool is named `name` when given, otherwise by its manifest, and
    /// failing that by the file or directory name.
    pub async fn load_from_path(&self, path: &Path, name: Option<&str>) -> ToolsResult<LoadedTool> {
        let discovered = if path.is_dir() {
            self.discover_dir(path).await?
        } else if path.is_file() {
            self.discover_file(path).await?
        } else {
            return Err(ToolError::load(path, "path does not exist"));
        };

        let argv = self.command_for(path, &discovered)?;
        let module: Arc<dyn ToolCallable> = Arc::new(CommandCallable::new(
            argv,
            discovered.base_dir.clone(),
            self.timeout,
        ));

        let manifest = discovered.manifest;
        let manifest_name = manifest.name.clone().filter(|n| !n.trim().is_empty());
        let tool_name = name
            .map(str::trim)
            .filter(|n| !n.is_empty())
            .map(str::to_string)
            .or_else(|| path_name(path))
            .or_else(|| manifest_name.clone())
            .ok_or_else(|| ToolError::load(path, "cannot derive a tool name"))?;

        let skipped = manifest.functions.len() - manifest.tagged_functions().count();
        if skipped > 0 {
            self.logger.debug(&format!(
                "[ToolLoader] Ignoring {} untagged function(s) in {}",
                skipped, tool_name
            ));
        }

        let functions: Vec<ToolFunction> = manifest
            .tagged_functions()
            .filter_map(|f| {
                f.metadata().map(|(description, parameters)| {
                    ToolFunction::new(
                        f.name.clone(),
                        description,
                        parameters.clone(),
                        Arc::clone(&module),
                    )
                })
            })
            .collect();

        if functions.is_empty() {
            self.logger.warn(&format!(
                "[ToolLoader] Tool {} declares no tagged functions",
                tool_name
            ));
        }

        let display_name = manifest_name.unwrap_or_else(|| tool_name.clone());
        let tool = LoadedTool::new(tool_name, path, module, functions)
            .with_display_name(display_name)
            .with_description(manifest.description)
            .with_version(manifest.version);

        self.logger.info(&format!(
            "[ToolLoader] Loaded tool {} ({} functions) from {}",
            tool.name,
            tool.functions().len(),
            path.display()
        ));
        Ok(tool)
    }

    async fn discover_dir(&self, dir: &Path) -> ToolsResult<Discovered> {
        let manifest_path = dir.join(MANIFEST_FILE);
        let entry_point = dir.join(ENTRY_POINT);
        let entry_point = entry_point.is_file().then_some(entry_point);

        let manifest = if manifest_path.is_file() {
            read_manifest(&manifest_path).await?
        } else if let Some(main) = &entry_point {
            self.describe(main, dir).await?
        } else {
            return Err(ToolError::load(
                dir,
                format!("no {} or {} entry point", MANIFEST_FILE, ENTRY_POINT),
            ));
        };

        Ok(Discovered {
            manifest,
            base_dir: dir.to_path_buf(),
            entry_point,
        })
    }

    async fn discover_file(&self, file: &Path) -> ToolsResult<Discovered> {
        let base_dir = file
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from("."));

        if file.extension().is_some_and(|ext| ext == "json") {
            return Ok(Discovered {
                manifest: read_manifest(file).await?,
                base_dir,
                entry_point: None,
            });
        }

        if !is_executable(file) {
            return Err(ToolError::load(
                file,
                "file is neither a JSON manifest nor an executable",
            ));
        }

        Ok(Discovered {
            manifest: self.describe(file, &base_dir).await?,
            base_dir,
            entry_point: Some(file.to_path_buf()),
        })
    }

    async fn describe(&self, executable: &Path, cwd: &Path) -> ToolsResult<ToolManifest> {
        let argv = vec![absolute(executable).to_string_lossy().into_owned()];
        let output = run(&argv, &["describe"], Some(cwd), None, self.timeout)
            .await
            .map_err(|e: RunError| ToolError::load(executable, e.to_string()))?;

        if !output.status.success() {
            return Err(ToolError::load(
                executable,
                format!("describe failed: {}", output.failure_message()),
            ));
        }

        ToolManifest::from_json(output.stdout.trim())
            .map_err(|e| ToolError::load(executable, format!("invalid manifest from describe: {}", e)))
    }

    /// Argv prefix for invoking functions
    ///
    /// A declared command wins; its program is resolved against the tool
    /// directory when a file of that name exists there.
    fn command_for(&self, path: &Path, discovered: &Discovered) -> ToolsResult<Vec<String>> {
        let mut argv = discovered.manifest.command.clone();
        if let Some(program) = argv.first_mut() {
            let candidate = discovered.base_dir.join(program.as_str());
            if Path::new(program.as_str()).is_relative() && candidate.is_file() {
                *program = absolute(&candidate).to_string_lossy().into_owned();
            }
            return Ok(argv);
        }

        let fallback = discovered
            .entry_point
            .clone()
            .or_else(|| {
                let main = discovered.base_dir.join(ENTRY_POINT);
                main.is_file().then_some(main)
            })
            .ok_or_else(|| ToolError::load(path, "manifest declares no command"))?;
        Ok(vec![absolute(&fallback).to_string_lossy().into_owned()])
    }
}

impl std::fmt::Debug for ToolLoader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ToolLoader")
            .field("timeout", &self.timeout)
            .finish()
    }
}

async fn read_manifest(path: &Path) -> ToolsResult<ToolManifest> {
    let text = tokio::fs::read_to_string(path)
        .await
        .map_err(|e| ToolError::load(path, e.to_string()))?;
    ToolManifest::from_json(&text)
        .map_err(|e| ToolError::load(path, format!("invalid manifest: {}", e)))
}

/// Registry key for a path: a directory's name, or a file's name without
/// its extension
fn path_name(path: &Path) -> Option<String> {
    let name = if path.is_dir() {
        absolute(path).file_name().map(|n| n.to_string_lossy().into_owned())
    } else {
        path.file_stem().map(|stem| stem.to_string_lossy().into_owned())
    };
    name.filter(|n| !n.is_empty())
}

fn absolute(path: &Path) -> PathBuf {
    std::path::absolute(path).unwrap_or_else(|_| path.to_path_buf())
}

#[cfg(unix)]
fn is_executable(path: &Path) -> bool {
    use std::os::unix::fs::PermissionsExt;
    std::fs::metadata(path)
        .map(|m| m.permissions().mode() & 0o111 != 0)
        .unwrap_or(false)
}

#[cfg(not(unix))]
fn is_executable(path: &Path) -> bool {
    path.extension()
        .is_some_and(|ext| ext == "exe" || ext == "bat" || ext == "cmd")
}
