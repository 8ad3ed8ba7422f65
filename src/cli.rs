//! Minimal CLI: one subcommand per generator, plus `all` for the build
//! driver.

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::Result;
use clap::{Args, Parser, Subcommand};

use crate::console;
use crate::generators;

// ————————————————————————————————————————————————————————————————————————————
// TYPES
// ————————————————————————————————————————————————————————————————————————————

/// parse C struct declarations out of the renderer sources and emit the
/// derived .h/.cpp artifacts
#[derive(Parser, Debug)]
pub struct CommandLineInterface {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// generate INI save/load functions from the ConfigData sections
    Config(ConfigJob),
    /// generate the OnDestroy() COM release sequence
    Ondestroy(OndestroyJob),
    /// generate the descriptor heap layout header
    Descriptors(DescriptorsJob),
    /// generate pipeline creation code for every shader variant
    Pipelines(PipelinesJob),
    /// generate cJSON (de)serialization for the scene structs
    SceneJson(SceneJsonJob),
    /// run every generator with its default paths
    All(AllJob),
}

#[derive(Args, Debug, Clone)]
struct CommonSettings {
    /// force regeneration even if the output is up-to-date
    #[arg(long, short, default_value_t = false)]
    force: bool,

    /// print verbose output
    #[arg(long, short, default_value_t = false)]
    verbose: bool,
}

#[derive(Args, Debug)]
struct ConfigJob {
    /// input config header
    #[arg(long, short, default_value = "src/config_ini_io.h")]
    input: PathBuf,

    /// output header
    #[arg(long, short, default_value = "src/generated/config_functions.h")]
    out: PathBuf,

    #[command(flatten)]
    common: CommonSettings,
}

#[derive(Args, Debug)]
struct OndestroyJob {
    /// input renderer source
    #[arg(long, short, default_value = "src/renderer_dx12.cpp")]
    input: PathBuf,

    /// output path
    #[arg(long, short, default_value = "src/generated/OnDestroy_generated.cpp")]
    out: PathBuf,

    #[command(flatten)]
    common: CommonSettings,
}

#[derive(Args, Debug)]
struct DescriptorsJob {
    /// input renderer source
    #[arg(long, short, default_value = "src/renderer_dx12.cpp")]
    input: PathBuf,

    /// output header
    #[arg(long, short, default_value = "src/generated/descriptor_layout.h")]
    out: PathBuf,

    #[command(flatten)]
    common: CommonSettings,
}

#[derive(Args, Debug)]
struct PipelinesJob {
    /// output .inl file
    #[arg(long, short, default_value = "src/generated/pipeline_creation.inl")]
    out: PathBuf,

    #[command(flatten)]
    common: CommonSettings,
}

#[derive(Args, Debug)]
struct SceneJsonJob {
    /// input scene data header
    #[arg(long, short, default_value = "src/scene_data.h")]
    input: PathBuf,

    /// output path
    #[arg(long, short, default_value = "src/generated/scene_json.cpp")]
    out: PathBuf,

    #[command(flatten)]
    common: CommonSettings,
}

#[derive(Args, Debug)]
struct AllJob {
    /// project root holding the src/ tree
    #[arg(long, default_value = ".")]
    root: PathBuf,

    #[command(flatten)]
    common: CommonSettings,
}

// ————————————————————————————————————————————————————————————————————————————
// IMPLEMENTATION
// ————————————————————————————————————————————————————————————————————————————

impl CommandLineInterface {
    pub fn load() -> Self {
        Self::parse()
    }

    pub fn run(&self) -> ExitCode {
        match self.dispatch() {
            Ok(()) => ExitCode::SUCCESS,
            Err(error) => {
                console::error(format!("{error:#}"));
                ExitCode::FAILURE
            }
        }
    }

    fn dispatch(&self) -> Result<()> {
        match &self.cmd {
            Command::Config(job) => {
                console::set_verbose(job.common.verbose);
                generators::config::generate(&job.input, &job.out, job.common.force)?;
            }
            Command::Ondestroy(job) => {
                console::set_verbose(job.common.verbose);
                generators::ondestroy::generate(&job.input, &job.out, job.common.force)?;
            }
            Command::Descriptors(job) => {
                console::set_verbose(job.common.verbose);
                generators::descriptors::generate(&job.input, &job.out, job.common.force)?;
            }
            Command::Pipelines(job) => {
                console::set_verbose(job.common.verbose);
                generators::pipelines::generate(&job.out, job.common.force)?;
            }
            Command::SceneJson(job) => {
                console::set_verbose(job.common.verbose);
                generators::scene_json::generate(&job.input, &job.out, job.common.force)?;
            }
            Command::All(job) => {
                console::set_verbose(job.common.verbose);
                run_all(&job.root, job.common.force)?;
            }
        }
        Ok(())
    }
}

// ————————————————————————————————————————————————————————————————————————————
// INTERNAL HELPERS
// ————————————————————————————————————————————————————————————————————————————

fn run_all(root: &Path, force: bool) -> Result<()> {
    generators::config::generate(
        &root.join("src/config_ini_io.h"),
        &root.join("src/generated/config_functions.h"),
        force,
    )?;
    generators::ondestroy::generate(
        &root.join("src/renderer_dx12.cpp"),
        &root.join("src/generated/OnDestroy_generated.cpp"),
        force,
    )?;
    generators::descriptors::generate(
        &root.join("src/renderer_dx12.cpp"),
        &root.join("src/generated/descriptor_layout.h"),
        force,
    )?;
    generators::pipelines::generate(&root.join("src/generated/pipeline_creation.inl"), force)?;
    generators::scene_json::generate(
        &root.join("src/scene_data.h"),
        &root.join("src/generated/scene_json.cpp"),
        force,
    )?;
    Ok(())
}
