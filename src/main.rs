//! stub-packer command line: pack a manifest into an executable, or inspect one.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use stub_packer::{
    config::LogFormat,
    format::ArtifactReader,
    infrastructure::{
        compiler::{CommandCompiler, PassthroughCompiler},
        manifest::Manifest,
        sink::{FileSink, MemorySink},
    },
    ports::{Compiler, OutputSink},
    use_cases::{AssembleExecutableUseCase, AssemblyReport, AssemblyRequest},
    Config,
};

#[derive(Parser)]
#[command(name = "stub-packer")]
#[command(about = "Assemble a runtime stub and its payload into one executable", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Assemble the artifact described by a manifest
    Pack {
        /// Manifest file (.toml, .json, .yaml)
        #[arg(short, long)]
        manifest: PathBuf,
        /// Override the output path
        #[arg(short, long)]
        output: Option<PathBuf>,
        /// Override the stub path
        #[arg(short, long)]
        stub: Option<PathBuf>,
        /// Compile command for code entries
        #[arg(short, long, conflicts_with = "no_compile")]
        compiler: Option<String>,
        /// Store code entries as given
        #[arg(long)]
        no_compile: bool,
        /// Assemble in memory without writing the output
        #[arg(long)]
        dry_run: bool,
        /// Print the report as JSON
        #[arg(long)]
        json: bool,
    },
    /// Show the box layout of an assembled artifact
    Inspect {
        artifact: PathBuf,
        /// Print the layout as JSON
        #[arg(long)]
        json: bool,
    },
}

fn init_tracing(config: &Config) {
    let filter = EnvFilter::try_new(&config.log_filter).unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr);

    match config.log_format {
        LogFormat::Json => builder.json().init(),
        LogFormat::Text => builder.init(),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = Config::from_env();
    init_tracing(&config);
    config.validate().map_err(anyhow::Error::msg)?;

    match cli.command {
        Commands::Pack {
            manifest,
            output,
            stub,
            compiler,
            no_compile,
            dry_run,
            json,
        } => {
            let options = PackOptions {
                manifest,
                output,
                stub,
                compiler,
                no_compile,
                dry_run,
                json,
            };
            pack(&config, options).await
        }
        Commands::Inspect { artifact, json } => inspect(artifact, json).await,
    }
}

struct PackOptions {
    manifest: PathBuf,
    output: Option<PathBuf>,
    stub: Option<PathBuf>,
    compiler: Option<String>,
    no_compile: bool,
    dry_run: bool,
    json: bool,
}

fn select_compiler(
    config: &Config,
    options: &PackOptions,
    manifest: &Manifest,
) -> Result<Arc<dyn Compiler>> {
    if options.no_compile {
        return Ok(Arc::new(PassthroughCompiler));
    }

    let command = options
        .compiler
        .clone()
        .or_else(|| manifest.compiler.clone())
        .or_else(|| config.compiler_command.clone());

    match command {
        Some(command) => {
            let compiler = CommandCompiler::from_command_line(&command)
                .with_context(|| format!("Invalid compile command: {:?}", command))?;
            info!(
                program = compiler.program(),
                args = ?compiler.args(),
                "Using external compiler"
            );
            Ok(Arc::new(compiler))
        }
        None => {
            warn!("No compiler configured; code entries are stored as given");
            Ok(Arc::new(PassthroughCompiler))
        }
    }
}

async fn pack(config: &Config, options: PackOptions) -> Result<()> {
    let mut manifest = Manifest::load(&options.manifest)
        .await
        .with_context(|| format!("Failed to load manifest: {:?}", options.manifest))?;
    if let Some(output) = &options.output {
        manifest.output = output.clone();
    }
    if let Some(stub) = &options.stub {
        manifest.stub = stub.clone();
    }

    let compiler = select_compiler(config, &options, &manifest)?;
    let request = manifest
        .into_request()
        .await
        .context("Failed to build assembly request")?;
    let output_path = request.target.output_path.clone();

    let use_case =
        AssembleExecutableUseCase::new(compiler).with_copy_buffer_size(config.copy_buffer_size);

    let report = if options.dry_run {
        let mut sink = MemorySink::new();
        run(&use_case, request, &mut sink).await?
    } else {
        if let Some(parent) = output_path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent)
                .await
                .with_context(|| format!("Failed to create output directory: {:?}", parent))?;
        }
        let mut sink = FileSink::for_target(&request.target, config.durable_writes)
            .await
            .with_context(|| format!("Failed to create output: {:?}", output_path))?;
        let report = run(&use_case, request, &mut sink).await?;
        info!(output = ?output_path, bytes = sink.bytes_written(), "Artifact written");
        make_executable(&output_path).await?;
        report
    };

    print_report(&report, options.json, options.dry_run.then_some("(dry run)"))
}

async fn run(
    use_case: &AssembleExecutableUseCase,
    request: AssemblyRequest,
    sink: &mut dyn OutputSink,
) -> Result<AssemblyReport> {
    use_case
        .execute(request, sink)
        .await
        .context("Assembly failed")
}

#[cfg(unix)]
async fn make_executable(path: &std::path::Path) -> Result<()> {
    use std::os::unix::fs::PermissionsExt;

    let mut permissions = tokio::fs::metadata(path).await?.permissions();
    permissions.set_mode(permissions.mode() | 0o111);
    tokio::fs::set_permissions(path, permissions)
        .await
        .with_context(|| format!("Failed to mark {:?} executable", path))
}

#[cfg(not(unix))]
async fn make_executable(_path: &std::path::Path) -> Result<()> {
    Ok(())
}

fn print_report(report: &AssemblyReport, json: bool, note: Option<&str>) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(report)?);
        return Ok(());
    }

    for segment in &report.segments {
        println!(
            "{:>12} {:>10}  {}",
            segment.offset, segment.length, segment.kind
        );
    }
    for (snapshot, kind, extent) in report.vfs.extents() {
        println!(
            "{:>12} {:>10}  vfs {} ({})",
            extent.offset, extent.length, snapshot, kind
        );
    }
    println!(
        "total {} bytes, {} snapshots, sha256 {} {}",
        report.total_bytes,
        report.vfs.snapshot_count(),
        report.sha256,
        note.unwrap_or_default()
    );
    Ok(())
}

async fn inspect(artifact: PathBuf, json: bool) -> Result<()> {
    let data = tokio::fs::read(&artifact)
        .await
        .with_context(|| format!("Failed to read artifact: {:?}", artifact))?;
    let reader = ArtifactReader::from_slice(&data)
        .with_context(|| format!("Not an assembled artifact: {:?}", artifact))?;
    let layout = reader.layout();
    let options = reader.options()?;

    if json {
        let value = serde_json::json!({
            "layout": layout,
            "options": options,
        });
        println!("{}", serde_json::to_string_pretty(&value)?);
        return Ok(());
    }

    println!("stub region   @ 0 ({} bytes)", reader.stub_region().len());
    println!("options box   @ {} ({} bytes)", layout.options_offset, layout.options_length);
    println!("payload       @ {} ({} bytes)", layout.payload_offset, reader.payload().len());
    println!("prelude box   @ {} ({} bytes)", layout.prelude_offset, layout.prelude_length);
    println!("total size    {}", layout.total_size);
    for option in options {
        println!("option        {}", option);
    }
    Ok(())
}
