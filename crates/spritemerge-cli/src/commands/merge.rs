//! Merge command implementation
//!
//! Collects images from a directory, composes them into a strip atlas and
//! writes `<unix-millis>.png` to the output directory.

use anyhow::{Context, Result};
use colored::Colorize;
use serde::Serialize;
use spritemerge_backend_atlas::{
    write_atlas, write_metadata, AtlasComposer, CellSize, Composition, LocalDiskWriter,
    MemoryWriter, OutputWriter, PngConfig, WrittenFile,
};
use spritemerge_spec::{validate_config, CellFloor, FloorPolicy, MergeConfig};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use super::reporting::{print_validation_errors, print_validation_warnings};
use crate::collector::{DirectoryCollector, SkippedEntry, SourceCollector};
use crate::floor_state::{floor_state_path, load_floor, FloorState};
use crate::settings::{resolve_config, resolve_output_dir, Overrides};

/// Exit code when there was nothing to merge.
pub const EXIT_NOTHING_TO_MERGE: u8 = 2;

/// Options for one merge invocation.
#[derive(Debug, Clone, Default)]
pub struct MergeOptions {
    pub input_dir: String,
    pub config_path: Option<String>,
    pub overrides: Overrides,
    pub recursive: bool,
    pub extensions: Vec<String>,
    pub dry_run: bool,
    pub json: bool,
}

/// What a successful merge produced.
#[derive(Debug)]
pub struct MergeSummary {
    pub sources: Vec<String>,
    pub skipped: Vec<SkippedEntry>,
    pub cell: CellSize,
    pub atlas_size: (u32, u32),
    pub written: WrittenFile,
    pub metadata_path: Option<PathBuf>,
    /// Floor state file updated by an accumulating merge.
    pub floor_state: Option<PathBuf>,
}

/// Result of [`execute`].
#[derive(Debug)]
pub enum MergeOutcome {
    /// An atlas was written.
    Written(MergeSummary),
    /// No eligible sources; nothing was composed or written.
    NothingToMerge {
        advisory: String,
        skipped: Vec<SkippedEntry>,
    },
}

/// Machine-readable merge report.
#[derive(Debug, Serialize)]
pub struct MergeReport {
    pub ok: bool,
    pub input_dir: String,
    pub dry_run: bool,
    pub axis: String,
    pub alignment: String,
    pub sources: Vec<String>,
    pub skipped: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub floor_state: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hash: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bytes: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub atlas_size: Option<[u32; 2]>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cell_size: Option<[u32; 2]>,
    pub warnings: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl MergeReport {
    fn new(options: &MergeOptions, config: &MergeConfig) -> Self {
        Self {
            ok: false,
            input_dir: options.input_dir.clone(),
            dry_run: options.dry_run,
            axis: config.atlas.axis.to_string(),
            alignment: config.atlas.alignment.to_string(),
            sources: Vec::new(),
            skipped: Vec::new(),
            output: None,
            metadata: None,
            floor_state: None,
            hash: None,
            bytes: None,
            atlas_size: None,
            cell_size: None,
            warnings: Vec::new(),
            error: None,
        }
    }

    fn record(&mut self, outcome: &MergeOutcome) {
        match outcome {
            MergeOutcome::Written(summary) => {
                self.ok = true;
                self.sources = summary.sources.clone();
                self.skipped = skipped_paths(&summary.skipped);
                self.output = Some(summary.written.path.display().to_string());
                self.metadata = summary
                    .metadata_path
                    .as_ref()
                    .map(|p| p.display().to_string());
                self.floor_state = summary
                    .floor_state
                    .as_ref()
                    .map(|p| p.display().to_string());
                self.hash = Some(summary.written.hash.clone());
                self.bytes = Some(summary.written.bytes);
                self.atlas_size = Some([summary.atlas_size.0, summary.atlas_size.1]);
                self.cell_size = Some([summary.cell.width, summary.cell.height]);
            }
            MergeOutcome::NothingToMerge { advisory, skipped } => {
                self.skipped = skipped_paths(skipped);
                self.warnings.push(advisory.clone());
            }
        }
    }
}

fn skipped_paths(skipped: &[SkippedEntry]) -> Vec<String> {
    skipped.iter().map(|s| s.path.display().to_string()).collect()
}

/// Collect, compose and write one atlas.
///
/// An empty collection is reported as [`MergeOutcome::NothingToMerge`]
/// before anything is composed, so no output directory is created.
///
/// Under [`FloorPolicy::Accumulate`] the composer starts from the floor
/// stored in `out_dir` and the raised floor is written back afterwards.
/// The atlas is written first; if a later file fails, the files already
/// written by this run are removed again.
pub fn execute<C, W>(
    collector: &mut C,
    config: &MergeConfig,
    out_dir: &Path,
    writer: &W,
    timestamp_millis: i64,
) -> Result<MergeOutcome>
where
    C: SourceCollector + ?Sized,
    W: OutputWriter + ?Sized,
{
    let collection = collector.collect().context("Failed to collect source images")?;
    if let Some(advisory) = collection.advisory() {
        return Ok(MergeOutcome::NothingToMerge {
            advisory,
            skipped: collection.skipped,
        });
    }

    let accumulate = config.atlas.floor_policy == FloorPolicy::Accumulate;
    let mut composer = AtlasComposer::new(config.atlas);
    if accumulate {
        if let Some(stored) = load_floor(out_dir)? {
            tracing::debug!(
                width = stored.width,
                height = stored.height,
                "loaded accumulated floor"
            );
            composer.raise_floor(stored);
        }
    }
    let composition = composer
        .compose(&collection.sources)
        .context("Failed to compose atlas")?;

    let written = write_atlas(writer, out_dir, &composition.atlas, timestamp_millis)
        .context("Failed to write atlas")?;
    let mut produced = vec![written.path.clone()];

    let floor = accumulate.then(|| composer.floor());
    let companions = write_companions(
        writer,
        out_dir,
        config,
        &composition,
        floor,
        timestamp_millis,
        &mut produced,
    );

    let (metadata_path, floor_state) = match companions {
        Ok(paths) => paths,
        Err(e) => {
            discard(writer, &produced);
            return Err(e);
        }
    };

    Ok(MergeOutcome::Written(MergeSummary {
        sources: collection.sources.iter().map(|s| s.name.clone()).collect(),
        skipped: collection.skipped,
        cell: composition.cell,
        atlas_size: composition.atlas.dimensions(),
        written,
        metadata_path,
        floor_state,
    }))
}

/// Write the metadata sidecar and the accumulated floor, when enabled.
///
/// Paths of newly created outputs are pushed onto `produced`.
fn write_companions<W: OutputWriter + ?Sized>(
    writer: &W,
    out_dir: &Path,
    config: &MergeConfig,
    composition: &Composition,
    floor: Option<CellFloor>,
    timestamp_millis: i64,
    produced: &mut Vec<PathBuf>,
) -> Result<(Option<PathBuf>, Option<PathBuf>)> {
    let metadata_path = if config.output.metadata {
        let path = write_metadata(writer, out_dir, &composition.metadata(), timestamp_millis)
            .context("Failed to write atlas metadata")?;
        produced.push(path.clone());
        Some(path)
    } else {
        None
    };

    let floor_path = match floor {
        Some(floor) => {
            let path = floor_state_path(out_dir);
            let bytes = FloorState::new(floor).to_json_pretty()?;
            writer
                .write_bytes(&bytes, &path)
                .context("Failed to store accumulated floor")?;
            Some(path)
        }
        None => None,
    };

    Ok((metadata_path, floor_path))
}

/// Remove files written earlier in a run that then failed.
fn discard<W: OutputWriter + ?Sized>(writer: &W, paths: &[PathBuf]) {
    for path in paths {
        match writer.remove_file(path) {
            Ok(()) => tracing::debug!(path = %path.display(), "removed partial output"),
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "failed to remove partial output")
            }
        }
    }
}

/// Run the merge command
pub fn run(options: &MergeOptions) -> Result<ExitCode> {
    let config = resolve_config(options.config_path.as_deref(), &options.overrides)?;

    let validation = validate_config(&config);
    if !validation.is_ok() {
        if options.json {
            let mut report = MergeReport::new(options, &config);
            report.error = Some(
                validation
                    .errors
                    .iter()
                    .map(|e| e.to_string())
                    .collect::<Vec<_>>()
                    .join("; "),
            );
            println!("{}", serde_json::to_string_pretty(&report)?);
        } else {
            print_validation_errors(&validation.errors);
        }
        return Ok(ExitCode::from(1));
    }

    let out_dir = resolve_output_dir(&config)?;
    let mut collector = DirectoryCollector::new(&options.input_dir)
        .recursive(options.recursive)
        .extensions(&options.extensions);
    let png = PngConfig::from_preset(config.output.compression);
    let timestamp = chrono::Utc::now().timestamp_millis();

    if !options.json {
        print_validation_warnings(&validation.warnings);
        println!("{} {}", "Input:".blue().bold(), options.input_dir);
        println!(
            "{} {}{}",
            "Output:".blue().bold(),
            out_dir.display(),
            if options.dry_run { " (dry run)" } else { "" }
        );
        println!(
            "{} {} / {}",
            "Layout:".blue().bold(),
            config.atlas.axis,
            config.atlas.alignment
        );
    }

    let result = if options.dry_run {
        execute(
            &mut collector,
            &config,
            &out_dir,
            &MemoryWriter::new(png),
            timestamp,
        )
    } else {
        execute(
            &mut collector,
            &config,
            &out_dir,
            &LocalDiskWriter::new(png),
            timestamp,
        )
    };

    if options.json {
        let mut report = MergeReport::new(options, &config);
        report
            .warnings
            .extend(validation.warnings.iter().map(|w| w.to_string()));
        let code = match &result {
            Ok(outcome) => {
                report.record(outcome);
                exit_code_for(outcome)
            }
            Err(e) => {
                report.error = Some(format!("{:#}", e));
                ExitCode::from(1)
            }
        };
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(code);
    }

    let outcome = result?;
    print_outcome(&outcome, options.dry_run);
    Ok(exit_code_for(&outcome))
}

fn exit_code_for(outcome: &MergeOutcome) -> ExitCode {
    match outcome {
        MergeOutcome::Written(_) => ExitCode::SUCCESS,
        MergeOutcome::NothingToMerge { .. } => ExitCode::from(EXIT_NOTHING_TO_MERGE),
    }
}

fn print_outcome(outcome: &MergeOutcome, dry_run: bool) {
    match outcome {
        MergeOutcome::Written(summary) => {
            for skipped in &summary.skipped {
                println!(
                    "  {} skipped {}: {}",
                    "!".yellow(),
                    skipped.path.display(),
                    skipped.reason
                );
            }
            println!(
                "\n{} merged {} image(s) into {}x{} (cell {}x{})",
                if dry_run {
                    "DRY RUN".yellow().bold()
                } else {
                    "SUCCESS".green().bold()
                },
                summary.sources.len(),
                summary.atlas_size.0,
                summary.atlas_size.1,
                summary.cell.width,
                summary.cell.height
            );
            println!(
                "  {} {} ({} bytes)",
                "->".dimmed(),
                summary.written.path.display(),
                summary.written.bytes
            );
            if let Some(ref metadata) = summary.metadata_path {
                println!("  {} {}", "->".dimmed(), metadata.display());
            }
            if let Some(ref floor_state) = summary.floor_state {
                println!("  {} {} (floor)", "->".dimmed(), floor_state.display());
            }
            println!("  {} {}", "blake3".dimmed(), summary.written.hash.dimmed());
        }
        MergeOutcome::NothingToMerge { advisory, skipped } => {
            for entry in skipped {
                println!(
                    "  {} skipped {}: {}",
                    "!".yellow(),
                    entry.path.display(),
                    entry.reason
                );
            }
            println!("\n{} {}", "WARNING".yellow().bold(), advisory);
        }
    }
}
