use clap::Parser;
use ctcontour_core::batch::{collect_dicom_files, BatchRunner, DispatchMode, SlicePipeline};
use ctcontour_core::cli::{Cli, OutputFormat};
use ctcontour_core::output::{merge_outputs, ArtifactWriter};
use ctcontour_core::{ContourExtractor, FinalizedSlice, Result, TextReport, TruncationDetector};
use log::{error, info};
use std::process;
use std::time::Instant;

fn main() {
    let cli = Cli::parse();

    // Setup logging
    setup_logging(cli.verbose);

    if let Err(e) = run(&cli) {
        error!("{}", e);
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}

fn setup_logging(verbose: bool) {
    if verbose {
        env_logger::Builder::from_default_env()
            .filter_level(log::LevelFilter::Debug)
            .init();
    } else {
        env_logger::Builder::from_default_env()
            .filter_level(log::LevelFilter::Info)
            .init();
    }
}

fn run(cli: &Cli) -> Result<()> {
    let morphology = cli.morphology_config();
    let truncation = cli.truncation_config();
    let output = cli.output_config();
    morphology.validate()?;
    truncation.validate()?;
    output.validate()?;

    info!(
        "Source: {}\n      Destination: {}\n      Outputs: thumbs [{}], detail [{}], trunk [{}], npz [{}], csv [{}]\n      Merge: images [{}], CSV [{}]",
        cli.source.display(),
        cli.destination.display(),
        output.thumbs,
        output.detail,
        output.trunk,
        output.npz,
        output.csv,
        output.merge_images,
        output.merge_csv,
    );

    let pipeline = SlicePipeline::new(
        ContourExtractor::new(morphology),
        TruncationDetector::new(truncation.clone()),
        ArtifactWriter::new(&cli.source, &cli.destination, output.clone(), truncation),
    );

    if cli.source.is_file() {
        if let Some((slice, outputs)) = pipeline.process_or_skip(&cli.source)? {
            merge_outputs(&outputs, &output)?;
            print_report(&slice, &cli.format);
        }
        return Ok(());
    }

    let files = collect_dicom_files(&cli.source, cli.recursive)?;
    info!("Found {} DICOM files", files.len());

    let mode = if cli.single {
        DispatchMode::Single
    } else {
        DispatchMode::Parallel
    };
    let start = Instant::now();
    let report = BatchRunner::new(pipeline, mode).run(&files)?;
    info!(
        "Processed {} slices in {:.1?} ({} skipped, {} failed)",
        report.processed(),
        start.elapsed(),
        report.rejected(),
        report.failed()
    );

    let merged = merge_outputs(&report.descriptors(), &output)?;
    if !merged.is_empty() {
        info!("Wrote {} merged files", merged.len());
    }
    Ok(())
}

fn print_report(slice: &FinalizedSlice, format: &OutputFormat) {
    match format {
        OutputFormat::Text => {
            let report = TextReport::new(slice);
            println!("{}", report);
        }
        OutputFormat::Json => {
            #[cfg(feature = "json")]
            {
                match output_json(slice) {
                    Ok(json) => println!("{}", json),
                    Err(e) => {
                        error!("Failed to serialize to JSON: {}", e);
                        eprintln!("Error: Failed to serialize to JSON: {}", e);
                        process::exit(1);
                    }
                }
            }
            #[cfg(not(feature = "json"))]
            {
                eprintln!("Error: JSON output requires the 'json' feature");
                eprintln!("Rebuild with: cargo build --features json");
                process::exit(1);
            }
        }
    }
}

#[cfg(feature = "json")]
fn output_json(slice: &FinalizedSlice) -> std::result::Result<String, serde_json::Error> {
    use ctcontour_core::{ContourMetrics, DoseEstimate, SliceMetadata};
    use serde::Serialize;

    #[derive(Serialize)]
    struct SliceJson<'a> {
        file_path: String,
        metadata: &'a SliceMetadata,
        contour_method: &'a str,
        metrics: Option<&'a ContourMetrics>,
        dose: Option<&'a DoseEstimate>,
        is_out_of_scan: bool,
        out_of_scan_px: usize,
        is_out_of_edge: bool,
        out_of_edge_px: (usize, usize, usize, usize),
        is_truncated: bool,
    }

    let truncation = slice.truncation();
    let output = SliceJson {
        file_path: slice.file_path().display().to_string(),
        metadata: slice.metadata(),
        contour_method: slice.contour().method(),
        metrics: slice.metrics(),
        dose: slice.dose(),
        is_out_of_scan: truncation.is_out_of_scan,
        out_of_scan_px: truncation.out_of_scan_px,
        is_out_of_edge: truncation.is_out_of_edge,
        out_of_edge_px: truncation.out_of_edge_px.as_tuple(),
        is_truncated: truncation.is_truncated(),
    };

    serde_json::to_string_pretty(&output)
}
