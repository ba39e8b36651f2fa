//! Source discovery and per-slice dispatch
//!
//! Each slice is processed end to end by one worker; a failure stays inside
//! that slice's [`TaskOutcome`].

use crate::contour::{ContourExtractor, TruncationDetector};
use crate::error::{CtContourError, Result};
use crate::output::{ArtifactWriter, OutputDescriptor};
use crate::slice::{FinalizedSlice, SliceRecord};
use log::{debug, error, info};
use rayon::prelude::*;
use std::fs::File;
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use std::time::Instant;

/// Collects DICOM files under `source`, sorted by path
///
/// A file source is returned as is. In a directory, `.dcm` and `.dicom`
/// files (any case) are accepted, as are extension-less files carrying the
/// `DICM` preamble.
pub fn collect_dicom_files(source: &Path, recursive: bool) -> io::Result<Vec<PathBuf>> {
    if source.is_file() {
        return Ok(vec![source.to_path_buf()]);
    }

    let mut files = Vec::new();
    let mut pending = vec![source.to_path_buf()];
    while let Some(dir) = pending.pop() {
        for entry in std::fs::read_dir(&dir)? {
            let path = entry?.path();

            if path.is_dir() {
                if recursive {
                    pending.push(path);
                }
            } else if path.is_file() {
                if let Some(ext) = path.extension() {
                    if ext.eq_ignore_ascii_case("dcm") || ext.eq_ignore_ascii_case("dicom") {
                        files.push(path);
                    }
                } else if is_dicom_file(&path) {
                    debug!("Found headerless DICOM file: {}", path.display());
                    files.push(path);
                }
            }
        }
    }

    files.sort();
    Ok(files)
}

/// Checks for the 128-byte preamble followed by `DICM`
pub fn is_dicom_file(path: &Path) -> bool {
    let mut file = match File::open(path) {
        Ok(f) => f,
        Err(_) => return false,
    };

    let mut buffer = [0u8; 132];
    match file.read_exact(&mut buffer) {
        Ok(()) => &buffer[128..132] == b"DICM",
        Err(_) => false,
    }
}

/// Contouring, truncation and artifact writing for one slice
#[derive(Debug, Clone)]
pub struct SlicePipeline {
    extractor: ContourExtractor,
    detector: TruncationDetector,
    writer: ArtifactWriter,
}

impl SlicePipeline {
    pub fn new(
        extractor: ContourExtractor,
        detector: TruncationDetector,
        writer: ArtifactWriter,
    ) -> Self {
        Self {
            extractor,
            detector,
            writer,
        }
    }

    pub fn writer(&self) -> &ArtifactWriter {
        &self.writer
    }

    /// Loads a slice from disk and runs it through every stage
    pub fn process(&self, path: &Path) -> Result<(FinalizedSlice, Vec<OutputDescriptor>)> {
        let record = SliceRecord::from_file(path.to_path_buf())?;
        self.finish(record)
    }

    /// Like [`process`](Self::process), but a rejected slice is logged at
    /// info and yields `None`
    pub fn process_or_skip(
        &self,
        path: &Path,
    ) -> Result<Option<(FinalizedSlice, Vec<OutputDescriptor>)>> {
        match self.process(path) {
            Ok(done) => Ok(Some(done)),
            Err(e) if e.is_rejection() => {
                info!("Skipping {}: {}", path.display(), e);
                Ok(None)
            }
            Err(e) => Err(e),
        }
    }

    /// Runs an already calibrated slice through the remaining stages
    pub fn finish(&self, record: SliceRecord) -> Result<(FinalizedSlice, Vec<OutputDescriptor>)> {
        let slice = record
            .contour(&self.extractor)
            .flag_truncation(&self.detector);
        let outputs = self.writer.write(&slice)?;
        Ok((slice, outputs))
    }
}

/// Result of one slice task
#[derive(Debug)]
pub struct TaskOutcome {
    pub source: PathBuf,
    pub result: Result<Vec<OutputDescriptor>>,
}

impl TaskOutcome {
    pub fn is_rejected(&self) -> bool {
        matches!(&self.result, Err(e) if e.is_rejection())
    }

    pub fn is_failed(&self) -> bool {
        matches!(&self.result, Err(e) if !e.is_rejection())
    }
}

/// Outcomes of a batch, in input order
#[derive(Debug, Default)]
pub struct BatchReport {
    pub outcomes: Vec<TaskOutcome>,
}

impl BatchReport {
    /// Artifacts written by successful tasks
    pub fn descriptors(&self) -> Vec<OutputDescriptor> {
        self.outcomes
            .iter()
            .filter_map(|o| o.result.as_ref().ok())
            .flatten()
            .cloned()
            .collect()
    }

    pub fn processed(&self) -> usize {
        self.outcomes.iter().filter(|o| o.result.is_ok()).count()
    }

    pub fn rejected(&self) -> usize {
        self.outcomes.iter().filter(|o| o.is_rejected()).count()
    }

    pub fn failed(&self) -> usize {
        self.outcomes.iter().filter(|o| o.is_failed()).count()
    }
}

/// How slices are dispatched
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DispatchMode {
    /// Fixed pool sized to the available cores
    #[default]
    Parallel,
    /// One slice after another on the calling thread
    Single,
}

/// Runs a [`SlicePipeline`] over a list of files
#[derive(Debug, Clone)]
pub struct BatchRunner {
    pipeline: SlicePipeline,
    mode: DispatchMode,
}

impl BatchRunner {
    pub fn new(pipeline: SlicePipeline, mode: DispatchMode) -> Self {
        Self { pipeline, mode }
    }

    pub fn pipeline(&self) -> &SlicePipeline {
        &self.pipeline
    }

    /// Processes every file and collects one outcome per file
    ///
    /// # Errors
    ///
    /// Only pool construction can fail; per-file errors are captured in the
    /// report.
    pub fn run(&self, files: &[PathBuf]) -> Result<BatchReport> {
        let outcomes = match self.mode {
            DispatchMode::Single => files.iter().map(|f| self.task(f)).collect(),
            DispatchMode::Parallel => {
                let threads = std::thread::available_parallelism().map_or(1, usize::from);
                debug!("Starting pool with {} workers", threads);
                let pool = rayon::ThreadPoolBuilder::new()
                    .num_threads(threads)
                    .build()
                    .map_err(|e| CtContourError::ProcessingError(e.to_string()))?;
                pool.install(|| files.par_iter().map(|f| self.task(f)).collect())
            }
        };
        Ok(BatchReport { outcomes })
    }

    fn task(&self, path: &Path) -> TaskOutcome {
        let start = Instant::now();
        let result = self.pipeline.process(path).map(|(_, outputs)| outputs);

        match &result {
            Ok(_) => debug!("{} done in {:.2?}", path.display(), start.elapsed()),
            Err(e) if e.is_rejection() => info!("Skipping {}: {}", path.display(), e),
            Err(e) => error!("Failed {}: {}", path.display(), e),
        }

        TaskOutcome {
            source: path.to_path_buf(),
            result,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::output::OutputKind;
    use crate::slice::record::tests::create_test_dicom;
    use crate::types::{OutputConfig, TruncationConfig};
    use std::fs;
    use std::io::Write;
    use tempfile::TempDir;

    fn write_preamble(path: &Path, magic: &[u8]) {
        let mut file = File::create(path).unwrap();
        file.write_all(&[0u8; 128]).unwrap();
        file.write_all(magic).unwrap();
        file.write_all(b"additional data").unwrap();
    }

    fn pipeline(src: &Path, dst: &Path, output: OutputConfig) -> SlicePipeline {
        SlicePipeline::new(
            ContourExtractor::default(),
            TruncationDetector::default(),
            ArtifactWriter::new(src, dst, output, TruncationConfig::default()),
        )
    }

    #[test]
    fn test_is_dicom_file() {
        let dir = TempDir::new().unwrap();
        let good = dir.path().join("good");
        write_preamble(&good, b"DICM");
        let wrong = dir.path().join("wrong");
        write_preamble(&wrong, b"NOTM");
        let small = dir.path().join("small");
        fs::write(&small, b"small").unwrap();

        assert!(is_dicom_file(&good));
        assert!(!is_dicom_file(&wrong));
        assert!(!is_dicom_file(&small));
        assert!(!is_dicom_file(&dir.path().join("missing")));
    }

    #[test]
    fn test_collect_dicom_files() {
        let dir = TempDir::new().unwrap();
        let nested = dir.path().join("sub");
        fs::create_dir(&nested).unwrap();
        fs::write(dir.path().join("b.DCM"), b"x").unwrap();
        fs::write(dir.path().join("a.dicom"), b"x").unwrap();
        fs::write(dir.path().join("notes.txt"), b"x").unwrap();
        write_preamble(&dir.path().join("IM0001"), b"DICM");
        fs::write(nested.join("c.dcm"), b"x").unwrap();

        let flat = collect_dicom_files(dir.path(), false).unwrap();
        let names: Vec<_> = flat
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec!["IM0001", "a.dicom", "b.DCM"]);

        let deep = collect_dicom_files(dir.path(), true).unwrap();
        assert_eq!(deep.len(), 4);
        assert_eq!(deep[3], nested.join("c.dcm"));

        let single = collect_dicom_files(&nested.join("c.dcm"), false).unwrap();
        assert_eq!(single, vec![nested.join("c.dcm")]);
    }

    #[test]
    fn test_failures_stay_per_item() {
        let src = TempDir::new().unwrap();
        let dst = TempDir::new().unwrap();
        let garbage = src.path().join("bad.dcm");
        fs::write(&garbage, b"not a dicom file").unwrap();
        let missing = src.path().join("missing.dcm");
        let files = vec![garbage.clone(), missing.clone()];

        for mode in [DispatchMode::Single, DispatchMode::Parallel] {
            let runner = BatchRunner::new(
                pipeline(src.path(), dst.path(), OutputConfig::default()),
                mode,
            );
            let report = runner.run(&files).unwrap();
            assert_eq!(report.outcomes.len(), 2);
            assert_eq!(report.outcomes[0].source, garbage);
            assert_eq!(report.outcomes[1].source, missing);
            assert_eq!(report.processed(), 0);
            assert_eq!(report.rejected() + report.failed(), 2);
            assert!(report.descriptors().is_empty());
        }
    }

    #[test]
    fn test_single_rejection_is_skipped() {
        let src = TempDir::new().unwrap();
        let dst = TempDir::new().unwrap();
        let garbage = src.path().join("bad.dcm");
        fs::write(&garbage, b"not a dicom file").unwrap();

        let pipeline = pipeline(&garbage, dst.path(), OutputConfig::default());
        assert!(pipeline.process(&garbage).unwrap_err().is_rejection());
        assert!(pipeline.process_or_skip(&garbage).unwrap().is_none());
    }

    #[test]
    fn test_finish_writes_outputs() {
        let src = TempDir::new().unwrap();
        let dst = TempDir::new().unwrap();
        let path = src.path().join("IM1.dcm");
        let output = OutputConfig {
            csv: true,
            ..OutputConfig::default()
        };
        let pipeline = pipeline(src.path(), dst.path(), output);

        let record = SliceRecord::from_dicom(path, &create_test_dicom(128, 40.0)).unwrap();
        let (slice, outputs) = pipeline.finish(record).unwrap();
        assert!(!slice.truncation().is_truncated());
        assert_eq!(outputs.len(), 1);
        assert_eq!(outputs[0].kind, OutputKind::Csv);
        assert_eq!(outputs[0].path, dst.path().join("IM1.csv"));
    }
}
