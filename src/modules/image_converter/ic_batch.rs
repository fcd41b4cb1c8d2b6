use std::any::Any;
use std::fs;
use std::io;
use std::panic::{self, AssertUnwindSafe};
use std::path::{Path, PathBuf};
use std::thread::{self, JoinHandle};
use tracing::{debug, error, info, warn};
use crate::error::{ConvertError, ConvertResult};
use super::ic_convert::{convert_image, ConversionJob};
use super::ic_log::FailureLog;
use super::ic_progress::{percent_complete, BatchSummary, ProgressSink, WorkerEvent};
use super::ic_scan::display_name;

/// Files per chunk. Only groups progress and chunk-level error handling;
/// files inside a chunk are still converted one by one.
pub const CHUNK_SIZE: usize = 1000;

fn progress_event(index: usize, total: usize) -> WorkerEvent {
    WorkerEvent::Progress {
        completed: index + 1,
        total,
        percent: percent_complete(index, total),
        message: format!("Converting: {}/{}", index + 1, total),
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}

/// Runs `convert` over `files` in chunks of `chunk_size`, logging per-file
/// and per-chunk failures and emitting one progress event per file.
/// `successful + failed` always equals `files.len()`.
pub fn process_files<C>(
    files: &[PathBuf],
    chunk_size: usize,
    log: &FailureLog,
    sink: &ProgressSink,
    mut convert: C,
) -> BatchSummary
where
    C: FnMut(&Path) -> ConvertResult<PathBuf>,
{
    let total = files.len();
    let chunk_size = chunk_size.max(1);
    let chunk_count = total.div_ceil(chunk_size);
    let mut summary = BatchSummary::default();

    for (chunk_index, chunk) in files.chunks(chunk_size).enumerate() {
        let first = chunk_index * chunk_size;
        debug!("Processing chunk {}/{} ({} files)", chunk_index + 1, chunk_count, chunk.len());

        let mut tally = BatchSummary::default();
        let outcome = panic::catch_unwind(AssertUnwindSafe(|| {
            for (offset, path) in chunk.iter().enumerate() {
                match convert(path) {
                    Ok(out) => {
                        tally.successful += 1;
                        debug!("Converted {} -> {}", path.display(), out.display());
                    }
                    Err(e) => {
                        tally.failed += 1;
                        warn!("Failed to convert {}: {}", path.display(), e);
                        log.record(display_name(path), e.detail());
                    }
                }
                sink.send(progress_event(first + offset, total));
            }
        }));

        if let Err(payload) = outcome {
            let end = first + chunk.len();
            let err = ConvertError::ChunkAborted {
                first,
                last: end - 1,
                reason: panic_message(payload.as_ref()),
            };
            warn!("{}", err);
            log.record(format!("Batch error {}-{}", first, end), err.detail());

            tally.failed += chunk.len() - tally.total();
            sink.send(progress_event(end - 1, total));
        }

        summary.successful += tally.successful;
        summary.failed += tally.failed;
    }

    summary
}

/// Runs one job to completion and returns the terminal event, which has
/// also been sent through `sink`.
pub fn run_job(job: &ConversionJob, log: &FailureLog, sink: &ProgressSink) -> WorkerEvent {
    let outcome = if job.files().is_empty() {
        info!("No supported images in {}", job.source().display());
        WorkerEvent::NothingToDo
    } else {
        let output_dir = job.output_dir();
        match fs::create_dir_all(&output_dir) {
            Err(source) => {
                let err = ConvertError::CreateOutputDir { path: output_dir, source };
                error!("{}", err);
                log.record("Critical error", err.detail());
                WorkerEvent::SetupFailed(err.to_string())
            }
            Ok(()) => {
                let total = job.files().len();
                info!(
                    "Converting {} images to {} (quality {}) into {}",
                    total,
                    job.format().as_str(),
                    job.quality(),
                    output_dir.display()
                );
                sink.send(WorkerEvent::Started { total });

                let summary = process_files(job.files(), CHUNK_SIZE, log, sink, |path| {
                    convert_image(path, &output_dir, job.format(), job.quality())
                });
                info!("Finished: {} converted, {} failed", summary.successful, summary.failed);
                WorkerEvent::Finished(summary)
            }
        }
    };

    sink.send(outcome.clone());
    outcome
}

/// Starts the single background worker for `job`.
pub fn spawn_worker(job: ConversionJob, log: FailureLog, sink: ProgressSink) -> io::Result<JoinHandle<()>> {
    thread::Builder::new()
        .name("conversion-worker".to_string())
        .spawn(move || {
            run_job(&job, &log, &sink);
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::modules::image_export::OutputFormat;
    use std::sync::mpsc::{channel, Receiver};
    use tempfile::{tempdir, TempDir};

    fn sink() -> (ProgressSink, Receiver<WorkerEvent>) {
        let (tx, rx) = channel();
        (ProgressSink::new(tx, None), rx)
    }

    fn fake_files(n: usize) -> Vec<PathBuf> {
        (0..n).map(|i| PathBuf::from(format!("img{}.png", i))).collect()
    }

    fn temp_log() -> (TempDir, FailureLog) {
        let dir = tempdir().unwrap();
        let log = FailureLog::new(dir.path().join("failed_conversions.log"));
        (dir, log)
    }

    fn read_log(log: &FailureLog) -> String {
        fs::read_to_string(log.path()).unwrap_or_default()
    }

    fn write_png(path: &Path) {
        image::RgbImage::from_pixel(8, 8, image::Rgb([10, 20, 30])).save(path).unwrap();
    }

    fn fail_every_third(path: &Path) -> ConvertResult<PathBuf> {
        let name = path.to_string_lossy();
        let index: usize = name.trim_start_matches("img").trim_end_matches(".png").parse().unwrap();
        if index % 3 == 0 {
            Err(ConvertError::InvalidFileName(path.to_path_buf()))
        } else {
            Ok(path.to_path_buf())
        }
    }

    #[test]
    fn counts_add_up_for_any_chunk_size() {
        let files = fake_files(10);
        for chunk_size in [1, 2, 3, 4, 7, 10, 11, CHUNK_SIZE] {
            let (_dir, log) = temp_log();
            let (sink, _rx) = sink();
            let summary = process_files(&files, chunk_size, &log, &sink, fail_every_third);

            assert_eq!(summary.total(), files.len(), "chunk size {}", chunk_size);
            assert_eq!(summary.failed, 4, "chunk size {}", chunk_size);
        }
    }

    #[test]
    fn progress_is_reported_after_every_file() {
        let files = fake_files(8);
        let (_dir, log) = temp_log();
        let (sink, rx) = sink();
        process_files(&files, 3, &log, &sink, fail_every_third);

        let events: Vec<WorkerEvent> = rx.try_iter().collect();
        assert_eq!(events.len(), 8);

        let mut last = 0.0;
        for (k, event) in events.iter().enumerate() {
            let WorkerEvent::Progress { completed, total, percent, message } = event else {
                panic!("unexpected {:?}", event);
            };
            assert_eq!((*completed, *total), (k + 1, 8));
            assert_eq!(*percent, (k + 1) as f32 / 8.0 * 100.0);
            assert!(*percent > last);
            assert_eq!(message, &format!("Converting: {}/8", k + 1));
            last = *percent;
        }
        assert_eq!(last, 100.0);
    }

    #[test]
    fn per_file_failures_are_logged() {
        let files = fake_files(4);
        let (_dir, log) = temp_log();
        let (sink, _rx) = sink();
        process_files(&files, CHUNK_SIZE, &log, &sink, fail_every_third);

        let text = read_log(&log);
        assert!(text.contains(" - img0.png:\ninvalid file name: img0.png"));
        assert!(text.contains(" - img3.png:"));
        assert!(!text.contains("img1.png"));
    }

    #[test]
    fn panicking_chunk_is_logged_and_later_chunks_run() {
        let files = fake_files(5);
        let (_dir, log) = temp_log();
        let (sink, rx) = sink();

        let summary = process_files(&files, 2, &log, &sink, |path| {
            if path == Path::new("img2.png") {
                panic!("decoder blew up");
            }
            Ok(path.to_path_buf())
        });

        assert_eq!(summary, BatchSummary { successful: 3, failed: 2 });

        let text = read_log(&log);
        assert!(text.contains(" - Batch error 2-4:\nchunk of files 2-3 aborted: decoder blew up"));

        let completed: Vec<usize> = rx
            .try_iter()
            .filter_map(|e| match e {
                WorkerEvent::Progress { completed, .. } => Some(completed),
                _ => None,
            })
            .collect();
        assert_eq!(completed, [1, 2, 4, 5]);
    }

    #[test]
    fn job_converts_every_image_into_format_folder() {
        let src = tempdir().unwrap();
        for name in ["a.png", "b.PNG", "c.png"] {
            write_png(&src.path().join(name));
        }
        let (_dir, log) = temp_log();
        let (sink, rx) = sink();

        let job = ConversionJob::prepare(src.path(), OutputFormat::Webp, 80).unwrap();
        let outcome = run_job(&job, &log, &sink);

        assert_eq!(outcome, WorkerEvent::Finished(BatchSummary { successful: 3, failed: 0 }));
        let out_dir = src.path().join("output").join("webp");
        let mut produced: Vec<String> = fs::read_dir(&out_dir)
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        produced.sort();
        assert_eq!(produced, ["a.webp", "b.webp", "c.webp"]);

        let events: Vec<WorkerEvent> = rx.try_iter().collect();
        assert_eq!(events.first(), Some(&WorkerEvent::Started { total: 3 }));
        assert_eq!(events.last(), Some(&outcome));
        assert!(!log.path().exists());
    }

    #[test]
    fn empty_folder_is_nothing_to_do() {
        let src = tempdir().unwrap();
        fs::write(src.path().join("readme.txt"), b"not an image").unwrap();
        let (_dir, log) = temp_log();
        let (sink, rx) = sink();

        let job = ConversionJob::prepare(src.path(), OutputFormat::Png, 80).unwrap();
        assert_eq!(run_job(&job, &log, &sink), WorkerEvent::NothingToDo);

        assert!(!src.path().join("output").exists());
        assert_eq!(rx.try_iter().collect::<Vec<_>>(), [WorkerEvent::NothingToDo]);
    }

    #[test]
    fn one_corrupt_image_among_valid_ones() {
        let src = tempdir().unwrap();
        for name in ["one.png", "two.png", "three.png"] {
            write_png(&src.path().join(name));
        }
        fs::write(src.path().join("corrupt.png"), b"\x89PNG garbage").unwrap();
        let (_dir, log) = temp_log();
        let (sink, _rx) = sink();

        let job = ConversionJob::prepare(src.path(), OutputFormat::Jpg, 80).unwrap();
        let outcome = run_job(&job, &log, &sink);

        assert_eq!(outcome, WorkerEvent::Finished(BatchSummary { successful: 3, failed: 1 }));
        assert_eq!(fs::read_dir(src.path().join("output").join("jpg")).unwrap().count(), 3);
        let text = read_log(&log);
        assert_eq!(text.matches(" - corrupt.png:").count(), 1);
        assert_eq!(text.split("\n\n").filter(|s| !s.is_empty()).count(), 1);
    }

    #[test]
    fn unwritable_output_aborts_before_any_file() {
        let src = tempdir().unwrap();
        write_png(&src.path().join("pic.png"));
        fs::write(src.path().join("output"), b"a file where the folder should go").unwrap();
        let (_dir, log) = temp_log();
        let (sink, rx) = sink();

        let job = ConversionJob::prepare(src.path(), OutputFormat::Png, 80).unwrap();
        let outcome = run_job(&job, &log, &sink);

        assert!(matches!(outcome, WorkerEvent::SetupFailed(_)));
        assert!(!rx.try_iter().any(|e| matches!(e, WorkerEvent::Started { .. } | WorkerEvent::Progress { .. })));
        assert!(read_log(&log).contains(" - Critical error:\nfailed to create output directory"));
    }

    #[test]
    fn worker_thread_finishes_on_its_own() {
        let src = tempdir().unwrap();
        write_png(&src.path().join("only.png"));
        let (_dir, log) = temp_log();
        let (sink, rx) = sink();

        let job = ConversionJob::prepare(src.path(), OutputFormat::Bmp, 50).unwrap();
        spawn_worker(job, log, sink).unwrap().join().unwrap();

        let events: Vec<WorkerEvent> = rx.try_iter().collect();
        assert!(events.last().unwrap().is_terminal());
        assert!(src.path().join("output").join("bmp").join("only.bmp").exists());
    }
}
