//! Per-job logger.
//!
//! Each job writes its own log file under the configured logs folder. Tool
//! output is kept in a bounded tail buffer so a failure can be reported
//! with the last lines ffmpeg printed, even in compact mode.

use std::collections::VecDeque;
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use chrono::Local;
use parking_lot::Mutex;

use super::types::{LogCallback, LogConfig, LogLevel, MessagePrefix};

/// Logger owned by one job and shared with its steps and tool runs.
pub struct JobLogger {
    job_name: String,
    log_path: PathBuf,
    file_writer: Mutex<Option<BufWriter<File>>>,
    callback: Option<LogCallback>,
    config: LogConfig,
    tail_buffer: Mutex<VecDeque<String>>,
    last_progress: Mutex<u32>,
}

impl JobLogger {
    /// Create `<log_dir>/<job_name>.log`, truncating an existing file.
    pub fn new(
        job_name: impl Into<String>,
        log_dir: impl AsRef<Path>,
        config: LogConfig,
        callback: Option<LogCallback>,
    ) -> std::io::Result<Self> {
        let job_name = job_name.into();
        let log_dir = log_dir.as_ref();
        fs::create_dir_all(log_dir)?;

        let log_path = log_dir.join(format!("{}.log", sanitize_filename(&job_name)));
        let file = File::create(&log_path)?;

        Ok(Self {
            job_name,
            log_path,
            file_writer: Mutex::new(Some(BufWriter::new(file))),
            callback,
            tail_buffer: Mutex::new(VecDeque::with_capacity(config.error_tail)),
            last_progress: Mutex::new(0),
            config,
        })
    }

    pub fn job_name(&self) -> &str {
        &self.job_name
    }

    pub fn log_path(&self) -> &Path {
        &self.log_path
    }

    pub fn config(&self) -> &LogConfig {
        &self.config
    }

    pub fn log(&self, level: LogLevel, message: &str) {
        if level < self.config.level {
            return;
        }
        self.output(&self.format_message(message));
    }

    pub fn info(&self, message: &str) {
        self.log(LogLevel::Info, message);
    }

    pub fn debug(&self, message: &str) {
        self.log(LogLevel::Debug, message);
    }

    pub fn warn(&self, message: &str) {
        self.log(LogLevel::Warn, &MessagePrefix::Warning.format(message));
    }

    pub fn error(&self, message: &str) {
        self.log(LogLevel::Error, &MessagePrefix::Error.format(message));
    }

    /// Log a command line about to run (unless `show_commands` is off).
    pub fn command(&self, command: &str) {
        if self.config.show_commands {
            self.log(LogLevel::Info, &MessagePrefix::Command.format(command));
        }
    }

    pub fn phase(&self, phase_name: &str) {
        self.log(LogLevel::Info, &MessagePrefix::Phase.format(phase_name));
    }

    pub fn section(&self, section_name: &str) {
        self.log(LogLevel::Info, &MessagePrefix::Section.format(section_name));
    }

    /// Log which join/encode strategy was chosen or abandoned.
    pub fn strategy(&self, message: &str) {
        self.log(LogLevel::Info, &MessagePrefix::Strategy.format(message));
    }

    pub fn success(&self, message: &str) {
        self.log(LogLevel::Info, &MessagePrefix::Success.format(message));
    }

    /// Log progress; in compact mode only when it crosses a new step.
    ///
    /// Returns true if the line was written.
    pub fn progress(&self, percent: u32) -> bool {
        if self.config.compact {
            let mut last = self.last_progress.lock();
            let step = self.config.progress_step.max(1);
            if (percent / step) <= (*last / step) && percent < 100 {
                return false;
            }
            *last = percent;
        }

        self.log(LogLevel::Info, &format!("Progress: {}%", percent));
        true
    }

    /// Record one line of tool output.
    ///
    /// Always kept in the tail buffer; written to the log only when not
    /// in compact mode.
    pub fn output_line(&self, line: &str, is_stderr: bool) {
        {
            let mut buffer = self.tail_buffer.lock();
            while buffer.len() >= self.config.error_tail.max(1) {
                buffer.pop_front();
            }
            buffer.push_back(line.to_string());
        }

        if self.config.compact {
            return;
        }

        let prefix = if is_stderr { "[stderr] " } else { "" };
        self.output(&self.format_message(&format!("{}{}", prefix, line)));
    }

    /// Dump the tail buffer under a `[header/tail]` marker.
    pub fn show_tail(&self, header: &str) {
        let buffer = self.tail_buffer.lock();
        if buffer.is_empty() {
            return;
        }

        self.output(&self.format_message(&format!("[{}/tail]", header)));
        for line in buffer.iter() {
            self.output(&self.format_message(line));
        }
    }

    pub fn clear_tail(&self) {
        self.tail_buffer.lock().clear();
    }

    pub fn get_tail(&self) -> Vec<String> {
        self.tail_buffer.lock().iter().cloned().collect()
    }

    pub fn flush(&self) {
        if let Some(ref mut writer) = *self.file_writer.lock() {
            let _ = writer.flush();
        }
    }

    /// Flush and close the file. Later messages only reach the callback.
    pub fn close(&self) {
        self.flush();
        *self.file_writer.lock() = None;
    }

    fn format_message(&self, message: &str) -> String {
        if self.config.show_timestamps {
            format!("[{}] {}", Local::now().format("%H:%M:%S"), message)
        } else {
            message.to_string()
        }
    }

    fn output(&self, formatted: &str) {
        if let Some(ref mut writer) = *self.file_writer.lock() {
            let _ = writeln!(writer, "{}", formatted);
        }
        if let Some(ref callback) = self.callback {
            callback(formatted);
        }
    }
}

impl Drop for JobLogger {
    fn drop(&mut self) {
        self.close();
    }
}

fn sanitize_filename(name: &str) -> String {
    name.chars()
        .map(|c| match c {
            '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' | ' ' => '_',
            _ => c,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use tempfile::tempdir;

    #[test]
    fn writes_to_job_file() {
        let dir = tempdir().unwrap();
        let logger = JobLogger::new("expr 7", dir.path(), LogConfig::default(), None).unwrap();
        assert!(logger.log_path().ends_with("expr_7.log"));

        logger.phase("Assemble");
        logger.strategy("demuxer concat");
        logger.flush();

        let content = fs::read_to_string(logger.log_path()).unwrap();
        assert!(content.contains("=== Assemble ==="));
        assert!(content.contains("[Strategy] demuxer concat"));
    }

    #[test]
    fn callback_sees_every_line() {
        let dir = tempdir().unwrap();
        let count = Arc::new(AtomicUsize::new(0));
        let seen = count.clone();
        let callback: LogCallback = Box::new(move |_| {
            seen.fetch_add(1, Ordering::SeqCst);
        });

        let logger =
            JobLogger::new("job", dir.path(), LogConfig::default(), Some(callback)).unwrap();
        logger.info("one");
        logger.warn("two");
        logger.debug("filtered at info level");

        assert_eq!(count.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn commands_can_be_hidden() {
        let dir = tempdir().unwrap();
        let config = LogConfig {
            show_commands: false,
            ..LogConfig::default()
        };
        let logger = JobLogger::new("job", dir.path(), config, None).unwrap();
        logger.command("ffmpeg -version");
        logger.flush();

        let content = fs::read_to_string(logger.log_path()).unwrap();
        assert!(!content.contains("ffmpeg -version"));
    }

    #[test]
    fn compact_mode_filters_progress() {
        let dir = tempdir().unwrap();
        let logger = JobLogger::new("job", dir.path(), LogConfig::default(), None).unwrap();

        assert!(!logger.progress(5));
        assert!(!logger.progress(15));
        assert!(logger.progress(20));
        assert!(!logger.progress(25));
        assert!(logger.progress(40));
        assert!(logger.progress(100));
    }

    #[test]
    fn tail_buffer_keeps_last_lines() {
        let dir = tempdir().unwrap();
        let config = LogConfig {
            error_tail: 3,
            ..LogConfig::default()
        };
        let logger = JobLogger::new("job", dir.path(), config, None).unwrap();

        for i in 0..6 {
            logger.output_line(&format!("frame={}", i), true);
        }
        assert_eq!(logger.get_tail(), vec!["frame=3", "frame=4", "frame=5"]);

        logger.clear_tail();
        assert!(logger.get_tail().is_empty());
    }

    #[test]
    fn compact_mode_keeps_tool_output_out_of_file() {
        let dir = tempdir().unwrap();
        let logger = JobLogger::new("job", dir.path(), LogConfig::default(), None).unwrap();
        logger.output_line("Stream #0:0: Video: h264", true);
        logger.flush();
        let before = fs::read_to_string(logger.log_path()).unwrap();
        assert!(!before.contains("Stream #0:0"));

        logger.show_tail("ffmpeg");
        logger.flush();
        let after = fs::read_to_string(logger.log_path()).unwrap();
        assert!(after.contains("[ffmpeg/tail]"));
        assert!(after.contains("Stream #0:0"));
    }
}
