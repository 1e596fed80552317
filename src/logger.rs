// This file is Copyright its original authors, visible in version control
// history.
//
// This file is licensed under the Apache License, Version 2.0 <LICENSE-APACHE
// or http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your option.
// You may not use this file except in accordance with one or both of these
// licenses.

//! Logging-related objects.

pub(crate) use lightning::util::logger::Logger as LdkLogger;
pub(crate) use lightning::{log_debug, log_info};

pub use lightning::util::logger::Level as LogLevel;
use lightning::util::logger::Record;

use chrono::Utc;

use std::fs;
use std::io::Write;
use std::path::Path;
use std::sync::Arc;

/// A unit of logging output.
pub type LogRecord<'a> = Record<'a>;

/// Defines the behavior required by a custom log writer.
///
/// Implement this to route the payer's log output into an embedding application's own logging
/// infrastructure, or to capture it in tests.
pub trait LogWriter: Send + Sync {
	/// Log the record.
	fn log(&self, record: LogRecord);
}

pub(crate) struct FilesystemLogger {
	file_path: String,
	level: LogLevel,
}

/// Defines a writer for [`Logger`].
pub(crate) enum Writer {
	/// Writes logs to the file system.
	FileWriter(FilesystemLogger),
	/// Forwards logs to a custom writer.
	CustomWriter(Arc<dyn LogWriter>),
}

/// The logger used by the payer, handing records to its configured writer.
pub struct Logger {
	/// Specifies the logger's writer.
	writer: Writer,
}

impl Logger {
	/// Creates a new logger with a filesystem writer. The parameters to this function
	/// are the path to the log file, and the log level.
	pub fn new_fs_writer(log_file_path: String, level: LogLevel) -> Result<Self, ()> {
		if let Some(parent_dir) = Path::new(&log_file_path).parent() {
			fs::create_dir_all(parent_dir)
				.map_err(|e| eprintln!("ERROR: Failed to create log parent directory: {}", e))?;

			// make sure the file exists.
			fs::OpenOptions::new()
				.create(true)
				.append(true)
				.open(&log_file_path)
				.map_err(|e| eprintln!("ERROR: Failed to open log file: {}", e))?;
		}

		let fs_writer = FilesystemLogger { file_path: log_file_path, level };

		Ok(Self { writer: Writer::FileWriter(fs_writer) })
	}

	/// Creates a new logger handing all records to the given custom writer.
	///
	/// Level filtering is left to the writer.
	pub fn new_custom_writer(log_writer: Arc<dyn LogWriter>) -> Self {
		Self { writer: Writer::CustomWriter(log_writer) }
	}
}

impl LdkLogger for Logger {
	fn log(&self, record: Record) {
		match &self.writer {
			Writer::FileWriter(fs_logger) => {
				if record.level < fs_logger.level {
					return;
				}

				let log = format!(
					"{} {:<5} [{}:{}] {}\n",
					Utc::now().format("%Y-%m-%d %H:%M:%S"),
					record.level.to_string(),
					record.module_path,
					record.line,
					record.args
				);

				fs::OpenOptions::new()
					.create(true)
					.append(true)
					.open(fs_logger.file_path.clone())
					.expect("Failed to open log file")
					.write_all(log.as_bytes())
					.expect("Failed to write to log file")
			},
			Writer::CustomWriter(custom_logger) => {
				custom_logger.log(record);
			},
		}
	}
}
