use std::{
    fs::{File, OpenOptions},
    io::{self, BufRead, BufReader, Write},
    path::{Path, PathBuf},
    sync::Arc,
};

use parking_lot::Mutex;

/// Append-only log file that keeps at most `max_lines` lines on disk.
///
/// Trimming happens in batches so the file is rewritten at most once every
/// `max(max_lines / 10, 50)` appended lines.
#[derive(Clone)]
pub struct CircularFileWriter {
    path: PathBuf,
    max_lines: u32,
    appended: Arc<Mutex<u32>>,
}

impl CircularFileWriter {
    pub fn new(path: impl Into<PathBuf>, max_lines: u32) -> Self {
        Self {
            path: path.into(),
            max_lines: max_lines.max(1),
            appended: Arc::new(Mutex::new(0)),
        }
    }

    fn trim_threshold(&self) -> u32 {
        (self.max_lines / 10).max(50)
    }

    fn trim(&self) -> io::Result<()> {
        if !Path::new(&self.path).exists() {
            return Ok(());
        }

        let lines = BufReader::new(File::open(&self.path)?)
            .lines()
            .collect::<Result<Vec<_>, _>>()?;
        let keep = self.max_lines as usize;
        if lines.len() <= keep {
            return Ok(());
        }

        let mut file = File::create(&self.path)?;
        for line in &lines[lines.len() - keep..] {
            writeln!(file, "{}", line)?;
        }
        Ok(())
    }
}

impl io::Write for CircularFileWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let mut appended = self.appended.lock();

        OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?
            .write_all(buf)?;

        *appended += buf.iter().filter(|&&b| b == b'\n').count() as u32;
        if *appended >= self.trim_threshold() {
            if let Err(e) = self.trim() {
                eprintln!("Failed to trim log file: {}", e);
            }
            *appended = 0;
        }

        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl<'a> tracing_subscriber::fmt::MakeWriter<'a> for CircularFileWriter {
    type Writer = Self;

    fn make_writer(&'a self) -> Self::Writer {
        self.clone()
    }
}
