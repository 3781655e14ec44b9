use std::{
    fs::File,
    io::{self, BufWriter, Write},
    path::Path,
};

/// An append-only destination for the per epoch loss.
pub trait LossSink {
    fn record(&mut self, epoch: usize, loss: f32) -> io::Result<()>;
}

/// Keeps the losses in memory.
impl LossSink for Vec<(usize, f32)> {
    fn record(&mut self, epoch: usize, loss: f32) -> io::Result<()> {
        self.push((epoch, loss));
        Ok(())
    }
}

/// Writes one `epoch, loss` line per record.
///
/// The writer is buffered, whatever was recorded gets flushed when the log is dropped even if
/// the run is aborted midway, `finish` flushes it reporting any error.
pub struct CsvLossLog<W: Write> {
    writer: BufWriter<W>,
}

impl CsvLossLog<File> {
    /// Creates the log file at `path`, truncating it if it already exists.
    pub fn create<P: AsRef<Path>>(path: P) -> io::Result<Self> {
        File::create(path).map(Self::new)
    }
}

impl<W: Write> CsvLossLog<W> {
    pub fn new(writer: W) -> Self {
        Self {
            writer: BufWriter::new(writer),
        }
    }

    /// Flushes the log and returns the underlying writer.
    pub fn finish(self) -> io::Result<W> {
        self.writer.into_inner().map_err(|e| e.into_error())
    }
}

impl<W: Write> LossSink for CsvLossLog<W> {
    fn record(&mut self, epoch: usize, loss: f32) -> io::Result<()> {
        writeln!(self.writer, "{epoch}, {loss}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn writes_one_line_per_epoch() {
        let mut log = CsvLossLog::new(Vec::new());
        log.record(0, 12.5).unwrap();
        log.record(1, 3.25).unwrap();

        let out = String::from_utf8(log.finish().unwrap()).unwrap();
        assert_eq!(out, "0, 12.5\n1, 3.25\n");
    }

    #[test]
    fn create_truncates() {
        let path = std::env::temp_dir().join(format!("loss-log-{}.csv", std::process::id()));
        std::fs::write(&path, "stale contents\n").unwrap();

        let mut log = CsvLossLog::create(&path).unwrap();
        log.record(7, 1.0).unwrap();
        log.finish().unwrap();

        assert_eq!(std::fs::read_to_string(&path).unwrap(), "7, 1\n");
        std::fs::remove_file(&path).unwrap();
    }
}
