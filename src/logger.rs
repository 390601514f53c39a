use crate::gpu::DeviceReading;
use chrono::Local;
use std::fs::OpenOptions;
use std::io::Write;

/// Appends one line per device per display tick to a log file.
pub struct SampleLogger {
    file: std::fs::File,
}

impl SampleLogger {
    pub fn new(path: &str) -> anyhow::Result<Self> {
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        let mut logger = Self { file };

        // Write header if file is new or empty
        if logger.file.metadata()?.len() == 0 {
            logger.write_header()?;
        }

        Ok(logger)
    }

    fn write_header(&mut self) -> anyhow::Result<()> {
        let header =
            "Date Time Index Name Temperature Utilization MemoryUsed MemoryTotal MemoryPercent\n";
        self.file.write_all(header.as_bytes())?;
        Ok(())
    }

    pub fn log_tick(&mut self, readings: &[DeviceReading]) -> anyhow::Result<()> {
        let now = Local::now();

        for reading in readings {
            let line = format!(
                "{} {} {} {} {:.0} {:.0} {:.0} {:.0} {:.1}\n",
                now.format("%Y-%m-%d"),
                now.format("%H:%M:%S"),
                reading.index,
                reading.name.replace(' ', "_"),
                reading.temperature,
                reading.utilization,
                reading.memory_used,
                reading.memory_total,
                reading.memory_percent()
            );
            self.file.write_all(line.as_bytes())?;
        }
        self.file.flush()?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reading() -> DeviceReading {
        DeviceReading {
            index: 0,
            name: "Test GPU".to_string(),
            temperature: 55.0,
            utilization: 42.0,
            memory_used: 2048.0,
            memory_total: 8192.0,
        }
    }

    #[test]
    fn test_header_written_once() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("samples.log");
        let path_str = path.to_str().unwrap();

        {
            let mut logger = SampleLogger::new(path_str).unwrap();
            logger.log_tick(&[reading()]).unwrap();
        }
        {
            let mut logger = SampleLogger::new(path_str).unwrap();
            logger.log_tick(&[reading()]).unwrap();
        }

        let content = std::fs::read_to_string(&path).unwrap();
        assert_eq!(content.matches("Date Time").count(), 1);
        assert_eq!(content.matches("Test_GPU").count(), 2);
    }

    #[test]
    fn test_logged_fields() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("samples.log");
        let mut logger = SampleLogger::new(path.to_str().unwrap()).unwrap();
        logger.log_tick(&[reading()]).unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        let data_line = content.lines().nth(1).unwrap();
        assert!(data_line.ends_with("0 Test_GPU 55 42 2048 8192 25.0"));
    }
}
