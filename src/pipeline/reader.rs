//! Newline-delimited JSON record reader.

use super::error::PipelineError;
use serde::de::DeserializeOwned;
use std::fs::File;
use std::io::{BufRead, BufReader, Lines};
use std::marker::PhantomData;
use std::path::PathBuf;

/// A decoded record together with the 1-based line it came from.
#[derive(Debug, Clone, PartialEq)]
pub struct LineRecord<T> {
    pub line: usize,
    pub record: T,
}

/// A JSON-lines file. Every call to [`JsonLinesFile::records`] starts a new
/// pass from the first line.
#[derive(Debug, Clone)]
pub struct JsonLinesFile {
    path: PathBuf,
}

impl JsonLinesFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Lazily decode the file into records of type `T`, one per non-blank line.
    pub fn records<T: DeserializeOwned>(&self) -> Result<Records<T>, PipelineError> {
        let file = File::open(&self.path).map_err(|source| PipelineError::Io {
            path: self.path.clone(),
            source,
        })?;
        Ok(Records {
            path: self.path.clone(),
            lines: BufReader::new(file).lines(),
            line: 0,
            _record: PhantomData,
        })
    }
}

/// Iterator over the decoded records of a [`JsonLinesFile`].
pub struct Records<T> {
    path: PathBuf,
    lines: Lines<BufReader<File>>,
    line: usize,
    _record: PhantomData<T>,
}

impl<T: DeserializeOwned> Records<T> {
    fn decode(&self, text: &str) -> Result<T, PipelineError> {
        let value: serde_json::Value =
            serde_json::from_str(text).map_err(|source| PipelineError::MalformedRecord {
                path: self.path.clone(),
                line: self.line,
                source,
            })?;
        serde_json::from_value(value)
            .map_err(|e| PipelineError::schema_mismatch(&self.path, self.line, e.to_string()))
    }
}

impl<T: DeserializeOwned> Iterator for Records<T> {
    type Item = Result<LineRecord<T>, PipelineError>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let text = match self.lines.next()? {
                Ok(text) => text,
                Err(source) => {
                    return Some(Err(PipelineError::Io {
                        path: self.path.clone(),
                        source,
                    }))
                }
            };
            self.line += 1;
            if text.trim().is_empty() {
                continue;
            }
            return Some(self.decode(&text).map(|record| LineRecord {
                line: self.line,
                record,
            }));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;
    use std::fs;
    use tempfile::TempDir;

    #[derive(Debug, Deserialize, PartialEq)]
    #[serde(deny_unknown_fields)]
    struct Sample {
        name: String,
        value: Option<f64>,
    }

    fn write_file(dir: &TempDir, content: &str) -> JsonLinesFile {
        let path = dir.path().join("sample.json");
        fs::write(&path, content).unwrap();
        JsonLinesFile::new(path)
    }

    #[test]
    fn test_reads_one_record_per_line() {
        let dir = TempDir::new().unwrap();
        let file = write_file(
            &dir,
            "{\"name\":\"a\",\"value\":1.5}\n\n{\"name\":\"b\",\"value\":null}\n",
        );

        let records = file
            .records::<Sample>()
            .unwrap()
            .collect::<Result<Vec<_>, _>>()
            .unwrap();

        assert_eq!(
            records,
            vec![
                LineRecord {
                    line: 1,
                    record: Sample {
                        name: "a".to_string(),
                        value: Some(1.5)
                    }
                },
                LineRecord {
                    line: 3,
                    record: Sample {
                        name: "b".to_string(),
                        value: None
                    }
                },
            ]
        );
    }

    #[test]
    fn test_records_can_be_restarted() {
        let dir = TempDir::new().unwrap();
        let file = write_file(&dir, "{\"name\":\"a\"}\n{\"name\":\"b\"}\n");

        let mut first = file.records::<Sample>().unwrap();
        assert_eq!(first.next().unwrap().unwrap().record.name, "a");

        let second: Vec<_> = file
            .records::<Sample>()
            .unwrap()
            .map(|r| r.unwrap().record.name)
            .collect();
        assert_eq!(second, vec!["a", "b"]);
    }

    #[test]
    fn test_invalid_json_is_malformed_record() {
        let dir = TempDir::new().unwrap();
        let file = write_file(&dir, "{\"name\":\"a\"}\n{\"name\": oops}\n");

        let results: Vec<_> = file.records::<Sample>().unwrap().collect();
        assert!(results[0].is_ok());
        match &results[1] {
            Err(PipelineError::MalformedRecord { line, .. }) => assert_eq!(*line, 2),
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[test]
    fn test_missing_and_extra_fields_are_schema_mismatch() {
        let dir = TempDir::new().unwrap();
        let file = write_file(&dir, "{\"value\":1.0}\n{\"name\":\"a\",\"extra\":true}\n");

        let results: Vec<_> = file.records::<Sample>().unwrap().collect();
        assert!(matches!(
            results[0],
            Err(PipelineError::SchemaMismatch { line: 1, .. })
        ));
        assert!(matches!(
            results[1],
            Err(PipelineError::SchemaMismatch { line: 2, .. })
        ));
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let file = JsonLinesFile::new("/nonexistent/file.json");
        assert!(matches!(
            file.records::<Sample>(),
            Err(PipelineError::Io { .. })
        ));
    }
}
