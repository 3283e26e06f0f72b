//! Streaming FASTA parsing
//!
//! Records are produced one at a time from any `BufRead` source, so peak memory
//! is bounded by the largest single record rather than by the file size.

use crate::bio::sequence::SequenceRecord;
use crate::Result;
use flate2::read::MultiGzDecoder;
use nom::{
    bytes::complete::{tag, take_till1, take_while},
    sequence::pair,
    IResult,
};
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;
use tracing::{debug, info};

const BUFFER_SIZE: usize = 8192;

/// Header text and concatenated sequence lines, before any validation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawRecord {
    pub header: String,
    pub sequence: Vec<u8>,
}

/// Match a header line: `>` then optional whitespace then at least one
/// non-whitespace symbol. Yields the trimmed text after the marker.
fn parse_header(line: &[u8]) -> IResult<&[u8], &[u8]> {
    let (rest, _) = tag(&b">"[..])(line)?;
    let (_, _) = pair(
        take_while(|c: u8| c.is_ascii_whitespace()),
        take_till1(|c: u8| c.is_ascii_whitespace()),
    )(rest)?;
    Ok((&rest[rest.len()..], rest.trim_ascii()))
}

/// Lazy iterator over raw records of a FASTA source.
///
/// Lines before the first header are ignored. Any other non-blank line is
/// trimmed, uppercased and appended to the open record.
pub struct FastaReader<R> {
    reader: R,
    line: Vec<u8>,
    current: Option<RawRecord>,
    finished: bool,
}

impl<R: BufRead> FastaReader<R> {
    pub fn new(reader: R) -> Self {
        Self {
            reader,
            line: Vec::with_capacity(256),
            current: None,
            finished: false,
        }
    }

    /// Drop invalid records and derive composition for the rest
    pub fn records(self) -> SequenceRecords<R> {
        SequenceRecords {
            inner: self,
            accepted: 0,
            dropped: 0,
            reported: false,
        }
    }
}

impl<R: BufRead> Iterator for FastaReader<R> {
    type Item = Result<RawRecord>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.finished {
            return None;
        }

        loop {
            self.line.clear();
            match self.reader.read_until(b'\n', &mut self.line) {
                Ok(0) => {
                    self.finished = true;
                    return self.current.take().map(Ok);
                }
                Ok(_) => {}
                Err(e) => {
                    self.finished = true;
                    self.current = None;
                    return Some(Err(e.into()));
                }
            }

            // Headers must start in the first column; only line endings are stripped
            let raw = self.line.trim_ascii_end();
            if raw.trim_ascii_start().is_empty() {
                continue;
            }

            if let Ok((_, header)) = parse_header(raw) {
                let next = RawRecord {
                    header: String::from_utf8_lossy(header).into_owned(),
                    sequence: Vec::new(),
                };
                if let Some(done) = self.current.replace(next) {
                    return Some(Ok(done));
                }
            } else if let Some(record) = self.current.as_mut() {
                record
                    .sequence
                    .extend(raw.trim_ascii_start().iter().map(|c| c.to_ascii_uppercase()));
            }
        }
    }
}

/// Validated records of a FASTA source; invalid or empty records are skipped
pub struct SequenceRecords<R> {
    inner: FastaReader<R>,
    accepted: usize,
    dropped: usize,
    reported: bool,
}

impl<R> SequenceRecords<R> {
    pub fn accepted(&self) -> usize {
        self.accepted
    }

    pub fn dropped(&self) -> usize {
        self.dropped
    }
}

impl<R: BufRead> Iterator for SequenceRecords<R> {
    type Item = Result<SequenceRecord>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            match self.inner.next() {
                Some(Ok(raw)) => {
                    let record = SequenceRecord::new(raw.header, raw.sequence);
                    if record.is_valid() {
                        self.accepted += 1;
                        return Some(Ok(record));
                    }
                    debug!("Dropping invalid record '{}'", record.id);
                    self.dropped += 1;
                }
                Some(Err(e)) => return Some(Err(e)),
                None => {
                    if !self.reported {
                        self.reported = true;
                        info!(
                            "Parsing completed: {} sequences accepted, {} dropped",
                            self.accepted, self.dropped
                        );
                    }
                    return None;
                }
            }
        }
    }
}

/// Open a FASTA file for streaming (supports .gz compression)
pub fn open_fasta<P: AsRef<Path>>(path: P) -> Result<Box<dyn BufRead + Send>> {
    let path = path.as_ref();
    let file = File::open(path)?;

    if path.extension().and_then(|s| s.to_str()) == Some("gz") {
        let decoder = MultiGzDecoder::new(BufReader::new(file));
        Ok(Box::new(BufReader::with_capacity(BUFFER_SIZE, decoder)))
    } else {
        Ok(Box::new(BufReader::with_capacity(BUFFER_SIZE, file)))
    }
}

/// Stream validated records from a FASTA file
pub fn read_records<P: AsRef<Path>>(path: P) -> Result<SequenceRecords<Box<dyn BufRead + Send>>> {
    Ok(FastaReader::new(open_fasta(path)?).records())
}

/// Parse a FASTA file into validated records
pub fn parse_fasta<P: AsRef<Path>>(path: P) -> Result<Vec<SequenceRecord>> {
    read_records(path)?.collect()
}

/// Parse FASTA from bytes
pub fn parse_fasta_from_bytes(data: &[u8]) -> Result<Vec<SequenceRecord>> {
    FastaReader::new(data).records().collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{self, Read};

    #[test]
    fn test_parse_header() {
        let (_, header) = parse_header(b">sp|P12345|PROTEIN_HUMAN Description here").unwrap();
        assert_eq!(header, b"sp|P12345|PROTEIN_HUMAN Description here");

        let (_, header) = parse_header(b">   padded id  ").unwrap();
        assert_eq!(header, b"padded id");

        assert!(parse_header(b">").is_err());
        assert!(parse_header(b">   ").is_err());
        assert!(parse_header(b"ACGT").is_err());
    }

    #[test]
    fn test_raw_records_concatenate_lines() {
        let data = b"junk before header\n>s1 first\nacgt\n\nTTAA\n>s2\nGG\r\nCC\r\n";
        let raw: Vec<RawRecord> = FastaReader::new(&data[..])
            .collect::<Result<_>>()
            .unwrap();

        assert_eq!(raw.len(), 2);
        assert_eq!(raw[0].header, "s1 first");
        assert_eq!(raw[0].sequence, b"ACGTTTAA");
        assert_eq!(raw[1].header, "s2");
        assert_eq!(raw[1].sequence, b"GGCC");
    }

    #[test]
    fn test_bare_marker_is_not_a_header() {
        // A lone '>' is appended as sequence data, which invalidates the record
        let data = b">s1\nACGT\n>\nACGT\n>s2\nGGCC\n";
        let records = parse_fasta_from_bytes(data).unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].id, "s2");
    }

    #[test]
    fn test_indented_marker_is_sequence_data() {
        let data = b">s1\nACGT\n  >s2 indented\n>s3\r\n  ggcc  \r\n";
        let raw: Vec<RawRecord> = FastaReader::new(&data[..]).collect::<Result<_>>().unwrap();

        assert_eq!(raw.len(), 2);
        assert_eq!(raw[0].header, "s1");
        assert_eq!(raw[0].sequence, b"ACGT>S2 INDENTED".to_vec());
        assert_eq!(raw[1].header, "s3");
        assert_eq!(raw[1].sequence, b"GGCC".to_vec());

        let records = parse_fasta_from_bytes(data).unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].id, "s3");
    }

    #[test]
    fn test_invalid_and_empty_records_dropped() {
        let data = b">empty\n>bad\nACGTXYZ\n>good\nACGTN\n";
        let mut records = FastaReader::new(&data[..]).records();
        let collected: Vec<_> = records.by_ref().collect::<Result<_>>().unwrap();

        assert_eq!(collected.len(), 1);
        assert_eq!(collected[0].id, "good");
        assert_eq!(records.accepted(), 1);
        assert_eq!(records.dropped(), 2);
    }

    struct FailingReader;

    impl Read for FailingReader {
        fn read(&mut self, _buf: &mut [u8]) -> io::Result<usize> {
            Err(io::Error::new(io::ErrorKind::Other, "disk on fire"))
        }
    }

    #[test]
    fn test_io_error_is_fatal() {
        let mut reader = FastaReader::new(BufReader::new(FailingReader));
        match reader.next() {
            Some(Err(crate::SeqscopeError::Io(e))) => assert_eq!(e.to_string(), "disk on fire"),
            other => panic!("expected IO error, got {:?}", other.map(|r| r.is_ok())),
        }
        assert!(reader.next().is_none());
    }
}
