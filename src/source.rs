use std::fs::File;
use std::io::{self, BufRead, BufReader, Lines};
use std::path::Path;

use crate::cluster::LineId;

/// Numbered lines of a reader, as `(line id, text)` with the line ending stripped.
pub struct LineSource<R> {
    lines: Lines<R>,
    next_id: LineId,
}

impl<R: BufRead> LineSource<R> {
    pub fn new(reader: R, first_id: LineId) -> Self {
        Self { lines: reader.lines(), next_id: first_id }
    }
}

impl<R: BufRead> Iterator for LineSource<R> {
    type Item = io::Result<(LineId, String)>;

    fn next(&mut self) -> Option<Self::Item> {
        let line = self.lines.next()?;
        let id = self.next_id;
        self.next_id += 1;
        Some(line.map(|l| (id, l)))
    }
}

/// Opens a file for line reading, `-` meaning stdin. Ids start at `first_id`.
pub fn open_path(path: &str, first_id: LineId) -> io::Result<LineSource<Box<dyn BufRead>>> {
    let reader: Box<dyn BufRead> = if path == "-" {
        Box::new(BufReader::new(io::stdin()))
    } else {
        // Larger buffer reduces syscalls on big files.
        Box::new(BufReader::with_capacity(1 << 20, File::open(Path::new(path))?))
    };
    Ok(LineSource::new(reader, first_id))
}

/// Reads a whole source into memory.
pub fn read_all<R: BufRead>(reader: R, first_id: LineId) -> io::Result<Vec<(LineId, String)>> {
    LineSource::new(reader, first_id).collect()
}
