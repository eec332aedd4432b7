use std::fs::File;
use std::io::{BufRead, BufReader, Read};

use camino::Utf8Path;
use flate2::read::MultiGzDecoder;
use simple_error::{SimpleResult, try_with};

fn is_gzip_filename(filename: &Utf8Path) -> bool {
    filename.extension() == Some("gz")
}

/// Open a text input file, transparently decompressing it if the filename ends in '.gz'
///
/// # Arguments
/// * `label` - Describes the type of input file in error messages
///
pub fn open_text_file(filename: &Utf8Path, label: &str) -> SimpleResult<Box<dyn Read>> {
    let file = try_with!(
        File::open(filename),
        "Unable to open {} file: '{}'",
        label,
        filename
    );
    let reader: Box<dyn Read> = if is_gzip_filename(filename) {
        Box::new(MultiGzDecoder::new(BufReader::new(file)))
    } else {
        Box::new(file)
    };
    Ok(reader)
}

/// Iterate over the data lines of a text file, returning each line with its 1-indexed line
/// number
///
/// Blank lines and BED-style header lines ('#', 'track', 'browser') are skipped.
///
pub fn read_data_lines(filename: &Utf8Path, label: &str) -> SimpleResult<Vec<(usize, String)>> {
    let reader = BufReader::new(open_text_file(filename, label)?);
    let mut lines = Vec::new();
    for (line_index, line) in reader.lines().enumerate() {
        let line = try_with!(
            line,
            "Can't parse text from {} file '{}' at line {}",
            label,
            filename,
            line_index + 1
        );
        let trimmed = line.trim_end();
        if trimmed.is_empty()
            || trimmed.starts_with('#')
            || trimmed.starts_with("track")
            || trimmed.starts_with("browser")
        {
            continue;
        }
        lines.push((line_index + 1, trimmed.to_string()));
    }
    Ok(lines)
}

/// Parse an integer coordinate field
pub fn parse_coordinate(
    value: &str,
    label: &str,
    filename: &Utf8Path,
    line_number: usize,
) -> SimpleResult<i64> {
    let value = try_with!(
        value.trim().parse::<i64>(),
        "Invalid {} value '{}' in file '{}' at line {}",
        label,
        value,
        filename,
        line_number
    );
    Ok(value)
}


#[cfg(test)]
mod tests {
    use std::io::Write;

    use flate2::Compression;
    use flate2::write::GzEncoder;

    use tempfile::tempdir;

    use super::test_utils::write_temp_file;
    use super::*;

    #[test]
    fn test_read_data_lines() {
        let dir = tempdir().unwrap();
        let filename = write_temp_file(
            &dir,
            "read_data_lines.bed",
            "track name=x\n#comment\nchr1\t10\t20\n\nchr1\t30\t40\n",
        );
        let lines = read_data_lines(&filename, "test").unwrap();
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0], (3, "chr1\t10\t20".to_string()));
        assert_eq!(lines[1].0, 5);
    }

    #[test]
    fn test_read_gzip_data_lines() {
        let dir = tempdir().unwrap();
        let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(b"chr1\t10\t20\n").unwrap();
        let compressed = encoder.finish().unwrap();

        let filename = write_temp_file(&dir, "read_data_lines.bed.gz", "");
        std::fs::write(&filename, compressed).unwrap();

        let lines = read_data_lines(&filename, "test").unwrap();
        assert_eq!(lines, vec![(1, "chr1\t10\t20".to_string())]);
    }

    #[test]
    fn test_missing_file() {
        let filename = Utf8Path::new("/nonexistent/shoal/file.tsv");
        assert!(read_data_lines(filename, "test").is_err());
    }

    #[test]
    fn test_parse_coordinate() {
        let filename = Utf8Path::new("x.bed");
        assert_eq!(parse_coordinate("100", "start", filename, 1).unwrap(), 100);
        assert!(parse_coordinate("1e5", "start", filename, 1).is_err());
    }
}
