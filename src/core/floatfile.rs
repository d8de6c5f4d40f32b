use std::fs::File;
use std::io::{BufRead, BufReader, Error, ErrorKind, Result as IoResult};
use std::path::Path;
use super::math::Float;

/// Read a file of whitespace/line separated floating point values.
/// Anything from a `#` to the end of its line is a comment.
pub fn read_float_file(filename: &str) -> IoResult<Vec<Float>> {
    let f = File::open(Path::new(filename)).map_err(|e| {
        error!("Unable to open file \"{}\"", filename);
        e
    })?;

    let mut values: Vec<Float> = Vec::new();
    let reader = BufReader::new(f);
    for (line_number, line) in reader.lines().enumerate() {
        let line = line?;
        for token in line.split_whitespace() {
            if token.starts_with('#') {
                break;
            }
            match token.parse::<Float>() {
                Ok(v) => values.push(v),
                Err(_) => {
                    error!("Unexpected text found at line {} of float file \"{}\"",
                        line_number + 1, filename);
                    return Err(Error::new(ErrorKind::InvalidData,
                        format!("unexpected text at line {} of float file \"{}\"",
                            line_number + 1, filename)));
                }
            }
        }
    }

    Ok(values)
}
