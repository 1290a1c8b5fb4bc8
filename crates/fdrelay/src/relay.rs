//! Byte relay from a received descriptor to an output stream.

use std::io::{Read, Write};

/// Copy `input` to `output` in `chunk_size` reads until end of input.
///
/// Returns the number of bytes copied. Short reads are fine; only a
/// zero-byte read ends the copy. Errors are returned for the caller to log,
/// not treated as fatal here.
pub fn copy_stream<W: Write, R: Read>(
    output: &mut W,
    input: &mut R,
    chunk_size: usize,
) -> std::io::Result<u64> {
    let mut buffer = vec![0u8; chunk_size];
    let mut copied = 0u64;

    loop {
        let bytes = input.read(&mut buffer)?;
        if bytes == 0 {
            return Ok(copied);
        }
        output.write_all(&buffer[..bytes])?;
        copied += bytes as u64;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    struct FailingReader;

    impl Read for FailingReader {
        fn read(&mut self, _buf: &mut [u8]) -> std::io::Result<usize> {
            Err(std::io::Error::other("broken"))
        }
    }

    #[test]
    fn copies_input_in_chunks_smaller_than_the_payload() {
        let mut input = Cursor::new(b"descriptor handoff".to_vec());
        let mut output = Vec::new();

        let copied = copy_stream(&mut output, &mut input, 4).expect("copy should succeed");

        assert_eq!(copied, 18);
        assert_eq!(output, b"descriptor handoff");
    }

    #[test]
    fn empty_input_copies_nothing() {
        let mut input = Cursor::new(Vec::new());
        let mut output = Vec::new();

        let copied = copy_stream(&mut output, &mut input, 4096).expect("copy should succeed");

        assert_eq!(copied, 0);
        assert!(output.is_empty());
    }

    #[test]
    fn read_error_is_returned_to_the_caller() {
        let mut output = Vec::new();

        let result = copy_stream(&mut output, &mut FailingReader, 16);

        assert!(result.is_err());
    }
}
