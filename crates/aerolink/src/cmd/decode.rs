use std::sync::Arc;

use aerolink_frame::{DecoderEvent, StreamDecoder};
use tracing::warn;

use crate::cmd::DecodeArgs;
use crate::exit::{self, CliResult};
use crate::output::{print_decode_summary, print_message, OutputFormat};

pub fn run(args: DecodeArgs, format: OutputFormat) -> CliResult<i32> {
    let raw = std::fs::read(&args.file)
        .map_err(|err| exit::io_error(&format!("reading {}", args.file.display()), err))?;
    let bytes = if args.hex {
        parse_hex(&raw).map_err(|err| exit::CliError::new(exit::DATA_INVALID, err))?
    } else {
        raw
    };

    let set = aerolink::dialect::standard()
        .map_err(|err| exit::schema_error("building dialect", err))?;

    let mut decoder = StreamDecoder::new(Arc::new(set));
    decoder.push(&bytes);

    let mut decoded = 0usize;
    while let Some(event) = decoder.next_event() {
        match event {
            DecoderEvent::Message(message) => {
                print_message(&message, format);
                decoded += 1;
                if args.limit.is_some_and(|limit| decoded >= limit) {
                    break;
                }
            }
            DecoderEvent::UnknownMessage { id, len } => {
                warn!(id, len, "frame with unknown message id");
            }
        }
    }

    print_decode_summary(decoder.stats(), format);

    if decoded == 0 {
        return Ok(exit::DATA_INVALID);
    }
    Ok(exit::SUCCESS)
}

/// Parse hex text: bytes may be separated by whitespace, commas, or
/// nothing at all.
fn parse_hex(raw: &[u8]) -> Result<Vec<u8>, String> {
    let text = std::str::from_utf8(raw).map_err(|_| "hex input is not UTF-8".to_string())?;
    let digits: String = text
        .chars()
        .filter(|c| !c.is_whitespace() && *c != ',')
        .collect();
    if digits.len() % 2 != 0 {
        return Err(format!("odd number of hex digits ({})", digits.len()));
    }
    (0..digits.len())
        .step_by(2)
        .map(|i| {
            u8::from_str_radix(&digits[i..i + 2], 16)
                .map_err(|_| format!("invalid hex byte {:?}", &digits[i..i + 2]))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_spaced_and_packed_hex() {
        assert_eq!(parse_hex(b"fd 01 00").unwrap(), vec![0xFD, 0x01, 0x00]);
        assert_eq!(parse_hex(b"FD0100").unwrap(), vec![0xFD, 0x01, 0x00]);
        assert_eq!(parse_hex(b"fd,01,00\n").unwrap(), vec![0xFD, 0x01, 0x00]);
    }

    #[test]
    fn rejects_bad_hex() {
        assert!(parse_hex(b"fd0").is_err());
        assert!(parse_hex(b"zz").is_err());
        assert!(parse_hex(&[0xFF, 0xFE]).is_err());
    }
}
