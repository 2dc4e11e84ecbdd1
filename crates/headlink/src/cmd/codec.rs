//! Offline frame tools: no device needed.

use headlink_itmp::{from_frame, to_frame, Message};

use crate::cmd::{parse_arguments, DecodeArgs, EncodeArgs};
use crate::exit::{io_error, message_error, CliError, CliResult, SUCCESS};
use crate::output::{print_frame, print_message, OutputFormat};

pub fn encode(args: EncodeArgs, format: OutputFormat) -> CliResult<i32> {
    let message = if args.describe {
        Message::describe(args.id, args.procedure)
    } else {
        Message::call(args.id, args.procedure, parse_arguments(&args.args)?)
    };
    let frame = to_frame(&message, args.addr).map_err(|err| message_error("encode failed", err))?;
    print_frame(&frame, format).map_err(|err| io_error("write failed", err))?;
    Ok(SUCCESS)
}

pub fn decode(args: DecodeArgs, format: OutputFormat) -> CliResult<i32> {
    let bytes = parse_hex(&args.hex)?;
    let (address, message) =
        from_frame(&bytes).map_err(|err| message_error("decode failed", err))?;
    print_message(address, &message, format)
        .map_err(|err| message_error("decode failed", err))?;
    Ok(SUCCESS)
}

fn parse_hex(input: &str) -> CliResult<Vec<u8>> {
    let digits: Vec<u8> = input
        .bytes()
        .filter(|b| !b.is_ascii_whitespace() && *b != b':')
        .collect();
    if digits.len() % 2 != 0 {
        return Err(CliError::usage("hex input has an odd number of digits"));
    }
    digits
        .chunks(2)
        .map(|pair| {
            std::str::from_utf8(pair)
                .ok()
                .and_then(|s| u8::from_str_radix(s, 16).ok())
                .ok_or_else(|| {
                    CliError::usage(format!(
                        "invalid hex byte {:?}",
                        String::from_utf8_lossy(pair)
                    ))
                })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_hex_ignores_separators() {
        assert_eq!(
            parse_hex("7e 04:83 06 01 60 f7 7e").unwrap(),
            b"~\x04\x83\x06\x01`\xf7~"
        );
        assert_eq!(parse_hex("7E7E").unwrap(), vec![0x7e, 0x7e]);
    }

    #[test]
    fn parse_hex_rejects_bad_input() {
        assert!(parse_hex("7e0").is_err());
        assert!(parse_hex("zz").is_err());
    }
}
