//! Reading and writing files in the configured encoding.

use std::io;

const UTF8_BOM: &[u8] = &[0xEF, 0xBB, 0xBF];

/// Decoded text and the encoding it was decoded with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Decoded {
    pub text: String,
    pub encoding: &'static str,
}

/// Decode `bytes`. `autodetect` strips a UTF-8 byte order mark and falls
/// back to Latin-1 when the bytes are not UTF-8.
pub fn decode(bytes: &[u8], encoding: &str) -> Option<Decoded> {
    match encoding.to_ascii_lowercase().as_str() {
        "utf-8" | "utf8" => {
            let bytes = bytes.strip_prefix(UTF8_BOM).unwrap_or(bytes);
            let text = std::str::from_utf8(bytes).ok()?.to_string();
            Some(Decoded {
                text,
                encoding: "utf-8",
            })
        }
        "ascii" => bytes.is_ascii().then(|| Decoded {
            text: bytes.iter().map(|&b| char::from(b)).collect(),
            encoding: "ascii",
        }),
        "latin-1" | "latin1" | "iso-8859-1" => Some(Decoded {
            text: latin1(bytes),
            encoding: "latin-1",
        }),
        "autodetect" => {
            let bytes = bytes.strip_prefix(UTF8_BOM).unwrap_or(bytes);
            match std::str::from_utf8(bytes) {
                Ok(text) => Some(Decoded {
                    text: text.to_string(),
                    encoding: "utf-8",
                }),
                Err(_) => {
                    tracing::debug!("input is not UTF-8, reading as Latin-1");
                    Some(Decoded {
                        text: latin1(bytes),
                        encoding: "latin-1",
                    })
                }
            }
        }
        _ => None,
    }
}

/// Encode `text` for writing back in `encoding`.
pub fn encode(text: &str, encoding: &str) -> io::Result<Vec<u8>> {
    match encoding.to_ascii_lowercase().as_str() {
        "ascii" if !text.is_ascii() => Err(unencodable(encoding)),
        "latin-1" | "latin1" | "iso-8859-1" => text
            .chars()
            .map(|c| u8::try_from(u32::from(c)).map_err(|_| unencodable(encoding)))
            .collect(),
        _ => Ok(text.as_bytes().to_vec()),
    }
}

fn latin1(bytes: &[u8]) -> String {
    bytes.iter().map(|&b| char::from(b)).collect()
}

fn unencodable(encoding: &str) -> io::Error {
    io::Error::new(
        io::ErrorKind::InvalidData,
        format!("fixed text cannot be encoded as {encoding}"),
    )
}
