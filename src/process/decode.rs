use encoding_rs::WINDOWS_1252;
use tracing::debug;

/// Decode raw export bytes. UTF-8 (with or without BOM) is taken as is;
/// anything else is read as Windows-1252, which is what spreadsheet tools on
/// Portuguese-locale machines tend to save.
pub fn decode_text(bytes: &[u8]) -> String {
    let bytes = bytes.strip_prefix(b"\xEF\xBB\xBF").unwrap_or(bytes);
    match std::str::from_utf8(bytes) {
        Ok(s) => s.to_string(),
        Err(e) => {
            debug!(valid_up_to = e.valid_up_to(), "not UTF-8, decoding as windows-1252");
            let (text, _, _) = WINDOWS_1252.decode(bytes);
            text.into_owned()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn utf8_passes_through() {
        assert_eq!(decode_text("MATÉRIA;NÍVEL".as_bytes()), "MATÉRIA;NÍVEL");
    }

    #[test]
    fn bom_is_dropped() {
        let mut bytes = b"\xEF\xBB\xBF".to_vec();
        bytes.extend_from_slice("NOME;NÍVEL".as_bytes());
        assert_eq!(decode_text(&bytes), "NOME;NÍVEL");
    }

    #[test]
    fn latin_bytes_fall_back() {
        // "QUESTÃO;NÍVEL" as saved by a Windows spreadsheet
        let bytes = b"QUEST\xC3O;N\xCDVEL";
        assert_eq!(decode_text(bytes), "QUESTÃO;NÍVEL");
    }
}
