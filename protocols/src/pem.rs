//! # PEM
//!
//! Certificates are compared as text, so both sides go through the same
//! rendering: base64 body wrapped at 64 columns between the standard markers.

use anyhow::bail;
use base64::Engine;
use base64::engine::general_purpose::STANDARD;

pub const PEM_HEADER: &str = "-----BEGIN CERTIFICATE-----";
pub const PEM_FOOTER: &str = "-----END CERTIFICATE-----";

const LINE_WIDTH: usize = 64;

pub fn der_to_pem(der: &[u8]) -> String {
    wrap(&STANDARD.encode(der))
}

/// Normalizes a PEM certificate so that formatting differences (line endings,
/// line width, surrounding whitespace) do not affect comparison.
pub fn canonicalize(pem: &str) -> anyhow::Result<String> {
    let Some(start) = pem.find(PEM_HEADER) else {
        bail!("missing certificate header");
    };
    let body_start = start + PEM_HEADER.len();
    let Some(body_len) = pem[body_start..].find(PEM_FOOTER) else {
        bail!("missing certificate footer");
    };

    let body: String = pem[body_start..body_start + body_len]
        .chars()
        .filter(|c| !c.is_whitespace())
        .collect();

    if body.is_empty() {
        bail!("empty certificate body");
    }
    if STANDARD.decode(&body).is_err() {
        bail!("certificate body is not valid base64");
    }

    Ok(wrap(&body))
}

fn wrap(body: &str) -> String {
    let mut pem = String::with_capacity(body.len() + body.len() / LINE_WIDTH + 64);
    pem.push_str(PEM_HEADER);
    pem.push('\n');
    for line in body.as_bytes().chunks(LINE_WIDTH) {
        // base64 output is ASCII
        pem.push_str(&String::from_utf8_lossy(line));
        pem.push('\n');
    }
    pem.push_str(PEM_FOOTER);
    pem.push('\n');
    pem
}

// ╔════════════════════════════════════════════╗
// ║ ████████╗███████╗███████╗████████╗███████╗ ║
// ║ ╚══██╔══╝██╔════╝██╔════╝╚══██╔══╝██╔════╝ ║
// ║    ██║   █████╗  ███████╗   ██║   ███████╗ ║
// ║    ██║   ██╔══╝  ╚════██║   ██║   ╚════██║ ║
// ║    ██║   ███████╗███████║   ██║   ███████║ ║
// ║    ╚═╝   ╚══════╝╚══════╝   ╚═╝   ╚══════╝ ║
// ╚════════════════════════════════════════════╝

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wraps_body_at_sixty_four_columns() {
        let pem = der_to_pem(&[0xab; 100]);
        let lines: Vec<&str> = pem.lines().collect();

        assert_eq!(lines.first(), Some(&PEM_HEADER));
        assert_eq!(lines.last(), Some(&PEM_FOOTER));
        // 100 bytes -> 136 base64 chars -> 64 + 64 + 8
        assert_eq!(lines[1].len(), 64);
        assert_eq!(lines[2].len(), 64);
        assert_eq!(lines[3].len(), 8);
        assert!(pem.ends_with("-----END CERTIFICATE-----\n"));
    }

    #[test]
    fn canonical_form_ignores_layout() {
        let pem = der_to_pem(b"some der bytes that are long enough to need two lines of base64 text");
        let reflowed = pem.replace('\n', "\r\n").replacen(
            PEM_HEADER,
            &format!("  {PEM_HEADER}"),
            1,
        );

        assert_eq!(canonicalize(&reflowed).unwrap(), pem);
        assert_eq!(canonicalize(&pem).unwrap(), pem);
    }

    #[test]
    fn rejects_text_without_a_certificate() {
        assert!(canonicalize("hello").is_err());
        assert!(canonicalize(&format!("{PEM_HEADER}\n{PEM_FOOTER}\n")).is_err());
        assert!(canonicalize(&format!("{PEM_HEADER}\n!!!!\n{PEM_FOOTER}\n")).is_err());
    }
}
