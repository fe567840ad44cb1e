use axum::{extract::State, response::Html};
use certbridge_cert::{decode_certificate, TrustFile, CERT_CONTENTS_KEY, TRUST_FILE_LOCATION_KEY};
use std::sync::Arc;
use tracing::debug;

use crate::error::ApiError;
use crate::DebugState;

/// Render the trust certificate debug page
///
/// The trust file is opened twice per request, once as text and once as
/// bytes for X.509 decoding. Nothing is cached between requests.
pub async fn debug_page(State(state): State<Arc<DebugState>>) -> Result<Html<String>, ApiError> {
    debug!("Rendering debug page for {}", state.trust_file_location);

    let trust_file = TrustFile::at(&state.trust_file_location);

    let contents_from_file = trust_file.read_joined_lines().await?;
    let certificate = decode_certificate(&trust_file.read_bytes().await?)?;

    Ok(Html(render_page(
        &state,
        &contents_from_file,
        &certificate.to_string(),
    )))
}

fn render_page(state: &DebugState, contents_from_file: &str, decoded: &str) -> String {
    format!(
        "<html><body>\
         <p>{} = <br/><pre>{}</pre></p>\
         <p>{} = {}</p>\
         <p>Indirect via application.properties = {}</p>\
         <p>Cert contents read from file = <br/><pre>{}</pre></p>\
         <p>decoded cert: <pre>{}</pre></p>\
         </body></html>",
        CERT_CONTENTS_KEY,
        escape_html(&state.cert_contents),
        TRUST_FILE_LOCATION_KEY,
        escape_html(&state.trust_file_location),
        escape_html(&state.indirect),
        escape_html(contents_from_file),
        escape_html(decoded),
    )
}

fn escape_html(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for c in input.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            c => out.push(c),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_escape_html() {
        assert_eq!(escape_html("CN=a<b>&'\""), "CN=a&lt;b&gt;&amp;&#39;&quot;");
        assert_eq!(escape_html("/tmp/TibcoCert1.pem"), "/tmp/TibcoCert1.pem");
    }

    #[test]
    fn test_render_order() {
        let state = DebugState {
            cert_contents: "RAW".to_string(),
            trust_file_location: "/tmp/LOC.pem".to_string(),
            indirect: "INDIRECT".to_string(),
        };

        let page = render_page(&state, "FROMFILE", "DECODED");

        let positions: Vec<usize> = [
            "cert.contents",
            "RAW",
            "tibco.ems.SSLTrustedCertificate",
            "/tmp/LOC.pem",
            "INDIRECT",
            "FROMFILE",
            "DECODED",
        ]
        .iter()
        .map(|needle| page.find(needle).unwrap())
        .collect();

        assert!(positions.windows(2).all(|w| w[0] < w[1]));
    }
}
