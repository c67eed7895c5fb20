//! Wire charsets and the one-time switch from the fallback charset.

use encoding_rs::{BIG5, Decoder, Encoding, UTF_8};
use serde::{Deserialize, Serialize};
use tracing::info;

/// Banner the host shows, in UTF-8, right after it accepts credentials.
pub const LOGIN_BANNER: &str = "登入中，請稍候...";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Charset {
    #[default]
    Big5,
    #[serde(alias = "utf-8")]
    Utf8,
}

impl Charset {
    /// Charset every session starts in until the login banner is seen.
    pub const FALLBACK: Charset = Charset::Big5;

    pub fn encoding(self) -> &'static Encoding {
        match self {
            Charset::Big5 => BIG5,
            Charset::Utf8 => UTF_8,
        }
    }

    pub fn encode(self, text: &str) -> Vec<u8> {
        let (bytes, _, _) = self.encoding().encode(text);
        bytes.into_owned()
    }
}

/// Stateful decoder for the inbound byte stream.
///
/// Multi-byte sequences split across reads are carried over to the next
/// call to [`Codec::decode`].
pub struct Codec {
    active: Charset,
    configured: Charset,
    decoder: Decoder,
}

impl Codec {
    pub fn new(configured: Charset) -> Self {
        Self {
            active: Charset::FALLBACK,
            configured,
            decoder: Charset::FALLBACK.encoding().new_decoder_without_bom_handling(),
        }
    }

    pub fn active(&self) -> Charset {
        self.active
    }

    pub fn encode(&self, text: &str) -> Vec<u8> {
        self.active.encode(text)
    }

    /// Switch to the configured charset if `chunk` carries the login banner.
    /// Only applies before login and only once.
    pub fn observe(&mut self, chunk: &[u8], logged_in: bool) -> bool {
        if logged_in || self.active == self.configured {
            return false;
        }
        if !String::from_utf8_lossy(chunk).contains(LOGIN_BANNER) {
            return false;
        }
        info!(from = ?self.active, to = ?self.configured, "switching wire charset");
        self.active = self.configured;
        self.decoder = self.active.encoding().new_decoder_without_bom_handling();
        true
    }

    pub fn decode(&mut self, chunk: &[u8]) -> String {
        let capacity = self
            .decoder
            .max_utf8_buffer_length(chunk.len())
            .unwrap_or(chunk.len() * 3 + 16);
        let mut out = String::with_capacity(capacity);
        let (_, _, _) = self.decoder.decode_to_string(chunk, &mut out, false);
        out
    }
}
