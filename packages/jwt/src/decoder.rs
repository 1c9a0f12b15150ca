//! Token decoder.
//!
//! Decoding only checks structure. Nothing here looks at `alg` beyond
//! exposing it, and no signature is checked; that is the verifier's job.

use crate::base64::decode_segment;
use crate::claim::Claim;
use crate::error::{ErrorKind, JwtError, JwtResult};
use crate::json::{JsonTraits, SerdeJson};
use crate::types::{ClaimMap, Header, Payload};
use crate::validation::DecodeOptions;
use std::fmt;
use std::marker::PhantomData;

/// Splits and parses untrusted token strings.
pub struct Decoder<J: JsonTraits = SerdeJson> {
    options: DecodeOptions,
    _backend: PhantomData<fn() -> J>,
}

impl Decoder<SerdeJson> {
    /// Decoder over the bundled `serde_json` backend with default limits.
    pub fn new() -> Self {
        Self::with_backend()
    }
}

impl Default for Decoder<SerdeJson> {
    fn default() -> Self {
        Self::new()
    }
}

impl<J: JsonTraits> Decoder<J> {
    /// Decoder over any backend with default limits.
    pub fn with_backend() -> Self {
        Self {
            options: DecodeOptions::default(),
            _backend: PhantomData,
        }
    }

    /// Replace the limits.
    #[must_use]
    pub fn with_options(mut self, options: DecodeOptions) -> Self {
        self.options = options;
        self
    }

    /// Limits in force.
    pub fn options(&self) -> &DecodeOptions {
        &self.options
    }

    /// Decode raw bytes, which must be UTF-8.
    pub fn decode_bytes(&self, token: &[u8]) -> JwtResult<DecodedToken<J>> {
        let token = std::str::from_utf8(token)
            .map_err(|_| JwtError::token_format("token is not valid UTF-8"))?;
        self.decode(token)
    }

    /// Decode `header.payload.signature`.
    ///
    /// Exactly three segments are required. Header and payload must be
    /// non-empty base64url JSON objects. The signature segment may be empty,
    /// which is how `none` tokens look.
    pub fn decode(&self, token: &str) -> JwtResult<DecodedToken<J>> {
        if token.len() > self.options.max_token_len {
            return Err(JwtError::TokenFormat(format!(
                "token length {} exceeds limit of {}",
                token.len(),
                self.options.max_token_len
            )));
        }

        let mut segments = token.split('.');
        let (header_b64, payload_b64, signature_b64) =
            match (segments.next(), segments.next(), segments.next(), segments.next()) {
                (Some(h), Some(p), Some(s), None) => (h, p, s),
                _ => return Err(JwtError::token_format("wrong number of segments")),
            };

        let header_json = self.json_segment("header", header_b64)?;
        let payload_json = self.json_segment("payload", payload_b64)?;
        self.check_len("signature", signature_b64)?;
        let signature = decode_segment(signature_b64)
            .map_err(|e| JwtError::TokenFormat(format!("signature segment: {e}")))?;

        let header = Header::from(parse_object::<J>("header", &header_json)?);
        let payload = Payload::from(parse_object::<J>("payload", &payload_json)?);

        tracing::trace!(
            header_len = header_b64.len(),
            payload_len = payload_b64.len(),
            signature_len = signature.len(),
            "token decoded"
        );

        Ok(DecodedToken {
            header_segment: header_b64.to_string(),
            payload_segment: payload_b64.to_string(),
            signature_segment: signature_b64.to_string(),
            header_json,
            payload_json,
            signature,
            header,
            payload,
        })
    }

    fn check_len(&self, part: &str, segment: &str) -> JwtResult<()> {
        if segment.len() > self.options.max_segment_len {
            return Err(JwtError::TokenFormat(format!(
                "{part} segment length {} exceeds limit of {}",
                segment.len(),
                self.options.max_segment_len
            )));
        }
        Ok(())
    }

    fn json_segment(&self, part: &str, segment: &str) -> JwtResult<String> {
        if segment.is_empty() {
            return Err(JwtError::TokenFormat(format!("empty {part} segment")));
        }
        self.check_len(part, segment)?;
        let bytes = decode_segment(segment)
            .map_err(|e| JwtError::TokenFormat(format!("{part} segment: {e}")))?;
        String::from_utf8(bytes)
            .map_err(|_| JwtError::TokenFormat(format!("{part} segment is not UTF-8")))
    }
}

fn parse_object<J: JsonTraits>(part: &str, text: &str) -> JwtResult<ClaimMap<J>> {
    ClaimMap::parse(text).map_err(|e| match e.kind() {
        ErrorKind::TokenFormat => JwtError::TokenFormat(format!("{part}: {e}")),
        _ => JwtError::TokenFormat(format!("{part} is not valid JSON: {e}")),
    })
}

impl<J: JsonTraits> Clone for Decoder<J> {
    fn clone(&self) -> Self {
        Self {
            options: self.options,
            _backend: PhantomData,
        }
    }
}

impl<J: JsonTraits> fmt::Debug for Decoder<J> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Decoder")
            .field("options", &self.options)
            .finish()
    }
}

/// A parsed, unverified token.
///
/// Owns copies of the three raw segments exactly as they appeared in the
/// input, so the signing input can be rebuilt byte for byte.
pub struct DecodedToken<J: JsonTraits = SerdeJson> {
    header_segment: String,
    payload_segment: String,
    signature_segment: String,
    header_json: String,
    payload_json: String,
    signature: Vec<u8>,
    header: Header<J>,
    payload: Payload<J>,
}

impl<J: JsonTraits> DecodedToken<J> {
    /// The full token text.
    pub fn token(&self) -> String {
        format!(
            "{}.{}.{}",
            self.header_segment, self.payload_segment, self.signature_segment
        )
    }

    /// Base64url header segment, verbatim.
    pub fn header_segment(&self) -> &str {
        &self.header_segment
    }

    /// Base64url payload segment, verbatim.
    pub fn payload_segment(&self) -> &str {
        &self.payload_segment
    }

    /// Base64url signature segment, verbatim.
    pub fn signature_segment(&self) -> &str {
        &self.signature_segment
    }

    /// Decoded header JSON text.
    pub fn header_json(&self) -> &str {
        &self.header_json
    }

    /// Decoded payload JSON text.
    pub fn payload_json(&self) -> &str {
        &self.payload_json
    }

    /// Decoded signature bytes.
    pub fn signature(&self) -> &[u8] {
        &self.signature
    }

    /// Header claims.
    pub fn header(&self) -> &Header<J> {
        &self.header
    }

    /// Payload claims.
    pub fn payload(&self) -> &Payload<J> {
        &self.payload
    }

    /// Header claim by name.
    pub fn header_claim(&self, name: &str) -> Option<&Claim<J>> {
        self.header.get(name)
    }

    /// Payload claim by name.
    pub fn payload_claim(&self, name: &str) -> Option<&Claim<J>> {
        self.payload.get(name)
    }

    /// Header `alg`, untrusted.
    pub fn algorithm(&self) -> JwtResult<Option<&str>> {
        self.header.algorithm()
    }

    /// The bytes the signature covers: `header_segment.payload_segment`.
    pub fn signing_input(&self) -> String {
        let mut data = String::with_capacity(self.header_segment.len() + 1 + self.payload_segment.len());
        data.push_str(&self.header_segment);
        data.push('.');
        data.push_str(&self.payload_segment);
        data
    }
}

impl<J: JsonTraits> Clone for DecodedToken<J> {
    fn clone(&self) -> Self {
        Self {
            header_segment: self.header_segment.clone(),
            payload_segment: self.payload_segment.clone(),
            signature_segment: self.signature_segment.clone(),
            header_json: self.header_json.clone(),
            payload_json: self.payload_json.clone(),
            signature: self.signature.clone(),
            header: self.header.clone(),
            payload: self.payload.clone(),
        }
    }
}

impl<J: JsonTraits> fmt::Debug for DecodedToken<J> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DecodedToken")
            .field("header", &self.header)
            .field("payload", &self.payload)
            .field("signature_len", &self.signature.len())
            .finish()
    }
}
