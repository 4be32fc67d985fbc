//! ABI argument codec: the closed set of argument types a performer
//! understands and their 32-byte-word encoding.
//!
//! Layout follows the Solidity contract ABI: every argument owns one head
//! word. Static values live in the head; dynamic values (`bytes`, `string`)
//! put an offset in the head and their length-prefixed, zero-padded data in
//! the tail. All integers are big-endian.
//!
//! Decoding is strict. Padding must be zero, booleans must be exactly 0 or
//! 1 and every offset must point at the next unread tail, so no byte can go
//! unreferenced. There is no unsafe code in this module.

use std::fmt;
use std::str::FromStr;

use crate::interface::ParseError;

/// Size of one ABI word in bytes.
pub const WORD: usize = 32;

/// Size of an address value in bytes.
pub const ADDRESS_LEN: usize = 20;

// ── Type tags ─────────────────────────────────────────────────────────────────

/// Shape of one declared argument.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TypeTag {
    /// `bytesN`, 1 ≤ N ≤ 32. Left-aligned in its word.
    FixedBytes(u8),
    /// `uintN`, 8 ≤ N ≤ 256 in steps of 8. Right-aligned in its word.
    Uint(u16),
    /// 20-byte account address.
    Address,
    Bool,
    /// Variable-length byte sequence.
    Bytes,
    /// Variable-length UTF-8 text.
    String,
}

impl TypeTag {
    /// The name used in canonical signatures (`bytes32`, `uint256`, ...).
    pub fn canonical_name(&self) -> String {
        match self {
            Self::FixedBytes(n) => format!("bytes{n}"),
            Self::Uint(bits) => format!("uint{bits}"),
            Self::Address => "address".to_string(),
            Self::Bool => "bool".to_string(),
            Self::Bytes => "bytes".to_string(),
            Self::String => "string".to_string(),
        }
    }

    /// True when the value is stored in the tail behind an offset.
    pub fn is_dynamic(&self) -> bool {
        matches!(self, Self::Bytes | Self::String)
    }

    /// The zero value of this type. Used to build reference tuples for
    /// length checks.
    pub fn default_value(&self) -> Value {
        match self {
            Self::FixedBytes(n) => Value::FixedBytes(vec![0u8; *n as usize]),
            Self::Uint(bits) => Value::Uint {
                bits: *bits,
                word: [0u8; WORD],
            },
            Self::Address => Value::Address([0u8; ADDRESS_LEN]),
            Self::Bool => Value::Bool(false),
            Self::Bytes => Value::Bytes(Vec::new()),
            Self::String => Value::String(String::new()),
        }
    }
}

impl fmt::Display for TypeTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.canonical_name())
    }
}

impl FromStr for TypeTag {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let name = s.trim();
        let unsupported = || ParseError::UnsupportedType(name.to_string());

        match name {
            "address" => return Ok(Self::Address),
            "bool" => return Ok(Self::Bool),
            "bytes" => return Ok(Self::Bytes),
            "string" => return Ok(Self::String),
            "uint" => return Ok(Self::Uint(256)),
            _ => {}
        }

        if let Some(digits) = name.strip_prefix("uint") {
            let bits = parse_width(digits).ok_or_else(unsupported)?;
            if (8..=256).contains(&bits) && bits % 8 == 0 {
                return Ok(Self::Uint(bits));
            }
        } else if let Some(digits) = name.strip_prefix("bytes") {
            let n = parse_width(digits).ok_or_else(unsupported)?;
            if (1..=WORD as u16).contains(&n) {
                return Ok(Self::FixedBytes(n as u8));
            }
        }

        Err(unsupported())
    }
}

/// Width suffix of `uintN` / `bytesN`. Only canonical decimal is accepted:
/// no sign, no leading zero.
fn parse_width(digits: &str) -> Option<u16> {
    if digits.is_empty() || digits.starts_with('0') || !digits.bytes().all(|b| b.is_ascii_digit())
    {
        return None;
    }
    digits.parse().ok()
}

// ── Values ────────────────────────────────────────────────────────────────────

/// One decoded (or to-be-encoded) argument.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Value {
    FixedBytes(Vec<u8>),
    /// Big-endian 256-bit word. For `bits < 256` the high bytes are zero.
    Uint { bits: u16, word: [u8; WORD] },
    Address([u8; ADDRESS_LEN]),
    Bool(bool),
    Bytes(Vec<u8>),
    String(String),
}

impl Value {
    /// A `uint256` from a native integer.
    pub fn uint256(n: u128) -> Self {
        Self::uint(256, n)
    }

    /// A `uintN` from a native integer. Range is not checked here;
    /// `encode` rejects values that overflow `bits`.
    pub fn uint(bits: u16, n: u128) -> Self {
        let mut word = [0u8; WORD];
        word[WORD - 16..].copy_from_slice(&n.to_be_bytes());
        Self::Uint { bits, word }
    }

    /// A `bytes32` value.
    pub fn bytes32(b: [u8; 32]) -> Self {
        Self::FixedBytes(b.to_vec())
    }

    /// The runtime shape of this value.
    pub fn type_tag(&self) -> TypeTag {
        match self {
            // Lengths that cannot be a valid bytesN map to an impossible tag
            // so they never compare equal to a declared one.
            Self::FixedBytes(b) => TypeTag::FixedBytes(u8::try_from(b.len()).unwrap_or(u8::MAX)),
            Self::Uint { bits, .. } => TypeTag::Uint(*bits),
            Self::Address(_) => TypeTag::Address,
            Self::Bool(_) => TypeTag::Bool,
            Self::Bytes(_) => TypeTag::Bytes,
            Self::String(_) => TypeTag::String,
        }
    }

    /// The integer value, if this is a uint that fits in 128 bits.
    pub fn as_u128(&self) -> Option<u128> {
        match self {
            Self::Uint { word, .. } if word[..WORD - 16].iter().all(|b| *b == 0) => {
                let mut low = [0u8; 16];
                low.copy_from_slice(&word[WORD - 16..]);
                Some(u128::from_be_bytes(low))
            }
            _ => None,
        }
    }

    /// `0x`-prefixed lowercase hex of the value's natural bytes: the raw
    /// bytes for byte types, the full word for integers, the 20-byte
    /// address, `0x00`/`0x01` for booleans and the UTF-8 bytes for strings.
    pub fn to_prefixed_hex(&self) -> String {
        let body = match self {
            Self::FixedBytes(b) | Self::Bytes(b) => hex::encode(b),
            Self::Uint { word, .. } => hex::encode(word),
            Self::Address(a) => hex::encode(a),
            Self::Bool(b) => hex::encode([*b as u8]),
            Self::String(s) => hex::encode(s.as_bytes()),
        };
        format!("0x{body}")
    }

    /// True when the value can be encoded as its own `type_tag()`.
    fn in_range(&self) -> bool {
        match self {
            Self::FixedBytes(b) => (1..=WORD).contains(&b.len()),
            Self::Uint { bits, word } => {
                *bits <= 256 && word[..WORD - (*bits as usize / 8)].iter().all(|b| *b == 0)
            }
            _ => true,
        }
    }
}

// ── Errors ────────────────────────────────────────────────────────────────────

/// Malformed argument encoding.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DecodeError {
    #[error("argument data truncated: need {needed} bytes, have {available}")]
    Truncated { needed: usize, available: usize },

    #[error("argument {position}: non-zero padding")]
    NonZeroPadding { position: usize },

    #[error("argument {position}: bool word is not 0 or 1")]
    InvalidBool { position: usize },

    #[error("argument {position}: offset out of range")]
    OffsetOutOfRange { position: usize },

    #[error("argument {position}: tail offset {actual} is not canonical, expected {expected}")]
    NonCanonicalOffset {
        position: usize,
        expected: usize,
        actual: usize,
    },

    #[error("argument {position}: length prefix out of range")]
    LengthOutOfRange { position: usize },

    #[error("argument {position}: string is not valid UTF-8")]
    InvalidUtf8 { position: usize },
}

/// A value tuple that does not fit the declared types.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EncodeError {
    #[error("expected {expected} arguments, got {actual}")]
    ArityMismatch { expected: usize, actual: usize },

    #[error("argument {position}: expected {expected}, got {actual}")]
    TypeMismatch {
        position: usize,
        expected: TypeTag,
        actual: TypeTag,
    },

    #[error("argument {position}: value does not fit its type")]
    OutOfRange { position: usize },
}

// ── Sizing ────────────────────────────────────────────────────────────────────

/// Round `n` up to a whole number of words.
fn padded(n: usize) -> usize {
    n.div_ceil(WORD) * WORD
}

/// Exact length of `encode(values)`, computed without encoding.
pub fn encoded_size(values: &[Value]) -> usize {
    values
        .iter()
        .map(|v| {
            WORD + match v {
                Value::Bytes(b) => WORD + padded(b.len()),
                Value::String(s) => WORD + padded(s.len()),
                _ => 0,
            }
        })
        .sum()
}

// ── Encoding ──────────────────────────────────────────────────────────────────

/// Encode `values` as the argument tuple `types`.
pub fn encode(types: &[TypeTag], values: &[Value]) -> Result<Vec<u8>, EncodeError> {
    if types.len() != values.len() {
        return Err(EncodeError::ArityMismatch {
            expected: types.len(),
            actual: values.len(),
        });
    }
    for (position, (tag, value)) in types.iter().zip(values).enumerate() {
        if value.type_tag() != *tag {
            return Err(EncodeError::TypeMismatch {
                position,
                expected: *tag,
                actual: value.type_tag(),
            });
        }
        if !value.in_range() {
            return Err(EncodeError::OutOfRange { position });
        }
    }

    let head_len = WORD * values.len();
    let mut out = Vec::with_capacity(encoded_size(values));
    let mut tail = Vec::new();

    for value in values {
        match value {
            Value::Bytes(data) => {
                out.extend_from_slice(&usize_word(head_len + tail.len()));
                push_dynamic(&mut tail, data);
            }
            Value::String(s) => {
                out.extend_from_slice(&usize_word(head_len + tail.len()));
                push_dynamic(&mut tail, s.as_bytes());
            }
            _ => out.extend_from_slice(&static_word(value)),
        }
    }

    out.extend_from_slice(&tail);
    Ok(out)
}

fn static_word(value: &Value) -> [u8; WORD] {
    let mut word = [0u8; WORD];
    match value {
        Value::FixedBytes(b) => word[..b.len()].copy_from_slice(b),
        Value::Uint { word: w, .. } => word = *w,
        Value::Address(a) => word[WORD - ADDRESS_LEN..].copy_from_slice(a),
        Value::Bool(b) => word[WORD - 1] = *b as u8,
        Value::Bytes(_) | Value::String(_) => {}
    }
    word
}

fn usize_word(n: usize) -> [u8; WORD] {
    let mut word = [0u8; WORD];
    word[WORD - 8..].copy_from_slice(&(n as u64).to_be_bytes());
    word
}

fn push_dynamic(tail: &mut Vec<u8>, data: &[u8]) {
    tail.extend_from_slice(&usize_word(data.len()));
    tail.extend_from_slice(data);
    tail.resize(tail.len() + padded(data.len()) - data.len(), 0);
}

// ── Decoding ──────────────────────────────────────────────────────────────────

/// Decode `data` as the argument tuple `types`.
///
/// Produces exactly one value per declared type. Dynamic offsets must be
/// canonical: each tail starts where the previous one ended, the first
/// right after the head. Trailing bytes past the last tail are not
/// inspected here; callers that need an exact-length guarantee compare
/// against `encoded_size`.
pub fn decode(types: &[TypeTag], data: &[u8]) -> Result<Vec<Value>, DecodeError> {
    let head_len = WORD * types.len();
    if data.len() < head_len {
        return Err(DecodeError::Truncated {
            needed: head_len,
            available: data.len(),
        });
    }

    let mut values = Vec::with_capacity(types.len());
    let mut tail_offset = head_len;
    for (position, tag) in types.iter().enumerate() {
        let word = word_at(data, position * WORD).ok_or(DecodeError::Truncated {
            needed: head_len,
            available: data.len(),
        })?;
        values.push(decode_one(*tag, position, word, data, &mut tail_offset)?);
    }
    Ok(values)
}

/// `tail_offset` is where the next dynamic tail must start. It is advanced
/// past every tail read.
fn decode_one(
    tag: TypeTag,
    position: usize,
    word: &[u8; WORD],
    data: &[u8],
    tail_offset: &mut usize,
) -> Result<Value, DecodeError> {
    let zero = |bytes: &[u8]| bytes.iter().all(|b| *b == 0);

    match tag {
        TypeTag::FixedBytes(n) => {
            let n = n as usize;
            if !zero(&word[n..]) {
                return Err(DecodeError::NonZeroPadding { position });
            }
            Ok(Value::FixedBytes(word[..n].to_vec()))
        }
        TypeTag::Uint(bits) => {
            if !zero(&word[..WORD - bits as usize / 8]) {
                return Err(DecodeError::NonZeroPadding { position });
            }
            Ok(Value::Uint { bits, word: *word })
        }
        TypeTag::Address => {
            if !zero(&word[..WORD - ADDRESS_LEN]) {
                return Err(DecodeError::NonZeroPadding { position });
            }
            let mut a = [0u8; ADDRESS_LEN];
            a.copy_from_slice(&word[WORD - ADDRESS_LEN..]);
            Ok(Value::Address(a))
        }
        TypeTag::Bool => {
            if !zero(&word[..WORD - 1]) || word[WORD - 1] > 1 {
                return Err(DecodeError::InvalidBool { position });
            }
            Ok(Value::Bool(word[WORD - 1] == 1))
        }
        TypeTag::Bytes => Ok(Value::Bytes(
            read_dynamic(position, word, data, tail_offset)?.to_vec(),
        )),
        TypeTag::String => {
            let raw = read_dynamic(position, word, data, tail_offset)?;
            let s = std::str::from_utf8(raw).map_err(|_| DecodeError::InvalidUtf8 { position })?;
            Ok(Value::String(s.to_string()))
        }
    }
}

/// Follow a head offset to a length-prefixed tail region and return its data.
/// The offset must equal `*tail_offset`, which then moves past the region.
fn read_dynamic<'a>(
    position: usize,
    head: &[u8; WORD],
    data: &'a [u8],
    tail_offset: &mut usize,
) -> Result<&'a [u8], DecodeError> {
    let offset = word_to_usize(head)
        .filter(|o| o % WORD == 0)
        .ok_or(DecodeError::OffsetOutOfRange { position })?;
    let len_word = word_at(data, offset).ok_or(DecodeError::OffsetOutOfRange { position })?;
    if offset != *tail_offset {
        return Err(DecodeError::NonCanonicalOffset {
            position,
            expected: *tail_offset,
            actual: offset,
        });
    }

    let len = word_to_usize(len_word)
        .filter(|l| *l <= data.len())
        .ok_or(DecodeError::LengthOutOfRange { position })?;
    let start = offset + WORD;
    let end = start
        .checked_add(len)
        .ok_or(DecodeError::LengthOutOfRange { position })?;
    let padded_end = start
        .checked_add(padded(len))
        .ok_or(DecodeError::LengthOutOfRange { position })?;
    if padded_end > data.len() {
        return Err(DecodeError::LengthOutOfRange { position });
    }
    if data[end..padded_end].iter().any(|b| *b != 0) {
        return Err(DecodeError::NonZeroPadding { position });
    }
    *tail_offset = padded_end;
    Ok(&data[start..end])
}

fn word_at(data: &[u8], offset: usize) -> Option<&[u8; WORD]> {
    let end = offset.checked_add(WORD)?;
    data.get(offset..end)?.try_into().ok()
}

/// Interpret a word as a length or offset. Anything above `u64` is out of
/// range for a buffer we could hold.
fn word_to_usize(word: &[u8; WORD]) -> Option<usize> {
    if word[..WORD - 8].iter().any(|b| *b != 0) {
        return None;
    }
    let mut low = [0u8; 8];
    low.copy_from_slice(&word[WORD - 8..]);
    usize::try_from(u64::from_be_bytes(low)).ok()
}

// ── Tests ─────────────────────────────────────────────────────────────────────
