//! Interface descriptors: the method a performer accepts and the shape of
//! its arguments.
//!
//! A descriptor is built once at startup, either from an ABI JSON document
//! or from a human-readable signature, and is read-only afterwards. Its
//! selector is computed at construction and cached.

use serde::Deserialize;

use crate::abi::{self, DecodeError, EncodeError, TypeTag, Value, WORD};
use crate::wire::Selector;

// ── Errors ────────────────────────────────────────────────────────────────────

/// The interface description could not be turned into a descriptor.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParseError {
    #[error("invalid ABI JSON: {0}")]
    InvalidJson(String),

    #[error("ABI function entry has no name")]
    MissingName,

    #[error("method '{0}' not found in ABI")]
    MethodNotFound(String),

    #[error("unsupported argument type '{0}'")]
    UnsupportedType(String),

    #[error("malformed signature '{0}'")]
    InvalidSignature(String),

    #[error("invalid method name '{0}'")]
    InvalidName(String),
}

// ── ABI JSON ──────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum AbiDocument {
    Entries(Vec<AbiEntry>),
    Single(AbiEntry),
}

#[derive(Debug, Deserialize)]
struct AbiEntry {
    #[serde(default)]
    name: Option<String>,
    /// "function", "event", "constructor", ... Missing means function.
    #[serde(rename = "type", default)]
    kind: Option<String>,
    #[serde(default)]
    inputs: Vec<AbiParam>,
}

#[derive(Debug, Deserialize)]
struct AbiParam {
    #[serde(rename = "type")]
    ty: String,
}

// ── Descriptor ────────────────────────────────────────────────────────────────

/// A declared method: its name, ordered argument types and selector.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InterfaceDescriptor {
    name: String,
    argument_types: Vec<TypeTag>,
    selector: Selector,
}

impl InterfaceDescriptor {
    pub fn new(name: impl Into<String>, argument_types: Vec<TypeTag>) -> Result<Self, ParseError> {
        let name = name.into();
        if !is_identifier(&name) {
            return Err(ParseError::InvalidName(name));
        }
        let selector = Selector::from_signature(&canonical_signature(&name, &argument_types));
        Ok(Self {
            name,
            argument_types,
            selector,
        })
    }

    /// Pick `method` out of an ABI JSON document.
    ///
    /// Accepts a full ABI array or a single entry object. Non-function
    /// entries are skipped; a function entry without a name is an error.
    pub fn parse(abi_json: &str, method: &str) -> Result<Self, ParseError> {
        let document: AbiDocument =
            serde_json::from_str(abi_json).map_err(|e| ParseError::InvalidJson(e.to_string()))?;
        let entries = match document {
            AbiDocument::Entries(v) => v,
            AbiDocument::Single(e) => vec![e],
        };

        let mut found = None;
        for entry in entries {
            if entry.kind.as_deref().is_some_and(|k| k != "function") {
                continue;
            }
            let name = entry.name.ok_or(ParseError::MissingName)?;
            if name == method && found.is_none() {
                found = Some((name, entry.inputs));
            }
        }

        let (name, inputs) = found.ok_or_else(|| ParseError::MethodNotFound(method.to_string()))?;
        let types = inputs
            .iter()
            .map(|p| p.ty.parse::<TypeTag>())
            .collect::<Result<Vec<_>, _>>()?;
        Self::new(name, types)
    }

    /// Parse a signature such as `dummy(bytes32)` or `pay(address, uint256)`.
    pub fn from_signature(signature: &str) -> Result<Self, ParseError> {
        let invalid = || ParseError::InvalidSignature(signature.to_string());
        let text = signature.trim();

        let open = text.find('(').ok_or_else(invalid)?;
        let inner = text[open + 1..].strip_suffix(')').ok_or_else(invalid)?;
        if inner.contains('(') || inner.contains(')') {
            return Err(invalid());
        }

        let name = text[..open].trim();
        let types = if inner.trim().is_empty() {
            Vec::new()
        } else {
            inner
                .split(',')
                .map(str::parse::<TypeTag>)
                .collect::<Result<Vec<_>, _>>()?
        };
        Self::new(name, types)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn argument_types(&self) -> &[TypeTag] {
        &self.argument_types
    }

    pub fn arity(&self) -> usize {
        self.argument_types.len()
    }

    pub fn selector(&self) -> Selector {
        self.selector
    }

    /// Canonical signature text the selector is derived from.
    pub fn signature(&self) -> String {
        canonical_signature(&self.name, &self.argument_types)
    }

    /// True when no argument is dynamic, i.e. every valid payload has the
    /// same length.
    pub fn is_static(&self) -> bool {
        !self.argument_types.iter().any(TypeTag::is_dynamic)
    }

    /// Size of the head section: one word per argument.
    pub fn head_size(&self) -> usize {
        WORD * self.argument_types.len()
    }

    /// Exact encoded length of `values`, without encoding them.
    pub fn encoded_size_of(&self, values: &[Value]) -> usize {
        abi::encoded_size(values)
    }

    /// Default-valued argument tuple matching the declared types.
    pub fn reference_arguments(&self) -> Vec<Value> {
        self.argument_types.iter().map(TypeTag::default_value).collect()
    }

    /// `selector || encoding` for a full call.
    pub fn encode_call(&self, values: &[Value]) -> Result<Vec<u8>, EncodeError> {
        let args = abi::encode(&self.argument_types, values)?;
        let mut out = Vec::with_capacity(self.selector.0.len() + args.len());
        out.extend_from_slice(&self.selector.0);
        out.extend_from_slice(&args);
        Ok(out)
    }

    /// Decode an argument region (selector already stripped).
    pub fn decode_arguments(&self, data: &[u8]) -> Result<Vec<Value>, DecodeError> {
        abi::decode(&self.argument_types, data)
    }
}

fn canonical_signature(name: &str, types: &[TypeTag]) -> String {
    let args: Vec<String> = types.iter().map(TypeTag::canonical_name).collect();
    format!("{}({})", name, args.join(","))
}

fn is_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' || c == '$' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '$')
}

// ── Tests ─────────────────────────────────────────────────────────────────────
