//! Interface commands: inspect the declared method and build payloads.

use anyhow::{bail, Context, Result};
use performer_core::abi::{ADDRESS_LEN, WORD};
use performer_core::wire::SELECTOR_LEN;
use performer_core::{TypeTag, Value};
use performer_services::TaskDispatcher;

pub fn cmd_selector(dispatcher: &TaskDispatcher) -> Result<()> {
    let d = dispatcher.descriptor();

    println!("═══════════════════════════════════════");
    println!("  Declared Interface");
    println!("═══════════════════════════════════════");
    println!("  Signature : {}", d.signature());
    println!("  Selector  : {}", d.selector());
    println!("  Arguments : {}", d.arity());
    for (i, tag) in d.argument_types().iter().enumerate() {
        println!("    [{}] {}", i, tag);
    }
    if d.is_static() {
        println!("  Payload   : {} bytes", SELECTOR_LEN + d.head_size());
    } else {
        println!("  Payload   : at least {} bytes (dynamic)", SELECTOR_LEN + d.head_size());
    }
    println!("  Strategy  : {}", dispatcher.strategy_name());

    Ok(())
}

pub fn cmd_encode(dispatcher: &TaskDispatcher, raw: &[&str]) -> Result<()> {
    let d = dispatcher.descriptor();
    if raw.len() != d.arity() {
        bail!("{} takes {} arguments, got {}", d.signature(), d.arity(), raw.len());
    }

    let values = d
        .argument_types()
        .iter()
        .zip(raw)
        .enumerate()
        .map(|(i, (tag, text))| {
            parse_value(*tag, text).with_context(|| format!("argument {i} ({tag})"))
        })
        .collect::<Result<Vec<_>>>()?;

    let payload = d.encode_call(&values).context("failed to encode call")?;
    println!("0x{}", hex::encode(payload));
    Ok(())
}

/// Parse a command-line argument as a value of `tag`.
///
/// Byte types and addresses take hex (with or without `0x`). Integers take
/// decimal up to 128 bits or `0x` hex up to 256 bits. Strings are taken
/// verbatim.
pub fn parse_value(tag: TypeTag, text: &str) -> Result<Value> {
    Ok(match tag {
        TypeTag::FixedBytes(n) => {
            let bytes = decode_hex(text)?;
            if bytes.len() != n as usize {
                bail!("expected {} bytes, got {}", n, bytes.len());
            }
            Value::FixedBytes(bytes)
        }
        TypeTag::Uint(bits) => {
            if text.starts_with("0x") {
                let bytes = decode_hex(text)?;
                if bytes.len() > WORD {
                    bail!("integer wider than 256 bits");
                }
                let mut word = [0u8; WORD];
                word[WORD - bytes.len()..].copy_from_slice(&bytes);
                Value::Uint { bits, word }
            } else {
                let n: u128 = text.parse().context("expected a decimal integer")?;
                Value::uint(bits, n)
            }
        }
        TypeTag::Address => {
            let bytes = decode_hex(text)?;
            let a: [u8; ADDRESS_LEN] = bytes
                .as_slice()
                .try_into()
                .with_context(|| format!("expected {} bytes, got {}", ADDRESS_LEN, bytes.len()))?;
            Value::Address(a)
        }
        TypeTag::Bool => match text {
            "true" | "1" => Value::Bool(true),
            "false" | "0" => Value::Bool(false),
            other => bail!("expected true or false, got {other:?}"),
        },
        TypeTag::Bytes => Value::Bytes(decode_hex(text)?),
        TypeTag::String => Value::String(text.to_string()),
    })
}

pub fn decode_hex(text: &str) -> Result<Vec<u8>> {
    let body = text.strip_prefix("0x").unwrap_or(text);
    hex::decode(body).with_context(|| format!("invalid hex: {text:?}"))
}
