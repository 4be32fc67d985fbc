//! performer-core: interface descriptors, the ABI codec, wire types and
//! configuration. All other performer crates depend on this one.

pub mod abi;
pub mod config;
pub mod crypto;
pub mod interface;
pub mod wire;

pub use abi::{DecodeError, EncodeError, TypeTag, Value};
pub use interface::{InterfaceDescriptor, ParseError};
pub use wire::{Selector, TaskRequest, TaskResponse};
