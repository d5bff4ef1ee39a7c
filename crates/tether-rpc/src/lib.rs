// SPDX-FileCopyrightText: 2026 Tether Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! JSON-RPC 2.0 layer for Tether plugin servers.
//!
//! Services register under their name and expose `Service.Method` calls.
//! The `Handshake` service is always present and reports which interfaces the
//! server implements.

pub mod codec;
pub mod dispatch;
pub mod handshake;
pub mod registry;

pub use codec::{RpcErrorObject, RpcRequest, RpcResponse, codes};
pub use dispatch::{Dispatcher, handle_rpc, rpc_router};
pub use handshake::{HANDSHAKE_SERVICE, Handshake, InterfaceMap};
pub use registry::ServiceRegistry;
