// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Command protocol toward the inference module.
//!
//! Requests become an argument vector (`argv[0]` is always `infer`); the
//! module's captured stdout becomes an [`InvocationResponse`]. The argument
//! vector is the whole wire format: nothing is written to the guest's stdin.

mod metadata;
mod request;
mod response;

pub use metadata::{decode_metadata, AlgorithmDescriptor, VariantDescriptor};
pub use request::{encode, InferRequest, InvocationRequest, RequestOptions, SubtypeRequest};
pub use response::{decode, InvocationResponse};
