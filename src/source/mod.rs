// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Source descriptors and their credentials.
//!
//! A [`SourceDescriptor`] says where the compiled inference module lives and
//! how to authenticate for it. [`build_headers`] turns its [`AuthScheme`] into
//! request headers.

mod credentials;
mod descriptor;

pub use credentials::build_headers;
pub use descriptor::{AuthScheme, SourceDescriptor, SourceError, SourceModified};
