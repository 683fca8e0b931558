// Copyright 2025 eraflo
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Defines the hierarchy of error types for the rendering subsystem.

use crate::renderer::types::ProgramId;
use std::fmt;

/// An error related to the compilation or use of a GPU program.
#[derive(Debug)]
pub enum ShaderError {
    /// The program source failed to compile.
    CompilationError {
        /// The program name.
        label: String,
        /// Detailed error messages from the compiler.
        details: String,
    },
    /// The requested program does not exist on the device.
    NotFound {
        /// The id that was looked up.
        id: ProgramId,
    },
    /// The entry point is not present in the program source.
    InvalidEntryPoint {
        /// The program name.
        label: String,
        /// The entry point that was not found.
        entry_point: String,
    },
    /// The device cannot compile this source language.
    UnsupportedLanguage {
        /// The program name.
        label: String,
        /// The requested language.
        language: String,
    },
    /// No bound program declares the parameter.
    UnknownParameter {
        /// The parameter name.
        name: String,
    },
}

impl fmt::Display for ShaderError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ShaderError::CompilationError { label, details } => {
                write!(f, "Program compilation failed for '{label}': {details}")
            }
            ShaderError::NotFound { id } => {
                write!(f, "GPU program not found for ID: {id:?}")
            }
            ShaderError::InvalidEntryPoint { label, entry_point } => {
                write!(f, "Invalid entry point '{entry_point}' for program '{label}'")
            }
            ShaderError::UnsupportedLanguage { label, language } => {
                write!(
                    f,
                    "Program '{label}' uses unsupported language '{language}'"
                )
            }
            ShaderError::UnknownParameter { name } => {
                write!(f, "No bound program declares parameter '{name}'")
            }
        }
    }
}

impl std::error::Error for ShaderError {}

/// An error related to the creation or use of a GPU resource (programs, buffers, textures).
#[derive(Debug)]
pub enum ResourceError {
    /// A program-specific error occurred.
    Shader(ShaderError),
    /// The referenced resource does not exist.
    NotFound {
        /// Resource kind, e.g. `"buffer"`.
        kind: &'static str,
        /// Raw id value.
        id: u64,
    },
    /// A resource with this id already exists.
    AlreadyExists {
        /// Resource kind.
        kind: &'static str,
        /// Raw id value.
        id: u64,
    },
    /// An access fell outside the resource's bounds.
    OutOfBounds {
        /// Resource kind.
        kind: &'static str,
        /// Raw id value.
        id: u64,
        /// The end of the attempted access, in bytes.
        end: u64,
        /// The size of the resource, in bytes.
        size: u64,
    },
    /// The descriptor is invalid for this device.
    InvalidDescriptor(String),
    /// An error originating from the specific device implementation.
    BackendError(String),
}

impl fmt::Display for ResourceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResourceError::Shader(err) => write!(f, "Program resource error: {err}"),
            ResourceError::NotFound { kind, id } => {
                write!(f, "No {kind} exists with ID {id}.")
            }
            ResourceError::AlreadyExists { kind, id } => {
                write!(f, "A {kind} already exists with ID {id}.")
            }
            ResourceError::OutOfBounds { kind, id, end, size } => {
                write!(
                    f,
                    "Access to {kind} {id} ends at byte {end} but it holds {size} bytes."
                )
            }
            ResourceError::InvalidDescriptor(msg) => write!(f, "Invalid descriptor: {msg}"),
            ResourceError::BackendError(msg) => {
                write!(f, "Backend-specific resource error: {msg}")
            }
        }
    }
}

impl std::error::Error for ResourceError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ResourceError::Shader(err) => Some(err),
            _ => None,
        }
    }
}

impl From<ShaderError> for ResourceError {
    fn from(err: ShaderError) -> Self {
        ResourceError::Shader(err)
    }
}

/// A high-level error raised by the render system or its device.
#[derive(Debug)]
pub enum RenderError {
    /// An operation was attempted before the rendering system was initialized.
    NotInitialized,
    /// A failure occurred while starting the render system.
    InitializationFailed(String),
    /// The command is not valid in the device's current state
    /// (e.g. a draw outside of a pass).
    InvalidState(String),
    /// A rendering operation failed.
    RenderingFailed(String),
    /// An error occurred while managing a GPU resource.
    ResourceError(ResourceError),
    /// The graphics device was lost.
    DeviceLost,
    /// An unexpected or internal error occurred.
    Internal(String),
}

impl fmt::Display for RenderError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RenderError::NotInitialized => {
                write!(f, "The rendering system is not initialized.")
            }
            RenderError::InitializationFailed(msg) => {
                write!(f, "Failed to initialize the render system: {msg}")
            }
            RenderError::InvalidState(msg) => {
                write!(f, "Command is invalid in the current device state: {msg}")
            }
            RenderError::RenderingFailed(msg) => {
                write!(f, "A rendering operation failed: {msg}")
            }
            RenderError::ResourceError(err) => {
                write!(f, "Graphics resource operation failed: {err}")
            }
            RenderError::DeviceLost => write!(
                f,
                "The graphics device was lost and needs to be reinitialized."
            ),
            RenderError::Internal(msg) => {
                write!(f, "An internal or unexpected error occurred: {msg}")
            }
        }
    }
}

impl std::error::Error for RenderError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            RenderError::ResourceError(err) => Some(err),
            _ => None,
        }
    }
}

impl From<ResourceError> for RenderError {
    fn from(err: ResourceError) -> Self {
        RenderError::ResourceError(err)
    }
}

impl From<ShaderError> for RenderError {
    fn from(err: ShaderError) -> Self {
        RenderError::ResourceError(ResourceError::Shader(err))
    }
}
