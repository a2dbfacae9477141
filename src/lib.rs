//! # edmx-rs
//!
//! Conversion of OData CSDL/XML (EDMX) metadata documents into their
//! normalized JSON form.
//!
//! ## Features
//!
//! - Alias resolution for type names and container paths
//! - `Collection(...)` type references, facets and EDM boolean defaults
//! - Entity, complex, enum and type definitions
//! - Action and function overloads
//! - Entity containers with entity sets, singletons and operation imports
//! - Protection against oversized or deeply nested documents
//!
//! ## Example
//!
//! ```rust
//! use edmx::converters::convert_str;
//!
//! let json = convert_str(r#"
//!     <Edmx>
//!         <DataServices>
//!             <Schema Namespace="foo" Alias="f">
//!                 <EntityContainer Name="Container">
//!                     <Singleton Name="Me" Type="f.Worker"/>
//!                 </EntityContainer>
//!             </Schema>
//!         </DataServices>
//!     </Edmx>"#)?;
//!
//! assert_eq!(json["$EntityContainer"], "foo.Container");
//! assert_eq!(json["foo.Container"]["Me"]["$Type"], "foo.Worker");
//! # Ok::<(), edmx::Error>(())
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

// Core modules - Foundation
pub mod error;
pub mod limits;

// Core modules - Input
pub mod documents;
pub mod loaders;

// Core modules - Conversion
pub mod names;
pub mod converters;

// Re-exports for convenience
pub use converters::{convert, convert_str};
pub use documents::{Document, Element};
pub use error::{Error, Result};

/// Version of the edmx-rs library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
