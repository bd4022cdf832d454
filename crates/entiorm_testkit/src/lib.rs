//! # EntiORM Testkit
//!
//! Test utilities for EntiORM.
//!
//! This crate provides:
//! - An in-memory database implementing `DatabaseClient`
//! - Sample entity types and connected ORM fixtures
//! - Test log setup
//!
//! ## Usage
//!
//! ```rust,ignore
//! use entiorm_testkit::prelude::*;
//!
//! #[tokio::test]
//! async fn creates_user() {
//!     let orm = TestOrm::connected().await;
//!     let mut user = User::new("a@x.com", "A", 30);
//!     orm.create(&mut user).await.unwrap();
//!     assert!(user.id.is_some());
//! }
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod fixtures;
pub mod logging;
pub mod memory;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::fixtures::*;
    pub use crate::logging::*;
    pub use crate::memory::*;
}

pub use fixtures::*;
pub use logging::*;
pub use memory::*;
