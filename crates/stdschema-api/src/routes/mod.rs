//! # Demo Route Modules
//!
//! - `users`: user registration and lookup. Request bodies, query strings
//!   and path parameters go through the validation pipe; responses go
//!   through the response serializer.

pub mod users;
