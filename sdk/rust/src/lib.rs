//! Typed client for the jsontable users API.

mod client;

pub use client::{CreatedUser, NewUser, SdkError, User, UserFilter, UserPatch, UsersClient};
