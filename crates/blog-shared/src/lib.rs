//! # Blog Shared
//!
//! Types exchanged between the blog server and its clients: the input forms
//! with their rendering hints, page payloads and problem responses.

pub mod forms;
pub mod pages;
pub mod response;

pub use forms::{CommentForm, FieldView, Form, FormView, LoginForm, PostForm, Widget};
pub use response::ErrorResponse;
