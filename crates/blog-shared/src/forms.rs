//! Input forms.
//!
//! Each form deserializes only its allow-listed fields; anything else in the
//! submission (approval flags, timestamps, foreign keys) is dropped by serde.
//! Values are trimmed before validation.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use validator::{Validate, ValidationErrors};

/// Rendering hint for a single field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Widget {
    TextInput { class: String },
    PasswordInput,
    Textarea { class: String },
}

impl Widget {
    fn text_input(class: &str) -> Self {
        Widget::TextInput {
            class: class.to_string(),
        }
    }

    fn textarea(class: &str) -> Self {
        Widget::Textarea {
            class: class.to_string(),
        }
    }
}

/// One field of a rendered form.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FieldView {
    pub name: String,
    pub widget: Widget,
    pub value: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<String>,
}

/// A form ready for display, with any validation errors attached.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FormView {
    pub fields: Vec<FieldView>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub non_field_errors: Vec<String>,
}

impl FormView {
    pub fn is_valid(&self) -> bool {
        self.non_field_errors.is_empty() && self.fields.iter().all(|f| f.errors.is_empty())
    }

    pub fn field(&self, name: &str) -> Option<&FieldView> {
        self.fields.iter().find(|f| f.name == name)
    }

    pub fn with_error(mut self, message: impl Into<String>) -> Self {
        self.non_field_errors.push(message.into());
        self
    }
}

/// Behaviour shared by the input forms.
pub trait Form: Validate + Default + Sized {
    /// Allow-listed fields with their widgets, in display order.
    fn widgets() -> Vec<(&'static str, Widget)>;

    /// Current value of a field.
    fn value(&self, field: &str) -> &str;

    /// Normalise submitted values before validation.
    fn clean(self) -> Self;

    /// Render the form without errors.
    fn render(&self) -> FormView {
        self.render_with(&ValidationErrors::new())
    }

    fn render_with(&self, errors: &ValidationErrors) -> FormView {
        let messages: HashMap<String, Vec<String>> = errors
            .field_errors()
            .into_iter()
            .map(|(field, errs)| {
                let msgs = errs
                    .iter()
                    .map(|e| match &e.message {
                        Some(msg) => msg.to_string(),
                        None => e.code.to_string(),
                    })
                    .collect();
                (field.to_string(), msgs)
            })
            .collect();

        let fields = Self::widgets()
            .into_iter()
            .map(|(name, widget)| FieldView {
                name: name.to_string(),
                widget,
                value: self.value(name).to_string(),
                errors: messages.get(name).cloned().unwrap_or_default(),
            })
            .collect();

        FormView {
            fields,
            non_field_errors: Vec::new(),
        }
    }

    /// Clean and validate. On failure the rendered form carries the errors.
    fn check(self) -> Result<Self, FormView> {
        let form = self.clean();
        match form.validate() {
            Ok(()) => Ok(form),
            Err(errors) => Err(form.render_with(&errors)),
        }
    }
}

/// Title and body of a post. Author and timestamps are set server-side.
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct PostForm {
    #[serde(default)]
    #[validate(length(
        min = 1,
        max = 200,
        message = "Title is required and must be at most 200 characters"
    ))]
    pub title: String,

    #[serde(default)]
    #[validate(length(min = 1, message = "Text is required"))]
    pub text: String,
}

impl Form for PostForm {
    fn widgets() -> Vec<(&'static str, Widget)> {
        vec![
            ("title", Widget::text_input("textinputclass")),
            (
                "text",
                Widget::textarea("editable medium-editor-textarea postcontent"),
            ),
        ]
    }

    fn value(&self, field: &str) -> &str {
        match field {
            "title" => &self.title,
            "text" => &self.text,
            _ => "",
        }
    }

    fn clean(self) -> Self {
        Self {
            title: self.title.trim().to_string(),
            text: self.text.trim().to_string(),
        }
    }
}

/// A visitor's comment. The post and approval flag are never taken from input.
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct CommentForm {
    #[serde(default)]
    #[validate(length(
        min = 1,
        max = 200,
        message = "Name is required and must be at most 200 characters"
    ))]
    pub author: String,

    #[serde(default)]
    #[validate(length(min = 1, message = "Text is required"))]
    pub text: String,
}

impl Form for CommentForm {
    fn widgets() -> Vec<(&'static str, Widget)> {
        vec![
            ("author", Widget::text_input("textinputclass")),
            ("text", Widget::textarea("editable medium-editor-textarea")),
        ]
    }

    fn value(&self, field: &str) -> &str {
        match field {
            "author" => &self.author,
            "text" => &self.text,
            _ => "",
        }
    }

    fn clean(self) -> Self {
        Self {
            author: self.author.trim().to_string(),
            text: self.text.trim().to_string(),
        }
    }
}

/// Credentials for the login page.
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct LoginForm {
    #[serde(default)]
    #[validate(length(min = 1, message = "Username is required"))]
    pub username: String,

    #[serde(default)]
    #[validate(length(min = 1, message = "Password is required"))]
    pub password: String,

    /// Where to go after a successful login.
    #[serde(default)]
    pub next: Option<String>,
}

impl Form for LoginForm {
    fn widgets() -> Vec<(&'static str, Widget)> {
        vec![
            ("username", Widget::text_input("textinputclass")),
            ("password", Widget::PasswordInput),
        ]
    }

    // The password is never echoed back.
    fn value(&self, field: &str) -> &str {
        match field {
            "username" => &self.username,
            _ => "",
        }
    }

    fn clean(self) -> Self {
        Self {
            username: self.username.trim().to_string(),
            ..self
        }
    }
}
