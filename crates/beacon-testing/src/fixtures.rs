//! Builders for intake records and request bodies.

use beacon_core::IntakeRecord;
use serde_json::Value;

/// Builder for intake records.
#[derive(Debug, Clone, Default)]
pub struct IntakeBuilder {
    record: IntakeRecord,
}

impl IntakeBuilder {
    /// Creates a builder for an empty record.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a builder with a typical page view filled in.
    pub fn with_defaults() -> Self {
        Self::new()
            .event("page_view")
            .event_type("track")
            .app_id("app-1")
            .user_id("user-1")
            .message_id("msg-1")
            .page("Home", "https://example.com/")
            .browser_language("en-US")
            .screen_size("1920x1080")
    }

    /// Sets the event name (`ev`).
    #[must_use]
    pub fn event(mut self, event: impl Into<String>) -> Self {
        self.record.event = event.into();
        self
    }

    /// Sets the event type (`et`).
    #[must_use]
    pub fn event_type(mut self, event_type: impl Into<String>) -> Self {
        self.record.event_type = event_type.into();
        self
    }

    /// Sets the application id (`id`).
    #[must_use]
    pub fn app_id(mut self, app_id: impl Into<String>) -> Self {
        self.record.app_id = app_id.into();
        self
    }

    /// Sets the user id (`uid`).
    #[must_use]
    pub fn user_id(mut self, user_id: impl Into<String>) -> Self {
        self.record.user_id = user_id.into();
        self
    }

    /// Sets the message id (`mid`).
    #[must_use]
    pub fn message_id(mut self, message_id: impl Into<String>) -> Self {
        self.record.message_id = message_id.into();
        self
    }

    /// Sets the page title (`t`) and URL (`p`).
    #[must_use]
    pub fn page(mut self, title: impl Into<String>, url: impl Into<String>) -> Self {
        self.record.page_title = title.into();
        self.record.page_url = url.into();
        self
    }

    /// Sets the browser language (`l`).
    #[must_use]
    pub fn browser_language(mut self, language: impl Into<String>) -> Self {
        self.record.browser_language = language.into();
        self
    }

    /// Sets the screen size (`sc`).
    #[must_use]
    pub fn screen_size(mut self, size: impl Into<String>) -> Self {
        self.record.screen_size = size.into();
        self
    }

    /// Adds an event attribute with its declared type.
    #[must_use]
    pub fn attribute(
        mut self,
        name: impl Into<String>,
        value: impl Into<String>,
        value_type: impl Into<String>,
    ) -> Self {
        let name = name.into();
        self.record.attribute_types.insert(name.clone(), value_type.into());
        self.record.attribute_values.insert(name, value.into());
        self
    }

    /// Adds an event attribute with no declared type.
    #[must_use]
    pub fn untyped_attribute(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.record.attribute_values.insert(name.into(), value.into());
        self
    }

    /// Adds a user trait with its declared type.
    #[must_use]
    pub fn user_trait(
        mut self,
        name: impl Into<String>,
        value: impl Into<String>,
        value_type: impl Into<String>,
    ) -> Self {
        let name = name.into();
        self.record.trait_types.insert(name.clone(), value_type.into());
        self.record.trait_values.insert(name, value.into());
        self
    }

    /// Builds the record.
    pub fn build(self) -> IntakeRecord {
        self.record
    }

    /// Builds the record in its wire form.
    pub fn to_json(&self) -> Value {
        serde_json::to_value(&self.record).expect("intake record serializes")
    }

    /// Builds a request body for `POST /submit`.
    pub fn body(&self) -> Vec<u8> {
        self.to_json().to_string().into_bytes()
    }
}
