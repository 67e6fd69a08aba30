//! A mail message whose body is rendered from a template.
//!
//! `TemplatedMailMessage` composes a [`MailSender`] with a [`TemplateView`].
//! Configure template roots, context and variables, then call
//! [`TemplatedMailMessage::render`] with a template identifier to render the
//! body and send the message in one step.
//!
//! # Examples
//!
//! ```
//! use lettre::transport::stub::StubTransport;
//! use templated_mail::mail::LettreMailer;
//! use templated_mail::message::TemplatedMailMessage;
//! use templated_mail::templates::TeraView;
//!
//! let mut mailer = LettreMailer::new(StubTransport::new_ok());
//! mailer.set_from("shop@example.com").unwrap().add_to("alice@example.com").unwrap();
//!
//! let mut message = TemplatedMailMessage::new(mailer, TeraView::new());
//! message.set_template_root_paths(["/does/not/exist"]);
//! message.assign("name", "Alice");
//! message.render("Hi {{ name }}").unwrap();
//!
//! assert_eq!(message.sender().body(), Some("Hi Alice"));
//! ```

use serde::Serialize;
use serde_json::Value as JsonValue;
use std::path::Path;
use thiserror::Error;
use tracing::{debug, info};

use crate::context::MailContext;
use crate::mail::MailSender;
use crate::templates::{self, IdentityLocator, PackageLocator, TemplateView};

/// Failure of one of the two collaborators, passed through unchanged
#[derive(Error, Debug)]
pub enum MessageError<R, S>
where
    R: std::error::Error + 'static,
    S: std::error::Error + 'static,
{
    /// The template view failed; nothing was sent
    #[error(transparent)]
    Render(R),

    /// Delivery failed after the body was set
    #[error(transparent)]
    Send(S),
}

/// Mail message rendered from a template before it is sent
pub struct TemplatedMailMessage<S, V> {
    sender: S,
    view: V,
    template_root_paths: Vec<String>,
    context: Option<MailContext>,
    locator: Box<dyn PackageLocator>,
}

impl<S, V> TemplatedMailMessage<S, V>
where
    S: MailSender,
    V: TemplateView,
{
    pub fn new(sender: S, view: V) -> Self {
        Self {
            sender,
            view,
            template_root_paths: Vec::new(),
            context: None,
            locator: Box::new(IdentityLocator),
        }
    }

    /// Use `locator` to expand package-prefixed and relative template paths
    pub fn with_locator<L: PackageLocator + 'static>(mut self, locator: L) -> Self {
        self.locator = Box::new(locator);
        self
    }

    pub fn set_template_root_paths<I, P>(&mut self, paths: I)
    where
        I: IntoIterator<Item = P>,
        P: Into<String>,
    {
        self.template_root_paths = paths.into_iter().map(Into::into).collect();
    }

    pub fn template_root_paths(&self) -> &[String] {
        &self.template_root_paths
    }

    /// Extend the search path with the context package and expose it to the view
    pub fn set_context(&mut self, context: MailContext) {
        self.view.set_context(&context);
        self.context = Some(context);
    }

    pub fn context(&self) -> Option<&MailContext> {
        self.context.as_ref()
    }

    /// Assign a variable to the template
    pub fn assign<K: AsRef<str>, T: Into<JsonValue>>(&mut self, key: K, value: T) {
        self.view.assign(key.as_ref(), value.into());
    }

    /// Assign any serializable value to the template
    pub fn assign_serialized<K: AsRef<str>, T: Serialize>(
        &mut self,
        key: K,
        value: &T,
    ) -> Result<(), serde_json::Error> {
        self.view.assign(key.as_ref(), serde_json::to_value(value)?);
        Ok(())
    }

    /// File path `template` resolves to with the current configuration
    pub fn resolve_template(&self, template: &str) -> Option<String> {
        templates::resolve(
            template,
            self.template_root_paths.as_slice(),
            self.context_root(),
            self.locator.as_ref(),
        )
    }

    /// Render `template` and send the message.
    ///
    /// `template` may be a file path, a `EXT:` package path, a name looked up
    /// below the template roots, or the template text itself.
    pub fn render(
        &mut self,
        template: &str,
    ) -> Result<S::Response, MessageError<V::Error, S::Error>> {
        self.set_template(template);

        let content = self.view.render().map_err(MessageError::Render)?;
        debug!("Rendered mail body ({} bytes)", content.len());
        self.sender.set_body(content);

        let response = self.sender.send().map_err(MessageError::Send)?;
        info!("Templated mail message sent");
        Ok(response)
    }

    pub fn sender(&self) -> &S {
        &self.sender
    }

    pub fn sender_mut(&mut self) -> &mut S {
        &mut self.sender
    }

    pub fn view(&self) -> &V {
        &self.view
    }

    pub fn into_parts(self) -> (S, V) {
        (self.sender, self.view)
    }

    fn context_root(&self) -> Option<&Path> {
        self.context.as_ref().and_then(MailContext::package_root)
    }

    fn set_template(&mut self, template: &str) {
        match self.resolve_template(template) {
            Some(path) => self.view.set_template_path_and_filename(Path::new(&path)),
            None => self.view.set_template_source(template),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::fmt;
    use std::fs;
    use std::path::PathBuf;
    use tempfile::TempDir;
    use tracing_test::traced_test;

    #[derive(Debug)]
    struct FakeError(&'static str);

    impl fmt::Display for FakeError {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            write!(f, "{}", self.0)
        }
    }

    impl std::error::Error for FakeError {}

    #[derive(Default)]
    struct RecordingSender {
        body: Option<String>,
        sent: Vec<String>,
        fail: bool,
    }

    impl MailSender for RecordingSender {
        type Response = usize;
        type Error = FakeError;

        fn set_body(&mut self, body: String) {
            self.body = Some(body);
        }

        fn send(&mut self) -> Result<usize, FakeError> {
            if self.fail {
                return Err(FakeError("connection refused"));
            }
            self.sent.push(self.body.clone().unwrap_or_default());
            Ok(self.sent.len())
        }
    }

    #[derive(Debug, Clone, PartialEq)]
    enum Selected {
        File(PathBuf),
        Source(String),
    }

    #[derive(Default)]
    struct RecordingView {
        selections: Vec<Selected>,
        variables: HashMap<String, JsonValue>,
        context: Option<MailContext>,
        fail: bool,
    }

    impl TemplateView for RecordingView {
        type Error = FakeError;

        fn set_template_path_and_filename(&mut self, path: &Path) {
            self.selections.push(Selected::File(path.to_path_buf()));
        }

        fn set_template_source(&mut self, source: &str) {
            self.selections.push(Selected::Source(source.to_string()));
        }

        fn assign(&mut self, key: &str, value: JsonValue) {
            self.variables.insert(key.to_string(), value);
        }

        fn set_context(&mut self, context: &MailContext) {
            self.context = Some(context.clone());
        }

        fn render(&mut self) -> Result<String, FakeError> {
            if self.fail {
                return Err(FakeError("syntax error"));
            }
            Ok(format!("{:?}", self.selections.last()))
        }
    }

    fn message() -> TemplatedMailMessage<RecordingSender, RecordingView> {
        TemplatedMailMessage::new(RecordingSender::default(), RecordingView::default())
    }

    #[test]
    fn test_unresolved_identifier_becomes_source() {
        let mut message = message();
        message.set_template_root_paths(["/no/such/root"]);

        let sent = message.render("<p>{{ name }}</p>").unwrap();

        assert_eq!(sent, 1);
        assert_eq!(
            message.view().selections,
            vec![Selected::Source("<p>{{ name }}</p>".to_string())]
        );
    }

    #[test]
    fn test_resolved_identifier_becomes_file() {
        let temp_dir = TempDir::new().unwrap();
        fs::create_dir_all(temp_dir.path().join("Mail")).unwrap();
        let file = temp_dir.path().join("Mail/Welcome.html");
        fs::write(&file, "Hi").unwrap();

        let mut message = message();
        message.set_template_root_paths([temp_dir.path().to_string_lossy().into_owned()]);
        message.render("Welcome").unwrap();

        assert_eq!(message.view().selections, vec![Selected::File(file)]);
    }

    #[test]
    fn test_context_root_is_searched() {
        let temp_dir = TempDir::new().unwrap();
        let mail_dir = temp_dir.path().join("Resources/Private/Templates/Mail");
        fs::create_dir_all(&mail_dir).unwrap();
        fs::write(mail_dir.join("Order.html"), "Order").unwrap();

        let mut message = message();
        message.set_context(MailContext::for_package("shop", temp_dir.path()));
        message.render("Order").unwrap();

        assert_eq!(
            message.view().selections,
            vec![Selected::File(mail_dir.join("Order.html"))]
        );
        assert_eq!(message.view().context.as_ref().unwrap().package(), Some("shop"));
    }

    #[test]
    fn test_assign_reaches_view() {
        let mut message = message();
        message.assign("name", "Alice");
        message.assign("count", 3);
        message
            .assign_serialized("items", &vec!["a", "b"])
            .unwrap();

        let vars = &message.view().variables;
        assert_eq!(vars["name"], JsonValue::from("Alice"));
        assert_eq!(vars["count"], JsonValue::from(3));
        assert_eq!(vars["items"], serde_json::json!(["a", "b"]));
    }

    #[test]
    fn test_render_twice_does_not_leak_resolution() {
        let temp_dir = TempDir::new().unwrap();
        fs::create_dir_all(temp_dir.path().join("Mail")).unwrap();
        fs::write(temp_dir.path().join("Mail/First.html"), "first").unwrap();

        let mut message = message();
        message.set_template_root_paths([temp_dir.path().to_string_lossy().into_owned()]);
        message.render("First").unwrap();
        message.render("inline {{ x }}").unwrap();

        assert_eq!(
            message.view().selections,
            vec![
                Selected::File(temp_dir.path().join("Mail/First.html")),
                Selected::Source("inline {{ x }}".to_string()),
            ]
        );
        assert_eq!(message.sender().sent.len(), 2);
    }

    #[test]
    fn test_render_failure_skips_send() {
        let mut message = TemplatedMailMessage::new(
            RecordingSender::default(),
            RecordingView {
                fail: true,
                ..Default::default()
            },
        );

        let err = message.render("x").unwrap_err();
        assert!(matches!(err, MessageError::Render(FakeError("syntax error"))));
        assert_eq!(err.to_string(), "syntax error");
        assert!(message.sender().body.is_none());
        assert!(message.sender().sent.is_empty());
    }

    #[test]
    #[traced_test]
    fn test_send_failure_surfaces_after_body_set() {
        let mut message = TemplatedMailMessage::new(
            RecordingSender {
                fail: true,
                ..Default::default()
            },
            RecordingView::default(),
        );

        let err = message.render("body").unwrap_err();
        assert!(matches!(err, MessageError::Send(FakeError("connection refused"))));
        assert_eq!(err.to_string(), "connection refused");
        assert_eq!(
            message.sender().body.as_deref(),
            Some("Some(Source(\"body\"))")
        );
        assert!(logs_contain("Rendered mail body"));
        assert!(!logs_contain("Templated mail message sent"));
    }

    #[test]
    fn test_locator_expands_package_paths() {
        let temp_dir = TempDir::new().unwrap();
        fs::create_dir_all(temp_dir.path().join("Mail")).unwrap();
        fs::write(temp_dir.path().join("Mail/Digest.html"), "digest").unwrap();

        let locator = crate::templates::PackageMap::new().with_package("news", temp_dir.path());
        let mut message = message().with_locator(locator);

        assert_eq!(
            message.resolve_template("EXT:news/Mail/Digest.html"),
            Some(
                temp_dir
                    .path()
                    .join("Mail/Digest.html")
                    .to_string_lossy()
                    .into_owned()
            )
        );

        message.set_template_root_paths(["EXT:news"]);
        message.render("Digest").unwrap();
        assert_eq!(
            message.view().selections,
            vec![Selected::File(temp_dir.path().join("Mail/Digest.html"))]
        );
    }

    #[test]
    fn test_into_parts() {
        let mut message = message();
        message.render("hello").unwrap();
        let (sender, view) = message.into_parts();
        assert_eq!(sender.sent.len(), 1);
        assert_eq!(view.selections.len(), 1);
    }
}
