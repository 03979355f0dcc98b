//! Field rules for validating JSON request bodies.
//!
//! A [`FieldRule`] inspects one field and reports a [`RuleOutcome`]: the value
//! is valid, or it fails with a message or a full [`StrataError`]. Rules are
//! grouped per field in [`FieldRules`], which checks a body and collects every
//! [`Violation`]. Rules that need to await something, such as a uniqueness
//! lookup, implement [`AsyncFieldRule`] instead.
//!
//! Built-in rules honor an optional label and an optional message override.
//! An override replaces the message entirely; a label prefixes the default
//! message as `"<label>: <message>"`.
//!
//! # Example
//!
//! ```
//! use serde_json::json;
//! use strata_middleware::rules::{Email, FieldRules, MinLength, Required};
//!
//! let rules = FieldRules::new()
//!     .field("email", Email::new().label("Email"))
//!     .field("password", Required::new().label("Password"))
//!     .field("password", MinLength::new(8).label("Password"));
//!
//! let body = json!({ "email": "ada@example.com", "password": "short" });
//! let violations = tokio_test::block_on(rules.validate(Some(&body))).unwrap_err();
//!
//! assert_eq!(violations.len(), 1);
//! assert_eq!(violations.first_message(), Some("Password: Minimum 8 characters"));
//! ```

use crate::handler::BoxFuture;
use regex::Regex;
use serde_json::Value;
use std::fmt;
use std::future::Future;
use std::sync::OnceLock;
use strata_core::{FieldErrors, StrataError};

/// Result of checking one value against one rule.
#[derive(Debug)]
pub enum RuleOutcome {
    /// The value satisfies the rule.
    Valid,
    /// The value fails the rule with this message.
    Message(String),
    /// The value fails the rule with this error.
    Failed(StrataError),
}

impl RuleOutcome {
    /// Returns `true` for [`RuleOutcome::Valid`].
    #[must_use]
    pub const fn is_valid(&self) -> bool {
        matches!(self, Self::Valid)
    }

    /// Returns the failure message, if any.
    #[must_use]
    pub fn failure_message(&self) -> Option<String> {
        match self {
            Self::Valid => None,
            Self::Message(message) => Some(message.clone()),
            Self::Failed(err) => Some(err.message()),
        }
    }
}

/// A check applied to a single field of a JSON body.
///
/// `value` is `None` when the field is absent.
pub trait FieldRule: Send + Sync + 'static {
    /// Checks `value`.
    fn check(&self, value: Option<&Value>) -> RuleOutcome;
}

/// A check on a single field that completes asynchronously.
///
/// Registered with [`FieldRules::field_async`]. See [`async_rule_fn`] for
/// closures.
pub trait AsyncFieldRule: Send + Sync + 'static {
    /// Checks `value`.
    fn check<'a>(&'a self, value: Option<&'a Value>) -> BoxFuture<'a, RuleOutcome>;
}

/// Optional label and message override shared by the built-in rules.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RuleMessages {
    label: Option<String>,
    message: Option<String>,
}

impl RuleMessages {
    /// Renders the failure message for `fallback`.
    #[must_use]
    pub fn render(&self, fallback: &str) -> String {
        if let Some(message) = &self.message {
            return message.clone();
        }
        match &self.label {
            Some(label) => format!("{label}: {fallback}"),
            None => fallback.to_string(),
        }
    }

    fn fail(&self, fallback: &str) -> RuleOutcome {
        RuleOutcome::Message(self.render(fallback))
    }
}

macro_rules! message_builders {
    ($rule:ty) => {
        impl $rule {
            /// Prefixes the default failure message with `label`.
            #[must_use]
            pub fn label(mut self, label: impl Into<String>) -> Self {
                self.messages.label = Some(label.into());
                self
            }

            /// Replaces the failure message entirely.
            #[must_use]
            pub fn message(mut self, message: impl Into<String>) -> Self {
                self.messages.message = Some(message.into());
                self
            }
        }
    };
}

/// Missing, `null`, blank strings and empty arrays count as empty.
fn is_empty(value: Option<&Value>) -> bool {
    match value {
        None | Some(Value::Null) => true,
        Some(Value::String(text)) => text.trim().is_empty(),
        Some(Value::Array(items)) => items.is_empty(),
        Some(_) => false,
    }
}

/// Missing, `null`, `false`, `0` and `""` count as falsy.
pub(crate) fn is_falsy(value: Option<&Value>) -> bool {
    match value {
        None | Some(Value::Null) => true,
        Some(Value::Bool(flag)) => !flag,
        Some(Value::String(text)) => text.is_empty(),
        Some(Value::Number(number)) => number.as_f64() == Some(0.0),
        Some(_) => false,
    }
}

/// Length of a string (in characters) or an array.
fn length_of(value: &Value) -> Option<usize> {
    match value {
        Value::String(text) => Some(text.chars().count()),
        Value::Array(items) => Some(items.len()),
        _ => None,
    }
}

/// The field must be present and non-empty.
#[derive(Debug, Clone, Default)]
pub struct Required {
    messages: RuleMessages,
}

impl Required {
    /// Creates the rule.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

message_builders!(Required);

impl FieldRule for Required {
    fn check(&self, value: Option<&Value>) -> RuleOutcome {
        if is_empty(value) {
            return self.messages.fail("This field is required");
        }
        RuleOutcome::Valid
    }
}

/// The field must be present and not falsy.
///
/// Unlike [`Required`], whitespace-only strings and empty arrays pass, while
/// `false` and `0` fail.
#[derive(Debug, Clone, Default)]
pub struct Present {
    messages: RuleMessages,
}

impl Present {
    /// Creates the rule.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

message_builders!(Present);

impl FieldRule for Present {
    fn check(&self, value: Option<&Value>) -> RuleOutcome {
        if is_falsy(value) {
            return self.messages.fail("This field is required");
        }
        RuleOutcome::Valid
    }
}

/// A present field must be a string.
#[derive(Debug, Clone, Default)]
pub struct Text {
    messages: RuleMessages,
}

impl Text {
    /// Creates the rule.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

message_builders!(Text);

impl FieldRule for Text {
    fn check(&self, value: Option<&Value>) -> RuleOutcome {
        match value {
            None | Some(Value::String(_)) => RuleOutcome::Valid,
            Some(_) => self.messages.fail("Must be a string"),
        }
    }
}

fn email_regex() -> &'static Regex {
    static EMAIL: OnceLock<Regex> = OnceLock::new();
    EMAIL.get_or_init(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("valid regex"))
}

/// The field must hold an email address.
#[derive(Debug, Clone, Default)]
pub struct Email {
    messages: RuleMessages,
}

impl Email {
    /// Creates the rule.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

message_builders!(Email);

impl FieldRule for Email {
    fn check(&self, value: Option<&Value>) -> RuleOutcome {
        if is_falsy(value) {
            return self.messages.fail("Email is required");
        }
        match value.and_then(Value::as_str) {
            Some(address) if email_regex().is_match(address) => RuleOutcome::Valid,
            _ => self.messages.fail("Invalid email"),
        }
    }
}

/// A non-empty string or array must have at least `min` elements.
#[derive(Debug, Clone)]
pub struct MinLength {
    min: usize,
    messages: RuleMessages,
}

impl MinLength {
    /// Creates the rule.
    #[must_use]
    pub fn new(min: usize) -> Self {
        Self {
            min,
            messages: RuleMessages::default(),
        }
    }
}

message_builders!(MinLength);

impl FieldRule for MinLength {
    fn check(&self, value: Option<&Value>) -> RuleOutcome {
        if is_falsy(value) {
            return RuleOutcome::Valid;
        }
        match value.and_then(length_of) {
            Some(len) if len < self.min => self
                .messages
                .fail(&format!("Minimum {} characters", self.min)),
            _ => RuleOutcome::Valid,
        }
    }
}

/// A non-empty string or array must have at most `max` elements.
#[derive(Debug, Clone)]
pub struct MaxLength {
    max: usize,
    messages: RuleMessages,
}

impl MaxLength {
    /// Creates the rule.
    #[must_use]
    pub fn new(max: usize) -> Self {
        Self {
            max,
            messages: RuleMessages::default(),
        }
    }
}

message_builders!(MaxLength);

impl FieldRule for MaxLength {
    fn check(&self, value: Option<&Value>) -> RuleOutcome {
        if is_falsy(value) {
            return RuleOutcome::Valid;
        }
        match value.and_then(length_of) {
            Some(len) if len > self.max => self
                .messages
                .fail(&format!("Maximum {} characters", self.max)),
            _ => RuleOutcome::Valid,
        }
    }
}

/// A rule built from a closure. See [`rule_fn`].
pub struct FnRule<F> {
    func: F,
}

impl<F> fmt::Debug for FnRule<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FnRule").finish_non_exhaustive()
    }
}

impl<F> FieldRule for FnRule<F>
where
    F: Fn(Option<&Value>) -> RuleOutcome + Send + Sync + 'static,
{
    fn check(&self, value: Option<&Value>) -> RuleOutcome {
        (self.func)(value)
    }
}

/// Creates a rule from a closure.
///
/// ```
/// use serde_json::json;
/// use strata_middleware::rules::{rule_fn, FieldRule, RuleOutcome};
///
/// let even = rule_fn(|value| match value.and_then(|v| v.as_i64()) {
///     Some(n) if n % 2 == 0 => RuleOutcome::Valid,
///     _ => RuleOutcome::Message("must be even".to_string()),
/// });
///
/// assert!(even.check(Some(&json!(4))).is_valid());
/// assert!(!even.check(Some(&json!(3))).is_valid());
/// ```
pub fn rule_fn<F>(func: F) -> FnRule<F>
where
    F: Fn(Option<&Value>) -> RuleOutcome + Send + Sync + 'static,
{
    FnRule { func }
}

/// An asynchronous rule built from a closure. See [`async_rule_fn`].
pub struct AsyncFnRule<F> {
    func: F,
}

impl<F> fmt::Debug for AsyncFnRule<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AsyncFnRule").finish_non_exhaustive()
    }
}

impl<F, Fut> AsyncFieldRule for AsyncFnRule<F>
where
    F: Fn(Option<Value>) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = RuleOutcome> + Send + 'static,
{
    fn check<'a>(&'a self, value: Option<&'a Value>) -> BoxFuture<'a, RuleOutcome> {
        Box::pin((self.func)(value.cloned()))
    }
}

/// Creates an asynchronous rule from a closure.
///
/// The closure receives its own copy of the value, so the returned future
/// may outlive the body it came from.
///
/// ```
/// use serde_json::json;
/// use strata_middleware::rules::{async_rule_fn, AsyncFieldRule, RuleOutcome};
///
/// let unique = async_rule_fn(|value| async move {
///     match value.as_ref().and_then(|v| v.as_str()) {
///         Some("admin") => RuleOutcome::Message("name is taken".to_string()),
///         _ => RuleOutcome::Valid,
///     }
/// });
///
/// let outcome = tokio_test::block_on(unique.check(Some(&json!("admin"))));
/// assert!(!outcome.is_valid());
/// ```
pub fn async_rule_fn<F, Fut>(func: F) -> AsyncFnRule<F>
where
    F: Fn(Option<Value>) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = RuleOutcome> + Send + 'static,
{
    AsyncFnRule { func }
}

/// One registered rule, checked inline or awaited.
enum Check {
    Now(Box<dyn FieldRule>),
    Later(Box<dyn AsyncFieldRule>),
}

impl Check {
    async fn run(&self, value: Option<&Value>) -> RuleOutcome {
        match self {
            Self::Now(rule) => rule.check(value),
            Self::Later(rule) => rule.check(value).await,
        }
    }
}

/// A failed rule on one field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Violation {
    /// The field that failed.
    pub field: String,
    /// The failure message.
    pub message: String,
}

/// Every violation found in one body, in rule order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Violations(Vec<Violation>);

impl Violations {
    /// Returns the number of violations.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns `true` if there are no violations.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Returns the violations in order.
    #[must_use]
    pub fn as_slice(&self) -> &[Violation] {
        &self.0
    }

    /// Returns the message of the first violation.
    #[must_use]
    pub fn first_message(&self) -> Option<&str> {
        self.0.first().map(|violation| violation.message.as_str())
    }

    /// Groups the messages by field.
    #[must_use]
    pub fn to_field_errors(&self) -> FieldErrors {
        let mut errors = FieldErrors::new();
        for violation in &self.0 {
            errors.add(violation.field.clone(), violation.message.clone());
        }
        errors
    }
}

/// Rules grouped by field, checked in registration order.
///
/// Within a field, checking stops at the first failing rule, so a missing
/// value reports "required" once instead of once per rule.
#[derive(Default)]
pub struct FieldRules {
    fields: Vec<(String, Vec<Check>)>,
}

impl FieldRules {
    /// Creates an empty rule set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends `rule` to the rules for `field`.
    #[must_use]
    pub fn field(self, field: impl Into<String>, rule: impl FieldRule) -> Self {
        self.push(field.into(), Check::Now(Box::new(rule)))
    }

    /// Appends an asynchronous `rule` to the rules for `field`.
    #[must_use]
    pub fn field_async(self, field: impl Into<String>, rule: impl AsyncFieldRule) -> Self {
        self.push(field.into(), Check::Later(Box::new(rule)))
    }

    fn push(mut self, field: String, check: Check) -> Self {
        match self.fields.iter_mut().find(|(name, _)| *name == field) {
            Some((_, rules)) => rules.push(check),
            None => self.fields.push((field, vec![check])),
        }
        self
    }

    /// Returns `true` if no rules are registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Returns the names of fields with rules, in registration order.
    #[must_use]
    pub fn field_names(&self) -> Vec<&str> {
        self.fields.iter().map(|(name, _)| name.as_str()).collect()
    }

    /// Checks the top-level fields of `body`.
    ///
    /// A body that is absent or not an object is checked as if every field
    /// were missing. Rules run one at a time, in registration order.
    ///
    /// # Errors
    ///
    /// Returns every [`Violation`] found.
    pub async fn validate(&self, body: Option<&Value>) -> Result<(), Violations> {
        let mut violations = Vec::new();

        for (field, rules) in &self.fields {
            let value = body.and_then(|body| body.get(field.as_str()));
            for rule in rules {
                if let Some(message) = rule.run(value).await.failure_message() {
                    violations.push(Violation {
                        field: field.clone(),
                        message,
                    });
                    break;
                }
            }
        }

        if violations.is_empty() {
            Ok(())
        } else {
            Err(Violations(violations))
        }
    }
}

impl fmt::Debug for FieldRules {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let counts: Vec<_> = self
            .fields
            .iter()
            .map(|(name, rules)| (name.as_str(), rules.len()))
            .collect();
        f.debug_struct("FieldRules").field("fields", &counts).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::time::Duration;

    fn message(outcome: RuleOutcome) -> Option<String> {
        outcome.failure_message()
    }

    #[test]
    fn test_required() {
        let rule = Required::new();
        assert!(rule.check(Some(&json!("x"))).is_valid());
        assert!(rule.check(Some(&json!(0))).is_valid());
        assert!(rule.check(Some(&json!(false))).is_valid());

        for empty in [None, Some(json!(null)), Some(json!("  ")), Some(json!([]))] {
            assert_eq!(
                message(rule.check(empty.as_ref())).as_deref(),
                Some("This field is required")
            );
        }
    }

    #[test]
    fn test_label_and_message_override() {
        let labeled = Required::new().label("Full name");
        assert_eq!(
            message(labeled.check(None)).as_deref(),
            Some("Full name: This field is required")
        );

        let custom = Required::new().label("Full name").message("Please enter your name");
        assert_eq!(
            message(custom.check(None)).as_deref(),
            Some("Please enter your name")
        );
    }

    #[test]
    fn test_text() {
        let rule = Text::new();
        assert!(rule.check(None).is_valid());
        assert!(rule.check(Some(&json!("x"))).is_valid());
        assert_eq!(
            message(rule.check(Some(&json!(7)))).as_deref(),
            Some("Must be a string")
        );
    }

    #[test]
    fn test_email() {
        let rule = Email::new();
        assert!(rule.check(Some(&json!("ada@example.com"))).is_valid());
        assert_eq!(
            message(rule.check(Some(&json!("")))).as_deref(),
            Some("Email is required")
        );
        assert_eq!(
            message(rule.check(Some(&json!("ada@example")))).as_deref(),
            Some("Invalid email")
        );
        assert_eq!(
            message(rule.check(Some(&json!("a b@example.com")))).as_deref(),
            Some("Invalid email")
        );
        assert_eq!(
            message(rule.check(Some(&json!(12)))).as_deref(),
            Some("Invalid email")
        );
    }

    #[test]
    fn test_length_rules_skip_empty_values() {
        assert!(MinLength::new(3).check(None).is_valid());
        assert!(MinLength::new(3).check(Some(&json!(""))).is_valid());
        assert!(MaxLength::new(3).check(Some(&json!(null))).is_valid());
    }

    #[test]
    fn test_length_rules() {
        let min = MinLength::new(3).label("Code");
        let max = MaxLength::new(3);

        assert!(min.check(Some(&json!("abc"))).is_valid());
        assert_eq!(
            message(min.check(Some(&json!("ab")))).as_deref(),
            Some("Code: Minimum 3 characters")
        );
        assert!(max.check(Some(&json!([1, 2, 3]))).is_valid());
        assert_eq!(
            message(max.check(Some(&json!("abcd")))).as_deref(),
            Some("Maximum 3 characters")
        );
        // Counted in characters, not bytes.
        assert!(max.check(Some(&json!("héé"))).is_valid());
    }

    #[test]
    fn test_closure_rule_with_error_outcome() {
        let rule = rule_fn(|_| RuleOutcome::Failed(StrataError::validation("nope")));
        assert_eq!(message(rule.check(None)).as_deref(), Some("nope"));
    }

    #[test]
    fn test_present() {
        let rule = Present::new().message("name is required");
        assert!(rule.check(Some(&json!("   "))).is_valid());
        assert!(rule.check(Some(&json!([]))).is_valid());

        for falsy in [None, Some(json!(null)), Some(json!("")), Some(json!(0)), Some(json!(false))] {
            assert_eq!(
                message(rule.check(falsy.as_ref())).as_deref(),
                Some("name is required")
            );
        }
    }

    #[tokio::test]
    async fn test_async_closure_rule() {
        let rule = async_rule_fn(|value| async move {
            match value {
                Some(Value::String(name)) if name == "admin" => {
                    RuleOutcome::Message("name is taken".to_string())
                }
                _ => RuleOutcome::Valid,
            }
        });
        assert!(rule.check(Some(&json!("ada"))).await.is_valid());
        assert_eq!(
            message(rule.check(Some(&json!("admin"))).await).as_deref(),
            Some("name is taken")
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_async_rules_run_in_order_with_sync_rules() {
        let rules = FieldRules::new()
            .field("name", Required::new().message("name is required"))
            .field_async(
                "name",
                async_rule_fn(|value| async move {
                    tokio::time::sleep(Duration::from_millis(20)).await;
                    if value == Some(json!("taken")) {
                        RuleOutcome::Message("name is taken".to_string())
                    } else {
                        RuleOutcome::Valid
                    }
                }),
            )
            .field("email", Email::new());

        let violations = rules
            .validate(Some(&json!({ "name": "taken", "email": "x" })))
            .await
            .unwrap_err();
        assert_eq!(violations.len(), 2);
        assert_eq!(violations.as_slice()[0].message, "name is taken");
        assert_eq!(violations.as_slice()[1].message, "Invalid email");

        // A failing sync rule short-circuits the awaited one.
        let violations = rules.validate(Some(&json!({}))).await.unwrap_err();
        assert_eq!(violations.as_slice()[0].message, "name is required");

        assert!(rules
            .validate(Some(&json!({ "name": "free", "email": "a@b.co" })))
            .await
            .is_ok());
        assert_eq!(rules.field_names(), ["name", "email"]);
    }

    #[tokio::test]
    async fn test_field_rules_stop_at_first_failure_per_field() {
        let rules = FieldRules::new()
            .field("name", Required::new().label("name"))
            .field("name", Text::new().label("name"))
            .field("email", Email::new());

        let violations = rules.validate(Some(&json!({}))).await.unwrap_err();
        assert_eq!(violations.len(), 2);
        assert_eq!(
            violations.as_slice()[0],
            Violation {
                field: "name".to_string(),
                message: "name: This field is required".to_string(),
            }
        );
        assert_eq!(violations.as_slice()[1].field, "email");

        let errors = violations.to_field_errors();
        assert_eq!(errors.len(), 2);
        assert_eq!(
            errors.get("name"),
            Some(&["name: This field is required".to_string()][..])
        );
    }

    #[tokio::test]
    async fn test_field_rules_pass() {
        let rules = FieldRules::new().field("name", Required::new());
        assert!(rules.validate(Some(&json!({ "name": "Ada" }))).await.is_ok());
        assert_eq!(rules.field_names(), ["name"]);
        assert!(format!("{rules:?}").contains("name"));
    }

    #[tokio::test]
    async fn test_missing_body_checks_every_field() {
        let rules = FieldRules::new()
            .field("a", Required::new())
            .field("b", Required::new());
        assert_eq!(rules.validate(None).await.unwrap_err().len(), 2);
        assert!(FieldRules::new().validate(None).await.is_ok());
    }
}
