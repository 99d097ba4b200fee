//! Validation of channel registration and update input.
//!
//! Structural checks ([`check_slack`], [`check_email`]) are pure and collect
//! every violated rule. The async entry points add duplicate detection
//! against a [`ChannelStore`]. Either way the caller receives at most one
//! [`CoreError::Validation`] carrying all field messages.

use std::sync::LazyLock;

use regex::Regex;

use crate::channels::{EmailChannelInput, SlackChannelInput};
use crate::error::{CoreError, ValidationErrors};
use crate::store::ChannelStore;

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

/// Field names used as keys in [`ValidationErrors`].
pub const FIELD_WEBHOOK_URL: &str = "webhook_url";
pub const FIELD_CHANNEL_NAME: &str = "channel_name";
pub const FIELD_EMAIL: &str = "email";

/// Default maximum length of a Slack webhook URL.
pub const DEFAULT_WEBHOOK_URL_MAX_LENGTH: usize = 255;

/// Default maximum length of a Slack channel name (Slack's own limit).
pub const DEFAULT_CHANNEL_NAME_MAX_LENGTH: usize = 80;

/// Default maximum length of an email address.
pub const DEFAULT_EMAIL_MAX_LENGTH: usize = 255;

/// Slack incoming-webhook URL: `https://hooks.slack.com/services/T…/B…/…`.
pub const SLACK_WEBHOOK_PATTERN: &str = r"^https://hooks\.slack\.com/services/T\w+/B\w+/\w+$";

pub const EMAIL_PATTERN: &str = r"^[a-zA-Z0-9_.+-]+@[a-zA-Z0-9-]+\.[a-zA-Z0-9-.]+$";

static SLACK_WEBHOOK_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(SLACK_WEBHOOK_PATTERN).expect("valid regex"));

static EMAIL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(EMAIL_PATTERN).expect("valid regex"));

// ---------------------------------------------------------------------------
// Limits
// ---------------------------------------------------------------------------

/// Configurable length limits applied by the validator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ValidationLimits {
    pub webhook_url_max: usize,
    pub channel_name_max: usize,
    pub email_max: usize,
}

impl Default for ValidationLimits {
    fn default() -> Self {
        Self {
            webhook_url_max: DEFAULT_WEBHOOK_URL_MAX_LENGTH,
            channel_name_max: DEFAULT_CHANNEL_NAME_MAX_LENGTH,
            email_max: DEFAULT_EMAIL_MAX_LENGTH,
        }
    }
}

impl ValidationLimits {
    /// Load limits from environment variables, falling back to the defaults.
    ///
    /// | Env Var                   | Default |
    /// |---------------------------|---------|
    /// | `WEBHOOK_URL_MAX_LENGTH`  | `255`   |
    /// | `CHANNEL_NAME_MAX_LENGTH` | `80`    |
    /// | `EMAIL_MAX_LENGTH`        | `255`   |
    ///
    /// Panics on a value that is set but not a valid `usize`, like the rest
    /// of the server configuration.
    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let var = |name: &str, default: usize| match lookup(name) {
            Some(value) => value
                .parse()
                .unwrap_or_else(|_| panic!("{name} must be a valid usize")),
            None => default,
        };

        Self {
            webhook_url_max: var("WEBHOOK_URL_MAX_LENGTH", DEFAULT_WEBHOOK_URL_MAX_LENGTH),
            channel_name_max: var("CHANNEL_NAME_MAX_LENGTH", DEFAULT_CHANNEL_NAME_MAX_LENGTH),
            email_max: var("EMAIL_MAX_LENGTH", DEFAULT_EMAIL_MAX_LENGTH),
        }
    }
}

// ---------------------------------------------------------------------------
// Duplicate messages
// ---------------------------------------------------------------------------

/// Error reported when a webhook URL and channel name pair is already registered.
pub fn duplicate_slack() -> ValidationErrors {
    ValidationErrors::single(FIELD_CHANNEL_NAME, "Slack channel already exists")
}

/// Error reported when an email address is already registered.
pub fn duplicate_email() -> ValidationErrors {
    ValidationErrors::single(FIELD_EMAIL, "Email channel already exists")
}

// ---------------------------------------------------------------------------
// Structural checks
// ---------------------------------------------------------------------------

/// Check webhook URL and channel name shape and length.
pub fn check_slack(input: &SlackChannelInput, limits: &ValidationLimits) -> ValidationErrors {
    let mut errors = ValidationErrors::new();

    let url = input.webhook_url.as_str();
    if url.is_empty() {
        errors.add(FIELD_WEBHOOK_URL, "Webhook URL cannot be empty");
    } else {
        if url.chars().count() > limits.webhook_url_max {
            errors.add(
                FIELD_WEBHOOK_URL,
                format!(
                    "Webhook URL must be a maximum of {} characters long",
                    limits.webhook_url_max
                ),
            );
        }
        if !SLACK_WEBHOOK_RE.is_match(url) {
            errors.add(
                FIELD_WEBHOOK_URL,
                "Webhook URL must look like https://hooks.slack.com/services/T.../B.../...",
            );
        }
    }

    let name = input.channel_name.as_str();
    if name.is_empty() {
        errors.add(FIELD_CHANNEL_NAME, "Channel cannot be empty");
    } else {
        if name.chars().count() > limits.channel_name_max {
            errors.add(
                FIELD_CHANNEL_NAME,
                format!(
                    "Channel must be a maximum of {} characters long",
                    limits.channel_name_max
                ),
            );
        }
        if name.chars().any(char::is_uppercase) {
            errors.add(FIELD_CHANNEL_NAME, "Channel must be lowercase");
        }
        if name.chars().any(|c| c.is_whitespace() || c == '.' || c == '#') {
            errors.add(
                FIELD_CHANNEL_NAME,
                "Channel cannot contain spaces, periods or '#'",
            );
        }
    }

    errors
}

/// Check email shape and length.
pub fn check_email(input: &EmailChannelInput, limits: &ValidationLimits) -> ValidationErrors {
    let mut errors = ValidationErrors::new();

    let email = input.email.as_str();
    if email.is_empty() {
        errors.add(FIELD_EMAIL, "Email cannot be empty");
        return errors;
    }
    if email.chars().count() > limits.email_max {
        errors.add(
            FIELD_EMAIL,
            format!("Email must be a maximum of {} characters long", limits.email_max),
        );
    }
    if !EMAIL_RE.is_match(email) {
        errors.add(FIELD_EMAIL, "Email is not a valid email address");
    }

    errors
}

// ---------------------------------------------------------------------------
// Full validation
// ---------------------------------------------------------------------------

/// Which stored value, if any, the input is allowed to equal.
///
/// On update the record's own current value is not a duplicate of itself.
#[derive(Debug)]
pub enum Existing<'a, T> {
    None,
    Current(&'a T),
}

/// Validate Slack input, including duplicate detection.
///
/// `existing` is the stored record when this is an update; an unchanged
/// pair skips the duplicate lookup.
pub async fn validate_slack(
    store: &dyn ChannelStore,
    limits: &ValidationLimits,
    input: &SlackChannelInput,
    existing: Existing<'_, SlackChannelInput>,
) -> Result<(), CoreError> {
    let mut errors = check_slack(input, limits);

    let unchanged = matches!(existing, Existing::Current(current) if current == input);
    if !unchanged
        && !input.webhook_url.is_empty()
        && !input.channel_name.is_empty()
        && store
            .exists_slack(&input.webhook_url, &input.channel_name)
            .await?
    {
        errors.merge(duplicate_slack());
    }

    errors.into_result()
}

/// Validate email input, including duplicate detection.
pub async fn validate_email(
    store: &dyn ChannelStore,
    limits: &ValidationLimits,
    input: &EmailChannelInput,
    existing: Existing<'_, EmailChannelInput>,
) -> Result<(), CoreError> {
    let mut errors = check_email(input, limits);

    let unchanged = matches!(existing, Existing::Current(current) if current == input);
    if !unchanged && !input.email.is_empty() && store.exists_email(&input.email).await? {
        errors.merge(duplicate_email());
    }

    errors.into_result()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;
    use crate::channels::NewSlackChannel;
    use crate::store::MemoryChannelStore;

    const WEBHOOK: &str = "https://hooks.slack.com/services/T000/B000/XXXX";

    fn slack(url: &str, name: &str) -> SlackChannelInput {
        SlackChannelInput {
            webhook_url: url.into(),
            channel_name: name.into(),
        }
    }

    fn email(value: &str) -> EmailChannelInput {
        EmailChannelInput {
            email: value.into(),
        }
    }

    #[test]
    fn valid_slack_input_passes() {
        let errors = check_slack(&slack(WEBHOOK, "alerts"), &ValidationLimits::default());
        assert!(errors.is_empty(), "unexpected errors: {errors}");
    }

    #[test]
    fn channel_names_with_dashes_and_digits_pass() {
        let limits = ValidationLimits::default();
        for name in ["data-requests", "team_2", "général"] {
            assert!(check_slack(&slack(WEBHOOK, name), &limits).is_empty(), "{name}");
        }
    }

    #[test]
    fn empty_fields_report_both() {
        let errors = check_slack(&slack("", ""), &ValidationLimits::default());
        assert_eq!(errors.messages(FIELD_WEBHOOK_URL), ["Webhook URL cannot be empty"]);
        assert_eq!(errors.messages(FIELD_CHANNEL_NAME), ["Channel cannot be empty"]);
    }

    #[test]
    fn non_slack_urls_rejected() {
        let limits = ValidationLimits::default();
        for url in [
            "http://hooks.slack.com/services/T000/B000/XXXX",
            "https://hooks.slack.com/services/X000/B000/XXXX",
            "https://hooks.slack.com/services/T000/B000",
            "https://example.com/services/T000/B000/XXXX",
            "https://hooks.slack.com/services/T000/B000/XX-XX",
        ] {
            let errors = check_slack(&slack(url, "alerts"), &limits);
            assert_eq!(errors.messages(FIELD_WEBHOOK_URL).len(), 1, "{url}");
        }
    }

    #[test]
    fn channel_name_rules() {
        let limits = ValidationLimits::default();
        for name in ["#alerts", "data requests", "v1.2", "Alerts"] {
            let errors = check_slack(&slack(WEBHOOK, name), &limits);
            assert!(!errors.messages(FIELD_CHANNEL_NAME).is_empty(), "{name}");
            assert!(errors.messages(FIELD_WEBHOOK_URL).is_empty());
        }
    }

    #[test]
    fn length_limits_are_configurable() {
        let limits = ValidationLimits {
            webhook_url_max: 20,
            channel_name_max: 3,
            email_max: 5,
        };
        let errors = check_slack(&slack(WEBHOOK, "alerts"), &limits);
        assert_eq!(
            errors.messages(FIELD_WEBHOOK_URL),
            ["Webhook URL must be a maximum of 20 characters long"]
        );
        assert_eq!(
            errors.messages(FIELD_CHANNEL_NAME),
            ["Channel must be a maximum of 3 characters long"]
        );

        let errors = check_email(&email("a@b.org"), &limits);
        assert_eq!(
            errors.messages(FIELD_EMAIL),
            ["Email must be a maximum of 5 characters long"]
        );
    }

    #[test]
    fn email_pattern() {
        let limits = ValidationLimits::default();
        for ok in ["ops@acme.org", "first.last+tag@mail.acme.co.uk", "a_b-c@x-y.io"] {
            assert!(check_email(&email(ok), &limits).is_empty(), "{ok}");
        }
        for bad in ["ops", "ops@acme", "@acme.org", "ops @acme.org", "ops@acme_corp.org"] {
            assert_eq!(check_email(&email(bad), &limits).messages(FIELD_EMAIL).len(), 1, "{bad}");
        }
    }

    #[test]
    fn empty_email_reports_only_emptiness() {
        let errors = check_email(&email(""), &ValidationLimits::default());
        assert_eq!(errors.messages(FIELD_EMAIL), ["Email cannot be empty"]);
    }

    #[tokio::test]
    async fn duplicate_pair_rejected() {
        let store = MemoryChannelStore::new();
        store
            .create_slack(NewSlackChannel {
                organization_id: "acme".into(),
                webhook_url: WEBHOOK.into(),
                channel_name: "alerts".into(),
            })
            .await
            .unwrap();

        let err = validate_slack(
            &store,
            &ValidationLimits::default(),
            &slack(WEBHOOK, "alerts"),
            Existing::None,
        )
        .await
        .unwrap_err();

        assert_matches!(err, CoreError::Validation(e)
            if e.messages(FIELD_CHANNEL_NAME) == ["Slack channel already exists"]);
    }

    #[tokio::test]
    async fn duplicate_and_shape_errors_accumulate() {
        let store = MemoryChannelStore::new();
        store
            .create_email(crate::channels::NewEmailChannel {
                organization_id: "acme".into(),
                email: "ops@acme".into(),
            })
            .await
            .unwrap();

        let err = validate_email(
            &store,
            &ValidationLimits::default(),
            &email("ops@acme"),
            Existing::None,
        )
        .await
        .unwrap_err();

        assert_matches!(err, CoreError::Validation(e) if e.messages(FIELD_EMAIL).len() == 2);
    }

    #[tokio::test]
    async fn unchanged_update_is_not_a_duplicate() {
        let store = MemoryChannelStore::new();
        store
            .create_slack(NewSlackChannel {
                organization_id: "acme".into(),
                webhook_url: WEBHOOK.into(),
                channel_name: "alerts".into(),
            })
            .await
            .unwrap();

        let current = slack(WEBHOOK, "alerts");
        validate_slack(
            &store,
            &ValidationLimits::default(),
            &current,
            Existing::Current(&current),
        )
        .await
        .unwrap();
    }

    #[test]
    fn limits_default_when_unset() {
        assert_eq!(ValidationLimits::from_lookup(|_| None), ValidationLimits::default());
    }

    #[test]
    fn limits_read_from_variables() {
        let limits = ValidationLimits::from_lookup(|name| {
            (name == "CHANNEL_NAME_MAX_LENGTH").then(|| "21".to_string())
        });
        assert_eq!(limits.channel_name_max, 21);
        assert_eq!(limits.email_max, DEFAULT_EMAIL_MAX_LENGTH);
    }

    #[test]
    #[should_panic(expected = "EMAIL_MAX_LENGTH must be a valid usize")]
    fn malformed_limit_panics() {
        ValidationLimits::from_lookup(|name| {
            (name == "EMAIL_MAX_LENGTH").then(|| "lots".to_string())
        });
    }
}
