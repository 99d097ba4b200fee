//! Message templates for notification delivery.
//!
//! Each message is produced from a [`TemplateKey`] and a variable map.
//! Templates use `{name}` placeholders; placeholders without a value are
//! left in place so a typo is visible in the delivered message rather than
//! silently dropped.

use std::collections::{BTreeMap, HashMap};
use std::path::Path;
use std::sync::LazyLock;

use regex::{Captures, Regex};

use crate::error::CoreError;
use crate::event::EventKind;

/// Regex pattern matching `{placeholder}` tokens.
pub const PLACEHOLDER_PATTERN: &str = r"\{([a-zA-Z_][a-zA-Z0-9_]*)\}";

static PLACEHOLDER_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(PLACEHOLDER_PATTERN).expect("valid regex"));

/// Variables available to templates.
pub const VAR_SITE_TITLE: &str = "site_title";
pub const VAR_SITE_URL: &str = "site_url";
pub const VAR_DATAREQUEST_ID: &str = "datarequest_id";
pub const VAR_DATAREQUEST_TITLE: &str = "datarequest_title";
pub const VAR_DATAREQUEST_DESCRIPTION: &str = "datarequest_description";
pub const VAR_DATAREQUEST_URL: &str = "datarequest_url";
pub const VAR_ORGANIZATION_ID: &str = "organization_id";
pub const VAR_USER_FULLNAME: &str = "user_fullname";

pub type TemplateVars = BTreeMap<&'static str, String>;

// ---------------------------------------------------------------------------
// TemplateKey
// ---------------------------------------------------------------------------

/// Identifies one message template.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TemplateKey {
    /// Body posted to Slack channels.
    Slack(EventKind),
    /// Subject of the mail sent to email channels.
    EmailSubject(EventKind),
    /// Body of the mail sent to email channels.
    EmailBody(EventKind),
    /// Subject of the "new data request" mail sent to organization members.
    MemberSubject,
    /// Body of the "new data request" mail sent to organization members.
    MemberBody,
}

impl TemplateKey {
    pub const ALL: [TemplateKey; 11] = [
        TemplateKey::Slack(EventKind::Created),
        TemplateKey::Slack(EventKind::Commented),
        TemplateKey::Slack(EventKind::Closed),
        TemplateKey::EmailSubject(EventKind::Created),
        TemplateKey::EmailSubject(EventKind::Commented),
        TemplateKey::EmailSubject(EventKind::Closed),
        TemplateKey::EmailBody(EventKind::Created),
        TemplateKey::EmailBody(EventKind::Commented),
        TemplateKey::EmailBody(EventKind::Closed),
        TemplateKey::MemberSubject,
        TemplateKey::MemberBody,
    ];

    /// Stable name, also the override file stem (`<name>.txt`).
    pub fn name(self) -> String {
        match self {
            TemplateKey::Slack(kind) => format!("slack.{kind}"),
            TemplateKey::EmailSubject(kind) => format!("email.{kind}.subject"),
            TemplateKey::EmailBody(kind) => format!("email.{kind}.body"),
            TemplateKey::MemberSubject => "member.subject".to_string(),
            TemplateKey::MemberBody => "member.body".to_string(),
        }
    }

    fn builtin(self) -> &'static str {
        match self {
            TemplateKey::Slack(EventKind::Created) => {
                "A new data request has been created on {site_title}: *{datarequest_title}*\n\
                 {datarequest_description}\n{datarequest_url}"
            }
            TemplateKey::Slack(EventKind::Commented) => {
                "A new comment was added to the data request *{datarequest_title}* on \
                 {site_title}\n{datarequest_url}"
            }
            TemplateKey::Slack(EventKind::Closed) => {
                "The data request *{datarequest_title}* on {site_title} has been closed\n\
                 {datarequest_url}"
            }
            TemplateKey::EmailSubject(EventKind::Created) => {
                "[{site_title}] New data request: {datarequest_title}"
            }
            TemplateKey::EmailSubject(EventKind::Commented) => {
                "[{site_title}] New comment on data request: {datarequest_title}"
            }
            TemplateKey::EmailSubject(EventKind::Closed) => {
                "[{site_title}] Data request closed: {datarequest_title}"
            }
            TemplateKey::EmailBody(EventKind::Created) => {
                "A new data request has been created for {organization_id}.\n\n\
                 Title: {datarequest_title}\n\
                 Description: {datarequest_description}\n\n\
                 View it at {datarequest_url}\n\n\
                 -- \n{site_title} ({site_url})"
            }
            TemplateKey::EmailBody(EventKind::Commented) => {
                "The data request \"{datarequest_title}\" has a new comment.\n\n\
                 View it at {datarequest_url}\n\n\
                 -- \n{site_title} ({site_url})"
            }
            TemplateKey::EmailBody(EventKind::Closed) => {
                "The data request \"{datarequest_title}\" has been closed.\n\n\
                 View it at {datarequest_url}\n\n\
                 -- \n{site_title} ({site_url})"
            }
            TemplateKey::MemberSubject => "[{site_title}] New data request: {datarequest_title}",
            TemplateKey::MemberBody => {
                "Dear {user_fullname},\n\n\
                 A new data request has been submitted to your organization on {site_title}.\n\n\
                 Title: {datarequest_title}\n\
                 Description: {datarequest_description}\n\n\
                 You can view and respond to it at {datarequest_url}\n\n\
                 -- \n{site_title} ({site_url})"
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Templates
// ---------------------------------------------------------------------------

/// The template set used by the dispatcher.
///
/// Starts from the built-in texts; individual keys can be replaced with
/// [`Templates::set`] or by files loaded with [`Templates::load_dir`].
#[derive(Debug, Clone, Default)]
pub struct Templates {
    overrides: HashMap<TemplateKey, String>,
}

impl Templates {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, key: TemplateKey, text: impl Into<String>) {
        self.overrides.insert(key, text.into());
    }

    /// Overlay every `<key name>.txt` file found in `dir`.
    ///
    /// Missing files keep the built-in text; unreadable files are an error.
    pub fn load_dir(dir: impl AsRef<Path>) -> Result<Self, CoreError> {
        let dir = dir.as_ref();
        let mut templates = Self::new();

        for key in TemplateKey::ALL {
            let path = dir.join(format!("{}.txt", key.name()));
            if !path.is_file() {
                continue;
            }
            let text = std::fs::read_to_string(&path).map_err(|e| {
                CoreError::Internal(format!("Failed to read template {}: {e}", path.display()))
            })?;
            tracing::debug!(template = %key.name(), path = %path.display(), "Loaded template override");
            templates.set(key, text.trim_end().to_string());
        }

        Ok(templates)
    }

    pub fn text(&self, key: TemplateKey) -> &str {
        self.overrides
            .get(&key)
            .map(String::as_str)
            .unwrap_or_else(|| key.builtin())
    }

    pub fn render(&self, key: TemplateKey, vars: &TemplateVars) -> String {
        render_str(self.text(key), vars)
    }
}

/// Substitute `{name}` placeholders in `template` with values from `vars`.
pub fn render_str(template: &str, vars: &TemplateVars) -> String {
    PLACEHOLDER_RE
        .replace_all(template, |caps: &Captures<'_>| match vars.get(&caps[1]) {
            Some(value) => value.clone(),
            None => caps[0].to_string(),
        })
        .into_owned()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn vars() -> TemplateVars {
        let mut vars = TemplateVars::new();
        vars.insert(VAR_SITE_TITLE, "Open Data".into());
        vars.insert(VAR_DATAREQUEST_TITLE, "Bus stops".into());
        vars.insert(VAR_DATAREQUEST_URL, "https://data.example.org/datarequest/1".into());
        vars
    }

    #[test]
    fn substitutes_known_placeholders() {
        let out = render_str("{datarequest_title} on {site_title}", &vars());
        assert_eq!(out, "Bus stops on Open Data");
    }

    #[test]
    fn unknown_placeholders_left_verbatim() {
        let out = render_str("Hi {user_fullname}, see {datarequest_url}", &vars());
        assert_eq!(out, "Hi {user_fullname}, see https://data.example.org/datarequest/1");
    }

    #[test]
    fn values_are_not_rescanned() {
        let mut vars = vars();
        vars.insert(VAR_DATAREQUEST_TITLE, "{site_title}".into());
        assert_eq!(render_str("{datarequest_title}", &vars), "{site_title}");
    }

    #[test]
    fn builtin_slack_created_mentions_title() {
        let out = Templates::new().render(TemplateKey::Slack(EventKind::Created), &vars());
        assert!(out.contains("Bus stops"));
        assert!(out.contains("https://data.example.org/datarequest/1"));
    }

    #[test]
    fn every_key_has_distinct_name() {
        let mut names: Vec<String> = TemplateKey::ALL.iter().map(|k| k.name()).collect();
        names.sort();
        names.dedup();
        assert_eq!(names.len(), TemplateKey::ALL.len());
    }

    #[test]
    fn set_overrides_builtin() {
        let mut templates = Templates::new();
        templates.set(TemplateKey::MemberSubject, "New: {datarequest_title}");
        assert_eq!(templates.render(TemplateKey::MemberSubject, &vars()), "New: Bus stops");
    }

    #[test]
    fn load_dir_overlays_present_files() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("slack.closed.txt"), "closed: {datarequest_title}\n").unwrap();

        let templates = Templates::load_dir(dir.path()).unwrap();

        assert_eq!(
            templates.render(TemplateKey::Slack(EventKind::Closed), &vars()),
            "closed: Bus stops"
        );
        assert_eq!(
            templates.text(TemplateKey::Slack(EventKind::Created)),
            TemplateKey::Slack(EventKind::Created).builtin()
        );
    }
}
