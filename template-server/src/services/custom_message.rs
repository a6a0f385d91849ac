//! Cognito CustomMessage trigger: picks the template for the trigger, fills
//! its placeholders and writes the result into the event's `response`.

use std::collections::HashMap;
use std::sync::LazyLock;
use regex::{Captures, Regex};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

static PLACEHOLDER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\{\{(\w+)\}\}").expect("invalid placeholder pattern")
});

pub const DEFAULT_SUBJECT: &str = "{{BRAND}} – Votre code";

pub const DEFAULT_HTML: &str = r#"<div style="font-family:system-ui,Segoe UI,Roboto,Arial">
  <h1>{{BRAND}}</h1>
  <p>Bonjour {{USERNAME}},</p>
  <p>Voici votre code&nbsp;: <strong style="font-size:20px">{{CODE}}</strong></p>
  <p>Ou cliquez ici&nbsp;: {{LINK}}</p>
  <p style="color:#666">Si vous n'êtes pas à l'origine de cette demande, ignorez ce message.</p>
</div>"#;

/// The template shape produced by the formatter API.
#[derive(Deserialize, Debug, Clone, PartialEq, Default)]
pub struct EmailTemplate {
    pub html: String,
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub subject: Option<String>,
    #[serde(default)]
    pub to: Option<String>,
    #[serde(default)]
    pub from: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomMessageEvent {
    pub trigger_source: String,
    #[serde(default)]
    pub user_name: Option<String>,
    #[serde(default)]
    pub request: CustomMessageRequest,
    #[serde(default)]
    pub response: CustomMessageResponse,
    /// Everything else Cognito sent, returned untouched.
    #[serde(flatten)]
    pub rest: Map<String, Value>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomMessageRequest {
    #[serde(default)]
    pub code_parameter: Option<String>,
    #[serde(default)]
    pub link_parameter: Option<String>,
    #[serde(default)]
    pub user_attributes: Map<String, Value>,
    #[serde(flatten)]
    pub rest: Map<String, Value>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomMessageResponse {
    #[serde(default)]
    pub email_subject: Option<String>,
    #[serde(default)]
    pub email_message: Option<String>,
    #[serde(default)]
    pub sms_message: Option<String>,
    #[serde(flatten)]
    pub rest: Map<String, Value>,
}

/// Template id for a trigger source, `None` for triggers without a template.
pub fn message_id_for(trigger_source: &str) -> Option<&'static str> {
    let id = match trigger_source {
        "CustomMessage_SignUp" => "cognito-sign-up",
        "CustomMessage_ResendCode" => "cognito-resend-code",
        "CustomMessage_ForgotPassword" => "cognito-forgot-password",
        "CustomMessage_VerifyUserAttribute" => "cognito-verify-user-attribute",
        "CustomMessage_AdminCreateUser" => "cognito-admin-create-user",
        "CustomMessage_Authentication" => "cognito-authentication",
        "CustomMessage_UpdateUserAttribute" => "cognito-update-user-attribute",
        _ => return None,
    };
    Some(id)
}

/// Replaces every `{{NAME}}` with its value; unknown names become empty.
pub fn fill(template: &str, vars: &HashMap<&str, String>) -> String {
    PLACEHOLDER
        .replace_all(template, |caps: &Captures| vars.get(&caps[1]).cloned().unwrap_or_default())
        .into_owned()
}

impl CustomMessageEvent {
    fn vars(&self, brand: &str) -> HashMap<&'static str, String> {
        let email = self.request.user_attributes.get("email")
            .and_then(Value::as_str)
            .unwrap_or_default();
        HashMap::from([
            ("BRAND", brand.to_string()),
            ("CODE", self.request.code_parameter.clone().unwrap_or_default()),
            ("LINK", self.request.link_parameter.clone().unwrap_or_default()),
            ("EMAIL", email.to_string()),
            ("USERNAME", self.user_name.clone().unwrap_or_default()),
        ])
    }

    /// Fills the response from `template`, or from the built-in default for
    /// any part the template leaves empty.
    pub fn render(mut self, template: Option<&EmailTemplate>, brand: &str) -> Self {
        let vars = self.vars(brand);
        let subject = template
            .and_then(|t| t.subject.as_deref())
            .filter(|s| !s.is_empty())
            .unwrap_or(DEFAULT_SUBJECT);
        let html = template
            .map(|t| t.html.as_str())
            .filter(|s| !s.is_empty())
            .unwrap_or(DEFAULT_HTML);

        self.response.email_subject = Some(fill(subject.trim(), &vars));
        self.response.email_message = Some(fill(html.trim(), &vars));
        self.response.sms_message = Some(format!("Code {}: {}", brand, vars["CODE"]));
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn event(trigger: &str) -> CustomMessageEvent {
        serde_json::from_value(json!({
            "version": "1",
            "region": "eu-west-3",
            "userPoolId": "eu-west-3_abc",
            "triggerSource": trigger,
            "userName": "jdupont",
            "request": {
                "userAttributes": { "email": "j.dupont@example.fr", "email_verified": "false" },
                "codeParameter": "{####}",
                "linkParameter": "{##Click Here##}"
            },
            "response": { "smsMessage": null, "emailMessage": null, "emailSubject": null }
        })).unwrap()
    }

    #[test]
    fn test_message_ids() {
        assert_eq!(message_id_for("CustomMessage_SignUp"), Some("cognito-sign-up"));
        assert_eq!(message_id_for("CustomMessage_ForgotPassword"), Some("cognito-forgot-password"));
        assert_eq!(message_id_for("CustomMessage_UpdateUserAttribute"), Some("cognito-update-user-attribute"));
        assert_eq!(message_id_for("PreSignUp_SignUp"), None);
    }

    #[test]
    fn test_fill() {
        let vars = HashMap::from([("CODE", "1234".to_string()), ("BRAND", "Acme".to_string())]);
        assert_eq!(fill("{{BRAND}}: {{CODE}} {{MISSING}}!", &vars), "Acme: 1234 !");
        assert_eq!(fill("{{ CODE }} {CODE}", &vars), "{{ CODE }} {CODE}");
    }

    #[test]
    fn test_render_with_template() {
        let template = EmailTemplate {
            html: "<p>Hi {{USERNAME}} ({{EMAIL}}), code {{CODE}}</p>".to_string(),
            subject: Some(" {{BRAND}} sign up ".to_string()),
            ..EmailTemplate::default()
        };
        let rendered = event("CustomMessage_SignUp").render(Some(&template), "Acme");

        assert_eq!(rendered.response.email_subject.as_deref(), Some("Acme sign up"));
        assert_eq!(
            rendered.response.email_message.as_deref(),
            Some("<p>Hi jdupont (j.dupont@example.fr), code {####}</p>")
        );
        assert_eq!(rendered.response.sms_message.as_deref(), Some("Code Acme: {####}"));
    }

    #[test]
    fn test_render_falls_back_to_defaults() {
        let rendered = event("CustomMessage_ResendCode").render(None, "Heustach");
        assert_eq!(rendered.response.email_subject.as_deref(), Some("Heustach – Votre code"));
        let html = rendered.response.email_message.unwrap();
        assert!(html.contains("<h1>Heustach</h1>"));
        assert!(html.contains("Bonjour jdupont,"));
        assert!(html.contains("{##Click Here##}"));
        assert!(!html.contains("{{"));

        let empty_html = EmailTemplate { subject: Some("Custom".to_string()), ..EmailTemplate::default() };
        let rendered = event("CustomMessage_ResendCode").render(Some(&empty_html), "Heustach");
        assert_eq!(rendered.response.email_subject.as_deref(), Some("Custom"));
        assert!(rendered.response.email_message.unwrap().contains("<h1>Heustach</h1>"));
    }

    #[test]
    fn test_email_template_shape() {
        let template: EmailTemplate = serde_json::from_value(json!({
            "html": "<p>x</p>", "text": "x", "subject": "Hi", "to": "{{EMAIL}}", "from": "no-reply@example.com"
        })).unwrap();
        assert_eq!(template.subject.as_deref(), Some("Hi"));
        assert_eq!(template.from.as_deref(), Some("no-reply@example.com"));

        assert!(serde_json::from_value::<EmailTemplate>(json!({ "subject": "no html" })).is_err());
    }

    #[test]
    fn test_unknown_fields_survive() {
        let value = serde_json::to_value(event("CustomMessage_SignUp").render(None, "Acme")).unwrap();
        assert_eq!(value["userPoolId"], "eu-west-3_abc");
        assert_eq!(value["request"]["userAttributes"]["email_verified"], "false");
        assert_eq!(value["response"]["smsMessage"], "Code Acme: {####}");
    }
}
