//! Verification email rendering with variable substitution

const SUBJECT: &str = "Your Verification Code";

const BODY_HTML: &str = r#"<div style="font-family: Arial, sans-serif; max-width: 600px; margin: 0 auto; padding: 20px;">
  <h2 style="color: #333; text-align: center;">Email Verification</h2>
  <p style="color: #666; font-size: 16px;">
    Hello! We received a request to verify your email address for the {{app_name}}.
  </p>
  <div style="background-color: #f8f9fa; border: 2px dashed #dee2e6; border-radius: 8px; padding: 20px; text-align: center; margin: 20px 0;">
    <h3 style="color: #495057; margin: 0;">Your verification code is:</h3>
    <div style="font-size: 32px; font-weight: bold; color: #007bff; letter-spacing: 8px; margin: 10px 0;">
      {{code}}
    </div>
  </div>
  <p style="color: #666; font-size: 14px;">
    This code will expire in {{ttl_minutes}} minutes. If you didn't request this verification, please ignore this email.
  </p>
  <hr style="border: none; border-top: 1px solid #dee2e6; margin: 20px 0;">
  <p style="color: #999; font-size: 12px; text-align: center;">
    {{app_name}} - Your personal health companion
  </p>
</div>"#;

const BODY_TEXT: &str = "Hello! We received a request to verify your email address for the {{app_name}}.\n\
\n\
Your verification code is: {{code}}\n\
\n\
This code will expire in {{ttl_minutes}} minutes. If you didn't request this verification, please ignore this email.\n\
\n\
-- \n\
{{app_name}} - Your personal health companion\n";

/// A rendered message ready to hand to a transport
#[derive(Debug, Clone, PartialEq)]
pub struct RenderedEmail {
    pub subject: String,
    pub html: String,
    pub text: String,
}

/// The verification email sent for every issued code
#[derive(Debug, Clone)]
pub struct VerificationEmail {
    app_name: String,
    ttl_minutes: i64,
}

impl VerificationEmail {
    pub fn new(app_name: &str, ttl_minutes: i64) -> Self {
        Self {
            app_name: app_name.to_string(),
            ttl_minutes,
        }
    }

    pub fn render(&self, code: &str) -> RenderedEmail {
        // app_name goes last so its text is inserted verbatim
        let vars = [
            ("code", code.to_string()),
            ("ttl_minutes", self.ttl_minutes.to_string()),
            ("app_name", self.app_name.clone()),
        ];

        RenderedEmail {
            subject: render_string(SUBJECT, &vars),
            html: render_string(BODY_HTML, &vars),
            text: render_string(BODY_TEXT, &vars),
        }
    }
}

/// Replace every `{{key}}` with its value, in order
fn render_string(template: &str, vars: &[(&str, String)]) -> String {
    let mut result = template.to_string();
    for (key, value) in vars {
        let placeholder = format!("{{{{{}}}}}", key);
        result = result.replace(&placeholder, value);
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_substitutes_all_variables() {
        let email = VerificationEmail::new("Health Dashboard", 10);
        let rendered = email.render("482913");

        assert_eq!(rendered.subject, "Your Verification Code");
        assert!(rendered.html.contains("482913"));
        assert!(rendered.html.contains("expire in 10 minutes"));
        assert!(rendered.text.contains("Your verification code is: 482913"));
        assert!(rendered.text.contains("Health Dashboard - Your personal health companion"));
        assert!(!rendered.html.contains("{{"));
        assert!(!rendered.text.contains("{{"));
    }

    #[test]
    fn test_render_string_basic() {
        let vars = [("name", "Jane".to_string())];
        assert_eq!(render_string("Hi {{name}}!", &vars), "Hi Jane!");
    }

    #[test]
    fn test_app_name_with_placeholder_is_literal() {
        let email = VerificationEmail::new("Clinic {{code}}", 10);

        for _ in 0..20 {
            let rendered = email.render("482913");
            assert!(rendered.text.contains("Clinic {{code}}"));
            assert!(rendered.text.contains("Your verification code is: 482913"));
        }
    }
}
