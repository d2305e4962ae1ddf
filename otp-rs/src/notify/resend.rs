//! Delivery through the Resend HTTP email API

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::email::validate_email;
use super::template::VerificationEmail;
use super::Notifier;
use crate::error::{OtpError, Result};

/// Resend send-email request
#[derive(Debug, Serialize)]
struct SendEmailRequest<'a> {
    from: &'a str,
    to: Vec<&'a str>,
    subject: &'a str,
    html: &'a str,
    text: &'a str,
}

/// Resend success response
#[derive(Debug, Deserialize)]
struct SendEmailResponse {
    id: Option<String>,
}

/// Resend error response
#[derive(Debug, Deserialize)]
struct ErrorResponse {
    message: Option<String>,
}

pub struct ResendNotifier {
    api_url: String,
    api_key: String,
    from: String,
    email: VerificationEmail,
    client: reqwest::Client,
}

impl ResendNotifier {
    pub fn new(api_key: String, from: String, email: VerificationEmail) -> Self {
        Self {
            api_url: "https://api.resend.com".to_string(),
            api_key,
            from,
            email,
            client: reqwest::Client::new(),
        }
    }

    pub fn with_api_url(mut self, api_url: String) -> Self {
        self.api_url = api_url.trim_end_matches('/').to_string();
        self
    }
}

#[async_trait]
impl Notifier for ResendNotifier {
    async fn deliver(&self, destination: &str, code: &str) -> Result<()> {
        validate_email(destination)?;

        let rendered = self.email.render(code);
        let request = SendEmailRequest {
            from: &self.from,
            to: vec![destination],
            subject: &rendered.subject,
            html: &rendered.html,
            text: &rendered.text,
        };

        debug!("Resend: Sending verification email to {}", destination);

        let response = self
            .client
            .post(format!("{}/emails", self.api_url))
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let message = response
                .json::<ErrorResponse>()
                .await
                .ok()
                .and_then(|e| e.message)
                .unwrap_or_else(|| "Failed to send email".to_string());
            warn!("Resend: Request failed with status {}: {}", status, message);
            return Err(OtpError::Delivery(format!("{} - {}", status, message)));
        }

        // Accepted; the body only carries an id for the logs
        let body = response.text().await.unwrap_or_default();
        match serde_json::from_str::<SendEmailResponse>(&body)
            .ok()
            .and_then(|sent| sent.id)
        {
            Some(id) => debug!("Resend: Email accepted, id={}", id),
            None => debug!("Resend: Email accepted"),
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{extract::State, http::HeaderMap, http::StatusCode, routing::post, Json, Router};
    use std::sync::{Arc, Mutex};

    type Captured = Arc<Mutex<Vec<(Option<String>, serde_json::Value)>>>;

    async fn spawn_fake_resend(status: StatusCode) -> (String, Captured) {
        let captured: Captured = Arc::new(Mutex::new(Vec::new()));

        let app = Router::new()
            .route(
                "/emails",
                post(
                    move |State(captured): State<Captured>,
                          headers: HeaderMap,
                          Json(body): Json<serde_json::Value>| async move {
                        let auth = headers
                            .get("authorization")
                            .and_then(|v| v.to_str().ok())
                            .map(str::to_string);
                        captured.lock().unwrap().push((auth, body));
                        if status.is_success() {
                            (status, Json(serde_json::json!({ "id": "email_123" })))
                        } else {
                            (status, Json(serde_json::json!({ "message": "Invalid API key" })))
                        }
                    },
                ),
            )
            .with_state(captured.clone());

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        (format!("http://{}", addr), captured)
    }

    fn notifier(api_url: String) -> ResendNotifier {
        ResendNotifier::new(
            "re_test_key".to_string(),
            "Health Dashboard <onboarding@resend.dev>".to_string(),
            VerificationEmail::new("Health Dashboard", 10),
        )
        .with_api_url(api_url)
    }

    #[tokio::test]
    async fn test_deliver_posts_email() {
        let (url, captured) = spawn_fake_resend(StatusCode::OK).await;

        notifier(url)
            .deliver("user@example.com", "482913")
            .await
            .unwrap();

        let captured = captured.lock().unwrap();
        assert_eq!(captured.len(), 1);
        let (auth, body) = &captured[0];
        assert_eq!(auth.as_deref(), Some("Bearer re_test_key"));
        assert_eq!(body["to"][0], "user@example.com");
        assert_eq!(body["subject"], "Your Verification Code");
        assert!(body["html"].as_str().unwrap().contains("482913"));
    }

    #[tokio::test]
    async fn test_deliver_reports_provider_error() {
        let (url, _captured) = spawn_fake_resend(StatusCode::UNAUTHORIZED).await;

        let result = notifier(url).deliver("user@example.com", "482913").await;

        match result {
            Err(OtpError::Delivery(message)) => assert!(message.contains("Invalid API key")),
            other => panic!("expected delivery error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_deliver_accepts_empty_success_body() {
        let app = Router::new().route("/emails", post(|| async { StatusCode::ACCEPTED }));
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        let result = notifier(format!("http://{}", addr))
            .deliver("user@example.com", "482913")
            .await;
        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn test_deliver_rejects_bad_address() {
        let result = notifier("http://127.0.0.1:1".to_string())
            .deliver("not-an-email", "482913")
            .await;
        assert!(matches!(result, Err(OtpError::InvalidDestination(_))));
    }
}
