//! Delivery through a plain SMTP relay
//!
//! Speaks the client side of RFC 5321 (EHLO, MAIL FROM, RCPT TO, DATA, QUIT)
//! over a single TCP connection per message. No TLS or AUTH: point it at a
//! local relay.

use async_trait::async_trait;
use chrono::Utc;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::TcpStream;
use tracing::{debug, error, info};

use super::email::validate_email;
use super::template::{RenderedEmail, VerificationEmail};
use super::Notifier;
use crate::error::{OtpError, Result};

const SMTP_TIMEOUT: Duration = Duration::from_secs(30);

pub struct SmtpNotifier {
    server_addr: String,
    from: String,
    email: VerificationEmail,
}

impl SmtpNotifier {
    pub fn new(server_addr: String, from: String, email: VerificationEmail) -> Self {
        Self {
            server_addr,
            from,
            email,
        }
    }

    async fn send_mail(&self, to: &str, data: &[u8]) -> Result<()> {
        info!("Sending mail from {} to {} via {}", self.from, to, self.server_addr);

        let stream = TcpStream::connect(&self.server_addr).await?;
        let (reader, mut writer) = stream.into_split();
        let mut reader = BufReader::new(reader);

        let greeting = self.read_line(&mut reader).await?;
        if !greeting.starts_with("220") {
            error!("Invalid greeting: {}", greeting);
            return Err(OtpError::Smtp(format!("Invalid greeting: {}", greeting.trim())));
        }
        debug!("Received greeting: {}", greeting.trim());

        self.write_line(&mut writer, &format!("EHLO {}", hostname())).await?;
        self.read_response(&mut reader, "250").await?;

        self.write_line(&mut writer, &format!("MAIL FROM:<{}>", self.from)).await?;
        self.read_response(&mut reader, "250").await?;

        self.write_line(&mut writer, &format!("RCPT TO:<{}>", to)).await?;
        self.read_response(&mut reader, "250").await?;

        self.write_line(&mut writer, "DATA").await?;
        self.read_response(&mut reader, "354").await?;

        writer.write_all(data).await?;
        if !data.ends_with(b"\r\n") {
            writer.write_all(b"\r\n").await?;
        }
        writer.write_all(b".\r\n").await?;
        self.read_response(&mut reader, "250").await?;

        self.write_line(&mut writer, "QUIT").await?;
        let _response = self.read_line(&mut reader).await?;

        info!("Mail sent successfully to {}", to);
        Ok(())
    }

    async fn read_line<R>(&self, reader: &mut BufReader<R>) -> Result<String>
    where
        R: tokio::io::AsyncRead + Unpin,
    {
        let mut line = String::new();
        let read = tokio::time::timeout(SMTP_TIMEOUT, reader.read_line(&mut line))
            .await
            .map_err(|_| OtpError::Smtp("Timed out waiting for server".to_string()))??;
        if read == 0 {
            return Err(OtpError::Smtp("Connection closed by server".to_string()));
        }
        Ok(line)
    }

    /// Read a (possibly multi-line) reply and check its code
    async fn read_response<R>(&self, reader: &mut BufReader<R>, expected: &str) -> Result<String>
    where
        R: tokio::io::AsyncRead + Unpin,
    {
        let mut full_response = String::new();

        loop {
            let line = self.read_line(reader).await?;
            debug!("< {}", line.trim());

            full_response.push_str(&line);

            // "250-" continues, "250 " ends
            if line.as_bytes().get(3) != Some(&b'-') {
                break;
            }
        }

        if !full_response.starts_with(expected) {
            error!("Unexpected response: {}", full_response.trim());
            return Err(OtpError::Smtp(format!(
                "Expected {}, got: {}",
                expected,
                full_response.trim()
            )));
        }

        Ok(full_response)
    }

    async fn write_line<W>(&self, writer: &mut W, line: &str) -> Result<()>
    where
        W: tokio::io::AsyncWrite + Unpin,
    {
        debug!("> {}", line);
        writer.write_all(format!("{}\r\n", line).as_bytes()).await?;
        Ok(())
    }
}

#[async_trait]
impl Notifier for SmtpNotifier {
    async fn deliver(&self, destination: &str, code: &str) -> Result<()> {
        validate_email(destination)?;

        let rendered = self.email.render(code);
        let message = build_message(&self.from, destination, &rendered);
        self.send_mail(destination, message.as_bytes()).await
    }
}

/// Build an RFC 5322 multipart/alternative message
fn build_message(from: &str, to: &str, email: &RenderedEmail) -> String {
    let date = Utc::now().format("%a, %d %b %Y %H:%M:%S %z");
    let boundary = format!("----=_Part_{}", uuid::Uuid::new_v4().simple());

    format!(
        "From: <{}>\r\n\
         To: <{}>\r\n\
         Subject: {}\r\n\
         Date: {}\r\n\
         Auto-Submitted: auto-generated\r\n\
         MIME-Version: 1.0\r\n\
         Content-Type: multipart/alternative; boundary=\"{}\"\r\n\
         \r\n\
         --{}\r\n\
         Content-Type: text/plain; charset=\"UTF-8\"\r\n\
         Content-Transfer-Encoding: 8bit\r\n\
         \r\n\
         {}\r\n\
         --{}\r\n\
         Content-Type: text/html; charset=\"UTF-8\"\r\n\
         Content-Transfer-Encoding: 8bit\r\n\
         \r\n\
         {}\r\n\
         --{}--\r\n",
        from,
        to,
        email.subject,
        date,
        boundary,
        boundary,
        dot_stuff(&email.text),
        boundary,
        dot_stuff(&email.html),
        boundary
    )
}

/// Normalize line endings to CRLF and escape lines starting with '.'
fn dot_stuff(body: &str) -> String {
    body.lines()
        .map(|line| {
            if line.starts_with('.') {
                format!(".{}", line)
            } else {
                line.to_string()
            }
        })
        .collect::<Vec<_>>()
        .join("\r\n")
}

fn hostname() -> String {
    gethostname::gethostname().to_string_lossy().to_string()
}
