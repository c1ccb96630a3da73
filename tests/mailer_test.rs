//! Mailer and global mailer tests, using the in-memory transport.

use async_trait::async_trait;
use courier::providers::{LocalTransport, LoggerTransport};
use courier::{
    configure, is_configured, mailer, reset, send_mail, Attachment, Composer, EmailMessage,
    Envelope, FixedBoundary, MailError, Mailer, MailerConfig, Transport,
};
use mailparse::MailHeaderMap;

fn local_mailer() -> (Mailer, LocalTransport) {
    let transport = LocalTransport::new();
    let composer = Composer::new("smtp.example.com")
        .account(courier::Address::with_name("Example App", "noreply@example.com"));
    (Mailer::new(composer, transport.clone()), transport)
}

fn welcome() -> EmailMessage {
    EmailMessage::new()
        .to("bob@example.com")
        .cc("carol@example.com")
        .bcc("dave@example.com")
        .subject("Welcome")
        .body("Hello Bob")
}

// ============================================================================
// Mailer Tests
// ============================================================================

#[tokio::test]
async fn send_mail_hands_composed_bytes_to_transport() {
    let (mailer, transport) = local_mailer();

    let result = mailer.send_mail(&welcome()).await.unwrap();
    assert_eq!(result.transport, "local");

    let sent = transport.last().unwrap();
    assert_eq!(sent.envelope.from, "noreply@example.com");
    assert_eq!(
        sent.envelope.recipients,
        vec!["bob@example.com", "carol@example.com", "dave@example.com"]
    );

    let parsed = mailparse::parse_mail(&sent.payload).unwrap();
    assert_eq!(
        parsed.headers.get_first_value("From").as_deref(),
        Some("Example App <noreply@example.com>")
    );
    assert_eq!(
        parsed.headers.get_first_value("Message-ID"),
        Some(result.message_id)
    );
    assert_eq!(parsed.subparts[0].get_body().unwrap().trim_end(), "Hello Bob");
}

#[tokio::test]
async fn explicit_from_wins_over_account() {
    let (mailer, transport) = local_mailer();

    mailer
        .send_mail(&welcome().from("Ada <ada@example.com>"))
        .await
        .unwrap();

    let sent = transport.last().unwrap();
    assert_eq!(sent.envelope.from, "ada@example.com");
    assert_eq!(sent.header("From").as_deref(), Some("Ada <ada@example.com>"));
}

#[tokio::test]
async fn each_send_gets_its_own_message() {
    let (mailer, transport) = local_mailer();

    let first = mailer.send_mail(&welcome()).await.unwrap();
    let second = mailer.send_mail(&welcome().subject("Again")).await.unwrap();

    assert_ne!(first.message_id, second.message_id);
    let messages = transport.messages();
    assert_eq!(messages.len(), 2);
    assert_eq!(messages[1].header("Subject").as_deref(), Some("Again"));
}

#[tokio::test]
async fn concurrent_sends_do_not_interleave() {
    let (mailer, transport) = local_mailer();

    let sends = (0..10).map(|i| {
        let mailer = mailer.clone();
        tokio::spawn(async move {
            let message = welcome().subject(format!("Message {i}"));
            mailer.send_mail(&message).await
        })
    });
    for handle in sends.collect::<Vec<_>>() {
        handle.await.unwrap().unwrap();
    }

    assert_eq!(transport.count(), 10);
    for sent in transport.messages() {
        let parsed = mailparse::parse_mail(&sent.payload).unwrap();
        assert_eq!(parsed.subparts.len(), 1);
        let subject = parsed.headers.get_first_value("Subject").unwrap();
        assert!(subject.starts_with("Message "));
    }
}

#[tokio::test]
async fn transport_failure_is_surfaced() {
    let (mailer, transport) = local_mailer();
    transport.set_failure("421 service not available");

    let err = mailer.send_mail(&welcome()).await.unwrap_err();
    assert_eq!(err, MailError::TransportFailed("421 service not available".into()));
    assert_eq!(err.stage(), "transport");
}

#[tokio::test]
async fn compose_failure_never_reaches_transport() {
    let (mailer, transport) = local_mailer();
    let message = welcome().attachment(Attachment::new("gone.pdf", "/nonexistent/courier/gone.pdf"));

    let err = mailer.send_mail(&message).await.unwrap_err();
    assert!(matches!(err, MailError::AttachmentReadFailed { ref path, .. } if path == "/nonexistent/courier/gone.pdf"));
    assert!(transport.is_empty());
}

#[tokio::test]
async fn missing_recipients_never_reaches_transport() {
    let (mailer, transport) = local_mailer();
    let err = mailer
        .send_mail(&EmailMessage::new().subject("nobody"))
        .await
        .unwrap_err();
    assert_eq!(err, MailError::MissingRecipients);
    assert!(transport.is_empty());
}

#[tokio::test]
async fn logger_transport_accepts_messages() {
    let mailer = Mailer::new(Composer::new("smtp.example.com"), LoggerTransport::full());
    let result = mailer
        .send_mail(&welcome().from("ada@example.com"))
        .await
        .unwrap();
    assert_eq!(result.transport, "logger");
}

// ============================================================================
// Custom Transport Tests
// ============================================================================

struct RejectAll;

#[async_trait]
impl Transport for RejectAll {
    async fn send(&self, envelope: &Envelope, _payload: &[u8]) -> Result<(), MailError> {
        Err(MailError::TransportFailed(format!(
            "550 rejected {}",
            envelope.recipients.join(",")
        )))
    }

    fn provider_name(&self) -> &'static str {
        "reject"
    }
}

#[tokio::test]
async fn custom_transport_errors_pass_through_unchanged() {
    let config = MailerConfig::new("smtp.example.com", 587).from("noreply@example.com");
    let mailer = Mailer::from_config(&config, RejectAll).unwrap();

    let err = mailer
        .send_mail(&EmailMessage::new().to("bob@example.com"))
        .await
        .unwrap_err();
    assert_eq!(err, MailError::TransportFailed("550 rejected bob@example.com".into()));
    assert_eq!(mailer.provider_name(), "reject");
}

// ============================================================================
// Global Mailer Tests
// ============================================================================

// One test so the global state is not shared between parallel tests.
#[tokio::test]
async fn global_mailer_lifecycle() {
    let transport = LocalTransport::new();
    let composer = Composer::new("smtp.example.com").boundary_source(FixedBoundary::new("GLOBAL"));
    configure(Mailer::new(composer, transport.clone()));

    assert!(is_configured());
    assert_eq!(mailer().unwrap().provider_name(), "local");

    let result = send_mail(&welcome().from("ada@example.com")).await.unwrap();
    assert_eq!(transport.count(), 1);
    assert_eq!(
        transport.last().unwrap().header("Message-ID"),
        Some(result.message_id)
    );
    assert!(transport.last().unwrap().text().ends_with("\r\n--GLOBAL--\r\n"));

    reset();
    assert!(mailer().is_none());
}
